//! Session and access-control core for the restaurant admin panel.
//!
//! The panel talks to a remote admin API with a bearer token. This crate
//! owns that token end to end: where it is kept, how it is attached to
//! outgoing requests, what happens when the API rejects it, and which pages
//! an operator may open with or without one. Rendering is not here; the
//! browser build (`hydrate` feature), the edge gatekeeper (`server/`) and the
//! operator CLI (`cli/`) all drive the same types.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`store`] | Credential store over cookie and script channels |
//! | [`pipeline`] | Outbound augmenter, inbound 401 interceptor, [`pipeline::ApiClient`] |
//! | [`guard`] | Pure per-navigation allow/redirect decision |
//! | [`routes`] | Public/protected route table and guard scope |
//! | [`session`] | Login, logout, current user, password change |
//! | [`transport`] | HTTP seam (`reqwest` natively, `gloo-net` in the browser) |
//! | [`config`] | API client settings from the environment |
//! | [`validation`] | Login form checks run before any network call |
//! | [`types`] | Wire DTOs shared with the remote API |
//! | [`error`] | Error taxonomy |

pub mod config;
pub mod error;
pub mod guard;
pub mod navigate;
pub mod pipeline;
pub mod routes;
pub mod session;
pub mod store;
pub mod transport;
pub mod types;
pub mod validation;

#[cfg(test)]
#[path = "test_helpers_test.rs"]
pub(crate) mod test_helpers;

pub use error::{ApiError, ConfigError, ErrorKind, StoreError};
pub use guard::{GuardOutcome, Verdict, evaluate};
pub use navigate::Navigator;
pub use pipeline::ApiClient;
pub use routes::RouteTable;
pub use session::{SessionController, SessionError};
pub use store::{CredentialStore, Credentials, DualChannelStore};
pub use types::User;
