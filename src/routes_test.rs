use super::*;

#[test]
fn default_table_is_login_and_root_public() {
    let routes = RouteTable::default();
    assert_eq!(routes.login(), "/login");
    assert_eq!(routes.root(), "/");
    assert_eq!(routes.dashboard(), "/dashboard");
    assert!(routes.is_public("/login"));
    assert!(routes.is_public("/"));
    assert!(!routes.is_public("/dashboard"));
    assert!(!routes.is_public("/menu"));
}

#[test]
fn default_matches_new() {
    assert_eq!(RouteTable::new("/login", "/", "/dashboard").unwrap(), RouteTable::default());
}

#[test]
fn paths_are_normalized() {
    let routes = RouteTable::new(" /signin/ ", "/", "/home/").unwrap();
    assert_eq!(routes.login(), "/signin");
    assert_eq!(routes.dashboard(), "/home");
    assert!(routes.is_public("/signin"));
}

#[test]
fn relative_paths_are_rejected() {
    assert!(matches!(
        RouteTable::new("login", "/", "/dashboard"),
        Err(ConfigError::Invalid { key: "LOGIN_PATH", .. })
    ));
}

#[test]
fn looping_tables_are_rejected() {
    assert!(RouteTable::new("/", "/", "/dashboard").is_err());
    assert!(RouteTable::new("/login", "/", "/login").is_err());
    assert!(RouteTable::new("/login", "/", "/").is_err());
    assert!(RouteTable::default().with_public("/dashboard").is_err());
}

#[test]
fn with_public_extends_set_once() {
    let routes = RouteTable::default().with_public("/forgot-password").unwrap().with_public("/forgot-password/").unwrap();
    assert!(routes.is_public("/forgot-password"));
    assert_eq!(routes.public_routes().len(), 3);
}

#[test]
fn scope_excludes_assets_and_api() {
    let scope = GuardScope::default();
    for path in ["/api", "/api/auth/me", "/pkg/app.wasm", "/favicon.ico", "/logo.png", "/img/a.JPG", "/style.css"] {
        assert!(!scope.applies_to(path), "{path} should be excluded");
    }
    for path in ["/", "/login", "/dashboard", "/apis", "/menu/items", "/orders.v2/list"] {
        assert!(scope.applies_to(path), "{path} should be guarded");
    }
}

#[test]
fn scope_prefix_can_be_extended() {
    let scope = GuardScope::default().exclude_prefix("/healthz/");
    assert!(!scope.applies_to("/healthz"));
    assert!(scope.applies_to("/healthzz"));
}

#[test]
fn login_with_return_encodes_path() {
    let routes = RouteTable::default();
    assert_eq!(routes.login_with_return("/dashboard"), "/login?from=/dashboard");
    assert_eq!(routes.login_with_return("/menu items?tab=1"), "/login?from=/menu%20items%3Ftab%3D1");
}

#[test]
fn return_path_round_trips() {
    let routes = RouteTable::default();
    let location = routes.login_with_return("/orders/42?view=full");
    let raw = location.split_once("from=").map(|(_, v)| v);
    assert_eq!(routes.recover_return_path(raw), "/orders/42?view=full");
}

#[test]
fn unsafe_return_paths_fall_back_to_dashboard() {
    let routes = RouteTable::default();
    for from in [None, Some(""), Some("https://evil.test"), Some("//evil.test"), Some("/\\evil"), Some("/login"), Some("/")] {
        assert_eq!(routes.recover_return_path(from), "/dashboard", "{from:?}");
    }
    assert_eq!(routes.recover_return_path(Some("%2F%2Fevil.test")), "/dashboard");
}

#[test]
fn decode_keeps_malformed_escapes() {
    assert_eq!(decode_path_param("/a%2"), "/a%2");
    assert_eq!(decode_path_param("/a%zz"), "/a%zz");
    assert_eq!(decode_path_param("/a+b"), "/a b");
}
