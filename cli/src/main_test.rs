use clap::Parser;

use super::*;

#[test]
fn parses_login_with_return_path() {
    let cli = Cli::try_parse_from([
        "menu-admin",
        "--base-url",
        "http://api.test",
        "login",
        "--email",
        "owner@bistro.test",
        "--password",
        "secret1",
        "--from",
        "/menu",
    ])
    .unwrap();
    assert_eq!(cli.base_url, "http://api.test");
    let Command::Login { email, from, .. } = cli.command else { panic!("expected login") };
    assert_eq!(email, "owner@bistro.test");
    assert_eq!(from.as_deref(), Some("/menu"));
}

#[test]
fn parses_request_method_case_insensitively() {
    let cli = Cli::try_parse_from(["menu-admin", "request", "patch", "/api/menu/4", "--data", "{\"price\":9}"]).unwrap();
    let Command::Request { method, path, data } = cli.command else { panic!("expected request") };
    assert_eq!(method, Method::Patch);
    assert_eq!(path, "/api/menu/4");
    assert_eq!(data.as_deref(), Some("{\"price\":9}"));
}

#[test]
fn rejects_unknown_method() {
    assert!(Cli::try_parse_from(["menu-admin", "request", "TRACE", "/x"]).is_err());
}

#[test]
fn guard_command_takes_a_path() {
    let cli = Cli::try_parse_from(["menu-admin", "guard", "/dashboard"]).unwrap();
    assert!(matches!(cli.command, Command::Guard { ref path } if path == "/dashboard"));
}

#[test]
fn env_file_fills_unset_variables_only() {
    let dir = std::env::temp_dir().join(format!("menu-admin-cli-dotenv-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(".env");
    std::fs::write(&path, "MENU_ADMIN_DOTENV_FILLED=from-file\nMENU_ADMIN_DOTENV_KEPT=from-file\n").unwrap();

    // SAFETY: keys are unique to this test.
    unsafe {
        std::env::remove_var("MENU_ADMIN_DOTENV_FILLED");
        std::env::set_var("MENU_ADMIN_DOTENV_KEPT", "from-shell");
    }
    load_env_file(&path);

    assert_eq!(std::env::var("MENU_ADMIN_DOTENV_FILLED").as_deref(), Ok("from-file"));
    assert_eq!(std::env::var("MENU_ADMIN_DOTENV_KEPT").as_deref(), Ok("from-shell"));
    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn missing_env_file_is_ignored() {
    load_env_file(Path::new("/nonexistent/menu-admin/.env"));
}
