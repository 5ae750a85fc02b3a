use std::sync::Arc;

use super::memory::{MemoryCookieJar, MemoryStorage};
use super::*;

fn admin() -> User {
    User {
        id: 1,
        username: "ana".into(),
        email: "ana@bistro.test".into(),
        role: "admin".into(),
        restaurant_id: Some(3),
        created_at: None,
        updated_at: None,
    }
}

fn dual() -> (Arc<MemoryCookieJar>, Arc<MemoryStorage>, DualChannelStore) {
    let cookies = Arc::new(MemoryCookieJar::new());
    let script = Arc::new(MemoryStorage::new());
    let store = DualChannelStore::new(cookies.clone(), script.clone());
    (cookies, script, store)
}

/// Script channel whose writes always fail.
struct BrokenStorage;

impl ScriptStorage for BrokenStorage {
    fn get_item(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Ok(None)
    }

    fn set_item(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("quota exceeded".into()))
    }

    fn remove_item(&self, _key: &str) -> Result<(), StoreError> {
        Ok(())
    }
}

#[test]
fn write_populates_both_channels() {
    let (cookies, script, store) = dual();
    let credentials = Credentials { token: "t1".into(), refresh_token: Some("r1".into()), user: Some(admin()) };
    store.write(&credentials).unwrap();

    assert_eq!(store.cookie_token().as_deref(), Some("t1"));
    assert_eq!(store.script_token().as_deref(), Some("t1"));
    assert_eq!(store.refresh_token().as_deref(), Some("r1"));
    assert_eq!(store.read().as_deref(), Some("t1"));
    assert_eq!(store.cached_user(), Some(admin()));
    assert_eq!(cookies.header_value(), "authToken=t1; refreshToken=r1");
    assert_eq!(script.len(), 2);
}

#[test]
fn clear_empties_both_channels() {
    let (cookies, script, store) = dual();
    store
        .write(&Credentials { token: "t1".into(), refresh_token: Some("r1".into()), user: Some(admin()) })
        .unwrap();
    store.clear();

    assert_eq!(store.read(), None);
    assert_eq!(store.cookie_token(), None);
    assert_eq!(store.refresh_token(), None);
    assert_eq!(store.cached_user(), None);
    assert!(script.is_empty());
    assert_eq!(cookies.header_value(), "");
}

#[test]
fn clear_on_empty_store_is_a_no_op() {
    let (_, script, store) = dual();
    store.clear();
    store.clear();
    assert_eq!(store.read(), None);
    assert!(script.is_empty());
}

#[test]
fn read_falls_back_to_cookie() {
    let (cookies, _, store) = dual();
    cookies.set(&CookieSpec::new(TOKEN_COOKIE, "from-cookie", TOKEN_MAX_AGE)).unwrap();
    assert_eq!(store.script_token(), None);
    assert_eq!(store.read().as_deref(), Some("from-cookie"));
}

#[test]
fn read_prefers_script_store() {
    let (cookies, script, store) = dual();
    cookies.set(&CookieSpec::new(TOKEN_COOKIE, "cookie", TOKEN_MAX_AGE)).unwrap();
    script.set_item(TOKEN_KEY, "script").unwrap();
    assert_eq!(store.read().as_deref(), Some("script"));
}

#[test]
fn empty_values_count_as_absent() {
    let (cookies, script, store) = dual();
    cookies.set(&CookieSpec::new(TOKEN_COOKIE, "", TOKEN_MAX_AGE)).unwrap();
    script.set_item(TOKEN_KEY, "").unwrap();
    assert_eq!(store.read(), None);
}

#[test]
fn relogin_without_refresh_drops_old_refresh_and_user() {
    let (_, _, store) = dual();
    store
        .write(&Credentials { token: "t1".into(), refresh_token: Some("r1".into()), user: Some(admin()) })
        .unwrap();
    store.write(&Credentials::new("t2")).unwrap();

    assert_eq!(store.read().as_deref(), Some("t2"));
    assert_eq!(store.refresh_token(), None);
    assert_eq!(store.cached_user(), None);
}

#[test]
fn failed_write_rolls_back_both_channels() {
    let cookies = Arc::new(MemoryCookieJar::new());
    let store = DualChannelStore::new(cookies.clone(), Arc::new(BrokenStorage));

    let err = store.write(&Credentials::new("t1")).unwrap_err();
    assert!(matches!(err, StoreError::Unavailable(_)));
    assert_eq!(store.cookie_token(), None);
    assert_eq!(store.read(), None);
    assert_eq!(cookies.header_value(), "");
}

#[test]
fn cookie_only_store_writes_cookies() {
    let cookies = Arc::new(MemoryCookieJar::new());
    let store = DualChannelStore::cookie_only(cookies.clone());
    store.write(&Credentials { token: "t1".into(), refresh_token: None, user: Some(admin()) }).unwrap();

    assert_eq!(store.read().as_deref(), Some("t1"));
    assert_eq!(store.cached_user(), None);
    store.cache_user(&admin()).unwrap();
    store.clear();
    assert_eq!(cookies.header_value(), "");
}

#[test]
fn unreadable_user_snapshot_is_ignored() {
    let (_, script, store) = dual();
    script.set_item(USER_KEY, "{not json").unwrap();
    assert_eq!(store.cached_user(), None);
}

#[test]
fn cookie_spec_renders_attributes() {
    let spec = CookieSpec::new(TOKEN_COOKIE, "abc", TOKEN_MAX_AGE);
    assert_eq!(spec.to_string(), "authToken=abc; path=/; max-age=604800");
    let removal = CookieSpec::expired(REFRESH_COOKIE);
    assert!(removal.is_removal());
    assert_eq!(removal.to_string(), "refreshToken=; path=/; max-age=0");
}

#[test]
fn cookie_value_parses_header() {
    let header = "theme=dark; authToken=abc.def; refreshToken=";
    assert_eq!(cookie_value(header, TOKEN_COOKIE).as_deref(), Some("abc.def"));
    assert_eq!(cookie_value(header, REFRESH_COOKIE), None);
    assert_eq!(cookie_value(header, "missing"), None);
    assert_eq!(cookie_value("", TOKEN_COOKIE), None);
}

#[test]
fn expired_cookie_is_not_returned() {
    let jar = MemoryCookieJar::new();
    jar.set(&CookieSpec::new("short", "v", time::Duration::seconds(-5))).unwrap();
    assert_eq!(jar.get("short").unwrap(), None);
}

/// Channels whose reads always fail.
struct UnreadableJar;

impl CookieChannel for UnreadableJar {
    fn get(&self, _name: &str) -> Result<Option<String>, StoreError> {
        Err(StoreError::Unavailable("cookies disabled".into()))
    }

    fn set(&self, _cookie: &CookieSpec) -> Result<(), StoreError> {
        Ok(())
    }
}

struct UnreadableStorage;

impl ScriptStorage for UnreadableStorage {
    fn get_item(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Err(StoreError::Unavailable("storage blocked".into()))
    }

    fn set_item(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
        Ok(())
    }

    fn remove_item(&self, _key: &str) -> Result<(), StoreError> {
        Ok(())
    }
}

#[test]
fn read_failures_degrade_to_absent() {
    let store = DualChannelStore::new(Arc::new(UnreadableJar), Arc::new(UnreadableStorage));

    assert_eq!(store.read(), None);
    assert_eq!(store.refresh_token(), None);
    assert_eq!(store.cached_user(), None);
}
