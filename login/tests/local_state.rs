use estate_login::CookieDotJson;
use estate_login::FileSessionStore;
use estate_login::Role;
use estate_login::SessionStore;
use tempfile::tempdir;

#[test]
fn remove_local_state_logs_out_without_the_server() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let store = FileSessionStore::load(dir.path())?;
    store.set_session("access-1".to_string(), Some(Role::User))?;
    estate_login::write_cookies(
        dir.path(),
        &CookieDotJson::from_header_value("http://localhost:8080/api/auth/refresh", "refreshToken=r1"),
    )?;

    assert!(estate_login::remove_local_state(dir.path())?);

    let reloaded = FileSessionStore::load(dir.path())?;
    assert_eq!(reloaded.credential(), None);
    assert_eq!(estate_login::read_cookies(dir.path())?, None);

    // Nothing left to remove.
    assert!(!estate_login::remove_local_state(dir.path())?);
    Ok(())
}
