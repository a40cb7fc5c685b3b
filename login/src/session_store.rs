use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use std::fs::File;
use std::fs::OpenOptions;
#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;
use std::path::PathBuf;
use std::sync::PoisonError;
use std::sync::RwLock;
use tracing::debug;

use crate::Role;
use crate::cookie_store::clear_cookies;

/// The credential/role pair the client currently acts under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Opaque bearer credential. Never inspected client-side.
    pub access_token: String,
    pub role: Option<Role>,
}

/// Single source of truth for "is someone logged in, and as what".
///
/// Writes are last-write-wins; a store holds at most one session. Reads are
/// synchronous so the HTTP layer can consult the store on every request.
pub trait SessionStore: Send + Sync {
    fn session(&self) -> Option<Session>;

    fn credential(&self) -> Option<String> {
        self.session().map(|s| s.access_token)
    }

    fn role(&self) -> Option<Role> {
        self.session().and_then(|s| s.role)
    }

    fn set_session(&self, access_token: String, role: Option<Role>) -> std::io::Result<()>;

    /// Replace the credential and keep whatever role is already stored.
    fn update_credential(&self, access_token: String) -> std::io::Result<()> {
        let role = self.role();
        self.set_session(access_token, role)
    }

    fn clear_session(&self) -> std::io::Result<()>;
}

/// Session kept only for the lifetime of the process.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    inner: RwLock<Option<Session>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(access_token: impl Into<String>, role: Option<Role>) -> Self {
        Self {
            inner: RwLock::new(Some(Session {
                access_token: access_token.into(),
                role,
            })),
        }
    }
}

impl SessionStore for InMemorySessionStore {
    fn session(&self) -> Option<Session> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_session(&self, access_token: String, role: Option<Role>) -> std::io::Result<()> {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Some(Session { access_token, role });
        Ok(())
    }

    fn clear_session(&self) -> std::io::Result<()> {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        *guard = None;
        Ok(())
    }
}

/// On-disk shape of `session.json`. Key names are fixed so other tools can
/// read the same file.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct SessionDotJson {
    #[serde(rename = "accessToken")]
    pub access_token: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,

    #[serde(rename = "savedAt", default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
}

pub fn get_session_file(estate_home: &Path) -> PathBuf {
    estate_home.join("session.json")
}

/// Session persisted to `session.json` inside the estate home, cached in
/// memory so reads never touch the disk.
#[derive(Debug)]
pub struct FileSessionStore {
    session_file: PathBuf,
    cached: RwLock<Option<Session>>,
}

impl FileSessionStore {
    /// Load whatever session is on disk. A missing file means "logged out";
    /// a file that cannot be parsed is an error.
    pub fn load(estate_home: &Path) -> std::io::Result<Self> {
        let session_file = get_session_file(estate_home);
        let cached = match try_read_session_json(&session_file) {
            Ok(on_disk) => Some(Session {
                access_token: on_disk.access_token,
                role: on_disk.role,
            }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => None,
            Err(err) => return Err(err),
        };
        Ok(Self {
            session_file,
            cached: RwLock::new(cached),
        })
    }

    pub fn session_file(&self) -> &Path {
        &self.session_file
    }
}

impl SessionStore for FileSessionStore {
    fn session(&self) -> Option<Session> {
        self.cached
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_session(&self, access_token: String, role: Option<Role>) -> std::io::Result<()> {
        let mut guard = self.cached.write().unwrap_or_else(PoisonError::into_inner);
        let on_disk = SessionDotJson {
            access_token: access_token.clone(),
            role,
            saved_at: Some(Utc::now()),
        };
        write_session_json(&self.session_file, &on_disk)?;
        *guard = Some(Session { access_token, role });
        Ok(())
    }

    fn clear_session(&self) -> std::io::Result<()> {
        let mut guard = self.cached.write().unwrap_or_else(PoisonError::into_inner);
        *guard = None;
        match std::fs::remove_file(&self.session_file) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err),
        }
    }
}

/// Attempt to read and deserialize the `session.json` file at the given path.
pub fn try_read_session_json(session_file: &Path) -> std::io::Result<SessionDotJson> {
    let mut file = File::open(session_file)?;
    let mut contents = String::new();
    use std::io::Read as _;
    file.read_to_string(&mut contents)?;
    let session: SessionDotJson = serde_json::from_str(&contents)?;
    Ok(session)
}

pub(crate) fn write_session_json(
    session_file: &Path,
    session: &SessionDotJson,
) -> std::io::Result<()> {
    if let Some(parent) = session_file.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json_data = serde_json::to_string_pretty(session)?;
    let mut options = OpenOptions::new();
    options.truncate(true).write(true).create(true);
    #[cfg(unix)]
    {
        options.mode(0o600);
    }
    let mut file = options.open(session_file)?;
    use std::io::Write as _;
    file.write_all(json_data.as_bytes())?;
    file.flush()?;
    debug!("wrote session to {}", session_file.display());
    Ok(())
}

/// Delete the session and cookie files inside `estate_home`. Returns
/// `Ok(true)` if anything was removed. Equivalent to logging out locally
/// without telling the server.
pub fn remove_local_state(estate_home: &Path) -> std::io::Result<bool> {
    let removed_session = match std::fs::remove_file(get_session_file(estate_home)) {
        Ok(()) => true,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => false,
        Err(err) => return Err(err),
    };
    let removed_cookies = clear_cookies(estate_home)?;
    Ok(removed_session || removed_cookies)
}
