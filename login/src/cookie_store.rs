use serde::Deserialize;
use serde::Serialize;
use std::fs::OpenOptions;
#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;
use std::path::PathBuf;

/// Cookies the backend set for the renewal endpoint, kept between process
/// runs. The refresh cookie is HTTP-only on the server side; the client only
/// ever replays it.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct CookieDotJson {
    /// URL the cookies were captured for.
    pub url: String,
    /// `name=value` pairs.
    #[serde(default)]
    pub cookies: Vec<String>,
}

impl CookieDotJson {
    /// Split a `Cookie:` header value (`a=1; b=2`) into pairs.
    pub fn from_header_value(url: impl Into<String>, header: &str) -> Self {
        let cookies = header
            .split(';')
            .map(str::trim)
            .filter(|pair| !pair.is_empty())
            .map(str::to_string)
            .collect();
        Self {
            url: url.into(),
            cookies,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }
}

pub fn get_cookie_file(estate_home: &Path) -> PathBuf {
    estate_home.join("cookies.json")
}

/// Returns `Ok(None)` when no cookie file exists yet.
pub fn read_cookies(estate_home: &Path) -> std::io::Result<Option<CookieDotJson>> {
    match std::fs::read_to_string(get_cookie_file(estate_home)) {
        Ok(contents) => Ok(Some(serde_json::from_str(&contents)?)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err),
    }
}

/// Persist `cookies`, or remove the file when there is nothing left to keep.
pub fn write_cookies(estate_home: &Path, cookies: &CookieDotJson) -> std::io::Result<()> {
    if cookies.is_empty() {
        clear_cookies(estate_home)?;
        return Ok(());
    }
    std::fs::create_dir_all(estate_home)?;
    let json_data = serde_json::to_string_pretty(cookies)?;
    let mut options = OpenOptions::new();
    options.truncate(true).write(true).create(true);
    #[cfg(unix)]
    {
        options.mode(0o600);
    }
    let mut file = options.open(get_cookie_file(estate_home))?;
    use std::io::Write as _;
    file.write_all(json_data.as_bytes())?;
    file.flush()
}

pub fn clear_cookies(estate_home: &Path) -> std::io::Result<bool> {
    match std::fs::remove_file(get_cookie_file(estate_home)) {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err),
    }
}
