use std::collections::HashMap;
use std::io;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use dirs::home_dir;
use estate_backend_client::DEFAULT_BASE_URL;
use estate_backend_client::DEFAULT_GEOCODER_URL;
use estate_backend_client::RenewalPolicy;
use serde::Deserialize;
use toml::Value as TomlValue;

use crate::config_loader::apply_toml_override;
use crate::config_loader::load_config_as_toml;

/// Environment variable that relocates the estate home.
pub const ESTATE_HOME_ENV_VAR: &str = "ESTATE_HOME";
/// Environment variable that overrides `base_url` from `config.toml`.
pub const BASE_URL_ENV_VAR: &str = "ESTATE_BASE_URL";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to resolve estate home: {0}")]
    Home(#[source] io::Error),

    #[error("failed to read config.toml: {0}")]
    Read(#[source] io::Error),

    #[error("invalid config.toml: {0}")]
    Invalid(#[from] toml::de::Error),

    #[error("invalid value for {key}: {message}")]
    Value { key: &'static str, message: String },
}

/// Raw `config.toml` contents. Every key is optional.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ConfigToml {
    pub base_url: Option<String>,
    pub user_agent: Option<String>,
    pub request_timeout_ms: Option<u64>,
    pub coalesce_renewals: Option<bool>,
    #[serde(default)]
    pub http_headers: HashMap<String, String>,
    pub geocoder_url: Option<String>,
}

/// Effective settings after defaults, environment and `-c` overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub estate_home: PathBuf,
    pub base_url: String,
    pub user_agent: Option<String>,
    pub request_timeout: Option<Duration>,
    pub renewal_policy: RenewalPolicy,
    pub http_headers: HashMap<String, String>,
    pub geocoder_url: String,
}

impl Config {
    /// Load from the estate home found via [`find_estate_home`]. Precedence
    /// is `-c` overrides, then `ESTATE_BASE_URL`, then `config.toml`.
    pub fn load_with_cli_overrides(
        cli_overrides: Vec<(String, TomlValue)>,
    ) -> Result<Self, ConfigError> {
        let estate_home = find_estate_home().map_err(ConfigError::Home)?;
        let env_base_url = std::env::var(BASE_URL_ENV_VAR)
            .ok()
            .filter(|v| !v.trim().is_empty());
        Self::load_from_home(estate_home, env_base_url, cli_overrides)
    }

    pub fn load_from_home(
        estate_home: PathBuf,
        env_base_url: Option<String>,
        cli_overrides: Vec<(String, TomlValue)>,
    ) -> Result<Self, ConfigError> {
        let mut root = load_config_as_toml(&estate_home).map_err(ConfigError::Read)?;
        if let Some(base_url) = env_base_url {
            apply_toml_override(&mut root, "base_url", TomlValue::String(base_url));
        }
        for (path, value) in cli_overrides {
            apply_toml_override(&mut root, &path, value);
        }
        let cfg: ConfigToml = root.try_into()?;
        Self::from_toml(cfg, estate_home)
    }

    fn from_toml(cfg: ConfigToml, estate_home: PathBuf) -> Result<Self, ConfigError> {
        let base_url = cfg
            .base_url
            .map(|url| url.trim().to_string())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::Value {
                key: "base_url",
                message: format!("expected an http(s) URL, got {base_url:?}"),
            });
        }
        let request_timeout = match cfg.request_timeout_ms {
            Some(0) => {
                return Err(ConfigError::Value {
                    key: "request_timeout_ms",
                    message: "must be greater than zero".to_string(),
                });
            }
            Some(ms) => Some(Duration::from_millis(ms)),
            None => None,
        };
        let renewal_policy = match cfg.coalesce_renewals {
            Some(false) => RenewalPolicy::PerRequest,
            Some(true) | None => RenewalPolicy::Coalesce,
        };
        Ok(Self {
            estate_home,
            base_url,
            user_agent: cfg.user_agent,
            request_timeout,
            renewal_policy,
            http_headers: cfg.http_headers,
            geocoder_url: cfg
                .geocoder_url
                .unwrap_or_else(|| DEFAULT_GEOCODER_URL.to_string()),
        })
    }

    /// `(key, value)` rows describing the effective settings.
    pub fn summary_entries(&self) -> Vec<(&'static str, String)> {
        let mut headers: Vec<&String> = self.http_headers.keys().collect();
        headers.sort();
        vec![
            ("estate_home", self.estate_home.display().to_string()),
            ("base_url", self.base_url.clone()),
            (
                "user_agent",
                self.user_agent.clone().unwrap_or_else(|| "(default)".to_string()),
            ),
            (
                "request_timeout_ms",
                self.request_timeout
                    .map(|t| t.as_millis().to_string())
                    .unwrap_or_else(|| "(none)".to_string()),
            ),
            (
                "coalesce_renewals",
                (self.renewal_policy == RenewalPolicy::Coalesce).to_string(),
            ),
            (
                "http_headers",
                headers
                    .into_iter()
                    .map(String::as_str)
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
            ("geocoder_url", self.geocoder_url.clone()),
        ]
    }
}

/// Returns the path to the estate configuration directory, which can be
/// specified by the `ESTATE_HOME` environment variable. If not set, defaults
/// to `~/.estate`.
///
/// - If `ESTATE_HOME` is set, the value will be canonicalized and this
///   function will Err if the path does not exist.
/// - If `ESTATE_HOME` is not set, this function does not verify that the
///   directory exists.
pub fn find_estate_home() -> io::Result<PathBuf> {
    if let Ok(val) = std::env::var(ESTATE_HOME_ENV_VAR)
        && !val.is_empty()
    {
        return PathBuf::from(val).canonicalize();
    }
    let mut p = home_dir().ok_or_else(|| {
        io::Error::new(io::ErrorKind::NotFound, "Could not find home directory")
    })?;
    p.push(".estate");
    Ok(p)
}

/// Path of `config.toml` inside `estate_home`.
pub fn config_file(estate_home: &Path) -> PathBuf {
    estate_home.join(crate::config_loader::CONFIG_TOML_FILE)
}

#[cfg(test)]
mod tests {
    #![expect(clippy::unwrap_used)]
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn load(
        contents: Option<&str>,
        env_base_url: Option<&str>,
        overrides: Vec<(&str, TomlValue)>,
    ) -> Result<Config, ConfigError> {
        let home = TempDir::new().unwrap();
        if let Some(contents) = contents {
            std::fs::write(config_file(home.path()), contents).unwrap();
        }
        Config::load_from_home(
            home.path().to_path_buf(),
            env_base_url.map(str::to_string),
            overrides
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        )
    }

    #[test]
    fn defaults_without_config_file() {
        let config = load(None, None, Vec::new()).unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.renewal_policy, RenewalPolicy::Coalesce);
        assert_eq!(config.request_timeout, None);
        assert_eq!(config.geocoder_url, DEFAULT_GEOCODER_URL);
        assert!(config.http_headers.is_empty());
    }

    #[test]
    fn reads_every_key() {
        let config = load(
            Some(
                r#"
base_url = "https://estate.example/api"
user_agent = "estate-test"
request_timeout_ms = 2500
coalesce_renewals = false
geocoder_url = "http://geo.local"

[http_headers]
X-Client = "cli"
"#,
            ),
            None,
            Vec::new(),
        )
        .unwrap();
        assert_eq!(config.base_url, "https://estate.example/api");
        assert_eq!(config.user_agent.as_deref(), Some("estate-test"));
        assert_eq!(config.request_timeout, Some(Duration::from_millis(2500)));
        assert_eq!(config.renewal_policy, RenewalPolicy::PerRequest);
        assert_eq!(config.geocoder_url, "http://geo.local");
        assert_eq!(
            config.http_headers.get("X-Client").map(String::as_str),
            Some("cli")
        );
    }

    #[test]
    fn cli_overrides_beat_env_which_beats_file() {
        let file = Some("base_url = \"http://file/api\"\n");
        let config = load(file, Some("http://env/api"), Vec::new()).unwrap();
        assert_eq!(config.base_url, "http://env/api");

        let config = load(
            file,
            Some("http://env/api"),
            vec![("base_url", TomlValue::String("http://cli/api".to_string()))],
        )
        .unwrap();
        assert_eq!(config.base_url, "http://cli/api");
    }

    #[test]
    fn wrong_types_and_bad_values_are_errors() {
        assert!(matches!(
            load(Some("request_timeout_ms = \"soon\"\n"), None, Vec::new()),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            load(Some("request_timeout_ms = 0\n"), None, Vec::new()),
            Err(ConfigError::Value {
                key: "request_timeout_ms",
                ..
            })
        ));
        assert!(matches!(
            load(None, None, vec![("base_url", TomlValue::Integer(1))]),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            load(Some("base_url = \"ftp://x\"\n"), None, Vec::new()),
            Err(ConfigError::Value { key: "base_url", .. })
        ));
    }

    #[test]
    fn malformed_file_is_read_error() {
        assert!(matches!(
            load(Some("base_url = "), None, Vec::new()),
            Err(ConfigError::Read(_))
        ));
    }
}
