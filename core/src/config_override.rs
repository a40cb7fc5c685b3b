//! `-c key=value` overrides for `config.toml` settings.

use clap::ArgAction;
use clap::Parser;
use toml::Value as TomlValue;

#[derive(Parser, Debug, Default, Clone)]
pub struct CliConfigOverrides {
    /// Override a setting from `$ESTATE_HOME/config.toml`. May be repeated.
    ///
    /// The value is parsed as TOML and falls back to a plain string when
    /// that fails, so `-c base_url=http://host/api` works without quotes.
    /// Dotted keys reach into tables, e.g. `-c http_headers.X-Trace=1`.
    #[arg(
        short = 'c',
        long = "config",
        value_name = "key=value",
        action = ArgAction::Append,
        global = true,
    )]
    pub raw_overrides: Vec<String>,
}

impl CliConfigOverrides {
    pub fn parse_overrides(&self) -> Result<Vec<(String, TomlValue)>, String> {
        self.raw_overrides
            .iter()
            .map(|raw| {
                let Some((key, value)) = raw.split_once('=') else {
                    return Err(format!("Invalid override (missing '='): {raw}"));
                };
                let key = key.trim();
                if key.is_empty() {
                    return Err(format!("Empty key in override: {raw}"));
                }
                let value = value.trim();
                let value = parse_toml_value(value).unwrap_or_else(|| {
                    TomlValue::String(value.trim_matches(|c| c == '"' || c == '\'').to_string())
                });
                Ok((key.to_string(), value))
            })
            .collect()
    }
}

fn parse_toml_value(raw: &str) -> Option<TomlValue> {
    let wrapped = format!("_x_ = {raw}");
    let mut table: toml::Table = toml::from_str(&wrapped).ok()?;
    table.remove("_x_")
}

#[cfg(test)]
mod tests {
    #![expect(clippy::unwrap_used)]
    use super::*;
    use pretty_assertions::assert_eq;

    fn overrides(raw: &[&str]) -> CliConfigOverrides {
        CliConfigOverrides {
            raw_overrides: raw.iter().map(ToString::to_string).collect(),
        }
    }

    #[test]
    fn parses_toml_scalars_and_falls_back_to_strings() {
        let parsed = overrides(&[
            "request_timeout_ms=5000",
            "coalesce_renewals=false",
            "base_url=http://example.test/api",
            "user_agent=\"estate test\"",
        ])
        .parse_overrides()
        .unwrap();
        assert_eq!(
            parsed,
            vec![
                ("request_timeout_ms".to_string(), TomlValue::Integer(5000)),
                ("coalesce_renewals".to_string(), TomlValue::Boolean(false)),
                (
                    "base_url".to_string(),
                    TomlValue::String("http://example.test/api".to_string())
                ),
                (
                    "user_agent".to_string(),
                    TomlValue::String("estate test".to_string())
                ),
            ]
        );
    }

    #[test]
    fn rejects_missing_equals_and_empty_key() {
        assert!(overrides(&["base_url"]).parse_overrides().is_err());
        assert!(overrides(&["=1"]).parse_overrides().is_err());
    }
}
