use std::io;
use std::path::Path;

use toml::Value as TomlValue;

pub(crate) const CONFIG_TOML_FILE: &str = "config.toml";

/// Read `config.toml` from the estate home. A missing file is an empty
/// table.
pub(crate) fn load_config_as_toml(estate_home: &Path) -> io::Result<TomlValue> {
    let path = estate_home.join(CONFIG_TOML_FILE);
    match std::fs::read_to_string(&path) {
        Ok(contents) => toml::from_str::<TomlValue>(&contents).map_err(|err| {
            tracing::error!("Failed to parse {}: {err}", path.display());
            io::Error::new(io::ErrorKind::InvalidData, err)
        }),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            tracing::debug!("{} not found, using defaults", path.display());
            Ok(default_empty_table())
        }
        Err(err) => {
            tracing::error!("Failed to read {}: {err}", path.display());
            Err(err)
        }
    }
}

fn default_empty_table() -> TomlValue {
    TomlValue::Table(Default::default())
}

/// Set `value` at the dotted `path`, creating intermediate tables and
/// replacing non-table values in the way.
pub(crate) fn apply_toml_override(root: &mut TomlValue, path: &str, value: TomlValue) {
    let mut current = root;
    let mut segments = path.split('.').peekable();
    while let Some(segment) = segments.next() {
        if !current.is_table() {
            *current = default_empty_table();
        }
        let TomlValue::Table(table) = current else {
            return;
        };
        if segments.peek().is_none() {
            table.insert(segment.to_string(), value);
            return;
        }
        current = table
            .entry(segment.to_string())
            .or_insert_with(default_empty_table);
    }
}
