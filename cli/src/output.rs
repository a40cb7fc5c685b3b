use std::path::Path;

use anyhow::Context;
use anyhow::Result;
use serde::Serialize;
use serde::de::DeserializeOwned;

pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}

/// Parse a JSON argument. A leading `@` reads the JSON from that file.
pub(crate) fn parse_json_arg<T: DeserializeOwned>(raw: &str) -> Result<T> {
    let (source, contents) = match raw.strip_prefix('@') {
        Some(path) => (
            path.to_string(),
            std::fs::read_to_string(Path::new(path))
                .with_context(|| format!("failed to read {path}"))?,
        ),
        None => ("argument".to_string(), raw.to_string()),
    };
    serde_json::from_str(&contents).with_context(|| format!("invalid JSON in {source}"))
}

#[cfg(test)]
mod tests {
    #![expect(clippy::unwrap_used)]
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::Value;
    use serde_json::json;

    #[test]
    fn reads_inline_and_file_json() {
        let inline: Value = parse_json_arg("{\"title\":\"Flat\"}").unwrap();
        assert_eq!(inline, json!({"title": "Flat"}));

        let dir = tempfile::TempDir::new().unwrap();
        let file = dir.path().join("body.json");
        std::fs::write(&file, "[1, 2]").unwrap();
        let from_file: Vec<i64> = parse_json_arg(&format!("@{}", file.display())).unwrap();
        assert_eq!(from_file, vec![1, 2]);

        assert!(parse_json_arg::<Value>("{oops").is_err());
    }
}
