use anyhow::Result;
use anyhow::anyhow;
use estate_backend_client::Method;
use estate_backend_client::RequestOptions;
use estate_core::Connection;
use serde_json::Value;

use crate::output::parse_json_arg;
use crate::output::print_json;

#[derive(Debug, clap::Parser)]
pub struct RequestArgs {
    /// HTTP method, e.g. GET or POST.
    pub method: String,

    /// Path relative to the base URL, e.g. `/properties/42`.
    pub path: String,

    /// JSON body (inline or `@file`).
    #[arg(long)]
    pub body: Option<String>,

    /// Query parameter as key=value. May be repeated.
    #[arg(long = "query", value_name = "key=value", value_parser = parse_key_value)]
    pub query: Vec<(String, String)>,

    /// Send the call without renewing the session on a 401.
    #[arg(long)]
    pub no_renew: bool,
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got {raw:?}"))?;
    if key.is_empty() {
        return Err(format!("empty key in {raw:?}"));
    }
    Ok((key.to_string(), value.to_string()))
}

pub(crate) async fn run_request(conn: &Connection, args: RequestArgs) -> Result<()> {
    let RequestArgs {
        method,
        path,
        body,
        query,
        no_renew,
    } = args;
    let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
        .map_err(|_| anyhow!("invalid HTTP method: {method}"))?;
    let body: Option<Value> = body.as_deref().map(parse_json_arg::<Value>).transpose()?;

    let mut options = query
        .into_iter()
        .fold(RequestOptions::new(), |opts, (k, v)| opts.query(k, v));
    if no_renew {
        options = options.without_renewal();
    }

    let res = conn.client().request(method, &path, body, options).await?;
    // Non-JSON bodies are printed as a string.
    let value = res
        .json_value()
        .unwrap_or_else(|_| Value::String(res.text()));
    print_json(&value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn key_value_splits_on_first_equals() {
        assert_eq!(
            parse_key_value("q=a=b"),
            Ok(("q".to_string(), "a=b".to_string()))
        );
        assert!(parse_key_value("novalue").is_err());
        assert!(parse_key_value("=x").is_err());
    }
}
