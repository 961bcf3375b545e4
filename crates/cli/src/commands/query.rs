//! `query` command implementation.

use anyhow::Result;
use std::io::Read;
use tracing::debug;

use query_builder::{ListRequest, QueryDocument};

use crate::cli::QueryArgs;
use crate::error::{self, CliError};

/// Execute the `query` command
///
/// Reads the request from `--request`, `--file` or stdin.
pub fn run_query(args: &QueryArgs) -> Result<()> {
    let raw = read_request(args)?;
    let document = build_document(&raw)?;

    let output = if args.pretty {
        serde_json::to_string_pretty(&document)?
    } else {
        serde_json::to_string(&document)?
    };
    println!("{}", output);
    Ok(())
}

fn read_request(args: &QueryArgs) -> error::Result<String> {
    if let Some(request) = &args.request {
        return Ok(request.clone());
    }
    if let Some(path) = &args.file {
        return Ok(std::fs::read_to_string(path)?);
    }

    let mut buf = String::new();
    std::io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

fn build_document(raw: &str) -> error::Result<QueryDocument> {
    let request = if raw.trim().is_empty() {
        ListRequest::default()
    } else {
        ListRequest::from_json(raw)?
    };

    debug!(
        filters = request.filters.as_ref().map_or(0, |f| f.len()),
        "List request decoded"
    );
    Ok(request.to_query())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_build_document() {
        let document = build_document(
            r#"{"filters": {"role": [{"operation": "nin", "value": ["GUEST"], "dataType": "array"}]}, "limit": 5}"#,
        )
        .unwrap();

        assert_eq!(document.where_clause, json!({"role": {"notIn": ["GUEST"]}}));
        assert_eq!(document.take, 5);
    }

    #[test]
    fn test_empty_input_is_default_request() {
        let document = build_document("  ").unwrap();
        assert_eq!(document.where_clause, json!({}));
    }

    #[test]
    fn test_invalid_request() {
        let err = build_document(r#"{"filters": {"a": [{"operation": "eq"}]}}"#).unwrap_err();
        assert!(matches!(err, CliError::Query(_)));
    }

    #[test]
    fn test_read_inline_request() {
        let args = QueryArgs {
            request: Some("{}".into()),
            file: None,
            pretty: false,
        };
        assert_eq!(read_request(&args).unwrap(), "{}");
    }
}
