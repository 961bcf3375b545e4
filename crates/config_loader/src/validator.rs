//! 配置校验模块
//!
//! 校验规则：
//! - 数值配置 >= 1 (batch_size / batch_delay_ms / dedup_capacity)
//! - destination 名称非空且不含空白
//! - http 传输：endpoint 必须是 http(s) URL
//! - file 传输：endpoint 必须是合法文件名
//! - 空 endpoint 允许 (表示未配置，提交时报错)

use contracts::{ContractError, DispatchConfig, TransportKind};
use url::Url;

/// 校验 DispatchConfig 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(config: &DispatchConfig) -> Result<(), ContractError> {
    config.check()?;
    validate_destination_names(config)?;
    validate_endpoints(config)?;
    validate_transport_params(config)?;
    Ok(())
}

/// 校验 destination 名称
fn validate_destination_names(config: &DispatchConfig) -> Result<(), ContractError> {
    for name in config.destinations.keys() {
        if name.trim().is_empty() {
            return Err(ContractError::config_validation(
                "destinations",
                "destination name cannot be empty",
            ));
        }
        if name.chars().any(char::is_whitespace) {
            return Err(ContractError::config_validation(
                format!("destinations.{name}"),
                "destination name cannot contain whitespace",
            ));
        }
    }
    Ok(())
}

/// 按传输类型校验 endpoint
fn validate_endpoints(config: &DispatchConfig) -> Result<(), ContractError> {
    for (name, endpoint) in &config.destinations {
        let endpoint = endpoint.trim();
        if endpoint.is_empty() {
            continue;
        }

        match config.transport.kind {
            TransportKind::Http => validate_http_endpoint(name, endpoint)?,
            TransportKind::File => validate_file_endpoint(name, endpoint)?,
            TransportKind::Log | TransportKind::Memory => {}
        }
    }
    Ok(())
}

fn validate_http_endpoint(name: &str, endpoint: &str) -> Result<(), ContractError> {
    let url = Url::parse(endpoint).map_err(|e| {
        ContractError::config_validation(
            format!("destinations.{name}"),
            format!("invalid endpoint URL '{endpoint}': {e}"),
        )
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ContractError::config_validation(
            format!("destinations.{name}"),
            format!("endpoint scheme must be http or https, got '{}'", url.scheme()),
        ));
    }
    Ok(())
}

fn validate_file_endpoint(name: &str, endpoint: &str) -> Result<(), ContractError> {
    if endpoint.contains(['/', '\\']) || endpoint.contains("..") {
        return Err(ContractError::config_validation(
            format!("destinations.{name}"),
            format!("file endpoint '{endpoint}' must be a plain file stem"),
        ));
    }
    Ok(())
}

/// 校验数值型传输参数
fn validate_transport_params(config: &DispatchConfig) -> Result<(), ContractError> {
    if let Some(raw) = config.transport.params.get("timeout_ms") {
        match raw.parse::<u64>() {
            Ok(ms) if ms > 0 => {}
            _ => {
                return Err(ContractError::config_validation(
                    "transport.params.timeout_ms",
                    format!("timeout_ms must be a positive integer, got '{raw}'"),
                ));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{DispatcherSettings, TransportConfig};
    use std::collections::{BTreeMap, HashMap};

    fn minimal_config() -> DispatchConfig {
        DispatchConfig {
            version: Default::default(),
            dispatcher: DispatcherSettings::default(),
            transport: TransportConfig {
                kind: TransportKind::Http,
                params: HashMap::new(),
            },
            destinations: BTreeMap::from([(
                "emailNotifications".to_string(),
                "https://queue.example.com/123/email".to_string(),
            )]),
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(validate(&minimal_config()).is_ok());
    }

    #[test]
    fn test_empty_endpoint_allowed() {
        let mut config = minimal_config();
        config
            .destinations
            .insert("emailNotifications".into(), String::new());
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_invalid_batch_size() {
        let mut config = minimal_config();
        config.dispatcher.batch_size = 0;
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("batch_size must be >= 1"), "got: {err}");
    }

    #[test]
    fn test_invalid_http_endpoint() {
        let mut config = minimal_config();
        config
            .destinations
            .insert("emailNotifications".into(), "not a url".into());
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("invalid endpoint URL"), "got: {err}");
    }

    #[test]
    fn test_non_http_scheme() {
        let mut config = minimal_config();
        config
            .destinations
            .insert("emailNotifications".into(), "ftp://queue.example.com".into());
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("scheme"), "got: {err}");
    }

    #[test]
    fn test_file_endpoint_path_traversal() {
        let mut config = minimal_config();
        config.transport.kind = TransportKind::File;
        config
            .destinations
            .insert("emailNotifications".into(), "../etc/passwd".into());
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("plain file stem"), "got: {err}");
    }

    #[test]
    fn test_whitespace_destination_name() {
        let mut config = minimal_config();
        config
            .destinations
            .insert("email notifications".into(), String::new());
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("whitespace"), "got: {err}");
    }

    #[test]
    fn test_bad_timeout_param() {
        let mut config = minimal_config();
        config
            .transport
            .params
            .insert("timeout_ms".into(), "soon".into());
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("timeout_ms"), "got: {err}");
    }
}
