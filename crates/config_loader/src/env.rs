//! 环境变量覆盖
//!
//! 每个 destination 的 endpoint 可由 `<SCREAMING_SNAKE_NAME>_QUEUE_URL` 覆盖，
//! 例如 `emailNotifications` -> `EMAIL_NOTIFICATIONS_QUEUE_URL`。

use contracts::DispatchConfig;
use tracing::info;

/// 计算 destination 对应的环境变量名
pub fn endpoint_env_var(destination: &str) -> String {
    let mut out = String::with_capacity(destination.len() + 12);
    let mut prev_lower = false;

    for ch in destination.chars() {
        if ch.is_ascii_alphanumeric() {
            if ch.is_ascii_uppercase() && prev_lower {
                out.push('_');
            }
            prev_lower = ch.is_ascii_lowercase() || ch.is_ascii_digit();
            out.push(ch.to_ascii_uppercase());
        } else {
            if !out.ends_with('_') && !out.is_empty() {
                out.push('_');
            }
            prev_lower = false;
        }
    }

    out.push_str("_QUEUE_URL");
    out
}

/// 使用进程环境变量覆盖 endpoint
pub fn apply_env_overrides(config: &mut DispatchConfig) -> usize {
    apply_overrides_with(config, |key| std::env::var(key).ok())
}

/// 使用自定义查找函数覆盖 endpoint，返回被覆盖的数量
pub fn apply_overrides_with<F>(config: &mut DispatchConfig, lookup: F) -> usize
where
    F: Fn(&str) -> Option<String>,
{
    let mut applied = 0;
    for (name, endpoint) in config.destinations.iter_mut() {
        let var = endpoint_env_var(name);
        if let Some(value) = lookup(&var) {
            info!(destination = %name, env = %var, "Endpoint overridden from environment");
            *endpoint = value;
            applied += 1;
        }
    }
    applied
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeMap, HashMap};

    #[test]
    fn test_env_var_names() {
        assert_eq!(
            endpoint_env_var("emailNotifications"),
            "EMAIL_NOTIFICATIONS_QUEUE_URL"
        );
        assert_eq!(endpoint_env_var("audit"), "AUDIT_QUEUE_URL");
        assert_eq!(endpoint_env_var("sms-alerts"), "SMS_ALERTS_QUEUE_URL");
        assert_eq!(endpoint_env_var("v2Events"), "V2_EVENTS_QUEUE_URL");
    }

    #[test]
    fn test_overrides_only_matching() {
        let mut config = DispatchConfig {
            destinations: BTreeMap::from([
                ("emailNotifications".to_string(), String::new()),
                ("audit".to_string(), "https://queue.example.com/audit".to_string()),
            ]),
            ..Default::default()
        };
        let env = HashMap::from([(
            "EMAIL_NOTIFICATIONS_QUEUE_URL".to_string(),
            "https://queue.example.com/email".to_string(),
        )]);

        let applied = apply_overrides_with(&mut config, |k| env.get(k).cloned());

        assert_eq!(applied, 1);
        assert_eq!(
            config.destinations["emailNotifications"],
            "https://queue.example.com/email"
        );
        assert_eq!(
            config.destinations["audit"],
            "https://queue.example.com/audit"
        );
    }
}
