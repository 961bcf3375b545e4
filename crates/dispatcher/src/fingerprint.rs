//! Content fingerprint for deduplication
//!
//! SHA-256 over the canonical JSON of `{"kind": .., "payload": ..}`. Object
//! keys are sorted at every depth so structurally equal payloads hash the
//! same regardless of key order.

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 fingerprint of `(kind, payload)`
pub fn fingerprint(kind: &str, payload: &Value) -> String {
    let mut canonical = String::with_capacity(64);
    canonical.push_str("{\"kind\":");
    canonical.push_str(&Value::from(kind).to_string());
    canonical.push_str(",\"payload\":");
    write_canonical(payload, &mut canonical);
    canonical.push('}');

    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    hex::encode(hasher.finalize())
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();

            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::from(key.as_str()).to_string());
                out.push(':');
                write_canonical(&map[key], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fingerprint_is_hex_sha256() {
        let fp = fingerprint("OTP_EMAIL", &json!({"email": "a@b.c"}));
        assert_eq!(fp.len(), 64);
        assert!(fp.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_key_order_does_not_matter() {
        let a: Value =
            serde_json::from_str(r#"{"email":"a@b.c","meta":{"x":1,"y":[{"b":2,"a":1}]}}"#)
                .unwrap();
        let b: Value =
            serde_json::from_str(r#"{"meta":{"y":[{"a":1,"b":2}],"x":1},"email":"a@b.c"}"#)
                .unwrap();
        assert_eq!(fingerprint("OTP_EMAIL", &a), fingerprint("OTP_EMAIL", &b));
    }

    #[test]
    fn test_kind_and_array_order_matter() {
        let payload = json!({"to": "a@b.c"});
        assert_ne!(
            fingerprint("OTP_EMAIL", &payload),
            fingerprint("WELCOME_EMAIL", &payload)
        );
        assert_ne!(
            fingerprint("K", &json!([1, 2])),
            fingerprint("K", &json!([2, 1]))
        );
    }

    #[test]
    fn test_escaped_strings() {
        let a = fingerprint("K", &json!({"q": "say \"hi\""}));
        let b = fingerprint("K", &json!({"q": "say hi"}));
        assert_ne!(a, b);
    }
}
