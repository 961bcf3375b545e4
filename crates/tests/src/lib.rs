//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试
//! - 配置 -> 传输 -> 调度器 的端到端流程
//! - 列表查询请求的端到端构建

#[cfg(test)]
mod contract_tests {
    use contracts::{encode_batch, Message, Priority, QueueEnvelope};
    use serde_json::json;

    #[test]
    fn test_contracts_compile() {
        let _ = contracts::ConfigVersion::V1;
    }

    /// 队列消费者依赖的 envelope 形状
    #[test]
    fn test_envelope_wire_shape() {
        let message = Message::new(
            "auditEvents",
            "USER_LOGIN",
            json!({"userId": 42}),
            Priority::Low,
        );
        let envelope = serde_json::to_value(QueueEnvelope::from_message(&message).unwrap()).unwrap();

        assert_eq!(envelope["body"]["type"], "USER_LOGIN");
        assert_eq!(envelope["body"]["data"], json!({"userId": 42}));
        assert_eq!(envelope["body"]["priority"], "LOW");
        assert_eq!(envelope["body"]["retryCount"], 0);
        assert_eq!(envelope["attributes"]["Priority"], "LOW");
        assert_eq!(envelope["attributes"]["MessageType"], "USER_LOGIN");

        let batch = encode_batch(std::slice::from_ref(&message)).unwrap();
        assert_eq!(batch[0].id, format!("{}-0", message.id));
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::time::Duration;

    use config_loader::{apply_overrides_with, ConfigFormat, ConfigLoader};
    use contracts::{EmailKind, EmailNotification, Priority};
    use dispatcher::{create_transport, AnyTransport, DispatcherBuilder, MemoryTransport, SubmitOutcome};
    use serde_json::{json, Value};
    use tempfile::tempdir;

    fn file_config(base_path: &std::path::Path) -> String {
        format!(
            r#"
[dispatcher]
batch_size = 3
batch_delay_ms = 1000

[transport]
kind = "file"
[transport.params]
base_path = "{}"

[destinations]
emailNotifications = "email"
auditEvents = "audit"
smsNotifications = ""
"#,
            base_path.display().to_string().replace('\\', "/")
        )
    }

    fn read_lines(path: &std::path::Path) -> Vec<Value> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    /// End-to-end: TOML config -> ConfigLoader -> FileTransport -> Dispatcher
    ///
    /// 验证：
    /// 1. HIGH 消息立即写入
    /// 2. 普通消息在 shutdown 时以批次写入
    /// 3. 重复消息被抑制
    #[tokio::test]
    async fn test_e2e_file_pipeline() {
        let dir = tempdir().unwrap();
        let config = ConfigLoader::load_from_str(&file_config(dir.path()), ConfigFormat::Toml)
            .unwrap();

        let transport = create_transport(&config.transport).unwrap();
        assert!(matches!(transport, AnyTransport::File(_)));
        let dispatcher = DispatcherBuilder::new(config, transport).build().unwrap();

        let otp = EmailNotification::new(
            EmailKind::OtpEmail,
            "user@example.com",
            "Your OTP Code",
            "<p>123456</p>",
        );
        let outcome = dispatcher
            .send_email_notification(otp, None)
            .await
            .unwrap();
        assert!(matches!(outcome, SubmitOutcome::Delivered { .. }));

        for user in [1, 2] {
            dispatcher
                .submit("auditEvents", "USER_LOGIN", json!({"userId": user}), None)
                .await
                .unwrap();
        }
        let duplicate = dispatcher
            .submit("auditEvents", "USER_LOGIN", json!({"userId": 1}), None)
            .await
            .unwrap();
        assert!(duplicate.is_duplicate());
        assert_eq!(dispatcher.pending("auditEvents"), 2);

        let failures = dispatcher.shutdown().await;
        assert!(failures.is_empty());

        let email = read_lines(&dir.path().join("email.jsonl"));
        assert_eq!(email.len(), 1);
        assert_eq!(email[0]["body"]["type"], "OTP_EMAIL");
        assert_eq!(email[0]["body"]["priority"], "HIGH");

        let audit = read_lines(&dir.path().join("audit.jsonl"));
        assert_eq!(audit.len(), 2);
        assert_eq!(audit[0]["body"]["data"], json!({"userId": 1}));
        assert_eq!(audit[1]["body"]["data"], json!({"userId": 2}));

        let metrics = dispatcher.metrics();
        assert_eq!(metrics.immediate_sends, 1);
        assert_eq!(metrics.batches_sent, 1);
        assert_eq!(metrics.duplicates, 1);
    }

    /// 未配置 endpoint 的目标在 env 覆盖后可用
    #[tokio::test]
    async fn test_e2e_env_override_enables_destination() {
        let dir = tempdir().unwrap();
        let mut config = ConfigLoader::load_from_str(&file_config(dir.path()), ConfigFormat::Toml)
            .unwrap();

        let transport = MemoryTransport::new("memory");
        let observer = transport.clone();
        let dispatcher = DispatcherBuilder::new(config.clone(), transport.clone())
            .build()
            .unwrap();
        let err = dispatcher
            .submit("smsNotifications", "OTP_SMS", json!({"to": "+100"}), Some(Priority::High))
            .await
            .unwrap_err();
        assert!(err.is_configuration());

        let applied = apply_overrides_with(&mut config, |key| {
            (key == "SMS_NOTIFICATIONS_QUEUE_URL").then(|| "sms".to_string())
        });
        assert_eq!(applied, 1);

        let dispatcher = DispatcherBuilder::new(config, transport).build().unwrap();
        dispatcher
            .submit("smsNotifications", "OTP_SMS", json!({"to": "+100"}), Some(Priority::High))
            .await
            .unwrap();

        let singles = observer.singles();
        assert_eq!(singles.len(), 1);
        assert_eq!(singles[0].destination, "smsNotifications");
    }

    /// 定时刷新失败通过 failure channel 通知，消息被丢弃
    #[tokio::test(start_paused = true)]
    async fn test_e2e_timer_flush_failure_is_reported() {
        let dir = tempdir().unwrap();
        let config = ConfigLoader::load_from_str(&file_config(dir.path()), ConfigFormat::Toml)
            .unwrap();

        let transport = MemoryTransport::new("memory");
        transport.fail_destination("auditEvents");
        let dispatcher = DispatcherBuilder::new(config, transport).build().unwrap();
        let mut failures = dispatcher.subscribe_failures();

        dispatcher
            .submit("auditEvents", "USER_LOGIN", json!({"userId": 9}), None)
            .await
            .unwrap();
        assert!(dispatcher.timer_armed());

        tokio::time::sleep(Duration::from_millis(1010)).await;
        let failure = failures.recv().await.unwrap();

        assert_eq!(failure.destination, "auditEvents");
        assert_eq!(failure.messages.len(), 1);
        assert_eq!(dispatcher.pending_total(), 0);
        assert_eq!(dispatcher.metrics().messages_lost, 1);
    }

    /// List request JSON -> where / orderBy / skip / take
    #[test]
    fn test_e2e_list_request_to_query() {
        let request = query_builder::ListRequest::from_json(
            r#"{
                "filters": {
                    "status": [{"operation": "eq", "value": "ACTIVE", "dataType": "string"}],
                    "age": [
                        {"operation": "gte", "value": 18, "dataType": "number"},
                        {"operation": "lt", "value": "65", "dataType": "number"}
                    ]
                },
                "sort": [{"order": -1, "orderBy": "createdAt"}],
                "page": 3,
                "limit": 20
            }"#,
        )
        .unwrap();

        let document = request.to_query();
        assert_eq!(document.skip, 40);
        assert_eq!(document.take, 20);
        assert_eq!(document.order_by, Some(json!({"createdAt": "desc"})));
        assert_eq!(document.where_clause["age"], json!({"gte": 18}));
        assert_eq!(document.where_clause["status"], json!({"equals": "ACTIVE"}));

        let rendered = serde_json::to_value(&document).unwrap();
        assert!(rendered.get("where").is_some());
        assert!(rendered.get("orderBy").is_some());
    }
}
