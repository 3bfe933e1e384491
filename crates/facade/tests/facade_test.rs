//! Integration tests for the log facade.

#[cfg(test)]
mod tests {
    use logfacade::{
        to_context, Destination, FacadeError, Level, LevelFilter, LogFacade, LoggerOptions,
        MemorySink, NormalizedError, Redaction,
    };
    use serde_json::{json, Value};

    fn create_test_facade() -> (LogFacade, MemorySink) {
        let sink = MemorySink::new();
        let facade = LogFacade::new();
        facade
            .initialize(Some(
                LoggerOptions::new()
                    .with_level(Level::Trace)
                    .with_destination(Destination::Memory(sink.clone())),
            ))
            .unwrap();
        (facade, sink)
    }

    #[tokio::test]
    async fn test_levels_produce_structured_records() {
        let (log, sink) = create_test_facade();
        let context = || Some(to_context(json!({ "userId": "123" })));

        log.info("Test message", context()).unwrap();
        log.debug("Test message", context()).unwrap();
        log.warn("Test message", context()).unwrap();
        log.trace("Test message", context()).unwrap();
        log.flush().await.unwrap();

        let records = sink.records();
        assert_eq!(records.len(), 4);
        for record in &records {
            assert_eq!(record["msg"], "Test message");
            assert_eq!(record["userId"], "123");
            assert!(record["time"].is_string());
            assert!(record["hostname"].is_string());
        }
        let levels: Vec<&str> = records.iter().map(|r| r["level"].as_str().unwrap()).collect();
        assert_eq!(levels, vec!["INFO", "DEBUG", "WARN", "TRACE"]);
    }

    #[tokio::test]
    async fn test_error_with_code_is_formatted() {
        let (log, sink) = create_test_facade();
        let error = NormalizedError::new("Test error").field("code", "TEST_ERROR");

        log.error(error, "Error occurred", Some(to_context(json!({ "userId": "123" }))))
            .unwrap();
        log.flush().await.unwrap();

        let record = &sink.records()[0];
        assert_eq!(record["level"], "ERROR");
        assert_eq!(record["msg"], "Error occurred");
        assert_eq!(record["userId"], "123");
        assert_eq!(record["error"]["type"], "Error");
        assert_eq!(record["error"]["message"], "Test error");
        assert_eq!(record["error"]["code"], "TEST_ERROR");
        assert!(!record["error"]["stackTrace"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_non_error_objects_are_accepted() {
        let (log, sink) = create_test_facade();

        log.error(json!({ "custom": "error", "reason": "test" }), "Custom error", None)
            .unwrap();
        log.fatal(Value::Null, "Nothing thrown", None).unwrap();
        log.flush().await.unwrap();

        let records = sink.records();
        assert_eq!(records[0]["error"]["message"], r#"{"custom":"error","reason":"test"}"#);
        assert_eq!(records[1]["level"], "FATAL");
        assert_eq!(records[1]["error"]["message"], "null");
    }

    #[tokio::test]
    async fn test_native_errors_are_accepted() {
        let (log, sink) = create_test_facade();
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only volume");

        log.error(io, "Write failed", None).unwrap();
        log.flush().await.unwrap();

        let record = &sink.records()[0];
        assert_eq!(record["error"]["message"], "read-only volume");
        assert_eq!(record["error"]["code"], "PermissionDenied");
    }

    #[tokio::test]
    async fn test_global_context_is_kept_across_logs() {
        let (log, sink) = create_test_facade();
        log.set_context(to_context(json!({ "service": "test-service" }))).unwrap();

        log.info("Test message", None).unwrap();
        log.error("Test", "Error message", None).unwrap();
        log.flush().await.unwrap();

        let records = sink.records();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r["service"] == "test-service"));
    }

    #[tokio::test]
    async fn test_global_and_call_context_are_flattened() {
        let (log, sink) = create_test_facade();
        log.set_context(to_context(json!({ "service": "test-service", "requestId": "old" })))
            .unwrap();

        log.info("Test message", Some(to_context(json!({ "requestId": "123" }))))
            .unwrap();
        log.flush().await.unwrap();

        let record = &sink.records()[0];
        assert_eq!(record["service"], "test-service");
        assert_eq!(record["requestId"], "123");
        assert!(record.get("context").is_none());
    }

    #[tokio::test]
    async fn test_cleared_context_is_not_logged() {
        let (log, sink) = create_test_facade();
        log.set_context(to_context(json!({ "service": "test-service" }))).unwrap();
        log.clear_context().unwrap();

        log.info("Test message", None).unwrap();
        log.flush().await.unwrap();

        assert!(log.context().is_empty());
        assert!(sink.records()[0].get("service").is_none());
    }

    #[tokio::test]
    async fn test_child_logger_carries_bindings() {
        let (log, sink) = create_test_facade();

        let child = log.child(to_context(json!({ "component": "auth" }))).unwrap();
        child
            .raw()
            .emit(Level::Info, to_context(json!({ "requestId": "123" })), "Child log message")
            .unwrap();
        child.info("Through the child facade", None).unwrap();
        log.flush().await.unwrap();

        let records = sink.records();
        assert_eq!(records.len(), 2);
        for record in &records {
            assert_eq!(record["component"], "auth");
        }
        assert_eq!(records[0]["requestId"], "123");
    }

    #[tokio::test]
    async fn test_sensitive_fields_never_reach_output() {
        let (log, sink) = create_test_facade();
        log.set_context(to_context(json!({ "token": "global-token" }))).unwrap();

        log.info(
            "User login",
            Some(to_context(json!({
                "user": "ada",
                "password": "hunter2",
                "request": { "headers": { "authorization": "Bearer abc" } }
            }))),
        )
        .unwrap();
        log.error(json!({ "message": "bad creds", "secret": "s3" }), "Login failed", None)
            .unwrap();
        log.flush().await.unwrap();

        for line in sink.lines() {
            for key in ["password", "token", "authorization", "secret"] {
                assert!(!line.contains(&format!("\"{}\"", key)), "{} leaked in {}", key, line);
            }
        }
        assert_eq!(sink.records()[1]["error"]["message"], "bad creds");
    }

    #[tokio::test]
    async fn test_custom_redaction_replaces_defaults() {
        let sink = MemorySink::new();
        let log = LogFacade::new();
        log.initialize(Some(
            LoggerOptions::new()
                .with_destination(Destination::Memory(sink.clone()))
                .with_redact(Redaction::censor(["card.number"], "****")),
        ))
        .unwrap();

        log.info(
            "Charge",
            Some(to_context(json!({ "card": { "number": "4242" }, "password": "p" }))),
        )
        .unwrap();
        log.flush().await.unwrap();

        let record = &sink.records()[0];
        assert_eq!(record["card"]["number"], "****");
        // the default paths were replaced, not extended
        assert_eq!(record["password"], "p");
    }

    #[tokio::test]
    async fn test_second_initialize_is_ignored() {
        let sink = MemorySink::new();
        let log = LogFacade::new();
        log.initialize(Some(
            LoggerOptions::new()
                .with_level(Level::Debug)
                .with_destination(Destination::Memory(sink.clone())),
        ))
        .unwrap();
        log.initialize(Some(LoggerOptions::new().with_level(Level::Trace)))
            .unwrap();

        log.trace("dropped", None).unwrap();
        log.debug("kept", None).unwrap();
        log.flush().await.unwrap();

        assert_eq!(log.raw().unwrap().options().level, LevelFilter::Debug);
        assert!(!log.is_level_enabled(Level::Trace).unwrap());
        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["msg"], "kept");
    }

    #[tokio::test]
    async fn test_set_context_before_initialize_locks_in_defaults() {
        let log = LogFacade::new();
        log.set_context(to_context(json!({ "a": 1 }))).unwrap();

        log.initialize(Some(LoggerOptions::new().with_level(Level::Trace)))
            .unwrap();

        assert_eq!(log.raw().unwrap().options().level, LevelFilter::Info);
    }

    #[tokio::test]
    async fn test_buffered_flush_waits_for_pending_records() {
        let sink = MemorySink::new();
        let log = LogFacade::new();
        log.initialize(Some(
            LoggerOptions::new()
                .with_buffered(true)
                .with_destination(Destination::Memory(sink.clone())),
        ))
        .unwrap();

        for i in 0..200 {
            log.info("queued", Some(to_context(json!({ "n": i })))).unwrap();
        }
        log.flush().await.unwrap();

        let records = sink.records();
        assert_eq!(records.len(), 200);
        assert!(records.iter().enumerate().all(|(i, r)| r["n"] == i));
    }

    #[tokio::test]
    async fn test_file_destination_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        let log = LogFacade::new();
        log.initialize(Some(
            LoggerOptions::new()
                .with_name("billing")
                .with_destination(Destination::File(path.clone())),
        ))
        .unwrap();

        log.warn("Low balance", Some(to_context(json!({ "account": 7 })))).unwrap();
        log.flush().await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let record: Value = serde_json::from_str(content.trim()).unwrap();
        assert_eq!(record["name"], "billing");
        assert_eq!(record["account"], 7);
        assert_eq!(record["level"], "WARN");
    }

    #[test]
    fn test_initialization_failure_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let log = LogFacade::new();
        let options = LoggerOptions::new().with_destination(Destination::File(dir.path().to_path_buf()));

        let result = log.initialize(Some(options));

        assert!(matches!(result, Err(FacadeError::Engine(_))));
    }
}
