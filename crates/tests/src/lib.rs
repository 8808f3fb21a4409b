//! # Integration Tests
//!
//! Cross-crate and end-to-end tests.
//!
//! Covers:
//! - Wire format of snapshots and commands
//! - Stream -> store -> overrides -> effective state
//! - Override forwarding through the relay
//! - A real producer child process (unix)

#[cfg(test)]
mod contract_tests {
    use contracts::{ActuatorLabel, ActuatorName, ActuatorValue, Command, OverrideValue, SensorName};
    use serde_json::json;

    const PRODUCER_LINE: &str = r#"{"sensors":{"temperature":31.2,"moisture":38.0,"light":220.0,"co2":1210.0,"timestamp":"2024-05-01 12:00:00"},"actuators":{"heater_pct":0,"cooler_pct":80.5,"pump_pct":"LOW","drain_pct":"OFF","lamp_pct":100,"shutter_pct":0,"co2_pump_pct":0,"co2_vent_pct":"HIGH"},"alerts":{"temperature":{"value":31.2,"status":"ALERT","target":"PLC-1"},"co2":{"value":1210.0,"status":"ALERT"}}}"#;

    #[test]
    fn test_full_producer_line() {
        let snapshot = ingestion::parse_line(PRODUCER_LINE).unwrap();

        assert_eq!(snapshot.sensors.get(SensorName::Co2), 1210.0);
        assert_eq!(snapshot.actuators.len(), 8);
        assert_eq!(
            snapshot.actuators[&ActuatorName::Cooler],
            ActuatorValue::Percent(80.5)
        );
        assert_eq!(
            snapshot.actuators[&ActuatorName::Co2Vent],
            ActuatorValue::Label(ActuatorLabel::High)
        );
        assert_eq!(snapshot.alerts["temperature"].target.as_deref(), Some("PLC-1"));
        assert_eq!(snapshot.alerts["co2"].target, None);
    }

    #[test]
    fn test_command_wire_format() {
        let set = serde_json::to_value(Command::set(
            SensorName::Co2,
            OverrideValue::constant(1500.0),
        ))
        .unwrap();
        assert_eq!(set, json!({"type": "override", "sensor": "co2", "value": 1500.0}));

        let clear = serde_json::to_value(Command::clear(SensorName::Co2)).unwrap();
        assert_eq!(clear, json!({"type": "clear_override", "sensor": "co2"}));

        let range = serde_json::to_value(Command::set(
            SensorName::Moisture,
            OverrideValue::range(60.0, 40.0),
        ))
        .unwrap();
        assert_eq!(
            range,
            json!({"type": "override_range", "sensor": "moisture", "min": 40.0, "max": 60.0})
        );
    }

    #[test]
    fn test_config_drives_store_limits() {
        let config = config_loader::ConfigLoader::load_from_str(
            "[stream]\nmax_line_bytes = 64\npartial_line_policy = \"flush_on_eof\"\n",
            config_loader::ConfigFormat::Toml,
        )
        .unwrap();
        let store = ingestion::SnapshotStore::new(&config.stream);

        let report = store.ingest_chunk(format!("{PRODUCER_LINE}\n").as_bytes());
        assert_eq!(report.rejected, 1);
        assert!(!store.has_data());
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use contracts::{Command, CommandSink, ContractError, OverrideValue, SensorName, Snapshot};
    use dashboard::{execute, DashboardService, DashboardView, OperatorCommand};
    use ingestion::{pump, SnapshotStore};
    use overrides::OverrideTable;
    use relay::{CommandRelay, PipeSink};
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

    fn line(temperature: f64, timestamp: &str) -> String {
        format!(
            r#"{{"sensors":{{"temperature":{temperature},"moisture":40,"light":300,"co2":450,"timestamp":"{timestamp}"}},"actuators":{{}},"alerts":{{}}}}"#
        )
    }

    /// Sink that records commands for inspection
    struct RecordingSink {
        commands: Arc<Mutex<Vec<Command>>>,
    }

    impl CommandSink for RecordingSink {
        fn name(&self) -> &str {
            "recording"
        }

        async fn write(&mut self, command: &Command) -> Result<(), ContractError> {
            self.commands.lock().unwrap().push(command.clone());
            Ok(())
        }

        async fn flush(&mut self) -> Result<(), ContractError> {
            Ok(())
        }

        async fn close(&mut self) -> Result<(), ContractError> {
            Ok(())
        }
    }

    /// Store -> override table, following the documented example
    #[test]
    fn test_ingest_override_clear_example() {
        let store = SnapshotStore::default();
        store
            .ingest(r#"{"sensors":{"temperature":22.5,"moisture":40,"light":300,"co2":450,"timestamp":"T1"},"actuators":{},"alerts":{}}"#)
            .unwrap();
        assert_eq!(store.read().sensors.get(SensorName::Temperature), 22.5);

        let mut table = OverrideTable::new();
        table.set(SensorName::Temperature, 99.0).unwrap();
        assert_eq!(
            table.apply(&store.read()).sensors.get(SensorName::Temperature),
            99.0
        );

        table.clear(SensorName::Temperature);
        assert_eq!(
            table.apply(&store.read()).sensors.get(SensorName::Temperature),
            22.5
        );
    }

    /// Streamed bytes in odd chunk sizes end in the same state as whole lines
    #[tokio::test]
    async fn test_stream_chunking_is_invisible() {
        let payload = format!(
            "{}\n{}\nnot json\n{}\n",
            line(20.0, "T1"),
            line(21.0, "T2"),
            line(22.0, "T3")
        );

        let whole = SnapshotStore::default();
        for l in payload.lines() {
            let _ = whole.ingest(l);
        }

        let (mut writer, reader) = tokio::io::duplex(16);
        let streamed = Arc::new(SnapshotStore::default());
        let pump_store = Arc::clone(&streamed);
        let pump_task = tokio::spawn(async move { pump(reader, &pump_store, 7).await });

        for chunk in payload.as_bytes().chunks(5) {
            writer.write_all(chunk).await.unwrap();
        }
        drop(writer);

        let summary = pump_task.await.unwrap().unwrap();
        assert_eq!(summary.accepted, 3);
        assert_eq!(summary.rejected, 1);
        assert_eq!(*streamed.read(), *whole.read());
        assert_eq!(streamed.read().sensors.timestamp, "T3");
    }

    /// Display query path: default before data, overrides across snapshots
    #[tokio::test]
    async fn test_service_over_live_stream() {
        let store = Arc::new(SnapshotStore::default());
        let service = DashboardService::local(Arc::clone(&store));
        assert_eq!(service.effective_state().unwrap(), Snapshot::default());

        let (mut writer, reader) = tokio::io::duplex(1024);
        let pump_store = Arc::clone(&store);
        let pump_task = tokio::spawn(async move { pump(reader, &pump_store, 64).await });

        execute(&service, "set temp 35".parse::<OperatorCommand>().unwrap()).unwrap();

        writer
            .write_all(format!("{}\n", line(20.0, "T1")).as_bytes())
            .await
            .unwrap();
        writer
            .write_all(format!("{}\n", line(24.0, "T2")).as_bytes())
            .await
            .unwrap();
        drop(writer);
        pump_task.await.unwrap().unwrap();

        let effective = service.effective_state().unwrap();
        assert_eq!(effective.sensors.get(SensorName::Temperature), 35.0);
        assert_eq!(effective.sensors.timestamp, "T2");
        assert_eq!(store.read().sensors.get(SensorName::Temperature), 24.0);

        let rendered = DashboardView::new(Default::default()).render(&service.frame());
        assert!(rendered.contains("(override)"));
        assert!(rendered.contains("[T2]"));
    }

    /// sendOverride then sendClear: two ordered, standalone JSON lines
    #[tokio::test]
    async fn test_relay_lines_over_pipe() {
        let (client, server) = tokio::io::duplex(1024);
        let service = DashboardService::forwarding(
            Arc::new(SnapshotStore::default()),
            CommandRelay::spawn(PipeSink::new("producer_stdin", client), 8),
        );

        service.set_override(SensorName::Co2, 1500.0).unwrap();
        service.clear_override(SensorName::Co2).unwrap();
        assert!(service.shutdown(Duration::from_secs(5)).await);

        let mut lines = BufReader::new(server).lines();
        let mut received = Vec::new();
        while let Some(l) = lines.next_line().await.unwrap() {
            received.push(serde_json::from_str::<serde_json::Value>(&l).unwrap());
        }

        assert_eq!(received.len(), 2);
        assert_eq!(received[0]["type"], "override");
        assert_eq!(received[0]["value"], 1500.0);
        assert_eq!(received[1]["type"], "clear_override");
    }

    /// Console commands reach the producer in the order they were typed
    #[tokio::test]
    async fn test_console_commands_forwarded_in_order() {
        let commands = Arc::new(Mutex::new(Vec::new()));
        let relay = CommandRelay::spawn(
            RecordingSink {
                commands: Arc::clone(&commands),
            },
            8,
        );
        let service = DashboardService::forwarding(Arc::new(SnapshotStore::default()), relay);

        for input in ["range light 600 400", "set moist 55", "clear light"] {
            execute(&service, input.parse::<OperatorCommand>().unwrap()).unwrap();
        }
        assert!(service.shutdown(Duration::from_secs(5)).await);

        assert_eq!(
            *commands.lock().unwrap(),
            vec![
                Command::set(SensorName::Light, OverrideValue::range(400.0, 600.0)),
                Command::set(SensorName::Moisture, OverrideValue::constant(55.0)),
                Command::clear(SensorName::Light),
            ]
        );
    }

    /// A dead producer input must not affect reads or local overrides
    #[tokio::test]
    async fn test_write_failure_contained() {
        let (client, server) = tokio::io::duplex(64);
        drop(server);

        let store = Arc::new(SnapshotStore::default());
        store.ingest(&line(20.0, "T1")).unwrap();
        let relay = CommandRelay::spawn(PipeSink::new("producer_stdin", client), 8);
        let metrics = Arc::clone(relay.metrics());
        let service = DashboardService::forwarding(store, relay);

        service.set_override(SensorName::Temperature, 30.0).unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(
            service
                .effective_state()
                .unwrap()
                .sensors
                .get(SensorName::Temperature),
            30.0
        );
        assert!(service.shutdown(Duration::from_secs(5)).await);
        assert_eq!(metrics.failure_count(), 1);
    }
}

#[cfg(all(test, unix))]
mod process_tests {
    use std::sync::Arc;
    use std::time::Duration;

    use contracts::{ProducerConfig, SensorName, StreamConfig, TelemetryBackendConfig};
    use dashboard::DashboardService;
    use ingestion::SnapshotStore;
    use producer::{ProducerExit, ProducerProcess};
    use relay::{CommandRelay, PipeSink};

    /// Emits T1, then answers the first command with a snapshot reflecting it
    const PRODUCER_SCRIPT: &str = r#"
printf '%s\n' '{"sensors":{"temperature":22.5,"moisture":40,"light":300,"co2":450,"timestamp":"T1"}}'
read line
case "$line" in
  *'"type":"override"'*'"sensor":"co2"'*) co2=1500 ;;
  *) co2=-1 ;;
esac
printf '{"sensors":{"temperature":22.5,"moisture":40,"light":300,"co2":%s,"timestamp":"T2"}}\n' "$co2"
sleep 30
"#;

    async fn wait_for_timestamp(store: &SnapshotStore, timestamp: &str) {
        for _ in 0..100 {
            if store.read().sensors.timestamp == timestamp {
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("producer never reported {timestamp}");
    }

    #[tokio::test]
    async fn test_producer_round_trip() {
        let config = ProducerConfig {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), PRODUCER_SCRIPT.to_string()],
            working_dir: None,
            shutdown_timeout_ms: 2000,
        };
        let store = Arc::new(SnapshotStore::default());
        let mut producer = ProducerProcess::spawn(
            &config,
            &TelemetryBackendConfig::default(),
            &StreamConfig::default(),
            Arc::clone(&store),
        )
        .unwrap();

        let stdin = producer.take_stdin().unwrap();
        let service = DashboardService::forwarding(
            Arc::clone(&store),
            CommandRelay::spawn(PipeSink::new("producer_stdin", stdin), 8),
        );

        wait_for_timestamp(&store, "T1").await;
        service.set_override(SensorName::Co2, 1500.0).unwrap();
        wait_for_timestamp(&store, "T2").await;

        assert_eq!(store.read().sensors.get(SensorName::Co2), 1500.0);
        assert_eq!(
            service.effective_state().unwrap().sensors.get(SensorName::Co2),
            1500.0
        );

        assert!(service.shutdown(Duration::from_secs(5)).await);
        let exit = producer.shutdown().await.unwrap();
        assert!(matches!(exit, ProducerExit::Killed(_)));
        assert!(!store.status().is_stale());
    }

    #[tokio::test]
    async fn test_producer_crash_leaves_stale_snapshot() {
        let config = ProducerConfig {
            program: "sh".to_string(),
            args: vec![
                "-c".to_string(),
                r#"printf '%s\n' '{"sensors":{"temperature":19,"moisture":40,"light":300,"co2":450,"timestamp":"T1"}}'; echo 'Traceback: boom' >&2; exit 1"#.to_string(),
            ],
            working_dir: None,
            shutdown_timeout_ms: 2000,
        };
        let store = Arc::new(SnapshotStore::default());
        let producer = ProducerProcess::spawn(
            &config,
            &TelemetryBackendConfig::default(),
            &StreamConfig::default(),
            Arc::clone(&store),
        )
        .unwrap();

        for _ in 0..100 {
            if store.status().is_stale() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        let status = store.status();
        assert!(status.is_stale());
        assert_eq!(store.read().sensors.get(SensorName::Temperature), 19.0);

        let service = DashboardService::local(Arc::clone(&store));
        assert_eq!(
            service
                .effective_state()
                .unwrap()
                .sensors
                .get(SensorName::Temperature),
            19.0
        );

        let exit = producer.shutdown().await.unwrap();
        assert!(exit.is_unexpected());
    }

    /// A producer that never reads stdin must still be killed on shutdown
    #[tokio::test]
    async fn test_shutdown_with_unread_stdin_terminates_producer() {
        let config = ProducerConfig {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), "sleep 60".to_string()],
            working_dir: None,
            shutdown_timeout_ms: 500,
        };
        let store = Arc::new(SnapshotStore::default());
        let mut producer = ProducerProcess::spawn(
            &config,
            &TelemetryBackendConfig::default(),
            &StreamConfig::default(),
            Arc::clone(&store),
        )
        .unwrap();

        let stdin = producer.take_stdin().unwrap();
        let service = DashboardService::forwarding(
            Arc::clone(&store),
            CommandRelay::spawn(PipeSink::new("producer_stdin", stdin), 4096),
        );

        // Far more than a pipe buffer holds
        for i in 0..3000 {
            service
                .set_override(SensorName::Temperature, f64::from(i % 50))
                .unwrap();
        }

        let drain_timeout = producer.shutdown_timeout();
        let exit = tokio::time::timeout(Duration::from_secs(5), async move {
            let drained = service.shutdown(drain_timeout).await;
            (drained, producer.shutdown().await)
        })
        .await
        .expect("shutdown must finish while the producer ignores its stdin");

        let (drained, exit) = exit;
        assert!(!drained);
        assert!(matches!(exit.unwrap(), ProducerExit::Killed(_)));
    }
}
