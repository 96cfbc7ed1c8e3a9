// Facade suite: query shapes, reset paths, malformed input handling and
// serialization of ingest/reset/reaper under real threads.

#[cfg(test)]
mod api_tests {
    use std::thread;
    use std::time::{Duration, Instant};

    use stepagg_core::api::{to_json, Aggregator, ResetSource};
    use stepagg_core::config::AggregatorConfig;
    use stepagg_core::constants::{DEVICE_ID_LEN, RESET_CONFIRMATION};
    use stepagg_core::engine::IngestKind;
    use stepagg_core::types::CoreError;

    fn packed(id: &str, count: u32, battery: f32) -> Vec<u8> {
        let mut buf = vec![0u8; DEVICE_ID_LEN];
        buf[..id.len()].copy_from_slice(id.as_bytes());
        buf.extend_from_slice(&count.to_le_bytes());
        buf.extend_from_slice(&battery.to_le_bytes());
        buf
    }

    fn aggregator() -> Aggregator {
        Aggregator::new(AggregatorConfig::default()).unwrap()
    }

    #[test]
    fn summary_reflects_ingested_bytes() {
        let agg = aggregator();
        agg.ingest_bytes(&packed("node-a", 100, 90.0)).unwrap();
        agg.ingest_bytes(&packed("node-b", 200, 80.0)).unwrap();

        let s = agg.get_summary();
        assert_eq!(s.total_steps, 300);
        assert_eq!(s.device_count, 2);
    }

    #[test]
    fn malformed_bytes_change_nothing() {
        let agg = aggregator();
        agg.ingest_bytes(&packed("node-a", 100, 90.0)).unwrap();
        let before = agg.snapshot();

        assert!(agg.ingest_bytes(&[0xAB; 7]).is_none());
        assert!(agg.ingest_bytes(&packed("node-a", 500, f32::NAN)).is_none());

        let after = agg.snapshot();
        assert_eq!(after.total_steps, before.total_steps);
        assert_eq!(after.devices, before.devices);
        assert_eq!(after.counters.records_malformed, 2);
        assert_eq!(after.counters.records_received, 3);
    }

    #[test]
    fn devices_are_ordered_with_age_strings() {
        let agg = aggregator();
        let t0 = Instant::now();
        agg.ingest_bytes_at(&packed("zeta", 5, 50.0), t0).unwrap();
        agg.ingest_bytes_at(&packed("alpha", 7, 40.0), t0 + Duration::from_secs(3)).unwrap();

        let list = agg.list_devices_at(t0 + Duration::from_secs(10));
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].id.as_str(), "alpha");
        assert_eq!(list[0].steps, 7);
        assert_eq!(list[0].last_seen, "7s ago");
        assert_eq!(list[0].battery, 40.0);
        assert_eq!(list[1].id.as_str(), "zeta");
        assert_eq!(list[1].last_seen, "10s ago");
    }

    #[test]
    fn devices_json_matches_presentation_shape() {
        let agg = aggregator();
        let t0 = Instant::now();
        agg.ingest_bytes_at(&packed("AA:BB:CC:11:22:33", 150, 50.0), t0).unwrap();
        let json = to_json(&agg.list_devices_at(t0 + Duration::from_secs(4))).unwrap();
        assert_eq!(json, r#"[{"id":"AA:BB:CC:11:22:33","steps":150,"lastSeen":"4s ago"}]"#);
    }

    #[test]
    fn status_json_has_summary_query_fields() {
        let agg = aggregator();
        agg.ingest_bytes(&packed("n", 12, 50.0)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&to_json(&agg.status(true)).unwrap()).unwrap();
        assert_eq!(value["totalSteps"], 12);
        assert_eq!(value["deviceCount"], 1);
        assert_eq!(value["wifiConnected"], true);
        assert!(value["uptime"].is_u64());
    }

    #[test]
    fn summary_json_carries_timestamp() {
        let json = to_json(&aggregator().get_summary()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["totalSteps"], 0);
        assert!(value["timestamp"].is_string());
    }

    #[test]
    fn reset_command_and_button_both_clear() {
        for source in [ResetSource::Command, ResetSource::Button] {
            let agg = aggregator();
            agg.ingest_bytes(&packed("n", 100, 50.0)).unwrap();
            assert_eq!(agg.reset_from(source), RESET_CONFIRMATION);
            assert_eq!(agg.total(), 0);
            assert!(agg.list_devices().is_empty());
        }
    }

    #[test]
    fn scenario_reset_then_same_id_starts_from_zero() {
        let agg = aggregator();
        agg.ingest_bytes(&packed("n", 100, 50.0)).unwrap();
        assert_eq!(agg.reset(), RESET_CONFIRMATION);
        let ev = agg.ingest_bytes(&packed("n", 50, 50.0)).unwrap();
        assert_eq!(ev.kind, IngestKind::NewDevice);
        assert_eq!(agg.total(), 50);
    }

    #[test]
    fn restart_from_file_store_restores_total() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = AggregatorConfig::with_store_path(dir.path().join("steps.bin"));

        let agg = Aggregator::new(cfg.clone()).unwrap();
        agg.ingest_bytes(&packed("n", 250, 50.0)).unwrap();
        drop(agg);
        assert_eq!(Aggregator::new(cfg.clone()).unwrap().total(), 250);

        let agg = Aggregator::new(cfg.clone()).unwrap();
        agg.reset();
        drop(agg);
        assert_eq!(Aggregator::new(cfg).unwrap().total(), 0);
    }

    #[test]
    fn invalid_config_is_refused() {
        let cfg = AggregatorConfig { max_devices: 0, ..Default::default() };
        assert!(Aggregator::new(cfg).is_err());
    }

    #[test]
    fn oversized_registry_is_refused_not_allocated() {
        let cfg = AggregatorConfig { max_devices: usize::MAX, ..Default::default() };
        assert!(matches!(Aggregator::new(cfg), Err(CoreError::Config(_))));
    }

    #[test]
    fn full_registry_rejection_is_not_counted_as_malformed() {
        let cfg = AggregatorConfig { max_devices: 1, ..Default::default() };
        let agg = Aggregator::new(cfg).unwrap();
        agg.ingest_bytes(&packed("node-a", 10, 50.0)).unwrap();
        assert!(agg.ingest_bytes(&packed("node-b", 20, 50.0)).is_none());

        let c = agg.counters();
        assert_eq!(c.reports_rejected, 1);
        assert_eq!(c.records_malformed, 0);
        assert_eq!(c.records_received, 2);
        assert_eq!(agg.total(), 10);
    }

    #[test]
    fn snapshots_held_by_readers_are_not_mutated() {
        let agg = aggregator();
        agg.ingest_bytes(&packed("n", 10, 50.0)).unwrap();
        let held = agg.snapshot();
        agg.ingest_bytes(&packed("n", 30, 50.0)).unwrap();
        assert_eq!(held.total_steps, 10);
        assert_eq!(held.device("n").unwrap().count, 10);
        assert_eq!(agg.total(), 30);
    }

    #[test]
    fn concurrent_ingest_reset_and_reaper_keep_invariants() {
        let agg = aggregator();
        let mut workers = Vec::new();

        for w in 0..4u32 {
            let agg = agg.clone();
            workers.push(thread::spawn(move || {
                let id = format!("node-{}", w);
                for count in 1..=500u32 {
                    agg.ingest_bytes(&packed(&id, count, 50.0));
                    let snap = agg.snapshot();
                    // each published device never shows more than the total
                    // accumulated since the last reset
                    for d in &snap.devices {
                        assert!(d.count <= snap.total_steps);
                    }
                }
            }));
        }
        {
            let agg = agg.clone();
            workers.push(thread::spawn(move || {
                for _ in 0..20 {
                    agg.reset();
                    agg.tick();
                    thread::sleep(Duration::from_millis(1));
                }
            }));
        }
        for w in workers {
            w.join().unwrap();
        }

        // After the dust settles the total is exactly what the surviving
        // baselines explain: one last reset, then each device's accepted counts.
        agg.reset();
        for w in 0..4u32 {
            agg.ingest_bytes(&packed(&format!("node-{}", w), 10, 50.0)).unwrap();
        }
        assert_eq!(agg.total(), 40);
        assert_eq!(agg.get_summary().device_count, 4);
    }
}
