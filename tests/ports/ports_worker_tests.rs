//! 列表差异引擎与后台工作线程测试

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::mpsc;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use serde_json::json;
    use termplex_lib::ports::engine;
    use termplex_lib::ports::{
        DiffWorker, ListRecord, Operation, PortInfo, PortKey, PortSortKey, ResponsePayload,
        WireFrame, WorkerConfig, WorkerError, WorkerRequest, WorkerResponse,
    };

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn listening(port: u16, protocol: &str, process: &str) -> PortInfo {
        PortInfo::new(port, protocol)
            .with_process(u32::from(port) + 1000, process)
            .with_address("127.0.0.1")
            .with_state("LISTENING")
    }

    fn snapshot() -> Vec<PortInfo> {
        vec![
            listening(8080, "tcp", "node"),
            listening(22, "tcp", "sshd"),
            listening(53, "udp", "systemd-resolved"),
            listening(5353, "udp", "avahi"),
            listening(3000, "tcp", "node"),
        ]
    }

    fn key_set(items: &[PortInfo]) -> HashSet<PortKey> {
        items.iter().map(|item| item.key()).collect()
    }

    #[test]
    fn test_filter_empty_query_is_identity() {
        let items = snapshot();
        assert_eq!(engine::filter(&items, ""), items);
    }

    #[test]
    fn test_sort_is_stable_for_every_key() {
        let items = snapshot();
        for key in [
            PortSortKey::Port,
            PortSortKey::Protocol,
            PortSortKey::Process,
            PortSortKey::Address,
        ] {
            let sorted = engine::sort(&items, &key);
            assert_eq!(items, snapshot(), "input mutated by {:?}", key);

            // 相等元素保持输入中的相对顺序
            for pair in sorted.windows(2) {
                if pair[0].compare_by(&pair[1], &key) == std::cmp::Ordering::Equal {
                    let first = items.iter().position(|p| p == &pair[0]).unwrap();
                    let second = items.iter().position(|p| p == &pair[1]).unwrap();
                    assert!(first < second, "unstable order for {:?}", key);
                }
            }
        }
    }

    #[test]
    fn test_sort_by_protocol_keeps_input_order_within_group() {
        let sorted = engine::sort(&snapshot(), &PortSortKey::Protocol);
        let ports: Vec<u16> = sorted.iter().map(|p| p.port).collect();
        assert_eq!(ports, vec![8080, 22, 3000, 53, 5353]);
    }

    #[test]
    fn test_diff_of_identical_snapshots_is_empty() {
        let items = snapshot();
        assert!(engine::diff(&items, &items).is_empty());
    }

    #[test]
    fn test_diff_changed_scenario() {
        let old = vec![listening(80, "tcp", "nginx")];
        let new = vec![listening(80, "tcp", "nginx").with_state("CLOSE_WAIT")];
        let changes = engine::diff(&old, &new);
        assert_eq!(changes.changed, new);
        assert!(changes.added.is_empty());
        assert!(changes.removed.is_empty());
    }

    #[test]
    fn test_diff_partition_ignores_order() {
        let old = snapshot();
        let mut new = snapshot();
        new.retain(|p| p.port != 22);
        new[0].pid = Some(1);
        new.push(listening(9000, "tcp", "php-fpm"));

        let expected = engine::diff(&old, &new);
        let rotations = [1usize, 2, 3];
        for shift in rotations {
            let mut old_rotated = old.clone();
            old_rotated.rotate_left(shift % old.len());
            let mut new_rotated = new.clone();
            new_rotated.rotate_right(shift % new.len());

            let actual = engine::diff(&old_rotated, &new_rotated);
            assert_eq!(key_set(&actual.added), key_set(&expected.added));
            assert_eq!(key_set(&actual.removed), key_set(&expected.removed));
            assert_eq!(key_set(&actual.changed), key_set(&expected.changed));
        }

        assert_eq!(key_set(&expected.removed).len(), 1);
        assert_eq!(key_set(&expected.added).len(), 1);
        assert_eq!(key_set(&expected.changed).len(), 1);
    }

    #[test]
    fn test_request_frames_round_trip_through_worker() {
        let (worker, responses) = DiffWorker::spawn(WorkerConfig::default()).unwrap();
        let frame = WireFrame::from_json(
            &json!({
                "type": "SORT_PORTS",
                "data": { "ports": snapshot(), "sortBy": "port" },
                "generation": 1
            })
            .to_string(),
        )
        .unwrap();

        let ticket = worker.post_frame(&frame).unwrap().unwrap();
        assert_eq!(ticket.operation, Operation::SortPorts);

        let response = responses.recv_timeout(TIMEOUT).unwrap();
        let out = response.to_frame().unwrap();
        assert_eq!(out.kind, "SORTED_PORTS");
        assert_eq!(out.generation, Some(ticket.generation));
        let ports: Vec<PortInfo> = serde_json::from_value(out.data).unwrap();
        assert_eq!(
            ports.iter().map(|p| p.port).collect::<Vec<_>>(),
            vec![22, 53, 3000, 5353, 8080]
        );
    }

    #[test]
    fn test_malformed_payload_gets_error_response() {
        let (worker, responses) = DiffWorker::spawn(WorkerConfig::default()).unwrap();
        let frame = WireFrame {
            kind: "DETECT_CHANGES".to_string(),
            data: json!({ "oldPorts": "not a list" }),
            generation: Some(11),
        };
        assert_eq!(worker.post_frame(&frame).unwrap(), None);

        let response = responses.recv_timeout(TIMEOUT).unwrap();
        assert_eq!(response.generation, 11);
        assert_eq!(response.operation, Some(Operation::DetectChanges));
        match response.payload {
            ResponsePayload::Error(fault) => {
                assert_eq!(fault.request_type.as_deref(), Some("DETECT_CHANGES"))
            }
            other => panic!("expected error response, got {:?}", other),
        }
        // 每个请求恰好一个响应
        assert!(responses.recv_timeout(Duration::from_millis(50)).is_err());
    }

    #[test]
    fn test_full_queue_is_reported_without_blocking() {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let release_rx = Arc::new(Mutex::new(release_rx));
        let delivered = Arc::new(Mutex::new(Vec::new()));

        let delivered_clone = delivered.clone();
        let worker = DiffWorker::with_sink(
            WorkerConfig {
                queue_capacity: 1,
                ..WorkerConfig::default()
            },
            move |response: WorkerResponse| {
                let _ = entered_tx.send(());
                // 阻塞工作线程直到测试放行
                let _ = release_rx.lock().unwrap().recv();
                delivered_clone.lock().unwrap().push(response.generation);
            },
        )
        .unwrap();

        worker.post(WorkerRequest::filter(snapshot(), "a")).unwrap();
        entered_rx.recv_timeout(TIMEOUT).unwrap();

        worker.post(WorkerRequest::filter(snapshot(), "b")).unwrap();
        let err = worker
            .post(WorkerRequest::filter(snapshot(), "c"))
            .unwrap_err();
        assert!(matches!(err, WorkerError::QueueFull { capacity: 1, .. }));
        assert!(err.is_retryable());
        // 被拒绝的请求不占用代号
        assert_eq!(worker.latest_generation(Operation::FilterPorts), 2);

        release_tx.send(()).unwrap();
        entered_rx.recv_timeout(TIMEOUT).unwrap();
        release_tx.send(()).unwrap();
        drop(worker);

        assert_eq!(*delivered.lock().unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_generations_are_per_operation() {
        let (worker, responses) = DiffWorker::spawn(WorkerConfig::default()).unwrap();
        worker.post(WorkerRequest::filter(snapshot(), "node")).unwrap();
        worker.post(WorkerRequest::filter(snapshot(), "ssh")).unwrap();
        let diff_ticket = worker
            .post(WorkerRequest::detect_changes(Vec::new(), snapshot()))
            .unwrap();
        assert_eq!(diff_ticket.generation, 1);

        let mut current = Vec::new();
        for _ in 0..3 {
            let response = responses.recv_timeout(TIMEOUT).unwrap();
            if worker.is_current(&response) {
                current.push(response);
            }
        }
        assert_eq!(current.len(), 2);
        assert!(current.iter().any(|r| matches!(
            &r.payload,
            ResponsePayload::FilteredPorts(ports) if ports.len() == 1 && ports[0].port == 22
        )));
        assert!(current.iter().any(|r| matches!(
            &r.payload,
            ResponsePayload::PortChanges(changes) if changes.added.len() == 5
        )));
    }
}
