use dispatch_sim::{CliConfig, DispatchError, HttpWorld, SimulationEngine};
use httpmock::prelude::*;
use serde_json::json;
use std::sync::Arc;

fn test_config(base_url: String, target_dispatches: u64) -> CliConfig {
    CliConfig {
        base_url,
        seed: "integration".to_string(),
        target_dispatches,
        max_active_calls: 4,
        refresh_interval_secs: 60.0,
        poll_timeout_secs: 1.0,
        max_empty_polls: 1,
        request_timeout_secs: 5.0,
        services: vec!["Medical".to_string(), "Fire".to_string()],
        verbose: false,
        json_logs: false,
    }
}

fn mock_world(server: &MockServer) {
    server.mock(|when, then| {
        when.method(POST)
            .path("/control/reset")
            .query_param("seed", "integration");
        then.status(200);
    });
    server.mock(|when, then| {
        when.method(GET).path("/locations");
        then.status(200).json_body(json!([
            {"county": "Center", "city": "T", "latitude": 0.0, "longitude": 0.0},
            {"county": "Center", "city": "A", "latitude": 1.0, "longitude": 0.0},
            {"county": "East", "name": "B", "lat": 0.0, "long": 2.0}
        ]));
    });
    server.mock(|when, then| {
        when.method(GET).path("/medical/search");
        then.status(200).json_body(json!([
            {"city": "A", "available": 5},
            {"city": "B", "available": 3}
        ]));
    });
    server.mock(|when, then| {
        when.method(GET).path("/fire/search");
        then.status(200).json_body(json!([
            {"city": "A", "quantity": 0},
            {"city": "B", "quantity": 4}
        ]));
    });
}

#[tokio::test]
async fn test_end_to_end_dispatch_run() {
    let server = MockServer::start();
    mock_world(&server);

    let queue_mock = server.mock(|when, then| {
        when.method(GET).path("/calls/queue").query_param("limit", "4");
        then.status(200).json_body(json!([
            {"id": "c-1", "city": "T", "requests": [{"Type": "Medical", "Quantity": 2}]},
            {"id": "c-2", "city": "T", "requests": [{"Type": "Fire", "Quantity": 1}]}
        ]));
    });
    let medical_dispatch = server.mock(|when, then| {
        when.method(POST).path("/medical/dispatch").json_body(json!({
            "sourceCounty": "Center",
            "sourceCity": "A",
            "targetCounty": "Center",
            "targetCity": "T",
            "quantity": 2
        }));
        then.status(200).json_body(json!({"status": "ok"}));
    });
    let fire_dispatch = server.mock(|when, then| {
        when.method(POST).path("/fire/dispatch").json_body(json!({
            "sourceCounty": "East",
            "sourceCity": "B",
            "targetCounty": "Center",
            "targetCity": "T",
            "quantity": 1
        }));
        then.status(200);
    });
    let stop_mock = server.mock(|when, then| {
        when.method(POST).path("/control/stop");
        then.status(200).json_body(json!({"totalDispatches": 2, "score": 97.5}));
    });

    let config = test_config(server.base_url(), 2);
    let world = Arc::new(HttpWorld::new(&config).unwrap());
    let summary = SimulationEngine::new(world, config).run().await.unwrap();

    queue_mock.assert_hits(1);
    medical_dispatch.assert();
    fire_dispatch.assert();
    stop_mock.assert();

    assert_eq!(summary.calls_processed, 2);
    assert_eq!(summary.calls_resolved, 2);
    assert_eq!(summary.units_dispatched, 3);
    assert_eq!(
        summary.final_score,
        Some(json!({"totalDispatches": 2, "score": 97.5}))
    );
}

#[tokio::test]
async fn test_gateway_failure_still_counts_units() {
    let server = MockServer::start();
    mock_world(&server);

    server.mock(|when, then| {
        when.method(GET).path("/calls/queue");
        then.status(200).json_body(json!([
            {"city": "T", "requests": [{"Type": "Medical", "Quantity": 7}]}
        ]));
    });
    let failing_dispatch = server.mock(|when, then| {
        when.method(POST).path("/medical/dispatch");
        then.status(503);
    });
    server.mock(|when, then| {
        when.method(POST).path("/control/stop");
        then.status(200);
    });

    let config = test_config(server.base_url(), 1);
    let world = Arc::new(HttpWorld::new(&config).unwrap());
    let summary = SimulationEngine::new(world, config).run().await.unwrap();

    // A 取 5、B 取 2，兩筆派遣都失敗但扣減不回滾
    failing_dispatch.assert_hits(2);
    assert_eq!(summary.calls_resolved, 1);
    assert_eq!(summary.units_dispatched, 7);
    assert_eq!(summary.final_score, None);
}

#[tokio::test]
async fn test_run_stops_when_no_calls_arrive() {
    let server = MockServer::start();
    mock_world(&server);

    let queue_mock = server.mock(|when, then| {
        when.method(GET).path("/calls/queue");
        then.status(200).body("");
    });
    let next_mock = server.mock(|when, then| {
        when.method(GET).path("/calls/next");
        then.status(200).body("");
    });
    server.mock(|when, then| {
        when.method(POST).path("/control/stop");
        then.status(200).json_body(json!({"totalDispatches": 0}));
    });

    let config = test_config(server.base_url(), 10);
    let world = Arc::new(HttpWorld::new(&config).unwrap());
    let summary = SimulationEngine::new(world, config).run().await.unwrap();

    queue_mock.assert_hits(1);
    next_mock.assert_hits(1);
    assert_eq!(summary.calls_processed, 0);
}

#[tokio::test]
async fn test_next_call_is_processed_when_queue_is_empty() {
    let server = MockServer::start();
    mock_world(&server);

    server.mock(|when, then| {
        when.method(GET).path("/calls/queue");
        then.status(200).json_body(json!([]));
    });
    server.mock(|when, then| {
        when.method(GET).path("/calls/next");
        then.status(200)
            .json_body(json!({"city": "T", "requests": [{"Type": "Medical", "Quantity": 1}]}));
    });
    let dispatch_mock = server.mock(|when, then| {
        when.method(POST).path("/medical/dispatch");
        then.status(200);
    });
    server.mock(|when, then| {
        when.method(POST).path("/control/stop");
        then.status(200);
    });

    let config = test_config(server.base_url(), 1);
    let world = Arc::new(HttpWorld::new(&config).unwrap());
    let summary = SimulationEngine::new(world, config).run().await.unwrap();

    dispatch_mock.assert_hits(1);
    assert_eq!(summary.calls_resolved, 1);
}

#[tokio::test]
async fn test_location_directory_failure_is_fatal() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/control/reset");
        then.status(200);
    });
    server.mock(|when, then| {
        when.method(GET).path("/locations");
        then.status(500);
    });
    let queue_mock = server.mock(|when, then| {
        when.method(GET).path("/calls/queue");
        then.status(200).json_body(json!([]));
    });

    let config = test_config(server.base_url(), 1);
    let world = Arc::new(HttpWorld::new(&config).unwrap());
    let result = SimulationEngine::new(world, config).run().await;

    assert!(matches!(
        result,
        Err(DispatchError::LocationDirectoryError { .. })
    ));
    queue_mock.assert_hits(0);
}

#[tokio::test]
async fn test_reset_failure_aborts_run() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/control/reset");
        then.status(500);
    });

    let config = test_config(server.base_url(), 1);
    let world = Arc::new(HttpWorld::new(&config).unwrap());
    let result = SimulationEngine::new(world, config).run().await;

    assert!(matches!(
        result,
        Err(DispatchError::SimulationControlError { .. })
    ));
}
