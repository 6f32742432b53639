//! End-to-end tests of the cooperative runtime loop against the in-memory
//! memory service: connect, poll, command handling, link-drop recovery.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use tagsrv::remote::{StaticProbe, TransportProbe};
use tagsrv::simulator::SimulatedMemoryService;
use tagsrv::supervisor::{ConnectTarget, ConnectionSupervisor, ReconnectPolicy, RestartHandler};
use tagsrv::{Endpoint, TagCatalog, TagDefinition, TagRuntime, TagSrvError};

struct NoRestart;

impl RestartHandler for NoRestart {
    fn restart(&self) {}
}

fn tag(name: &str, address: &str, scale: f64) -> TagDefinition {
    TagDefinition {
        name: name.to_string(),
        address: address.to_string(),
        unit: String::new(),
        scale,
        description: String::new(),
    }
}

fn catalog() -> Arc<TagCatalog> {
    Arc::new(TagCatalog::new(vec![
        tag("MotorSpeed", "DB1.DBW0", 0.5),
        tag("RunFlag", "DB1.DBX2.0", 1.0),
    ]))
}

fn supervisor(
    sim: &SimulatedMemoryService,
    probe: Box<dyn TransportProbe>,
    cooldown: Duration,
) -> ConnectionSupervisor {
    ConnectionSupervisor::new(
        Box::new(sim.clone()),
        probe,
        Box::new(NoRestart),
        ConnectTarget {
            endpoint: Endpoint {
                host: "sim".to_string(),
                port: 102,
            },
            rack: 0,
            slot_candidates: vec![0],
        },
        ReconnectPolicy {
            cooldown,
            candidate_pause: Duration::ZERO,
            max_attempts: 100,
        },
    )
}

#[tokio::test]
async fn polls_and_serves_commands() {
    let sim = SimulatedMemoryService::new();
    let mut block = vec![0u8; 3];
    block[0..2].copy_from_slice(&258i16.to_be_bytes());
    block[2] = 0b0000_0001;
    sim.load_block(1, block);

    let sup = supervisor(&sim, Box::new(StaticProbe::up()), Duration::from_millis(50));
    let (runtime, handle) = TagRuntime::new(catalog(), sup, Duration::from_millis(25));

    let cancel = CancellationToken::new();
    let task = tokio::spawn(runtime.run(cancel.clone()));

    // First loop iteration connects and polls immediately
    tokio::time::sleep(Duration::from_millis(150)).await;

    let status = handle.status().await.unwrap();
    assert!(status.connected);
    assert!(status.last_poll.is_some());
    assert_eq!(status.values[0].unwrap().value, 129.0); // 258 * 0.5
    assert_eq!(status.values[1].unwrap().value, 1.0);

    // Write goes through the same link; raw = 100 / 0.5 = 200
    handle.write_tag("MotorSpeed", 100.0).await.unwrap();
    assert_eq!(
        sim.block(1).unwrap()[0..2],
        200i16.to_be_bytes()
    );
    let status = handle.status().await.unwrap();
    assert_eq!(status.values[0].unwrap().value, 100.0);

    // Unknown tag is rejected with no side effect
    let err = handle.write_tag("NoSuchTag", 1.0).await.unwrap_err();
    assert!(matches!(err, TagSrvError::TagError(_)));

    handle.poll_now().await.unwrap();

    cancel.cancel();
    task.await.unwrap();
}

#[tokio::test]
async fn commands_fail_while_disconnected() {
    let sim = SimulatedMemoryService::new();
    sim.create_block(1, 3);

    // Probe never sees the endpoint, so no connect is ever attempted
    let sup = supervisor(
        &sim,
        Box::new(StaticProbe { reachable: false }),
        Duration::from_secs(60),
    );
    let (runtime, handle) = TagRuntime::new(catalog(), sup, Duration::from_millis(25));

    let cancel = CancellationToken::new();
    let task = tokio::spawn(runtime.run(cancel.clone()));
    tokio::time::sleep(Duration::from_millis(100)).await;

    let status = handle.status().await.unwrap();
    assert!(!status.connected);
    assert_eq!(status.retry_count, 1);
    assert!(status.last_poll.is_none());

    let err = handle.poll_now().await.unwrap_err();
    assert!(matches!(err, TagSrvError::ConnectionError(_)));
    let err = handle.write_tag("MotorSpeed", 1.0).await.unwrap_err();
    assert!(matches!(err, TagSrvError::ConnectionError(_)));
    assert_eq!(sim.connect_calls(), 0);

    cancel.cancel();
    task.await.unwrap();
}

#[tokio::test]
async fn recovers_after_link_drop() {
    let sim = SimulatedMemoryService::new();
    sim.create_block(1, 3);

    let sup = supervisor(&sim, Box::new(StaticProbe::up()), Duration::from_millis(30));
    let (runtime, handle) = TagRuntime::new(catalog(), sup, Duration::from_millis(25));

    let cancel = CancellationToken::new();
    let task = tokio::spawn(runtime.run(cancel.clone()));
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(handle.status().await.unwrap().connected);
    assert_eq!(sim.connect_calls(), 1);

    sim.drop_link();
    tokio::time::sleep(Duration::from_millis(200)).await;

    let status = handle.status().await.unwrap();
    assert!(status.connected, "supervisor reconnected after link drop");
    assert!(sim.connect_calls() >= 2);

    cancel.cancel();
    task.await.unwrap();
}

#[tokio::test]
async fn forced_reconnect_reestablishes_session() {
    let sim = SimulatedMemoryService::new();
    sim.create_block(1, 3);

    let sup = supervisor(&sim, Box::new(StaticProbe::up()), Duration::from_secs(60));
    let (runtime, handle) = TagRuntime::new(catalog(), sup, Duration::from_millis(25));

    let cancel = CancellationToken::new();
    let task = tokio::spawn(runtime.run(cancel.clone()));
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(sim.connect_calls(), 1);

    handle.force_reconnect().await.unwrap();
    tokio::time::sleep(Duration::from_millis(150)).await;

    // Dropped and dialed again despite the long cool-down
    assert_eq!(sim.connect_calls(), 2);
    assert!(handle.status().await.unwrap().connected);

    cancel.cancel();
    task.await.unwrap();
}
