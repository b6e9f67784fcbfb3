//! End-to-end tests through the public API
//!
//! A memory-feed collaborator pushes JSON records through the feed handle
//! while a fake simulator sends broadcast datagrams over loopback UDP.

use std::sync::Arc;
use std::time::Duration;

use futures::{Stream, StreamExt};
use serde_json::json;
use slipstream::{
    ActiveProtocol, BroadcastEvent, Confidence, FusionConfig, LinkState, MergedSnapshot,
    Slipstream, SourceId, UdpConfig, UpdateRate,
};
use tokio::net::UdpSocket;

async fn wait_for<S, F>(stream: &mut S, mut accept: F) -> anyhow::Result<Arc<MergedSnapshot>>
where
    S: Stream<Item = Arc<MergedSnapshot>> + Unpin,
    F: FnMut(&MergedSnapshot) -> bool,
{
    let found = tokio::time::timeout(Duration::from_secs(5), async {
        while let Some(snapshot) = stream.next().await {
            if accept(&snapshot) {
                return Some(snapshot);
            }
        }
        None
    })
    .await?;
    found.ok_or_else(|| anyhow::anyhow!("snapshot stream ended"))
}

fn car_update(car_id: u16, speed: f32, rpm: f32, gear: u8) -> Vec<u8> {
    let mut data = vec![0u8; 32];
    data[0] = 2;
    data[1..3].copy_from_slice(&car_id.to_le_bytes());
    data[3..7].copy_from_slice(&speed.to_le_bytes());
    data[7..11].copy_from_slice(&rpm.to_le_bytes());
    data[11] = gear;
    data
}

fn realtime_update(session_type: u8, session_time: f32) -> Vec<u8> {
    let mut data = vec![0u8; 32];
    data[0] = 1;
    data[5] = session_type;
    data[6..10].copy_from_slice(&session_time.to_le_bytes());
    data
}

#[tokio::test]
async fn hybrid_session_over_udp_and_memory_feed() -> anyhow::Result<()> {
    let _ = tracing_subscriber::fmt::try_init();
    let simulator = UdpSocket::bind("127.0.0.1:0").await?;
    let config = FusionConfig {
        udp: UdpConfig {
            port: 0,
            fallback_port: 1,
            peer_port: simulator.local_addr()?.port(),
            connection_id: 4242,
            ..UdpConfig::default()
        },
        ..FusionConfig::default()
    };

    let connection = Slipstream::start(config).await?;
    let listener = connection.udp_local_addr().expect("listener bound");

    // The listener announces itself to the simulator.
    let mut request = [0u8; 8];
    let (len, _) =
        tokio::time::timeout(Duration::from_secs(2), simulator.recv_from(&mut request)).await??;
    assert_eq!(len, 8);
    assert_eq!(u32::from_le_bytes(request[..4].try_into()?), 1);
    assert_eq!(u32::from_le_bytes(request[4..].try_into()?), 4242);

    let mut snapshots = connection.subscribe(UpdateRate::Native);
    let feed = connection.feed();

    simulator.send_to(&car_update(3, 162.0, 7100.0, 5), listener).await?;
    let broadcast_only =
        wait_for(&mut snapshots, |s| s.active_protocol == ActiveProtocol::Broadcasting).await?;
    assert_eq!(broadcast_only.realtime.speed_kmh, 162);
    assert_eq!(broadcast_only.realtime.motion_confidence, Some(Confidence::Decoded));
    assert!(broadcast_only.g_forces.is_none());
    assert!(broadcast_only.tyres.is_none());

    feed.push_static(json!({ "carModel": "ferrari_296_gt3", "maxRpm": 8200, "track": "spa" }))
        .await?;
    feed.push_physics(json!({
        "gear": -1,
        "speedKmh": 153.7,
        "rpms": 2100,
        "accG": [0.2, 1.0, -0.6],
    }))
    .await?;

    let hybrid =
        wait_for(&mut snapshots, |s| s.realtime.motion_source == Some(SourceId::SharedMemory))
            .await?;
    assert_eq!(hybrid.active_protocol, ActiveProtocol::Hybrid);
    assert_eq!(hybrid.realtime.gear, "R");
    assert_eq!(hybrid.realtime.speed_kmh, 154);
    let g = hybrid.g_forces.as_ref().expect("memory g-forces");
    assert_eq!((g.longitudinal, g.lateral, g.vertical), (-0.6, 0.2, 1.0));
    let engine = hybrid.engine.as_ref().expect("engine section");
    assert_eq!(engine.max_rpm, 8200.0);
    assert_eq!(engine.rpm, 2100);
    assert_eq!(hybrid.car.as_ref().map(|c| c.model.as_str()), Some("ferrari 296 gt3"));
    assert_eq!(hybrid.liveness.shared_memory.quality_score, 95);
    assert_eq!(hybrid.liveness.broadcasting.quality_score, 90);

    feed.push_graphics(json!({
        "position": 6,
        "completedLaps": 11,
        "deltaLapTime": "-0.250",
        "trackGripStatus": 0.9,
    }))
    .await?;
    feed.push_physics(json!({ "gear": 4, "speedKmh": 180.0, "airTemp": 19.5, "roadTemp": 27.0 }))
        .await?;
    wait_for(&mut snapshots, |s| s.realtime.position == 6 && s.realtime.gear == "4").await?;

    // Datagrams without standing or session fields leave the memory values alone.
    simulator.send_to(&car_update(3, 181.0, 7200.0, 4), listener).await?;
    simulator.send_to(&realtime_update(10, 95_000.0), listener).await?;
    let mut updates = connection.status_updates();
    tokio::time::timeout(Duration::from_secs(5), async {
        while let Some(status) = updates.next().await {
            if status.samples_ingested >= 7 {
                break;
            }
        }
    })
    .await?;

    let merged = connection.current_snapshot();
    assert_eq!(merged.active_protocol, ActiveProtocol::Hybrid);
    assert_eq!(merged.realtime.position, 6);
    assert_eq!(merged.realtime.laps, 11);
    assert_eq!(merged.realtime.delta_ms, -250.0);
    let session = merged.session.as_ref().expect("session section");
    assert_eq!(session.ambient_temp, 19.5);
    assert_eq!(session.track_temp, 27.0);
    assert!((session.wetness - 0.1).abs() < 1e-6);
    Ok(())
}

#[tokio::test]
async fn silent_sources_time_out_and_recover() -> anyhow::Result<()> {
    let config = FusionConfig {
        liveness_timeout_ms: 150,
        tick_interval_ms: 20,
        udp: UdpConfig { enabled: false, ..UdpConfig::default() },
        ..FusionConfig::default()
    };
    let connection = Slipstream::start(config).await?;
    let mut snapshots = connection.subscribe(UpdateRate::Native);
    let feed = connection.feed();

    feed.push_broadcast_event(BroadcastEvent::RealtimeCarUpdate(json!({
        "CarIndex": 1, "Kmh": 88.0, "Gear": 3, "Position": 4,
    })))
    .await?;
    wait_for(&mut snapshots, |s| s.is_connected).await?;

    let lost = wait_for(&mut snapshots, |s| !s.is_connected).await?;
    assert_eq!(lost.active_protocol, ActiveProtocol::None);
    assert_eq!(lost.liveness.broadcasting.state, LinkState::Disconnected);
    // Last known values are still served.
    assert_eq!(lost.realtime.speed_kmh, 88);
    assert_eq!(lost.realtime.position, 4);

    feed.push_broadcast_event(BroadcastEvent::RealtimeCarUpdate(json!({
        "CarIndex": 1, "Kmh": 91.0, "Gear": 3, "Position": 4,
    })))
    .await?;
    let back = wait_for(&mut snapshots, |s| s.is_connected).await?;
    assert_eq!(back.realtime.speed_kmh, 91);
    assert_eq!(connection.status().samples_ingested, 2);
    Ok(())
}

#[tokio::test]
async fn config_loads_from_yaml() -> anyhow::Result<()> {
    let config = FusionConfig::from_yaml_str(
        "liveness_timeout_ms: 2500\nmemory_schema: v2\nudp:\n  enabled: false\n",
    )?;
    assert_eq!(config.liveness_timeout(), Duration::from_millis(2500));
    assert_eq!(config.tick_interval(), Duration::from_millis(50));

    let connection = Slipstream::start(config).await?;
    let feed = connection.feed();
    let mut snapshots = connection.subscribe(UpdateRate::Native);
    // v2 reports gear offset by one.
    feed.push_physics(json!({ "gear": 0, "speedKmh": 12.0 })).await?;
    let snapshot = wait_for(&mut snapshots, |s| s.is_running).await?;
    assert_eq!(snapshot.realtime.gear, "R");
    Ok(())
}
