//! SimulatedLink 集成测试
//!
//! 验证事件线程的通知、心跳超时、定时断开以及命令到遥测的推导。

use rlink_device::{Link, LinkError, SimConfig, SimulatedLink};
use rlink_protocol::{DeviceStatus, Light, LinkEvents, LinkFault};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

fn fast_config() -> SimConfig {
    SimConfig {
        data_period: Duration::from_millis(10),
        heartbeat_timeout: None,
        disconnect_after: None,
    }
}

/// 轮询等待条件成立（最多 `timeout`）
fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    condition()
}

/// 持续收集事件直到出现 `wanted`
fn collect_until(link: &SimulatedLink, wanted: LinkEvents, timeout: Duration) -> LinkEvents {
    let mut seen = LinkEvents::empty();
    wait_until(timeout, || {
        seen |= link.status().unwrap();
        seen.contains(wanted)
    });
    seen
}

#[test]
fn test_open_twice_is_busy() {
    let link = SimulatedLink::new(fast_config());
    link.open().unwrap();
    assert_eq!(link.open(), Err(LinkError::Busy));
    link.close().unwrap();
    assert_eq!(link.close(), Err(LinkError::NotOpen));
}

#[test]
fn test_calls_on_closed_link_fail() {
    let link = SimulatedLink::new(fast_config());
    assert_eq!(link.set_xy(20, 0), Err(LinkError::NotOpen));
    assert_eq!(link.heartbeat(), Err(LinkError::NotOpen));
    assert!(link.battery().is_err());
}

#[test]
fn test_data_ready_notifications() {
    let link = SimulatedLink::new(fast_config());
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    link.set_event_notification(
        LinkEvents::all(),
        Some(Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })),
    )
    .unwrap();
    link.open().unwrap();

    assert!(
        wait_until(Duration::from_secs(1), || hits.load(Ordering::SeqCst) >= 3),
        "expected periodic notifications"
    );
    let events = link.status().unwrap();
    assert!(events.contains(LinkEvents::DATA_READY));
    assert!(!events.contains(LinkEvents::ERROR));

    link.close().unwrap();
}

#[test]
fn test_unsubscribed_events_are_not_recorded() {
    let link = SimulatedLink::new(fast_config());
    link.set_event_notification(LinkEvents::DISCONNECTED, Some(Arc::new(|| {})))
        .unwrap();
    link.open().unwrap();
    thread::sleep(Duration::from_millis(50));
    assert_eq!(link.status().unwrap(), LinkEvents::empty());
    link.close().unwrap();
}

#[test]
fn test_heartbeat_timeout_raises_error() {
    let link = SimulatedLink::new(SimConfig {
        heartbeat_timeout: Some(Duration::from_millis(50)),
        ..fast_config()
    });
    link.set_event_notification(LinkEvents::all(), Some(Arc::new(|| {})))
        .unwrap();
    link.open().unwrap();

    let seen = collect_until(&link, LinkEvents::ERROR, Duration::from_secs(2));
    assert!(seen.contains(LinkEvents::ERROR));
    assert_eq!(link.latest_error().unwrap(), LinkFault::Timeout);
    assert_eq!(link.device_status().unwrap().status, DeviceStatus::Error);

    link.close().unwrap();
}

#[test]
fn test_heartbeats_keep_link_alive() {
    let link = SimulatedLink::new(SimConfig {
        heartbeat_timeout: Some(Duration::from_millis(100)),
        ..fast_config()
    });
    link.set_event_notification(LinkEvents::all(), Some(Arc::new(|| {})))
        .unwrap();
    link.open().unwrap();

    let mut seen = LinkEvents::empty();
    for _ in 0..30 {
        link.heartbeat().unwrap();
        seen |= link.status().unwrap();
        thread::sleep(Duration::from_millis(10));
    }
    assert!(!seen.contains(LinkEvents::ERROR));
    assert_eq!(link.latest_error().unwrap(), LinkFault::None);

    link.close().unwrap();
}

#[test]
fn test_scripted_disconnect() {
    let link = SimulatedLink::new(SimConfig {
        disconnect_after: Some(Duration::from_millis(40)),
        ..fast_config()
    });
    link.set_event_notification(LinkEvents::all(), Some(Arc::new(|| {})))
        .unwrap();
    link.open().unwrap();

    let seen = collect_until(&link, LinkEvents::DISCONNECTED, Duration::from_secs(2));
    assert!(seen.contains(LinkEvents::DISCONNECTED));

    link.close().unwrap();
}

#[test]
fn test_telemetry_follows_commands() {
    let link = SimulatedLink::new(fast_config());
    link.open().unwrap();

    link.set_xy(0, 100).unwrap();
    link.set_horn(true).unwrap();
    link.set_light(Light::Hazard, true).unwrap();
    link.set_error(0x01).unwrap();

    let velocity = link.velocity().unwrap();
    assert!((velocity.m1 - 3.0).abs() < 1e-4);
    assert!((velocity.m2 - 3.0).abs() < 1e-4);
    assert!(velocity.turn.abs() < 1e-4);

    let speed = link.speed().unwrap();
    assert!((speed.true_speed - 1.7).abs() < 1e-4);

    assert!(link.horn().unwrap());
    assert!(link.light(Light::Hazard).unwrap().lit);
    assert!(!link.light(Light::Brake).unwrap().lit);

    let status = link.device_status().unwrap();
    assert!(status.out_of_neutral);
    assert_eq!(status.status, DeviceStatus::Error);
    assert_eq!(link.error_codes().unwrap().interface, 0x0001);

    link.close().unwrap();
}

#[test]
fn test_drop_stops_event_thread() {
    let hits = Arc::new(AtomicUsize::new(0));
    {
        let link = SimulatedLink::new(fast_config());
        let counter = hits.clone();
        link.set_event_notification(
            LinkEvents::all(),
            Some(Arc::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })),
        )
        .unwrap();
        link.open().unwrap();
        thread::sleep(Duration::from_millis(30));
    }

    let after_drop = hits.load(Ordering::SeqCst);
    thread::sleep(Duration::from_millis(50));
    assert_eq!(hits.load(Ordering::SeqCst), after_drop);
}
