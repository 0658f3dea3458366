//! Integration tests for the device query and haptics surface, driven
//! against the emulated engine.

use std::time::{Duration, Instant};

use mg::{DeviceType, EmulatedEngineOptions, Session};

/// Plenty of sample ticks at the default interval.
const SAMPLE_TIMEOUT: Duration = Duration::from_secs(2);

fn disconnected_options() -> EmulatedEngineOptions {
    EmulatedEngineOptions {
        debug_device: false,
        ..Default::default()
    }
}

#[tokio::test]
async fn connected_glove_reports_telemetry() {
    let session = Session::emulated().await.unwrap();
    let glove = session.glove(DeviceType::Left);

    assert!(glove.is_connected().await);

    let millivolts = glove.battery_voltage().await.unwrap();
    assert!((3000..=4500).contains(&millivolts), "implausible: {millivolts}");

    let percent = glove.battery_percent().await.unwrap();
    assert!(percent <= 100);

    let rssi = glove.signal_strength().await.unwrap();
    assert!(rssi < 0, "RSSI should be negative dBm, got {rssi}");

    session.shutdown().await.unwrap();
}

#[tokio::test]
async fn hand_returns_fresh_scaled_samples() {
    let session = Session::emulated().await.unwrap();
    let glove = session.glove(DeviceType::Right);

    let first = glove.hand(SAMPLE_TIMEOUT).await.unwrap();
    let second = glove.hand(SAMPLE_TIMEOUT).await.unwrap();

    // Raw flex values are normalized; the embedded raw block is present in
    // the processed sample.
    for sensor in first.raw.finger_sensors {
        assert!((0.0..=1.0).contains(&sensor));
    }
    // Two reads never return the same packet.
    assert_ne!(first.raw, second.raw);

    // Skeletal output is scaled: a finger chain spans a nonzero extent.
    let tip = first.index().distal().translation;
    let base = first.index().carpal().translation;
    assert!(tip.sub(base).length() > 0.0);

    session.shutdown().await.unwrap();
}

#[tokio::test]
async fn hand_raw_carries_unscaled_data_only() {
    let session = Session::emulated().await.unwrap();
    let glove = session.glove(DeviceType::Left);

    let raw = glove.hand_raw(SAMPLE_TIMEOUT).await.unwrap();
    assert_eq!(raw.imu.len(), mg::IMUS_PER_GLOVE);
    assert_eq!(raw.finger_sensors.len(), mg::SENSORS_PER_GLOVE);

    session.shutdown().await.unwrap();
}

#[tokio::test]
async fn zero_timeout_poll_on_disconnected_device_returns_promptly() {
    let session = Session::emulated_with(disconnected_options()).await.unwrap();
    let glove = session.glove(DeviceType::Left);

    assert!(!glove.is_connected().await);

    let started = Instant::now();
    let err = glove.hand(Duration::ZERO).await.unwrap_err();
    assert!(err.is_disconnected(), "expected disconnect, got: {err:?}");
    assert!(
        started.elapsed() < Duration::from_millis(250),
        "zero-timeout poll must not hang"
    );

    let err = glove.hand_raw(Duration::ZERO).await.unwrap_err();
    assert!(err.is_disconnected());

    session.shutdown().await.unwrap();
}

#[tokio::test]
async fn telemetry_on_disconnected_device_is_an_error() {
    let session = Session::emulated_with(disconnected_options()).await.unwrap();
    let glove = session.glove(DeviceType::Right);

    assert!(glove.battery_voltage().await.unwrap_err().is_disconnected());
    assert!(glove.signal_strength().await.unwrap_err().is_disconnected());
    assert!(
        glove
            .vibrate(0.5, Duration::from_millis(20))
            .await
            .unwrap_err()
            .is_disconnected()
    );

    session.shutdown().await.unwrap();
}

#[tokio::test]
async fn removing_the_debug_device_disconnects_both_gloves() {
    let session = Session::emulated().await.unwrap();
    let glove = session.glove(DeviceType::Left);

    // Warm up: at least one sample has been buffered.
    glove.hand(SAMPLE_TIMEOUT).await.unwrap();

    session.remove_debug_device().await.unwrap();

    // The buffered sample is gone with the device; a poll cannot observe
    // stale data.
    let err = glove.hand(Duration::ZERO).await.unwrap_err();
    assert!(err.is_disconnected());
    assert!(!glove.is_connected().await);

    session.add_debug_device().await.unwrap();
    assert!(glove.is_connected().await);
    glove.hand(SAMPLE_TIMEOUT).await.unwrap();

    session.shutdown().await.unwrap();
}

#[tokio::test]
async fn vibration_power_boundaries() {
    let session = Session::emulated().await.unwrap();
    let glove = session.glove(DeviceType::Left);

    // 0 and 1 are accepted boundary values.
    glove.vibrate(0.0, Duration::from_millis(10)).await.unwrap();
    glove.vibrate(1.0, Duration::from_millis(10)).await.unwrap();
    glove.vibrate(0.5, Duration::from_millis(10)).await.unwrap();

    for power in [-0.001, 1.001, f64::NAN, f64::INFINITY] {
        let err = glove
            .vibrate(power, Duration::from_millis(10))
            .await
            .unwrap_err();
        assert!(
            matches!(err, mg::Error::InvalidArgument(_)),
            "power {power}: {err:?}"
        );
    }

    // Durations beyond the wire's u16 milliseconds are rejected up front.
    let err = glove.vibrate(0.5, Duration::from_secs(120)).await.unwrap_err();
    assert!(matches!(err, mg::Error::InvalidArgument(_)));

    session.shutdown().await.unwrap();
}

#[tokio::test]
async fn dongle_surface_tracks_the_debug_device() {
    let session = Session::emulated().await.unwrap();

    let ids = session.dongle_ids().await.unwrap();
    assert_eq!(ids.len(), 1);

    session.set_channel(42).await.unwrap();
    let err = session.set_channel(4096).await.unwrap_err();
    assert!(matches!(err, mg::Error::InvalidArgument(_)));

    session.remove_debug_device().await.unwrap();
    assert!(session.dongle_ids().await.unwrap().is_empty());

    session.shutdown().await.unwrap();
}
