//! Glove - the per-device query and command surface.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use mg_protocol::{DeviceType, Hand, HandRaw};
use mg_runtime::{Error, Result};
use serde_json::{Value, json};

use crate::session::SessionInner;

/// A handle to one physical glove, scoped to its session.
///
/// Telemetry and haptic operations are single request round-trips;
/// [`Glove::hand`] and [`Glove::hand_raw`] are the only operations that
/// wait, bounded by their explicit timeout.
#[derive(Clone)]
pub struct Glove {
    inner: Arc<SessionInner>,
    device: DeviceType,
    /// Sequence number of the last sample this handle consumed. Shared by
    /// clones, so a clone does not re-observe a packet the original already
    /// returned.
    last_seq: Arc<AtomicU64>,
}

impl Glove {
    pub(crate) fn new(inner: Arc<SessionInner>, device: DeviceType) -> Self {
        Glove {
            inner,
            device,
            last_seq: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Which device this handle addresses.
    pub fn device(&self) -> DeviceType {
        self.device
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value> {
        self.inner
            .request(method, params)
            .await
            .map_err(|e| e.with_device(self.device))
    }

    /// Whether the glove is currently connected.
    ///
    /// This collapses every failure - disconnected device, invalid session,
    /// transport trouble - into `false`. Use the fallible telemetry calls
    /// where a distinguishable error is required.
    pub async fn is_connected(&self) -> bool {
        match self.request("isConnected", json!({"device": self.device})).await {
            Ok(value) => value["connected"].as_bool().unwrap_or(false),
            Err(_) => false,
        }
    }

    /// Current battery level in millivolts.
    pub async fn battery_voltage(&self) -> Result<u16> {
        let value = self
            .request("batteryVoltage", json!({"device": self.device}))
            .await?;
        field_u64(&value, "millivolts").map(|v| v as u16)
    }

    /// Current battery level in percent.
    pub async fn battery_percent(&self) -> Result<u8> {
        let value = self
            .request("batteryPercent", json!({"device": self.device}))
            .await?;
        field_u64(&value, "percent").map(|v| v as u8)
    }

    /// Current signal strength as RSSI in dBm.
    pub async fn signal_strength(&self) -> Result<i16> {
        let value = self
            .request("signalStrength", json!({"device": self.device}))
            .await?;
        value["rssi"]
            .as_i64()
            .map(|v| v as i16)
            .ok_or_else(|| Error::ProtocolError("response missing 'rssi'".to_string()))
    }

    /// Drive the vibration motor at `power` (0 to 1) for `duration`.
    ///
    /// Fire-and-forget. The engine supports at most one vibration command
    /// every 2 ms; spacing the calls is the caller's responsibility and
    /// violations are neither enforced nor reported here.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] for power outside `[0, 1]` (the
    /// boundaries themselves are accepted) or a duration that does not fit
    /// the wire's millisecond field.
    pub async fn vibrate(&self, power: f64, duration: Duration) -> Result<()> {
        if !power.is_finite() || !(0.0..=1.0).contains(&power) {
            return Err(Error::InvalidArgument(format!(
                "vibration power {power} outside [0, 1]"
            )));
        }
        let duration_ms = u16::try_from(duration.as_millis()).map_err(|_| {
            Error::InvalidArgument(format!(
                "vibration duration {}ms exceeds the wire maximum",
                duration.as_millis()
            ))
        })?;

        self.request(
            "vibrate",
            json!({
                "device": self.device,
                "power": power,
                "durationMs": duration_ms,
            }),
        )
        .await
        .map(|_| ())
    }

    /// Wait up to `timeout` for a fresh profile-scaled skeletal sample.
    ///
    /// Fresh means newer than the last sample this handle returned; the
    /// same packet is never returned twice. A zero timeout is a
    /// non-blocking poll of the newest buffered sample.
    ///
    /// # Errors
    ///
    /// [`Error::Disconnected`] when no fresh sample arrives in time -
    /// deliberately the same error for a disconnected device and a timeout;
    /// there is no success-with-stale-data case.
    pub async fn hand(&self, timeout: Duration) -> Result<Hand> {
        self.inner.ensure_open()?;

        let last = self.last_seq.load(Ordering::SeqCst);
        match self
            .inner
            .connection()
            .samples()
            .wait_fresher(self.device, last, timeout)
            .await
        {
            Some(sample) => {
                self.last_seq.fetch_max(sample.seq, Ordering::SeqCst);
                Ok(sample.hand)
            }
            None => Err(Error::Disconnected {
                device: Some(self.device),
            }),
        }
    }

    /// Wait up to `timeout` for a fresh raw sample: IMU quaternions and
    /// unscaled flex sensor values only.
    ///
    /// Same blocking and error contract as [`Glove::hand`].
    pub async fn hand_raw(&self, timeout: Duration) -> Result<HandRaw> {
        self.hand(timeout).await.map(|hand| hand.raw)
    }
}

impl std::fmt::Debug for Glove {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Glove").field("device", &self.device).finish()
    }
}

fn field_u64(value: &Value, key: &str) -> Result<u64> {
    value[key]
        .as_u64()
        .ok_or_else(|| Error::ProtocolError(format!("response missing '{key}'")))
}
