//! Latest-sample store fed by engine `sample` events.
//!
//! The engine pushes one event per fresh device packet; readers block on the
//! store with a deadline rather than issuing a blocking request to the
//! engine. A sample is "fresh" relative to a reader's last consumed sequence
//! number, so two reads never return the same packet twice.

use std::collections::HashMap;
use std::time::Duration;

use mg_protocol::{DeviceType, Hand};
use parking_lot::Mutex;
use tokio::sync::Notify;

/// One published device packet.
#[derive(Debug, Clone, Copy)]
pub struct Sample {
    /// Engine-assigned, strictly increasing per device.
    pub seq: u64,
    pub hand: Hand,
}

/// Shared store of the newest sample per device.
#[derive(Default)]
pub struct SampleStore {
    slots: Mutex<HashMap<DeviceType, Sample>>,
    published: Notify,
}

impl SampleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a fresh sample and wake waiting readers.
    pub fn publish(&self, device: DeviceType, seq: u64, hand: Hand) {
        self.slots.lock().insert(device, Sample { seq, hand });
        self.published.notify_waiters();
    }

    /// Drop the buffered sample for a device that went away, so polls after
    /// a disconnect cannot observe stale data.
    pub fn clear(&self, device: DeviceType) {
        self.slots.lock().remove(&device);
    }

    /// Newest buffered sample for a device, if any.
    pub fn latest(&self, device: DeviceType) -> Option<Sample> {
        self.slots.lock().get(&device).copied()
    }

    /// Wait until a sample with `seq > last_seq` is available, up to
    /// `timeout`. A zero timeout is a non-blocking poll. Returns `None` on
    /// deadline expiry.
    pub async fn wait_fresher(
        &self,
        device: DeviceType,
        last_seq: u64,
        timeout: Duration,
    ) -> Option<Sample> {
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            if let Some(sample) = self.latest(device) {
                if sample.seq > last_seq {
                    return Some(sample);
                }
            }

            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                return None;
            }

            tokio::select! {
                _ = self.published.notified() => {}
                _ = tokio::time::sleep(remaining) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mg_protocol::Hand;
    use std::sync::Arc;

    #[tokio::test]
    async fn zero_timeout_poll_returns_buffered_fresh_sample() {
        let store = SampleStore::new();
        store.publish(DeviceType::Left, 7, Hand::default());

        let sample = store
            .wait_fresher(DeviceType::Left, 0, Duration::ZERO)
            .await
            .expect("buffered sample should satisfy a poll");
        assert_eq!(sample.seq, 7);

        // Already-consumed sequence is not fresh.
        assert!(
            store
                .wait_fresher(DeviceType::Left, 7, Duration::ZERO)
                .await
                .is_none()
        );
    }

    #[tokio::test]
    async fn zero_timeout_poll_on_empty_slot_returns_immediately() {
        let store = SampleStore::new();
        assert!(
            store
                .wait_fresher(DeviceType::Right, 0, Duration::ZERO)
                .await
                .is_none()
        );
    }

    #[tokio::test]
    async fn waiter_wakes_on_publish() {
        let store = Arc::new(SampleStore::new());

        let waiter = {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                store
                    .wait_fresher(DeviceType::Left, 0, Duration::from_secs(5))
                    .await
            })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        store.publish(DeviceType::Left, 1, Hand::default());

        let sample = waiter.await.unwrap().expect("publish should wake waiter");
        assert_eq!(sample.seq, 1);
    }

    #[tokio::test]
    async fn clear_removes_buffered_sample() {
        let store = SampleStore::new();
        store.publish(DeviceType::Left, 3, Hand::default());
        store.clear(DeviceType::Left);
        assert!(store.latest(DeviceType::Left).is_none());
    }
}
