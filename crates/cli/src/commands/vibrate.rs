use std::time::Duration;

use anyhow::Result;
use mg::{DeviceType, Session};

pub async fn run(
    session: &Session,
    device: DeviceType,
    power: f64,
    duration_ms: u16,
) -> Result<()> {
    let glove = session.glove(device);
    glove
        .vibrate(power, Duration::from_millis(duration_ms.into()))
        .await?;
    println!("vibrating {device} at {:.0}% for {duration_ms} ms", power * 100.0);
    Ok(())
}
