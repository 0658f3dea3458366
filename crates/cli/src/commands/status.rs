use anyhow::Result;
use colored::Colorize;
use mg::{DeviceType, Session};

pub async fn run(session: &Session) -> Result<()> {
    let dongles = session.dongle_ids().await?;
    if dongles.is_empty() {
        println!("dongles: {}", "none".red());
    } else {
        let ids: Vec<String> = dongles.iter().map(|id| format!("{id:#010x}")).collect();
        println!("dongles: {}", ids.join(", "));
    }

    for device in DeviceType::ALL {
        let glove = session.glove(device);
        if !glove.is_connected().await {
            println!("{device:>5}: {}", "disconnected".red());
            continue;
        }

        let millivolts = glove.battery_voltage().await?;
        let percent = glove.battery_percent().await?;
        let rssi = glove.signal_strength().await?;
        println!(
            "{device:>5}: {}  battery {percent}% ({millivolts} mV)  signal {rssi} dBm",
            "connected".green(),
        );
    }

    Ok(())
}
