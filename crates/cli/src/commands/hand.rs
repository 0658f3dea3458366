use std::time::Duration;

use anyhow::Result;
use mg::{DeviceType, Hand, Session};

const FINGER_NAMES: [&str; 5] = ["thumb", "index", "middle", "ring", "pinky"];
const JOINT_NAMES: [&str; 5] = ["carpal", "metacarpal", "proximal", "intermediate", "distal"];

pub async fn run(
    session: &Session,
    device: DeviceType,
    raw: bool,
    quat: bool,
    timeout_ms: u64,
) -> Result<()> {
    let glove = session.glove(device);
    let timeout = Duration::from_millis(timeout_ms);

    if raw {
        let sample = glove.hand_raw(timeout).await?;
        println!("imu[hand]:  {:?}", sample.imu[0].to_array());
        println!("imu[thumb]: {:?}", sample.imu[1].to_array());
        // Sensor pairs run little finger to thumb, lower sensor first.
        for (i, name) in ["little", "ring", "middle", "index", "thumb"]
            .iter()
            .enumerate()
        {
            println!(
                "{name:>7}: lower {:.3}  upper {:.3}",
                sample.finger_sensors[2 * i],
                sample.finger_sensors[2 * i + 1],
            );
        }
        return Ok(());
    }

    let hand = glove.hand(timeout).await?;
    print_skeleton(&hand, quat);
    Ok(())
}

fn print_skeleton(hand: &Hand, quat: bool) {
    println!("wrist: {:?}", hand.wrist.to_array());
    for (finger, name) in hand.fingers.iter().zip(FINGER_NAMES) {
        println!("{name} -");
        for (joint, joint_name) in finger.joints.iter().zip(JOINT_NAMES) {
            if quat {
                let [x, y, z, w] = joint.rotation.to_array();
                println!("  {joint_name:>12}: {x:+.4}, {y:+.4}, {z:+.4}, {w:+.4}");
            } else {
                let [x, y, z] = joint.translation.to_array();
                println!("  {joint_name:>12}: {x:+.4}, {y:+.4}, {z:+.4}");
            }
        }
    }
}
