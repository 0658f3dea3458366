//! mg: Rust client bindings for a motion-capture glove engine.
//!
//! This crate provides the public API for driving a pair of motion-capture
//! gloves through the native glove engine: session lifecycle, device
//! telemetry, haptics, per-user calibration profiles, and upper-body
//! inverse kinematics.
//!
//! # Examples
//!
//! ## Polling skeletal hand data
//!
//! ```ignore
//! use mg::{CoordUp, DeviceType, Handedness, Session};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let session = Session::launch().await?;
//!     session
//!         .set_coordinate_system(CoordUp::Y, Handedness::Right)
//!         .await?;
//!
//!     let glove = session.glove(DeviceType::Right);
//!     loop {
//!         let hand = glove.hand(Duration::from_millis(100)).await?;
//!         println!("index distal: {:?}", hand.index().distal().translation);
//!     }
//! }
//! ```
//!
//! ## Per-frame IK updates
//!
//! ```ignore
//! use mg::{IkInput, Pose, Session};
//!
//! # async fn frame(session: &Session, head: Pose, left: Pose, right: Pose)
//! # -> mg::Result<()> {
//! let solve = session
//!     .update_ik(&IkInput {
//!         head,
//!         left_lower_arm: left,
//!         right_lower_arm: right,
//!     })
//!     .await?;
//! // solve.left.shoulder / solve.left.upper_arm are engine-computed.
//! # Ok(())
//! # }
//! ```
//!
//! ## Editing and committing a profile
//!
//! ```ignore
//! use mg::Session;
//!
//! # async fn calibrate(session: &Session) -> mg::Result<()> {
//! let mut profile = session.profile().await?;
//! profile.upper_arm_length = 0.31;
//! session.set_profile(&profile).await?;
//! session.commit_profiles().await?; // working copy becomes durable
//! # Ok(())
//! # }
//! ```

mod glove;
mod ik;
mod profiles;
mod session;

pub use glove::Glove;
pub use session::Session;

// Re-export protocol types for convenience
pub use mg_protocol::{
    ArmSolve, BONES_PER_FINGER, CoordUp, DeviceType, ErrorCode, FINGERS_PER_HAND, Finger,
    FingerProfile, Hand, HandProfile, HandRaw, Handedness, IMUS_PER_GLOVE, IkInput, IkProfile,
    IkSolve, JOINTS_PER_FINGER, Pose, Quat, SENSORS_PER_GLOVE, Vec3,
};

// Re-export the runtime for lower-level integrations
pub use mg_protocol;
pub use mg_runtime;

// Re-export Error and Result from mg-runtime
pub use mg_runtime::{Error, Result};
pub use mg_runtime::emulated::EmulatedEngineOptions;
