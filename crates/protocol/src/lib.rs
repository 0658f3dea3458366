//! Wire types for the glove engine protocol.
//!
//! This crate contains the serde-serializable types exchanged with the glove
//! engine: poses, skeletal hand data, calibration profiles, and the numeric
//! error codes the engine reports. These types represent the "protocol
//! layer" - the shapes of data as they appear on the wire.
//!
//! # Design Philosophy
//!
//! Types in this crate are:
//! - **Pure data**: No behavior beyond serialization, conversion, and a
//!   handful of fixed-size accessors
//! - **Layout-faithful**: Array sizes (5 joints, 5 fingers, 2 IMUs, 10
//!   sensors) are fixed at compile time to preserve the engine's marshalling
//!   contract
//! - **Stable**: Changes only when the wire contract changes
//!
//! Higher-level ergonomic APIs are built on top of these types in `mg-rs`.

pub mod ik;
pub mod profile;
pub mod skeleton;
pub mod types;

pub use ik::*;
pub use profile::*;
pub use skeleton::*;
pub use types::*;
