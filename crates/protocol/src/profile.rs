//! Per-user calibration profiles.
//!
//! A profile scales raw sensor data into a skeletal model: bone lengths per
//! finger, a wrist length, and the upper-body measurements the IK system
//! reads. Profiles have a two-tier lifecycle owned by the engine: a mutable
//! working copy and a committed durable copy.

use serde::{Deserialize, Serialize};

use crate::skeleton::{FINGERS_PER_HAND, Vec3};

/// Number of measured bones per finger (metacarpal through distal).
pub const BONES_PER_FINGER: usize = 4;

/// Bone lengths for one finger, ordered metacarpal, proximal, intermediate,
/// distal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FingerProfile {
    pub bones: [f64; BONES_PER_FINGER],
}

impl FingerProfile {
    pub fn metacarpal(&self) -> f64 {
        self.bones[0]
    }

    pub fn proximal(&self) -> f64 {
        self.bones[1]
    }

    pub fn intermediate(&self) -> f64 {
        self.bones[2]
    }

    pub fn distal(&self) -> f64 {
        self.bones[3]
    }
}

impl Default for FingerProfile {
    fn default() -> Self {
        // Adult-average phalanx lengths in meters.
        FingerProfile {
            bones: [0.060, 0.040, 0.025, 0.020],
        }
    }
}

/// Bone-length calibration for one hand: wrist length plus five fingers,
/// ordered thumb, index, middle, ring, pinky.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HandProfile {
    pub wrist: f64,
    pub fingers: [FingerProfile; FINGERS_PER_HAND],
}

impl Default for HandProfile {
    fn default() -> Self {
        HandProfile {
            wrist: 0.070,
            fingers: [FingerProfile::default(); FINGERS_PER_HAND],
        }
    }
}

/// Per-user body calibration read by the IK system.
///
/// Field names match the engine's profile storage schema.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IkProfile {
    pub shoulder_length: f64,
    pub upper_arm_length: f64,
    pub lower_arm_length: f64,
    pub upper_neck_length: f64,
    pub lower_neck_length: f64,
    pub upper_neck_offset: Vec3,
    pub hand_profile: HandProfile,
}

impl Default for IkProfile {
    fn default() -> Self {
        // Adult-average upper-body measurements in meters.
        IkProfile {
            shoulder_length: 0.180,
            upper_arm_length: 0.300,
            lower_arm_length: 0.270,
            upper_neck_length: 0.090,
            lower_neck_length: 0.110,
            upper_neck_offset: Vec3::ZERO,
            hand_profile: HandProfile::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finger_bone_accessors_follow_storage_order() {
        let profile = FingerProfile {
            bones: [4.0, 3.0, 2.0, 1.0],
        };
        assert_eq!(profile.metacarpal(), 4.0);
        assert_eq!(profile.proximal(), 3.0);
        assert_eq!(profile.intermediate(), 2.0);
        assert_eq!(profile.distal(), 1.0);
    }

    #[test]
    fn profile_serializes_with_engine_field_names() {
        let json = serde_json::to_value(IkProfile::default()).unwrap();
        assert!(json.get("shoulderLength").is_some());
        assert!(json.get("upperNeckOffset").is_some());
        assert!(json.get("handProfile").is_some());
    }
}
