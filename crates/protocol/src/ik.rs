//! Inverse-kinematics call contract.
//!
//! The engine solves shoulder and elbow placement from end-effector poses.
//! Field ownership is explicit: the caller supplies the head pose (headset)
//! and a lower-arm pose per side (controller/wrist); the engine returns the
//! solved shoulder pose and upper-arm orientation per side. There is no
//! in-place mutation - inputs and outputs are separate types.

use serde::{Deserialize, Serialize};

use crate::skeleton::{Pose, Quat};

/// Caller-supplied end-effector poses for one IK update.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IkInput {
    /// Headset pose.
    pub head: Pose,
    /// Left controller/wrist pose.
    pub left_lower_arm: Pose,
    /// Right controller/wrist pose.
    pub right_lower_arm: Pose,
}

impl IkInput {
    /// True if every rotation is a valid, non-degenerate quaternion.
    pub fn is_valid(&self) -> bool {
        self.head.rotation.is_valid_rotation()
            && self.left_lower_arm.rotation.is_valid_rotation()
            && self.right_lower_arm.rotation.is_valid_rotation()
    }
}

/// Engine-computed joint placement for one arm.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArmSolve {
    pub shoulder: Pose,
    pub upper_arm: Quat,
}

/// Engine-computed upper-body solve, one [`ArmSolve`] per side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IkSolve {
    pub left: ArmSolve,
    pub right: ArmSolve,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skeleton::Vec3;

    #[test]
    fn degenerate_rotation_invalidates_input() {
        let mut input = IkInput {
            head: Pose::IDENTITY,
            left_lower_arm: Pose::IDENTITY,
            right_lower_arm: Pose::IDENTITY,
        };
        assert!(input.is_valid());

        input.left_lower_arm.rotation = Quat::new(0.0, 0.0, 0.0, 0.0);
        assert!(!input.is_valid());

        input.left_lower_arm = Pose::new(Vec3::new(0.2, 1.0, 0.3), Quat::IDENTITY);
        assert!(input.is_valid());
    }
}
