//! Pose and skeletal hand types.
//!
//! Array sizes here are part of the engine's marshalling contract and are
//! fixed at compile time: 5 joints per finger, 5 fingers per hand, 2 IMUs
//! and 10 flex sensors per raw sample.

use serde::{Deserialize, Serialize};

/// Number of joints in one finger chain (carpal through distal).
pub const JOINTS_PER_FINGER: usize = 5;
/// Number of fingers per hand.
pub const FINGERS_PER_HAND: usize = 5;
/// Number of IMUs per glove: `imu[0]` is the hand, `imu[1]` the thumb.
pub const IMUS_PER_GLOVE: usize = 2;
/// Number of flex sensors per glove, paired per finger from little finger
/// to thumb; even indices are the lower sensor (closest to the arm).
pub const SENSORS_PER_GLOVE: usize = 10;

/// 3D orientation as a quaternion. Unit-length by convention.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quat {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

impl Quat {
    /// The identity rotation.
    pub const IDENTITY: Quat = Quat {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 1.0,
    };

    pub fn new(x: f64, y: f64, z: f64, w: f64) -> Self {
        Self { x, y, z, w }
    }

    /// Explicit conversion to `[x, y, z, w]` for game-engine interop.
    ///
    /// Named conversions are the only supported path across the integration
    /// boundary; there are no implicit conversions or operator overloads.
    pub fn to_array(self) -> [f64; 4] {
        [self.x, self.y, self.z, self.w]
    }

    /// Explicit conversion from `[x, y, z, w]`.
    pub fn from_array([x, y, z, w]: [f64; 4]) -> Self {
        Self { x, y, z, w }
    }

    /// Squared norm. Zero only for the degenerate (invalid) quaternion.
    pub fn norm_squared(self) -> f64 {
        self.x * self.x + self.y * self.y + self.z * self.z + self.w * self.w
    }

    /// True if this quaternion can represent a rotation at all.
    ///
    /// A rotation used in a body pose must be non-degenerate; the engine
    /// rejects degenerate rotations with an invalid-argument error.
    pub fn is_valid_rotation(self) -> bool {
        let n = self.norm_squared();
        n.is_finite() && n > 1e-12
    }

    /// Unit-length copy of this quaternion.
    ///
    /// Returns the identity for degenerate input; callers that need to
    /// distinguish should check [`Quat::is_valid_rotation`] first.
    pub fn normalized(self) -> Quat {
        let n = self.norm_squared().sqrt();
        if n <= 1e-12 || !n.is_finite() {
            return Quat::IDENTITY;
        }
        Quat {
            x: self.x / n,
            y: self.y / n,
            z: self.z / n,
            w: self.w / n,
        }
    }

    /// Hamilton product `self * other`.
    pub fn mul(self, other: Quat) -> Quat {
        Quat {
            w: self.w * other.w - self.x * other.x - self.y * other.y - self.z * other.z,
            x: self.w * other.x + self.x * other.w + self.y * other.z - self.z * other.y,
            y: self.w * other.y - self.x * other.z + self.y * other.w + self.z * other.x,
            z: self.w * other.z + self.x * other.y - self.y * other.x + self.z * other.w,
        }
    }

    /// Rotate a vector by this quaternion (assumed unit length).
    pub fn rotate(self, v: Vec3) -> Vec3 {
        // q * (0, v) * q^-1 expanded via the two-cross-product form.
        let u = Vec3::new(self.x, self.y, self.z);
        let uv = u.cross(v);
        let uuv = u.cross(uv);
        Vec3 {
            x: v.x + 2.0 * (self.w * uv.x + uuv.x),
            y: v.y + 2.0 * (self.w * uv.y + uuv.y),
            z: v.z + 2.0 * (self.w * uv.z + uuv.z),
        }
    }

    /// Rotation of `angle` radians about a unit `axis`.
    pub fn from_axis_angle(axis: Vec3, angle: f64) -> Quat {
        let half = angle * 0.5;
        let s = half.sin();
        Quat {
            x: axis.x * s,
            y: axis.y * s,
            z: axis.z * s,
            w: half.cos(),
        }
    }

    /// Shortest-arc rotation taking unit vector `from` onto unit vector `to`.
    pub fn between(from: Vec3, to: Vec3) -> Quat {
        let d = from.dot(to);
        if d >= 1.0 - 1e-9 {
            return Quat::IDENTITY;
        }
        if d <= -1.0 + 1e-9 {
            // Antiparallel: rotate half a turn around any perpendicular axis.
            let axis = from.any_perpendicular().normalized();
            return Quat::new(axis.x, axis.y, axis.z, 0.0);
        }
        let axis = from.cross(to);
        Quat::new(axis.x, axis.y, axis.z, 1.0 + d).normalized()
    }
}

/// 3D point or direction. Units are engine-defined.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Explicit conversion to `[x, y, z]` for game-engine interop.
    pub fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    /// Explicit conversion from `[x, y, z]`.
    pub fn from_array([x, y, z]: [f64; 3]) -> Self {
        Self { x, y, z }
    }

    pub fn add(self, other: Vec3) -> Vec3 {
        Vec3::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }

    pub fn sub(self, other: Vec3) -> Vec3 {
        Vec3::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }

    pub fn scale(self, s: f64) -> Vec3 {
        Vec3::new(self.x * s, self.y * s, self.z * s)
    }

    pub fn dot(self, other: Vec3) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(self, other: Vec3) -> Vec3 {
        Vec3::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    pub fn length(self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Unit-length copy; zero-length input stays zero.
    pub fn normalized(self) -> Vec3 {
        let len = self.length();
        if len <= 1e-12 {
            return Vec3::ZERO;
        }
        self.scale(1.0 / len)
    }

    /// Some vector perpendicular to this one; which one is unspecified but
    /// deterministic.
    pub fn any_perpendicular(self) -> Vec3 {
        if self.x.abs() < self.z.abs() {
            Vec3::new(0.0, -self.z, self.y)
        } else {
            Vec3::new(-self.y, self.x, 0.0)
        }
    }
}

/// Position plus orientation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub translation: Vec3,
    pub rotation: Quat,
}

impl Pose {
    /// Pose at the origin with the identity rotation.
    pub const IDENTITY: Pose = Pose {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    pub fn new(translation: Vec3, rotation: Quat) -> Self {
        Self {
            translation,
            rotation,
        }
    }
}

/// One finger's joint chain, ordered carpal → distal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Finger {
    pub joints: [Pose; JOINTS_PER_FINGER],
}

impl Finger {
    pub fn carpal(&self) -> &Pose {
        &self.joints[0]
    }

    pub fn metacarpal(&self) -> &Pose {
        &self.joints[1]
    }

    pub fn proximal(&self) -> &Pose {
        &self.joints[2]
    }

    pub fn intermediate(&self) -> &Pose {
        &self.joints[3]
    }

    pub fn distal(&self) -> &Pose {
        &self.joints[4]
    }
}

impl Default for Finger {
    fn default() -> Self {
        Finger {
            joints: [Pose::IDENTITY; JOINTS_PER_FINGER],
        }
    }
}

/// Unprocessed device sample: two IMU orientations and ten flex sensor
/// readings, unscaled.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandRaw {
    /// `imu[0]` = hand, `imu[1]` = thumb.
    pub imu: [Quat; IMUS_PER_GLOVE],
    /// Paired per finger, little finger first; even index = lower sensor.
    pub finger_sensors: [f64; SENSORS_PER_GLOVE],
}

impl Default for HandRaw {
    fn default() -> Self {
        HandRaw {
            imu: [Quat::IDENTITY; IMUS_PER_GLOVE],
            finger_sensors: [0.0; SENSORS_PER_GLOVE],
        }
    }
}

/// Processed skeletal hand: the raw sample it was derived from, the wrist
/// orientation, and five scaled finger chains.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hand {
    pub raw: HandRaw,
    pub wrist: Quat,
    /// Ordered thumb, index, middle, ring, pinky.
    pub fingers: [Finger; FINGERS_PER_HAND],
}

impl Hand {
    pub fn thumb(&self) -> &Finger {
        &self.fingers[0]
    }

    pub fn index(&self) -> &Finger {
        &self.fingers[1]
    }

    pub fn middle(&self) -> &Finger {
        &self.fingers[2]
    }

    pub fn ring(&self) -> &Finger {
        &self.fingers[3]
    }

    pub fn pinky(&self) -> &Finger {
        &self.fingers[4]
    }
}

impl Default for Hand {
    fn default() -> Self {
        Hand {
            raw: HandRaw::default(),
            wrist: Quat::IDENTITY,
            fingers: [Finger::default(); FINGERS_PER_HAND],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quat_array_conversion_is_lossless() {
        let q = Quat::new(0.1, -0.2, 0.3, 0.9);
        assert_eq!(Quat::from_array(q.to_array()), q);
        let v = Vec3::new(1.0, 2.0, -3.0);
        assert_eq!(Vec3::from_array(v.to_array()), v);
    }

    #[test]
    fn degenerate_quaternion_is_rejected() {
        assert!(!Quat::new(0.0, 0.0, 0.0, 0.0).is_valid_rotation());
        assert!(!Quat::new(f64::NAN, 0.0, 0.0, 1.0).is_valid_rotation());
        assert!(Quat::IDENTITY.is_valid_rotation());
    }

    #[test]
    fn rotate_quarter_turn() {
        // 90 degrees about Z takes +X to +Y.
        let half = std::f64::consts::FRAC_PI_4;
        let q = Quat::new(0.0, 0.0, half.sin(), half.cos());
        let v = q.rotate(Vec3::new(1.0, 0.0, 0.0));
        assert!((v.x).abs() < 1e-9);
        assert!((v.y - 1.0).abs() < 1e-9);
        assert!((v.z).abs() < 1e-9);
    }

    #[test]
    fn between_maps_from_onto_to() {
        let from = Vec3::new(1.0, 0.0, 0.0);
        let to = Vec3::new(0.0, 0.0, 1.0);
        let v = Quat::between(from, to).rotate(from);
        assert!((v.sub(to)).length() < 1e-9);

        // Antiparallel input still yields a usable half-turn.
        let back = Quat::between(from, Vec3::new(-1.0, 0.0, 0.0)).rotate(from);
        assert!((back.x + 1.0).abs() < 1e-9);
    }

    #[test]
    fn finger_joint_accessors_follow_chain_order() {
        let mut finger = Finger::default();
        finger.joints[4].translation.x = 9.0;
        assert_eq!(finger.distal().translation.x, 9.0);
        assert_eq!(finger.carpal().translation.x, 0.0);
    }
}
