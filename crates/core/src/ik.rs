//! Inverse-kinematics update.

use mg_protocol::{IkInput, IkSolve};
use mg_runtime::{Error, Result};

use crate::Session;

impl Session {
    /// Solve shoulder and upper-arm placement from the supplied
    /// end-effector poses.
    ///
    /// Field ownership is explicit: the caller supplies the head pose and
    /// one lower-arm pose per side in [`IkInput`]; the engine computes the
    /// shoulder pose and upper-arm orientation per side, returned in
    /// [`IkSolve`]. Nothing is mutated in place.
    ///
    /// The solve reads the session's currently selected working profile and
    /// coordinate system at call time, and is deterministic: unchanged
    /// input, profile, and coordinate system produce an identical solve.
    /// Intended for per-frame use; it does not block beyond the request
    /// round-trip.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] if any input rotation is a degenerate
    /// quaternion.
    pub async fn update_ik(&self, input: &IkInput) -> Result<IkSolve> {
        let value = self
            .inner
            .request("updateIk", serde_json::to_value(input)?)
            .await?;
        serde_json::from_value(value)
            .map_err(|e| Error::ProtocolError(format!("bad IK response: {e}")))
    }
}
