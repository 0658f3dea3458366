//! Profile management - the per-user calibration surface.
//!
//! The engine keeps two copies of the profile set: a durable copy on disk
//! and a working copy in memory. `set_profile`, `select_profile`, and
//! `create_profile` mutate the working copy only; `commit_profiles` makes
//! the working copy durable (the prior durable data is irrecoverable) and
//! `revert_profiles` discards working changes. Readers - `profile` and
//! `update_ik` - observe the latest committed-or-working state at call time.

use mg_protocol::IkProfile;
use mg_runtime::{Error, Result};
use serde_json::json;

use crate::Session;

impl Session {
    /// Total number of user profiles, committed or not.
    pub async fn profile_count(&self) -> Result<u32> {
        let value = self.inner.request("profileCount", json!({})).await?;
        value["count"]
            .as_u64()
            .map(|v| v as u32)
            .ok_or_else(|| Error::ProtocolError("response missing 'count'".to_string()))
    }

    /// Identifier of the profile at `index`.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] for `index >= profile_count()`.
    pub async fn profile_name(&self, index: u32) -> Result<String> {
        let value = self
            .inner
            .request("profileName", json!({"index": index}))
            .await?;
        value["name"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| Error::ProtocolError("response missing 'name'".to_string()))
    }

    /// Create a new profile (working copy only) and return its index.
    ///
    /// Select it with [`Session::select_profile`]; commit to make it
    /// durable.
    pub async fn create_profile(&self, name: &str) -> Result<u32> {
        let value = self
            .inner
            .request("createProfile", json!({"name": name}))
            .await?;
        value["index"]
            .as_u64()
            .map(|v| v as u32)
            .ok_or_else(|| Error::ProtocolError("response missing 'index'".to_string()))
    }

    /// Switch which profile is current for subsequent `profile`,
    /// `set_profile`, and IK calls.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] for `index >= profile_count()`.
    pub async fn select_profile(&self, index: u32) -> Result<()> {
        self.inner
            .request("selectProfile", json!({"index": index}))
            .await
            .map(|_| ())
    }

    /// Working copy of the currently selected profile.
    ///
    /// This is the data the IK system and the skeletal hand model scale
    /// with; use it to scale an in-game model to the user as well.
    pub async fn profile(&self) -> Result<IkProfile> {
        let value = self.inner.request("getProfile", json!({})).await?;
        serde_json::from_value(value)
            .map_err(|e| Error::ProtocolError(format!("bad profile response: {e}")))
    }

    /// Replace the working copy of the currently selected profile.
    ///
    /// Durable state is untouched until [`Session::commit_profiles`].
    pub async fn set_profile(&self, profile: &IkProfile) -> Result<()> {
        self.inner
            .request("setProfile", serde_json::to_value(profile)?)
            .await
            .map(|_| ())
    }

    /// Write the working copies of all profiles to durable storage.
    ///
    /// After this call the previous durable data can no longer be
    /// retrieved.
    ///
    /// # Errors
    ///
    /// [`Error::Filesystem`] if the engine cannot write profile storage;
    /// durable state is unchanged in that case.
    pub async fn commit_profiles(&self) -> Result<()> {
        self.inner
            .request("commitProfiles", json!({}))
            .await
            .map(|_| ())
    }

    /// Discard working changes, restoring every profile to its durable
    /// state. Idempotent: calling it again without intervening mutation is
    /// a no-op.
    pub async fn revert_profiles(&self) -> Result<()> {
        self.inner
            .request("revertProfiles", json!({}))
            .await
            .map(|_| ())
    }
}
