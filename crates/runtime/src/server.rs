//! Engine process management.
//!
//! Handles locating, launching, and managing the lifecycle of the native
//! glove engine daemon. The daemon speaks the length-prefixed JSON protocol
//! on its stdio pipes.

use std::path::PathBuf;

use tokio::process::{Child, Command};

use crate::error::{Error, Result};

/// Name of the engine executable searched for on PATH.
pub const ENGINE_EXE: &str = "mg-engine";

/// Environment variable overriding engine discovery with an explicit path.
pub const ENGINE_EXE_ENV: &str = "MG_ENGINE_EXE";

/// Locate the engine executable.
///
/// Search order:
/// 1. `MG_ENGINE_EXE` environment variable (runtime override)
/// 2. `mg-engine` on PATH
///
/// # Errors
///
/// Returns [`Error::EngineNotFound`] if neither yields an existing file.
pub fn find_engine_executable() -> Result<PathBuf> {
    if let Ok(path) = std::env::var(ENGINE_EXE_ENV) {
        let path = PathBuf::from(path);
        if path.exists() {
            tracing::debug!(path = %path.display(), "using engine from {}", ENGINE_EXE_ENV);
            return Ok(path);
        }
        tracing::warn!(
            path = %path.display(),
            "{} is set but does not exist; falling back to PATH",
            ENGINE_EXE_ENV
        );
    }

    match which::which(ENGINE_EXE) {
        Ok(path) => {
            tracing::debug!(path = %path.display(), "using engine from PATH");
            Ok(path)
        }
        Err(_) => Err(Error::EngineNotFound),
    }
}

/// Manages the engine daemon process lifecycle.
///
/// The EngineServer wraps the engine child process. It communicates with the
/// engine via stdio pipes using the length-prefixed JSON protocol.
#[derive(Debug)]
pub struct EngineServer {
    /// The engine child process.
    ///
    /// Public so the connection layer can take the stdio pipes. Production
    /// code should go through the Connection rather than the process
    /// directly.
    pub process: Child,
}

impl EngineServer {
    /// Launch the engine daemon.
    ///
    /// This will:
    /// 1. Locate the engine executable (env override, then PATH)
    /// 2. Launch it with `serve` on piped stdio
    /// 3. Verify the process did not exit immediately
    ///
    /// # Errors
    ///
    /// Returns [`Error::EngineNotFound`] if the engine cannot be located and
    /// [`Error::LaunchFailed`] if the process fails to start.
    pub async fn launch() -> Result<Self> {
        let exe = find_engine_executable()?;

        let mut cmd = Command::new(&exe);
        cmd.arg("serve")
            .env("MG_CLIENT_NAME", "rust")
            .env("MG_CLIENT_VERSION", env!("CARGO_PKG_VERSION"))
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::inherit());

        let mut child = cmd
            .spawn()
            .map_err(|e| Error::LaunchFailed(format!("failed to spawn process: {}", e)))?;

        // Give a crashing engine a moment to exit so we can report it as a
        // launch failure instead of a dead connection.
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        match child.try_wait() {
            Ok(Some(status)) => Err(Error::LaunchFailed(format!(
                "engine exited immediately with status: {}",
                status
            ))),
            Ok(None) => Ok(Self { process: child }),
            Err(e) => Err(Error::LaunchFailed(format!(
                "failed to check process status: {}",
                e
            ))),
        }
    }

    /// Shut down the engine process.
    ///
    /// # Platform-Specific Behavior
    ///
    /// **Windows**: Explicitly closes stdio pipes before killing the process;
    /// tokio uses a blocking threadpool for child stdio there and cleanup can
    /// hang if the pipes stay open.
    ///
    /// **Unix**: Standard termination with a graceful wait.
    pub async fn shutdown(mut self) -> Result<()> {
        #[cfg(windows)]
        {
            drop(self.process.stdin.take());
            drop(self.process.stdout.take());
            drop(self.process.stderr.take());
        }

        self.process
            .kill()
            .await
            .map_err(|e| Error::LaunchFailed(format!("failed to kill process: {}", e)))?;

        let _ = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            self.process.wait(),
        )
        .await;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_engine_is_a_distinguishable_error() {
        // Point the override somewhere that cannot exist so discovery fails
        // deterministically regardless of PATH.
        unsafe {
            std::env::set_var(ENGINE_EXE_ENV, "/nonexistent/mg-engine-test");
            std::env::set_var("PATH", "/nonexistent");
        }

        let err = EngineServer::launch().await.unwrap_err();
        assert!(matches!(err, Error::EngineNotFound), "got: {err:?}");
    }
}
