//! Session - the root handle scoping every engine call.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use mg_protocol::{CoordUp, DeviceType, Handedness};
use mg_runtime::connection::Connection;
use mg_runtime::emulated::{EmulatedEngine, EmulatedEngineOptions};
use mg_runtime::server::EngineServer;
use mg_runtime::transport::{PipeTransport, TransportParts};
use mg_runtime::{Error, Result};
use parking_lot::Mutex;
use serde_json::{Value, json};

use crate::Glove;

/// How long the `initialize` handshake may take before the launch fails.
const INITIALIZE_TIMEOUT: Duration = Duration::from_secs(30);

/// An exclusively-owned handle to one engine connection.
///
/// Every other operation in this crate is scoped to a session: device
/// queries and haptics through [`Session::glove`], profile management,
/// coordinate-system configuration, and IK updates directly on the session.
///
/// A session is created by [`Session::launch`] (native engine daemon) or
/// [`Session::emulated`] (in-process emulated engine) and released exactly
/// once by [`Session::shutdown`]. Operations after shutdown - including a
/// second shutdown - fail with [`Error::InvalidSession`]. Dropping a session
/// without shutting it down force-kills an owned engine process.
///
/// Drive one session from one logical task; the contract does not define
/// concurrent calls on the same session.
///
/// # Example
///
/// ```ignore
/// use mg::{DeviceType, Session};
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let session = Session::launch().await?;
///     let glove = session.glove(DeviceType::Right);
///
///     if glove.is_connected().await {
///         let hand = glove.hand(Duration::from_millis(100)).await?;
///         println!("wrist: {:?}", hand.wrist);
///     }
///
///     session.shutdown().await?;
///     Ok(())
/// }
/// ```
pub struct Session {
    pub(crate) inner: Arc<SessionInner>,
}

pub(crate) struct SessionInner {
    /// Correlated connection to the engine.
    connection: Arc<Connection>,
    /// Owned engine process, present only for [`Session::launch`] sessions.
    ///
    /// Wrapped in `Mutex<Option<..>>` so shutdown can take ownership once
    /// while the session is still shared with `Glove` handles.
    server: Mutex<Option<EngineServer>>,
    /// Set by shutdown (or Drop); gates every subsequent operation.
    closed: AtomicBool,
}

impl SessionInner {
    pub(crate) fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(Error::InvalidSession);
        }
        Ok(())
    }

    /// Send one request, refusing if the session was shut down.
    pub(crate) async fn request(&self, method: &str, params: Value) -> Result<Value> {
        self.ensure_open()?;
        self.connection.send_request(method, params).await
    }

    pub(crate) fn connection(&self) -> &Connection {
        &self.connection
    }
}

impl Session {
    /// Launch the native engine daemon and open a session to it.
    ///
    /// This will:
    /// 1. Locate the engine executable (`MG_ENGINE_EXE`, then PATH)
    /// 2. Spawn it with piped stdio and verify it stays up
    /// 3. Connect over the stdio transport
    /// 4. Perform the `initialize` handshake
    ///
    /// # Errors
    ///
    /// Returns [`Error::EngineNotFound`] / [`Error::LaunchFailed`] when the
    /// engine is missing or will not start, and
    /// [`Error::ConnectionFailed`] when the handshake does not complete
    /// within 30 seconds.
    pub async fn launch() -> Result<Self> {
        tracing::debug!("launching glove engine");
        let mut server = EngineServer::launch().await?;

        let stdin = server
            .process
            .stdin
            .take()
            .ok_or_else(|| Error::ConnectionFailed("failed to get engine stdin".to_string()))?;
        let stdout = server
            .process
            .stdout
            .take()
            .ok_or_else(|| Error::ConnectionFailed("failed to get engine stdout".to_string()))?;

        let (transport, message_rx) = PipeTransport::new(stdin, stdout);
        let parts = transport.into_transport_parts(message_rx);

        Self::connect(parts, Some(server)).await
    }

    /// Open a session to the in-process emulated engine with default
    /// options: a virtual dongle with both gloves connected and volatile
    /// profile storage.
    pub async fn emulated() -> Result<Self> {
        Self::emulated_with(EmulatedEngineOptions::default()).await
    }

    /// Open a session to the in-process emulated engine.
    ///
    /// Pointing `options.storage_dir` at a directory makes committed
    /// profiles durable across sessions, which is how an engine restart is
    /// simulated.
    pub async fn emulated_with(options: EmulatedEngineOptions) -> Result<Self> {
        let parts = EmulatedEngine::spawn(options)?;
        Self::connect(parts, None).await
    }

    async fn connect(parts: TransportParts, server: Option<EngineServer>) -> Result<Self> {
        let connection: Arc<Connection> = Arc::new(Connection::new(parts));

        // Spawn the connection message loop in the background.
        let conn_for_loop = Arc::clone(&connection);
        tokio::spawn(async move {
            conn_for_loop.run().await;
        });

        tracing::debug!("initializing engine session");
        tokio::time::timeout(
            INITIALIZE_TIMEOUT,
            connection.send_request("initialize", json!({})),
        )
        .await
        .map_err(|_| Error::ConnectionFailed("initialize handshake timed out".to_string()))??;

        Ok(Session {
            inner: Arc::new(SessionInner {
                connection,
                server: Mutex::new(server),
                closed: AtomicBool::new(false),
            }),
        })
    }

    /// A handle to one glove, selected left or right.
    ///
    /// Handles are cheap; each tracks its own sample freshness cursor, so a
    /// new handle may re-observe the newest buffered sample once.
    pub fn glove(&self, device: DeviceType) -> Glove {
        Glove::new(Arc::clone(&self.inner), device)
    }

    /// Configure the coordinate system for every pose subsequently returned
    /// or consumed by this session.
    ///
    /// All six (up, handedness) combinations are valid. Changing the
    /// coordinate system mid-session invalidates the frame of reference of
    /// any pose the caller is still holding; re-fetch after a change.
    pub async fn set_coordinate_system(
        &self,
        up: CoordUp,
        handedness: Handedness,
    ) -> Result<()> {
        self.inner
            .request(
                "setCoordinateSystem",
                json!({"up": up, "handedness": handedness}),
            )
            .await
            .map(|_| ())
    }

    /// IDs of every dongle the engine currently sees.
    pub async fn dongle_ids(&self) -> Result<Vec<u32>> {
        let value = self.inner.request("dongleIds", json!({})).await?;
        serde_json::from_value(value["ids"].clone())
            .map_err(|e| Error::ProtocolError(format!("bad dongleIds response: {e}")))
    }

    /// Set the dongle radio channel.
    pub async fn set_channel(&self, channel: u32) -> Result<()> {
        self.inner
            .request("setChannel", json!({"channel": channel}))
            .await
            .map(|_| ())
    }

    /// Add the virtual dongle that emulates two connected gloves.
    ///
    /// A native engine build without debug support answers
    /// [`Error::NotImplemented`].
    pub async fn add_debug_device(&self) -> Result<()> {
        self.inner
            .request("addDebugDevice", json!({}))
            .await
            .map(|_| ())
    }

    /// Remove the virtual dongle again.
    pub async fn remove_debug_device(&self) -> Result<()> {
        self.inner
            .request("removeDebugDevice", json!({}))
            .await
            .map(|_| ())
    }

    /// Shut down the session, exactly once.
    ///
    /// Tells the engine to release the session and terminates an owned
    /// engine process. Every operation after this - including a second
    /// `shutdown` - fails with [`Error::InvalidSession`].
    pub async fn shutdown(&self) -> Result<()> {
        if self.inner.closed.swap(true, Ordering::SeqCst) {
            return Err(Error::InvalidSession);
        }

        if let Err(e) = self
            .inner
            .connection
            .send_request("shutdown", json!({}))
            .await
        {
            // The process is going away regardless; record, don't mask.
            tracing::debug!("engine shutdown request failed: {e}");
        }

        let server = self.inner.server.lock().take();
        if let Some(server) = server {
            tracing::debug!("shutting down glove engine process");
            server.shutdown().await?;
        }
        Ok(())
    }
}

impl Drop for Session {
    /// Ensures the engine process is terminated when the session is
    /// dropped without an explicit shutdown.
    ///
    /// Prefer calling `session.shutdown().await` for a graceful release;
    /// Drop can only kill synchronously.
    fn drop(&mut self) {
        self.inner.closed.store(true, Ordering::SeqCst);

        if let Some(mut server) = self.inner.server.lock().take() {
            tracing::debug!("Drop: force-killing glove engine");
            if let Err(e) = server.process.start_kill() {
                tracing::warn!("failed to kill glove engine in Drop: {}", e);
            }
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("closed", &self.inner.closed.load(Ordering::SeqCst))
            .field("owns_engine", &self.inner.server.lock().is_some())
            .finish()
    }
}
