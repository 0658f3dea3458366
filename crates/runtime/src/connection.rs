//! Request/response connection to the glove engine.
//!
//! This module implements the correlation layer on top of the transport:
//! - Generating unique request IDs
//! - Correlating responses with pending requests
//! - Distinguishing engine events from responses
//! - Feeding `sample` events into the per-device sample store
//!
//! # Message Flow
//!
//! 1. Client calls `send_request()` with a method and params
//! 2. Connection generates a unique ID and creates a oneshot channel
//! 3. Request is serialized and sent via transport
//! 4. Client awaits on the oneshot receiver
//! 5. Message loop receives the response from the transport
//! 6. Response is correlated by ID and delivered via the oneshot channel

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::task::{Context, Poll};

use mg_protocol::{DeviceType, Hand};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Mutex as TokioMutex;
use tokio::sync::{mpsc, oneshot};

use crate::error::{Error, Result};
use crate::samples::SampleStore;
use crate::transport::{Transport, TransportParts, TransportReceiver};

/// Protocol request message sent to the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    /// Unique request ID for correlating responses.
    pub id: u32,
    /// Method name to invoke.
    pub method: String,
    /// Method parameters as a JSON object.
    pub params: Value,
}

/// Protocol response message from the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    /// Request ID this response correlates to.
    pub id: u32,
    /// Success result (mutually exclusive with error).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error result (mutually exclusive with result).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorPayload>,
}

/// Engine-reported error details. The numeric code is authoritative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorPayload {
    /// Wire error code.
    pub code: u32,
    /// Human-oriented context from the engine.
    pub message: String,
}

/// Unsolicited event message from the engine (no `id` field).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Event method name.
    pub method: String,
    /// Event parameters as a JSON object.
    pub params: Value,
}

/// Discriminated union of incoming protocol messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Message {
    /// Response message (has `id` field).
    Response(Response),
    /// Event message (no `id` field).
    Event(Event),
    /// Unknown message type (forward-compatible catch-all).
    Unknown(Value),
}

/// Payload of a `sample` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleEvent {
    pub device: DeviceType,
    pub seq: u64,
    pub hand: Hand,
}

/// Payload of `deviceConnected` / `deviceDisconnected` events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceEvent {
    pub device: DeviceType,
}

/// Pending request callbacks keyed by request ID.
type CallbackMap = Arc<TokioMutex<HashMap<u32, oneshot::Sender<Result<Value>>>>>;

/// RAII guard ensuring callback cleanup when a request future is dropped.
struct CancelGuard {
    id: u32,
    callbacks: CallbackMap,
    completed: bool,
}

impl CancelGuard {
    fn new(id: u32, callbacks: CallbackMap) -> Self {
        Self {
            id,
            callbacks,
            completed: false,
        }
    }

    fn complete(&mut self) {
        self.completed = true;
    }
}

impl Drop for CancelGuard {
    fn drop(&mut self) {
        if self.completed {
            return;
        }

        let id = self.id;
        let callbacks = Arc::clone(&self.callbacks);

        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                if callbacks.lock().await.remove(&id).is_some() {
                    tracing::debug!(id, "CancelGuard: removed orphaned callback");
                }
            });
        }
    }
}

/// Future returned by [`Connection::send_request`] with automatic
/// cancellation cleanup.
struct ResponseFuture {
    rx: oneshot::Receiver<Result<Value>>,
    guard: CancelGuard,
}

impl Future for ResponseFuture {
    type Output = Result<Value>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(result) => {
                self.guard.complete();
                Poll::Ready(result.map_err(|_| Error::ChannelClosed).and_then(|r| r))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Correlated connection to the glove engine.
///
/// Uses sequential request IDs and oneshot channels for correlation; engine
/// events are dispatched as they arrive, so the sample store stays current
/// even while no request is in flight.
pub struct Connection {
    /// Sequential request ID counter (atomic for thread safety).
    last_id: AtomicU32,
    /// Pending request callbacks keyed by request ID.
    callbacks: CallbackMap,
    /// Channel for sending outbound messages to the writer task.
    outbound_tx: mpsc::UnboundedSender<Value>,
    /// Transport sender (taken by run() to start the writer task).
    transport_sender: TokioMutex<Option<Box<dyn Transport>>>,
    /// Receiver half of the transport (taken by run(), driven once).
    transport_receiver: TokioMutex<Option<Box<dyn TransportReceiver>>>,
    /// Receiver for incoming messages from the transport.
    message_rx: TokioMutex<Option<mpsc::UnboundedReceiver<Value>>>,
    /// Receiver for outbound messages (taken by run()).
    outbound_rx: TokioMutex<Option<mpsc::UnboundedReceiver<Value>>>,
    /// Newest sample per device, fed by `sample` events.
    samples: SampleStore,
}

impl Connection {
    /// Create a new Connection over the given transport.
    pub fn new(parts: TransportParts) -> Self {
        let TransportParts {
            sender,
            receiver,
            message_rx,
        } = parts;

        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();

        Self {
            last_id: AtomicU32::new(0),
            callbacks: Arc::new(TokioMutex::new(HashMap::new())),
            outbound_tx,
            transport_sender: TokioMutex::new(Some(sender)),
            transport_receiver: TokioMutex::new(Some(receiver)),
            message_rx: TokioMutex::new(Some(message_rx)),
            outbound_rx: TokioMutex::new(Some(outbound_rx)),
            samples: SampleStore::new(),
        }
    }

    /// The per-device sample store this connection keeps current.
    pub fn samples(&self) -> &SampleStore {
        &self.samples
    }

    /// Send a request to the engine and await the correlated response.
    ///
    /// An engine-reported error decodes into the matching [`Error`] variant
    /// with the engine's code preserved.
    pub async fn send_request(&self, method: &str, params: Value) -> Result<Value> {
        let id = self.last_id.fetch_add(1, Ordering::SeqCst);

        tracing::debug!(id, method, "sending request");

        let (tx, rx) = oneshot::channel();
        self.callbacks.lock().await.insert(id, tx);

        let guard = CancelGuard::new(id, Arc::clone(&self.callbacks));

        let request = Request {
            id,
            method: method.to_string(),
            params,
        };

        let request_value = serde_json::to_value(&request)?;

        if self.outbound_tx.send(request_value).is_err() {
            tracing::error!("failed to queue request: outbound channel closed");
            return Err(Error::ChannelClosed);
        }

        ResponseFuture { rx, guard }.await
    }

    /// Run the message dispatch loop.
    ///
    /// Spawns the transport reader and writer tasks, then dispatches
    /// incoming messages until the transport closes.
    pub async fn run(self: &Arc<Self>) {
        let transport_receiver = self
            .transport_receiver
            .lock()
            .await
            .take()
            .expect("run() can only be called once - transport receiver already taken");

        let mut transport_sender = self
            .transport_sender
            .lock()
            .await
            .take()
            .expect("run() can only be called once - transport sender already taken");

        let mut outbound_rx = self
            .outbound_rx
            .lock()
            .await
            .take()
            .expect("run() can only be called once - outbound receiver already taken");

        let reader_handle = tokio::spawn(async move {
            if let Err(e) = transport_receiver.run().await {
                tracing::error!("transport read error: {}", e);
            }
        });

        let writer_handle = tokio::spawn(async move {
            while let Some(message) = outbound_rx.recv().await {
                if let Err(e) = transport_sender.send(message).await {
                    tracing::error!("transport write error: {}", e);
                    break;
                }
            }
        });

        let mut message_rx = self
            .message_rx
            .lock()
            .await
            .take()
            .expect("run() can only be called once - message receiver already taken");

        while let Some(message_value) = message_rx.recv().await {
            match serde_json::from_value::<Message>(message_value) {
                Ok(message) => {
                    if let Err(e) = self.dispatch_internal(message).await {
                        tracing::error!("error dispatching message: {}", e);
                    }
                }
                Err(e) => {
                    tracing::error!("failed to parse message: {}", e);
                }
            }
        }

        let _ = reader_handle.await;
        let _ = writer_handle.await;
    }

    /// Dispatch an incoming message (test-only public version).
    #[cfg(test)]
    pub async fn dispatch(self: &Arc<Self>, message: Message) -> Result<()> {
        self.dispatch_internal(message).await
    }

    async fn dispatch_internal(self: &Arc<Self>, message: Message) -> Result<()> {
        match message {
            Message::Response(response) => {
                let callback = self
                    .callbacks
                    .lock()
                    .await
                    .remove(&response.id)
                    .ok_or_else(|| {
                        Error::ProtocolError(format!(
                            "cannot find request to respond: id={}",
                            response.id
                        ))
                    })?;

                let result = if let Some(payload) = response.error {
                    Err(Error::from_wire(payload.code, payload.message, None))
                } else {
                    Ok(response.result.unwrap_or(Value::Null))
                };

                let _ = callback.send(result);
                Ok(())
            }
            Message::Event(event) => match event.method.as_str() {
                "sample" => {
                    let sample: SampleEvent = serde_json::from_value(event.params)
                        .map_err(|e| Error::ProtocolError(format!("bad sample event: {e}")))?;
                    self.samples.publish(sample.device, sample.seq, sample.hand);
                    Ok(())
                }
                "deviceConnected" => {
                    let ev: DeviceEvent = serde_json::from_value(event.params)
                        .map_err(|e| Error::ProtocolError(format!("bad device event: {e}")))?;
                    tracing::debug!(device = %ev.device, "device connected");
                    Ok(())
                }
                "deviceDisconnected" => {
                    let ev: DeviceEvent = serde_json::from_value(event.params)
                        .map_err(|e| Error::ProtocolError(format!("bad device event: {e}")))?;
                    tracing::debug!(device = %ev.device, "device disconnected");
                    self.samples.clear(ev.device);
                    Ok(())
                }
                other => {
                    tracing::debug!(method = other, "unknown event (ignored)");
                    Ok(())
                }
            },
            Message::Unknown(value) => {
                tracing::debug!(
                    "unknown message type (forward-compatible, ignored): {}",
                    serde_json::to_string(&value)
                        .unwrap_or_else(|_| "<serialization failed>".to_string())
                );
                Ok(())
            }
        }
    }
}
