//! Stdio transport for the glove engine protocol.
//!
//! Messages are framed as a 4-byte little-endian length prefix followed by a
//! JSON payload. The same framing is used whether the peer is an engine
//! process on stdio pipes or the in-process emulated engine on a duplex
//! stream.

use std::future::Future;
use std::pin::Pin;

use serde_json::Value;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

use crate::error::{Error, Result};

/// Upper bound on a single frame. Anything larger is a framing bug, not a
/// legitimate engine message.
const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

/// Sending half of a transport.
pub trait Transport: Send {
    /// Serialize and send one message to the engine.
    fn send(&mut self, message: Value) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Receiving half of a transport.
///
/// `run` reads frames until EOF and forwards each decoded message to the
/// channel handed out by [`PipeTransport::new`].
pub trait TransportReceiver: Send {
    fn run(self: Box<Self>) -> Pin<Box<dyn Future<Output = Result<()>> + Send>>;
}

/// The pieces a connection needs: a sender, a receiver to drive, and the
/// channel the receiver feeds.
pub struct TransportParts {
    pub sender: Box<dyn Transport>,
    pub receiver: Box<dyn TransportReceiver>,
    pub message_rx: mpsc::UnboundedReceiver<Value>,
}

/// Length-prefixed JSON transport over any async byte stream pair.
pub struct PipeTransport<W, R> {
    sender: PipeTransportSender<W>,
    receiver: PipeTransportReceiver<R>,
}

impl<W, R> PipeTransport<W, R>
where
    W: AsyncWrite + Unpin + Send + 'static,
    R: AsyncRead + Unpin + Send + 'static,
{
    /// Create a transport over a write stream (to the engine) and a read
    /// stream (from the engine). Returns the transport and the channel
    /// incoming messages will arrive on once the receiver is running.
    pub fn new(writer: W, reader: R) -> (Self, mpsc::UnboundedReceiver<Value>) {
        let (message_tx, message_rx) = mpsc::unbounded_channel();
        let transport = PipeTransport {
            sender: PipeTransportSender { writer },
            receiver: PipeTransportReceiver { reader, message_tx },
        };
        (transport, message_rx)
    }

    /// Split into boxed halves plus the message channel.
    pub fn into_transport_parts(self, message_rx: mpsc::UnboundedReceiver<Value>) -> TransportParts {
        TransportParts {
            sender: Box::new(self.sender),
            receiver: Box::new(self.receiver),
            message_rx,
        }
    }
}

/// Writing half: frames and flushes one message at a time.
pub struct PipeTransportSender<W> {
    writer: W,
}

impl<W> Transport for PipeTransportSender<W>
where
    W: AsyncWrite + Unpin + Send,
{
    fn send(&mut self, message: Value) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            let payload = serde_json::to_vec(&message)?;
            let len = u32::try_from(payload.len())
                .map_err(|_| Error::TransportError("outgoing frame too large".to_string()))?;
            self.writer
                .write_all(&len.to_le_bytes())
                .await
                .map_err(|e| Error::TransportError(format!("write failed: {e}")))?;
            self.writer
                .write_all(&payload)
                .await
                .map_err(|e| Error::TransportError(format!("write failed: {e}")))?;
            self.writer
                .flush()
                .await
                .map_err(|e| Error::TransportError(format!("flush failed: {e}")))?;
            Ok(())
        })
    }
}

/// Reading half: decodes frames until EOF.
pub struct PipeTransportReceiver<R> {
    reader: R,
    message_tx: mpsc::UnboundedSender<Value>,
}

impl<R> TransportReceiver for PipeTransportReceiver<R>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    fn run(mut self: Box<Self>) -> Pin<Box<dyn Future<Output = Result<()>> + Send>> {
        Box::pin(async move {
            loop {
                let mut len_buf = [0u8; 4];
                match self.reader.read_exact(&mut len_buf).await {
                    Ok(_) => {}
                    // EOF between frames is a normal engine shutdown.
                    Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(()),
                    Err(e) => {
                        return Err(Error::TransportError(format!("read failed: {e}")));
                    }
                }

                let len = u32::from_le_bytes(len_buf) as usize;
                if len > MAX_FRAME_LEN {
                    return Err(Error::TransportError(format!(
                        "incoming frame of {len} bytes exceeds limit"
                    )));
                }

                let mut payload = vec![0u8; len];
                self.reader
                    .read_exact(&mut payload)
                    .await
                    .map_err(|e| Error::TransportError(format!("read failed mid-frame: {e}")))?;

                let message: Value = serde_json::from_slice(&payload)?;
                if self.message_tx.send(message).is_err() {
                    // Receiver side dropped; nothing left to deliver to.
                    return Ok(());
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_prefix_is_little_endian() {
        let length: u32 = 1234;
        let bytes = length.to_le_bytes();
        assert_eq!(bytes[0], (length & 0xFF) as u8);
        assert_eq!(bytes[1], ((length >> 8) & 0xFF) as u8);
        assert_eq!(u32::from_le_bytes(bytes), length);
    }

    #[tokio::test]
    async fn sent_frames_carry_length_then_json() {
        let (our_read, engine_write) = tokio::io::duplex(1024);
        let (engine_read, _our_write) = tokio::io::duplex(1024);

        let (transport, _rx) = PipeTransport::new(engine_write, engine_read);
        let mut parts = transport.into_transport_parts(_rx);

        let message = serde_json::json!({"id": 1, "method": "isConnected"});
        parts.sender.send(message.clone()).await.unwrap();

        let (mut read_half, _w) = tokio::io::split(our_read);
        let mut len_buf = [0u8; 4];
        read_half.read_exact(&mut len_buf).await.unwrap();
        let len = u32::from_le_bytes(len_buf) as usize;

        let mut payload = vec![0u8; len];
        read_half.read_exact(&mut payload).await.unwrap();
        let received: Value = serde_json::from_slice(&payload).unwrap();
        assert_eq!(received, message);
    }

    #[tokio::test]
    async fn receiver_decodes_messages_in_order() {
        let (_engine_read, client_write) = tokio::io::duplex(4096);
        let (client_read, mut engine_write) = tokio::io::duplex(4096);

        let (transport, rx) = PipeTransport::new(client_write, client_read);
        let TransportParts {
            sender: _sender,
            receiver,
            mut message_rx,
        } = transport.into_transport_parts(rx);

        let read_task = tokio::spawn(receiver.run());

        let messages = [
            serde_json::json!({"id": 1, "result": {}}),
            serde_json::json!({"method": "sample", "params": {"device": "left"}}),
            serde_json::json!({"id": 2, "result": {"count": 1}}),
        ];
        for msg in &messages {
            let payload = serde_json::to_vec(msg).unwrap();
            engine_write
                .write_all(&(payload.len() as u32).to_le_bytes())
                .await
                .unwrap();
            engine_write.write_all(&payload).await.unwrap();
        }
        engine_write.flush().await.unwrap();

        for expected in &messages {
            let received = message_rx.recv().await.unwrap();
            assert_eq!(&received, expected);
        }

        drop(engine_write);
        read_task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn eof_between_frames_is_clean_shutdown() {
        let (_engine_read, client_write) = tokio::io::duplex(64);
        let (client_read, engine_write) = tokio::io::duplex(64);

        let (transport, rx) = PipeTransport::new(client_write, client_read);
        let parts = transport.into_transport_parts(rx);

        drop(engine_write);
        parts.receiver.run().await.unwrap();
    }
}
