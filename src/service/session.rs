//! Framed message sessions over any byte stream.
//!
//! Each frame carries exactly one tagged value, prefixed by its length
//! (`LengthDelimitedCodec`, 4-byte length header). The stream can be a TCP
//! socket, a Unix socket or an in-memory duplex pipe.

use crate::config::TransportConfig;
use crate::core::schema::WireType;
use crate::core::value::Value;
use crate::error::Result;
use crate::service::controller::MessageController;
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{Framed, LengthDelimitedCodec};
use tracing::{debug, info, instrument, warn};

/// One side of a framed message stream.
pub struct Connection<T> {
    framed: Framed<T, LengthDelimitedCodec>,
    controller: Arc<MessageController>,
}

impl<T> Connection<T>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(io: T, controller: Arc<MessageController>, config: &TransportConfig) -> Self {
        let codec = LengthDelimitedCodec::builder()
            .max_frame_length(config.max_frame_size)
            .new_codec();
        Self {
            framed: Framed::new(io, codec),
            controller,
        }
    }

    pub fn controller(&self) -> &MessageController {
        &self.controller
    }

    /// Encode `message` and write it as one frame.
    #[instrument(skip(self, message), fields(kind = M::TYPE_NAME), level = "debug")]
    pub async fn send<M: WireType>(&mut self, message: &M) -> Result<()> {
        let frame = self.controller.encode(message)?;
        self.framed.send(frame).await?;
        Ok(())
    }

    /// Next decodable value from the peer, without dispatching it.
    ///
    /// Frames carrying unknown types are skipped. Returns `None` once the
    /// peer closes the stream.
    pub async fn recv(&mut self) -> Result<Option<Value>> {
        while let Some(frame) = self.framed.next().await {
            let frame = frame?;
            self.controller.metrics().message_received(frame.len() as u64);
            if let Some(value) = self.controller.decode(&frame)? {
                return Ok(Some(value));
            }
            debug!(bytes = frame.len(), "Skipped frame of unknown type");
        }
        Ok(None)
    }

    /// Process frames until the peer disconnects.
    ///
    /// Requests are answered on the same stream. Per-message failures are
    /// logged and the loop continues; I/O and fatal errors end the session.
    #[instrument(skip(self))]
    pub async fn run(mut self) -> Result<()> {
        info!("Session started");

        while let Some(frame) = self.framed.next().await {
            let frame = frame?;
            match self.controller.process(&frame) {
                Ok(Some(reply)) => self.framed.send(reply).await?,
                Ok(None) => {}
                Err(e) if e.is_fatal() => {
                    warn!(error = %e, "Fatal error, closing session");
                    return Err(e);
                }
                Err(e) => warn!(error = %e, category = ?e.category(), "Message rejected"),
            }
        }

        self.controller.metrics().log_metrics();
        info!("Session closed by peer");
        Ok(())
    }
}

/// Serve one connection with `controller` until the peer disconnects.
pub async fn serve<T>(io: T, controller: Arc<MessageController>, config: &TransportConfig) -> Result<()>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    Connection::new(io, controller, config).run().await
}
