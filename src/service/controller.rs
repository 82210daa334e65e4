use crate::config::CodecConfig;
use crate::core::decoder::Decoder;
use crate::core::encoder::Encoder;
use crate::core::registry::TypeRegistry;
use crate::core::schema::WireType;
use crate::core::value::Value;
use crate::error::{Result, WireError};
use crate::protocol::dispatcher::Dispatcher;
use crate::utils::metrics::{Metrics, Timer};
use bytes::{Bytes, BytesMut};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Decode → dispatch → encode for one transport frame at a time.
///
/// A controller is immutable once built and can be shared across sessions
/// behind an `Arc`.
#[derive(Debug)]
pub struct MessageController {
    registry: Arc<TypeRegistry>,
    dispatcher: Dispatcher,
    encoder: Encoder,
    config: CodecConfig,
    metrics: Metrics,
}

impl MessageController {
    pub fn new(registry: Arc<TypeRegistry>, dispatcher: Dispatcher, config: CodecConfig) -> Self {
        Self {
            registry,
            dispatcher,
            encoder: Encoder::new(config),
            config,
            metrics: Metrics::new(),
        }
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Startup readiness check.
    ///
    /// # Errors
    /// `ConstructionUnavailable` without a construction service, whatever a
    /// bound handler's `construct` fails with (e.g. `ServiceMissing`),
    /// `DuplicatePropertyHash` if any registered type has colliding property
    /// names, `ConfigError` if a handler is bound to an unregistered kind.
    #[instrument(skip(self))]
    pub fn ensure_ready(&self) -> Result<()> {
        self.dispatcher.ensure_ready()?;
        self.registry.resolve_all()?;

        for (id, name) in self.dispatcher.bound_kinds() {
            if !self.registry.contains_id(id) {
                return Err(WireError::ConfigError(format!(
                    "'{name}' is bound to a handler but not registered"
                )));
            }
        }

        info!(
            types = self.registry.len(),
            handlers = self.dispatcher.len(),
            "Message controller ready"
        );
        Ok(())
    }

    /// Decode exactly one top-level value from `frame`.
    ///
    /// Returns `Ok(None)` when the frame carries an object of an
    /// unregistered type.
    ///
    /// Skipped items and failures are recorded in [`metrics`](Self::metrics)
    /// whether or not the frame decodes.
    pub fn decode(&self, frame: &[u8]) -> Result<Option<Value>> {
        let mut src = frame;
        let mut decoder = Decoder::new(&self.registry, self.config);
        let result = decoder.decode(&mut src).and_then(|value| {
            if src.is_empty() {
                Ok(value)
            } else {
                Err(WireError::TrailingBytes(src.len()))
            }
        });

        self.metrics
            .skipped(decoder.skipped_types(), decoder.skipped_properties());
        if result.is_err() {
            self.metrics.decode_error();
        }
        result
    }

    /// Encode an outbound message into one frame.
    pub fn encode<T: WireType>(&self, message: &T) -> Result<Bytes> {
        let mut dst = BytesMut::new();
        if let Err(e) = self.encoder.encode_object(message, &mut dst) {
            self.metrics.encode_error();
            return Err(e);
        }
        self.metrics.message_sent(dst.len() as u64);
        Ok(dst.freeze())
    }

    /// Run one inbound frame through the full pipeline.
    ///
    /// Requests yield the encoded response frame; responses and skipped
    /// unknown types yield `None`.
    pub fn process(&self, frame: &[u8]) -> Result<Option<Bytes>> {
        let _timer = Timer::start("process_frame");
        self.metrics.message_received(frame.len() as u64);

        let Some(value) = self.decode(frame)? else {
            debug!(bytes = frame.len(), "Skipped message of unknown type");
            return Ok(None);
        };

        let reply = match self.dispatcher.dispatch(value) {
            Ok(reply) => reply,
            Err(e) => {
                match e {
                    WireError::UnroutableMessage(_) => self.metrics.unroutable_message(),
                    _ => self.metrics.handler_error(),
                }
                return Err(e);
            }
        };

        let Some(reply) = reply else {
            self.metrics.response_dispatched();
            return Ok(None);
        };
        self.metrics.request_dispatched();

        match self.encoder.to_bytes(&reply) {
            Ok(frame) => {
                self.metrics.message_sent(frame.len() as u64);
                Ok(Some(frame))
            }
            Err(e) => {
                warn!(error = %e, kind = reply.kind_name(), "Failed to encode response");
                self.metrics.encode_error();
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::value::Tag;
    use crate::protocol::handler::{Handler, ServiceCollection, ServiceProvider};
    use crate::wire_type;

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Echo {
        text: String,
    }
    wire_type!(Echo => "tests.Echo" { text: String });

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Echoed {
        text: String,
        length: u32,
    }
    wire_type!(Echoed => "tests.Echoed" { text: String, length: u32 });

    struct EchoHandler;

    impl Handler for EchoHandler {
        type Request = Echo;
        type Response = Echoed;

        fn construct(_services: &dyn ServiceProvider) -> Result<Self> {
            Ok(Self)
        }

        fn process_request(&mut self, request: Echo) -> Result<Echoed> {
            let length = request.text.len() as u32;
            Ok(Echoed {
                text: request.text,
                length,
            })
        }
    }

    fn controller() -> MessageController {
        let registry = TypeRegistry::builder()
            .register::<Echo>()
            .register::<Echoed>()
            .build()
            .unwrap();
        let mut dispatcher = Dispatcher::with_services(Arc::new(ServiceCollection::new()));
        dispatcher.register::<EchoHandler>().unwrap();
        MessageController::new(Arc::new(registry), dispatcher, CodecConfig::default())
    }

    #[test]
    fn test_request_frame_yields_response_frame() {
        let controller = controller();
        controller.ensure_ready().unwrap();

        let frame = controller
            .encode(&Echo {
                text: "hey".into(),
            })
            .unwrap();
        let reply = controller.process(&frame).unwrap().unwrap();

        let decoded = controller.decode(&reply).unwrap().unwrap();
        assert_eq!(
            decoded.into_object::<Echoed>(),
            Some(Echoed {
                text: "hey".into(),
                length: 3
            })
        );

        // the request frame and the response frame were both encoded here
        let snapshot = controller.metrics().snapshot();
        assert_eq!(snapshot.messages_received, 1);
        assert_eq!(snapshot.requests_dispatched, 1);
        assert_eq!(snapshot.messages_sent, 2);
    }

    #[test]
    fn test_decode_records_failures_and_skips() {
        let controller = controller();
        let mut frame = controller.encode(&Echo::default()).unwrap().to_vec();
        frame.push(0);

        assert!(controller.decode(&frame).is_err());
        assert!(controller.decode(&[4]).is_err());
        // unregistered type followed by a stray byte
        assert!(controller
            .decode(&[Tag::Object.as_byte(), 0xEF, 0xBE, 0xAD, 0xDE, 0x00, 0x01])
            .is_err());

        let snapshot = controller.metrics().snapshot();
        assert_eq!(snapshot.decode_errors, 3);
        assert_eq!(snapshot.unknown_types_skipped, 1);
        assert_eq!(snapshot.messages_received, 0);
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let controller = controller();
        let mut frame = controller.encode(&Echo::default()).unwrap().to_vec();
        frame.push(0);

        let err = controller.process(&frame).unwrap_err();
        assert!(matches!(err, WireError::TrailingBytes(1)));
        assert_eq!(controller.metrics().snapshot().decode_errors, 1);
    }

    #[test]
    fn test_unknown_top_level_type_is_skipped() {
        let controller = controller();
        // hash 0xDEADBEEF, zero properties
        let frame = [Tag::Object.as_byte(), 0xEF, 0xBE, 0xAD, 0xDE, 0x00];

        assert!(controller.process(&frame).unwrap().is_none());
        assert_eq!(controller.metrics().snapshot().unknown_types_skipped, 1);
    }

    #[test]
    fn test_unregistered_binding_fails_readiness() {
        let registry = TypeRegistry::builder().register::<Echo>().build().unwrap();
        let mut dispatcher = Dispatcher::with_services(Arc::new(ServiceCollection::new()));
        dispatcher.register::<EchoHandler>().unwrap();
        let controller =
            MessageController::new(Arc::new(registry), dispatcher, CodecConfig::default());

        let err = controller.ensure_ready().unwrap_err();
        assert!(matches!(err, WireError::ConfigError(msg) if msg.contains("tests.Echoed")));
    }
}
