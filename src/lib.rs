//! # tagwire
//!
//! A compact tagged binary codec for message-based RPC. Objects travel as a
//! 32-bit hash of their type name followed by their present properties, each
//! keyed by a 16-bit hash of the property name. A [`TypeRegistry`] built at
//! startup maps hashes back to Rust types, and a [`Dispatcher`] routes every
//! decoded object to the one handler bound to its kind.
//!
//! ## Features
//! - Sparse objects: absent properties are not written
//! - Forward compatibility: unknown types and properties are skipped
//! - Bounded decoding: string, array and depth limits from [`config::CodecConfig`]
//! - Per-message handler construction through a [`ServiceProvider`]
//! - Length-delimited async sessions over any Tokio byte stream
//!
//! ## Quick Start
//! ```
//! use std::sync::Arc;
//! use tagwire::{wire_type, CodecConfig, Dispatcher, Handler, MessageController};
//! use tagwire::{ServiceCollection, ServiceProvider, TypeRegistry};
//!
//! #[derive(Debug, Clone, Default, PartialEq)]
//! struct Ping { seq: u32 }
//! wire_type!(Ping => "demo.Ping" { seq: u32 });
//!
//! #[derive(Debug, Clone, Default, PartialEq)]
//! struct Pong { seq: u32 }
//! wire_type!(Pong => "demo.Pong" { seq: u32 });
//!
//! struct PingHandler;
//!
//! impl Handler for PingHandler {
//!     type Request = Ping;
//!     type Response = Pong;
//!
//!     fn construct(_: &dyn ServiceProvider) -> tagwire::Result<Self> {
//!         Ok(PingHandler)
//!     }
//!
//!     fn process_request(&mut self, ping: Ping) -> tagwire::Result<Pong> {
//!         Ok(Pong { seq: ping.seq + 1 })
//!     }
//! }
//!
//! let registry = TypeRegistry::builder().register::<Ping>().register::<Pong>().build()?;
//! let mut dispatcher = Dispatcher::with_services(Arc::new(ServiceCollection::new()));
//! dispatcher.register::<PingHandler>()?;
//!
//! let controller = MessageController::new(Arc::new(registry), dispatcher, CodecConfig::default());
//! controller.ensure_ready()?;
//!
//! let frame = controller.encode(&Ping { seq: 1 })?;
//! let reply = controller.process(&frame)?.expect("requests are answered");
//! let pong = controller.decode(&reply)?.and_then(|v| v.into_object::<Pong>());
//! assert_eq!(pong, Some(Pong { seq: 2 }));
//! # Ok::<(), tagwire::WireError>(())
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod protocol;
pub mod service;
pub mod utils;

pub use crate::config::{CodecConfig, Config};
pub use crate::core::decoder::Decoder;
pub use crate::core::encoder::Encoder;
pub use crate::core::registry::TypeRegistry;
pub use crate::core::schema::{Object, WireField, WireType};
pub use crate::core::value::{Array, Tag, Value};
pub use crate::error::{Result, WireError};
pub use crate::protocol::dispatcher::Dispatcher;
pub use crate::protocol::handler::{Handler, ServiceCollection, ServiceProvider};
pub use crate::service::MessageController;
