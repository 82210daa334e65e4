//! # Message Services
//!
//! The controller façade that runs one frame through decode, dispatch and
//! encode, and the async session loop that feeds it from a byte stream.
//!
//! ## Components
//! - **Controller**: Readiness check, per-frame pipeline, metrics
//! - **Session**: Length-delimited framing over any `AsyncRead + AsyncWrite`

pub mod controller;
pub mod session;

pub use controller::MessageController;
pub use session::{serve, Connection};
