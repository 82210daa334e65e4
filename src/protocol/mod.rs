//! # Request/Response Routing
//!
//! Handler declarations, the construction collaborator and the dispatcher
//! that pairs each decoded object with exactly one handler.
//!
//! ## Flow
//! ```text
//! decoded object --> Dispatcher::dispatch --> request kind?  --> Handler::process_request --> response object
//!                                         \-> response kind? --> Handler::process_response --> none
//!                                         \-> neither        --> UnroutableMessage
//! ```

pub mod dispatcher;
pub mod handler;
