//! # Core Codec Components
//!
//! Wire values, name hashes, type schemas, the type registry and the
//! encoder/decoder pair.
//!
//! ## Wire Format
//! ```text
//! [Tag(1)] [Payload]
//! object:  [ClassHash(4)] [PropertyCount(1)] N x ([PropertyHash(2)] [Tag(1)] [Payload])
//! array:   [ElementTag(1)] [Count(4)] N x [Payload]
//! string:  [ByteLength(4)] [UTF-8]
//! ```
//!
//! All multi-byte fields are little-endian. Class hashes are CRC-32/ISO-HDLC
//! of the fully-qualified type name, property hashes CRC-16/CCITT-FALSE of
//! the property name.
//!
//! ## Security
//! - String and array lengths are bounded before allocation
//! - Nesting depth is bounded
//! - No integrity or authentication tag: this is not a security boundary

pub mod decoder;
pub mod encoder;
pub mod hash;
pub mod registry;
pub mod schema;
pub mod value;
