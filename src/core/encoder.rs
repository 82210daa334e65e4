//! # Encoder
//!
//! Writes [`Value`]s in the tagged wire format. All multi-byte fields are
//! little-endian.
//!
//! ```text
//! value   := [tag(1)] payload
//! string  := [byte_len(4)] [utf8 bytes]
//! array   := [element_tag(1)] [count(4)] count * header-mode element
//! object  := [class_hash(4)] [property_count(1)] count * ([property_hash(2)] value)
//! ```
//!
//! Absent properties are left out of an object entirely, so `property_count`
//! only counts the ones written.

use crate::config::CodecConfig;
use crate::core::hash::{hash_property, hash_type};
use crate::core::schema::{Object, WireType};
use crate::core::value::{Array, Tag, Value};
use crate::error::{Result, WireError};
use bytes::{BufMut, Bytes, BytesMut};

/// Whether a value is preceded by its tag byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Tagged,
    /// Tag omitted; the reader knows the kind from position.
    Header,
}

/// Stateless encoder bounded by a [`CodecConfig`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Encoder {
    config: CodecConfig,
}

impl Encoder {
    pub fn new(config: CodecConfig) -> Self {
        Self { config }
    }

    /// Append `value` to `dst` in tagged mode.
    ///
    /// On error `dst` is restored to its previous length.
    pub fn encode(&self, value: &Value, dst: &mut BytesMut) -> Result<()> {
        let start = dst.len();
        let result = self.write_value(dst, value, Mode::Tagged, 0);
        if result.is_err() {
            dst.truncate(start);
        }
        result
    }

    /// Encode a registered object as a top-level value.
    pub fn encode_object<T: WireType>(&self, object: &T, dst: &mut BytesMut) -> Result<()> {
        let start = dst.len();
        dst.put_u8(Tag::Object.as_byte());
        let result = self.write_object(dst, object, 0);
        if result.is_err() {
            dst.truncate(start);
        }
        result
    }

    /// Encode `value` into a fresh buffer.
    pub fn to_bytes(&self, value: &Value) -> Result<Bytes> {
        let mut dst = BytesMut::with_capacity(64);
        self.encode(value, &mut dst)?;
        Ok(dst.freeze())
    }

    fn write_value(&self, dst: &mut BytesMut, value: &Value, mode: Mode, depth: usize) -> Result<()> {
        if mode == Mode::Tagged {
            dst.put_u8(value.tag().as_byte());
        }

        match value {
            Value::Bool(v) => dst.put_u8(u8::from(*v)),
            Value::U8(v) => dst.put_u8(*v),
            Value::I8(v) => dst.put_i8(*v),
            Value::Char(v) => dst.put_u32_le(u32::from(*v)),
            Value::F64(v) => dst.put_f64_le(*v),
            Value::F32(v) => dst.put_f32_le(*v),
            Value::I32(v) | Value::Enum(v) => dst.put_i32_le(*v),
            Value::U32(v) => dst.put_u32_le(*v),
            Value::I64(v) => dst.put_i64_le(*v),
            Value::U64(v) => dst.put_u64_le(*v),
            Value::I16(v) => dst.put_i16_le(*v),
            Value::U16(v) => dst.put_u16_le(*v),
            Value::String(s) => self.write_string(dst, s)?,
            Value::Array(array) => self.write_array(dst, array, depth)?,
            Value::Object(object) => self.write_object(dst, object.as_ref(), depth)?,
        }
        Ok(())
    }

    fn write_string(&self, dst: &mut BytesMut, s: &str) -> Result<()> {
        let len = s.len();
        if len > self.config.max_string_bytes {
            return Err(WireError::EncodingLimitExceeded(format!(
                "string of {len} bytes exceeds the maximum of {}",
                self.config.max_string_bytes
            )));
        }
        dst.put_u32_le(length_prefix(len, "string")?);
        dst.put_slice(s.as_bytes());
        Ok(())
    }

    fn write_array(&self, dst: &mut BytesMut, array: &Array, depth: usize) -> Result<()> {
        let element = array.element();
        if !element.is_array_element() {
            return Err(WireError::UnsupportedArrayElement(element));
        }
        self.enter(depth)?;

        let len = array.len();
        if len > self.config.max_array_len {
            return Err(WireError::EncodingLimitExceeded(format!(
                "array of {len} elements exceeds the maximum of {}",
                self.config.max_array_len
            )));
        }

        let prefix = length_prefix(len, "array")?;
        dst.put_u8(element.as_byte());
        dst.put_u32_le(prefix);
        for item in array.items() {
            if item.tag() != element {
                return Err(WireError::UnsupportedArrayElement(item.tag()));
            }
            self.write_value(dst, item, Mode::Header, depth + 1)?;
        }
        Ok(())
    }

    fn write_object(&self, dst: &mut BytesMut, object: &dyn Object, depth: usize) -> Result<()> {
        self.enter(depth)?;

        let properties = object.present_properties();
        let count = u8::try_from(properties.len()).map_err(|_| {
            WireError::EncodingLimitExceeded(format!(
                "'{}' has {} present properties (maximum: 255)",
                object.type_name(),
                properties.len()
            ))
        })?;

        dst.put_u32_le(hash_type(object.type_name()));
        dst.put_u8(count);
        for (name, value) in &properties {
            dst.put_u16_le(hash_property(name));
            self.write_value(dst, value, Mode::Tagged, depth + 1)?;
        }
        Ok(())
    }

    fn enter(&self, depth: usize) -> Result<()> {
        if depth >= self.config.max_depth {
            return Err(WireError::EncodingLimitExceeded(format!(
                "nesting deeper than {} levels",
                self.config.max_depth
            )));
        }
        Ok(())
    }
}

/// Length prefixes are `u32` on the wire regardless of the configured limits.
fn length_prefix(len: usize, what: &str) -> Result<u32> {
    u32::try_from(len).map_err(|_| {
        WireError::EncodingLimitExceeded(format!(
            "{what} of length {len} does not fit a 32-bit length prefix"
        ))
    })
}
