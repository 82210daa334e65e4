//! # Decoder
//!
//! Reads tagged values back, resolving objects through a [`TypeRegistry`].
//!
//! Unknown type hashes and unknown property hashes are skipped, never
//! rejected: the decoder still reads every nested value so the cursor stays
//! aligned for whatever follows. An unknown object decodes to `None`.
//!
//! Length and count fields are checked against the [`CodecConfig`] limits and
//! against the bytes actually remaining before anything is allocated.

use crate::config::CodecConfig;
use crate::core::registry::TypeRegistry;
use crate::core::schema::WireType;
use crate::core::value::{Array, Tag, Value};
use crate::error::{Result, WireError};
use bytes::Buf;
use tracing::{debug, trace};

/// Decoder bound to one registry. Keeps counters of what it skipped.
#[derive(Debug)]
pub struct Decoder<'r> {
    registry: &'r TypeRegistry,
    config: CodecConfig,
    skipped_types: usize,
    skipped_properties: usize,
}

impl<'r> Decoder<'r> {
    pub fn new(registry: &'r TypeRegistry, config: CodecConfig) -> Self {
        Self {
            registry,
            config,
            skipped_types: 0,
            skipped_properties: 0,
        }
    }

    /// Decode one tagged value, advancing `src` past it.
    ///
    /// Returns `Ok(None)` when the value is an object of an unregistered type.
    pub fn decode<B: Buf>(&mut self, src: &mut B) -> Result<Option<Value>> {
        self.read_tagged(src, 0)
    }

    /// Decode one value and take it as a `T`.
    ///
    /// Unknown types and values of another kind both yield `Ok(None)`.
    pub fn decode_object<T: WireType, B: Buf>(&mut self, src: &mut B) -> Result<Option<T>> {
        Ok(self.decode(src)?.and_then(Value::into_object::<T>))
    }

    /// Objects of unregistered types skipped so far.
    pub fn skipped_types(&self) -> usize {
        self.skipped_types
    }

    /// Properties with unknown hashes skipped so far.
    pub fn skipped_properties(&self) -> usize {
        self.skipped_properties
    }

    fn read_tagged<B: Buf>(&mut self, src: &mut B, depth: usize) -> Result<Option<Value>> {
        let tag = read_tag(src)?;
        self.read_body(src, tag, depth)
    }

    fn read_body<B: Buf>(&mut self, src: &mut B, tag: Tag, depth: usize) -> Result<Option<Value>> {
        match tag {
            Tag::String => self.read_string(src).map(Some),
            Tag::Array => self.read_array(src, depth).map(Some),
            Tag::Object => self.read_object(src, depth),
            _ => read_fixed(src, tag).map(Some),
        }
    }

    fn read_string<B: Buf>(&self, src: &mut B) -> Result<Value> {
        ensure(src, 4)?;
        let len = src.get_u32_le() as usize;
        if len > self.config.max_string_bytes {
            return Err(WireError::SizeLimitExceeded {
                what: "string length",
                size: len,
                max: self.config.max_string_bytes,
            });
        }
        ensure(src, len)?;

        let mut bytes = vec![0u8; len];
        src.copy_to_slice(&mut bytes);
        String::from_utf8(bytes)
            .map(Value::String)
            .map_err(|_| WireError::InvalidUtf8)
    }

    fn read_array<B: Buf>(&self, src: &mut B, depth: usize) -> Result<Value> {
        self.enter(depth)?;

        let element = read_tag(src)?;
        let width = match element.fixed_width() {
            Some(width) if element.is_array_element() => width,
            _ => return Err(WireError::UnsupportedArrayElement(element)),
        };

        ensure(src, 4)?;
        let count = src.get_u32_le() as usize;
        if count > self.config.max_array_len {
            return Err(WireError::SizeLimitExceeded {
                what: "array length",
                size: count,
                max: self.config.max_array_len,
            });
        }
        ensure(src, count.saturating_mul(width))?;

        let mut items = Vec::with_capacity(count);
        for _ in 0..count {
            items.push(read_fixed(src, element)?);
        }
        Ok(Value::Array(Array::from_parts(element, items)))
    }

    fn read_object<B: Buf>(&mut self, src: &mut B, depth: usize) -> Result<Option<Value>> {
        self.enter(depth)?;

        ensure(src, 5)?;
        let class_hash = src.get_u32_le();
        let count = src.get_u8();

        let registry = self.registry;
        let Some(descriptor) = registry.lookup_type(class_hash) else {
            debug!(
                class_hash = format_args!("0x{class_hash:08x}"),
                properties = count,
                "Skipping object of unknown type"
            );
            for _ in 0..count {
                ensure(src, 2)?;
                src.get_u16_le();
                self.read_tagged(src, depth + 1)?;
            }
            self.skipped_types += 1;
            return Ok(None);
        };

        let table = descriptor.properties()?;
        let mut object = descriptor.construct();

        for _ in 0..count {
            ensure(src, 2)?;
            let property_hash = src.get_u16_le();
            let value = self.read_tagged(src, depth + 1)?;

            let Some(accessor) = table.get(&property_hash) else {
                trace!(
                    type_name = descriptor.name(),
                    property_hash = format_args!("0x{property_hash:04x}"),
                    "Skipping unknown property"
                );
                self.skipped_properties += 1;
                continue;
            };

            // An unknown nested object leaves the property at its default.
            let Some(value) = value else {
                continue;
            };

            let found = value.tag();
            if found != accessor.tag() || !object.set_property(accessor.index(), value) {
                return Err(WireError::PropertyKindMismatch {
                    type_name: descriptor.name(),
                    property: accessor.name(),
                    expected: accessor.tag(),
                    found,
                });
            }
        }

        Ok(Some(Value::Object(object)))
    }

    fn enter(&self, depth: usize) -> Result<()> {
        if depth >= self.config.max_depth {
            return Err(WireError::DepthLimitExceeded(self.config.max_depth));
        }
        Ok(())
    }
}

#[inline]
fn ensure<B: Buf>(src: &B, needed: usize) -> Result<()> {
    let remaining = src.remaining();
    if remaining < needed {
        return Err(WireError::UnexpectedEndOfStream { needed, remaining });
    }
    Ok(())
}

fn read_tag<B: Buf>(src: &mut B) -> Result<Tag> {
    ensure(src, 1)?;
    let byte = src.get_u8();
    Tag::from_byte(byte).ok_or(WireError::InvalidTag(byte))
}

/// Fixed-width payload of `tag` (primitives and enums).
fn read_fixed<B: Buf>(src: &mut B, tag: Tag) -> Result<Value> {
    let width = tag.fixed_width().ok_or(WireError::InvalidTag(tag.as_byte()))?;
    ensure(src, width)?;

    Ok(match tag {
        Tag::Bool => match src.get_u8() {
            0 => Value::Bool(false),
            1 => Value::Bool(true),
            other => return Err(WireError::InvalidBool(other)),
        },
        Tag::U8 => Value::U8(src.get_u8()),
        Tag::I8 => Value::I8(src.get_i8()),
        Tag::Char => {
            let raw = src.get_u32_le();
            Value::Char(char::from_u32(raw).ok_or(WireError::InvalidChar(raw))?)
        }
        Tag::F64 => Value::F64(src.get_f64_le()),
        Tag::F32 => Value::F32(src.get_f32_le()),
        Tag::I32 => Value::I32(src.get_i32_le()),
        Tag::U32 => Value::U32(src.get_u32_le()),
        Tag::I64 => Value::I64(src.get_i64_le()),
        Tag::U64 => Value::U64(src.get_u64_le()),
        Tag::I16 => Value::I16(src.get_i16_le()),
        Tag::U16 => Value::U16(src.get_u16_le()),
        Tag::Enum => Value::Enum(src.get_i32_le()),
        Tag::String | Tag::Object | Tag::Array => return Err(WireError::InvalidTag(tag.as_byte())),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(bytes: &[u8]) -> Result<Option<Value>> {
        let registry = TypeRegistry::default();
        let mut src = bytes;
        Decoder::new(&registry, CodecConfig::default()).decode(&mut src)
    }

    #[test]
    fn test_primitives() {
        assert_eq!(decode(&[0, 1]).unwrap(), Some(Value::Bool(true)));
        assert_eq!(decode(&[7, 0xFE, 0xFF, 0xFF, 0xFF]).unwrap(), Some(Value::I32(-2)));
        assert_eq!(decode(&[3, 0x41, 0, 0, 0]).unwrap(), Some(Value::Char('A')));
        assert_eq!(decode(&[16, 9, 0, 0, 0]).unwrap(), Some(Value::Enum(9)));
    }

    #[test]
    fn test_truncated_fixed_width() {
        let err = decode(&[9, 1, 2, 3]).unwrap_err();
        assert!(matches!(
            err,
            WireError::UnexpectedEndOfStream {
                needed: 8,
                remaining: 3
            }
        ));
    }

    #[test]
    fn test_empty_stream() {
        assert!(matches!(
            decode(&[]).unwrap_err(),
            WireError::UnexpectedEndOfStream { .. }
        ));
    }

    #[test]
    fn test_reserved_tag() {
        assert!(matches!(decode(&[4]).unwrap_err(), WireError::InvalidTag(4)));
        assert!(matches!(decode(&[17]).unwrap_err(), WireError::InvalidTag(17)));
    }

    #[test]
    fn test_invalid_bool_and_char() {
        assert!(matches!(decode(&[0, 2]).unwrap_err(), WireError::InvalidBool(2)));
        let surrogate = 0xD800u32.to_le_bytes();
        let mut bytes = vec![3];
        bytes.extend_from_slice(&surrogate);
        assert!(matches!(
            decode(&bytes).unwrap_err(),
            WireError::InvalidChar(0xD800)
        ));
    }

    #[test]
    fn test_invalid_utf8() {
        assert!(matches!(
            decode(&[13, 1, 0, 0, 0, 0xFF]).unwrap_err(),
            WireError::InvalidUtf8
        ));
    }

    #[test]
    fn test_string_length_limit_checked_before_allocation() {
        let err = decode(&[13, 0xFF, 0xFF, 0xFF, 0xFF]).unwrap_err();
        assert!(matches!(
            err,
            WireError::SizeLimitExceeded {
                what: "string length",
                ..
            }
        ));
    }

    #[test]
    fn test_array_count_checked_against_remaining() {
        // claims 1000 u64 elements with none present
        let err = decode(&[15, 10, 0xE8, 0x03, 0, 0]).unwrap_err();
        assert!(matches!(
            err,
            WireError::UnexpectedEndOfStream { needed: 8000, .. }
        ));
    }

    #[test]
    fn test_array_of_strings_rejected() {
        let err = decode(&[15, 13, 0, 0, 0, 0]).unwrap_err();
        assert!(matches!(err, WireError::UnsupportedArrayElement(Tag::String)));
    }

    #[test]
    fn test_unknown_object_skipped() {
        // unknown class, one property holding an i32, then a trailing u8 value
        let bytes = [14, 1, 2, 3, 4, 1, 0x10, 0x20, 7, 5, 0, 0, 0, 1, 42];
        let registry = TypeRegistry::default();
        let mut src = &bytes[..];
        let mut decoder = Decoder::new(&registry, CodecConfig::default());
        assert_eq!(decoder.decode(&mut src).unwrap(), None);
        assert_eq!(decoder.skipped_types(), 1);
        assert_eq!(decoder.decode(&mut src).unwrap(), Some(Value::U8(42)));
        assert!(src.is_empty());
    }

    #[test]
    fn test_depth_limit() {
        // nested unknown objects, each with one property holding the next
        let mut bytes = Vec::new();
        for _ in 0..4 {
            bytes.extend_from_slice(&[14, 1, 2, 3, 4, 1, 0, 0]);
        }
        bytes.extend_from_slice(&[14, 1, 2, 3, 4, 0]);

        let registry = TypeRegistry::default();
        let config = CodecConfig {
            max_depth: 3,
            ..CodecConfig::default()
        };
        let mut src = &bytes[..];
        let err = Decoder::new(&registry, config).decode(&mut src).unwrap_err();
        assert!(matches!(err, WireError::DepthLimitExceeded(3)));
    }
}
