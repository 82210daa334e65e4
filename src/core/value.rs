//! # Wire Values
//!
//! [`Value`] is the unit the codec reads and writes: a tagged union over the
//! primitive kinds, strings, enums, homogeneous primitive arrays and
//! registered objects. [`Tag`] is the one-byte kind marker that precedes every
//! value on the wire (except in header mode).

use crate::core::schema::{Object, WireType};
use crate::error::{Result, WireError};

/// One-byte kind marker.
///
/// Byte values 4 (decimal), 17 (list) and 18 (dictionary) are reserved and
/// rejected by the decoder.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    Bool = 0,
    U8 = 1,
    I8 = 2,
    Char = 3,
    F64 = 5,
    F32 = 6,
    I32 = 7,
    U32 = 8,
    I64 = 9,
    U64 = 10,
    I16 = 11,
    U16 = 12,
    String = 13,
    Object = 14,
    Array = 15,
    Enum = 16,
}

impl Tag {
    /// Decode a tag byte. Reserved and unknown bytes yield `None`.
    pub fn from_byte(byte: u8) -> Option<Self> {
        Some(match byte {
            0 => Tag::Bool,
            1 => Tag::U8,
            2 => Tag::I8,
            3 => Tag::Char,
            5 => Tag::F64,
            6 => Tag::F32,
            7 => Tag::I32,
            8 => Tag::U32,
            9 => Tag::I64,
            10 => Tag::U64,
            11 => Tag::I16,
            12 => Tag::U16,
            13 => Tag::String,
            14 => Tag::Object,
            15 => Tag::Array,
            16 => Tag::Enum,
            _ => return None,
        })
    }

    #[inline]
    pub fn as_byte(self) -> u8 {
        self as u8
    }

    /// Payload width for fixed-width kinds.
    pub fn fixed_width(self) -> Option<usize> {
        match self {
            Tag::Bool | Tag::U8 | Tag::I8 => Some(1),
            Tag::I16 | Tag::U16 => Some(2),
            Tag::Char | Tag::F32 | Tag::I32 | Tag::U32 | Tag::Enum => Some(4),
            Tag::F64 | Tag::I64 | Tag::U64 => Some(8),
            Tag::String | Tag::Object | Tag::Array => None,
        }
    }

    /// Whether arrays may carry elements of this kind.
    pub fn is_array_element(self) -> bool {
        !matches!(self, Tag::Enum) && self.fixed_width().is_some()
    }
}

/// Homogeneous sequence of primitive values.
#[derive(Debug, Clone, PartialEq)]
pub struct Array {
    element: Tag,
    items: Vec<Value>,
}

impl Array {
    /// Build an array, checking that the element kind is supported and that
    /// every item has that kind.
    pub fn new(element: Tag, items: Vec<Value>) -> Result<Self> {
        if !element.is_array_element() {
            return Err(WireError::UnsupportedArrayElement(element));
        }
        if let Some(odd) = items.iter().find(|item| item.tag() != element) {
            return Err(WireError::UnsupportedArrayElement(odd.tag()));
        }
        Ok(Self { element, items })
    }

    pub(crate) fn from_parts(element: Tag, items: Vec<Value>) -> Self {
        Self { element, items }
    }

    pub fn element(&self) -> Tag {
        self.element
    }

    pub fn items(&self) -> &[Value] {
        &self.items
    }

    pub fn into_items(self) -> Vec<Value> {
        self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// A decoded or to-be-encoded wire value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    U8(u8),
    I8(i8),
    Char(char),
    F64(f64),
    F32(f32),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    I16(i16),
    U16(u16),
    String(String),
    /// Enumerated value, carried as its underlying 32-bit integer.
    Enum(i32),
    Array(Array),
    Object(Box<dyn Object>),
}

impl Value {
    pub fn tag(&self) -> Tag {
        match self {
            Value::Bool(_) => Tag::Bool,
            Value::U8(_) => Tag::U8,
            Value::I8(_) => Tag::I8,
            Value::Char(_) => Tag::Char,
            Value::F64(_) => Tag::F64,
            Value::F32(_) => Tag::F32,
            Value::I32(_) => Tag::I32,
            Value::U32(_) => Tag::U32,
            Value::I64(_) => Tag::I64,
            Value::U64(_) => Tag::U64,
            Value::I16(_) => Tag::I16,
            Value::U16(_) => Tag::U16,
            Value::String(_) => Tag::String,
            Value::Enum(_) => Tag::Enum,
            Value::Array(_) => Tag::Array,
            Value::Object(_) => Tag::Object,
        }
    }

    /// Wrap a registered object.
    pub fn object<T: WireType>(value: T) -> Self {
        Value::Object(Box::new(value))
    }

    /// Borrow the inner object if it is a `T`.
    pub fn as_object<T: WireType>(&self) -> Option<&T> {
        match self {
            Value::Object(obj) => obj.downcast_ref::<T>(),
            _ => None,
        }
    }

    /// Take the inner object if it is a `T`.
    pub fn into_object<T: WireType>(self) -> Option<T> {
        match self {
            Value::Object(obj) => obj.downcast::<T>().map(|boxed| *boxed),
            _ => None,
        }
    }

    /// Human-readable kind, used when reporting routing failures.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Object(obj) => obj.type_name(),
            Value::Bool(_) => "bool",
            Value::U8(_) => "u8",
            Value::I8(_) => "i8",
            Value::Char(_) => "char",
            Value::F64(_) => "f64",
            Value::F32(_) => "f32",
            Value::I32(_) => "i32",
            Value::U32(_) => "u32",
            Value::I64(_) => "i64",
            Value::U64(_) => "u64",
            Value::I16(_) => "i16",
            Value::U16(_) => "u16",
            Value::String(_) => "string",
            Value::Enum(_) => "enum",
            Value::Array(_) => "array",
        }
    }
}

macro_rules! value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

value_from! {
    bool => Bool,
    u8 => U8,
    i8 => I8,
    char => Char,
    f64 => F64,
    f32 => F32,
    i32 => I32,
    u32 => U32,
    i64 => I64,
    u64 => U64,
    i16 => I16,
    u16 => U16,
    String => String,
    Array => Array,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_owned())
    }
}
