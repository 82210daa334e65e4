//! # Type Schemas
//!
//! Explicit per-type accessor tables standing in for runtime introspection.
//!
//! A type becomes encodable by implementing [`WireType`]: a fully-qualified
//! name (hashed into the wire identifier) and a static table of
//! [`Property`] accessors in declaration order. The [`wire_type!`] macro
//! writes that table for plain structs:
//!
//! ```
//! use tagwire::{wire_type, Value};
//!
//! #[derive(Debug, Clone, Default, PartialEq)]
//! pub struct Login {
//!     pub user: String,
//!     pub token: Option<String>,
//!     pub attempts: u8,
//! }
//!
//! wire_type!(Login => "auth.Login" {
//!     user: String,
//!     token: Option<String>,
//!     attempts: u8,
//! });
//!
//! let login = Login { user: "ana".into(), token: None, attempts: 2 };
//! let value = Value::object(login.clone());
//! assert_eq!(value.as_object::<Login>(), Some(&login));
//! ```
//!
//! Field types map onto wire kinds through [`WireField`]: primitives,
//! `String`, `Vec` of primitives, `Option<T>` (None is encoded as an absent
//! property), `Box<T>` for nested registered objects, and enums declared with
//! [`wire_enum!`].

use crate::core::value::{Array, Tag, Value};
use std::any::Any;
use std::fmt;

/// One entry of a type's accessor table.
pub struct Property<T: 'static> {
    pub name: &'static str,
    /// Declared kind; values of any other kind are rejected on assignment.
    pub tag: Tag,
    /// Read the property. `None` means absent, and the property is left off the wire.
    pub get: fn(&T) -> Option<Value>,
    /// Write the property. Returns `false` if the value cannot be converted.
    pub set: fn(&mut T, Value) -> bool,
}

impl<T> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("name", &self.name)
            .field("tag", &self.tag)
            .finish()
    }
}

/// A registered, encodable plain object.
///
/// `Default` provides the zero-initialized instance the decoder fills in.
pub trait WireType: Default + Clone + PartialEq + fmt::Debug + Send + Sync + 'static {
    /// Fully-qualified name; its CRC-32 is the type's wire identifier.
    const TYPE_NAME: &'static str;

    /// Accessor table in stable enumeration order.
    fn properties() -> &'static [Property<Self>];
}

/// Conversion between a Rust field type and a wire value.
pub trait WireField: Sized {
    const TAG: Tag;

    fn to_wire(&self) -> Option<Value>;

    fn from_wire(value: Value) -> Option<Self>;
}

/// Field types allowed as array elements (fixed-width primitives).
pub trait WireElement: WireField {}

macro_rules! primitive_field {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl WireField for $ty {
                const TAG: Tag = Tag::$variant;

                #[inline]
                fn to_wire(&self) -> Option<Value> {
                    Some(Value::$variant(*self))
                }

                #[inline]
                fn from_wire(value: Value) -> Option<Self> {
                    match value {
                        Value::$variant(v) => Some(v),
                        _ => None,
                    }
                }
            }

            impl WireElement for $ty {}
        )*
    };
}

primitive_field! {
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
}

impl WireField for String {
    const TAG: Tag = Tag::String;

    fn to_wire(&self) -> Option<Value> {
        Some(Value::String(self.clone()))
    }

    fn from_wire(value: Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

impl<T: WireElement> WireField for Vec<T> {
    const TAG: Tag = Tag::Array;

    fn to_wire(&self) -> Option<Value> {
        let items = self.iter().filter_map(WireField::to_wire).collect();
        Some(Value::Array(Array::from_parts(T::TAG, items)))
    }

    fn from_wire(value: Value) -> Option<Self> {
        match value {
            Value::Array(array) if array.element() == T::TAG => {
                array.into_items().into_iter().map(T::from_wire).collect()
            }
            _ => None,
        }
    }
}

impl<T: WireField> WireField for Option<T> {
    const TAG: Tag = T::TAG;

    fn to_wire(&self) -> Option<Value> {
        self.as_ref().and_then(WireField::to_wire)
    }

    fn from_wire(value: Value) -> Option<Self> {
        T::from_wire(value).map(Some)
    }
}

impl<T: WireType> WireField for Box<T> {
    const TAG: Tag = Tag::Object;

    fn to_wire(&self) -> Option<Value> {
        Some(Value::Object(Box::new(T::clone(self))))
    }

    fn from_wire(value: Value) -> Option<Self> {
        match value {
            Value::Object(obj) => obj.downcast::<T>(),
            _ => None,
        }
    }
}

/// Object-safe view of a registered object, used by the codec and the
/// dispatcher once the concrete type has been erased.
pub trait Object: Any + Send + Sync + fmt::Debug {
    fn type_name(&self) -> &'static str;

    /// Non-absent properties, in enumeration order.
    fn present_properties(&self) -> Vec<(&'static str, Value)>;

    /// Assign the property at `index` of the accessor table.
    fn set_property(&mut self, index: usize, value: Value) -> bool;

    fn clone_object(&self) -> Box<dyn Object>;

    fn eq_object(&self, other: &dyn Object) -> bool;

    fn as_any(&self) -> &dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl<T: WireType> Object for T {
    fn type_name(&self) -> &'static str {
        T::TYPE_NAME
    }

    fn present_properties(&self) -> Vec<(&'static str, Value)> {
        T::properties()
            .iter()
            .filter_map(|p| (p.get)(self).map(|value| (p.name, value)))
            .collect()
    }

    fn set_property(&mut self, index: usize, value: Value) -> bool {
        match T::properties().get(index) {
            Some(property) => (property.set)(self, value),
            None => false,
        }
    }

    fn clone_object(&self) -> Box<dyn Object> {
        Box::new(self.clone())
    }

    fn eq_object(&self, other: &dyn Object) -> bool {
        other.as_any().downcast_ref::<T>() == Some(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

impl dyn Object {
    pub fn is<T: Object>(&self) -> bool {
        self.as_any().is::<T>()
    }

    pub fn downcast_ref<T: Object>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn downcast<T: Object>(self: Box<Self>) -> Option<Box<T>> {
        self.into_any().downcast::<T>().ok()
    }
}

impl Clone for Box<dyn Object> {
    fn clone(&self) -> Self {
        self.clone_object()
    }
}

impl PartialEq for dyn Object {
    fn eq(&self, other: &Self) -> bool {
        self.eq_object(other)
    }
}

/// Property name for a Rust field identifier, without any `r#` prefix.
pub const fn field_wire_name(ident: &'static str) -> &'static str {
    match ident.as_bytes() {
        [b'r', b'#', rest @ ..] => match std::str::from_utf8(rest) {
            Ok(name) => name,
            Err(_) => ident,
        },
        _ => ident,
    }
}

#[doc(hidden)]
#[macro_export]
macro_rules! __wire_property_name {
    ($field:ident) => {
        $crate::core::schema::field_wire_name(stringify!($field))
    };
    ($field:ident, $wire:literal) => {
        $wire
    };
}

/// Implement [`WireType`] for a struct by listing its fully-qualified name
/// and its properties with their types.
///
/// A property is named after its field (raw identifiers lose the `r#`)
/// unless a wire name is given with `field as "Name": Type`.
///
/// ```
/// use tagwire::{wire_type, WireType};
///
/// #[derive(Debug, Clone, Default, PartialEq)]
/// struct Asset {
///     r#type: u8,
///     display_name: String,
/// }
/// wire_type!(Asset => "app.Asset" { r#type: u8, display_name as "DisplayName": String });
///
/// let names: Vec<_> = Asset::properties().iter().map(|p| p.name).collect();
/// assert_eq!(names, ["type", "DisplayName"]);
/// ```
#[macro_export]
macro_rules! wire_type {
    ($ty:ty => $name:literal { $($field:ident $(as $wire:literal)? : $fty:ty),* $(,)? }) => {
        impl $crate::core::schema::WireType for $ty {
            const TYPE_NAME: &'static str = $name;

            fn properties() -> &'static [$crate::core::schema::Property<Self>] {
                const PROPERTIES: &[$crate::core::schema::Property<$ty>] = &[$(
                    $crate::core::schema::Property {
                        name: $crate::__wire_property_name!($field $(, $wire)?),
                        tag: <$fty as $crate::core::schema::WireField>::TAG,
                        get: |this: &$ty| $crate::core::schema::WireField::to_wire(&this.$field),
                        set: |this: &mut $ty, value: $crate::core::value::Value| {
                            match <$fty as $crate::core::schema::WireField>::from_wire(value) {
                                Some(v) => {
                                    this.$field = v;
                                    true
                                }
                                None => false,
                            }
                        },
                    },
                )*];
                PROPERTIES
            }
        }
    };
}

/// Implement [`WireField`] for a fieldless enum with explicit discriminants.
/// Unlisted discriminants are rejected on decode.
#[macro_export]
macro_rules! wire_enum {
    ($ty:ident { $($variant:ident = $value:literal),+ $(,)? }) => {
        impl $crate::core::schema::WireField for $ty {
            const TAG: $crate::core::value::Tag = $crate::core::value::Tag::Enum;

            fn to_wire(&self) -> Option<$crate::core::value::Value> {
                Some($crate::core::value::Value::Enum(match self {
                    $($ty::$variant => $value,)+
                }))
            }

            fn from_wire(value: $crate::core::value::Value) -> Option<Self> {
                match value {
                    $crate::core::value::Value::Enum(raw) => match raw {
                        $($value => Some($ty::$variant),)+
                        _ => None,
                    },
                    _ => None,
                }
            }
        }
    };
}
