//! # Type Registry
//!
//! Maps 32-bit type hashes to [`TypeDescriptor`]s and, per type, 16-bit
//! property hashes to [`PropertyAccessor`]s.
//!
//! The registry is built once at startup from an explicit list of types and
//! is read-only afterwards, so it can be shared across threads without
//! locking. Property tables are resolved lazily on first use and cached for
//! the registry's lifetime; [`TypeRegistry::resolve_all`] forces every table
//! up front as part of a readiness check.
//!
//! ```
//! use tagwire::core::registry::TypeRegistry;
//! use tagwire::wire_type;
//!
//! #[derive(Debug, Clone, Default, PartialEq)]
//! struct Ping { seq: u32 }
//! wire_type!(Ping => "demo.Ping" { seq: u32 });
//!
//! let registry = TypeRegistry::builder().register::<Ping>().build().unwrap();
//! let descriptor = registry.lookup_type(0xB61C_26C9).unwrap();
//! assert_eq!(descriptor.name(), "demo.Ping");
//! assert!(registry.lookup_type(0xDEAD_BEEF).is_none());
//! ```

use crate::core::hash::{hash_property, hash_type};
use crate::core::schema::{Object, WireType};
use crate::core::value::Tag;
use crate::error::{Result, WireError};
use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;
use tracing::{debug, info, instrument};

/// Resolved property of a registered type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyAccessor {
    name: &'static str,
    hash: u16,
    tag: Tag,
    index: usize,
}

impl PropertyAccessor {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn hash(&self) -> u16 {
        self.hash
    }

    /// Declared value kind.
    pub fn tag(&self) -> Tag {
        self.tag
    }

    /// Position in the type's accessor table.
    pub fn index(&self) -> usize {
        self.index
    }
}

/// Everything the decoder needs to rebuild one registered type.
pub struct TypeDescriptor {
    name: &'static str,
    hash: u32,
    type_id: TypeId,
    construct: fn() -> Box<dyn Object>,
    describe: fn() -> Vec<(&'static str, Tag)>,
    properties: OnceLock<HashMap<u16, PropertyAccessor>>,
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("name", &self.name)
            .field("hash", &format_args!("0x{:08x}", self.hash))
            .field("resolved", &self.properties.get().is_some())
            .finish()
    }
}

fn construct<T: WireType>() -> Box<dyn Object> {
    Box::new(T::default())
}

fn describe<T: WireType>() -> Vec<(&'static str, Tag)> {
    T::properties().iter().map(|p| (p.name, p.tag)).collect()
}

impl TypeDescriptor {
    /// Descriptor for `T`. Property hashes are not computed yet.
    pub fn of<T: WireType>() -> Self {
        Self {
            name: T::TYPE_NAME,
            hash: hash_type(T::TYPE_NAME),
            type_id: TypeId::of::<T>(),
            construct: construct::<T>,
            describe: describe::<T>,
            properties: OnceLock::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn hash(&self) -> u32 {
        self.hash
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Zero-initialized instance.
    pub fn construct(&self) -> Box<dyn Object> {
        (self.construct)()
    }

    /// Property table keyed by property hash, resolved on first call.
    ///
    /// # Errors
    /// `DuplicatePropertyHash` if two property names of this type collide.
    /// Nothing is cached in that case.
    pub fn properties(&self) -> Result<&HashMap<u16, PropertyAccessor>> {
        if let Some(table) = self.properties.get() {
            return Ok(table);
        }

        let mut table: HashMap<u16, PropertyAccessor> = HashMap::new();
        for (index, (name, tag)) in (self.describe)().into_iter().enumerate() {
            let hash = hash_property(name);
            if let Some(existing) = table.get(&hash) {
                return Err(WireError::DuplicatePropertyHash {
                    type_name: self.name,
                    hash,
                    existing: existing.name,
                    incoming: name,
                });
            }
            table.insert(
                hash,
                PropertyAccessor {
                    name,
                    hash,
                    tag,
                    index,
                },
            );
        }

        debug!(type_name = self.name, properties = table.len(), "Resolved property table");
        Ok(self.properties.get_or_init(|| table))
    }
}

/// Builder collecting the types to register.
#[derive(Default)]
pub struct TypeRegistryBuilder {
    descriptors: Vec<TypeDescriptor>,
}

impl TypeRegistryBuilder {
    pub fn register<T: WireType>(mut self) -> Self {
        self.descriptors.push(TypeDescriptor::of::<T>());
        self
    }

    pub fn build(self) -> Result<TypeRegistry> {
        TypeRegistry::register(self.descriptors)
    }
}

/// Read-only mapping from type hash to descriptor.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    types: HashMap<u32, TypeDescriptor>,
    by_type_id: HashMap<TypeId, u32>,
}

impl TypeRegistry {
    pub fn builder() -> TypeRegistryBuilder {
        TypeRegistryBuilder::default()
    }

    /// Build a registry from a set of descriptors.
    ///
    /// Registering the same Rust type twice is a no-op.
    ///
    /// # Errors
    /// `DuplicateTypeHash` if two distinct types share a type hash. No
    /// registry is produced in that case.
    #[instrument(skip(descriptors))]
    pub fn register<I>(descriptors: I) -> Result<Self>
    where
        I: IntoIterator<Item = TypeDescriptor>,
    {
        let mut registry = Self::default();

        for descriptor in descriptors {
            if registry.by_type_id.contains_key(&descriptor.type_id) {
                continue;
            }
            if let Some(existing) = registry.types.get(&descriptor.hash) {
                return Err(WireError::DuplicateTypeHash {
                    hash: descriptor.hash,
                    existing: existing.name,
                    incoming: descriptor.name,
                });
            }
            registry
                .by_type_id
                .insert(descriptor.type_id, descriptor.hash);
            registry.types.insert(descriptor.hash, descriptor);
        }

        info!(types = registry.types.len(), "Type registry built");
        Ok(registry)
    }

    /// Unknown hashes are normal (messages from newer peers) and yield `None`.
    pub fn lookup_type(&self, hash: u32) -> Option<&TypeDescriptor> {
        self.types.get(&hash)
    }

    /// Resolve a property of `descriptor` by hash. Unknown hashes yield `Ok(None)`.
    pub fn lookup_property<'d>(
        &self,
        descriptor: &'d TypeDescriptor,
        hash: u16,
    ) -> Result<Option<&'d PropertyAccessor>> {
        Ok(descriptor.properties()?.get(&hash))
    }

    /// Descriptor of a registered Rust type.
    pub fn descriptor_of<T: WireType>(&self) -> Option<&TypeDescriptor> {
        self.by_type_id
            .get(&TypeId::of::<T>())
            .and_then(|hash| self.types.get(hash))
    }

    pub fn contains<T: WireType>(&self) -> bool {
        self.contains_id(TypeId::of::<T>())
    }

    pub fn contains_id(&self, id: TypeId) -> bool {
        self.by_type_id.contains_key(&id)
    }

    /// Resolve every property table now, surfacing collisions at startup.
    pub fn resolve_all(&self) -> Result<()> {
        for descriptor in self.types.values() {
            descriptor.properties()?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TypeDescriptor> {
        self.types.values()
    }
}
