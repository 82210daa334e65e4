//! # Handlers and Construction
//!
//! A [`Handler`] declares the request and response kinds it serves as
//! associated types; the dispatcher binds it under both.
//!
//! Handlers are built per message through the construction collaborator, a
//! [`ServiceProvider`]. The provider hands out shared dependencies by type;
//! what a handler does with them is up to its `construct` function.
//!
//! ```
//! use std::sync::Arc;
//! use tagwire::protocol::handler::{ServiceCollection, ServiceProvider};
//!
//! struct Clock(u64);
//!
//! let services = ServiceCollection::new().with(Clock(7));
//! let provider: &dyn ServiceProvider = &services;
//! let clock: Arc<Clock> = provider.resolve::<Clock>().unwrap();
//! assert_eq!(clock.0, 7);
//! ```

use crate::core::schema::WireType;
use crate::error::{Result, WireError};
use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Processes one request kind and its paired response kind.
pub trait Handler: Send + Sized + 'static {
    type Request: WireType;
    type Response: WireType;

    /// Build a handler instance for one message.
    fn construct(services: &dyn ServiceProvider) -> Result<Self>;

    fn process_request(&mut self, request: Self::Request) -> Result<Self::Response>;

    /// Called when a peer's response of this kind arrives. Ignored by default.
    fn process_response(&mut self, response: Self::Response) -> Result<()> {
        let _ = response;
        Ok(())
    }
}

/// Construction collaborator: supplies shared services by type.
pub trait ServiceProvider: Send + Sync {
    fn get_service(&self, id: TypeId) -> Option<Arc<dyn Any + Send + Sync>>;
}

impl<'a> dyn ServiceProvider + 'a {
    /// Typed lookup.
    ///
    /// # Errors
    /// `ServiceMissing` if no service of type `T` is registered.
    pub fn resolve<T: Any + Send + Sync>(&self) -> Result<Arc<T>> {
        self.get_service(TypeId::of::<T>())
            .and_then(|service| service.downcast::<T>().ok())
            .ok_or(WireError::ServiceMissing(type_name::<T>()))
    }
}

/// Map-backed [`ServiceProvider`].
#[derive(Default, Clone)]
pub struct ServiceCollection {
    services: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl fmt::Debug for ServiceCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceCollection")
            .field("services", &self.services.len())
            .finish()
    }
}

impl ServiceCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `service`, replacing any previous service of the same type.
    pub fn insert<T: Any + Send + Sync>(&mut self, service: T) -> &mut Self {
        self.insert_shared(Arc::new(service))
    }

    pub fn insert_shared<T: Any + Send + Sync>(&mut self, service: Arc<T>) -> &mut Self {
        self.services.insert(TypeId::of::<T>(), service);
        self
    }

    pub fn with<T: Any + Send + Sync>(mut self, service: T) -> Self {
        self.insert(service);
        self
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

impl ServiceProvider for ServiceCollection {
    fn get_service(&self, id: TypeId) -> Option<Arc<dyn Any + Send + Sync>> {
        self.services.get(&id).cloned()
    }
}
