use crate::core::schema::{Object, WireType};
use crate::core::value::Value;
use crate::error::{Result, WireError};
use crate::protocol::handler::{Handler, ServiceProvider};
use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

type RequestFn = fn(&dyn ServiceProvider, Box<dyn Object>) -> Result<Value>;
type ResponseFn = fn(&dyn ServiceProvider, Box<dyn Object>) -> Result<()>;
type ConstructFn = fn(&dyn ServiceProvider) -> Result<()>;

/// One handler bound under its request and response kinds.
struct Binding {
    handler: &'static str,
    request: (TypeId, &'static str),
    response: (TypeId, &'static str),
    on_request: RequestFn,
    on_response: ResponseFn,
    can_construct: ConstructFn,
}

fn try_construct<H: Handler>(services: &dyn ServiceProvider) -> Result<()> {
    H::construct(services).map(drop)
}

fn run_request<H: Handler>(services: &dyn ServiceProvider, object: Box<dyn Object>) -> Result<Value> {
    let kind = object.type_name();
    let request = object
        .downcast::<H::Request>()
        .ok_or_else(|| WireError::UnroutableMessage(kind.to_string()))?;
    let mut handler = H::construct(services)?;
    let response = handler.process_request(*request)?;
    Ok(Value::object(response))
}

fn run_response<H: Handler>(services: &dyn ServiceProvider, object: Box<dyn Object>) -> Result<()> {
    let kind = object.type_name();
    let response = object
        .downcast::<H::Response>()
        .ok_or_else(|| WireError::UnroutableMessage(kind.to_string()))?;
    let mut handler = H::construct(services)?;
    handler.process_response(*response)
}

/// Routes decoded objects to the single handler bound to their kind.
///
/// Bindings are registered during startup through `&mut self`; afterwards the
/// dispatcher is shared read-only (typically behind an `Arc`) and needs no
/// locking.
#[derive(Default)]
pub struct Dispatcher {
    requests: HashMap<TypeId, Arc<Binding>>,
    responses: HashMap<TypeId, Arc<Binding>>,
    services: Option<Arc<dyn ServiceProvider>>,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("bindings", &self.requests.len())
            .field("services", &self.services.is_some())
            .finish()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dispatcher whose handlers are built from `services`.
    pub fn with_services(services: Arc<dyn ServiceProvider>) -> Self {
        Self {
            services: Some(services),
            ..Self::default()
        }
    }

    pub fn set_services(&mut self, services: Arc<dyn ServiceProvider>) {
        self.services = Some(services);
    }

    /// Bind `H` under `H::Request` and `H::Response`.
    ///
    /// # Errors
    /// `DuplicateBinding` if either kind is already bound. Nothing is
    /// registered in that case.
    pub fn register<H: Handler>(&mut self) -> Result<()> {
        let request = TypeId::of::<H::Request>();
        let response = TypeId::of::<H::Response>();

        if let Some(existing) = self.requests.get(&request) {
            return Err(WireError::DuplicateBinding {
                kind: H::Request::TYPE_NAME,
                handler: existing.handler,
            });
        }
        if let Some(existing) = self.responses.get(&response) {
            return Err(WireError::DuplicateBinding {
                kind: H::Response::TYPE_NAME,
                handler: existing.handler,
            });
        }

        let binding = Arc::new(Binding {
            handler: type_name::<H>(),
            request: (request, H::Request::TYPE_NAME),
            response: (response, H::Response::TYPE_NAME),
            on_request: run_request::<H>,
            on_response: run_response::<H>,
            can_construct: try_construct::<H>,
        });
        info!(
            handler = binding.handler,
            request = H::Request::TYPE_NAME,
            response = H::Response::TYPE_NAME,
            "Handler registered"
        );
        self.requests.insert(request, binding.clone());
        self.responses.insert(response, binding);
        Ok(())
    }

    /// Readiness check: builds every bound handler once against the
    /// construction service.
    ///
    /// # Errors
    /// `ConstructionUnavailable` when no construction service is configured,
    /// or the first error a handler's `construct` fails with (typically
    /// `ServiceMissing`).
    pub fn ensure_ready(&self) -> Result<()> {
        let services = self.services()?;
        for binding in self.requests.values() {
            if let Err(e) = (binding.can_construct)(services) {
                warn!(handler = binding.handler, error = %e, "Handler cannot be constructed");
                return Err(e);
            }
        }
        Ok(())
    }

    /// Route `value` to its handler.
    ///
    /// Requests return the handler's response; responses return `None`.
    ///
    /// # Errors
    /// `UnroutableMessage` if no handler is bound to the value's kind,
    /// `ConstructionUnavailable` if no construction service is configured,
    /// or whatever the handler itself fails with.
    pub fn dispatch(&self, value: Value) -> Result<Option<Value>> {
        let object = match value {
            Value::Object(object) => object,
            other => {
                warn!(kind = other.kind_name(), "Cannot route a non-object value");
                return Err(WireError::UnroutableMessage(other.kind_name().to_string()));
            }
        };

        let kind = object.as_any().type_id();

        if let Some(binding) = self.requests.get(&kind) {
            let services = self.services()?;
            debug!(handler = binding.handler, request = binding.request.1, "Dispatching request");
            return (binding.on_request)(services, object).map(Some);
        }

        if let Some(binding) = self.responses.get(&kind) {
            let services = self.services()?;
            debug!(handler = binding.handler, response = binding.response.1, "Dispatching response");
            (binding.on_response)(services, object)?;
            return Ok(None);
        }

        warn!(kind = object.type_name(), "No handler bound for message");
        Err(WireError::UnroutableMessage(object.type_name().to_string()))
    }

    /// Whether a handler is bound to `T` as a request kind.
    pub fn handles_request<T: WireType>(&self) -> bool {
        self.requests.contains_key(&TypeId::of::<T>())
    }

    /// Whether a handler is bound to `T` as a response kind.
    pub fn handles_response<T: WireType>(&self) -> bool {
        self.responses.contains_key(&TypeId::of::<T>())
    }

    /// Every bound kind as `(type id, type name)`, requests then responses.
    pub fn bound_kinds(&self) -> impl Iterator<Item = (TypeId, &'static str)> + '_ {
        self.requests
            .values()
            .map(|b| b.request)
            .chain(self.responses.values().map(|b| b.response))
    }

    /// Number of bound handlers.
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    fn services(&self) -> Result<&dyn ServiceProvider> {
        self.services
            .as_deref()
            .ok_or(WireError::ConstructionUnavailable)
    }
}
