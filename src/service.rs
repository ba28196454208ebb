use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;

use crate::container::Container;
use crate::WiringError;

/// Identifier under which services of type `T` are looked up.
pub fn service_id<T: ?Sized + 'static>() -> &'static str {
    type_name::<T>()
}

/// Type-erased shared service instance.
///
/// The stored value is an `Arc<T>`, which allows to carry trait objects as well as concrete types.
#[derive(Clone)]
pub struct Service {
    value: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl Service {
    pub fn new<T: ?Sized + Send + Sync + 'static>(value: Arc<T>) -> Self {
        Self {
            value: Arc::new(value),
            type_name: type_name::<T>(),
        }
    }

    /// Recover the shared value if it was stored with the given type
    pub fn downcast<T: ?Sized + 'static>(&self) -> Option<Arc<T>> {
        self.value.downcast_ref::<Arc<T>>().cloned()
    }

    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        self.value.is::<Arc<T>>()
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Two services are the same if they share the same underlying allocation
    pub fn ptr_eq(&self, other: &Service) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }
}

impl fmt::Debug for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Service").field(&self.type_name).finish()
    }
}

/// Values which can be returned by an autowired target.
pub trait IntoService {
    fn into_service(self) -> Result<Service, WiringError>;
}

impl<T: ?Sized + Send + Sync + 'static> IntoService for Arc<T> {
    fn into_service(self) -> Result<Service, WiringError> {
        Ok(Service::new(self))
    }
}

impl IntoService for Service {
    fn into_service(self) -> Result<Service, WiringError> {
        Ok(self)
    }
}

impl<S: IntoService> IntoService for Result<S, WiringError> {
    fn into_service(self) -> Result<Service, WiringError> {
        self?.into_service()
    }
}

/// A resolved argument, positionally matched to a declared parameter
#[derive(Clone)]
pub enum Argument {
    /// Placeholder for untyped parameters
    Null,
    Container(Arc<dyn Container>),
    Service(Service),
}

impl Argument {
    pub(crate) fn describe(&self) -> String {
        match self {
            Argument::Null => "null".to_string(),
            Argument::Container(_) => type_name::<dyn Container>().to_string(),
            Argument::Service(s) => s.type_name().to_string(),
        }
    }
}

impl fmt::Debug for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Argument::Null => f.write_str("Null"),
            Argument::Container(_) => f.write_str("Container"),
            Argument::Service(s) => f.debug_tuple("Service").field(&s.type_name()).finish(),
        }
    }
}
