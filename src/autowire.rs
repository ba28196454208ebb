use std::any::type_name;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::class::{Class, ClassRegistry, Function, INVOKE_METHOD};
use crate::container::{Container, Factory};
use crate::error::{AutowireError, CallError, ReflectionError};
use crate::inject::{Parameter, ParameterType};
use crate::service::{Argument, Service};
use crate::target::{Callable, Receiver, Target};
use crate::WiringError;

/// Turn targets into zero-argument invocations with injected dependencies
pub trait Autowire: Send + Sync {
    /// Wrap the target in a thunk.
    ///
    /// Nothing is resolved until the thunk is called, and every call resolves all dependencies again.
    fn autowire(&self, target: Target) -> Thunk;
}

/// Create autowiring helpers
pub trait HelperFactory: Send + Sync {
    fn create(&self) -> Box<dyn Autowire>;
}

/// Deferred invocation of an autowired target
#[derive(Clone)]
pub struct Thunk {
    target: String,
    call: Factory,
}

impl Thunk {
    /// Display name of the autowired target
    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn call(&self) -> Result<Service, WiringError> {
        (self.call)()
    }

    /// Call and downcast the result
    pub fn call_as<T: ?Sized + 'static>(&self) -> Result<Arc<T>, WiringError> {
        let service = self.call()?;
        service.downcast::<T>().ok_or_else(|| {
            let cause = ReflectionError::TypeMismatch {
                expected: type_name::<T>().to_string(),
                found: service.type_name().to_string(),
            };
            AutowireError::caused_by(self.target.as_str(), cause).into()
        })
    }

    /// Use the thunk as a container factory
    pub fn into_factory(self) -> Factory {
        self.call
    }
}

impl fmt::Debug for Thunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Thunk").field(&self.target).finish()
    }
}

/// Resolve targets against a container, using the classes of a registry
#[derive(Clone)]
pub struct AutowireHelper {
    container: Arc<dyn Container>,
    classes: Arc<ClassRegistry>,
}

impl AutowireHelper {
    /// Bind a helper to the container, using the global class registry
    pub fn new(container: Arc<dyn Container>) -> Self {
        Self::with_classes(container, ClassRegistry::global())
    }

    pub fn with_classes(container: Arc<dyn Container>, classes: Arc<ClassRegistry>) -> Self {
        Self { container, classes }
    }

    pub fn container(&self) -> &Arc<dyn Container> {
        &self.container
    }

    fn invoke(&self, target: &Target) -> Result<Service, WiringError> {
        debug!(autowired = %target, "autowiring");
        self.resolve(target)
            .map_err(|e| e.attribute_to(target.display_name()))
    }

    fn resolve(&self, target: &Target) -> Result<Service, CallError> {
        match target {
            // a registered function takes precedence over a class of the same name
            Target::Class(name) => match self.classes.function(name) {
                Some(f) => self.call(&f),
                None => {
                    let class = self.class(name)?;
                    self.instantiate(&class)
                }
            },
            Target::Callable(Callable::Invocable(object)) => Ok(object.instance().clone()),
            Target::Callable(Callable::Function(f)) => self.call(f),
            Target::Method { receiver, method } => {
                let (class, object) = match receiver {
                    Receiver::Object(object) => {
                        (self.classes.class_of(object)?, object.instance().clone())
                    }
                    Receiver::Class(name) => {
                        let class = self.class(name)?;
                        let object = self.instantiate(&class)?;
                        (class, object)
                    }
                };
                let method_name = method.as_deref().unwrap_or(INVOKE_METHOD);
                let method = class
                    .method(method_name)
                    .ok_or_else(|| ReflectionError::UnknownMethod {
                        class: class.name().to_string(),
                        method: method_name.to_string(),
                    })?;
                let args = self.resolve_arguments(method.parameters())?;
                method.invoke(&object, args)
            }
        }
    }

    fn class(&self, name: &str) -> Result<Arc<Class>, ReflectionError> {
        self.classes
            .get(name)
            .ok_or_else(|| ReflectionError::UnknownClass(name.to_string()))
    }

    fn call(&self, f: &Function) -> Result<Service, CallError> {
        let args = self.resolve_arguments(f.parameters())?;
        f.invoke(args)
    }

    fn instantiate(&self, class: &Class) -> Result<Service, CallError> {
        let constructor = class
            .constructor()
            .ok_or_else(|| ReflectionError::NotInstantiable(class.name().to_string()))?;
        let args = self.resolve_arguments(constructor.parameters())?;
        constructor.invoke(args)
    }

    /// One argument per declared parameter, in declaration order
    fn resolve_arguments(&self, parameters: &[Parameter]) -> Result<Vec<Argument>, WiringError> {
        parameters
            .iter()
            .map(|parameter| {
                trace!(parameter = parameter.declared(), "resolving parameter");
                match parameter.ty() {
                    None => Ok(Argument::Null),
                    Some(ParameterType::Container) => Ok(Argument::Container(self.container.clone())),
                    Some(ParameterType::Service(id)) => self.container.get(id).map(Argument::Service),
                }
            })
            .collect()
    }
}

impl Autowire for AutowireHelper {
    fn autowire(&self, target: Target) -> Thunk {
        let helper = self.clone();
        Thunk {
            target: target.display_name(),
            call: Arc::new(move || helper.invoke(&target)),
        }
    }
}

/// Create fresh helpers bound to the same container and class registry
pub struct AutowireHelperFactory {
    container: Arc<dyn Container>,
    classes: Arc<ClassRegistry>,
}

impl AutowireHelperFactory {
    pub fn new(container: Arc<dyn Container>) -> Self {
        Self::with_classes(container, ClassRegistry::global())
    }

    pub fn with_classes(container: Arc<dyn Container>, classes: Arc<ClassRegistry>) -> Self {
        Self { container, classes }
    }
}

impl HelperFactory for AutowireHelperFactory {
    fn create(&self) -> Box<dyn Autowire> {
        Box::new(AutowireHelper::with_classes(
            self.container.clone(),
            self.classes.clone(),
        ))
    }
}
