use std::sync::Arc;

use tracing::debug;

use crate::autowire::{AutowireHelperFactory, HelperFactory};
use crate::class::{ClassRegistry, Function};
use crate::container::{Container, Factory};
use crate::inject::Signature;
use crate::service::{IntoService, Service};
use crate::target::Target;
use crate::WiringError;

/// Container decorator autowiring the factories given to `register` and `decorate`.
///
/// Lookups are forwarded to the wrapped container unchanged.
pub struct ContainerAutowire {
    container: Arc<dyn Container>,
    helpers: Box<dyn HelperFactory>,
}

impl ContainerAutowire {
    pub fn new(container: Arc<dyn Container>) -> Self {
        let helpers = Box::new(AutowireHelperFactory::new(container.clone()));
        Self::with_factory(container, helpers)
    }

    /// Resolve class names with the given registry instead of the global one
    pub fn with_classes(container: Arc<dyn Container>, classes: Arc<ClassRegistry>) -> Self {
        let helpers = Box::new(AutowireHelperFactory::with_classes(container.clone(), classes));
        Self::with_factory(container, helpers)
    }

    pub fn with_factory(container: Arc<dyn Container>, helpers: Box<dyn HelperFactory>) -> Self {
        Self { container, helpers }
    }

    pub fn inner(&self) -> &Arc<dyn Container> {
        &self.container
    }

    fn autowired(&self, target: Target) -> Factory {
        self.helpers.create().autowire(target).into_factory()
    }

    /// Register any target: its dependencies are resolved each time the service is built
    pub fn register_target(
        &self,
        id: &str,
        target: impl Into<Target>,
        force: bool,
    ) -> Result<(), WiringError> {
        let target = target.into();
        debug!(id, autowired = %target, "registering autowired service");
        self.container.register(id, self.autowired(target), force)
    }

    pub fn decorate_target(
        &self,
        id: &str,
        target: impl Into<Target>,
        priority: i32,
    ) -> Result<(), WiringError> {
        let target = target.into();
        debug!(id, autowired = %target, priority, "registering autowired decorator");
        self.container.decorate(id, self.autowired(target), priority)
    }

    /// Register a function whose parameters are resolved from the container
    pub fn register_fn<Args, F>(&self, id: &str, f: F, force: bool) -> Result<(), WiringError>
    where
        F: Signature<Args>,
        F::Output: IntoService,
    {
        self.register_target(id, Function::new(f), force)
    }

    /// Decorate a service with a function whose parameters are resolved from the container.
    ///
    /// The decorated service is obtained by requesting the decorated identifier itself.
    pub fn decorate_fn<Args, F>(&self, id: &str, f: F, priority: i32) -> Result<(), WiringError>
    where
        F: Signature<Args>,
        F::Output: IntoService,
    {
        self.decorate_target(id, Function::new(f), priority)
    }
}

fn erased(factory: Factory) -> Function {
    Function::new(move || factory())
}

impl Container for ContainerAutowire {
    fn get(&self, id: &str) -> Result<Service, WiringError> {
        self.container.get(id)
    }

    fn has(&self, id: &str) -> bool {
        self.container.has(id)
    }

    fn register(&self, id: &str, factory: Factory, force: bool) -> Result<(), WiringError> {
        self.register_target(id, erased(factory), force)
    }

    fn decorate(&self, id: &str, factory: Factory, priority: i32) -> Result<(), WiringError> {
        self.decorate_target(id, erased(factory), priority)
    }
}
