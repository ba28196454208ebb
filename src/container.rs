use std::collections::hash_map::{Entry, HashMap};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};

use tracing::{debug, trace};

use crate::service::Service;
use crate::WiringError;

/// Zero-argument callable building a service
pub type Factory = Arc<dyn Fn() -> Result<Service, WiringError> + Send + Sync>;

/// Service registry: lookup by identifier and registration of factories
pub trait Container: Send + Sync {
    /// Obtain the service registered under the given identifier.
    ///
    /// Return [WiringError::NotFound] if no service is registered under this identifier
    fn get(&self, id: &str) -> Result<Service, WiringError>;

    fn has(&self, id: &str) -> bool;

    /// Register the factory of a service.
    ///
    /// Replacing an existing registration requires the `force` flag.
    fn register(&self, id: &str, factory: Factory, force: bool) -> Result<(), WiringError>;

    /// Register a factory wrapping an existing service.
    ///
    /// Decorators with a higher priority are applied first. While a decorator runs,
    /// `get(id)` returns the service decorated so far.
    fn decorate(&self, id: &str, factory: Factory, priority: i32) -> Result<(), WiringError>;
}

impl<C: Container + ?Sized> Container for Arc<C> {
    fn get(&self, id: &str) -> Result<Service, WiringError> {
        (**self).get(id)
    }

    fn has(&self, id: &str) -> bool {
        (**self).has(id)
    }

    fn register(&self, id: &str, factory: Factory, force: bool) -> Result<(), WiringError> {
        (**self).register(id, factory, force)
    }

    fn decorate(&self, id: &str, factory: Factory, priority: i32) -> Result<(), WiringError> {
        (**self).decorate(id, factory, priority)
    }
}

struct Decorator {
    priority: i32,
    factory: Factory,
}

#[derive(Debug)]
enum InstanceEntry {
    /// Being built by the given thread, with the service decorated so far
    Resolving {
        owner: ThreadId,
        partial: Option<Service>,
    },
    Ready(Service),
}

impl InstanceEntry {
    fn resolving(partial: Option<Service>) -> Self {
        InstanceEntry::Resolving {
            owner: thread::current().id(),
            partial,
        }
    }
}

#[derive(Default)]
struct Registry {
    factories: HashMap<String, Factory>,
    decorators: HashMap<String, Vec<Decorator>>,
    instances: HashMap<String, InstanceEntry>,
}

impl Registry {
    /// Decorators of a service, in application order
    fn decorators_of(&self, id: &str) -> Vec<Factory> {
        let mut decorators: Vec<&Decorator> = self.decorators.get(id).into_iter().flatten().collect();
        // stable: equal priorities keep their registration order
        decorators.sort_by(|a, b| b.priority.cmp(&a.priority));
        decorators.into_iter().map(|d| d.factory.clone()).collect()
    }
}

/// In-memory container of shared services.
///
/// Each service is built on first request and reused afterwards. A thread requesting a service
/// which is being built by another thread waits for that build to finish.
#[derive(Default)]
pub struct ServiceContainer {
    registry: Mutex<Registry>,
    built: Condvar,
}

impl ServiceContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an already built service
    pub fn instance(&self, id: &str, service: Service, force: bool) -> Result<(), WiringError> {
        self.register(id, Arc::new(move || Ok(service.clone())), force)
    }

    /// Check whether a service was already built
    pub fn is_resolved(&self, id: &str) -> bool {
        matches!(self.lock().instances.get(id), Some(InstanceEntry::Ready(_)))
    }

    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Build a service and apply its decorators, with the lock released
    fn build(&self, id: &str, factory: Factory, decorators: Vec<Factory>) -> Result<Service, WiringError> {
        debug!(id, decorators = decorators.len(), "building service");
        let mut service = factory()?;
        for decorator in decorators {
            self.lock()
                .instances
                .insert(id.to_string(), InstanceEntry::resolving(Some(service.clone())));
            service = decorator()?;
        }
        Ok(service)
    }
}

impl Container for ServiceContainer {
    fn get(&self, id: &str) -> Result<Service, WiringError> {
        let (factory, decorators) = {
            let mut registry = self.lock();
            loop {
                match registry.instances.get(id) {
                    Some(InstanceEntry::Ready(service)) => {
                        trace!(id, "reusing service");
                        return Ok(service.clone());
                    }
                    Some(InstanceEntry::Resolving { owner, partial }) if *owner == thread::current().id() => {
                        return partial
                            .clone()
                            .ok_or_else(|| WiringError::CyclicResolution(id.to_string()));
                    }
                    Some(InstanceEntry::Resolving { .. }) => trace!(id, "waiting for service"),
                    None => break,
                }
                registry = self.built.wait(registry).unwrap_or_else(PoisonError::into_inner);
            }
            let factory = registry
                .factories
                .get(id)
                .cloned()
                .ok_or_else(|| WiringError::NotFound(id.to_string()))?;
            let decorators = registry.decorators_of(id);
            registry
                .instances
                .insert(id.to_string(), InstanceEntry::resolving(None));
            (factory, decorators)
        };

        let result = self.build(id, factory, decorators);
        {
            let mut registry = self.lock();
            match &result {
                Ok(service) => {
                    registry
                        .instances
                        .insert(id.to_string(), InstanceEntry::Ready(service.clone()));
                }
                Err(_) => {
                    registry.instances.remove(id);
                }
            }
        }
        self.built.notify_all();
        result
    }

    fn has(&self, id: &str) -> bool {
        self.lock().factories.contains_key(id)
    }

    fn register(&self, id: &str, factory: Factory, force: bool) -> Result<(), WiringError> {
        let mut registry = self.lock();
        match registry.factories.entry(id.to_string()) {
            Entry::Occupied(_) if !force => {
                return Err(WiringError::AlreadyRegistered(id.to_string()));
            }
            Entry::Occupied(mut o) => {
                debug!(id, "replacing service");
                o.insert(factory);
            }
            Entry::Vacant(v) => {
                debug!(id, "registering service");
                v.insert(factory);
            }
        }
        registry.instances.remove(id);
        Ok(())
    }

    fn decorate(&self, id: &str, factory: Factory, priority: i32) -> Result<(), WiringError> {
        let mut registry = self.lock();
        if registry.instances.contains_key(id) {
            return Err(WiringError::AlreadyResolved(id.to_string()));
        }
        debug!(id, priority, "registering decorator");
        registry
            .decorators
            .entry(id.to_string())
            .or_default()
            .push(Decorator { priority, factory });
        Ok(())
    }
}
