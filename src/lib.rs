//! Type-directed dependency injection on top of a service container.
//!
//! # Simple use case
//!
//! ```
//! # use std::sync::Arc;
//! # use autowire::*;
//! // Define traits and implementors
//! trait Modifier: Send + Sync {
//!     fn modify(&self, name: &str) -> String;
//! }
//!
//! struct Brackets;
//!
//! impl Modifier for Brackets {
//!     fn modify(&self, name: &str) -> String {
//!         format!("[{}]", name)
//!     }
//! }
//!
//! # fn main() -> Result<(), WiringError> {
//! let container = ContainerAutowire::new(Arc::new(ServiceContainer::new()));
//!
//! // Factories declare their dependencies as parameters
//! container.register_fn(service_id::<dyn Modifier>(), || -> Arc<dyn Modifier> { Arc::new(Brackets) }, false)?;
//! container.register_fn("name", |m: Dep<dyn Modifier>| Arc::new(m.modify("hello")), false)?;
//!
//! let name = container.get("name")?.downcast::<String>().unwrap();
//! assert_eq!(name.as_str(), "[hello]");
//! # Ok(())
//! # }
//! ```
//!
//! # Mechanism
//!
//! Rust has no runtime reflection, so the declared parameters of a target are captured at compile
//! time and stored next to a type-erased version of the target.
//!
//! * The ```Injectable``` trait marks parameter types: ```Dep<T>``` asks the container for the service
//!   registered under ```service_id::<T>()```, ```Dep<dyn Container>``` or ```Arc<dyn Container>```
//!   receive the container itself, and ```()``` stands for an untyped parameter.
//! * The ```Signature``` and ```MethodSignature``` traits are implemented for functions and methods
//!   with up to 10 injectable parameters.
//! * A ```Class``` describes the constructor and named methods of a type. Classes are collected in a
//!   ```ClassRegistry``` to resolve class names and the methods of existing objects.
//! * The ```AutowireHelper``` turns a ```Target``` (a class name, a callable or an object/method pair)
//!   into a ```Thunk``` which resolves all parameters from the container and invokes the target.
//! * The ```ContainerAutowire``` decorator passes all factories given to ```register``` and
//!   ```decorate``` through an autowiring helper before handing them to the wrapped container.

mod autowire;
mod class;
mod container;
mod container_autowire;
mod error;
mod inject;
mod service;
mod target;

pub use crate::autowire::{Autowire, AutowireHelper, AutowireHelperFactory, HelperFactory, Thunk};
pub use class::{Class, ClassBuilder, ClassRegistry, Function, Method, Object, INVOKE_METHOD};
pub use container::{Container, Factory, ServiceContainer};
pub use container_autowire::ContainerAutowire;
pub use error::{AutowireError, ReflectionError, WiringError};
pub use inject::{Dep, Injectable, MethodSignature, Parameter, ParameterType, Signature};
pub use service::{service_id, Argument, IntoService, Service};
pub use target::{Callable, Receiver, Target};

#[cfg(test)]
mod tests;
