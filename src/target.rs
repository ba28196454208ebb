use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::class::{Function, Object};
use crate::inject::Signature;
use crate::service::IntoService;

/// Something the autowiring helper can resolve and invoke
#[derive(Clone, Debug)]
pub enum Target {
    /// Instantiate the named class
    Class(String),
    Callable(Callable),
    /// Call a method on an object, or on a new instance of the named class
    Method {
        receiver: Receiver,
        /// Defaults to [crate::INVOKE_METHOD]
        method: Option<String>,
    },
}

#[derive(Clone, Debug)]
pub enum Callable {
    /// Call the function with its resolved arguments
    Function(Function),
    /// An already constructed invocable object, used as-is
    Invocable(Object),
}

#[derive(Clone, Debug)]
pub enum Receiver {
    Object(Object),
    Class(String),
}

impl Target {
    pub fn class(name: impl Into<String>) -> Self {
        Target::Class(name.into())
    }

    pub fn function<Args, F>(f: F) -> Self
    where
        F: Signature<Args>,
        F::Output: IntoService,
    {
        Target::Callable(Callable::Function(Function::new(f)))
    }

    pub fn named_function<Args, F>(name: impl Into<String>, f: F) -> Self
    where
        F: Signature<Args>,
        F::Output: IntoService,
    {
        Target::Callable(Callable::Function(Function::named(name, f)))
    }

    pub fn invocable<T: Send + Sync + 'static>(object: Arc<T>) -> Self {
        Target::Callable(Callable::Invocable(Object::new(object)))
    }

    pub fn method<T: Send + Sync + 'static>(object: Arc<T>, method: impl Into<String>) -> Self {
        Target::Method {
            receiver: Receiver::Object(Object::new(object)),
            method: Some(method.into()),
        }
    }

    /// Call the conventional invoke method of an object
    pub fn invoke<T: Send + Sync + 'static>(object: Arc<T>) -> Self {
        Target::Method {
            receiver: Receiver::Object(Object::new(object)),
            method: None,
        }
    }

    pub fn class_method(class: impl Into<String>, method: impl Into<String>) -> Self {
        Target::Method {
            receiver: Receiver::Class(class.into()),
            method: Some(method.into()),
        }
    }

    /// Name identifying the target in error messages
    pub fn display_name(&self) -> String {
        match self {
            Target::Class(name) => name.clone(),
            Target::Callable(Callable::Function(f)) => f.name().unwrap_or("Anonymous").to_string(),
            Target::Callable(Callable::Invocable(o)) => o.type_name().to_string(),
            Target::Method { receiver, .. } => match receiver {
                Receiver::Object(o) => o.type_name().to_string(),
                Receiver::Class(name) => name.clone(),
            },
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Method {
                method: Some(method),
                ..
            } => write!(f, "{}::{}", self.display_name(), method),
            _ => f.write_str(&self.display_name()),
        }
    }
}

/// Parse a class name or a `Class::method` pair.
///
/// Class names may be Rust paths: the last segment is a method only if it starts with a lowercase
/// letter or an underscore.
impl FromStr for Target {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.rsplit_once("::") {
            Some((class, method)) if !class.is_empty() && is_method_name(method) => {
                Target::class_method(class, method)
            }
            _ => Target::Class(s.to_string()),
        })
    }
}

fn is_method_name(segment: &str) -> bool {
    segment
        .chars()
        .next()
        .map_or(false, |c| c.is_ascii_lowercase() || c == '_')
        && segment.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl From<&str> for Target {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(target) => target,
            Err(never) => match never {},
        }
    }
}

impl From<String> for Target {
    fn from(s: String) -> Self {
        Target::from(s.as_str())
    }
}

impl From<Function> for Target {
    fn from(f: Function) -> Self {
        Target::Callable(Callable::Function(f))
    }
}

impl From<Object> for Target {
    fn from(o: Object) -> Self {
        Target::Callable(Callable::Invocable(o))
    }
}
