use std::error::Error as StdError;

use thiserror::Error;

/// Errors triggered during the autowiring process
#[derive(Error, Debug)]
pub enum WiringError {
    #[error(transparent)]
    Autowire(#[from] AutowireError),
    #[error("Service \"{0}\" not found")]
    NotFound(String),
    #[error("Service \"{0}\" is already registered")]
    AlreadyRegistered(String),
    #[error("Consistency error: service \"{0}\" was already resolved")]
    AlreadyResolved(String),
    #[error("Cyclic dependencies: service \"{0}\" is requested while it is being resolved")]
    CyclicResolution(String),
}

impl WiringError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, WiringError::NotFound(_))
    }

    pub fn as_autowire(&self) -> Option<&AutowireError> {
        match self {
            WiringError::Autowire(e) => Some(e),
            _ => None,
        }
    }
}

/// A target could not be turned into an invocable object or method.
///
/// Carries the display name of the offending target and the message of the underlying cause.
#[derive(Error, Debug)]
#[error("Can not autowire \"{target}\". {message}")]
pub struct AutowireError {
    target: String,
    message: String,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl AutowireError {
    pub fn new(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Wrap a cause, reusing its message.
    pub fn caused_by<E>(target: impl Into<String>, cause: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self {
            target: target.into(),
            message: cause.to_string(),
            source: Some(Box::new(cause)),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Introspection failures, reported to callers wrapped in an [AutowireError]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReflectionError {
    #[error("The target class does not exist or no callable.")]
    UnknownClass(String),
    #[error("Class \"{0}\" has no constructor.")]
    NotInstantiable(String),
    #[error("Method {class}::{method}() does not exist")]
    UnknownMethod { class: String, method: String },
    #[error("Expected {expected} argument(s), got {found}")]
    ArityMismatch { expected: usize, found: usize },
    #[error("Expected a value of type {expected}, got {found}")]
    TypeMismatch { expected: String, found: String },
}

/// Failure of a reflected call: either an introspection problem or an error raised by the callee.
#[derive(Debug)]
pub(crate) enum CallError {
    Reflection(ReflectionError),
    Wiring(WiringError),
}

impl From<ReflectionError> for CallError {
    fn from(e: ReflectionError) -> Self {
        CallError::Reflection(e)
    }
}

impl From<WiringError> for CallError {
    fn from(e: WiringError) -> Self {
        CallError::Wiring(e)
    }
}

impl CallError {
    /// Normalize into the public error type, attributing introspection failures to the target.
    pub(crate) fn attribute_to(self, target: impl Into<String>) -> WiringError {
        match self {
            CallError::Reflection(cause) => AutowireError::caused_by(target, cause).into(),
            CallError::Wiring(e) => e,
        }
    }
}
