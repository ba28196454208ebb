//! Declared parameters and the traits giving access to them.
//!
//! Rust has no runtime reflection over function signatures, so the parameter list of an autowirable
//! function is derived at compile time from its argument types:
//!
//! * The [Injectable] trait describes how a parameter type is declared (which service it requires)
//!   and how the resolved [Argument] is converted back into the typed value.
//! * The [Signature] trait is implemented for all functions with up to 10 injectable arguments.
//!   It exposes the ordered list of declared [Parameter]s and calls the function from an ordered
//!   list of resolved arguments.
//! * The [MethodSignature] trait does the same for methods, taking the receiver as first argument.

use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use crate::container::Container;
use crate::error::ReflectionError;
use crate::service::{service_id, Argument, Service};

/// Declared type of a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterType {
    /// The parameter wants the container itself
    Container,
    /// The parameter wants the service registered under this identifier
    Service(&'static str),
}

/// Descriptor of a declared parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parameter {
    declared: &'static str,
    ty: Option<ParameterType>,
}

impl Parameter {
    pub fn of<P: Injectable>() -> Self {
        Self {
            declared: type_name::<P>(),
            ty: P::parameter_type(),
        }
    }

    /// Rust type of the parameter, informational only
    pub fn declared(&self) -> &'static str {
        self.declared
    }

    /// `None` for untyped parameters, which resolve to [Argument::Null]
    pub fn ty(&self) -> Option<ParameterType> {
        self.ty
    }
}

/// A parameter type which can be filled from a resolved argument.
pub trait Injectable: Sized {
    fn parameter_type() -> Option<ParameterType>;

    fn from_argument(argument: Argument) -> Result<Self, ReflectionError>;
}

/// Untyped parameter: always receives the null placeholder
impl Injectable for () {
    fn parameter_type() -> Option<ParameterType> {
        None
    }

    fn from_argument(_argument: Argument) -> Result<Self, ReflectionError> {
        Ok(())
    }
}

impl Injectable for Arc<dyn Container> {
    fn parameter_type() -> Option<ParameterType> {
        Some(ParameterType::Container)
    }

    fn from_argument(argument: Argument) -> Result<Self, ReflectionError> {
        match argument {
            Argument::Container(c) => Ok(c),
            other => Err(mismatch::<dyn Container>(&other)),
        }
    }
}

/// Dependency on the service registered for the type `T`.
///
/// `Dep<dyn Container>` receives the container performing the injection.
pub struct Dep<T: ?Sized>(Arc<T>);

impl<T: ?Sized> Dep<T> {
    pub fn new(value: Arc<T>) -> Self {
        Dep(value)
    }

    pub fn into_inner(self) -> Arc<T> {
        self.0
    }
}

impl<T: ?Sized> Deref for Dep<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T: ?Sized> Clone for Dep<T> {
    fn clone(&self) -> Self {
        Dep(self.0.clone())
    }
}

impl<T: ?Sized> fmt::Debug for Dep<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Dep").field(&type_name::<T>()).finish()
    }
}

impl<T: ?Sized + Send + Sync + 'static> Injectable for Dep<T> {
    fn parameter_type() -> Option<ParameterType> {
        if TypeId::of::<T>() == TypeId::of::<dyn Container>() {
            Some(ParameterType::Container)
        } else {
            Some(ParameterType::Service(service_id::<T>()))
        }
    }

    fn from_argument(argument: Argument) -> Result<Self, ReflectionError> {
        match argument {
            Argument::Service(ref service) => service
                .downcast::<T>()
                .map(Dep)
                .ok_or_else(|| mismatch::<T>(&argument)),
            Argument::Container(container) => {
                // T is only ever `dyn Container` here
                let boxed: Box<dyn Any> = Box::new(container.clone());
                boxed
                    .downcast::<Arc<T>>()
                    .map(|c| Dep(*c))
                    .map_err(|_| mismatch::<T>(&Argument::Container(container)))
            }
            Argument::Null => Err(mismatch::<T>(&argument)),
        }
    }
}

fn mismatch<T: ?Sized>(found: &Argument) -> ReflectionError {
    ReflectionError::TypeMismatch {
        expected: type_name::<T>().to_string(),
        found: found.describe(),
    }
}

fn check_arity(expected: usize, args: &[Argument]) -> Result<(), ReflectionError> {
    if args.len() != expected {
        return Err(ReflectionError::ArityMismatch {
            expected,
            found: args.len(),
        });
    }
    Ok(())
}

/// A function whose parameters can be injected.
///
/// This trait is implemented for all functions with up to 10 arguments, using a tuple to
/// wrap the argument types in a single type.
pub trait Signature<Args>: Send + Sync + 'static {
    type Output;

    fn parameters() -> Vec<Parameter>;

    /// Call with one resolved argument per declared parameter
    fn call(&self, args: Vec<Argument>) -> Result<Self::Output, ReflectionError>;
}

/// A method of `T` whose parameters (receiver excluded) can be injected.
pub trait MethodSignature<T, Args>: Send + Sync + 'static {
    type Output;

    fn parameters() -> Vec<Parameter>;

    fn call(&self, receiver: &T, args: Vec<Argument>) -> Result<Self::Output, ReflectionError>;
}

/// Downcast a type-erased receiver before calling one of its methods
pub(crate) fn receiver<T: Send + Sync + 'static>(service: &Service) -> Result<Arc<T>, ReflectionError> {
    service
        .downcast::<T>()
        .ok_or_else(|| ReflectionError::TypeMismatch {
            expected: type_name::<T>().to_string(),
            found: service.type_name().to_string(),
        })
}

macro_rules! signature_tuple ({ $($param:ident)* } => {
    impl<Func, Ret, $($param,)*> Signature<($($param,)*)> for Func
    where
        Func: Fn($($param),*) -> Ret + Send + Sync + 'static,
        $($param: Injectable,)*
    {
        type Output = Ret;

        #[inline]
        fn parameters() -> Vec<Parameter> {
            vec![$(Parameter::of::<$param>(),)*]
        }

        #[inline]
        #[allow(non_snake_case, unused_mut, unused_variables)]
        fn call(&self, args: Vec<Argument>) -> Result<Ret, ReflectionError> {
            check_arity(<Self as Signature<($($param,)*)>>::parameters().len(), &args)?;
            let mut args = args.into_iter();
            $(let $param = $param::from_argument(args.next().unwrap_or(Argument::Null))?;)*
            Ok((self)($($param),*))
        }
    }

    impl<Recv, Func, Ret, $($param,)*> MethodSignature<Recv, ($($param,)*)> for Func
    where
        Func: Fn(&Recv, $($param),*) -> Ret + Send + Sync + 'static,
        $($param: Injectable,)*
    {
        type Output = Ret;

        #[inline]
        fn parameters() -> Vec<Parameter> {
            vec![$(Parameter::of::<$param>(),)*]
        }

        #[inline]
        #[allow(non_snake_case, unused_mut, unused_variables)]
        fn call(&self, receiver: &Recv, args: Vec<Argument>) -> Result<Ret, ReflectionError> {
            check_arity(<Self as MethodSignature<Recv, ($($param,)*)>>::parameters().len(), &args)?;
            let mut args = args.into_iter();
            $(let $param = $param::from_argument(args.next().unwrap_or(Argument::Null))?;)*
            Ok((self)(receiver, $($param),*))
        }
    }
});

signature_tuple! {}
signature_tuple! { A }
signature_tuple! { A B }
signature_tuple! { A B C }
signature_tuple! { A B C D }
signature_tuple! { A B C D E }
signature_tuple! { A B C D E F }
signature_tuple! { A B C D E F G }
signature_tuple! { A B C D E F G H }
signature_tuple! { A B C D E F G H I }
signature_tuple! { A B C D E F G H I J }

#[cfg(test)]
mod tests {
    use super::*;

    fn parameters_of<Args, F: Signature<Args>>(_f: &F) -> Vec<Parameter> {
        F::parameters()
    }

    fn call<Args, F: Signature<Args>>(f: &F, args: Vec<Argument>) -> Result<F::Output, ReflectionError> {
        f.call(args)
    }

    #[test]
    fn declared_parameters() {
        let f = |_: Dep<String>, _: (), _: Arc<dyn Container>, _: Dep<dyn Container>| 0u8;
        let types: Vec<_> = parameters_of(&f).iter().map(Parameter::ty).collect();
        assert_eq!(
            types,
            vec![
                Some(ParameterType::Service(service_id::<String>())),
                None,
                Some(ParameterType::Container),
                Some(ParameterType::Container),
            ]
        );
    }

    #[test]
    fn call_checks_arity_and_types() {
        let f = |name: Dep<String>| name.len();

        let err = call(&f, vec![]).unwrap_err();
        assert_eq!(err, ReflectionError::ArityMismatch { expected: 1, found: 0 });

        let err = call(&f, vec![Argument::Null]).unwrap_err();
        assert!(matches!(err, ReflectionError::TypeMismatch { .. }));

        let arg = Argument::Service(Service::new(Arc::new(String::from("four"))));
        assert_eq!(call(&f, vec![arg]).unwrap(), 4);
    }
}
