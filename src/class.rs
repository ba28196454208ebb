//! Runtime descriptions of callables and classes.
//!
//! These descriptors stand in for runtime reflection: a [Class] records how to construct a type and
//! which named methods it exposes, a [Function] records the parameters of a free function or closure.
//! Classes are looked up by name or by [TypeId] in a [ClassRegistry], which also resolves the names
//! of free functions.

use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use once_cell::sync::Lazy;
use tracing::debug;

use crate::error::{CallError, ReflectionError};
use crate::inject::{receiver, MethodSignature, Parameter, Signature};
use crate::service::{Argument, IntoService, Service};

/// Name of the method called when a pair target does not name one
pub const INVOKE_METHOD: &str = "invoke";

type ErasedFn = Arc<dyn Fn(Vec<Argument>) -> Result<Service, CallError> + Send + Sync>;
type ErasedMethod = Arc<dyn Fn(&Service, Vec<Argument>) -> Result<Service, CallError> + Send + Sync>;

/// Type-erased free function or closure with its declared parameters
#[derive(Clone)]
pub struct Function {
    name: Option<String>,
    parameters: Vec<Parameter>,
    call: ErasedFn,
}

impl Function {
    /// Wrap an anonymous function
    pub fn new<Args, F>(f: F) -> Self
    where
        F: Signature<Args>,
        F::Output: IntoService,
    {
        Self {
            name: None,
            parameters: F::parameters(),
            call: Arc::new(move |args: Vec<Argument>| -> Result<Service, CallError> {
                Ok(f.call(args)?.into_service()?)
            }),
        }
    }

    /// Wrap a named function
    pub fn named<Args, F>(name: impl Into<String>, f: F) -> Self
    where
        F: Signature<Args>,
        F::Output: IntoService,
    {
        Self {
            name: Some(name.into()),
            ..Self::new(f)
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub(crate) fn invoke(&self, args: Vec<Argument>) -> Result<Service, CallError> {
        (self.call)(args)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("parameters", &self.parameters)
            .finish()
    }
}

/// Type-erased method, called on a receiver stored in a [Service]
#[derive(Clone)]
pub struct Method {
    parameters: Vec<Parameter>,
    call: ErasedMethod,
}

impl Method {
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub(crate) fn invoke(&self, object: &Service, args: Vec<Argument>) -> Result<Service, CallError> {
        (self.call)(object, args)
    }
}

/// Runtime description of a concrete type: its name, constructor and methods
pub struct Class {
    name: String,
    type_id: TypeId,
    constructor: Option<Function>,
    methods: HashMap<String, Method>,
}

impl Class {
    pub fn builder<T: Send + Sync + 'static>() -> ClassBuilder<T> {
        ClassBuilder {
            class: Class {
                name: type_name::<T>().to_string(),
                type_id: TypeId::of::<T>(),
                constructor: None,
                methods: HashMap::new(),
            },
            _marker: Default::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn constructor(&self) -> Option<&Function> {
        self.constructor.as_ref()
    }

    pub fn method(&self, name: &str) -> Option<&Method> {
        self.methods.get(name)
    }

    pub fn has_method(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut methods: Vec<_> = self.methods.keys().collect();
        methods.sort();
        f.debug_struct("Class")
            .field("name", &self.name)
            .field("instantiable", &self.constructor.is_some())
            .field("methods", &methods)
            .finish()
    }
}

/// Describe a class with the constructor and methods of the type `T`
pub struct ClassBuilder<T> {
    class: Class,
    _marker: std::marker::PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> ClassBuilder<T> {
    /// Override the class name (defaults to the Rust type name)
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.class.name = name.into();
        self
    }

    /// Use an injectable function as constructor
    pub fn constructor<Args, F>(mut self, f: F) -> Self
    where
        F: Signature<Args, Output = T>,
    {
        self.class.constructor = Some(Function {
            name: Some(self.class.name.clone()),
            parameters: F::parameters(),
            call: Arc::new(move |args: Vec<Argument>| -> Result<Service, CallError> {
                Ok(Service::new(Arc::new(f.call(args)?)))
            }),
        });
        self
    }

    /// Construct instances without arguments using [Default]
    pub fn with_default(self) -> Self
    where
        T: Default,
    {
        self.constructor(T::default)
    }

    /// Expose a method with injectable parameters under the given name
    pub fn method<Args, F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: MethodSignature<T, Args>,
        F::Output: IntoService,
    {
        let method = Method {
            parameters: F::parameters(),
            call: Arc::new(move |object: &Service, args: Vec<Argument>| -> Result<Service, CallError> {
                let object = receiver::<T>(object)?;
                Ok(f.call(&*object, args)?.into_service()?)
            }),
        };
        self.class.methods.insert(name.into(), method);
        self
    }

    /// Expose the conventional invoke method
    pub fn invoke<Args, F>(self, f: F) -> Self
    where
        F: MethodSignature<T, Args>,
        F::Output: IntoService,
    {
        self.method(INVOKE_METHOD, f)
    }

    pub fn build(self) -> Class {
        self.class
    }
}

/// An already-constructed instance with its concrete type
#[derive(Clone)]
pub struct Object {
    instance: Service,
    type_id: TypeId,
}

impl Object {
    pub fn new<T: Send + Sync + 'static>(instance: Arc<T>) -> Self {
        Self {
            instance: Service::new(instance),
            type_id: TypeId::of::<T>(),
        }
    }

    pub fn instance(&self) -> &Service {
        &self.instance
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.instance.type_name()
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Object").field(&self.type_name()).finish()
    }
}

#[derive(Default)]
struct ClassTable {
    by_name: HashMap<String, Arc<Class>>,
    by_type: HashMap<TypeId, Arc<Class>>,
    functions: HashMap<String, Function>,
}

static GLOBAL: Lazy<Arc<ClassRegistry>> = Lazy::new(Default::default);

/// Collection of the known classes, indexed by name and by type, and of named functions
#[derive(Default)]
pub struct ClassRegistry {
    table: RwLock<ClassTable>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide registry, used by helpers which are not bound to a specific one
    pub fn global() -> Arc<ClassRegistry> {
        GLOBAL.clone()
    }

    /// Add a class, replacing any class with the same name or type
    pub fn register(&self, class: Class) -> Arc<Class> {
        let class = Arc::new(class);
        let mut table = self.table.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = table.by_name.insert(class.name.clone(), class.clone()) {
            if previous.type_id != class.type_id {
                table.by_type.remove(&previous.type_id);
            }
        }
        if let Some(previous) = table.by_type.insert(class.type_id, class.clone()) {
            if previous.name != class.name {
                table.by_name.remove(&previous.name);
            }
        }
        debug!(class = %class.name, "registered class");
        class
    }

    /// Add a free function, callable by name like a class.
    ///
    /// A function hides any class registered under the same name.
    pub fn register_function<Args, F>(&self, name: impl Into<String>, f: F)
    where
        F: Signature<Args>,
        F::Output: IntoService,
    {
        let name = name.into();
        let function = Function::named(name.clone(), f);
        debug!(function = %name, "registered function");
        let mut table = self.table.write().unwrap_or_else(PoisonError::into_inner);
        table.functions.insert(name, function);
    }

    pub fn function(&self, name: &str) -> Option<Function> {
        let table = self.table.read().unwrap_or_else(PoisonError::into_inner);
        table.functions.get(name).cloned()
    }

    pub fn get(&self, name: &str) -> Option<Arc<Class>> {
        let table = self.table.read().unwrap_or_else(PoisonError::into_inner);
        table.by_name.get(name).cloned()
    }

    pub fn get_by_type(&self, type_id: TypeId) -> Option<Arc<Class>> {
        let table = self.table.read().unwrap_or_else(PoisonError::into_inner);
        table.by_type.get(&type_id).cloned()
    }

    pub fn exists(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn exists_function(&self, name: &str) -> bool {
        self.function(name).is_some()
    }

    pub(crate) fn class_of(&self, object: &Object) -> Result<Arc<Class>, ReflectionError> {
        self.get_by_type(object.type_id())
            .ok_or_else(|| ReflectionError::UnknownClass(object.type_name().to_string()))
    }
}
