use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::*;

struct Settings {
    name: String,
}

struct Suffix {
    text: &'static str,
}

struct Greeter {
    settings: Arc<Settings>,
}

impl Greeter {
    fn new(settings: Dep<Settings>) -> Self {
        Self {
            settings: settings.into_inner(),
        }
    }

    fn greet(&self, suffix: Dep<Suffix>) -> Arc<String> {
        Arc::new(format!("Hello, {}{}", self.settings.name, suffix.text))
    }
}

#[derive(Default)]
struct Plain;

#[derive(Debug)]
struct Hello;

impl Hello {
    fn invoke(&self) -> Arc<String> {
        Arc::new("HELLO!".to_string())
    }
}

struct Abstract;

fn settings(name: &str) -> Service {
    Service::new(Arc::new(Settings {
        name: name.to_string(),
    }))
}

fn fixture() -> (Arc<ServiceContainer>, AutowireHelper) {
    let container = Arc::new(ServiceContainer::new());
    container
        .instance(service_id::<Settings>(), settings("world"), false)
        .unwrap();
    container
        .instance(service_id::<Suffix>(), Service::new(Arc::new(Suffix { text: "!" })), false)
        .unwrap();

    let classes = Arc::new(ClassRegistry::new());
    classes.register(Class::builder::<Plain>().name("Plain").with_default().build());
    classes.register(
        Class::builder::<Greeter>()
            .name("Greeter")
            .constructor(Greeter::new)
            .method("greet", Greeter::greet)
            .build(),
    );
    classes.register(Class::builder::<Hello>().name("Hello").invoke(Hello::invoke).build());
    classes.register(Class::builder::<Abstract>().name("Abstract").build());
    classes.register_function("greeting", |settings: Dep<Settings>, suffix: Dep<Suffix>| {
        Arc::new(format!("Hi {}{}", settings.name, suffix.text))
    });

    let helper = AutowireHelper::with_classes(container.clone(), classes);
    (container, helper)
}

fn autowire_error(err: WiringError) -> AutowireError {
    match err {
        WiringError::Autowire(e) => e,
        other => panic!("expected an autowire error, got {other:?}"),
    }
}

#[test]
fn class_without_arguments() {
    let (_, helper) = fixture();
    let plain = helper.autowire(Target::class("Plain")).call().unwrap();
    assert!(plain.is::<Plain>());
}

#[test]
fn class_with_dependency() {
    let (container, helper) = fixture();
    let greeter = helper.autowire("Greeter".into()).call_as::<Greeter>().unwrap();

    let registered = container
        .get(service_id::<Settings>())
        .unwrap()
        .downcast::<Settings>()
        .unwrap();
    assert!(Arc::ptr_eq(&greeter.settings, &registered));
}

#[test]
fn method_of_object() {
    let (container, helper) = fixture();
    let settings = container.get(service_id::<Settings>()).unwrap();
    let greeter = Arc::new(Greeter::new(Dep::new(settings.downcast().unwrap())));

    let greeting = helper
        .autowire(Target::method(greeter, "greet"))
        .call_as::<String>()
        .unwrap();
    assert_eq!(greeting.as_str(), "Hello, world!");
}

#[test]
fn method_of_class() {
    let (_, helper) = fixture();
    let greeting = helper
        .autowire("Greeter::greet".into())
        .call_as::<String>()
        .unwrap();
    assert_eq!(greeting.as_str(), "Hello, world!");
}

#[test]
fn default_invoke_method() {
    let (_, helper) = fixture();
    let hello = helper
        .autowire(Target::invoke(Arc::new(Hello)))
        .call_as::<String>()
        .unwrap();
    assert_eq!(hello.as_str(), "HELLO!");
}

#[test]
fn invocable_object_is_final() {
    let (_, helper) = fixture();
    let hello = Arc::new(Hello);
    let resolved = helper
        .autowire(Target::invocable(hello.clone()))
        .call_as::<Hello>()
        .unwrap();
    assert!(Arc::ptr_eq(&hello, &resolved));
}

#[test]
fn anonymous_function() {
    let (_, helper) = fixture();
    let thunk = helper.autowire(Target::function(|settings: Dep<Settings>, suffix: Dep<Suffix>| {
        Arc::new(format!("{}{}", settings.name, suffix.text))
    }));
    assert_eq!(thunk.call_as::<String>().unwrap().as_str(), "world!");
}

#[test]
fn function_by_name() {
    let (_, helper) = fixture();
    let greeting = helper.autowire("greeting".into()).call_as::<String>().unwrap();
    assert_eq!(greeting.as_str(), "Hi world!");
}

#[test]
fn untyped_parameter_is_null() {
    let (_, helper) = fixture();
    let thunk = helper.autowire(Target::function(|_: (), settings: Dep<Settings>, _: ()| {
        Arc::new(settings.name.len())
    }));
    assert_eq!(*thunk.call_as::<usize>().unwrap(), 5);
}

#[test]
fn container_parameter() {
    let (container, helper) = fixture();
    let thunk = helper.autowire(Target::function(
        |c: Arc<dyn Container>, d: Dep<dyn Container>| Arc::new((c.has("missing"), d.has(service_id::<Suffix>()))),
    ));
    assert_eq!(*thunk.call_as::<(bool, bool)>().unwrap(), (false, true));

    let bound = helper.autowire(Target::function(|c: Arc<dyn Container>| c));
    let bound = bound.call_as::<dyn Container>().unwrap();
    assert!(std::ptr::eq(
        Arc::as_ptr(&bound) as *const u8,
        Arc::as_ptr(&container) as *const u8
    ));
}

#[test]
fn fallible_function() {
    let (_, helper) = fixture();
    let thunk = helper.autowire(Target::function(|c: Arc<dyn Container>| -> Result<Service, WiringError> {
        let suffix = c.get(service_id::<Suffix>())?;
        Ok(suffix)
    }));
    assert!(thunk.call().unwrap().is::<Suffix>());
}

#[test]
fn unknown_class() {
    let (_, helper) = fixture();
    // nothing happens until the thunk is called
    let thunk = helper.autowire(Target::class("ClassNoExists"));

    let err = autowire_error(thunk.call().unwrap_err());
    assert_eq!(err.target(), "ClassNoExists");
    assert_eq!(
        err.to_string(),
        "Can not autowire \"ClassNoExists\". The target class does not exist or no callable."
    );
}

#[test]
fn class_without_constructor() {
    let (_, helper) = fixture();
    let err = autowire_error(helper.autowire(Target::class("Abstract")).call().unwrap_err());
    assert_eq!(err.target(), "Abstract");
    assert_eq!(err.message(), "Class \"Abstract\" has no constructor.");
}

#[test]
fn missing_method() {
    let (_, helper) = fixture();

    // no invoke method to fall back to
    let err = autowire_error(
        helper
            .autowire(Target::Method {
                receiver: Receiver::Class("Greeter".into()),
                method: None,
            })
            .call()
            .unwrap_err(),
    );
    assert_eq!(err.to_string(), "Can not autowire \"Greeter\". Method Greeter::invoke() does not exist");

    let err = autowire_error(
        helper
            .autowire(Target::method(Arc::new(Hello), "greet"))
            .call()
            .unwrap_err(),
    );
    assert_eq!(err.target(), std::any::type_name::<Hello>());
}

#[test]
fn object_of_unknown_class() {
    let (_, helper) = fixture();
    let err = autowire_error(helper.autowire(Target::invoke(Arc::new(12345u32))).call().unwrap_err());
    assert_eq!(err.target(), "u32");
}

#[test]
fn missing_dependency_is_not_wrapped() {
    struct Unregistered;

    let (_, helper) = fixture();
    let thunk = helper.autowire(Target::function(|_: Dep<Unregistered>| Arc::new(())));
    match thunk.call() {
        Err(WiringError::NotFound(id)) => assert_eq!(id, service_id::<Unregistered>()),
        other => panic!("expected a missing service, got {other:?}"),
    }
}

#[test]
fn nested_autowire_error_keeps_its_target() {
    let (container, helper) = fixture();
    let autowired = ContainerAutowire::with_factory(
        container.clone(),
        Box::new(AutowireHelperFactory::with_classes(container, Arc::new(ClassRegistry::new()))),
    );
    autowired.register_target(service_id::<Plain>(), "Plain", false).unwrap();

    let thunk = helper.autowire(Target::function(|_: Dep<Plain>| Arc::new(())));
    let err = autowire_error(thunk.call().unwrap_err());
    assert_eq!(err.target(), "Plain");
}

#[test]
fn result_type_mismatch() {
    let (_, helper) = fixture();
    let err = helper.autowire(Target::class("Plain")).call_as::<Hello>().unwrap_err();
    let err = autowire_error(err);
    assert_eq!(err.target(), "Plain");
    assert!(err.message().contains("Expected a value of type"));

    let thunk = helper.autowire(Target::named_function("factory", || Arc::new(1u8)));
    assert_eq!(thunk.target(), "factory");
    let err = autowire_error(thunk.call_as::<String>().unwrap_err());
    assert_eq!(err.target(), "factory");
}

#[test]
fn fresh_resolution_on_each_call() {
    let (container, helper) = fixture();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let thunk = helper.autowire(Target::function(move |settings: Dep<Settings>| {
        counter.fetch_add(1, Ordering::SeqCst);
        Arc::new(settings.name.clone())
    }));

    assert_eq!(thunk.call_as::<String>().unwrap().as_str(), "world");
    container
        .instance(service_id::<Settings>(), settings("moon"), true)
        .unwrap();
    assert_eq!(thunk.call_as::<String>().unwrap().as_str(), "moon");
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    // every call builds a new instance
    let class = helper.autowire(Target::class("Greeter"));
    let (a, b) = (class.call().unwrap(), class.call().unwrap());
    assert!(!a.ptr_eq(&b));
}

#[test]
fn global_registry() {
    struct Registered;

    ClassRegistry::global().register(
        Class::builder::<Registered>()
            .constructor(|| Registered)
            .build(),
    );
    let container: Arc<dyn Container> = Arc::new(ServiceContainer::new());
    let helper = AutowireHelper::new(container);
    let thunk = helper.autowire(Target::class(std::any::type_name::<Registered>()));
    assert!(thunk.call().unwrap().is::<Registered>());
}

#[test]
fn helper_factory_creates_bound_helpers() {
    let (container, _) = fixture();
    let factory = AutowireHelperFactory::new(container);
    let thunk = factory
        .create()
        .autowire(Target::function(|s: Dep<Suffix>| Arc::new(s.text)));
    assert_eq!(*thunk.call_as::<&'static str>().unwrap(), "!");
}
