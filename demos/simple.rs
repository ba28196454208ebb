use std::sync::Arc;
use std::time::SystemTime;

use autowire::*;
use tracing_subscriber::EnvFilter;

// Define regular traits and implementor structs

trait Logger: Send + Sync {
    fn log(&self, content: &str);
}

trait DateLogger: Send + Sync {
    fn log_date(&self);
}

struct LoggerImpl;

impl Logger for LoggerImpl {
    fn log(&self, content: &str) {
        println!("{}", content);
    }
}

struct DateLoggerImpl {
    logger: Arc<dyn Logger>,
}

impl DateLoggerImpl {
    fn new(logger: Dep<dyn Logger>) -> Self {
        Self {
            logger: logger.into_inner(),
        }
    }

    fn report(&self, _: ()) -> Arc<String> {
        Arc::new("reported".to_string())
    }
}

impl DateLogger for DateLoggerImpl {
    fn log_date(&self) {
        let now = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or_default();
        self.logger.log(&format!("{}s since epoch", now.as_secs()));
    }
}

struct Prefixed {
    inner: Arc<dyn Logger>,
}

impl Logger for Prefixed {
    fn log(&self, content: &str) {
        self.inner.log(&format!("[demo] {}", content));
    }
}

fn main() -> Result<(), WiringError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Describe the class which can be built from its name
    ClassRegistry::global().register(
        Class::builder::<DateLoggerImpl>()
            .name("DateLogger")
            .constructor(DateLoggerImpl::new)
            .method("report", DateLoggerImpl::report)
            .build(),
    );

    let container = ContainerAutowire::new(Arc::new(ServiceContainer::new()));

    container.register_fn(
        service_id::<dyn Logger>(),
        || -> Arc<dyn Logger> { Arc::new(LoggerImpl) },
        false,
    )?;
    container.decorate_fn(
        service_id::<dyn Logger>(),
        |inner: Dep<dyn Logger>| -> Arc<dyn Logger> {
            Arc::new(Prefixed {
                inner: inner.into_inner(),
            })
        },
        0,
    )?;
    container.register_target("date_logger", "DateLogger", false)?;
    container.register_target("report", "DateLogger::report", false)?;

    let logger = container
        .get("date_logger")?
        .downcast::<DateLoggerImpl>()
        .ok_or_else(|| AutowireError::new("date_logger", "unexpected service type"))?;
    logger.log_date();

    if let Some(report) = container.get("report")?.downcast::<String>() {
        println!("{}", report);
    }

    Ok(())
}
