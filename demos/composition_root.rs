/// Example: Registering application services at startup
///
/// Startup code fills the process-wide locator once; view models and other
/// application code later pull their collaborators from it by contract.
///
/// Run with `RUST_LOG=instance_locator=debug` to see the locator events.

use instance_locator::{InstanceLocator, Locate, MetricsObserver};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

// ===== Contracts =====

pub trait ModelFactory: Send + Sync {
    fn create(&self, kind: &str) -> String;
}

pub trait EntityService: Send + Sync {
    fn load(&self, id: u32) -> String;
}

pub trait MetaDataService: Send + Sync {
    fn describe(&self, kind: &str) -> String;
}

// ===== Implementations =====

#[derive(Default)]
pub struct DefaultModelFactory;

impl ModelFactory for DefaultModelFactory {
    fn create(&self, kind: &str) -> String {
        format!("new {}", kind)
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://app.db".to_string(),
        }
    }
}

pub struct SqlEntityService {
    config: Arc<AppConfig>,
    models: Arc<dyn ModelFactory>,
}

impl EntityService for SqlEntityService {
    fn load(&self, id: u32) -> String {
        format!("{} #{} from {}", self.models.create("Entity"), id, self.config.database_url)
    }
}

pub struct StaticMetaData;

impl MetaDataService for StaticMetaData {
    fn describe(&self, kind: &str) -> String {
        format!("{} (3 fields)", kind)
    }
}

// ===== Composition Root =====

fn initialize_instances(locator: &'static InstanceLocator) {
    locator.register_default_instance::<AppConfig>();
    locator.register_instance::<dyn ModelFactory>(Arc::new(DefaultModelFactory));
    locator.register_instance::<dyn MetaDataService>(Arc::new(StaticMetaData));

    // Lazy: built on first use, resolving its own collaborators
    locator.register_factory::<dyn EntityService, _>(move || {
        Arc::new(SqlEntityService {
            config: locator.get_required::<AppConfig>(),
            models: locator.get_required::<dyn ModelFactory>(),
        })
    });
}

// ===== Application Code =====

struct EntityViewModel {
    entities: Arc<dyn EntityService>,
    meta: Arc<dyn MetaDataService>,
}

impl EntityViewModel {
    fn from_locator(locator: &dyn instance_locator::LocateCore) -> Option<Self> {
        Some(Self {
            entities: locator.get_instance::<dyn EntityService>()?,
            meta: locator.get_instance::<dyn MetaDataService>()?,
        })
    }

    fn title(&self, id: u32) -> String {
        format!("{} | {}", self.entities.load(id), self.meta.describe("Entity"))
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let locator = InstanceLocator::current();
    let metrics = Arc::new(MetricsObserver::new());
    locator.add_observer(metrics.clone());

    initialize_instances(locator);
    info!(entries = locator.total_instances(), "services registered");

    match EntityViewModel::from_locator(locator) {
        Some(view_model) => {
            info!("{}", view_model.title(1));
            info!("{}", view_model.title(2));
        }
        None => info!("view model dependencies unavailable"),
    }

    // Unknown services degrade to None plus a warning
    let missing = locator.get_instance::<std::time::Instant>();
    info!(found = missing.is_some(), "optional clock lookup");

    locator.clear_instances();
    info!(metrics = ?metrics.snapshot(), "shutdown");
}
