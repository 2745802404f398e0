//! Engine Runtime Core
//!
//! The runner contract, registry, discovery, priority resolution, engine
//! manager, request coordinator, reload manager, settings store, and
//! service-state publisher — C1 through C9. `engine-service` wires these
//! together behind an HTTP ingress.

pub mod cancel;
pub mod contract;
pub mod coordinator;
pub mod discovery;
pub mod manager;
pub mod priority;
pub mod registry;
pub mod reload;
pub mod runners;
pub mod settings_store;
pub mod state_publisher;

pub use cancel::CancelToken;
pub use contract::{ResultStream, RunnerInstance, Validation};
pub use coordinator::Coordinator;
pub use discovery::{discover, reinitialize, CatalogEntry, DefaultHardwareProbe, DiscoveryReport, Factory, HardwareProbe};
pub use manager::EngineManager;
pub use registry::Registry;
pub use reload::{ReloadManager, ReloadResult};
pub use settings_store::{SettingsStore, SettingsStoreError};
pub use state_publisher::StatePublisher;
