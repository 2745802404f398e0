//! Engine Runtime Common Types
//!
//! Shared types used by `engine-core` and `engine-service`: capabilities,
//! requests, results, runner descriptors, settings, and service state.

pub mod capability;
pub mod descriptor;
pub mod error;
pub mod request;
pub mod result;
pub mod settings;
pub mod state;

pub use capability::Capability;
pub use descriptor::{HardwareRequirement, ParameterSchema, ParameterType, RunnerDescriptor, Vendor, Priority};
pub use error::RunnerError;
pub use request::Request;
pub use result::Result;
pub use settings::EngineSettings;
pub use state::ServiceState;
