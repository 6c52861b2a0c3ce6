pub mod registry;

pub use registry::{ProviderInfo, ProviderRegistry, RegistryError, Resolution};
