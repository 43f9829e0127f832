//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! command line flags + OVN_EXPORTER_* environment
//!     → loader.rs (clap parse, flag > env > default)
//!     → validation.rs (semantic checks)
//!     → ExporterConfig (validated, immutable)
//!     → passed by value into the coordinator and registrars
//! ```
//!
//! # Design Decisions
//! - Config is immutable once resolved; there is no reload
//! - All settings have defaults so the exporter starts with no flags
//! - Validation separates syntactic (clap) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, Cli, ConfigError, ENV_PREFIX};
pub use schema::{bind_address, CollectionConfig, ExporterConfig, ListenerConfig, TimeoutConfig};
pub use validation::ValidationError;
