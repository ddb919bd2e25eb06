//! Configuration for a Root Builder instance.
//!
//! Two layers:
//! - Instance config (`rootbuilder.toml`): where the target, packages and
//!   engine storage live. Read-only to the engine.
//! - Settings (`settings.json` in engine storage): the user-facing
//!   `enabled` and `mode` switches.

pub mod parser;
pub mod paths;
pub mod schema;
pub mod settings;

pub use parser::{parse_instance_toml, parse_instance_toml_str, to_toml};
pub use paths::{StorageLayout, default_storage_root, storage_key};
pub use schema::InstanceConfig;
pub use settings::{Settings, SettingsStore};
