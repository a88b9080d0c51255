//! Layered configuration store.
//!
//! Loads a YAML or JSON file together with its `-local` override and any
//! included files, resolves `extends` inheritance, and exposes the merged tree
//! through dotted paths such as `drivers.mock.option`. Reads on a loaded
//! [`Config`] can be overridden by environment variables.
//!
//! ```no_run
//! use pathed_config::Config;
//!
//! let config = Config::load("config/config.yml")?;
//! let timeout = config.get_as::<u64>("drivers.remote.timeout")?;
//! # Ok::<(), pathed_config::ConfigError>(())
//! ```

pub mod config;
pub mod error;
pub mod format;
pub mod logging;
pub mod paths;
pub mod tree;

pub use config::{Config, ConfigLoader};
pub use error::{ConfigError, ConfigResult, ErrorCode};
pub use format::OutputFormat;
pub use paths::KeyPath;
pub use tree::{PathRead, PathedTree};
