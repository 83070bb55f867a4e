pub mod error;
pub mod profile;

pub use error::{ConfigError, Result};
pub use profile::{
    CONFIG_FILE_NAME, LoadedConfig, default_base_dir, load, parse, resolve_path, to_toml, validate,
};
