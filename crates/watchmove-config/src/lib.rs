pub mod config;
pub mod paths;

pub use config::{Config, FilesConfig, LookupConfig, OutputConfig, TraktConfig, TRAKT_CLIENT_ID_ENV};
pub use paths::{PathManager, LOCAL_CONFIG_FILE};
