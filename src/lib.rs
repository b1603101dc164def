pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliConfig;

pub use config::{storage::LocalStorage, toml_config::TomlConfig, ScraperSettings};
pub use core::scraper::MoodleScraper;
pub use domain::model::{DelayRange, EmailStore, MOODLE_SOURCE_KEY};
pub use utils::error::{Result, ScrapeError};
