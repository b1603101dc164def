pub mod fetcher;
pub mod parser;
pub mod scraper;
pub mod store;

pub use crate::domain::model::{DelayRange, EmailStore, ListingPage};
pub use crate::domain::ports::{ConfigProvider, Storage};
pub use crate::utils::error::Result;
