pub mod config;
pub mod db;
pub mod media;
pub mod models;
pub mod scrape;
pub mod utils;

pub use config::AppConfig;
pub use db::{EventFilter, Store};
pub use media::{Asset, MediaStore};
pub use models::{EventKind, EventRecord, NewEvent};
pub use scrape::{RunSummary, ScrapeError, Scraper};
