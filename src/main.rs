use anyhow::{Context, Result};

use events_scrape::{AppConfig, MediaStore, Scraper, Store};

/// Manual "run now" trigger. The weekly cadence comes from an external
/// scheduler invoking this binary.
fn main() -> Result<()> {
    let config = AppConfig::load_default();
    let store = Store::open_default().context("unable to open events database")?;
    let media = MediaStore::open_default(&config.media_base_url)
        .context("unable to open media store")?;

    let scraper = Scraper::new(&config, &store, &media)?;
    match scraper.run() {
        Ok(summary) => println!("{}", summary.message()),
        Err(err) => {
            println!("{err}");
            std::process::exit(1);
        }
    }
    Ok(())
}
