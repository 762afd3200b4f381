pub mod base;
pub mod extract;
pub mod normalize;
pub mod thumbs;

use scraper::Html;
use thiserror::Error;

use crate::config::AppConfig;
use crate::db::Store;
use crate::media::MediaStore;
use crate::models::NewEvent;

/// Fatal-to-run failures. Anything that goes wrong for a single listing
/// becomes a warning in the summary instead.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Error fetching the events page: {0}")]
    Fetch(String),
    #[error("The events page returned an empty response.")]
    EmptyBody,
    #[error("No events found on the page.")]
    NoEvents,
}

/// Aggregate outcome of one scrape run.
#[derive(Debug, Default, Clone)]
pub struct RunSummary {
    pub added: usize,
    pub unchanged: usize,
    pub errors: Vec<String>,
}

impl RunSummary {
    pub fn message(&self) -> String {
        let mut message = format!(
            "{} new events added, {} events unchanged.",
            self.added, self.unchanged
        );
        if !self.errors.is_empty() {
            message.push_str(" Errors: ");
            message.push_str(&self.errors.join(" | "));
        }
        message
    }
}

pub struct Scraper<'a> {
    config: &'a AppConfig,
    store: &'a Store,
    media: &'a MediaStore,
    client: reqwest::blocking::Client,
}

impl<'a> Scraper<'a> {
    pub fn new(
        config: &'a AppConfig,
        store: &'a Store,
        media: &'a MediaStore,
    ) -> anyhow::Result<Self> {
        let client = base::build_client(config.http_timeout_secs)?;
        Ok(Self {
            config,
            store,
            media,
            client,
        })
    }

    /// One full run: fetch the page, then ingest it.
    pub fn run(&self) -> Result<RunSummary, ScrapeError> {
        let html = base::fetch_html(&self.client, &self.config.events_url)
            .map_err(|err| ScrapeError::Fetch(format!("{err:#}")))?;
        if html.trim().is_empty() {
            return Err(ScrapeError::EmptyBody);
        }
        self.ingest_document(&html)
    }

    /// Drive the per-listing pipeline over an already-fetched page. Split
    /// from `run` so fixture documents can exercise the loop.
    pub fn ingest_document(&self, html: &str) -> Result<RunSummary, ScrapeError> {
        let document = Html::parse_document(html);
        let containers = extract::containers(&document);
        if containers.is_empty() {
            return Err(ScrapeError::NoEvents);
        }

        let mut summary = RunSummary::default();
        for card in containers {
            let title = match extract::title(&card) {
                Some(title) => title,
                None => {
                    summary
                        .errors
                        .push("An event with missing title was skipped.".to_string());
                    continue;
                }
            };

            let schedule = extract::schedule(&card);

            // Dedup gate sits as early as the key allows: right after
            // title and start date, before any asset work.
            match self.store.exists(&title, &schedule.start_date) {
                Ok(true) => {
                    summary.unchanged += 1;
                    continue;
                }
                Ok(false) => {}
                Err(err) => {
                    eprintln!("existence probe failed for '{title}': {err}");
                    summary
                        .errors
                        .push(format!("Failed to check for existing event '{title}'."));
                    continue;
                }
            }

            let location = match extract::location(&card) {
                Some(location) => location,
                None => {
                    summary
                        .errors
                        .push(format!("Event '{title}' has no location."));
                    continue;
                }
            };

            let entry_cost = extract::entry_cost(&card).unwrap_or_default();
            let description = extract::description(&card).unwrap_or_default();
            let ticket_url = extract::labeled_link(&card, &self.config.events_url, "buy now")
                .unwrap_or_default();
            let details_url = extract::labeled_link(&card, &self.config.events_url, "read more")
                .unwrap_or_default();

            let candidate = extract::thumbnail_candidate(&card)
                .and_then(|href| base::absolute_url(&self.config.events_url, Some(href)))
                .unwrap_or_default();
            let (thumbnail, warning) =
                thumbs::resolve(&self.client, self.media, &candidate, &title);
            if let Some(warning) = warning {
                summary.errors.push(warning);
            }

            let event = NewEvent {
                thumbnail,
                title,
                start_date: schedule.start_date,
                start_time: schedule.start_time,
                kind: schedule.kind,
                location,
                entry_cost,
                description,
                ticket_url,
                details_url,
            };

            match self.store.insert(&event) {
                Ok(_) => summary.added += 1,
                Err(err) => {
                    eprintln!("insert failed for '{}': {err}", event.title);
                    summary
                        .errors
                        .push(format!("Failed to insert event '{}'.", event.title));
                }
            }
        }

        Ok(summary)
    }
}
