use serde::{Deserialize, Serialize};

/// Whether the listing ran a single day or spanned two distinct dates.
/// Derived during extraction, never set independently.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    SingleDay,
    MultiDay,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::SingleDay => "single_day",
            EventKind::MultiDay => "multi_day",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "single_day" => Some(EventKind::SingleDay),
            "multi_day" => Some(EventKind::MultiDay),
            _ => None,
        }
    }
}

/// An event as extracted by the ingest pipeline or entered through the
/// admin forms, before the store has assigned it an id.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct NewEvent {
    pub thumbnail: String,
    pub title: String,
    pub start_date: String, // YYYY-MM-DD, or opaque pass-through, or ""
    pub start_time: Option<String>,
    pub kind: EventKind,
    pub location: String,
    pub entry_cost: String,
    pub description: String,
    pub ticket_url: String,
    pub details_url: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct EventRecord {
    pub id: i64,
    pub thumbnail: String,
    pub title: String,
    pub start_date: String,
    pub start_time: Option<String>,
    pub kind: EventKind,
    pub location: String,
    pub entry_cost: String,
    pub description: String,
    pub ticket_url: String,
    pub details_url: String,
}
