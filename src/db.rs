use chrono::Local;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef};
use rusqlite::{params, Connection, Row, ToSql};

use crate::models::{EventKind, EventRecord, NewEvent};
use crate::utils;

pub struct Store {
    conn: Connection,
}

/// Optional filters for the admin search form. Absent fields match
/// everything.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub start_date: Option<String>,
    pub kind: Option<EventKind>,
    pub entry_cost: Option<String>,
}

impl Store {
    pub fn open_default() -> rusqlite::Result<Self> {
        let path = utils::database_path();
        utils::ensure_parent(&path);
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    pub fn open_in_memory() -> rusqlite::Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> rusqlite::Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS events(
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                thumbnail TEXT NOT NULL DEFAULT '',
                title TEXT NOT NULL,
                start_date TEXT NOT NULL,
                start_time TEXT,
                event_kind TEXT NOT NULL,
                location TEXT NOT NULL,
                entry_cost TEXT NOT NULL DEFAULT '',
                description TEXT NOT NULL DEFAULT '',
                ticket_url TEXT NOT NULL DEFAULT '',
                details_url TEXT NOT NULL DEFAULT ''
            );
            CREATE INDEX IF NOT EXISTS idx_events_title_date
                ON events(title, start_date);",
        )?;
        Ok(())
    }

    /// Dedup gate: does a row with this exact (title, start_date) pair
    /// already exist?
    pub fn exists(&self, title: &str, start_date: &str) -> rusqlite::Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM events WHERE title = ?1 AND start_date = ?2",
            params![title, start_date],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    pub fn insert(&self, event: &NewEvent) -> rusqlite::Result<i64> {
        self.conn.execute(
            "INSERT INTO events (thumbnail, title, start_date, start_time, event_kind,
                                 location, entry_cost, description, ticket_url, details_url)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                event.thumbnail,
                event.title,
                event.start_date,
                event.start_time,
                event.kind,
                event.location,
                event.entry_cost,
                event.description,
                event.ticket_url,
                event.details_url,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get(&self, id: i64) -> rusqlite::Result<EventRecord> {
        self.conn.query_row(
            &format!("{SELECT_COLUMNS} WHERE id = ?1"),
            params![id],
            map_event,
        )
    }

    pub fn list(&self) -> rusqlite::Result<Vec<EventRecord>> {
        self.query_events(
            &format!("{SELECT_COLUMNS} ORDER BY start_date ASC, start_time ASC"),
            &[],
        )
    }

    /// Events dated today or later, soonest first.
    pub fn list_upcoming(&self) -> rusqlite::Result<Vec<EventRecord>> {
        let today = today_string();
        self.query_events(
            &format!(
                "{SELECT_COLUMNS} WHERE start_date >= ?1 ORDER BY start_date ASC, start_time ASC"
            ),
            &[&today],
        )
    }

    /// Events dated before today, most recent first.
    pub fn list_past(&self) -> rusqlite::Result<Vec<EventRecord>> {
        let today = today_string();
        self.query_events(
            &format!(
                "{SELECT_COLUMNS} WHERE start_date < ?1 ORDER BY start_date DESC, start_time DESC"
            ),
            &[&today],
        )
    }

    /// Full-row update, admin edit form semantics. The id is immutable.
    pub fn update(&self, id: i64, event: &NewEvent) -> rusqlite::Result<usize> {
        self.conn.execute(
            "UPDATE events SET thumbnail = ?1, title = ?2, start_date = ?3, start_time = ?4,
                               event_kind = ?5, location = ?6, entry_cost = ?7,
                               description = ?8, ticket_url = ?9, details_url = ?10
             WHERE id = ?11",
            params![
                event.thumbnail,
                event.title,
                event.start_date,
                event.start_time,
                event.kind,
                event.location,
                event.entry_cost,
                event.description,
                event.ticket_url,
                event.details_url,
                id,
            ],
        )
    }

    pub fn delete(&self, id: i64) -> rusqlite::Result<usize> {
        self.conn
            .execute("DELETE FROM events WHERE id = ?1", params![id])
    }

    pub fn search(&self, filter: &EventFilter) -> rusqlite::Result<Vec<EventRecord>> {
        let mut sql = format!("{SELECT_COLUMNS} WHERE 1=1");
        let mut values: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(ref date) = filter.start_date {
            sql.push_str(&format!(" AND start_date = ?{}", values.len() + 1));
            values.push(Box::new(date.clone()));
        }
        if let Some(kind) = filter.kind {
            sql.push_str(&format!(" AND event_kind = ?{}", values.len() + 1));
            values.push(Box::new(kind));
        }
        if let Some(ref cost) = filter.entry_cost {
            sql.push_str(&format!(" AND entry_cost LIKE ?{}", values.len() + 1));
            values.push(Box::new(format!("%{cost}%")));
        }
        sql.push_str(" ORDER BY start_date ASC, start_time ASC");

        let refs: Vec<&dyn ToSql> = values.iter().map(|value| value.as_ref()).collect();
        self.query_events(&sql, &refs)
    }

    fn query_events(&self, sql: &str, params: &[&dyn ToSql]) -> rusqlite::Result<Vec<EventRecord>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, map_event)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }
}

const SELECT_COLUMNS: &str = "SELECT id, thumbnail, title, start_date, start_time, event_kind,
            location, entry_cost, description, ticket_url, details_url FROM events";

fn map_event(row: &Row<'_>) -> rusqlite::Result<EventRecord> {
    Ok(EventRecord {
        id: row.get(0)?,
        thumbnail: row.get(1)?,
        title: row.get(2)?,
        start_date: row.get(3)?,
        start_time: row.get(4)?,
        kind: row.get(5)?,
        location: row.get(6)?,
        entry_cost: row.get(7)?,
        description: row.get(8)?,
        ticket_url: row.get(9)?,
        details_url: row.get(10)?,
    })
}

fn today_string() -> String {
    Local::now().date_naive().format("%Y-%m-%d").to_string()
}

impl ToSql for EventKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for EventKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_str().and_then(|text| {
            EventKind::parse(text)
                .ok_or_else(|| FromSqlError::Other(format!("unknown event kind: {text}").into()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(title: &str, start_date: &str) -> NewEvent {
        NewEvent {
            thumbnail: String::new(),
            title: title.to_string(),
            start_date: start_date.to_string(),
            start_time: Some("19:30".to_string()),
            kind: EventKind::SingleDay,
            location: "Dice Saloon, Brighton".to_string(),
            entry_cost: "£5".to_string(),
            description: "An evening of open gaming.".to_string(),
            ticket_url: String::new(),
            details_url: String::new(),
        }
    }

    #[test]
    fn insert_then_exists() {
        let store = Store::open_in_memory().expect("open store");
        assert!(!store.exists("Club Night", "2024-12-05").expect("probe"));
        let id = store
            .insert(&sample("Club Night", "2024-12-05"))
            .expect("insert");
        assert!(id > 0);
        assert!(store.exists("Club Night", "2024-12-05").expect("probe"));
        // Same title on a different date is a different event.
        assert!(!store.exists("Club Night", "2024-12-12").expect("probe"));
    }

    #[test]
    fn get_round_trips_all_fields() {
        let store = Store::open_in_memory().expect("open store");
        let mut event = sample("League Final", "2025-03-01");
        event.kind = EventKind::MultiDay;
        event.thumbnail = "/media/final.jpg".to_string();
        let id = store.insert(&event).expect("insert");

        let stored = store.get(id).expect("get");
        assert_eq!(stored.title, "League Final");
        assert_eq!(stored.start_date, "2025-03-01");
        assert_eq!(stored.start_time.as_deref(), Some("19:30"));
        assert_eq!(stored.kind, EventKind::MultiDay);
        assert_eq!(stored.thumbnail, "/media/final.jpg");
    }

    #[test]
    fn list_orders_by_date_then_time() {
        let store = Store::open_in_memory().expect("open store");
        let mut late = sample("Late", "2025-01-10");
        late.start_time = Some("20:00".to_string());
        let mut early = sample("Early", "2025-01-10");
        early.start_time = Some("09:00".to_string());
        let earlier_date = sample("Earlier date", "2025-01-02");
        store.insert(&late).expect("insert");
        store.insert(&early).expect("insert");
        store.insert(&earlier_date).expect("insert");

        let titles: Vec<String> = store
            .list()
            .expect("list")
            .into_iter()
            .map(|event| event.title)
            .collect();
        assert_eq!(titles, vec!["Earlier date", "Early", "Late"]);
    }

    #[test]
    fn upcoming_and_past_split_on_today() {
        let store = Store::open_in_memory().expect("open store");
        store.insert(&sample("Ancient", "1999-01-01")).expect("insert");
        store.insert(&sample("Far off", "9999-01-01")).expect("insert");

        let upcoming = store.list_upcoming().expect("upcoming");
        assert_eq!(upcoming.len(), 1);
        assert_eq!(upcoming[0].title, "Far off");

        let past = store.list_past().expect("past");
        assert_eq!(past.len(), 1);
        assert_eq!(past[0].title, "Ancient");
    }

    #[test]
    fn update_replaces_fields_and_delete_removes() {
        let store = Store::open_in_memory().expect("open store");
        let id = store.insert(&sample("Draft", "2025-06-01")).expect("insert");

        let mut edited = sample("Draft night", "2025-06-02");
        edited.entry_cost = "Free".to_string();
        assert_eq!(store.update(id, &edited).expect("update"), 1);

        let stored = store.get(id).expect("get");
        assert_eq!(stored.title, "Draft night");
        assert_eq!(stored.start_date, "2025-06-02");
        assert_eq!(stored.entry_cost, "Free");

        assert_eq!(store.delete(id).expect("delete"), 1);
        assert!(store.get(id).is_err());
    }

    #[test]
    fn search_applies_each_filter() {
        let store = Store::open_in_memory().expect("open store");
        let mut tournament = sample("Tournament", "2025-02-01");
        tournament.kind = EventKind::MultiDay;
        tournament.entry_cost = "£25 entry".to_string();
        store.insert(&tournament).expect("insert");
        store.insert(&sample("Casual", "2025-02-08")).expect("insert");

        let all = store.search(&EventFilter::default()).expect("search");
        assert_eq!(all.len(), 2);

        let by_date = store
            .search(&EventFilter {
                start_date: Some("2025-02-01".to_string()),
                ..Default::default()
            })
            .expect("search");
        assert_eq!(by_date.len(), 1);
        assert_eq!(by_date[0].title, "Tournament");

        let by_kind = store
            .search(&EventFilter {
                kind: Some(EventKind::MultiDay),
                ..Default::default()
            })
            .expect("search");
        assert_eq!(by_kind.len(), 1);

        let by_cost = store
            .search(&EventFilter {
                entry_cost: Some("25".to_string()),
                ..Default::default()
            })
            .expect("search");
        assert_eq!(by_cost.len(), 1);
        assert_eq!(by_cost[0].title, "Tournament");
    }
}
