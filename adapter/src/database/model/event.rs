use chrono::NaiveDate;
use kernel::model::{event::Event, id::EventId};
use sqlx::FromRow;

#[derive(FromRow)]
pub struct EventRow {
    pub event_id: EventId,
    pub name: String,
    pub slug: String,
    pub date: NaiveDate,
    pub location: String,
    pub homepage: String,
}

impl From<EventRow> for Event {
    fn from(value: EventRow) -> Self {
        let EventRow {
            event_id,
            name,
            slug,
            date,
            location,
            homepage,
        } = value;
        Event {
            id: event_id,
            name,
            slug,
            date,
            location,
            homepage,
        }
    }
}
