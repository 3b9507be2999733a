use crate::model::id::EventId;
use chrono::NaiveDate;

/// The gathering projects are registered for.
#[derive(Debug, Clone)]
pub struct Event {
    pub id: EventId,
    pub name: String,
    pub slug: String,
    pub date: NaiveDate,
    pub location: String,
    pub homepage: String,
}
