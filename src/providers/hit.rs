//! Event records returned by the search index.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field names used by the event index.
pub mod fields {
    pub const OBJECT_ID: &str = "objectID";
    pub const TITLE: &str = "Title";
    pub const EVENT_DATE: &str = "Event Date";
    pub const SHOW_CODE: &str = "Show Code";
    pub const VENUE: &str = "Venue";
    pub const CITY: &str = "City";
    pub const STATE: &str = "State";
    pub const COUNTRY: &str = "Country";
    pub const COUNTRY_FLAG: &str = "Country Flag";
    pub const POSTER: &str = "Poster";
    pub const BUY_TICKETS: &str = "Buy Tickets";
}

/// One event from the index.
///
/// Kept as the raw field map, in index order, because the detail view shows
/// every field the index carries, not only the ones we know about.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventHit(Map<String, Value>);

impl EventHit {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Non-empty string value of a field.
    pub fn text(&self, field: &str) -> Option<&str> {
        self.0
            .get(field)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    pub fn object_id(&self) -> Option<&str> {
        self.text(fields::OBJECT_ID)
    }

    pub fn title(&self) -> Option<&str> {
        self.text(fields::TITLE)
    }

    pub fn show_code(&self) -> Option<&str> {
        self.text(fields::SHOW_CODE)
    }

    /// Fields meant for display: everything except the object ID and
    /// index-internal `_`-prefixed attributes.
    pub fn public_fields(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0
            .iter()
            .filter(|(k, _)| !k.starts_with('_') && k.as_str() != fields::OBJECT_ID)
    }
}
