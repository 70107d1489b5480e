//! Text rendering of events.

use serde_json::Value;

use crate::providers::{fields, EventHit};

/// Separator between events in multi-result answers.
const EVENT_SEPARATOR: &str = "\n\n---\n\n";

/// Render one event as a short card.
pub fn format_event(hit: &EventHit) -> String {
    let title = hit.title().unwrap_or("CineConcerts Event");
    let date = hit.text(fields::EVENT_DATE).unwrap_or("TBA");

    let location = [fields::VENUE, fields::CITY, fields::STATE, fields::COUNTRY]
        .iter()
        .filter_map(|f| hit.text(f))
        .collect::<Vec<_>>()
        .join(", ");

    let mut lines = vec![format!("**{}**", title), format!("Date: {}", date)];
    if !location.is_empty() {
        lines.push(format!("Location: {}", location));
    }
    if let Some(code) = hit.show_code() {
        lines.push(format!("Show Code: {}", code));
    }
    if let Some(poster) = hit.text(fields::POSTER) {
        lines.push(format!("Poster: {}", poster));
    }
    if let Some(tickets) = hit.text(fields::BUY_TICKETS) {
        lines.push(format!("Tickets: {}", tickets));
    }

    lines.join("\n")
}

/// Render a list of events separated by horizontal rules.
pub fn format_events(hits: &[EventHit]) -> String {
    hits.iter()
        .map(format_event)
        .collect::<Vec<_>>()
        .join(EVENT_SEPARATOR)
}

/// Render every public field of an event, in index order.
pub fn format_details(hit: &EventHit, show_code: &str) -> String {
    let body = hit
        .public_fields()
        .map(|(key, value)| format!("**{}**: {}", key, display_value(value)))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Show details for \"{}\":\n\n{}",
        hit.title().unwrap_or(show_code),
        body
    )
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
