//! Event workbook discovery

use std::collections::BTreeMap;

use log::{debug, info};

use super::columns::normalize_text;
use crate::api::SheetGateway;
use crate::config::EventsConfig;
use crate::error::Result;
use crate::session::EventWorkbook;

const TITLE_PREFIX: &str = "Monitoração - ";

/// Workbook title without the "Monitoração - " prefix (any case or accents)
pub fn display_name(title: &str) -> String {
    let prefix_len = TITLE_PREFIX.chars().count();
    let head: String = title.chars().take(prefix_len).collect();
    if normalize_text(&head) == normalize_text(TITLE_PREFIX) {
        title.chars().skip(prefix_len).collect::<String>().trim().to_string()
    } else {
        title.trim().to_string()
    }
}

/// Visible workbooks whose title contains the event keyword, merged with the
/// configured ones. Configured entries win on a name clash. Sorted by name.
pub async fn discover_events(
    gateway: &dyn SheetGateway,
    config: &EventsConfig,
) -> Result<Vec<EventWorkbook>> {
    let keyword = normalize_text(&config.keyword);
    let mut events: BTreeMap<String, String> = BTreeMap::new();

    for file in gateway.list_workbooks().await? {
        if normalize_text(&file.name).contains(&keyword) {
            debug!("Event workbook: {} ({})", file.name, file.id);
            events.insert(display_name(&file.name), file.id);
        }
    }
    for (name, id) in &config.workbooks {
        events.insert(name.clone(), id.clone());
    }

    info!("Found {} event workbook(s)", events.len());
    Ok(events
        .into_iter()
        .map(|(name, id)| EventWorkbook { id, name })
        .collect())
}

/// Pick an event by exact id, then by name (exact, then unique partial match)
pub fn select_event<'a>(events: &'a [EventWorkbook], query: &str) -> Option<&'a EventWorkbook> {
    if let Some(event) = events.iter().find(|e| e.id == query) {
        return Some(event);
    }
    let wanted = normalize_text(query);
    if let Some(event) = events.iter().find(|e| normalize_text(&e.name) == wanted) {
        return Some(event);
    }
    let mut partial = events
        .iter()
        .filter(|e| normalize_text(&e.name).contains(&wanted));
    match (partial.next(), partial.next()) {
        (Some(event), None) => Some(event),
        _ => None,
    }
}
