//! Turning a free-text support request into a ticket payload.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

const TITLE_MAX_CHARS: usize = 50;

/// GLPI ticket type for incidents.
pub const TICKET_TYPE_INCIDENT: i64 = 1;
/// GLPI ticket status "New".
pub const TICKET_STATUS_NEW: i64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketCategory {
    Uncategorized,
    PrintersAndScanners,
    MonitorsAndDisplays,
    Network,
}

impl TicketCategory {
    /// First matching keyword group wins.
    pub fn detect(message: &str) -> Self {
        let lower = message.to_lowercase();
        let has_any = |words: &[&str]| words.iter().any(|w| lower.contains(w));
        if has_any(&["printer", "printing", "scanner"]) {
            TicketCategory::PrintersAndScanners
        } else if has_any(&["monitor", "screen", "display"]) {
            TicketCategory::MonitorsAndDisplays
        } else if has_any(&["network", "internet", "wifi", "connection"]) {
            TicketCategory::Network
        } else {
            TicketCategory::Uncategorized
        }
    }

    /// `itilcategories_id` value for this category.
    pub fn id(self) -> i64 {
        match self {
            TicketCategory::Uncategorized => 0,
            TicketCategory::PrintersAndScanners => 1,
            TicketCategory::MonitorsAndDisplays => 2,
            TicketCategory::Network => 3,
        }
    }
}

/// The `input` object sent to `POST /Ticket`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TicketDraft {
    pub name: String,
    pub content: String,
    pub priority: i64,
    #[serde(rename = "type")]
    pub ticket_type: i64,
    pub status: i64,
    pub itilcategories_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locations_id: Option<i64>,
}

impl TicketDraft {
    pub fn from_message(message: &str, priority: i64) -> Self {
        Self {
            name: ticket_title(message),
            content: message.to_string(),
            priority,
            ticket_type: TICKET_TYPE_INCIDENT,
            status: TICKET_STATUS_NEW,
            itilcategories_id: TicketCategory::detect(message).id(),
            locations_id: room_number(message),
        }
    }
}

fn ticket_title(message: &str) -> String {
    let mut chars = message.chars();
    let head: String = chars.by_ref().take(TITLE_MAX_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

fn room_number(message: &str) -> Option<i64> {
    static ROOM: OnceLock<Regex> = OnceLock::new();
    let re = ROOM.get_or_init(|| Regex::new(r"room\s+(\d+)").expect("valid room pattern"));
    let lower = message.to_lowercase();
    re.captures(&lower)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<i64>().ok())
        .filter(|n| *n > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_messages_keep_their_title() {
        let draft = TicketDraft::from_message("Printer jam on floor 2", 3);
        assert_eq!(draft.name, "Printer jam on floor 2");
        assert_eq!(draft.content, "Printer jam on floor 2");
        assert_eq!(draft.itilcategories_id, 1);
        assert_eq!(draft.ticket_type, 1);
        assert_eq!(draft.status, 1);
        assert_eq!(draft.locations_id, None);
    }

    #[test]
    fn long_messages_are_truncated_to_fifty_chars() {
        let message = "a".repeat(51);
        let draft = TicketDraft::from_message(&message, 3);
        assert_eq!(draft.name, format!("{}...", "a".repeat(50)));

        let exact = "b".repeat(50);
        assert_eq!(TicketDraft::from_message(&exact, 3).name, exact);
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let message = "é".repeat(60);
        let draft = TicketDraft::from_message(&message, 3);
        assert_eq!(draft.name.chars().count(), 53);
    }

    #[test]
    fn category_keywords_are_checked_in_order() {
        assert_eq!(TicketCategory::detect("my SCREEN flickers").id(), 2);
        assert_eq!(TicketCategory::detect("wifi keeps dropping").id(), 3);
        // Printer keywords take precedence over network ones.
        assert_eq!(TicketCategory::detect("network printer offline").id(), 1);
        assert_eq!(TicketCategory::detect("keyboard missing keys").id(), 0);
    }

    #[test]
    fn room_number_becomes_location() {
        let draft = TicketDraft::from_message("Create ticket: projector broken in Room 214", 4);
        assert_eq!(draft.locations_id, Some(214));
        assert_eq!(draft.priority, 4);
        assert_eq!(TicketDraft::from_message("room 0 is cold", 3).locations_id, None);
        assert_eq!(TicketDraft::from_message("restroom is fine", 3).locations_id, None);
    }

    #[test]
    fn location_is_omitted_from_payload_when_absent() {
        let json = serde_json::to_value(TicketDraft::from_message("mouse broken", 3)).unwrap();
        assert!(json.get("locations_id").is_none());
        assert_eq!(json["type"], 1);
    }
}
