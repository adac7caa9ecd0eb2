//! Keyword routing for chat messages.
//!
//! Matching is plain case-insensitive substring search, so `"renew"`
//! contains `"new"`. The order of checks is significant: creation is tested
//! before lookup, and the first match wins.

use std::sync::OnceLock;

use regex::Regex;

const TICKET_WORDS: &[&str] = &["ticket", "issue", "problem"];
const CREATE_WORDS: &[&str] = &["create", "new", "open"];
const QUERY_WORDS: &[&str] = &["show", "get", "find", "search"];

pub const PRIORITY_LOW: i64 = 2;
pub const PRIORITY_MEDIUM: i64 = 3;
pub const PRIORITY_HIGH: i64 = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TicketAction {
    Create { priority: i64 },
    /// Look up one ticket when the message names `#<id>`, else list recent ones.
    Query { ticket: Option<TicketRef> },
}

/// A `#<digits>` reference found in a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TicketRef {
    Id(i64),
    /// Digits too large for a ticket id; no such ticket can exist.
    OutOfRange(String),
}

impl std::fmt::Display for TicketRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TicketRef::Id(id) => write!(f, "{id}"),
            TicketRef::OutOfRange(digits) => f.write_str(digits),
        }
    }
}

/// Does the message talk about tickets at all?
pub fn mentions_tickets(message: &str) -> bool {
    contains_any(&message.to_lowercase(), TICKET_WORDS)
}

pub fn classify(message: &str) -> Option<TicketAction> {
    let lower = message.to_lowercase();
    if contains_any(&lower, CREATE_WORDS) {
        return Some(TicketAction::Create {
            priority: requested_priority(&lower),
        });
    }
    if contains_any(&lower, QUERY_WORDS) {
        return Some(TicketAction::Query {
            ticket: ticket_reference(message),
        });
    }
    None
}

fn requested_priority(lower: &str) -> i64 {
    if lower.contains("high priority") || lower.contains("urgent") {
        PRIORITY_HIGH
    } else if lower.contains("low priority") {
        PRIORITY_LOW
    } else {
        PRIORITY_MEDIUM
    }
}

/// First `#<digits>` in the message.
pub fn ticket_reference(message: &str) -> Option<TicketRef> {
    static TICKET_REF: OnceLock<Regex> = OnceLock::new();
    let re = TICKET_REF.get_or_init(|| Regex::new(r"#(\d+)").expect("valid ticket pattern"));
    let digits = re.captures(message)?.get(1)?.as_str();
    Some(match digits.parse() {
        Ok(id) => TicketRef::Id(id),
        Err(_) => TicketRef::OutOfRange(digits.to_string()),
    })
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}
