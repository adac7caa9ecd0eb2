//! Client for GLPI's REST API (`apirest.php`).
//!
//! The API is session based: a client authenticates with an application
//! token plus a user token (`initSession`), receives a session token, sends
//! it on every ticket call, and releases it with `killSession`.
//!
//! [`GlpiClient`] keeps that lifecycle as an explicit [`SessionState`].
//! Ticket operations issued before a session exists fail with
//! [`GlpiError::NoSession`] without touching the network.

pub mod client;
pub mod config;
pub mod error;
pub mod intent;
pub mod ticket;

pub use client::{GlpiClient, SessionState, TicketService};
pub use config::{ConfigError, GlpiConfig};
pub use error::GlpiError;
pub use intent::{TicketCategory, TicketDraft};
pub use ticket::{CreatedTicket, Ticket};
