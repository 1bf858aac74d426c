//! Round Again Core - contact cadence and reminder logic.
//!
//! This crate holds everything the other Round Again components agree on:
//! - `server` - JSON API, `PostgreSQL` store, SMTP notifier and daily job
//! - `cli` - Migrations, sample data and one-shot reminder runs
//!
//! # Architecture
//!
//! No I/O lives here. Every calculation takes the current time as an explicit
//! argument; callers sample a [`Clock`] once per run or request and thread the
//! value down.
//!
//! # Modules
//!
//! - [`types`] - Type-safe ids and email addresses
//! - [`cadence`] - Contact frequency and its conversion to a duration
//! - [`models`] - Contacts and interactions
//! - [`due`] - Due-status calculator
//! - [`policy`] - Reminder window and dashboard grouping
//! - [`clock`] - Source of the current time

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cadence;
pub mod clock;
pub mod due;
pub mod models;
pub mod policy;
pub mod types;

pub use cadence::{Cadence, CadenceError, FrequencyUnit, ParseEnumError};
pub use clock::{Clock, FixedClock, SystemClock};
pub use due::{DueStatus, evaluate};
pub use models::{
    Contact, ContactDraft, ContactFieldError, Interaction, InteractionDraft, InteractionType,
};
pub use policy::{
    ContactFilter, DashboardSummary, DueContact, InvalidWindow, ReminderWindow, select_for_reminder,
};
pub use types::*;
