//! Round Again server library.
//!
//! This crate provides the server functionality as a library, allowing it
//! to be tested and reused by the CLI.
//!
//! # Modules
//!
//! - [`config`] - Environment configuration
//! - [`db`] - `PostgreSQL` repositories and the job's contact store
//! - [`services`] - Reminder job, scheduler and email notifier
//! - [`routes`] - JSON HTTP API

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod routes;
pub mod services;
pub mod state;
