//! Spaceboard: spaces, tasks and events with lazily reconciled overdue state
//! and grouped, paginated board views.
//!
//! The [`board::Board`] service is the entry point. It runs every read
//! through reconciliation ([`reconcile`]) and then the view engine
//! ([`view`]) or the dashboard aggregator ([`dashboard`]), on top of any
//! [`store::RecordStore`]. [`db::Database`] is the SQLite store.

pub mod board;
pub mod config;
pub mod dashboard;
pub mod db;
pub mod error;
pub mod logging;
pub mod patch;
pub mod reconcile;
pub mod store;
pub mod types;
pub mod view;

pub use board::Board;
pub use db::Database;
pub use error::{BoardError, SpecError, StoreError};
