//! Academic records API client and table engine
//!
//! An async client for the records service (users, students, groups,
//! subjects) plus a generic engine for editing tabular data against it:
//! fetched rows, per-cell edits diffed against the fetched values, bulk
//! selection, search and pagination, and batch create/update/delete.

pub mod api;
pub mod auth;
pub mod error;
pub mod model;
pub mod render;
pub mod table;

mod client;
mod retry;

pub use client::*;
pub use retry::RetryConfig;
