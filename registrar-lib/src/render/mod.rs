//! Schema-driven view models for tables and forms
//!
//! Renderers hold no state of their own. They turn a [`TableModel`] or a set
//! of form values into plain view structs that a front end can draw, and
//! translate user input back into typed events.
//!
//! [`TableModel`]: crate::table::TableModel

mod form;
mod locale;
mod table;

pub use form::*;
pub use locale::*;
pub use table::*;
