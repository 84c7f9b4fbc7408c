//! Generic table engine
//!
//! [`TableModel`] bundles the fetched rows ([`RowStore`]) with the overlays
//! built on their ids: pending edits ([`EditBuffer`]), the bulk selection
//! ([`SelectionSet`]) and the search/page position ([`ViewState`]).
//! [`SyncEngine`] moves the model to and from the server.

mod edits;
mod loading;
mod model;
mod notify;
mod selection;
mod store;
mod sync;
mod view;

pub use edits::*;
pub use loading::*;
pub use model::*;
pub use notify::*;
pub use selection::*;
pub use store::*;
pub use sync::*;
pub use view::*;
