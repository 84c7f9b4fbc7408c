//! Row, value and schema model

mod patch;
mod row;
mod schema;
mod value;

pub use patch::*;
pub use row::*;
pub use schema::*;
pub use value::*;
