//! REST operations against the records service

mod crud;
mod execute;
mod groups;
mod resource;

pub use crud::*;
pub use execute::*;
pub use groups::*;
pub use resource::*;
