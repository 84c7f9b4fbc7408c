//! Create, Read, Update, Delete operations
//!
//! Every call the table engine makes is one [`Operation`]. Operations can be
//! built with [`Op`] and run with
//! [`RegistrarClient::execute`](crate::RegistrarClient::execute), or issued
//! through the convenience methods on the client.
//!
//! # Example
//!
//! ```ignore
//! use registrar_lib::api::{Op, Resource};
//!
//! let op = Op::list(Resource::GROUP).filter("group_ids", "3").build();
//! let result = client.execute(op).await?;
//! ```

use crate::model::Fields;
use crate::model::Patch;
use crate::model::Row;
use crate::model::RowId;

use super::Resource;

// =============================================================================
// Operation enum
// =============================================================================

/// A single request against a resource endpoint.
#[derive(Debug, Clone)]
pub enum Operation {
    /// `GET <resource>[?filter]` returning rows.
    List {
        resource: Resource,
        filter: Vec<(String, String)>,
    },

    /// `POST <resource>` with one record (no `id`).
    Create { resource: Resource, fields: Fields },

    /// `PUT <resource>` with an array of `{id, ...changed}` patches.
    Update {
        resource: Resource,
        patches: Vec<Patch>,
    },

    /// `DELETE <resource>` with an array of ids as the body.
    Delete { resource: Resource, ids: Vec<RowId> },

    /// `POST group/add?student_id=&group_id=` with an empty body.
    AddToGroup { student_id: RowId, group_id: RowId },
}

impl Operation {
    /// Returns `true` for operations that only read.
    pub fn is_read(&self) -> bool {
        matches!(self, Operation::List { .. })
    }
}

/// Result of executing an operation.
#[derive(Debug)]
pub enum OperationResult {
    List(Vec<Row>),
    /// The created row, when the server echoes one back.
    Create(Option<Row>),
    Update,
    Delete,
    AddToGroup,
}

impl OperationResult {
    /// Returns the rows if this was a List operation.
    pub fn rows(&self) -> Option<&[Row]> {
        match self {
            OperationResult::List(rows) => Some(rows),
            _ => None,
        }
    }

    /// Returns the created row, if the server returned one.
    pub fn created(&self) -> Option<&Row> {
        match self {
            OperationResult::Create(row) => row.as_ref(),
            _ => None,
        }
    }
}

// =============================================================================
// Op helper for building operations
// =============================================================================

/// Helper for building [`Operation`]s.
pub struct Op;

impl Op {
    /// Creates a new List operation builder.
    pub fn list(resource: Resource) -> ListBuilder {
        ListBuilder {
            resource,
            filter: Vec::new(),
        }
    }

    /// Creates a Create operation.
    pub fn create(resource: Resource, fields: Fields) -> Operation {
        Operation::Create { resource, fields }
    }

    /// Creates an Update operation.
    pub fn update(resource: Resource, patches: Vec<Patch>) -> Operation {
        Operation::Update { resource, patches }
    }

    /// Creates a Delete operation.
    pub fn delete(resource: Resource, ids: Vec<RowId>) -> Operation {
        Operation::Delete { resource, ids }
    }

    /// Creates an operation linking a student to a group.
    pub fn add_to_group(student_id: RowId, group_id: RowId) -> Operation {
        Operation::AddToGroup {
            student_id,
            group_id,
        }
    }
}

/// Builder for List operations.
#[derive(Debug, Clone)]
pub struct ListBuilder {
    resource: Resource,
    filter: Vec<(String, String)>,
}

impl ListBuilder {
    /// Adds a server-side filter query parameter.
    pub fn filter(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.filter.push((key.into(), value.to_string()));
        self
    }

    /// Builds the operation.
    pub fn build(self) -> Operation {
        Operation::List {
            resource: self.resource,
            filter: self.filter,
        }
    }
}

impl From<ListBuilder> for Operation {
    fn from(builder: ListBuilder) -> Self {
        builder.build()
    }
}
