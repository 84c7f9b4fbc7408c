//! Group lookup with enrolled students

use chrono::NaiveDateTime;

use super::Resource;
use crate::RegistrarClient;
use crate::error::ApiError;
use crate::error::Error;
use crate::model::Row;
use crate::model::RowId;
use crate::model::Value;

/// A group together with the students enrolled in it.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupDetail {
    pub id: RowId,
    pub name: String,
    /// Creation time, when the server sent a parseable one.
    pub created_at: Option<NaiveDateTime>,
    pub students: Vec<Row>,
}

impl GroupDetail {
    /// Number of enrolled students.
    pub fn students_count(&self) -> usize {
        self.students.len()
    }

    /// Builds the detail from a group row whose `students` field holds the
    /// enrolled student objects.
    pub fn from_row(row: &Row) -> Result<Self, Error> {
        let name = row.get_str("name")?.unwrap_or_default().to_string();
        let created_at = row
            .get_str("created_at")?
            .and_then(|raw| parse_timestamp(raw));

        let students = match row.value("students") {
            Value::Null => Vec::new(),
            Value::Json(json) => serde_json::from_value(json.clone())
                .map_err(|e| ApiError::parse(format!("group {} students: {}", row.id(), e)))?,
            other => {
                return Err(ApiError::parse(format!(
                    "group {} students: expected an array, got {}",
                    row.id(),
                    other.type_name()
                ))
                .into());
            }
        };

        Ok(Self {
            id: row.id().clone(),
            name,
            created_at,
            students,
        })
    }
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
}

impl RegistrarClient {
    /// Looks up one group and its students.
    ///
    /// Returns `Ok(None)` if the server knows no such group.
    ///
    /// # Example
    ///
    /// ```ignore
    /// if let Some(group) = client.group_detail(&RowId::Int(3)).await? {
    ///     println!("{}: {} students", group.name, group.students_count());
    /// }
    /// ```
    pub async fn group_detail(&self, id: &RowId) -> Result<Option<GroupDetail>, Error> {
        let rows = self.list(Resource::GROUP).filter("group_ids", id).await?;
        rows.iter()
            .find(|row| row.id() == id)
            .map(GroupDetail::from_row)
            .transpose()
    }
}
