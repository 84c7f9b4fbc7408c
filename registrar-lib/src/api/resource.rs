//! REST resource names

use std::borrow::Cow;

/// A REST resource served under the API prefix, e.g. `/api/student`.
///
/// # Example
///
/// ```
/// use registrar_lib::api::Resource;
///
/// assert_eq!(Resource::STUDENT.path(), "/student");
/// assert_eq!(Resource::new("faculty").name(), "faculty");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Resource(Cow<'static, str>);

impl Resource {
    pub const USER: Resource = Resource::from_static("user");
    pub const STUDENT: Resource = Resource::from_static("student");
    pub const GROUP: Resource = Resource::from_static("group");
    pub const SUBJECT: Resource = Resource::from_static("subject");

    /// Creates a resource from a static name.
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    /// Creates a resource from any name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    /// Returns the resource name.
    pub fn name(&self) -> &str {
        &self.0
    }

    /// Returns the path below the API prefix.
    pub fn path(&self) -> String {
        format!("/{}", self.0.trim_matches('/'))
    }
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
