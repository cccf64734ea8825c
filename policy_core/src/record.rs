//! Records are the entities that policies authorize against.

use serde::Serialize;
use std::any::Any;
use std::fmt;

/// Tag identifying a record's declared type; the key policies are registered under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RecordType(&'static str);

impl RecordType {
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// An entity that can be authorized against.
pub trait Record: Any {
    /// The type tag used to find this record's policy
    fn record_type(&self) -> RecordType;

    /// Typed access for predicates bound to a concrete record type
    fn as_any(&self) -> &dyn Any;

    /// Look up a related record by name, e.g. the owner of a post
    fn relation(&self, _name: &str) -> Option<&dyn Record> {
        None
    }
}
