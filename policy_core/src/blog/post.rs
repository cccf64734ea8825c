use crate::actor::Actor;
use crate::record::{Record, RecordType};
use serde::{Deserialize, Serialize};
use std::any::Any;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    title: String,
    user: Actor,
}

impl Post {
    pub const RECORD_TYPE: RecordType = RecordType::new("post");

    pub fn new(title: impl Into<String>, user: Actor) -> Self {
        Self {
            title: title.into(),
            user,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// The owning user
    pub fn user(&self) -> &Actor {
        &self.user
    }
}

impl Record for Post {
    fn record_type(&self) -> RecordType {
        Self::RECORD_TYPE
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn relation(&self, name: &str) -> Option<&dyn Record> {
        match name {
            "user" => Some(&self.user),
            _ => None,
        }
    }
}
