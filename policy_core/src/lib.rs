pub mod actor;
pub mod blog;
pub mod config;
pub mod context;
pub mod error;
pub mod policy;
pub mod record;
pub mod registry;
pub mod resolver;

#[cfg(test)]
mod test_utils;

pub use actor::{compare, Actor, Role};
pub use config::ResolverConfig;
pub use context::Context;
pub use error::{PolicyError, Result};
pub use policy::{Policy, PolicyDescriptor, PolicyRules, Predicate, Rules};
pub use record::{Record, RecordType};
pub use registry::PolicyRegistry;
pub use resolver::PolicyResolver;
