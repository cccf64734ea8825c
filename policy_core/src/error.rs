use crate::record::RecordType;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PolicyError>;

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("No policy registered for record type: {record_type}")]
    UnresolvedPolicy { record_type: RecordType },

    #[error("Unknown predicate {predicate_name} on {policy_type}")]
    UnknownPredicate {
        policy_type: &'static str,
        predicate_name: String,
    },

    #[error("Authorization requires an actor")]
    MissingActor,

    #[error("Not authorized: {policy_type} denied {predicate_name}")]
    Unauthorized {
        policy_type: &'static str,
        predicate_name: String,
    },

    #[error("Record type {record_type} has no relation named {relation}")]
    MissingRelation {
        record_type: RecordType,
        relation: String,
    },

    #[error("{policy_type} cannot be bound to this {record_type} record")]
    RecordMismatch {
        policy_type: &'static str,
        record_type: RecordType,
    },

    #[error("A policy is already registered for record type: {record_type}")]
    DuplicatePolicy { record_type: RecordType },

    #[error("Delegation depth {depth} exceeded in {policy_type}")]
    DelegationDepthExceeded {
        depth: usize,
        policy_type: &'static str,
    },

    #[error("Invalid context value for {key}: {source}")]
    Context {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl PolicyError {
    /// Whether this is a denial outcome rather than a configuration failure.
    ///
    /// Callers serving requests map denials to a forbidden response and
    /// everything else to an internal error.
    pub fn is_denial(&self) -> bool {
        matches!(self, PolicyError::Unauthorized { .. })
    }
}
