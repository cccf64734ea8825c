use crate::actor::Actor;
use crate::context::Context;
use crate::error::{PolicyError, Result};
use crate::policy::{Policy, PolicyDescriptor, PolicyRules, Rules};
use crate::record::{Record, RecordType};
use crate::resolver::PolicyResolver;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;

/// Builds and evaluates one policy type against type-erased records.
pub(crate) trait PolicyFactory: Send + Sync {
    fn descriptor(&self) -> &PolicyDescriptor;

    fn evaluate(
        &self,
        resolver: &PolicyResolver,
        actor: &Actor,
        record: &dyn Record,
        predicate: &str,
        context: &Context,
        depth: usize,
    ) -> Result<bool>;

    fn as_any(&self) -> &dyn Any;
}

pub(crate) struct PolicyEntry<R: Record> {
    descriptor: PolicyDescriptor,
    rules: Rules<R>,
}

impl<R: Record> PolicyEntry<R> {
    /// Bind the policy to a record already known to be an `R`
    pub(crate) fn bind<'a>(
        &'a self,
        resolver: &'a PolicyResolver,
        actor: &'a Actor,
        record: &'a R,
        context: &'a Context,
        depth: usize,
    ) -> Policy<'a, R> {
        Policy::new(
            self.descriptor.name,
            record,
            actor,
            context,
            &self.rules,
            resolver,
            depth,
        )
    }

    fn downcast<'r>(&self, record: &'r dyn Record) -> Result<&'r R> {
        record
            .as_any()
            .downcast_ref::<R>()
            .ok_or_else(|| PolicyError::RecordMismatch {
                policy_type: self.descriptor.name,
                record_type: record.record_type(),
            })
    }
}

impl<R: Record> PolicyFactory for PolicyEntry<R> {
    fn descriptor(&self) -> &PolicyDescriptor {
        &self.descriptor
    }

    fn evaluate(
        &self,
        resolver: &PolicyResolver,
        actor: &Actor,
        record: &dyn Record,
        predicate: &str,
        context: &Context,
        depth: usize,
    ) -> Result<bool> {
        let record = self.downcast(record)?;
        self.bind(resolver, actor, record, context, depth)
            .apply(predicate)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Registration table from record type to the policy that governs it.
///
/// Populated at startup and read-only afterwards.
#[derive(Default)]
pub struct PolicyRegistry {
    factories: HashMap<RecordType, Box<dyn PolicyFactory>>,
}

impl PolicyRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register policy `P` for its record type
    pub fn register<P: PolicyRules>(&mut self) -> Result<()> {
        if self.factories.contains_key(&P::RECORD_TYPE) {
            return Err(PolicyError::DuplicatePolicy {
                record_type: P::RECORD_TYPE,
            });
        }

        let rules = P::rules();
        rules
            .validate()
            .map_err(|e| PolicyError::Config(format!("{}: {}", P::NAME, e)))?;

        let entry = PolicyEntry {
            descriptor: PolicyDescriptor {
                name: P::NAME,
                record_type: P::RECORD_TYPE,
                predicates: rules.names(),
            },
            rules,
        };
        self.factories.insert(P::RECORD_TYPE, Box::new(entry));

        Ok(())
    }

    /// Builder form of `register`
    pub fn with<P: PolicyRules>(mut self) -> Result<Self> {
        self.register::<P>()?;
        Ok(self)
    }

    pub fn get(&self, record_type: RecordType) -> Option<&PolicyDescriptor> {
        self.factories.get(&record_type).map(|f| f.descriptor())
    }

    pub fn contains(&self, record_type: RecordType) -> bool {
        self.factories.contains_key(&record_type)
    }

    /// List registered policies, ordered by record type
    pub fn list(&self) -> Vec<&PolicyDescriptor> {
        let mut descriptors: Vec<_> = self.factories.values().map(|f| f.descriptor()).collect();
        descriptors.sort_by_key(|d| d.record_type);
        descriptors
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    pub(crate) fn factory(&self, record_type: RecordType) -> Option<&dyn PolicyFactory> {
        self.factories.get(&record_type).map(|f| f.as_ref())
    }

    pub(crate) fn entry<R: Record>(&self, record_type: RecordType) -> Option<&PolicyEntry<R>> {
        self.factory(record_type)?
            .as_any()
            .downcast_ref::<PolicyEntry<R>>()
    }
}

impl fmt::Debug for PolicyRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolicyRegistry")
            .field("policies", &self.list())
            .finish()
    }
}
