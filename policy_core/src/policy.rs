//! Policy declarations and bound policy instances.
//!
//! A policy type declares a table of named predicates for one record type.
//! At authorization time the resolver binds it to a (record, actor, context)
//! triple, producing a [`Policy`] that predicates read from and delegate
//! through.

use crate::actor::Actor;
use crate::context::Context;
use crate::error::{PolicyError, Result};
use crate::record::{Record, RecordType};
use crate::resolver::PolicyResolver;
use serde::Serialize;
use std::collections::BTreeMap;

/// A predicate body: a pure function of the bound policy
pub type Predicate<R> = fn(&Policy<'_, R>) -> Result<bool>;

/// Declares the rules that govern one record type.
pub trait PolicyRules: 'static {
    type Record: Record;

    /// Policy name used in errors and logs
    const NAME: &'static str;

    /// Record type this policy is registered under
    const RECORD_TYPE: RecordType;

    fn rules() -> Rules<Self::Record>;
}

enum Rule<R: Record> {
    Predicate(Predicate<R>),
    Alias(&'static str),
}

/// Named predicates of a policy type, plus aliases onto them.
pub struct Rules<R: Record> {
    entries: BTreeMap<&'static str, Rule<R>>,
    duplicates: Vec<&'static str>,
}

impl<R: Record> Rules<R> {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            duplicates: Vec::new(),
        }
    }

    /// Declare a predicate
    pub fn rule(self, name: &'static str, predicate: Predicate<R>) -> Self {
        self.declare(name, Rule::Predicate(predicate))
    }

    /// Answer `name` with the declared predicate `target`
    pub fn alias(self, name: &'static str, target: &'static str) -> Self {
        self.declare(name, Rule::Alias(target))
    }

    // First declaration wins; later ones are reported by `validate`
    fn declare(mut self, name: &'static str, rule: Rule<R>) -> Self {
        if self.entries.contains_key(name) {
            self.duplicates.push(name);
        } else {
            self.entries.insert(name, rule);
        }
        self
    }

    /// Check for repeated names and that every alias targets a declared predicate
    pub fn validate(&self) -> std::result::Result<(), String> {
        if let Some(name) = self.duplicates.first() {
            return Err(format!("Rule {} is declared more than once", name));
        }
        for (name, rule) in &self.entries {
            if let Rule::Alias(target) = rule {
                match self.entries.get(target) {
                    Some(Rule::Predicate(_)) => {}
                    Some(Rule::Alias(_)) => {
                        return Err(format!("Alias {} targets another alias {}", name, target))
                    }
                    None => {
                        return Err(format!("Alias {} targets undeclared rule {}", name, target))
                    }
                }
            }
        }
        Ok(())
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.entries.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn lookup(&self, name: &str) -> Option<Predicate<R>> {
        match self.entries.get(name)? {
            Rule::Predicate(predicate) => Some(*predicate),
            Rule::Alias(target) => match self.entries.get(target)? {
                Rule::Predicate(predicate) => Some(*predicate),
                Rule::Alias(_) => None,
            },
        }
    }
}

impl<R: Record> Default for Rules<R> {
    fn default() -> Self {
        Self::new()
    }
}

/// What `resolve` reports about a registered policy type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyDescriptor {
    pub name: &'static str,
    pub record_type: RecordType,
    pub predicates: Vec<&'static str>,
}

/// A policy bound to one record, actor and context.
///
/// Holds shared references only, so evaluating predicates cannot change it;
/// the same predicate asked twice gives the same answer.
pub struct Policy<'a, R: Record> {
    name: &'static str,
    record: &'a R,
    actor: &'a Actor,
    context: &'a Context,
    rules: &'a Rules<R>,
    resolver: &'a PolicyResolver,
    depth: usize,
}

impl<'a, R: Record> Policy<'a, R> {
    pub(crate) fn new(
        name: &'static str,
        record: &'a R,
        actor: &'a Actor,
        context: &'a Context,
        rules: &'a Rules<R>,
        resolver: &'a PolicyResolver,
        depth: usize,
    ) -> Self {
        Self {
            name,
            record,
            actor,
            context,
            rules,
            resolver,
            depth,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn record(&self) -> &'a R {
        self.record
    }

    /// The acting identity
    pub fn actor(&self) -> &'a Actor {
        self.actor
    }

    pub fn context(&self) -> &'a Context {
        self.context
    }

    /// Number of delegations between the top-level call and this policy
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Evaluate one of this policy's predicates
    pub fn apply(&self, predicate: &str) -> Result<bool> {
        let rule = self
            .rules
            .lookup(predicate)
            .ok_or_else(|| PolicyError::UnknownPredicate {
                policy_type: self.name,
                predicate_name: predicate.to_string(),
            })?;
        rule(self)
    }

    /// Ask `other`'s policy for `predicate` on behalf of the same actor and context.
    ///
    /// Denial comes back as `Ok(false)`; resolution errors propagate.
    pub fn check(&self, predicate: &str, other: &dyn Record) -> Result<bool> {
        self.resolver.delegate(self, predicate, other)
    }

    /// Delegate to the record reached through the named relation
    pub fn check_related(&self, predicate: &str, relation: &str) -> Result<bool> {
        let other = self
            .record
            .relation(relation)
            .ok_or_else(|| PolicyError::MissingRelation {
                record_type: self.record.record_type(),
                relation: relation.to_string(),
            })?;
        self.check(predicate, other)
    }
}
