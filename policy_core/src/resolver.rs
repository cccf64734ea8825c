//! Policy resolution and the authorization entry points.

use crate::actor::Actor;
use crate::config::ResolverConfig;
use crate::context::Context;
use crate::error::{PolicyError, Result};
use crate::policy::{Policy, PolicyDescriptor};
use crate::record::Record;
use crate::registry::PolicyRegistry;
use tracing::{debug, debug_span, warn, Span};
use uuid::Uuid;

/// Resolves the policy governing a record and evaluates its predicates.
///
/// A resolver is read-only once built and can be shared between request
/// threads. Every call binds a fresh [`Policy`] that lives only for that call.
#[derive(Debug)]
pub struct PolicyResolver {
    registry: PolicyRegistry,
    config: ResolverConfig,
}

impl PolicyResolver {
    /// Create a resolver with the default configuration
    pub fn new(registry: PolicyRegistry) -> Self {
        let config = ResolverConfig::default();
        if config.trace_decisions {
            debug!("Creating PolicyResolver with {} policies", registry.len());
        }
        Self { registry, config }
    }

    /// Create a resolver with `config`, rejecting invalid settings
    pub fn with_config(registry: PolicyRegistry, config: ResolverConfig) -> Result<Self> {
        config.validate().map_err(PolicyError::Config)?;
        if config.trace_decisions {
            debug!(
                "Creating PolicyResolver with {} policies, max delegation depth {}",
                registry.len(),
                config.max_delegation_depth
            );
        }
        Ok(Self { registry, config })
    }

    pub fn registry(&self) -> &PolicyRegistry {
        &self.registry
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Find the policy registered for the record's type
    pub fn resolve(&self, record: &dyn Record) -> Result<&PolicyDescriptor> {
        self.registry
            .get(record.record_type())
            .ok_or_else(|| PolicyError::UnresolvedPolicy {
                record_type: record.record_type(),
            })
    }

    /// Decide whether `actor` may perform `predicate` on `record`.
    ///
    /// Denial is `Ok(false)`. Errors are configuration problems: no actor,
    /// no policy for the record, or no such predicate.
    pub fn authorize(
        &self,
        actor: Option<&Actor>,
        record: &dyn Record,
        predicate: &str,
        context: &Context,
    ) -> Result<bool> {
        let actor = actor.ok_or(PolicyError::MissingActor)?;

        let span = self.decision_span(actor, record, predicate);
        let _guard = span.enter();

        let result = self.evaluate(actor, record, predicate, context, 0);
        if self.config.trace_decisions {
            match &result {
                Ok(allowed) => debug!(allowed = *allowed, "Authorization decided"),
                Err(e) => warn!("Authorization failed: {}", e),
            }
        }
        result
    }

    /// Same as `authorize`; reads better at call sites that branch on the answer
    pub fn allowed_to(
        &self,
        actor: Option<&Actor>,
        record: &dyn Record,
        predicate: &str,
        context: &Context,
    ) -> Result<bool> {
        self.authorize(actor, record, predicate, context)
    }

    /// Like `authorize`, but a denial becomes `PolicyError::Unauthorized`
    pub fn authorize_strict(
        &self,
        actor: Option<&Actor>,
        record: &dyn Record,
        predicate: &str,
        context: &Context,
    ) -> Result<()> {
        if self.authorize(actor, record, predicate, context)? {
            return Ok(());
        }

        let policy_type = self.resolve(record)?.name;
        Err(PolicyError::Unauthorized {
            policy_type,
            predicate_name: predicate.to_string(),
        })
    }

    /// Construct the policy for `record` without evaluating anything
    pub fn bind<'a, R: Record>(
        &'a self,
        actor: &'a Actor,
        record: &'a R,
        context: &'a Context,
    ) -> Result<Policy<'a, R>> {
        let descriptor = self.resolve(record)?;
        let entry = self
            .registry
            .entry::<R>(record.record_type())
            .ok_or_else(|| PolicyError::RecordMismatch {
                policy_type: descriptor.name,
                record_type: record.record_type(),
            })?;
        Ok(entry.bind(self, actor, record, context, 0))
    }

    /// Evaluate `predicate` on `other`'s policy with the caller's actor and context
    pub fn delegate<R: Record>(
        &self,
        caller: &Policy<'_, R>,
        predicate: &str,
        other: &dyn Record,
    ) -> Result<bool> {
        let depth = caller.depth() + 1;
        if depth > self.config.max_delegation_depth {
            return Err(PolicyError::DelegationDepthExceeded {
                depth,
                policy_type: caller.name(),
            });
        }

        if self.config.trace_decisions {
            debug!(
                from = caller.name(),
                record_type = %other.record_type(),
                predicate,
                depth,
                "Delegating check"
            );
        }
        self.evaluate(caller.actor(), other, predicate, caller.context(), depth)
    }

    fn evaluate(
        &self,
        actor: &Actor,
        record: &dyn Record,
        predicate: &str,
        context: &Context,
        depth: usize,
    ) -> Result<bool> {
        let factory = self
            .registry
            .factory(record.record_type())
            .ok_or_else(|| PolicyError::UnresolvedPolicy {
                record_type: record.record_type(),
            })?;
        factory.evaluate(self, actor, record, predicate, context, depth)
    }

    fn decision_span(&self, actor: &Actor, record: &dyn Record, predicate: &str) -> Span {
        if !self.config.trace_decisions {
            return Span::none();
        }
        let request_id = Uuid::new_v4();
        let policy = self
            .registry
            .get(record.record_type())
            .map_or("<unresolved>", |d| d.name);
        debug_span!(
            "authorize",
            %request_id,
            policy,
            actor = actor.name(),
            record_type = %record.record_type(),
            predicate
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{PolicyRules, Rules};
    use crate::record::RecordType;
    use crate::test_utils::init_test_logging;
    use std::any::Any;

    struct Ticket {
        assignee: Actor,
    }

    impl Record for Ticket {
        fn record_type(&self) -> RecordType {
            TicketPolicy::RECORD_TYPE
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn relation(&self, name: &str) -> Option<&dyn Record> {
            match name {
                "assignee" => Some(&self.assignee),
                _ => None,
            }
        }
    }

    struct TicketPolicy;

    fn close(policy: &Policy<'_, Ticket>) -> Result<bool> {
        Ok(policy.actor() == &policy.record().assignee)
    }

    fn reassign(policy: &Policy<'_, Ticket>) -> Result<bool> {
        policy.check_related("promote?", "assignee")
    }

    fn watch(policy: &Policy<'_, Ticket>) -> Result<bool> {
        policy.check_related("watch?", "watchers")
    }

    impl PolicyRules for TicketPolicy {
        type Record = Ticket;
        const NAME: &'static str = "TicketPolicy";
        const RECORD_TYPE: RecordType = RecordType::new("ticket");

        fn rules() -> Rules<Ticket> {
            Rules::<Ticket>::new()
                .rule("close?", close)
                .rule("reassign?", reassign)
                .rule("watch?", watch)
        }
    }

    struct StaffPolicy;

    fn promote(policy: &Policy<'_, Actor>) -> Result<bool> {
        let limit = policy.context().get_as::<usize>("max_staff")?.unwrap_or(0);
        Ok(policy.actor().is_admin() && limit > 0)
    }

    impl PolicyRules for StaffPolicy {
        type Record = Actor;
        const NAME: &'static str = "StaffPolicy";
        const RECORD_TYPE: RecordType = Actor::RECORD_TYPE;

        fn rules() -> Rules<Actor> {
            Rules::<Actor>::new().rule("promote?", promote)
        }
    }

    fn resolver() -> PolicyResolver {
        let registry = PolicyRegistry::new()
            .with::<TicketPolicy>()
            .unwrap()
            .with::<StaffPolicy>()
            .unwrap();
        PolicyResolver::new(registry)
    }

    #[test]
    fn test_resolve() {
        let resolver = resolver();
        let ticket = Ticket {
            assignee: Actor::new("bob"),
        };
        assert_eq!(resolver.resolve(&ticket).unwrap().name, "TicketPolicy");
        assert_eq!(
            resolver.resolve(&Actor::new("bob")).unwrap().name,
            "StaffPolicy"
        );

        let empty = PolicyResolver::new(PolicyRegistry::new());
        assert!(matches!(
            empty.resolve(&ticket),
            Err(PolicyError::UnresolvedPolicy { .. })
        ));
    }

    #[test]
    fn test_authorize_local_predicate() {
        init_test_logging();
        let resolver = resolver();
        let ticket = Ticket {
            assignee: Actor::new("bob"),
        };
        let context = Context::new();

        let bob = Actor::new("bob");
        let carol = Actor::new("carol");
        assert!(resolver
            .authorize(Some(&bob), &ticket, "close?", &context)
            .unwrap());
        assert!(!resolver
            .authorize(Some(&carol), &ticket, "close?", &context)
            .unwrap());
    }

    #[test]
    fn test_missing_actor() {
        let resolver = resolver();
        let ticket = Ticket {
            assignee: Actor::new("bob"),
        };
        let result = resolver.authorize(None, &ticket, "close?", &Context::new());
        assert!(matches!(result, Err(PolicyError::MissingActor)));

        // Checked before the policy is even resolved
        let empty = PolicyResolver::new(PolicyRegistry::new());
        let result = empty.authorize(None, &ticket, "close?", &Context::new());
        assert!(matches!(result, Err(PolicyError::MissingActor)));
    }

    #[test]
    fn test_delegation_shares_context() {
        init_test_logging();
        let resolver = resolver();
        let ticket = Ticket {
            assignee: Actor::new("bob"),
        };
        let admin = Actor::new("admin");

        let with_limit = Context::new().with("max_staff", 2);
        assert!(resolver
            .authorize(Some(&admin), &ticket, "reassign?", &with_limit)
            .unwrap());

        // The delegated policy sees the caller's context, not a fresh one
        assert!(!resolver
            .authorize(Some(&admin), &ticket, "reassign?", &Context::new())
            .unwrap());
    }

    #[test]
    fn test_missing_relation() {
        let resolver = resolver();
        let ticket = Ticket {
            assignee: Actor::new("bob"),
        };
        let result = resolver.authorize(Some(&Actor::new("bob")), &ticket, "watch?", &Context::new());
        assert!(matches!(
            result,
            Err(PolicyError::MissingRelation { ref relation, .. }) if relation == "watchers"
        ));
    }

    #[test]
    fn test_authorize_strict() {
        let resolver = resolver();
        let ticket = Ticket {
            assignee: Actor::new("bob"),
        };
        let context = Context::new();

        assert!(resolver
            .authorize_strict(Some(&Actor::new("bob")), &ticket, "close?", &context)
            .is_ok());

        let err = resolver
            .authorize_strict(Some(&Actor::new("eve")), &ticket, "close?", &context)
            .unwrap_err();
        assert!(err.is_denial());
        assert!(matches!(
            err,
            PolicyError::Unauthorized { policy_type: "TicketPolicy", ref predicate_name } if predicate_name == "close?"
        ));

        let err = resolver
            .authorize_strict(Some(&Actor::new("bob")), &ticket, "reopen?", &context)
            .unwrap_err();
        assert!(!err.is_denial());
    }

    #[test]
    fn test_bind_and_apply() {
        let resolver = resolver();
        let ticket = Ticket {
            assignee: Actor::new("bob"),
        };
        let bob = Actor::new("bob");
        let context = Context::new();

        let policy = resolver.bind(&bob, &ticket, &context).unwrap();
        assert_eq!(policy.name(), "TicketPolicy");
        assert_eq!(policy.depth(), 0);
        assert!(policy.apply("close?").unwrap());
        assert!(policy.apply("close?").unwrap());
        assert!(matches!(
            policy.apply("reopen?"),
            Err(PolicyError::UnknownPredicate { policy_type: "TicketPolicy", .. })
        ));
    }

    #[test]
    fn test_resolver_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PolicyResolver>();
        assert_send_sync::<PolicyRegistry>();
    }

    #[test]
    fn test_quiet_resolver() {
        let registry = PolicyRegistry::new().with::<TicketPolicy>().unwrap();
        let resolver =
            PolicyResolver::with_config(registry, ResolverConfig::default().with_trace_decisions(false))
                .unwrap();
        let ticket = Ticket {
            assignee: Actor::new("bob"),
        };
        assert!(!resolver.config().trace_decisions);
        assert!(resolver
            .authorize(Some(&Actor::new("bob")), &ticket, "close?", &Context::new())
            .unwrap());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let registry = PolicyRegistry::new().with::<TicketPolicy>().unwrap();
        let result =
            PolicyResolver::with_config(registry, ResolverConfig::default().with_max_delegation_depth(0));
        assert!(matches!(result, Err(PolicyError::Config(ref msg)) if msg.contains("max_delegation_depth")));
    }

    #[test]
    fn test_decision_span_names_policy() {
        init_test_logging();
        let resolver = resolver();
        let bob = Actor::new("bob");
        let ticket = Ticket {
            assignee: Actor::new("bob"),
        };

        let span = resolver.decision_span(&bob, &ticket, "close?");
        if let Some(metadata) = span.metadata() {
            assert!(metadata.fields().field("policy").is_some());
            assert!(metadata.fields().field("predicate").is_some());
        }

        let quiet = PolicyResolver::with_config(
            PolicyRegistry::new().with::<TicketPolicy>().unwrap(),
            ResolverConfig::default().with_trace_decisions(false),
        )
        .unwrap();
        assert!(quiet.decision_span(&bob, &ticket, "close?").is_none());
    }
}
