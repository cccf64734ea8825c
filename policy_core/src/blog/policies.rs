use super::post::Post;
use crate::actor::Actor;
use crate::error::Result;
use crate::policy::{Policy, PolicyRules, Rules};
use crate::record::RecordType;

/// Governs what an actor may do to a user
pub struct UserPolicy;

impl UserPolicy {
    fn index(_: &Policy<'_, Actor>) -> Result<bool> {
        Ok(true)
    }

    fn show(_: &Policy<'_, Actor>) -> Result<bool> {
        Ok(true)
    }

    fn create(policy: &Policy<'_, Actor>) -> Result<bool> {
        Ok(policy.actor().is_admin())
    }

    // Admins manage everyone except admins, themselves included
    fn manage(policy: &Policy<'_, Actor>) -> Result<bool> {
        Ok(policy.actor().is_admin() && !policy.record().is_admin())
    }
}

impl PolicyRules for UserPolicy {
    type Record = Actor;
    const NAME: &'static str = "UserPolicy";
    const RECORD_TYPE: RecordType = Actor::RECORD_TYPE;

    fn rules() -> Rules<Actor> {
        Rules::<Actor>::new()
            .rule("index?", Self::index)
            .rule("show?", Self::show)
            .rule("create?", Self::create)
            .rule("manage?", Self::manage)
            .alias("update?", "manage?")
    }
}

/// Governs posts; creation rights follow the post owner's
pub struct PostPolicy;

impl PostPolicy {
    fn create(policy: &Policy<'_, Post>) -> Result<bool> {
        policy.check("create?", policy.record().user())
    }
}

impl PolicyRules for PostPolicy {
    type Record = Post;
    const NAME: &'static str = "PostPolicy";
    const RECORD_TYPE: RecordType = Post::RECORD_TYPE;

    fn rules() -> Rules<Post> {
        Rules::<Post>::new().rule("create?", Self::create)
    }
}
