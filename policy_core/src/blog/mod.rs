//! Users and posts, with the policies that govern them.
//!
//! `UserPolicy` decides what one actor may do to another. `PostPolicy`
//! answers `create?` by asking the post owner's `UserPolicy`.

mod policies;
mod post;

pub use policies::{PostPolicy, UserPolicy};
pub use post::Post;

use crate::config::ResolverConfig;
use crate::error::Result;
use crate::registry::PolicyRegistry;
use crate::resolver::PolicyResolver;

/// Registry with `UserPolicy` and `PostPolicy`
pub fn registry() -> Result<PolicyRegistry> {
    PolicyRegistry::new()
        .with::<UserPolicy>()?
        .with::<PostPolicy>()
}

/// Resolver over `registry()`; fails on an invalid `config`
pub fn resolver(config: ResolverConfig) -> Result<PolicyResolver> {
    PolicyResolver::with_config(registry()?, config)
}
