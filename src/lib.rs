//! Administrator-aware authorization decisions.
//!
//! [`DecisionEngine::evaluate`] answers one question: may this requester use
//! this permission? Administrators (configured users, plus the members of
//! configured groups as reported by a [`DirectoryClient`]) are always allowed.
//! Other requests are handed to the [`SubPolicy`] of the domain that owns the
//! permission, or receive the configured [`DefaultDecision`].
//!
//! ```ignore
//! use std::sync::Arc;
//! use warden_core::{DecisionEngine, EngineConfig, EntityRef, PermissionRequest, StaticDirectory};
//!
//! let config = EngineConfig::from_json_str(r#"{ "admins": ["group:realm/platform-admins"] }"#)?;
//! let directory = StaticDirectory::new().with_group(
//!     EntityRef::group("realm", "platform-admins"),
//!     [EntityRef::user("alice")],
//! );
//! let engine = DecisionEngine::builder(config)
//!     .directory(Arc::new(directory))
//!     .build()?;
//!
//! let decision = engine
//!     .evaluate(&PermissionRequest::new("entity.read", EntityRef::user("alice")))
//!     .await;
//! assert!(decision.is_allow());
//! ```

pub use cache::{AdminCache, AdminSetResult};
pub use classify::{PermissionClassifier, PermissionPattern};
pub use config::{CacheConfig, DomainConfig, EngineConfig};
pub use directory::{AdminDirectory, GroupLookupFailure, StaticDirectory};
pub use engine::{DEFAULT_CACHE_KEY, DecisionEngine, DecisionEngineBuilder};
pub use error::{DirectoryError, PolicyError, SubPolicyError};
pub use traits::{DirectoryClient, SubPolicy};
pub use types::{
    AdminEntry, DEFAULT_NAMESPACE, DecisionPath, DefaultDecision, DirectoryEntity, EntityRef,
    KIND_GROUP, KIND_USER, PermissionRequest, PolicyDecision, RELATION_HAS_MEMBER, Relation,
    ResolvedAdminSet,
};

mod cache;
mod classify;
mod config;
mod directory;
mod engine;
mod error;
pub mod metrics;
mod timers;
mod traits;
mod types;

#[cfg(test)]
mod test_helpers;
