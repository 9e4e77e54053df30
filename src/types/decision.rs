//! Authorization decision types.

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};
use strum_macros::{Display as StrumDisplay, EnumString, IntoStaticStr};
use utoipa::ToSchema;

/// Allow or deny, with an optional reason for diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
pub enum PolicyDecision {
    Allow {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
    Deny {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
}

impl PolicyDecision {
    pub fn allow() -> Self {
        PolicyDecision::Allow { reason: None }
    }

    pub fn deny() -> Self {
        PolicyDecision::Deny { reason: None }
    }

    pub fn allow_because(reason: impl Into<String>) -> Self {
        PolicyDecision::Allow {
            reason: Some(reason.into()),
        }
    }

    pub fn deny_because(reason: impl Into<String>) -> Self {
        PolicyDecision::Deny {
            reason: Some(reason.into()),
        }
    }

    pub fn is_allow(&self) -> bool {
        matches!(self, PolicyDecision::Allow { .. })
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            PolicyDecision::Allow { reason } | PolicyDecision::Deny { reason } => {
                reason.as_deref()
            }
        }
    }
}

impl Display for PolicyDecision {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let effect = if self.is_allow() { "Allow" } else { "Deny" };
        match self.reason() {
            Some(reason) => write!(f, "{effect}({reason})"),
            None => write!(f, "{effect}"),
        }
    }
}

/// The decision returned for permissions that are neither covered by the
/// administrator fast path nor by a delegated domain.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    EnumString,
    StrumDisplay,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DefaultDecision {
    /// Fail open.
    #[default]
    Allow,
    /// Fail closed.
    Deny,
}

impl DefaultDecision {
    pub fn decide(self, permission: &str) -> PolicyDecision {
        let reason = format!("no policy covers '{permission}', applying default ({self})");
        match self {
            DefaultDecision::Allow => PolicyDecision::allow_because(reason),
            DefaultDecision::Deny => PolicyDecision::deny_because(reason),
        }
    }
}

/// Which branch of the engine produced a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, StrumDisplay, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum DecisionPath {
    Administrator,
    Delegated,
    Default,
    AdminSetUnavailable,
}
