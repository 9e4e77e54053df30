//! Identity references of the form `kind:namespace/name`.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::PolicyError;

/// Kind assigned to references that do not name one.
pub const KIND_USER: &str = "user";
/// Kind of entries that are expanded through the directory.
pub const KIND_GROUP: &str = "group";
/// Namespace assigned to references that do not name one.
pub const DEFAULT_NAMESPACE: &str = "default";

static ENTITY_REF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:(?P<kind>[^:/\s]+):)?(?:(?P<namespace>[^:/\s]+)/)?(?P<name>[^:/\s]+)$")
        .expect("entity ref pattern is valid")
});

/// A reference to a principal in the directory, e.g. `group:realm/platform-admins`.
///
/// All components are stored lowercased; references compare case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityRef {
    kind: String,
    namespace: String,
    name: String,
}

impl EntityRef {
    /// Create a reference from its parts.
    pub fn new(
        kind: impl AsRef<str>,
        namespace: impl AsRef<str>,
        name: impl AsRef<str>,
    ) -> Self {
        EntityRef {
            kind: kind.as_ref().to_lowercase(),
            namespace: namespace.as_ref().to_lowercase(),
            name: name.as_ref().to_lowercase(),
        }
    }

    /// A user in the default namespace.
    pub fn user(name: impl AsRef<str>) -> Self {
        Self::new(KIND_USER, DEFAULT_NAMESPACE, name)
    }

    /// A group in the given namespace.
    pub fn group(namespace: impl AsRef<str>, name: impl AsRef<str>) -> Self {
        Self::new(KIND_GROUP, namespace, name)
    }

    /// Parse `[kind:][namespace/]name`, filling in the missing parts from the defaults.
    pub fn parse_with_defaults(
        s: &str,
        default_kind: &str,
        default_namespace: &str,
    ) -> Result<Self, PolicyError> {
        let trimmed = s.trim();
        let caps = ENTITY_REF.captures(trimmed).ok_or_else(|| {
            PolicyError::InvalidFormat(format!(
                "Failed to parse entity reference '{s}' (expected format: [kind:][namespace/]name)"
            ))
        })?;

        let kind = caps.name("kind").map_or(default_kind, |m| m.as_str());
        let namespace = caps
            .name("namespace")
            .map_or(default_namespace, |m| m.as_str());
        let name = &caps["name"];

        if kind.is_empty() || namespace.is_empty() {
            return Err(PolicyError::InvalidFormat(format!(
                "Failed to parse entity reference '{s}': empty kind or namespace"
            )));
        }

        Ok(Self::new(kind, namespace, name))
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_group(&self) -> bool {
        self.kind == KIND_GROUP
    }

    pub fn is_user(&self) -> bool {
        self.kind == KIND_USER
    }
}

impl Display for EntityRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}:{}/{}", self.kind, self.namespace, self.name)
    }
}

impl FromStr for EntityRef {
    type Err = PolicyError;

    /// Accepts:
    /// - alice
    /// - group:platform-admins
    /// - realm/alice
    /// - group:realm/platform-admins
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_with_defaults(s, KIND_USER, DEFAULT_NAMESPACE)
    }
}

impl Serialize for EntityRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for EntityRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
