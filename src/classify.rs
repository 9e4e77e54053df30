//! Permission classification into delegated domains.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter, Result as FmtResult};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::DomainConfig;
use crate::error::PolicyError;

static PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:[^\s*]+\*?|\*)$").expect("permission pattern is valid"));

/// An exact permission name, or a prefix glob ending in `*`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PermissionPattern {
    Exact(String),
    Prefix(String),
}

impl PermissionPattern {
    pub fn parse(raw: &str) -> Result<Self, PolicyError> {
        if !PATTERN.is_match(raw) {
            return Err(PolicyError::InvalidFormat(format!(
                "Failed to parse permission pattern '{raw}' (expected a permission name, optionally ending in '*')"
            )));
        }
        Ok(match raw.strip_suffix('*') {
            Some(prefix) => PermissionPattern::Prefix(prefix.to_string()),
            None => PermissionPattern::Exact(raw.to_string()),
        })
    }

    pub fn matches(&self, permission: &str) -> bool {
        match self {
            PermissionPattern::Exact(name) => name == permission,
            PermissionPattern::Prefix(prefix) => permission.starts_with(prefix.as_str()),
        }
    }
}

impl Display for PermissionPattern {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            PermissionPattern::Exact(name) => write!(f, "{name}"),
            PermissionPattern::Prefix(prefix) => write!(f, "{prefix}*"),
        }
    }
}

/// Decides which delegated domain, if any, owns a permission.
///
/// Exact names take precedence over globs; among globs the longest prefix
/// wins, and ties go to the domain that sorts first by name.
#[derive(Debug, Clone, Default)]
pub struct PermissionClassifier {
    domains: Vec<(String, Vec<PermissionPattern>)>,
}

impl PermissionClassifier {
    pub fn new(domains: &BTreeMap<String, DomainConfig>) -> Result<Self, PolicyError> {
        let domains = domains
            .iter()
            .map(|(name, config)| {
                let patterns = config
                    .permissions
                    .iter()
                    .map(|raw| PermissionPattern::parse(raw))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok((name.clone(), patterns))
            })
            .collect::<Result<Vec<_>, PolicyError>>()?;
        Ok(Self { domains })
    }

    pub fn classify(&self, permission: &str) -> Option<&str> {
        let mut best: Option<(&str, usize)> = None;
        for (domain, patterns) in &self.domains {
            for pattern in patterns.iter().filter(|p| p.matches(permission)) {
                let rank = match pattern {
                    PermissionPattern::Exact(_) => usize::MAX,
                    PermissionPattern::Prefix(prefix) => prefix.len(),
                };
                if best.is_none_or(|(_, current)| rank > current) {
                    best = Some((domain.as_str(), rank));
                }
            }
        }
        best.map(|(domain, _)| domain)
    }

    pub fn domains(&self) -> impl Iterator<Item = &str> {
        self.domains.iter().map(|(name, _)| name.as_str())
    }
}
