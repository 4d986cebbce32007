//! Factor group taxonomy and factor labelling.
//!
//! Groups partition (but need not cover) the factor set. When a model
//! carries a mapping, factor-keyed outputs are labelled `(group, factor)`.

use crate::error::ConfigurationError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Ordered mapping from group name to the factors it contains.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactorGroupMapping {
    groups: Vec<(String, Vec<String>)>,
}

impl FactorGroupMapping {
    /// Create an empty mapping.
    pub const fn new() -> Self {
        Self { groups: Vec::new() }
    }

    /// Add a group, keeping insertion order.
    pub fn with_group<S, I, F>(mut self, name: S, factors: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = F>,
        F: Into<String>,
    {
        self.groups
            .push((name.into(), factors.into_iter().map(Into::into).collect()));
        self
    }

    /// Iterate over `(group, factors)` in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.groups
            .iter()
            .map(|(name, factors)| (name.as_str(), factors.as_slice()))
    }

    /// Group names in insertion order.
    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|(name, _)| name.as_str())
    }

    /// Number of groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Whether the mapping has no groups.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// The group containing `factor`, if any.
    pub fn group_of(&self, factor: &str) -> Option<&str> {
        self.groups
            .iter()
            .find(|(_, members)| members.iter().any(|f| f == factor))
            .map(|(name, _)| name.as_str())
    }

    /// Check the mapping against a factor set.
    ///
    /// Group names must be unique, every member must be a model factor, and
    /// no factor may belong to two groups.
    pub fn validate(&self, factors: &[String]) -> Result<(), ConfigurationError> {
        let mut owner: HashMap<&str, &str> = HashMap::new();

        for (i, (name, members)) in self.groups.iter().enumerate() {
            if self.groups[..i].iter().any(|(other, _)| other == name) {
                return Err(ConfigurationError::DuplicateIdentifier {
                    kind: "group",
                    id: name.clone(),
                });
            }

            for factor in members {
                if !factors.contains(factor) {
                    return Err(ConfigurationError::UnknownFactor {
                        group: name.clone(),
                        factor: factor.clone(),
                    });
                }
                if let Some(first) = owner.insert(factor.as_str(), name.as_str()) {
                    return Err(ConfigurationError::OverlappingGroups {
                        factor: factor.clone(),
                        first: first.to_string(),
                        second: name.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

impl<S, F> FromIterator<(S, Vec<F>)> for FactorGroupMapping
where
    S: Into<String>,
    F: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (S, Vec<F>)>>(iter: T) -> Self {
        iter.into_iter()
            .fold(Self::new(), |mapping, (name, factors)| {
                mapping.with_group(name, factors)
            })
    }
}

/// Label of a factor in a factor-keyed output.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FactorLabel {
    /// Group the factor belongs to, when the model has a group mapping
    pub group: Option<String>,
    /// Factor identifier
    pub factor: String,
}

impl FactorLabel {
    /// A label without a group.
    pub fn flat(factor: impl Into<String>) -> Self {
        Self {
            group: None,
            factor: factor.into(),
        }
    }

    /// A `(group, factor)` label.
    pub fn grouped(group: impl Into<String>, factor: impl Into<String>) -> Self {
        Self {
            group: Some(group.into()),
            factor: factor.into(),
        }
    }
}

impl fmt::Display for FactorLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.group {
            Some(group) => write!(f, "{}/{}", group, self.factor),
            None => write!(f, "{}", self.factor),
        }
    }
}

/// Build the factor index for a factor set and optional group mapping.
///
/// Order always follows `factors`.
pub fn factor_index(factors: &[String], groups: Option<&FactorGroupMapping>) -> Vec<FactorLabel> {
    factors
        .iter()
        .map(|factor| FactorLabel {
            group: groups
                .and_then(|mapping| mapping.group_of(factor))
                .map(str::to_string),
            factor: factor.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn factors() -> Vec<String> {
        vec!["foo".into(), "bar".into(), "baz".into()]
    }

    #[test]
    fn test_valid_mapping() {
        let mapping = FactorGroupMapping::new()
            .with_group("Alpha", ["foo", "bar"])
            .with_group("Beta", ["baz"]);

        assert!(mapping.validate(&factors()).is_ok());
        assert_eq!(mapping.group_of("bar"), Some("Alpha"));
        assert_eq!(mapping.group_names().collect::<Vec<_>>(), ["Alpha", "Beta"]);
    }

    #[test]
    fn test_unknown_factor() {
        let mapping = FactorGroupMapping::new().with_group("Alpha", ["qux"]);
        assert!(matches!(
            mapping.validate(&factors()),
            Err(ConfigurationError::UnknownFactor { .. })
        ));
    }

    #[test]
    fn test_overlapping_groups() {
        let mapping = FactorGroupMapping::new()
            .with_group("Alpha", ["foo"])
            .with_group("Beta", ["foo", "baz"]);
        assert!(matches!(
            mapping.validate(&factors()),
            Err(ConfigurationError::OverlappingGroups { .. })
        ));
    }

    #[test]
    fn test_duplicate_group_name() {
        let mapping = FactorGroupMapping::new()
            .with_group("Alpha", ["foo"])
            .with_group("Alpha", ["baz"]);
        assert!(matches!(
            mapping.validate(&factors()),
            Err(ConfigurationError::DuplicateIdentifier { kind: "group", .. })
        ));
    }

    #[test]
    fn test_factor_index_partial_cover() {
        let mapping = FactorGroupMapping::new().with_group("Alpha", ["foo", "bar"]);
        let index = factor_index(&factors(), Some(&mapping));

        assert_eq!(index[0], FactorLabel::grouped("Alpha", "foo"));
        assert_eq!(index[2], FactorLabel::flat("baz"));
        assert_eq!(index[1].to_string(), "Alpha/bar");
    }
}
