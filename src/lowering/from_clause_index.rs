//! Cross-reference from SQM from-elements to the table groups lowered for them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::errors::LoweringError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupPosition {
    Root,
    /// Index into the space's table group joins
    Join(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableGroupLocator {
    pub space: usize,
    pub position: GroupPosition,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableGroupSource {
    Entity(String),
    Collection(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableGroupRef {
    pub locator: TableGroupLocator,
    pub alias_base: String,
    pub source: TableGroupSource,
}

/// From-element alias to table group, scoped to one lowering pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FromIndex {
    entries: BTreeMap<String, TableGroupRef>,
}

impl FromIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cross_reference(&mut self, alias: &str, group: TableGroupRef) -> Result<(), LoweringError> {
        if self.entries.contains_key(alias) {
            return Err(LoweringError::DuplicateFromElementAlias {
                alias: alias.to_string(),
            });
        }
        log::trace!("FromIndex: '{}' -> {:?}", alias, group);
        self.entries.insert(alias.to_string(), group);
        Ok(())
    }

    pub fn find(&self, alias: &str) -> Option<&TableGroupRef> {
        self.entries.get(alias)
    }

    pub fn resolve(&self, alias: &str) -> Result<&TableGroupRef, LoweringError> {
        self.find(alias)
            .ok_or_else(|| LoweringError::unknown_from_element(alias))
    }

    /// Reverse lookup: the from-element alias owning `alias_base`.
    pub fn find_by_alias_base(&self, alias_base: &str) -> Option<(&str, &TableGroupRef)> {
        self.entries
            .iter()
            .find(|(_, group)| group.alias_base == alias_base)
            .map(|(alias, group)| (alias.as_str(), group))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TableGroupRef)> {
        self.entries.iter().map(|(alias, group)| (alias.as_str(), group))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(base: &str, space: usize) -> TableGroupRef {
        TableGroupRef {
            locator: TableGroupLocator {
                space,
                position: GroupPosition::Root,
            },
            alias_base: base.to_string(),
            source: TableGroupSource::Entity("Base".to_string()),
        }
    }

    #[test]
    fn test_duplicate_alias_is_rejected() {
        let mut index = FromIndex::new();
        index.cross_reference("b", group("j1", 0)).unwrap();
        let err = index.cross_reference("b", group("j2", 1)).unwrap_err();
        assert_eq!(
            err,
            LoweringError::DuplicateFromElementAlias {
                alias: "b".to_string()
            }
        );
    }

    #[test]
    fn test_reverse_lookup_by_alias_base() {
        let mut index = FromIndex::new();
        index.cross_reference("a", group("j1", 0)).unwrap();
        index.cross_reference("b", group("j2", 1)).unwrap();
        let (alias, found) = index.find_by_alias_base("j2").unwrap();
        assert_eq!(alias, "b");
        assert_eq!(found.locator.space, 1);
        assert!(index.find_by_alias_base("j9").is_none());
    }

    #[test]
    fn test_unknown_alias() {
        let index = FromIndex::new();
        assert!(matches!(
            index.resolve("x"),
            Err(LoweringError::UnknownFromElement { .. })
        ));
    }

    #[test]
    fn test_serializes_as_json() {
        let mut index = FromIndex::new();
        index.cross_reference("b", group("j1", 0)).unwrap();
        let json = serde_json::to_value(&index).unwrap();
        assert_eq!(json["entries"]["b"]["alias_base"], "j1");
        let back: FromIndex = serde_json::from_value(json).unwrap();
        assert_eq!(back, index);
    }
}
