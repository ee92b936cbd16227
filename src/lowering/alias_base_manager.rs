use std::collections::HashMap;

/// Hands out alias bases (`j1`, `j2`, ...) for one lowering pass.
///
/// Bases are numbered in first-seen order. Asking again for the same
/// from-element returns the base it already has.
#[derive(Debug, Clone)]
pub struct AliasBaseManager {
    prefix: String,
    counter: usize,
    assigned: HashMap<String, String>,
}

impl AliasBaseManager {
    pub fn new(prefix: impl Into<String>) -> Self {
        AliasBaseManager {
            prefix: prefix.into(),
            counter: 0,
            assigned: HashMap::new(),
        }
    }

    /// Alias base of the from-element identified by `from_element_alias`.
    pub fn alias_base_for(&mut self, from_element_alias: &str) -> String {
        if let Some(base) = self.assigned.get(from_element_alias) {
            return base.clone();
        }
        let base = self.generate_alias_base();
        log::debug!(
            "AliasBaseManager: from-element '{}' -> alias base '{}'",
            from_element_alias,
            base
        );
        self.assigned
            .insert(from_element_alias.to_string(), base.clone());
        base
    }

    /// Fresh base not tied to a from-element (e.g. correlated subqueries).
    pub fn generate_alias_base(&mut self) -> String {
        self.counter += 1;
        format!("{}{}", self.prefix, self.counter)
    }

    pub fn assigned(&self, from_element_alias: &str) -> Option<&str> {
        self.assigned.get(from_element_alias).map(String::as_str)
    }
}

impl Default for AliasBaseManager {
    fn default() -> Self {
        Self::new("j")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bases_follow_first_seen_order() {
        let mut manager = AliasBaseManager::default();
        assert_eq!(manager.alias_base_for("p"), "j1");
        assert_eq!(manager.alias_base_for("o"), "j2");
        assert_eq!(manager.alias_base_for("c"), "j3");
    }

    #[test]
    fn test_alias_base_is_idempotent() {
        let mut manager = AliasBaseManager::default();
        let first = manager.alias_base_for("p");
        manager.alias_base_for("o");
        assert_eq!(manager.alias_base_for("p"), first);
        assert_eq!(manager.assigned("p"), Some("j1"));
    }

    #[test]
    fn test_generated_bases_never_collide() {
        let mut manager = AliasBaseManager::new("t");
        let a = manager.alias_base_for("p");
        let b = manager.generate_alias_base();
        let c = manager.alias_base_for("q");
        assert_eq!(vec![a, b, c], vec!["t1", "t2", "t3"]);
    }
}
