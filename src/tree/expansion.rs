use std::collections::HashMap;

use super::TreeNode;

/// Per-individual expand/collapse overrides for a tree view.
///
/// An override always wins over the node's own `is_expanded`, and overrides
/// survive rebuilding the tree from fresh data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpansionState {
    overrides: HashMap<i64, bool>,
}

impl ExpansionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_expanded(&self, node: &TreeNode) -> bool {
        self.overrides
            .get(&node.individual.id)
            .copied()
            .unwrap_or(node.is_expanded)
    }

    pub fn get(&self, id: i64) -> Option<bool> {
        self.overrides.get(&id).copied()
    }

    /// Flip the effective state of `id` and return the new value. Nodes
    /// without an override count as expanded.
    pub fn toggle(&mut self, id: i64) -> bool {
        let next = !self.overrides.get(&id).copied().unwrap_or(true);
        self.overrides.insert(id, next);
        next
    }

    pub fn set(&mut self, id: i64, expanded: bool) {
        self.overrides.insert(id, expanded);
    }

    pub fn collapse(&mut self, id: i64) {
        self.set(id, false);
    }

    pub fn expand(&mut self, id: i64) {
        self.set(id, true);
    }

    pub fn clear(&mut self) {
        self.overrides.clear();
    }

    pub fn len(&self) -> usize {
        self.overrides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::build_tree;
    use crate::tree::test_support::{child, person};

    #[test]
    fn nodes_default_to_expanded() {
        let people = vec![person(1, "A")];
        let built = build_tree(&people[0], &people, &[]);
        assert!(ExpansionState::new().is_expanded(&built.root));
    }

    #[test]
    fn first_toggle_collapses_and_second_expands() {
        let mut state = ExpansionState::new();
        assert!(!state.toggle(5));
        assert!(state.toggle(5));
    }

    #[test]
    fn toggle_does_not_touch_other_ids() {
        let people = vec![person(1, "A"), person(2, "B"), person(3, "C")];
        let edges = vec![child(1, 1, 2), child(2, 2, 3)];
        let built = build_tree(&people[0], &people, &edges);

        let mut state = ExpansionState::new();
        state.toggle(2);

        assert!(state.is_expanded(&built.root));
        assert!(!state.is_expanded(built.root.find(2).unwrap()));
        assert!(state.is_expanded(built.root.find(3).unwrap()));
        assert_eq!(state.len(), 1);
    }

    #[test]
    fn override_wins_over_node_flag() {
        let people = vec![person(1, "A")];
        let mut built = build_tree(&people[0], &people, &[]);
        built.root.is_expanded = false;

        let mut state = ExpansionState::new();
        assert!(!state.is_expanded(&built.root));
        state.expand(1);
        assert!(state.is_expanded(&built.root));
    }
}
