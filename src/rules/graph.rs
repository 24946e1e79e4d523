//! Precomputed nesting graph.

use super::{Rule, RuleId};

/// For each rule, the ordered list of rules it may push as children.
#[derive(Debug, Clone, Default)]
pub struct RuleGraph {
    children: Vec<Vec<RuleId>>,
}

impl RuleGraph {
    /// Connect every rule that declares allowed kinds to each other rule
    /// whose kind it accepts, preserving table order.
    pub fn build(rules: &[Rule]) -> Self {
        let children = rules
            .iter()
            .enumerate()
            .map(|(src_idx, src)| {
                if src.allowed().is_empty() {
                    return Vec::new();
                }
                rules
                    .iter()
                    .enumerate()
                    .filter(|(dest_idx, dest)| {
                        *dest_idx != src_idx && dest.kind().is_some_and(|k| src.allows_kind(k))
                    })
                    .map(|(dest_idx, _)| RuleId(dest_idx))
                    .collect()
            })
            .collect();
        Self { children }
    }

    pub fn children(&self, id: RuleId) -> &[RuleId] {
        self.children.get(id.0).map_or(&[], Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}
