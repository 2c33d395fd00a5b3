//! Work units: one fully-specified filter combination per unit.

use std::fmt;

use super::dimension::FilterDimension;

/// Identity of a work unit, rendered from its assignments. Used as the
/// progress-tracking key and in log lines.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitKey(String);

impl UnitKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UnitKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Terminal state of a work unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitOutcome {
    /// Data was accumulated and persisted.
    Succeeded,
    /// The combination legitimately has no data; skipped before accumulation.
    EmptySkipped,
    /// Any unhandled error during the unit's lifetime.
    Failed,
}

/// One point in the product of a target's filter dimensions. Assignments are
/// ordered to match the target's declared dimension order, which is also the
/// order they are applied in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkUnit {
    assignments: Vec<(&'static str, String)>,
}

impl WorkUnit {
    pub fn new(assignments: Vec<(&'static str, String)>) -> Self {
        Self { assignments }
    }

    /// Enumerates the full Cartesian product of the given dimensions, in
    /// lexicographic order over their declared value lists.
    pub fn cartesian(dimensions: &[FilterDimension]) -> Vec<WorkUnit> {
        let mut units = vec![WorkUnit::new(Vec::new())];
        for dim in dimensions {
            let mut next = Vec::with_capacity(units.len() * dim.values.len().max(1));
            for unit in &units {
                for value in &dim.values {
                    let mut assignments = unit.assignments.clone();
                    assignments.push((dim.name, value.clone()));
                    next.push(WorkUnit::new(assignments));
                }
            }
            units = next;
        }
        units
    }

    /// Ordered `(dimension, value)` assignments.
    pub fn assignments(&self) -> &[(&'static str, String)] {
        &self.assignments
    }

    /// Value assigned to the named dimension, if any.
    pub fn value_of(&self, dimension: &str) -> Option<&str> {
        self.assignments
            .iter()
            .find(|(name, _)| *name == dimension)
            .map(|(_, value)| value.as_str())
    }

    pub fn key(&self) -> UnitKey {
        let rendered = self
            .assignments
            .iter()
            .map(|(_, value)| value.as_str())
            .collect::<Vec<_>>()
            .join(" <-> ");
        UnitKey(rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dimension::{values_of, FilterDimension};

    fn dims() -> Vec<FilterDimension> {
        vec![
            FilterDimension::search("STATE_NAME", values_of(&["ASSAM", "BIHAR"])),
            FilterDimension::direct("ACADEMIC_SESSION", values_of(&["2015"])),
            FilterDimension::direct("CATEGORY", values_of(&["GEN", "SC"])),
        ]
    }

    #[test]
    fn cartesian_covers_every_combination_once() {
        let units = WorkUnit::cartesian(&dims());
        assert_eq!(units.len(), 4);

        let keys: Vec<String> = units.iter().map(|u| u.key().to_string()).collect();
        let mut deduped = keys.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(deduped.len(), 4, "unit keys must be unique");
        assert!(keys.contains(&"ASSAM <-> 2015 <-> GEN".to_string()));
        assert!(keys.contains(&"BIHAR <-> 2015 <-> SC".to_string()));
    }

    #[test]
    fn assignments_preserve_dimension_order() {
        let units = WorkUnit::cartesian(&dims());
        for unit in &units {
            let order: Vec<&str> = unit.assignments().iter().map(|(n, _)| *n).collect();
            assert_eq!(order, vec!["STATE_NAME", "ACADEMIC_SESSION", "CATEGORY"]);
        }
    }

    #[test]
    fn value_lookup_by_dimension_name() {
        let unit = WorkUnit::new(vec![
            ("STATE_NAME", "GOA".to_string()),
            ("CATEGORY", "OBC".to_string()),
        ]);
        assert_eq!(unit.value_of("STATE_NAME"), Some("GOA"));
        assert_eq!(unit.value_of("CATEGORY"), Some("OBC"));
        assert_eq!(unit.value_of("DISTRICT_NAME"), None);
    }
}
