use crate::types::ResolvedHole;
use indexmap::IndexMap;

/// Holes bucketed by their formatted diameter.
///
/// The key is the rendered string, not the numeric value: two radii that
/// round to the same displayed diameter share a bucket. Buckets iterate in
/// the order their first hole arrived, and holes keep arrival order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiameterGroups {
    groups: IndexMap<String, Vec<ResolvedHole>>,
}

impl DiameterGroups {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, hole: ResolvedHole) {
        self.groups
            .entry(hole.diameter.clone())
            .or_default()
            .push(hole);
    }

    /// Number of distinct diameters.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total number of holes across all diameters.
    pub fn hole_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    pub fn get(&self, diameter: &str) -> Option<&[ResolvedHole]> {
        self.groups.get(diameter).map(Vec::as_slice)
    }

    pub fn diameters(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[ResolvedHole])> {
        self.groups
            .iter()
            .map(|(diameter, holes)| (diameter.as_str(), holes.as_slice()))
    }
}

impl FromIterator<ResolvedHole> for DiameterGroups {
    fn from_iter<I: IntoIterator<Item = ResolvedHole>>(iter: I) -> Self {
        let mut groups = Self::new();
        for hole in iter {
            groups.insert(hole);
        }
        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hole(diameter: &str, x: &str) -> ResolvedHole {
        ResolvedHole {
            diameter: diameter.to_string(),
            x: x.to_string(),
            y: "0.00".to_string(),
            source_id: None,
        }
    }

    #[test]
    fn test_groups_keep_first_encounter_order() {
        let groups: DiameterGroups = vec![
            hole("3.00", "1"),
            hole("1.00", "2"),
            hole("3.00", "3"),
            hole("2.00", "4"),
            hole("1.00", "5"),
        ]
        .into_iter()
        .collect();

        assert_eq!(groups.diameters().collect::<Vec<_>>(), vec!["3.00", "1.00", "2.00"]);
        let threes: Vec<&str> = groups.get("3.00").unwrap().iter().map(|h| h.x.as_str()).collect();
        assert_eq!(threes, vec!["1", "3"]);
        assert_eq!(groups.len(), 3);
        assert_eq!(groups.hole_count(), 5);
    }

    #[test]
    fn test_equal_rendered_diameters_merge() {
        // r=5 and r=5.001 both render as 10.00 at two decimals.
        let a = format!("{:.2}", 5.0_f64 * 2.0);
        let b = format!("{:.2}", 5.001_f64 * 2.0);
        let groups: DiameterGroups = vec![hole(&a, "1"), hole(&b, "2")].into_iter().collect();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups.get("10.00").map(<[_]>::len), Some(2));
    }

    #[test]
    fn test_empty_groups_are_never_created() {
        let groups = DiameterGroups::new();
        assert!(groups.is_empty());
        assert_eq!(groups.get("1.00"), None);
        assert!(groups.iter().all(|(_, holes)| !holes.is_empty()));
    }
}
