// Region and center filtering.
//
// A Selection is a plain value describing which slice of the dataset a report
// should cover. Callers build a new Selection and swap it in; nothing here
// mutates shared state, so two reports generated from the same value always
// agree. Centers are a dependent filter: the candidate list is derived from
// the currently selected regions, and a region change has to rescope any
// center picks that no longer exist.
use crate::types::ClassifiedMeasure;
use std::collections::BTreeSet;

/// Which regions and centers a report covers.
///
/// `centers: None` means center detail is off and every center inside the
/// selected regions counts. `Some` holds an explicit pick, and an explicit
/// empty set is honored as "nothing selected", same as an empty region set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub regions: BTreeSet<String>,
    pub centers: Option<BTreeSet<String>>,
}

impl Selection {
    /// The post-load default: every region, no center detail.
    pub fn all_regions(measures: &[ClassifiedMeasure]) -> Selection {
        Selection {
            regions: measures.iter().map(|m| m.record.region.clone()).collect(),
            centers: None,
        }
    }

    /// Re-validate the center picks against a fresh candidate list after the
    /// region set changed. Picks that survive are kept; if every pick was
    /// invalidated the selection falls back to all candidates. An explicit
    /// empty pick stays empty.
    pub fn rescoped(self, candidates: &[String]) -> Selection {
        let centers = match self.centers {
            None => None,
            Some(selected) if selected.is_empty() => Some(selected),
            Some(selected) => {
                let surviving: BTreeSet<String> = selected
                    .into_iter()
                    .filter(|center| candidates.contains(center))
                    .collect();
                if surviving.is_empty() {
                    None
                } else {
                    Some(surviving)
                }
            }
        };
        Selection {
            regions: self.regions,
            centers,
        }
    }
}

/// Sorted, de-duplicated regions present in the dataset.
pub fn region_list(measures: &[ClassifiedMeasure]) -> Vec<String> {
    let regions: BTreeSet<String> = measures.iter().map(|m| m.record.region.clone()).collect();
    regions.into_iter().collect()
}

/// Sorted, de-duplicated centers of the records inside the given regions.
pub fn center_candidates(measures: &[ClassifiedMeasure], regions: &BTreeSet<String>) -> Vec<String> {
    let mut centers = BTreeSet::new();
    for m in measures {
        if regions.contains(&m.record.region) {
            centers.insert(m.record.center.clone());
        }
    }
    centers.into_iter().collect()
}

/// Borrowed view of the records a Selection covers, in dataset order.
pub fn working_set<'a>(
    measures: &'a [ClassifiedMeasure],
    selection: &Selection,
) -> Vec<&'a ClassifiedMeasure> {
    // Nothing selected reads as an empty report, never as all rows.
    if selection.regions.is_empty() {
        return Vec::new();
    }
    measures
        .iter()
        .filter(|m| selection.regions.contains(&m.record.region))
        .filter(|m| {
            selection
                .centers
                .as_ref()
                .map_or(true, |centers| centers.contains(&m.record.center))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MeasureRecord;

    fn measure(region: &str, center: &str) -> ClassifiedMeasure {
        ClassifiedMeasure {
            record: MeasureRecord {
                region: region.to_string(),
                center: center.to_string(),
                measure: "Buenas prácticas".to_string(),
                energy_saved: 1.0,
                money_saved: 1.0,
                investment: 1.0,
                payback_years: 1.0,
            },
            category: "Gestión energética",
            base_code: None,
        }
    }

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn dataset() -> Vec<ClassifiedMeasure> {
        vec![
            measure("Madrid", "Centro Norte"),
            measure("Madrid", "Centro Sur"),
            measure("Cataluña", "Centro Este"),
            measure("Cataluña", "Centro Este"),
            measure("Andalucía", "Centro Oeste"),
        ]
    }

    #[test]
    fn test_region_list_is_sorted_and_unique() {
        let regions = region_list(&dataset());
        assert_eq!(regions, vec!["Andalucía", "Cataluña", "Madrid"]);
    }

    #[test]
    fn test_center_candidates_follow_the_selected_regions() {
        let data = dataset();
        assert_eq!(
            center_candidates(&data, &set(&["Madrid"])),
            vec!["Centro Norte", "Centro Sur"]
        );
        assert_eq!(
            center_candidates(&data, &set(&["Cataluña"])),
            vec!["Centro Este"]
        );
        assert!(center_candidates(&data, &set(&[])).is_empty());
    }

    #[test]
    fn test_no_center_detail_covers_all_centers() {
        let data = dataset();
        let selection = Selection {
            regions: set(&["Madrid", "Cataluña"]),
            centers: None,
        };
        assert_eq!(working_set(&data, &selection).len(), 4);
    }

    #[test]
    fn test_center_picks_narrow_the_working_set() {
        let data = dataset();
        let selection = Selection {
            regions: set(&["Madrid"]),
            centers: Some(set(&["Centro Sur"])),
        };
        let ws = working_set(&data, &selection);
        assert_eq!(ws.len(), 1);
        assert_eq!(ws[0].record.center, "Centro Sur");
    }

    #[test]
    fn test_empty_region_selection_yields_empty_working_set() {
        let data = dataset();
        let selection = Selection::default();
        assert!(working_set(&data, &selection).is_empty());
    }

    #[test]
    fn test_explicit_empty_center_pick_yields_empty_working_set() {
        let data = dataset();
        let selection = Selection {
            regions: set(&["Madrid"]),
            centers: Some(BTreeSet::new()),
        };
        assert!(working_set(&data, &selection).is_empty());
    }

    #[test]
    fn test_rescoping_keeps_surviving_picks() {
        let selection = Selection {
            regions: set(&["Madrid"]),
            centers: Some(set(&["Centro Norte", "Centro Este"])),
        };
        let candidates = vec!["Centro Norte".to_string(), "Centro Sur".to_string()];
        let rescoped = selection.rescoped(&candidates);
        assert_eq!(rescoped.centers, Some(set(&["Centro Norte"])));
    }

    #[test]
    fn test_rescoping_resets_when_every_pick_is_invalidated() {
        let selection = Selection {
            regions: set(&["Cataluña"]),
            centers: Some(set(&["Centro Norte", "Centro Sur"])),
        };
        let candidates = vec!["Centro Este".to_string()];
        let rescoped = selection.rescoped(&candidates);
        assert_eq!(rescoped.centers, None);
    }

    #[test]
    fn test_rescoping_preserves_explicit_empty_and_no_detail() {
        let explicit_empty = Selection {
            regions: set(&["Madrid"]),
            centers: Some(BTreeSet::new()),
        };
        let candidates = vec!["Centro Norte".to_string()];
        assert_eq!(
            explicit_empty.rescoped(&candidates).centers,
            Some(BTreeSet::new())
        );

        let no_detail = Selection {
            regions: set(&["Madrid"]),
            centers: None,
        };
        assert_eq!(no_detail.rescoped(&candidates).centers, None);
    }

    #[test]
    fn test_working_set_is_a_pure_function_of_its_inputs() {
        let data = dataset();
        let selection = Selection {
            regions: set(&["Madrid", "Cataluña"]),
            centers: Some(set(&["Centro Norte", "Centro Este"])),
        };
        let first = working_set(&data, &selection);
        let second = working_set(&data, &selection);
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
    }

    #[test]
    fn test_rescoping_twice_changes_nothing_further() {
        let selection = Selection {
            regions: set(&["Madrid"]),
            centers: Some(set(&["Centro Norte", "Centro Este"])),
        };
        let candidates = vec!["Centro Norte".to_string(), "Centro Sur".to_string()];
        let once = selection.rescoped(&candidates);
        let twice = once.clone().rescoped(&candidates);
        assert_eq!(once, twice);
    }
}
