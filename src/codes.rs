// Sequential measure codes.
//
// Under the coded scheme every matched record carries a base code such as
// "A.1"; this module appends a per-(region, base) ordinal so the third air
// curtain in Madrid reads "A.3.3". Numbering always reflects the slice it is
// given, so narrowing the working set and resequencing yields codes that are
// contiguous again.
use crate::classify::{UNCATEGORIZED, UNCATEGORIZED_CODE};
use crate::types::ClassifiedMeasure;
use std::collections::HashMap;

/// Assign display codes to an already-filtered working set, in slice order.
/// Ordinals start at 1 and are scoped to the (region, base code) pair.
/// Records without a usable base code get the uncategorized label and never
/// consume an ordinal.
pub fn sequence_codes(measures: &[&ClassifiedMeasure]) -> Vec<String> {
    let mut counters: HashMap<(&str, &str), usize> = HashMap::new();
    measures
        .iter()
        .map(|m| match m.base_code {
            Some(base) if base != UNCATEGORIZED_CODE => {
                let n = counters
                    .entry((m.record.region.as_str(), base))
                    .or_insert(0);
                *n += 1;
                format!("{base}.{n}")
            }
            _ => UNCATEGORIZED.to_string(),
        })
        .collect()
}
