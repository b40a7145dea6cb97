// Aggregations over the filtered working set.
//
// Every function here takes the borrowed working set produced by the filter
// module and returns plain row structs ready for table preview, CSV or JSON.
// Sums tolerate zero denominators (safe_div / percent_of guard them) so an
// empty or all-zero slice yields zeroed rows instead of NaN.
use crate::types::{
    ClassifiedMeasure, FlowLink, InvestmentSummaryRow, KpiSummary, MeasureBreakdownRow, SavingsRow,
};
use crate::util;
use std::collections::{BTreeSet, HashMap};

/// Grouping axis for the grouped reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupBy {
    Region,
    Center,
}

impl GroupBy {
    pub fn label(&self) -> &'static str {
        match self {
            GroupBy::Region => "Comunidad Autónoma",
            GroupBy::Center => "Centro",
        }
    }

    fn key<'a>(&self, m: &'a ClassifiedMeasure) -> &'a str {
        match self {
            GroupBy::Region => &m.record.region,
            GroupBy::Center => &m.record.center,
        }
    }
}

/// Which savings column a grouped savings report sums.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SavingsMetric {
    Energy,
    Money,
}

impl SavingsMetric {
    pub fn label(&self) -> &'static str {
        match self {
            SavingsMetric::Energy => "Ahorro Energético (kWh)",
            SavingsMetric::Money => "Ahorro Económico (€)",
        }
    }

    fn value(&self, m: &ClassifiedMeasure) -> f64 {
        match self {
            SavingsMetric::Energy => m.record.energy_saved,
            SavingsMetric::Money => m.record.money_saved,
        }
    }
}

/// Headline totals over the working set. ROI is money saved as a percentage
/// of investment and reads 0 when nothing was invested.
pub fn kpi_summary(working_set: &[&ClassifiedMeasure]) -> KpiSummary {
    let mut kpis = KpiSummary::default();
    for m in working_set {
        kpis.total_investment += m.record.investment;
        kpis.total_money_saved += m.record.money_saved;
        kpis.total_energy_saved += m.record.energy_saved;
    }
    kpis.roi = util::percent_of(kpis.total_money_saved, kpis.total_investment);
    kpis
}

/// Per-group investment totals with measure counts, money saved and average
/// investment per measure. Sorted by total investment descending, group name
/// breaking ties.
pub fn investment_summary(
    working_set: &[&ClassifiedMeasure],
    group_by: GroupBy,
) -> Vec<InvestmentSummaryRow> {
    #[derive(Default)]
    struct Acc {
        investment: f64,
        money_saved: f64,
        count: usize,
    }

    let mut groups: HashMap<&str, Acc> = HashMap::new();
    for m in working_set {
        let acc = groups.entry(group_by.key(m)).or_default();
        acc.investment += m.record.investment;
        acc.money_saved += m.record.money_saved;
        acc.count += 1;
    }

    let mut rows: Vec<InvestmentSummaryRow> = groups
        .into_iter()
        .map(|(group, acc)| InvestmentSummaryRow {
            group: group.to_string(),
            total_investment: acc.investment,
            measure_count: acc.count,
            total_money_saved: acc.money_saved,
            avg_investment: util::safe_div(acc.investment, acc.count as f64),
        })
        .collect();
    rows.sort_by(|a, b| {
        b.total_investment
            .partial_cmp(&a.total_investment)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.group.cmp(&b.group))
    });
    rows
}

/// Sum one savings metric per group. With `percentage` on, each row also
/// carries its share of the grand total. Sorted by total descending.
pub fn savings_by_group(
    working_set: &[&ClassifiedMeasure],
    group_by: GroupBy,
    metric: SavingsMetric,
    percentage: bool,
) -> Vec<SavingsRow> {
    let mut totals: HashMap<&str, f64> = HashMap::new();
    for m in working_set {
        *totals.entry(group_by.key(m)).or_insert(0.0) += metric.value(m);
    }
    let grand_total: f64 = totals.values().sum();

    let mut rows: Vec<SavingsRow> = totals
        .into_iter()
        .map(|(group, total)| SavingsRow {
            group: group.to_string(),
            total,
            share: percentage.then(|| util::percent_of(total, grand_total)),
        })
        .collect();
    rows.sort_by(|a, b| {
        b.total
            .partial_cmp(&a.total)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.group.cmp(&b.group))
    });
    rows
}

/// Count measures per (group, category) cell. With `percentage` on, the
/// share is normalized within the group, so one group's rows sum to 100.
/// Sorted by group then category for stable output.
pub fn measure_breakdown(
    working_set: &[&ClassifiedMeasure],
    group_by: GroupBy,
    percentage: bool,
) -> Vec<MeasureBreakdownRow> {
    let mut counts: HashMap<(&str, &str), usize> = HashMap::new();
    let mut group_totals: HashMap<&str, usize> = HashMap::new();
    for m in working_set {
        *counts.entry((group_by.key(m), m.category)).or_insert(0) += 1;
        *group_totals.entry(group_by.key(m)).or_insert(0) += 1;
    }

    let mut rows: Vec<MeasureBreakdownRow> = counts
        .into_iter()
        .map(|((group, category), count)| {
            let group_total = group_totals.get(group).copied().unwrap_or(0);
            MeasureBreakdownRow {
                group: group.to_string(),
                category: category.to_string(),
                count,
                share: percentage.then(|| util::percent_of(count as f64, group_total as f64)),
            }
        })
        .collect();
    rows.sort_by(|a, b| a.group.cmp(&b.group).then_with(|| a.category.cmp(&b.category)));
    rows
}

/// Category-to-group flow of investment and the money it saves.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowStructure {
    /// Categories first (sorted), then groups not already named by a category.
    pub nodes: Vec<String>,
    pub links: Vec<FlowLink>,
}

/// A flow needs real investment to be worth drawing.
#[derive(Debug, Clone, PartialEq)]
pub enum FlowResult {
    Flow(FlowStructure),
    InsufficientData,
}

/// Build the investment flow from categories to groups. Yields
/// `InsufficientData` when the working set carries no positive investment,
/// which covers the empty set too.
pub fn investment_flow(working_set: &[&ClassifiedMeasure], group_by: GroupBy) -> FlowResult {
    let mut sums: HashMap<(&str, &str), (f64, f64)> = HashMap::new();
    let mut total_investment = 0.0;
    for m in working_set {
        let cell = sums
            .entry((m.category, group_by.key(m)))
            .or_insert((0.0, 0.0));
        cell.0 += m.record.investment;
        cell.1 += m.record.money_saved;
        total_investment += m.record.investment;
    }
    if total_investment <= 0.0 {
        return FlowResult::InsufficientData;
    }

    let mut links: Vec<FlowLink> = sums
        .into_iter()
        .map(|((category, group), (investment, money_saved))| FlowLink {
            source: category.to_string(),
            target: group.to_string(),
            investment,
            money_saved,
        })
        .collect();
    links.sort_by(|a, b| a.source.cmp(&b.source).then_with(|| a.target.cmp(&b.target)));

    let mut categories: BTreeSet<String> = BTreeSet::new();
    let mut groups: BTreeSet<String> = BTreeSet::new();
    for link in &links {
        categories.insert(link.source.clone());
        groups.insert(link.target.clone());
    }
    let mut nodes: Vec<String> = categories.iter().cloned().collect();
    for group in groups {
        if !categories.contains(&group) {
            nodes.push(group);
        }
    }

    FlowResult::Flow(FlowStructure { nodes, links })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MeasureRecord;

    fn measure(
        region: &str,
        center: &str,
        category: &'static str,
        energy: f64,
        money: f64,
        investment: f64,
    ) -> ClassifiedMeasure {
        ClassifiedMeasure {
            record: MeasureRecord {
                region: region.to_string(),
                center: center.to_string(),
                measure: "Medida".to_string(),
                energy_saved: energy,
                money_saved: money,
                investment,
                payback_years: 0.0,
            },
            category,
            base_code: None,
        }
    }

    fn refs(data: &[ClassifiedMeasure]) -> Vec<&ClassifiedMeasure> {
        data.iter().collect()
    }

    #[test]
    fn test_kpi_summary_sums_and_roi() {
        let data = vec![
            measure("Madrid", "Centro Norte", "Control térmico", 1000.0, 300.0, 1500.0),
            measure("Madrid", "Centro Sur", "Gestión energética", 500.0, 200.0, 500.0),
        ];
        let kpis = kpi_summary(&refs(&data));
        assert_eq!(kpis.total_investment, 2000.0);
        assert_eq!(kpis.total_money_saved, 500.0);
        assert_eq!(kpis.total_energy_saved, 1500.0);
        assert!((kpis.roi - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_kpi_roi_over_mixed_investments() {
        let data = vec![
            measure("Madrid", "Centro Norte", "Control térmico", 0.0, 50.0, 100.0),
            measure("Madrid", "Centro Sur", "Gestión energética", 0.0, 50.0, 200.0),
            measure("Cataluña", "Centro Este", "Gestión energética", 0.0, 0.0, 0.0),
        ];
        let kpis = kpi_summary(&refs(&data));
        assert_eq!(kpis.total_investment, 300.0);
        assert_eq!(kpis.total_money_saved, 100.0);
        assert!((kpis.roi - 100.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_kpi_roi_reads_zero_without_investment() {
        let data = vec![measure("Madrid", "Centro Norte", "Control térmico", 100.0, 50.0, 0.0)];
        let kpis = kpi_summary(&refs(&data));
        assert_eq!(kpis.roi, 0.0);

        let empty = kpi_summary(&[]);
        assert_eq!(empty, KpiSummary::default());
    }

    #[test]
    fn test_investment_summary_orders_by_total_descending() {
        let data = vec![
            measure("Madrid", "Centro Norte", "Control térmico", 0.0, 100.0, 1000.0),
            measure("Madrid", "Centro Sur", "Control térmico", 0.0, 100.0, 3000.0),
            measure("Cataluña", "Centro Este", "Control térmico", 0.0, 500.0, 6000.0),
        ];
        let rows = investment_summary(&refs(&data), GroupBy::Region);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].group, "Cataluña");
        assert_eq!(rows[0].total_investment, 6000.0);
        assert_eq!(rows[0].measure_count, 1);
        assert_eq!(rows[1].group, "Madrid");
        assert_eq!(rows[1].total_investment, 4000.0);
        assert_eq!(rows[1].measure_count, 2);
        assert_eq!(rows[1].total_money_saved, 200.0);
        assert!((rows[1].avg_investment - 2000.0).abs() < 1e-9);
    }

    #[test]
    fn test_investment_summary_breaks_ties_by_group_name() {
        let data = vec![
            measure("Madrid", "Centro Norte", "Control térmico", 0.0, 0.0, 500.0),
            measure("Andalucía", "Centro Oeste", "Control térmico", 0.0, 0.0, 500.0),
        ];
        let rows = investment_summary(&refs(&data), GroupBy::Region);
        assert_eq!(rows[0].group, "Andalucía");
        assert_eq!(rows[1].group, "Madrid");
    }

    #[test]
    fn test_savings_by_group_sums_the_chosen_metric() {
        let data = vec![
            measure("Madrid", "Centro Norte", "Control térmico", 1000.0, 10.0, 0.0),
            measure("Madrid", "Centro Sur", "Control térmico", 500.0, 20.0, 0.0),
            measure("Cataluña", "Centro Este", "Control térmico", 2000.0, 5.0, 0.0),
        ];
        let ws = refs(&data);

        let energy = savings_by_group(&ws, GroupBy::Region, SavingsMetric::Energy, false);
        assert_eq!(energy[0].group, "Cataluña");
        assert_eq!(energy[0].total, 2000.0);
        assert_eq!(energy[0].share, None);
        assert_eq!(energy[1].group, "Madrid");
        assert_eq!(energy[1].total, 1500.0);

        let money = savings_by_group(&ws, GroupBy::Region, SavingsMetric::Money, false);
        assert_eq!(money[0].group, "Madrid");
        assert_eq!(money[0].total, 30.0);
    }

    #[test]
    fn test_savings_shares_sum_to_one_hundred() {
        let data = vec![
            measure("Madrid", "Centro Norte", "Control térmico", 750.0, 0.0, 0.0),
            measure("Cataluña", "Centro Este", "Control térmico", 250.0, 0.0, 0.0),
        ];
        let rows = savings_by_group(&refs(&data), GroupBy::Region, SavingsMetric::Energy, true);
        let total: f64 = rows.iter().map(|r| r.share.unwrap()).sum();
        assert!((total - 100.0).abs() < 1e-9);
        assert_eq!(rows[0].share, Some(75.0));
    }

    #[test]
    fn test_savings_shares_guard_a_zero_total() {
        let data = vec![measure("Madrid", "Centro Norte", "Control térmico", 0.0, 0.0, 0.0)];
        let rows = savings_by_group(&refs(&data), GroupBy::Region, SavingsMetric::Energy, true);
        assert_eq!(rows[0].share, Some(0.0));
    }

    #[test]
    fn test_measure_breakdown_counts_cells() {
        let data = vec![
            measure("Madrid", "Centro Norte", "Control térmico", 0.0, 0.0, 0.0),
            measure("Madrid", "Centro Norte", "Control térmico", 0.0, 0.0, 0.0),
            measure("Madrid", "Centro Norte", "Iluminación eficiente", 0.0, 0.0, 0.0),
            measure("Cataluña", "Centro Este", "Gestión energética", 0.0, 0.0, 0.0),
        ];
        let rows = measure_breakdown(&refs(&data), GroupBy::Region, false);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].group, "Cataluña");
        assert_eq!(rows[0].category, "Gestión energética");
        assert_eq!(rows[0].count, 1);
        assert_eq!(rows[1].group, "Madrid");
        assert_eq!(rows[1].category, "Control térmico");
        assert_eq!(rows[1].count, 2);
        assert_eq!(rows[2].category, "Iluminación eficiente");
    }

    #[test]
    fn test_breakdown_shares_normalize_within_each_group() {
        let data = vec![
            measure("Madrid", "Centro Norte", "Control térmico", 0.0, 0.0, 0.0),
            measure("Madrid", "Centro Norte", "Control térmico", 0.0, 0.0, 0.0),
            measure("Madrid", "Centro Norte", "Control térmico", 0.0, 0.0, 0.0),
            measure("Madrid", "Centro Norte", "Iluminación eficiente", 0.0, 0.0, 0.0),
            measure("Cataluña", "Centro Este", "Gestión energética", 0.0, 0.0, 0.0),
            measure("Cataluña", "Centro Este", "Gestión energética", 0.0, 0.0, 0.0),
        ];
        let rows = measure_breakdown(&refs(&data), GroupBy::Region, true);

        for group in ["Madrid", "Cataluña"] {
            let group_sum: f64 = rows
                .iter()
                .filter(|r| r.group == group)
                .map(|r| r.share.unwrap())
                .sum();
            assert!((group_sum - 100.0).abs() < 1e-9, "{group} sums to {group_sum}");
        }
        let madrid_thermal = rows
            .iter()
            .find(|r| r.group == "Madrid" && r.category == "Control térmico")
            .unwrap();
        assert_eq!(madrid_thermal.share, Some(75.0));
    }

    #[test]
    fn test_investment_flow_links_and_nodes() {
        let data = vec![
            measure("Madrid", "Centro Norte", "Control térmico", 0.0, 100.0, 1000.0),
            measure("Madrid", "Centro Norte", "Control térmico", 0.0, 50.0, 500.0),
            measure("Cataluña", "Centro Este", "Iluminación eficiente", 0.0, 80.0, 400.0),
        ];
        let result = investment_flow(&refs(&data), GroupBy::Region);
        let flow = match result {
            FlowResult::Flow(flow) => flow,
            FlowResult::InsufficientData => panic!("expected a flow"),
        };

        assert_eq!(
            flow.nodes,
            vec!["Control térmico", "Iluminación eficiente", "Cataluña", "Madrid"]
        );
        assert_eq!(flow.links.len(), 2);
        assert_eq!(flow.links[0].source, "Control térmico");
        assert_eq!(flow.links[0].target, "Madrid");
        assert_eq!(flow.links[0].investment, 1500.0);
        assert_eq!(flow.links[0].money_saved, 150.0);
        assert_eq!(flow.links[1].source, "Iluminación eficiente");
        assert_eq!(flow.links[1].target, "Cataluña");
    }

    #[test]
    fn test_investment_flow_needs_positive_investment() {
        let data = vec![measure("Madrid", "Centro Norte", "Control térmico", 100.0, 50.0, 0.0)];
        assert_eq!(
            investment_flow(&refs(&data), GroupBy::Region),
            FlowResult::InsufficientData
        );
        assert_eq!(investment_flow(&[], GroupBy::Region), FlowResult::InsufficientData);
    }

    #[test]
    fn test_grouping_by_center_uses_center_keys() {
        let data = vec![
            measure("Madrid", "Centro Norte", "Control térmico", 100.0, 0.0, 0.0),
            measure("Madrid", "Centro Sur", "Control térmico", 300.0, 0.0, 0.0),
        ];
        let rows = savings_by_group(&refs(&data), GroupBy::Center, SavingsMetric::Energy, false);
        assert_eq!(rows[0].group, "Centro Sur");
        assert_eq!(rows[1].group, "Centro Norte");
    }
}
