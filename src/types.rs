use serde::Serialize;
use tabled::Tabled;

/// One normalized row of the audit table: a proposed efficiency measure at a
/// center, with its yearly savings and one-time cost.
///
/// Numeric fields are already cleaned by the loader: never NaN or infinite,
/// 0 where the source cell was missing or unusable, and non-negative for
/// `energy_saved` and `investment`.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasureRecord {
    pub region: String,
    pub center: String,
    pub measure: String,
    pub energy_saved: f64,
    pub money_saved: f64,
    pub investment: f64,
    pub payback_years: f64,
}

/// A record plus its category under the scheme it was classified with.
///
/// `base_code` is only populated by the coded scheme; every other scheme
/// leaves it `None`. The wrapped record itself is never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedMeasure {
    pub record: MeasureRecord,
    pub category: &'static str,
    pub base_code: Option<&'static str>,
}

/// Headline figures over the current working set. `roi` is
/// `100 * total_money_saved / total_investment`, 0 when nothing was invested.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct KpiSummary {
    pub total_investment: f64,
    pub total_money_saved: f64,
    pub total_energy_saved: f64,
    pub roi: f64,
}

/// Measure counts per (group, category) cell. `share` is the count's
/// percentage of its own group's total, present only when percentage
/// normalization was requested.
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct MeasureBreakdownRow {
    #[serde(rename = "Group")]
    #[tabled(rename = "Group")]
    pub group: String,
    #[serde(rename = "Category")]
    #[tabled(rename = "Category")]
    pub category: String,
    #[serde(rename = "Count")]
    #[tabled(rename = "Count")]
    pub count: usize,
    #[serde(rename = "Share")]
    #[tabled(rename = "Share", display_with = "crate::util::display_share")]
    pub share: Option<f64>,
}

/// Per-group sum of one savings metric (energy or money). `share` is the
/// group's percentage of the working-set total when requested.
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct SavingsRow {
    #[serde(rename = "Group")]
    #[tabled(rename = "Group")]
    pub group: String,
    #[serde(rename = "Total")]
    #[tabled(rename = "Total", display_with = "crate::util::display_amount")]
    pub total: f64,
    #[serde(rename = "Share")]
    #[tabled(rename = "Share", display_with = "crate::util::display_share")]
    pub share: Option<f64>,
}

/// Per-group investment roll-up for the summary table.
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct InvestmentSummaryRow {
    #[serde(rename = "Group")]
    #[tabled(rename = "Group")]
    pub group: String,
    #[serde(rename = "TotalInvestment")]
    #[tabled(rename = "TotalInvestment", display_with = "crate::util::display_amount")]
    pub total_investment: f64,
    #[serde(rename = "MeasureCount")]
    #[tabled(rename = "MeasureCount")]
    pub measure_count: usize,
    #[serde(rename = "TotalMoneySaved")]
    #[tabled(rename = "TotalMoneySaved", display_with = "crate::util::display_amount")]
    pub total_money_saved: f64,
    #[serde(rename = "AvgInvestmentPerMeasure")]
    #[tabled(rename = "AvgInvestmentPerMeasure", display_with = "crate::util::display_amount")]
    pub avg_investment: f64,
}

/// One measure of the working set with its occurrence-numbered display code,
/// rendered under the coded scheme.
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct CodedMeasureRow {
    #[serde(rename = "Code")]
    #[tabled(rename = "Code")]
    pub code: String,
    #[serde(rename = "Region")]
    #[tabled(rename = "Region")]
    pub region: String,
    #[serde(rename = "Center")]
    #[tabled(rename = "Center")]
    pub center: String,
    #[serde(rename = "Measure")]
    #[tabled(rename = "Measure")]
    pub measure: String,
    #[serde(rename = "Investment")]
    #[tabled(rename = "Investment", display_with = "crate::util::display_amount")]
    pub investment: f64,
    #[serde(rename = "MoneySaved")]
    #[tabled(rename = "MoneySaved", display_with = "crate::util::display_amount")]
    pub money_saved: f64,
}

/// One category→group link of the investment flow structure. Doubles as the
/// exported row type; `source`/`target` index into the structure's node list
/// by label.
#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct FlowLink {
    #[serde(rename = "Source")]
    #[tabled(rename = "Source")]
    pub source: String,
    #[serde(rename = "Target")]
    #[tabled(rename = "Target")]
    pub target: String,
    #[serde(rename = "Investment")]
    #[tabled(rename = "Investment", display_with = "crate::util::display_amount")]
    pub investment: f64,
    #[serde(rename = "MoneySaved")]
    #[tabled(rename = "MoneySaved", display_with = "crate::util::display_amount")]
    pub money_saved: f64,
}

/// Snapshot of one generated analysis, exported as pretty JSON next to the
/// report CSVs.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisSummary {
    pub scheme: String,
    pub group_by: String,
    pub regions_selected: usize,
    pub centers_selected: Option<usize>,
    pub measures: usize,
    pub kpis: KpiSummary,
}
