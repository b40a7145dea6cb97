use crate::error::{AuditError, Result};
use crate::types::MeasureRecord;
use crate::util;
use csv::ReaderBuilder;
use std::fs::File;
use std::io::Read;

/// Canonical fields of the audit table. Source files name them differently
/// depending on which export produced them; the `AliasTable` bridges the gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Region,
    Center,
    Measure,
    EnergySaved,
    MoneySaved,
    Investment,
    Payback,
}

impl Column {
    fn name(self) -> &'static str {
        match self {
            Column::Region => "region",
            Column::Center => "center",
            Column::Measure => "measure",
            Column::EnergySaved => "energy saved",
            Column::MoneySaved => "money saved",
            Column::Investment => "investment",
            Column::Payback => "payback period",
        }
    }
}

/// Maps source column names to canonical fields.
///
/// Lookup is case-sensitive but tolerant of surrounding whitespace in the
/// header cell; the default table knows both naming schemes seen in the
/// dataset family, so either can be loaded without configuration.
#[derive(Debug, Clone)]
pub struct AliasTable {
    entries: Vec<(String, Column)>,
}

impl Default for AliasTable {
    fn default() -> Self {
        let mut table = AliasTable { entries: Vec::new() };
        for (alias, column) in [
            ("Comunidad Autónoma", Column::Region),
            ("Comunidad", Column::Region),
            ("Region", Column::Region),
            ("Center", Column::Center),
            ("Centro", Column::Center),
            ("Measure", Column::Measure),
            ("Medida", Column::Measure),
            ("Energy Saved", Column::EnergySaved),
            ("Ahorro Energético", Column::EnergySaved),
            ("Money Saved", Column::MoneySaved),
            ("Ahorro Económico", Column::MoneySaved),
            ("Investment", Column::Investment),
            ("Inversión", Column::Investment),
            ("Pay back period", Column::Payback),
            ("Periodo de Retorno", Column::Payback),
        ] {
            table = table.with_alias(alias, column);
        }
        table
    }
}

impl AliasTable {
    /// Register one more source column name for a canonical field.
    pub fn with_alias(mut self, alias: &str, column: Column) -> Self {
        self.entries.push((alias.to_string(), column));
        self
    }

    fn resolve(&self, header: &str) -> Option<Column> {
        let header = header.trim();
        self.entries
            .iter()
            .find(|(alias, _)| alias == header)
            .map(|(_, column)| *column)
    }
}

/// Header positions of the canonical fields, resolved once per load. Payback
/// is the only optional column; when absent, the value is derived per row.
#[derive(Debug, Clone)]
struct ColumnMap {
    region: usize,
    center: usize,
    measure: usize,
    energy: usize,
    money: usize,
    investment: usize,
    payback: Option<usize>,
}

impl ColumnMap {
    fn resolve(headers: &csv::StringRecord, aliases: &AliasTable) -> Result<ColumnMap> {
        let mut region = None;
        let mut center = None;
        let mut measure = None;
        let mut energy = None;
        let mut money = None;
        let mut investment = None;
        let mut payback = None;

        // First occurrence wins if a file repeats a column.
        for (idx, header) in headers.iter().enumerate() {
            match aliases.resolve(header) {
                Some(Column::Region) => region = region.or(Some(idx)),
                Some(Column::Center) => center = center.or(Some(idx)),
                Some(Column::Measure) => measure = measure.or(Some(idx)),
                Some(Column::EnergySaved) => energy = energy.or(Some(idx)),
                Some(Column::MoneySaved) => money = money.or(Some(idx)),
                Some(Column::Investment) => investment = investment.or(Some(idx)),
                Some(Column::Payback) => payback = payback.or(Some(idx)),
                None => {}
            }
        }

        let required = |col: Option<usize>, which: Column| {
            col.ok_or(AuditError::MissingColumn(which.name()))
        };
        Ok(ColumnMap {
            region: required(region, Column::Region)?,
            center: required(center, Column::Center)?,
            measure: required(measure, Column::Measure)?,
            energy: required(energy, Column::EnergySaved)?,
            money: required(money, Column::MoneySaved)?,
            investment: required(investment, Column::Investment)?,
            payback,
        })
    }
}

/// Diagnostics from one load, reported to the operator after ingest.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub rows_read: usize,
    pub rows_kept: usize,
    pub malformed_rows: usize,
    pub blank_measures: usize,
    pub defaulted_fields: usize,
    pub carried_centers: usize,
    pub derived_paybacks: usize,
}

/// Coerce a numeric cell; anything unusable becomes exactly 0 and is counted,
/// never an error and never a dropped row.
fn coerce(raw: &str, defaulted: &mut usize) -> f64 {
    match util::parse_f64_safe(Some(raw)) {
        Some(v) => v,
        None => {
            *defaulted += 1;
            0.0
        }
    }
}

/// Like `coerce`, but negative values are also unusable: saved kWh and
/// capital cost cannot go below zero.
fn coerce_non_negative(raw: &str, defaulted: &mut usize) -> f64 {
    match util::parse_f64_safe(Some(raw)) {
        Some(v) if v >= 0.0 => v,
        _ => {
            *defaulted += 1;
            0.0
        }
    }
}

/// Read and normalize an audit table from any reader.
///
/// Returns the kept records plus a `LoadReport`; an empty record vector is a
/// valid outcome (the caller shows its "no data" state). Only an unreadable
/// source or a header missing a required column produces an `Err`.
pub fn load_from_reader<R: Read>(
    reader: R,
    aliases: &AliasTable,
) -> Result<(Vec<MeasureRecord>, LoadReport)> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = rdr.headers()?.clone();
    let cols = ColumnMap::resolve(&headers, aliases)?;

    let mut report = LoadReport::default();
    let mut records: Vec<MeasureRecord> = Vec::new();
    let mut last_center: Option<String> = None;

    for row in rdr.records() {
        report.rows_read += 1;
        let row = match row {
            Ok(r) => r,
            Err(_) => {
                report.malformed_rows += 1;
                continue;
            }
        };
        let cell = |idx: usize| row.get(idx).unwrap_or("").trim();

        // A center name is often written once and left blank for the rows
        // below it, sometimes on a header-like row with no measure at all, so
        // the carry-forward value updates before the blank-measure check.
        let center_cell = cell(cols.center);
        if !center_cell.is_empty() {
            last_center = Some(center_cell.to_string());
        }

        let measure = cell(cols.measure);
        if measure.is_empty() {
            report.blank_measures += 1;
            continue;
        }

        let center = if center_cell.is_empty() {
            match &last_center {
                Some(prev) => {
                    report.carried_centers += 1;
                    prev.clone()
                }
                None => "Unknown".to_string(),
            }
        } else {
            center_cell.to_string()
        };

        let region_cell = cell(cols.region);
        let region = if region_cell.is_empty() {
            "Unknown".to_string()
        } else {
            region_cell.to_string()
        };

        let energy_saved = coerce_non_negative(cell(cols.energy), &mut report.defaulted_fields);
        let money_saved = coerce(cell(cols.money), &mut report.defaulted_fields);
        let investment = coerce_non_negative(cell(cols.investment), &mut report.defaulted_fields);
        let payback_years = match cols.payback {
            Some(idx) => coerce(cell(idx), &mut report.defaulted_fields),
            None => {
                report.derived_paybacks += 1;
                util::safe_div(investment, money_saved)
            }
        };

        records.push(MeasureRecord {
            region,
            center,
            measure: measure.to_string(),
            energy_saved,
            money_saved,
            investment,
            payback_years,
        });
        report.rows_kept += 1;
    }

    log::info!(
        "loaded {} of {} rows ({} blank measures, {} malformed)",
        report.rows_kept,
        report.rows_read,
        report.blank_measures,
        report.malformed_rows
    );
    if report.defaulted_fields > 0 {
        log::warn!(
            "substituted 0 for {} unusable numeric cells",
            report.defaulted_fields
        );
    }
    if report.carried_centers > 0 {
        log::warn!(
            "carried the center name forward on {} rows",
            report.carried_centers
        );
    }
    if cols.payback.is_none() {
        log::warn!(
            "payback column absent; derived {} values from investment and money saved",
            report.derived_paybacks
        );
    }

    Ok((records, report))
}

/// Read and normalize an audit table from a file path.
pub fn load_audit(path: &str, aliases: &AliasTable) -> Result<(Vec<MeasureRecord>, LoadReport)> {
    let file = File::open(path)?;
    load_from_reader(file, aliases)
}
