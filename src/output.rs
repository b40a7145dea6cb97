// File and console output.
//
// CSV and JSON writers serialize the row structs exactly as the preview
// tables show them; a report saved to disk matches what was on screen.
use crate::error::Result;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

pub fn write_csv<T: Serialize>(path: &str, rows: &[T]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &str, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

/// Print a titled preview of the first `max_rows` rows.
pub fn preview_section<T>(title: &str, note: Option<&str>, rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    println!("\n{}", title);
    if let Some(n) = note {
        println!("({})", n);
    }
    preview_table_rows(rows, max_rows);
}

pub fn preview_table_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().cloned().take(max_rows).collect();
    if slice.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let table_str = Table::new(slice).with(Style::markdown()).to_string();
    println!("{}\n", table_str);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{KpiSummary, SavingsRow};
    use std::fs;

    #[test]
    fn test_write_csv_uses_renamed_headers() {
        let rows = vec![SavingsRow {
            group: "Madrid".to_string(),
            total: 1234.5,
            share: Some(33.0),
        }];
        let path = std::env::temp_dir().join(format!("audit_savings_{}.csv", std::process::id()));
        let path_str = path.to_string_lossy().into_owned();

        write_csv(&path_str, &rows).unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        fs::remove_file(&path).unwrap();

        assert!(contents.starts_with("Group,Total,Share"));
        assert!(contents.contains("Madrid,1234.5,33.0"));
    }

    #[test]
    fn test_write_json_is_pretty_printed() {
        let kpis = KpiSummary {
            total_investment: 100.0,
            total_money_saved: 25.0,
            total_energy_saved: 40.0,
            roi: 25.0,
        };
        let path = std::env::temp_dir().join(format!("audit_kpis_{}.json", std::process::id()));
        let path_str = path.to_string_lossy().into_owned();

        write_json(&path_str, &kpis).unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        fs::remove_file(&path).unwrap();

        assert!(contents.contains("\"total_investment\": 100.0"));
        assert!(contents.contains("\"roi\": 25.0"));
    }
}
