// Entry point and high-level CLI flow.
//
// Interactive analysis over one loaded audit table:
// - Option [1] loads and normalizes the CSV, printing diagnostics.
// - Options [2]-[5] adjust the classification scheme, the region/center
//   selection and the percentage view.
// - Option [6] generates the report tables, saves them as CSV plus a JSON
//   summary, and previews them on the console.
use audit_report::aggregate::{self, FlowResult, GroupBy, SavingsMetric};
use audit_report::classify::{classify_all, Scheme};
use audit_report::codes;
use audit_report::filter::{self, Selection};
use audit_report::loader::{self, AliasTable};
use audit_report::output;
use audit_report::types::{AnalysisSummary, ClassifiedMeasure, CodedMeasureRow, MeasureRecord};
use audit_report::util;
use once_cell::sync::Lazy;
use std::collections::BTreeSet;
use std::io::{self, Write};
use std::sync::Mutex;

const DEFAULT_INPUT: &str = "energy_audit_summary.csv";

// Simple in-memory app state so we only load the CSV once but can reclassify,
// refilter and regenerate reports multiple times in a single run.
static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| {
    Mutex::new(AppState {
        records: None,
        classified: None,
        scheme: Scheme::default(),
        selection: Selection::default(),
        show_percentage: false,
    })
});

struct AppState {
    records: Option<Vec<MeasureRecord>>,
    classified: Option<Vec<ClassifiedMeasure>>,
    scheme: Scheme,
    selection: Selection,
    show_percentage: bool,
}

impl AppState {
    /// Bring the classified view back in sync with the current scheme.
    fn reclassify(&mut self) {
        if let Some(records) = &self.records {
            self.classified = Some(classify_all(records, self.scheme));
        }
    }
}

/// Read a single line of input after printing the common "Enter choice:" prompt.
///
/// The prompt is reused for both the main menu and the submenus.
fn read_choice() -> String {
    print!("Enter choice: ");
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf.trim().to_string()
}

/// Ask the user whether to go back to the menu after generating the analysis.
///
/// Returns `true` if the user chose `Y`, `false` if they chose `N`.
fn prompt_back_to_menu() -> bool {
    loop {
        print!("Back to Menu (Y/N): ");
        let _ = io::stdout().flush();
        let mut buf = String::new();
        io::stdin().read_line(&mut buf).ok();
        let resp = buf.trim().to_uppercase();
        match resp.as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

/// Print a numbered option list with selection marks.
fn print_options(options: &[String], selected: &BTreeSet<String>) {
    for (i, option) in options.iter().enumerate() {
        let mark = if selected.contains(option) { "x" } else { " " };
        println!("[{}] [{}] {}", i + 1, mark, option);
    }
}

/// Apply a toggle command to a selection set: `A` selects every option, `N`
/// clears the set, and comma-separated indices flip individual entries.
fn apply_toggles(input: &str, options: &[String], selected: &mut BTreeSet<String>) {
    match input.to_uppercase().as_str() {
        "A" => {
            selected.clear();
            selected.extend(options.iter().cloned());
        }
        "N" => selected.clear(),
        _ => {
            for part in input.split(',') {
                let part = part.trim();
                if part.is_empty() {
                    continue;
                }
                match part.parse::<usize>() {
                    Ok(idx) if idx >= 1 && idx <= options.len() => {
                        let option = &options[idx - 1];
                        if !selected.remove(option) {
                            selected.insert(option.clone());
                        }
                    }
                    _ => println!("Ignoring invalid entry: {}", part),
                }
            }
        }
    }
}

/// Clone the classified dataset out of the app state, or print the common
/// "load first" error.
fn loaded_dataset() -> Option<Vec<ClassifiedMeasure>> {
    let classified = {
        let state = APP_STATE.lock().unwrap();
        state.classified.clone()
    };
    if classified.is_none() {
        println!("Error: No data loaded. Please load the CSV file first (option 1).\n");
    }
    classified
}

/// Handle option [1]: load and normalize the audit CSV.
///
/// The input path comes from the first CLI argument, falling back to the
/// bundled export name. On success the selection resets to every region with
/// center detail off.
fn handle_load() {
    let path = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_INPUT.to_string());
    match loader::load_audit(&path, &AliasTable::default()) {
        Ok((records, report)) => {
            println!(
                "Processing dataset... ({} rows read, {} measures kept)",
                util::format_int(report.rows_read),
                util::format_int(report.rows_kept)
            );
            println!(
                "Note: {} rows dropped (blank measure), {} malformed rows skipped.",
                util::format_int(report.blank_measures),
                util::format_int(report.malformed_rows)
            );
            if report.defaulted_fields > 0 {
                println!(
                    "Info: Zeroed {} unusable numeric cells.",
                    util::format_int(report.defaulted_fields)
                );
            }
            if report.carried_centers > 0 {
                println!(
                    "Info: Carried the center name forward on {} rows.",
                    util::format_int(report.carried_centers)
                );
            }
            if report.derived_paybacks > 0 {
                println!(
                    "Info: Derived the payback period on {} rows.",
                    util::format_int(report.derived_paybacks)
                );
            }
            println!("");
            let mut state = APP_STATE.lock().unwrap();
            state.records = Some(records);
            state.reclassify();
            let selection = Selection::all_regions(state.classified.as_deref().unwrap_or(&[]));
            state.selection = selection;
        }
        Err(e) => {
            eprintln!("Failed to load file: {}\n", e);
        }
    }
}

/// Handle option [2]: pick the classification scheme and reclassify.
fn handle_scheme() {
    let current = {
        let state = APP_STATE.lock().unwrap();
        state.scheme
    };
    println!("Classification scheme (current: {}):", current.label());
    for (i, scheme) in Scheme::ALL.iter().enumerate() {
        println!("[{}] {}", i + 1, scheme.label());
    }
    println!("");
    match read_choice().parse::<usize>() {
        Ok(idx) if idx >= 1 && idx <= Scheme::ALL.len() => {
            let mut state = APP_STATE.lock().unwrap();
            state.scheme = Scheme::ALL[idx - 1];
            state.reclassify();
            println!("Scheme set to {}.\n", state.scheme.label());
        }
        _ => println!("Invalid choice. Please enter 1-{}.\n", Scheme::ALL.len()),
    }
}

/// Handle option [3]: toggle regions. Center picks that stop existing under
/// the new region set are rescoped away.
fn handle_regions() {
    let Some(classified) = loaded_dataset() else {
        return;
    };
    let selection = {
        let state = APP_STATE.lock().unwrap();
        state.selection.clone()
    };

    let regions = filter::region_list(&classified);
    println!("Region selection (A = all, N = none, or comma-separated numbers):");
    print_options(&regions, &selection.regions);
    println!("");

    let mut selected = selection.regions.clone();
    apply_toggles(&read_choice(), &regions, &mut selected);

    let candidates = filter::center_candidates(&classified, &selected);
    let rescoped = Selection {
        regions: selected,
        centers: selection.centers,
    }
    .rescoped(&candidates);

    println!(
        "Selected {} of {} regions.\n",
        rescoped.regions.len(),
        regions.len()
    );
    let mut state = APP_STATE.lock().unwrap();
    state.selection = rescoped;
}

/// Handle option [4]: toggle centers within the selected regions, or turn
/// center detail off entirely with `D`.
fn handle_centers() {
    let Some(classified) = loaded_dataset() else {
        return;
    };
    let selection = {
        let state = APP_STATE.lock().unwrap();
        state.selection.clone()
    };

    let candidates = filter::center_candidates(&classified, &selection.regions);
    if candidates.is_empty() {
        println!("No centers available. Select at least one region first.\n");
        return;
    }

    // With detail off, the menu shows every candidate as picked.
    let mut selected = selection
        .centers
        .clone()
        .unwrap_or_else(|| candidates.iter().cloned().collect());

    println!("Center selection (A = all, N = none, D = detail off, or comma-separated numbers):");
    print_options(&candidates, &selected);
    println!("");

    let input = read_choice();
    let centers = if input.trim().eq_ignore_ascii_case("d") {
        println!("Center detail off; reports group by region.\n");
        None
    } else {
        apply_toggles(&input, &candidates, &mut selected);
        println!(
            "Selected {} of {} centers.\n",
            selected.len(),
            candidates.len()
        );
        Some(selected)
    };

    let mut state = APP_STATE.lock().unwrap();
    state.selection.centers = centers;
}

/// Handle option [5]: toggle percentage shares in the grouped tables.
fn handle_percentage() {
    let mut state = APP_STATE.lock().unwrap();
    state.show_percentage = !state.show_percentage;
    if state.show_percentage {
        println!("Percentage view on.\n");
    } else {
        println!("Percentage view off.\n");
    }
}

/// Handle option [6]: generate every report for the current selection.
///
/// This function is intentionally side-effectful:
/// - writes the report CSV files,
/// - writes a JSON summary,
/// - and prints Markdown previews of each table to the console.
fn handle_generate() {
    let Some(classified) = loaded_dataset() else {
        return;
    };
    let (scheme, selection, show_percentage) = {
        let state = APP_STATE.lock().unwrap();
        (state.scheme, state.selection.clone(), state.show_percentage)
    };

    // Center detail drives the grouping axis for every table below.
    let group_by = if selection.centers.is_some() {
        GroupBy::Center
    } else {
        GroupBy::Region
    };
    let ws = filter::working_set(&classified, &selection);

    println!(
        "Generating analysis... ({} measures in scope, scheme: {})",
        util::format_int(ws.len()),
        scheme.label()
    );
    println!("");

    let kpis = aggregate::kpi_summary(&ws);
    println!("Inversión Total: {} €", util::format_number(kpis.total_investment, 2));
    println!(
        "Ahorro Económico Total: {} €/año",
        util::format_number(kpis.total_money_saved, 2)
    );
    println!(
        "Ahorro Energético Total: {} kWh/año",
        util::format_number(kpis.total_energy_saved, 2)
    );
    println!("Retorno de la Inversión: {}%", util::format_number(kpis.roi, 2));

    if ws.is_empty() {
        println!("\nNo measures match the current selection. Adjust regions or centers and try again.");
    } else {
        let breakdown_note = if show_percentage {
            Some("Share: % within each group")
        } else {
            None
        };
        let savings_note = if show_percentage {
            Some("Share: % of the selected total")
        } else {
            None
        };

        let breakdown = aggregate::measure_breakdown(&ws, group_by, show_percentage);
        if let Err(e) = output::write_csv("measure_counts.csv", &breakdown) {
            eprintln!("Write error: {}", e);
        }
        output::preview_section(
            &format!("Distribución de Medidas por {}", group_by.label()),
            breakdown_note,
            &breakdown,
            5,
        );
        println!("(Full table exported to measure_counts.csv)");

        let energy = aggregate::savings_by_group(&ws, group_by, SavingsMetric::Energy, show_percentage);
        if let Err(e) = output::write_csv("energy_savings.csv", &energy) {
            eprintln!("Write error: {}", e);
        }
        output::preview_section(
            &format!("{} por {}", SavingsMetric::Energy.label(), group_by.label()),
            savings_note,
            &energy,
            5,
        );
        println!("(Full table exported to energy_savings.csv)");

        let money = aggregate::savings_by_group(&ws, group_by, SavingsMetric::Money, show_percentage);
        if let Err(e) = output::write_csv("economic_savings.csv", &money) {
            eprintln!("Write error: {}", e);
        }
        output::preview_section(
            &format!("{} por {}", SavingsMetric::Money.label(), group_by.label()),
            savings_note,
            &money,
            5,
        );
        println!("(Full table exported to economic_savings.csv)");

        let investment = aggregate::investment_summary(&ws, group_by);
        if let Err(e) = output::write_csv("investment_summary.csv", &investment) {
            eprintln!("Write error: {}", e);
        }
        output::preview_section(
            &format!("Resumen de Inversión por {}", group_by.label()),
            None,
            &investment,
            5,
        );
        println!("(Full table exported to investment_summary.csv)");

        if scheme == Scheme::MeasureCode {
            let code_list = codes::sequence_codes(&ws);
            let coded: Vec<CodedMeasureRow> = ws
                .iter()
                .zip(code_list.iter())
                .map(|(m, code)| CodedMeasureRow {
                    code: code.clone(),
                    region: m.record.region.clone(),
                    center: m.record.center.clone(),
                    measure: m.record.measure.clone(),
                    investment: m.record.investment,
                    money_saved: m.record.money_saved,
                })
                .collect();
            if let Err(e) = output::write_csv("measure_codes.csv", &coded) {
                eprintln!("Write error: {}", e);
            }
            output::preview_section("Códigos de Medida", None, &coded, 5);
            println!("(Full table exported to measure_codes.csv)");
        }

        match aggregate::investment_flow(&ws, group_by) {
            FlowResult::Flow(flow) => {
                if let Err(e) = output::write_csv("investment_flow.csv", &flow.links) {
                    eprintln!("Write error: {}", e);
                }
                output::preview_section(
                    &format!("Flujo de Inversión ({} nodos)", flow.nodes.len()),
                    None,
                    &flow.links,
                    5,
                );
                println!("(Full table exported to investment_flow.csv)");
            }
            FlowResult::InsufficientData => {
                println!("\nInvestment flow skipped: no investment recorded in the current selection.");
            }
        }
    }

    let summary = AnalysisSummary {
        scheme: scheme.label().to_string(),
        group_by: group_by.label().to_string(),
        regions_selected: selection.regions.len(),
        centers_selected: selection.centers.as_ref().map(|c| c.len()),
        measures: ws.len(),
        kpis,
    };
    if let Err(e) = output::write_json("analysis_summary.json", &summary) {
        eprintln!("Write error: {}", e);
    }
    println!("\n(Summary exported to analysis_summary.json)\n");
}

fn main() {
    env_logger::init();
    loop {
        println!("Energy Audit Analysis:");
        println!("[1] Load the audit file");
        println!("[2] Classification scheme");
        println!("[3] Region selection");
        println!("[4] Center selection");
        println!("[5] Toggle percentage view");
        println!("[6] Generate analysis\n");
        match read_choice().as_str() {
            "1" => {
                handle_load();
            }
            "2" => {
                handle_scheme();
            }
            "3" => {
                handle_regions();
            }
            "4" => {
                handle_centers();
            }
            "5" => {
                handle_percentage();
            }
            "6" => {
                println!("");
                handle_generate();
                if !prompt_back_to_menu() {
                    println!("Exiting the program.");
                    break;
                }
            }
            _ => {
                println!("Invalid choice. Please enter 1-6.\n");
            }
        }
    }
}
