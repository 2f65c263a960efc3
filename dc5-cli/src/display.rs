use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};

use crate::analysis::{DigitStats, HotCold};
use dc5_core::models::Combo;
use dc5_filters::context::CommonContext;
use dc5_filters::eliminate::{EliminationResult, ModeComparison};
use dc5_filters::engine::Diagnosis;
use dc5_filters::filter::FilterCatalog;

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn join_digits(digits: &[u8]) -> String {
    digits
        .iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn display_context(common: &CommonContext) {
    println!("\nContexte du tirage de référence {}\n", common.seed());
    let mut table = new_table(vec!["Fait", "Valeur"]);
    for (fact, value) in common.facts() {
        table.add_row(vec![fact.name().to_string(), value.to_string()]);
    }
    println!("{table}");
}

pub fn display_result(result: &EliminationResult, hide_zero: bool) {
    println!(
        "\nMode {} : {} candidats, {} éliminés, {} survivants\n",
        result.mode,
        result.pool_size,
        result.total_eliminated(),
        result.survivors.len()
    );

    let mut table = new_table(vec!["Id", "Filtre", "Éliminés", "Erreurs"]);
    let mut hidden = 0;
    for id in &result.order {
        let count = result.count(id);
        if hide_zero && count == 0 {
            hidden += 1;
            continue;
        }
        let errors = result.error_counts.get(id).copied().unwrap_or(0);
        let error_cell = if errors > 0 {
            Cell::new(errors).fg(Color::Red)
        } else {
            Cell::new("—")
        };
        table.add_row(vec![
            Cell::new(id),
            Cell::new(name_of(result, id)),
            Cell::new(count),
            error_cell,
        ]);
    }
    println!("{table}");
    if hidden > 0 {
        println!("{hidden} filtres sans élimination masqués (--show-zero pour les afficher)");
    }
}

fn name_of<'r>(result: &'r EliminationResult, id: &'r str) -> &'r str {
    result.display_name(id).unwrap_or(id)
}

pub fn display_comparison(comparison: &ModeComparison, hide_zero: bool) {
    let ind = &comparison.independent;
    println!(
        "\n{} candidats, {} survivants, {} éliminés\n",
        ind.pool_size,
        ind.survivors.len(),
        ind.total_eliminated()
    );

    let mut table = new_table(vec!["Id", "Filtre", "Séquentiel", "Indépendant"]);
    for row in comparison.visible_rows(hide_zero) {
        table.add_row(vec![
            Cell::new(&row.id),
            Cell::new(&row.name),
            Cell::new(row.sequential),
            Cell::new(row.independent).fg(Color::Cyan),
        ]);
    }
    println!("{table}");

    let zeros = comparison.zero_count();
    if hide_zero && zeros > 0 {
        println!("{zeros} filtres sans élimination initiale masqués (--show-zero pour les afficher)");
    }
}

pub fn display_errors(result: &EliminationResult) {
    if result.error_counts.is_empty() {
        return;
    }
    println!(
        "\n⚠ {} erreurs d'évaluation (candidats conservés)",
        result.total_errors()
    );
    for (id, count) in &result.error_counts {
        println!("  {id} : {count}");
    }
    for sample in &result.error_samples {
        println!("  [{}] {} : {}", sample.filter_id, sample.combo, sample.message);
    }
}

pub fn display_survivors(result: &EliminationResult) {
    if result.survivors.is_empty() {
        println!("Aucun candidat survivant.");
        return;
    }
    println!("\nSurvivants ({}) :", result.survivors.len());
    let line = result
        .survivors
        .iter()
        .map(Combo::to_string)
        .collect::<Vec<_>>()
        .join(" ");
    println!("{line}");
}

pub fn display_diagnosis(combo: &Combo, diagnosis: &Diagnosis, catalog: &FilterCatalog) {
    println!("\nDiagnostic de {combo}\n");

    let mut table = new_table(vec!["Id", "Filtre", "Actif", "Verdict"]);
    let name = |id: &str| {
        catalog
            .get(id)
            .map(|f| f.display_name().to_string())
            .unwrap_or_default()
    };
    let enabled = |id: &str| {
        if catalog.get(id).is_some_and(|f| f.enabled) {
            "oui"
        } else {
            "non"
        }
    };

    for id in &diagnosis.triggered {
        table.add_row(vec![
            Cell::new(id),
            Cell::new(name(id)),
            Cell::new(enabled(id)),
            Cell::new("élimine").fg(Color::Red),
        ]);
    }
    for (id, message) in &diagnosis.errors {
        table.add_row(vec![
            Cell::new(id),
            Cell::new(name(id)),
            Cell::new(enabled(id)),
            Cell::new(format!("erreur : {message}")).fg(Color::Yellow),
        ]);
    }
    for (id, reason) in &diagnosis.broken {
        table.add_row(vec![
            Cell::new(id),
            Cell::new(name(id)),
            Cell::new(enabled(id)),
            Cell::new(format!("cassé : {reason}")).fg(Color::Yellow),
        ]);
    }
    println!("{table}");

    println!(
        "{} survit, {} non applicables",
        diagnosis.survived.len(),
        diagnosis.not_applicable.len()
    );
    if diagnosis.is_eliminated_by_active(catalog) {
        println!("→ {combo} est éliminé par au moins un filtre actif");
    } else {
        println!("→ {combo} survit aux filtres actifs");
    }
}

pub fn display_broken(catalog: &FilterCatalog) {
    let report = catalog.report();
    println!(
        "\nCatalogue : {} lignes, {} filtres, {} cassés, {} doublons, {} illisibles\n",
        report.rows,
        report.loaded,
        report.broken,
        report.duplicates.len(),
        report.unreadable
    );

    if report.broken > 0 {
        let mut table = new_table(vec!["Id", "Filtre", "Erreur"]);
        for filter in catalog.broken() {
            table.add_row(vec![
                Cell::new(&filter.id),
                Cell::new(filter.display_name()),
                Cell::new(filter.broken_reason().unwrap_or_default()).fg(Color::Red),
            ]);
        }
        println!("{table}");
    }

    for duplicate in &report.duplicates {
        println!("Doublon : {} (ligne {}) ignoré", duplicate.id, duplicate.row);
    }
}

pub fn display_hot_cold(stats: &[DigitStats], result: &HotCold, window: usize) {
    println!("\nChiffres sur les {window} derniers tirages\n");

    let mut table = new_table(vec!["Chiffre", "Fréquence", "Retard"]);
    let mut sorted = stats.to_vec();
    sorted.sort_by(|a, b| b.frequency.cmp(&a.frequency));
    for stat in &sorted {
        let digit_cell = if result.hot.contains(&stat.digit) {
            Cell::new(stat.digit).fg(Color::Red)
        } else if result.cold.contains(&stat.digit) {
            Cell::new(stat.digit).fg(Color::Blue)
        } else {
            Cell::new(stat.digit)
        };
        table.add_row(vec![digit_cell, Cell::new(stat.frequency), Cell::new(stat.gap)]);
    }
    println!("{table}");

    println!("Chauds : {}", join_digits(&result.hot));
    println!("Froids : {}", join_digits(&result.cold));
    println!("Dus    : {}", join_digits(&result.due));
}
