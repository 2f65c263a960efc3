use std::collections::HashMap;

use serde::Deserialize;

use crate::expr::CompiledExpr;

/// Une ligne brute du catalogue, avant normalisation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RawFilterRow {
    pub id: String,
    pub name: String,
    pub enabled: String,
    pub applicable_if: String,
    pub expression: String,
}

#[derive(Debug, Clone)]
enum FilterState {
    Ready {
        applicable: CompiledExpr,
        expression: CompiledExpr,
    },
    Broken {
        error: String,
    },
}

#[derive(Debug, Clone)]
pub struct Filter {
    pub id: String,
    pub name: String,
    pub enabled: bool,
    /// Prédicats normalisés (après valeurs par défaut et nettoyage).
    pub applicable_if: String,
    pub expression: String,
    state: FilterState,
}

impl Filter {
    /// Compile les deux prédicats ; un échec laisse le filtre « cassé ».
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        enabled: bool,
        applicable_if: &str,
        expression: &str,
    ) -> Self {
        let applicable_if = match applicable_if.trim() {
            "" => "True".to_string(),
            s => s.to_string(),
        };
        let expression = match expression.trim() {
            "" => "False".to_string(),
            s => s.to_string(),
        };

        let state = match (
            CompiledExpr::compile(&applicable_if),
            CompiledExpr::compile(&expression),
        ) {
            (Ok(applicable), Ok(expression)) => FilterState::Ready {
                applicable,
                expression,
            },
            (Err(e), _) => FilterState::Broken {
                error: format!("applicable_if : {e}"),
            },
            (_, Err(e)) => FilterState::Broken {
                error: format!("expression : {e}"),
            },
        };

        Self {
            id: id.into(),
            name: name.into(),
            enabled,
            applicable_if,
            expression,
            state,
        }
    }

    pub fn is_broken(&self) -> bool {
        matches!(self.state, FilterState::Broken { .. })
    }

    pub fn broken_reason(&self) -> Option<&str> {
        match &self.state {
            FilterState::Broken { error } => Some(error),
            FilterState::Ready { .. } => None,
        }
    }

    /// Prédicats compilés, absents pour un filtre cassé.
    pub fn compiled(&self) -> Option<(&CompiledExpr, &CompiledExpr)> {
        match &self.state {
            FilterState::Ready {
                applicable,
                expression,
            } => Some((applicable, expression)),
            FilterState::Broken { .. } => None,
        }
    }

    /// Actif = activé et compilable.
    pub fn is_active(&self) -> bool {
        self.enabled && !self.is_broken()
    }

    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}

/// Retire les guillemets qui entourent tout le texte (artefacts d'export
/// CSV, y compris `"""..."""`), sans toucher aux littéraux internes.
pub fn strip_wrapping_quotes(text: &str) -> &str {
    let mut s = text.trim();
    'outer: loop {
        for q in ['"', '\''] {
            if s.len() >= 2 && s.starts_with(q) && s.ends_with(q) {
                let inner = &s[1..s.len() - 1];
                if !inner.contains(q) || (inner.starts_with(q) && inner.ends_with(q)) {
                    s = inner.trim();
                    continue 'outer;
                }
            }
        }
        return s;
    }
}

pub fn normalize_predicate(text: &str) -> String {
    strip_wrapping_quotes(text).replace("!==", "!=")
}

pub fn parse_enabled(text: &str) -> bool {
    let flag = strip_wrapping_quotes(text).to_ascii_lowercase();
    matches!(flag.as_str(), "true" | "1" | "yes" | "y")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Duplicate {
    pub id: String,
    /// Numéro de ligne (1-based, hors en-tête).
    pub row: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub rows: usize,
    pub loaded: usize,
    pub broken: usize,
    pub duplicates: Vec<Duplicate>,
    /// Enregistrements CSV illisibles, ignorés par le lecteur.
    pub unreadable: usize,
}

#[derive(Debug, Clone, Default)]
pub struct FilterCatalog {
    filters: Vec<Filter>,
    index: HashMap<String, usize>,
    report: LoadReport,
}

impl FilterCatalog {
    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn iter(&self) -> impl Iterator<Item = &Filter> {
        self.filters.iter()
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Filter> {
        self.index.get(id).map(|&i| &self.filters[i])
    }

    pub fn broken(&self) -> impl Iterator<Item = &Filter> {
        self.filters.iter().filter(|f| f.is_broken())
    }

    pub fn report(&self) -> &LoadReport {
        &self.report
    }

    pub(crate) fn report_mut(&mut self) -> &mut LoadReport {
        &mut self.report
    }

    /// Renvoie `false` si l'id est inconnu.
    pub fn set_enabled(&mut self, id: &str, enabled: bool) -> bool {
        match self.index.get(id) {
            Some(&i) => {
                self.filters[i].enabled = enabled;
                true
            }
            None => false,
        }
    }

    pub fn set_all_enabled(&mut self, enabled: bool) {
        for filter in &mut self.filters {
            filter.enabled = enabled;
        }
    }

    /// Ajoute un filtre ; un id déjà présent est refusé (le premier gagne).
    pub fn push(&mut self, filter: Filter) -> bool {
        if self.index.contains_key(&filter.id) {
            return false;
        }
        self.index.insert(filter.id.clone(), self.filters.len());
        self.filters.push(filter);
        true
    }
}

/// Normalise et compile chaque ligne. N'échoue jamais : les erreurs de
/// compilation donnent des filtres cassés, les doublons sont écartés.
pub fn load_filters<I>(rows: I) -> FilterCatalog
where
    I: IntoIterator<Item = RawFilterRow>,
{
    let mut catalog = FilterCatalog::default();

    for (i, raw) in rows.into_iter().enumerate() {
        let row_number = i + 1;
        catalog.report.rows += 1;

        let id = match strip_wrapping_quotes(&raw.id) {
            "" => format!("row-{row_number}"),
            s => s.to_string(),
        };
        let filter = Filter::new(
            id.clone(),
            strip_wrapping_quotes(&raw.name),
            parse_enabled(&raw.enabled),
            &normalize_predicate(&raw.applicable_if),
            &normalize_predicate(&raw.expression),
        );

        let broken = filter.broken_reason().map(str::to_string);
        if !catalog.push(filter) {
            log::warn!("Filtre {id} en double (ligne {row_number}) : ignoré");
            catalog.report.duplicates.push(Duplicate { id, row: row_number });
            continue;
        }

        catalog.report.loaded += 1;
        if let Some(error) = broken {
            log::warn!("Filtre {id} cassé : {error}");
            catalog.report.broken += 1;
        }
    }

    log::debug!(
        "{} filtres chargés ({} cassés, {} doublons)",
        catalog.report.loaded,
        catalog.report.broken,
        catalog.report.duplicates.len()
    );
    catalog
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: &str, enabled: &str, applicable_if: &str, expression: &str) -> RawFilterRow {
        RawFilterRow {
            id: id.to_string(),
            name: format!("filtre {id}"),
            enabled: enabled.to_string(),
            applicable_if: applicable_if.to_string(),
            expression: expression.to_string(),
        }
    }

    #[test]
    fn test_strip_wrapping_quotes() {
        assert_eq!(strip_wrapping_quotes("  \"combo_sum > 3\" "), "combo_sum > 3");
        assert_eq!(strip_wrapping_quotes("\"\"\"true\"\"\""), "true");
        assert_eq!(strip_wrapping_quotes("'x'"), "x");
        assert_eq!(strip_wrapping_quotes("seed_sum_cat == 'Low'"), "seed_sum_cat == 'Low'");
        assert_eq!(strip_wrapping_quotes("'Low' == seed_sum_cat"), "'Low' == seed_sum_cat");
        assert_eq!(strip_wrapping_quotes("'a' in 'b'"), "'a' in 'b'");
        assert_eq!(strip_wrapping_quotes("\"'a' in x\""), "'a' in x");
        assert_eq!(strip_wrapping_quotes("\""), "\"");
    }

    #[test]
    fn test_parse_enabled() {
        for text in ["true", "TRUE", "\"true\"", "\"\"\"true\"\"\"", "1", "yes", "Y", " y "] {
            assert!(parse_enabled(text), "{text}");
        }
        for text in ["", "false", "0", "no", "enabled"] {
            assert!(!parse_enabled(text), "{text}");
        }
    }

    #[test]
    fn test_normalize_predicate() {
        assert_eq!(normalize_predicate("\"combo_sum !== 3\""), "combo_sum != 3");
    }

    #[test]
    fn test_empty_row_defaults() {
        let catalog = load_filters(vec![RawFilterRow::default()]);
        let filter = &catalog.filters()[0];
        assert_eq!(filter.id, "row-1");
        assert_eq!(filter.applicable_if, "True");
        assert_eq!(filter.expression, "False");
        assert!(!filter.enabled);
        assert!(!filter.is_broken());
        assert_eq!(filter.display_name(), "row-1");
    }

    #[test]
    fn test_broken_filters_are_kept() {
        let catalog = load_filters(vec![
            row("F1", "true", "", "combo_sum >"),
            row("F2", "true", "unknown_fact", "True"),
            row("F3", "true", "", "combo_sum > 20"),
        ]);
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.report().broken, 2);
        let f1 = catalog.get("F1").unwrap();
        assert!(f1.is_broken());
        assert!(f1.broken_reason().unwrap().starts_with("expression"));
        assert!(!f1.is_active());
        let f2 = catalog.get("F2").unwrap();
        assert!(f2.broken_reason().unwrap().starts_with("applicable_if"));
        assert!(catalog.get("F3").unwrap().is_active());
        assert_eq!(catalog.broken().count(), 2);
    }

    #[test]
    fn test_deeply_nested_predicate_is_broken() {
        let nested = format!("{}combo_sum > 3{}", "(".repeat(500), ")".repeat(500));
        let nots = format!("{}True", "not ".repeat(50_000));
        let catalog = load_filters(vec![
            row("F1", "true", "", &nested),
            row("F2", "true", &nots, "True"),
        ]);
        assert_eq!(catalog.report().broken, 2);
        let f1 = catalog.get("F1").unwrap();
        assert!(f1.broken_reason().unwrap().contains("trop imbriquée"));
        assert!(catalog.get("F2").unwrap().is_broken());
    }

    #[test]
    fn test_duplicate_ids_first_wins() {
        let catalog = load_filters(vec![
            row("F1", "true", "", "combo_sum > 20"),
            row("F1", "false", "", "combo_sum < 5"),
        ]);
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("F1").unwrap().expression, "combo_sum > 20");
        assert_eq!(
            catalog.report().duplicates,
            vec![Duplicate {
                id: "F1".to_string(),
                row: 2
            }]
        );
        assert_eq!(catalog.report().rows, 2);
        assert_eq!(catalog.report().loaded, 1);
    }

    #[test]
    fn test_set_enabled() {
        let mut catalog = load_filters(vec![row("F1", "false", "", "True")]);
        assert!(!catalog.get("F1").unwrap().enabled);
        assert!(catalog.set_enabled("F1", true));
        assert!(catalog.get("F1").unwrap().is_active());
        assert!(!catalog.set_enabled("F9", true));
        catalog.set_all_enabled(false);
        assert!(!catalog.get("F1").unwrap().enabled);
    }
}
