use crate::context::{extend_for_candidate, CommonContext, Context};
use crate::filter::{Filter, FilterCatalog};
use dc5_core::models::Combo;

/// Résultat de l'évaluation d'un filtre sur un candidat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    NotApplicable,
    Eliminate,
    Survive,
    /// Erreur de compilation ou d'évaluation : le candidat n'est jamais
    /// éliminé pour autant.
    Error(String),
}

impl Verdict {
    pub fn eliminates(&self) -> bool {
        matches!(self, Verdict::Eliminate)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Verdict::Error(_))
    }
}

pub fn evaluate(filter: &Filter, ctx: &Context<'_>) -> Verdict {
    let Some((applicable, expression)) = filter.compiled() else {
        let reason = filter.broken_reason().unwrap_or_default();
        return Verdict::Error(format!("filtre cassé : {reason}"));
    };

    match applicable.test(ctx) {
        Err(e) => return Verdict::Error(format!("applicable_if : {e}")),
        Ok(false) => return Verdict::NotApplicable,
        Ok(true) => {}
    }

    match expression.test(ctx) {
        Err(e) => Verdict::Error(format!("expression : {e}")),
        Ok(true) => Verdict::Eliminate,
        Ok(false) => Verdict::Survive,
    }
}

/// Diagnostic d'un candidat contre tout le catalogue, filtres désactivés
/// compris.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnosis {
    pub triggered: Vec<String>,
    pub survived: Vec<String>,
    pub not_applicable: Vec<String>,
    pub errors: Vec<(String, String)>,
    pub broken: Vec<(String, String)>,
}

impl Diagnosis {
    pub fn is_eliminated_by_active(&self, catalog: &FilterCatalog) -> bool {
        self.triggered
            .iter()
            .filter_map(|id| catalog.get(id))
            .any(|f| f.enabled)
    }
}

pub fn diagnose(catalog: &FilterCatalog, common: &CommonContext, combo: &Combo) -> Diagnosis {
    let ctx = extend_for_candidate(common, combo);
    let mut diagnosis = Diagnosis::default();

    for filter in catalog.iter() {
        let id = filter.id.clone();
        if let Some(reason) = filter.broken_reason() {
            diagnosis.broken.push((id, reason.to_string()));
            continue;
        }
        match evaluate(filter, &ctx) {
            Verdict::Eliminate => diagnosis.triggered.push(id),
            Verdict::Survive => diagnosis.survived.push(id),
            Verdict::NotApplicable => diagnosis.not_applicable.push(id),
            Verdict::Error(message) => diagnosis.errors.push((id, message)),
        }
    }

    diagnosis
}
