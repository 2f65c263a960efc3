use std::collections::{BTreeMap, HashMap, HashSet};

use indicatif::ProgressBar;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::context::{extend_for_candidate, CommonContext, Context};
use crate::engine::{evaluate, Verdict};
use crate::filter::{Filter, FilterCatalog};
use dc5_core::models::Combo;

/// Indépendant : chaque filtre est compté contre le pool complet.
/// Séquentiel : chaque filtre ne voit que les survivants des précédents.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Independent,
    Sequential,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Independent => write!(f, "indépendant"),
            Mode::Sequential => write!(f, "séquentiel"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EliminationOptions {
    /// Évaluation parallèle (rayon) du mode indépendant.
    pub parallel: bool,
    /// Conserver des exemples de messages d'erreur.
    pub verbose_errors: bool,
    pub max_error_samples: usize,
    /// En comparaison, ordonner le passage séquentiel par nombre
    /// d'éliminations indépendantes décroissant (zéros en dernier).
    pub rank_by_count: bool,
    /// Avance d'un pas par candidat évalué en mode indépendant.
    pub progress: Option<ProgressBar>,
}

impl Default for EliminationOptions {
    fn default() -> Self {
        Self {
            parallel: false,
            verbose_errors: false,
            max_error_samples: 100,
            rank_by_count: false,
            progress: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorSample {
    pub filter_id: String,
    pub combo: Combo,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct EliminationResult {
    pub mode: Mode,
    pub pool_size: usize,
    pub survivors: Vec<Combo>,
    /// Candidat → id du premier filtre (dans l'ordre d'évaluation) qui l'a éliminé.
    pub eliminated_by: BTreeMap<Combo, String>,
    /// Un compteur par filtre actif, zéros compris.
    pub per_filter_count: BTreeMap<String, usize>,
    /// Ids des filtres actifs, dans l'ordre d'évaluation.
    pub order: Vec<String>,
    pub error_counts: BTreeMap<String, usize>,
    pub error_samples: Vec<ErrorSample>,
    names: HashMap<String, String>,
}

impl EliminationResult {
    /// Nom du filtre qui a éliminé `combo`.
    pub fn reason(&self, combo: &Combo) -> Option<&str> {
        let id = self.eliminated_by.get(combo)?;
        Some(self.display_name(id).unwrap_or(id))
    }

    pub fn display_name(&self, filter_id: &str) -> Option<&str> {
        self.names.get(filter_id).map(String::as_str)
    }

    pub fn count(&self, filter_id: &str) -> usize {
        self.per_filter_count.get(filter_id).copied().unwrap_or(0)
    }

    pub fn total_eliminated(&self) -> usize {
        self.eliminated_by.len()
    }

    pub fn total_errors(&self) -> usize {
        self.error_counts.values().sum()
    }

    fn new(mode: Mode, pool_size: usize, active: &[&Filter]) -> Self {
        Self {
            mode,
            pool_size,
            order: active.iter().map(|f| f.id.clone()).collect(),
            per_filter_count: active.iter().map(|f| (f.id.clone(), 0)).collect(),
            names: active
                .iter()
                .map(|f| (f.id.clone(), f.display_name().to_string()))
                .collect(),
            ..Default::default()
        }
    }

    fn record_error(&mut self, filter: &Filter, combo: &Combo, message: String, options: &EliminationOptions) {
        *self.error_counts.entry(filter.id.clone()).or_insert(0) += 1;
        if options.verbose_errors && self.error_samples.len() < options.max_error_samples {
            self.error_samples.push(ErrorSample {
                filter_id: filter.id.clone(),
                combo: *combo,
                message,
            });
        }
    }
}

/// Supprime les doublons en conservant le premier ordre d'apparition.
pub fn dedup_pool(pool: &[Combo]) -> Vec<Combo> {
    let mut seen = HashSet::with_capacity(pool.len());
    pool.iter().copied().filter(|c| seen.insert(*c)).collect()
}

/// Filtres actifs dans l'ordre demandé (ordre du catalogue si `order` est
/// vide). Les ids inconnus sont ignorés avec un avertissement.
pub fn active_filters<'f>(catalog: &'f FilterCatalog, order: &[String]) -> Vec<&'f Filter> {
    if order.is_empty() {
        return catalog.iter().filter(|f| f.is_active()).collect();
    }

    let mut seen = HashSet::new();
    let mut active = Vec::new();
    for id in order {
        match catalog.get(id) {
            Some(filter) if filter.is_active() && seen.insert(id.as_str()) => active.push(filter),
            Some(_) => {}
            None => log::warn!("Filtre inconnu dans l'ordre demandé : {id}"),
        }
    }
    active
}

fn build_contexts<'c>(common: &'c CommonContext, pool: &[Combo]) -> Vec<Context<'c>> {
    pool.iter().map(|c| extend_for_candidate(common, c)).collect()
}

/// Verdicts d'un candidat pour chaque filtre actif (mode indépendant).
struct CandidateOutcome {
    eliminating: Vec<usize>,
    errors: Vec<(usize, String)>,
}

fn candidate_outcome(ctx: &Context<'_>, active: &[&Filter]) -> CandidateOutcome {
    let mut outcome = CandidateOutcome {
        eliminating: Vec::new(),
        errors: Vec::new(),
    };
    for (i, filter) in active.iter().enumerate() {
        match evaluate(filter, ctx) {
            Verdict::Eliminate => outcome.eliminating.push(i),
            Verdict::Error(message) => outcome.errors.push((i, message)),
            Verdict::Survive | Verdict::NotApplicable => {}
        }
    }
    outcome
}

fn run_independent(
    contexts: &[Context<'_>],
    active: &[&Filter],
    options: &EliminationOptions,
) -> EliminationResult {
    let mut result = EliminationResult::new(Mode::Independent, contexts.len(), active);

    let outcome_of = |ctx: &Context<'_>| {
        let outcome = candidate_outcome(ctx, active);
        if let Some(pb) = &options.progress {
            pb.inc(1);
        }
        outcome
    };
    let outcomes: Vec<CandidateOutcome> = if options.parallel {
        contexts.par_iter().map(outcome_of).collect()
    } else {
        contexts.iter().map(outcome_of).collect()
    };

    for (ctx, outcome) in contexts.iter().zip(outcomes) {
        let combo = ctx.combo();
        for &i in &outcome.eliminating {
            *result.per_filter_count.entry(active[i].id.clone()).or_insert(0) += 1;
        }
        for (i, message) in outcome.errors {
            result.record_error(active[i], combo, message, options);
        }
        match outcome.eliminating.first() {
            Some(&first) => {
                result.eliminated_by.insert(*combo, active[first].id.clone());
            }
            None => result.survivors.push(*combo),
        }
    }

    result
}

fn run_sequential(
    contexts: &[Context<'_>],
    active: &[&Filter],
    options: &EliminationOptions,
) -> EliminationResult {
    let mut result = EliminationResult::new(Mode::Sequential, contexts.len(), active);
    let mut remaining: Vec<usize> = (0..contexts.len()).collect();

    for filter in active {
        let mut kept = Vec::with_capacity(remaining.len());
        let mut removed = 0;
        for idx in remaining {
            let ctx = &contexts[idx];
            match evaluate(filter, ctx) {
                Verdict::Eliminate => {
                    result.eliminated_by.insert(*ctx.combo(), filter.id.clone());
                    removed += 1;
                }
                Verdict::Error(message) => {
                    result.record_error(filter, ctx.combo(), message, options);
                    kept.push(idx);
                }
                Verdict::Survive | Verdict::NotApplicable => kept.push(idx),
            }
        }
        result.per_filter_count.insert(filter.id.clone(), removed);
        log::debug!("{} : {} éliminés, {} restants", filter.id, removed, kept.len());
        remaining = kept;
    }

    result.survivors = remaining.into_iter().map(|i| *contexts[i].combo()).collect();
    result
}

/// Élimine les candidats du pool. Les doublons du pool sont fusionnés et
/// chaque contexte de candidat est construit une seule fois.
pub fn eliminate(
    pool: &[Combo],
    catalog: &FilterCatalog,
    common: &CommonContext,
    order: &[String],
    mode: Mode,
    options: &EliminationOptions,
) -> EliminationResult {
    let pool = dedup_pool(pool);
    let active = active_filters(catalog, order);
    let contexts = build_contexts(common, &pool);

    let result = match mode {
        Mode::Independent => run_independent(&contexts, &active, options),
        Mode::Sequential => run_sequential(&contexts, &active, options),
    };
    log::info!(
        "Mode {} : {} candidats, {} éliminés, {} survivants ({} filtres actifs)",
        mode,
        result.pool_size,
        result.total_eliminated(),
        result.survivors.len(),
        active.len()
    );
    result
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonRow {
    pub id: String,
    pub name: String,
    pub sequential: usize,
    pub independent: usize,
}

#[derive(Debug, Clone)]
pub struct ModeComparison {
    pub independent: EliminationResult,
    pub sequential: EliminationResult,
    /// Triées par éliminations indépendantes décroissantes, zéros en dernier.
    pub rows: Vec<ComparisonRow>,
}

impl ModeComparison {
    pub fn visible_rows(&self, hide_zero: bool) -> impl Iterator<Item = &ComparisonRow> {
        self.rows
            .iter()
            .filter(move |row| !hide_zero || row.independent > 0)
    }

    pub fn zero_count(&self) -> usize {
        self.rows.iter().filter(|row| row.independent == 0).count()
    }
}

fn rank_by_count<'f>(active: &[&'f Filter], independent: &EliminationResult) -> Vec<&'f Filter> {
    let mut ranked = active.to_vec();
    // tri stable : l'ordre d'origine départage les égalités
    ranked.sort_by_key(|f| {
        let count = independent.count(&f.id);
        (count == 0, std::cmp::Reverse(count))
    });
    ranked
}

/// Calcule les deux modes sur un seul jeu de contextes de candidats.
pub fn compare_modes(
    pool: &[Combo],
    catalog: &FilterCatalog,
    common: &CommonContext,
    order: &[String],
    options: &EliminationOptions,
) -> ModeComparison {
    let pool = dedup_pool(pool);
    let active = active_filters(catalog, order);
    let contexts = build_contexts(common, &pool);

    let independent = run_independent(&contexts, &active, options);
    let sequential_order = if options.rank_by_count {
        rank_by_count(&active, &independent)
    } else {
        active.clone()
    };
    let sequential = run_sequential(&contexts, &sequential_order, options);

    let rows: Vec<ComparisonRow> = rank_by_count(&active, &independent)
        .into_iter()
        .map(|f| ComparisonRow {
            id: f.id.clone(),
            name: f.display_name().to_string(),
            sequential: sequential.count(&f.id),
            independent: independent.count(&f.id),
        })
        .collect();

    log::info!(
        "Comparaison : {} candidats, {} survivants, {} filtres sans élimination",
        pool.len(),
        sequential.survivors.len(),
        rows.iter().filter(|r| r.independent == 0).count()
    );

    ModeComparison {
        independent,
        sequential,
        rows,
    }
}
