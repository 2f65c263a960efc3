mod analysis;
mod display;
mod pool;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};

use crate::analysis::{compute_stats, hot_cold};
use crate::display::{
    display_broken, display_comparison, display_context, display_diagnosis, display_errors,
    display_hot_cold, display_result, display_survivors,
};
use crate::pool::{generate_pool, Method};
use dc5_core::models::{parse_digit_list, Combo, Draw, History};
use dc5_filters::catalog::read_catalog;
use dc5_filters::config::EngineConfig;
use dc5_filters::context::{build_common_context, CommonContext};
use dc5_filters::eliminate::{compare_modes, eliminate, EliminationOptions, Mode};
use dc5_filters::engine::diagnose;
use dc5_filters::filter::FilterCatalog;

/// Au-delà, une barre de progression accompagne le passage indépendant.
const PROGRESS_THRESHOLD: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum RunMode {
    /// Comparaison séquentiel / indépendant
    Both,
    Independent,
    Sequential,
}

impl From<Mode> for RunMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Independent => RunMode::Independent,
            Mode::Sequential => RunMode::Sequential,
        }
    }
}

#[derive(Parser)]
#[command(name = "dc5", about = "Filtres d'élimination pour tirages DC-5")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct DrawArgs {
    /// Tirage de référence (5 chiffres)
    #[arg(short, long)]
    seed: String,

    /// Tirage précédent
    #[arg(long)]
    prev: Option<String>,

    /// Tirage 2-back
    #[arg(long)]
    prev_prev: Option<String>,

    /// Tirage 3-back
    #[arg(long)]
    prev_prev_prev: Option<String>,

    /// Chiffres chauds (ex: 1,7)
    #[arg(long, default_value = "")]
    hot: String,

    /// Chiffres froids
    #[arg(long, default_value = "")]
    cold: String,

    /// Chiffres dus (par défaut : absents des deux derniers tirages)
    #[arg(long)]
    due: Option<String>,
}

impl DrawArgs {
    fn history(&self) -> Result<History> {
        let entries = [
            self.seed.as_str(),
            self.prev.as_deref().unwrap_or(""),
            self.prev_prev.as_deref().unwrap_or(""),
            self.prev_prev_prev.as_deref().unwrap_or(""),
        ];
        History::parse(&entries).context("Historique invalide")
    }

    fn common_context(&self) -> Result<CommonContext> {
        let history = self.history()?;
        let hot = parse_digit_list(&self.hot)?;
        let cold = parse_digit_list(&self.cold)?;
        let due = self.due.as_deref().map(parse_digit_list).transpose()?;
        let common = build_common_context(history.draws(), &hot, &cold, due.as_deref())?;
        Ok(common)
    }
}

#[derive(Args)]
struct CatalogArgs {
    /// Catalogue CSV des filtres
    #[arg(short, long, default_value = "lottery_filters_batch10.csv")]
    filters: PathBuf,

    /// Activer tous les filtres, quelle que soit la colonne `enabled`
    #[arg(long)]
    all: bool,

    /// Filtres à activer (ids séparés par des virgules)
    #[arg(long)]
    enable: Option<String>,

    /// Filtres à désactiver (ids séparés par des virgules)
    #[arg(long)]
    disable: Option<String>,
}

impl CatalogArgs {
    fn load(&self) -> Result<FilterCatalog> {
        let mut catalog = read_catalog(&self.filters)?;
        self.apply(&mut catalog);
        Ok(catalog)
    }

    /// `--all` d'abord, puis `--enable` et enfin `--disable`.
    fn apply(&self, catalog: &mut FilterCatalog) {
        if self.all {
            catalog.set_all_enabled(true);
        }
        let toggles = [(self.enable.as_deref(), true), (self.disable.as_deref(), false)];
        for (ids, enabled) in toggles {
            for id in parse_order(ids) {
                if !catalog.set_enabled(&id, enabled) {
                    log::warn!("Filtre inconnu : {id}");
                }
            }
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Générer le pool et appliquer les filtres
    Run {
        #[command(flatten)]
        draws: DrawArgs,

        #[command(flatten)]
        catalog: CatalogArgs,

        /// Méthode de génération du pool
        #[arg(short, long, value_enum, default_value = "one-digit")]
        method: Method,

        /// Mode d'élimination (par défaut : comparaison des deux modes)
        #[arg(long, value_enum)]
        mode: Option<RunMode>,

        /// Ordre d'évaluation (ids séparés par des virgules)
        #[arg(long)]
        order: Option<String>,

        /// Afficher les filtres sans élimination
        #[arg(long)]
        show_zero: bool,

        /// Lister les survivants
        #[arg(long)]
        survivors: bool,

        /// Évaluation parallèle du mode indépendant
        #[arg(long)]
        parallel: bool,

        /// Afficher des exemples de messages d'erreur
        #[arg(long)]
        verbose_errors: bool,

        /// Ordonner le passage séquentiel par éliminations décroissantes
        #[arg(long)]
        rank: bool,

        /// Fichier de configuration JSON du moteur
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Diagnostiquer une combinaison contre tout le catalogue
    Check {
        /// Combinaison à tester (5 chiffres)
        combo: String,

        #[command(flatten)]
        draws: DrawArgs,

        #[command(flatten)]
        catalog: CatalogArgs,
    },

    /// Lister les filtres cassés et les doublons
    Broken {
        #[command(flatten)]
        catalog: CatalogArgs,
    },

    /// Calculer les chiffres chauds, froids et dus
    Hotcold {
        /// Tirages, du plus récent au plus ancien
        #[arg(required = true)]
        draws: Vec<String>,
    },

    /// Afficher les faits communs du tirage de référence
    Context {
        #[command(flatten)]
        draws: DrawArgs,
    },
}

struct RunRequest {
    draws: DrawArgs,
    catalog: CatalogArgs,
    method: Method,
    mode: Option<RunMode>,
    order: Option<String>,
    show_zero: bool,
    survivors: bool,
    parallel: bool,
    verbose_errors: bool,
    rank: bool,
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Run {
            draws,
            catalog,
            method,
            mode,
            order,
            show_zero,
            survivors,
            parallel,
            verbose_errors,
            rank,
            config,
        } => cmd_run(RunRequest {
            draws,
            catalog,
            method,
            mode,
            order,
            show_zero,
            survivors,
            parallel,
            verbose_errors,
            rank,
            config,
        }),
        Command::Check {
            combo,
            draws,
            catalog,
        } => cmd_check(&combo, &draws, &catalog),
        Command::Broken { catalog } => cmd_broken(&catalog),
        Command::Hotcold { draws } => cmd_hotcold(&draws),
        Command::Context { draws } => cmd_context(&draws),
    }
}

fn parse_order(order: Option<&str>) -> Vec<String> {
    order
        .map(|text| {
            text.split(',')
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn progress_bar(len: usize) -> Result<Option<ProgressBar>> {
    if len < PROGRESS_THRESHOLD {
        return Ok(None);
    }
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
        )?
        .progress_chars("=> "),
    );
    Ok(Some(pb))
}

fn cmd_run(req: RunRequest) -> Result<()> {
    let config = match &req.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    let mode = match (req.mode, &req.config) {
        (Some(mode), _) => mode,
        (None, Some(_)) => RunMode::from(config.mode),
        (None, None) => RunMode::Both,
    };
    let hide_zero = config.hide_zero && !req.show_zero;

    let common = req.draws.common_context()?;
    let catalog = req.catalog.load()?;
    if catalog.is_empty() {
        bail!("Aucun filtre dans le catalogue {:?}", req.catalog.filters);
    }
    let pool = generate_pool(common.seed(), req.method)?;
    let order = parse_order(req.order.as_deref());

    let options = EliminationOptions {
        parallel: config.parallel || req.parallel,
        verbose_errors: config.verbose_errors || req.verbose_errors,
        rank_by_count: config.rank_by_count || req.rank,
        progress: progress_bar(pool.len())?,
        ..config.options()
    };
    println!("{} candidats générés depuis {}", pool.len(), common.seed());

    let result = match mode {
        RunMode::Both => {
            let comparison = compare_modes(&pool, &catalog, &common, &order, &options);
            finish(&options);
            display_comparison(&comparison, hide_zero);
            comparison.sequential
        }
        RunMode::Independent | RunMode::Sequential => {
            let mode = match mode {
                RunMode::Sequential => Mode::Sequential,
                _ => Mode::Independent,
            };
            let result = eliminate(&pool, &catalog, &common, &order, mode, &options);
            finish(&options);
            display_result(&result, hide_zero);
            result
        }
    };

    display_errors(&result);
    if req.survivors {
        display_survivors(&result);
    } else {
        println!("{} survivants (--survivors pour les lister)", result.survivors.len());
    }
    Ok(())
}

fn finish(options: &EliminationOptions) {
    if let Some(pb) = &options.progress {
        pb.finish_and_clear();
    }
}

fn cmd_check(combo: &str, draws: &DrawArgs, args: &CatalogArgs) -> Result<()> {
    let combo = Combo::parse(combo).context("Combinaison invalide")?;
    let common = draws.common_context()?;
    let catalog = args.load()?;
    let diagnosis = diagnose(&catalog, &common, &combo);
    display_diagnosis(&combo, &diagnosis, &catalog);
    Ok(())
}

fn cmd_broken(args: &CatalogArgs) -> Result<()> {
    let catalog = args.load()?;
    display_broken(&catalog);
    Ok(())
}

fn cmd_hotcold(entries: &[String]) -> Result<()> {
    let draws = entries
        .iter()
        .map(|text| Draw::parse(text))
        .collect::<Result<Vec<_>, _>>()
        .context("Tirage invalide pour le calcul chaud/froid")?;
    let stats = compute_stats(&draws);
    let result = hot_cold(&draws);
    display_hot_cold(&stats, &result, draws.len());
    Ok(())
}

fn cmd_context(draws: &DrawArgs) -> Result<()> {
    let common = draws.common_context()?;
    display_context(&common);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dc5_filters::filter::{load_filters, RawFilterRow};

    #[test]
    fn test_parse_order() {
        assert_eq!(
            parse_order(Some(" F1, F2 ,,F3")),
            vec!["F1".to_string(), "F2".to_string(), "F3".to_string()]
        );
        assert!(parse_order(None).is_empty());
    }

    #[test]
    fn test_draw_args_history() {
        let args = DrawArgs {
            seed: "11323".to_string(),
            prev: Some("45638".to_string()),
            prev_prev: None,
            prev_prev_prev: Some("90876".to_string()),
            hot: String::new(),
            cold: String::new(),
            due: None,
        };
        assert!(args.history().is_err());

        let args = DrawArgs {
            prev_prev_prev: None,
            hot: "1,7".to_string(),
            ..args
        };
        assert_eq!(args.history().unwrap().len(), 2);
        assert!(args.common_context().is_ok());
    }

    #[test]
    fn test_invalid_hint_digits() {
        let args = DrawArgs {
            seed: "11323".to_string(),
            prev: None,
            prev_prev: None,
            prev_prev_prev: None,
            hot: "1,12".to_string(),
            cold: String::new(),
            due: None,
        };
        assert!(args.common_context().is_err());
    }

    #[test]
    fn test_cli_parses_run() {
        let cli = Cli::try_parse_from([
            "dc5", "run", "--seed", "11323", "--filters", "f.csv", "--mode", "sequential",
            "--method", "pair",
        ])
        .unwrap();
        match cli.command {
            Command::Run { mode, method, .. } => {
                assert_eq!(mode, Some(RunMode::Sequential));
                assert_eq!(method, Method::Pair);
            }
            _ => panic!("sous-commande inattendue"),
        }
    }

    fn catalog_args(cli: Cli) -> CatalogArgs {
        match cli.command {
            Command::Run { catalog, .. }
            | Command::Check { catalog, .. }
            | Command::Broken { catalog } => catalog,
            _ => panic!("sous-commande sans catalogue"),
        }
    }

    fn sample_catalog() -> FilterCatalog {
        let row = |id: &str, enabled: &str| RawFilterRow {
            id: id.to_string(),
            name: String::new(),
            enabled: enabled.to_string(),
            applicable_if: String::new(),
            expression: "combo_sum > 20".to_string(),
        };
        load_filters(vec![row("F1", "false"), row("F2", "true"), row("F3", "false")])
    }

    fn enabled_ids(catalog: &FilterCatalog) -> Vec<&str> {
        catalog
            .iter()
            .filter(|f| f.enabled)
            .map(|f| f.id.as_str())
            .collect()
    }

    #[test]
    fn test_catalog_toggles_from_command_line() {
        let args = catalog_args(
            Cli::try_parse_from(["dc5", "broken", "--enable", "F1,F9", "--disable", "F2"]).unwrap(),
        );
        let mut catalog = sample_catalog();
        args.apply(&mut catalog);
        assert_eq!(enabled_ids(&catalog), vec!["F1"]);

        let args = catalog_args(
            Cli::try_parse_from(["dc5", "check", "12345", "--seed", "11323", "--all"]).unwrap(),
        );
        let mut catalog = sample_catalog();
        args.apply(&mut catalog);
        assert_eq!(enabled_ids(&catalog), vec!["F1", "F2", "F3"]);

        let args = catalog_args(
            Cli::try_parse_from(["dc5", "run", "--seed", "11323", "--all", "--disable", "F3"])
                .unwrap(),
        );
        let mut catalog = sample_catalog();
        args.apply(&mut catalog);
        assert_eq!(enabled_ids(&catalog), vec!["F1", "F2"]);
    }

    #[test]
    fn test_catalog_without_toggles_keeps_csv_flags() {
        let args = catalog_args(Cli::try_parse_from(["dc5", "broken"]).unwrap());
        let mut catalog = sample_catalog();
        args.apply(&mut catalog);
        assert_eq!(enabled_ids(&catalog), vec!["F2"]);
    }

    #[test]
    fn test_small_pool_has_no_progress_bar() {
        assert!(progress_bar(10).unwrap().is_none());
    }
}
