use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::eliminate::{EliminationOptions, Mode};

/// Réglages du moteur, lus depuis un fichier JSON ; toute clé absente prend
/// sa valeur par défaut.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub mode: Mode,
    pub parallel: bool,
    pub verbose_errors: bool,
    pub max_error_samples: usize,
    /// Masquer les filtres sans élimination initiale.
    pub hide_zero: bool,
    pub rank_by_count: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Independent,
            parallel: false,
            verbose_errors: false,
            max_error_samples: 100,
            hide_zero: true,
            rank_by_count: false,
        }
    }
}

impl EngineConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Impossible de lire la configuration {:?}", path))?;
        let config: Self = serde_json::from_str(&text)
            .with_context(|| format!("Configuration invalide {:?}", path))?;
        log::debug!("Configuration chargée : {:?}", config);
        Ok(config)
    }

    pub fn options(&self) -> EliminationOptions {
        EliminationOptions {
            parallel: self.parallel,
            verbose_errors: self.verbose_errors,
            max_error_samples: self.max_error_samples,
            rank_by_count: self.rank_by_count,
            progress: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = EngineConfig::default();
        assert_eq!(config.mode, Mode::Independent);
        assert_eq!(config.max_error_samples, 100);
        assert!(config.hide_zero);
        assert!(!config.parallel);
    }

    #[test]
    fn test_serde_roundtrip() {
        let config = EngineConfig {
            mode: Mode::Sequential,
            parallel: true,
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"sequential\""));
        let back: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: EngineConfig = serde_json::from_str(r#"{"verbose_errors": true}"#).unwrap();
        assert!(config.verbose_errors);
        assert_eq!(config.mode, Mode::Independent);
        assert!(config.hide_zero);
        let options = config.options();
        assert!(options.verbose_errors);
        assert_eq!(options.max_error_samples, 100);
    }

    #[test]
    fn test_load_missing_file() {
        assert!(EngineConfig::load(Path::new("/nonexistent/engine.json")).is_err());
    }
}
