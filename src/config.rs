// ============================================================================
// Configuration
// ============================================================================
// Paramètres d'exécution avec valeurs par défaut, surchargeables par
// variables d'environnement :
//
// - MYBLOCK_REQUEST_TIMEOUT_SECS      : timeout de chaque appel au provider
// - MYBLOCK_POLL_INTERVAL_MS          : polling des filtres et des reçus
// - MYBLOCK_CONFIRMATION_TIMEOUT_SECS : attente max d'un reçu
// - MYBLOCK_LOG_DIR                   : répertoire des logs
//
// CONCEPT RUST : Injection de la source de config
// - from_lookup() prend une closure au lieu de lire std::env directement
// - Les tests passent une HashMap, sans toucher à l'environnement du process
// ============================================================================

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

pub const REQUEST_TIMEOUT_VAR: &str = "MYBLOCK_REQUEST_TIMEOUT_SECS";
pub const POLL_INTERVAL_VAR: &str = "MYBLOCK_POLL_INTERVAL_MS";
pub const CONFIRMATION_TIMEOUT_VAR: &str = "MYBLOCK_CONFIRMATION_TIMEOUT_SECS";
pub const LOG_DIR_VAR: &str = "MYBLOCK_LOG_DIR";

/// Page d'installation proposée quand aucun wallet n'est détecté
pub const WALLET_INSTALL_URL: &str = "https://metamask.io/download/";

/// Configuration de l'application
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Timeout appliqué à chaque requête JSON-RPC
    pub request_timeout: Duration,

    /// Intervalle de polling (filtre pending + reçus)
    pub poll_interval: Duration,

    /// Durée max d'attente d'un reçu après l'envoi
    pub confirmation_timeout: Duration,

    /// Répertoire des fichiers de log
    pub log_dir: PathBuf,
}

impl Config {
    /// Lit la configuration depuis les variables d'environnement
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Lit la configuration depuis une source arbitraire
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Self {
            request_timeout: parse_var(&lookup, REQUEST_TIMEOUT_VAR)
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            poll_interval: parse_var(&lookup, POLL_INTERVAL_VAR)
                .filter(|ms: &u64| *ms > 0)
                .map(Duration::from_millis)
                .unwrap_or(defaults.poll_interval),
            confirmation_timeout: parse_var(&lookup, CONFIRMATION_TIMEOUT_VAR)
                .map(Duration::from_secs)
                .unwrap_or(defaults.confirmation_timeout),
            log_dir: lookup(LOG_DIR_VAR)
                .filter(|dir| !dir.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.log_dir),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_millis(1000),
            confirmation_timeout: Duration::from_secs(300),
            log_dir: default_log_dir(),
        }
    }
}

/// Répertoire de logs par défaut
///
/// - Linux/WSL : ~/.local/share/myblock/logs
/// - macOS : ~/Library/Application Support/myblock/logs
/// - Windows : C:\Users\<user>\AppData\Local\myblock\logs
/// - Sinon : ./logs
pub fn default_log_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join("myblock").join("logs"))
        .unwrap_or_else(|| PathBuf::from("./logs"))
}

/// Parse une variable ; une valeur invalide est ignorée avec un warning
fn parse_var<F, T>(lookup: &F, key: &str) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "Invalid configuration value, using default");
            None
        }
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
