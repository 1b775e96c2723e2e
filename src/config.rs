// ============================================================================
// Module : config
// ============================================================================
// Configuration explicite passée à chaque fetch
//
// Les deux clés API (Alpha Vantage, Quandl) ne sont plus des variables
// globales : elles vivent dans Settings, construit une fois au démarrage
// (valeurs par défaut + surcharges par variables d'environnement).
// ============================================================================

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

/// URL par défaut de l'API Alpha Vantage
pub const DEFAULT_ALPHA_VANTAGE_URL: &str = "https://www.alphavantage.co/query";

/// URL par défaut de l'API Quandl (Nasdaq Data Link)
pub const DEFAULT_QUANDL_URL: &str = "https://data.nasdaq.com/api/v3";

/// Clé utilisée quand aucune n'est fournie (acceptée par les deux APIs
/// pour quelques jeux de données de démonstration)
pub const DEMO_API_KEY: &str = "demo";

/// Clé API opaque
///
/// CONCEPT RUST : Newtype pattern
/// - Enveloppe une String pour lui donner un type distinct
/// - Debug est implémenté à la main pour ne jamais écrire la clé dans les logs
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Valeur brute, à n'utiliser que pour construire la requête
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Vrai si c'est la clé de démonstration
    pub fn is_demo(&self) -> bool {
        self.0 == DEMO_API_KEY
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Paramètres de l'application
#[derive(Debug, Clone)]
pub struct Settings {
    /// Clé Alpha Vantage (fournisseur A)
    pub alpha_vantage_key: Credential,

    /// Clé Quandl (fournisseur B)
    pub quandl_key: Credential,

    pub alpha_vantage_url: String,
    pub quandl_url: String,

    /// Timeout des requêtes HTTP (None : attente illimitée)
    pub request_timeout: Option<Duration>,

    /// Si défini, les graphiques sont exportés en texte dans ce répertoire
    /// au lieu d'être affichés dans le terminal
    pub export_dir: Option<PathBuf>,

    /// Répertoire des fichiers de logs
    pub log_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            alpha_vantage_key: Credential::new(DEMO_API_KEY),
            quandl_key: Credential::new(DEMO_API_KEY),
            alpha_vantage_url: DEFAULT_ALPHA_VANTAGE_URL.to_string(),
            quandl_url: DEFAULT_QUANDL_URL.to_string(),
            request_timeout: None,
            export_dir: None,
            log_dir: default_log_dir(),
        }
    }
}

impl Settings {
    /// Valeurs par défaut + surcharges de l'environnement
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut settings = Self::default();
        settings.apply_env_overrides()?;
        Ok(settings)
    }

    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_string_env("ALPHA_VANTAGE_API_KEY")? {
            self.alpha_vantage_key = Credential::new(value);
        }
        if let Some(value) = read_string_env("QUANDL_API_KEY")? {
            self.quandl_key = Credential::new(value);
        }
        if let Some(value) = read_string_env("FINSERIES_ALPHA_VANTAGE_URL")? {
            self.alpha_vantage_url = value;
        }
        if let Some(value) = read_string_env("FINSERIES_QUANDL_URL")? {
            self.quandl_url = value;
        }
        if let Some(secs) = read_u64_env("FINSERIES_HTTP_TIMEOUT_SECS")? {
            self.request_timeout = Some(Duration::from_secs(secs));
        }
        if let Some(value) = read_string_env("FINSERIES_EXPORT_DIR")? {
            self.export_dir = Some(PathBuf::from(value));
        }
        if let Some(value) = read_string_env("FINSERIES_LOG_DIR")? {
            self.log_dir = PathBuf::from(value);
        }
        Ok(())
    }
}

/// Répertoire de logs par défaut
///
/// - Linux/WSL : ~/.local/share/finseries/logs
/// - macOS : ~/Library/Application Support/finseries/logs
/// - Sinon : ./logs
fn default_log_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join("finseries").join("logs"))
        .unwrap_or_else(|| PathBuf::from("./logs"))
}

fn read_string_env(key: &str) -> Result<Option<String>, ConfigError> {
    match env::var(key) {
        Ok(value) if value.trim().is_empty() => Ok(None),
        Ok(value) => Ok(Some(value)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(err) => Err(ConfigError::Unreadable {
            key: key.to_string(),
            reason: err.to_string(),
        }),
    }
}

fn read_u64_env(key: &str) -> Result<Option<u64>, ConfigError> {
    match read_string_env(key)? {
        Some(value) => value
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| ConfigError::Invalid {
                key: key.to_string(),
                expected: "a whole number of seconds",
                value,
            }),
        None => Ok(None),
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
// Les variables d'environnement sont globales au processus : chaque test
// utilise ses propres noms de variables pour ne pas interférer avec les autres.
// ============================================================================
