// ============================================================================
// Module : error
// ============================================================================
// Erreurs typées de la bibliothèque
//
// - FetchError : échecs d'un appel à un fournisseur (réseau, HTTP, refus)
// - SeriesError : accès invalide à une table (colonne absente, etc.)
// - ConfigError : variable d'environnement illisible ou mal formée
//
// Le binaire remonte tout via anyhow (voir main.rs) et s'arrête
// à la première erreur.
// ============================================================================

use thiserror::Error;

use crate::models::Field;

/// Erreur lors de la lecture ou de la construction d'une table
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SeriesError {
    /// Erreur de lookup : la colonne demandée n'existe pas
    #[error("column `{0}` not found")]
    MissingColumn(String),

    #[error("column `{name}` has {actual} values but the table has {expected} rows")]
    LengthMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("table has no time index to promote")]
    NoTimeIndex,

    #[error("field {0:?} is not mapped by this provider")]
    UnmappedField(Field),

    #[error("column `{column}` row {row} is not time-like")]
    NotTimeLike { column: String, row: usize },

    #[error("column `{column}` row {row} is not numeric")]
    NotNumeric { column: String, row: usize },
}

/// Erreur lors d'un appel à un fournisseur de données
///
/// Chaque variant porte le nom du fournisseur pour que le message
/// final reste lisible sans contexte supplémentaire.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("{provider}: failed to build HTTP client")]
    Client {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider}: request failed")]
    Transport {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider}: HTTP {status}: {body}")]
    Status {
        provider: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },

    /// Le fournisseur a répondu avec un message d'erreur
    /// (clé invalide, symbole inconnu, quota atteint...)
    #[error("{provider} rejected the request: {message}")]
    Rejected {
        provider: &'static str,
        message: String,
    },

    #[error("{provider}: unexpected response: {reason}")]
    Decode {
        provider: &'static str,
        reason: String,
    },

    #[error(transparent)]
    Series(#[from] SeriesError),
}

/// Erreur de configuration (variables d'environnement)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("failed to read {key}: {reason}")]
    Unreadable { key: String, reason: String },

    #[error("{key} must be {expected}, got `{value}`")]
    Invalid {
        key: String,
        expected: &'static str,
        value: String,
    },
}
