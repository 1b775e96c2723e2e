// ============================================================================
// Sélecteurs de requête : Interval et OutputSize
// ============================================================================
// Valeurs transmises telles quelles au fournisseur
//
// CONCEPT RUST : Enums à la place de strings libres
// - Une valeur invalide ("7min") ne peut pas être construite
// - FromStr permet quand même de parser un label venant de l'extérieur
// ============================================================================

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Granularité d'une série intraday
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Interval {
    /// 1 minute
    OneMin,
    /// 5 minutes
    FiveMin,
    /// 15 minutes
    FifteenMin,
    /// 30 minutes
    ThirtyMin,
    /// 60 minutes
    SixtyMin,
}

impl Interval {
    /// Label attendu par l'API (paramètre `interval`)
    ///
    /// CONCEPT RUST : &'static str
    /// - String littérale stockée dans le binaire, pas d'allocation
    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::OneMin => "1min",
            Interval::FiveMin => "5min",
            Interval::FifteenMin => "15min",
            Interval::ThirtyMin => "30min",
            Interval::SixtyMin => "60min",
        }
    }

    /// Retourne tous les intervalles disponibles
    pub fn all() -> Vec<Interval> {
        vec![
            Interval::OneMin,
            Interval::FiveMin,
            Interval::FifteenMin,
            Interval::ThirtyMin,
            Interval::SixtyMin,
        ]
    }
}

impl Default for Interval {
    /// 15 minutes, comme le tutoriel
    fn default() -> Self {
        Interval::FifteenMin
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Interval::all()
            .into_iter()
            .find(|interval| interval.as_str() == s)
            .ok_or_else(|| format!("unknown interval `{}`", s))
    }
}

/// Taille de l'historique demandé
///
/// - Compact : les 100 dernières observations
/// - Full : tout l'historique disponible (jusqu'à 20 ans en daily)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum OutputSize {
    #[default]
    Compact,
    Full,
}

impl OutputSize {
    /// Label attendu par l'API (paramètre `outputsize`)
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputSize::Compact => "compact",
            OutputSize::Full => "full",
        }
    }

    pub fn all() -> Vec<OutputSize> {
        vec![OutputSize::Compact, OutputSize::Full]
    }
}

impl fmt::Display for OutputSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "compact" => Ok(OutputSize::Compact),
            "full" => Ok(OutputSize::Full),
            other => Err(format!("unknown output size `{}`", other)),
        }
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
