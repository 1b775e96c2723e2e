// ============================================================================
// Champs sémantiques et correspondance avec les labels des fournisseurs
// ============================================================================
// Alpha Vantage appelle le plus haut "2. high", Quandl l'appelle "high"
// ou "High" selon le jeu de données. ColumnMap fait la traduction une fois
// par adaptateur : le code en aval demande Field::High, sans jamais
// écrire le label du fournisseur.
// ============================================================================

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Champ sémantique d'une observation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Field {
    Open,
    High,
    Low,
    Close,
    AdjustedClose,
    Volume,
    DividendAmount,
    SplitCoefficient,
    /// Valeur unique d'une série macro-économique (ex : PIB)
    Value,
}

/// Correspondance Field -> label de colonne du fournisseur
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMap {
    labels: BTreeMap<Field, String>,
}

impl ColumnMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ajoute une correspondance (builder)
    pub fn with(mut self, field: Field, label: impl Into<String>) -> Self {
        self.labels.insert(field, label.into());
        self
    }

    /// Label du fournisseur pour ce champ
    pub fn label(&self, field: Field) -> Option<&str> {
        self.labels.get(&field).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.labels.iter().map(|(field, label)| (*field, label.as_str()))
    }

    /// Alpha Vantage, TIME_SERIES_INTRADAY
    pub fn alpha_vantage_intraday() -> Self {
        Self::new()
            .with(Field::Open, "1. open")
            .with(Field::High, "2. high")
            .with(Field::Low, "3. low")
            .with(Field::Close, "4. close")
            .with(Field::Volume, "5. volume")
    }

    /// Alpha Vantage, TIME_SERIES_DAILY_ADJUSTED
    pub fn alpha_vantage_daily_adjusted() -> Self {
        Self::new()
            .with(Field::Open, "1. open")
            .with(Field::High, "2. high")
            .with(Field::Low, "3. low")
            .with(Field::Close, "4. close")
            .with(Field::AdjustedClose, "5. adjusted close")
            .with(Field::Volume, "6. volume")
            .with(Field::DividendAmount, "7. dividend amount")
            .with(Field::SplitCoefficient, "8. split coefficient")
    }

    /// Déduit la correspondance à partir des noms de colonnes Quandl
    ///
    /// Les jeux de données Quandl n'ont pas de schéma fixe ("Value" pour
    /// FRED, "open"/"adj_close" pour WIKI/PRICES, "Open"/"Adj. Close" pour
    /// WIKI/AAPL) : on compare les noms normalisés.
    pub fn infer<'a>(column_names: impl IntoIterator<Item = &'a str>) -> Self {
        let mut map = Self::new();
        for name in column_names {
            if let Some(field) = guess_field(name) {
                // Le premier nom rencontré gagne
                map.labels.entry(field).or_insert_with(|| name.to_string());
            }
        }
        map
    }
}

/// Normalise un nom de colonne : minuscules, sans ponctuation ni espaces
fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

fn guess_field(name: &str) -> Option<Field> {
    match normalize(name).as_str() {
        "open" => Some(Field::Open),
        "high" => Some(Field::High),
        "low" => Some(Field::Low),
        "close" | "last" => Some(Field::Close),
        "adjclose" | "adjustedclose" => Some(Field::AdjustedClose),
        "volume" => Some(Field::Volume),
        "exdividend" | "dividend" | "dividendamount" => Some(Field::DividendAmount),
        "splitratio" | "splitcoefficient" => Some(Field::SplitCoefficient),
        "value" => Some(Field::Value),
        _ => None,
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
