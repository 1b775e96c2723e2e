// ============================================================================
// Structure : SeriesTable
// ============================================================================
// Table renvoyée par un fournisseur : des colonnes nommées avec les labels
// du fournisseur, et éventuellement un index temporel
//
// CONCEPTS RUST :
// 1. Stockage en colonnes : Vec<Column>, chaque colonne possède ses cellules
// 2. Enum Cell : une cellule est un nombre, un texte, une date ou rien
// 3. Invariant : chaque colonne a exactement `rows` cellules
// ============================================================================

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::error::SeriesError;
use crate::models::{ColumnMap, Field};

/// Nom de la colonne créée à partir de l'index temporel
pub const DATE_TIME_COLUMN: &str = "date_time";

/// Formats de dates acceptés, du plus précis au moins précis
const DATE_TIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// Parse un timestamp fourni sous forme de texte
///
/// Accepte "2024-01-02 15:45:00", "2024-01-02T15:45:00" et "2024-01-02"
/// (minuit dans ce dernier cas).
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    DATE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// Une cellule de la table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Cell {
    Number(f64),
    Text(String),
    Time(NaiveDateTime),
    Missing,
}

impl Cell {
    /// Construit une cellule à partir d'un texte du fournisseur
    ///
    /// Alpha Vantage envoie tous les prix sous forme de strings ("142.3400") :
    /// on garde un nombre quand le texte en est un.
    pub fn from_text(text: &str) -> Self {
        match text.trim().parse::<f64>() {
            Ok(value) => Cell::Number(value),
            Err(_) => Cell::Text(text.to_string()),
        }
    }

    /// Valeur numérique (nombre, ou texte numérique)
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(value) => Some(*value),
            Cell::Text(text) => text.trim().parse().ok(),
            _ => None,
        }
    }

    /// Valeur temporelle (date, ou texte au format date)
    pub fn as_time(&self) -> Option<NaiveDateTime> {
        match self {
            Cell::Time(time) => Some(*time),
            Cell::Text(text) => parse_timestamp(text),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }
}

/// Une colonne nommée
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    /// Label du fournisseur, non normalisé (ex : "2. high")
    pub name: String,
    pub values: Vec<Cell>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Cell>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, row: usize) -> Option<&Cell> {
        self.values.get(row)
    }

    /// Valeurs numériques (None pour les cellules non numériques)
    pub fn numbers(&self) -> Vec<Option<f64>> {
        self.values.iter().map(Cell::as_f64).collect()
    }
}

/// Index temporel d'une table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeIndex {
    /// Nom de l'index côté fournisseur (ex : "date", "Date")
    pub name: String,
    pub stamps: Vec<NaiveDateTime>,
}

/// Vue empruntée sur une ligne de la table
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeriesRow<'a> {
    pub timestamp: Option<NaiveDateTime>,
    pub fields: Vec<(&'a str, &'a Cell)>,
}

impl<'a> TimeSeriesRow<'a> {
    pub fn get(&self, name: &str) -> Option<&'a Cell> {
        self.fields
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, cell)| *cell)
    }
}

/// Table de données renvoyée par un fournisseur
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesTable {
    index: Option<TimeIndex>,
    columns: Vec<Column>,
    rows: usize,
}

impl SeriesTable {
    /// Table vide de `rows` lignes, sans index temporel
    pub fn new(rows: usize) -> Self {
        Self {
            index: None,
            columns: Vec::new(),
            rows,
        }
    }

    /// Table indexée par des timestamps (une ligne par timestamp)
    pub fn with_time_index(name: impl Into<String>, stamps: Vec<NaiveDateTime>) -> Self {
        let rows = stamps.len();
        Self {
            index: Some(TimeIndex {
                name: name.into(),
                stamps,
            }),
            columns: Vec::new(),
            rows,
        }
    }

    /// Construit une table indexée à partir de lignes (timestamp, champs)
    ///
    /// - Les lignes sont triées par timestamp croissant
    /// - Les colonnes apparaissent dans l'ordre de première rencontre
    /// - Un champ absent d'une ligne devient Cell::Missing
    pub fn from_time_rows(
        index_name: impl Into<String>,
        mut rows: Vec<(NaiveDateTime, Vec<(String, Cell)>)>,
    ) -> Self {
        // sort_by_key est stable : deux lignes au même timestamp gardent leur ordre
        rows.sort_by_key(|(stamp, _)| *stamp);

        let mut names: Vec<String> = Vec::new();
        for (_, fields) in &rows {
            for (name, _) in fields {
                if !names.contains(name) {
                    names.push(name.clone());
                }
            }
        }

        let mut columns: Vec<Column> = names
            .into_iter()
            .map(|name| Column::new(name, Vec::with_capacity(rows.len())))
            .collect();
        let mut stamps = Vec::with_capacity(rows.len());

        for (stamp, mut fields) in rows {
            stamps.push(stamp);
            for column in columns.iter_mut() {
                let cell = fields
                    .iter()
                    .position(|(name, _)| *name == column.name)
                    .map(|pos| fields.swap_remove(pos).1)
                    .unwrap_or(Cell::Missing);
                column.values.push(cell);
            }
        }

        let mut table = Self::with_time_index(index_name, stamps);
        table.columns = columns;
        table
    }

    /// Ajoute une colonne, ou remplace celle qui porte déjà ce nom
    pub fn push_column(&mut self, column: Column) -> Result<(), SeriesError> {
        let actual = column.len();
        if actual != self.rows {
            return Err(SeriesError::LengthMismatch {
                name: column.name,
                expected: self.rows,
                actual,
            });
        }
        match self.columns.iter_mut().find(|c| c.name == column.name) {
            Some(existing) => *existing = column,
            None => self.columns.push(column),
        }
        Ok(())
    }

    /// Recherche une colonne par son nom
    ///
    /// CONCEPT RUST : Option -> Result avec ok_or_else
    /// - Une colonne absente est une erreur de lookup explicite
    pub fn column(&self, name: &str) -> Result<&Column, SeriesError> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| SeriesError::MissingColumn(name.to_string()))
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn index(&self) -> Option<&TimeIndex> {
        self.index.as_ref()
    }

    /// Nombre de lignes
    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Copie l'index temporel dans une colonne ordinaire
    ///
    /// Le tableau garde son index : la nouvelle colonne en est une copie,
    /// utilisable comme axe X par le traceur.
    pub fn promote_index(&mut self, name: &str) -> Result<(), SeriesError> {
        let stamps = match &self.index {
            Some(index) => index.stamps.clone(),
            None => return Err(SeriesError::NoTimeIndex),
        };
        let values = stamps.into_iter().map(Cell::Time).collect();
        self.push_column(Column::new(name, values))
    }

    /// Ligne à la position `row`
    pub fn row(&self, row: usize) -> Option<TimeSeriesRow<'_>> {
        if row >= self.rows {
            return None;
        }
        let timestamp = self.index.as_ref().map(|index| index.stamps[row]);
        let fields = self
            .columns
            .iter()
            .map(|c| (c.name.as_str(), &c.values[row]))
            .collect();
        Some(TimeSeriesRow { timestamp, fields })
    }

    pub fn rows(&self) -> impl Iterator<Item = TimeSeriesRow<'_>> + '_ {
        (0..self.rows).filter_map(move |row| self.row(row))
    }
}

/// Métadonnées fournies avec une réponse (clé/valeur, ordre alphabétique)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Metadata(BTreeMap<String, String>);

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl FromIterator<(String, String)> for Metadata {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Résultat complet d'une requête : table + métadonnées + labels
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeriesResult {
    pub table: SeriesTable,
    pub metadata: Metadata,

    /// Correspondance champ sémantique -> label de colonne
    pub columns: ColumnMap,
}

impl TimeSeriesResult {
    pub fn new(table: SeriesTable, metadata: Metadata, columns: ColumnMap) -> Self {
        Self {
            table,
            metadata,
            columns,
        }
    }

    /// Colonne correspondant à un champ sémantique
    pub fn field(&self, field: Field) -> Result<&Column, SeriesError> {
        let label = self
            .columns
            .label(field)
            .ok_or(SeriesError::UnmappedField(field))?;
        self.table.column(label)
    }

    /// Label de colonne d'un champ, pour le passer au traceur
    pub fn label(&self, field: Field) -> Result<&str, SeriesError> {
        self.columns
            .label(field)
            .ok_or(SeriesError::UnmappedField(field))
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(text: &str) -> NaiveDateTime {
        parse_timestamp(text).unwrap()
    }

    fn sample_rows() -> Vec<(NaiveDateTime, Vec<(String, Cell)>)> {
        vec![
            (
                ts("2024-01-02 10:00:00"),
                vec![("2. high".to_string(), Cell::Number(141.0))],
            ),
            (
                ts("2024-01-02 09:45:00"),
                vec![
                    ("1. open".to_string(), Cell::Number(139.5)),
                    ("2. high".to_string(), Cell::Number(140.2)),
                ],
            ),
        ]
    }

    #[test]
    fn test_parse_timestamp_formats() {
        assert_eq!(
            parse_timestamp("2024-01-02"),
            NaiveDate::from_ymd_opt(2024, 1, 2).and_then(|d| d.and_hms_opt(0, 0, 0))
        );
        assert!(parse_timestamp("2024-01-02 15:45:00").is_some());
        assert!(parse_timestamp("2024-01-02T15:45:00").is_some());
        assert!(parse_timestamp("GOOGL").is_none());
    }

    #[test]
    fn test_cell_conversions() {
        assert_eq!(Cell::from_text("142.3400"), Cell::Number(142.34));
        assert_eq!(Cell::from_text("MSFT"), Cell::Text("MSFT".to_string()));
        assert_eq!(Cell::Text("12".to_string()).as_f64(), Some(12.0));
        assert_eq!(Cell::Missing.as_f64(), None);
        assert!(Cell::Text("2024-01-02".to_string()).as_time().is_some());
    }

    #[test]
    fn test_from_time_rows_sorts_and_fills() {
        let table = SeriesTable::from_time_rows("date", sample_rows());

        assert_eq!(table.len(), 2);
        assert_eq!(table.column_names(), vec!["1. open", "2. high"]);

        let index = table.index().unwrap();
        assert_eq!(index.stamps[0], ts("2024-01-02 09:45:00"));

        let open = table.column("1. open").unwrap();
        assert_eq!(open.values, vec![Cell::Number(139.5), Cell::Missing]);
    }

    #[test]
    fn test_missing_column_is_lookup_error() {
        let table = SeriesTable::from_time_rows("date", sample_rows());
        assert_eq!(
            table.column("9. nope"),
            Err(SeriesError::MissingColumn("9. nope".to_string()))
        );
    }

    #[test]
    fn test_push_column_checks_length() {
        let mut table = SeriesTable::new(2);
        let err = table
            .push_column(Column::new("x", vec![Cell::Missing]))
            .unwrap_err();
        assert_eq!(
            err,
            SeriesError::LengthMismatch {
                name: "x".to_string(),
                expected: 2,
                actual: 1,
            }
        );

        table
            .push_column(Column::new("x", vec![Cell::Missing, Cell::Number(1.0)]))
            .unwrap();
        table
            .push_column(Column::new("x", vec![Cell::Number(0.0), Cell::Number(1.0)]))
            .unwrap();
        assert_eq!(table.columns().len(), 1);
    }

    #[test]
    fn test_promote_index() {
        let mut table = SeriesTable::from_time_rows("date", sample_rows());
        table.promote_index(DATE_TIME_COLUMN).unwrap();

        let column = table.column(DATE_TIME_COLUMN).unwrap();
        let promoted: Vec<_> = column.values.iter().map(|c| c.as_time().unwrap()).collect();
        assert_eq!(promoted, table.index().unwrap().stamps);

        let mut flat = SeriesTable::new(0);
        assert_eq!(flat.promote_index(DATE_TIME_COLUMN), Err(SeriesError::NoTimeIndex));
    }

    #[test]
    fn test_rows_view() {
        let table = SeriesTable::from_time_rows("date", sample_rows());
        let rows: Vec<_> = table.rows().collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].timestamp, Some(ts("2024-01-02 10:00:00")));
        assert_eq!(rows[1].get("2. high"), Some(&Cell::Number(141.0)));
        assert!(table.row(2).is_none());
    }

    #[test]
    fn test_result_field_lookup() {
        let table = SeriesTable::from_time_rows("date", sample_rows());
        let result =
            TimeSeriesResult::new(table, Metadata::new(), ColumnMap::alpha_vantage_intraday());

        let high = result.field(Field::High).unwrap();
        assert_eq!(high.name, "2. high");

        // Mappé mais absent de la table
        assert_eq!(
            result.field(Field::Close),
            Err(SeriesError::MissingColumn("4. close".to_string()))
        );
        // Pas mappé du tout
        assert_eq!(
            result.label(Field::Value),
            Err(SeriesError::UnmappedField(Field::Value))
        );
    }

    #[test]
    fn test_metadata() {
        let mut metadata = Metadata::new();
        metadata.insert("2. Symbol", "GOOGL");
        metadata.insert("1. Information", "Intraday (15min)");
        let keys: Vec<_> = metadata.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["1. Information", "2. Symbol"]);
        assert_eq!(metadata.get("2. Symbol"), Some("GOOGL"));
    }
}
