// ============================================================================
// Module : models
// ============================================================================
// Structures de données : sélecteurs de requête, tables, métadonnées
// ============================================================================

pub mod field;    // Champs sémantiques et labels fournisseur
pub mod interval; // Interval et OutputSize
pub mod series;   // Table, cellules, métadonnées, résultat

// Re-export des structures principales pour simplifier les imports
pub use field::{ColumnMap, Field};
pub use interval::{Interval, OutputSize};
pub use series::{
    parse_timestamp, Cell, Column, Metadata, SeriesTable, TimeIndex, TimeSeriesResult,
    TimeSeriesRow, DATE_TIME_COLUMN,
};
