// ============================================================================
// Module : plot
// ============================================================================
// Transforme une table en description de graphique (ChartSpec)
//
// Fonction pure : aucune dépendance au terminal. L'affichage réel est fait
// par un Presenter (voir ui), interactif ou exporté en texte.
// ============================================================================

pub mod axis; // Bornes et labels des axes

use serde::Serialize;
use tracing::debug;

use crate::error::SeriesError;
use crate::models::SeriesTable;

/// Style de la courbe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LineStyle {
    /// Points reliés par des segments
    pub connected: bool,
    /// Marqueur sur chaque point
    pub markers: bool,
}

impl Default for LineStyle {
    /// Ligne continue sans marqueurs
    fn default() -> Self {
        Self {
            connected: true,
            markers: false,
        }
    }
}

/// Un axe : titre, bornes, labels
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisSpec {
    pub title: String,
    pub bounds: [f64; 2],
    pub labels: Vec<String>,
}

/// Description complète d'un graphique ligne
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub title: String,

    /// Nom de la série (légende) : le nom de la colonne Y
    pub series_name: String,

    /// Points (timestamp Unix en secondes, valeur), triés par temps
    pub points: Vec<(f64, f64)>,

    pub x_axis: AxisSpec,
    pub y_axis: AxisSpec,
    pub line: LineStyle,
}

impl ChartSpec {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Construit le graphique de la colonne `y` en fonction de la colonne `x`
///
/// - Colonne absente : SeriesError::MissingColumn, rien n'est dessiné
/// - `x` doit contenir des dates (ou du texte au format date)
/// - `y` doit contenir des nombres (ou du texte numérique) :
///   SeriesError::NotNumeric sinon
/// - Les lignes dont `x` ou `y` est vide (Cell::Missing, NaN) sont ignorées
///
/// # Exemple
/// let spec = build_chart(&result.table, "date_time", "2. high", "High Values")?;
pub fn build_chart(
    table: &SeriesTable,
    x: &str,
    y: &str,
    title: &str,
) -> Result<ChartSpec, SeriesError> {
    let x_column = table.column(x)?;
    let y_column = table.column(y)?;

    let mut points = Vec::with_capacity(table.len());
    for (row, (x_cell, y_cell)) in x_column.values.iter().zip(&y_column.values).enumerate() {
        if y_cell.is_missing() {
            continue;
        }
        let value = match y_cell.as_f64() {
            Some(value) if value.is_finite() => value,
            Some(_) => continue,
            None => {
                return Err(SeriesError::NotNumeric {
                    column: y.to_string(),
                    row,
                })
            }
        };
        if x_cell.is_missing() {
            continue;
        }
        let time = x_cell.as_time().ok_or_else(|| SeriesError::NotTimeLike {
            column: x.to_string(),
            row,
        })?;
        points.push((time.and_utc().timestamp() as f64, value));
    }
    points.sort_by(|a, b| a.0.total_cmp(&b.0));

    let skipped = table.len() - points.len();
    debug!(points = points.len(), skipped, "Built chart points");

    let x_bounds = axis::time_bounds(points.iter().map(|p| p.0));
    let y_bounds = axis::value_bounds(points.iter().map(|p| p.1));

    Ok(ChartSpec {
        title: title.to_string(),
        series_name: y.to_string(),
        x_axis: AxisSpec {
            title: x.to_string(),
            bounds: x_bounds,
            labels: axis::time_labels(x_bounds, axis::X_LABEL_COUNT),
        },
        y_axis: AxisSpec {
            title: y.to_string(),
            bounds: y_bounds,
            labels: axis::value_labels(y_bounds),
        },
        points,
        line: LineStyle::default(),
    })
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{parse_timestamp, Cell, Column, DATE_TIME_COLUMN};

    fn quarterly_gdp() -> SeriesTable {
        let rows = [
            ("2023-07-01", 27610.128),
            ("2023-01-01", 26813.601),
            ("2023-04-01", 27063.012),
        ]
        .iter()
        .map(|(date, value)| {
            (
                parse_timestamp(date).unwrap(),
                vec![("Value".to_string(), Cell::Number(*value))],
            )
        })
        .collect();
        let mut table = SeriesTable::from_time_rows("Date", rows);
        table.promote_index(DATE_TIME_COLUMN).unwrap();
        table
    }

    #[test]
    fn test_build_chart_from_series() {
        let spec =
            build_chart(&quarterly_gdp(), DATE_TIME_COLUMN, "Value", "Quarterly GDP Data").unwrap();

        assert_eq!(spec.title, "Quarterly GDP Data");
        assert_eq!(spec.series_name, "Value");
        assert_eq!(spec.points.len(), 3);
        assert!(spec.points.windows(2).all(|w| w[0].0 < w[1].0));
        assert_eq!(spec.points[0].1, 26813.601);
        assert_eq!(spec.line, LineStyle { connected: true, markers: false });

        // ~6 mois : dates complètes
        assert_eq!(spec.x_axis.labels.first().map(String::as_str), Some("2023-01-01"));
        assert_eq!(spec.x_axis.labels.len(), axis::X_LABEL_COUNT);
        assert!(spec.y_axis.bounds[0] < 26813.601 && spec.y_axis.bounds[1] > 27610.128);
    }

    #[test]
    fn test_missing_column_is_lookup_error() {
        let err = build_chart(&quarterly_gdp(), DATE_TIME_COLUMN, "2. high", "GDP").unwrap_err();
        assert_eq!(err, SeriesError::MissingColumn("2. high".to_string()));

        let err = build_chart(&quarterly_gdp(), "when", "Value", "GDP").unwrap_err();
        assert_eq!(err, SeriesError::MissingColumn("when".to_string()));
    }

    #[test]
    fn test_text_dates_and_gaps() {
        // Table sans index : colonne "date" en texte, une valeur manquante
        let mut table = SeriesTable::new(3);
        table
            .push_column(Column::new(
                "date",
                vec![
                    Cell::Text("2018-03-26".to_string()),
                    Cell::Text("2018-03-27".to_string()),
                    Cell::Text("2018-03-28".to_string()),
                ],
            ))
            .unwrap();
        table
            .push_column(Column::new(
                "open",
                vec![Cell::Number(90.61), Cell::Missing, Cell::Number(94.94)],
            ))
            .unwrap();

        let spec = build_chart(&table, "date", "open", "MSFT").unwrap();
        assert_eq!(spec.points.len(), 2);
    }

    #[test]
    fn test_non_time_x_column() {
        let mut table = SeriesTable::new(1);
        table
            .push_column(Column::new("ticker", vec![Cell::Text("MSFT".to_string())]))
            .unwrap();
        table
            .push_column(Column::new("open", vec![Cell::Number(1.0)]))
            .unwrap();

        let err = build_chart(&table, "ticker", "open", "MSFT").unwrap_err();
        assert_eq!(
            err,
            SeriesError::NotTimeLike {
                column: "ticker".to_string(),
                row: 0
            }
        );
    }

    #[test]
    fn test_non_numeric_y_column() {
        let mut table = SeriesTable::new(2);
        table
            .push_column(Column::new(
                "date",
                vec![
                    Cell::Text("2018-03-26".to_string()),
                    Cell::Text("2018-03-27".to_string()),
                ],
            ))
            .unwrap();
        table
            .push_column(Column::new(
                "ticker",
                vec![Cell::Missing, Cell::Text("MSFT".to_string())],
            ))
            .unwrap();

        let err = build_chart(&table, "date", "ticker", "MSFT").unwrap_err();
        assert_eq!(
            err,
            SeriesError::NotNumeric {
                column: "ticker".to_string(),
                row: 1
            }
        );
    }

    #[test]
    fn test_empty_table_gives_empty_chart() {
        let mut table = SeriesTable::from_time_rows("date", Vec::new());
        table.promote_index(DATE_TIME_COLUMN).unwrap();
        table.push_column(Column::new("2. high", Vec::new())).unwrap();

        let spec = build_chart(&table, DATE_TIME_COLUMN, "2. high", "Empty").unwrap();
        assert!(spec.is_empty());
        assert_eq!(spec.y_axis.bounds, [0.0, 1.0]);
    }
}
