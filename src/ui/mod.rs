// ============================================================================
// Module : ui
// ============================================================================
// Présentation des graphiques
//
// - Presenter : trait commun aux sorties (terminal interactif, export texte)
// - plot_data : construit le ChartSpec puis le présente
// ============================================================================

pub mod chart;  // Rendu ratatui d'un ChartSpec
pub mod events; // Gestion des événements clavier
pub mod export; // Export texte sans terminal
pub mod viewer; // Affichage interactif bloquant

use anyhow::Result;

use crate::models::SeriesTable;
use crate::plot::{build_chart, ChartSpec};

// Re-exports pour simplifier les imports
pub use export::TextExporter;
pub use viewer::TerminalPresenter;

/// Sortie d'un graphique
pub trait Presenter {
    /// Affiche ou exporte le graphique (peut bloquer jusqu'à fermeture)
    fn present(&mut self, spec: &ChartSpec) -> Result<()>;
}

/// Trace la colonne `y` en fonction de la colonne `x`
///
/// Une colonne absente fait échouer l'appel avant tout rendu : l'erreur
/// (SeriesError::MissingColumn) est récupérable via downcast_ref.
///
/// # Exemple
/// plot_data(&mut presenter, &result.table, "date_time", "2. high", "High Values")?;
pub fn plot_data<P>(
    presenter: &mut P,
    table: &SeriesTable,
    x: &str,
    y: &str,
    title: &str,
) -> Result<()>
where
    P: Presenter + ?Sized,
{
    let spec = build_chart(table, x, y, title)?;
    presenter.present(&spec)
}

// ============================================================================
// Tests
// ============================================================================
