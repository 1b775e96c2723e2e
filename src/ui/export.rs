// ============================================================================
// Export texte (mode sans affichage)
// ============================================================================
// Dessine le graphique dans un buffer ratatui hors écran (TestBackend)
// puis l'écrit dans un fichier .txt nommé d'après le titre.
// Utile en CI ou via SSH, là où aucun terminal interactif n'est disponible.
// ============================================================================

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ratatui::{backend::TestBackend, buffer::Buffer, Terminal};
use tracing::info;

use crate::plot::ChartSpec;
use crate::ui::{chart::render_chart, Presenter};

/// Taille par défaut du rendu (colonnes x lignes)
pub const DEFAULT_SIZE: (u16, u16) = (120, 32);

/// Presenter qui écrit chaque graphique dans un fichier texte
#[derive(Debug)]
pub struct TextExporter {
    dir: PathBuf,
    width: u16,
    height: u16,
    written: Vec<PathBuf>,
}

impl TextExporter {
    /// Crée l'exporteur (et le répertoire s'il n'existe pas)
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Échec de la création du répertoire {}", dir.display()))?;
        Ok(Self {
            dir,
            width: DEFAULT_SIZE.0,
            height: DEFAULT_SIZE.1,
            written: Vec::new(),
        })
    }

    pub fn with_size(mut self, width: u16, height: u16) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Fichiers écrits jusqu'ici
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl Presenter for TextExporter {
    fn present(&mut self, spec: &ChartSpec) -> Result<()> {
        let text = render_to_text(spec, self.width, self.height)?;
        let path = self.dir.join(format!("{}.txt", slugify(&spec.title)));

        fs::write(&path, text)
            .with_context(|| format!("Échec de l'écriture de {}", path.display()))?;
        info!(path = %path.display(), points = spec.points.len(), "Chart exported");

        self.written.push(path);
        Ok(())
    }
}

/// Rend un graphique hors écran et retourne le texte affiché
pub fn render_to_text(spec: &ChartSpec, width: u16, height: u16) -> Result<String> {
    let mut terminal = Terminal::new(TestBackend::new(width, height))?;
    terminal.draw(|frame| {
        let area = frame.size();
        render_chart(frame, spec, area);
    })?;
    Ok(buffer_to_text(terminal.backend().buffer()))
}

/// Convertit un buffer ratatui en lignes de texte (espaces de fin retirés)
pub fn buffer_to_text(buffer: &Buffer) -> String {
    let area = buffer.area;
    let mut text = String::new();
    for y in area.top()..area.bottom() {
        let line: String = (area.left()..area.right())
            .map(|x| buffer.get(x, y).symbol())
            .collect();
        text.push_str(line.trim_end());
        text.push('\n');
    }
    text
}

/// Nom de fichier à partir d'un titre
///
/// "High Values, Google Stock, 15 Minute Data" -> "high_values_google_stock_15_minute_data"
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('_') && !slug.is_empty() {
            slug.push('_');
        }
    }
    let slug = slug.trim_end_matches('_').to_string();
    if slug.is_empty() {
        "chart".to_string()
    } else {
        slug
    }
}

// ============================================================================
// Tests
// ============================================================================
