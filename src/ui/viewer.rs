// ============================================================================
// Affichage interactif dans le terminal
// ============================================================================
// Affiche un graphique en plein écran et bloque jusqu'à ce que
// l'utilisateur le ferme (q, Échap ou Entrée).
//
// CONCEPT RUST : Terminal raw mode
// - Raw mode : on reçoit tous les caractères directement
// - Alternate screen : écran secondaire (ne pollue pas l'historique)
// - Le terminal est restauré même si le rendu échoue
// ============================================================================

use std::io;

use anyhow::Result;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame, Terminal,
};
use tracing::{debug, info};

use crate::plot::ChartSpec;
use crate::ui::chart::render_chart;
use crate::ui::events::{is_dismiss_event, EventHandler};
use crate::ui::Presenter;

/// Presenter interactif (bloquant)
#[derive(Debug, Default)]
pub struct TerminalPresenter {
    events: EventHandler,
}

impl TerminalPresenter {
    pub fn new() -> Self {
        Self {
            events: EventHandler::new(),
        }
    }

    /// Boucle de rendu : dessine, attend un événement, recommence
    fn run(
        &self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
        spec: &ChartSpec,
    ) -> Result<()> {
        loop {
            terminal.draw(|frame| draw_view(frame, spec))?;

            let event = self.events.next()?;
            if is_dismiss_event(&event) {
                debug!("Chart dismissed");
                return Ok(());
            }
        }
    }
}

impl Presenter for TerminalPresenter {
    fn present(&mut self, spec: &ChartSpec) -> Result<()> {
        info!(title = %spec.title, points = spec.points.len(), "Showing chart");

        let mut terminal = setup_terminal()?;
        let result = self.run(&mut terminal, spec);

        // Restaure le terminal (même en cas d'erreur)
        restore_terminal(&mut terminal)?;
        result
    }
}

/// Graphique + ligne d'aide en bas
fn draw_view(frame: &mut Frame, spec: &ChartSpec) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(frame.size());

    render_chart(frame, spec, chunks[0]);

    let key_style = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD);
    let help = Paragraph::new(Line::from(vec![
        Span::styled("[q]", key_style),
        Span::raw(" / "),
        Span::styled("[Esc]", key_style),
        Span::raw(" Fermer"),
    ]));
    frame.render_widget(help, chunks[1]);
}

/// Configure le terminal en mode TUI
fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(|e| e.into())
}

/// Restaure le terminal à son état normal
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use ratatui::backend::TestBackend;

    use super::*;
    use crate::plot::{AxisSpec, LineStyle};

    #[test]
    fn test_draw_view_has_help_line() {
        let spec = ChartSpec {
            title: "Daily Microsoft Stock Prices, Opening Price".to_string(),
            series_name: "open".to_string(),
            points: vec![(0.0, 90.0), (1.0, 94.0)],
            x_axis: AxisSpec {
                title: "date".to_string(),
                bounds: [0.0, 1.0],
                labels: vec!["2018-03-26".to_string(), "2018-03-27".to_string()],
            },
            y_axis: AxisSpec {
                title: "open".to_string(),
                bounds: [85.0, 99.0],
                labels: vec!["85.00".to_string(), "99.00".to_string()],
            },
            line: LineStyle::default(),
        };

        let mut terminal = Terminal::new(TestBackend::new(80, 20)).unwrap();
        terminal.draw(|frame| draw_view(frame, &spec)).unwrap();

        let text = crate::ui::export::buffer_to_text(terminal.backend().buffer());
        let last_line = text.lines().last().unwrap();
        assert!(last_line.contains("[Esc] Fermer"));
        assert!(text.contains("Daily Microsoft Stock Prices"));
    }
}
