// ============================================================================
// Chart - Rendu d'un ChartSpec avec ratatui
// ============================================================================
// Traduit la description pure du graphique en widgets ratatui
//
// CONCEPTS RATATUI :
// 1. Chart widget : graphique ligne
// 2. Dataset : série de données à afficher
// 3. Axis : configuration des axes X et Y
// ============================================================================

use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph},
    Frame,
};

use crate::plot::{AxisSpec, ChartSpec};

/// Dessine le graphique dans la zone donnée
///
/// Un graphique sans points affiche un message à la place
pub fn render_chart(frame: &mut Frame, spec: &ChartSpec, area: Rect) {
    if spec.is_empty() {
        render_no_data(frame, area, &spec.title);
        return;
    }

    // CONCEPT RATATUI : Marker types
    // - Braille : résolution fine, la courbe paraît continue
    // - Dot : un point par cellule, utilisé quand on veut des marqueurs
    let marker = if spec.line.markers {
        symbols::Marker::Dot
    } else {
        symbols::Marker::Braille
    };
    let graph_type = if spec.line.connected {
        GraphType::Line
    } else {
        GraphType::Scatter
    };

    let datasets = vec![Dataset::default()
        .name(spec.series_name.as_str())
        .marker(marker)
        .graph_type(graph_type)
        .style(Style::default().fg(Color::Cyan))
        .data(&spec.points)];

    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(format!(" {} ", spec.title)),
        )
        .x_axis(axis(&spec.x_axis))
        .y_axis(axis(&spec.y_axis));

    frame.render_widget(chart, area);
}

/// Convertit un AxisSpec en Axis ratatui
fn axis(spec: &AxisSpec) -> Axis<'_> {
    Axis::default()
        .title(spec.title.as_str())
        .style(Style::default().fg(Color::Gray))
        .bounds(spec.bounds)
        .labels(spec.labels.iter().map(|label| Span::raw(label.as_str())).collect())
}

/// Affiche un message quand il n'y a pas de données à afficher
fn render_no_data(frame: &mut Frame, area: Rect, title: &str) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red))
        .title(format!(" {} ", title));

    let text = vec![
        Line::from(""),
        Line::from(Span::styled(
            "Pas de données à afficher",
            Style::default().fg(Color::Red),
        )),
    ];

    let paragraph = Paragraph::new(text)
        .block(block)
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use ratatui::{backend::TestBackend, Terminal};

    use super::*;
    use crate::plot::LineStyle;

    fn spec(points: Vec<(f64, f64)>) -> ChartSpec {
        ChartSpec {
            title: "High Values".to_string(),
            series_name: "2. high".to_string(),
            points,
            x_axis: AxisSpec {
                title: "date_time".to_string(),
                bounds: [0.0, 2.0],
                labels: vec!["09:45".to_string(), "10:15".to_string()],
            },
            y_axis: AxisSpec {
                title: "2. high".to_string(),
                bounds: [0.0, 10.0],
                labels: vec!["0.00".to_string(), "10.00".to_string()],
            },
            line: LineStyle::default(),
        }
    }

    fn screen(spec: &ChartSpec) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 20)).unwrap();
        terminal
            .draw(|frame| {
                let area = frame.size();
                render_chart(frame, spec, area);
            })
            .unwrap();
        let buffer = terminal.backend().buffer().clone();
        buffer.content().iter().map(|cell| cell.symbol()).collect()
    }

    #[test]
    fn test_render_chart_shows_title_and_labels() {
        let text = screen(&spec(vec![(0.0, 1.0), (1.0, 5.0), (2.0, 9.0)]));
        assert!(text.contains("High Values"));
        assert!(text.contains("09:45"));
        assert!(text.contains("10.00"));
    }

    #[test]
    fn test_render_empty_chart() {
        let text = screen(&spec(Vec::new()));
        assert!(text.contains("Pas de données"));
    }
}
