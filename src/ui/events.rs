// ============================================================================
// Gestion des événements
// ============================================================================
// Lit le clavier pendant qu'un graphique est affiché
//
// CONCEPTS RUST :
// 1. Enums avec variants : représenter différents types d'événements
// 2. Error handling avec Result
// ============================================================================

use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event as CrosstermEvent, KeyCode, KeyEvent, KeyEventKind};

/// Événements de l'affichage
#[derive(Debug, Clone)]
pub enum Event {
    /// Touche pressée
    Key(KeyEvent),

    /// Tick régulier (rafraîchissement, redimensionnement)
    Tick,
}

/// Gestionnaire d'événements
#[derive(Debug)]
pub struct EventHandler {
    tick_rate: Duration,
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl EventHandler {
    /// Crée un gestionnaire avec un tick de 250ms
    pub fn new() -> Self {
        Self {
            tick_rate: Duration::from_millis(250),
        }
    }

    /// Lit le prochain événement (bloquant avec timeout)
    ///
    /// - Si pas d'événement avant le timeout : Ok(Event::Tick)
    /// - Les relâchements de touche sont ignorés (certains OS envoient
    ///   Press puis Release)
    pub fn next(&self) -> Result<Event> {
        if event::poll(self.tick_rate)? {
            match event::read()? {
                CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => Ok(Event::Key(key)),
                _ => Ok(Event::Tick),
            }
        } else {
            Ok(Event::Tick)
        }
    }
}

/// Vérifie si l'événement est la touche 'q' (quitter)
pub fn is_quit_event(event: &Event) -> bool {
    if let Event::Key(key) = event {
        matches!(key.code, KeyCode::Char('q') | KeyCode::Char('Q'))
    } else {
        false
    }
}

/// Vérifie si l'événement est Échap
pub fn is_escape_event(event: &Event) -> bool {
    if let Event::Key(key) = event {
        matches!(key.code, KeyCode::Esc)
    } else {
        false
    }
}

/// Vérifie si l'événement est Entrée
pub fn is_enter_event(event: &Event) -> bool {
    if let Event::Key(key) = event {
        matches!(key.code, KeyCode::Enter)
    } else {
        false
    }
}

/// Fermeture du graphique : q, Échap ou Entrée
pub fn is_dismiss_event(event: &Event) -> bool {
    is_quit_event(event) || is_escape_event(event) || is_enter_event(event)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, event::KeyModifiers::empty()))
    }

    #[test]
    fn test_is_quit_event() {
        assert!(is_quit_event(&key(KeyCode::Char('q'))));
        assert!(!is_quit_event(&key(KeyCode::Char('a'))));
        assert!(!is_quit_event(&Event::Tick));
    }

    #[test]
    fn test_is_dismiss_event() {
        assert!(is_dismiss_event(&key(KeyCode::Esc)));
        assert!(is_dismiss_event(&key(KeyCode::Enter)));
        assert!(is_dismiss_event(&key(KeyCode::Char('Q'))));
        assert!(!is_dismiss_event(&key(KeyCode::Char(' '))));
        assert!(!is_dismiss_event(&Event::Tick));
    }
}
