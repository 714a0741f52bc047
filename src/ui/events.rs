// ============================================================================
// Gestion des événements
// ============================================================================
// Gère les événements clavier et les ticks de l'application
//
// CONCEPTS RUST :
// 1. Enums avec variants : représenter différents types d'événements
// 2. Pattern matching : identifier les touches avec matches!
// 3. Error handling avec Result
// ============================================================================

use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event as CrosstermEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Événements de l'application
#[derive(Debug, Clone)]
pub enum Event {
    /// Touche pressée
    Key(KeyEvent),

    /// Tick régulier (rafraîchissement de l'affichage)
    Tick,
}

/// Gestionnaire d'événements
pub struct EventHandler {
    tick_rate: Duration,
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
    /// CONCEPT : Non-blocking I/O avec timeout
    /// - poll(timeout) attend max tick_rate
    /// - Si pas d'événement, retourne Ok(Event::Tick)
    /// - Le tick permet d'afficher les sessions reçues du worker même sans
    ///   action de l'utilisateur
    pub fn next(&self) -> Result<Event> {
        if event::poll(self.tick_rate)? {
            match event::read()? {
                // Sur certains OS, on reçoit Press ET Release : on ne garde que Press
                CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => Ok(Event::Key(key)),
                _ => Ok(Event::Tick),
            }
        } else {
            Ok(Event::Tick)
        }
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Helpers : Convertir KeyEvent en action
// ============================================================================

/// Vrai si l'événement est une touche dont le code satisfait `predicate`
fn key_matches(event: &Event, predicate: impl Fn(KeyCode) -> bool) -> bool {
    if let Event::Key(key) = event {
        predicate(key.code)
    } else {
        false
    }
}

/// 'q' : quitter (two-step)
pub fn is_quit_event(event: &Event) -> bool {
    key_matches(event, |code| matches!(code, KeyCode::Char('q') | KeyCode::Char('Q')))
}

/// 'c' : se connecter au wallet
pub fn is_connect_event(event: &Event) -> bool {
    key_matches(event, |code| matches!(code, KeyCode::Char('c') | KeyCode::Char('C')))
}

/// 's' : ouvrir le formulaire d'inscription
pub fn is_sign_up_event(event: &Event) -> bool {
    key_matches(event, |code| matches!(code, KeyCode::Char('s') | KeyCode::Char('S')))
}

/// 'd' : se déconnecter
pub fn is_disconnect_event(event: &Event) -> bool {
    key_matches(event, |code| matches!(code, KeyCode::Char('d') | KeyCode::Char('D')))
}

/// 't' : envoyer la transaction fixe
pub fn is_send_event(event: &Event) -> bool {
    key_matches(event, |code| matches!(code, KeyCode::Char('t') | KeyCode::Char('T')))
}

/// Échap
pub fn is_escape_event(event: &Event) -> bool {
    key_matches(event, |code| matches!(code, KeyCode::Esc))
}

/// Entrée
pub fn is_enter_event(event: &Event) -> bool {
    key_matches(event, |code| matches!(code, KeyCode::Enter))
}

/// Backspace
pub fn is_backspace_event(event: &Event) -> bool {
    key_matches(event, |code| matches!(code, KeyCode::Backspace))
}

/// Tab ou flèche bas : champ suivant
pub fn is_next_field_event(event: &Event) -> bool {
    key_matches(event, |code| matches!(code, KeyCode::Tab | KeyCode::Down))
}

/// Shift+Tab ou flèche haut : champ précédent
pub fn is_previous_field_event(event: &Event) -> bool {
    key_matches(event, |code| matches!(code, KeyCode::BackTab | KeyCode::Up))
}

/// Caractère imprimable sans Ctrl/Alt (saisie dans le formulaire)
pub fn is_text_char_event(event: &Event) -> bool {
    if let Event::Key(key) = event {
        !key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
            && matches!(key.code, KeyCode::Char(c) if !c.is_control())
    } else {
        false
    }
}

/// Extrait le caractère d'un événement clavier si c'est un caractère
pub fn get_char_from_event(event: &Event) -> Option<char> {
    match event {
        Event::Key(KeyEvent { code: KeyCode::Char(c), .. }) => Some(*c),
        _ => None,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::empty()))
    }

    #[test]
    fn test_is_quit_event() {
        assert!(is_quit_event(&key(KeyCode::Char('q'))));
        assert!(!is_quit_event(&key(KeyCode::Char('a'))));
        assert!(!is_quit_event(&Event::Tick));
    }

    #[test]
    fn test_action_keys() {
        assert!(is_connect_event(&key(KeyCode::Char('c'))));
        assert!(is_sign_up_event(&key(KeyCode::Char('S'))));
        assert!(is_disconnect_event(&key(KeyCode::Char('d'))));
        assert!(is_send_event(&key(KeyCode::Char('t'))));
        assert!(is_next_field_event(&key(KeyCode::Tab)));
        assert!(is_previous_field_event(&key(KeyCode::BackTab)));
    }

    #[test]
    fn test_text_input() {
        assert!(is_text_char_event(&key(KeyCode::Char('@'))));
        assert_eq!(get_char_from_event(&key(KeyCode::Char('x'))), Some('x'));

        let ctrl_c = Event::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(!is_text_char_event(&ctrl_c));
        assert!(!is_text_char_event(&key(KeyCode::Enter)));
        assert_eq!(get_char_from_event(&Event::Tick), None);
    }
}
