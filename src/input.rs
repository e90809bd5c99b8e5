use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind};

use crate::game::Command;
use crate::grid::Dir;
use crate::player::Player;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Command(Command),
    Quit,
}

/// `w/a/s/d` steer green, the arrow keys steer blue.
pub fn action_for_key(code: KeyCode) -> Option<Action> {
    let mv = |player, dir| Some(Action::Command(Command::Move(player, dir)));
    match code {
        KeyCode::Char('q') | KeyCode::Esc => Some(Action::Quit),
        KeyCode::Char('w') => mv(Player::One, Dir::Up),
        KeyCode::Char('s') => mv(Player::One, Dir::Down),
        KeyCode::Char('a') => mv(Player::One, Dir::Left),
        KeyCode::Char('d') => mv(Player::One, Dir::Right),
        KeyCode::Up => mv(Player::Two, Dir::Up),
        KeyCode::Down => mv(Player::Two, Dir::Down),
        KeyCode::Left => mv(Player::Two, Dir::Left),
        KeyCode::Right => mv(Player::Two, Dir::Right),
        _ => None,
    }
}

/// Key presses (and auto-repeats) become actions; everything else is dropped.
pub fn action_for_event(event: &Event) -> Option<Action> {
    match event {
        Event::Key(KeyEvent {
            code,
            kind: KeyEventKind::Press | KeyEventKind::Repeat,
            ..
        }) => action_for_key(*code),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEventState, KeyModifiers};

    fn key(code: KeyCode, kind: KeyEventKind) -> Event {
        Event::Key(KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind,
            state: KeyEventState::NONE,
        })
    }

    #[test]
    fn letters_steer_green_and_arrows_steer_blue() {
        assert_eq!(
            action_for_key(KeyCode::Char('d')),
            Some(Action::Command(Command::Move(Player::One, Dir::Right)))
        );
        assert_eq!(
            action_for_key(KeyCode::Char('w')),
            Some(Action::Command(Command::Move(Player::One, Dir::Up)))
        );
        assert_eq!(
            action_for_key(KeyCode::Left),
            Some(Action::Command(Command::Move(Player::Two, Dir::Left)))
        );
        assert_eq!(
            action_for_key(KeyCode::Down),
            Some(Action::Command(Command::Move(Player::Two, Dir::Down)))
        );
        assert_eq!(action_for_key(KeyCode::Char('x')), None);
    }

    #[test]
    fn quit_keys() {
        assert_eq!(action_for_key(KeyCode::Char('q')), Some(Action::Quit));
        assert_eq!(action_for_key(KeyCode::Esc), Some(Action::Quit));
    }

    #[test]
    fn releases_are_ignored() {
        let press = key(KeyCode::Char('a'), KeyEventKind::Press);
        let repeat = key(KeyCode::Char('a'), KeyEventKind::Repeat);
        let release = key(KeyCode::Char('a'), KeyEventKind::Release);
        assert!(action_for_event(&press).is_some());
        assert!(action_for_event(&repeat).is_some());
        assert_eq!(action_for_event(&release), None);
        assert_eq!(action_for_event(&Event::FocusGained), None);
    }
}
