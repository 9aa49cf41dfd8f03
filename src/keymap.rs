use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::session::Action;

/// What the key table is currently routing to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyMode {
    /// Loading and the rules screen.
    Consent,
    Session,
    Dialog,
    Overview,
    /// Terminal screens: load failure, submitted, result view.
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Session(Action),
    ToggleOverview,
    OpenImage,
    BeginJump,
    ScrollUp,
    ScrollDown,
    Quit,
}

pub fn command_for(key: KeyEvent, mode: KeyMode) -> Option<Command> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(Command::Quit);
    }

    match mode {
        KeyMode::Consent => match key.code {
            KeyCode::Enter | KeyCode::Char('y') => Some(Command::Session(Action::Start)),
            KeyCode::Esc | KeyCode::Char('q') => Some(Command::Quit),
            _ => None,
        },
        KeyMode::Dialog => match key.code {
            KeyCode::Enter | KeyCode::Char('y') => Some(Command::Session(Action::Confirm)),
            KeyCode::Esc | KeyCode::Char('n') => Some(Command::Session(Action::Dismiss)),
            _ => None,
        },
        KeyMode::Overview => match key.code {
            KeyCode::Esc | KeyCode::Char('v') => Some(Command::ToggleOverview),
            _ => None,
        },
        KeyMode::Finished => match key.code {
            KeyCode::Up | KeyCode::Char('k') => Some(Command::ScrollUp),
            KeyCode::Down | KeyCode::Char('j') => Some(Command::ScrollDown),
            KeyCode::Enter | KeyCode::Esc | KeyCode::Char('q') => Some(Command::Quit),
            _ => None,
        },
        KeyMode::Session => session_key(key.code),
    }
}

fn session_key(code: KeyCode) -> Option<Command> {
    let action = match code {
        KeyCode::Char(c @ '1'..='9') => Action::SelectOption(c as usize - '1' as usize),
        KeyCode::Char(c @ ('a'..='d' | 'A'..='D')) => {
            Action::SelectOption(c.to_ascii_lowercase() as usize - 'a' as usize)
        }
        KeyCode::Left => Action::PreviousQuestion,
        KeyCode::Right => Action::NextQuestion,
        KeyCode::Enter => Action::SaveAndNext,
        KeyCode::Char(' ' | 'm') => Action::ToggleReview,
        KeyCode::Char('n') => Action::RequestNextSection,
        KeyCode::Char('s') => Action::RequestSubmit,
        KeyCode::Char('g') => return Some(Command::BeginJump),
        KeyCode::Char('v') => return Some(Command::ToggleOverview),
        KeyCode::Char('o') => return Some(Command::OpenImage),
        _ => return None,
    };
    Some(Command::Session(action))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpOutcome {
    Pending,
    Cancelled,
    /// Zero-based question index within the section.
    Jump(usize),
}

/// Collects a one-based question number typed after `g`.
#[derive(Debug, Clone, Default)]
pub struct JumpPrompt {
    buffer: String,
}

impl JumpPrompt {
    pub fn input(&self) -> &str {
        &self.buffer
    }

    pub fn handle(&mut self, key: KeyEvent) -> JumpOutcome {
        match key.code {
            KeyCode::Char(c) if c.is_ascii_digit() && self.buffer.len() < 4 => {
                self.buffer.push(c);
                JumpOutcome::Pending
            }
            KeyCode::Backspace => {
                self.buffer.pop();
                JumpOutcome::Pending
            }
            KeyCode::Enter => self
                .buffer
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .map_or(JumpOutcome::Cancelled, JumpOutcome::Jump),
            KeyCode::Esc => JumpOutcome::Cancelled,
            _ => JumpOutcome::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn option_hotkeys_are_zero_based() {
        assert_eq!(
            command_for(key(KeyCode::Char('1')), KeyMode::Session),
            Some(Command::Session(Action::SelectOption(0)))
        );
        assert_eq!(
            command_for(key(KeyCode::Char('C')), KeyMode::Session),
            Some(Command::Session(Action::SelectOption(2)))
        );
        assert_eq!(command_for(key(KeyCode::Char('e')), KeyMode::Session), None);
    }

    #[test]
    fn navigation_keys() {
        let cases = [
            (KeyCode::Left, Action::PreviousQuestion),
            (KeyCode::Right, Action::NextQuestion),
            (KeyCode::Enter, Action::SaveAndNext),
            (KeyCode::Char(' '), Action::ToggleReview),
            (KeyCode::Char('n'), Action::RequestNextSection),
            (KeyCode::Char('s'), Action::RequestSubmit),
        ];
        for (code, action) in cases {
            assert_eq!(
                command_for(key(code), KeyMode::Session),
                Some(Command::Session(action))
            );
        }
    }

    #[test]
    fn dialog_mode_only_confirms_or_dismisses() {
        assert_eq!(
            command_for(key(KeyCode::Enter), KeyMode::Dialog),
            Some(Command::Session(Action::Confirm))
        );
        assert_eq!(
            command_for(key(KeyCode::Char('n')), KeyMode::Dialog),
            Some(Command::Session(Action::Dismiss))
        );
        assert_eq!(command_for(key(KeyCode::Char('1')), KeyMode::Dialog), None);
    }

    #[test]
    fn ctrl_c_quits_everywhere() {
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        for mode in [KeyMode::Consent, KeyMode::Session, KeyMode::Dialog, KeyMode::Finished] {
            assert_eq!(command_for(ctrl_c, mode), Some(Command::Quit));
        }
    }

    #[test]
    fn jump_prompt_parses_one_based_numbers() {
        let mut prompt = JumpPrompt::default();
        assert_eq!(prompt.handle(key(KeyCode::Char('1'))), JumpOutcome::Pending);
        assert_eq!(prompt.handle(key(KeyCode::Char('2'))), JumpOutcome::Pending);
        assert_eq!(prompt.input(), "12");
        assert_eq!(prompt.handle(key(KeyCode::Enter)), JumpOutcome::Jump(11));
    }

    #[test]
    fn jump_prompt_cancels_on_empty_or_zero() {
        let mut prompt = JumpPrompt::default();
        assert_eq!(prompt.handle(key(KeyCode::Enter)), JumpOutcome::Cancelled);

        let mut zero = JumpPrompt::default();
        zero.handle(key(KeyCode::Char('0')));
        assert_eq!(zero.handle(key(KeyCode::Enter)), JumpOutcome::Cancelled);

        let mut esc = JumpPrompt::default();
        esc.handle(key(KeyCode::Char('3')));
        esc.handle(key(KeyCode::Backspace));
        assert_eq!(esc.input(), "");
        assert_eq!(esc.handle(key(KeyCode::Esc)), JumpOutcome::Cancelled);
    }
}
