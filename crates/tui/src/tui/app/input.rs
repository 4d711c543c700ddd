use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::core::{Field, FormState};

use super::{App, ConfirmChoice, InputMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CardsAction {
    Quit,
    BackToForm,
    Edit,
    Delete,
    Refresh,
    ShowHelp,
    SelectNext,
    SelectPrev,
    SelectFirst,
    SelectLast,
}

impl CardsAction {
    fn from_event(key: &KeyEvent) -> Option<Self> {
        match key.code {
            KeyCode::Char('q') => Some(Self::Quit),
            KeyCode::Esc | KeyCode::Tab | KeyCode::BackTab | KeyCode::Char('i') => {
                Some(Self::BackToForm)
            }
            KeyCode::Char('e') | KeyCode::Enter => Some(Self::Edit),
            KeyCode::Char('x') | KeyCode::Delete => Some(Self::Delete),
            KeyCode::Char('r') | KeyCode::F(5) => Some(Self::Refresh),
            KeyCode::Char('?') | KeyCode::Char('h') | KeyCode::F(1) => Some(Self::ShowHelp),
            KeyCode::Char('j') | KeyCode::Down => Some(Self::SelectNext),
            KeyCode::Char('k') | KeyCode::Up => Some(Self::SelectPrev),
            KeyCode::Home => Some(Self::SelectFirst),
            KeyCode::End => Some(Self::SelectLast),
            _ => None,
        }
    }
}

fn is_quit_chord(key: &KeyEvent) -> bool {
    matches!(key.code, KeyCode::Char('c')) && key.modifiers.contains(KeyModifiers::CONTROL)
}

impl App {
    pub(crate) fn on_key(&mut self, key: KeyEvent) -> Result<()> {
        if is_quit_chord(&key) {
            self.should_quit = true;
            return Ok(());
        }
        // A blocking alert swallows every key until it is acknowledged.
        if self.controller.alert().is_some() {
            return self.handle_alert(key);
        }
        match self.input_mode {
            InputMode::Form => self.handle_form_mode(key),
            InputMode::Cards => self.handle_cards_mode(key),
            InputMode::Help => self.handle_help_mode(key),
            InputMode::ConfirmDelete => self.handle_confirm_delete_mode(key),
        }
    }

    fn handle_alert(&mut self, key: KeyEvent) -> Result<()> {
        if matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
            self.controller.dismiss_alert();
        }
        Ok(())
    }

    fn handle_form_mode(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::F(1) => self.show_help_overlay(),
            KeyCode::F(5) => self.refresh(),
            KeyCode::Enter => self.submit(),
            KeyCode::Esc => {
                if self.controller.state() == FormState::Editing {
                    self.cancel_edit();
                } else {
                    self.input_mode = InputMode::Cards;
                    self.clamp_selection();
                }
            }
            KeyCode::Tab => self.focus_next(),
            KeyCode::BackTab => self.focus_prev(),
            KeyCode::Down => {
                if !self.cycle_suggestion(1) {
                    self.focus_next();
                }
            }
            KeyCode::Up => {
                if !self.cycle_suggestion(-1) {
                    self.focus_prev();
                }
            }
            _ if self.focus == Field::Status => self.handle_status_key(key),
            KeyCode::Char(c) => {
                self.input.insert_char(c);
                self.push_input();
            }
            KeyCode::Backspace => {
                self.input.backspace();
                self.push_input();
            }
            KeyCode::Delete => {
                self.input.delete_char();
                self.push_input();
            }
            KeyCode::Left => self.input.move_left(),
            KeyCode::Right => {
                if !(self.focus == Field::Documento
                    && self.input.at_end()
                    && self.accept_suggestion())
                {
                    self.input.move_right();
                }
            }
            KeyCode::Home => self.input.move_home(),
            KeyCode::End => self.input.move_end(),
            _ => {}
        }
        Ok(())
    }

    fn handle_status_key(&mut self, key: KeyEvent) {
        if matches!(
            key.code,
            KeyCode::Left | KeyCode::Right | KeyCode::Char(' ')
        ) {
            self.toggle_status();
        }
    }

    /// Move through documento suggestions. Returns false when there is no
    /// list to move through.
    fn cycle_suggestion(&mut self, delta: isize) -> bool {
        if self.focus != Field::Documento {
            return false;
        }
        let count = self.controller.documento_suggestions().len();
        if count == 0 {
            return false;
        }
        let next = (self.suggestion_index as isize + delta).rem_euclid(count as isize);
        self.suggestion_index = next as usize;
        true
    }

    fn handle_cards_mode(&mut self, key: KeyEvent) -> Result<()> {
        let Some(action) = CardsAction::from_event(&key) else {
            return Ok(());
        };
        match action {
            CardsAction::Quit => self.should_quit = true,
            CardsAction::BackToForm => {
                self.input_mode = InputMode::Form;
                self.status = None;
            }
            CardsAction::Edit => self.edit_selected(),
            CardsAction::Delete => self.prompt_delete(),
            CardsAction::Refresh => self.refresh(),
            CardsAction::ShowHelp => self.show_help_overlay(),
            CardsAction::SelectNext => self.select_next(),
            CardsAction::SelectPrev => self.select_prev(),
            CardsAction::SelectFirst => {
                self.selected = 0;
                self.clamp_selection();
            }
            CardsAction::SelectLast => {
                self.selected = usize::MAX;
                self.clamp_selection();
            }
        }
        Ok(())
    }

    fn handle_help_mode(&mut self, key: KeyEvent) -> Result<()> {
        if matches!(key.code, KeyCode::Esc | KeyCode::Enter) {
            self.input_mode = InputMode::Form;
            self.status = None;
        }
        Ok(())
    }

    fn handle_confirm_delete_mode(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Esc | KeyCode::Char('n') => {
                self.pending_delete = None;
                self.input_mode = InputMode::Cards;
                self.status = None;
            }
            KeyCode::Left | KeyCode::Right | KeyCode::Tab | KeyCode::Char(' ') => {
                self.confirm_choice = self.confirm_choice.toggle();
            }
            KeyCode::Char('y') => self.perform_delete(),
            KeyCode::Enter => {
                if self.confirm_choice == ConfirmChoice::Yes {
                    self.perform_delete();
                } else {
                    self.pending_delete = None;
                    self.input_mode = InputMode::Cards;
                    self.status = None;
                }
            }
            _ => {}
        }
        Ok(())
    }
}
