use std::time::Instant;

use ratatui::style::{Color, Style};
use ratatui::widgets::ListState;

use super::buffer::TextBuffer;
use super::constants::*;
use super::dispatch::Dispatcher;
use crate::config::AppConfig;
use crate::core::{
    Completion, Field, FieldAccess, FieldInput, FormController, FormState, Outcome, Request, Step,
};
use crate::model::{RecordId, TaskStatus};

mod input;
mod render;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputMode {
    /// Typing into the focused form field.
    Form,
    /// Moving between cards.
    Cards,
    Help,
    ConfirmDelete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfirmChoice {
    Yes,
    No,
}

impl ConfirmChoice {
    fn toggle(self) -> Self {
        match self {
            ConfirmChoice::Yes => ConfirmChoice::No,
            ConfirmChoice::No => ConfirmChoice::Yes,
        }
    }
}

#[derive(Debug, Clone)]
struct StatusMessage {
    text: String,
    kind: StatusKind,
    created_at: Instant,
}

impl StatusMessage {
    fn new<T: Into<String>>(text: T, kind: StatusKind) -> Self {
        Self {
            text: text.into(),
            kind,
            created_at: Instant::now(),
        }
    }

    fn style(&self) -> Style {
        match self.kind {
            StatusKind::Info => Style::default().fg(Color::Cyan),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum StatusKind {
    Info,
    Error,
}

pub(crate) struct App {
    config: AppConfig,
    offline: bool,
    controller: FormController,
    dispatcher: Dispatcher,
    focus: Field,
    input: TextBuffer,
    input_mode: InputMode,
    suggestion_index: usize,
    selected: usize,
    list_state: ListState,
    confirm_choice: ConfirmChoice,
    pending_delete: Option<RecordId>,
    announce_sync: bool,
    status: Option<StatusMessage>,
    should_quit: bool,
}

impl App {
    pub(crate) fn new(config: AppConfig, offline: bool, dispatcher: Dispatcher) -> Self {
        let mut app = Self {
            config,
            offline,
            controller: FormController::new(),
            dispatcher,
            focus: Field::Documento,
            input: TextBuffer::new(),
            input_mode: InputMode::Form,
            suggestion_index: 0,
            selected: 0,
            list_state: ListState::default(),
            confirm_choice: ConfirmChoice::No,
            pending_delete: None,
            announce_sync: false,
            status: None,
            should_quit: false,
        };
        for request in app.controller.start() {
            app.dispatcher.dispatch(request);
        }
        app
    }

    pub(crate) fn on_tick(&mut self) {
        for completion in self.dispatcher.drain() {
            self.apply(completion);
        }
        self.controller.tick(Instant::now());
        if let Some(status) = &self.status {
            if status.created_at.elapsed() > STATUS_TTL {
                self.status = None;
            }
        }
    }

    pub(crate) fn should_quit(&self) -> bool {
        self.should_quit
    }

    fn apply(&mut self, completion: Completion) {
        let step = self.controller.apply(completion);
        self.handle_step(step);
    }

    /// Report a step's outcome and send its follow-up request, if any.
    fn handle_step(&mut self, step: Step) {
        if let Some(request) = step.request {
            self.announce_request(&request);
            self.dispatcher.dispatch(request);
        }
        self.report(step.outcome);
        if self.controller.field_access(self.focus) == FieldAccess::Disabled {
            self.focus_resting_field();
        }
        self.sync_input();
        self.clamp_selection();
    }

    fn announce_request(&mut self, request: &Request) {
        match request {
            Request::LookupUser { .. } => self.set_status_info(STATUS_LOOKUP),
            Request::CreateTask { .. } | Request::UpdateTask { .. } => {
                self.set_status_info(STATUS_SAVING)
            }
            Request::DeleteTask { .. } => self.set_status_info(STATUS_DELETING),
            Request::LoadTasks(_) | Request::WarmUsers(_) => {}
        }
    }

    fn report(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Pending | Outcome::Stale | Outcome::Noop | Outcome::UsersCached { .. } => {}
            Outcome::Loaded { count } => {
                if std::mem::take(&mut self.announce_sync) {
                    self.set_status_info(format!("{STATUS_REFRESHED} ({count})"));
                }
            }
            Outcome::UserResolved(user) => {
                self.set_status_info(format!("Usuario encontrado: {}", user.nombre_completo));
                self.focus_field(Field::Title);
            }
            Outcome::UserNotFound => {
                let message = self
                    .controller
                    .errors()
                    .get(Field::Documento)
                    .map(str::to_string);
                if let Some(message) = message {
                    self.set_status_error(message);
                }
                self.focus_field(Field::Documento);
            }
            Outcome::Created(task) => {
                self.set_status_info(format!("Tarea creada: {}", task.title));
                self.selected = 0;
                if self.input_mode == InputMode::Form
                    && self.controller.state() == FormState::UserResolved
                {
                    self.focus_field(Field::Title);
                }
            }
            Outcome::Updated(task) => {
                self.set_status_info(format!("Tarea actualizada: {}", task.title));
                self.select_card(&task.id);
                if self.controller.state() != FormState::Editing {
                    self.focus_resting_field();
                }
            }
            Outcome::Unchanged => self.set_status_info(STATUS_UNCHANGED),
            Outcome::Deleted(_) => self.set_status_info("Tarea eliminada"),
            Outcome::EditStarted(id) => {
                self.set_status_info(STATUS_ENTER_EDIT);
                self.select_card(&id);
                self.input_mode = InputMode::Form;
                self.focus_field(Field::Title);
            }
            Outcome::EditCancelled => self.set_status_info(STATUS_EDIT_CANCELLED),
            Outcome::Rejected(errors) => {
                self.set_status_error(STATUS_FIX_FIELDS);
                if let Some((field, _)) = errors.iter().next() {
                    self.focus_field(field);
                }
            }
            Outcome::UnknownTask(id) => {
                self.set_status_error(format!("La tarea {id} ya no existe"));
            }
            Outcome::Failed(err) => self.set_status_error(err.to_string()),
        }
    }

    /// Pull the controller's value for the focused field into the edit
    /// buffer when they differ (sanitizing, prefill, reset).
    fn sync_input(&mut self) {
        let value = self.controller.fields().get(self.focus);
        if value != self.input.as_str() {
            let value = value.to_string();
            self.input.replace(value);
        }
    }

    fn focus_field(&mut self, field: Field) {
        self.focus = field;
        self.suggestion_index = 0;
        self.input.set(self.controller.fields().get(field));
    }

    fn focus_next(&mut self) {
        self.focus_field(self.focus.next());
    }

    fn focus_prev(&mut self) {
        self.focus_field(self.focus.prev());
    }

    fn push_input(&mut self) {
        match self.controller.input(self.focus, self.input.as_str()) {
            FieldInput::Accepted => {}
            FieldInput::Disabled => self.set_status_info(STATUS_DISABLED),
            FieldInput::Locked => self.set_status_info(STATUS_LOCKED),
        }
        self.suggestion_index = 0;
        self.sync_input();
    }

    fn toggle_status(&mut self) {
        let current = self
            .controller
            .fields()
            .status
            .parse::<TaskStatus>()
            .unwrap_or_default();
        self.input.set(current.toggle().as_str());
        self.push_input();
    }

    fn accept_suggestion(&mut self) -> bool {
        let Some(user) = self
            .controller
            .documento_suggestions()
            .get(self.suggestion_index)
            .map(|user| user.documento.clone())
        else {
            return false;
        };
        self.input.set(user);
        self.push_input();
        true
    }

    fn submit(&mut self) {
        let step = self.controller.submit();
        self.handle_step(step);
    }

    fn cancel_edit(&mut self) {
        let outcome = self.controller.cancel_edit();
        self.handle_step(Step {
            outcome,
            request: None,
        });
        self.focus_resting_field();
    }

    /// Title once a user is resolved, documento otherwise.
    fn focus_resting_field(&mut self) {
        self.focus_field(match self.controller.state() {
            FormState::UserResolved => Field::Title,
            _ => Field::Documento,
        });
    }

    fn refresh(&mut self) {
        self.announce_sync = true;
        self.set_status_info(STATUS_REFRESHING);
        let request = self.controller.refresh();
        self.dispatcher.dispatch(request);
    }

    fn selected_card_id(&self) -> Option<RecordId> {
        self.controller
            .deck()
            .cards()
            .get(self.selected)
            .map(|card| card.task_id().clone())
    }

    fn select_card(&mut self, id: &RecordId) {
        if let Some(idx) = self.controller.deck().position(id) {
            self.selected = idx;
        }
        self.clamp_selection();
    }

    fn select_next(&mut self) {
        let len = self.controller.deck().len();
        if len > 0 {
            self.selected = (self.selected + 1).min(len - 1);
        }
        self.clamp_selection();
    }

    fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
        self.clamp_selection();
    }

    fn clamp_selection(&mut self) {
        let len = self.controller.deck().len();
        if len == 0 {
            self.selected = 0;
            self.list_state.select(None);
        } else {
            self.selected = self.selected.min(len - 1);
            self.list_state.select(Some(self.selected));
        }
    }

    fn edit_selected(&mut self) {
        match self.selected_card_id() {
            Some(id) => {
                let outcome = self.controller.begin_edit(&id);
                self.handle_step(Step {
                    outcome,
                    request: None,
                });
            }
            None => self.set_status_info(STATUS_NO_CARDS),
        }
    }

    fn prompt_delete(&mut self) {
        match self.selected_card_id() {
            Some(id) => {
                self.pending_delete = Some(id);
                self.confirm_choice = ConfirmChoice::No;
                self.input_mode = InputMode::ConfirmDelete;
                self.set_status_info(STATUS_CONFIRM_DELETE);
            }
            None => self.set_status_info(STATUS_NO_CARDS),
        }
    }

    fn perform_delete(&mut self) {
        self.input_mode = InputMode::Cards;
        if let Some(id) = self.pending_delete.take() {
            let step = self.controller.request_delete(&id);
            self.handle_step(step);
        }
    }

    fn show_help_overlay(&mut self) {
        self.input_mode = InputMode::Help;
        self.set_status_info(STATUS_HELP);
    }

    pub(crate) fn set_status_info<T: Into<String>>(&mut self, message: T) {
        let mut text = String::from("ℹ️  ");
        text.push_str(&message.into());
        self.status = Some(StatusMessage::new(text, StatusKind::Info));
    }

    pub(crate) fn set_status_error<T: Into<String>>(&mut self, message: T) {
        let mut text = String::from("⚠️  ");
        text.push_str(&message.into());
        self.status = Some(StatusMessage::new(text, StatusKind::Error));
    }
}
