//! The task form controller.
//!
//! The controller owns the whole session: the resolved user, the edit target,
//! the raw form fields with their error slots, the authoritative task list and
//! the card deck projected from it. It never performs I/O itself. Commands
//! return a [`Step`] that may carry a [`Request`]; whoever runs the request
//! feeds the resulting [`Completion`] back through [`FormController::apply`].
//!
//! Every request is stamped with a [`Ticket`]. A completion whose ticket has
//! been superseded is stale: stale lookups and listings are dropped, stale
//! mutations still land in the task list but leave the form alone.

use std::time::Instant;

use chrono::Local;

use crate::cards::CardDeck;
use crate::error::ApiError;
use crate::lookup::UserLookup;
use crate::model::{display_timestamp, NewTask, RecordId, Task, TaskContent, TaskPatch, User};
use crate::validation::{
    check_documento, sanitize_documento, validate_form, Field, FieldErrors, FormFields, Rules,
    MSG_USER_NOT_REGISTERED,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Lookup,
    /// Start-up registry fetch for suggestions. Documento edits leave it alone.
    Warm,
    Submit,
    Sync,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    operation: Operation,
    seq: u64,
}

impl Ticket {
    pub fn operation(&self) -> Operation {
        self.operation
    }
}

/// Monotonic per-operation counters used to recognise stale responses.
#[derive(Debug, Clone, Default)]
pub struct RequestSequencer {
    lookup: u64,
    warm: u64,
    submit: u64,
    sync: u64,
}

impl RequestSequencer {
    fn counter(&mut self, operation: Operation) -> &mut u64 {
        match operation {
            Operation::Lookup => &mut self.lookup,
            Operation::Warm => &mut self.warm,
            Operation::Submit => &mut self.submit,
            Operation::Sync => &mut self.sync,
        }
    }

    pub fn issue(&mut self, operation: Operation) -> Ticket {
        let counter = self.counter(operation);
        *counter = counter.wrapping_add(1);
        Ticket {
            operation,
            seq: *counter,
        }
    }

    /// Make every outstanding ticket of `operation` stale.
    pub fn invalidate(&mut self, operation: Operation) {
        let counter = self.counter(operation);
        *counter = counter.wrapping_add(1);
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        let current = match ticket.operation {
            Operation::Lookup => self.lookup,
            Operation::Warm => self.warm,
            Operation::Submit => self.submit,
            Operation::Sync => self.sync,
        };
        current == ticket.seq
    }
}

/// Session state that lives for one run of the form.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub current_user: Option<User>,
    pub editing_task_id: Option<RecordId>,
    pub users: UserLookup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormState {
    /// No user resolved and nothing being edited.
    Idle,
    /// A user is resolved; submits create tasks for them.
    UserResolved,
    /// An existing task is loaded into the form.
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldAccess {
    Editable,
    /// Identity fields while editing.
    Locked,
    /// Task content before a user is resolved.
    Disabled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldInput {
    Accepted,
    Locked,
    Disabled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    LoadTasks(Ticket),
    WarmUsers(Ticket),
    LookupUser {
        ticket: Ticket,
        documento: String,
    },
    CreateTask {
        ticket: Ticket,
        task: NewTask,
    },
    UpdateTask {
        ticket: Ticket,
        id: RecordId,
        patch: TaskPatch,
    },
    DeleteTask {
        id: RecordId,
    },
}

#[derive(Debug, Clone)]
pub enum Completion {
    TasksLoaded {
        ticket: Ticket,
        result: Result<Vec<Task>, ApiError>,
    },
    UsersWarmed {
        ticket: Ticket,
        result: Result<Vec<User>, ApiError>,
    },
    UserLookedUp {
        ticket: Ticket,
        documento: String,
        result: Result<Vec<User>, ApiError>,
    },
    TaskCreated {
        ticket: Ticket,
        result: Result<Task, ApiError>,
    },
    TaskUpdated {
        ticket: Ticket,
        id: RecordId,
        result: Result<Task, ApiError>,
    },
    TaskDeleted {
        id: RecordId,
        result: Result<bool, ApiError>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A request is in flight.
    Pending,
    Loaded { count: usize },
    UsersCached { count: usize },
    UserResolved(User),
    UserNotFound,
    Created(Task),
    Updated(Task),
    /// Edit submitted without any change; nothing was sent.
    Unchanged,
    Deleted(RecordId),
    EditStarted(RecordId),
    EditCancelled,
    Rejected(FieldErrors),
    UnknownTask(RecordId),
    Stale,
    Failed(ApiError),
    Noop,
}

/// Result of a controller command: what happened plus the request to run
/// next, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub outcome: Outcome,
    pub request: Option<Request>,
}

impl Step {
    fn done(outcome: Outcome) -> Self {
        Self {
            outcome,
            request: None,
        }
    }

    pub fn requesting(request: Request) -> Self {
        Self {
            outcome: Outcome::Pending,
            request: Some(request),
        }
    }

    fn then(outcome: Outcome, request: Request) -> Self {
        Self {
            outcome,
            request: Some(request),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FormController {
    session: SessionState,
    fields: FormFields,
    errors: FieldErrors,
    tasks: Vec<Task>,
    deck: CardDeck,
    sequencer: RequestSequencer,
    alert: Option<String>,
}

impl FormController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> FormState {
        if self.session.editing_task_id.is_some() {
            FormState::Editing
        } else if self.session.current_user.is_some() {
            FormState::UserResolved
        } else {
            FormState::Idle
        }
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn current_user(&self) -> Option<&User> {
        self.session.current_user.as_ref()
    }

    pub fn editing_task_id(&self) -> Option<&RecordId> {
        self.session.editing_task_id.as_ref()
    }

    pub fn fields(&self) -> &FormFields {
        &self.fields
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    /// Authoritative task list, newest first.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn task(&self, id: &RecordId) -> Option<&Task> {
        self.tasks.iter().find(|task| &task.id == id)
    }

    pub fn deck(&self) -> &CardDeck {
        &self.deck
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    pub fn alert(&self) -> Option<&str> {
        self.alert.as_deref()
    }

    pub fn dismiss_alert(&mut self) -> Option<String> {
        self.alert.take()
    }

    pub fn field_access(&self, field: Field) -> FieldAccess {
        match self.state() {
            FormState::Editing if field.is_identity() => FieldAccess::Locked,
            FormState::Idle if !field.is_identity() => FieldAccess::Disabled,
            _ => FieldAccess::Editable,
        }
    }

    pub fn task_fields_enabled(&self) -> bool {
        self.field_access(Field::Title) == FieldAccess::Editable
    }

    /// Cached users whose documento starts with what has been typed so far.
    pub fn documento_suggestions(&self) -> Vec<&User> {
        self.session.users.suggest_by_prefix(&self.fields.documento)
    }

    pub fn name_suggestions(&self) -> Vec<&str> {
        self.session.users.names_for_identifier(&self.fields.documento)
    }

    /// Requests to run when the form first opens.
    pub fn start(&mut self) -> Vec<Request> {
        vec![
            Request::WarmUsers(self.sequencer.issue(Operation::Warm)),
            Request::LoadTasks(self.sequencer.issue(Operation::Sync)),
        ]
    }

    pub fn refresh(&mut self) -> Request {
        Request::LoadTasks(self.sequencer.issue(Operation::Sync))
    }

    /// Store a new raw value for `field`, clearing its error slot.
    pub fn input(&mut self, field: Field, value: &str) -> FieldInput {
        match self.field_access(field) {
            FieldAccess::Locked => return FieldInput::Locked,
            FieldAccess::Disabled => return FieldInput::Disabled,
            FieldAccess::Editable => {}
        }

        self.errors.clear(field);
        if field == Field::Documento {
            let cleaned = sanitize_documento(value);
            self.fields.documento = cleaned;
            self.drop_user_if_mismatched();
        } else {
            *self.fields.get_mut(field) = value.to_string();
        }
        FieldInput::Accepted
    }

    fn drop_user_if_mismatched(&mut self) {
        let mismatched = self
            .session
            .current_user
            .as_ref()
            .map(|user| user.documento != self.fields.documento)
            .unwrap_or(false);
        if mismatched {
            if let Some(user) = self.session.current_user.take() {
                tracing::debug!(documento = %user.documento, "documento changed, user released");
                if self.fields.nombre == user.nombre_completo {
                    self.fields.nombre.clear();
                }
            }
            self.sequencer.invalidate(Operation::Submit);
        }
        // Whatever lookup is in flight was for a different value now.
        self.sequencer.invalidate(Operation::Lookup);
    }

    /// Submit the form. In `Idle` this only resolves the user; otherwise it
    /// validates and creates or updates a task.
    pub fn submit(&mut self) -> Step {
        match self.state() {
            FormState::Idle => self.submit_lookup(),
            FormState::UserResolved => self.submit_create(),
            FormState::Editing => self.submit_update(),
        }
    }

    fn submit_lookup(&mut self) -> Step {
        let documento = self.fields.documento.trim().to_string();
        if let Err(message) = check_documento(&documento) {
            self.errors.set(Field::Documento, message);
            return Step::done(Outcome::Rejected(self.errors.clone()));
        }
        self.errors.clear(Field::Documento);
        let ticket = self.sequencer.issue(Operation::Lookup);
        tracing::debug!(%documento, "looking up user");
        Step::requesting(Request::LookupUser { ticket, documento })
    }

    fn submit_create(&mut self) -> Step {
        let rules = Rules::Create {
            current_user: self.session.current_user.as_ref(),
        };
        let content = match validate_form(&self.fields, rules) {
            Ok(content) => content,
            Err(errors) => {
                self.errors = errors.clone();
                return Step::done(Outcome::Rejected(errors));
            }
        };
        let Some(user) = self.chosen_user() else {
            self.errors.set(Field::Nombre, MSG_USER_NOT_REGISTERED);
            return Step::done(Outcome::Rejected(self.errors.clone()));
        };
        self.errors.clear_all();

        let task = NewTask::for_user(&user, content, display_timestamp(Local::now()));
        self.session.current_user = Some(user);
        let ticket = self.sequencer.issue(Operation::Submit);
        Step::requesting(Request::CreateTask { ticket, task })
    }

    /// The registered user behind the typed name. Several users may share a
    /// documento, so the name picks between them.
    fn chosen_user(&self) -> Option<User> {
        let current = self.session.current_user.as_ref()?;
        let nombre = self.fields.nombre.trim();
        if current.nombre_completo == nombre {
            return Some(current.clone());
        }
        self.session
            .users
            .find_namesake(&current.documento, nombre)
            .cloned()
    }

    fn submit_update(&mut self) -> Step {
        let content = match validate_form(&self.fields, Rules::Edit) {
            Ok(content) => content,
            Err(errors) => {
                self.errors = errors.clone();
                return Step::done(Outcome::Rejected(errors));
            }
        };
        self.errors.clear_all();

        let Some(id) = self.session.editing_task_id.clone() else {
            return Step::done(Outcome::Noop);
        };
        let Some(current) = self.task(&id) else {
            self.restore_create_defaults();
            return Step::done(Outcome::UnknownTask(id));
        };

        let patch = TaskPatch::between(current, &content);
        if patch.is_empty() {
            self.restore_create_defaults();
            return Step::done(Outcome::Unchanged);
        }
        let ticket = self.sequencer.issue(Operation::Submit);
        Step::requesting(Request::UpdateTask { ticket, id, patch })
    }

    /// Load an existing task into the form and lock the identity fields.
    pub fn begin_edit(&mut self, id: &RecordId) -> Outcome {
        let Some(task) = self.task(id).cloned() else {
            return Outcome::UnknownTask(id.clone());
        };

        let content = TaskContent::from(&task);
        self.fields = FormFields {
            documento: task.documento,
            nombre: task.nombre_completo,
            title: content.title,
            status: content.status.as_str().to_string(),
            description: content.description,
        };
        self.errors.clear_all();
        self.session.editing_task_id = Some(task.id.clone());
        self.sequencer.invalidate(Operation::Submit);
        tracing::debug!(task_id = %task.id, "edit started");
        Outcome::EditStarted(task.id)
    }

    /// Leave edit mode without persisting anything.
    pub fn cancel_edit(&mut self) -> Outcome {
        if self.session.editing_task_id.is_none() {
            return Outcome::Noop;
        }
        self.sequencer.invalidate(Operation::Submit);
        self.restore_create_defaults();
        Outcome::EditCancelled
    }

    /// Delete a task. Call only once the user has confirmed.
    pub fn request_delete(&mut self, id: &RecordId) -> Step {
        if self.task(id).is_none() {
            return Step::done(Outcome::UnknownTask(id.clone()));
        }
        Step::requesting(Request::DeleteTask { id: id.clone() })
    }

    /// Drop expired card highlights.
    pub fn tick(&mut self, now: Instant) {
        self.deck.clear_expired_highlights(now);
    }

    fn restore_create_defaults(&mut self) {
        self.session.editing_task_id = None;
        self.fields.reset_content();
        match &self.session.current_user {
            Some(user) => {
                self.fields.documento = user.documento.clone();
                self.fields.nombre = user.nombre_completo.clone();
            }
            None => {
                self.fields.documento.clear();
                self.fields.nombre.clear();
            }
        }
        self.errors.clear_all();
    }

    fn raise_alert(&mut self, err: &ApiError) {
        tracing::warn!(error = %err, "request failed");
        let message = match err {
            ApiError::Connectivity { operation, .. } => {
                format!("No se pudo conectar con el servidor ({operation})")
            }
            ApiError::NotFound { .. } => {
                String::from("La tarea ya no existe en el servidor")
            }
        };
        self.alert = Some(message);
    }

    /// Feed the result of a request back into the session.
    pub fn apply(&mut self, completion: Completion) -> Step {
        match completion {
            Completion::TasksLoaded { ticket, result } => self.apply_listing(ticket, result),
            Completion::UsersWarmed { ticket, result } => self.apply_warm(ticket, result),
            Completion::UserLookedUp {
                ticket,
                documento,
                result,
            } => self.apply_lookup(ticket, &documento, result),
            Completion::TaskCreated { ticket, result } => self.apply_created(ticket, result),
            Completion::TaskUpdated { ticket, id, result } => {
                self.apply_updated(ticket, id, result)
            }
            Completion::TaskDeleted { id, result } => self.apply_deleted(id, result),
        }
    }

    fn is_stale(&self, ticket: Ticket) -> bool {
        let stale = !self.sequencer.is_current(ticket);
        if stale {
            tracing::debug!(operation = ?ticket.operation, "stale response discarded");
        }
        stale
    }

    fn apply_listing(&mut self, ticket: Ticket, result: Result<Vec<Task>, ApiError>) -> Step {
        if self.is_stale(ticket) {
            return Step::done(Outcome::Stale);
        }
        match result {
            Ok(mut tasks) => {
                tasks.reverse();
                self.deck.reconcile(&tasks, Instant::now());
                self.tasks = tasks;

                let editing_vanished = self
                    .session
                    .editing_task_id
                    .as_ref()
                    .map(|id| self.task(id).is_none())
                    .unwrap_or(false);
                if editing_vanished {
                    self.restore_create_defaults();
                }
                Step::done(Outcome::Loaded {
                    count: self.tasks.len(),
                })
            }
            Err(err) => {
                self.raise_alert(&err);
                Step::done(Outcome::Failed(err))
            }
        }
    }

    fn apply_warm(&mut self, ticket: Ticket, result: Result<Vec<User>, ApiError>) -> Step {
        if self.is_stale(ticket) {
            return Step::done(Outcome::Stale);
        }
        match result {
            Ok(users) => {
                let count = users.len();
                self.session.users.replace_cache(users);
                Step::done(Outcome::UsersCached { count })
            }
            Err(err) => {
                tracing::warn!(error = %err, "user registry unavailable for suggestions");
                Step::done(Outcome::Failed(err))
            }
        }
    }

    fn apply_lookup(
        &mut self,
        ticket: Ticket,
        documento: &str,
        result: Result<Vec<User>, ApiError>,
    ) -> Step {
        if self.is_stale(ticket) || self.state() != FormState::Idle {
            return Step::done(Outcome::Stale);
        }
        match result {
            Ok(users) => match self.session.users.absorb(users, documento) {
                Some(user) => {
                    self.fields.nombre = user.nombre_completo.clone();
                    self.errors.clear(Field::Documento);
                    self.errors.clear(Field::Nombre);
                    self.session.current_user = Some(user.clone());
                    tracing::debug!(%documento, "user resolved");
                    Step::done(Outcome::UserResolved(user))
                }
                None => {
                    self.errors.set(Field::Documento, MSG_USER_NOT_REGISTERED);
                    tracing::debug!(%documento, "user not registered");
                    Step::done(Outcome::UserNotFound)
                }
            },
            Err(err) => {
                self.raise_alert(&err);
                Step::done(Outcome::Failed(err))
            }
        }
    }

    fn apply_created(&mut self, ticket: Ticket, result: Result<Task, ApiError>) -> Step {
        let current = !self.is_stale(ticket);
        match result {
            Ok(task) => {
                if self.task(&task.id).is_none() {
                    self.tasks.insert(0, task.clone());
                }
                self.deck.prepend(&task);
                if current {
                    self.fields.reset_content();
                    self.errors.clear_all();
                }
                tracing::debug!(task_id = %task.id, "task created");
                Step::done(Outcome::Created(task))
            }
            Err(err) => {
                self.raise_alert(&err);
                Step::done(Outcome::Failed(err))
            }
        }
    }

    fn apply_updated(
        &mut self,
        ticket: Ticket,
        id: RecordId,
        result: Result<Task, ApiError>,
    ) -> Step {
        let current = !self.is_stale(ticket);
        match result {
            Ok(task) => {
                if let Some(slot) = self.tasks.iter_mut().find(|t| t.id == task.id) {
                    *slot = task.clone();
                }
                self.deck.refresh(&task, Instant::now());
                tracing::debug!(task_id = %task.id, "task updated");
                if current {
                    self.restore_create_defaults();
                }
                let sync = self.refresh();
                Step::then(Outcome::Updated(task), sync)
            }
            Err(err) if err.is_not_found() => {
                self.raise_alert(&err);
                if current && self.session.editing_task_id.as_ref() == Some(&id) {
                    self.restore_create_defaults();
                }
                let sync = self.refresh();
                Step::then(Outcome::Failed(err), sync)
            }
            Err(err) => {
                self.raise_alert(&err);
                Step::done(Outcome::Failed(err))
            }
        }
    }

    fn apply_deleted(&mut self, id: RecordId, result: Result<bool, ApiError>) -> Step {
        match result {
            Ok(_) => {
                self.tasks.retain(|task| task.id != id);
                self.deck.remove(&id);
                if self.session.editing_task_id.as_ref() == Some(&id) {
                    self.sequencer.invalidate(Operation::Submit);
                    self.restore_create_defaults();
                }
                tracing::debug!(task_id = %id, remaining = self.tasks.len(), "task deleted");
                Step::done(Outcome::Deleted(id))
            }
            Err(err) => {
                self.raise_alert(&err);
                Step::done(Outcome::Failed(err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TaskStatus;
    use crate::validation::{MSG_DOCUMENTO_DIGITS, MSG_TITLE_REQUIRED};
    use pretty_assertions::assert_eq;

    fn ana() -> User {
        User {
            id: RecordId::new("1"),
            documento: "10314".into(),
            nombre_completo: "Ana Pérez".into(),
        }
    }

    fn stored_task(id: &str) -> Task {
        Task {
            id: RecordId::new(id),
            user_id: RecordId::new("1"),
            documento: "10314".into(),
            nombre_completo: "Ana Pérez".into(),
            title: "Review PR".into(),
            description: "Check diff".into(),
            status: TaskStatus::Activa,
            fecha: String::new(),
        }
    }

    fn lookup_ticket(step: &Step) -> (Ticket, String) {
        match &step.request {
            Some(Request::LookupUser { ticket, documento }) => (*ticket, documento.clone()),
            other => panic!("expected lookup, got {other:?}"),
        }
    }

    fn resolved() -> FormController {
        let mut controller = FormController::new();
        controller.input(Field::Documento, "10314");
        let step = controller.submit();
        let (ticket, documento) = lookup_ticket(&step);
        controller.apply(Completion::UserLookedUp {
            ticket,
            documento,
            result: Ok(vec![ana()]),
        });
        controller
    }

    fn with_loaded(controller: &mut FormController, tasks: Vec<Task>) {
        let Request::LoadTasks(ticket) = controller.refresh() else {
            unreachable!()
        };
        controller.apply(Completion::TasksLoaded {
            ticket,
            result: Ok(tasks),
        });
    }

    #[test]
    fn sequencer_marks_superseded_tickets_stale() {
        let mut seq = RequestSequencer::default();
        let first = seq.issue(Operation::Lookup);
        let submit = seq.issue(Operation::Submit);
        assert!(seq.is_current(first));

        let second = seq.issue(Operation::Lookup);
        assert!(!seq.is_current(first));
        assert!(seq.is_current(second));
        assert!(seq.is_current(submit));

        seq.invalidate(Operation::Lookup);
        assert!(!seq.is_current(second));
    }

    #[test]
    fn documento_input_is_sanitized() {
        let mut controller = FormController::new();
        assert_eq!(controller.input(Field::Documento, "10-3a14"), FieldInput::Accepted);
        assert_eq!(controller.fields().documento, "10314");
    }

    #[test]
    fn idle_form_disables_task_content() {
        let mut controller = FormController::new();
        assert_eq!(controller.state(), FormState::Idle);
        assert!(!controller.task_fields_enabled());
        assert_eq!(controller.input(Field::Title, "x"), FieldInput::Disabled);
        assert_eq!(controller.fields().title, "");
        assert_eq!(controller.input(Field::Nombre, "Ana"), FieldInput::Accepted);
    }

    #[test]
    fn first_submit_only_checks_format_then_looks_up() {
        let mut controller = FormController::new();
        let step = controller.submit();
        assert!(step.request.is_none());
        assert!(matches!(step.outcome, Outcome::Rejected(_)));

        controller.input(Field::Documento, "10314");
        let step = controller.submit();
        assert_eq!(step.outcome, Outcome::Pending);
        let (_, documento) = lookup_ticket(&step);
        assert_eq!(documento, "10314");
    }

    #[test]
    fn lookup_resolves_user_and_prefills_name() {
        let controller = resolved();
        assert_eq!(controller.state(), FormState::UserResolved);
        assert_eq!(controller.fields().nombre, "Ana Pérez");
        assert!(controller.task_fields_enabled());
    }

    #[test]
    fn lookup_miss_sets_inline_error_and_stays_idle() {
        let mut controller = FormController::new();
        controller.input(Field::Documento, "99999");
        let (ticket, documento) = lookup_ticket(&controller.submit());
        let step = controller.apply(Completion::UserLookedUp {
            ticket,
            documento,
            result: Ok(vec![ana()]),
        });

        assert_eq!(step.outcome, Outcome::UserNotFound);
        assert_eq!(controller.state(), FormState::Idle);
        assert_eq!(
            controller.errors().get(Field::Documento),
            Some(MSG_USER_NOT_REGISTERED)
        );
        assert!(controller.alert().is_none());
    }

    #[test]
    fn lookup_failure_raises_alert_not_field_error() {
        let mut controller = FormController::new();
        controller.input(Field::Documento, "10314");
        let (ticket, documento) = lookup_ticket(&controller.submit());
        let step = controller.apply(Completion::UserLookedUp {
            ticket,
            documento,
            result: Err(ApiError::connectivity("list users", "refused")),
        });

        assert!(matches!(step.outcome, Outcome::Failed(_)));
        assert_eq!(controller.state(), FormState::Idle);
        assert!(controller.errors().get(Field::Documento).is_none());
        assert!(controller.alert().unwrap().contains("list users"));
        assert!(controller.dismiss_alert().is_some());
        assert!(controller.alert().is_none());
    }

    #[test]
    fn superseded_lookup_is_discarded() {
        let mut controller = FormController::new();
        controller.input(Field::Documento, "10314");
        let (old_ticket, old_doc) = lookup_ticket(&controller.submit());

        controller.input(Field::Documento, "20456");
        let (new_ticket, new_doc) = lookup_ticket(&controller.submit());

        let maria = User {
            id: RecordId::new("3"),
            documento: "20456".into(),
            nombre_completo: "María Gómez".into(),
        };
        let step = controller.apply(Completion::UserLookedUp {
            ticket: new_ticket,
            documento: new_doc,
            result: Ok(vec![ana(), maria.clone()]),
        });
        assert_eq!(step.outcome, Outcome::UserResolved(maria));

        let late = controller.apply(Completion::UserLookedUp {
            ticket: old_ticket,
            documento: old_doc,
            result: Ok(vec![ana()]),
        });
        assert_eq!(late.outcome, Outcome::Stale);
        assert_eq!(controller.current_user().unwrap().documento, "20456");
    }

    #[test]
    fn editing_documento_invalidates_in_flight_lookup() {
        let mut controller = FormController::new();
        controller.input(Field::Documento, "10314");
        let (ticket, documento) = lookup_ticket(&controller.submit());
        controller.input(Field::Documento, "1031");

        let step = controller.apply(Completion::UserLookedUp {
            ticket,
            documento,
            result: Ok(vec![ana()]),
        });
        assert_eq!(step.outcome, Outcome::Stale);
        assert_eq!(controller.state(), FormState::Idle);
    }

    #[test]
    fn changing_documento_releases_resolved_user() {
        let mut controller = resolved();
        controller.input(Field::Documento, "1031");
        assert_eq!(controller.state(), FormState::Idle);
        assert_eq!(controller.fields().nombre, "");
    }

    #[test]
    fn create_submit_validates_and_builds_payload() {
        let mut controller = resolved();
        let step = controller.submit();
        let Outcome::Rejected(errors) = step.outcome else {
            panic!("expected rejection");
        };
        assert_eq!(errors.get(Field::Title), Some(MSG_TITLE_REQUIRED));

        controller.input(Field::Title, "Review PR");
        assert!(controller.errors().get(Field::Title).is_none());
        controller.input(Field::Description, "Check diff");
        let step = controller.submit();
        let Some(Request::CreateTask { ticket, task }) = step.request else {
            panic!("expected create request");
        };
        assert_eq!(task.documento, "10314");
        assert_eq!(task.user_id.as_str(), "1");
        assert!(!task.fecha.is_empty());

        let created = stored_task("5");
        let step = controller.apply(Completion::TaskCreated {
            ticket,
            result: Ok(created.clone()),
        });
        assert_eq!(step.outcome, Outcome::Created(created));
        assert_eq!(controller.task_count(), 1);
        assert_eq!(controller.fields().title, "");
        assert_eq!(controller.fields().status, "activa");
        assert_eq!(controller.state(), FormState::UserResolved);
    }

    #[test]
    fn stale_create_lands_in_list_but_keeps_form() {
        let mut controller = resolved();
        controller.input(Field::Title, "Review PR");
        controller.input(Field::Description, "Check diff");
        let Some(Request::CreateTask { ticket, .. }) = controller.submit().request else {
            panic!("expected create request");
        };
        controller.input(Field::Documento, "2");
        controller.input(Field::Documento, "10314");

        controller.apply(Completion::TaskCreated {
            ticket,
            result: Ok(stored_task("5")),
        });
        assert_eq!(controller.task_count(), 1);
        assert_eq!(controller.deck().len(), 1);
        assert_eq!(controller.fields().title, "Review PR");
    }

    #[test]
    fn begin_edit_locks_identity_and_loads_from_store() {
        let mut controller = resolved();
        with_loaded(&mut controller, vec![stored_task("5")]);

        let outcome = controller.begin_edit(&RecordId::new("5"));
        assert_eq!(outcome, Outcome::EditStarted(RecordId::new("5")));
        assert_eq!(controller.state(), FormState::Editing);
        assert_eq!(controller.fields().title, "Review PR");
        assert_eq!(controller.input(Field::Documento, "1"), FieldInput::Locked);
        assert_eq!(controller.input(Field::Nombre, "x"), FieldInput::Locked);

        assert_eq!(
            controller.begin_edit(&RecordId::new("nope")),
            Outcome::UnknownTask(RecordId::new("nope"))
        );
    }

    #[test]
    fn edit_submit_sends_only_changed_fields_and_resyncs() {
        let mut controller = resolved();
        with_loaded(&mut controller, vec![stored_task("5")]);
        controller.begin_edit(&RecordId::new("5"));
        controller.input(Field::Status, "inactiva");

        let Some(Request::UpdateTask { ticket, id, patch }) = controller.submit().request else {
            panic!("expected update request");
        };
        assert_eq!(patch.status, Some(TaskStatus::Inactiva));
        assert!(patch.title.is_none() && patch.description.is_none());

        let mut updated = stored_task("5");
        updated.status = TaskStatus::Inactiva;
        let step = controller.apply(Completion::TaskUpdated {
            ticket,
            id,
            result: Ok(updated.clone()),
        });
        assert_eq!(step.outcome, Outcome::Updated(updated));
        assert!(matches!(step.request, Some(Request::LoadTasks(_))));
        assert_eq!(controller.state(), FormState::UserResolved);
        assert_eq!(controller.fields().documento, "10314");
        assert_eq!(controller.deck().cards()[0].badge.label, "Inactiva");
    }

    #[test]
    fn untouched_edit_submit_sends_nothing() {
        let mut controller = FormController::new();
        with_loaded(&mut controller, vec![stored_task("5")]);
        controller.begin_edit(&RecordId::new("5"));

        let step = controller.submit();
        assert_eq!(step.outcome, Outcome::Unchanged);
        assert!(step.request.is_none());
        assert_eq!(controller.state(), FormState::Idle);
        assert_eq!(controller.fields().documento, "");
    }

    #[test]
    fn cancel_edit_restores_create_defaults() {
        let mut controller = resolved();
        with_loaded(&mut controller, vec![stored_task("5")]);
        controller.begin_edit(&RecordId::new("5"));
        controller.input(Field::Title, "changed");

        assert_eq!(controller.cancel_edit(), Outcome::EditCancelled);
        assert_eq!(controller.state(), FormState::UserResolved);
        assert_eq!(controller.fields().title, "");
        assert_eq!(controller.task(&RecordId::new("5")).unwrap().title, "Review PR");
        assert_eq!(controller.cancel_edit(), Outcome::Noop);
    }

    #[test]
    fn update_after_cancel_does_not_touch_new_form() {
        let mut controller = resolved();
        with_loaded(&mut controller, vec![stored_task("5"), stored_task("6")]);
        controller.begin_edit(&RecordId::new("5"));
        controller.input(Field::Title, "first edit");
        let Some(Request::UpdateTask { ticket, id, .. }) = controller.submit().request else {
            panic!("expected update request");
        };
        controller.cancel_edit();
        controller.begin_edit(&RecordId::new("6"));

        let mut updated = stored_task("5");
        updated.title = "first edit".into();
        controller.apply(Completion::TaskUpdated {
            ticket,
            id,
            result: Ok(updated),
        });
        assert_eq!(controller.editing_task_id(), Some(&RecordId::new("6")));
        assert_eq!(
            controller.task(&RecordId::new("5")).unwrap().title,
            "first edit"
        );
    }

    #[test]
    fn vanished_update_target_alerts_and_leaves_edit_mode() {
        let mut controller = FormController::new();
        with_loaded(&mut controller, vec![stored_task("5")]);
        controller.begin_edit(&RecordId::new("5"));
        controller.input(Field::Title, "changed");
        let Some(Request::UpdateTask { ticket, id, .. }) = controller.submit().request else {
            panic!("expected update request");
        };

        let step = controller.apply(Completion::TaskUpdated {
            ticket,
            id: id.clone(),
            result: Err(ApiError::not_found("task", id)),
        });
        assert!(matches!(step.request, Some(Request::LoadTasks(_))));
        assert_eq!(controller.state(), FormState::Idle);
        assert!(controller.alert().is_some());
    }

    #[test]
    fn delete_removes_card_and_shows_empty_state() {
        let mut controller = FormController::new();
        with_loaded(&mut controller, vec![stored_task("5"), stored_task("6")]);
        assert_eq!(controller.deck().count_label(), "2 Tareas");

        let step = controller.request_delete(&RecordId::new("6"));
        assert_eq!(
            step.request,
            Some(Request::DeleteTask {
                id: RecordId::new("6")
            })
        );
        controller.apply(Completion::TaskDeleted {
            id: RecordId::new("6"),
            result: Ok(true),
        });
        assert_eq!(controller.task_count(), 1);
        assert!(!controller.deck().shows_empty_state());

        controller.apply(Completion::TaskDeleted {
            id: RecordId::new("5"),
            result: Ok(true),
        });
        assert_eq!(controller.task_count(), 0);
        assert!(controller.deck().shows_empty_state());
    }

    #[test]
    fn deleting_the_edit_target_leaves_edit_mode() {
        let mut controller = FormController::new();
        with_loaded(&mut controller, vec![stored_task("5")]);
        controller.begin_edit(&RecordId::new("5"));
        controller.apply(Completion::TaskDeleted {
            id: RecordId::new("5"),
            result: Ok(true),
        });
        assert_eq!(controller.state(), FormState::Idle);
    }

    #[test]
    fn failed_delete_keeps_card() {
        let mut controller = FormController::new();
        with_loaded(&mut controller, vec![stored_task("5")]);
        let step = controller.apply(Completion::TaskDeleted {
            id: RecordId::new("5"),
            result: Err(ApiError::connectivity("delete task", "HTTP 500")),
        });
        assert!(matches!(step.outcome, Outcome::Failed(_)));
        assert_eq!(controller.task_count(), 1);
        assert!(controller.alert().is_some());
    }

    #[test]
    fn listing_is_presented_newest_first_and_stale_listing_ignored() {
        let mut controller = FormController::new();
        let Request::LoadTasks(old) = controller.refresh() else {
            unreachable!()
        };
        let Request::LoadTasks(new) = controller.refresh() else {
            unreachable!()
        };

        let step = controller.apply(Completion::TasksLoaded {
            ticket: new,
            result: Ok(vec![stored_task("1"), stored_task("2")]),
        });
        assert_eq!(step.outcome, Outcome::Loaded { count: 2 });
        assert_eq!(controller.tasks()[0].id.as_str(), "2");
        assert_eq!(controller.deck().cards()[0].task_id().as_str(), "2");

        let step = controller.apply(Completion::TasksLoaded {
            ticket: old,
            result: Ok(vec![]),
        });
        assert_eq!(step.outcome, Outcome::Stale);
        assert_eq!(controller.task_count(), 2);
    }

    #[test]
    fn warm_cache_feeds_suggestions() {
        let mut controller = FormController::new();
        let requests = controller.start();
        let Request::WarmUsers(ticket) = requests[0].clone() else {
            panic!("expected warm request first");
        };
        controller.apply(Completion::UsersWarmed {
            ticket,
            result: Ok(vec![ana()]),
        });

        assert!(controller.documento_suggestions().is_empty());
        controller.input(Field::Documento, "103");
        assert_eq!(controller.documento_suggestions().len(), 1);
        controller.input(Field::Documento, "10314");
        assert_eq!(controller.name_suggestions(), vec!["Ana Pérez"]);
    }

    #[test]
    fn non_digit_documento_is_rejected_before_lookup() {
        let mut controller = FormController::new();
        controller.fields.documento = "12a".into();
        let step = controller.submit();
        assert!(step.request.is_none());
        assert_eq!(
            controller.errors().get(Field::Documento),
            Some(MSG_DOCUMENTO_DIGITS)
        );
    }
    #[test]
    fn warm_up_survives_documento_typing() {
        let mut controller = FormController::new();
        let requests = controller.start();
        let Request::WarmUsers(ticket) = requests[0].clone() else {
            panic!("expected warm request first");
        };
        controller.input(Field::Documento, "1");

        let step = controller.apply(Completion::UsersWarmed {
            ticket,
            result: Ok(vec![ana()]),
        });
        assert_eq!(step.outcome, Outcome::UsersCached { count: 1 });
        assert_eq!(controller.documento_suggestions().len(), 1);
    }

    fn carlos() -> User {
        User {
            id: RecordId::new("2"),
            documento: "10314".into(),
            nombre_completo: "Carlos Ruiz".into(),
        }
    }

    fn resolved_with_namesake() -> FormController {
        let mut controller = FormController::new();
        controller.input(Field::Documento, "10314");
        let (ticket, documento) = lookup_ticket(&controller.submit());
        controller.apply(Completion::UserLookedUp {
            ticket,
            documento,
            result: Ok(vec![ana(), carlos()]),
        });
        controller.input(Field::Title, "Review PR");
        controller.input(Field::Description, "Check diff");
        controller
    }

    #[test]
    fn create_uses_the_namesake_picked_by_name() {
        let mut controller = resolved_with_namesake();
        assert_eq!(controller.name_suggestions(), vec!["Ana Pérez", "Carlos Ruiz"]);
        controller.input(Field::Nombre, "Carlos Ruiz");

        let Some(Request::CreateTask { task, .. }) = controller.submit().request else {
            panic!("expected create request");
        };
        assert_eq!(task.nombre_completo, "Carlos Ruiz");
        assert_eq!(task.user_id.as_str(), "2");
        assert_eq!(
            controller.current_user().map(|user| user.nombre_completo.as_str()),
            Some("Carlos Ruiz")
        );
    }

    #[test]
    fn create_rejects_a_name_not_registered_under_documento() {
        let mut controller = resolved_with_namesake();
        controller.input(Field::Nombre, "María Gómez");

        let step = controller.submit();
        assert!(step.request.is_none());
        assert!(matches!(step.outcome, Outcome::Rejected(_)));
        assert_eq!(
            controller.errors().get(Field::Nombre),
            Some(MSG_USER_NOT_REGISTERED)
        );
        assert_eq!(
            controller.current_user().map(|user| user.nombre_completo.as_str()),
            Some("Ana Pérez")
        );
    }
}
