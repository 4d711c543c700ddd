//! Runs controller requests against the remote collections.

use std::sync::Arc;

use crate::controller::{Completion, FieldInput, FormController, Outcome, Request, Step};
use crate::model::RecordId;
use crate::remote::{TaskRepository, UserRegistry};
use crate::validation::Field;

/// Perform one request and package the answer for [`FormController::apply`].
pub async fn execute(
    request: Request,
    tasks: &dyn TaskRepository,
    users: &dyn UserRegistry,
) -> Completion {
    match request {
        Request::LoadTasks(ticket) => Completion::TasksLoaded {
            ticket,
            result: tasks.list_all().await,
        },
        Request::WarmUsers(ticket) => Completion::UsersWarmed {
            ticket,
            result: users.list_users().await,
        },
        Request::LookupUser { ticket, documento } => Completion::UserLookedUp {
            ticket,
            result: users.list_users().await,
            documento,
        },
        Request::CreateTask { ticket, task } => Completion::TaskCreated {
            ticket,
            result: tasks.create(&task).await,
        },
        Request::UpdateTask { ticket, id, patch } => Completion::TaskUpdated {
            ticket,
            result: tasks.update(&id, &patch).await,
            id,
        },
        Request::DeleteTask { id } => Completion::TaskDeleted {
            result: tasks.remove(&id).await,
            id,
        },
    }
}

/// A controller bound to its backends, driven one request at a time.
pub struct FormDriver {
    controller: FormController,
    tasks: Arc<dyn TaskRepository>,
    users: Arc<dyn UserRegistry>,
}

impl FormDriver {
    pub fn new(tasks: Arc<dyn TaskRepository>, users: Arc<dyn UserRegistry>) -> Self {
        Self {
            controller: FormController::new(),
            tasks,
            users,
        }
    }

    /// Bind both collections to the same backend.
    pub fn with_backend<B>(backend: B) -> Self
    where
        B: TaskRepository + UserRegistry + 'static,
    {
        let backend = Arc::new(backend);
        Self::new(backend.clone(), backend)
    }

    pub fn controller(&self) -> &FormController {
        &self.controller
    }

    pub fn user_registry(&self) -> Arc<dyn UserRegistry> {
        Arc::clone(&self.users)
    }

    /// Warm the user cache and load the task list.
    pub async fn start(&mut self) -> Vec<Outcome> {
        let mut outcomes = Vec::new();
        for request in self.controller.start() {
            outcomes.push(self.run(Step::requesting(request)).await);
        }
        outcomes
    }

    pub async fn refresh(&mut self) -> Outcome {
        let request = self.controller.refresh();
        self.run(Step::requesting(request)).await
    }

    pub fn input(&mut self, field: Field, value: &str) -> FieldInput {
        self.controller.input(field, value)
    }

    pub async fn submit(&mut self) -> Outcome {
        let step = self.controller.submit();
        self.run(step).await
    }

    pub fn begin_edit(&mut self, id: &RecordId) -> Outcome {
        self.controller.begin_edit(id)
    }

    pub async fn delete(&mut self, id: &RecordId) -> Outcome {
        let step = self.controller.request_delete(id);
        self.run(step).await
    }

    /// Execute the step's request and any follow-ups. Returns the outcome of
    /// the first completion, or the step's own outcome when nothing ran.
    pub async fn run(&mut self, step: Step) -> Outcome {
        let mut primary = None;
        let mut next = step.request;
        while let Some(request) = next {
            let completion = execute(request, self.tasks.as_ref(), self.users.as_ref()).await;
            let applied = self.controller.apply(completion);
            primary.get_or_insert(applied.outcome);
            next = applied.request;
        }
        primary.unwrap_or(step.outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::FormState;
    use crate::model::{TaskStatus, User};
    use crate::remote::{HttpBackend, MemoryBackend};
    use crate::validation::MSG_USER_NOT_REGISTERED;
    use httpmock::prelude::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use url::Url;

    async fn fill_task(driver: &mut FormDriver, title: &str, description: &str) -> Outcome {
        driver.input(Field::Title, title);
        driver.input(Field::Description, description);
        driver.submit().await
    }

    #[tokio::test]
    async fn create_flow_against_memory_backend() {
        let backend = MemoryBackend::seeded();
        let mut driver = FormDriver::with_backend(backend.clone());
        driver.start().await;
        assert!(driver.controller().deck().shows_empty_state());

        driver.input(Field::Documento, "10314");
        let outcome = driver.submit().await;
        let Outcome::UserResolved(user) = outcome else {
            panic!("expected user, got {outcome:?}");
        };
        assert_eq!(user.nombre_completo, "Ana Pérez");

        let outcome = fill_task(&mut driver, "Review PR", "Check diff").await;
        assert!(matches!(outcome, Outcome::Created(_)));

        let controller = driver.controller();
        assert_eq!(controller.deck().count_label(), "1 Tarea");
        assert!(!controller.deck().shows_empty_state());
        assert_eq!(controller.deck().cards()[0].avatar, "AP");
        assert_eq!(controller.deck().cards()[0].badge.label, "Activa");
        assert_eq!(controller.fields().title, "");
        assert_eq!(backend.tasks().len(), 1);
        assert_eq!(backend.tasks()[0].user_id.as_str(), "1");
    }

    #[tokio::test]
    async fn namesake_picked_by_name_owns_the_task() {
        let backend = MemoryBackend::seeded();
        let mut driver = FormDriver::with_backend(backend.clone());
        driver.start().await;

        driver.input(Field::Documento, "10314");
        assert!(matches!(driver.submit().await, Outcome::UserResolved(_)));
        driver.input(Field::Nombre, "Carlos Ruiz");
        let outcome = fill_task(&mut driver, "Review PR", "Check diff").await;
        assert!(matches!(outcome, Outcome::Created(_)));

        let stored = backend.tasks();
        assert_eq!(stored[0].nombre_completo, "Carlos Ruiz");
        assert_eq!(stored[0].user_id.as_str(), "2");
        assert_eq!(driver.controller().deck().cards()[0].avatar, "CR");
    }

    #[tokio::test]
    async fn unknown_user_blocks_create() {
        let mut driver = FormDriver::with_backend(MemoryBackend::seeded());
        driver.input(Field::Documento, "99999");

        assert_eq!(driver.submit().await, Outcome::UserNotFound);
        assert_eq!(
            driver.controller().errors().get(Field::Documento),
            Some(MSG_USER_NOT_REGISTERED)
        );
        assert_eq!(driver.controller().state(), FormState::Idle);
    }

    #[tokio::test]
    async fn edit_updates_card_in_place() {
        let backend = MemoryBackend::seeded();
        let mut driver = FormDriver::with_backend(backend.clone());
        driver.input(Field::Documento, "10314");
        driver.submit().await;
        fill_task(&mut driver, "Review PR", "Check diff").await;
        fill_task(&mut driver, "Ship it", "Tag release").await;

        let id = backend.tasks()[0].id.clone();
        driver.begin_edit(&id);
        driver.input(Field::Status, "inactiva");
        let outcome = driver.submit().await;
        assert!(matches!(outcome, Outcome::Updated(ref task) if task.status == TaskStatus::Inactiva));

        let deck = driver.controller().deck();
        assert_eq!(deck.len(), 2);
        assert_eq!(deck.position(&id), Some(1));
        assert_eq!(deck.find(&id).unwrap().badge.class, "inactiva");
        assert_eq!(driver.controller().state(), FormState::UserResolved);
    }

    #[tokio::test]
    async fn delete_last_task_shows_empty_state() {
        let backend = MemoryBackend::seeded();
        let mut driver = FormDriver::with_backend(backend.clone());
        driver.input(Field::Documento, "30001");
        driver.submit().await;
        fill_task(&mut driver, "Only", "one").await;

        let id = backend.tasks()[0].id.clone();
        assert_eq!(driver.delete(&id).await, Outcome::Deleted(id));
        assert!(driver.controller().deck().shows_empty_state());
        assert_eq!(driver.controller().deck().count_label(), "0 Tareas");
        assert!(backend.tasks().is_empty());
    }

    #[tokio::test]
    async fn outage_surfaces_alert_and_keeps_state() {
        let backend = MemoryBackend::seeded();
        let mut driver = FormDriver::with_backend(backend.clone());
        driver.input(Field::Documento, "10314");
        driver.submit().await;

        backend.set_reachable(false);
        let outcome = fill_task(&mut driver, "Review PR", "Check diff").await;
        assert!(matches!(outcome, Outcome::Failed(_)));
        assert!(driver.controller().alert().is_some());
        assert_eq!(driver.controller().fields().title, "Review PR");
        assert_eq!(driver.controller().task_count(), 0);
    }

    #[tokio::test]
    async fn update_round_trip_over_http() {
        let server = MockServer::start();
        let task = json!({
            "id": "9",
            "userId": "1",
            "documento": "10314",
            "nombre_completo": "Ana Pérez",
            "title": "Review PR",
            "description": "Check diff",
            "status": "activa",
            "fecha": "19 de octubre de 2026, 14:05"
        });
        let mut patched = task.clone();
        patched["status"] = json!("inactiva");

        server.mock(|when, then| {
            when.method(GET).path("/usuarios");
            then.status(200).json_body(json!([
                {"id": "1", "documento": "10314", "nombre_completo": "Ana Pérez"}
            ]));
        });
        let listing = server.mock(|when, then| {
            when.method(GET).path("/tasks");
            then.status(200).json_body(json!([task]));
        });
        let patch = server.mock(|when, then| {
            when.method(PATCH)
                .path("/tasks/9")
                .json_body(json!({"status": "inactiva"}));
            then.status(200).json_body(patched);
        });

        let base = Url::parse(&server.base_url()).unwrap();
        let backend = HttpBackend::new(reqwest::Client::new(), base);
        let mut driver = FormDriver::with_backend(backend);
        let outcomes = driver.start().await;
        assert_eq!(outcomes[1], Outcome::Loaded { count: 1 });

        let id = RecordId::new("9");
        driver.begin_edit(&id);
        driver.input(Field::Status, "inactiva");
        let outcome = driver.submit().await;

        patch.assert();
        // initial load plus the re-sync after the update
        listing.assert_calls(2);
        assert!(matches!(outcome, Outcome::Updated(_)));
    }

    #[tokio::test]
    async fn suggestions_use_warmed_cache() {
        let mut driver = FormDriver::with_backend(MemoryBackend::with_users(vec![User {
            id: RecordId::new("1"),
            documento: "10314".into(),
            nombre_completo: "Ana Pérez".into(),
        }]));
        driver.start().await;
        driver.input(Field::Documento, "10");

        let docs: Vec<&str> = driver
            .controller()
            .documento_suggestions()
            .iter()
            .map(|user| user.documento.as_str())
            .collect();
        assert_eq!(docs, vec!["10314"]);
    }
}
