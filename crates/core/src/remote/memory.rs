use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{TaskRepository, UserRegistry};
use crate::error::ApiError;
use crate::model::{NewTask, RecordId, Task, TaskPatch, User};

/// Sample registry used when no backend is available.
const SAMPLE_USERS: &[(&str, &str)] = &[
    ("10314", "Ana Pérez"),
    ("10314", "Carlos Ruiz"),
    ("20456", "María Gómez"),
    ("20456", "Luis Herrera"),
    ("30001", "Sofía Martínez"),
];

#[derive(Debug, Default)]
struct MemoryState {
    users: Vec<User>,
    tasks: Vec<Task>,
    next_id: u64,
    reachable: bool,
}

/// In-process stand-in for the REST server. Nothing is persisted; cloning
/// shares the same state.
#[derive(Debug, Clone)]
pub struct MemoryBackend {
    state: Arc<Mutex<MemoryState>>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::with_users(Vec::new())
    }
}

impl MemoryBackend {
    pub fn with_users(users: Vec<User>) -> Self {
        Self {
            state: Arc::new(Mutex::new(MemoryState {
                users,
                tasks: Vec::new(),
                next_id: 1,
                reachable: true,
            })),
        }
    }

    pub fn seeded() -> Self {
        let users = SAMPLE_USERS
            .iter()
            .enumerate()
            .map(|(idx, (documento, nombre))| User {
                id: RecordId::new((idx + 1).to_string()),
                documento: (*documento).to_string(),
                nombre_completo: (*nombre).to_string(),
            })
            .collect();
        Self::with_users(users)
    }

    /// Simulate the server going away (or coming back).
    pub fn set_reachable(&self, reachable: bool) {
        self.state.lock().reachable = reachable;
    }

    pub fn tasks(&self) -> Vec<Task> {
        self.state.lock().tasks.clone()
    }

    fn check(&self, operation: &'static str) -> Result<(), ApiError> {
        if self.state.lock().reachable {
            Ok(())
        } else {
            Err(ApiError::connectivity(operation, "server unreachable"))
        }
    }
}

#[async_trait]
impl UserRegistry for MemoryBackend {
    async fn list_users(&self) -> Result<Vec<User>, ApiError> {
        self.check("list users")?;
        Ok(self.state.lock().users.clone())
    }
}

#[async_trait]
impl TaskRepository for MemoryBackend {
    async fn list_all(&self) -> Result<Vec<Task>, ApiError> {
        self.check("list tasks")?;
        Ok(self.state.lock().tasks.clone())
    }

    async fn create(&self, task: &NewTask) -> Result<Task, ApiError> {
        self.check("create task")?;
        let mut state = self.state.lock();
        let id = RecordId::new(state.next_id.to_string());
        state.next_id += 1;
        let created = Task {
            id,
            user_id: task.user_id.clone(),
            documento: task.documento.clone(),
            nombre_completo: task.nombre_completo.clone(),
            title: task.title.clone(),
            description: task.description.clone(),
            status: task.status,
            fecha: task.fecha.clone(),
        };
        state.tasks.push(created.clone());
        Ok(created)
    }

    async fn update(&self, id: &RecordId, patch: &TaskPatch) -> Result<Task, ApiError> {
        self.check("update task")?;
        let mut state = self.state.lock();
        let task = state
            .tasks
            .iter_mut()
            .find(|task| &task.id == id)
            .ok_or_else(|| ApiError::not_found("task", id.clone()))?;
        patch.apply_to(task);
        Ok(task.clone())
    }

    async fn remove(&self, id: &RecordId) -> Result<bool, ApiError> {
        self.check("delete task")?;
        let mut state = self.state.lock();
        let before = state.tasks.len();
        state.tasks.retain(|task| &task.id != id);
        if state.tasks.len() == before {
            return Err(ApiError::connectivity("delete task", "HTTP 404 Not Found"));
        }
        Ok(true)
    }
}
