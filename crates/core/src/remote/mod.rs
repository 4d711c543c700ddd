//! Seams between the form controller and the REST server.

use async_trait::async_trait;

use crate::error::ApiError;
use crate::model::{NewTask, RecordId, Task, TaskPatch, User};

mod http;
mod memory;

pub use http::HttpBackend;
pub use memory::MemoryBackend;

/// Read-only access to the user registry (`/usuarios`).
#[async_trait]
pub trait UserRegistry: Send + Sync {
    async fn list_users(&self) -> Result<Vec<User>, ApiError>;
}

/// CRUD access to the task collection (`/tasks`).
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Every task, in the order the server keeps them (oldest first).
    async fn list_all(&self) -> Result<Vec<Task>, ApiError>;

    async fn create(&self, task: &NewTask) -> Result<Task, ApiError>;

    /// Send only the mutable fields. A vanished target yields `ApiError::NotFound`.
    async fn update(&self, id: &RecordId, patch: &TaskPatch) -> Result<Task, ApiError>;

    async fn remove(&self, id: &RecordId) -> Result<bool, ApiError>;
}
