use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::instrument;
use url::Url;

use super::{TaskRepository, UserRegistry};
use crate::config::AppConfig;
use crate::error::ApiError;
use crate::model::{NewTask, RecordId, Task, TaskPatch, User};

const USERS_PATH: &str = "usuarios";
const TASKS_PATH: &str = "tasks";

/// REST adapter for a json-server style backend. Implements both the user
/// registry and the task repository against one base URL.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base: Url,
}

impl HttpBackend {
    pub fn new(client: Client, base: Url) -> Self {
        Self { client, base }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context("failed to build HTTP client")?;
        Ok(Self::new(client, config.api_url().clone()))
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, operation: &'static str, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::connectivity(operation, "invalid base URL"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<Response, ApiError> {
        let response = request
            .send()
            .await
            .map_err(|err| ApiError::connectivity(operation, err.to_string()))?;
        tracing::debug!(operation, status = response.status().as_u16(), "response received");
        Ok(response)
    }

    async fn expect_success(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<Response, ApiError> {
        let response = self.send(operation, request).await?;
        if !response.status().is_success() {
            return Err(ApiError::connectivity(
                operation,
                format!("HTTP {}", response.status()),
            ));
        }
        Ok(response)
    }
}

async fn decode<T: DeserializeOwned>(
    operation: &'static str,
    response: Response,
) -> Result<T, ApiError> {
    response
        .json::<T>()
        .await
        .map_err(|err| ApiError::connectivity(operation, format!("invalid response body: {err}")))
}

#[async_trait]
impl UserRegistry for HttpBackend {
    #[instrument(name = "tareas.http.users.list", skip_all, fields(base = %self.base))]
    async fn list_users(&self) -> Result<Vec<User>, ApiError> {
        const OP: &str = "list users";
        let url = self.endpoint(OP, &[USERS_PATH])?;
        let response = self.expect_success(OP, self.client.get(url)).await?;
        decode(OP, response).await
    }
}

#[async_trait]
impl TaskRepository for HttpBackend {
    #[instrument(name = "tareas.http.tasks.list", skip_all, fields(base = %self.base))]
    async fn list_all(&self) -> Result<Vec<Task>, ApiError> {
        const OP: &str = "list tasks";
        let url = self.endpoint(OP, &[TASKS_PATH])?;
        let response = self.expect_success(OP, self.client.get(url)).await?;
        decode(OP, response).await
    }

    #[instrument(name = "tareas.http.tasks.create", skip_all, fields(documento = %task.documento))]
    async fn create(&self, task: &NewTask) -> Result<Task, ApiError> {
        const OP: &str = "create task";
        let url = self.endpoint(OP, &[TASKS_PATH])?;
        let response = self
            .expect_success(OP, self.client.post(url).json(task))
            .await?;
        decode(OP, response).await
    }

    #[instrument(name = "tareas.http.tasks.update", skip_all, fields(task_id = %id))]
    async fn update(&self, id: &RecordId, patch: &TaskPatch) -> Result<Task, ApiError> {
        const OP: &str = "update task";
        let url = self.endpoint(OP, &[TASKS_PATH, id.as_str()])?;
        let response = self.send(OP, self.client.patch(url).json(patch)).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(ApiError::not_found("task", id.clone()));
        }
        if !response.status().is_success() {
            return Err(ApiError::connectivity(
                OP,
                format!("HTTP {}", response.status()),
            ));
        }
        decode(OP, response).await
    }

    #[instrument(name = "tareas.http.tasks.remove", skip_all, fields(task_id = %id))]
    async fn remove(&self, id: &RecordId) -> Result<bool, ApiError> {
        const OP: &str = "delete task";
        let url = self.endpoint(OP, &[TASKS_PATH, id.as_str()])?;
        self.expect_success(OP, self.client.delete(url)).await?;
        Ok(true)
    }
}
