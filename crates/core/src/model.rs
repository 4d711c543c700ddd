use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Local, Locale};
use clap::ValueEnum;
use serde::{Deserialize, Deserializer, Serialize};

/// Server-assigned identifier. json-server hands these out as strings or
/// numbers depending on its version, so both are accepted and kept as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new<T: Into<String>>(value: T) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(i64),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(text) => RecordId(text),
            Raw::Number(number) => RecordId(number.to_string()),
        })
    }
}

fn text_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    RecordId::deserialize(deserializer).map(|id| id.0)
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Activa,
    Inactiva,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Activa => "activa",
            TaskStatus::Inactiva => "inactiva",
        }
    }

    /// Capitalized label shown on the card badge.
    pub fn label(&self) -> &'static str {
        match self {
            TaskStatus::Activa => "Activa",
            TaskStatus::Inactiva => "Inactiva",
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            TaskStatus::Activa => TaskStatus::Inactiva,
            TaskStatus::Inactiva => TaskStatus::Activa,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = anyhow::Error;

    // Exact match only; the form must carry one of the two literal values.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "activa" => Ok(TaskStatus::Activa),
            "inactiva" => Ok(TaskStatus::Inactiva),
            other => Err(anyhow!(
                "Unknown status '{}': expected activa|inactiva",
                other
            )),
        }
    }
}

impl ValueEnum for TaskStatus {
    fn value_variants<'a>() -> &'a [Self] {
        const VARIANTS: [TaskStatus; 2] = [TaskStatus::Activa, TaskStatus::Inactiva];
        &VARIANTS
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(clap::builder::PossibleValue::new(self.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: RecordId,
    #[serde(deserialize_with = "text_or_number")]
    pub documento: String,
    pub nombre_completo: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: RecordId,
    #[serde(rename = "userId")]
    pub user_id: RecordId,
    #[serde(deserialize_with = "text_or_number")]
    pub documento: String,
    pub nombre_completo: String,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    #[serde(default)]
    pub fecha: String,
}

/// Payload for `POST /tasks`; the server fills in the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewTask {
    #[serde(rename = "userId")]
    pub user_id: RecordId,
    pub documento: String,
    pub nombre_completo: String,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub fecha: String,
}

impl NewTask {
    pub fn for_user(user: &User, content: TaskContent, fecha: String) -> Self {
        Self {
            user_id: user.id.clone(),
            documento: user.documento.clone(),
            nombre_completo: user.nombre_completo.clone(),
            title: content.title,
            description: content.description,
            status: content.status,
            fecha,
        }
    }
}

/// The mutable part of a task, as accepted by the validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskContent {
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
}

impl From<&Task> for TaskContent {
    fn from(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            description: task.description.clone(),
            status: task.status,
        }
    }
}

/// Partial update body for `PATCH /tasks/{id}`. Identity fields are not
/// representable here on purpose.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
}

impl TaskPatch {
    /// Build a patch holding only the fields of `next` that differ from `current`.
    pub fn between(current: &Task, next: &TaskContent) -> Self {
        Self {
            title: (current.title != next.title).then(|| next.title.clone()),
            description: (current.description != next.description)
                .then(|| next.description.clone()),
            status: (current.status != next.status).then_some(next.status),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.status.is_none()
    }

    pub fn apply_to(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(description) = &self.description {
            task.description = description.clone();
        }
        if let Some(status) = self.status {
            task.status = status;
        }
    }
}

/// Long es-ES timestamp stored in `fecha`, e.g. `19 de octubre de 2026, 14:05`.
pub fn display_timestamp(at: DateTime<Local>) -> String {
    at.format_localized("%-d de %B de %Y, %H:%M", Locale::es_ES)
        .to_string()
}
