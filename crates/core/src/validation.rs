//! Field validation for the task form.
//!
//! Everything here is pure: rules read the raw field strings and report a
//! verdict plus one message per failing field. Nothing touches the task list
//! or the network.

use std::collections::BTreeMap;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::{TaskContent, TaskStatus, User};

static DIGITS_ONLY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]+$").expect("valid regex"));
static NON_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^0-9]+").expect("valid regex"));

pub const MSG_DOCUMENTO_REQUIRED: &str = "Número de documento requerido";
pub const MSG_DOCUMENTO_DIGITS: &str = "El documento debe contener solo números";
pub const MSG_USER_NOT_REGISTERED: &str = "Usuario no registrado";
pub const MSG_NAME_REQUIRED: &str = "Nombre de usuario requerido";
pub const MSG_TITLE_REQUIRED: &str = "Nombre de la tarea requerido";
pub const MSG_STATUS_INVALID: &str = "Estado inválido";
pub const MSG_DESCRIPTION_REQUIRED: &str = "Descripción de la tarea requerida";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Documento,
    Nombre,
    Title,
    Status,
    Description,
}

impl Field {
    pub const ALL: [Field; 5] = [
        Field::Documento,
        Field::Nombre,
        Field::Title,
        Field::Status,
        Field::Description,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Field::Documento => "Documento",
            Field::Nombre => "Nombre completo",
            Field::Title => "Tarea",
            Field::Status => "Estado",
            Field::Description => "Descripción",
        }
    }

    /// Identity fields are frozen while a task is being edited.
    pub fn is_identity(&self) -> bool {
        matches!(self, Field::Documento | Field::Nombre)
    }

    pub fn next(self) -> Self {
        let idx = Field::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Field::ALL[(idx + 1) % Field::ALL.len()]
    }

    pub fn prev(self) -> Self {
        let idx = Field::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Field::ALL[(idx + Field::ALL.len() - 1) % Field::ALL.len()]
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Raw values as typed into the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormFields {
    pub documento: String,
    pub nombre: String,
    pub title: String,
    pub status: String,
    pub description: String,
}

impl Default for FormFields {
    fn default() -> Self {
        Self {
            documento: String::new(),
            nombre: String::new(),
            title: String::new(),
            status: TaskStatus::default().as_str().to_string(),
            description: String::new(),
        }
    }
}

impl FormFields {
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Documento => &self.documento,
            Field::Nombre => &self.nombre,
            Field::Title => &self.title,
            Field::Status => &self.status,
            Field::Description => &self.description,
        }
    }

    pub fn get_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::Documento => &mut self.documento,
            Field::Nombre => &mut self.nombre,
            Field::Title => &mut self.title,
            Field::Status => &mut self.status,
            Field::Description => &mut self.description,
        }
    }

    /// Reset the task content back to its create-mode defaults.
    pub fn reset_content(&mut self) {
        let defaults = FormFields::default();
        self.title = defaults.title;
        self.status = defaults.status;
        self.description = defaults.description;
    }
}

/// Per-field error slots. A field without an entry is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    slots: BTreeMap<Field, String>,
}

impl FieldErrors {
    pub fn set(&mut self, field: Field, message: impl Into<String>) {
        self.slots.insert(field, message.into());
    }

    pub fn clear(&mut self, field: Field) {
        self.slots.remove(&field);
    }

    pub fn clear_all(&mut self) {
        self.slots.clear();
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.slots.get(&field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.slots.iter().map(|(field, msg)| (*field, msg.as_str()))
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .iter()
            .map(|(field, message)| format!("{}: {}", field, message))
            .collect();
        f.write_str(&parts.join("; "))
    }
}

/// Which rule set applies.
#[derive(Debug, Clone, Copy)]
pub enum Rules<'a> {
    /// Create-mode: identity is checked against the resolved user.
    Create { current_user: Option<&'a User> },
    /// Edit-mode: identity fields are locked and skipped.
    Edit,
}

pub fn is_valid_input(value: &str) -> bool {
    !value.trim().is_empty()
}

/// Strip everything that is not an ASCII digit.
pub fn sanitize_documento(raw: &str) -> String {
    NON_DIGITS.replace_all(raw, "").into_owned()
}

/// Format check only (presence and digits); no registry involved.
pub fn check_documento(documento: &str) -> Result<(), &'static str> {
    let trimmed = documento.trim();
    if !is_valid_input(trimmed) {
        return Err(MSG_DOCUMENTO_REQUIRED);
    }
    if !DIGITS_ONLY.is_match(trimmed) {
        return Err(MSG_DOCUMENTO_DIGITS);
    }
    Ok(())
}

/// Validate the whole form. On success returns the task content ready to be
/// sent; on failure every failing field carries its message.
pub fn validate_form(fields: &FormFields, rules: Rules<'_>) -> Result<TaskContent, FieldErrors> {
    let mut errors = FieldErrors::default();

    if let Rules::Create { current_user } = rules {
        let documento = fields.documento.trim();
        match check_documento(documento) {
            Err(message) => errors.set(Field::Documento, message),
            Ok(()) => {
                let registered = current_user
                    .map(|user| user.documento == documento)
                    .unwrap_or(false);
                if !registered {
                    errors.set(Field::Documento, MSG_USER_NOT_REGISTERED);
                }
            }
        }

        if !is_valid_input(&fields.nombre) {
            errors.set(Field::Nombre, MSG_NAME_REQUIRED);
        }
    }

    if !is_valid_input(&fields.title) {
        errors.set(Field::Title, MSG_TITLE_REQUIRED);
    }

    let status = fields.status.parse::<TaskStatus>();
    if status.is_err() {
        errors.set(Field::Status, MSG_STATUS_INVALID);
    }

    if !is_valid_input(&fields.description) {
        errors.set(Field::Description, MSG_DESCRIPTION_REQUIRED);
    }

    match status {
        Ok(status) if errors.is_empty() => Ok(TaskContent {
            title: fields.title.trim().to_string(),
            description: fields.description.trim().to_string(),
            status,
        }),
        _ => Err(errors),
    }
}
