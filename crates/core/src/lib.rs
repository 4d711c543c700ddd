pub mod cards;
pub mod config;
pub mod controller;
pub mod driver;
pub mod error;
pub mod lookup;
pub mod model;
pub mod remote;
pub mod validation;

pub use cards::{Card, CardAction, CardDeck};
pub use config::{AppConfig, ConfigOverrides};
pub use controller::{
    Completion, FieldAccess, FieldInput, FormController, FormState, Outcome, Request, Step,
};
pub use driver::{execute, FormDriver};
pub use error::{ApiError, ConfigError};
pub use lookup::UserLookup;
pub use model::*;
pub use remote::{HttpBackend, MemoryBackend, TaskRepository, UserRegistry};
pub use validation::{Field, FieldErrors, FormFields};
