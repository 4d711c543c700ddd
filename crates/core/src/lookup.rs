use crate::error::ApiError;
use crate::model::User;
use crate::remote::UserRegistry;

/// Client-side view of the user registry.
///
/// The registry is tiny, so every lookup refetches the whole collection and
/// the result doubles as the autocomplete cache for the rest of the session.
#[derive(Debug, Clone, Default)]
pub struct UserLookup {
    cache: Vec<User>,
}

impl UserLookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refresh the cache from the registry and return the first user whose
    /// documento matches exactly. `Ok(None)` means the registry answered but
    /// holds no such user.
    pub async fn find_by_identifier(
        &mut self,
        registry: &dyn UserRegistry,
        documento: &str,
    ) -> Result<Option<User>, ApiError> {
        let users = registry.list_users().await?;
        Ok(self.absorb(users, documento))
    }

    /// Replace the cache with a freshly fetched registry and scan it.
    pub fn absorb(&mut self, users: Vec<User>, documento: &str) -> Option<User> {
        self.replace_cache(users);
        self.cache
            .iter()
            .find(|user| user.documento == documento)
            .cloned()
    }

    pub fn replace_cache(&mut self, users: Vec<User>) {
        tracing::debug!(count = users.len(), "user cache replaced");
        self.cache = users;
    }

    /// Cached users whose documento starts with `partial`. Never hits the
    /// network and never authoritative.
    pub fn suggest_by_prefix(&self, partial: &str) -> Vec<&User> {
        if partial.is_empty() {
            return Vec::new();
        }
        self.cache
            .iter()
            .filter(|user| user.documento.starts_with(partial))
            .collect()
    }

    /// Names of every cached user registered under exactly `documento`.
    pub fn names_for_identifier(&self, documento: &str) -> Vec<&str> {
        if documento.is_empty() {
            return Vec::new();
        }
        self.cache
            .iter()
            .filter(|user| user.documento == documento)
            .map(|user| user.nombre_completo.as_str())
            .collect()
    }

    /// The cached user registered under `documento` with exactly `nombre`.
    pub fn find_namesake(&self, documento: &str, nombre: &str) -> Option<&User> {
        self.cache
            .iter()
            .find(|user| user.documento == documento && user.nombre_completo == nombre)
    }

    pub fn cached(&self) -> &[User] {
        &self.cache
    }
}
