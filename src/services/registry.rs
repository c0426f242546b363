use crate::models::{NewPerson, Person};
use parking_lot::RwLock;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;
use tokio::sync::watch;
use validator::Validate;

/// Errors that can occur with registry operations
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed user document: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Invalid user: {0}")]
    Invalid(#[from] validator::ValidationErrors),

    #[error("Username already taken: {0}")]
    DuplicateUsername(String),

    #[error("Unknown user: {0}")]
    UnknownUser(String),
}

/// Source of the requester and the candidate pool
///
/// Every call returns a point-in-time copy; callers never hold references
/// into the registry.
pub trait UserRegistry: Send + Sync {
    /// All registered users in registration order
    fn snapshot(&self) -> Vec<Person>;

    fn find(&self, id: &str) -> Option<Person>;

    /// Current revision, bumped on every mutation
    fn revision(&self) -> u64;

    /// Receiver of the registry revision
    fn subscribe(&self) -> watch::Receiver<u64>;
}

#[derive(Debug, Deserialize)]
struct UsersDocument {
    users: Vec<Person>,
}

/// Registry kept entirely in process memory
#[derive(Debug)]
pub struct InMemoryRegistry {
    users: RwLock<Vec<Person>>,
    revision_tx: watch::Sender<u64>,
}

impl InMemoryRegistry {
    pub fn new(users: Vec<Person>) -> Self {
        let (revision_tx, _) = watch::channel(0);
        Self {
            users: RwLock::new(users),
            revision_tx,
        }
    }

    /// Parse a `{ "users": [...] }` document; unknown fields are ignored
    pub fn from_json(json: &str) -> Result<Self, RegistryError> {
        let document: UsersDocument = serde_json::from_str(json)?;
        for user in &document.users {
            user.validate()?;
        }
        Ok(Self::new(document.users))
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, RegistryError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let registry = Self::from_json(&json)?;
        tracing::info!(
            users = registry.len(),
            "Loaded user registry from {}",
            path.as_ref().display()
        );
        Ok(registry)
    }

    /// Register a new user, assigning an id of the form `<archetype>_<uuid>`
    pub fn register(&self, new_person: NewPerson) -> Result<Person, RegistryError> {
        new_person.validate()?;

        let mut users = self.users.write();
        if users.iter().any(|u| u.username == new_person.username) {
            return Err(RegistryError::DuplicateUsername(new_person.username));
        }

        let person = Person {
            id: format!("{}_{}", new_person.archetype, uuid::Uuid::new_v4().simple()),
            username: new_person.username,
            name: new_person.name,
            archetype: new_person.archetype,
            age: new_person.age,
            interests: new_person.interests,
            diet: non_blank_or(new_person.diet, "Balanced"),
            education: non_blank_or(new_person.education, "School of Life"),
            job_title: non_blank_or(new_person.job_title, "Professional Companion Seeker"),
            created_at: Some(chrono::Utc::now()),
        };

        users.push(person.clone());
        drop(users);

        tracing::info!(user_id = %person.id, archetype = %person.archetype, "Registered user");
        self.bump();
        Ok(person)
    }

    pub fn remove(&self, id: &str) -> Result<Person, RegistryError> {
        let mut users = self.users.write();
        let index = users
            .iter()
            .position(|u| u.id == id)
            .ok_or_else(|| RegistryError::UnknownUser(id.to_string()))?;
        let removed = users.remove(index);
        drop(users);

        tracing::info!(user_id = %removed.id, "Removed user");
        self.bump();
        Ok(removed)
    }

    pub fn len(&self) -> usize {
        self.users.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.read().is_empty()
    }

    fn bump(&self) {
        self.revision_tx.send_modify(|revision| *revision += 1);
    }
}

impl Default for InMemoryRegistry {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl UserRegistry for InMemoryRegistry {
    fn snapshot(&self) -> Vec<Person> {
        self.users.read().clone()
    }

    fn find(&self, id: &str) -> Option<Person> {
        self.users.read().iter().find(|u| u.id == id).cloned()
    }

    fn revision(&self) -> u64 {
        *self.revision_tx.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision_tx.subscribe()
    }
}

fn non_blank_or(value: Option<String>, default: &str) -> String {
    value
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}
