use std::path::Path;

use anyhow::Context;
use indexmap::IndexMap;
use tokio::sync::RwLock;
use tracing::{info, instrument};

use crate::datatypes::{normalize_email, Activity};
use crate::error::ApiError;
use crate::teachers::Teacher;

const SEED_ACTIVITIES: &str = include_str!("../data/activities.json");

/// Fixed set of activities, each roster behind its own lock.
///
/// The set of names never changes after construction, so only the
/// individual rosters need guarding. A signup or unregister holds the write
/// guard of exactly one activity for both the membership check and the
/// mutation.
pub struct ActivityRegistry {
    activities: IndexMap<String, RwLock<Activity>>,
    enforce_capacity: bool,
}

impl ActivityRegistry {
    pub fn new(activities: IndexMap<String, Activity>, enforce_capacity: bool) -> Self {
        let activities = activities
            .into_iter()
            .map(|(name, mut activity)| {
                dedup_participants(&mut activity.participants);
                (name, RwLock::new(activity))
            })
            .collect();

        Self {
            activities,
            enforce_capacity,
        }
    }

    /// The built-in Mergington roster.
    pub fn seeded(enforce_capacity: bool) -> anyhow::Result<Self> {
        Self::from_json(SEED_ACTIVITIES, enforce_capacity).context("built-in roster is malformed")
    }

    #[instrument]
    pub fn load(path: &Path, enforce_capacity: bool) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("could not read activities file {}", path.display()))?;
        let registry = Self::from_json(&raw, enforce_capacity)
            .with_context(|| format!("malformed activities file {}", path.display()))?;

        info!(activities = registry.len(), "loaded activities");
        Ok(registry)
    }

    pub fn from_json(raw: &str, enforce_capacity: bool) -> anyhow::Result<Self> {
        let activities: IndexMap<String, Activity> = serde_json::from_str(raw)?;
        Ok(Self::new(activities, enforce_capacity))
    }

    pub fn len(&self) -> usize {
        self.activities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.activities.is_empty()
    }

    /// Snapshot of every activity in definition order.
    pub async fn list(&self) -> IndexMap<String, Activity> {
        let mut snapshot = IndexMap::with_capacity(self.activities.len());

        for (name, activity) in &self.activities {
            snapshot.insert(name.clone(), activity.read().await.clone());
        }

        snapshot
    }

    #[cfg(test)]
    pub async fn get(&self, name: &str) -> Option<Activity> {
        match self.activities.get(name) {
            Some(activity) => Some(activity.read().await.clone()),
            None => None,
        }
    }

    #[instrument(skip(self, teacher), fields(teacher = %teacher))]
    pub async fn signup(
        &self,
        teacher: &Teacher,
        activity_name: &str,
        email: &str,
    ) -> Result<String, ApiError> {
        let slot = self
            .activities
            .get(activity_name)
            .ok_or(ApiError::ActivityNotFound)?;
        let email = normalize_email(email).ok_or(ApiError::MissingEmail)?;

        let mut activity = slot.write().await;

        if activity.is_participant(&email) {
            return Err(ApiError::AlreadySignedUp);
        }
        if self.enforce_capacity && activity.is_full() {
            return Err(ApiError::ActivityFull);
        }

        activity.participants.push(email.clone());
        info!(participants = activity.participants.len(), "signed up");

        Ok(format!("Signed up {email} for {activity_name}"))
    }

    #[instrument(skip(self, teacher), fields(teacher = %teacher))]
    pub async fn unregister(
        &self,
        teacher: &Teacher,
        activity_name: &str,
        email: &str,
    ) -> Result<String, ApiError> {
        let slot = self
            .activities
            .get(activity_name)
            .ok_or(ApiError::ActivityNotFound)?;
        let email = normalize_email(email).ok_or(ApiError::MissingEmail)?;

        let mut activity = slot.write().await;

        let Some(idx) = activity.participants.iter().position(|p| *p == email) else {
            return Err(ApiError::NotSignedUp);
        };

        activity.participants.remove(idx);
        info!(participants = activity.participants.len(), "unregistered");

        Ok(format!("Unregistered {email} from {activity_name}"))
    }
}

fn dedup_participants(participants: &mut Vec<String>) {
    let mut seen = std::collections::HashSet::new();
    participants.retain(|p| seen.insert(p.clone()));
}
