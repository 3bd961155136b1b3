use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::io::ErrorKind;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
use tracing::{info, instrument, warn};

/// A teacher whose session has been checked against the directory.
///
/// Only [`TeacherDirectory`] hands these out, so holding one is proof that an
/// authorization check succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Teacher(String);

impl Teacher {
    pub fn username(&self) -> &str {
        &self.0
    }
}

impl Display for Teacher {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Deserialize)]
struct TeachersFile {
    #[serde(default)]
    teachers: Vec<TeacherEntry>,
}

#[derive(Deserialize)]
struct TeacherEntry {
    username: String,
    password: String,
}

/// Username to plaintext password, read once at startup.
#[derive(Debug, Default)]
pub struct TeacherDirectory {
    teachers: HashMap<String, String>,
}

impl TeacherDirectory {
    /// A missing file yields an empty directory; a malformed one is an error.
    #[instrument]
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(raw) => {
                let directory = Self::from_json(&raw)
                    .with_context(|| format!("malformed teachers file {}", path.display()))?;
                info!(teachers = directory.len(), "loaded teacher directory");
                Ok(directory)
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                warn!("teachers file not found, nobody will be able to log in");
                Ok(Self::default())
            }
            Err(err) => {
                Err(err).with_context(|| format!("could not read teachers file {}", path.display()))
            }
        }
    }

    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        let file: TeachersFile = serde_json::from_str(raw)?;

        Ok(Self::from_pairs(
            file.teachers.into_iter().map(|t| (t.username, t.password)),
        ))
    }

    pub fn from_pairs<I, U, P>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (U, P)>,
        U: Into<String>,
        P: Into<String>,
    {
        Self {
            teachers: pairs
                .into_iter()
                .map(|(u, p)| (u.into(), p.into()))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.teachers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teachers.is_empty()
    }

    /// Resolves a session cookie value to a known teacher.
    pub fn authorize(&self, username: &str) -> Option<Teacher> {
        self.teachers
            .contains_key(username)
            .then(|| Teacher(username.to_owned()))
    }

    /// Exact match on both username and password.
    pub fn verify(&self, username: &str, password: &str) -> Option<Teacher> {
        match self.teachers.get(username) {
            Some(stored) if stored == password => Some(Teacher(username.to_owned())),
            _ => None,
        }
    }
}
