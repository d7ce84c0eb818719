//! Concept registry
//!
//! Per-session map of concept name to learner state. Ingestion merges into
//! existing records and never resets mastery or attached exercises.
//!
//! Locking is two-level: the outer `DashMap` gives atomic get-or-create of a
//! session's map, and each session map sits behind its own mutex so that
//! mutations within one session are serialized while sessions never contend.
//! No lock is ever held across an `.await`.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use dashmap::DashMap;
use serde::{Deserialize, Serialize, Serializer};
use tracing::debug;

use crate::errors::RegistryError;
use crate::session::SessionKey;

/// Difficulty tag. Never computed here; only ever set by an outside caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    #[default]
    Unknown,
    Beginner,
    Intermediate,
    Advanced,
}

/// Learner state for one concept within one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConceptRecord {
    pub name: String,
    pub complexity: Complexity,
    #[serde(serialize_with = "serialize_flag")]
    pub understanding: bool,
    pub files: BTreeSet<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exercise: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

fn serialize_flag<S: Serializer>(flag: &bool, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u8(u8::from(*flag))
}

impl ConceptRecord {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            complexity: Complexity::Unknown,
            understanding: false,
            files: BTreeSet::new(),
            exercise: None,
            hint: None,
        }
    }
}

pub(crate) type ConceptMap = HashMap<String, ConceptRecord>;

fn lock(map: &Mutex<ConceptMap>) -> MutexGuard<'_, ConceptMap> {
    // Every critical section leaves the map consistent, so a poisoned lock is still usable.
    map.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Process-wide store of every session's concept map.
#[derive(Default)]
pub struct ConceptRegistry {
    sessions: DashMap<SessionKey, Arc<Mutex<ConceptMap>>>,
}

impl ConceptRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn session_or_create(&self, session: &SessionKey) -> Arc<Mutex<ConceptMap>> {
        self.sessions
            .entry(session.clone())
            .or_insert_with(|| Arc::new(Mutex::new(HashMap::new())))
            .value()
            .clone()
    }

    fn existing(&self, session: &SessionKey) -> Option<Arc<Mutex<ConceptMap>>> {
        self.sessions.get(session).map(|entry| entry.value().clone())
    }

    /// Merge a document's concepts into the session. Returns how many records were new.
    ///
    /// An empty concept list is a no-op and does not create the session.
    pub fn ingest(&self, session: &SessionKey, filename: &str, concepts: &[String]) -> usize {
        if concepts.is_empty() {
            return 0;
        }

        let map = self.session_or_create(session);
        let mut map = lock(&map);
        let mut created = 0;

        for name in concepts {
            let record = map.entry(name.clone()).or_insert_with(|| {
                created += 1;
                ConceptRecord::new(name)
            });
            record.files.insert(filename.to_string());
        }

        debug!(
            "Ingested {} concept(s) from '{}' into session {} ({} new)",
            concepts.len(),
            filename,
            session,
            created
        );
        created
    }

    /// Flag a concept as mastered. Never creates entries.
    pub fn mark_mastered(&self, session: &SessionKey, concept: &str) -> Result<(), RegistryError> {
        let map = self.existing(session).ok_or(RegistryError::UnknownSession)?;
        let mut map = lock(&map);

        if map.is_empty() {
            return Err(RegistryError::UnknownSession);
        }
        let record = map.get_mut(concept).ok_or(RegistryError::UnknownConcept)?;
        record.understanding = true;
        Ok(())
    }

    /// Store a generated exercise, creating the concept entry if it was never extracted.
    pub fn attach_exercise(&self, session: &SessionKey, concept: &str, exercise: &str, hint: &str) {
        let map = self.session_or_create(session);
        let mut map = lock(&map);

        let record = map
            .entry(concept.to_string())
            .or_insert_with(|| ConceptRecord::new(concept));
        record.exercise = Some(exercise.to_string());
        record.hint = Some(hint.to_string());
    }

    /// Run a read-only view over one session's map, if the session exists.
    pub(crate) fn read<R>(&self, session: &SessionKey, view: impl FnOnce(&ConceptMap) -> R) -> Option<R> {
        let map = self.existing(session)?;
        let map = lock(&map);
        Some(view(&map))
    }

    /// Copy of one session's records, sorted by name.
    pub fn snapshot(&self, session: &SessionKey) -> Vec<ConceptRecord> {
        self.read(session, |map| {
            let mut records: Vec<ConceptRecord> = map.values().cloned().collect();
            records.sort_by(|a, b| a.name.cmp(&b.name));
            records
        })
        .unwrap_or_default()
    }

    pub fn get(&self, session: &SessionKey, concept: &str) -> Option<ConceptRecord> {
        self.read(session, |map| map.get(concept).cloned()).flatten()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}
