// Copyright (c) 2025 Campus Advisor
// SPDX-License-Identifier: BUSL-1.1

//! Session store: the single source of truth for conversation history.
//!
//! Sessions are keyed by id and wrapped in a per-session mutex, so two
//! concurrent appends to the same session can never interleave mid-update.
//! History is a bounded FIFO; idle sessions are evicted by the cleanup
//! sweep. Router and specialists read and append through the store only —
//! they never hold independent copies.

pub mod profile;

use crate::config::SessionStoreConfig;
use crate::domain::Domain;
use crate::errors::AdvisorError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};
use uuid::Uuid;

pub use profile::StudentProfile;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interaction {
    pub query: String,
    pub answer: String,
    pub domains: Vec<Domain>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    history: VecDeque<Interaction>,
    pub profile: StudentProfile,
}

impl Session {
    fn new(session_id: String, now: DateTime<Utc>) -> Self {
        Self {
            session_id,
            created_at: now,
            last_activity: now,
            history: VecDeque::new(),
            profile: StudentProfile::default(),
        }
    }

    pub fn history(&self) -> impl Iterator<Item = &Interaction> {
        self.history.iter()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    fn append(&mut self, interaction: Interaction, max_history: usize) {
        self.profile.observe(&interaction.query, &interaction.domains);
        self.last_activity = interaction.timestamp;
        self.history.push_back(interaction);
        while self.history.len() > max_history {
            self.history.pop_front();
        }
    }

    fn is_idle(&self, now: DateTime<Utc>, idle_timeout: chrono::Duration) -> bool {
        now - self.last_activity > idle_timeout
    }
}

pub struct SessionStore {
    config: SessionStoreConfig,
    sessions: RwLock<HashMap<String, Arc<Mutex<Session>>>>,
    appends_since_save: AtomicUsize,
}

impl SessionStore {
    pub fn new(config: SessionStoreConfig) -> Self {
        Self {
            config,
            sessions: RwLock::new(HashMap::new()),
            appends_since_save: AtomicUsize::new(0),
        }
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Returns the session for `session_id`, creating it on first contact.
    /// `None` generates a fresh id. The returned id is always valid for
    /// subsequent `append` calls.
    pub async fn get_or_create(&self, session_id: Option<&str>) -> Result<String, AdvisorError> {
        let id = session_id
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        {
            let sessions = self.sessions.read().await;
            if sessions.contains_key(&id) {
                return Ok(id);
            }
            if sessions.len() >= self.config.max_sessions {
                return Err(AdvisorError::SessionCapacity {
                    limit: self.config.max_sessions,
                });
            }
        }

        let mut sessions = self.sessions.write().await;
        if !sessions.contains_key(&id) {
            if sessions.len() >= self.config.max_sessions {
                return Err(AdvisorError::SessionCapacity {
                    limit: self.config.max_sessions,
                });
            }
            sessions.insert(
                id.clone(),
                Arc::new(Mutex::new(Session::new(id.clone(), Utc::now()))),
            );
        }
        Ok(id)
    }

    /// Appends one interaction; serialized per session by the session mutex.
    pub async fn append(
        &self,
        session_id: &str,
        query: &str,
        answer: &str,
        domains: &[Domain],
    ) -> Result<(), AdvisorError> {
        let session = {
            let sessions = self.sessions.read().await;
            sessions.get(session_id).cloned()
        };
        let Some(session) = session else {
            return Err(AdvisorError::SessionPersistence(format!(
                "unknown session {}",
                session_id
            )));
        };

        session.lock().await.append(
            Interaction {
                query: query.to_string(),
                answer: answer.to_string(),
                domains: domains.to_vec(),
                timestamp: Utc::now(),
            },
            self.config.max_history,
        );

        if self.config.autosave_every > 0 {
            let appends = self.appends_since_save.fetch_add(1, Ordering::SeqCst) + 1;
            if appends % self.config.autosave_every == 0 {
                if let Err(e) = self.save_to_disk().await {
                    warn!(error = %e, "session autosave failed");
                }
            }
        }
        Ok(())
    }

    /// Derived profile summary for prompt enrichment; `None` for unknown or
    /// fresh sessions with nothing to summarize.
    pub async fn context_summary(&self, session_id: &str) -> Option<String> {
        let session = {
            let sessions = self.sessions.read().await;
            sessions.get(session_id).cloned()
        }?;
        let session = session.lock().await;
        session.profile.context_summary()
    }

    pub async fn history_len(&self, session_id: &str) -> usize {
        let session = {
            let sessions = self.sessions.read().await;
            sessions.get(session_id).cloned()
        };
        match session {
            Some(session) => session.lock().await.history_len(),
            None => 0,
        }
    }

    /// Evicts sessions idle past the configured timeout. Returns the count.
    pub async fn evict_if_idle(&self, now: DateTime<Utc>) -> usize {
        let idle_timeout = chrono::Duration::from_std(self.config.idle_timeout)
            .unwrap_or_else(|_| chrono::Duration::hours(24));

        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        let mut keep = HashMap::with_capacity(before);
        for (id, session) in sessions.drain() {
            let idle = session.lock().await.is_idle(now, idle_timeout);
            if !idle {
                keep.insert(id, session);
            }
        }
        *sessions = keep;
        let evicted = before - sessions.len();
        if evicted > 0 {
            info!(evicted, "idle sessions evicted");
        }
        evicted
    }

    /// Writes all sessions as JSON, temp-file + rename. No-op without a
    /// configured persist path.
    pub async fn save_to_disk(&self) -> Result<(), AdvisorError> {
        let Some(path) = &self.config.persist_path else {
            return Ok(());
        };

        let sessions = self.sessions.read().await;
        let mut snapshot: Vec<Session> = Vec::with_capacity(sessions.len());
        for session in sessions.values() {
            snapshot.push(session.lock().await.clone());
        }
        drop(sessions);

        let json = serde_json::to_string_pretty(&snapshot)
            .map_err(|e| AdvisorError::SessionPersistence(e.to_string()))?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| AdvisorError::SessionPersistence(e.to_string()))?;
        fs::rename(&tmp, path).map_err(|e| AdvisorError::SessionPersistence(e.to_string()))?;

        info!(path = %path.display(), sessions = snapshot.len(), "sessions saved");
        Ok(())
    }

    /// Loads persisted sessions; missing file is a clean start, not an
    /// error. Returns the number of sessions restored.
    pub async fn load_from_disk(&self) -> Result<usize, AdvisorError> {
        let Some(path) = &self.config.persist_path else {
            return Ok(0);
        };
        if !path.exists() {
            return Ok(0);
        }

        let json =
            fs::read_to_string(path).map_err(|e| AdvisorError::SessionPersistence(e.to_string()))?;
        let snapshot: Vec<Session> = serde_json::from_str(&json)
            .map_err(|e| AdvisorError::SessionPersistence(e.to_string()))?;

        let mut sessions = self.sessions.write().await;
        sessions.clear();
        let count = snapshot.len();
        for session in snapshot {
            sessions.insert(session.session_id.clone(), Arc::new(Mutex::new(session)));
        }

        info!(path = %path.display(), sessions = count, "sessions restored");
        Ok(count)
    }
}
