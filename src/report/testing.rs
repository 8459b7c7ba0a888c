//! In-memory doubles for the store, commit resolver and marker.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::io;
use std::sync::Mutex;

use crate::error::{CommitResolutionError, StoreError};
use crate::store::{NewSession, ResultRow, ResultStore};
use crate::utils::git::CommitResolver;
use crate::utils::marker::SessionMarker;

#[derive(Default)]
pub struct MemoryStore {
    sessions: Mutex<Vec<(String, NewSession)>>,
    results: Mutex<BTreeMap<(String, String), ResultRow>>,
    writes: Mutex<Vec<String>>,
    no_session_id: bool,
    session_error: Option<String>,
    result_error: Option<String>,
    fail_test: Option<String>,
}

impl MemoryStore {
    pub fn returning_no_id() -> Self {
        Self {
            no_session_id: true,
            ..Default::default()
        }
    }

    pub fn failing_sessions(message: &str) -> Self {
        Self {
            session_error: Some(message.to_string()),
            ..Default::default()
        }
    }

    pub fn failing_results(message: &str) -> Self {
        Self {
            result_error: Some(message.to_string()),
            ..Default::default()
        }
    }

    /// Fail only writes for the given test name
    pub fn failing_test(test_name: &str) -> Self {
        Self {
            fail_test: Some(test_name.to_string()),
            ..Default::default()
        }
    }

    pub fn sessions(&self) -> Vec<(String, NewSession)> {
        self.sessions.lock().unwrap().clone()
    }

    pub fn result(&self, session_id: &str, test_name: &str) -> Option<ResultRow> {
        self.results
            .lock()
            .unwrap()
            .get(&(session_id.to_string(), test_name.to_string()))
            .cloned()
    }

    pub fn result_count(&self) -> usize {
        self.results.lock().unwrap().len()
    }

    /// Test names in the order their upserts reached the store
    pub fn writes(&self) -> Vec<String> {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl ResultStore for MemoryStore {
    async fn insert_session(&self, session: &NewSession) -> Result<Option<String>, StoreError> {
        if let Some(message) = &self.session_error {
            return Err(StoreError::Unavailable(message.clone()));
        }
        if self.no_session_id {
            return Ok(None);
        }

        let id = uuid::Uuid::new_v4().to_string();
        self.sessions
            .lock()
            .unwrap()
            .push((id.clone(), session.clone()));
        Ok(Some(id))
    }

    async fn upsert_result(&self, row: &ResultRow) -> Result<(), StoreError> {
        self.writes.lock().unwrap().push(row.test_name.clone());

        if let Some(message) = &self.result_error {
            return Err(StoreError::Unavailable(message.clone()));
        }
        if self.fail_test.as_deref() == Some(row.test_name.as_str()) {
            return Err(StoreError::Unavailable(format!("rejected {}", row.test_name)));
        }

        self.results.lock().unwrap().insert(
            (row.session_id.clone(), row.test_name.clone()),
            row.clone(),
        );
        Ok(())
    }
}

pub struct StaticResolver(Option<String>);

impl StaticResolver {
    pub fn ok(commit: &str) -> Self {
        Self(Some(commit.to_string()))
    }

    pub fn failing() -> Self {
        Self(None)
    }
}

#[async_trait]
impl CommitResolver for StaticResolver {
    async fn resolve(&self) -> Result<String, CommitResolutionError> {
        self.0.clone().ok_or(CommitResolutionError::EmptyRevision)
    }
}

#[derive(Default)]
pub struct MemoryMarker {
    value: Mutex<Option<String>>,
    fail: bool,
}

impl MemoryMarker {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn value(&self) -> Option<String> {
        self.value.lock().unwrap().clone()
    }
}

#[async_trait]
impl SessionMarker for MemoryMarker {
    async fn write(&self, session_id: &str) -> io::Result<()> {
        if self.fail {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"));
        }
        *self.value.lock().unwrap() = Some(session_id.to_string());
        Ok(())
    }
}
