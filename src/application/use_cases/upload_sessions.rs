//! Server-side hand-off between the preview request and the final render.
//!
//! Holds the uploaded URS, the template and the generated steps in memory
//! under an opaque id. Entries expire after a fixed TTL and are purged on
//! every access, so nothing is ever written to disk. The store holds at most
//! `max_sessions` entries; uploaded bytes are shared, not copied, on read.

use crate::domain::error::{AppError, Result};
use crate::domain::test_step::{validate_steps, TestStep};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct UploadSession {
    pub id: String,
    pub urs_file_name: String,
    pub urs_extension: String,
    pub urs_bytes: Arc<[u8]>,
    pub urs_text: String,
    pub template_bytes: Option<Arc<[u8]>>,
    pub test_steps: Vec<TestStep>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// What a client needs to resume a session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub urs_file_name: String,
    pub test_steps: Vec<TestStep>,
    pub expires_at: DateTime<Utc>,
}

impl From<&UploadSession> for SessionSummary {
    fn from(session: &UploadSession) -> Self {
        Self {
            session_id: session.id.clone(),
            urs_file_name: session.urs_file_name.clone(),
            test_steps: session.test_steps.clone(),
            expires_at: session.expires_at,
        }
    }
}

pub struct NewUpload {
    pub urs_file_name: String,
    pub urs_extension: String,
    pub urs_bytes: Arc<[u8]>,
    pub urs_text: String,
    pub template_bytes: Option<Arc<[u8]>>,
    pub test_steps: Vec<TestStep>,
}

pub struct UploadSessionStore {
    ttl: Duration,
    max_sessions: usize,
    sessions: Mutex<HashMap<String, UploadSession>>,
}

impl UploadSessionStore {
    pub fn new(ttl_secs: u64, max_sessions: usize) -> Self {
        Self {
            ttl: Duration::seconds(ttl_secs as i64),
            max_sessions,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn create(&self, upload: NewUpload) -> Result<SessionSummary> {
        self.create_at(upload, Utc::now())
    }

    pub fn get(&self, id: &str) -> Result<UploadSession> {
        self.get_at(id, Utc::now())
    }

    /// Replaces the steps after an explicit user edit.
    pub fn update_steps(&self, id: &str, steps: Vec<TestStep>) -> Result<SessionSummary> {
        self.update_steps_at(id, steps, Utc::now())
    }

    /// Removes and returns the session.
    pub fn take(&self, id: &str) -> Result<UploadSession> {
        let mut sessions = self.lock()?;
        purge(&mut sessions, Utc::now());
        sessions
            .remove(id)
            .ok_or_else(|| AppError::NotFound(format!("upload session '{}'", id)))
    }

    pub(crate) fn create_at(&self, upload: NewUpload, now: DateTime<Utc>) -> Result<SessionSummary> {
        let mut sessions = self.lock()?;
        purge(&mut sessions, now);
        if sessions.len() >= self.max_sessions {
            warn!(open = sessions.len(), "Upload session store is full");
            return Err(AppError::ValidationError(format!(
                "too many open upload sessions (limit {}), discard one or retry later",
                self.max_sessions
            )));
        }

        let session = UploadSession {
            id: Uuid::new_v4().to_string(),
            urs_file_name: upload.urs_file_name,
            urs_extension: upload.urs_extension,
            urs_bytes: upload.urs_bytes,
            urs_text: upload.urs_text,
            template_bytes: upload.template_bytes,
            test_steps: upload.test_steps,
            created_at: now,
            expires_at: now + self.ttl,
        };
        let summary = SessionSummary::from(&session);
        info!(session_id = %session.id, steps = session.test_steps.len(), "Opened upload session");
        sessions.insert(session.id.clone(), session);
        Ok(summary)
    }

    pub(crate) fn get_at(&self, id: &str, now: DateTime<Utc>) -> Result<UploadSession> {
        let mut sessions = self.lock()?;
        purge(&mut sessions, now);
        sessions
            .get(id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("upload session '{}'", id)))
    }

    pub(crate) fn update_steps_at(
        &self,
        id: &str,
        steps: Vec<TestStep>,
        now: DateTime<Utc>,
    ) -> Result<SessionSummary> {
        validate_steps(&steps)?;

        let mut sessions = self.lock()?;
        purge(&mut sessions, now);
        let session = sessions
            .get_mut(id)
            .ok_or_else(|| AppError::NotFound(format!("upload session '{}'", id)))?;
        session.test_steps = steps;
        debug!(session_id = %id, steps = session.test_steps.len(), "Updated session steps");
        Ok(SessionSummary::from(&*session))
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, UploadSession>>> {
        self.sessions
            .lock()
            .map_err(|_| AppError::Internal("upload session store is poisoned".to_string()))
    }
}

fn purge(sessions: &mut HashMap<String, UploadSession>, now: DateTime<Utc>) -> usize {
    let before = sessions.len();
    sessions.retain(|_, session| session.expires_at > now);
    let removed = before - sessions.len();
    if removed > 0 {
        debug!(removed, "Purged expired upload sessions");
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::test_step::step;

    fn upload() -> NewUpload {
        NewUpload {
            urs_file_name: "urs.txt".to_string(),
            urs_extension: "txt".to_string(),
            urs_bytes: Arc::from(&b"1. Login"[..]),
            urs_text: "1. Login".to_string(),
            template_bytes: None,
            test_steps: vec![step(1, "REQ-1", "Login", "User logs in")],
        }
    }

    #[test]
    fn sessions_expire_after_ttl() {
        let store = UploadSessionStore::new(60, 8);
        let start = Utc::now();
        let summary = store.create_at(upload(), start).unwrap();

        assert!(store.get_at(&summary.session_id, start + Duration::seconds(59)).is_ok());
        assert!(matches!(
            store.get_at(&summary.session_id, start + Duration::seconds(61)),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn edited_steps_replace_generated_ones() {
        let store = UploadSessionStore::new(600, 8);
        let summary = store.create(upload()).unwrap();

        let edited = vec![
            step(1, "REQ-1", "Login with SSO", "User logs in"),
            step(2, "REQ-2", "Logout", "Session ends"),
        ];
        store.update_steps(&summary.session_id, edited.clone()).unwrap();

        assert_eq!(store.get(&summary.session_id).unwrap().test_steps, edited);
    }

    #[test]
    fn invalid_edits_are_rejected_and_leave_session_intact() {
        let store = UploadSessionStore::new(600, 8);
        let summary = store.create(upload()).unwrap();

        let dupes = vec![step(1, "R1", "a", "b"), step(2, "R1", "c", "d")];
        assert!(store.update_steps(&summary.session_id, dupes).is_err());
        assert!(store
            .update_steps(&summary.session_id, vec![step(0, "R1", "a", "b")])
            .is_err());
        assert_eq!(store.get(&summary.session_id).unwrap().test_steps.len(), 1);
    }

    #[test]
    fn take_removes_session() {
        let store = UploadSessionStore::new(600, 8);
        let summary = store.create(upload()).unwrap();

        assert_eq!(store.take(&summary.session_id).unwrap().urs_text, "1. Login");
        assert!(matches!(
            store.take(&summary.session_id),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn full_store_rejects_until_a_session_expires() {
        let store = UploadSessionStore::new(60, 2);
        let start = Utc::now();
        store.create_at(upload(), start).unwrap();
        store.create_at(upload(), start + Duration::seconds(30)).unwrap();

        assert!(matches!(
            store.create_at(upload(), start + Duration::seconds(31)),
            Err(AppError::ValidationError(_))
        ));
        // The first session has expired by now, freeing a slot.
        assert!(store.create_at(upload(), start + Duration::seconds(61)).is_ok());
    }

    #[test]
    fn reads_share_uploaded_bytes() {
        let store = UploadSessionStore::new(600, 8);
        let mut new_upload = upload();
        new_upload.template_bytes = Some(Arc::from(&b"PK template"[..]));
        let summary = store.create(new_upload).unwrap();

        let first = store.get(&summary.session_id).unwrap();
        let second = store.get(&summary.session_id).unwrap();
        assert!(Arc::ptr_eq(&first.urs_bytes, &second.urs_bytes));
        assert!(Arc::ptr_eq(
            first.template_bytes.as_ref().unwrap(),
            second.template_bytes.as_ref().unwrap()
        ));
        assert_eq!(&*first.urs_bytes, b"1. Login");
    }
}
