use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use super::{FieldValue, Session, SessionField, SessionId};
use crate::errors::SessionError;

/// Key/value state per session, created lazily on first access.
///
/// Implementations must keep sessions invisible to each other and tolerate
/// overlapping evaluations of the same session (last write wins per field).
pub trait SessionStore: Send + Sync {
    /// Return the handle for `id`, creating a default session if absent.
    fn get_or_create(&self, id: &SessionId) -> Result<SessionHandle, SessionError>;

    /// Read one field. Unknown sessions read every field as its default.
    fn get(&self, id: &SessionId, field: SessionField) -> Result<FieldValue, SessionError>;

    /// Write one field, creating the session if needed.
    fn set(
        &self,
        id: &SessionId,
        field: SessionField,
        value: FieldValue,
    ) -> Result<(), SessionError>;

    /// Copy of the whole record. Unknown sessions snapshot as defaults.
    fn snapshot(&self, id: &SessionId) -> Result<Session, SessionError>;

    fn contains(&self, id: &SessionId) -> Result<bool, SessionError>;

    fn len(&self) -> Result<usize, SessionError>;
}

/// Shared reference to one session record.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    id: SessionId,
    inner: Arc<Mutex<Session>>,
}

impl SessionHandle {
    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn get(&self, field: SessionField) -> Result<FieldValue, SessionError> {
        let session = self.inner.lock().map_err(|_| SessionError::LockPoisoned)?;
        Ok(session.get(field))
    }

    pub fn set(&self, field: SessionField, value: FieldValue) -> Result<(), SessionError> {
        let mut session = self.inner.lock().map_err(|_| SessionError::LockPoisoned)?;
        session.set(field, value)
    }

    /// Copy of the record as it is right now.
    pub fn snapshot(&self) -> Result<Session, SessionError> {
        let session = self.inner.lock().map_err(|_| SessionError::LockPoisoned)?;
        Ok(session.clone())
    }
}

/// Process-local session store.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<SessionId, Arc<Mutex<Session>>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn existing(&self, id: &SessionId) -> Result<Option<SessionHandle>, SessionError> {
        let sessions = self.sessions.read().map_err(|_| SessionError::LockPoisoned)?;
        Ok(sessions.get(id).map(|inner| SessionHandle {
            id: *id,
            inner: Arc::clone(inner),
        }))
    }
}

impl SessionStore for InMemorySessionStore {
    fn get_or_create(&self, id: &SessionId) -> Result<SessionHandle, SessionError> {
        if let Some(handle) = self.existing(id)? {
            return Ok(handle);
        }

        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| SessionError::LockPoisoned)?;
        // Another evaluation may have created it between the two locks.
        let inner = sessions.entry(*id).or_insert_with(|| {
            tracing::debug!(session = %id, "creating session");
            Arc::new(Mutex::new(Session::new(*id)))
        });
        Ok(SessionHandle {
            id: *id,
            inner: Arc::clone(inner),
        })
    }

    fn get(&self, id: &SessionId, field: SessionField) -> Result<FieldValue, SessionError> {
        match self.existing(id)? {
            Some(handle) => handle.get(field),
            None => Ok(Session::new(*id).get(field)),
        }
    }

    fn set(
        &self,
        id: &SessionId,
        field: SessionField,
        value: FieldValue,
    ) -> Result<(), SessionError> {
        self.get_or_create(id)?.set(field, value)
    }

    fn snapshot(&self, id: &SessionId) -> Result<Session, SessionError> {
        match self.existing(id)? {
            Some(handle) => handle.snapshot(),
            None => Ok(Session::new(*id)),
        }
    }

    fn contains(&self, id: &SessionId) -> Result<bool, SessionError> {
        Ok(self.existing(id)?.is_some())
    }

    fn len(&self) -> Result<usize, SessionError> {
        let sessions = self.sessions.read().map_err(|_| SessionError::LockPoisoned)?;
        Ok(sessions.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::thread;

    #[test]
    fn test_get_or_create_is_lazy_and_unique() {
        let store = InMemorySessionStore::new();
        let id = SessionId::new();
        assert!(!store.contains(&id).unwrap());

        let first = store.get_or_create(&id).unwrap();
        let second = store.get_or_create(&id).unwrap();
        assert_eq!(store.len().unwrap(), 1);

        first
            .set(SessionField::DetectConfirmed, FieldValue::Flag(true))
            .unwrap();
        assert!(second.get(SessionField::DetectConfirmed).unwrap().as_flag());
    }

    #[test]
    fn test_get_unknown_session_returns_defaults_without_creating() {
        let store = InMemorySessionStore::new();
        let id = SessionId::new();
        assert_eq!(
            store.get(&id, SessionField::DocumentSelection).unwrap(),
            FieldValue::Absent
        );
        assert_eq!(
            store.get(&id, SessionField::CleanConfirmed).unwrap(),
            FieldValue::Flag(false)
        );
        assert!(!store.contains(&id).unwrap());
    }

    #[test]
    fn test_sessions_are_isolated() {
        let store = InMemorySessionStore::new();
        let alice = SessionId::new();
        let bob = SessionId::new();

        store
            .set(
                &alice,
                SessionField::SignatureSelection,
                FieldValue::Path(PathBuf::from("refs/alice.png")),
            )
            .unwrap();

        assert_eq!(
            store.get(&bob, SessionField::SignatureSelection).unwrap(),
            FieldValue::Absent
        );
        assert!(!store.contains(&bob).unwrap());
    }

    #[test]
    fn test_state_survives_repeated_access() {
        let store = InMemorySessionStore::new();
        let id = SessionId::new();
        store
            .set(&id, SessionField::VerifyConfirmed, FieldValue::Flag(true))
            .unwrap();

        for _ in 0..10 {
            let handle = store.get_or_create(&id).unwrap();
            assert!(handle.snapshot().unwrap().verify_confirmed);
        }
    }

    #[test]
    fn test_concurrent_get_or_create_yields_one_session() {
        let store = Arc::new(InMemorySessionStore::new());
        let id = SessionId::new();

        let workers: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    store
                        .set(&id, SessionField::DetectConfirmed, FieldValue::Flag(true))
                        .unwrap();
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        assert_eq!(store.len().unwrap(), 1);
        assert!(store.get(&id, SessionField::DetectConfirmed).unwrap().as_flag());
    }
}
