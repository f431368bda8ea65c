// File: ./src/session.rs
/*! Credentials and identity of the logged-in user.

`SessionStore` is the one owner of the tokens. The HTTP client reads the
access token from it for every request, the auth layer writes a refreshed
access token back into it, and it is the only place that forgets the
credentials (`invalidate`). Clones share the same state.
*/

use crate::context::AppContext;
use crate::model::{Role, UserId};
use crate::storage::FileStore;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Response of the token endpoints.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access: String,
    #[serde(default)]
    pub refresh: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub is_staff: bool,
}

impl Session {
    pub fn is_teacher(&self) -> bool {
        self.role == Some(Role::Teacher)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("role", &self.role)
            .field("username", &self.username)
            .field("user_id", &self.user_id)
            .field("is_staff", &self.is_staff)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<Option<Session>>>,
    persist_path: Option<PathBuf>,
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStore")
            .field("session", &*self.read())
            .field("persist_path", &self.persist_path)
            .finish()
    }
}

impl SessionStore {
    /// A store that never touches the disk.
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn with_session(session: Session) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Some(session))),
            persist_path: None,
        }
    }

    /// A store backed by `session.json` in the data directory. An existing
    /// file is loaded; an unreadable one is discarded.
    pub fn persistent(ctx: &dyn AppContext) -> Result<Self> {
        let path = ctx.get_session_path()?;
        let existing = match FileStore::load_json::<Session>(&path) {
            Ok(s) => s,
            Err(e) => {
                log::warn!("Discarding unreadable session file: {:#}", e);
                None
            }
        };
        Ok(Self {
            inner: Arc::new(RwLock::new(existing)),
            persist_path: Some(path),
        })
    }

    fn read(&self) -> RwLockReadGuard<'_, Option<Session>> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Option<Session>> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn persist(&self, session: &Option<Session>) {
        let Some(path) = &self.persist_path else {
            return;
        };
        let result = match session {
            Some(s) => FileStore::save_json(path, s),
            None => FileStore::remove(path),
        };
        if let Err(e) = result {
            log::warn!("Could not persist session to {}: {:#}", path.display(), e);
        }
    }

    pub fn current(&self) -> Option<Session> {
        self.read().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.read().is_some()
    }

    pub fn access_token(&self) -> Option<String> {
        self.read().as_ref().map(|s| s.access.clone())
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.read().as_ref().and_then(|s| s.refresh.clone())
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.read().as_ref().and_then(|s| s.user_id)
    }

    pub fn role(&self) -> Option<Role> {
        self.read().as_ref().and_then(|s| s.role)
    }

    /// Installs a freshly issued session (after a login).
    pub fn replace(&self, session: Session) {
        let snapshot = {
            let mut guard = self.write();
            *guard = Some(session);
            guard.clone()
        };
        self.persist(&snapshot);
    }

    /// Swaps in a refreshed access token. No-op when logged out.
    pub fn update_access(&self, access: String) {
        let snapshot = {
            let mut guard = self.write();
            match guard.as_mut() {
                Some(s) => s.access = access,
                None => return,
            }
            guard.clone()
        };
        self.persist(&snapshot);
    }

    /// Drops every credential, in memory and on disk.
    pub fn invalidate(&self) {
        {
            let mut guard = self.write();
            *guard = None;
        }
        log::info!("Session invalidated");
        self.persist(&None);
    }
}
