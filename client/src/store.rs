//! Client-side session holder
//!
//! The access token lives only in memory and is lost with the process; the
//! refresh token goes through a [`RefreshTokenStorage`] so a restarted
//! client can restore its session with one refresh call.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use cn_core::domain::entities::token::{AccessToken, RefreshToken};
use cn_core::domain::entities::user::UserSummary;
use cn_core::services::{IssuedSession, SessionState};

use crate::error::ClientResult;

/// Durable home of the refresh token
pub trait RefreshTokenStorage: Send + Sync {
    /// Stored token, or `None` if there is none
    fn load(&self) -> ClientResult<Option<RefreshToken>>;

    fn save(&self, token: &RefreshToken) -> ClientResult<()>;

    /// Remove the stored token; clearing an empty store succeeds
    fn clear(&self) -> ClientResult<()>;
}

/// Keeps the refresh token in a single file
#[derive(Debug, Clone)]
pub struct FileTokenStorage {
    path: PathBuf,
}

impl FileTokenStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RefreshTokenStorage for FileTokenStorage {
    fn load(&self) -> ClientResult<Option<RefreshToken>> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => {
                let token = contents.trim();
                if token.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(RefreshToken::new(token)))
                }
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, token: &RefreshToken) -> ClientResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        // Staged then renamed; readers never see a partial token.
        let staging = self.path.with_extension("tmp");
        fs::write(&staging, token.as_str())?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&staging, fs::Permissions::from_mode(0o600))?;
        }
        fs::rename(&staging, &self.path)?;
        Ok(())
    }

    fn clear(&self) -> ClientResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Process-local storage, for tests and ephemeral clients
#[derive(Debug, Default)]
pub struct MemoryTokenStorage {
    token: Mutex<Option<RefreshToken>>,
}

impl MemoryTokenStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: RefreshToken) -> Self {
        Self {
            token: Mutex::new(Some(token)),
        }
    }
}

impl RefreshTokenStorage for MemoryTokenStorage {
    fn load(&self) -> ClientResult<Option<RefreshToken>> {
        Ok(self.token.lock().clone())
    }

    fn save(&self, token: &RefreshToken) -> ClientResult<()> {
        *self.token.lock() = Some(token.clone());
        Ok(())
    }

    fn clear(&self) -> ClientResult<()> {
        *self.token.lock() = None;
        Ok(())
    }
}

/// Current session of one client
///
/// The in-memory half is a [`SessionState`]; login, refresh and restore move
/// it to `Authenticated`, logout and a rejected refresh back to `Anonymous`.
pub struct SessionStore {
    state: RwLock<SessionState>,
    storage: Arc<dyn RefreshTokenStorage>,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn RefreshTokenStorage>) -> Self {
        Self {
            state: RwLock::new(SessionState::Anonymous),
            storage,
        }
    }

    /// Store with an in-memory refresh token slot
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryTokenStorage::new()))
    }

    /// Snapshot of the current state
    pub fn state(&self) -> SessionState {
        self.state.read().clone()
    }

    pub fn access_token(&self) -> Option<AccessToken> {
        self.state.read().access_token().cloned()
    }

    pub fn user(&self) -> Option<UserSummary> {
        self.state.read().user().cloned()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.read().is_authenticated()
    }

    pub fn refresh_token(&self) -> ClientResult<Option<RefreshToken>> {
        self.storage.load()
    }

    /// Adopt a freshly issued session, replacing any previous one
    pub fn set_session(&self, session: &IssuedSession) -> ClientResult<()> {
        self.storage.save(&session.refresh_token)?;
        *self.state.write() = SessionState::signed_in(session);
        Ok(())
    }

    /// Forget everything, including the persisted refresh token
    ///
    /// The in-memory half is always cleared, even if storage fails.
    pub fn clear(&self) -> ClientResult<()> {
        *self.state.write() = SessionState::Anonymous;
        self.storage.clear()
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("state", &*self.state.read())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cn_core::domain::entities::token::TokenId;
    use cn_core::services::TokenCodec;
    use uuid::Uuid;

    fn issued(access: &str, refresh: &str) -> IssuedSession {
        IssuedSession {
            access_token: AccessToken::new(access),
            refresh_token: RefreshToken::new(refresh),
            user: UserSummary {
                id: Uuid::new_v4(),
                name: "Ada".to_string(),
                email: "a@x.com".to_string(),
                avatar_url: None,
            },
        }
    }

    #[test]
    fn test_session_round_trip_and_clear() {
        let store = SessionStore::in_memory();
        assert!(!store.is_authenticated());
        assert!(store.refresh_token().unwrap().is_none());

        store.set_session(&issued("a1", "r1")).unwrap();
        assert_eq!(store.access_token().unwrap().as_str(), "a1");
        assert_eq!(store.refresh_token().unwrap().unwrap().as_str(), "r1");
        assert_eq!(store.user().unwrap().email, "a@x.com");

        store.clear().unwrap();
        assert!(store.access_token().is_none());
        assert!(store.user().is_none());
        assert!(store.refresh_token().unwrap().is_none());
    }

    #[test]
    fn test_restart_keeps_only_refresh_token() {
        let storage: Arc<dyn RefreshTokenStorage> = Arc::new(MemoryTokenStorage::new());
        SessionStore::new(storage.clone())
            .set_session(&issued("a1", "r1"))
            .unwrap();

        let restarted = SessionStore::new(storage);
        assert!(restarted.access_token().is_none());
        assert_eq!(restarted.refresh_token().unwrap().unwrap().as_str(), "r1");
    }

    #[test]
    fn test_file_storage() {
        let dir = std::env::temp_dir().join(format!("cn-client-{}", Uuid::new_v4()));
        let storage = FileTokenStorage::new(dir.join("session").join("refresh_token"));

        assert!(storage.load().unwrap().is_none());
        storage.save(&RefreshToken::new("r1")).unwrap();
        storage.save(&RefreshToken::new("r2")).unwrap();
        assert_eq!(storage.load().unwrap().unwrap().as_str(), "r2");

        storage.clear().unwrap();
        storage.clear().unwrap();
        assert!(storage.load().unwrap().is_none());

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_state_tracks_refresh_token_id() {
        let codec = TokenCodec::new(Default::default());
        let first = TokenId::generate();
        let mut session = issued("a1", "unused");
        session.refresh_token = codec.issue_refresh(session.user.id, &first).unwrap();

        let store = SessionStore::in_memory();
        store.set_session(&session).unwrap();
        assert_eq!(store.state().token_id(), Some(&first));

        let second = TokenId::generate();
        session.refresh_token = codec.issue_refresh(session.user.id, &second).unwrap();
        store.set_session(&session).unwrap();
        assert_eq!(store.state().token_id(), Some(&second));

        store.clear().unwrap();
        assert_eq!(store.state(), SessionState::Anonymous);
    }

    #[test]
    fn test_opaque_refresh_token_still_authenticates() {
        let store = SessionStore::in_memory();
        store.set_session(&issued("a1", "opaque")).unwrap();
        assert!(store.is_authenticated());
        assert!(store.state().token_id().is_none());
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let store = SessionStore::in_memory();
        store.set_session(&issued("secret-access", "secret-refresh")).unwrap();
        let rendered = format!("{:?}", store);
        assert!(!rendered.contains("secret-access"));
    }
}
