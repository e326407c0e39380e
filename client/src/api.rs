//! Typed client for the Connect API
//!
//! Every call goes through [`ApiClient::execute`], which attaches the
//! current access token and, when the server answers 401, performs exactly
//! one silent refresh and replays the call once. If that refresh fails the
//! stored session is cleared and the original 401 is returned. Session
//! endpoints are never retried, so a rejected refresh cannot loop.

use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use cn_core::domain::entities::post::{CommentView, MediaRef, PostView};
use cn_core::domain::entities::token::AccessToken;
use cn_core::domain::entities::user::{User, UserSummary};
use cn_core::services::IssuedSession;
use cn_shared::MessageResponse;

use crate::error::{ClientError, ClientResult};
use crate::store::SessionStore;
use crate::transport::{ApiRequest, ApiResponse, HttpTransport};

const LOGIN_PATH: &str = "/api/auth/login";
const SIGNUP_PATH: &str = "/api/auth/signup";
const REFRESH_PATH: &str = "/api/auth/refresh";
const LOGOUT_PATH: &str = "/api/auth/logout";
const LOGOUT_ALL_PATH: &str = "/api/auth/logout-all";

/// Likers of a post after a toggle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Likes {
    pub post_id: Uuid,
    pub likes: Vec<Uuid>,
}

/// Fields to change on the caller's own profile
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileEdit {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profession: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LogoutAllResponse {
    revoked: u64,
}

/// API client bound to one session
pub struct ApiClient<T: HttpTransport> {
    transport: T,
    session: SessionStore,
    refresh_lock: Mutex<()>,
}

impl<T: HttpTransport> ApiClient<T> {
    pub fn new(transport: T, session: SessionStore) -> Self {
        Self {
            transport,
            session,
            refresh_lock: Mutex::new(()),
        }
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Signed-in user, if any
    pub fn current_user(&self) -> Option<UserSummary> {
        self.session.user()
    }

    // --- Session ---------------------------------------------------------

    pub async fn login(&self, email: &str, password: &str) -> ClientResult<UserSummary> {
        let request = ApiRequest::post(LOGIN_PATH).json(json!({ "email": email, "password": password }));
        let session: IssuedSession = self.transport.send(request).await?.into_json()?;

        self.session.set_session(&session)?;
        info!(user_id = %session.user.id, "Logged in");
        Ok(session.user)
    }

    /// Create an account; the new session is adopted immediately
    pub async fn signup(&self, name: &str, email: &str, password: &str) -> ClientResult<UserSummary> {
        let request = ApiRequest::post(SIGNUP_PATH).json(json!({
            "name": name,
            "email": email,
            "password": password,
        }));
        let session: IssuedSession = self.transport.send(request).await?.into_json()?;

        self.session.set_session(&session)?;
        info!(user_id = %session.user.id, "Signed up");
        Ok(session.user)
    }

    /// Rebuild the session at startup from the stored refresh token
    ///
    /// # Returns
    ///
    /// * `Ok(Some(user))` - Session restored
    /// * `Ok(None)` - Nothing stored, or the server rejected it (storage is cleared)
    /// * `Err(ClientError::Transport)` - Server unreachable; the stored token is kept
    pub async fn restore(&self) -> ClientResult<Option<UserSummary>> {
        if self.session.refresh_token()?.is_none() {
            return Ok(None);
        }

        match self.refresh_session().await {
            Ok(session) => Ok(Some(session.user)),
            Err(error @ ClientError::Http { .. }) => {
                debug!("Stored session rejected: {}", error);
                self.session.clear()?;
                Ok(None)
            }
            Err(error) => Err(error),
        }
    }

    /// End the session
    ///
    /// The server is told on a best-effort basis; local tokens are cleared
    /// whatever it answers.
    pub async fn logout(&self) -> ClientResult<()> {
        if let Ok(Some(refresh_token)) = self.session.refresh_token() {
            let request =
                ApiRequest::post(LOGOUT_PATH).json(json!({ "refresh_token": refresh_token.as_str() }));
            match self.transport.send(request).await {
                Ok(response) if response.is_success() => debug!("Server session revoked"),
                Ok(response) => debug!(status = response.status, "Logout not acknowledged"),
                Err(e) => debug!("Logout request failed: {}", e),
            }
        }

        self.session.clear()?;
        info!("Logged out");
        Ok(())
    }

    /// Revoke every session of the signed-in user, then clear locally
    pub async fn logout_everywhere(&self) -> ClientResult<u64> {
        let result = self
            .execute(ApiRequest::post(LOGOUT_ALL_PATH))
            .await
            .and_then(|response| response.into_json::<LogoutAllResponse>());

        self.session.clear()?;
        let revoked = result?.revoked;
        info!(revoked, "Logged out everywhere");
        Ok(revoked)
    }

    // --- Posts -----------------------------------------------------------

    pub async fn feed(&self) -> ClientResult<Vec<PostView>> {
        self.execute(ApiRequest::get("/api/posts")).await?.into_json()
    }

    pub async fn post(&self, post_id: Uuid) -> ClientResult<PostView> {
        self.execute(ApiRequest::get(format!("/api/posts/{}", post_id)))
            .await?
            .into_json()
    }

    pub async fn create_post(&self, text: &str, media: &[MediaRef]) -> ClientResult<PostView> {
        let request = ApiRequest::post("/api/posts").json(json!({ "text": text, "media": media }));
        self.execute(request).await?.into_json()
    }

    pub async fn edit_post(&self, post_id: Uuid, text: &str) -> ClientResult<PostView> {
        let request = ApiRequest::put(format!("/api/posts/{}", post_id)).json(json!({ "text": text }));
        self.execute(request).await?.into_json()
    }

    pub async fn delete_post(&self, post_id: Uuid) -> ClientResult<()> {
        self.execute(ApiRequest::delete(format!("/api/posts/{}", post_id)))
            .await?
            .into_json::<MessageResponse>()
            .map(|_| ())
    }

    pub async fn toggle_like(&self, post_id: Uuid) -> ClientResult<Likes> {
        self.execute(ApiRequest::post(format!("/api/posts/{}/like", post_id)))
            .await?
            .into_json()
    }

    pub async fn add_comment(&self, post_id: Uuid, text: &str) -> ClientResult<CommentView> {
        let request =
            ApiRequest::post(format!("/api/posts/{}/comments", post_id)).json(json!({ "text": text }));
        self.execute(request).await?.into_json()
    }

    pub async fn delete_comment(&self, post_id: Uuid, comment_id: Uuid) -> ClientResult<()> {
        self.execute(ApiRequest::delete(format!(
            "/api/posts/{}/comments/{}",
            post_id, comment_id
        )))
        .await?
        .into_json::<MessageResponse>()
        .map(|_| ())
    }

    // --- Profiles --------------------------------------------------------

    pub async fn profile(&self, user_id: Uuid) -> ClientResult<User> {
        self.execute(ApiRequest::get(format!("/api/users/{}", user_id)))
            .await?
            .into_json()
    }

    pub async fn me(&self) -> ClientResult<User> {
        self.execute(ApiRequest::get("/api/users/me")).await?.into_json()
    }

    pub async fn update_me(&self, edit: &ProfileEdit) -> ClientResult<User> {
        let request = ApiRequest::put("/api/users/me").json(serde_json::to_value(edit)?);
        self.execute(request).await?.into_json()
    }

    // --- Pipeline --------------------------------------------------------

    /// Send with the current access token, refreshing and replaying once on 401
    pub async fn execute(&self, request: ApiRequest) -> ClientResult<ApiResponse> {
        let (response, presented) = self.send_with_token(request.clone()).await?;
        if response.status != 401 {
            return Ok(response);
        }

        let original = response.into_error();
        if let Err(refresh_error) = self.refresh_after(presented.as_ref()).await {
            debug!(path = %request.path, "Silent refresh failed: {}", refresh_error);
            if let Err(e) = self.session.clear() {
                warn!("Failed to clear stored session: {}", e);
            }
            return Err(original);
        }

        // Replayed once; a second 401 is returned as is.
        let (replayed, _) = self.send_with_token(request).await?;
        Ok(replayed)
    }

    async fn send_with_token(&self, mut request: ApiRequest) -> ClientResult<(ApiResponse, Option<AccessToken>)> {
        let token = self.session.access_token();
        request.bearer = token.clone();
        let response = self.transport.send(request).await?;
        Ok((response, token))
    }

    /// Refresh unless another call already did since `presented` was sent
    async fn refresh_after(&self, presented: Option<&AccessToken>) -> ClientResult<()> {
        let _guard = self.refresh_lock.lock().await;

        if let Some(current) = self.session.access_token() {
            if presented != Some(&current) {
                debug!("Session already refreshed by a concurrent call");
                return Ok(());
            }
        }

        self.refresh_session().await.map(|_| ())
    }

    async fn refresh_session(&self) -> ClientResult<IssuedSession> {
        let refresh_token = self.session.refresh_token()?.ok_or(ClientError::NotAuthenticated)?;

        let request = ApiRequest::post(REFRESH_PATH).json(json!({ "refresh_token": refresh_token.as_str() }));
        let session: IssuedSession = self.transport.send(request).await?.into_json()?;

        self.session.set_session(&session)?;
        debug!(user_id = %session.user.id, "Session refreshed");
        Ok(session)
    }
}
