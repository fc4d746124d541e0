//! HTTP service layer.
//!
//! The access token lives only in this object's memory; it is never written
//! to disk, so a process restart starts logged out and rehydrates through
//! the refresh cookie. The refresh path is single-flight: a generation
//! counter plus an async mutex guarantee at most one network refresh at a
//! time, and callers that arrive while one is in flight reuse its result.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{ClientError, SharedFailure};
use crate::types::{
    AuthUser, ErrorBody, ForgotPasswordRequest, LoginRequest, LoginResponse, MessageResponse,
    RegisterRequest, RegisterResponse, ResendOtpRequest, ResetPasswordRequest, VerifyOtpRequest,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Default)]
struct TokenCache {
    access: Mutex<Option<String>>,
    /// Bumped after every completed refresh, success or failure.
    generation: AtomicU64,
    last_refresh: Mutex<Option<Result<LoginResponse, SharedFailure>>>,
}

#[derive(Debug)]
pub struct AuthApi {
    http: reqwest::Client,
    base_url: String,
    tokens: TokenCache,
    refresh_gate: tokio::sync::Mutex<()>,
}

impl AuthApi {
    /// Builds a client for the API at `base_url`.
    ///
    /// The cookie store is what carries the httpOnly refresh/session
    /// cookies between calls, mirroring a browser.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }

        Ok(Self {
            http,
            base_url,
            tokens: TokenCache::default(),
            refresh_gate: tokio::sync::Mutex::new(()),
        })
    }

    /// The current in-memory access token, if any.
    pub fn access_token(&self) -> Option<String> {
        self.tokens.access.lock().unwrap().clone()
    }

    fn set_access_token(&self, token: Option<String>) {
        *self.tokens.access.lock().unwrap() = token;
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn register(&self, req: &RegisterRequest) -> Result<RegisterResponse, ClientError> {
        self.post_json("/api/user/register", req).await
    }

    pub async fn verify_otp(&self, req: &VerifyOtpRequest) -> Result<MessageResponse, ClientError> {
        self.post_json("/api/user/verify-otp", req).await
    }

    pub async fn resend_otp(&self, req: &ResendOtpRequest) -> Result<MessageResponse, ClientError> {
        self.post_json("/api/user/resend-otp", req).await
    }

    /// Logs in and caches the returned access token. The refresh credential
    /// arrives as an httpOnly cookie handled by the cookie store.
    pub async fn login(&self, req: &LoginRequest) -> Result<LoginResponse, ClientError> {
        let response: LoginResponse = self.post_json("/api/user/login", req).await?;
        self.set_access_token(Some(response.access_token.clone()));
        Ok(response)
    }

    pub async fn request_password_reset(
        &self,
        req: &ForgotPasswordRequest,
    ) -> Result<MessageResponse, ClientError> {
        self.post_json("/api/user/forgot-password", req).await
    }

    pub async fn reset_password(
        &self,
        req: &ResetPasswordRequest,
    ) -> Result<MessageResponse, ClientError> {
        self.post_json("/api/user/reset-password", req).await
    }

    /// Exchanges the session cookie for a fresh access token.
    ///
    /// Single-flight: whoever holds the gate performs the network call;
    /// callers that observed the old generation while waiting consume the
    /// stored outcome instead of issuing a duplicate request.
    pub async fn refresh_access_token(&self) -> Result<LoginResponse, ClientError> {
        let seen = self.tokens.generation.load(Ordering::Acquire);
        let _gate = self.refresh_gate.lock().await;

        if self.tokens.generation.load(Ordering::Acquire) != seen {
            let last = self.tokens.last_refresh.lock().unwrap().clone();
            if let Some(outcome) = last {
                tracing::debug!("reusing result of concurrent token refresh");
                return outcome.map_err(ClientError::from);
            }
        }

        let outcome = self.do_refresh().await;

        *self.tokens.last_refresh.lock().unwrap() = Some(match &outcome {
            Ok(session) => Ok(session.clone()),
            Err(err) => Err(SharedFailure::of(err)),
        });
        self.tokens.generation.fetch_add(1, Ordering::Release);

        outcome
    }

    async fn do_refresh(&self) -> Result<LoginResponse, ClientError> {
        let res = self.http.post(self.url("/api/auth/refresh")).send().await?;
        let session: LoginResponse = handle_response(res).await?;
        self.set_access_token(Some(session.access_token.clone()));
        Ok(session)
    }

    /// Logs out: the local token is dropped immediately so the session is
    /// gone on this side even if the network call fails.
    pub async fn logout(&self) -> Result<MessageResponse, ClientError> {
        self.set_access_token(None);
        *self.tokens.last_refresh.lock().unwrap() = None;

        let res = self.http.post(self.url("/api/auth/logout")).send().await?;
        handle_response(res).await
    }

    /// Current user, via the protected profile endpoint.
    pub async fn me(&self) -> Result<AuthUser, ClientError> {
        self.authenticated_get("/api/user/me").await
    }

    /// GET with Bearer authentication.
    ///
    /// An empty token cache is rehydrated through the refresh cookie first;
    /// a 401 response triggers one refresh and one retry, then the failure
    /// propagates so the caller can route to login.
    pub async fn authenticated_get<T: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<T, ClientError> {
        if self.access_token().is_none() {
            // Best effort: a failed rehydrate just means the request goes
            // out unauthenticated and the 401 path below decides.
            let _ = self.refresh_access_token().await;
        }

        let res = self.send_authenticated(path).await?;

        if res.status() == reqwest::StatusCode::UNAUTHORIZED {
            tracing::debug!(path, "access token rejected, refreshing and retrying once");
            self.refresh_access_token().await?;
            let retry = self.send_authenticated(path).await?;
            return handle_response(retry).await;
        }

        handle_response(res).await
    }

    async fn send_authenticated(&self, path: &str) -> Result<reqwest::Response, ClientError> {
        let mut request = self.http.get(self.url(path));
        if let Some(token) = self.access_token() {
            request = request.bearer_auth(token);
        }
        Ok(request.send().await?)
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let res = self.http.post(self.url(path)).json(body).send().await?;
        handle_response(res).await
    }
}

/// Reads the body once and splits on status: 2xx parses as `T`, anything
/// else becomes [`ClientError::Api`] with the server's message when one
/// was provided.
async fn handle_response<T: DeserializeOwned>(res: reqwest::Response) -> Result<T, ClientError> {
    let status = res.status();
    let text = res.text().await?;

    if !status.is_success() {
        let message = serde_json::from_str::<ErrorBody>(&text)
            .map(|body| body.error)
            .unwrap_or_else(|_| "Request failed".to_string());
        return Err(ClientError::Api {
            status: status.as_u16(),
            message,
        });
    }

    Ok(serde_json::from_str(&text)?)
}
