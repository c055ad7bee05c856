//! Authenticated client for the club REST API.
//!
//! Every request carries `Authorization: Bearer <access token>` from the
//! [`Session`]. A 401 triggers one credential refresh, shared by every
//! request that fails while it is running, and a single replay of the
//! original request.

use clubhouse_common::create_client;
use clubhouse_common::models::RefreshResponse;
use clubhouse_config::models::ApiConfig;
use futures::future::{BoxFuture, FutureExt, Shared};
use http::header::{HeaderValue, AUTHORIZATION};
use reqwest::multipart::{Form, Part};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex, Weak};
use tracing::{debug, error, info, instrument, warn};
use url::Url;

use crate::error::{ApiError, RefreshFailure, UnauthorizedReason};
use crate::request::{FormPart, PendingRequest, RequestBody};
use crate::session::{Session, SessionPhase};

/// Path of the token refresh endpoint, relative to the API base URL.
pub const REFRESH_PATH: &str = "api/auth/token/refresh/";

type RefreshFuture = Shared<BoxFuture<'static, Result<String, RefreshFailure>>>;

struct ClientInner {
    http: reqwest::Client,
    base_url: Url,
    session: Arc<Session>,
    /// The refresh currently in flight, if any.
    refresh: Mutex<Option<RefreshFuture>>,
}

/// Cheap to clone; clones share the session and the refresh slot.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ClientInner>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("session", &self.inner.session)
            .finish()
    }
}

impl ApiClient {
    pub fn new(config: &ApiConfig, session: Arc<Session>) -> Result<Self, ApiError> {
        let http = create_client(config)?;
        Self::with_http_client(http, &config.normalized_base_url(), session)
    }

    pub fn with_http_client(
        http: reqwest::Client,
        base_url: &str,
        session: Arc<Session>,
    ) -> Result<Self, ApiError> {
        let mut base_url = Url::parse(base_url)
            .map_err(|e| ApiError::InvalidRequest(format!("invalid base URL {base_url}: {e}")))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        debug!("club API client targeting {}", base_url);
        Ok(Self {
            inner: Arc::new(ClientInner {
                http,
                base_url,
                session,
                refresh: Mutex::new(None),
            }),
        })
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.inner.session
    }

    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Sends `request` and returns the successful response.
    ///
    /// Non-2xx answers become [`ApiError::Status`]; a 401 that the refresh
    /// cannot fix becomes [`ApiError::Unauthorized`].
    #[instrument(skip(self, request), fields(request_id = %request.id(), method = %request.method(), path = %request.path()))]
    pub async fn send(&self, mut request: PendingRequest) -> Result<Response, ApiError> {
        let sent_with = self.inner.session.access_token();
        let response = self.dispatch(&request, sent_with.as_deref()).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return ensure_success(response).await;
        }

        let payload = read_payload(response).await;
        if let Some(reason) = self.refusal_reason(&request) {
            debug!("401 not eligible for refresh: {}", reason);
            if reason == UnauthorizedReason::NoRefreshToken && sent_with.is_some() {
                self.inner
                    .session
                    .set_phase(SessionPhase::AuthenticationExpired);
            }
            return Err(ApiError::Unauthorized { payload, reason });
        }
        request.mark_retried();

        // Another request may have refreshed while this one was in flight.
        let current = self.inner.session.access_token();
        let token = match current.filter(|t| sent_with.as_deref() != Some(t.as_str())) {
            Some(newer) => {
                debug!("replaying with the token stored since dispatch");
                newer
            }
            None => match self.refreshed_access_token().await {
                Ok(token) => token,
                Err(failure) => {
                    return Err(ApiError::Unauthorized {
                        payload,
                        reason: UnauthorizedReason::RefreshFailed(failure),
                    });
                }
            },
        };

        let replay = self.dispatch(&request, Some(&token)).await?;
        if replay.status() == StatusCode::UNAUTHORIZED {
            warn!("request rejected again after credential refresh");
            self.inner
                .session
                .set_phase(SessionPhase::AuthenticationExpired);
            return Err(ApiError::Unauthorized {
                payload: read_payload(replay).await,
                reason: UnauthorizedReason::RejectedAfterRefresh,
            });
        }
        ensure_success(replay).await
    }

    pub async fn send_json<T: DeserializeOwned>(&self, request: PendingRequest) -> Result<T, ApiError> {
        let response = self.send(request).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send_json(PendingRequest::get(path)).await
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(PendingRequest::post(path).json(body)?).await
    }

    pub async fn put_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(PendingRequest::put(path).json(body)?).await
    }

    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.send(PendingRequest::delete(path)).await?;
        Ok(())
    }

    fn refusal_reason(&self, request: &PendingRequest) -> Option<UnauthorizedReason> {
        if request.is_retried() {
            Some(UnauthorizedReason::RejectedAfterRefresh)
        } else if is_refresh_path(request.path()) {
            Some(UnauthorizedReason::RefreshEndpoint)
        } else if self.inner.session.refresh_token().is_none() {
            Some(UnauthorizedReason::NoRefreshToken)
        } else {
            None
        }
    }

    async fn dispatch(
        &self,
        request: &PendingRequest,
        token: Option<&str>,
    ) -> Result<Response, ApiError> {
        let mut url = self.inner.url_for(request.path())?;
        url.set_query(request.query.as_deref());

        let mut headers = request.headers.clone();
        headers.remove(AUTHORIZATION);
        if let Some(token) = token {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| ApiError::InvalidRequest(format!("unusable access token: {e}")))?;
            headers.insert(AUTHORIZATION, value);
        }

        let builder = self
            .inner
            .http
            .request(request.method.clone(), url)
            .headers(headers);
        let builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(body) => builder.json(body),
            RequestBody::Multipart(parts) => builder.multipart(build_form(parts)?),
        };

        debug!(retried = request.is_retried(), "dispatching");
        builder.send().await.map_err(|e| {
            error!("club API transport failure: {}", e);
            ApiError::Transport(e)
        })
    }

    /// Joins the refresh in flight or starts one.
    async fn refreshed_access_token(&self) -> Result<String, RefreshFailure> {
        let refresh = {
            let mut slot = self
                .inner
                .refresh
                .lock()
                .map_err(|_| RefreshFailure::Storage("refresh slot poisoned".to_string()))?;
            match slot.as_ref() {
                Some(in_flight) => {
                    debug!("joining in-flight credential refresh");
                    in_flight.clone()
                }
                None => {
                    let job = RefreshJob {
                        http: self.inner.http.clone(),
                        url: self
                            .inner
                            .url_for(REFRESH_PATH)
                            .map_err(|e| RefreshFailure::Transport(e.to_string()))?,
                        session: Arc::clone(&self.inner.session),
                        owner: Arc::downgrade(&self.inner),
                    };
                    let started = refresh_credentials(job).boxed().shared();
                    *slot = Some(started.clone());
                    started
                }
            }
        };
        refresh.await
    }
}

impl ClientInner {
    fn url_for(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ApiError::InvalidRequest(format!("invalid path {path}: {e}")))
    }
}

/// Everything a refresh needs. The future lives in the client's own slot,
/// so it reaches back to the client only through a weak handle.
struct RefreshJob {
    http: reqwest::Client,
    url: Url,
    session: Arc<Session>,
    owner: Weak<ClientInner>,
}

/// The body of the shared refresh. It empties the slot itself once settled
/// so the next 401 starts a fresh refresh.
async fn refresh_credentials(job: RefreshJob) -> Result<String, RefreshFailure> {
    job.session.set_phase(SessionPhase::RefreshInFlight);
    info!("refreshing access token");

    let result = request_access_token(&job).await;
    match &result {
        Ok(_) => info!("access token refreshed"),
        Err(failure) => {
            warn!("credential refresh failed: {}", failure);
            job.session.set_phase(SessionPhase::AuthenticationExpired);
        }
    }

    if let Some(inner) = job.owner.upgrade() {
        if let Ok(mut slot) = inner.refresh.lock() {
            slot.take();
        }
    }
    result
}

async fn request_access_token(job: &RefreshJob) -> Result<String, RefreshFailure> {
    let refresh_token = job
        .session
        .refresh_token()
        .ok_or(RefreshFailure::MissingRefreshToken)?;

    let response = job
        .http
        .post(job.url.clone())
        .json(&json!({ "refresh": refresh_token }))
        .send()
        .await
        .map_err(|e| RefreshFailure::Transport(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(RefreshFailure::Rejected(status.as_u16()));
    }

    let body: RefreshResponse = response
        .json()
        .await
        .map_err(|e| RefreshFailure::Transport(e.to_string()))?;
    let access = body
        .access
        .filter(|token| !token.is_empty())
        .ok_or(RefreshFailure::MissingAccessToken)?;

    job.session
        .store_access_token(&access)
        .map_err(|e| RefreshFailure::Storage(e.to_string()))?;
    Ok(access)
}

fn is_refresh_path(path: &str) -> bool {
    path.trim_start_matches('/').starts_with(REFRESH_PATH)
}

async fn ensure_success(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let payload = read_payload(response).await;
    warn!("club API returned {}", status);
    Err(ApiError::Status { status, payload })
}

/// Reads an error body: JSON when it parses, otherwise the raw text.
async fn read_payload(response: Response) -> Option<Value> {
    let text = response.text().await.ok()?;
    if text.trim().is_empty() {
        return None;
    }
    Some(serde_json::from_str(&text).unwrap_or(Value::String(text)))
}

fn build_form(parts: &[FormPart]) -> Result<Form, ApiError> {
    parts.iter().try_fold(Form::new(), |form, part| match part {
        FormPart::Text { name, value } => Ok(form.text(name.clone(), value.clone())),
        FormPart::File {
            name,
            file_name,
            mime,
            bytes,
        } => {
            let mut file = Part::bytes(bytes.clone()).file_name(file_name.clone());
            if let Some(mime) = mime {
                file = file
                    .mime_str(mime)
                    .map_err(|e| ApiError::InvalidRequest(format!("bad mime type {mime}: {e}")))?;
            }
            Ok(form.part(name.clone(), file))
        }
    })
}
