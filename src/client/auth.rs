// File: ./src/client/auth.rs
// Bearer authentication with a single refresh-and-retry on 401.
use crate::session::SessionStore;
use http::{HeaderValue, Method, Request, Response, StatusCode, Uri, header};
use http_body_util::BodyExt;
use hyper::body::Body;
use serde::Deserialize;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tower_service::Service;

#[derive(Deserialize)]
struct RefreshResponse {
    access: Option<String>,
}

#[derive(Clone, Debug)]
pub struct BearerAuthLayer {
    session: SessionStore,
    refresh_uri: Uri,
}

impl BearerAuthLayer {
    pub fn new(session: SessionStore, refresh_uri: Uri) -> Self {
        Self {
            session,
            refresh_uri,
        }
    }
}

impl<S> tower_layer::Layer<S> for BearerAuthLayer {
    type Service = BearerAuthService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        BearerAuthService {
            inner,
            session: self.session.clone(),
            refresh_uri: self.refresh_uri.clone(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct BearerAuthService<S> {
    inner: S,
    session: SessionStore,
    refresh_uri: Uri,
}

fn bearer(token: &str) -> Option<HeaderValue> {
    HeaderValue::from_str(&format!("Bearer {}", token)).ok()
}

fn clone_request(req: &Request<String>) -> Request<String> {
    let mut copy = Request::new(req.body().clone());
    *copy.method_mut() = req.method().clone();
    *copy.uri_mut() = req.uri().clone();
    *copy.headers_mut() = req.headers().clone();
    copy
}

/// Asks the token endpoint for a new access token. `None` on any failure.
async fn request_new_access<S, ResBody>(
    inner: &mut S,
    refresh_uri: Uri,
    refresh_token: String,
) -> Option<String>
where
    S: Service<Request<String>, Response = Response<ResBody>>,
    ResBody: Body,
{
    let payload = serde_json::json!({ "refresh": refresh_token }).to_string();
    let req = Request::builder()
        .method(Method::POST)
        .uri(refresh_uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::ACCEPT, "application/json")
        .body(payload)
        .ok()?;

    let response = inner.call(req).await.ok()?;
    if !response.status().is_success() {
        log::warn!("Token refresh rejected with {}", response.status());
        return None;
    }
    let bytes = response.into_body().collect().await.ok()?.to_bytes();
    let parsed: RefreshResponse = serde_json::from_slice(&bytes).ok()?;
    parsed.access.filter(|a| !a.is_empty())
}

impl<S, ResBody> Service<Request<String>> for BearerAuthService<S>
where
    S: Service<Request<String>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
    ResBody: Body + Send + 'static,
    ResBody::Data: Send,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<String>) -> Self::Future {
        if let Some(val) = self.session.access_token().as_deref().and_then(bearer) {
            req.headers_mut().insert(header::AUTHORIZATION, val);
        }

        let retry = clone_request(&req);
        let mut inner = self.inner.clone();
        let session = self.session.clone();
        let refresh_uri = self.refresh_uri.clone();

        Box::pin(async move {
            let response = inner.call(req).await?;

            if response.status() != StatusCode::UNAUTHORIZED {
                return Ok(response);
            }

            let Some(refresh_token) = session.refresh_token() else {
                session.invalidate();
                return Ok(response);
            };

            log::debug!("Got 401 for {}, refreshing access token", retry.uri());
            let Some(access) = request_new_access(&mut inner, refresh_uri, refresh_token).await
            else {
                session.invalidate();
                return Ok(response);
            };

            session.update_access(access.clone());
            let mut retry = retry;
            if let Some(val) = bearer(&access) {
                retry.headers_mut().insert(header::AUTHORIZATION, val);
            }
            // Replayed once; a second 401 goes back to the caller as is.
            inner.call(retry).await
        })
    }
}
