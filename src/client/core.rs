// File: src/client/core.rs
use crate::board::BoardApi;
use crate::client::auth::BearerAuthLayer;
use crate::client::cert::NoVerifier;
use crate::client::error::ApiError;
use crate::config::Config;
use crate::model::{
    Board, BoardId, Card, CardId, CardList, CourseTemplate, ListId, NewBoard, NewCard, Role, User,
    UserId,
};
use crate::session::{Session, SessionStore};

use http::{HeaderValue, Method, Request, Response, StatusCode, Uri, header};
use http_body_util::BodyExt;
use hyper::body::{Bytes, Incoming};
use hyper_rustls::HttpsConnectorBuilder;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;
use tower::util::BoxCloneSyncService;
use tower::{ServiceBuilder, ServiceExt};
use tower_http::set_header::SetRequestHeaderLayer;

type HttpService =
    BoxCloneSyncService<Request<String>, Response<Incoming>, hyper_util::client::legacy::Error>;

fn user_agent() -> HeaderValue {
    HeaderValue::from_str(&format!("tablero/{}", env!("CARGO_PKG_VERSION")))
        .unwrap_or_else(|_| HeaderValue::from_static("tablero"))
}

fn build_tls_config(insecure: bool) -> rustls::ClientConfig {
    let builder = rustls::ClientConfig::builder();
    if insecure {
        return builder
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(NoVerifier))
            .with_no_client_auth();
    }

    let mut root_store = rustls::RootCertStore::empty();
    let result = rustls_native_certs::load_native_certs();
    root_store.add_parsable_certificates(result.certs);
    if root_store.is_empty() {
        log::warn!("No system certificates found; HTTPS servers will be rejected");
    }
    builder
        .with_root_certificates(root_store)
        .with_no_client_auth()
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(bytes).map_err(|e| ApiError::Decode(e.to_string()))
}

/// Client for the kanban REST API.
///
/// Every request goes through a small tower stack: user agent, JSON
/// `Accept` header, then bearer authentication with refresh on 401.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    service: HttpService,
    session: SessionStore,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    pub fn new(base_url: &str, session: SessionStore, insecure: bool) -> Result<Self, ApiError> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(ApiError::NotConfigured);
        }

        let refresh_uri: Uri = format!("{}/token/refresh/", base_url)
            .parse()
            .map_err(|_| ApiError::InvalidUrl(base_url.clone()))?;
        if refresh_uri.scheme().is_none() || refresh_uri.authority().is_none() {
            return Err(ApiError::InvalidUrl(base_url));
        }

        let https_connector = HttpsConnectorBuilder::new()
            .with_tls_config(build_tls_config(insecure))
            .https_or_http()
            .enable_http1()
            .build();
        let http_client = Client::builder(TokioExecutor::new()).build::<_, String>(https_connector);

        let service = ServiceBuilder::new()
            .layer(SetRequestHeaderLayer::overriding(
                header::USER_AGENT,
                user_agent(),
            ))
            .layer(SetRequestHeaderLayer::if_not_present(
                header::ACCEPT,
                HeaderValue::from_static("application/json"),
            ))
            .layer(BearerAuthLayer::new(session.clone(), refresh_uri))
            .service(http_client);

        Ok(Self {
            base_url,
            service: BoxCloneSyncService::new(service),
            session,
        })
    }

    pub fn from_config(config: &Config, session: SessionStore) -> Result<Self, ApiError> {
        Self::new(&config.api_url, session, config.allow_insecure_certs)
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Uri, ApiError> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        url.parse().map_err(|_| ApiError::InvalidUrl(url))
    }

    async fn send(&self, method: Method, path: &str, body: Option<String>) -> Result<Bytes, ApiError> {
        let uri = self.endpoint(path)?;
        let mut builder = Request::builder().method(method.clone()).uri(uri);
        if body.is_some() {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
        }
        let req = builder
            .body(body.unwrap_or_default())
            .map_err(|e| ApiError::Request(e.to_string()))?;

        let response = self
            .service
            .clone()
            .oneshot(req)
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?
            .to_bytes();
        log::debug!("{} {} -> {}", method, path, status);

        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized {
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }
        if !status.is_success() {
            return Err(ApiError::Status {
                status,
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }
        Ok(bytes)
    }

    async fn send_json<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<Bytes, ApiError> {
        let payload = serde_json::to_string(body).map_err(|e| ApiError::Request(e.to_string()))?;
        self.send(method, path, Some(payload)).await
    }

    /// GET a JSON array; a `null` body counts as empty.
    async fn get_vec<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, ApiError> {
        let bytes = self.send(Method::GET, path, None).await?;
        if bytes.is_empty() {
            return Ok(vec![]);
        }
        Ok(decode::<Option<Vec<T>>>(&bytes)?.unwrap_or_default())
    }

    // --- AUTH ---

    /// Logs in and installs the resulting session. `None` uses the generic
    /// token endpoint (the one staff accounts go through).
    pub async fn login(
        &self,
        role: Option<Role>,
        username: &str,
        password: &str,
    ) -> Result<Session, ApiError> {
        let path = role.map(|r| r.token_path()).unwrap_or("/token/");
        let credentials = serde_json::json!({ "username": username, "password": password });
        let bytes = self.send_json(Method::POST, path, &credentials).await?;

        let mut session: Session = decode(&bytes)?;
        if session.username.is_none() {
            session.username = Some(username.to_string());
        }
        if session.role.is_none() {
            session.role = role;
        }
        log::info!("Logged in as {} ({:?})", username, session.role);
        self.session.replace(session.clone());
        Ok(session)
    }

    pub fn logout(&self) {
        self.session.invalidate();
    }

    // --- COURSES ---

    pub async fn get_boards(&self) -> Result<Vec<Board>, ApiError> {
        self.get_vec("/boards/").await
    }

    pub async fn create_board(&self, board: &NewBoard) -> Result<Board, ApiError> {
        let bytes = self.send_json(Method::POST, "/boards/", board).await?;
        decode(&bytes)
    }

    pub async fn invite_member(&self, board: BoardId, username: &str) -> Result<(), ApiError> {
        let body = serde_json::json!({ "username": username });
        self.send_json(Method::POST, &format!("/boards/{}/invite/", board), &body)
            .await?;
        Ok(())
    }

    pub async fn get_members(&self, board: BoardId) -> Result<Vec<User>, ApiError> {
        self.get_vec(&format!("/boards/{}/members/", board)).await
    }

    /// Course catalogue offered to teachers.
    pub async fn get_default_courses(&self) -> Result<Vec<CourseTemplate>, ApiError> {
        self.get_vec("/default-courses/").await
    }

    // --- LISTS & CARDS ---

    pub async fn get_lists(&self) -> Result<Vec<CardList>, ApiError> {
        self.get_vec("/lists/").await
    }

    /// Board owning `list`, looked up through `/lists/` since cards do not
    /// carry their board.
    pub async fn board_of_list(&self, list: ListId) -> Result<Option<BoardId>, ApiError> {
        let lists = self.get_lists().await?;
        Ok(lists.iter().find(|l| l.id == list).map(|l| l.board))
    }

    pub async fn get_cards(&self) -> Result<Vec<Card>, ApiError> {
        self.query_cards(&[]).await
    }

    /// `GET /cards/` with query parameters such as `assignee` or `due_before`.
    pub async fn query_cards(&self, params: &[(String, String)]) -> Result<Vec<Card>, ApiError> {
        if params.is_empty() {
            return self.get_vec("/cards/").await;
        }
        let query = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");
        self.get_vec(&format!("/cards/?{}", query)).await
    }

    pub async fn create_card(&self, card: &NewCard) -> Result<Card, ApiError> {
        let bytes = self.send_json(Method::POST, "/cards/", card).await?;
        decode(&bytes)
    }

    pub async fn set_assignees(&self, card: CardId, assignees: &[UserId]) -> Result<(), ApiError> {
        let body = serde_json::json!({ "assignees": assignees });
        self.send_json(Method::PATCH, &format!("/cards/{}/", card), &body)
            .await?;
        Ok(())
    }

    pub async fn move_card(
        &self,
        card: CardId,
        list: ListId,
        position: i64,
    ) -> Result<(), ApiError> {
        let body = serde_json::json!({ "list": list, "position": position });
        self.send_json(Method::PATCH, &format!("/cards/{}/move/", card), &body)
            .await?;
        log::info!("Moved card {} to list {} at {}", card, list, position);
        Ok(())
    }
}

impl BoardApi for ApiClient {
    async fn fetch_lists(&self) -> Result<Vec<CardList>, ApiError> {
        self.get_lists().await
    }

    async fn fetch_cards(&self) -> Result<Vec<Card>, ApiError> {
        self.get_cards().await
    }

    async fn move_card(&self, card: CardId, list: ListId, position: i64) -> Result<(), ApiError> {
        ApiClient::move_card(self, card, list, position).await
    }
}
