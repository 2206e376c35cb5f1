use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::ApiError;
use crate::models::{
    Application, ApplicationStatus, AttendanceData, BankDetails, Conversation, Credentials, Job,
    JobReport, ListResponse, Message, NewJob, Profile, ProfileUpdate, Registration, Transaction,
    VerificationStatus, WalletStats,
};
use crate::session::SessionStore;
use crate::storage::Storage;
use crate::surface::Navigator;

/// Durable key for the auth cookie, kept apart from the session the way a browser keeps
/// its cookie jar apart from localStorage.
pub const CREDENTIALS_KEY: &str = "eventflex_credentials";
const AUTH_COOKIE: &str = "jwt_token";
pub const LOGIN_PATH: &str = "/login";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
}

/// A file picked by the user for a multipart upload.
#[derive(Debug, Clone, PartialEq)]
pub struct Upload {
    pub file_name: String,
    pub mime: Option<String>,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let mime = guess_mime(&file_name).map(str::to_string);
        Self {
            file_name,
            mime,
            bytes,
        }
    }

    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        Ok(Self::new(file_name, bytes))
    }
}

fn guess_mime(file_name: &str) -> Option<&'static str> {
    let ext = file_name.rsplit_once('.')?.1.to_lowercase();
    match ext.as_str() {
        "pdf" => Some("application/pdf"),
        "doc" => Some("application/msword"),
        "docx" => Some("application/vnd.openxmlformats-officedocument.wordprocessingml.document"),
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        "mp4" => Some("video/mp4"),
        "webm" => Some("video/webm"),
        "mov" => Some("video/quicktime"),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormPart {
    Text { name: String, value: String },
    File { name: String, upload: Upload },
}

impl FormPart {
    pub fn text(name: &str, value: impl Into<String>) -> Self {
        FormPart::Text {
            name: name.to_string(),
            value: value.into(),
        }
    }

    pub fn file(name: &str, upload: Upload) -> Self {
        FormPart::File {
            name: name.to_string(),
            upload,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Empty,
    Json(Value),
    Multipart(Vec<FormPart>),
}

/// One outbound call, path relative to the API base.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Body,
    pub cookie: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
    pub set_cookies: Vec<String>,
}

/// Moves requests over the wire. A returned `Err` always means no response arrived.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<RawResponse, ApiError>;
}

pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("eventflex/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<RawResponse, ApiError> {
        let url = format!("{}{}", self.base_url, request.path);
        let mut builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
        };
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(cookie) = &request.cookie {
            builder = builder.header(reqwest::header::COOKIE, cookie);
        }
        builder = match request.body {
            Body::Empty => builder,
            Body::Json(value) => builder.json(&value),
            Body::Multipart(parts) => builder.multipart(build_form(parts)?),
        };

        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        let status = response.status().as_u16();
        let set_cookies = response
            .headers()
            .get_all(reqwest::header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(str::to_string)
            .collect();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(RawResponse {
            status,
            body,
            set_cookies,
        })
    }
}

fn build_form(parts: Vec<FormPart>) -> Result<Form, ApiError> {
    let mut form = Form::new();
    for part in parts {
        form = match part {
            FormPart::Text { name, value } => form.text(name, value),
            FormPart::File { name, upload } => {
                let file = Part::bytes(upload.bytes).file_name(upload.file_name);
                let file = match upload.mime.as_deref() {
                    Some(mime) => file
                        .mime_str(mime)
                        .map_err(|e| ApiError::Network(format!("invalid upload type: {e}")))?,
                    None => file,
                };
                form.part(name, file)
            }
        };
    }
    Ok(form)
}

#[derive(Serialize, Deserialize)]
struct StoredCredentials {
    jwt_token: String,
}

/// Holds the backend's `jwt_token` cookie between runs.
pub struct CredentialJar {
    storage: Arc<dyn Storage>,
    token: RwLock<Option<String>>,
}

impl CredentialJar {
    pub fn load(storage: Arc<dyn Storage>) -> Self {
        let token = match storage.get(CREDENTIALS_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<StoredCredentials>(&raw) {
                Ok(stored) => Some(stored.jwt_token),
                Err(e) => {
                    warn!(error = %e, "discarding unreadable credentials");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "credential storage unavailable");
                None
            }
        };
        Self {
            storage,
            token: RwLock::new(token),
        }
    }

    pub fn has_token(&self) -> bool {
        self.token.read().map(|t| t.is_some()).unwrap_or(false)
    }

    pub fn cookie_header(&self) -> Option<String> {
        let token = self.token.read().ok()?.clone()?;
        Some(format!("{AUTH_COOKIE}={token}"))
    }

    /// Applies `Set-Cookie` headers from a response. Only the auth cookie is kept.
    pub fn absorb(&self, set_cookies: &[String]) {
        for header in set_cookies {
            let Some((value, expired)) = parse_auth_cookie(header) else {
                continue;
            };
            if expired {
                debug!("auth cookie expired by server");
                self.clear();
            } else {
                self.store(value);
            }
        }
    }

    fn store(&self, token: String) {
        match serde_json::to_string(&StoredCredentials {
            jwt_token: token.clone(),
        }) {
            Ok(json) => {
                if let Err(e) = self.storage.set(CREDENTIALS_KEY, &json) {
                    warn!(error = %e, "failed to persist credentials");
                }
            }
            Err(e) => warn!(error = %e, "failed to encode credentials"),
        }
        if let Ok(mut current) = self.token.write() {
            *current = Some(token);
        }
    }

    pub fn clear(&self) {
        if let Err(e) = self.storage.remove(CREDENTIALS_KEY) {
            warn!(error = %e, "failed to clear credentials");
        }
        if let Ok(mut current) = self.token.write() {
            *current = None;
        }
    }
}

/// `jwt_token=abc; Path=/; HttpOnly` -> ("abc", false). Empty values and `Max-Age=0`
/// mean the server deleted the cookie.
fn parse_auth_cookie(header: &str) -> Option<(String, bool)> {
    let mut attrs = header.split(';');
    let (name, value) = attrs.next()?.split_once('=')?;
    if name.trim() != AUTH_COOKIE {
        return None;
    }
    let value = value.trim().trim_matches('"').to_string();
    let max_age_zero = attrs.any(|attr| {
        attr.split_once('=')
            .map(|(k, v)| k.trim().eq_ignore_ascii_case("max-age") && v.trim() == "0")
            .unwrap_or(false)
    });
    let expired = value.is_empty() || max_age_zero;
    Some((value, expired))
}

/// Turns a response into JSON or a tagged error. Blank bodies decode as `null`.
fn decode_response(response: RawResponse) -> Result<Value, ApiError> {
    let ok = (200..300).contains(&response.status);
    let body = if response.body.trim().is_empty() {
        Value::Null
    } else {
        match serde_json::from_str(&response.body) {
            Ok(value) => value,
            Err(e) if ok => return Err(ApiError::Decode(e.to_string())),
            Err(_) => Value::String(response.body),
        }
    };

    if ok {
        Ok(body)
    } else {
        Err(ApiError::Http {
            status: response.status,
            message: error_message(&body),
            body,
        })
    }
}

/// The backend's human-readable text, in the order it prefers to send it.
pub fn error_message(body: &Value) -> Option<String> {
    ["error", "message", "detail"]
        .iter()
        .filter_map(|key| body.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))
}

fn results<T: DeserializeOwned>(value: Value) -> Result<Vec<T>, ApiError> {
    if value.is_null() {
        return Ok(Vec::new());
    }
    Ok(decode::<ListResponse<T>>(value)?.results)
}

/// Inner object of a `{"success": true, "<key>": {...}}` envelope, or the value itself.
fn unwrap_field(mut value: Value, key: &str) -> Value {
    match value.get_mut(key) {
        Some(inner) => inner.take(),
        None => value,
    }
}

fn to_json<T: Serialize>(payload: &T) -> Result<Value, ApiError> {
    serde_json::to_value(payload).map_err(|e| ApiError::Decode(e.to_string()))
}

/// Organizer/applicant decisions on an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplicationAction {
    Accept,
    Reject,
    Withdraw,
    Status(ApplicationStatus),
}

impl ApplicationAction {
    fn path(self, id: i64) -> String {
        match self {
            ApplicationAction::Accept => format!("/applications/{id}/accept/"),
            ApplicationAction::Reject => format!("/applications/{id}/reject/"),
            ApplicationAction::Withdraw => format!("/applications/{id}/withdraw/"),
            ApplicationAction::Status(_) => format!("/applications/{id}/status/"),
        }
    }

    pub fn past_tense(self) -> &'static str {
        match self {
            ApplicationAction::Accept => "accepted",
            ApplicationAction::Reject => "rejected",
            ApplicationAction::Withdraw => "withdrawn",
            ApplicationAction::Status(status) => status.as_str(),
        }
    }
}

pub struct ApiClient {
    transport: Arc<dyn Transport>,
    credentials: CredentialJar,
    session: Arc<SessionStore>,
    navigator: Arc<dyn Navigator>,
    redirect_armed: AtomicBool,
}

impl ApiClient {
    pub fn new(
        transport: Arc<dyn Transport>,
        storage: Arc<dyn Storage>,
        session: Arc<SessionStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let armed = session.is_authenticated();
        Self {
            transport,
            credentials: CredentialJar::load(storage),
            session,
            navigator,
            redirect_armed: AtomicBool::new(armed),
        }
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn credentials(&self) -> &CredentialJar {
        &self.credentials
    }

    /// Starts a new authenticated period: the next rejected gated fetch redirects again.
    pub fn arm_auth_redirect(&self) {
        self.redirect_armed.store(true, Ordering::SeqCst);
    }

    pub async fn call(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Body,
    ) -> Result<Value, ApiError> {
        let request = ApiRequest {
            method,
            path: path.to_string(),
            query: query
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
            body,
            cookie: self.credentials.cookie_header(),
        };
        debug!(?method, path, "api request");

        let response = self.transport.send(request).await?;
        debug!(path, status = response.status, "api response");
        self.credentials.absorb(&response.set_cookies);
        decode_response(response)
    }

    /// Fetch for data that only exists for a signed-in user. A 401 ends the session.
    pub async fn gated(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Body,
    ) -> Result<Value, ApiError> {
        match self.call(method, path, query, body).await {
            Err(ApiError::Http { status: 401, .. }) => {
                self.force_logout();
                Err(ApiError::AuthRequired)
            }
            other => other,
        }
    }

    fn force_logout(&self) {
        warn!("server rejected credentials; clearing session");
        self.session.clear();
        self.credentials.clear();
        if self.redirect_armed.swap(false, Ordering::SeqCst) {
            self.navigator.redirect(LOGIN_PATH);
        }
    }

    async fn get(&self, path: &str) -> Result<Value, ApiError> {
        self.call(Method::Get, path, &[], Body::Empty).await
    }

    async fn get_gated(&self, path: &str, query: &[(&str, String)]) -> Result<Value, ApiError> {
        self.gated(Method::Get, path, query, Body::Empty).await
    }

    async fn post_json(&self, path: &str, body: Value) -> Result<Value, ApiError> {
        self.call(Method::Post, path, &[], Body::Json(body)).await
    }

    async fn post_form(&self, path: &str, parts: Vec<FormPart>) -> Result<Value, ApiError> {
        self.call(Method::Post, path, &[], Body::Multipart(parts)).await
    }

    // auth

    pub async fn login(&self, credentials: &Credentials) -> Result<Value, ApiError> {
        let value = self.post_json("/auth/login/", to_json(credentials)?).await?;
        self.arm_auth_redirect();
        info!(username = %credentials.username, "logged in");
        Ok(value)
    }

    pub async fn register(&self, registration: &Registration) -> Result<Value, ApiError> {
        self.post_json("/auth/register/", to_json(registration)?).await
    }

    pub async fn logout(&self) -> Result<Value, ApiError> {
        let result = self.post_json("/auth/logout/", json!({})).await;
        self.credentials.clear();
        self.redirect_armed.store(false, Ordering::SeqCst);
        result
    }

    // jobs

    pub async fn list_jobs(&self) -> Result<Vec<Job>, ApiError> {
        results(self.get("/jobs/").await?)
    }

    pub async fn my_jobs(&self, status: Option<&str>) -> Result<Vec<Job>, ApiError> {
        let query: Vec<(&str, String)> = status.map(|s| ("status", s.to_string())).into_iter().collect();
        results(self.get_gated("/jobs/my/", &query).await?)
    }

    pub async fn job_details(&self, job_id: i64) -> Result<Job, ApiError> {
        decode(self.get(&format!("/jobs/{job_id}/details/")).await?)
    }

    pub async fn create_job(&self, job: &NewJob) -> Result<Value, ApiError> {
        self.post_json("/jobs/create/", to_json(job)?).await
    }

    pub async fn apply_to_job(
        &self,
        job_id: i64,
        username: &str,
        cover_message: &str,
        resume: Upload,
    ) -> Result<Value, ApiError> {
        let parts = vec![
            FormPart::text("username", username),
            FormPart::text("cover_message", cover_message),
            FormPart::file("resume", resume),
        ];
        self.post_form(&format!("/jobs/{job_id}/apply/"), parts).await
    }

    pub async fn finish_job(&self, job_id: i64) -> Result<Value, ApiError> {
        self.post_json(&format!("/jobs/{job_id}/finish/"), json!({})).await
    }

    pub async fn track_attendance(&self, job_id: i64) -> Result<AttendanceData, ApiError> {
        let value = self.get_gated(&format!("/jobs/{job_id}/track-attendance/"), &[]).await?;
        decode(unwrap_field(value, "attendance_data"))
    }

    pub async fn job_report(&self, job_id: i64) -> Result<JobReport, ApiError> {
        let value = self.get_gated(&format!("/jobs/{job_id}/download-report/"), &[]).await?;
        decode(unwrap_field(value, "report"))
    }

    // applications

    pub async fn applications(&self) -> Result<Vec<Application>, ApiError> {
        results(self.get_gated("/applications/", &[]).await?)
    }

    /// Same list for pages that also work signed out. A 401 here is only an error.
    pub async fn applications_best_effort(&self) -> Result<Vec<Application>, ApiError> {
        results(self.get("/applications/").await?)
    }

    pub async fn application(&self, application_id: i64) -> Result<Application, ApiError> {
        decode(self.get_gated(&format!("/applications/{application_id}/"), &[]).await?)
    }

    pub async fn update_application(
        &self,
        application_id: i64,
        action: ApplicationAction,
    ) -> Result<Value, ApiError> {
        let body = match action {
            ApplicationAction::Status(status) => json!({ "status": status.as_str() }),
            _ => json!({}),
        };
        self.post_json(&action.path(application_id), body).await
    }

    pub async fn release_payment(&self, application_id: i64) -> Result<Value, ApiError> {
        self.post_json(&format!("/applications/{application_id}/release-payment/"), json!({}))
            .await
    }

    // profiles

    pub async fn talent(&self) -> Result<Vec<Profile>, ApiError> {
        results(self.get("/talent/").await?)
    }

    pub async fn profile(&self, profile_id: i64) -> Result<Profile, ApiError> {
        decode(self.get(&format!("/profiles/{profile_id}/")).await?)
    }

    /// Raw so the session can merge exactly the fields the server sent.
    pub async fn my_profile(&self) -> Result<Value, ApiError> {
        self.get("/profiles/me/").await
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<Value, ApiError> {
        self.post_json("/profiles/update/", to_json(update)?).await
    }

    pub async fn upload_photo(&self, photo: Upload) -> Result<Value, ApiError> {
        self.post_form("/upload/photo/", vec![FormPart::file("photo", photo)])
            .await
    }

    pub async fn upload_video(&self, video: Upload) -> Result<Value, ApiError> {
        self.post_form("/upload/video/", vec![FormPart::file("video", video)])
            .await
    }

    // wallet

    pub async fn wallet_stats(&self) -> Result<WalletStats, ApiError> {
        decode(self.get_gated("/wallet/stats/", &[]).await?)
    }

    pub async fn add_funds(&self, amount: f64) -> Result<Value, ApiError> {
        self.post_json("/wallet/add-funds/", json!({ "amount": amount }))
            .await
    }

    pub async fn withdraw(&self, amount: f64) -> Result<Value, ApiError> {
        self.post_json("/wallet/withdraw/", json!({ "amount": amount }))
            .await
    }

    pub async fn bank_details(&self) -> Result<BankDetails, ApiError> {
        let value = self.get_gated("/wallet/bank-details/", &[]).await?;
        match value.get("bank_details") {
            Some(inner) => decode(inner.clone()),
            None if value.is_null() => Ok(BankDetails::default()),
            None => decode(value),
        }
    }

    pub async fn update_bank_details(&self, details: &BankDetails) -> Result<Value, ApiError> {
        self.post_json("/wallet/bank-details/update/", to_json(details)?)
            .await
    }

    pub async fn transactions(&self) -> Result<Vec<Transaction>, ApiError> {
        results(self.get_gated("/transactions/", &[]).await?)
    }

    // messages

    pub async fn conversations(&self) -> Result<Vec<Conversation>, ApiError> {
        results(self.get_gated("/messages/conversations/", &[]).await?)
    }

    pub async fn messages(&self, partner_id: i64) -> Result<Vec<Message>, ApiError> {
        results(
            self.get_gated("/messages/", &[("partner_id", partner_id.to_string())])
                .await?,
        )
    }

    pub async fn send_message(&self, recipient_id: i64, text: &str) -> Result<Value, ApiError> {
        self.post_json(
            "/messages/send/",
            json!({ "recipient_id": recipient_id, "text": text }),
        )
        .await
    }

    // verification

    pub async fn verification_status(&self) -> Result<VerificationStatus, ApiError> {
        decode(self.get_gated("/verification/status/", &[]).await?)
    }

    pub async fn submit_verification(
        &self,
        document_type: &str,
        document: Upload,
        video: Option<Upload>,
    ) -> Result<Value, ApiError> {
        let mut parts = vec![
            FormPart::text("document_type", document_type),
            FormPart::file("document", document),
        ];
        if let Some(video) = video {
            parts.push(FormPart::file("video", video));
        }
        self.post_form("/verification/submit/", parts).await
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::models::UserSession;
    use crate::storage::MemoryStorage;
    use crate::surface::RecordingNavigator;
    use std::collections::HashMap;
    use std::sync::Mutex;

    enum Scripted {
        Respond(RawResponse),
        Fail(String),
    }

    /// Answers by (method, path) and records every request it sees. Unscripted routes
    /// answer 404.
    pub struct ScriptedTransport {
        routes: Mutex<HashMap<(Method, String), Scripted>>,
        calls: Mutex<Vec<ApiRequest>>,
    }

    pub struct Harness {
        pub transport: Arc<ScriptedTransport>,
        pub storage: Arc<MemoryStorage>,
        pub session: Arc<SessionStore>,
        pub navigator: Arc<RecordingNavigator>,
        pub api: Arc<ApiClient>,
    }

    impl ScriptedTransport {
        pub fn new() -> Self {
            Self {
                routes: Mutex::new(HashMap::new()),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn on(&self, method: Method, path: &str, status: u16, body: Value) {
            self.on_with_cookies(method, path, status, body, &[]);
        }

        pub fn on_with_cookies(
            &self,
            method: Method,
            path: &str,
            status: u16,
            body: Value,
            set_cookies: &[&str],
        ) {
            let response = RawResponse {
                status,
                body: body.to_string(),
                set_cookies: set_cookies.iter().map(|c| c.to_string()).collect(),
            };
            self.routes
                .lock()
                .unwrap()
                .insert((method, path.to_string()), Scripted::Respond(response));
        }

        pub fn fail(&self, method: Method, path: &str, message: &str) {
            self.routes
                .lock()
                .unwrap()
                .insert((method, path.to_string()), Scripted::Fail(message.to_string()));
        }

        pub fn calls(&self) -> Vec<ApiRequest> {
            self.calls.lock().unwrap().clone()
        }

        pub fn call_count(&self, path: &str) -> usize {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|c| c.path == path)
                .count()
        }

        pub fn harness(self: &Arc<Self>) -> Harness {
            self.harness_with(None)
        }

        pub fn harness_signed_in(self: &Arc<Self>, user: UserSession) -> Harness {
            self.harness_with(Some(user))
        }

        fn harness_with(self: &Arc<Self>, user: Option<UserSession>) -> Harness {
            let storage = Arc::new(MemoryStorage::new());
            let session = Arc::new(SessionStore::new(storage.clone()));
            if user.is_some() {
                session.save(user);
            }
            let navigator = Arc::new(RecordingNavigator::new());
            let api = Arc::new(ApiClient::new(
                self.clone(),
                storage.clone(),
                session.clone(),
                navigator.clone(),
            ));
            Harness {
                transport: self.clone(),
                storage,
                session,
                navigator,
                api,
            }
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn send(&self, request: ApiRequest) -> Result<RawResponse, ApiError> {
            let key = (request.method, request.path.clone());
            self.calls.lock().unwrap().push(request);
            match self.routes.lock().unwrap().get(&key) {
                Some(Scripted::Respond(response)) => Ok(response.clone()),
                Some(Scripted::Fail(message)) => Err(ApiError::Network(message.clone())),
                None => Ok(RawResponse {
                    status: 404,
                    body: r#"{"error":"not found"}"#.to_string(),
                    set_cookies: Vec::new(),
                }),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::ScriptedTransport;
    use super::*;
    use crate::models::{Profile, UserType};

    fn staff() -> Profile {
        Profile {
            id: Some(3),
            username: "alice".into(),
            user_type: UserType::Staff,
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_auth_cookie() {
        assert_eq!(
            parse_auth_cookie("jwt_token=abc.def; Path=/; HttpOnly"),
            Some(("abc.def".to_string(), false))
        );
        assert_eq!(
            parse_auth_cookie("jwt_token=; Max-Age=0; Path=/"),
            Some((String::new(), true))
        );
        assert_eq!(
            parse_auth_cookie("jwt_token=abc; max-age=0"),
            Some(("abc".to_string(), true))
        );
        assert_eq!(parse_auth_cookie("csrftoken=xyz; Path=/"), None);
    }

    #[test]
    fn test_error_message_preference() {
        assert_eq!(
            error_message(&json!({"error": "Insufficient balance", "message": "x"})).as_deref(),
            Some("Insufficient balance")
        );
        assert_eq!(error_message(&json!({"detail": "Not found."})).as_deref(), Some("Not found."));
        assert_eq!(error_message(&json!({"error": "  "})), None);
        assert_eq!(error_message(&Value::Null), None);
    }

    #[test]
    fn test_decode_response_variants() {
        let ok = decode_response(RawResponse {
            status: 200,
            body: String::new(),
            set_cookies: vec![],
        })
        .unwrap();
        assert!(ok.is_null());

        let err = decode_response(RawResponse {
            status: 502,
            body: "<html>bad gateway</html>".into(),
            set_cookies: vec![],
        })
        .unwrap_err();
        assert_eq!(err.status(), Some(502));
        assert_eq!(err.user_message("fallback"), "fallback");

        let err = decode_response(RawResponse {
            status: 200,
            body: "not json".into(),
            set_cookies: vec![],
        })
        .unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[tokio::test]
    async fn test_login_captures_cookie_and_attaches_it_afterwards() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.on_with_cookies(
            Method::Post,
            "/auth/login/",
            200,
            json!({"message": "logged in", "profile": {"username": "alice"}}),
            &["jwt_token=tok123; Path=/; HttpOnly"],
        );
        transport.on(Method::Get, "/applications/", 200, json!({"results": []}));
        let h = transport.harness();

        h.api
            .login(&Credentials {
                username: "alice".into(),
                password: "secret".into(),
            })
            .await
            .unwrap();
        assert!(h.api.credentials().has_token());
        assert!(h.storage.get(CREDENTIALS_KEY).unwrap().unwrap().contains("tok123"));

        h.api.applications().await.unwrap();
        let calls = h.transport.calls();
        assert_eq!(calls[0].cookie, None);
        assert_eq!(calls[1].cookie.as_deref(), Some("jwt_token=tok123"));
    }

    #[tokio::test]
    async fn test_credentials_survive_restart() {
        let transport = Arc::new(ScriptedTransport::new());
        let h = transport.harness();
        h.api.credentials().absorb(&["jwt_token=persisted".to_string()]);

        let jar = CredentialJar::load(h.storage.clone());
        assert_eq!(jar.cookie_header().as_deref(), Some("jwt_token=persisted"));
        jar.clear();
        assert!(CredentialJar::load(h.storage.clone()).cookie_header().is_none());
    }

    #[tokio::test]
    async fn test_gated_401_clears_session_and_redirects_once() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.on(Method::Get, "/wallet/stats/", 401, json!({"error": "authentication required"}));
        transport.on(Method::Get, "/transactions/", 401, json!({"error": "authentication required"}));
        let h = transport.harness_signed_in(staff());
        h.api.credentials().absorb(&["jwt_token=stale".to_string()]);

        let first = h.api.wallet_stats().await.unwrap_err();
        let second = h.api.transactions().await.unwrap_err();

        assert!(matches!(first, ApiError::AuthRequired));
        assert!(matches!(second, ApiError::AuthRequired));
        assert!(!h.session.is_authenticated());
        assert!(!h.api.credentials().has_token());
        assert_eq!(h.navigator.history(), vec![LOGIN_PATH]);
    }

    #[tokio::test]
    async fn test_ungated_401_is_plain_http_error() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.on(Method::Post, "/auth/login/", 401, json!({"error": "invalid credentials"}));
        let h = transport.harness_signed_in(staff());

        let err = h
            .api
            .login(&Credentials {
                username: "alice".into(),
                password: "wrong".into(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.user_message("Login failed"), "invalid credentials");
        assert!(h.session.is_authenticated());
        assert!(h.navigator.history().is_empty());
    }

    #[tokio::test]
    async fn test_network_failure_is_tagged() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.fail(Method::Get, "/jobs/", "connection refused");
        let h = transport.harness();
        let err = h.api.list_jobs().await.unwrap_err();
        assert!(err.is_network());
    }

    #[tokio::test]
    async fn test_list_endpoints_tolerate_missing_results() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.on(Method::Get, "/talent/", 200, json!({}));
        transport.on(
            Method::Get,
            "/messages/",
            200,
            json!({"results": [{"id": 1, "sender": {"id": 2, "username": "bob"}, "text": "hi"}]}),
        );
        let h = transport.harness_signed_in(staff());

        assert!(h.api.talent().await.unwrap().is_empty());
        let messages = h.api.messages(2).await.unwrap();
        assert_eq!(messages[0].text, "hi");
        let call = h.transport.calls().pop().unwrap();
        assert_eq!(call.query, vec![("partner_id".to_string(), "2".to_string())]);
    }

    #[tokio::test]
    async fn test_application_actions_hit_their_paths() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.on(Method::Post, "/applications/9/status/", 200, json!({"message": "status updated"}));
        transport.on(Method::Post, "/applications/9/withdraw/", 200, json!({}));
        let h = transport.harness_signed_in(staff());

        h.api
            .update_application(9, ApplicationAction::Status(ApplicationStatus::Accepted))
            .await
            .unwrap();
        h.api.update_application(9, ApplicationAction::Withdraw).await.unwrap();

        let calls = h.transport.calls();
        assert_eq!(calls[0].body, Body::Json(json!({"status": "accepted"})));
        assert_eq!(calls[1].path, "/applications/9/withdraw/");
    }

    #[tokio::test]
    async fn test_bank_details_accepts_wrapped_payload() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.on(
            Method::Get,
            "/wallet/bank-details/",
            200,
            json!({"bank_details": {"bank_account_holder": "Alice", "bank_account_number": "123456789", "bank_ifsc_code": "HDFC0001234"}}),
        );
        let h = transport.harness_signed_in(staff());
        let details = h.api.bank_details().await.unwrap();
        assert_eq!(details.account_holder, "Alice");
        assert!(details.is_complete());
    }

    #[tokio::test]
    async fn test_attendance_and_report_unwrap_their_envelopes() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.on(
            Method::Get,
            "/jobs/7/track-attendance/",
            200,
            json!({"success": true, "attendance_data": {"job_id": 7, "job_title": "Gala", "date": "2026-11-02", "location": "Pune", "tracking_code": "ATT-7-20261102"}}),
        );
        transport.on(
            Method::Get,
            "/jobs/7/download-report/",
            200,
            json!({"success": true, "report": {"job_title": "Gala", "total_applications": 3, "accepted": 1, "pending": 2, "rejected": 0, "total_cost": "2500.00"}}),
        );
        let h = transport.harness_signed_in(staff());

        let attendance = h.api.track_attendance(7).await.unwrap();
        assert_eq!(attendance.tracking_code, "ATT-7-20261102");
        assert_eq!(attendance.job_id, 7);
        let report = h.api.job_report(7).await.unwrap();
        assert_eq!(report.total_applications, 3);
        assert_eq!(report.cost_display(), "2500");
    }

    #[tokio::test]
    async fn test_job_report_401_signs_out() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.on(Method::Get, "/jobs/7/download-report/", 401, json!({"error": "Authentication required"}));
        let h = transport.harness_signed_in(staff());

        let err = h.api.job_report(7).await.unwrap_err();
        assert!(matches!(err, ApiError::AuthRequired));
        assert!(!h.session.is_authenticated());
        assert_eq!(h.navigator.history(), vec![LOGIN_PATH]);
    }

    #[test]
    fn test_upload_guesses_mime() {
        assert_eq!(Upload::new("cv.PDF", vec![1]).mime.as_deref(), Some("application/pdf"));
        assert_eq!(Upload::new("intro.mp4", vec![]).mime.as_deref(), Some("video/mp4"));
        assert_eq!(Upload::new("notes", vec![]).mime, None);
    }
}
