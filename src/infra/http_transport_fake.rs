use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{Duration, Utc};
use dashmap::DashMap;
use jsonwebtoken::{EncodingKey, Header, encode};
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use tokio::sync::watch;

const SIGNING_KEY: &[u8] = b"fake-api-signing-key";

#[derive(Debug, Clone)]
struct FakeAccount {
    password: String,
    permissions: Vec<String>,
    roles: Vec<String>,
}

#[derive(Debug, Clone)]
struct IssuedAccess {
    email: String,
    expired: bool,
}

#[derive(Debug, Serialize)]
struct AccessClaims<'a> {
    sub: &'a str,
    exp: i64,
    iat: i64,
    jti: String,
    permissions: &'a [String],
    roles: &'a [String],
}

/// In-process stand-in for the remote API: `POST /sessions`, `POST /refresh`
/// and `GET /me`, with knobs to expire tokens, fail or hold refreshes.
pub struct FakeAuthApi {
    accounts: DashMap<String, FakeAccount>,
    access: DashMap<String, IssuedAccess>,
    refresh: DashMap<String, String>,
    refresh_calls: AtomicUsize,
    fail_refresh: AtomicBool,
    issue_expired: AtomicBool,
    refresh_gate: watch::Sender<bool>,
    me_bearers: Mutex<Vec<Option<String>>>,
}

impl Default for FakeAuthApi {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeAuthApi {
    pub fn new() -> Self {
        let (refresh_gate, _) = watch::channel(false);
        Self {
            accounts: DashMap::new(),
            access: DashMap::new(),
            refresh: DashMap::new(),
            refresh_calls: AtomicUsize::new(0),
            fail_refresh: AtomicBool::new(false),
            issue_expired: AtomicBool::new(false),
            refresh_gate,
            me_bearers: Mutex::new(Vec::new()),
        }
    }

    /// Seeded with an administrator and an editor, both with password `123456`.
    pub fn with_demo_accounts() -> Self {
        let api = Self::new();
        api.add_account(
            "admin@example.com",
            "123456",
            &["metrics.list", "users.list", "users.create"],
            &["administrator"],
        );
        api.add_account("editor@example.com", "123456", &["users.list"], &["editor"]);
        api
    }

    pub fn add_account(&self, email: &str, password: &str, permissions: &[&str], roles: &[&str]) {
        self.accounts.insert(
            email.to_string(),
            FakeAccount {
                password: password.to_string(),
                permissions: permissions.iter().map(|s| s.to_string()).collect(),
                roles: roles.iter().map(|s| s.to_string()).collect(),
            },
        );
    }

    /// Issues a pair for `email` as if it had signed in.
    pub fn issue(&self, email: &str) -> Option<TokenPair> {
        let account = self.accounts.get(email)?.clone();
        self.issue_for(email, &account)
    }

    /// Every access token issued so far now answers `token.expired`.
    pub fn expire_access_tokens(&self) {
        for mut entry in self.access.iter_mut() {
            entry.expired = true;
        }
    }

    /// Forgets every issued access token; they answer `token.invalid`.
    pub fn revoke_access_tokens(&self) {
        self.access.clear();
    }

    /// Newly issued access tokens are born expired.
    pub fn set_issue_expired(&self, expired: bool) {
        self.issue_expired.store(expired, Ordering::SeqCst);
    }

    pub fn set_fail_refresh(&self, fail: bool) {
        self.fail_refresh.store(fail, Ordering::SeqCst);
    }

    /// Parks every refresh call until `release_refreshes`.
    pub fn hold_refreshes(&self) {
        self.refresh_gate.send_replace(true);
    }

    pub fn release_refreshes(&self) {
        self.refresh_gate.send_replace(false);
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    /// Bearer tokens `GET /me` was called with, in arrival order.
    pub fn me_bearers(&self) -> Vec<Option<String>> {
        self.me_bearers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn issue_for(&self, email: &str, account: &FakeAccount) -> Option<TokenPair> {
        let now = Utc::now();
        let claims = AccessClaims {
            sub: email,
            exp: (now + Duration::minutes(15)).timestamp(),
            iat: now.timestamp(),
            jti: uuid::Uuid::new_v4().to_string(),
            permissions: &account.permissions,
            roles: &account.roles,
        };
        let access = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SIGNING_KEY),
        )
        .ok()?;
        let refresh = uuid::Uuid::new_v4().to_string();

        self.access.insert(
            access.clone(),
            IssuedAccess {
                email: email.to_string(),
                expired: self.issue_expired.load(Ordering::SeqCst),
            },
        );
        self.refresh.insert(refresh.clone(), email.to_string());
        Some(TokenPair::new(access, refresh))
    }

    fn sessions(&self, body: Option<&Value>) -> ApiResponse {
        let email = body.and_then(|b| b.get("email")).and_then(Value::as_str);
        let password = body.and_then(|b| b.get("password")).and_then(Value::as_str);
        let (Some(email), Some(password)) = (email, password) else {
            return failure(400, "request.invalid");
        };
        let Some(account) = self
            .accounts
            .get(email)
            .map(|a| a.clone())
            .filter(|a| a.password == password)
        else {
            return failure(401, "credentials.invalid");
        };
        match self.issue_for(email, &account) {
            Some(tokens) => ApiResponse::new(
                200,
                json!({
                    "token": tokens.access_token.0,
                    "refreshToken": tokens.refresh_token.0,
                    "permissions": account.permissions,
                    "roles": account.roles,
                }),
            ),
            None => failure(500, "internal"),
        }
    }

    async fn refresh(&self, body: Option<&Value>) -> ApiResponse {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);

        let mut gate = self.refresh_gate.subscribe();
        let _ = gate.wait_for(|held| !*held).await;

        if self.fail_refresh.load(Ordering::SeqCst) {
            return failure(401, "refresh_token.invalid");
        }
        let presented = body
            .and_then(|b| b.get("refreshToken"))
            .and_then(Value::as_str)
            .unwrap_or_default();
        let Some((_, email)) = self.refresh.remove(presented) else {
            return failure(401, "refresh_token.invalid");
        };
        let Some(account) = self.accounts.get(&email).map(|a| a.clone()) else {
            return failure(401, "refresh_token.invalid");
        };
        match self.issue_for(&email, &account) {
            Some(tokens) => ApiResponse::new(
                200,
                json!({
                    "token": tokens.access_token.0,
                    "refreshToken": tokens.refresh_token.0,
                }),
            ),
            None => failure(500, "internal"),
        }
    }

    fn me(&self, bearer: Option<&str>) -> ApiResponse {
        self.me_bearers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(bearer.map(str::to_owned));

        let Some(issued) = bearer.and_then(|b| self.access.get(b).map(|e| e.clone())) else {
            return failure(401, "token.invalid");
        };
        if issued.expired {
            return failure(401, "token.expired");
        }
        match self.accounts.get(&issued.email) {
            Some(account) => ApiResponse::new(
                200,
                json!({
                    "email": issued.email,
                    "permissions": account.permissions,
                    "roles": account.roles,
                }),
            ),
            None => failure(401, "token.invalid"),
        }
    }
}

fn failure(status: u16, code: &str) -> ApiResponse {
    ApiResponse::new(status, json!({ "error": true, "code": code }))
}

#[async_trait::async_trait]
impl HttpTransport for FakeAuthApi {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let body = request.body.as_ref();
        let response = match (request.method, request.path.as_str()) {
            (Method::Post, "/sessions") => self.sessions(body),
            (Method::Post, "/refresh") => self.refresh(body).await,
            (Method::Get, "/me") => self.me(request.bearer.as_deref()),
            _ => failure(404, "not_found"),
        };
        Ok(response)
    }
}
