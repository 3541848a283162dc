use super::error::*;
use crate::application_impl::AuthClient;
use crate::application_port::*;
use crate::domain_model::*;
use crate::infra::CookieSessionStore;
use crate::logger::*;
use crate::server::Server;
use serde::Deserialize;
use std::sync::Arc;
use warp::http::header::{CONTENT_TYPE, LOCATION, SET_COOKIE};
use warp::http::{Response, StatusCode};
use warp::reject;

const LANDING: &str = "<h1>Sign in</h1><p>POST /login with {\"email\", \"password\"}.</p>";

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Turns a guard decision into a response carrying the request's cookie writes.
fn respond(
    decision: GuardDecision<String>,
    store: &CookieSessionStore,
) -> Result<Response<String>, warp::Rejection> {
    let (builder, body) = match decision {
        GuardDecision::Allow(html) => (
            Response::builder()
                .status(StatusCode::OK)
                .header(CONTENT_TYPE, "text/html; charset=utf-8"),
            html,
        ),
        GuardDecision::RedirectTo(redirect) => {
            let status = if redirect.permanent {
                StatusCode::PERMANENT_REDIRECT
            } else {
                StatusCode::FOUND
            };
            (
                Response::builder()
                    .status(status)
                    .header(LOCATION, redirect.destination),
                String::new(),
            )
        }
        GuardDecision::Rethrow(e) => {
            return Err(reject::custom(PageError::internal(format!("{:#}", e))));
        }
    };

    let builder = store
        .take_set_cookies()
        .into_iter()
        .fold(builder, |builder, cookie| builder.header(SET_COOKIE, cookie));
    builder
        .body(body)
        .map_err(PageError::internal)
        .map_err(reject::custom)
}

pub async fn landing() -> Result<impl warp::Reply, warp::Rejection> {
    Ok(warp::reply::html(LANDING))
}

pub async fn dashboard(
    cookie: Option<String>,
    server: Arc<Server>,
) -> Result<Response<String>, warp::Rejection> {
    let (api, store) = server.render_client(cookie.as_deref());
    let api = &api;
    let decision = server
        .guard
        .run(store.as_ref(), None, || async move {
            let user: User = api.get_json("/me").await?;
            Ok::<_, anyhow::Error>(format!(
                "<h1>Dashboard</h1><p>Signed in as {}</p>",
                escape(&user.email)
            ))
        })
        .await;
    respond(decision, &store)
}

pub fn metrics_options() -> GuardOptions {
    GuardOptions::new()
        .permissions(["metrics.list"])
        .roles(["administrator"])
}

pub async fn metrics(
    cookie: Option<String>,
    server: Arc<Server>,
) -> Result<Response<String>, warp::Rejection> {
    let (api, store) = server.render_client(cookie.as_deref());
    let options = metrics_options();
    let decision = server
        .guard
        .run(store.as_ref(), Some(&options), || async move {
            let user: User = api.get_json("/me").await?;
            debug!(email = %user.email, "rendering metrics");
            Ok::<_, anyhow::Error>("<h1>Metrics</h1>".to_string())
        })
        .await;
    respond(decision, &store)
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

pub async fn login(
    body: LoginRequest,
    server: Arc<Server>,
) -> Result<Response<String>, warp::Rejection> {
    let (api, store) = server.render_client(None);
    let auth = AuthClient::new(Arc::new(api), server.guard_home());
    let credentials = SignInCredentials {
        email: body.email,
        password: body.password,
    };

    let decision = match auth.sign_in(credentials).await {
        Ok(_) => GuardDecision::RedirectTo(Redirect::temporary(server.guard_home())),
        Err(ApiError::Status { status, .. }) if status < 500 => {
            info!(status, "sign-in refused");
            GuardDecision::RedirectTo(Redirect::temporary(server.guard_landing()))
        }
        Err(e) => GuardDecision::Rethrow(e.into()),
    };
    respond(decision, &store)
}
