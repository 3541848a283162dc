use super::handler;
use crate::server::*;
use std::convert::Infallible;
use std::sync::Arc;
use warp::{Filter, http};

pub fn routes(
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let landing = warp::get()
        .and(warp::path::end())
        .and_then(handler::landing);

    let dashboard = warp::get()
        .and(warp::path("dashboard"))
        .and(warp::path::end())
        .and(with_cookies())
        .and(with(server.clone()))
        .and_then(handler::dashboard);

    let metrics = warp::get()
        .and(warp::path("metrics"))
        .and(warp::path::end())
        .and(with_cookies())
        .and(with(server.clone()))
        .and_then(handler::metrics);

    let login = warp::post()
        .and(warp::path("login"))
        .and(warp::path::end())
        .and(warp::body::json())
        .and(with(server))
        .and_then(handler::login);

    landing.or(dashboard).or(metrics).or(login)
}

fn with<ServiceType>(
    service: Arc<ServiceType>,
) -> impl Filter<Extract = (Arc<ServiceType>,), Error = Infallible> + Clone
where
    ServiceType: Send + Sync + ?Sized,
{
    warp::any().map(move || service.clone())
}

fn with_cookies() -> impl Filter<Extract = (Option<String>,), Error = warp::Rejection> + Clone {
    warp::header::optional::<String>(http::header::COOKIE.as_str())
}
