use std::convert::Infallible;
use thiserror::Error;
use tracing::warn;
use warp::http::StatusCode;
use warp::{Rejection, reject};

pub async fn recover_error(err: Rejection) -> Result<impl warp::Reply, Infallible> {
    let (status, message) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "Not found".to_string())
    } else if let Some(err) = err.find::<PageError>() {
        (err.status(), err.to_string())
    } else if err
        .find::<warp::filters::body::BodyDeserializeError>()
        .is_some()
    {
        (StatusCode::BAD_REQUEST, PageError::BadRequest.to_string())
    } else {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Unhandled error: {:?}", err),
        )
    };
    let body = format!("<h1>{}</h1><p>{}</p>", status.as_u16(), message);
    Ok(warp::reply::with_status(warp::reply::html(body), status))
}

#[derive(Debug, Clone, Error)]
pub enum PageError {
    #[error("Malformed request")]
    BadRequest,
    #[error("Internal error")]
    InternalError,
}

impl PageError {
    pub fn internal<E: std::fmt::Display>(error: E) -> PageError {
        warn!("Internal error: {}", error);
        PageError::InternalError
    }

    fn status(&self) -> StatusCode {
        match self {
            PageError::BadRequest => StatusCode::BAD_REQUEST,
            PageError::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl reject::Reject for PageError {}
