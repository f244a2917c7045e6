//! OPTIONS handling.
//!
//! Browsers only send CORS preflights with `Access-Control-Request-Method`,
//! which `CorsLayer` answers itself. Any other OPTIONS request is answered
//! here with an empty 200 so clients never see 405 on a known path.

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

pub async fn options_ok(req: Request<Body>, next: Next) -> Response {
    if req.method() == Method::OPTIONS {
        return StatusCode::OK.into_response();
    }
    next.run(req).await
}
