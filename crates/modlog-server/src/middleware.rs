use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::AppState;

/// Middleware requiring `Authorization: Bearer <admin token>`.
///
/// An empty configured token rejects every request.
pub async fn admin_auth_middleware(req: Request<Body>, next: Next) -> Result<Response, StatusCode> {
    let token = match req.headers().get("Authorization") {
        Some(val) => {
            let val_str = val.to_str().map_err(|_| StatusCode::UNAUTHORIZED)?;
            val_str
                .strip_prefix("Bearer ")
                .ok_or(StatusCode::UNAUTHORIZED)?
                .to_string()
        }
        None => return Err(StatusCode::UNAUTHORIZED),
    };

    let state = req
        .extensions()
        .get::<Arc<AppState>>()
        .ok_or(StatusCode::INTERNAL_SERVER_ERROR)?
        .clone();

    if state.admin_token.is_empty() || !constant_time_eq(token.as_bytes(), state.admin_token.as_bytes()) {
        tracing::debug!(path = %req.uri().path(), "rejected admin request");
        return Err(StatusCode::UNAUTHORIZED);
    }

    Ok(next.run(req).await)
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::constant_time_eq;

    #[test]
    fn compares_tokens() {
        assert!(constant_time_eq(b"secret", b"secret"));
        assert!(!constant_time_eq(b"secret", b"secreT"));
        assert!(!constant_time_eq(b"secret", b"secret2"));
    }
}
