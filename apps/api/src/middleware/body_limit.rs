use std::error::Error;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use http_body_util::{LengthLimitError, Limited};

use crate::state::AppState;

/// Caps how many body bytes downstream readers may consume.
///
/// Reading past the ceiling fails with [`LengthLimitError`] somewhere in the error
/// source chain; handlers turn that into 413.
pub async fn limit_body_size(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let (parts, body) = request.into_parts();
    let body = Body::new(Limited::new(body, state.max_body_size));

    next.run(Request::from_parts(parts, body)).await
}

/// Returns whether a body read failed because the ceiling was exceeded.
pub fn is_length_limit_error(error: &(dyn Error + 'static)) -> bool {
    let mut current = Some(error);
    while let Some(candidate) = current {
        if candidate.is::<LengthLimitError>() {
            return true;
        }
        current = candidate.source();
    }

    false
}
