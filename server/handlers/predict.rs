use std::io::Read;

use tiny_http::Request;

use ferrite_digits::ErrorBody;

use crate::routes::{json_error, json_response, HttpResponse};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// POST /predict
// ---------------------------------------------------------------------------

pub fn handle(request: &mut Request, state: &AppState) -> HttpResponse {
    let limit = state.config.max_body_bytes;

    if request.body_length().is_some_and(|len| len > limit) {
        return too_large(limit);
    }

    let mut body = Vec::new();
    if let Err(e) = request.as_reader().take(limit as u64 + 1).read_to_end(&mut body) {
        log::warn!("failed to read request body: {}", e);
        return json_error(400, "Could not read request body");
    }
    if body.len() > limit {
        return too_large(limit);
    }

    match state.service.predict_json(&body) {
        Ok(result) => json_response(200, &result),
        Err(err)   => json_response(err.status_code(), &ErrorBody::from(&err)),
    }
}

fn too_large(limit: usize) -> HttpResponse {
    json_error(413, &format!("Request body exceeds {} bytes", limit))
}
