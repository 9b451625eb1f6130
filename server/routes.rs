use std::io::Cursor;

use log::debug;
use serde::Serialize;
use tiny_http::{Header, Method, Request, Response, StatusCode};

use ferrite_digits::ErrorBody;

use crate::handlers;
use crate::state::SharedState;

pub type HttpResponse = Response<Cursor<Vec<u8>>>;

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

fn header(name: &str, value: &str) -> Option<Header> {
    Header::from_bytes(name.as_bytes(), value.as_bytes()).ok()
}

pub fn bytes_response(status: u16, content_type: &str, body: Vec<u8>) -> HttpResponse {
    let len = body.len();
    Response::new(
        StatusCode(status),
        header("Content-Type", content_type).into_iter().collect(),
        Cursor::new(body),
        Some(len),
        None,
    )
}

pub fn json_response<T: Serialize>(status: u16, body: &T) -> HttpResponse {
    match serde_json::to_vec(body) {
        Ok(bytes) => bytes_response(status, "application/json", bytes),
        Err(_) => bytes_response(
            500,
            "application/json",
            br#"{"error":"Internal server error"}"#.to_vec(),
        ),
    }
}

pub fn json_error(status: u16, message: &str) -> HttpResponse {
    json_response(status, &ErrorBody::new(message))
}

pub fn not_found() -> HttpResponse {
    json_error(404, "Not found")
}

// ---------------------------------------------------------------------------
// Request dispatcher
// ---------------------------------------------------------------------------

/// Dispatches one request and responds to it.
///
/// `POST /predict` is the only API route; every other `GET` is a front-end
/// asset (or the SPA index as fallback).
pub fn dispatch(mut request: Request, state: SharedState) {
    let method = request.method().clone();
    let url    = request.url().to_owned();
    let path   = url.split('?').next().unwrap_or("").to_owned();

    let response = match (&method, path.as_str()) {
        (Method::Post, "/predict") => handlers::predict::handle(&mut request, &state),
        (Method::Get, _)           => handlers::static_files::handle(&path, &state.config.static_dir),
        _                          => not_found(),
    };

    debug!("{} {} -> {}", method, path, response.status_code().0);
    let _ = request.respond(response);
}
