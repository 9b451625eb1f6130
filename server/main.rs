/// ferrite-digits server
///
/// Loads the digit classifier once, then serves `POST /predict` and the
/// front-end bundle from a synchronous tiny_http server.
///
/// Run with:
///   DIGITS_MODEL_PATH=model.json cargo run --release
/// Then POST `{"image": "data:image/png;base64,..."}` to
/// http://127.0.0.1:5000/predict

mod state;
mod routes;
mod handlers;

use std::process::ExitCode;
use std::sync::Arc;

use log::{error, info};
use tiny_http::Server;

use ferrite_digits::{Canonicalizer, ClassifierHandle, PredictionService, ServeConfig};

use state::AppState;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match ServeConfig::from_env() {
        Ok(c)  => c,
        Err(e) => {
            error!("invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // The model must load before we accept a single request.
    let classifier = match ClassifierHandle::load(&config.model_path) {
        Ok(c)  => c,
        Err(e) => {
            error!("failed to load model: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let addr = config.addr();
    let server = match Server::http(&addr) {
        Ok(s)  => s,
        Err(e) => {
            error!("failed to bind {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    let canonicalizer = Canonicalizer::new(config.resize_filter);
    info!(
        "listening on http://{} (resize filter: {:?}, static dir: {})",
        addr,
        canonicalizer.filter(),
        config.static_dir.display()
    );

    let service = PredictionService::with_canonicalizer(classifier, canonicalizer);
    let shared_state = Arc::new(AppState::new(service, config));

    // Each request runs on its own thread; inference blocks only that thread.
    for request in server.incoming_requests() {
        let state_clone = shared_state.clone();
        std::thread::spawn(move || {
            routes::dispatch(request, state_clone);
        });
    }

    ExitCode::SUCCESS
}
