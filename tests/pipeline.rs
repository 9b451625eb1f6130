use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use base64::{prelude::BASE64_STANDARD, Engine};
use image::{DynamicImage, ImageBuffer, ImageOutputFormat, Luma, Rgb, Rgba};

use ferrite_digits::pipeline::{CANONICAL_LEN, NUM_CLASSES, PROBABILITY_TOLERANCE};
use ferrite_digits::{
    ActivationFunction, ClassifierHandle, ErrorKind, ModelLoadError, ModelMetadata,
    Network, PredictionResult, PredictionService, Stage,
};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

fn digit_network() -> Network {
    Network::new(vec![
        (32, CANONICAL_LEN, ActivationFunction::ReLU),
        (16, 32, ActivationFunction::Tanh),
        (NUM_CLASSES, 16, ActivationFunction::Softmax),
    ])
    .with_metadata(ModelMetadata::digit_classifier("test digits"))
}

fn write_artifact(dir: &Path, network: &Network) -> std::path::PathBuf {
    let path = dir.join("digit_recognition_model.json");
    network.save_json(&path).unwrap();
    path
}

fn loaded_service(dir: &Path) -> PredictionService<ClassifierHandle> {
    let path = write_artifact(dir, &digit_network());
    PredictionService::new(ClassifierHandle::load(&path).unwrap())
}

fn encode(img: DynamicImage, format: ImageOutputFormat, mime: &str) -> String {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, format).unwrap();
    format!("data:{};base64,{}", mime, BASE64_STANDARD.encode(buf.into_inner()))
}

fn black_png(side: u32) -> String {
    let img = ImageBuffer::from_pixel(side, side, Rgba([0u8, 0, 0, 255]));
    encode(DynamicImage::ImageRgba8(img), ImageOutputFormat::Png, "image/png")
}

fn assert_well_formed(result: &PredictionResult) {
    assert!(result.digit <= 9);
    assert!((0.0..=1.0).contains(&result.confidence));
    let probs = result.probabilities.as_slice();
    assert_eq!(probs.len(), NUM_CLASSES);
    assert!((probs.iter().sum::<f64>() - 1.0).abs() < PROBABILITY_TOLERANCE);
    assert_eq!(result.confidence, probs[result.digit as usize]);
    let max = probs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    assert_eq!(probs.iter().position(|&p| p == max), Some(result.digit as usize));
}

// ---------------------------------------------------------------------------
// End to end
// ---------------------------------------------------------------------------

#[test]
fn solid_black_png_predicts_a_digit() {
    let dir = tempfile::tempdir().unwrap();
    let service = loaded_service(dir.path());

    let result = service.predict(&black_png(8)).unwrap();
    assert_well_formed(&result);

    let body = serde_json::json!({ "image": black_png(8) }).to_string();
    let via_json = service.predict_json(body.as_bytes()).unwrap();
    assert_eq!(via_json, result);

    let response = serde_json::to_value(&via_json).unwrap();
    assert!(response["digit"].is_u64());
    assert!(response["confidence"].is_f64());
    assert_eq!(response["probabilities"].as_array().unwrap().len(), 10);
}

#[test]
fn accepts_common_formats_and_layouts() {
    let dir = tempfile::tempdir().unwrap();
    let service = loaded_service(dir.path());

    let payloads = [
        encode(
            DynamicImage::ImageRgb8(ImageBuffer::from_fn(40, 30, |x, y| Rgb([(x * 6) as u8, (y * 8) as u8, 90]))),
            ImageOutputFormat::Jpeg(90),
            "image/jpeg",
        ),
        encode(
            DynamicImage::ImageRgb8(ImageBuffer::from_pixel(17, 17, Rgb([255, 255, 255]))),
            ImageOutputFormat::Bmp,
            "image/bmp",
        ),
        encode(
            DynamicImage::ImageLuma8(ImageBuffer::from_fn(280, 280, |x, _| Luma([if x > 140 { 255 } else { 0 }]))),
            ImageOutputFormat::Png,
            "image/png",
        ),
        encode(
            DynamicImage::ImageLuma16(ImageBuffer::from_pixel(5, 9, Luma([40_000u16]))),
            ImageOutputFormat::Png,
            "image/png",
        ),
    ];

    for payload in &payloads {
        let result = service.predict(payload).unwrap();
        assert_well_formed(&result);
    }

    // Bare base64 without a data-URI header is accepted too.
    let bare = black_png(12).split_once(',').unwrap().1.to_owned();
    assert_well_formed(&service.predict(&bare).unwrap());
}

#[test]
fn identical_payloads_give_identical_predictions() {
    let dir = tempfile::tempdir().unwrap();
    let service = Arc::new(loaded_service(dir.path()));
    let payload = encode(
        DynamicImage::ImageRgba8(ImageBuffer::from_fn(64, 48, |x, y| Rgba([x as u8 * 3, y as u8 * 5, 17, 255]))),
        ImageOutputFormat::Png,
        "image/png",
    );
    let expected = service.predict(&payload).unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let service = Arc::clone(&service);
            let payload = payload.clone();
            std::thread::spawn(move || service.predict(&payload).unwrap())
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }
}

#[test]
fn bad_input_is_a_client_error() {
    let dir = tempfile::tempdir().unwrap();
    let service = loaded_service(dir.path());

    let cases: [(&[u8], Stage); 5] = [
        (br#"{"image":"data:image/png;base64,!!!notbase64!!!"}"#, Stage::Decode),
        (br#"{"image":"data:text/plain;base64,SGVsbG8gdGhlcmUh"}"#, Stage::Decode),
        (br#"{"image":""}"#, Stage::Decode),
        (br#"{"data":"data:image/png;base64,AAAA"}"#, Stage::Request),
        (b"not json", Stage::Request),
    ];
    for (body, stage) in cases {
        let err = service.predict_json(body).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest, "{:?}", String::from_utf8_lossy(body));
        assert_eq!(err.stage(), stage);
        assert_eq!(err.status_code(), 400);
    }
}

// ---------------------------------------------------------------------------
// Artifact loading
// ---------------------------------------------------------------------------

#[test]
fn missing_artifact_fails_at_load() {
    let dir = tempfile::tempdir().unwrap();
    let err = ClassifierHandle::load(dir.path().join("nope.json")).unwrap_err();
    assert!(matches!(err, ModelLoadError::Read { .. }));
}

#[test]
fn corrupt_artifact_fails_at_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.json");
    std::fs::write(&path, b"{\"layers\": [ {\"size\": 10, ").unwrap();
    let err = ClassifierHandle::load(&path).unwrap_err();
    assert!(matches!(err, ModelLoadError::Read { .. }));
    assert!(err.to_string().contains("model.json"));
}

#[test]
fn incompatible_artifact_fails_at_load() {
    let dir = tempfile::tempdir().unwrap();
    let mnist_rgb = Network::new(vec![(NUM_CLASSES, 28 * 28 * 3, ActivationFunction::Softmax)]);
    let path = write_artifact(dir.path(), &mnist_rgb);
    let err = ClassifierHandle::load(&path).unwrap_err();
    assert!(matches!(err, ModelLoadError::Incompatible { .. }));

    let regression = Network::new(vec![(1, CANONICAL_LEN, ActivationFunction::Identity)]);
    let path = write_artifact(dir.path(), &regression);
    assert!(matches!(ClassifierHandle::load(&path), Err(ModelLoadError::Incompatible { .. })));
}

#[test]
fn loaded_handle_reports_its_architecture() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_artifact(dir.path(), &digit_network());
    let handle = ClassifierHandle::load(&path).unwrap();
    assert_eq!(handle.path(), path.as_path());
    assert_eq!(handle.summary(), "784 → 32 (ReLU) → 16 (Tanh) → 10 (Softmax)");
    assert_eq!(handle.network().layers.len(), 3);
}
