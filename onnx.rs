use crate::classifier::{rank, ImageClassifier};
use crate::error::{Error, Result};
use crate::models::Classification;
use image::imageops::FilterType;
use image::DynamicImage;
use ndarray::Array4;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Tensor;

const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Single-input image classification model with a `<model>.labels.txt` sidecar,
/// one label per output index.
pub struct OnnxClassifier {
    session: Mutex<Session>,
    labels: Vec<String>,
    input_size: u32,
    model_path: PathBuf,
}

impl OnnxClassifier {
    pub fn load(model_path: &Path, input_size: u32) -> Result<Self> {
        let labels = load_labels(model_path)?;
        let session = build_session(model_path)?;
        log::info!(
            "Loaded classifier {} with {} labels",
            model_path.display(),
            labels.len()
        );
        Ok(Self {
            session: Mutex::new(session),
            labels,
            input_size,
            model_path: model_path.to_path_buf(),
        })
    }

    fn run_logits(&self, image: &DynamicImage) -> Result<Vec<f32>> {
        let size = self.input_size;
        let resized = image
            .resize_exact(size, size, FilterType::Triangle)
            .to_rgb32f();
        let input = rgb32f_to_nchw_normalized(&resized, size, size);
        let array = Array4::from_shape_vec((1, 3, size as usize, size as usize), input)
            .map_err(|e| Error::Classification(format!("Invalid input tensor shape: {e}")))?;
        let tensor = Tensor::from_array(array).map_err(|e| Error::Classification(format!("{e}")))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| Error::Classification("classifier session poisoned".into()))?;
        let outputs = session
            .run(ort::inputs![tensor])
            .map_err(|e| Error::Classification(format!("Failed to run classifier: {e}")))?;
        if outputs.len() == 0 {
            log::warn!("Classifier {} returned no outputs", self.model_path.display());
            return Ok(Vec::new());
        }
        let (_, logits) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| Error::Classification(format!("Unexpected classifier output: {e}")))?;
        Ok(logits.to_vec())
    }
}

impl ImageClassifier for OnnxClassifier {
    fn classify(&self, image: &DynamicImage) -> Result<Vec<Classification>> {
        let logits = self.run_logits(image)?;
        let count = logits.len().min(self.labels.len());
        if logits.len() != self.labels.len() {
            log::warn!(
                "Classifier {} produced {} scores for {} labels",
                self.model_path.display(),
                logits.len(),
                self.labels.len()
            );
        }
        let probs = to_probabilities(&logits[..count]);
        let results = self.labels[..count]
            .iter()
            .cloned()
            .zip(probs)
            .map(|(label, confidence)| Classification { label, confidence })
            .collect();
        Ok(rank(results))
    }
}

fn ensure_environment() -> Result<()> {
    ort::init()
        .with_name("deadline")
        .commit()
        .map_err(|e| Error::Init(format!("Failed to init ORT environment: {e}")))?;
    Ok(())
}

fn build_session(model_path: &Path) -> Result<Session> {
    if !model_path.exists() {
        return Err(Error::Init(format!(
            "Model not found: {}",
            model_path.display()
        )));
    }
    ensure_environment()?;

    let build = || -> Result<Session> {
        Session::builder()
            .map_err(|e| Error::Init(format!("{e}")))?
            .with_optimization_level(GraphOptimizationLevel::Level1)
            .map_err(|e| Error::Init(format!("{e}")))?
            .commit_from_file(model_path)
            .map_err(|e| Error::Init(format!("{e}")))
    };
    // A missing or mismatched runtime library panics inside ort.
    match std::panic::catch_unwind(std::panic::AssertUnwindSafe(build)) {
        Ok(res) => res,
        Err(_) => Err(Error::Init(
            "ONNX Runtime panicked while building session".into(),
        )),
    }
}

fn labels_path(model_path: &Path) -> PathBuf {
    model_path.with_extension("labels.txt")
}

fn load_labels(model_path: &Path) -> Result<Vec<String>> {
    let path = labels_path(model_path);
    let contents = std::fs::read_to_string(&path).map_err(|e| {
        Error::Init(format!("Failed to read labels from {}: {e}", path.display()))
    })?;
    let labels: Vec<String> = contents.lines().filter_map(normalize_label).collect();
    if labels.is_empty() {
        return Err(Error::Init(format!(
            "Labels file is empty or invalid: {}",
            path.display()
        )));
    }
    Ok(labels)
}

/// Accepts `label`, `3 label`, `3: label` and quoted forms. Case is kept so
/// labels match catalog keys exactly.
fn normalize_label(line: &str) -> Option<String> {
    let mut label = line.trim();
    if label.is_empty() || label.starts_with('#') {
        return None;
    }
    if let Some((prefix, rest)) = label.split_once(':') {
        if !prefix.is_empty() && prefix.chars().all(|c| c.is_ascii_digit()) {
            label = rest.trim();
        }
    } else if let Some((first, rest)) = label.split_once(char::is_whitespace) {
        if !first.is_empty() && first.chars().all(|c| c.is_ascii_digit()) && !rest.trim().is_empty() {
            label = rest.trim();
        }
    }
    label = label.trim_matches('"').trim_matches('\'');
    if label.is_empty() {
        return None;
    }
    Some(label.to_string())
}

/// Outputs that already look like a distribution are used as-is.
fn to_probabilities(values: &[f32]) -> Vec<f32> {
    let in_range = values.iter().all(|v| (0.0..=1.0).contains(v));
    let sum: f32 = values.iter().sum();
    if in_range && (sum - 1.0).abs() < 1e-3 {
        return values.to_vec();
    }
    softmax(values)
}

fn softmax(values: &[f32]) -> Vec<f32> {
    if values.is_empty() {
        return Vec::new();
    }
    let max_val = values.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let mut exps = Vec::with_capacity(values.len());
    let mut sum = 0.0;
    for v in values {
        let e = (v - max_val).exp();
        exps.push(e);
        sum += e;
    }
    if sum <= 0.0 {
        return vec![0.0; values.len()];
    }
    exps.iter().map(|e| e / sum).collect()
}

fn rgb32f_to_nchw_normalized(img: &image::Rgb32FImage, w: u32, h: u32) -> Vec<f32> {
    let plane = (w * h) as usize;
    let mut input = vec![0.0; plane * 3];
    for (x, y, pixel) in img.enumerate_pixels() {
        let idx = (y * w + x) as usize;
        input[idx] = (pixel[0] - IMAGENET_MEAN[0]) / IMAGENET_STD[0];
        input[idx + plane] = (pixel[1] - IMAGENET_MEAN[1]) / IMAGENET_STD[1];
        input[idx + plane * 2] = (pixel[2] - IMAGENET_MEAN[2]) / IMAGENET_STD[2];
    }
    input
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_accept_index_prefixes() {
        assert_eq!(normalize_label("0 apple").as_deref(), Some("apple"));
        assert_eq!(normalize_label("12: bell pepper").as_deref(), Some("bell pepper"));
        assert_eq!(normalize_label("\"Baked Potato\"").as_deref(), Some("Baked Potato"));
        assert_eq!(normalize_label("soy beans").as_deref(), Some("soy beans"));
        assert_eq!(normalize_label("   "), None);
        assert_eq!(normalize_label("# comment"), None);
    }

    #[test]
    fn softmax_sums_to_one() {
        let probs = to_probabilities(&[2.0, 1.0, 0.1]);
        let sum: f32 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        assert!(probs[0] > probs[1] && probs[1] > probs[2]);
    }

    #[test]
    fn distributions_pass_through() {
        assert_eq!(to_probabilities(&[0.25, 0.75]), vec![0.25, 0.75]);
    }

    #[test]
    fn missing_model_fails_to_load() {
        let dir = tempfile::tempdir().unwrap();
        let model = dir.path().join("food_classifier.onnx");
        std::fs::write(labels_path(&model), "pizza\nsushi\n").unwrap();
        assert!(OnnxClassifier::load(&model, 224).is_err());
    }

    #[test]
    fn nchw_layout_splits_channels() {
        let img = image::Rgb32FImage::from_pixel(2, 1, image::Rgb([0.485, 0.456, 0.406]));
        let input = rgb32f_to_nchw_normalized(&img, 2, 1);
        assert_eq!(input.len(), 6);
        assert!(input.iter().all(|v| v.abs() < 1e-6));
    }
}
