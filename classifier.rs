use crate::error::Result;
use crate::models::Classification;
use image::DynamicImage;

/// An image classifier, treated as an opaque collaborator.
///
/// Implementations return labels ranked by descending confidence. An empty
/// list means the model produced no usable result.
pub trait ImageClassifier: Send + Sync {
    fn classify(&self, image: &DynamicImage) -> Result<Vec<Classification>>;
}

/// Sorts by descending confidence, ties keep their original order.
pub fn rank(mut results: Vec<Classification>) -> Vec<Classification> {
    results.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    results
}

pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage> {
    Ok(image::load_from_memory(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_orders_by_confidence() {
        let ranked = rank(vec![
            Classification {
                label: "onion".into(),
                confidence: 0.2,
            },
            Classification {
                label: "garlic".into(),
                confidence: 0.7,
            },
        ]);
        assert_eq!(ranked[0].label, "garlic");
    }

    #[test]
    fn undecodable_bytes_are_an_error() {
        assert!(decode_image(b"not an image").is_err());
    }
}
