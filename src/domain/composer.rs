//! Composition of extraction and analysis into the canonical product.

use chrono::{DateTime, Utc};

use crate::domain::product::{AnalysisResult, Product, ProductId, RawExtraction};

/// Merges an extraction and its analysis into one canonical record.
///
/// Extraction fields are copied verbatim and the analysis is layered on
/// top; nothing is recomputed or dropped. Each call stamps the current time
/// and a fresh id, so re-analyzing the same URL always yields a distinct
/// product. No error path.
#[must_use]
pub fn compose(extraction: RawExtraction, analysis: AnalysisResult) -> Product {
    compose_with(extraction, analysis, ProductId::new(), Utc::now())
}

/// Deterministic core of [`compose`]: the same inputs, id, and timestamp
/// always produce the same product.
#[must_use]
pub fn compose_with(
    extraction: RawExtraction,
    analysis: AnalysisResult,
    id: ProductId,
    analyzed_at: DateTime<Utc>,
) -> Product {
    Product {
        id,
        source_url: extraction.source_url,
        title: extraction.title,
        price: extraction.price,
        images: extraction.images,
        description: extraction.description,
        rating: extraction.rating,
        analysis,
        analyzed_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::product::Price;
    use uuid::Uuid;

    fn sample_extraction() -> RawExtraction {
        RawExtraction {
            source_url: "https://shop.example/item/42".to_string(),
            title: Some("Widget".to_string()),
            price: Some(Price {
                amount: 19.99,
                currency: "USD".to_string(),
            }),
            images: vec!["https://shop.example/img/1.jpg".to_string()],
            description: Some("A fine widget".to_string()),
            rating: None,
        }
    }

    fn sample_analysis() -> AnalysisResult {
        AnalysisResult {
            pros: vec!["cheap".to_string()],
            cons: Vec::new(),
            recommendation: "buy".to_string(),
            alternatives: Vec::new(),
        }
    }

    #[test]
    fn composition_is_deterministic_under_fixed_id_and_time() {
        let id = ProductId::from_uuid(Uuid::from_u128(7));
        let at = DateTime::from_timestamp(1_700_000_000, 0).unwrap();

        let a = compose_with(sample_extraction(), sample_analysis(), id, at);
        let b = compose_with(sample_extraction(), sample_analysis(), id, at);

        assert_eq!(a.id, b.id);
        assert_eq!(a.analyzed_at, b.analyzed_at);
        assert_eq!(a.title, b.title);
        assert_eq!(a.price, b.price);
        assert_eq!(a.images, b.images);
        assert_eq!(a.analysis, b.analysis);
    }

    #[test]
    fn extraction_fields_are_carried_verbatim() {
        let product = compose(sample_extraction(), sample_analysis());

        assert_eq!(product.source_url, "https://shop.example/item/42");
        assert_eq!(product.title.as_deref(), Some("Widget"));
        assert_eq!(product.price.as_ref().unwrap().amount, 19.99);
        assert_eq!(product.rating, None);
        assert_eq!(product.analysis.pros, vec!["cheap"]);
    }

    #[test]
    fn repeated_composition_yields_new_identities() {
        let a = compose(sample_extraction(), sample_analysis());
        let b = compose(sample_extraction(), sample_analysis());
        assert_ne!(a.id, b.id);
    }
}
