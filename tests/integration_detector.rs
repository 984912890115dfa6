//! Integration tests for the duplicate detector.
//!
//! These tests verify end-to-end detection behavior including:
//! - Empty stores
//! - Exact, similar and same-recipe matches
//! - Solid colours of different brightness staying apart
//! - Exclusion of the recipe being edited
//! - Both store backends

use image::{DynamicImage, ImageBuffer, ImageFormat, Luma, Rgb};
use recipe_dedup::core::detector::{DetectorConfig, DuplicateDetector};
use recipe_dedup::core::fingerprint::IngredientLine;
use recipe_dedup::core::matcher::MatchType;
use recipe_dedup::core::store::{InMemorySignatureStore, RecipeSignature, SqliteSignatureStore};
use std::io::Cursor;
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

fn encode(image: &DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    image.write_to(&mut buffer, format).unwrap();
    buffer.into_inner()
}

fn pixel(x: u32, y: u32) -> u8 {
    let seed = (x.wrapping_mul(7919) ^ y.wrapping_mul(104_729)).wrapping_mul(2_654_435_761);
    (seed >> 24) as u8
}

/// Deterministic noisy photo stand-in
fn photo(invert: bool) -> DynamicImage {
    DynamicImage::ImageRgb8(ImageBuffer::from_fn(96, 96, |x, y| {
        let v = pixel(x, y);
        let v = if invert { 255 - v } else { v };
        Rgb([v, v / 2, 255 - v / 3])
    }))
}

fn other_photo() -> DynamicImage {
    DynamicImage::ImageLuma8(ImageBuffer::from_fn(80, 80, |x, y| Luma([((x + y) * 3 % 256) as u8])))
}

fn solid(r: u8, g: u8, b: u8) -> DynamicImage {
    DynamicImage::ImageRgb8(ImageBuffer::from_fn(100, 100, |_, _| Rgb([r, g, b])))
}

fn margarita() -> Vec<IngredientLine> {
    vec![
        IngredientLine::new("Tequila", Some(2.0), Some("oz")),
        IngredientLine::new("Lime Juice", Some(1.0), Some("oz")),
        IngredientLine::new("Triple Sec", Some(0.75), Some("oz")),
    ]
}

fn in_memory(signatures: Vec<RecipeSignature>) -> DuplicateDetector {
    let store = Arc::new(InMemorySignatureStore::new());
    for sig in signatures {
        store.insert(sig).unwrap();
    }
    DuplicateDetector::new(store)
}

#[test]
fn empty_store_finds_nothing() {
    let detector = in_memory(vec![]);
    let bytes = encode(&photo(false), ImageFormat::Png);

    let result = detector
        .check_for_duplicates(&bytes, Some("Margarita"), Some(&margarita()), None, None)
        .unwrap();

    assert!(!result.is_duplicate);
    assert!(result.matches.is_empty());
    assert!(result.best_match().is_none());
}

#[test]
fn identical_upload_is_an_exact_match() {
    let bytes = encode(&photo(false), ImageFormat::Png);
    let hashes = in_memory(vec![]).compute_hashes(&bytes).unwrap();
    let detector = in_memory(vec![
        RecipeSignature::new("r1", "Margarita").content_hash(hashes.content_hash.clone()),
    ]);

    let result = detector.check_for_duplicates(&bytes, None, None, None, None).unwrap();

    assert!(result.is_duplicate);
    assert_eq!(result.matches.len(), 1);
    let best = result.best_match().unwrap();
    assert_eq!(best.recipe_id, "r1");
    assert_eq!(best.match_type, MatchType::ExactImage);
    assert_eq!(best.confidence, 1.0);
}

#[test]
fn recipe_matched_by_content_and_perceptual_hash_appears_once() {
    let bytes = encode(&photo(false), ImageFormat::Png);
    let detector = in_memory(vec![]);
    let hashes = detector.compute_hashes(&bytes).unwrap();
    let detector = in_memory(vec![RecipeSignature::new("r1", "Margarita")
        .content_hash(hashes.content_hash)
        .perceptual_hash(hashes.perceptual_hash)]);

    let result = detector.check_for_duplicates(&bytes, None, None, None, None).unwrap();

    assert_eq!(result.matches.len(), 1);
    assert_eq!(result.matches[0].confidence, 1.0);
}

#[test]
fn re_encoded_image_is_similar() {
    let png = encode(&photo(false), ImageFormat::Png);
    let bmp = encode(&photo(false), ImageFormat::Bmp);
    let detector = in_memory(vec![]);
    let stored = detector.compute_hashes(&png).unwrap();
    let detector = in_memory(vec![RecipeSignature::new("r1", "Margarita")
        .content_hash(stored.content_hash)
        .perceptual_hash(stored.perceptual_hash)]);

    let result = detector.check_for_duplicates(&bmp, None, None, None, None).unwrap();

    assert_eq!(result.matches.len(), 1);
    let best = result.best_match().unwrap();
    assert_eq!(best.match_type, MatchType::SimilarImage);
    assert_eq!(best.confidence, 1.0);
    assert_eq!(best.details, "Visually similar image (hamming distance: 0)");
}

#[test]
fn inverted_image_is_not_similar() {
    let detector = in_memory(vec![]);
    let stored = detector.compute_hashes(&encode(&photo(false), ImageFormat::Png)).unwrap();
    let detector = in_memory(vec![RecipeSignature::new("r1", "Margarita")
        .perceptual_hash(stored.perceptual_hash)]);

    let inverted = encode(&photo(true), ImageFormat::Png);
    let result = detector.check_for_duplicates(&inverted, None, None, None, None).unwrap();

    assert!(!result.is_duplicate);
}

#[test]
fn solid_red_is_not_a_duplicate_of_solid_black() {
    let detector = in_memory(vec![]);
    let black = detector.compute_hashes(&encode(&solid(0, 0, 0), ImageFormat::Png)).unwrap();
    let detector = in_memory(vec![RecipeSignature::new("r1", "Black Russian")
        .content_hash(black.content_hash)
        .perceptual_hash(black.perceptual_hash)]);

    let red = encode(&solid(255, 0, 0), ImageFormat::Png);
    let result = detector.check_for_duplicates(&red, None, None, None, None).unwrap();

    assert!(!result.is_duplicate);
    assert!(result.matches.is_empty());
}

#[test]
fn reordered_ingredients_match_same_recipe() {
    let detector = in_memory(vec![]);
    let fingerprint = detector.compute_fingerprint("Margarita", &margarita());
    let detector = in_memory(vec![RecipeSignature::new("r1", "Margarita").fingerprint(fingerprint)]);

    let mut reversed = margarita();
    reversed.reverse();
    let upload = encode(&other_photo(), ImageFormat::Png);

    let result = detector
        .check_for_duplicates(&upload, Some("Margarita"), Some(&reversed), None, None)
        .unwrap();

    assert_eq!(result.matches.len(), 1);
    assert_eq!(result.matches[0].match_type, MatchType::SameRecipe);
    assert_eq!(result.matches[0].confidence, 0.95);
    assert_eq!(result.matches[0].recipe_name, "Margarita");
}

#[test]
fn editing_a_recipe_does_not_match_itself() {
    let bytes = encode(&photo(false), ImageFormat::Png);
    let detector = in_memory(vec![]);
    let recipe = detector
        .compute_recipe_hashes(&bytes, "Margarita", &margarita(), None)
        .unwrap();
    let detector = in_memory(vec![RecipeSignature::new("r1", "Margarita")
        .content_hash(recipe.content_hash)
        .perceptual_hash(recipe.perceptual_hash)
        .fingerprint(recipe.recipe_fingerprint)]);

    let result = detector
        .check_for_duplicates(&bytes, Some("Margarita"), Some(&margarita()), Some("r1"), None)
        .unwrap();

    assert!(!result.is_duplicate);
}

#[test]
fn all_signals_merge_into_sorted_result() {
    let bytes = encode(&photo(false), ImageFormat::Png);
    let detector = in_memory(vec![]);
    let hashes = detector.compute_hashes(&bytes).unwrap();
    let fingerprint = detector.compute_fingerprint("Margarita", &margarita());

    let detector = in_memory(vec![
        RecipeSignature::new("a", "Margarita (blog)").fingerprint(fingerprint),
        RecipeSignature::new("b", "Margarita (photo)").content_hash(hashes.content_hash.clone()),
        RecipeSignature::new("c", "Daiquiri"),
    ]);

    let result = detector
        .check_for_duplicates(&bytes, Some("margarita "), Some(&margarita()), None, Some(&hashes))
        .unwrap();

    let ids: Vec<&str> = result.matches.iter().map(|m| m.recipe_id.as_str()).collect();
    assert_eq!(ids, vec!["b", "a"]);
    assert_eq!(result.best_match().unwrap().match_type, MatchType::ExactImage);
}

#[test]
fn similar_matches_are_capped() {
    let bytes = encode(&photo(false), ImageFormat::Png);
    let detector = in_memory(vec![]);
    let hashes = detector.compute_hashes(&bytes).unwrap();

    let signatures: Vec<_> = (0..250)
        .map(|i| {
            RecipeSignature::new(format!("r{:03}", i), format!("Copy {}", i))
                .perceptual_hash(hashes.perceptual_hash.clone())
        })
        .collect();
    let store = Arc::new(InMemorySignatureStore::new());
    for sig in signatures {
        store.insert(sig).unwrap();
    }
    let config = DetectorConfig::builder()
        .max_similar_matches(5)
        .batch_size(40)
        .build()
        .unwrap();
    let detector = DuplicateDetector::builder(store).config(config).build().unwrap();

    let result = detector
        .check_for_duplicates(&bytes, None, None, None, Some(&hashes))
        .unwrap();

    assert_eq!(result.matches.len(), 5);
    assert!(result.matches.iter().all(|m| m.match_type == MatchType::SimilarImage));
}

#[test]
fn sqlite_backend_end_to_end() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("recipes.db");
    let store = Arc::new(SqliteSignatureStore::open(&db_path).unwrap());
    let detector = DuplicateDetector::new(store.clone());

    let bytes = encode(&photo(false), ImageFormat::Png);
    let recipe = detector
        .compute_recipe_hashes(&bytes, "Margarita", &margarita(), None)
        .unwrap();
    store
        .upsert(
            &RecipeSignature::new("r1", "Margarita")
                .content_hash(recipe.content_hash)
                .perceptual_hash(recipe.perceptual_hash)
                .fingerprint(recipe.recipe_fingerprint),
        )
        .unwrap();

    let result = detector
        .check_for_duplicates(&bytes, Some("Margarita"), Some(&margarita()), None, None)
        .unwrap();

    assert_eq!(result.matches.len(), 1);
    assert_eq!(result.matches[0].recipe_id, "r1");
    assert_eq!(result.matches[0].confidence, 1.0);

    let unrelated = encode(&other_photo(), ImageFormat::Png);
    let result = detector
        .check_for_duplicates(&unrelated, Some("Old Fashioned"), None, None, None)
        .unwrap();
    assert!(!result.is_duplicate);
}

#[test]
fn detector_is_shareable_across_threads() {
    let bytes = Arc::new(encode(&photo(false), ImageFormat::Png));
    let detector = Arc::new(in_memory(vec![]));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let detector = Arc::clone(&detector);
            let bytes = Arc::clone(&bytes);
            thread::spawn(move || detector.compute_hashes(&bytes).unwrap())
        })
        .collect();

    let hashes: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(hashes.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(detector.cache_stats().entries, 1);
}
