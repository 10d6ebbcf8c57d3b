//! Property tests for color matching, string similarity and block merging.

use marginalia::Rgb;
use marginalia::color::{PALETTE, nearest_color, similarity};
use marginalia::export::{append_blocks, drop_existing, split_blocks};
use marginalia::similarity::ratio;
use proptest::prelude::*;

fn unit() -> impl Strategy<Value = f32> {
    0.0f32..=1.0
}

fn rgb() -> impl Strategy<Value = Rgb> {
    (unit(), unit(), unit()).prop_map(|(r, g, b)| Rgb::new(r, g, b))
}

fn line() -> impl Strategy<Value = String> {
    "[a-z][a-z ]{0,30}".prop_map(|s| format!("> {s}"))
}

proptest! {
    #[test]
    fn prop_color_similarity_symmetric(a in rgb(), b in rgb()) {
        prop_assert!((similarity(&a, &b) - similarity(&b, &a)).abs() < 1e-12);
    }

    #[test]
    fn prop_color_similarity_bounds(a in rgb(), b in rgb()) {
        let score = similarity(&a, &b);
        // the largest distance inside the unit cube is sqrt(3)
        prop_assert!(score <= 1.0);
        prop_assert!(score >= 1.0 - 3f64.sqrt() / 3.0 - 1e-9);
        prop_assert_eq!(similarity(&a, &a), 1.0);
    }

    #[test]
    fn prop_palette_colors_match_themselves(index in 0..PALETTE.len()) {
        let (name, color) = PALETTE[index];
        prop_assert_eq!(nearest_color(&color, 0.833), Some(name));
    }

    #[test]
    fn prop_color_similarity_grows_toward_palette(
        index in 0..PALETTE.len(),
        color in rgb(),
        step in 0.0f32..=1.0
    ) {
        let (_, target) = PALETTE[index];
        let closer = Rgb::new(
            color.r + (target.r - color.r) * step,
            color.g + (target.g - color.g) * step,
            color.b + (target.b - color.b) * step,
        );
        prop_assert!(similarity(&target, &closer) >= similarity(&target, &color) - 1e-6);
        prop_assert!(similarity(&target, &target) >= similarity(&target, &closer));
    }

    #[test]
    fn prop_nearest_color_reaches_threshold(color in rgb(), threshold in 0.5f64..1.0) {
        if let Some(name) = nearest_color(&color, threshold) {
            let (_, matched) = PALETTE.iter().find(|(n, _)| *n == name).unwrap();
            prop_assert!(similarity(matched, &color) >= threshold);
        }
    }

    #[test]
    fn prop_ratio_bounds_and_symmetry(a in ".{0,24}", b in ".{0,24}") {
        let forward = ratio(&a, &b);
        prop_assert!((0.0..=1.0).contains(&forward));
        prop_assert!((forward - ratio(&b, &a)).abs() < 1e-12);
        prop_assert_eq!(ratio(&a, &a), 1.0);
    }

    #[test]
    fn prop_merging_twice_adds_nothing(
        old in prop::collection::vec(line(), 0..5),
        new in prop::collection::vec(line(), 1..5)
    ) {
        let existing = if old.is_empty() { String::new() } else { old.join("\n\n") + "\n" };
        let blocks = split_blocks(&new.join("\n\n"));

        let lines: Vec<&str> = existing.lines().collect();
        let fresh = drop_existing(blocks.clone(), &lines, 0.75);
        let merged = if fresh.is_empty() {
            existing.clone()
        } else {
            existing.clone() + &append_blocks(&existing, &fresh)
        };

        let merged_lines: Vec<&str> = merged.lines().collect();
        prop_assert!(drop_existing(blocks, &merged_lines, 0.75).is_empty());
    }
}
