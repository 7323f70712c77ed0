//! Matching engine behavior on synthetic screens.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeSet;
use uilocator::{ImageView, LocateError, MatchConfig, Matcher, OwnedImage, Point};

const TPL_W: usize = 16;
const TPL_H: usize = 12;
const SCREEN_W: usize = 240;
const SCREEN_H: usize = 120;

/// Exact copy, then copies with growing uniform noise amplitude.
const INSTANCES: [(usize, usize, i32); 4] = [
    (40, 30, 0),
    (120, 70, 20),
    (200, 20, 50),
    (80, 90, 90),
];

fn pattern_value(x: usize, y: usize) -> u8 {
    (((x * 37) ^ (y * 59) ^ (x * y * 11)) & 0xFF) as u8
}

fn color_of(v: u8) -> [u8; 3] {
    [v, v / 2 + 60, 200 - v / 2]
}

fn noisy(v: u8, amplitude: i32, rng: &mut StdRng) -> u8 {
    if amplitude == 0 {
        return v;
    }
    (v as i32 + rng.random_range(-amplitude..=amplitude)).clamp(0, 255) as u8
}

fn gray_template() -> OwnedImage {
    let data = (0..TPL_H)
        .flat_map(|y| (0..TPL_W).map(move |x| pattern_value(x, y)))
        .collect();
    OwnedImage::new(data, TPL_W, TPL_H).unwrap()
}

fn color_template() -> OwnedImage {
    let data = (0..TPL_H)
        .flat_map(|y| (0..TPL_W).flat_map(move |x| color_of(pattern_value(x, y))))
        .collect();
    OwnedImage::with_channels(data, TPL_W, TPL_H, 3).unwrap()
}

fn screen(channels: usize, seed: u64) -> OwnedImage {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut data: Vec<u8> = (0..SCREEN_W * SCREEN_H * channels)
        .map(|_| rng.random::<u8>())
        .collect();
    for &(x0, y0, amplitude) in &INSTANCES {
        for y in 0..TPL_H {
            for x in 0..TPL_W {
                let v = pattern_value(x, y);
                let base = ((y0 + y) * SCREEN_W + x0 + x) * channels;
                if channels == 1 {
                    data[base] = noisy(v, amplitude, &mut rng);
                } else {
                    for (c, value) in color_of(v).into_iter().enumerate() {
                        data[base + c] = noisy(value, amplitude, &mut rng);
                    }
                }
            }
        }
    }
    OwnedImage::with_channels(data, SCREEN_W, SCREEN_H, channels).unwrap()
}

fn positions(matcher: &Matcher, screen: &OwnedImage, tpl: &OwnedImage, c: f32) -> Vec<Point> {
    matcher
        .match_images(screen, tpl, c, 100)
        .unwrap()
        .into_iter()
        .map(|m| m.top_left)
        .collect()
}

#[test]
fn exact_instance_ranks_first() {
    let matches = Matcher::new()
        .match_images(&screen(1, 1), &gray_template(), 0.6, 5)
        .unwrap();
    assert_eq!(matches[0].top_left, Point::new(40, 30));
    assert!(matches[0].confidence > 0.999);
    assert_eq!(matches[0].center(), Point::new(48, 36));
    assert!(matches.windows(2).all(|w| w[0].confidence >= w[1].confidence));
}

#[test]
fn noisy_instances_rank_by_degradation() {
    let found = positions(&Matcher::new(), &screen(1, 2), &gray_template(), 0.6);
    let expected: Vec<Point> = INSTANCES
        .iter()
        .map(|&(x, y, _)| Point::new(x as i32, y as i32))
        .collect();
    assert_eq!(found, expected);
}

#[test]
fn higher_threshold_returns_subset() {
    let image = screen(1, 3);
    let tpl = gray_template();
    let matcher = Matcher::new();
    let thresholds = [0.1f32, 0.3, 0.5, 0.7, 0.9, 0.99];
    let sets: Vec<BTreeSet<(i32, i32)>> = thresholds
        .iter()
        .map(|&c| {
            positions(&matcher, &image, &tpl, c)
                .into_iter()
                .map(|p| (p.x, p.y))
                .collect()
        })
        .collect();
    for pair in sets.windows(2) {
        assert!(pair[1].is_subset(&pair[0]));
    }
    assert!(sets[0].len() > sets[5].len());
}

#[test]
fn one_candidate_per_instance() {
    let matches = Matcher::new()
        .match_images(&screen(1, 4), &gray_template(), 0.3, 100)
        .unwrap();
    let exact = matches[0].rect();
    for other in &matches[1..] {
        assert!(exact.overlap_of_smaller(&other.rect()) < 0.5);
    }
}

#[test]
fn grayscale_flag_keeps_ranking() {
    let image = screen(3, 5);
    let tpl = color_template();
    let gray = positions(&Matcher::new(), &image, &tpl, 0.6);
    let color_matcher = Matcher::new().with_config(MatchConfig {
        grayscale: false,
        ..MatchConfig::default()
    });
    let color = positions(&color_matcher, &image, &tpl, 0.6);
    assert_eq!(gray, color);
    assert_eq!(gray.len(), INSTANCES.len());
}

#[test]
fn color_screen_with_gray_template_is_converted() {
    let matches = Matcher::new()
        .with_config(MatchConfig {
            grayscale: false,
            ..MatchConfig::default()
        })
        .match_images(&screen(3, 6), &gray_template(), 0.5, 1)
        .unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].top_left, Point::new(40, 30));
}

#[test]
fn no_match_is_empty_not_error() {
    let flat = OwnedImage::filled(64, 48, &[90]).unwrap();
    let matches = Matcher::new()
        .match_images(&flat, &gray_template(), 0.5, 5)
        .unwrap();
    assert!(matches.is_empty());

    let small = OwnedImage::filled(8, 8, &[0]).unwrap();
    assert!(Matcher::new()
        .match_images(&small, &gray_template(), 0.5, 5)
        .unwrap()
        .is_empty());
    assert!(Matcher::new()
        .match_images(&screen(1, 7), &gray_template(), 0.5, 0)
        .unwrap()
        .is_empty());
}

#[test]
fn invalid_inputs_are_rejected() {
    let image = screen(1, 8);
    let flat_tpl = OwnedImage::filled(10, 10, &[200]).unwrap();
    let err = Matcher::new()
        .match_images(&image, &flat_tpl, 0.5, 5)
        .unwrap_err();
    assert!(matches!(err, LocateError::InvalidMatchInput { .. }));

    let err = Matcher::new()
        .match_images(&image, &gray_template(), 1.5, 5)
        .unwrap_err();
    assert!(matches!(err, LocateError::InvalidMatchInput { .. }));
}

#[test]
fn strided_roi_matches_with_local_coordinates() {
    let image = screen(1, 9);
    let tpl = gray_template();
    let roi: ImageView<'_, u8> = image.view().roi(30, 20, 40, 30).unwrap();
    let matches = Matcher::new()
        .match_template(roi, tpl.view(), 0.9, 1)
        .unwrap();
    assert_eq!(matches[0].top_left, Point::new(10, 10));
}
