#![cfg(feature = "rayon")]

use uilocator::{ImageView, MatchConfig, Matcher};

fn make_image(width: usize, height: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            let value = ((x * 11) ^ (y * 3) ^ (x * y)) & 0xFF;
            data.push(value as u8);
        }
    }
    data
}

#[test]
fn parallel_matches_sequential() {
    let img_width = 180;
    let img_height = 140;
    let image = make_image(img_width, img_height);
    let view = ImageView::from_slice(&image, img_width, img_height).unwrap();
    let tpl = view.roi(50, 40, 32, 24).unwrap();

    let sequential = Matcher::new();
    let parallel = Matcher::new().with_config(MatchConfig {
        parallel: true,
        ..MatchConfig::default()
    });

    for threshold in [0.3f32, 0.6, 0.9] {
        let a = sequential.match_template(view, tpl, threshold, 20).unwrap();
        let b = parallel.match_template(view, tpl, threshold, 20).unwrap();
        assert_eq!(a, b);
    }
}
