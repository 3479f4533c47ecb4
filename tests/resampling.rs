use synheart_motion::resampler::{evenly_spaced, Interpolant, InterpolationMethod, Resampler};
use synheart_motion::AveragingConfig;

fn wiggle(len: usize) -> Vec<f64> {
    (0..len)
        .map(|i| {
            let t = i as f64;
            (t * 0.7).sin() * 40.0 + t * t * 0.5 - 3.0
        })
        .collect()
}

#[test]
fn test_output_length_for_all_sizes() {
    for target_len in [1, 2, 3, 7, 100] {
        let resampler =
            Resampler::new(&AveragingConfig::default().with_target_len(target_len)).unwrap();
        for len in 2..12 {
            let resampled = resampler.resample_values(&wiggle(len)).unwrap();
            assert_eq!(resampled.len(), target_len, "L={} N={}", len, target_len);
        }
    }
}

#[test]
fn test_curve_passes_through_every_sample() {
    for len in 2..15 {
        let values = wiggle(len);
        let positions = evenly_spaced(len);
        let interpolant = Interpolant::fit(&positions, &values, 4).unwrap();

        let expected_method = if len >= 4 {
            InterpolationMethod::CubicSpline
        } else {
            InterpolationMethod::Linear
        };
        assert_eq!(interpolant.method(), expected_method);

        for (x, y) in positions.iter().zip(&values) {
            assert!(
                (interpolant.evaluate(*x) - y).abs() < 1e-9,
                "L={} x={} expected {} got {}",
                len,
                x,
                y,
                interpolant.evaluate(*x)
            );
        }
    }
}

#[test]
fn test_identity_resampling_keeps_samples() {
    let values = wiggle(9);
    let resampler = Resampler::new(&AveragingConfig::default().with_target_len(9)).unwrap();
    let resampled = resampler.resample_values(&values).unwrap();

    for (a, b) in resampled.iter().zip(&values) {
        assert!((a - b).abs() < 1e-9);
    }
}

#[test]
fn test_higher_smoothing_threshold_keeps_linear() {
    let parabola = [0.0, 1.0, 4.0, 9.0, 16.0];
    let config = AveragingConfig::default()
        .with_target_len(9)
        .with_smooth_min_samples(10);
    let linear = Resampler::new(&config).unwrap().resample_values(&parabola).unwrap();

    // position 0.125 sits halfway between the first two samples
    assert!((linear[1] - 0.5).abs() < 1e-12);

    let smooth = Resampler::new(&AveragingConfig::default().with_target_len(9))
        .unwrap()
        .resample_values(&parabola)
        .unwrap();
    assert!((smooth[1] - 0.25).abs() < 1e-9);
}
