#![no_main]
use libfuzzer_sys::arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use ridewatch_core::{MotionPatternAnalyzer, MotionSample};

#[derive(Debug, Arbitrary)]
struct Input {
    window: u8,
    accel: Vec<(f32, f32, f32)>,
    gyro: Vec<(f32, f32, f32)>,
}

fuzz_target!(|input: Input| {
    let to_samples = |v: &[(f32, f32, f32)]| -> Vec<MotionSample> {
        v.iter().map(|&(x, y, z)| MotionSample::new(x, y, z)).collect()
    };
    let analyzer = MotionPatternAnalyzer::new(usize::from(input.window), 12.0, 2.0);
    // Non-finite input must surface as an error, never a panic or a NaN score.
    if let Ok(s) = analyzer.analyze_windows(&to_samples(&input.accel), &to_samples(&input.gyro)) {
        assert!((0.0..=1.0).contains(&s.combined));
    }
});
