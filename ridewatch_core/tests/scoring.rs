//! Worked scoring examples through the public API.

use ridewatch_core::network::churn_score;
use ridewatch_core::{
    ConfidenceFusionEngine, FusionWeights, MotionPatternAnalyzer, MotionSample, SampleBuffer,
    WifiSnapshot,
};

#[test]
fn fifty_first_push_evicts_the_first() {
    let mut b = SampleBuffer::with_capacity(50);
    for i in 1..=51 {
        b.push(MotionSample::new(i as f32, 0.0, 0.0));
    }
    assert_eq!(b.len(), 50);
    let xs: Vec<f32> = b.last_n(50).iter().map(|s| s.x).collect();
    let expected: Vec<f32> = (2..=51).map(|i| i as f32).collect();
    assert_eq!(xs, expected);
}

#[test]
fn nine_samples_score_zero() {
    let a = MotionPatternAnalyzer::new(10, 12.0, 2.0);
    let nine = vec![MotionSample::new(0.0, 0.0, 11.5); 9];
    let ten = vec![MotionSample::new(0.4, 0.0, 0.0); 10];
    assert_eq!(a.analyze_windows(&nine, &ten).unwrap().combined, 0.0);
    assert_eq!(a.analyze_windows(&ten, &nine).unwrap().combined, 0.0);
}

#[test]
fn fused_example_crosses_threshold() {
    let e = ConfidenceFusionEngine::new(FusionWeights::default(), 0.7);
    let f = e.fuse(0.8, 0.8, 0.2).unwrap();
    assert!((f.confidence - 0.74).abs() < 1e-6);
    assert!(f.detected);
}

#[test]
fn wifi_loss_and_growth() {
    let initial: WifiSnapshot = ["A"].into_iter().collect();
    let empty = WifiSnapshot::default();
    assert_eq!(churn_score(&initial, &empty), 0.6);

    // overlapping but much larger set
    let crowded: WifiSnapshot = ["A", "B", "C", "D", "E"].into_iter().collect();
    assert_eq!(churn_score(&initial, &crowded), 0.5);

    // disjoint sets are checked before growth
    let elsewhere: WifiSnapshot = ["B", "C", "D", "E", "F"].into_iter().collect();
    assert_eq!(churn_score(&initial, &elsewhere), 0.7);
}
