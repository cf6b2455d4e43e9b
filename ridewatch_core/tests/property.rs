use proptest::prelude::*;
use ridewatch_core::{
    ConfidenceFusionEngine, FusionWeights, MotionPatternAnalyzer, MotionSample, SampleBuffer,
};

fn sample() -> impl Strategy<Value = MotionSample> {
    (-40.0f32..40.0, -40.0f32..40.0, -40.0f32..40.0).prop_map(|(x, y, z)| MotionSample::new(x, y, z))
}

proptest! {
    #[test]
    fn confidence_always_in_unit_interval(
        s in -2.0f32..2.0,
        m in -2.0f32..2.0,
        n in -2.0f32..2.0,
        w in prop::array::uniform3(0.0f32..3.0),
    ) {
        prop_assume!(w.iter().any(|v| *v > 0.0));
        let e = ConfidenceFusionEngine::new(FusionWeights::from(w), 0.7);
        let f = e.fuse(s, m, n).unwrap();
        prop_assert!((0.0..=1.0).contains(&f.confidence));
        prop_assert_eq!(f.detected, f.confidence > 0.7);
    }

    #[test]
    fn buffer_never_exceeds_capacity_and_keeps_newest(
        cap in 1usize..64,
        pushes in 0usize..200,
    ) {
        let mut b = SampleBuffer::with_capacity(cap);
        for i in 0..pushes {
            b.push(MotionSample::new(i as f32, 0.0, 0.0));
            prop_assert!(b.len() <= cap);
        }
        let kept = b.last_n(cap);
        prop_assert_eq!(kept.len(), pushes.min(cap));
        let first = pushes.saturating_sub(cap);
        for (offset, s) in kept.iter().enumerate() {
            prop_assert_eq!(s.x, (first + offset) as f32);
        }
    }

    #[test]
    fn motion_scores_stay_in_published_bands(
        accel in prop::collection::vec(sample(), 10),
        gyro in prop::collection::vec(sample(), 10),
    ) {
        let s = MotionPatternAnalyzer::new(10, 12.0, 2.0)
            .analyze_windows(&accel, &gyro)
            .unwrap();
        prop_assert!([0.1, 0.3, 0.6, 0.8].contains(&s.vibration));
        prop_assert!([0.1, 0.3, 0.5, 0.7].contains(&s.rotation));
        prop_assert!([0.1, 0.3, 0.6, 0.8].contains(&s.consistency));
        prop_assert!((0.09..=0.81).contains(&s.combined));
        prop_assert!(s.ready);
    }
}
