use ridewatch_core::error::BuildError;
use ridewatch_core::mocks::{EmptyNetworkProvider, NoFixProvider, NoopMotionSource};
use ridewatch_core::{DetectionConfig, DetectionController};
use rstest::rstest;

#[rstest]
fn builder_missing_motion_source_yields_typed_build_error() {
    let err = DetectionController::builder()
        // missing with_motion_source()
        .with_position_provider(NoFixProvider)
        .with_network_provider(EmptyNetworkProvider)
        .try_build()
        .expect_err("should fail with MissingMotionSource");

    match err.downcast_ref::<BuildError>() {
        Some(BuildError::MissingMotionSource) => {}
        other => panic!("expected MissingMotionSource, got: {other:?}"),
    }
}

#[rstest]
fn builder_missing_position_provider_yields_typed_build_error() {
    let err = DetectionController::builder()
        .with_motion_source(NoopMotionSource::default())
        .with_network_provider(EmptyNetworkProvider)
        .try_build()
        .expect_err("should fail with MissingPositionProvider");

    assert!(matches!(
        err.downcast_ref::<BuildError>(),
        Some(BuildError::MissingPositionProvider)
    ));
}

#[rstest]
fn builder_missing_network_provider_yields_typed_build_error() {
    let err = DetectionController::builder()
        .with_motion_source(NoopMotionSource::default())
        .with_position_provider(NoFixProvider)
        .try_build()
        .expect_err("should fail with MissingNetworkProvider");

    assert!(matches!(
        err.downcast_ref::<BuildError>(),
        Some(BuildError::MissingNetworkProvider)
    ));
}

#[rstest]
#[case::timeout_not_below_tick(DetectionConfig { position_timeout_ms: 2_000, ..DetectionConfig::default() })]
#[case::zero_tick(DetectionConfig { tick_interval_ms: 0, ..DetectionConfig::default() })]
#[case::all_zero_weights(DetectionConfig { fusion_weights: [0.0, 0.0, 0.0].into(), ..DetectionConfig::default() })]
fn builder_rejects_invalid_config(#[case] cfg: DetectionConfig) {
    let err = DetectionController::builder()
        .with_motion_source(NoopMotionSource::default())
        .with_position_provider(NoFixProvider)
        .with_network_provider(EmptyNetworkProvider)
        .with_config(cfg)
        .build()
        .expect_err("invalid config must be rejected");

    assert!(matches!(
        err.downcast_ref::<BuildError>(),
        Some(BuildError::InvalidConfig(_))
    ));
}

#[rstest]
fn built_controller_starts_idle_with_default_state() {
    let c = DetectionController::builder()
        .with_motion_source(NoopMotionSource::default())
        .with_position_provider(NoFixProvider)
        .with_network_provider(EmptyNetworkProvider)
        .build()
        .unwrap();
    assert!(!c.is_monitoring());
    assert_eq!(c.current_state(), ridewatch_core::DetectionState::default());
    assert_eq!(c.buffers().len(ridewatch_core::MotionKind::Accel), 0);
}
