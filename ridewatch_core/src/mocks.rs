//! Test and helper mocks for ridewatch_core

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use ridewatch_traits::{
    Location, MotionSink, MotionSource, NetworkSnapshotProvider, PositionProvider, ProviderError,
};

/// A motion source that never delivers; counts registrations.
#[derive(Debug, Default, Clone)]
pub struct NoopMotionSource {
    pub registrations: Arc<std::sync::atomic::AtomicUsize>,
}

impl MotionSource for NoopMotionSource {
    fn register(&mut self, _sink: Arc<dyn MotionSink>) -> Result<(), ProviderError> {
        self.registrations
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        Ok(())
    }

    fn unregister(&mut self) {}
}

/// A positioning provider that never has a fix.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoFixProvider;

impl PositionProvider for NoFixProvider {
    fn current_fix(&mut self, _timeout: Duration) -> Result<Option<Location>, ProviderError> {
        Ok(None)
    }
}

/// A network scanner that sees nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyNetworkProvider;

impl NetworkSnapshotProvider for EmptyNetworkProvider {
    fn current_identifiers(&mut self) -> Result<BTreeSet<String>, ProviderError> {
        Ok(BTreeSet::new())
    }
}
