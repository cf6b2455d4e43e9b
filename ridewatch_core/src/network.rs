//! Wireless environment churn.
//!
//! Station platforms and tunnels expose a very different set of access points
//! than the street the rider entered from.

use std::collections::BTreeSet;

use ridewatch_traits::NetworkSnapshotProvider;

/// Deduplicated set of network identifiers. Never absent, possibly empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WifiSnapshot(BTreeSet<String>);

impl WifiSnapshot {
    pub fn new(ids: BTreeSet<String>) -> Self {
        Self(ids)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.contains(id)
    }

    pub fn is_disjoint(&self, other: &WifiSnapshot) -> bool {
        self.0.is_disjoint(&other.0)
    }
}

impl<S: Into<String>> FromIterator<S> for WifiSnapshot {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Score the divergence of `current` from `initial`.
pub fn churn_score(initial: &WifiSnapshot, current: &WifiSnapshot) -> f32 {
    if current.is_empty() && !initial.is_empty() {
        0.6
    } else if !current.is_empty() && current.is_disjoint(initial) {
        0.7
    } else if current.len() > initial.len() + 3 {
        0.5
    } else {
        0.2
    }
}

pub struct NetworkChurnDetector {
    provider: Box<dyn NetworkSnapshotProvider + Send>,
    initial: WifiSnapshot,
}

impl core::fmt::Debug for NetworkChurnDetector {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("NetworkChurnDetector")
            .field("initial_len", &self.initial.len())
            .finish()
    }
}

impl NetworkChurnDetector {
    pub fn new(provider: Box<dyn NetworkSnapshotProvider + Send>) -> Self {
        Self {
            provider,
            initial: WifiSnapshot::default(),
        }
    }

    /// Read the provider, substituting the empty set on failure.
    pub fn snapshot(&mut self) -> WifiSnapshot {
        match self.provider.current_identifiers() {
            Ok(ids) => WifiSnapshot::new(ids),
            Err(e) => {
                tracing::warn!(error = %e, "network snapshot unavailable; treating as empty");
                WifiSnapshot::default()
            }
        }
    }

    /// Record the baseline the following ticks are compared against.
    pub fn capture_initial(&mut self) {
        self.initial = self.snapshot();
        tracing::debug!(networks = self.initial.len(), "captured initial network snapshot");
    }

    pub fn initial(&self) -> &WifiSnapshot {
        &self.initial
    }

    pub fn evaluate(&mut self) -> f32 {
        let current = self.snapshot();
        churn_score(&self.initial, &current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ridewatch_traits::ProviderError;
    use rstest::rstest;
    use std::collections::VecDeque;

    fn snap(ids: &[&str]) -> WifiSnapshot {
        ids.iter().copied().collect()
    }

    #[rstest]
    #[case(&["A"], &[], 0.6)]
    #[case(&["A"], &["B", "C", "D", "E", "F"], 0.7)]
    #[case(&["A"], &["A", "C", "D", "E", "F"], 0.5)]
    #[case(&["A", "B"], &["A", "C"], 0.2)]
    #[case(&[], &[], 0.2)]
    #[case(&[], &["X"], 0.7)]
    fn churn_table(#[case] initial: &[&str], #[case] current: &[&str], #[case] expected: f32) {
        assert_eq!(churn_score(&snap(initial), &snap(current)), expected);
    }

    #[test]
    fn snapshot_deduplicates() {
        let s = snap(&["A", "A", "B"]);
        assert_eq!(s.len(), 2);
        assert!(s.contains("A"));
    }

    struct Scripted(VecDeque<Result<BTreeSet<String>, ProviderError>>);

    impl NetworkSnapshotProvider for Scripted {
        fn current_identifiers(&mut self) -> Result<BTreeSet<String>, ProviderError> {
            self.0.pop_front().unwrap_or_else(|| Ok(BTreeSet::new()))
        }
    }

    fn ids(v: &[&str]) -> BTreeSet<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn provider_failure_reads_as_empty() {
        let mut d = NetworkChurnDetector::new(Box::new(Scripted(
            vec![Ok(ids(&["home"])), Err("wifi off".into())].into(),
        )));
        d.capture_initial();
        assert_eq!(d.initial(), &snap(&["home"]));
        assert_eq!(d.evaluate(), 0.6);
    }

    #[test]
    fn failed_initial_capture_is_empty_baseline() {
        let mut d = NetworkChurnDetector::new(Box::new(Scripted(
            vec![Err("scan throttled".into()), Ok(ids(&["A", "B", "C", "D"]))].into(),
        )));
        d.capture_initial();
        assert!(d.initial().is_empty());
        assert_eq!(d.evaluate(), 0.7);
    }
}
