//! Scripted wireless network scanner.

use std::collections::{BTreeSet, VecDeque};

use ridewatch_traits::{NetworkSnapshotProvider, ProviderError};

use crate::error::SimError;
use crate::scenario::Scenario;

#[derive(Debug, Clone, PartialEq)]
pub enum NetworkStep {
    Visible(BTreeSet<String>),
    Fail,
}

impl NetworkStep {
    pub fn visible<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        NetworkStep::Visible(ids.into_iter().map(Into::into).collect())
    }
}

/// Plays `script` in order, then repeats `then` forever.
#[derive(Debug, Clone)]
pub struct ScriptedNetworkProvider {
    script: VecDeque<NetworkStep>,
    then: NetworkStep,
}

impl ScriptedNetworkProvider {
    pub fn new(script: impl IntoIterator<Item = NetworkStep>, then: NetworkStep) -> Self {
        Self {
            script: script.into_iter().collect(),
            then,
        }
    }

    /// The first call is the baseline captured at monitoring start.
    pub fn for_scenario(scenario: Scenario) -> Self {
        match scenario {
            Scenario::Stationary => Self::new([], NetworkStep::visible(["home-ap", "neighbor-5g"])),
            Scenario::Walking => Self::new(
                [NetworkStep::visible(["home-ap", "neighbor-5g"])],
                NetworkStep::visible(["neighbor-5g", "cafe-guest"]),
            ),
            Scenario::Subway => Self::new(
                [
                    NetworkStep::visible(["home-ap"]),
                    NetworkStep::visible(["home-ap", "station-free-wifi"]),
                ],
                NetworkStep::visible(Vec::<String>::new()),
            ),
        }
    }
}

impl NetworkSnapshotProvider for ScriptedNetworkProvider {
    fn current_identifiers(&mut self) -> Result<BTreeSet<String>, ProviderError> {
        match self.script.pop_front().unwrap_or_else(|| self.then.clone()) {
            NetworkStep::Visible(ids) => Ok(ids),
            NetworkStep::Fail => Err(Box::new(SimError::Unavailable("wifi scan failed".into()))),
        }
    }
}
