//! Maps `Box<dyn Error>` from collaborator boundaries to typed `DetectionError`.
//!
//! The traits in `ridewatch_traits` use `Box<dyn Error + Send + Sync>`; this
//! module converts those to our typed error enum, with an optional
//! feature-gated path for `ridewatch_sim::SimError` downcasting.

use crate::error::DetectionError;

/// Map a collaborator error to a typed `DetectionError`.
///
/// `timeout_ms` is the budget the call was given; it is echoed back in
/// `DetectionError::ProviderTimeout`.
pub fn map_provider_error(e: &(dyn std::error::Error + 'static), timeout_ms: u64) -> DetectionError {
    #[cfg(feature = "sim-errors")]
    {
        if let Some(sim) = e.downcast_ref::<ridewatch_sim::SimError>() {
            return match sim {
                ridewatch_sim::SimError::Timeout => DetectionError::ProviderTimeout(timeout_ms),
                other => DetectionError::Provider(other.to_string()),
            };
        }
    }

    // Fallback: string-based detection
    let s = e.to_string();
    if s.to_lowercase().contains("timed out") || s.to_lowercase().contains("timeout") {
        DetectionError::ProviderTimeout(timeout_ms)
    } else {
        DetectionError::Provider(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_text_maps_to_timeout() {
        let e: Box<dyn std::error::Error + Send + Sync> = "location request timed out".into();
        assert_eq!(
            map_provider_error(e.as_ref(), 1500),
            DetectionError::ProviderTimeout(1500)
        );
    }

    #[test]
    fn other_text_is_carried() {
        let e: Box<dyn std::error::Error + Send + Sync> = "permission denied".into();
        assert_eq!(
            map_provider_error(e.as_ref(), 1500),
            DetectionError::Provider("permission denied".into())
        );
    }

    #[cfg(feature = "sim-errors")]
    #[test]
    fn sim_errors_downcast_precisely() {
        let e: Box<dyn std::error::Error + Send + Sync> = Box::new(ridewatch_sim::SimError::Timeout);
        assert_eq!(map_provider_error(e.as_ref(), 7), DetectionError::ProviderTimeout(7));
        let e: Box<dyn std::error::Error + Send + Sync> =
            Box::new(ridewatch_sim::SimError::Unavailable("no permission".into()));
        assert!(matches!(map_provider_error(e.as_ref(), 7), DetectionError::Provider(_)));
    }
}
