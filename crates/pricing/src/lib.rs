//! Pluggable pricing algorithms for the auction engine.
//!
//! Three variants implement [`PricingAlgorithm`]: linear drift, exponential
//! growth/decay, and an adaptive online-learning model. The [`AlgorithmSet`]
//! registry resolves an auction's configured algorithm by name, falling back
//! to the adaptive variant for unknown names.

pub mod adaptive;
pub mod exponential;
pub mod linear;

pub use adaptive::AdaptiveAlgorithm;
pub use exponential::ExponentialAlgorithm;
pub use linear::LinearAlgorithm;

use bazaar_core::PricingAlgorithm;
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of the available pricing algorithms, built once at startup and
/// shared by the bidding engine and the price-update scheduler.
pub struct AlgorithmSet {
    algorithms: HashMap<&'static str, Arc<dyn PricingAlgorithm>>,
    adaptive: Arc<AdaptiveAlgorithm>,
}

impl Default for AlgorithmSet {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl AlgorithmSet {
    /// Builds the standard set: linear, exponential, and adaptive.
    #[must_use]
    pub fn with_defaults() -> Self {
        let adaptive = Arc::new(AdaptiveAlgorithm::new());
        let mut algorithms: HashMap<&'static str, Arc<dyn PricingAlgorithm>> = HashMap::new();
        algorithms.insert("linear", Arc::new(LinearAlgorithm));
        algorithms.insert("exponential", Arc::new(ExponentialAlgorithm::default()));
        algorithms.insert("adaptive", adaptive.clone());
        Self {
            algorithms,
            adaptive,
        }
    }

    /// Resolves an algorithm by name, falling back to adaptive for names
    /// nothing is registered under.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Arc<dyn PricingAlgorithm> {
        self.algorithms.get(name).map_or_else(
            || {
                tracing::warn!("unknown pricing algorithm {name:?}, falling back to adaptive");
                self.adaptive.clone() as Arc<dyn PricingAlgorithm>
            },
            Arc::clone,
        )
    }

    /// Registered algorithm names, sorted for stable output.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.algorithms.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Rolling prediction accuracy of the shared adaptive model.
    #[must_use]
    pub fn adaptive_accuracy(&self) -> f64 {
        self.adaptive.prediction_accuracy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_set_registers_three_algorithms() {
        let set = AlgorithmSet::with_defaults();
        assert_eq!(set.names(), vec!["adaptive", "exponential", "linear"]);
    }

    #[test]
    fn resolve_returns_named_algorithm() {
        let set = AlgorithmSet::with_defaults();
        assert_eq!(set.resolve("linear").algorithm_type(), "linear");
        assert_eq!(set.resolve("exponential").algorithm_type(), "exponential");
    }

    #[test]
    fn unknown_name_falls_back_to_adaptive() {
        let set = AlgorithmSet::with_defaults();
        assert_eq!(set.resolve("quantum").algorithm_type(), "adaptive");
    }

    #[test]
    fn fresh_adaptive_model_reports_full_accuracy() {
        let set = AlgorithmSet::with_defaults();
        assert!((set.adaptive_accuracy() - 1.0).abs() < f64::EPSILON);
    }
}
