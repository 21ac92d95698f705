use anyhow::Result;
use rand::Rng;

/// Biological sample identifier.
pub type SampleId = String;

/// Stable identity of a data point, assigned once at data-load time.
/// Part of the memo-cache key.
pub trait DataId {
    fn data_id(&self) -> usize;
}

/// Exact bit-level key of a cluster parameter value for memoization.
pub trait ParamKey {
    fn param_key(&self) -> u64;
}

impl ParamKey for f64 {
    fn param_key(&self) -> u64 {
        self.to_bits()
    }
}

/// A pure cluster-likelihood kernel: `compute` must be deterministic and
/// side-effect free so that it can be memoized on (data, value) alone.
///
/// Hyperparameters are fixed at construction; `with_hyper` builds a new
/// kernel rather than mutating this one, which is what lets the cache
/// key omit them.
pub trait LogDensity {
    type Data;
    type Value;
    type Hyper: Clone + PartialEq;

    fn compute(&self, data: &Self::Data, value: &Self::Value) -> Result<f64>;

    fn hyper(&self) -> &Self::Hyper;

    fn with_hyper(&self, hyper: Self::Hyper) -> Result<Self>
    where
        Self: Sized;
}

/// Per-cluster likelihood evaluated at a cluster parameter value.
pub trait ClusterDensity {
    type Data;
    type Value;
    type Hyper: Clone;

    fn log_p(&self, data: &Self::Data, value: &Self::Value) -> Result<f64>;

    /// Model hyperparameters (e.g. tumour content), fixed per instance.
    fn params(&self) -> Self::Hyper;

    /// A new density with replaced hyperparameters and empty caches.
    fn with_params(&self, params: Self::Hyper) -> Result<Self>
    where
        Self: Sized;
}

/// Prior distribution over a cluster's parameter (the DP base measure).
pub trait BaseMeasure {
    type Value;

    fn log_p(&self, value: &Self::Value) -> Result<f64>;

    fn random<R: Rng>(&self, rng: &mut R) -> Self::Value;
}

/// Proposal distribution for Metropolis-Hastings atom updates.
pub trait Proposal {
    type Value;

    /// Draw a candidate conditioned on the current value.
    fn random<R: Rng>(&self, old: &Self::Value, rng: &mut R) -> Self::Value;

    /// Log-density of `value` under the proposal conditioned on
    /// `conditioned_on`.
    fn log_p(&self, value: &Self::Value, conditioned_on: &Self::Value) -> Result<f64>;
}
