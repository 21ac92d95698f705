use anyhow::{bail, Result};

use crate::data::SampleDataPoint;
use dpmm_util::density::CachedDensity;
use dpmm_util::traits::{DataId, LogDensity};
use stats_util::logspace::{log_binomial_pdf, log_sum_exp};

/// Binomial read-count likelihood marginalized over a mutation's
/// candidate genotype states.
///
/// The cluster parameter is the cellular frequency `f` of the subclone;
/// the fixed hyperparameter is the sample's tumour content `t`. For
/// each genotype state the three populations (normal, reference,
/// variant) are weighted by their copy-number-scaled prevalences
///
/// ```text
/// p_n = (1 - t) * cn_n
/// p_r = t * (1 - f) * cn_r
/// p_v = t * f * cn_v
/// ```
///
/// giving the expected variant-allele probability
/// `mu = (p_n mu_n + p_r mu_r + p_v mu_v) / (p_n + p_r + p_v)`, and the
/// state log-terms `log_pi + log Binomial(b | d, mu)` are combined with
/// `log_sum_exp`.
#[derive(Debug, Clone)]
pub struct SubcloneBinomialModel {
    tumour_content: f64,
}

impl SubcloneBinomialModel {
    pub fn new(tumour_content: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&tumour_content) {
            bail!("tumour content {tumour_content} outside [0, 1]");
        }

        Ok(Self { tumour_content })
    }

    pub fn tumour_content(&self) -> f64 {
        self.tumour_content
    }
}

impl LogDensity for SubcloneBinomialModel {
    type Data = SampleDataPoint;
    type Value = f64;
    type Hyper = f64;

    fn compute(&self, data: &SampleDataPoint, value: &f64) -> Result<f64> {
        let t = self.tumour_content;
        let f = *value;

        let mut ll = Vec::with_capacity(data.states().len());

        for state in data.states() {
            let p_n = (1.0 - t) * state.cn_n;
            let p_r = t * (1.0 - f) * state.cn_r;
            let p_v = t * f * state.cn_v;

            let norm = p_n + p_r + p_v;

            if norm <= 0.0 {
                // A NaN here would silently corrupt the MH comparison.
                bail!(
                    "zero population normalization for mutation {} (t = {t}, f = {f})",
                    data.data_id()
                );
            }

            let mu = (p_n * state.mu_n + p_r * state.mu_r + p_v * state.mu_v) / norm;

            ll.push(state.log_pi + log_binomial_pdf(data.b(), data.d(), mu));
        }

        Ok(log_sum_exp(&ll))
    }

    fn hyper(&self) -> &f64 {
        &self.tumour_content
    }

    fn with_hyper(&self, hyper: f64) -> Result<Self> {
        Self::new(hyper)
    }
}

/// Memoized per-sample density used throughout the sampler stack.
pub type SubcloneBinomialDensity = CachedDensity<SubcloneBinomialModel>;
