use std::collections::BTreeMap;

use anyhow::Result;
use log::info;

use crate::model::{SubcloneBinomialDensity, SubcloneBinomialModel};
use dpmm_util::atom::{BaseMeasureAtomSampler, MultiSampleAtomSampler};
use dpmm_util::density::MultiSampleDensity;
use dpmm_util::measure::{BetaBaseMeasure, MultiSampleBaseMeasure};
use dpmm_util::traits::SampleId;

pub type SubcloneAtomSampler = BaseMeasureAtomSampler<BetaBaseMeasure, SubcloneBinomialDensity>;

/// The fully wired multi-sample inference stack: per-sample Beta base
/// measures, memoized binomial densities and base-measure MH atom
/// samplers, composed over the shared sample set.
///
/// The outer Dirichlet-process driver (partition updates, concentration
/// sampling, tracing) consumes these three pieces; it is not built
/// here.
pub struct SamplerStack {
    pub base_measure: MultiSampleBaseMeasure<BetaBaseMeasure>,
    pub density: MultiSampleDensity<SubcloneBinomialDensity>,
    pub atom_sampler: MultiSampleAtomSampler<SubcloneAtomSampler>,
}

impl SamplerStack {
    /// Wire the stack from per-sample tumour contents and one Beta
    /// prior shape shared by every sample's base measure.
    ///
    /// Each component gets its own density instance so every memo
    /// cache has a single owner; tumour contents stay independent
    /// across samples.
    pub fn new(
        tumour_contents: &BTreeMap<SampleId, f64>,
        prior_shape: (f64, f64),
    ) -> Result<Self> {
        let (a, b) = prior_shape;

        let mut base_measures = BTreeMap::new();
        let mut densities = BTreeMap::new();
        let mut atom_samplers = BTreeMap::new();

        for (sample_id, &tumour_content) in tumour_contents {
            let g0 = BetaBaseMeasure::new(a, b)?;

            let density =
                SubcloneBinomialDensity::new(SubcloneBinomialModel::new(tumour_content)?);
            let sampler_density =
                SubcloneBinomialDensity::new(SubcloneBinomialModel::new(tumour_content)?);

            atom_samplers.insert(
                sample_id.clone(),
                BaseMeasureAtomSampler::from_base_measure(g0.clone(), sampler_density),
            );
            base_measures.insert(sample_id.clone(), g0);
            densities.insert(sample_id.clone(), density);
        }

        info!(
            "assembled subclone sampler stack over {} samples",
            tumour_contents.len()
        );

        Ok(Self {
            base_measure: MultiSampleBaseMeasure::new(base_measures)?,
            density: MultiSampleDensity::new(densities, false)?,
            atom_sampler: MultiSampleAtomSampler::new(atom_samplers)?,
        })
    }
}
