pub mod analysis; // multi-sample sampler stack assembly
pub mod data; // per-mutation, per-sample read-count records
pub mod genotype; // genotype states and prior-state enumeration
pub mod model; // binomial mixture-over-genotype-states likelihood
