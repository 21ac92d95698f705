pub mod atom; // Metropolis-Hastings atom samplers
pub mod cache; // bounded FIFO memoization
pub mod density; // cached and multi-sample cluster densities
pub mod measure; // base measures over cluster parameters
pub mod partition; // partition/cell boundary types
pub mod traits; // capability traits for densities, measures, proposals
