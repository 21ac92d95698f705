pub mod logspace; // numerically-stable log-space probability primitives
