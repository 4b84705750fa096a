pub mod classifier;
pub mod features;

pub use classifier::{argmax, Classifier, ProbabilityTable, N_CLASSES, PROBABILITY_COLUMNS};
pub use features::{FeatureMatrix, METADATA_COLUMNS};
