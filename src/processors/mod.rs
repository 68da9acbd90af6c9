pub mod potential_classifier;
pub mod volume_calculator;

pub use potential_classifier::PotentialClassifier;
pub use volume_calculator::VolumeCalculator;
