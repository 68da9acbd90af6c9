use tracing::{debug, info};

use crate::error::{PipelineError, Result};
use crate::models::{CategoryThresholds, Dataset};

/// Buckets footprints into quartiles of annual rainwater volume.
pub struct PotentialClassifier;

impl PotentialClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Computes the thresholds over the current dataset and assigns every row a category.
    ///
    /// Thresholds collapse when there are fewer than four distinct volumes; rows
    /// are still assigned, with ties going to the higher bucket.
    pub fn classify(&self, dataset: &mut Dataset) -> Result<CategoryThresholds> {
        let mut volumes = Vec::with_capacity(dataset.len());
        for (row, footprint) in dataset.iter().enumerate() {
            let volume = footprint.rain_liter_per_year.ok_or_else(|| {
                PipelineError::data_quality(
                    row,
                    footprint.osm_id.as_deref(),
                    "rain_liter_per_year is missing; derive volumes first",
                )
            })?;
            volumes.push(volume);
        }

        let thresholds = CategoryThresholds::from_volumes(&volumes);
        info!("Quartiles: {}", thresholds);

        for (footprint, volume) in dataset.footprints.iter_mut().zip(volumes) {
            footprint.potential_category = Some(thresholds.categorize(volume));
        }

        debug!(
            "Classified {} footprints, counts per category {:?}",
            dataset.len(),
            Self::category_counts(dataset)
        );
        Ok(thresholds)
    }

    pub fn category_counts(dataset: &Dataset) -> [usize; 4] {
        let mut counts = [0usize; 4];
        for category in dataset.iter().filter_map(|f| f.potential_category) {
            counts[category.ordinal()] += 1;
        }
        counts
    }
}

impl Default for PotentialClassifier {
    fn default() -> Self {
        Self::new()
    }
}
