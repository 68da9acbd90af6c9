use tracing::debug;

use crate::error::{PipelineError, Result};
use crate::models::{Dataset, PrecipitationRecord};

/// Derives `rain_liter_per_year = area_m2 * annual_precip_mm` for every footprint.
///
/// One millimetre of rain on one square metre of roof is one litre, so no unit
/// conversion is needed.
pub struct VolumeCalculator {
    annual_precip_mm: f64,
}

impl VolumeCalculator {
    pub fn new(precipitation: &PrecipitationRecord) -> Self {
        Self {
            annual_precip_mm: precipitation.annual_total_mm,
        }
    }

    pub fn annual_precip_mm(&self) -> f64 {
        self.annual_precip_mm
    }

    /// Fails on the first row with a missing, negative or non-finite area and
    /// leaves the dataset untouched in that case.
    pub fn apply(&self, dataset: &mut Dataset) -> Result<()> {
        self.validate_areas(dataset)?;

        for footprint in &mut dataset.footprints {
            if let Some(area) = footprint.area_m2 {
                footprint.rain_liter_per_year = Some(area * self.annual_precip_mm);
            }
        }

        debug!(
            "Derived rainwater volume for {} footprints at {:.1} mm",
            dataset.len(),
            self.annual_precip_mm
        );
        Ok(())
    }

    fn validate_areas(&self, dataset: &Dataset) -> Result<()> {
        for (row, footprint) in dataset.iter().enumerate() {
            let message = match footprint.area_m2 {
                None => "area_m2 is missing".to_string(),
                Some(area) if !area.is_finite() => format!("area_m2 is not a number ({})", area),
                Some(area) if area < 0.0 => format!("area_m2 is negative ({})", area),
                Some(_) => continue,
            };
            return Err(PipelineError::data_quality(
                row,
                footprint.osm_id.as_deref(),
                message,
            ));
        }
        Ok(())
    }

    pub fn total_liters(dataset: &Dataset) -> f64 {
        dataset.volumes().iter().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Footprint, PrecipitationSource};
    use geo::polygon;

    fn dataset(areas: &[f64]) -> Dataset {
        areas
            .iter()
            .map(|&area| {
                Footprint::from_polygon(
                    polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0)],
                    area,
                )
            })
            .collect()
    }

    fn precipitation(mm: f64) -> PrecipitationRecord {
        PrecipitationRecord::new(mm, 2023, PrecipitationSource::Configured).unwrap()
    }

    #[test]
    fn test_volume_equals_area_times_precipitation() -> Result<()> {
        let mut data = dataset(&[50.0, 100.0, 150.0, 0.0, 12.34]);
        VolumeCalculator::new(&precipitation(800.0)).apply(&mut data)?;

        for footprint in data.iter() {
            assert_eq!(
                footprint.rain_liter_per_year,
                Some(footprint.area_m2.unwrap() * 800.0)
            );
        }
        assert_eq!(
            data.volumes()[..3],
            [40000.0, 80000.0, 120000.0]
        );
        assert_eq!(VolumeCalculator::total_liters(&data), 240000.0 + 12.34 * 800.0);

        Ok(())
    }

    #[test]
    fn test_apply_is_idempotent() -> Result<()> {
        let mut data = dataset(&[75.0, 210.5]);
        let calculator = VolumeCalculator::new(&precipitation(900.0));

        calculator.apply(&mut data)?;
        let first = data.volumes();
        calculator.apply(&mut data)?;

        assert_eq!(data.volumes(), first);
        Ok(())
    }

    #[test]
    fn test_recompute_with_new_precipitation_overwrites() -> Result<()> {
        let mut data = dataset(&[100.0]);

        VolumeCalculator::new(&precipitation(900.0)).apply(&mut data)?;
        VolumeCalculator::new(&precipitation(750.5)).apply(&mut data)?;

        assert_eq!(data.volumes(), vec![75050.0]);
        Ok(())
    }

    #[test]
    fn test_negative_area_identifies_row() {
        let mut data = dataset(&[10.0, 20.0, -3.0]);
        data.footprints[2].osm_id = Some("way/42".to_string());

        let err = VolumeCalculator::new(&precipitation(900.0))
            .apply(&mut data)
            .unwrap_err();

        match err {
            PipelineError::DataQuality { row, .. } => assert_eq!(row, 2),
            other => panic!("unexpected error {:?}", other),
        }
        assert!(err_message(&mut dataset(&[10.0, 20.0, -3.0])).contains("#2"));
        assert!(!data.has_volumes());
        assert_eq!(data.footprints[0].rain_liter_per_year, None);
    }

    #[test]
    fn test_missing_area_is_error() {
        let mut data = dataset(&[10.0]);
        data.footprints[0].area_m2 = None;

        let result = VolumeCalculator::new(&precipitation(900.0)).apply(&mut data);
        assert!(matches!(result, Err(PipelineError::DataQuality { row: 0, .. })));
    }

    fn err_message(data: &mut Dataset) -> String {
        VolumeCalculator::new(&precipitation(900.0))
            .apply(data)
            .unwrap_err()
            .to_string()
    }
}
