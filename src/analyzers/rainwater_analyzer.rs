use serde::Serialize;
use std::cmp::Ordering;

use crate::error::{PipelineError, Result};
use crate::models::{CategoryThresholds, Dataset, PotentialCategory};
use crate::utils::constants::{
    CO2_KG_PER_CAR_JOURNEY, CO2_KG_PER_M3_WATER, DAYS_PER_YEAR, DEFAULT_TOP_N,
    LITERS_PER_PERSON_PER_DAY,
};
use crate::utils::statistics::mean;

const NOT_APPLICABLE: &str = "not applicable";

#[derive(Debug, Clone, Serialize)]
pub struct RainwaterReport {
    pub total_footprints: usize,
    pub total_area_m2: f64,
    pub total_volume_liters: f64,
    /// `None` for an empty dataset.
    pub mean_area_m2: Option<f64>,
    pub mean_volume_liters: Option<f64>,
    pub thresholds: CategoryThresholds,
    pub categories: Vec<CategoryStats>,
    pub top_footprints: Vec<RankedFootprint>,
    pub impact: ImpactEstimate,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryStats {
    pub category: PotentialCategory,
    pub label: String,
    pub color: &'static str,
    pub count: usize,
    pub volume_liters: f64,
    pub area_m2: f64,
    pub share_percent: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RankedFootprint {
    pub rank: usize,
    /// Row index in the dataset
    pub row: usize,
    pub display_name: String,
    pub building_type: String,
    pub area_m2: f64,
    pub volume_liters: f64,
}

/// Rough communication figures, not measurements.
#[derive(Debug, Clone, Serialize)]
pub struct ImpactEstimate {
    /// Always `true`; marks the figures as estimates in serialized reports.
    pub approximate: bool,
    pub people_served: f64,
    pub co2_avoided_kg: f64,
    pub car_journeys_avoided: f64,
    pub assumptions: ImpactAssumptions,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ImpactAssumptions {
    pub liters_per_person_per_day: f64,
    pub co2_kg_per_m3: f64,
    pub co2_kg_per_car_journey: f64,
}

impl Default for ImpactAssumptions {
    fn default() -> Self {
        Self {
            liters_per_person_per_day: LITERS_PER_PERSON_PER_DAY,
            co2_kg_per_m3: CO2_KG_PER_M3_WATER,
            co2_kg_per_car_journey: CO2_KG_PER_CAR_JOURNEY,
        }
    }
}

impl ImpactEstimate {
    pub fn from_total_volume(total_volume_liters: f64) -> Self {
        let people_served = total_volume_liters / (LITERS_PER_PERSON_PER_DAY * DAYS_PER_YEAR);
        let co2_avoided_kg = (total_volume_liters / 1000.0) * CO2_KG_PER_M3_WATER;

        Self {
            approximate: true,
            people_served,
            co2_avoided_kg,
            car_journeys_avoided: co2_avoided_kg / CO2_KG_PER_CAR_JOURNEY,
            assumptions: ImpactAssumptions::default(),
        }
    }
}

pub struct RainwaterAnalyzer {
    top_n: usize,
}

impl RainwaterAnalyzer {
    pub fn new() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
        }
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    /// Requires area, volume and category on every row.
    pub fn analyze(
        &self,
        dataset: &Dataset,
        thresholds: &CategoryThresholds,
    ) -> Result<RainwaterReport> {
        let mut rows = Vec::with_capacity(dataset.len());
        for (row, footprint) in dataset.iter().enumerate() {
            let missing = |field: &str| {
                PipelineError::data_quality(
                    row,
                    footprint.osm_id.as_deref(),
                    format!("{} is missing", field),
                )
            };
            let area = footprint.area_m2.ok_or_else(|| missing("area_m2"))?;
            let volume = footprint
                .rain_liter_per_year
                .ok_or_else(|| missing("rain_liter_per_year"))?;
            let category = footprint
                .potential_category
                .ok_or_else(|| missing("potential_category"))?;
            rows.push((area, volume, category));
        }

        let areas: Vec<f64> = rows.iter().map(|r| r.0).collect();
        let volumes: Vec<f64> = rows.iter().map(|r| r.1).collect();
        let total_area_m2: f64 = areas.iter().sum();
        let total_volume_liters: f64 = volumes.iter().sum();

        let categories = self.category_stats(&rows, thresholds);
        let top_footprints = self.rank(dataset, &volumes);

        Ok(RainwaterReport {
            total_footprints: rows.len(),
            total_area_m2,
            total_volume_liters,
            mean_area_m2: mean(&areas),
            mean_volume_liters: mean(&volumes),
            thresholds: *thresholds,
            categories,
            top_footprints,
            impact: ImpactEstimate::from_total_volume(total_volume_liters),
        })
    }

    fn category_stats(
        &self,
        rows: &[(f64, f64, PotentialCategory)],
        thresholds: &CategoryThresholds,
    ) -> Vec<CategoryStats> {
        let total = rows.len();

        PotentialCategory::ALL
            .iter()
            .map(|&category| {
                let (count, volume_liters, area_m2) = rows
                    .iter()
                    .filter(|r| r.2 == category)
                    .fold((0usize, 0.0f64, 0.0f64), |(n, v, a), r| (n + 1, v + r.1, a + r.0));

                let share_percent = if total > 0 {
                    count as f64 / total as f64 * 100.0
                } else {
                    0.0
                };

                CategoryStats {
                    category,
                    label: thresholds.label(category),
                    color: category.color(),
                    count,
                    volume_liters,
                    area_m2,
                    share_percent,
                }
            })
            .collect()
    }

    /// Highest volumes first; `sort_by` is stable so equal volumes keep dataset order.
    fn rank(&self, dataset: &Dataset, volumes: &[f64]) -> Vec<RankedFootprint> {
        let mut order: Vec<usize> = (0..volumes.len()).collect();
        order.sort_by(|&a, &b| {
            volumes[b]
                .partial_cmp(&volumes[a])
                .unwrap_or(Ordering::Equal)
        });

        order
            .into_iter()
            .take(self.top_n)
            .enumerate()
            .map(|(i, row)| {
                let footprint = &dataset.footprints[row];
                RankedFootprint {
                    rank: i + 1,
                    row,
                    display_name: footprint.display_name(),
                    building_type: footprint.building_type().to_string(),
                    area_m2: footprint.area_m2.unwrap_or_default(),
                    volume_liters: volumes[row],
                }
            })
            .collect()
    }
}

impl Default for RainwaterAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl RainwaterReport {
    pub fn total_volume_m3(&self) -> f64 {
        self.total_volume_liters / 1000.0
    }

    pub fn mean_area_display(&self) -> String {
        self.mean_area_m2
            .map(|v| format!("{:.1} m²", v))
            .unwrap_or_else(|| NOT_APPLICABLE.to_string())
    }

    pub fn mean_volume_display(&self) -> String {
        self.mean_volume_liters
            .map(|v| format!("{:.0} L/year", v))
            .unwrap_or_else(|| NOT_APPLICABLE.to_string())
    }

    pub fn summary(&self) -> String {
        format!(
            "Buildings: {}\n\
            Total roof area: {} m²\n\
            Total rainwater potential: {} L/year ({} m³/year)\n\
            Mean roof area: {}\n\
            Mean potential: {}\n\
            Quartiles: {}",
            group_thousands(self.total_footprints as f64),
            group_thousands(self.total_area_m2),
            group_thousands(self.total_volume_liters),
            group_thousands(self.total_volume_m3()),
            self.mean_area_display(),
            self.mean_volume_display(),
            self.thresholds
        )
    }

    pub fn category_summary(&self) -> String {
        let lines: Vec<String> = self
            .categories
            .iter()
            .map(|c| {
                format!(
                    "  {}: {} buildings ({:.1}%) - {} L/year",
                    c.label,
                    group_thousands(c.count as f64),
                    c.share_percent,
                    group_thousands(c.volume_liters)
                )
            })
            .collect();
        format!("Distribution by potential category:\n{}", lines.join("\n"))
    }

    pub fn ranking_summary(&self) -> String {
        let mut out = format!(
            "Top {} buildings by potential:",
            self.top_footprints.len()
        );
        for entry in &self.top_footprints {
            let name: String = entry.display_name.chars().take(30).collect();
            out.push_str(&format!(
                "\n  {:2}. {:<30} {:>6.0} m² → {:>8.0} L/year",
                entry.rank, name, entry.area_m2, entry.volume_liters
            ));
        }
        out
    }

    pub fn impact_summary(&self) -> String {
        format!(
            "Environmental impact (approximate estimates):\n\
            - Could supply ~{:.0} people with water for a year ({} L per person per day)\n\
            - CO2 avoided: ~{:.0} kg/year ({} kg per m³ of treated water)\n\
            - Equivalent to ~{:.1} fewer car journeys of 10,000 km",
            self.impact.people_served,
            LITERS_PER_PERSON_PER_DAY,
            self.impact.co2_avoided_kg,
            CO2_KG_PER_M3_WATER,
            self.impact.car_journeys_avoided
        )
    }

    pub fn detailed_summary(&self) -> String {
        format!(
            "{}\n\n{}\n\n{}\n\n{}",
            self.summary(),
            self.category_summary(),
            self.ranking_summary(),
            self.impact_summary()
        )
    }
}

/// `1234567.8` -> `1,234,568`
pub fn group_thousands(value: f64) -> String {
    let rounded = format!("{:.0}", value);
    let (sign, digits) = match rounded.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", rounded.as_str()),
    };

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{}{}", sign, grouped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Footprint, PrecipitationRecord, PrecipitationSource};
    use crate::processors::{PotentialClassifier, VolumeCalculator};
    use geo::polygon;
    use pretty_assertions::assert_eq;

    fn derived(areas: &[f64], precip_mm: f64) -> (Dataset, CategoryThresholds) {
        let mut dataset: Dataset = areas
            .iter()
            .enumerate()
            .map(|(i, &area)| {
                Footprint::from_polygon(
                    polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0)],
                    area,
                )
                .with_building_tag(if i % 2 == 0 { "house" } else { "garage" })
            })
            .collect();
        let precipitation =
            PrecipitationRecord::new(precip_mm, 2023, PrecipitationSource::Configured).unwrap();
        VolumeCalculator::new(&precipitation)
            .apply(&mut dataset)
            .unwrap();
        let thresholds = PotentialClassifier::new().classify(&mut dataset).unwrap();
        (dataset, thresholds)
    }

    #[test]
    fn test_end_to_end_three_roofs() -> Result<()> {
        let (dataset, thresholds) = derived(&[50.0, 100.0, 150.0], 800.0);
        let report = RainwaterAnalyzer::new().analyze(&dataset, &thresholds)?;

        assert_eq!(dataset.volumes(), vec![40000.0, 80000.0, 120000.0]);
        assert_eq!(report.total_footprints, 3);
        assert_eq!(report.total_volume_liters, 240000.0);
        assert_eq!(report.mean_area_m2, Some(100.0));
        assert_eq!(report.top_footprints[0].area_m2, 150.0);
        assert_eq!(report.top_footprints[0].row, 2);
        Ok(())
    }

    #[test]
    fn test_category_sums_are_consistent() -> Result<()> {
        let areas: Vec<f64> = (1..=37).map(|i| (i * 17 % 23) as f64 * 10.5).collect();
        let (dataset, thresholds) = derived(&areas, 812.3);
        let report = RainwaterAnalyzer::new().analyze(&dataset, &thresholds)?;

        let count: usize = report.categories.iter().map(|c| c.count).sum();
        let volume: f64 = report.categories.iter().map(|c| c.volume_liters).sum();
        let area: f64 = report.categories.iter().map(|c| c.area_m2).sum();
        let share: f64 = report.categories.iter().map(|c| c.share_percent).sum();

        assert_eq!(count, report.total_footprints);
        assert!((volume - report.total_volume_liters).abs() < 1e-6);
        assert!((area - report.total_area_m2).abs() < 1e-9);
        assert!((share - 100.0).abs() < 1e-9);
        assert_eq!(report.categories.len(), 4);
        Ok(())
    }

    #[test]
    fn test_top_ten_of_fifteen() -> Result<()> {
        let areas: Vec<f64> = [7, 3, 15, 1, 9, 12, 4, 14, 2, 8, 11, 5, 13, 6, 10]
            .iter()
            .map(|&a| a as f64)
            .collect();
        let (dataset, thresholds) = derived(&areas, 900.0);
        let report = RainwaterAnalyzer::new().analyze(&dataset, &thresholds)?;

        let ranked: Vec<f64> = report.top_footprints.iter().map(|r| r.area_m2).collect();
        assert_eq!(
            ranked,
            vec![15.0, 14.0, 13.0, 12.0, 11.0, 10.0, 9.0, 8.0, 7.0, 6.0]
        );
        let ranks: Vec<usize> = report.top_footprints.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, (1..=10).collect::<Vec<_>>());
        Ok(())
    }

    #[test]
    fn test_ties_keep_dataset_order() -> Result<()> {
        let (dataset, thresholds) = derived(&[20.0, 50.0, 20.0, 50.0], 900.0);
        let report = RainwaterAnalyzer::new()
            .with_top_n(4)
            .analyze(&dataset, &thresholds)?;

        let rows: Vec<usize> = report.top_footprints.iter().map(|r| r.row).collect();
        assert_eq!(rows, vec![1, 3, 0, 2]);
        assert_eq!(report.top_footprints[0].display_name, "garage building");
        Ok(())
    }

    #[test]
    fn test_empty_dataset_reports_not_applicable() -> Result<()> {
        let report =
            RainwaterAnalyzer::new().analyze(&Dataset::default(), &CategoryThresholds::default())?;

        assert_eq!(report.total_footprints, 0);
        assert_eq!(report.total_area_m2, 0.0);
        assert_eq!(report.total_volume_liters, 0.0);
        assert_eq!(report.mean_area_m2, None);
        assert_eq!(report.mean_volume_liters, None);
        assert_eq!(report.mean_area_display(), "not applicable");
        assert!(report.top_footprints.is_empty());
        assert!(report.categories.iter().all(|c| c.share_percent == 0.0));
        assert!(!report.detailed_summary().contains("NaN"));
        Ok(())
    }

    #[test]
    fn test_impact_metrics() {
        let impact = ImpactEstimate::from_total_volume(43_800_000.0);

        assert_eq!(impact.people_served, 1000.0);
        assert!((impact.co2_avoided_kg - 30660.0).abs() < 1e-9);
        assert!((impact.car_journeys_avoided - 13.330434782608696).abs() < 1e-9);
    }

    #[test]
    fn test_unclassified_dataset_is_rejected() {
        let (mut dataset, thresholds) = derived(&[10.0, 20.0], 900.0);
        dataset.footprints[1].potential_category = None;

        let result = RainwaterAnalyzer::new().analyze(&dataset, &thresholds);
        assert!(matches!(result, Err(PipelineError::DataQuality { row: 1, .. })));
    }

    #[test]
    fn test_impact_labelled_approximate() -> Result<()> {
        let (dataset, thresholds) = derived(&[100.0], 900.0);
        let report = RainwaterAnalyzer::new().analyze(&dataset, &thresholds)?;

        assert!(report.impact_summary().contains("approximate"));
        assert!(report.summary().contains("90,000 L/year"));
        Ok(())
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0.0), "0");
        assert_eq!(group_thousands(999.4), "999");
        assert_eq!(group_thousands(1234567.8), "1,234,568");
        assert_eq!(group_thousands(-4500.0), "-4,500");
    }
}
