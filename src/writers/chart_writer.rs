//! Static four-panel statistics figure rendered with `plotters`.

use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::FontStyle;
use std::error::Error;
use std::path::Path;
use tracing::info;

use crate::analyzers::RainwaterReport;
use crate::error::{PipelineError, Result};
use crate::models::{Dataset, PotentialCategory};
use crate::utils::constants::{CHART_HEIGHT, CHART_WIDTH, HISTOGRAM_BINS};
use crate::utils::paths::ensure_parent_dir;

type Panel<'a> = DrawingArea<BitMapBackend<'a>, Shift>;
type DrawResult = std::result::Result<(), Box<dyn Error>>;

const SKY_BLUE: RGBColor = RGBColor(135, 206, 235);
const DASH_COUNT: usize = 24;

pub struct ChartWriter {
    width: u32,
    height: u32,
    bins: usize,
    title: String,
}

impl ChartWriter {
    pub fn new(place: &str) -> Self {
        Self {
            width: CHART_WIDTH,
            height: CHART_HEIGHT,
            bins: HISTOGRAM_BINS,
            title: format!("Rainwater potential analysis - {}", place),
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_bins(mut self, bins: usize) -> Self {
        self.bins = bins.max(1);
        self
    }

    pub fn write_chart(&self, dataset: &Dataset, report: &RainwaterReport, path: &Path) -> Result<()> {
        ensure_parent_dir(path)?;
        self.draw(dataset, report, path)
            .map_err(|e| PipelineError::Render(e.to_string()))?;

        info!("Statistics chart saved to {}", path.display());
        Ok(())
    }

    fn draw(&self, dataset: &Dataset, report: &RainwaterReport, path: &Path) -> DrawResult {
        let root = BitMapBackend::new(path, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE)?;
        let root = root.titled(
            &self.title,
            ("sans-serif", 40).into_font().style(FontStyle::Bold),
        )?;

        let volumes = dataset.volumes();
        let panels = root.split_evenly((2, 2));

        self.draw_histogram(&panels[0], &volumes, report.mean_volume_liters)?;
        draw_scatter(&panels[1], dataset)?;
        draw_category_bars(&panels[2], report)?;
        draw_cumulative(&panels[3], &volumes)?;

        root.present()?;
        Ok(())
    }

    fn draw_histogram(&self, area: &Panel<'_>, volumes: &[f64], mean: Option<f64>) -> DrawResult {
        let bins = histogram_bins(volumes, self.bins);
        let (x_min, x_max) = match (bins.first(), bins.last()) {
            (Some(first), Some(last)) => (first.start, last.end),
            _ => (0.0, 1.0),
        };
        let y_max = bins.iter().map(|b| b.count).max().unwrap_or(0).max(1) as f64 * 1.1;

        let mut chart = ChartBuilder::on(area)
            .caption("Distribution of rainwater potential", ("sans-serif", 24))
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(x_min..x_max, 0.0..y_max)?;

        chart
            .configure_mesh()
            .x_desc("Liters per year")
            .y_desc("Number of buildings")
            .draw()?;

        chart.draw_series(bins.iter().map(|b| {
            Rectangle::new(
                [(b.start, 0.0), (b.end, b.count as f64)],
                SKY_BLUE.mix(0.7).filled(),
            )
        }))?;
        chart.draw_series(bins.iter().map(|b| {
            Rectangle::new([(b.start, 0.0), (b.end, b.count as f64)], BLACK.stroke_width(1))
        }))?;

        if let Some(mean) = mean {
            let step = y_max / (DASH_COUNT * 2) as f64;
            chart
                .draw_series((0..DASH_COUNT).map(|i| {
                    let y0 = step * (2 * i) as f64;
                    PathElement::new(vec![(mean, y0), (mean, y0 + step)], RED.stroke_width(2))
                }))?
                .label(format!("Mean: {:.0}L", mean))
                .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED.stroke_width(2)));

            chart
                .configure_series_labels()
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .draw()?;
        }

        Ok(())
    }
}

fn draw_scatter(area: &Panel<'_>, dataset: &Dataset) -> DrawResult {
    let points: Vec<(f64, f64)> = dataset
        .iter()
        .filter_map(|f| Some((f.area_m2?, f.rain_liter_per_year?)))
        .collect();
    let x_max = points.iter().map(|p| p.0).fold(0.0, f64::max).max(1.0) * 1.05;
    let y_max = points.iter().map(|p| p.1).fold(0.0, f64::max).max(1.0) * 1.05;

    let mut chart = ChartBuilder::on(area)
        .caption("Roof area vs. rainwater potential", ("sans-serif", 24))
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(80)
        .build_cartesian_2d(0.0..x_max, 0.0..y_max)?;

    chart
        .configure_mesh()
        .x_desc("Roof area (m²)")
        .y_desc("Rainwater potential (L/year)")
        .draw()?;

    chart.draw_series(
        points
            .iter()
            .map(|&(x, y)| Circle::new((x, y), 3, BLUE.mix(0.6).filled())),
    )?;

    Ok(())
}

fn draw_category_bars(area: &Panel<'_>, report: &RainwaterReport) -> DrawResult {
    let max_count = report.categories.iter().map(|c| c.count).max().unwrap_or(0).max(1) as u32;

    let mut chart = ChartBuilder::on(area)
        .caption("Buildings by potential category", ("sans-serif", 24))
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d((0u32..3u32).into_segmented(), 0u32..(max_count + max_count / 10 + 1))?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc("Category")
        .y_desc("Number of buildings")
        .x_label_formatter(&|v| match v {
            SegmentValue::CenterOf(i) => PotentialCategory::ALL
                .get(*i as usize)
                .map(|c| c.name().to_string())
                .unwrap_or_default(),
            _ => String::new(),
        })
        .draw()?;

    for stats in &report.categories {
        let (r, g, b) = stats.category.rgb();
        chart.draw_series(
            Histogram::vertical(&chart)
                .style(RGBColor(r, g, b).filled())
                .margin(30)
                .data(std::iter::once((stats.category.ordinal() as u32, stats.count as u32))),
        )?;
    }

    Ok(())
}

fn draw_cumulative(area: &Panel<'_>, volumes: &[f64]) -> DrawResult {
    let cumulative = cumulative_m3(volumes);
    let x_max = (cumulative.len() as f64).max(1.0);
    let y_max = cumulative.last().copied().unwrap_or(0.0).max(1.0) * 1.05;

    let mut chart = ChartBuilder::on(area)
        .caption("Cumulative rainwater potential", ("sans-serif", 24))
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(80)
        .build_cartesian_2d(0.0..x_max, 0.0..y_max)?;

    chart
        .configure_mesh()
        .x_desc("Buildings (sorted)")
        .y_desc("Cumulative potential (m³/year)")
        .draw()?;

    chart.draw_series(LineSeries::new(
        cumulative.iter().enumerate().map(|(i, &v)| (i as f64, v)),
        BLUE.stroke_width(2),
    ))?;

    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

/// Equal-width bins over `[min, max]`; the last bin includes `max`.
/// A zero-width range is widened to `[v - 0.5, v + 0.5]`.
pub fn histogram_bins(values: &[f64], bins: usize) -> Vec<HistogramBin> {
    if values.is_empty() || bins == 0 {
        return Vec::new();
    }

    let mut min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let mut max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max - min <= 0.0 {
        min -= 0.5;
        max += 0.5;
    }

    let width = (max - min) / bins as f64;
    let mut result: Vec<HistogramBin> = (0..bins)
        .map(|i| HistogramBin {
            start: min + width * i as f64,
            end: min + width * (i + 1) as f64,
            count: 0,
        })
        .collect();

    for &value in values {
        let index = (((value - min) / width) as usize).min(bins - 1);
        result[index].count += 1;
    }

    result
}

/// Running total in m³ over volumes sorted ascending.
pub fn cumulative_m3(volumes: &[f64]) -> Vec<f64> {
    let mut sorted = volumes.to_vec();
    sorted.sort_by(f64::total_cmp);

    sorted
        .iter()
        .scan(0.0, |total, v| {
            *total += v;
            Some(*total / 1000.0)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::RainwaterAnalyzer;
    use crate::models::{Footprint, PrecipitationRecord, PrecipitationSource};
    use crate::processors::{PotentialClassifier, VolumeCalculator};
    use geo::polygon;
    use tempfile::TempDir;

    fn classified(areas: &[f64]) -> Result<(Dataset, RainwaterReport)> {
        let mut dataset: Dataset = areas
            .iter()
            .map(|&area| {
                let outline = polygon![
                    (x: 9.31, y: 48.70),
                    (x: 9.3101, y: 48.70),
                    (x: 9.3101, y: 48.7001),
                    (x: 9.31, y: 48.70),
                ];
                Footprint::from_polygon(outline, area).with_building_tag("house")
            })
            .collect();

        let precipitation = PrecipitationRecord::new(800.0, 2023, PrecipitationSource::Configured)?;
        VolumeCalculator::new(&precipitation).apply(&mut dataset)?;
        let thresholds = PotentialClassifier::new().classify(&mut dataset)?;
        let report = RainwaterAnalyzer::new().analyze(&dataset, &thresholds)?;
        Ok((dataset, report))
    }

    #[test]
    fn test_write_chart_produces_png() -> Result<()> {
        let dir = TempDir::new()?;

        for (name, areas) in [("three.png", &[50.0, 100.0, 150.0][..]), ("empty.png", &[][..])] {
            let (dataset, report) = classified(areas)?;
            let path = dir.path().join("figures").join(name);

            ChartWriter::new("Denkendorf")
                .with_size(600, 480)
                .with_bins(10)
                .write_chart(&dataset, &report, &path)?;

            let bytes = std::fs::read(&path)?;
            assert!(!bytes.is_empty(), "{} is empty", name);
            assert_eq!(&bytes[..4], b"\x89PNG", "{} is not a PNG", name);
        }
        Ok(())
    }

    #[test]
    fn test_histogram_counts_every_value() {
        let values = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 10.0];
        let bins = histogram_bins(&values, 5);

        assert_eq!(bins.len(), 5);
        assert_eq!(bins[0].start, 0.0);
        assert_eq!(bins[4].end, 10.0);
        assert_eq!(
            bins.iter().map(|b| b.count).collect::<Vec<_>>(),
            vec![2, 2, 2, 2, 2]
        );
    }

    #[test]
    fn test_histogram_single_value() {
        let bins = histogram_bins(&[90000.0], 50);

        assert_eq!(bins.len(), 50);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 1);
        assert_eq!(bins[0].start, 89999.5);
    }

    #[test]
    fn test_histogram_empty() {
        assert!(histogram_bins(&[], 50).is_empty());
    }

    #[test]
    fn test_cumulative_sorted_ascending() {
        let cumulative = cumulative_m3(&[120000.0, 40000.0, 80000.0]);
        assert_eq!(cumulative, vec![40.0, 120.0, 240.0]);
    }
}
