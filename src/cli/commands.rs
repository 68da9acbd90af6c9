use std::path::Path;
use tracing::{info, warn};

use crate::analyzers::{RainwaterAnalyzer, RainwaterReport};
use crate::cli::args::{Cli, Commands};
use crate::error::Result;
use crate::fetchers::{http_client, OpenMeteoClient, OverpassClient};
use crate::models::{ColumnSummary, Dataset, PrecipitationRecord};
use crate::processors::{PotentialClassifier, VolumeCalculator};
use crate::readers::FootprintReader;
use crate::settings::{ConfigOverrides, PipelineConfig};
use crate::utils::progress::ProgressReporter;
use crate::writers::{ChartWriter, GeoJsonWriter, MapWriter, PrecipitationWriter, ReportWriter};

pub async fn run(cli: Cli) -> Result<()> {
    let config = PipelineConfig::load(&ConfigOverrides::from(cli.config))?;
    let quiet = cli.quiet;

    match cli.command {
        Commands::FetchBuildings => {
            let dataset = fetch_buildings(&config, quiet).await?;
            let path = config.buildings_path();
            GeoJsonWriter::new().write_dataset(&dataset, &path)?;

            let file_info = GeoJsonWriter::new().get_file_info(&path)?;
            println!("\n{}", file_info.summary());
            print_column_summaries(&dataset);
        }

        Commands::FetchPrecipitation => {
            let record = fetch_precipitation(&config, quiet).await?;
            PrecipitationWriter::new().write_cache(&record, &config.precipitation_cache_path())?;

            println!(
                "Annual precipitation for {}: {:.1} mm",
                config.year,
                record.rounded_mm()
            );
            println!("Cached in {}", config.precipitation_cache_path().display());
        }

        Commands::CalcVolume => {
            let path = config.buildings_path();
            let mut dataset = FootprintReader::new().read_dataset(&path)?;
            let precipitation = config.precipitation()?;

            derive_volumes(&mut dataset, &precipitation)?;
            GeoJsonWriter::new().write_dataset(&dataset, &path)?;
        }

        Commands::Report {
            top_n,
            json,
            no_render,
        } => {
            let path = config.buildings_path();
            let mut dataset = FootprintReader::new().read_dataset(&path)?;

            let report = classify_and_report(&mut dataset, top_n)?;
            GeoJsonWriter::new().write_dataset(&dataset, &path)?;

            if let Some(json_path) = json {
                ReportWriter::new().write_json(&report, &json_path)?;
            }
            if !no_render {
                render(&config, &dataset, &report, quiet)?;
            }
        }

        Commands::Run { top_n, json } => {
            run_pipeline(&config, top_n, json.as_deref(), quiet).await?;
        }
    }

    Ok(())
}

/// All stages in one process. Only the precipitation fetch may fall back.
async fn run_pipeline(
    config: &PipelineConfig,
    top_n: usize,
    json: Option<&Path>,
    quiet: bool,
) -> Result<()> {
    let path = config.buildings_path();

    println!("Stage 1/5: fetching building footprints");
    let mut dataset = fetch_buildings(config, quiet).await?;
    GeoJsonWriter::new().write_dataset(&dataset, &path)?;

    println!("\nStage 2/5: preliminary volume");
    let configured = config.precipitation()?;
    derive_volumes(&mut dataset, &configured)?;

    println!("\nStage 3/5: fetching precipitation");
    let precipitation = match fetch_precipitation(config, quiet).await {
        Ok(record) => {
            PrecipitationWriter::new().write_cache(&record, &config.precipitation_cache_path())?;
            record
        }
        Err(e) => {
            warn!(
                "Precipitation fetch failed ({}), continuing with {}",
                e, configured
            );
            configured
        }
    };

    println!("\nStage 4/5: volume with {:.1} mm", precipitation.annual_total_mm);
    derive_volumes(&mut dataset, &precipitation)?;
    GeoJsonWriter::new().write_dataset(&dataset, &path)?;

    println!("\nStage 5/5: report");
    let report = classify_and_report(&mut dataset, top_n)?;
    GeoJsonWriter::new().write_dataset(&dataset, &path)?;

    if let Some(json_path) = json {
        ReportWriter::new().write_json(&report, json_path)?;
    }
    render(config, &dataset, &report, quiet)?;

    println!("\nPipeline complete!");
    Ok(())
}

async fn fetch_buildings(config: &PipelineConfig, quiet: bool) -> Result<Dataset> {
    let progress = ProgressReporter::new_spinner(
        &format!("Fetching buildings for {}...", config.place_name),
        quiet,
    );

    let client = OverpassClient::new(http_client()?);
    let dataset = client.fetch_buildings(&config.place_name).await?;

    progress.finish_with_message(&format!("Fetched {} footprints", dataset.len()));
    Ok(dataset)
}

async fn fetch_precipitation(config: &PipelineConfig, quiet: bool) -> Result<PrecipitationRecord> {
    let progress = ProgressReporter::new_spinner(
        &format!("Fetching {} precipitation...", config.year),
        quiet,
    );

    let client = OpenMeteoClient::new(http_client()?);
    let record = client
        .fetch_annual_precipitation(
            config.latitude,
            config.longitude,
            config.year,
            &config.timezone,
        )
        .await?;

    progress.finish_with_message(&format!("{:.1} mm", record.rounded_mm()));
    Ok(record)
}

fn derive_volumes(dataset: &mut Dataset, precipitation: &PrecipitationRecord) -> Result<()> {
    info!("Using annual precipitation {}", precipitation);

    let calculator = VolumeCalculator::new(precipitation);
    calculator.apply(dataset)?;

    println!(
        "Total rainwater potential at {:.1} mm: {:.0} L per year",
        calculator.annual_precip_mm(),
        VolumeCalculator::total_liters(dataset)
    );
    print_column_summaries(dataset);
    Ok(())
}

fn classify_and_report(dataset: &mut Dataset, top_n: usize) -> Result<RainwaterReport> {
    let thresholds = PotentialClassifier::new().classify(dataset)?;
    info!("Category thresholds: {}", thresholds);

    let report = RainwaterAnalyzer::new()
        .with_top_n(top_n)
        .analyze(dataset, &thresholds)?;

    println!("\n{}", report.detailed_summary());
    Ok(report)
}

fn render(
    config: &PipelineConfig,
    dataset: &Dataset,
    report: &RainwaterReport,
    quiet: bool,
) -> Result<()> {
    let progress = ProgressReporter::new(dataset.len() as u64, "Rendering map...", quiet);
    MapWriter::new()
        .with_title(format!("Rainwater potential: {}", config.place_name))
        .write_map(
            dataset,
            &report.thresholds,
            (config.latitude, config.longitude),
            &config.map_path(),
            &progress,
        )?;
    progress.finish_with_message("Map rendered");

    ChartWriter::new(&config.place_name).write_chart(dataset, report, &config.chart_path())?;

    println!("\nMap saved to {}", config.map_path().display());
    println!("Chart saved to {}", config.chart_path().display());
    Ok(())
}

fn print_column_summaries(dataset: &Dataset) {
    let area = ColumnSummary::from_values(&dataset.areas());
    let volume = ColumnSummary::from_values(&dataset.volumes());

    if area.is_none() && volume.is_none() {
        println!("No footprints to summarize");
        return;
    }

    println!("\n{}", ColumnSummary::table_header());
    if let Some(summary) = area {
        println!("{}", summary.table_row("area_m2"));
    }
    if let Some(summary) = volume {
        println!("{}", summary.table_row("rain_liter_per_year"));
    }
}
