use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::settings::ConfigOverrides;
use crate::utils::constants::DEFAULT_TOP_N;

#[derive(Parser)]
#[command(name = "rainwater-potential")]
#[command(about = "Rooftop rainwater harvesting potential from OSM footprints and precipitation archives")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(short, long, global = true, help = "Hide progress bars and spinners")]
    pub quiet: bool,

    #[command(flatten)]
    pub config: ConfigArgs,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    #[arg(long, global = true, help = "Configuration file [default: rainwater.toml if present]")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, help = "Place name resolved through Nominatim")]
    pub place_name: Option<String>,

    #[arg(long, global = true, help = "Short name used in interim file names")]
    pub short_name: Option<String>,

    #[arg(long, global = true, help = "Annual precipitation in mm, overrides the cached value")]
    pub precip_mm: Option<f64>,

    #[arg(long, global = true, help = "Year of the precipitation record")]
    pub year: Option<i32>,

    #[arg(long, global = true, help = "Directory for interim files")]
    pub data_dir: Option<PathBuf>,

    #[arg(long, global = true, help = "Directory for the map and chart")]
    pub output_dir: Option<PathBuf>,
}

impl From<ConfigArgs> for ConfigOverrides {
    fn from(args: ConfigArgs) -> Self {
        Self {
            config_file: args.config,
            place_name: args.place_name,
            short_name: args.short_name,
            annual_precip_mm: args.precip_mm,
            year: args.year,
            data_dir: args.data_dir,
            output_dir: args.output_dir,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch building footprints for the place and compute roof areas
    FetchBuildings,

    /// Fetch the annual precipitation total and cache it
    FetchPrecipitation,

    /// Derive annual rainwater volume per footprint from the configured precipitation
    CalcVolume,

    /// Classify footprints, print statistics and render the map and chart
    Report {
        #[arg(long, default_value_t = DEFAULT_TOP_N, help = "Number of footprints in the ranking")]
        top_n: usize,

        #[arg(long, help = "Also write the report as JSON to this path")]
        json: Option<PathBuf>,

        #[arg(long, help = "Skip the map and chart")]
        no_render: bool,
    },

    /// Run every stage in sequence
    Run {
        #[arg(long, default_value_t = DEFAULT_TOP_N, help = "Number of footprints in the ranking")]
        top_n: usize,

        #[arg(long, help = "Also write the report as JSON to this path")]
        json: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_overrides_after_subcommand() {
        let cli = Cli::try_parse_from([
            "rainwater-potential",
            "calc-volume",
            "--precip-mm",
            "812.5",
            "--short-name",
            "esslingen",
        ])
        .unwrap();

        assert!(matches!(cli.command, Commands::CalcVolume));
        let overrides = ConfigOverrides::from(cli.config);
        assert_eq!(overrides.annual_precip_mm, Some(812.5));
        assert_eq!(overrides.short_name.as_deref(), Some("esslingen"));
        assert!(overrides.place_name.is_none());
    }

    #[test]
    fn test_report_defaults() {
        let cli = Cli::try_parse_from(["rainwater-potential", "report", "--no-render"]).unwrap();

        match cli.command {
            Commands::Report {
                top_n,
                json,
                no_render,
            } => {
                assert_eq!(top_n, DEFAULT_TOP_N);
                assert!(json.is_none());
                assert!(no_render);
            }
            _ => panic!("expected report command"),
        }
    }
}
