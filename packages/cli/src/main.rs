#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line front end for the crime oracle pipeline.
//!
//! Every subcommand loads the configuration (`--config`, then
//! `CRIME_ORACLE_CONFIG`, then the embedded default), reads the incident
//! and station tables, and partitions the incidents before doing its work.

mod report;

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use crime_oracle_assistant::{AssistantRequest, Briefing, answer_or_fallback, system_instruction};
use crime_oracle_config::OracleConfig;
use crime_oracle_dataset::Dataset;
use crime_oracle_hotspot::Partition;
use crime_oracle_overlay::MapLayers;
use crime_oracle_projection::ProjectionError;
use crime_oracle_projection_models::ProjectionReport;

#[derive(Parser)]
#[command(name = "crime_oracle", about = "Crime hotspot mapping and risk projection")]
struct Cli {
    /// Path to a TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Partition incidents into hotspots and list them
    Hotspots {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Project risk for every hotspot on a date
    Predict {
        /// Date to predict (YYYY-MM-DD). Defaults to tomorrow.
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Write map layers as GeoJSON
    Overlay {
        /// Include predicted-risk rings for this date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Output file. Prints to stdout when omitted.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Ask the assistant a question
    Ask {
        /// The question
        question: String,
        /// Prediction date the question refers to (YYYY-MM-DD)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Start the HTTP API server
    Serve,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let config = crime_oracle_config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Hotspots { json } => {
            let (_, partition) = load_pipeline(&config)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&partition.hotspots)?);
            } else {
                println!("{}", report::hotspot_table(&partition.hotspots));
            }
        }
        Commands::Predict { date, json } => {
            let (_, partition) = load_pipeline(&config)?;
            let date = date.unwrap_or_else(crime_oracle_projection::tomorrow);
            let report = project(&config, &partition, date)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", report::projection_table(&report));
            }
        }
        Commands::Overlay { date, output } => {
            let (dataset, partition) = load_pipeline(&config)?;
            let report = date
                .map(|date| project(&config, &partition, date))
                .transpose()?;
            let layers = MapLayers {
                incidents: &dataset.incidents,
                hotspots: &partition.hotspots,
                stations: &dataset.stations,
                report: report.as_ref(),
            };
            let geojson = serde_json::to_string_pretty(&layers.to_feature_collection())?;
            write_output(output.as_deref(), &geojson)?;
        }
        Commands::Ask { question, date } => {
            let (_, partition) = load_pipeline(&config)?;
            let report = date
                .map(|date| project(&config, &partition, date))
                .transpose()?;
            let briefing = Briefing {
                hotspots: partition.hotspots,
                report,
            };

            let assistant = match crime_oracle_assistant::providers::create_assistant_from_env() {
                Ok(assistant) => assistant,
                Err(e) => {
                    log::warn!("Assistant provider unavailable: {e}; using canned replies");
                    None
                }
            };

            let request = AssistantRequest {
                system_instruction: system_instruction(&briefing),
                prompt: question,
                history: Vec::new(),
                grounded: true,
            };
            let reply = answer_or_fallback(assistant.as_deref(), &request, &briefing).await;

            println!("{}", reply.text);
            for url in &reply.citations {
                println!("  [source] {url}");
            }
        }
        Commands::Serve => {
            // The server uses actix-web's runtime, so we need to run it
            // in a blocking task to avoid nesting tokio runtimes.
            tokio::task::spawn_blocking(move || {
                actix_web::rt::System::new().block_on(crime_oracle_server::run_server(config))
            })
            .await??;
        }
    }

    Ok(())
}

fn load_pipeline(
    config: &OracleConfig,
) -> Result<(Dataset, Partition), Box<dyn std::error::Error>> {
    let dataset = Dataset::load(&config.data.incidents, config.data.stations.as_deref())?;
    let partition = crime_oracle_hotspot::partition(&dataset.incidents, &config.partition)?;
    Ok((dataset, partition))
}

fn project(
    config: &OracleConfig,
    partition: &Partition,
    date: NaiveDate,
) -> Result<ProjectionReport, ProjectionError> {
    crime_oracle_projection::project_from_today(&partition.hotspots, date, &config.projection)
}

fn write_output(path: Option<&Path>, contents: &str) -> std::io::Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, contents)?;
            log::info!("Wrote {}", path.display());
            Ok(())
        }
        None => {
            println!("{contents}");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_global_config_and_date() {
        let cli = Cli::try_parse_from([
            "crime_oracle",
            "predict",
            "--date",
            "2021-06-28",
            "--config",
            "oracle.toml",
        ])
        .unwrap();
        assert_eq!(cli.config.as_deref(), Some(Path::new("oracle.toml")));
        assert!(matches!(
            cli.command,
            Commands::Predict { date: Some(d), json: false }
                if d == NaiveDate::from_ymd_opt(2021, 6, 28).unwrap()
        ));
    }

    #[test]
    fn rejects_malformed_date() {
        assert!(Cli::try_parse_from(["crime_oracle", "overlay", "--date", "June"]).is_err());
    }

    #[test]
    fn ask_takes_positional_question() {
        let cli =
            Cli::try_parse_from(["crime_oracle", "ask", "where are the hotspots?"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Ask { ref question, date: None } if question == "where are the hotspots?"
        ));
    }
}
