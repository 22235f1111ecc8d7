use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use firewatch::config::FireWatchConfig;
use firewatch::firms::FirmsDownloader;
use firewatch::merge::merge_regional_csvs;
use firewatch::web::{self, AppState};
use firewatch::{
    AssessmentRequest, AssessmentService, BurnedAreaModel, EarthEngineClient, FireWatchError,
    GeocodingClient, Timeframe, WeatherClient, logging,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "firewatch", version, about = "Wildfire alerts, fire weather and burned-area prediction")]
struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Download the latest fire-detection feed
    Download {
        /// Output file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Merge regional CSV files into one dataset
    Merge {
        /// Directory holding the regional CSV files
        #[arg(short, long)]
        input_dir: Option<PathBuf>,
        /// Combined output file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Run one assessment and print the result
    Assess {
        /// Place name or "lat,lon"
        location: Option<String>,
        /// Region radius in kilometers
        #[arg(short, long)]
        radius: Option<u32>,
        /// Fire alert timeframe
        #[arg(short, long, value_enum)]
        timeframe: Option<Timeframe>,
        /// Label of the fire point to center on
        #[arg(long)]
        fire: Option<String>,
        /// Use the dark base map
        #[arg(long)]
        dark: bool,
        /// Write the map as an HTML page
        #[arg(long)]
        map_out: Option<PathBuf>,
        /// Print the assessment as JSON
        #[arg(long)]
        json: bool,
    },
    /// Serve the dashboard
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        match e.downcast_ref::<FireWatchError>() {
            Some(error) => eprintln!("{}", error.user_message()),
            None => eprintln!("Error: {e:#}"),
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let _ = rustls::crypto::ring::default_provider().install_default();

    let config = FireWatchConfig::load_from_path(cli.config)?;
    logging::init(&config.logging, cli.verbose);

    match cli.command {
        Command::Download { output } => {
            let output = output.unwrap_or_else(|| PathBuf::from(&config.firms.output));
            let summary = FirmsDownloader::new(&config.firms)?
                .download(&output)
                .await?;
            println!("Downloaded to: {}", summary.path.display());
        }
        Command::Merge { input_dir, output } => {
            let input_dir = input_dir.unwrap_or_else(|| PathBuf::from(&config.merge.input_dir));
            let output = output.unwrap_or_else(|| PathBuf::from(&config.merge.output));
            let summary = merge_regional_csvs(&input_dir, &output)?;
            println!(
                "Merged {} rows from {} files into {}",
                summary.rows,
                summary.files,
                output.display()
            );
        }
        Command::Assess {
            location,
            radius,
            timeframe,
            fire,
            dark,
            map_out,
            json,
        } => {
            let request = AssessmentRequest {
                location: location.unwrap_or_else(|| config.defaults.location.clone()),
                radius_km: radius.unwrap_or(config.defaults.region_radius_km),
                timeframe: timeframe.unwrap_or(config.defaults.timeframe),
                dark_mode: dark || config.defaults.dark_mode,
                selected_fire: fire,
            };
            let service = build_service(&config).await?;
            let assessment = service.assess(&request).await?;

            if let Some(path) = map_out {
                write_map(&path, &assessment.map.to_html("FireWatch"))?;
            }
            if json {
                println!("{}", serde_json::to_string_pretty(&assessment)?);
            } else {
                print_assessment(&assessment);
            }
        }
        Command::Serve { host, port } => {
            let mut server = config.server.clone();
            if let Some(host) = host {
                server.host = host;
            }
            if let Some(port) = port {
                server.port = port;
            }
            let state = AppState {
                service: Arc::new(build_service(&config).await?),
                defaults: config.defaults.clone(),
            };
            web::run(&server, state).await?;
        }
    }

    Ok(())
}

async fn build_service(config: &FireWatchConfig) -> Result<AssessmentService> {
    let model = BurnedAreaModel::load(Path::new(&config.model.path))?;
    let geocoder = GeocodingClient::new(&config.geocoding)?;
    let weather = WeatherClient::new(&config.weather)?;
    let sensing = EarthEngineClient::from_config(&config.earth_engine)
        .await
        .context("Earth Engine initialization failed")?;

    info!("Assessment service ready");
    Ok(AssessmentService::new(
        geocoder,
        weather,
        Arc::new(sensing),
        Arc::new(model),
    ))
}

fn write_map(path: &Path, html: &str) -> Result<()> {
    std::fs::write(path, html).with_context(|| format!("Failed to write map to {}", path.display()))?;
    println!("Map written to {}", path.display());
    Ok(())
}

fn print_assessment(assessment: &firewatch::Assessment) {
    println!("Location: {}", assessment.location.display_name());
    println!(
        "Timeframe: {} ({} thermal-anomaly images)",
        assessment.timeframe.label(),
        assessment.detection_count
    );

    if assessment.fires.is_empty() {
        println!("No active fire points");
    } else {
        println!("Fire locations:");
        for fire in assessment.fires.iter() {
            let marker = if assessment.selected_label.as_deref() == Some(fire.label.as_str()) {
                "*"
            } else {
                " "
            };
            println!(
                " {marker} {} ({:.4}, {:.4})",
                fire.label, fire.coordinates.latitude, fire.coordinates.longitude
            );
        }
    }

    match &assessment.weather {
        Some(weather) => {
            println!("Weather Conditions:");
            println!("  Temperature:    {}", weather.format_temperature());
            println!("  Humidity:       {}%", weather.humidity);
            println!("  Wind Speed:     {} m/s", weather.wind_speed);
            println!("  Wind Direction: {}", weather.format_wind());
        }
        None => println!("No weather data"),
    }

    if let Some(prediction) = &assessment.prediction {
        println!("Predicted Burned Area: {:.2} sq.km", prediction.burned_area_km2);
        println!(
            "Spread Direction: {} ({}°)",
            prediction.spread.direction, prediction.spread.bearing_deg
        );
    }
}
