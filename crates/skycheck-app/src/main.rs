mod app_services;
mod error_mapping;

use anyhow::Result;
use app_services::{AppServices, WeatherSession};
use clap::{Parser, Subcommand};
use error_mapping::{AppResultExt, IntoAppError};
use skycheck_core::{AppError, Config, ConfigError, LocationError};
use skycheck_weather::{icon_url, FetchHandle, WeatherUiState};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tokio::runtime::Handle;

#[derive(Parser)]
#[command(name = "skycheck", about = "Current weather with a health-alert history")]
struct Cli {
    /// Config file to use instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch current weather for a city
    City {
        /// City name as typed by the user
        name: String,
    },
    /// Fetch current weather for the configured device location
    Local,
    /// Show recorded readings and their health alerts
    History,
    /// Insert demo readings into the history
    Demo,
    /// Delete all recorded readings
    Clear,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    skycheck_core::init()?;
    let cli = Cli::parse();

    let result = match load_config(cli.config.as_deref()) {
        Ok(config) => run(cli.command, config).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("{}", e.user_message());
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Load the config file and reject it if validation finds errors.
fn load_config(path: Option<&Path>) -> Result<Config, AppError> {
    let loaded = match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };
    let config = loaded.map_err(|e| ConfigError::ParseError(format!("{:#}", e)))?;

    let validation = config.validate();
    for warning in &validation.warnings {
        tracing::warn!("Config {}: {}", warning.field, warning.message);
    }
    if !validation.is_valid() {
        return Err(ConfigError::Invalid(validation.error_summary()).into());
    }

    Ok(config)
}

async fn run(command: Commands, config: Config) -> Result<(), AppError> {
    let services = AppServices::new(config)?;

    match command {
        Commands::City { name } => {
            let session = services.weather_session(Handle::current())?;
            match session.machine.fetch_by_city(&name) {
                Some(handle) => finish(&session, handle).await,
                None => {
                    println!("Enter a city name.");
                    Ok(())
                }
            }
        }
        Commands::Local => {
            let session = services.weather_session(Handle::current())?;
            fetch_local(&session).await
        }
        Commands::History => show_history(&services).await,
        Commands::Demo => {
            let inserted = services
                .history()
                .seed_demo(services.clock().now_millis())
                .await
                .app_err()?;
            println!("Added {} demo readings.", inserted);
            Ok(())
        }
        Commands::Clear => {
            let deleted = services.history().clear().await.app_err()?;
            println!("Deleted {} readings.", deleted);
            Ok(())
        }
    }
}

/// Device location flow for a host without an interactive permission prompt.
///
/// A rationale request is answered with a decline, which falls back to the
/// default city. So does a location that never resolves.
async fn fetch_local(session: &WeatherSession) -> Result<(), AppError> {
    let machine = &session.machine;
    machine.fetch_by_location().finished().await;

    if machine.rationale().current() {
        println!("{}", LocationError::PermissionDenied.user_message());
        return match machine.decline_rationale() {
            Some(handle) => finish(session, handle).await,
            None => Ok(()),
        };
    }

    if machine.current_state().is_loading() {
        let reason = LocationError::Unavailable("no location fix".into());
        tracing::warn!("{}", reason);
        println!("{}", reason.user_message());
        return match machine.fetch_default_city() {
            Some(handle) => finish(session, handle).await,
            None => Ok(()),
        };
    }

    report(&machine.current_state())
}

async fn finish(session: &WeatherSession, handle: FetchHandle) -> Result<(), AppError> {
    handle.finished().await;
    report(&session.machine.current_state())
}

fn report(state: &WeatherUiState) -> Result<(), AppError> {
    match state {
        WeatherUiState::Success { reading, origin } => {
            let source = if origin.is_local() { " (your location)" } else { "" };
            println!("{}{}", reading.place_name, source);
            println!("  {:.1}°C, {}", reading.temperature_c, reading.description);
            println!(
                "  humidity {}%, pressure {} hPa",
                reading.humidity_pct, reading.pressure_hpa
            );
            if !reading.icon_code.is_empty() {
                println!("  icon {}", icon_url(&reading.icon_code));
            }
            Ok(())
        }
        WeatherUiState::Error(e) => {
            println!("{}", e.user_message());
            Err(e.clone().into_app_error())
        }
        WeatherUiState::Idle | WeatherUiState::Loading => {
            println!("No weather yet.");
            Ok(())
        }
    }
}

async fn show_history(services: &AppServices) -> Result<(), AppError> {
    let entries = services
        .history()
        .entries_with_alerts(services.alerts())
        .await
        .app_err()?;

    if entries.is_empty() {
        println!("No readings recorded yet.");
        return Ok(());
    }

    for entry in entries {
        let r = &entry.record;
        println!(
            "{}  {}  {:.1}°C  {}%  {} hPa  {}",
            r.date, r.place_name, r.temperature_c, r.humidity_pct, r.pressure_hpa, r.description
        );
        for alert in &entry.alerts {
            println!("    ! {}", alert);
        }
    }
    Ok(())
}
