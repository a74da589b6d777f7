use clap::{App, Arg};
use colored::*;
use std::time::Duration;
use tokio::time;
use tracing::info;

use habsim::limits::AlertLevel;
use habsim::station::{Station, StationConfig, StationReport, SubsystemReport};
use habsim::subsystems::{OperatingState, Snapshot, SubsystemId};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let matches = App::new("habsim-simulator")
        .version("0.1.0")
        .author("Space Systems Engineering Team")
        .about("🛰️  Habitat Systems Simulator - life-support and power subsystem simulation")
        .arg(
            Arg::with_name("seed")
                .short("s")
                .long("seed")
                .value_name("SEED")
                .help("Master random seed (per-subsystem streams derive from it)")
                .takes_value(true)
                .default_value("0")
                .validator(|v| match v.parse::<u64>() {
                    Ok(_) => Ok(()),
                    Err(_) => Err("Seed must be a valid number".into()),
                }),
        )
        .arg(
            Arg::with_name("period-ms")
                .short("p")
                .long("period-ms")
                .value_name("MILLIS")
                .help("Simulation tick period in milliseconds")
                .takes_value(true)
                .default_value("1000")
                .validator(|v| match v.parse::<u64>() {
                    Ok(0) | Err(_) => Err("Period must be a positive number".into()),
                    Ok(_) => Ok(()),
                }),
        )
        .arg(
            Arg::with_name("ticks")
                .short("t")
                .long("ticks")
                .value_name("COUNT")
                .help("Stop after this many ticks (0 runs until interrupted)")
                .takes_value(true)
                .default_value("0")
                .validator(|v| match v.parse::<u64>() {
                    Ok(_) => Ok(()),
                    Err(_) => Err("Tick count must be a valid number".into()),
                }),
        )
        .arg(
            Arg::with_name("json")
                .short("j")
                .long("json")
                .help("Emit each tick report as one JSON line instead of the table view"),
        )
        .arg(
            Arg::with_name("auto-reset")
                .long("auto-reset")
                .help("Clear latched trouble states automatically after reporting them"),
        )
        .get_matches();

    let seed: u64 = matches.value_of("seed").unwrap_or("0").parse()?;
    let period_ms: u64 = matches.value_of("period-ms").unwrap_or("1000").parse()?;
    let max_ticks: u64 = matches.value_of("ticks").unwrap_or("0").parse()?;
    let json_output = matches.is_present("json");
    let auto_reset = matches.is_present("auto-reset");

    let mut station = Station::new(StationConfig {
        seed,
        ..StationConfig::default()
    })?;

    if !json_output {
        println!("🛰️  Habitat Systems Simulator");
        println!("=============================");
        println!("seed {seed}, tick period {period_ms} ms");
    }

    let mut interval = time::interval(Duration::from_millis(period_ms));

    loop {
        interval.tick().await;

        let report = station.tick_all();

        if json_output {
            println!("{}", serde_json::to_string(&report)?);
        } else {
            render_report(&report);
        }

        if auto_reset {
            clear_trouble(&mut station);
        }

        if max_ticks != 0 && report.tick >= max_ticks {
            break;
        }
    }

    if !json_output {
        println!("🚀 Habitat Systems Simulator stopped");
    }

    Ok(())
}

fn level_tag(level: AlertLevel) -> ColoredString {
    match level {
        AlertLevel::Nominal => "NOMINAL".green(),
        AlertLevel::LowWarning | AlertLevel::HighWarning => "WARNING".yellow(),
        AlertLevel::LowError | AlertLevel::HighError => "ERROR".red().bold(),
    }
}

fn render_subsystem<S: Snapshot>(name: &str, report: &SubsystemReport<S>) {
    println!(
        "  {:<18} {:<10} {}",
        name,
        format!("{:?}", report.snapshot.status()),
        level_tag(report.worst_level()),
    );
    for alert in report.alerts.iter().filter(|alert| !alert.is_nominal()) {
        println!(
            "    {} {}: {}",
            level_tag(alert.level),
            alert.field,
            alert.message.unwrap_or("out of limits"),
        );
    }
}

fn render_report(report: &StationReport) {
    println!(
        "⏱️  tick {} — station worst grade {}",
        report.tick,
        level_tag(report.worst_level()),
    );
    render_subsystem("co2-scrubber", &report.co2_scrubber);
    render_subsystem("power", &report.power);
    render_subsystem("water-processor", &report.water_processor);
    render_subsystem("internal-coolant", &report.internal_coolant);
    render_subsystem("external-coolant", &report.external_coolant);
}

fn clear_trouble(station: &mut Station) {
    let troubled = [
        (
            SubsystemId::Co2Scrubber,
            station.co2_snapshot().status == OperatingState::Trouble,
        ),
        (
            SubsystemId::Power,
            station.power_snapshot().status == OperatingState::Trouble,
        ),
        (
            SubsystemId::WaterProcessor,
            station.water_snapshot().status == OperatingState::Trouble,
        ),
        (
            SubsystemId::InternalCoolant,
            station.internal_coolant_snapshot().status == OperatingState::Trouble,
        ),
        (
            SubsystemId::ExternalCoolant,
            station.external_coolant_snapshot().status == OperatingState::Trouble,
        ),
    ];

    for (id, in_trouble) in troubled {
        if in_trouble {
            info!(subsystem = ?id, "auto-reset clearing latched trouble");
            station.reset_trouble(id);
        }
    }
}
