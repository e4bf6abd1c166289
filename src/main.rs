//! Building energy simulator entry point: CLI wiring, simulation, and calibration.

use std::path::Path;
use std::process;

use bem_sim::calibration::{CalibrationOutcome, CalibrationRequest, calibrate};
use bem_sim::config::{BuildingConfig, CalibrationConfig};
use bem_sim::io::export::export_csv;
use bem_sim::model::{AnnualSummary, BuildingEnergyModel};
use bem_sim::telemetry::init_tracing;

/// Ranked calibration results printed after a run.
const RESULTS_SHOWN: usize = 10;

/// Parsed CLI arguments.
struct CliArgs {
    config_path: Option<String>,
    preset: Option<String>,
    results_out: Option<String>,
    save_config: Option<String>,
    calibrate_path: Option<String>,
    seed_override: Option<u64>,
    verbose: bool,
    #[cfg(feature = "api")]
    serve: bool,
    #[cfg(feature = "api")]
    port: u16,
}

fn print_help() {
    eprintln!("bem-sim: monthly building HVAC energy model with calibration");
    eprintln!();
    eprintln!("Usage: bem-sim [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --config <path>          Load building config (.json or .toml)");
    eprintln!("  --preset <name>          Use a built-in preset (modern, old)");
    eprintln!("  --results-out <path>     Export monthly results to CSV");
    eprintln!("  --save-config <path>     Save the building config as JSON");
    eprintln!("  --calibrate <path>       Run a calibration described by a TOML file");
    eprintln!("  --seed <u64>             Override the calibration seed");
    eprintln!("  --verbose                Enable debug logging");
    #[cfg(feature = "api")]
    {
        eprintln!("  --serve                  Start REST API server after the run");
        eprintln!("  --port <u16>             API server port (default: 3000)");
    }
    eprintln!("  --help                   Show this help message");
    eprintln!();
    eprintln!("If no --config or --preset is given, the modern preset is used.");
}

/// Returns the value following flag `args[*i]`, exiting if it is missing.
fn flag_value(args: &[String], i: &mut usize, what: &str) -> String {
    *i += 1;
    if *i >= args.len() {
        eprintln!("error: {} requires {what}", args[*i - 1]);
        process::exit(1);
    }
    args[*i].clone()
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        config_path: None,
        preset: None,
        results_out: None,
        save_config: None,
        calibrate_path: None,
        seed_override: None,
        verbose: false,
        #[cfg(feature = "api")]
        serve: false,
        #[cfg(feature = "api")]
        port: 3000,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            "--config" => cli.config_path = Some(flag_value(&args, &mut i, "a path argument")),
            "--preset" => cli.preset = Some(flag_value(&args, &mut i, "a name argument")),
            "--results-out" => cli.results_out = Some(flag_value(&args, &mut i, "a path argument")),
            "--save-config" => cli.save_config = Some(flag_value(&args, &mut i, "a path argument")),
            "--calibrate" => {
                cli.calibrate_path = Some(flag_value(&args, &mut i, "a path argument"));
            }
            "--seed" => {
                let value = flag_value(&args, &mut i, "a u64 argument");
                if let Ok(s) = value.parse::<u64>() {
                    cli.seed_override = Some(s);
                } else {
                    eprintln!("error: --seed value \"{value}\" is not a valid u64");
                    process::exit(1);
                }
            }
            "--verbose" | "-v" => cli.verbose = true,
            #[cfg(feature = "api")]
            "--serve" => {
                cli.serve = true;
            }
            #[cfg(feature = "api")]
            "--port" => {
                let value = flag_value(&args, &mut i, "a u16 argument");
                if let Ok(p) = value.parse::<u16>() {
                    cli.port = p;
                } else {
                    eprintln!("error: --port value \"{value}\" is not a valid u16");
                    process::exit(1);
                }
            }
            other => {
                eprintln!("error: unknown argument \"{other}\"");
                print_help();
                process::exit(1);
            }
        }
        i += 1;
    }

    cli
}

fn load_building(cli: &CliArgs) -> BuildingConfig {
    let loaded = if let Some(ref path) = cli.config_path {
        BuildingConfig::from_file(Path::new(path))
    } else if let Some(ref name) = cli.preset {
        BuildingConfig::from_preset(name)
    } else {
        Ok(BuildingConfig::modern_office())
    };
    let building = loaded.unwrap_or_else(|e| {
        eprintln!("{e}");
        process::exit(1);
    });

    let errors = building.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }
    building
}

fn run_calibration(building: &BuildingConfig, path: &Path, seed: Option<u64>) -> CalibrationOutcome {
    let cal = CalibrationConfig::from_toml_file(path).unwrap_or_else(|e| {
        eprintln!("{e}");
        process::exit(1);
    });
    let errors = cal.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }

    let (method, actual) = match (cal.method(), cal.actual_data()) {
        (Ok(method), Ok(actual)) => (method, actual),
        (Err(e), _) | (_, Err(e)) => {
            eprintln!("{e}");
            process::exit(1);
        }
    };
    let mut options = cal.options();
    if let Some(seed) = seed {
        options.seed = seed;
    }

    let request = CalibrationRequest::new(building, actual, cal.target, cal.parameters.clone());
    calibrate(&request, method, &options, None).unwrap_or_else(|e| {
        eprintln!("error: {e}");
        process::exit(1);
    })
}

fn print_outcome(outcome: &CalibrationOutcome) {
    println!(
        "\n--- Calibration ({}, {}, {} evaluations) ---",
        outcome.method, outcome.status, outcome.evaluations
    );
    for (rank, result) in outcome.results.iter().take(RESULTS_SHOWN).enumerate() {
        println!("#{:<2} {result}", rank + 1);
    }
    if let Some(summary) = outcome
        .best()
        .and_then(|best| best.simulation_results.as_deref())
        .map(AnnualSummary::from_results)
    {
        println!("\nBest fit:\n{summary}");
    }
}

fn main() {
    let cli = parse_args();

    if let Err(e) = init_tracing(cli.verbose) {
        eprintln!("error: failed to initialise logging: {e}");
        process::exit(1);
    }

    let building = load_building(&cli);

    let results = BuildingEnergyModel::from_config(&building).simulate_year();
    for r in &results {
        println!("{r}");
    }
    println!("\n{}", AnnualSummary::from_results(&results));

    if let Some(ref path) = cli.results_out {
        if let Err(e) = export_csv(&results, Path::new(path)) {
            eprintln!("error: failed to write CSV: {e}");
            process::exit(1);
        }
        eprintln!("Results written to {path}");
    }

    if let Some(ref path) = cli.save_config {
        if let Err(e) = building.save_json(Path::new(path)) {
            eprintln!("{e}");
            process::exit(1);
        }
        eprintln!("Config written to {path}");
    }

    if let Some(ref path) = cli.calibrate_path {
        let outcome = run_calibration(&building, Path::new(path), cli.seed_override);
        print_outcome(&outcome);
    }

    #[cfg(feature = "api")]
    if cli.serve {
        use std::net::SocketAddr;
        use std::sync::Arc;

        let mut options = bem_sim::calibration::CalibrationOptions::default();
        if let Some(seed) = cli.seed_override {
            options.seed = seed;
        }
        let state = Arc::new(bem_sim::api::AppState { options });
        let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
        let rt = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
            eprintln!("error: failed to create tokio runtime: {e}");
            process::exit(1);
        });
        if let Err(e) = rt.block_on(bem_sim::api::serve(state, addr)) {
            eprintln!("error: API server failed: {e}");
            process::exit(1);
        }
    }
}
