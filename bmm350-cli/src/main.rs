use std::{io::stdout, path::PathBuf};

use anyhow::{anyhow, Result};
use bmm350_forced_mode::{check_device, driver::InterruptConfig, run_sequence, Trigger};
use clap::{Parser, Subcommand};
use log::{info, warn, LevelFilter};

use crate::{
    analyze::{analyze_readings, read_readings_csv},
    host::{Delay, InstantClock, NoDelay},
    plan::{read_plan, validate_plan, Plan},
    report::{write_device_status, write_mean, write_noise, ConsoleReport},
    simulated_bmm350::SimulatedBmm350,
};

mod analyze;
mod csv_writer;
mod host;
mod plan;
mod report;
mod simulated_bmm350;

#[derive(Parser)]
#[command(name = "BMM350 CLI")]
#[command(bin_name = "bmm350-cli")]
struct Cli {
    /// off, error, warn, info, debug or trace
    #[arg(long, default_value = "info")]
    log_level: String,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Run(RunArgs),
    #[command(about = "List the combinations `run` goes through")]
    Combinations(CombinationsArgs),
    Analyze(AnalyzeArgs),
}

#[derive(clap::Args)]
#[command(about = "Run the forced mode combinations against a simulated BMM350")]
struct RunArgs {
    /// JSON plan, the built-in six combinations are used when omitted
    #[arg(long)]
    plan: Option<PathBuf>,

    /// Write one CSV file per combination into this directory
    #[arg(long)]
    csv_dir: Option<PathBuf>,

    #[arg(long)]
    seed: Option<u64>,

    #[arg(long)]
    scale: Option<f64>,

    /// Skip waiting on conversion times
    #[arg(long, action)]
    no_delay: bool,
}

#[derive(clap::Args)]
struct CombinationsArgs {
    #[arg(long)]
    plan: Option<PathBuf>,
}

#[derive(clap::Args)]
#[command(about = "Compute mean and RMS noise of a readings CSV")]
struct AnalyzeArgs {
    csv: PathBuf,

    #[arg(long, default_value_t = bmm350_forced_mode::NOISE_SCALE_UT_TO_NT)]
    scale: f64,
}

fn load_plan(path: Option<&PathBuf>) -> Result<Plan> {
    match path {
        Some(path) => {
            info!("loading plan from {:?}", path);
            read_plan(path)
        }
        None => Ok(Plan::default()),
    }
}

async fn run(args: RunArgs) -> Result<()> {
    let mut plan = load_plan(args.plan.as_ref())?;
    if let Some(seed) = args.seed {
        plan.simulation.seed = Some(seed);
    }
    if let Some(scale) = args.scale {
        plan.scale = scale;
    }
    validate_plan(&plan)?;

    if let Some(csv_dir) = &args.csv_dir {
        std::fs::create_dir_all(csv_dir)?;
    }

    if args.no_delay {
        let mag = SimulatedBmm350::new(NoDelay, plan.simulation.clone());
        run_plan(mag, &plan, args.csv_dir).await
    } else {
        let mag = SimulatedBmm350::new(Delay, plan.simulation.clone());
        run_plan(mag, &plan, args.csv_dir).await
    }
}

async fn run_plan<D: embedded_hal_async::delay::DelayNs>(
    mut mag: SimulatedBmm350<D>,
    plan: &Plan,
    csv_dir: Option<PathBuf>,
) -> Result<()> {
    let status = check_device(&mut mag, InterruptConfig::default())
        .await
        .map_err(|e| anyhow!("device check failed: {}", e))?;
    write_device_status(&mut stdout(), &status)?;
    if !status.is_healthy() {
        warn!("device status differs from expected values, continuing anyway");
    }

    println!("Compensated Magnetometer and Temperature data in forced mode and forced mode fast");

    let clock = InstantClock::new();
    let mut report = ConsoleReport::new(stdout(), csv_dir);
    run_sequence(
        &mut mag,
        &clock,
        &plan.combinations,
        plan.scale,
        &mut report,
    )
    .await
    .map_err(|e| anyhow!("{}", e))?;
    report.finish()?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    let log_level: LevelFilter = args
        .log_level
        .parse()
        .map_err(|_| anyhow!("invalid log level {}", args.log_level))?;

    let _ = env_logger::builder()
        .filter_level(log_level)
        .parse_default_env()
        .try_init();

    match args.command {
        Commands::Run(args) => run(args).await?,
        Commands::Combinations(args) => {
            let plan = load_plan(args.plan.as_ref())?;
            for (i, combination) in plan.combinations.iter().enumerate() {
                println!(
                    "{}: {} ({} Hz, {} sample averaging, {:?}, {}, {} samples{})",
                    i + 1,
                    combination.name,
                    combination.data_rate.hz(),
                    combination.averaging.samples(),
                    combination.power_mode,
                    match combination.trigger {
                        Trigger::Once => "trigger once",
                        Trigger::EverySample => "trigger every sample",
                    },
                    combination.sample_count,
                    if combination.analyze_noise {
                        ", noise analysis"
                    } else {
                        ""
                    },
                );
            }
        }
        Commands::Analyze(args) => {
            let readings = read_readings_csv(&args.csv)?;
            info!("loaded {} readings from {:?}", readings.len(), args.csv);
            let (mean, noise) = analyze_readings(&readings, args.scale)?;
            write_mean(&mut stdout(), &mean)?;
            write_noise(&mut stdout(), &noise)?;
        }
    }
    Ok(())
}
