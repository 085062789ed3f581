//! ib-curve: trace generalized information bottleneck curves.
//!
//! - `compute` traces a curve and prints (or writes) its run record
//! - `check` validates an input distribution and prints its axis bounds
//!
//! stdout carries the payload only; logs go to stderr.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use ib_core::config::{duration_from_secs, validate_config, validate_joint};
use ib_core::curve::preprocess::preprocess;
use ib_core::input::load_joint;
use ib_core::logging::{generate_run_id, init_logging, LogConfig, LogFormat, LogLevel};
use ib_core::record::{Bounds, RunRecord};
use ib_core::{compute_curve, CancelToken, Curve, CurveConfig, CurveError, CurveResult, ExitCode};

/// Generalized information bottleneck curve tracer
#[derive(Parser)]
#[command(name = "ib-curve")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true, value_enum)]
    log_level: Option<LogLevel>,

    /// Log format (human, jsonl)
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormat>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Trace the curve for a joint distribution
    Compute(ComputeArgs),

    /// Validate a joint distribution and print its axis bounds
    Check(CheckArgs),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Run record as JSON
    #[default]
    Json,
    /// Human-readable table
    Summary,
}

/// Parameters shared by `compute` and `check`; each overrides `--config`.
#[derive(Args, Debug)]
struct ParamArgs {
    /// Joint distribution P(x, y) as JSON
    #[arg(long, short = 'i')]
    input: PathBuf,

    /// Configuration file (TOML or JSON)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Renyi order of the horizontal axis
    #[arg(long, allow_negative_numbers = true)]
    gamma: Option<f64>,

    /// Output format
    #[arg(long, short = 'f', value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,
}

#[derive(Args, Debug)]
struct ComputeArgs {
    #[command(flatten)]
    params: ParamArgs,

    /// Number of segments along the horizontal axis
    #[arg(long, short = 'n')]
    points: Option<usize>,

    /// Weight of H(T|X) in the generalized cost
    #[arg(long, allow_negative_numbers = true)]
    alpha: Option<f64>,

    /// Tolerance on |Hga - target|
    #[arg(long, allow_negative_numbers = true)]
    delta: Option<f64>,

    /// Solver convergence threshold
    #[arg(long, allow_negative_numbers = true)]
    epsilon: Option<f64>,

    /// Planes for downstream rendering (ib, dib, gib, all, none)
    #[arg(long)]
    display: Option<String>,

    /// Explicit beta values; replaces the horizontal-axis partition
    #[arg(long = "beta", value_name = "BETA", value_delimiter = ',', allow_negative_numbers = true)]
    betas: Vec<f64>,

    /// Worker threads (default: available cores)
    #[arg(long, short = 'w')]
    workers: Option<usize>,

    /// Whole-request time budget in seconds
    #[arg(long)]
    timeout: Option<f64>,

    /// Per-target search time budget in seconds
    #[arg(long)]
    search_timeout: Option<f64>,

    /// Write the run record here instead of stdout
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,

    /// Fail if any point is approximate
    #[arg(long)]
    strict: bool,
}

#[derive(Args, Debug)]
struct CheckArgs {
    #[command(flatten)]
    params: ParamArgs,
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.global.quiet {
        Some(LogLevel::Error)
    } else {
        match cli.global.verbose {
            0 => cli.global.log_level,
            1 => Some(LogLevel::Debug),
            _ => Some(LogLevel::Trace),
        }
    };
    init_logging(&LogConfig::resolve(level, cli.global.log_format));

    let exit_code = match cli.command {
        Commands::Compute(args) => run_compute(&args),
        Commands::Check(args) => run_check(&args),
    };
    std::process::exit(exit_code.as_i32());
}

fn report(command: &str, err: &CurveError) -> ExitCode {
    eprintln!("ib-curve {command}: error {}: {err}", err.code());
    err.exit_code()
}

fn base_config(params: &ParamArgs) -> CurveResult<CurveConfig> {
    let mut config = match &params.config {
        Some(path) => CurveConfig::load(path)?,
        None => CurveConfig::default(),
    };
    if let Some(gamma) = params.gamma {
        config.gamma = gamma;
    }
    Ok(config)
}

fn compute_config(args: &ComputeArgs) -> CurveResult<CurveConfig> {
    let mut config = base_config(&args.params)?;
    if let Some(points) = args.points {
        config.points = points;
    }
    if let Some(alpha) = args.alpha {
        config.alpha = alpha;
    }
    if let Some(delta) = args.delta {
        config.delta = delta;
    }
    if let Some(epsilon) = args.epsilon {
        config.epsilon = epsilon;
    }
    if let Some(display) = &args.display {
        config.display = display.parse()?;
    }
    if !args.betas.is_empty() {
        config.betas = args.betas.clone();
    }
    if let Some(workers) = args.workers {
        config.workers = Some(workers);
    }
    if let Some(secs) = args.timeout {
        config.request_timeout = Some(duration_from_secs("timeout", secs)?);
    }
    if let Some(secs) = args.search_timeout {
        config.search.search_timeout = Some(duration_from_secs("search_timeout", secs)?);
    }
    Ok(config)
}

fn run_compute(args: &ComputeArgs) -> ExitCode {
    match compute(args) {
        Ok(code) => code,
        Err(e) => report("compute", &e),
    }
}

fn compute(args: &ComputeArgs) -> CurveResult<ExitCode> {
    let config = compute_config(args)?;
    let pxy = load_joint(&args.params.input)?;
    let solver = config.solver.build();
    let curve = compute_curve(&pxy, &config, solver.as_ref(), &CancelToken::new())?;
    if args.strict {
        curve.require_exact()?;
    }

    let record = RunRecord::from_curve(&curve, generate_run_id());
    match &args.output {
        Some(path) => record.save(path)?,
        None => match args.params.format {
            OutputFormat::Json => println!("{}", record.to_json()?),
            OutputFormat::Summary => print_summary(&curve, &args.params.input),
        },
    }

    if curve.is_exact() {
        Ok(ExitCode::Clean)
    } else {
        for d in &curve.degradations {
            eprintln!("ib-curve compute: approximate: {d}");
        }
        Ok(ExitCode::Approximate)
    }
}

fn print_summary(curve: &Curve, input: &Path) {
    println!("# {} (gamma={}, alpha={})", input.display(), curve.gamma, curve.alpha);
    println!("Hx={:.6} Hgx={:.6} Ixy={:.6}", curve.hx, curve.hgx, curve.ixy);
    println!(
        "{:>12} {:>10} {:>10} {:>10} {:>10} {:>10}  status",
        "beta", "Hga", "Ixt", "Ht", "Hgt", "Iyt"
    );
    for p in &curve.points {
        let status = if p.is_approximate() { "approx" } else { "ok" };
        println!(
            "{:>12.6} {:>10.6} {:>10.6} {:>10.6} {:>10.6} {:>10.6}  {}",
            p.beta, p.hga, p.ixt, p.ht, p.hgt, p.iyt, status
        );
    }
}

fn run_check(args: &CheckArgs) -> ExitCode {
    match check(args) {
        Ok(code) => code,
        Err(e) => report("check", &e),
    }
}

fn check(args: &CheckArgs) -> CurveResult<ExitCode> {
    let config = base_config(&args.params)?;
    validate_config(&config)?;
    let pxy = load_joint(&args.params.input)?;
    validate_joint(&pxy)?;
    let dist = preprocess(&pxy, config.gamma)?;
    let bounds = Bounds {
        hx: dist.hx,
        hgx: dist.hgx,
        ixy: dist.ixy,
    };

    match args.params.format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&bounds)
                .map_err(|e| CurveError::Internal(e.to_string()))?;
            println!("{json}");
        }
        OutputFormat::Summary => {
            println!("Hx={:.6} Hgx={:.6} Ixy={:.6}", bounds.hx, bounds.hgx, bounds.ixy);
        }
    }
    Ok(ExitCode::Clean)
}
