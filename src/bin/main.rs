//! hogsvm Command Line Interface
//!
//! Leave-one-out evaluation, grid search and feature inspection for HOG + SVM
//! classification of EMNIST-style letter images.

use clap::{Args, Parser, Subcommand, ValueEnum};
use env_logger::Env;
use hogsvm::core::{PipelineError, Result};
use hogsvm::kernel::{GammaPolicy, KernelKind};
use hogsvm::metrics::class_name;
use hogsvm::report::{EvaluationLog, EvaluationReport, LOG_FILE_NAME};
use hogsvm::validation::{LogProgress, ParameterGrid};
use hogsvm::{ImageDataset, Pipeline, PipelineConfig};
use log::{error, info};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::process;

#[derive(Parser)]
#[command(name = "hogsvm")]
#[command(about = "Leave-one-out evaluation of HOG + SVM letter classification")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the leave-one-out evaluation
    Loocv(LoocvArgs),
    /// Grid search C and kernel with stratified k-fold
    Tune(TuneArgs),
    /// Sample and extract features without training
    Features(FeaturesArgs),
}

/// Options shared by every subcommand
#[derive(Args)]
struct CommonArgs {
    /// EMNIST-style CSV file (label, then pixels)
    #[arg(long)]
    data: PathBuf,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Sampler seed
    #[arg(long)]
    seed: Option<u64>,

    /// Samples drawn per class
    #[arg(long)]
    samples_per_class: Option<usize>,

    /// Number of classes
    #[arg(long)]
    num_classes: Option<usize>,
}

#[derive(Args)]
struct LoocvArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Directory for the evaluation log and JSON report
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Regularization parameter C
    #[arg(short = 'C', long)]
    c: Option<f64>,

    /// Kernel type
    #[arg(short, long)]
    kernel: Option<CliKernel>,

    /// Gamma: scale, auto or a positive number
    #[arg(long)]
    gamma: Option<String>,

    /// Maximum solver iterations per binary problem
    #[arg(short, long)]
    max_iterations: Option<usize>,
}

#[derive(Args)]
struct TuneArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Number of stratified folds
    #[arg(long, default_value = "5")]
    folds: usize,

    /// Candidate C values, comma separated [default: 0.1,1,10]
    #[arg(long, value_delimiter = ',')]
    c_values: Vec<f64>,

    /// Candidate kernels, comma separated [default: linear,rbf]
    #[arg(long, value_delimiter = ',')]
    kernels: Vec<CliKernel>,

    /// Write all scores as JSON
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct FeaturesArgs {
    #[command(flatten)]
    common: CommonArgs,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum CliKernel {
    Linear,
    Rbf,
    #[value(alias = "polynomial")]
    Poly,
    Sigmoid,
}

impl From<CliKernel> for KernelKind {
    fn from(cli_kernel: CliKernel) -> Self {
        match cli_kernel {
            CliKernel::Linear => KernelKind::Linear,
            CliKernel::Rbf => KernelKind::Rbf,
            CliKernel::Poly => KernelKind::Poly,
            CliKernel::Sigmoid => KernelKind::Sigmoid,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else {
        "warn"
    };

    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    let result = match cli.command {
        Commands::Loocv(args) => loocv_command(args),
        Commands::Tune(args) => tune_command(args),
        Commands::Features(args) => features_command(args),
    };

    if let Err(e) = result {
        error!("Error: {e}");
        process::exit(1);
    }
}

/// Defaults, then the config file, then command line overrides
fn load_config(common: &CommonArgs) -> Result<PipelineConfig> {
    let mut config = match &common.config {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            PipelineConfig::from_file(path)?
        }
        None => PipelineConfig::default(),
    };

    if let Some(seed) = common.seed {
        config.seed = Some(seed);
    }
    if let Some(samples_per_class) = common.samples_per_class {
        config.samples_per_class = samples_per_class;
    }
    if let Some(num_classes) = common.num_classes {
        config.num_classes = num_classes;
    }
    Ok(config)
}

fn load_dataset(path: &Path, config: &PipelineConfig) -> Result<ImageDataset> {
    if !path.exists() {
        return Err(PipelineError::Data(format!(
            "File {} not found",
            path.display()
        )));
    }
    let dataset = ImageDataset::from_file(path, config.image_side)?;
    info!(
        "Loaded {} images of {}x{} pixels",
        dataset.len(),
        dataset.image_side(),
        dataset.image_side()
    );
    Ok(dataset)
}

fn loocv_command(args: LoocvArgs) -> Result<()> {
    let mut config = load_config(&args.common)?;
    if let Some(c) = args.c {
        config.classifier.c = c;
    }
    if let Some(kernel) = args.kernel {
        config.classifier.kernel = kernel.into();
    }
    if let Some(gamma) = &args.gamma {
        config.classifier.gamma = gamma.parse::<GammaPolicy>()?;
    }
    if let Some(max_iterations) = args.max_iterations {
        config.classifier.max_iterations = max_iterations;
    }

    fs::create_dir_all(&args.output_dir)?;
    let mut log = EvaluationLog::create(args.output_dir.join(LOG_FILE_NAME))?;
    log.header("EMNIST letter classification started")?;

    match run_loocv(&args, config, &mut log) {
        Ok(()) => log.record("--- Run finished ---"),
        Err(e) => {
            log.record(&format!("ERROR: {e}"))?;
            Err(e)
        }
    }
}

fn run_loocv(args: &LoocvArgs, config: PipelineConfig, log: &mut EvaluationLog) -> Result<()> {
    let pipeline = Pipeline::new(config)?;
    let dataset = load_dataset(&args.common.data, pipeline.config())?;
    log.record(&format!(
        "Loaded {} images from {}",
        dataset.len(),
        args.common.data.display()
    ))?;

    let classifier = &pipeline.config().classifier;
    log.record(&format!(
        "[LOOCV] Starting leave-one-out evaluation (kernel={}, C={})",
        classifier.kernel, classifier.c
    ))?;
    log.record(&format!(
        "Up to {} samples x {} classes; one model is trained per sample",
        pipeline.config().samples_per_class,
        pipeline.config().num_classes
    ))?;

    let observer = LogProgress::new(pipeline.config().progress_interval);
    let report = pipeline.run(&dataset, &observer)?;

    log.record("--- LOOCV results ---")?;
    for line in report.summary_lines() {
        log.record(&line)?;
    }
    log.record("Confusion matrix (rows = true, columns = predicted):")?;
    let table = report.confusion.render_table();
    for line in table.lines() {
        log.record(line)?;
    }
    for line in report.confusion.render_per_class().lines() {
        log.record(line)?;
    }

    let report_path = args
        .output_dir
        .join(EvaluationReport::file_name(classifier.kernel.name()));
    report.save_to_file(&report_path)?;
    log.record(&format!("Report saved to {}", report_path.display()))?;

    println!("LOOCV accuracy: {:.2}%", report.accuracy * 100.0);
    println!();
    print!("{table}");
    println!();
    println!("Log: {}", log.path().display());
    println!("Report: {}", report_path.display());
    Ok(())
}

fn tune_command(args: TuneArgs) -> Result<()> {
    let config = load_config(&args.common)?;
    let defaults = ParameterGrid::default();
    let grid = ParameterGrid::new(
        if args.c_values.is_empty() {
            defaults.c_values
        } else {
            args.c_values.clone()
        },
        if args.kernels.is_empty() {
            defaults.kernels
        } else {
            args.kernels.iter().map(|&k| k.into()).collect()
        },
    );

    let pipeline = Pipeline::new(config)?;
    let dataset = load_dataset(&args.common.data, pipeline.config())?;
    let result = pipeline.tune(&dataset, grid, args.folds)?;

    println!("Grid search ({} folds):", args.folds);
    println!("{:>10} {:>10} {:>10} {:>10}", "C", "kernel", "accuracy", "time (s)");
    for score in &result.scores {
        println!(
            "{:>10} {:>10} {:>9.2}% {:>10.2}",
            score.config.c,
            score.config.kernel,
            score.accuracy * 100.0,
            score.elapsed_secs
        );
    }
    let best = result.best();
    println!();
    println!(
        "Best parameters: C={} kernel={} (accuracy {:.2}%)",
        best.config.c,
        best.config.kernel,
        best.accuracy * 100.0
    );

    if let Some(path) = &args.output {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, &result)?;
        println!("Scores saved to {}", path.display());
    }
    Ok(())
}

fn features_command(args: FeaturesArgs) -> Result<()> {
    let config = load_config(&args.common)?;
    let pipeline = Pipeline::new(config)?;
    let dataset = load_dataset(&args.common.data, pipeline.config())?;
    let prepared = pipeline.prepare(&dataset)?;

    println!("Subset size: {}", prepared.subset.len());
    println!("Feature dimension: {}", prepared.features.dim());
    let counts = prepared.subset.class_counts(pipeline.config().num_classes);
    let per_class: Vec<String> = counts
        .iter()
        .enumerate()
        .map(|(class, count)| format!("{}={}", class_name(class), count))
        .collect();
    println!("Per class: {}", per_class.join(" "));
    Ok(())
}
