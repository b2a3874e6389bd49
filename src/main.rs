use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use faceprep::dataset::{BatchPreprocessor, scan_directory};
use faceprep::predict::evaluate_sample;
use faceprep::preprocessing::ResizeFilter;
use faceprep::stats::{batch_stats, value_range};
use faceprep::{
    ContrastMode, Label, LinearClassifier, Manifest, PreprocessConfig, Preprocessor, TargetSize,
    predict_single_image, stratified_split,
};

#[derive(Parser)]
#[command(name = "faceprep")]
#[command(about = "Preprocess real/fake face datasets and run predictions")]
struct Cli {
    /// JSON preprocessing config; flags override its fields
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Preprocess a manifest into tensors and split it
    Process(ProcessArgs),
    /// Classify a single image
    Predict(PredictArgs),
    /// Classify a random sample of a manifest and report accuracy
    Evaluate(EvaluateArgs),
    /// Count directories and files under a dataset root
    Scan {
        #[arg(value_name = "DIR")]
        root: PathBuf,
    },
}

#[derive(Args)]
struct ManifestArgs {
    /// CSV manifest with `label` and `path`/`full_path` columns
    #[arg(long, value_name = "CSV", conflicts_with = "class_dirs")]
    manifest: Option<PathBuf>,

    /// Directory joined onto relative manifest paths
    #[arg(long, value_name = "DIR")]
    base_dir: Option<PathBuf>,

    /// Directory holding `real/` and `fake/` subdirectories
    #[arg(long, value_name = "DIR")]
    class_dirs: Option<PathBuf>,
}

impl ManifestArgs {
    fn load(&self) -> anyhow::Result<Manifest> {
        match (&self.manifest, &self.class_dirs) {
            (Some(csv), _) => Ok(Manifest::from_csv(csv, self.base_dir.as_deref())?),
            (None, Some(root)) => Ok(Manifest::from_class_dirs(root)?),
            (None, None) => anyhow::bail!("either --manifest or --class-dirs is required"),
        }
    }
}

#[derive(Args)]
struct PreprocessArgs {
    /// Target size as HxW or a single side
    #[arg(long, value_name = "SIZE")]
    size: Option<TargetSize>,

    /// Disable contrast stretching (divide by 255 only)
    #[arg(long, conflicts_with = "percentile")]
    no_stretch: bool,

    /// Use 2nd/98th percentile clip-stretch instead of max-stretch
    #[arg(long)]
    percentile: bool,

    /// Resize filter: nearest, triangle, catmull-rom, gaussian, lanczos3
    #[arg(long, value_name = "FILTER")]
    filter: Option<ResizeFilter>,
}

impl PreprocessArgs {
    fn apply(&self, config: &mut PreprocessConfig) {
        if let Some(size) = self.size {
            config.target_size = size;
        }
        if let Some(filter) = self.filter {
            config.filter = filter;
        }
        if self.no_stretch {
            config.contrast = ContrastMode::None;
        } else if self.percentile {
            config.contrast = ContrastMode::percentile();
        }
    }
}

#[derive(Args)]
struct ProcessArgs {
    #[command(flatten)]
    source: ManifestArgs,

    #[command(flatten)]
    preprocess: PreprocessArgs,

    /// Only process a random sample of this many rows
    #[arg(long, value_name = "N")]
    sample: Option<usize>,

    /// Rows decoded per chunk
    #[arg(long, value_name = "N")]
    batch_size: Option<usize>,

    /// Fraction of rows held out for validation
    #[arg(long, value_name = "F")]
    validation: Option<f64>,

    #[arg(long)]
    seed: Option<u64>,

    /// Decode rows in parallel
    #[arg(long)]
    parallel: bool,

    /// Print a verification table for the first N images
    #[arg(long, value_name = "N", default_value_t = 0)]
    stats: usize,
}

#[derive(Args)]
struct PredictArgs {
    /// Linear model weights (JSON)
    #[arg(long, value_name = "JSON")]
    model: PathBuf,

    #[arg(value_name = "IMAGE")]
    image: PathBuf,

    /// Known label, for comparison
    #[arg(long, value_name = "LABEL")]
    true_label: Option<Label>,

    #[command(flatten)]
    preprocess: PreprocessArgs,
}

#[derive(Args)]
struct EvaluateArgs {
    #[arg(long, value_name = "JSON")]
    model: PathBuf,

    #[command(flatten)]
    source: ManifestArgs,

    #[command(flatten)]
    preprocess: PreprocessArgs,

    #[arg(long, value_name = "N", default_value_t = 10)]
    samples: usize,

    #[arg(long)]
    seed: Option<u64>,
}

fn load_config(path: Option<&Path>) -> anyhow::Result<PreprocessConfig> {
    match path {
        Some(path) => Ok(PreprocessConfig::load(path)?),
        None => Ok(PreprocessConfig::default()),
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    let mut config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Process(args) => run_process(args, &mut config),
        Command::Predict(args) => run_predict(args, &mut config),
        Command::Evaluate(args) => run_evaluate(args, &mut config),
        Command::Scan { root } => run_scan(&root),
    }
}

fn run_process(args: ProcessArgs, config: &mut PreprocessConfig) -> anyhow::Result<()> {
    args.preprocess.apply(config);
    if let Some(batch_size) = args.batch_size {
        config.batch_size = batch_size;
    }
    if let Some(fraction) = args.validation {
        config.validation_fraction = fraction;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    config.parallel |= args.parallel;

    let preprocessor = Preprocessor::from_config(config)?;

    let mut manifest = args.source.load()?;
    println!("Manifest rows: {}", manifest.len());
    if let Some(n) = args.sample {
        manifest = manifest.sample(n, config.seed);
        println!("Sampled rows: {}", manifest.len());
    }
    let counts = manifest.class_counts();
    println!("Real: {}, Fake: {}", counts.real, counts.fake);

    let batch = BatchPreprocessor::new(preprocessor, config.batch_size)
        .with_parallel(config.parallel)
        .run(manifest.rows())?;

    println!("\n=== Processed dataset ===");
    println!("Images shape: {:?}", batch.images.shape());
    println!("Labels shape: {:?}", batch.labels.shape());
    match value_range(batch.images.view()) {
        Some((min, max)) => println!("Pixel value range: {:.4} - {:.4}", min, max),
        None => println!("Pixel value range: n/a (no images)"),
    }

    if !batch.failures.is_empty() {
        println!("\nSkipped {} unreadable images:", batch.failures.len());
        for failure in &batch.failures {
            println!("  [{}] {} - {}", failure.index, failure.path.display(), failure.reason);
        }
    }

    if args.stats > 0 {
        print_stats_table(&batch, args.stats);
    }

    if batch.is_empty() {
        println!("\nNo images processed; skipping split.");
        return Ok(());
    }

    let split = stratified_split(&batch.images, &batch.labels, config.validation_fraction, config.seed)?;
    println!("\n=== Stratified split ===");
    println!("Train size: {:?}", split.train_images.shape());
    println!("Validation size: {:?}", split.validation_images.shape());

    Ok(())
}

fn print_stats_table(batch: &faceprep::ProcessedBatch, n: usize) {
    let stats = batch_stats(batch.images.view(), n);
    println!("\nVerification table (all values should be 0 <= x <= 1)");
    println!("{}", "-".repeat(72));
    println!(
        "{:<6} {:<6} {:<8} {:<8} {:<8} {:<12} {:<10}",
        "Sample", "Label", "Min", "Max", "Mean", "White Pixels", "Size"
    );
    println!("{}", "-".repeat(72));
    for (i, s) in stats.iter().enumerate() {
        let label = Label::from_u8(batch.labels[i])
            .map(|l| l.to_string())
            .unwrap_or_else(|| "?".to_string());
        println!(
            "{:<6} {:<6} {:<8.4} {:<8.4} {:<8.4} {:<12} {:<10}",
            i + 1,
            label,
            s.min,
            s.max,
            s.mean,
            s.white_pixels,
            format!("{}x{}", s.height, s.width)
        );
    }
}

fn run_predict(args: PredictArgs, config: &mut PreprocessConfig) -> anyhow::Result<()> {
    args.preprocess.apply(config);
    let model = LinearClassifier::load(&args.model)?;
    let preprocessor = Preprocessor::from_config(config)?.with_target_size(model.input_size);

    let prediction = predict_single_image(&model, &args.image, args.true_label, &preprocessor)?;

    println!("Prediction: {}", prediction.verdict.label);
    println!("Confidence: {:.2}%", prediction.verdict.confidence * 100.0);
    if let Some(true_label) = prediction.true_label {
        println!("True label: {}", true_label);
    }
    Ok(())
}

fn run_evaluate(args: EvaluateArgs, config: &mut PreprocessConfig) -> anyhow::Result<()> {
    args.preprocess.apply(config);
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    let model = LinearClassifier::load(&args.model)?;
    let preprocessor = Preprocessor::from_config(config)?.with_target_size(model.input_size);
    let manifest = args.source.load()?;

    let evaluation = evaluate_sample(&model, &manifest, args.samples, config.seed, &preprocessor)?;

    println!("\n=== Sample predictions ===");
    for record in &evaluation.records {
        let mark = if record.is_correct() { "ok" } else { "MISS" };
        println!(
            "  {:<4} pred: {:<4} true: {:<4} ({:.1}%)  {}",
            mark,
            record.verdict.label,
            record.true_label,
            record.verdict.confidence * 100.0,
            record.path.display()
        );
    }
    if evaluation.skipped > 0 {
        println!("Skipped {} unreadable images", evaluation.skipped);
    }
    match evaluation.accuracy() {
        Some(acc) => println!("Accuracy: {:.1}%", acc * 100.0),
        None => println!("Accuracy: n/a"),
    }
    Ok(())
}

fn run_scan(root: &Path) -> anyhow::Result<()> {
    for summary in scan_directory(root)? {
        println!(
            "There are {} directories and {} files in '{}'.",
            summary.directories,
            summary.files,
            summary.path.display()
        );
    }
    Ok(())
}
