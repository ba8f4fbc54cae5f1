use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};

use candid_sorter_core::classification::classifier_config::ClassifierConfig;
use candid_sorter_core::detection::domain::face_extractor::FaceExtractor;
use candid_sorter_core::detection::infrastructure::model_resolver::ModelResolver;
use candid_sorter_core::detection::infrastructure::onnx_face_extractor::{
    OnnxFaceExtractor, DEFAULT_CONFIDENCE,
};
use candid_sorter_core::gallery::build_gallery_use_case::BuildGalleryUseCase;
use candid_sorter_core::gallery::domain::gallery::Gallery;
use candid_sorter_core::gallery::domain::gallery_store::GalleryStore;
use candid_sorter_core::gallery::infrastructure::json_gallery_store::JsonGalleryStore;
use candid_sorter_core::imaging::infrastructure::box_annotator::{BoxAnnotator, DEFAULT_THICKNESS};
use candid_sorter_core::imaging::infrastructure::image_file_reader::ImageFileReader;
use candid_sorter_core::imaging::infrastructure::image_file_writer::ImageFileWriter;
use candid_sorter_core::matching::infrastructure::linear_scan_matcher::LinearScanMatcher;
use candid_sorter_core::pipeline::batch_executor::BatchExecutor;
use candid_sorter_core::pipeline::classification_report::ClassificationReport;
use candid_sorter_core::pipeline::classify_images_use_case::ClassifyImagesUseCase;
use candid_sorter_core::pipeline::infrastructure::fs_output_placer::FsOutputPlacer;
use candid_sorter_core::pipeline::infrastructure::sequential_batch_executor::SequentialBatchExecutor;
use candid_sorter_core::pipeline::infrastructure::threaded_batch_executor::ThreadedBatchExecutor;
use candid_sorter_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use candid_sorter_core::shared::constants::{
    DEFAULT_GALLERY_FILENAME, EMBEDDING_MODEL_NAME, EMBEDDING_MODEL_URL, YOLO_MODEL_NAME,
    YOLO_MODEL_URL,
};

/// Sorts candid photos into category folders by the people in them.
#[derive(Parser)]
#[command(name = "candid-sorter", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Face detection confidence threshold (0.0-1.0).
    #[arg(long, global = true, default_value_t = DEFAULT_CONFIDENCE)]
    confidence: f64,

    /// Directory holding bundled ONNX models, checked before the download cache.
    #[arg(long, global = true)]
    models_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Encode every face in a portrait directory into a gallery file.
    BuildGallery {
        /// Directory of labeled portraits (searched recursively).
        portraits: PathBuf,

        /// Gallery file to write.
        #[arg(long, default_value = DEFAULT_GALLERY_FILENAME)]
        gallery: PathBuf,
    },
    /// Classify candid photos against an existing gallery file.
    Classify {
        /// Directory of candid photos.
        candids: PathBuf,

        /// Root directory for the category folders.
        output: PathBuf,

        #[command(flatten)]
        opts: ClassifyOpts,
    },
    /// Build the gallery, save it, then classify.
    Run {
        /// Directory of labeled portraits (searched recursively).
        portraits: PathBuf,

        /// Directory of candid photos.
        candids: PathBuf,

        /// Root directory for the category folders.
        output: PathBuf,

        #[command(flatten)]
        opts: ClassifyOpts,
    },
}

#[derive(Args)]
struct ClassifyOpts {
    /// Gallery file (read by `classify`, written by `run`).
    #[arg(long, default_value = DEFAULT_GALLERY_FILENAME)]
    gallery: PathBuf,

    /// JSON file with category ranges and voting parameters.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Worker threads (defaults to available cores; 1 runs sequentially).
    #[arg(long)]
    workers: Option<usize>,

    /// Reject matches farther than this cosine distance (0.0-2.0).
    #[arg(long)]
    max_distance: Option<f64>,

    /// Save copies of the candids with detected faces outlined here.
    #[arg(long)]
    annotate: Option<PathBuf>,

    /// Write the classification report as JSON.
    #[arg(long)]
    report: Option<PathBuf>,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    match &cli.command {
        Command::BuildGallery { portraits, gallery } => {
            let extractor = build_extractor(&cli)?;
            let built = build_gallery(portraits, extractor)?;
            save_gallery(gallery, &built)?;
        }
        Command::Classify {
            candids,
            output,
            opts,
        } => {
            let config = load_config(opts)?;
            let gallery = JsonGalleryStore::new(&opts.gallery).load()?;
            log::info!(
                "Loaded gallery {} ({} references, {} faces)",
                opts.gallery.display(),
                gallery.len(),
                gallery.embedding_count()
            );
            let extractor = build_extractor(&cli)?;
            classify(candids, output, opts, &config, gallery, extractor)?;
        }
        Command::Run {
            portraits,
            candids,
            output,
            opts,
        } => run_all(portraits, candids, output, opts, || build_extractor(&cli))?,
    }

    Ok(())
}

/// Build, save, classify. The config is checked before the models load.
fn run_all(
    portraits: &Path,
    candids: &Path,
    output: &Path,
    opts: &ClassifyOpts,
    make_extractor: impl FnOnce() -> Result<Arc<dyn FaceExtractor>, Box<dyn std::error::Error>>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(opts)?;
    let extractor = make_extractor()?;
    let built = build_gallery(portraits, extractor.clone())?;
    save_gallery(&opts.gallery, &built)?;
    classify(candids, output, opts, &config, built, extractor)
}

fn build_gallery(
    portraits: &Path,
    extractor: Arc<dyn FaceExtractor>,
) -> Result<Gallery, Box<dyn std::error::Error>> {
    let progress: Box<dyn Fn(usize, usize) + Send + Sync> = Box::new(|current, total| {
        eprint!("\rEncoding portrait {current}/{total}");
    });
    let use_case =
        BuildGalleryUseCase::new(Arc::new(ImageFileReader::new()), extractor, Some(progress));
    let report = use_case.execute(portraits)?;
    eprintln!();

    if !report.faceless.is_empty() {
        log::warn!(
            "{} portraits had no detectable face: {}",
            report.faceless.len(),
            report.faceless.join(", ")
        );
    }
    if report.gallery.is_empty() {
        log::warn!("No faces found under {}", portraits.display());
    }
    Ok(report.gallery)
}

fn save_gallery(path: &Path, gallery: &Gallery) -> Result<(), Box<dyn std::error::Error>> {
    JsonGalleryStore::new(path).save(gallery)?;
    log::info!("Gallery written to {}", path.display());
    Ok(())
}

fn classify(
    candids: &Path,
    output: &Path,
    opts: &ClassifyOpts,
    config: &ClassifierConfig,
    gallery: Gallery,
    extractor: Arc<dyn FaceExtractor>,
) -> Result<(), Box<dyn std::error::Error>> {
    if gallery.is_empty() {
        log::warn!("Gallery is empty; every candid will be placed in 'unknown'");
    }

    let matcher =
        LinearScanMatcher::new(Arc::new(gallery)).with_max_distance(config.max_distance);
    let progress: Box<dyn Fn(usize, usize) -> bool + Send> = Box::new(|current, total| {
        eprint!("\rClassifying image {current}/{total}");
        true
    });

    let mut use_case = ClassifyImagesUseCase::new(
        Arc::new(ImageFileReader::new()),
        extractor,
        Arc::new(matcher),
        config.aggregator(),
        Box::new(FsOutputPlacer::new(output)),
        build_executor(opts.workers),
    )
    .with_logger(Box::new(StdoutPipelineLogger::default()))
    .with_progress(progress);

    if let Some(dir) = &opts.annotate {
        use_case = use_case.with_annotator(BoxAnnotator::new(
            Box::new(ImageFileWriter::new()),
            dir.clone(),
            DEFAULT_THICKNESS,
        ));
    }

    let report = use_case.execute(candids)?;
    eprintln!();
    log_outcome(&report, output);

    if let Some(path) = &opts.report {
        write_report(path, &report)?;
    }
    Ok(())
}

fn load_config(opts: &ClassifyOpts) -> Result<ClassifierConfig, Box<dyn std::error::Error>> {
    let mut config = match &opts.config {
        Some(path) => ClassifierConfig::load(path)?,
        None => ClassifierConfig::default(),
    };
    if opts.max_distance.is_some() {
        config.max_distance = opts.max_distance;
        config.validate()?;
    }
    Ok(config)
}

fn build_executor(workers: Option<usize>) -> Box<dyn BatchExecutor> {
    match workers {
        Some(1) => Box::new(SequentialBatchExecutor),
        Some(n) => Box::new(ThreadedBatchExecutor::new(n)),
        None => Box::new(ThreadedBatchExecutor::default()),
    }
}

fn log_outcome(report: &ClassificationReport, output: &Path) {
    for (category, count) in report.category_counts() {
        log::info!("{category}: {count} images");
    }
    let unplaced: Vec<&str> = report.unplaced().collect();
    if !unplaced.is_empty() {
        log::info!(
            "{} images matched no category: {}",
            unplaced.len(),
            unplaced.join(", ")
        );
    }
    if report.cancelled {
        log::warn!("Run was cancelled; output is incomplete");
    }
    log::info!("Output written to {}", output.display());
}

fn write_report(
    path: &Path,
    report: &ClassificationReport,
) -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_string_pretty(report)?;
    fs::write(path, json)?;
    log::info!("Report written to {}", path.display());
    Ok(())
}

fn build_extractor(cli: &Cli) -> Result<Arc<dyn FaceExtractor>, Box<dyn std::error::Error>> {
    let resolver = ModelResolver::with_default_cache(cli.models_dir.clone())?;

    log::info!("Resolving model: {YOLO_MODEL_NAME}");
    let detector = resolver.resolve(
        YOLO_MODEL_NAME,
        YOLO_MODEL_URL,
        Some(Box::new(download_progress)),
    )?;
    log::info!("Resolving model: {EMBEDDING_MODEL_NAME}");
    let embedder = resolver.resolve(
        EMBEDDING_MODEL_NAME,
        EMBEDDING_MODEL_URL,
        Some(Box::new(download_progress)),
    )?;
    eprintln!();

    Ok(Arc::new(OnnxFaceExtractor::new(
        &detector,
        &embedder,
        cli.confidence,
    )?))
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !(0.0..=1.0).contains(&cli.confidence) {
        return Err(format!(
            "Confidence must be between 0.0 and 1.0, got {}",
            cli.confidence
        )
        .into());
    }
    if let Some(dir) = &cli.models_dir {
        require_dir(dir, "Models directory")?;
    }

    match &cli.command {
        Command::BuildGallery { portraits, .. } => require_dir(portraits, "Portrait directory"),
        Command::Classify { candids, opts, .. } => {
            require_dir(candids, "Candid directory")?;
            if !opts.gallery.is_file() {
                return Err(format!(
                    "Gallery file not found: {} (run build-gallery first)",
                    opts.gallery.display()
                )
                .into());
            }
            validate_classify_opts(opts)
        }
        Command::Run {
            portraits,
            candids,
            opts,
            ..
        } => {
            require_dir(portraits, "Portrait directory")?;
            require_dir(candids, "Candid directory")?;
            validate_classify_opts(opts)
        }
    }
}

fn validate_classify_opts(opts: &ClassifyOpts) -> Result<(), Box<dyn std::error::Error>> {
    if opts.workers == Some(0) {
        return Err("Workers must be at least 1".into());
    }
    if let Some(d) = opts.max_distance {
        if !(0.0..=2.0).contains(&d) {
            return Err(format!("Max distance must be between 0.0 and 2.0, got {d}").into());
        }
    }
    if let Some(path) = &opts.config {
        if !path.is_file() {
            return Err(format!("Config file not found: {}", path.display()).into());
        }
    }
    Ok(())
}

fn require_dir(path: &Path, what: &str) -> Result<(), Box<dyn std::error::Error>> {
    if !path.is_dir() {
        return Err(format!("{what} not found: {}", path.display()).into());
    }
    Ok(())
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading model... {pct}%");
    } else {
        eprint!("\rDownloading model... {downloaded} bytes");
    }
}
