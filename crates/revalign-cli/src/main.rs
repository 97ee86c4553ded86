//! revalign CLI — compare two revisions of an engineering drawing.

use clap::{Args, Parser, Subcommand};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use revalign::{
    similarity_from_anchors, AnchorPairs, Comparator, CompareConfig, CompareRequest,
    DimensionAnnotation, PageAlignment, PageInput,
};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "revalign")]
#[command(about = "Align two drawing revisions and report added, removed and modified dimensions")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare the revisions listed in a manifest.
    Compare(CliCompareArgs),

    /// Print the similarity transform implied by two anchor pairs.
    Anchors(CliAnchorArgs),
}

#[derive(Debug, Clone, Args)]
struct CliCompareArgs {
    /// Path to the comparison manifest (JSON).
    #[arg(long)]
    manifest: PathBuf,

    /// Path to write the comparison result (JSON).
    #[arg(long)]
    out: PathBuf,

    /// Optional config file (JSON); flags below override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Fixed RANSAC seed for reproducible output.
    #[arg(long)]
    seed: Option<u64>,

    /// RANSAC iterations per page.
    #[arg(long)]
    ransac_iters: Option<usize>,

    /// RANSAC inlier threshold in pixels.
    #[arg(long)]
    ransac_thresh_px: Option<f64>,

    /// Dimension match radius in pixels (before transform scaling).
    #[arg(long)]
    match_tolerance_px: Option<f64>,

    /// Worker threads for page-level parallelism (0 = one per core).
    #[arg(long)]
    workers: Option<usize>,
}

impl CliCompareArgs {
    fn build_config(&self) -> CliResult<CompareConfig> {
        let mut config = match &self.config {
            Some(path) => CompareConfig::from_json_file(path)?,
            None => CompareConfig::default(),
        };
        if let Some(seed) = self.seed {
            config.ransac.seed = Some(seed);
        }
        if let Some(iters) = self.ransac_iters {
            config.ransac.max_iters = iters;
        }
        if let Some(thresh) = self.ransac_thresh_px {
            config.ransac.inlier_threshold_px = thresh;
        }
        if let Some(tol) = self.match_tolerance_px {
            config.matching.tolerance_px = tol;
        }
        if let Some(workers) = self.workers {
            config.orchestrator.max_workers = workers;
        }
        config.validate()?;
        Ok(config)
    }
}

#[derive(Debug, Clone, Args)]
struct CliAnchorArgs {
    /// First anchor on revision A, as `x,y`.
    #[arg(long, value_parser = parse_point)]
    p1a: [f64; 2],
    /// Second anchor on revision A.
    #[arg(long, value_parser = parse_point)]
    p2a: [f64; 2],
    /// First anchor on revision B.
    #[arg(long, value_parser = parse_point)]
    p1b: [f64; 2],
    /// Second anchor on revision B.
    #[arg(long, value_parser = parse_point)]
    p2b: [f64; 2],
}

fn parse_point(s: &str) -> Result<[f64; 2], String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected `x,y`, got `{s}`"))?;
    let x: f64 = x.trim().parse().map_err(|e| format!("bad x in `{s}`: {e}"))?;
    let y: f64 = y.trim().parse().map_err(|e| format!("bad y in `{s}`: {e}"))?;
    Ok([x, y])
}

// ── manifest ──────────────────────────────────────────────────────────

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct Manifest {
    revision_a: Vec<ManifestPage>,
    revision_b: Vec<ManifestPage>,
    #[serde(default)]
    page_modes: BTreeMap<u32, PageAlignment>,
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct ManifestPage {
    page_number: u32,
    /// Relative paths resolve against the manifest's directory.
    image: PathBuf,
    #[serde(default)]
    annotations: Vec<DimensionAnnotation>,
}

fn load_manifest(path: &Path) -> CliResult<Manifest> {
    let data = std::fs::read_to_string(path).map_err(|e| -> CliError {
        format!("Failed to read manifest {}: {}", path.display(), e).into()
    })?;
    Ok(serde_json::from_str(&data)?)
}

fn load_pages(pages: Vec<ManifestPage>, base_dir: &Path) -> CliResult<Vec<PageInput>> {
    pages
        .into_iter()
        .map(|p| {
            let image_path = base_dir.join(&p.image);
            tracing::debug!("Loading page {}: {}", p.page_number, image_path.display());
            let img = image::open(&image_path).map_err(|e| -> CliError {
                format!("Failed to open image {}: {}", image_path.display(), e).into()
            })?;
            Ok(PageInput::new(p.page_number, img.to_luma8(), p.annotations))
        })
        .collect()
}

fn build_request(manifest: Manifest, base_dir: &Path) -> CliResult<CompareRequest> {
    Ok(CompareRequest {
        revision_a: load_pages(manifest.revision_a, base_dir)?,
        revision_b: load_pages(manifest.revision_b, base_dir)?,
        page_modes: manifest.page_modes,
    })
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Compare(args) => run_compare(&args),
        Commands::Anchors(args) => run_anchors(&args),
    }
}

// ── compare ───────────────────────────────────────────────────────────

fn run_compare(args: &CliCompareArgs) -> CliResult<()> {
    let config = args.build_config()?;
    tracing::info!("Loading manifest: {}", args.manifest.display());
    let manifest = load_manifest(&args.manifest)?;
    let base_dir = args.manifest.parent().unwrap_or_else(|| Path::new("."));
    let request = build_request(manifest, base_dir)?;

    let comparator = Comparator::with_config(config);
    let result = comparator.compare_document(&request)?;

    for page in result.pages.iter().filter(|p| !p.is_complete()) {
        match &page.error {
            Some(err) => {
                tracing::warn!("Page {} {:?}: {}", page.page_number, page.status, err.message)
            }
            None => tracing::warn!("Page {} {:?}", page.page_number, page.status),
        }
    }
    tracing::info!(
        "{} pages, {} dimensions: {} added, {} modified, {} removed, {} unchanged",
        result.total_pages,
        result.summary.total(),
        result.summary.added,
        result.summary.modified,
        result.summary.removed,
        result.summary.unchanged
    );

    let json = serde_json::to_string_pretty(&result)?;
    std::fs::write(&args.out, &json)?;
    tracing::info!("Results written to {}", args.out.display());
    Ok(())
}

// ── anchors ───────────────────────────────────────────────────────────

fn run_anchors(args: &CliAnchorArgs) -> CliResult<()> {
    let anchors = AnchorPairs::new(args.p1a, args.p2a, args.p1b, args.p2b);
    let t = similarity_from_anchors(&anchors, &CompareConfig::default().anchors)?;

    println!("Similarity (revision B -> revision A):");
    for row in t.to_rows() {
        println!("  [{:>12.6} {:>12.6} {:>12.6}]", row[0], row[1], row[2]);
    }
    let m = &t.matrix;
    println!("  scale:    {:.6}", t.scale_factor());
    println!("  rotation: {:.4} deg", m[(1, 0)].atan2(m[(0, 0)]).to_degrees());
    println!("  translation: ({:.3}, {:.3})", m[(0, 2)], m[(1, 2)]);
    Ok(())
}
