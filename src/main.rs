use anyhow::{bail, Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use oa_harvester::ai::GeminiClient;
use oa_harvester::config::{load_config, Config};
use oa_harvester::pipeline::{Downloader, Pipeline};
use oa_harvester::sources::{CrossrefSource, Source, UnpaywallSource};
use oa_harvester::state::{Phase, RunState};

/// Collect Open-Access PDFs for a research topic into one archive
#[derive(Parser, Debug)]
#[command(name = "oa-harvester")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Turn a research description into an archive of Open-Access PDFs", long_about = None)]
struct Cli {
    /// Free-text description of the research topic
    description: String,

    /// Contact email (required by Unpaywall, recommended for Crossref)
    #[arg(long, short)]
    email: Option<String>,

    /// Output directory for downloads and the archive
    #[arg(long, short)]
    outdir: Option<PathBuf>,

    /// Maximum concurrent downloads
    #[arg(long)]
    download_concurrency: Option<usize>,

    /// Maximum concurrent keyword searches
    #[arg(long)]
    search_concurrency: Option<usize>,

    /// Results requested per keyword from each source
    #[arg(long)]
    per_keyword: Option<usize>,

    /// Maximum unique documents to download per run
    #[arg(long)]
    max: Option<usize>,

    /// Only accept documents published in or after this year
    #[arg(long)]
    from_year: Option<u16>,

    /// Only accept documents published in or before this year
    #[arg(long)]
    until_year: Option<u16>,

    /// Configuration file path
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable verbose logging (-v for debug, -vv for trace)
    #[arg(long, short, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity
    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let env_filter = if cli.quiet { "error" } else { log_level };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("oa_harvester={}", env_filter)),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = if let Some(path) = &cli.config {
        load_config(path).with_context(|| format!("loading config {}", path.display()))?
    } else {
        Config::default()
    };

    // CLI flags win over file and environment
    if let Some(email) = cli.email {
        config.api_keys.contact_email = Some(email);
    }
    if let Some(outdir) = cli.outdir {
        config.downloads.dir = outdir;
    }
    if let Some(n) = cli.download_concurrency {
        config.limits.max_concurrent_downloads = n;
    }
    if let Some(n) = cli.search_concurrency {
        config.limits.max_concurrent_searches = n;
    }
    if let Some(n) = cli.per_keyword {
        config.limits.results_per_keyword = n;
    }
    if let Some(n) = cli.max {
        config.limits.max_documents = n;
    }
    if let Some(year) = cli.from_year {
        config.search.from_year = Some(year);
    }
    if let Some(year) = cli.until_year {
        config.search.until_year = Some(year);
    }

    let Some(api_key) = config.api_keys.gemini.clone() else {
        bail!("no Gemini API key: set GEMINI_API_KEY or api_keys.gemini in the config file");
    };
    let Some(email) = config.api_keys.contact_email.clone() else {
        bail!("no contact email: pass --email or set UNPAYWALL_EMAIL");
    };
    if !email.contains('@') {
        bail!("contact email {:?} does not look like an email address", email);
    }

    let run_id = new_run_id();
    let state = Arc::new(RunState::new(&run_id));

    let model = Arc::new(GeminiClient::new(&api_key));
    let sources: Vec<Arc<dyn Source>> = vec![
        Arc::new(
            CrossrefSource::new(&email, config.limits.results_per_keyword)
                .with_date_range(config.search.from_year, config.search.until_year),
        ),
        Arc::new(UnpaywallSource::new(&email)),
    ];
    let downloader = Downloader::new(
        config.downloads.dir.join(&run_id),
        config.limits.max_concurrent_downloads,
        config.downloads.max_file_size_mb,
    );
    let pipeline = Pipeline::new(
        model,
        sources,
        downloader,
        config.downloads.dir.clone(),
        config.limits.max_concurrent_searches,
    )
    .with_max_documents(config.limits.max_documents);

    // Abort cleanly at the next stage boundary on Ctrl-C
    {
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("abort requested, stopping at the next stage boundary");
                state.request_abort();
            }
        });
    }

    let progress = if cli.quiet {
        None
    } else {
        Some(tokio::spawn(render_progress(Arc::clone(&state))))
    };

    let outcome = pipeline.execute(&cli.description, &state).await;

    if let Some(handle) = progress {
        let _ = handle.await;
    }

    match outcome {
        Ok(report) => {
            println!(
                "{} sub-topics, {} keywords, {} unique documents",
                report.sub_topics, report.keywords, report.documents_found
            );
            println!(
                "{} downloaded, {} failed",
                report.downloads_completed, report.downloads_failed
            );
            println!("archive: {}", report.archive_path.display());
            Ok(())
        }
        Err(e) => Err(e).context("run failed"),
    }
}

fn new_run_id() -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock before epoch");
    format!("run-{}", now.as_secs())
}

/// Poll the run state and render it until the run reaches a terminal phase.
async fn render_progress(state: Arc<RunState>) {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner} {msg}").expect("static progress template"),
    );
    bar.enable_steady_tick(Duration::from_millis(120));

    loop {
        let snap = state.snapshot();

        match snap.phase {
            Phase::Done | Phase::Failed => {
                bar.finish_with_message(format!("{}", snap.phase));
                break;
            }
            Phase::Downloading => {
                bar.set_message(format!(
                    "downloading: {}/{} done, {} failed",
                    snap.downloads_completed, snap.documents_found, snap.downloads_failed
                ));
            }
            phase => {
                bar.set_message(format!(
                    "{}: {} sub-topics, {} keywords, {} documents",
                    phase, snap.sub_topics, snap.keywords, snap.documents_found
                ));
            }
        }

        tokio::time::sleep(Duration::from_millis(200)).await;
    }
}
