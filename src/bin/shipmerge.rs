//! CLI binary for shipmerge.
//!
//! A thin shim over the library crate that maps CLI flags to a
//! `MergeSession`, drives one preview or merge request, and writes the
//! resulting document to disk.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use shipmerge::{
    ClientConfig, MergeSession, Phase, RequestMode, SessionObserver, SlotName, MERGED_FILENAME,
    PREVIEW_FILENAME,
};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── Spinner observer ─────────────────────────────────────────────────────────

/// Mirrors the session's phase transitions onto the spinner message so the
/// user can see where a slow request is stuck.
struct SpinnerObserver {
    bar: ProgressBar,
}

impl SessionObserver for SpinnerObserver {
    fn on_phase_change(&self, mode: RequestMode, phase: Phase) {
        match phase {
            Phase::Submitting => self
                .bar
                .set_message(format!("{mode} request in flight…")),
            Phase::Succeeded => self.bar.set_message("writing artifact…".to_string()),
            _ => self.bar.set_message(format!("{phase}…")),
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Merge three documents into merged_shipmerge.pdf
  shipmerge invoice.pdf packing_slip.pdf shipping_label.pdf

  # Rotate the shipping label and trim scanned margins to 80%
  shipmerge --rotate --trim 80 invoice.pdf packing_slip.pdf shipping_label.pdf

  # Live preview without producing the final document
  shipmerge --preview invoice.pdf packing_slip.pdf shipping_label.pdf

  # Use a remote composer
  shipmerge --base-url https://composer.example.com invoice.pdf packing_slip.pdf shipping_label.pdf

  # Machine-readable summary
  shipmerge --json invoice.pdf packing_slip.pdf shipping_label.pdf

ENVIRONMENT VARIABLES:
  SHIPMERGE_BASE_URL   Base URL of the composition service (default: http://127.0.0.1:5000)
  SHIPMERGE_TIMEOUT    Whole-request timeout in seconds (default: 120)

The service receives all three documents plus the rotate/trim options in one
multipart request and answers with the combined PDF. Press Ctrl-C while a
request is outstanding to cancel it.
"#;

/// Merge an invoice, packing slip, and shipping label via the ShipMerge service.
#[derive(Parser, Debug)]
#[command(
    name = "shipmerge",
    version,
    about = "Merge an invoice, packing slip, and shipping label into one printable PDF",
    long_about = "Send an invoice, a packing slip, and a shipping label to the ShipMerge \
composition service and receive either a live preview or the final merged document. \
All three inputs must be PDFs; the rotate and trim options are applied server-side.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Invoice PDF.
    invoice: PathBuf,

    /// Packing slip PDF.
    packing_slip: PathBuf,

    /// Shipping label PDF.
    shipping_label: PathBuf,

    /// Request a live preview instead of the final merge.
    #[arg(long)]
    preview: bool,

    /// Write the resulting document here.
    ///
    /// Defaults to merged_shipmerge.pdf, or preview.pdf with --preview.
    /// A directory resolves to the default filename inside it.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Rotate the shipping label into landscape orientation.
    #[arg(long)]
    rotate: bool,

    /// Trim percentage applied by the composer.
    #[arg(long, default_value_t = 100,
          value_parser = clap::value_parser!(u8).range(10..=100))]
    trim: u8,

    /// Base URL of the composition service.
    #[arg(long, env = "SHIPMERGE_BASE_URL", default_value = shipmerge::DEFAULT_BASE_URL)]
    base_url: String,

    /// Whole-request timeout in seconds.
    #[arg(long, env = "SHIPMERGE_TIMEOUT", default_value_t = 120)]
    timeout: u64,

    /// Print a JSON summary instead of the human one.
    #[arg(long, env = "SHIPMERGE_JSON")]
    json: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "SHIPMERGE_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "SHIPMERGE_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "SHIPMERGE_QUIET")]
    quiet: bool,
}

#[derive(Serialize)]
struct Summary<'a> {
    mode: RequestMode,
    bytes: u64,
    output: &'a Path,
    duration_ms: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs while the spinner is active; the
    // spinner carries the same information.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let mode = if cli.preview {
        RequestMode::Preview
    } else {
        RequestMode::Finalize
    };

    // ── Spinner ──────────────────────────────────────────────────────────
    let spinner = if show_progress {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_prefix(match mode {
            RequestMode::Preview => "Previewing",
            RequestMode::Finalize => "Merging",
        });
        bar.set_message("loading documents…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Some(bar)
    } else {
        None
    };

    // ── Build session ────────────────────────────────────────────────────
    let mut builder = ClientConfig::builder()
        .base_url(&cli.base_url)
        .request_timeout_secs(cli.timeout);
    if let Some(bar) = &spinner {
        builder = builder.observer(Arc::new(SpinnerObserver { bar: bar.clone() })
            as Arc<dyn SessionObserver>);
    }
    let config = builder.build().context("Invalid configuration")?;
    let session = MergeSession::new(config)?;

    session
        .assign_path(SlotName::Invoice, &cli.invoice)
        .with_context(|| format!("Failed to load invoice from {:?}", cli.invoice))?;
    session
        .assign_path(SlotName::PackingSlip, &cli.packing_slip)
        .with_context(|| format!("Failed to load packing slip from {:?}", cli.packing_slip))?;
    session
        .assign_path(SlotName::ShippingLabel, &cli.shipping_label)
        .with_context(|| format!("Failed to load shipping label from {:?}", cli.shipping_label))?;

    session.set_rotate(cli.rotate);
    session.set_trim_percentage(cli.trim);

    // ── Submit, cancelling on Ctrl-C ─────────────────────────────────────
    let started = Instant::now();
    let submit = session.submit(mode);
    tokio::pin!(submit);
    let handle = tokio::select! {
        res = &mut submit => res,
        _ = tokio::signal::ctrl_c() => {
            session.cancel();
            // The submit future resolves to Cancelled almost immediately.
            submit.await
        }
    };
    if let Some(bar) = &spinner {
        bar.finish_and_clear();
    }
    let handle = handle?;

    // ── Persist and report ───────────────────────────────────────────────
    let output = cli.output.clone().unwrap_or_else(|| {
        PathBuf::from(match mode {
            RequestMode::Preview => PREVIEW_FILENAME,
            RequestMode::Finalize => MERGED_FILENAME,
        })
    });
    let saved = session.save_artifact(mode, &output).await?;
    let duration_ms = started.elapsed().as_millis() as u64;

    if cli.json {
        let summary = Summary {
            mode,
            bytes: handle.byte_len,
            output: &saved,
            duration_ms,
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("Failed to serialise summary")?
        );
    } else if !cli.quiet {
        eprintln!(
            "{}  {} {}  {}  →  {}",
            green("✔"),
            bold(&handle.byte_len.to_string()),
            dim("bytes"),
            dim(&format!("{:.1}s", duration_ms as f64 / 1000.0)),
            bold(&saved.display().to_string()),
        );
    }

    Ok(())
}
