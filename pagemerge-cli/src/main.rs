//! pagemerge - Assemble a PDF from pages of other PDFs.
//!
//! Imports the inputs in order, replays `--edit` commands against the page
//! collection and exports the result.

mod cli;

use clap::Parser;
use std::path::Path;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::Cli;
use pagemerge::config::{Config, OverwriteMode};
use pagemerge::error::PageMergeError;
use pagemerge::io::{OutputWriter, SourceReader};
use pagemerge::output::{
    OutputFormatter, RunSummary, describe_event, display_export_statistics,
    display_import_report, display_load_statistics, display_page_plan, page_plan, plan_sources,
};
use pagemerge::pages::ThumbnailState;
use pagemerge::validation::Validator;
use pagemerge::workspace::{Event, Workspace};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(cli).await {
        eprintln!("Error: {err}");
        process::exit(err.exit_code());
    }
}

/// Logs go to stderr; `RUST_LOG` wins over `-v`.
fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "pagemerge=info"
    } else {
        "pagemerge=warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Main application logic.
async fn run(cli: Cli) -> Result<(), PageMergeError> {
    cli.validate()?;

    let all_inputs = cli.get_all_inputs().await?;
    let config = cli.to_config_with_inputs(all_inputs)?;

    let formatter = OutputFormatter::from_config(&config);
    let mut summary = RunSummary {
        dry_run: config.dry_run,
        ..Default::default()
    };

    if formatter.should_print() {
        formatter.section(&format!("{} v{}", pagemerge::NAME, pagemerge::VERSION));
        formatter.blank_line();
    }

    Validator::new().validate_config(&config).await?;

    if config.writes_output() {
        handle_output_overwrite(&config, &formatter).await?;
    }

    // Read inputs
    let loaded = SourceReader::new().load_all(config.inputs()).await;
    for skipped in &loaded.skipped {
        formatter.warning(&format!(
            "Skipping {}: {}",
            skipped.path.display(),
            skipped.error
        ));
        summary.skipped.push(skipped.error.to_string());
    }
    display_load_statistics(&formatter, &loaded.statistics);

    // Import
    formatter.info("Importing documents...");
    let mut workspace = Workspace::new(config.workspace.clone())?;
    let report = workspace.import(loaded.files).await;
    display_import_report(&formatter, &report);
    summary.import = report;

    summary.edits = apply_edits(&mut workspace, &config, &formatter).await?;

    if let Some(dir) = &config.thumbnails_dir {
        let written = write_thumbnails(&workspace, dir).await?;
        formatter.info(&format!("Wrote {written} image(s) to {}", dir.display()));
        summary.thumbnails_written = written;
    }

    let plan = page_plan(workspace.collection());
    if config.list || config.dry_run {
        display_page_plan(&formatter, &plan);
    }
    summary.pages = plan;
    summary.sources = plan_sources(workspace.collection());
    formatter.debug(&format!(
        "{} page(s) drawn from {} source(s)",
        summary.pages.len(),
        summary.sources.len()
    ));

    if config.dry_run {
        formatter.blank_line();
        formatter.success("Dry run completed successfully");
        formatter.info(&format!("  Output would be: {}", config.output.display()));
        return print_json(&config, &summary);
    }

    // Export
    formatter.blank_line();
    formatter.info("Exporting...");
    let output = workspace.export().await?;

    formatter.info(&format!("Writing to: {}", config.output.display()));
    let write_stats = OutputWriter::new()
        .save(output.bytes, &config.output)
        .await?;

    if formatter.should_print() {
        formatter.blank_line();
        formatter.success(&format!(
            "Created {} with {} page(s) ({})",
            config.output.display(),
            output.statistics.pages,
            write_stats.format_file_size()
        ));
        if formatter.is_verbose() {
            formatter.section("Statistics");
            display_export_statistics(&formatter, &output.statistics);
            formatter.detail(
                "Write time",
                &format!("{:.2}s", write_stats.write_time.as_secs_f64()),
            );
        }
    }

    summary.export = Some(output.statistics);
    summary.output = Some(write_stats.output_path);
    print_json(&config, &summary)
}

/// Apply the configured edits in order and return the ones that took effect.
///
/// With `--continue-on-error`, an edit that fails without a fatal error is
/// reported and skipped.
async fn apply_edits(
    workspace: &mut Workspace,
    config: &Config,
    formatter: &OutputFormatter,
) -> Result<Vec<String>, PageMergeError> {
    let mut applied = Vec::new();

    for edit in &config.edits {
        let event = match workspace.apply_edit(edit).await {
            Ok(event) => event,
            Err(err) if config.continue_on_error && !err.is_fatal() => {
                formatter.warning(&format!("Skipping edit '{edit}': {err}"));
                continue;
            }
            Err(err) => return Err(err),
        };

        formatter.debug(&format!("{edit}: {}", describe_event(&event)));
        if matches!(event, Event::PreviewShown { .. })
            && let Some(label) = workspace.preview().position_label(workspace.collection())
        {
            formatter.info(&format!("Preview: {label}"));
        }
        applied.push(edit.to_string());
    }

    Ok(applied)
}

fn print_json(config: &Config, summary: &RunSummary) -> Result<(), PageMergeError> {
    if config.json {
        let json = summary
            .to_json()
            .map_err(|e| PageMergeError::other(format!("Failed to serialize summary: {e}")))?;
        println!("{json}");
    }
    Ok(())
}

/// Write every ready thumbnail, plus the open preview, as PNG.
async fn write_thumbnails(workspace: &Workspace, dir: &Path) -> Result<usize, PageMergeError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| PageMergeError::FailedToCreateOutput {
            path: dir.to_path_buf(),
            source: e,
        })?;

    let writer = OutputWriter::new();
    let mut written = 0;

    for (index, record) in workspace.collection().iter().enumerate() {
        if let ThumbnailState::Ready { image, .. } = record.thumbnail() {
            let name = thumbnail_file_name(
                index + 1,
                record.source().name(),
                record.source_page_number(),
            );
            writer.save_png(image.clone(), &dir.join(name)).await?;
            written += 1;
        }
    }

    if let Some(preview) = workspace.preview().preview()
        && let ThumbnailState::Ready { image, .. } = &preview.image
    {
        writer.save_png(image.clone(), &dir.join("preview.png")).await?;
        written += 1;
    }

    Ok(written)
}

/// `NNN-<file stem>-p<page>.png`, with anything outside `[A-Za-z0-9_-]`
/// in the stem replaced by `_`.
fn thumbnail_file_name(position: usize, file: &str, page: usize) -> String {
    let stem = Path::new(file)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    format!("{position:03}-{stem}-p{page}.png")
}

/// Handle output file overwrite scenarios.
async fn handle_output_overwrite(
    config: &Config,
    formatter: &OutputFormatter,
) -> Result<(), PageMergeError> {
    if !OutputWriter::new().exists(&config.output).await {
        return Ok(());
    }

    match config.overwrite_mode {
        OverwriteMode::Force => Ok(()),
        OverwriteMode::NoClobber => Err(PageMergeError::output_exists(config.output.clone())),
        OverwriteMode::Prompt => {
            // Nobody to ask in quiet or JSON mode
            if formatter.is_quiet() {
                return Err(PageMergeError::output_exists(config.output.clone()));
            }

            formatter.warning(&format!(
                "Output file already exists: {}",
                config.output.display()
            ));

            use std::io::{self, Write};
            print!("Overwrite? [y/N]: ");
            io::stdout().flush().ok();

            let mut response = String::new();
            io::stdin()
                .read_line(&mut response)
                .map_err(|err| PageMergeError::other(format!("Failed to read input: {err}")))?;

            if confirms(&response) {
                Ok(())
            } else {
                Err(PageMergeError::Cancelled)
            }
        }
    }
}

fn confirms(response: &str) -> bool {
    matches!(response.trim().to_lowercase().as_str(), "y" | "yes")
}
