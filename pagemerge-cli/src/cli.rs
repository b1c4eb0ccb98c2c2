//! CLI argument parsing for pagemerge.
//!
//! This module defines the command-line interface structure using `clap`.
//! It handles argument parsing, validation, and help text generation.

use clap::Parser;
use std::path::PathBuf;
use std::str::FromStr;

use pagemerge::config::{
    CompressionLevel, Config, DEFAULT_OUTPUT, EditCommand, ExportOptions, Metadata,
    OverwriteMode, WorkspaceOptions,
};
use pagemerge::error::{PageMergeError, Result};
use pagemerge::utils::collect_paths_for_patterns;

/// Assemble a PDF from pages of other PDFs.
///
/// pagemerge imports the given PDFs in order, lays their pages out as one
/// sequence, applies the requested edits (move, rotate, remove) and writes
/// the result as a single document.
#[derive(Parser, Debug)]
#[command(name = "pagemerge")]
#[command(version)]
#[command(about = "Assemble a PDF from pages of other PDFs", long_about = None)]
#[command(author)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Input PDF files or glob patterns (in order)
    ///
    /// Pages are laid out grouped by file, in the order given.
    /// Inputs that are not PDFs are skipped with a warning.
    ///
    /// Examples:
    ///   pagemerge cover.pdf report.pdf -o out.pdf
    ///   pagemerge 'scans/*.pdf' --edit 'remove 1'
    #[arg(value_name = "FILE", required_unless_present = "input_list")]
    pub inputs: Vec<String>,

    /// Output PDF file path
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_OUTPUT)]
    pub output: PathBuf,

    /// Edit to apply after import (repeatable, applied in order)
    ///
    /// Positions are 1-based and refer to the page order at the time the
    /// edit runs.
    ///
    ///   move FROM TO           move a page
    ///   rotate POS DEG         rotate one page by a multiple of 90
    ///   rotate-all DEG         rotate every page
    ///   remove LIST            remove pages, e.g. "2,5-7"
    ///   preview POS            open the preview on a page
    ///   next | prev            navigate the preview
    ///   preview-rotate DEG     rotate the previewed page
    ///   close-preview          close the preview
    ///   clear                  remove every page
    #[arg(short, long = "edit", value_name = "CMD")]
    pub edits: Vec<String>,

    /// Import and apply edits, print the page plan, write nothing
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Print the page plan after edits
    #[arg(short, long)]
    pub list: bool,

    /// Verbose output - show per-file and export details
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress all non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Print a JSON summary on stdout instead of progress messages
    #[arg(long)]
    pub json: bool,

    /// Force overwrite of existing output file without confirmation
    #[arg(short, long)]
    pub force: bool,

    /// Never overwrite existing output file
    #[arg(long, conflicts_with = "force")]
    pub no_clobber: bool,

    /// Continue even if some inputs or edits fail
    ///
    /// By default, pagemerge stops on the first missing input or invalid
    /// edit. With this flag, they are skipped with a warning.
    #[arg(long)]
    pub continue_on_error: bool,

    /// Compression level for output PDF
    ///
    /// - none: No compression
    /// - standard: Compress streams (default)
    /// - maximum: Compress streams and drop unreachable objects
    #[arg(short, long, value_name = "LEVEL", default_value = "standard")]
    #[arg(value_parser = ["none", "standard", "maximum"])]
    pub compression: String,

    /// Set title metadata for output PDF
    #[arg(long, value_name = "TEXT")]
    pub title: Option<String>,

    /// Set author metadata for output PDF
    #[arg(long, value_name = "TEXT")]
    pub author: Option<String>,

    /// Set subject metadata for output PDF
    #[arg(long, value_name = "TEXT")]
    pub subject: Option<String>,

    /// Set keywords metadata for output PDF (comma-separated)
    #[arg(long, value_name = "TEXT")]
    pub keywords: Option<String>,

    /// Read input paths from a file (one path per line, '#' comments)
    ///
    /// Paths from the file are appended after direct inputs.
    #[arg(long, value_name = "FILE")]
    pub input_list: Option<PathBuf>,

    /// Write every page's thumbnail as PNG into this directory
    #[arg(long = "thumbnails", value_name = "DIR")]
    pub thumbnails_dir: Option<PathBuf>,

    /// Scale for thumbnails (1.0 = one pixel per point)
    #[arg(long, value_name = "SCALE", default_value_t = WorkspaceOptions::THUMBNAIL_SCALE)]
    pub thumbnail_scale: f32,

    /// Scale for the preview
    #[arg(long, value_name = "SCALE", default_value_t = WorkspaceOptions::PREVIEW_SCALE)]
    pub preview_scale: f32,

    /// Number of concurrent thumbnail renders
    ///
    /// Default is the number of CPU cores.
    #[arg(short, long, value_name = "N")]
    pub jobs: Option<usize>,
}

impl Cli {
    /// Convert CLI arguments into a validated Config, taking the inputs
    /// verbatim.
    ///
    /// # Errors
    ///
    /// See [`Cli::to_config_with_inputs`].
    pub fn to_config(&self) -> Result<Config> {
        self.to_config_with_inputs(self.inputs.iter().map(PathBuf::from).collect())
    }

    /// Convert CLI arguments into a validated Config with resolved inputs,
    /// usually the result of [`Cli::get_all_inputs`].
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Compression level is invalid
    /// - An edit cannot be parsed
    /// - Configuration validation fails
    pub fn to_config_with_inputs(&self, inputs: Vec<PathBuf>) -> Result<Config> {
        let compression = CompressionLevel::from_str(&self.compression)?;

        let edits = self
            .edits
            .iter()
            .map(|edit| edit.parse::<EditCommand>())
            .collect::<Result<Vec<_>>>()?;

        let overwrite_mode = if self.force {
            OverwriteMode::Force
        } else if self.no_clobber {
            OverwriteMode::NoClobber
        } else {
            OverwriteMode::Prompt
        };

        let metadata = Metadata::new(
            self.title.clone(),
            self.author.clone(),
            self.subject.clone(),
            self.keywords.clone(),
        );

        let defaults = WorkspaceOptions::default();
        let workspace = WorkspaceOptions {
            thumbnail_scale: self.thumbnail_scale,
            preview_scale: self.preview_scale,
            render_jobs: self.jobs.unwrap_or(defaults.render_jobs),
            export: ExportOptions {
                compression,
                metadata,
            },
        };

        let config = Config {
            inputs,
            output: self.output.clone(),
            dry_run: self.dry_run,
            list: self.list,
            verbose: self.verbose,
            quiet: self.quiet,
            json: self.json,
            overwrite_mode,
            continue_on_error: self.continue_on_error,
            edits,
            thumbnails_dir: self.thumbnails_dir.clone(),
            workspace,
        };

        config.validate().map_err(|e| {
            PageMergeError::invalid_config(format!("Configuration validation failed: {e}"))
        })?;

        Ok(config)
    }

    /// Validate CLI arguments before any file I/O.
    ///
    /// # Errors
    ///
    /// Returns an error if any validation check fails.
    pub fn validate(&self) -> Result<()> {
        if self.inputs.is_empty() && self.input_list.is_none() {
            return Err(PageMergeError::invalid_config("No input files specified"));
        }

        if self.jobs == Some(0) {
            return Err(PageMergeError::invalid_config(
                "Number of jobs must be at least 1",
            ));
        }

        if !["none", "standard", "maximum"].contains(&self.compression.as_str()) {
            return Err(PageMergeError::invalid_config(format!(
                "Invalid compression level: {}",
                self.compression
            )));
        }

        for edit in &self.edits {
            edit.parse::<EditCommand>()?;
        }

        Ok(())
    }

    /// Get all input paths: expanded patterns first, then the input list.
    ///
    /// # Errors
    ///
    /// Returns an error if a pattern is malformed, the input list cannot be
    /// read, or nothing is left to import.
    pub async fn get_all_inputs(&self) -> Result<Vec<PathBuf>> {
        let mut all_inputs = collect_paths_for_patterns(&self.inputs)?;

        if let Some(ref input_list_path) = self.input_list {
            let additional_inputs = self.read_input_list(input_list_path).await?;
            all_inputs.extend(additional_inputs);
        }

        if all_inputs.is_empty() {
            return Err(PageMergeError::invalid_config(
                "No input files matched the given patterns",
            ));
        }

        Ok(all_inputs)
    }

    /// Read input paths from a file.
    ///
    /// Lines starting with '#' are comments; empty lines are skipped.
    async fn read_input_list(&self, path: &PathBuf) -> Result<Vec<PathBuf>> {
        use tokio::fs::File;
        use tokio::io::{AsyncBufReadExt, BufReader};

        let read_error = |e: std::io::Error| PageMergeError::FailedToReadInputList {
            path: path.clone(),
            source: e,
        };

        let file = File::open(path).await.map_err(read_error)?;
        let mut lines = BufReader::new(file).lines();
        let mut paths = Vec::new();
        let mut line_number = 0;

        while let Some(line) = lines.next_line().await.map_err(read_error)? {
            line_number += 1;
            let line = line.trim();

            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if line.contains('\0') {
                return Err(PageMergeError::InvalidInputList {
                    path: path.clone(),
                    line_number,
                    details: "Path contains a NUL byte".to_string(),
                });
            }

            paths.push(PathBuf::from(line));
        }

        Ok(paths)
    }
}
