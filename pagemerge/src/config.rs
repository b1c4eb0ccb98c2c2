//! Configuration for the engine and the command-line front end.
//!
//! [`WorkspaceOptions`] drives the library: render scales, render
//! parallelism and export settings. [`Config`] is the CLI-level view built
//! from parsed arguments; it adds inputs, output handling and the ordered
//! list of [`EditCommand`]s to replay against the workspace.

use anyhow::{Context, Result, bail};

use crate::PageMergeError;
use std::{fmt, path::PathBuf, str::FromStr};

/// File name used when no output path is given.
pub const DEFAULT_OUTPUT: &str = "merged.pdf";

/// Compression level for the output PDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionLevel {
    /// No compression - streams are written as they were copied.
    None,
    /// Compress streams.
    #[default]
    Standard,
    /// Compress streams and prune unreachable objects.
    Maximum,
}

impl FromStr for CompressionLevel {
    type Err = PageMergeError;

    /// Parse a compression level: "none", "standard" or "maximum".
    fn from_str(s: &str) -> crate::Result<Self> {
        match s.to_lowercase().as_str() {
            "none" => Ok(Self::None),
            "standard" => Ok(Self::Standard),
            "maximum" => Ok(Self::Maximum),
            _ => Err(PageMergeError::invalid_config(format!(
                "Invalid compression level: {s}. Must be one of: none, standard, maximum"
            ))),
        }
    }
}

/// Document information written to the output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    /// Document title.
    pub title: Option<String>,
    /// Document author.
    pub author: Option<String>,
    /// Document subject.
    pub subject: Option<String>,
    /// Document keywords (comma-separated).
    pub keywords: Option<String>,
}

impl Metadata {
    /// Build metadata from optional strings. Blank values are dropped and
    /// the rest are trimmed.
    pub fn new(
        title: Option<String>,
        author: Option<String>,
        subject: Option<String>,
        keywords: Option<String>,
    ) -> Self {
        let clean = |value: Option<String>| {
            value
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };

        Self {
            title: clean(title),
            author: clean(author),
            subject: clean(subject),
            keywords: clean(keywords),
        }
    }

    /// Whether no field is set.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.author.is_none()
            && self.subject.is_none()
            && self.keywords.is_none()
    }
}

/// Settings applied when the page sequence is serialized.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportOptions {
    /// Stream compression.
    pub compression: CompressionLevel,
    /// Info dictionary contents.
    pub metadata: Metadata,
}

/// Settings for a [`Workspace`](crate::workspace::Workspace).
#[derive(Debug, Clone, PartialEq)]
pub struct WorkspaceOptions {
    /// Scale used for thumbnails (1.0 = one pixel per point).
    pub thumbnail_scale: f32,
    /// Scale used for the enlarged preview.
    pub preview_scale: f32,
    /// Maximum number of thumbnails rendered at once.
    pub render_jobs: usize,
    /// Export settings.
    pub export: ExportOptions,
}

impl WorkspaceOptions {
    /// Default thumbnail scale.
    pub const THUMBNAIL_SCALE: f32 = 0.5;
    /// Default preview scale.
    pub const PREVIEW_SCALE: f32 = 1.5;

    /// Check that scales are positive and finite and that at least one
    /// render job is allowed.
    ///
    /// # Errors
    ///
    /// Returns [`PageMergeError::InvalidConfig`] describing the first bad
    /// value.
    pub fn validate(&self) -> crate::Result<()> {
        for (name, scale) in [
            ("thumbnail scale", self.thumbnail_scale),
            ("preview scale", self.preview_scale),
        ] {
            if !(scale.is_finite() && scale > 0.0) {
                return Err(PageMergeError::invalid_config(format!(
                    "{name} must be a positive number, got {scale}"
                )));
            }
        }

        if self.render_jobs == 0 {
            return Err(PageMergeError::invalid_config(
                "Number of render jobs must be at least 1",
            ));
        }

        Ok(())
    }
}

impl Default for WorkspaceOptions {
    fn default() -> Self {
        Self {
            thumbnail_scale: Self::THUMBNAIL_SCALE,
            preview_scale: Self::PREVIEW_SCALE,
            render_jobs: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            export: ExportOptions::default(),
        }
    }
}

/// Output file overwrite behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverwriteMode {
    /// Prompt the user before overwriting (default).
    #[default]
    Prompt,
    /// Always overwrite without prompting.
    Force,
    /// Never overwrite, error if file exists.
    NoClobber,
}

/// A set of 1-based positions.
///
/// Supports the same syntax as page ranges elsewhere:
/// - "3" - single position
/// - "2-5" - inclusive range
/// - "1,4,6-8" - any combination
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionList {
    items: Vec<PositionItem>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PositionItem {
    Single(usize),
    Range(usize, usize),
}

impl PositionList {
    /// Parse a position list.
    ///
    /// # Errors
    ///
    /// Returns an error for empty input, zero, malformed numbers and
    /// reversed ranges.
    ///
    /// # Examples
    ///
    /// ```
    /// use pagemerge::config::PositionList;
    ///
    /// let list = PositionList::parse("1-3,7").unwrap();
    /// assert!(list.contains(2));
    /// assert!(!list.contains(5));
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        let mut items = Vec::new();

        for part in s.split(',') {
            let part = part.trim();
            if part.is_empty() {
                bail!("Position list cannot contain empty entries");
            }

            if let Some((start, end)) = part.split_once('-') {
                let start = parse_position(start)?;
                let end = parse_position(end)?;
                if start > end {
                    bail!("Invalid range {start}-{end}: start must not exceed end");
                }
                items.push(PositionItem::Range(start, end));
            } else {
                items.push(PositionItem::Single(parse_position(part)?));
            }
        }

        Ok(Self { items })
    }

    /// Whether a 1-based position is included.
    pub fn contains(&self, position: usize) -> bool {
        self.items.iter().any(|item| match item {
            PositionItem::Single(p) => *p == position,
            PositionItem::Range(start, end) => (*start..=*end).contains(&position),
        })
    }

    /// Resolve to sorted, deduplicated zero-based indices for a collection
    /// of `len` pages.
    ///
    /// # Errors
    ///
    /// Returns an error if any position lies beyond `len`.
    pub fn to_indices(&self, len: usize) -> Result<Vec<usize>> {
        let highest = self
            .items
            .iter()
            .map(|item| match item {
                PositionItem::Single(p) => *p,
                PositionItem::Range(_, end) => *end,
            })
            .max()
            .unwrap_or(0);
        if highest > len {
            bail!("Position {highest} is out of range for {len} page(s)");
        }

        Ok((1..=len)
            .filter(|p| self.contains(*p))
            .map(|p| p - 1)
            .collect())
    }
}

impl fmt::Display for PositionList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, item) in self.items.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            match item {
                PositionItem::Single(p) => write!(f, "{p}")?,
                PositionItem::Range(start, end) => write!(f, "{start}-{end}")?,
            }
        }
        Ok(())
    }
}

fn parse_position(s: &str) -> Result<usize> {
    let s = s.trim();
    let position: usize = s
        .parse()
        .with_context(|| format!("Invalid position: {s}"))?;
    if position == 0 {
        bail!("Positions are 1-based");
    }
    Ok(position)
}

fn parse_degrees(s: &str) -> Result<i64> {
    s.trim()
        .parse()
        .with_context(|| format!("Invalid rotation: {s}"))
}

/// One edit to replay against the page collection, with 1-based positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditCommand {
    /// `move FROM TO`
    Move {
        /// Current position.
        from: usize,
        /// Target position.
        to: usize,
    },
    /// `rotate POS DEG`
    Rotate {
        /// Page position.
        position: usize,
        /// Clockwise delta in degrees.
        degrees: i64,
    },
    /// `rotate-all DEG`
    RotateAll {
        /// Clockwise delta in degrees.
        degrees: i64,
    },
    /// `remove LIST`
    Remove(PositionList),
    /// `preview POS`
    Preview {
        /// Page position.
        position: usize,
    },
    /// `next`
    Next,
    /// `prev`
    Previous,
    /// `preview-rotate DEG`
    PreviewRotate {
        /// Clockwise delta in degrees.
        degrees: i64,
    },
    /// `close-preview`
    ClosePreview,
    /// `clear`
    Clear,
}

impl EditCommand {
    /// Parse an edit such as `"move 3 1"` or `"remove 2-4"`.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown verbs and bad arguments.
    pub fn parse(s: &str) -> Result<Self> {
        let words: Vec<&str> = s.split_whitespace().collect();
        let Some((verb, args)) = words.split_first() else {
            bail!("Edit cannot be empty");
        };

        let command = match (verb.to_lowercase().as_str(), args) {
            ("move", [from, to]) => Self::Move {
                from: parse_position(from)?,
                to: parse_position(to)?,
            },
            ("rotate", [position, degrees]) => Self::Rotate {
                position: parse_position(position)?,
                degrees: parse_degrees(degrees)?,
            },
            ("rotate-all", [degrees]) => Self::RotateAll {
                degrees: parse_degrees(degrees)?,
            },
            ("remove", [list]) => Self::Remove(PositionList::parse(list)?),
            ("preview", [position]) => Self::Preview {
                position: parse_position(position)?,
            },
            ("next", []) => Self::Next,
            ("prev", []) => Self::Previous,
            ("preview-rotate", [degrees]) => Self::PreviewRotate {
                degrees: parse_degrees(degrees)?,
            },
            ("close-preview", []) => Self::ClosePreview,
            ("clear", []) => Self::Clear,
            (
                "move" | "rotate" | "rotate-all" | "remove" | "preview" | "next" | "prev"
                | "preview-rotate" | "close-preview" | "clear",
                _,
            ) => bail!("Wrong number of arguments for '{verb}'"),
            _ => bail!("Unknown edit '{verb}'"),
        };

        Ok(command)
    }
}

impl fmt::Display for EditCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Move { from, to } => write!(f, "move {from} {to}"),
            Self::Rotate { position, degrees } => write!(f, "rotate {position} {degrees}"),
            Self::RotateAll { degrees } => write!(f, "rotate-all {degrees}"),
            Self::Remove(list) => write!(f, "remove {list}"),
            Self::Preview { position } => write!(f, "preview {position}"),
            Self::Next => f.write_str("next"),
            Self::Previous => f.write_str("prev"),
            Self::PreviewRotate { degrees } => write!(f, "preview-rotate {degrees}"),
            Self::ClosePreview => f.write_str("close-preview"),
            Self::Clear => f.write_str("clear"),
        }
    }
}

impl FromStr for EditCommand {
    type Err = PageMergeError;

    fn from_str(s: &str) -> crate::Result<Self> {
        Self::parse(s).map_err(|e| PageMergeError::invalid_edit(s, format!("{e:#}")))
    }
}

/// Complete configuration for one CLI run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Input PDF paths, in import order.
    pub inputs: Vec<PathBuf>,

    /// Output PDF path.
    pub output: PathBuf,

    /// Validate and print the page plan without writing output.
    pub dry_run: bool,

    /// Print the page plan after edits.
    pub list: bool,

    /// Verbose output mode.
    pub verbose: bool,

    /// Quiet mode - suppress non-error output.
    pub quiet: bool,

    /// Print the summary as JSON.
    pub json: bool,

    /// File overwrite behavior.
    pub overwrite_mode: OverwriteMode,

    /// Skip inputs and edits that fail instead of aborting.
    ///
    /// Only errors that affect a single input or edit are skipped.
    pub continue_on_error: bool,

    /// Edits applied after import, in order.
    pub edits: Vec<EditCommand>,

    /// Directory to write thumbnails into.
    pub thumbnails_dir: Option<PathBuf>,

    /// Engine settings.
    pub workspace: WorkspaceOptions,
}

impl Config {
    /// Returns a reference to inputs.
    pub fn inputs(&self) -> &[PathBuf] {
        self.inputs.as_ref()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No input files are specified
    /// - Verbose and quiet modes are both enabled
    /// - The output path is also an input
    /// - The workspace options are invalid
    pub fn validate(&self) -> Result<()> {
        if self.inputs.is_empty() {
            bail!("No input files specified");
        }

        if self.verbose && self.quiet {
            bail!("Cannot use both --verbose and --quiet");
        }

        if self.inputs.iter().any(|input| input == &self.output) {
            bail!(
                "Output file cannot be the same as an input file: {}",
                self.output.display()
            );
        }

        self.workspace.validate()?;

        Ok(())
    }

    /// Whether anything will be written to disk.
    pub fn writes_output(&self) -> bool {
        !self.dry_run
    }

    /// Check if output should be displayed.
    ///
    /// Returns false if in quiet mode and not doing a dry run.
    pub fn should_print(&self) -> bool {
        !self.quiet || self.dry_run
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn config() -> Config {
        Config {
            inputs: vec![PathBuf::from("a.pdf")],
            output: PathBuf::from(DEFAULT_OUTPUT),
            dry_run: false,
            list: false,
            verbose: false,
            quiet: false,
            json: false,
            overwrite_mode: OverwriteMode::Prompt,
            continue_on_error: false,
            edits: Vec::new(),
            thumbnails_dir: None,
            workspace: WorkspaceOptions::default(),
        }
    }

    #[test]
    fn test_compression_level_from_str() {
        assert_eq!(
            CompressionLevel::from_str("none").unwrap(),
            CompressionLevel::None
        );
        assert_eq!(
            CompressionLevel::from_str("MAXIMUM").unwrap(),
            CompressionLevel::Maximum
        );
        let err = CompressionLevel::from_str("zip").unwrap_err();
        assert!(matches!(err, PageMergeError::InvalidConfig { .. }));
    }

    #[test]
    fn test_metadata_new_trims_and_drops_blank() {
        let meta = Metadata::new(
            Some("  Title  ".to_string()),
            Some("   ".to_string()),
            None,
            Some("a, b".to_string()),
        );

        assert_eq!(meta.title.as_deref(), Some("Title"));
        assert_eq!(meta.author, None);
        assert_eq!(meta.keywords.as_deref(), Some("a, b"));
        assert!(!meta.is_empty());
        assert!(Metadata::default().is_empty());
    }

    #[test]
    fn test_workspace_options_defaults() {
        let options = WorkspaceOptions::default();
        assert_eq!(options.thumbnail_scale, 0.5);
        assert_eq!(options.preview_scale, 1.5);
        assert!(options.render_jobs >= 1);
        assert!(options.validate().is_ok());
    }

    #[rstest]
    #[case(0.0, 1.5, 1)]
    #[case(0.5, f32::NAN, 1)]
    #[case(-1.0, 1.5, 1)]
    #[case(0.5, 1.5, 0)]
    fn test_workspace_options_rejects(
        #[case] thumbnail_scale: f32,
        #[case] preview_scale: f32,
        #[case] render_jobs: usize,
    ) {
        let options = WorkspaceOptions {
            thumbnail_scale,
            preview_scale,
            render_jobs,
            ..Default::default()
        };
        assert!(matches!(
            options.validate(),
            Err(PageMergeError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_position_list_resolves_sorted_unique() {
        let list = PositionList::parse("4, 1-2,2").unwrap();
        assert_eq!(list.to_indices(5).unwrap(), vec![0, 1, 3]);
    }

    #[test]
    fn test_position_list_beyond_len() {
        let list = PositionList::parse("2-6").unwrap();
        assert!(list.to_indices(5).is_err());
        assert_eq!(list.to_indices(6).unwrap(), vec![1, 2, 3, 4, 5]);
    }

    #[rstest]
    #[case("")]
    #[case("0")]
    #[case("3-1")]
    #[case("a")]
    #[case("1,,2")]
    #[case("1-2-3")]
    fn test_position_list_invalid(#[case] input: &str) {
        assert!(PositionList::parse(input).is_err());
    }

    #[rstest]
    #[case("move 3 1", EditCommand::Move { from: 3, to: 1 })]
    #[case("rotate 2 -90", EditCommand::Rotate { position: 2, degrees: -90 })]
    #[case("ROTATE-ALL 180", EditCommand::RotateAll { degrees: 180 })]
    #[case("preview 4", EditCommand::Preview { position: 4 })]
    #[case("  next ", EditCommand::Next)]
    #[case("prev", EditCommand::Previous)]
    #[case("preview-rotate 270", EditCommand::PreviewRotate { degrees: 270 })]
    #[case("close-preview", EditCommand::ClosePreview)]
    #[case("clear", EditCommand::Clear)]
    fn test_edit_command_parse(#[case] input: &str, #[case] expected: EditCommand) {
        assert_eq!(EditCommand::parse(input).unwrap(), expected);
    }

    #[test]
    fn test_edit_command_remove() {
        let EditCommand::Remove(list) = EditCommand::parse("remove 1,3-4").unwrap() else {
            panic!("expected remove");
        };
        assert_eq!(list.to_indices(4).unwrap(), vec![0, 2, 3]);
    }

    #[test]
    fn test_edit_command_display_reparses() {
        for input in ["move 3 1", "remove 1,3-4", "rotate-all -90", "prev"] {
            let edit = EditCommand::parse(input).unwrap();
            assert_eq!(edit.to_string(), input);
        }
    }

    #[rstest]
    #[case("")]
    #[case("move 1")]
    #[case("move 0 1")]
    #[case("rotate 1 ninety")]
    #[case("shuffle")]
    #[case("next 2")]
    fn test_edit_command_invalid(#[case] input: &str) {
        let err = EditCommand::from_str(input).unwrap_err();
        assert!(matches!(err, PageMergeError::InvalidEdit { .. }));
    }

    #[test]
    fn test_config_validation() {
        let mut config = config();
        assert!(config.validate().is_ok());

        config.inputs.clear();
        assert!(config.validate().is_err());
        config.inputs = vec![PathBuf::from("a.pdf")];

        config.verbose = true;
        config.quiet = true;
        assert!(config.validate().is_err());
        config.verbose = false;
        config.quiet = false;

        config.workspace.render_jobs = 0;
        assert!(config.validate().is_err());
        config.workspace.render_jobs = 2;

        config.output = PathBuf::from("a.pdf");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_should_print() {
        let mut config = config();
        assert!(config.should_print());

        config.quiet = true;
        assert!(!config.should_print());

        config.dry_run = true;
        assert!(config.should_print());
        assert!(!config.writes_output());
    }
}
