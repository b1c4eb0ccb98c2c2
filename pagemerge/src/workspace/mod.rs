//! The editing session that ties everything together.
//!
//! A [`Workspace`] owns the source store, the page collection, the preview,
//! the renderer and the export pipeline. Every mutation goes through
//! `&mut Workspace`, so there is exactly one writer at any time; async work
//! (parsing, rendering, export) happens on tokio's blocking pool with owned
//! handles to the source bytes.
//!
//! # Examples
//!
//! ```no_run
//! use pagemerge::config::WorkspaceOptions;
//! use pagemerge::workspace::{Command, ImportFile, Workspace};
//!
//! # async fn example() -> pagemerge::Result<()> {
//! let mut workspace = Workspace::new(WorkspaceOptions::default())?;
//! let report = workspace
//!     .import(vec![ImportFile::new("a.pdf", std::fs::read("a.pdf")?)])
//!     .await;
//!
//! let first = report.page_ids()[0];
//! workspace.apply(Command::Rotate { id: first, degrees: 90 }).await?;
//! let output = workspace.export().await?;
//! std::fs::write("merged.pdf", output.bytes)?;
//! # Ok(())
//! # }
//! ```

mod command;
mod import;

pub use command::{Command, Event};
pub use import::{ImportFailure, ImportFile, ImportReport, ImportedSource};

use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::task;

use crate::config::{EditCommand, WorkspaceOptions};
use crate::error::{PageMergeError, Result};
use crate::export::{ExportOutput, ExportPipeline};
use crate::pages::{PageCollection, PageId, Rotation, ThumbnailState};
use crate::preview::PreviewController;
use crate::render::{FrameRenderer, PageRenderer, RenderRequest, render_thumbnail};
use crate::source::{SourceId, SourceStore};

/// One editing session.
pub struct Workspace {
    options: WorkspaceOptions,
    store: SourceStore,
    // Declared page rotations of every registered source.
    declared: HashMap<SourceId, Vec<Rotation>>,
    collection: PageCollection,
    renderer: Arc<dyn PageRenderer>,
    preview: PreviewController,
    exporter: ExportPipeline,
}

impl Workspace {
    /// Create a workspace with the built-in [`FrameRenderer`].
    ///
    /// # Errors
    ///
    /// Returns [`PageMergeError::InvalidConfig`] if the options are invalid.
    pub fn new(options: WorkspaceOptions) -> Result<Self> {
        Self::with_renderer(options, Arc::new(FrameRenderer::new()))
    }

    /// Create a workspace that renders with `renderer`.
    ///
    /// # Errors
    ///
    /// Returns [`PageMergeError::InvalidConfig`] if the options are invalid.
    pub fn with_renderer(
        options: WorkspaceOptions,
        renderer: Arc<dyn PageRenderer>,
    ) -> Result<Self> {
        options.validate()?;

        Ok(Self {
            store: SourceStore::new(),
            declared: HashMap::new(),
            collection: PageCollection::new(),
            preview: PreviewController::new(Arc::clone(&renderer), options.preview_scale),
            exporter: ExportPipeline::new(options.export.clone()),
            renderer,
            options,
        })
    }

    /// Settings this workspace was created with.
    pub fn options(&self) -> &WorkspaceOptions {
        &self.options
    }

    /// Imported sources.
    pub fn store(&self) -> &SourceStore {
        &self.store
    }

    /// Pages in export order.
    pub fn collection(&self) -> &PageCollection {
        &self.collection
    }

    /// Preview state.
    pub fn preview(&self) -> &PreviewController {
        &self.preview
    }

    /// Import files in the given order.
    ///
    /// Each file is parsed and appended completely before the next one is
    /// looked at, so pages end up grouped by file, in input order. A file
    /// that cannot be parsed is reported in [`ImportReport::failed`] and
    /// does not stop the batch. Thumbnails for all new pages are rendered
    /// afterwards, concurrently.
    pub async fn import(&mut self, files: Vec<ImportFile>) -> ImportReport {
        let start = Instant::now();
        let mut report = ImportReport::default();

        for file in files {
            match self.import_one(file).await {
                Ok(imported) => report.imported.push(imported),
                Err(e) => {
                    tracing::warn!(error = %e, "skipping file");
                    report.failed.push((&e).into());
                }
            }
        }

        let (rendered, failed) = self.render_thumbnails(&report.page_ids()).await;
        report.thumbnails_rendered = rendered;
        report.thumbnails_failed = failed;
        report.elapsed = start.elapsed();

        tracing::info!(
            files = report.imported.len(),
            failed = report.failed.len(),
            pages = report.pages_added(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            "import finished"
        );
        report
    }

    async fn import_one(&mut self, file: ImportFile) -> Result<ImportedSource> {
        let ImportFile { name, bytes } = file;

        let id = SourceId::for_bytes(&bytes);
        let cached = self
            .declared
            .get(&id)
            .filter(|_| self.store.contains(&id))
            .cloned();
        let (bytes, rotations) = match cached {
            Some(rotations) => {
                tracing::debug!(source = %id, file = %name, "content already parsed");
                (bytes, rotations)
            }
            None => {
                let (bytes, inspected) = task::spawn_blocking(move || {
                    let inspected = import::inspect(&bytes);
                    (bytes, inspected)
                })
                .await
                .map_err(|e| {
                    PageMergeError::import_failed(&name, format!("inspection task failed: {e}"))
                })?;
                let rotations =
                    inspected.map_err(|reason| PageMergeError::import_failed(&name, reason))?;
                self.declared.insert(id, rotations.clone());
                (bytes, rotations)
            }
        };

        let known = self.store.len();
        let source = self.store.register(name.clone(), bytes);
        let duplicate = self.store.len() == known;

        let page_ids = self
            .collection
            .append_with_rotations(Arc::clone(&source), &rotations);

        Ok(ImportedSource {
            name,
            source: source.id().clone(),
            pages: page_ids.len(),
            page_ids,
            duplicate,
        })
    }

    /// Render thumbnails for the given pages, at most `render_jobs` at a
    /// time.
    ///
    /// Results for pages that were removed or rotated in the meantime are
    /// discarded. Returns how many bitmaps were stored and how many renders
    /// failed.
    pub async fn render_thumbnails(&mut self, ids: &[PageId]) -> (usize, usize) {
        let scale = self.options.thumbnail_scale;
        let requests: Vec<(PageId, RenderRequest)> = ids
            .iter()
            .filter_map(|&id| {
                self.collection
                    .get(id)
                    .map(|record| (id, RenderRequest::for_record(record, scale)))
            })
            .collect();

        let tasks = requests.into_iter().map(|(id, request)| {
            let renderer = Arc::clone(&self.renderer);
            async move {
                let rotation = request.rotation;
                (id, rotation, render_thumbnail(renderer, request).await)
            }
        });

        let results: Vec<_> = stream::iter(tasks)
            .buffer_unordered(self.options.render_jobs.max(1))
            .collect()
            .await;

        let (mut rendered, mut failed) = (0, 0);
        for (id, rotation, thumbnail) in results {
            let is_failure = matches!(thumbnail, ThumbnailState::Failed { .. });
            if !self.collection.set_thumbnail(id, rotation, thumbnail) {
                tracing::debug!(page = %id, "discarding stale thumbnail");
            } else if is_failure {
                failed += 1;
            } else {
                rendered += 1;
            }
        }
        (rendered, failed)
    }

    /// Apply a command.
    ///
    /// # Errors
    ///
    /// Model errors ([`PageMergeError::PageNotFound`],
    /// [`PageMergeError::IndexOutOfRange`],
    /// [`PageMergeError::InvalidRotation`]) leave the workspace unchanged.
    pub async fn apply(&mut self, command: Command) -> Result<Event> {
        tracing::debug!(?command, "applying command");

        let event = match command {
            Command::Remove(ids) => self.remove(&ids).await?,
            Command::Move { from, to } => self.move_page(from, to).await?,
            Command::Rotate { id, degrees } => self.rotate(&[id], degrees).await?,
            Command::RotateAll { degrees } => {
                let ids = self.collection.ids();
                self.rotate(&ids, degrees).await?
            }
            Command::Preview { index } => {
                let preview = self.preview.show(&self.collection, index).await?;
                Event::PreviewShown {
                    index: preview.index,
                    id: preview.page_id,
                }
            }
            Command::PreviewNext => self.advance_preview(1).await?,
            Command::PreviewPrevious => self.advance_preview(-1).await?,
            Command::PreviewRotate { degrees } => {
                let rotation = self
                    .preview
                    .rotate_current(&mut self.collection, degrees)
                    .await?;
                let id = self
                    .preview
                    .preview()
                    .map(|p| p.page_id)
                    .ok_or_else(|| PageMergeError::other("No page is being previewed"))?;
                self.render_thumbnails(&[id]).await;
                Event::Rotated {
                    pages: vec![(id, rotation)],
                }
            }
            Command::ClosePreview => {
                self.preview.close();
                Event::PreviewClosed
            }
            Command::Clear => self.clear(),
        };

        Ok(event)
    }

    /// Translate a 1-based edit and apply it.
    ///
    /// # Errors
    ///
    /// See [`Command::from_edit`] and [`Workspace::apply`].
    pub async fn apply_edit(&mut self, edit: &EditCommand) -> Result<Event> {
        let command = Command::from_edit(edit, &self.collection)?;
        self.apply(command).await
    }

    async fn remove(&mut self, ids: &[PageId]) -> Result<Event> {
        // Each id is removed once, however often it is listed.
        let mut unique: Vec<PageId> = Vec::with_capacity(ids.len());
        for &id in ids {
            if self.collection.get(id).is_none() {
                return Err(PageMergeError::PageNotFound { id });
            }
            if !unique.contains(&id) {
                unique.push(id);
            }
        }

        for &id in &unique {
            self.collection.remove(id)?;
        }
        self.sync_preview().await?;

        Ok(Event::Removed { ids: unique })
    }

    async fn move_page(&mut self, from: usize, to: usize) -> Result<Event> {
        self.collection.move_page(from, to)?;
        let id = self
            .collection
            .at(to)
            .map(|record| record.id())
            .ok_or(PageMergeError::IndexOutOfRange {
                index: to,
                len: self.collection.len(),
            })?;
        self.sync_preview().await?;

        Ok(Event::Moved { id, from, to })
    }

    async fn rotate(&mut self, ids: &[PageId], degrees: i64) -> Result<Event> {
        // Validate before touching anything so a bad delta changes nothing.
        Rotation::None.rotated_by(degrees)?;
        if let Some(&missing) = ids.iter().find(|&&id| self.collection.get(id).is_none()) {
            return Err(PageMergeError::PageNotFound { id: missing });
        }

        let mut pages = Vec::with_capacity(ids.len());
        for &id in ids {
            pages.push((id, self.collection.rotate(id, degrees)?));
        }

        self.render_thumbnails(ids).await;
        self.sync_preview().await?;

        Ok(Event::Rotated { pages })
    }

    async fn advance_preview(&mut self, delta: isize) -> Result<Event> {
        Ok(match self.preview.advance(&self.collection, delta).await? {
            Some(preview) => Event::PreviewShown {
                index: preview.index,
                id: preview.page_id,
            },
            None => Event::PreviewUnchanged,
        })
    }

    fn clear(&mut self) -> Event {
        let pages = self.collection.clear();
        self.preview.close();
        let sources = self.store.release_unreferenced();
        let store = &self.store;
        self.declared.retain(|id, _| store.contains(id));

        tracing::info!(pages, sources, "workspace cleared");
        Event::Cleared { pages, sources }
    }

    async fn sync_preview(&mut self) -> Result<()> {
        if self.preview.sync(&self.collection) {
            self.preview.refresh(&self.collection).await?;
        }
        Ok(())
    }

    /// Export the current page sequence.
    ///
    /// # Errors
    ///
    /// See [`ExportPipeline::export`].
    pub async fn export(&self) -> Result<ExportOutput> {
        self.exporter.export(&self.collection).await
    }
}
