//! Deep-copying pages from source documents into the output document.

use lopdf::{Dictionary, Document, Object, ObjectId, dictionary};
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::{CompressionLevel, ExportOptions};
use crate::error::{PageMergeError, Result};
use crate::export::metadata;
use crate::pages::Rotation;
use crate::source::SourceDocument;
use crate::utils::pdf;

/// A source document opened for one export.
///
/// Besides the parsed document it remembers which source objects were
/// already copied, so objects shared between pages (fonts, images, shared
/// resource dictionaries) land in the output only once.
pub struct SourceHandle {
    source: Arc<SourceDocument>,
    document: Document,
    page_ids: Vec<ObjectId>,
    remap: HashMap<ObjectId, ObjectId>,
}

impl SourceHandle {
    /// Parse a source. `page_index` is the source page whose copy needs it.
    ///
    /// # Errors
    ///
    /// Returns [`PageMergeError::InvalidSourceData`] naming that page if the
    /// bytes are empty or do not parse.
    pub fn open(source: Arc<SourceDocument>, page_index: usize) -> Result<Self> {
        let bytes = source.bytes();
        if bytes.is_empty() {
            return Err(PageMergeError::invalid_source_data(
                source.name(),
                page_index,
                "the document is empty",
            ));
        }

        let document = pdf::load_document(bytes.as_ref()).map_err(|e| {
            PageMergeError::invalid_source_data(source.name(), page_index, e.to_string())
        })?;
        let page_ids = pdf::page_ids(&document);

        tracing::debug!(
            source = %source.id(),
            name = source.name(),
            pages = page_ids.len(),
            "opened source for export"
        );

        Ok(Self {
            source,
            document,
            page_ids,
            remap: HashMap::new(),
        })
    }

    /// The source this handle was opened from.
    pub fn source(&self) -> &Arc<SourceDocument> {
        &self.source
    }

    /// Number of pages the parsed document really has.
    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }
}

/// The document being assembled.
pub struct OutputDocument {
    document: Document,
    pages_id: ObjectId,
    kids: Vec<Object>,
}

impl OutputDocument {
    /// Start an empty output document.
    pub fn new() -> Self {
        let mut document = Document::with_version("1.7");
        let pages_id = document.new_object_id();
        Self {
            document,
            pages_id,
            kids: Vec::new(),
        }
    }

    /// Number of pages appended so far.
    pub fn page_count(&self) -> usize {
        self.kids.len()
    }

    /// Append page `page_index` (zero-based) of `handle`, displayed at the
    /// absolute `rotation`.
    ///
    /// Inherited attributes are copied onto the page itself, since the page
    /// leaves its original page tree behind.
    ///
    /// # Errors
    ///
    /// Returns [`PageMergeError::PageOutOfRange`] if the source has no such
    /// page and [`PageMergeError::PageCopyFailed`] if the page object is
    /// unusable. Nothing is appended on error.
    pub fn copy_page(
        &mut self,
        handle: &mut SourceHandle,
        page_index: usize,
        rotation: Rotation,
    ) -> Result<ObjectId> {
        let source = &handle.source;
        let source_doc = &handle.document;
        let remap = &mut handle.remap;

        let source_page_id = *handle.page_ids.get(page_index).ok_or_else(|| {
            PageMergeError::page_out_of_range(source.name(), page_index, handle.page_ids.len())
        })?;
        let page = source_doc
            .get_dictionary(source_page_id)
            .map_err(|e| {
                PageMergeError::page_copy_failed(source.name(), page_index, e.to_string())
            })?;

        let mut flattened = Dictionary::new();
        for (key, value) in page.iter() {
            if key.as_slice() != b"Parent" {
                flattened.set(key.clone(), value.clone());
            }
        }
        for key in pdf::INHERITABLE_KEYS {
            if !flattened.has(key)
                && let Some(value) = pdf::inherited_attribute(source_doc, source_page_id, key)
            {
                flattened.set(key, value.clone());
            }
        }

        let mut copied = copy_dictionary(source_doc, remap, &mut self.document, &flattened);
        copied.set("Parent", self.pages_id);
        copied.set("Rotate", i64::from(rotation));

        let page_id = self.document.add_object(copied);
        self.kids.push(page_id.into());

        tracing::debug!(
            name = source.name(),
            page = page_index + 1,
            rotation = %rotation,
            "copied page"
        );
        Ok(page_id)
    }

    /// Close the page tree, add the catalog and Info dictionary, compress
    /// and serialize.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn finish(mut self, options: &ExportOptions) -> Result<Vec<u8>> {
        let count = self.kids.len() as i64;
        self.document.objects.insert(
            self.pages_id,
            dictionary! {
                "Type" => "Pages",
                "Kids" => self.kids,
                "Count" => count,
            }
            .into(),
        );

        let catalog_id = self.document.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.document.trailer.set("Root", catalog_id);

        metadata::write_info(&mut self.document, &options.metadata);

        match options.compression {
            CompressionLevel::None => {}
            CompressionLevel::Standard => self.document.compress(),
            CompressionLevel::Maximum => {
                self.document.prune_objects();
                self.document.compress();
            }
        }

        let mut bytes = Vec::new();
        self.document
            .save_to(&mut bytes)
            .map_err(|e| PageMergeError::other(format!("Failed to serialize output: {e}")))?;
        Ok(bytes)
    }
}

impl Default for OutputDocument {
    fn default() -> Self {
        Self::new()
    }
}

fn copy_dictionary(
    source: &Document,
    remap: &mut HashMap<ObjectId, ObjectId>,
    target: &mut Document,
    dict: &Dictionary,
) -> Dictionary {
    let mut copied = Dictionary::new();
    for (key, value) in dict.iter() {
        copied.set(key.clone(), copy_object(source, remap, target, value));
    }
    copied
}

// Copies `object` into `target`, following references. Page-tree nodes are
// cut off (they belong to the source's tree) and dangling references become
// null. The remap entry is created before descending, so cycles terminate.
fn copy_object(
    source: &Document,
    remap: &mut HashMap<ObjectId, ObjectId>,
    target: &mut Document,
    object: &Object,
) -> Object {
    match object {
        Object::Reference(id) => {
            if let Some(copied) = remap.get(id) {
                return Object::Reference(*copied);
            }
            let Ok(referenced) = source.get_object(*id) else {
                return Object::Null;
            };
            if pdf::is_page_tree_node(referenced) {
                return Object::Null;
            }

            let new_id = target.new_object_id();
            remap.insert(*id, new_id);
            let copied = copy_object(source, remap, target, referenced);
            target.objects.insert(new_id, copied);
            Object::Reference(new_id)
        }
        Object::Array(items) => Object::Array(
            items
                .iter()
                .map(|item| copy_object(source, remap, target, item))
                .collect(),
        ),
        Object::Dictionary(dict) => {
            Object::Dictionary(copy_dictionary(source, remap, target, dict))
        }
        Object::Stream(stream) => {
            let mut copied = stream.clone();
            copied.dict = copy_dictionary(source, remap, target, &stream.dict);
            Object::Stream(copied)
        }
        other => other.clone(),
    }
}
