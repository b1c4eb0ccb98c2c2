//! Small lopdf helpers shared by import, rendering and export.

use lopdf::{Document, Object, ObjectId};

use crate::pages::Rotation;

/// Attributes a page may inherit from its ancestors in the page tree.
pub const INHERITABLE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// US Letter, used when a page declares no usable MediaBox.
pub const DEFAULT_MEDIA_BOX: [f32; 4] = [0.0, 0.0, 612.0, 792.0];

const MAX_TREE_DEPTH: usize = 64;

/// Parse a document from memory.
pub fn load_document(bytes: &[u8]) -> lopdf::Result<Document> {
    Document::load_mem(bytes)
}

/// Page object ids in page order.
pub fn page_ids(doc: &Document) -> Vec<ObjectId> {
    doc.get_pages().into_values().collect()
}

/// Follow a chain of indirect references to the object behind it.
pub fn resolve<'a>(doc: &'a Document, object: &'a Object) -> Option<&'a Object> {
    let mut current = object;
    for _ in 0..MAX_TREE_DEPTH {
        match current {
            Object::Reference(id) => current = doc.get_object(*id).ok()?,
            other => return Some(other),
        }
    }
    None
}

/// Look up `key` on a page, walking up the `/Parent` chain if the page does
/// not carry it itself. The returned object is resolved.
pub fn inherited_attribute<'a>(
    doc: &'a Document,
    page_id: ObjectId,
    key: &[u8],
) -> Option<&'a Object> {
    let mut node_id = page_id;
    for _ in 0..MAX_TREE_DEPTH {
        let node = doc.get_dictionary(node_id).ok()?;
        if let Ok(value) = node.get(key) {
            return resolve(doc, value);
        }
        node_id = node.get(b"Parent").and_then(Object::as_reference).ok()?;
    }
    None
}

/// Numeric value of an integer or real object.
pub fn as_number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// The page's MediaBox as `[llx, lly, urx, ury]`.
pub fn media_box(doc: &Document, page_id: ObjectId) -> [f32; 4] {
    let Some(Object::Array(values)) = inherited_attribute(doc, page_id, b"MediaBox") else {
        return DEFAULT_MEDIA_BOX;
    };

    let numbers: Vec<f32> = values
        .iter()
        .filter_map(|v| resolve(doc, v).and_then(as_number))
        .collect();

    match numbers.as_slice() {
        [llx, lly, urx, ury] if (urx - llx).abs() > 0.0 && (ury - lly).abs() > 0.0 => {
            [*llx, *lly, *urx, *ury]
        }
        _ => DEFAULT_MEDIA_BOX,
    }
}

/// Width and height of the page's MediaBox in points.
pub fn page_size(doc: &Document, page_id: ObjectId) -> (f32, f32) {
    let [llx, lly, urx, ury] = media_box(doc, page_id);
    ((urx - llx).abs(), (ury - lly).abs())
}

/// Rotation the page declares through `/Rotate`, inherited if necessary.
pub fn declared_rotation(doc: &Document, page_id: ObjectId) -> Rotation {
    inherited_attribute(doc, page_id, b"Rotate")
        .and_then(|o| o.as_i64().ok())
        .map(Rotation::from_pdf_value)
        .unwrap_or_default()
}

/// Whether an object is a node of the page tree (`/Page` or `/Pages`).
pub fn is_page_tree_node(object: &Object) -> bool {
    let dict = match object {
        Object::Dictionary(dict) => dict,
        _ => return false,
    };
    matches!(
        dict.get(b"Type").and_then(Object::as_name),
        Ok(b"Page") | Ok(b"Pages")
    )
}
