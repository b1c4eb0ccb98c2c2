//! Info dictionary of the exported document.

use lopdf::{Dictionary, Document, Object, ObjectId, StringFormat};
use chrono::{DateTime, Utc};

use crate::config::Metadata;

/// Value written to `/Producer` and `/Creator`.
pub const PRODUCER: &str = concat!("pagemerge ", env!("CARGO_PKG_VERSION"));

fn text(value: &str) -> Object {
    Object::String(value.as_bytes().to_vec(), StringFormat::Literal)
}

/// Add an Info dictionary carrying `metadata` to `doc` and link it from the
/// trailer. Nothing is written for empty metadata.
pub fn write_info(doc: &mut Document, metadata: &Metadata) -> Option<ObjectId> {
    if metadata.is_empty() {
        return None;
    }

    let mut info = Dictionary::new();
    let fields = [
        ("Title", &metadata.title),
        ("Author", &metadata.author),
        ("Subject", &metadata.subject),
        ("Keywords", &metadata.keywords),
    ];
    for (key, value) in fields {
        if let Some(value) = value {
            info.set(key, text(value));
        }
    }

    info.set("Producer", text(PRODUCER));
    info.set("Creator", text(PRODUCER));
    let now = pdf_date(Utc::now());
    info.set("CreationDate", text(&now));
    info.set("ModDate", text(&now));

    let info_id = doc.add_object(info);
    doc.trailer.set("Info", info_id);
    Some(info_id)
}

/// Read the Info dictionary of a document back into [`Metadata`].
pub fn read_info(doc: &Document) -> Metadata {
    let Some(info) = doc
        .trailer
        .get(b"Info")
        .and_then(Object::as_reference)
        .ok()
        .and_then(|id| doc.get_dictionary(id).ok())
    else {
        return Metadata::default();
    };

    let field = |key: &[u8]| match info.get(key) {
        Ok(Object::String(bytes, _)) => String::from_utf8(bytes.clone()).ok(),
        _ => None,
    };

    Metadata::new(
        field(b"Title"),
        field(b"Author"),
        field(b"Subject"),
        field(b"Keywords"),
    )
}

/// Format a timestamp as a PDF date (`D:YYYYMMDDHHmmSSZ`, UTC).
pub fn pdf_date(time: DateTime<Utc>) -> String {
    time.format("D:%Y%m%d%H%M%SZ").to_string()
}
