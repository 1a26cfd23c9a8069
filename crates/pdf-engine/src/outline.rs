//! Outline (bookmark) extraction.
//!
//! Walks the document's outline tree at the top level: the catalog's
//! `Outlines` dictionary and its `First`/`Next` sibling chain. Children are
//! not descended into; their presence is reported via `child_count`.

use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::HashSet;

/// One top-level outline entry.
#[derive(Debug, Clone, PartialEq)]
pub struct OutlineItem {
    pub title: String,
    /// Named or string destination, when the entry targets one.
    pub destination: Option<String>,
    /// Target of a URI action, when the entry carries one.
    pub uri: Option<String>,
    /// Action kind (the `/S` name, e.g. `URI` or `GoTo`).
    pub action: Option<String>,
    /// Raw `/Count` value; negative means the subtree is closed.
    pub child_count: i64,
}

pub(crate) fn extract_outline(doc: &Document) -> Vec<OutlineItem> {
    let Ok(catalog) = doc.catalog() else {
        return Vec::new();
    };
    let Some(outlines) = catalog.get(b"Outlines").ok().and_then(|obj| resolve_dict(doc, obj))
    else {
        return Vec::new();
    };

    let mut items = Vec::new();
    let mut visited: HashSet<ObjectId> = HashSet::new();
    let mut cursor = outlines.get(b"First").ok().cloned();

    while let Some(obj) = cursor {
        if let Object::Reference(id) = obj {
            // A malformed sibling chain can loop; stop at the first repeat.
            if !visited.insert(id) {
                break;
            }
        }

        let Some(dict) = resolve_dict(doc, &obj) else {
            break;
        };

        let next = dict.get(b"Next").ok().cloned();
        items.push(read_item(doc, dict));
        cursor = next;
    }

    items
}

fn read_item(doc: &Document, dict: &Dictionary) -> OutlineItem {
    let title = dict
        .get(b"Title")
        .ok()
        .and_then(|obj| match obj {
            Object::String(bytes, _) => Some(decode_text(bytes)),
            _ => None,
        })
        .unwrap_or_default();

    let destination = dict.get(b"Dest").ok().and_then(|obj| match obj {
        Object::Name(name) => Some(String::from_utf8_lossy(name).into_owned()),
        Object::String(bytes, _) => Some(decode_text(bytes)),
        _ => None,
    });

    let (action, uri) = match dict.get(b"A").ok().and_then(|obj| resolve_dict(doc, obj)) {
        Some(action_dict) => {
            let kind = action_dict.get(b"S").ok().and_then(|obj| match obj {
                Object::Name(name) => Some(String::from_utf8_lossy(name).into_owned()),
                _ => None,
            });
            let uri = action_dict.get(b"URI").ok().and_then(|obj| match obj {
                Object::String(bytes, _) => Some(decode_text(bytes)),
                _ => None,
            });
            (kind, uri)
        }
        None => (None, None),
    };

    let child_count =
        dict.get(b"Count").ok().and_then(|obj| obj.as_i64().ok()).unwrap_or(0);

    OutlineItem { title, destination, uri, action, child_count }
}

fn resolve_dict<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Dictionary> {
    match obj {
        Object::Reference(id) => doc.get_dictionary(*id).ok(),
        Object::Dictionary(dict) => Some(dict),
        _ => None,
    }
}

/// PDF text strings are UTF-16BE when they open with a BOM, otherwise treated
/// as byte text.
fn decode_text(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    } else {
        String::from_utf8_lossy(bytes).into_owned()
    }
}
