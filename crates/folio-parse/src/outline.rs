//! Document outline (bookmark) reading.
//!
//! Walks the catalog's `/Outlines` tree using `/First` and `/Next` links and
//! resolves each entry's destination to a 1-based page number.

use std::collections::{HashMap, HashSet};

use folio_core::OutlineItem;

use crate::decode::{catalog, decode_pdf_string, resolve, resolve_dict, string_from_dict};

/// Deepest outline nesting followed before giving up (cycle guard).
const MAX_DEPTH: usize = 64;
/// Most siblings read at one level (cycle guard).
const MAX_SIBLINGS: usize = 10_000;

/// Read the outline of `doc` in document order.
///
/// `page_numbers` maps page object ids to 1-based page numbers. Documents
/// without an outline yield an empty list.
pub(crate) fn read_outline(
    doc: &lopdf::Document,
    page_numbers: &HashMap<lopdf::ObjectId, usize>,
) -> Vec<OutlineItem> {
    let Some(outlines) = catalog(doc).and_then(|cat| resolve_dict(doc, cat, b"Outlines")) else {
        return Vec::new();
    };
    let Ok(lopdf::Object::Reference(first)) = outlines.get(b"First") else {
        return Vec::new();
    };

    let mut items = Vec::new();
    let mut visited = HashSet::new();
    walk(doc, *first, 1, page_numbers, &mut visited, &mut items);
    items
}

fn walk(
    doc: &lopdf::Document,
    first: lopdf::ObjectId,
    level: usize,
    page_numbers: &HashMap<lopdf::ObjectId, usize>,
    visited: &mut HashSet<lopdf::ObjectId>,
    items: &mut Vec<OutlineItem>,
) {
    if level > MAX_DEPTH {
        return;
    }

    let mut current = Some(first);
    let mut siblings = 0;
    while let Some(node_id) = current {
        if !visited.insert(node_id) || siblings >= MAX_SIBLINGS {
            break;
        }
        siblings += 1;

        let Ok(node) = doc.get_object(node_id).and_then(|obj| obj.as_dict()) else {
            break;
        };

        items.push(OutlineItem {
            level,
            title: string_from_dict(doc, node, b"Title").unwrap_or_default(),
            page: destination_page(doc, node, page_numbers),
        });

        if let Ok(lopdf::Object::Reference(child)) = node.get(b"First") {
            walk(doc, *child, level + 1, page_numbers, visited, items);
        }

        current = match node.get(b"Next") {
            Ok(lopdf::Object::Reference(next)) => Some(*next),
            _ => None,
        };
    }
}

/// Resolve an outline entry's page from `/Dest` or a GoTo action's `/D`.
fn destination_page(
    doc: &lopdf::Document,
    node: &lopdf::Dictionary,
    page_numbers: &HashMap<lopdf::ObjectId, usize>,
) -> Option<usize> {
    if let Ok(dest) = node.get(b"Dest") {
        if let Some(page) = dest_to_page(doc, dest, page_numbers, 0) {
            return Some(page);
        }
    }

    let action = resolve_dict(doc, node, b"A")?;
    match action.get(b"S") {
        Ok(lopdf::Object::Name(kind)) if kind.as_slice() == b"GoTo" => {
            dest_to_page(doc, action.get(b"D").ok()?, page_numbers, 0)
        }
        _ => None,
    }
}

/// Resolve an explicit or named destination to a page number.
fn dest_to_page(
    doc: &lopdf::Document,
    dest: &lopdf::Object,
    page_numbers: &HashMap<lopdf::ObjectId, usize>,
    hops: usize,
) -> Option<usize> {
    if hops > 4 {
        return None;
    }
    match resolve(doc, dest) {
        lopdf::Object::Array(arr) => match arr.first()? {
            lopdf::Object::Reference(page_ref) => page_numbers.get(page_ref).copied(),
            // Remote-style destinations carry a 0-based page index.
            lopdf::Object::Integer(index) if *index >= 0 => Some(*index as usize + 1),
            _ => None,
        },
        lopdf::Object::Dictionary(dict) => dest_to_page(doc, dict.get(b"D").ok()?, page_numbers, hops + 1),
        lopdf::Object::String(bytes, _) => {
            let target = named_destination(doc, &decode_pdf_string(bytes))?;
            dest_to_page(doc, target, page_numbers, hops + 1)
        }
        lopdf::Object::Name(name) => {
            let target = named_destination(doc, &String::from_utf8_lossy(name))?;
            dest_to_page(doc, target, page_numbers, hops + 1)
        }
        _ => None,
    }
}

/// Look up a named destination in `/Names /Dests` or the legacy `/Dests`.
fn named_destination<'a>(doc: &'a lopdf::Document, name: &str) -> Option<&'a lopdf::Object> {
    let cat = catalog(doc)?;

    if let Some(tree) = resolve_dict(doc, cat, b"Names").and_then(|names| resolve_dict(doc, names, b"Dests")) {
        if let Some(found) = lookup_name_tree(doc, tree, name, 0) {
            return Some(found);
        }
    }

    resolve_dict(doc, cat, b"Dests")?.get(name.as_bytes()).ok()
}

/// Search a name tree (`/Names` leaves, `/Kids` intermediates) for `name`.
fn lookup_name_tree<'a>(
    doc: &'a lopdf::Document,
    node: &'a lopdf::Dictionary,
    name: &str,
    depth: usize,
) -> Option<&'a lopdf::Object> {
    if depth > MAX_DEPTH {
        return None;
    }

    if let Ok(names) = node.get(b"Names").map(|obj| resolve(doc, obj)) {
        if let Ok(pairs) = names.as_array() {
            for pair in pairs.chunks_exact(2) {
                if let lopdf::Object::String(key, _) = resolve(doc, &pair[0]) {
                    if decode_pdf_string(key) == name {
                        return Some(&pair[1]);
                    }
                }
            }
        }
    }

    let kids = node.get(b"Kids").ok().map(|obj| resolve(doc, obj))?;
    for kid in kids.as_array().ok()? {
        if let Ok(kid_dict) = resolve(doc, kid).as_dict() {
            if let Some(found) = lookup_name_tree(doc, kid_dict, name, depth + 1) {
                return Some(found);
            }
        }
    }
    None
}
