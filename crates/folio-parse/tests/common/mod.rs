//! Programmatic PDF fixtures built with lopdf.
//!
//! Shared by the integration tests of every folio crate; the others include
//! this file with `#[path]`.
//!
//! [`FixturePdf`] produces a document whose pages show the given lines of
//! text (one `BT … ET` text object per paragraph) and whose outline mirrors a
//! flat `(level, title, page)` list, nested by level.

#![allow(dead_code)]

use lopdf::{Dictionary, Object, ObjectId, Stream, dictionary};

/// One page: a list of paragraphs, each a list of lines.
pub type PageSpec = Vec<Vec<&'static str>>;

#[derive(Default)]
pub struct FixturePdf {
    pages: Vec<PageSpec>,
    outline: Vec<(usize, String, usize)>,
}

impl FixturePdf {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a page whose paragraphs are drawn top to bottom.
    pub fn page(mut self, paragraphs: PageSpec) -> Self {
        self.pages.push(paragraphs);
        self
    }

    /// Add `count` pages that each carry a single line of text.
    pub fn filler_pages(mut self, count: usize) -> Self {
        for _ in 0..count {
            self.pages.push(vec![vec!["Filler text."]]);
        }
        self
    }

    /// Add an outline entry. `level` is 1-based, `page` is 1-based.
    pub fn outline(mut self, level: usize, title: &str, page: usize) -> Self {
        self.outline.push((level, title.to_string(), page));
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut doc = lopdf::Document::with_version("1.5");
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let pages_id = doc.new_object_id();

        let mut page_ids = Vec::new();
        for paragraphs in &self.pages {
            let stream = Stream::new(dictionary! {}, content_stream(paragraphs).into_bytes());
            let content_id = doc.add_object(stream);
            let page = dictionary! {
                "Type" => "Page",
                "Parent" => Object::Reference(pages_id),
                "Contents" => Object::Reference(content_id),
                "Resources" => dictionary! {
                    "Font" => dictionary! { "F1" => Object::Reference(font_id) },
                },
            };
            page_ids.push(doc.add_object(page));
        }

        let kids: Vec<Object> = page_ids.iter().map(|id| Object::Reference(*id)).collect();
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => Object::Integer(page_ids.len() as i64),
                "MediaBox" => vec![Object::Integer(0), Object::Integer(0), Object::Integer(612), Object::Integer(792)],
            }),
        );

        let mut catalog = dictionary! {
            "Type" => "Catalog",
            "Pages" => Object::Reference(pages_id),
        };
        if !self.outline.is_empty() {
            let outlines_id = add_outline(&mut doc, &page_ids, &self.outline);
            catalog.set("Outlines", Object::Reference(outlines_id));
        }
        let catalog_id = doc.add_object(catalog);
        doc.trailer.set("Root", Object::Reference(catalog_id));

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    /// Build and write to a temporary file.
    pub fn write_temp(&self) -> tempfile::NamedTempFile {
        use std::io::Write;
        let mut tmp = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
        tmp.write_all(&self.build()).unwrap();
        tmp.flush().unwrap();
        tmp
    }
}

/// One text object per paragraph, 14pt leading, paragraphs 28pt apart.
fn content_stream(paragraphs: &[Vec<&str>]) -> String {
    let mut y = 740;
    let mut ops = String::new();
    for lines in paragraphs {
        ops.push_str(&format!("BT /F1 10 Tf 14 TL 72 {y} Td "));
        for (i, line) in lines.iter().enumerate() {
            if i > 0 {
                ops.push_str("T* ");
            }
            ops.push_str(&format!("({line}) Tj "));
        }
        ops.push_str("ET\n");
        y -= 14 * lines.len() as i64 + 28;
    }
    ops
}

/// Create a nested outline tree from a flat, level-annotated list.
fn add_outline(
    doc: &mut lopdf::Document,
    page_ids: &[ObjectId],
    entries: &[(usize, String, usize)],
) -> ObjectId {
    let outlines_id = doc.new_object_id();
    let ids: Vec<ObjectId> = entries.iter().map(|_| doc.new_object_id()).collect();

    // parent[i] = index of the enclosing entry, if any.
    let mut parent: Vec<Option<usize>> = Vec::with_capacity(entries.len());
    let mut stack: Vec<usize> = Vec::new();
    for (i, (level, _, _)) in entries.iter().enumerate() {
        while stack.last().is_some_and(|&top| entries[top].0 >= *level) {
            stack.pop();
        }
        parent.push(stack.last().copied());
        stack.push(i);
    }

    let children_of = |p: Option<usize>| -> Vec<usize> {
        (0..entries.len()).filter(|&i| parent[i] == p).collect()
    };

    for (i, (_, title, page)) in entries.iter().enumerate() {
        let mut dict = Dictionary::new();
        dict.set("Title", Object::string_literal(title.as_str()));
        dict.set(
            "Parent",
            Object::Reference(parent[i].map_or(outlines_id, |p| ids[p])),
        );
        dict.set(
            "Dest",
            vec![Object::Reference(page_ids[page - 1]), Object::Name(b"Fit".to_vec())],
        );
        let siblings = children_of(parent[i]);
        let pos = siblings.iter().position(|&s| s == i).unwrap();
        if pos > 0 {
            dict.set("Prev", Object::Reference(ids[siblings[pos - 1]]));
        }
        if let Some(&next) = siblings.get(pos + 1) {
            dict.set("Next", Object::Reference(ids[next]));
        }
        let children = children_of(Some(i));
        if let (Some(&first), Some(&last)) = (children.first(), children.last()) {
            dict.set("First", Object::Reference(ids[first]));
            dict.set("Last", Object::Reference(ids[last]));
            dict.set("Count", Object::Integer(children.len() as i64));
        }
        doc.objects.insert(ids[i], Object::Dictionary(dict));
    }

    let roots = children_of(None);
    let mut outlines = dictionary! { "Type" => "Outlines" };
    if let (Some(&first), Some(&last)) = (roots.first(), roots.last()) {
        outlines.set("First", Object::Reference(ids[first]));
        outlines.set("Last", Object::Reference(ids[last]));
        outlines.set("Count", Object::Integer(entries.len() as i64));
    }
    doc.objects.insert(outlines_id, Object::Dictionary(outlines));
    outlines_id
}
