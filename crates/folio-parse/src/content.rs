//! Text object collection from page content streams.
//!
//! A deliberately small interpreter: it tracks the text matrix through the
//! text positioning operators, the CTM through `q`/`Q`/`cm`, and descends
//! into Form XObjects drawn with `Do`. Every shown string is decoded through
//! its font and recorded with its baseline origin in page space. Each
//! `BT … ET` text object becomes one [`TextObject`], whose shown strings are
//! grouped into lines by baseline. Glyph widths are not read from font
//! programs; a string's advance is estimated from the font size.

use std::collections::HashMap;
use std::rc::Rc;

use lopdf::content::{Content, Operation};
use tracing::{debug, warn};

use crate::decode::{decode_pdf_string, object_to_f64, resolve, stream_bytes};
use crate::font::{Decoded, Font};

/// Estimated glyph advance as a fraction of the font size.
const GLYPH_ADVANCE: f64 = 0.5;
/// Descender depth below the baseline as a fraction of the font size.
const DESCENT: f64 = 0.2;
/// Baselines closer than this (in points) belong to the same line.
const BASELINE_TOLERANCE: f64 = 0.5;
/// `TJ` adjustments at or beyond this many thousandths of an em read as a space.
const TJ_SPACE_THRESHOLD: f64 = 250.0;
/// Deepest Form XObject nesting followed.
const MAX_FORM_DEPTH: usize = 5;

/// A 2D affine matrix `[a b c d e f]`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Matrix {
    a: f64,
    b: f64,
    c: f64,
    d: f64,
    e: f64,
    f: f64,
}

impl Matrix {
    const IDENTITY: Matrix = Matrix {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    /// Six numeric operands, as taken by `cm`, `Tm` and `/Matrix`.
    fn from_operands(operands: &[lopdf::Object]) -> Option<Matrix> {
        let [a, b, c, d, e, f] = operands else {
            return None;
        };
        Some(Matrix {
            a: object_to_f64(a)?,
            b: object_to_f64(b)?,
            c: object_to_f64(c)?,
            d: object_to_f64(d)?,
            e: object_to_f64(e)?,
            f: object_to_f64(f)?,
        })
    }

    /// `self × other`.
    fn multiply(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    /// `translate(tx, ty) × self`.
    fn translated(&self, tx: f64, ty: f64) -> Matrix {
        Matrix {
            e: tx * self.a + ty * self.c + self.e,
            f: tx * self.b + ty * self.d + self.f,
            ..*self
        }
    }

    fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            x * self.a + y * self.c + self.e,
            x * self.b + y * self.d + self.f,
        )
    }

    /// Vertical scale applied to glyphs.
    fn vertical_scale(&self) -> f64 {
        let scale = (self.b * self.b + self.d * self.d).sqrt();
        if scale > 0.0 { scale } else { 1.0 }
    }
}

/// One line of shown text inside a text object.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TextLine {
    pub text: String,
    pub x0: f64,
    pub x1: f64,
    /// Baseline in PDF user space (bottom-left origin).
    pub baseline: f64,
    /// Effective font size.
    pub size: f64,
}

/// The text shown inside one `BT … ET` pair.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct TextObject {
    pub lines: Vec<TextLine>,
}

impl TextObject {
    /// Lines joined with newlines.
    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(|line| line.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// `[x0, top, x1, bottom]` with a top-left origin on a page `page_height` tall.
    pub fn bbox(&self, page_height: f64) -> Option<[f64; 4]> {
        let first = self.lines.first()?;
        let mut x0 = first.x0;
        let mut x1 = first.x1;
        let mut top = f64::MAX;
        let mut bottom = f64::MIN;
        for line in &self.lines {
            x0 = x0.min(line.x0);
            x1 = x1.max(line.x1);
            top = top.min(page_height - (line.baseline + line.size * (1.0 - DESCENT)));
            bottom = bottom.max(page_height - (line.baseline - line.size * DESCENT));
        }
        Some([round2(x0), round2(top), round2(x1), round2(bottom)])
    }

    /// Record `text` drawn from `origin` to `x_end` on the same baseline.
    fn show(&mut self, text: &str, origin: (f64, f64), x_end: f64, size: f64) {
        let (x, y) = origin;
        let (left, right) = (x.min(x_end), x.max(x_end));
        match self.lines.last_mut() {
            Some(line) if (line.baseline - y).abs() <= BASELINE_TOLERANCE => {
                if left > line.x1 + size * 0.15 && !line.text.ends_with(' ') && !text.starts_with(' ')
                {
                    line.text.push(' ');
                }
                line.text.push_str(text);
                line.x0 = line.x0.min(left);
                line.x1 = line.x1.max(right);
            }
            _ => self.lines.push(TextLine {
                text: text.to_string(),
                x0: left,
                x1: right,
                baseline: y,
                size,
            }),
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Text state carried across operators.
struct TextState {
    font: Option<Rc<Font>>,
    font_size: f64,
    leading: f64,
    text_matrix: Matrix,
    line_matrix: Matrix,
    current: Option<TextObject>,
}

impl TextState {
    fn new() -> Self {
        Self {
            font: None,
            font_size: 0.0,
            leading: 0.0,
            text_matrix: Matrix::IDENTITY,
            line_matrix: Matrix::IDENTITY,
            current: None,
        }
    }

    fn begin_text(&mut self) {
        self.text_matrix = Matrix::IDENTITY;
        self.line_matrix = Matrix::IDENTITY;
        self.current = Some(TextObject::default());
    }

    fn move_text_position(&mut self, tx: f64, ty: f64) {
        self.line_matrix = self.line_matrix.translated(tx, ty);
        self.text_matrix = self.line_matrix;
    }

    fn move_to_next_line(&mut self) {
        let leading = self.leading;
        self.move_text_position(0.0, -leading);
    }

    fn font_size_or_unit(&self) -> f64 {
        if self.font_size > 0.0 { self.font_size } else { 1.0 }
    }

    /// Apply a `TJ` kerning adjustment in thousandths of an em.
    fn adjust(&mut self, thousandths: f64) {
        if -thousandths >= TJ_SPACE_THRESHOLD {
            if let Some(line) = self.current.as_mut().and_then(|obj| obj.lines.last_mut()) {
                if !line.text.ends_with(' ') {
                    line.text.push(' ');
                }
            }
        }
        let tx = -thousandths / 1000.0 * self.font_size;
        self.text_matrix = self.text_matrix.translated(tx, 0.0);
    }
}

/// Graphics state parameters saved by `q` and restored by `Q`.
struct SavedState {
    ctm: Matrix,
    font: Option<Rc<Font>>,
    font_size: f64,
    leading: f64,
}

/// Interpreter over one page, including the Form XObjects it draws.
struct ContentWalker<'a> {
    doc: &'a lopdf::Document,
    /// Fonts loaded so far, by object id.
    fonts: HashMap<lopdf::ObjectId, Rc<Font>>,
    text: TextState,
    ctm: Matrix,
    saved: Vec<SavedState>,
    /// Form XObjects currently being drawn, outermost first.
    forms: Vec<lopdf::ObjectId>,
    objects: Vec<TextObject>,
}

impl<'a> ContentWalker<'a> {
    fn new(doc: &'a lopdf::Document) -> Self {
        Self {
            doc,
            fonts: HashMap::new(),
            text: TextState::new(),
            ctm: Matrix::IDENTITY,
            saved: Vec::new(),
            forms: Vec::new(),
            objects: Vec::new(),
        }
    }

    fn save(&mut self) {
        self.saved.push(SavedState {
            ctm: self.ctm,
            font: self.text.font.clone(),
            font_size: self.text.font_size,
            leading: self.text.leading,
        });
    }

    fn restore(&mut self) {
        // Unbalanced `Q` is ignored.
        if let Some(saved) = self.saved.pop() {
            self.ctm = saved.ctm;
            self.text.font = saved.font;
            self.text.font_size = saved.font_size;
            self.text.leading = saved.leading;
        }
    }

    fn end_text(&mut self) {
        if let Some(object) = self.text.current.take() {
            if !object.lines.is_empty() {
                self.objects.push(object);
            }
        }
    }

    /// Resolve `/Resources /Font /<name>`, loading each font object once.
    fn font(&mut self, resources: Option<&'a lopdf::Dictionary>, name: &[u8]) -> Option<Rc<Font>> {
        let doc = self.doc;
        let entry = resources
            .and_then(|res| res.get(b"Font").ok())
            .and_then(|obj| resolve(doc, obj).as_dict().ok())
            .and_then(|fonts| fonts.get(name).ok())?;
        let id = match entry {
            lopdf::Object::Reference(id) => Some(*id),
            _ => None,
        };
        if let Some(font) = id.and_then(|id| self.fonts.get(&id)) {
            return Some(Rc::clone(font));
        }
        let font = Rc::new(Font::load(doc, resolve(doc, entry).as_dict().ok()?));
        if let Some(id) = id {
            self.fonts.insert(id, Rc::clone(&font));
        }
        Some(font)
    }

    fn show(&mut self, bytes: &[u8]) {
        let Decoded { text, glyphs } = match &self.text.font {
            Some(font) => font.decode(bytes),
            None => {
                let text = decode_pdf_string(bytes);
                Decoded {
                    glyphs: text.chars().count(),
                    text,
                }
            }
        };
        if glyphs == 0 {
            return;
        }
        let font_size = self.text.font_size_or_unit();
        let width = glyphs as f64 * GLYPH_ADVANCE * font_size;
        let rendering = self.text.text_matrix.multiply(&self.ctm);
        if !text.is_empty() {
            let origin = rendering.apply(0.0, 0.0);
            let (x_end, _) = rendering.apply(width, 0.0);
            let size = font_size * rendering.vertical_scale();
            self.text
                .current
                .get_or_insert_with(TextObject::default)
                .show(&text, origin, x_end, size);
        }
        self.text.text_matrix = self.text.text_matrix.translated(width, 0.0);
    }

    /// Draw `/Resources /XObject /<name>` if it is a Form XObject.
    fn draw_xobject(&mut self, resources: Option<&'a lopdf::Dictionary>, name: &[u8]) {
        let doc = self.doc;
        let label = String::from_utf8_lossy(name);
        let Some(lopdf::Object::Reference(id)) = resources
            .and_then(|res| res.get(b"XObject").ok())
            .and_then(|obj| resolve(doc, obj).as_dict().ok())
            .and_then(|xobjects| xobjects.get(name).ok())
        else {
            debug!(xobject = %label, "Do names no XObject resource");
            return;
        };
        let Ok(stream) = doc.get_object(*id).and_then(lopdf::Object::as_stream) else {
            return;
        };
        let is_form = stream
            .dict
            .get(b"Subtype")
            .and_then(lopdf::Object::as_name)
            .is_ok_and(|subtype| subtype == b"Form");
        if !is_form {
            return;
        }
        if self.forms.contains(id) || self.forms.len() >= MAX_FORM_DEPTH {
            warn!(xobject = %label, depth = self.forms.len(), "skipping recursive Form XObject");
            return;
        }

        let content = match stream_bytes(stream).map(|bytes| Content::decode(&bytes)) {
            Ok(Ok(content)) => content,
            Ok(Err(err)) | Err(err) => {
                warn!(xobject = %label, %err, "skipping unreadable Form XObject");
                return;
            }
        };
        let form_resources = stream
            .dict
            .get(b"Resources")
            .ok()
            .and_then(|obj| resolve(doc, obj).as_dict().ok())
            .or(resources);

        self.save();
        if let Some(matrix) = stream
            .dict
            .get(b"Matrix")
            .ok()
            .and_then(|obj| resolve(doc, obj).as_array().ok())
            .and_then(|items| Matrix::from_operands(items))
        {
            self.ctm = matrix.multiply(&self.ctm);
        }
        self.forms.push(*id);
        self.walk(&content.operations, form_resources);
        self.forms.pop();
        self.restore();
    }

    fn walk(&mut self, operations: &[Operation], resources: Option<&'a lopdf::Dictionary>) {
        for op in operations {
            let operands = op.operands.as_slice();
            match op.operator.as_str() {
                "q" => self.save(),
                "Q" => self.restore(),
                "cm" => {
                    if let Some(matrix) = Matrix::from_operands(operands) {
                        self.ctm = matrix.multiply(&self.ctm);
                    }
                }
                "Do" => {
                    if let Some(lopdf::Object::Name(name)) = operands.first() {
                        self.draw_xobject(resources, name);
                    }
                }
                "BT" => self.text.begin_text(),
                "ET" => self.end_text(),
                "Tf" => {
                    if let Some(lopdf::Object::Name(name)) = operands.first() {
                        self.text.font = self.font(resources, name);
                        if self.text.font.is_none() {
                            debug!(font = %String::from_utf8_lossy(name), "font resource not found");
                        }
                    }
                    if let Some(size) = operand(operands, 1) {
                        self.text.font_size = size;
                    }
                }
                "TL" => {
                    if let Some(leading) = operand(operands, 0) {
                        self.text.leading = leading;
                    }
                }
                "Tm" => {
                    if let Some(matrix) = Matrix::from_operands(operands) {
                        self.text.text_matrix = matrix;
                        self.text.line_matrix = matrix;
                    }
                }
                "Td" => {
                    let tx = operand(operands, 0).unwrap_or(0.0);
                    let ty = operand(operands, 1).unwrap_or(0.0);
                    self.text.move_text_position(tx, ty);
                }
                "TD" => {
                    let tx = operand(operands, 0).unwrap_or(0.0);
                    let ty = operand(operands, 1).unwrap_or(0.0);
                    self.text.leading = -ty;
                    self.text.move_text_position(tx, ty);
                }
                "T*" => self.text.move_to_next_line(),
                "Tj" => {
                    if let Some(bytes) = operands.first().and_then(string_bytes) {
                        self.show(bytes);
                    }
                }
                "'" => {
                    self.text.move_to_next_line();
                    if let Some(bytes) = operands.first().and_then(string_bytes) {
                        self.show(bytes);
                    }
                }
                "\"" => {
                    self.text.move_to_next_line();
                    if let Some(bytes) = operands.get(2).and_then(string_bytes) {
                        self.show(bytes);
                    }
                }
                "TJ" => {
                    let Some(lopdf::Object::Array(items)) = operands.first() else {
                        continue;
                    };
                    for item in items {
                        if let Some(bytes) = string_bytes(item) {
                            self.show(bytes);
                        } else if let Some(adjustment) = object_to_f64(item) {
                            self.text.adjust(adjustment);
                        }
                    }
                }
                _ => {}
            }
        }
    }
}

fn operand(operands: &[lopdf::Object], index: usize) -> Option<f64> {
    operands.get(index).and_then(object_to_f64)
}

fn string_bytes(obj: &lopdf::Object) -> Option<&[u8]> {
    match obj {
        lopdf::Object::String(bytes, _) => Some(bytes),
        _ => None,
    }
}

/// Collect the non-empty text objects of a decoded content stream, in order.
///
/// `resources` is the page's (possibly inherited) `/Resources` dictionary;
/// fonts and XObjects are looked up there.
pub(crate) fn collect_text_objects(
    doc: &lopdf::Document,
    resources: Option<&lopdf::Dictionary>,
    operations: &[Operation],
) -> Vec<TextObject> {
    let mut walker = ContentWalker::new(doc);
    walker.walk(operations, resources);
    // Unterminated text object at end of stream.
    walker.end_text();
    walker.objects
}
