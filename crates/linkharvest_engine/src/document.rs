//! Document access used by the harvester.
//!
//! The harvester only needs two things from a page: its link annotations and
//! the text that sits inside an arbitrary rectangle. [`Document`] captures
//! that surface; [`PdfDocument`] implements it on top of `lopdf`.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;

use encoding_rs::{UTF_16BE, WINDOWS_1252};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Object, ObjectId};

/// Slack (in points) applied around a link rectangle when matching text.
const RECT_TOLERANCE: f32 = 1.0;
/// Glyph advance, in em, assumed when the font has no width for a code.
const APPROX_GLYPH_ADVANCE: f32 = 0.5;
/// Height of a glyph's reference point above the baseline, in em.
const GLYPH_MID_HEIGHT: f32 = 0.3;
/// Default CID width of a composite font without `/DW`.
const DEFAULT_CID_WIDTH: f32 = 1000.0;
/// Kerning adjustments in a `TJ` array beyond this (thousandths of an em) read as a word gap.
const TJ_WORD_GAP: f32 = 200.0;
const MAX_PARENT_DEPTH: usize = 32;
const MAX_CMAP_RANGE: u32 = 0x1_0000;

/// Axis-aligned rectangle in PDF user space (origin bottom-left).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Rect {
    /// Builds a rectangle from two opposite corners in any order.
    pub fn new(ax: f32, ay: f32, bx: f32, by: f32) -> Self {
        Self {
            x0: ax.min(bx),
            y0: ay.min(by),
            x1: ax.max(bx),
            y1: ay.max(by),
        }
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x0 - RECT_TOLERANCE
            && x <= self.x1 + RECT_TOLERANCE
            && y >= self.y0 - RECT_TOLERANCE
            && y <= self.y1 + RECT_TOLERANCE
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinkAnnotation {
    pub uri: String,
    pub rect: Rect,
}

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("failed to open document {path}: {message}")]
    Open { path: String, message: String },
    #[error("page {0} is out of range")]
    PageOutOfRange(usize),
    #[error("page {page} is malformed: {message}")]
    Malformed { page: usize, message: String },
}

/// Read access to an ordered sequence of pages.
pub trait Document {
    fn page_count(&self) -> usize;

    /// Link annotations of a page, in annotation order.
    fn link_annotations(&self, page: usize) -> Result<Vec<LinkAnnotation>, DocumentError>;

    /// Text rendered inside `rect` on the given page.
    fn text_in_rect(&self, page: usize, rect: Rect) -> Result<String, DocumentError>;
}

/// One shown glyph, placed in user space by the centre of its box.
#[derive(Debug, Clone)]
struct PlacedGlyph {
    center: (f32, f32),
    text: String,
    /// Index of the text-showing operator that drew the glyph.
    run: usize,
}

/// Text of the glyphs whose centre falls in `rect`, in content order.
/// Glyphs from different show operators are separated by a space.
fn text_of_glyphs(glyphs: &[PlacedGlyph], rect: Rect) -> String {
    let mut text = String::new();
    let mut last_run = None;
    for glyph in glyphs.iter().filter(|g| rect.contains(g.center.0, g.center.1)) {
        if last_run.is_some_and(|run| run != glyph.run) {
            text.push(' ');
        }
        text.push_str(&glyph.text);
        last_run = Some(glyph.run);
    }
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub struct PdfDocument {
    doc: lopdf::Document,
    pages: Vec<ObjectId>,
    glyphs: RefCell<HashMap<usize, Vec<PlacedGlyph>>>,
}

impl PdfDocument {
    pub fn open(path: &Path) -> Result<Self, DocumentError> {
        let doc = lopdf::Document::load(path).map_err(|err| DocumentError::Open {
            path: path.display().to_string(),
            message: err.to_string(),
        })?;
        Ok(Self::from_lopdf(doc))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DocumentError> {
        let doc = lopdf::Document::load_mem(bytes).map_err(|err| DocumentError::Open {
            path: "<memory>".to_string(),
            message: err.to_string(),
        })?;
        Ok(Self::from_lopdf(doc))
    }

    fn from_lopdf(doc: lopdf::Document) -> Self {
        // get_pages is keyed by 1-based page number, so values come out in page order.
        let pages = doc.get_pages().into_values().collect();
        Self {
            doc,
            pages,
            glyphs: RefCell::new(HashMap::new()),
        }
    }

    fn page_id(&self, page: usize) -> Result<ObjectId, DocumentError> {
        self.pages
            .get(page)
            .copied()
            .ok_or(DocumentError::PageOutOfRange(page))
    }

    fn resolve<'a>(&'a self, obj: &'a Object) -> &'a Object {
        match obj {
            Object::Reference(id) => self.doc.get_object(*id).unwrap_or(obj),
            other => other,
        }
    }

    fn dict_entry<'a>(&'a self, dict: &'a Dictionary, key: &[u8]) -> Option<&'a Object> {
        dict.get(key).ok().map(|obj| self.resolve(obj))
    }

    /// Looks a key up on the page, then on its ancestors in the page tree.
    fn inherited(&self, page_id: ObjectId, key: &[u8]) -> Option<&Object> {
        let mut current = page_id;
        for _ in 0..MAX_PARENT_DEPTH {
            let dict = self.doc.get_dictionary(current).ok()?;
            if let Some(value) = self.dict_entry(dict, key) {
                return Some(value);
            }
            match dict.get(b"Parent").ok()? {
                Object::Reference(parent) => current = *parent,
                _ => return None,
            }
        }
        None
    }

    fn uri_action(&self, annot: &Dictionary) -> Option<String> {
        let Some(Object::Dictionary(action)) = self.dict_entry(annot, b"A") else {
            return None;
        };
        match self.dict_entry(action, b"S") {
            Some(Object::Name(name)) if name.as_slice() == b"URI" => {}
            _ => return None,
        }
        match self.dict_entry(action, b"URI") {
            Some(Object::String(bytes, _)) => {
                let uri = decode_pdf_string(bytes);
                let uri = uri.trim();
                (!uri.is_empty()).then(|| uri.to_string())
            }
            _ => None,
        }
    }

    fn page_fonts(&self, page_id: ObjectId) -> HashMap<Vec<u8>, FontDecoder> {
        let mut fonts = HashMap::new();
        let Some(Object::Dictionary(resources)) = self.inherited(page_id, b"Resources") else {
            return fonts;
        };
        let Some(Object::Dictionary(font_dict)) = self.dict_entry(resources, b"Font") else {
            return fonts;
        };
        for (name, obj) in font_dict.iter() {
            if let Object::Dictionary(font) = self.resolve(obj) {
                fonts.insert(name.clone(), self.font_decoder(font));
            }
        }
        fonts
    }

    fn font_decoder(&self, font: &Dictionary) -> FontDecoder {
        let composite = matches!(
            self.dict_entry(font, b"Subtype"),
            Some(Object::Name(name)) if name.as_slice() == b"Type0"
        );
        let to_unicode = match self.dict_entry(font, b"ToUnicode") {
            Some(Object::Stream(stream)) => {
                let data = stream
                    .decompressed_content()
                    .unwrap_or_else(|_| stream.content.clone());
                Some(parse_to_unicode(&data))
            }
            _ => None,
        };
        FontDecoder {
            code_width: if composite { 2 } else { 1 },
            composite,
            to_unicode,
            widths: if composite {
                self.cid_widths(font)
            } else {
                self.simple_widths(font)
            },
        }
    }

    /// `/FirstChar` plus `/Widths` of a simple font.
    fn simple_widths(&self, font: &Dictionary) -> GlyphWidths {
        let mut widths = GlyphWidths::default();
        let first = self.dict_entry(font, b"FirstChar").and_then(number);
        let Some(Object::Array(values)) = self.dict_entry(font, b"Widths") else {
            return widths;
        };
        let Some(first) = first.filter(|f| *f >= 0.0) else {
            return widths;
        };
        for (offset, value) in values.iter().enumerate() {
            if let Some(width) = number(self.resolve(value)) {
                widths.by_code.insert(first as u32 + offset as u32, width);
            }
        }
        widths
    }

    /// `/DW` and `/W` of the descendant font of a Type0 font.
    fn cid_widths(&self, font: &Dictionary) -> GlyphWidths {
        let mut widths = GlyphWidths {
            by_code: HashMap::new(),
            default: Some(DEFAULT_CID_WIDTH),
        };
        let descendant = match self.dict_entry(font, b"DescendantFonts") {
            Some(Object::Array(items)) => items.first().map(|item| self.resolve(item)),
            _ => None,
        };
        let Some(Object::Dictionary(descendant)) = descendant else {
            return widths;
        };
        if let Some(dw) = self.dict_entry(descendant, b"DW").and_then(number) {
            widths.default = Some(dw);
        }
        let Some(Object::Array(items)) = self.dict_entry(descendant, b"W") else {
            return widths;
        };
        let items: Vec<&Object> = items.iter().map(|item| self.resolve(item)).collect();
        let mut i = 0;
        while i + 1 < items.len() {
            let Some(first) = number(items[i]).filter(|f| *f >= 0.0) else {
                break;
            };
            let first = first as u32;
            match items[i + 1] {
                Object::Array(values) => {
                    for (offset, value) in values.iter().enumerate() {
                        if let Some(width) = number(self.resolve(value)) {
                            widths.by_code.insert(first + offset as u32, width);
                        }
                    }
                    i += 2;
                }
                last => {
                    let (Some(last), Some(width)) =
                        (number(last), items.get(i + 2).and_then(|w| number(w)))
                    else {
                        break;
                    };
                    let last = last.max(0.0) as u32;
                    if last < first || last - first > MAX_CMAP_RANGE {
                        break;
                    }
                    for code in first..=last {
                        widths.by_code.insert(code, width);
                    }
                    i += 3;
                }
            }
        }
        widths
    }

    fn extract_glyphs(&self, page: usize) -> Result<Vec<PlacedGlyph>, DocumentError> {
        let page_id = self.page_id(page)?;
        let malformed = |message: String| DocumentError::Malformed { page, message };
        let raw = self
            .doc
            .get_page_content(page_id)
            .map_err(|err| malformed(err.to_string()))?;
        let content = Content::decode(&raw).map_err(|err| malformed(err.to_string()))?;
        let fonts = self.page_fonts(page_id);
        let mut walker = TextWalker::new(&fonts);
        for op in &content.operations {
            walker.apply(op);
        }
        Ok(walker.glyphs)
    }
}

impl Document for PdfDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn link_annotations(&self, page: usize) -> Result<Vec<LinkAnnotation>, DocumentError> {
        let page_id = self.page_id(page)?;
        let page_dict = self
            .doc
            .get_dictionary(page_id)
            .map_err(|err| DocumentError::Malformed {
                page,
                message: err.to_string(),
            })?;
        let Some(Object::Array(items)) = self.dict_entry(page_dict, b"Annots") else {
            return Ok(Vec::new());
        };

        let mut links = Vec::new();
        for item in items {
            let Object::Dictionary(annot) = self.resolve(item) else {
                continue;
            };
            let is_link = matches!(
                self.dict_entry(annot, b"Subtype"),
                Some(Object::Name(name)) if name.as_slice() == b"Link"
            );
            if !is_link {
                continue;
            }
            let Some(uri) = self.uri_action(annot) else {
                continue;
            };
            let Some(rect) = self.dict_entry(annot, b"Rect").and_then(rect_from_object) else {
                continue;
            };
            links.push(LinkAnnotation { uri, rect });
        }
        Ok(links)
    }

    fn text_in_rect(&self, page: usize, rect: Rect) -> Result<String, DocumentError> {
        if !self.glyphs.borrow().contains_key(&page) {
            let extracted = self.extract_glyphs(page)?;
            self.glyphs.borrow_mut().insert(page, extracted);
        }
        let cache = self.glyphs.borrow();
        Ok(cache
            .get(&page)
            .map(|glyphs| text_of_glyphs(glyphs, rect))
            .unwrap_or_default())
    }
}

fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}

fn rect_from_object(obj: &Object) -> Option<Rect> {
    let Object::Array(values) = obj else {
        return None;
    };
    if values.len() != 4 {
        return None;
    }
    let nums: Vec<f32> = values.iter().filter_map(number).collect();
    if nums.len() != 4 {
        return None;
    }
    Some(Rect::new(nums[0], nums[1], nums[2], nums[3]))
}

/// PDF text strings: UTF-16BE when they carry a BOM, otherwise a single-byte encoding.
pub(crate) fn decode_pdf_string(bytes: &[u8]) -> String {
    if bytes.starts_with(&[0xFE, 0xFF]) {
        let (text, _) = UTF_16BE.decode_without_bom_handling(&bytes[2..]);
        return text.into_owned();
    }
    let (text, _) = WINDOWS_1252.decode_without_bom_handling(bytes);
    text.into_owned()
}

/// Glyph widths in thousandths of an em, keyed by character code.
#[derive(Debug, Default)]
struct GlyphWidths {
    by_code: HashMap<u32, f32>,
    default: Option<f32>,
}

impl GlyphWidths {
    fn get(&self, code: u32) -> Option<f32> {
        self.by_code.get(&code).copied().or(self.default)
    }
}

/// A glyph as decoded from a shown string, before it is placed.
#[derive(Debug, Clone, PartialEq)]
struct ShownGlyph {
    text: String,
    width: Option<f32>,
    /// Single-byte code 32, the only code word spacing applies to.
    word_break: bool,
}

/// Glyphs of a string shown without a known font.
fn plain_glyphs(bytes: &[u8]) -> Vec<ShownGlyph> {
    bytes
        .iter()
        .map(|b| ShownGlyph {
            text: decode_pdf_string(&[*b]),
            width: None,
            word_break: *b == b' ',
        })
        .collect()
}

struct FontDecoder {
    code_width: usize,
    composite: bool,
    to_unicode: Option<HashMap<u32, String>>,
    widths: GlyphWidths,
}

impl FontDecoder {
    fn glyphs(&self, bytes: &[u8]) -> Vec<ShownGlyph> {
        bytes
            .chunks(self.code_width)
            .map(|raw| {
                let code = raw.iter().fold(0u32, |acc, b| (acc << 8) | u32::from(*b));
                ShownGlyph {
                    text: self.text_of(code, raw),
                    width: self.widths.get(code),
                    word_break: raw == b" ",
                }
            })
            .collect()
    }

    fn text_of(&self, code: u32, raw: &[u8]) -> String {
        if let Some(text) = self.to_unicode.as_ref().and_then(|map| map.get(&code)) {
            return text.clone();
        }
        if self.composite {
            // CIDs are meaningless without a ToUnicode entry.
            return String::new();
        }
        decode_pdf_string(raw)
    }
}

type Matrix = [f32; 6];

const IDENTITY: Matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

/// Row-vector product `a × b`, the order PDF uses for concatenation.
fn multiply(a: &Matrix, b: &Matrix) -> Matrix {
    [
        a[0] * b[0] + a[1] * b[2],
        a[0] * b[1] + a[1] * b[3],
        a[2] * b[0] + a[3] * b[2],
        a[2] * b[1] + a[3] * b[3],
        a[4] * b[0] + a[5] * b[2] + b[4],
        a[4] * b[1] + a[5] * b[3] + b[5],
    ]
}

fn transform(m: &Matrix, x: f32, y: f32) -> (f32, f32) {
    (m[0] * x + m[2] * y + m[4], m[1] * x + m[3] * y + m[5])
}

fn translation(tx: f32, ty: f32) -> Matrix {
    [1.0, 0.0, 0.0, 1.0, tx, ty]
}

/// Walks content stream operators, tracking enough graphics and text state to
/// place each shown glyph in user space.
struct TextWalker<'a> {
    fonts: &'a HashMap<Vec<u8>, FontDecoder>,
    ctm: Matrix,
    ctm_stack: Vec<Matrix>,
    tm: Matrix,
    tlm: Matrix,
    leading: f32,
    font: Option<Vec<u8>>,
    font_size: f32,
    char_spacing: f32,
    word_spacing: f32,
    h_scale: f32,
    run: usize,
    glyphs: Vec<PlacedGlyph>,
}

impl<'a> TextWalker<'a> {
    fn new(fonts: &'a HashMap<Vec<u8>, FontDecoder>) -> Self {
        Self {
            fonts,
            ctm: IDENTITY,
            ctm_stack: Vec::new(),
            tm: IDENTITY,
            tlm: IDENTITY,
            leading: 0.0,
            font: None,
            font_size: 0.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            h_scale: 1.0,
            run: 0,
            glyphs: Vec::new(),
        }
    }

    fn apply(&mut self, op: &Operation) {
        let nums: Vec<f32> = op.operands.iter().filter_map(number).collect();
        match op.operator.as_str() {
            "q" => self.ctm_stack.push(self.ctm),
            "Q" => {
                if let Some(saved) = self.ctm_stack.pop() {
                    self.ctm = saved;
                }
            }
            "cm" if nums.len() == 6 => {
                let m = [nums[0], nums[1], nums[2], nums[3], nums[4], nums[5]];
                self.ctm = multiply(&m, &self.ctm);
            }
            "BT" => {
                self.tm = IDENTITY;
                self.tlm = IDENTITY;
            }
            "Tf" => {
                if let Some(Object::Name(name)) = op.operands.first() {
                    self.font = Some(name.clone());
                }
                if let Some(size) = op.operands.get(1).and_then(number) {
                    self.font_size = size;
                }
            }
            "TL" if !nums.is_empty() => self.leading = nums[0],
            "Tc" if !nums.is_empty() => self.char_spacing = nums[0],
            "Tw" if !nums.is_empty() => self.word_spacing = nums[0],
            "Tz" if !nums.is_empty() => self.h_scale = nums[0] / 100.0,
            "Td" if nums.len() == 2 => self.move_line(nums[0], nums[1]),
            "TD" if nums.len() == 2 => {
                self.leading = -nums[1];
                self.move_line(nums[0], nums[1]);
            }
            "Tm" if nums.len() == 6 => {
                self.tlm = [nums[0], nums[1], nums[2], nums[3], nums[4], nums[5]];
                self.tm = self.tlm;
            }
            "T*" => self.next_line(),
            "Tj" => {
                if let Some(Object::String(bytes, _)) = op.operands.first() {
                    self.run += 1;
                    self.show(bytes);
                }
            }
            "'" => {
                self.next_line();
                if let Some(Object::String(bytes, _)) = op.operands.first() {
                    self.run += 1;
                    self.show(bytes);
                }
            }
            "\"" => {
                if nums.len() >= 2 {
                    self.word_spacing = nums[0];
                    self.char_spacing = nums[1];
                }
                self.next_line();
                if let Some(Object::String(bytes, _)) = op.operands.get(2) {
                    self.run += 1;
                    self.show(bytes);
                }
            }
            "TJ" => {
                if let Some(Object::Array(items)) = op.operands.first() {
                    self.run += 1;
                    for item in items {
                        match item {
                            Object::String(bytes, _) => self.show(bytes),
                            other => {
                                if let Some(adjust) = number(other) {
                                    self.kern(adjust);
                                }
                            }
                        }
                    }
                }
            }
            _ => {}
        }
    }

    fn move_line(&mut self, tx: f32, ty: f32) {
        self.tlm = multiply(&translation(tx, ty), &self.tlm);
        self.tm = self.tlm;
    }

    fn next_line(&mut self) {
        self.move_line(0.0, -self.leading);
    }

    fn show(&mut self, bytes: &[u8]) {
        let glyphs = match self.font.as_ref().and_then(|name| self.fonts.get(name)) {
            Some(decoder) => decoder.glyphs(bytes),
            None => plain_glyphs(bytes),
        };
        for glyph in glyphs {
            self.place(glyph);
        }
    }

    fn place(&mut self, glyph: ShownGlyph) {
        let em = glyph.width.map_or(APPROX_GLYPH_ADVANCE, |w| w / 1000.0);
        let width = em * self.font_size;
        let center = self.point_at(width * self.h_scale / 2.0);
        let mut advance = width + self.char_spacing;
        if glyph.word_break {
            advance += self.word_spacing;
        }
        self.advance(advance * self.h_scale);
        if !glyph.text.is_empty() {
            self.glyphs.push(PlacedGlyph {
                center,
                text: glyph.text,
                run: self.run,
            });
        }
    }

    /// A `TJ` adjustment, in thousandths of an em; negative values move right.
    fn kern(&mut self, adjust: f32) {
        let shift = -adjust / 1000.0 * self.font_size * self.h_scale;
        if -adjust > TJ_WORD_GAP {
            // A wide gap reads as a word break; it sits at the middle of the gap.
            let center = self.point_at(shift / 2.0);
            self.glyphs.push(PlacedGlyph {
                center,
                text: " ".to_string(),
                run: self.run,
            });
        }
        self.advance(shift);
    }

    /// User-space point `dx` along the baseline from the current glyph origin,
    /// raised to mid glyph height.
    fn point_at(&self, dx: f32) -> (f32, f32) {
        let rendering = multiply(&self.tm, &self.ctm);
        transform(&rendering, dx, self.font_size * GLYPH_MID_HEIGHT)
    }

    fn advance(&mut self, tx: f32) {
        self.tm = multiply(&translation(tx, 0.0), &self.tm);
    }
}

#[derive(Debug, Clone, PartialEq)]
enum CmapToken {
    Hex(String),
    Word(String),
    ArrayStart,
    ArrayEnd,
}

fn tokenize_cmap(text: &str) -> Vec<CmapToken> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '<' if chars.peek() == Some(&'<') => {
                chars.next();
                tokens.push(CmapToken::Word("<<".to_string()));
            }
            '>' if chars.peek() == Some(&'>') => {
                chars.next();
                tokens.push(CmapToken::Word(">>".to_string()));
            }
            '<' => {
                let mut hex = String::new();
                for h in chars.by_ref() {
                    if h == '>' {
                        break;
                    }
                    if h.is_ascii_hexdigit() {
                        hex.push(h);
                    }
                }
                tokens.push(CmapToken::Hex(hex));
            }
            '[' => tokens.push(CmapToken::ArrayStart),
            ']' => tokens.push(CmapToken::ArrayEnd),
            '(' => {
                let mut depth = 1;
                for s in chars.by_ref() {
                    match s {
                        '(' => depth += 1,
                        ')' => {
                            depth -= 1;
                            if depth == 0 {
                                break;
                            }
                        }
                        _ => {}
                    }
                }
            }
            '%' => {
                for s in chars.by_ref() {
                    if s == '\n' || s == '\r' {
                        break;
                    }
                }
            }
            c if c.is_whitespace() => {}
            _ => {
                let mut word = String::from(c);
                while let Some(&next) = chars.peek() {
                    if next.is_whitespace() || matches!(next, '<' | '>' | '[' | ']' | '(' | '/')
                    {
                        break;
                    }
                    word.push(next);
                    chars.next();
                }
                tokens.push(CmapToken::Word(word));
            }
        }
    }
    tokens
}

fn hex_code(hex: &str) -> Option<u32> {
    if hex.is_empty() || hex.len() > 8 {
        return None;
    }
    u32::from_str_radix(hex, 16).ok()
}

fn hex_units(hex: &str) -> Vec<u16> {
    hex.as_bytes()
        .chunks(4)
        .filter_map(|chunk| std::str::from_utf8(chunk).ok())
        .filter_map(|unit| u16::from_str_radix(unit, 16).ok())
        .collect()
}

fn units_to_string(units: &[u16]) -> String {
    char::decode_utf16(units.iter().copied())
        .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}

/// Parses the `bfchar` and `bfrange` sections of a ToUnicode CMap.
fn parse_to_unicode(data: &[u8]) -> HashMap<u32, String> {
    let text = String::from_utf8_lossy(data);
    let tokens = tokenize_cmap(&text);
    let mut map = HashMap::new();
    let mut i = 0;
    while i < tokens.len() {
        match &tokens[i] {
            CmapToken::Word(word) if word == "beginbfchar" => {
                i += 1;
                while i + 1 < tokens.len() {
                    match (&tokens[i], &tokens[i + 1]) {
                        (CmapToken::Hex(src), CmapToken::Hex(dst)) => {
                            if let Some(code) = hex_code(src) {
                                map.insert(code, units_to_string(&hex_units(dst)));
                            }
                            i += 2;
                        }
                        _ => break,
                    }
                }
            }
            CmapToken::Word(word) if word == "beginbfrange" => {
                i += 1;
                while i + 2 < tokens.len() {
                    let (CmapToken::Hex(lo), CmapToken::Hex(hi)) = (&tokens[i], &tokens[i + 1])
                    else {
                        break;
                    };
                    let (Some(lo), Some(hi)) = (hex_code(lo), hex_code(hi)) else {
                        break;
                    };
                    if hi < lo || hi - lo > MAX_CMAP_RANGE {
                        break;
                    }
                    match &tokens[i + 2] {
                        CmapToken::Hex(dst) => {
                            let base = hex_units(dst);
                            for (offset, code) in (lo..=hi).enumerate() {
                                let mut units = base.clone();
                                if let Some(last) = units.last_mut() {
                                    *last = last.wrapping_add(offset as u16);
                                }
                                map.insert(code, units_to_string(&units));
                            }
                            i += 3;
                        }
                        CmapToken::ArrayStart => {
                            i += 3;
                            let mut code = lo;
                            while i < tokens.len() && tokens[i] != CmapToken::ArrayEnd {
                                if let CmapToken::Hex(dst) = &tokens[i] {
                                    if code <= hi {
                                        map.insert(code, units_to_string(&hex_units(dst)));
                                    }
                                    code += 1;
                                }
                                i += 1;
                            }
                            i += 1;
                        }
                        _ => break,
                    }
                }
            }
            _ => i += 1,
        }
    }
    map
}
