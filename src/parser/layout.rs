//! Content stream interpretation and line layout.
//!
//! Walks a page's content stream, tracking the graphics and text state, and
//! records every text-showing operation as a [`GlyphRun`] and every image
//! `Do` as a bounding box. Runs are then grouped into visual lines in reading
//! order, which become the page's [`TextSpan`]s.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::error::Result;
use crate::model::{BoundingBox, TextSpan};

use super::backend::{ContentOp, PageId, PdfBackend, PdfValue};

/// Average glyph advance as a fraction of the font size. Used to estimate
/// run widths since glyph metrics are not read.
const AVG_GLYPH_WIDTH: f32 = 0.5;

/// TJ adjustment (thousandths of an em) above which a word gap is assumed.
const TJ_SPACE_THRESHOLD: f32 = 200.0;

/// A single text-showing operation positioned on the page (PDF coordinates,
/// y grows upwards).
#[derive(Debug, Clone)]
pub struct GlyphRun {
    /// The decoded text
    pub text: String,
    /// X position (left edge)
    pub x: f32,
    /// Y position (baseline)
    pub y: f32,
    /// Estimated width of the text
    pub width: f32,
    /// Effective font size in points
    pub font_size: f32,
    /// Base font name (e.g., "Helvetica-Bold")
    pub font_name: String,
    /// Whether the font appears to be bold
    pub is_bold: bool,
    /// Whether the font appears to be italic
    pub is_italic: bool,
}

impl GlyphRun {
    /// Create a run, estimating its width and deriving style from the font name.
    pub fn new(text: String, x: f32, y: f32, font_size: f32, font_name: String) -> Self {
        let lower = font_name.to_lowercase();
        let is_bold = lower.contains("bold") || lower.contains("black") || lower.contains("heavy");
        let is_italic = lower.contains("italic") || lower.contains("oblique");
        let width = text.chars().count() as f32 * font_size * AVG_GLYPH_WIDTH;

        Self {
            text,
            x,
            y,
            width,
            font_size,
            font_name,
            is_bold,
            is_italic,
        }
    }

    /// Right edge of the run.
    pub fn right(&self) -> f32 {
        self.x + self.width
    }
}

/// Raw layout of one page before line grouping.
#[derive(Debug, Clone, Default)]
pub struct PageLayout {
    pub runs: Vec<GlyphRun>,
    /// Image placements in PDF coordinates (y up)
    pub images: Vec<BoundingBox>,
}

/// 2D affine transform `[a b c d e f]` as used by PDF.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Matrix {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    e: f32,
    f: f32,
}

impl Default for Matrix {
    fn default() -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)
    }
}

impl Matrix {
    fn new(a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) -> Self {
        Self { a, b, c, d, e, f }
    }

    fn from_op(op: &ContentOp) -> Option<Self> {
        Some(Self::new(
            op.number(0)?,
            op.number(1)?,
            op.number(2)?,
            op.number(3)?,
            op.number(4)?,
            op.number(5)?,
        ))
    }

    fn translation(tx: f32, ty: f32) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    /// `self` applied first, then `other`.
    fn then(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (
            x * self.a + y * self.c + self.e,
            x * self.b + y * self.d + self.f,
        )
    }

    /// Vertical scale factor.
    fn scale(&self) -> f32 {
        (self.c * self.c + self.d * self.d).sqrt()
    }
}

/// Text state tracked between `BT` and `ET`.
#[derive(Debug, Clone)]
struct TextState {
    matrix: Matrix,
    line_matrix: Matrix,
    font_key: Vec<u8>,
    font_name: String,
    font_size: f32,
    leading: f32,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            matrix: Matrix::default(),
            line_matrix: Matrix::default(),
            font_key: Vec::new(),
            font_name: String::new(),
            font_size: 12.0,
            leading: 0.0,
        }
    }
}

impl TextState {
    fn move_line(&mut self, tx: f32, ty: f32) {
        self.line_matrix = Matrix::translation(tx, ty).then(&self.line_matrix);
        self.matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        let leading = if self.leading != 0.0 {
            self.leading
        } else {
            self.font_size * 1.2
        };
        self.move_line(0.0, -leading);
    }

    fn advance(&mut self, tx: f32) {
        self.matrix = Matrix::translation(tx, 0.0).then(&self.matrix);
    }
}

/// Interprets one page's content stream.
pub struct ContentInterpreter<'a, B: PdfBackend + ?Sized> {
    backend: &'a B,
    page: PageId,
    fonts: HashMap<Vec<u8>, String>,
    images: std::collections::HashSet<Vec<u8>>,
}

impl<'a, B: PdfBackend + ?Sized> ContentInterpreter<'a, B> {
    /// Prepare an interpreter for `page`, loading its font and image resources.
    pub fn new(backend: &'a B, page: PageId) -> Result<Self> {
        let fonts = backend
            .page_fonts(page)?
            .into_iter()
            .map(|f| (f.name, f.base_font))
            .collect();
        let images = backend.image_xobjects(page);
        Ok(Self {
            backend,
            page,
            fonts,
            images,
        })
    }

    /// Run the page's content stream.
    pub fn run(&self) -> Result<PageLayout> {
        let data = self.backend.page_content(self.page)?;
        if data.is_empty() {
            return Ok(PageLayout::default());
        }
        let ops = self.backend.decode_content(&data)?;
        Ok(self.interpret(&ops))
    }

    fn interpret(&self, ops: &[ContentOp]) -> PageLayout {
        let mut layout = PageLayout::default();
        let mut ctm = Matrix::default();
        let mut ctm_stack: Vec<Matrix> = Vec::new();
        let mut text = TextState::default();
        let mut in_text_block = false;

        for op in ops {
            match op.operator.as_str() {
                "q" => ctm_stack.push(ctm),
                "Q" => {
                    if let Some(saved) = ctm_stack.pop() {
                        ctm = saved;
                    }
                }
                "cm" => {
                    if let Some(m) = Matrix::from_op(op) {
                        ctm = m.then(&ctm);
                    }
                }
                "BT" => {
                    in_text_block = true;
                    text.matrix = Matrix::default();
                    text.line_matrix = Matrix::default();
                }
                "ET" => in_text_block = false,
                "Tf" => {
                    if let Some(PdfValue::Name(key)) = op.operands.first() {
                        text.font_name = self
                            .fonts
                            .get(key)
                            .cloned()
                            .unwrap_or_else(|| String::from_utf8_lossy(key).to_string());
                        text.font_key = key.clone();
                    }
                    if let Some(size) = op.number(1) {
                        text.font_size = size;
                    }
                }
                "TL" => {
                    if let Some(leading) = op.number(0) {
                        text.leading = leading;
                    }
                }
                "Td" => {
                    if let (Some(tx), Some(ty)) = (op.number(0), op.number(1)) {
                        text.move_line(tx, ty);
                    }
                }
                "TD" => {
                    if let (Some(tx), Some(ty)) = (op.number(0), op.number(1)) {
                        text.leading = -ty;
                        text.move_line(tx, ty);
                    }
                }
                "Tm" => {
                    if let Some(m) = Matrix::from_op(op) {
                        text.matrix = m;
                        text.line_matrix = m;
                    }
                }
                "T*" => text.next_line(),
                "Tj" | "TJ" | "'" | "\"" => {
                    if op.operator == "'" || op.operator == "\"" {
                        text.next_line();
                    }
                    if in_text_block {
                        self.show_text(op, &mut text, &ctm, &mut layout.runs);
                    }
                }
                "Do" => {
                    if let Some(PdfValue::Name(name)) = op.operands.first() {
                        if self.images.contains(name) {
                            layout.images.push(unit_square(&ctm));
                        }
                    }
                }
                _ => {}
            }
        }

        layout
    }

    fn show_text(
        &self,
        op: &ContentOp,
        state: &mut TextState,
        ctm: &Matrix,
        runs: &mut Vec<GlyphRun>,
    ) {
        let decode = |bytes: &[u8]| self.backend.decode_text(self.page, &state.font_key, bytes);

        let decoded = match op.operator.as_str() {
            "TJ" => match op.operands.first() {
                Some(PdfValue::Array(items)) => {
                    let mut combined = String::new();
                    for item in items {
                        match item {
                            PdfValue::Str(bytes) => combined.push_str(&decode(bytes)),
                            PdfValue::Integer(_) | PdfValue::Real(_) => {
                                let adjustment =
                                    -super::backend::get_number_from_value(item).unwrap_or(0.0);
                                if adjustment > TJ_SPACE_THRESHOLD && needs_space(&combined) {
                                    combined.push(' ');
                                }
                            }
                            _ => {}
                        }
                    }
                    combined
                }
                _ => String::new(),
            },
            "\"" => match op.operands.get(2) {
                Some(PdfValue::Str(bytes)) => decode(bytes),
                _ => String::new(),
            },
            _ => match op.operands.first() {
                Some(PdfValue::Str(bytes)) => decode(bytes),
                _ => String::new(),
            },
        };

        let advance = decoded.chars().count() as f32 * state.font_size * AVG_GLYPH_WIDTH;
        if !decoded.trim().is_empty() {
            let device = state.matrix.then(ctm);
            let (x, y) = device.apply(0.0, 0.0);
            let size = state.font_size * device.scale();
            runs.push(GlyphRun::new(decoded, x, y, size, state.font_name.clone()));
        }
        state.advance(advance);
    }
}

fn needs_space(text: &str) -> bool {
    match text.chars().last() {
        Some(c) => !c.is_whitespace() && c != '\u{00A0}' && !is_spaceless_script_char(c),
        None => false,
    }
}

/// Image XObjects are drawn into the unit square mapped through the CTM.
fn unit_square(ctm: &Matrix) -> BoundingBox {
    let corners = [
        ctm.apply(0.0, 0.0),
        ctm.apply(1.0, 0.0),
        ctm.apply(0.0, 1.0),
        ctm.apply(1.0, 1.0),
    ];
    let min_x = corners.iter().map(|c| c.0).fold(f32::INFINITY, f32::min);
    let max_x = corners.iter().map(|c| c.0).fold(f32::NEG_INFINITY, f32::max);
    let min_y = corners.iter().map(|c| c.1).fold(f32::INFINITY, f32::min);
    let max_y = corners.iter().map(|c| c.1).fold(f32::NEG_INFINITY, f32::max);
    BoundingBox::new(min_x, min_y, max_x, max_y)
}

/// A text line composed of runs on the same baseline.
#[derive(Debug, Clone)]
pub struct TextLine {
    /// The runs in this line, sorted by X position
    pub runs: Vec<GlyphRun>,
    /// Y position (baseline)
    pub y: f32,
    /// Leftmost X position
    pub x: f32,
}

impl TextLine {
    /// Create a line from runs, sorting them left to right.
    pub fn from_runs(mut runs: Vec<GlyphRun>) -> Self {
        runs.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal));
        let y = runs.first().map(|r| r.y).unwrap_or(0.0);
        let x = runs.first().map(|r| r.x).unwrap_or(0.0);
        Self { runs, y, x }
    }

    /// Combined text, inserting a space where the gap between runs is wide
    /// enough and neither side is a spaceless script.
    pub fn text(&self) -> String {
        let mut result = String::new();

        for (i, run) in self.runs.iter().enumerate() {
            if i > 0 {
                let prev = &self.runs[i - 1];
                let gap = run.x - prev.right();
                let threshold = run.font_size * AVG_GLYPH_WIDTH * 0.2;
                let prev_cjk = prev.text.chars().last().is_some_and(is_spaceless_script_char);
                let curr_cjk = run.text.chars().next().is_some_and(is_spaceless_script_char);
                let has_space = prev.text.ends_with(char::is_whitespace)
                    || run.text.starts_with(char::is_whitespace);

                if gap > threshold && !(prev_cjk && curr_cjk) && !has_space {
                    result.push(' ');
                }
            }
            result.push_str(&run.text);
        }

        result
    }

    /// The run covering the most characters; its font stands for the line.
    fn dominant_run(&self) -> Option<&GlyphRun> {
        self.runs.iter().max_by_key(|r| r.text.chars().count())
    }

    /// Check if the line is predominantly bold.
    pub fn is_bold(&self) -> bool {
        let total: usize = self.runs.iter().map(|r| r.text.chars().count()).sum();
        let bold: usize = self
            .runs
            .iter()
            .filter(|r| r.is_bold)
            .map(|r| r.text.chars().count())
            .sum();
        total > 0 && bold as f32 / total as f32 > 0.5
    }

    /// Convert to a top-down [`TextSpan`] on `page`.
    pub fn into_span(self, page: u32, page_height: f32) -> Option<TextSpan> {
        let text = self.text();
        let dominant = self.dominant_run()?;
        let bold = self.is_bold();
        let italic = dominant.is_italic;
        let font_size = dominant.font_size;
        let font_name = dominant.font_name.clone();

        let mut span = TextSpan::new(text, font_size, font_name, page, page_height - self.y)
            .at_x(self.x)
            .bold(bold);
        span.italic = italic;
        Some(span)
    }
}

/// A detected column in the page layout.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// Left boundary X coordinate
    pub left: f32,
    /// Right boundary X coordinate
    pub right: f32,
}

impl Column {
    /// Check if a run belongs to this column by its left edge or its center.
    pub fn contains_run(&self, run: &GlyphRun) -> bool {
        let center = run.x + run.width / 2.0;
        (run.x >= self.left && run.x <= self.right) || (center >= self.left && center <= self.right)
    }
}

/// Find a single vertical gutter splitting the page into two columns.
///
/// Returns one column when there is no convincing gutter.
pub fn detect_columns(runs: &[GlyphRun]) -> Vec<Column> {
    if runs.is_empty() {
        return vec![];
    }

    let min_x = runs.iter().map(|r| r.x).fold(f32::INFINITY, f32::min);
    let max_x = runs.iter().map(|r| r.right()).fold(f32::NEG_INFINITY, f32::max);
    let single = vec![Column {
        left: min_x - 10.0,
        right: max_x + 10.0,
    }];

    let page_width = max_x - min_x;
    if page_width < 250.0 {
        return single;
    }

    // Occupancy of narrow vertical slices.
    let slice_width = 3.0;
    let num_slices = (page_width / slice_width) as usize + 1;
    let mut occupancy = vec![0usize; num_slices];
    for run in runs {
        let start = ((run.x - min_x) / slice_width) as usize;
        let end = (((run.right()) - min_x) / slice_width) as usize;
        for slot in occupancy
            .iter_mut()
            .take(end.min(num_slices - 1) + 1)
            .skip(start)
        {
            *slot += 1;
        }
    }

    // Widest empty stretch in the middle 70% of the page.
    let search = (num_slices * 15 / 100)..(num_slices * 85 / 100);
    let mut best = (0usize, 0usize);
    let mut current: Option<usize> = None;
    for i in search.clone() {
        if occupancy[i] == 0 {
            current.get_or_insert(i);
        } else if let Some(start) = current.take() {
            if i - start > best.1 {
                best = (start, i - start);
            }
        }
    }
    if let Some(start) = current {
        if search.end - start > best.1 {
            best = (start, search.end - start);
        }
    }

    let gap_width = best.1 as f32 * slice_width;
    if gap_width < 12.0 {
        return single;
    }

    let gutter = min_x + (best.0 as f32 + best.1 as f32 / 2.0) * slice_width;
    if gutter - min_x < 80.0 || max_x - gutter < 80.0 {
        log::debug!("Column too narrow, treating as single column");
        return single;
    }

    let left_runs = runs.iter().filter(|r| r.x + r.width / 2.0 < gutter).count();
    let right_runs = runs.len() - left_runs;
    let min_runs = (runs.len() / 10).max(2);
    if left_runs < min_runs || right_runs < min_runs {
        log::debug!("Runs too imbalanced, treating as single column");
        return single;
    }

    log::debug!("Detected gutter at x={:.1} ({:.1}pt wide)", gutter, gap_width);
    vec![
        Column {
            left: min_x - 10.0,
            right: gutter,
        },
        Column {
            left: gutter,
            right: max_x + 10.0,
        },
    ]
}

/// Group runs into lines in reading order: column by column, then top to
/// bottom, then left to right.
pub fn group_into_lines(runs: Vec<GlyphRun>, use_columns: bool) -> Vec<TextLine> {
    if runs.is_empty() {
        return vec![];
    }

    let columns = if use_columns {
        detect_columns(&runs)
    } else {
        vec![]
    };
    if columns.len() <= 1 {
        return group_single_column(runs);
    }

    let mut per_column: Vec<Vec<GlyphRun>> = vec![Vec::new(); columns.len()];
    for run in runs {
        let idx = columns.iter().position(|c| c.contains_run(&run)).unwrap_or(0);
        per_column[idx].push(run);
    }

    per_column.into_iter().flat_map(group_single_column).collect()
}

/// Y-based line grouping for a single column.
fn group_single_column(mut runs: Vec<GlyphRun>) -> Vec<TextLine> {
    // PDF y grows upwards, so top of page first means descending y.
    runs.sort_by(|a, b| match b.y.partial_cmp(&a.y).unwrap_or(Ordering::Equal) {
        Ordering::Equal => a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal),
        other => other,
    });

    let mut lines: Vec<TextLine> = Vec::new();
    let mut current: Vec<GlyphRun> = Vec::new();
    let mut current_y: Option<f32> = None;

    for run in runs {
        let tolerance = run.font_size * 0.3;
        match current_y {
            Some(y) if (run.y - y).abs() <= tolerance => current.push(run),
            _ => {
                if !current.is_empty() {
                    lines.push(TextLine::from_runs(std::mem::take(&mut current)));
                }
                current_y = Some(run.y);
                current.push(run);
            }
        }
    }
    if !current.is_empty() {
        lines.push(TextLine::from_runs(current));
    }

    lines
}

/// Check if character is from a script that doesn't use word spaces.
/// Chinese and Japanese don't use spaces between words, but Korean does.
pub fn is_spaceless_script_char(c: char) -> bool {
    let code = c as u32;

    // CJK Unified Ideographs and extensions
    (0x4E00..=0x9FFF).contains(&code)
    || (0x3400..=0x4DBF).contains(&code)
    || (0x20000..=0x2EBEF).contains(&code)
    // Hiragana and Katakana
    || (0x3040..=0x30FF).contains(&code)
    // CJK Symbols and Punctuation
    || (0x3000..=0x303F).contains(&code)
}
