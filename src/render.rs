//! Text-template to PDF rendering.
//!
//! Templates are plain text with `{{ dotted.path }}` placeholders resolved
//! against a JSON record. The filled text is laid out line by line on Letter
//! pages in Helvetica.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use async_trait::async_trait;
use printpdf::{
    BuiltinFont, Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, Point, Pt, TextItem,
};
use regex::Regex;
use serde_json::Value;
use tracing::{debug, error, info};

use crate::contract::Renderer;
use crate::error::RenderError;

const PAGE_WIDTH: Mm = Mm(215.9);
const PAGE_HEIGHT: Mm = Mm(279.4);
const MARGIN: f32 = 20.0;
const FONT_SIZE: f32 = 10.0;
const LINE_HEIGHT: f32 = 14.0;
const LINES_PER_PAGE: usize = 48;
const MAX_LINE_CHARS: usize = 95;

fn placeholder() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\{\{\s*([A-Za-z0-9_]+(?:\.[A-Za-z0-9_]+)*)\s*\}\}")
            .unwrap_or_else(|e| panic!("placeholder pattern is a constant: {e}"))
    })
}

/// Renders templates found under a directory.
#[derive(Debug, Clone)]
pub struct PdfRenderer {
    template_dir: PathBuf,
}

impl PdfRenderer {
    pub fn new(template_dir: impl Into<PathBuf>) -> Self {
        Self {
            template_dir: template_dir.into(),
        }
    }

    /// `invoice` resolves to `invoice.txt` when no file of that exact name exists.
    fn resolve(&self, template: &str) -> PathBuf {
        let exact = self.template_dir.join(template);
        if exact.exists() || Path::new(template).extension().is_some() {
            exact
        } else {
            self.template_dir.join(format!("{template}.txt"))
        }
    }
}

#[async_trait]
impl Renderer for PdfRenderer {
    async fn render(&self, template: &str, data: &Value) -> Result<Vec<u8>, RenderError> {
        let path = self.resolve(template);
        info!(template = %path.display(), "Rendering template to PDF");

        let source = tokio::fs::read_to_string(&path).await.map_err(|source| {
            error!(path = %path.display(), error = ?source, "Failed to read template");
            RenderError::Io {
                path: path.clone(),
                source,
            }
        })?;

        let text = fill_template(&source, data)?;
        let bytes = layout_pdf(template, &text);
        debug!(bytes = bytes.len(), "Rendered PDF");
        Ok(bytes)
    }
}

/// Substitutes every placeholder in `template` with its value in `data`.
///
/// Strings are inserted verbatim, `null` as nothing, other values as JSON.
pub fn fill_template(template: &str, data: &Value) -> Result<String, RenderError> {
    let mut out = String::with_capacity(template.len());
    let mut last = 0;
    let mut matched = 0;
    for caps in placeholder().captures_iter(template) {
        let (Some(whole), Some(path)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        out.push_str(&template[last..whole.start()]);
        let value = lookup(data, path.as_str())
            .ok_or_else(|| RenderError::MissingKey(path.as_str().to_string()))?;
        out.push_str(&display(value));
        last = whole.end();
        matched += 1;
    }
    out.push_str(&template[last..]);

    if template.matches("{{").count() != matched {
        return Err(RenderError::Template(
            "unterminated or malformed placeholder".to_string(),
        ));
    }
    Ok(out)
}

fn lookup<'a>(data: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(data, |node, key| match node {
        Value::Object(map) => map.get(key),
        Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Splits on newlines and hard-wraps anything wider than the page.
fn wrap_lines(text: &str) -> Vec<String> {
    let mut lines = Vec::new();
    for line in text.lines() {
        let chars: Vec<char> = line.chars().collect();
        if chars.is_empty() {
            lines.push(String::new());
            continue;
        }
        for chunk in chars.chunks(MAX_LINE_CHARS) {
            lines.push(chunk.iter().collect());
        }
    }
    lines
}

fn layout_pdf(title: &str, text: &str) -> Vec<u8> {
    let lines = wrap_lines(text);
    let pages: Vec<PdfPage> = lines
        .chunks(LINES_PER_PAGE)
        .map(|chunk| {
            let mut ops = vec![
                Op::StartTextSection,
                Op::SetTextCursor {
                    pos: Point::new(Mm(MARGIN), Mm(PAGE_HEIGHT.0 - MARGIN)),
                },
                Op::SetFontSizeBuiltinFont {
                    size: Pt(FONT_SIZE),
                    font: BuiltinFont::Helvetica,
                },
                Op::SetLineHeight {
                    lh: Pt(LINE_HEIGHT),
                },
            ];
            for line in chunk {
                ops.push(Op::WriteTextBuiltinFont {
                    items: vec![TextItem::Text(line.clone())],
                    font: BuiltinFont::Helvetica,
                });
                ops.push(Op::AddLineBreak);
            }
            ops.push(Op::EndTextSection);
            PdfPage::new(PAGE_WIDTH, PAGE_HEIGHT, ops)
        })
        .collect();

    // A blank template still yields a one-page document.
    let pages = if pages.is_empty() {
        vec![PdfPage::new(PAGE_WIDTH, PAGE_HEIGHT, Vec::new())]
    } else {
        pages
    };

    let mut warnings = Vec::new();
    PdfDocument::new(title)
        .with_pages(pages)
        .save(&PdfSaveOptions::default(), &mut warnings)
}
