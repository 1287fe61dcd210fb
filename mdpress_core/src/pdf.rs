use std::path::Path;
use std::path::PathBuf;

use markdown::ParseOptions;
use markdown::mdast::Node;
use markdown::to_mdast;
use printpdf::BuiltinFont;
use printpdf::IndirectFontRef;
use printpdf::Mm;
use printpdf::PdfDocument;
use printpdf::PdfDocumentReference;
use printpdf::PdfLayerReference;

use crate::MdpressError;
use crate::MdpressResult;
use crate::config::PdfConfig;

/// Points-to-millimetres conversion factor.
const PT_TO_MM: f32 = 0.352_778;
/// Average glyph advance as a fraction of the font size, for Helvetica.
const BODY_GLYPH_FACTOR: f32 = 0.5;
/// Courier is monospaced at 0.6 em.
const CODE_GLYPH_FACTOR: f32 = 0.6;

const BODY_SIZE: f32 = 10.5;
const CODE_SIZE: f32 = 9.0;
const LINE_SPACING: f32 = 1.4;

/// A flattened markdown block ready for layout. The PDF renderer does not
/// try to reproduce the HTML output — it lays out a readable paginated
/// rendition with default styling.
#[derive(Debug, Clone, Eq, PartialEq)]
enum PdfBlock {
	Heading { level: u8, text: String },
	Paragraph(String),
	ListItem { depth: u8, text: String },
	Quote(String),
	CodeLine(String),
	Rule,
}

fn collect_inline_text(node: &Node, out: &mut String) {
	match node {
		Node::Text(text) => out.push_str(&text.value),
		Node::InlineCode(code) => out.push_str(&code.value),
		Node::Break(_) => out.push(' '),
		_ => {
			if let Some(children) = node.children() {
				for child in children {
					collect_inline_text(child, out);
				}
			}
		}
	}
}

fn inline_text(nodes: &[Node]) -> String {
	let mut out = String::new();
	for node in nodes {
		collect_inline_text(node, &mut out);
	}
	out
}

fn push_list(list: &markdown::mdast::List, depth: u8, blocks: &mut Vec<PdfBlock>) {
	let mut index = list.start.unwrap_or(1);
	for item in &list.children {
		let Node::ListItem(item) = item else {
			continue;
		};

		// Inline content first, nested lists after, so the item line
		// precedes its children.
		let mut text = String::new();
		for child in &item.children {
			if !matches!(child, Node::List(_)) {
				collect_inline_text(child, &mut text);
			}
		}

		let marker = if list.ordered {
			let m = format!("{index}. ");
			index += 1;
			m
		} else {
			"- ".to_string()
		};
		blocks.push(PdfBlock::ListItem {
			depth,
			text: format!("{marker}{}", text.trim()),
		});

		for child in &item.children {
			if let Node::List(nested) = child {
				push_list(nested, depth + 1, blocks);
			}
		}
	}
}

fn push_blocks(node: &Node, blocks: &mut Vec<PdfBlock>) {
	match node {
		Node::Heading(heading) => {
			blocks.push(PdfBlock::Heading {
				level: heading.depth,
				text: inline_text(&heading.children).trim().to_string(),
			});
		}
		Node::Paragraph(paragraph) => {
			let text = inline_text(&paragraph.children).trim().to_string();
			if !text.is_empty() {
				blocks.push(PdfBlock::Paragraph(text));
			}
		}
		Node::Code(code) => {
			for line in code.value.lines() {
				blocks.push(PdfBlock::CodeLine(line.to_string()));
			}
		}
		Node::List(list) => push_list(list, 0, blocks),
		Node::Blockquote(quote) => {
			for child in &quote.children {
				if let Node::Paragraph(paragraph) = child {
					blocks.push(PdfBlock::Quote(
						inline_text(&paragraph.children).trim().to_string(),
					));
				} else {
					push_blocks(child, blocks);
				}
			}
		}
		Node::Table(table) => {
			// Tables are laid out as monospaced rows.
			for row in &table.children {
				let Node::TableRow(row) = row else {
					continue;
				};
				let cells: Vec<String> = row
					.children
					.iter()
					.map(|cell| {
						let Node::TableCell(cell) = cell else {
							return String::new();
						};
						inline_text(&cell.children).trim().to_string()
					})
					.collect();
				blocks.push(PdfBlock::CodeLine(cells.join(" | ")));
			}
		}
		Node::ThematicBreak(_) => blocks.push(PdfBlock::Rule),
		_ => {
			if let Some(children) = node.children() {
				for child in children {
					push_blocks(child, blocks);
				}
			}
		}
	}
}

fn extract_blocks(text: &str) -> MdpressResult<Vec<PdfBlock>> {
	let tree = to_mdast(text, &ParseOptions::gfm())
		.map_err(|message| MdpressError::Markdown(message.to_string()))?;

	let mut blocks = Vec::new();
	if let Some(children) = tree.children() {
		for child in children {
			push_blocks(child, &mut blocks);
		}
	}
	Ok(blocks)
}

/// Greedy word wrap. Words longer than the line are hard-split rather than
/// overflowing the margin.
fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
	let max_chars = max_chars.max(8);
	let mut lines = Vec::new();
	let mut current = String::new();

	for word in text.split_whitespace() {
		let mut word = word;
		while word.chars().count() > max_chars {
			if !current.is_empty() {
				lines.push(std::mem::take(&mut current));
			}
			let split: String = word.chars().take(max_chars).collect();
			lines.push(split.clone());
			word = &word[split.len()..];
		}

		let needed = word.chars().count() + if current.is_empty() { 0 } else { 1 };
		if current.chars().count() + needed > max_chars && !current.is_empty() {
			lines.push(std::mem::take(&mut current));
		}
		if !current.is_empty() {
			current.push(' ');
		}
		current.push_str(word);
	}

	if !current.is_empty() {
		lines.push(current);
	}
	if lines.is_empty() {
		lines.push(String::new());
	}
	lines
}

struct PageLayout {
	doc: PdfDocumentReference,
	layer: PdfLayerReference,
	width: f32,
	height: f32,
	margin: f32,
	cursor: f32,
}

impl PageLayout {
	fn new(title: &str, config: &PdfConfig) -> MdpressResult<(Self, Fonts)> {
		let (doc, page, layer) = PdfDocument::new(
			title,
			Mm(config.page_width),
			Mm(config.page_height),
			"Layer 1",
		);
		let fonts = Fonts {
			body: add_font(&doc, BuiltinFont::Helvetica)?,
			bold: add_font(&doc, BuiltinFont::HelveticaBold)?,
			code: add_font(&doc, BuiltinFont::Courier)?,
		};
		let layer = doc.get_page(page).get_layer(layer);
		let layout = Self {
			doc,
			layer,
			width: config.page_width,
			height: config.page_height,
			margin: config.margin,
			cursor: config.page_height - config.margin,
		};
		Ok((layout, fonts))
	}

	fn usable_width(&self) -> f32 {
		self.width - 2.0 * self.margin
	}

	/// Advance the cursor, breaking to a fresh page when the next line would
	/// fall below the bottom margin.
	fn advance(&mut self, line_height: f32) {
		if self.cursor - line_height < self.margin {
			let (page, layer) = self
				.doc
				.add_page(Mm(self.width), Mm(self.height), "Layer 1");
			self.layer = self.doc.get_page(page).get_layer(layer);
			self.cursor = self.height - self.margin;
		}
		self.cursor -= line_height;
	}

	fn write_line(&mut self, text: &str, size: f32, indent: f32, font: &IndirectFontRef) {
		let line_height = size * LINE_SPACING * PT_TO_MM;
		self.advance(line_height);
		if !text.is_empty() {
			self.layer
				.use_text(text, size, Mm(self.margin + indent), Mm(self.cursor), font);
		}
	}

	/// Vertical whitespace between blocks.
	fn gap(&mut self, mm: f32) {
		self.cursor -= mm;
	}
}

struct Fonts {
	body: IndirectFontRef,
	bold: IndirectFontRef,
	code: IndirectFontRef,
}

fn add_font(doc: &PdfDocumentReference, font: BuiltinFont) -> MdpressResult<IndirectFontRef> {
	doc.add_builtin_font(font)
		.map_err(|e| MdpressError::PdfRender(e.to_string()))
}

fn heading_size(level: u8) -> f32 {
	match level {
		1 => 20.0,
		2 => 16.0,
		3 => 13.5,
		_ => 12.0,
	}
}

fn max_chars(usable_mm: f32, size: f32, glyph_factor: f32) -> usize {
	let glyph_mm = size * glyph_factor * PT_TO_MM;
	(usable_mm / glyph_mm) as usize
}

/// Convert one markdown document into a single paginated PDF: A4 by
/// default, uniform margins, built-in Helvetica with Courier for code.
pub fn render_pdf(text: &str, title: &str, config: &PdfConfig) -> MdpressResult<Vec<u8>> {
	let blocks = extract_blocks(text)?;
	let (mut layout, fonts) = PageLayout::new(title, config)?;
	let usable = layout.usable_width();

	for block in &blocks {
		match block {
			PdfBlock::Heading { level, text } => {
				let size = heading_size(*level);
				layout.gap(size * 0.6 * PT_TO_MM);
				for line in wrap_text(text, max_chars(usable, size, BODY_GLYPH_FACTOR)) {
					layout.write_line(&line, size, 0.0, &fonts.bold);
				}
				layout.gap(size * 0.3 * PT_TO_MM);
			}
			PdfBlock::Paragraph(text) => {
				for line in wrap_text(text, max_chars(usable, BODY_SIZE, BODY_GLYPH_FACTOR)) {
					layout.write_line(&line, BODY_SIZE, 0.0, &fonts.body);
				}
				layout.gap(BODY_SIZE * 0.5 * PT_TO_MM);
			}
			PdfBlock::ListItem { depth, text } => {
				let indent = 5.0 * f32::from(*depth);
				let width = usable - indent;
				for line in wrap_text(text, max_chars(width, BODY_SIZE, BODY_GLYPH_FACTOR)) {
					layout.write_line(&line, BODY_SIZE, indent, &fonts.body);
				}
			}
			PdfBlock::Quote(text) => {
				let width = usable - 5.0;
				for line in wrap_text(text, max_chars(width, BODY_SIZE, BODY_GLYPH_FACTOR)) {
					layout.write_line(&line, BODY_SIZE, 5.0, &fonts.body);
				}
				layout.gap(BODY_SIZE * 0.5 * PT_TO_MM);
			}
			PdfBlock::CodeLine(text) => {
				// Code is not re-wrapped; long lines are hard-split to keep
				// their prefix visible.
				let limit = max_chars(usable, CODE_SIZE, CODE_GLYPH_FACTOR).max(8);
				let mut rest = text.as_str();
				loop {
					let take: String = rest.chars().take(limit).collect();
					layout.write_line(&take, CODE_SIZE, 0.0, &fonts.code);
					if rest.chars().count() <= limit {
						break;
					}
					rest = &rest[take.len()..];
				}
			}
			PdfBlock::Rule => {
				layout.gap(4.0);
			}
		}
	}

	layout
		.doc
		.save_to_bytes()
		.map_err(|e| MdpressError::PdfRender(e.to_string()))
}

/// Resolve the configured destination. A destination naming a directory
/// (an existing one, or any path spelled with a trailing `/`) receives
/// `<source-stem>.pdf`; any other path is used verbatim.
pub fn resolve_dest(root: &Path, source: &Path, dest: &Path) -> PathBuf {
	let dest_abs = root.join(dest);
	let spelled_as_dir = dest
		.as_os_str()
		.to_string_lossy()
		.ends_with(['/', '\\']);

	if spelled_as_dir || dest_abs.is_dir() {
		let stem = source
			.file_stem()
			.map(|stem| stem.to_string_lossy().into_owned())
			.unwrap_or_else(|| "document".to_string());
		dest_abs.join(format!("{stem}.pdf"))
	} else {
		dest_abs
	}
}

/// Convert the designated source document and write the PDF artifact,
/// returning the path written. Fatal for the pdf task only — the HTML
/// renderer's independent run is unaffected.
pub fn render_pdf_file(root: &Path, source: &Path, config: &PdfConfig) -> MdpressResult<PathBuf> {
	let source_abs = root.join(source);
	let text = std::fs::read_to_string(&source_abs)?;
	let title = source_abs
		.file_stem()
		.map(|stem| stem.to_string_lossy().into_owned())
		.unwrap_or_else(|| "document".to_string());

	let bytes = render_pdf(&text, &title, config)?;

	let dest = resolve_dest(root, source, &config.dest);
	if let Some(parent) = dest.parent() {
		std::fs::create_dir_all(parent)?;
	}
	std::fs::write(&dest, bytes)?;
	tracing::info!(dest = %dest.display(), "wrote PDF");
	Ok(dest)
}
