use std::path::Path;
use std::path::PathBuf;

use markdown::CompileOptions;
use markdown::Options;
use markdown::ParseOptions;
use markdown::mdast::Node;
use markdown::to_html_with_options;
use markdown::to_mdast;

use crate::MdpressError;
use crate::MdpressResult;
use crate::config::HtmlConfig;
use crate::target::OutputFormat;
use crate::target::RenderTarget;
use crate::toc::AnchorStyle;
use crate::toc::TocEntry;
use crate::toc::heading_anchors;

/// A document that failed to render. Collected per document so one bad file
/// never aborts the rest of the batch.
#[derive(Debug)]
pub struct DocumentFailure {
	pub file: PathBuf,
	pub reason: String,
}

impl DocumentFailure {
	/// The failure as a diagnostic error, for reporting surfaces.
	pub fn to_error(&self) -> MdpressError {
		MdpressError::DocumentRender {
			file: self.file.display().to_string(),
			reason: self.reason.clone(),
		}
	}
}

/// Aggregate result of an HTML batch run.
#[derive(Debug, Default)]
pub struct HtmlReport {
	/// Destination paths written, in source order.
	pub written: Vec<PathBuf>,
	/// Documents that failed to read or render.
	pub failures: Vec<DocumentFailure>,
}

impl HtmlReport {
	/// Returns true when every document rendered successfully.
	pub fn is_ok(&self) -> bool {
		self.failures.is_empty()
	}
}

/// Plan mirrored `.html` destinations for each located document.
pub fn plan_targets(root: &Path, documents: &[PathBuf], out_root: &Path) -> Vec<RenderTarget> {
	documents
		.iter()
		.map(|source| RenderTarget::mirrored(root, source, out_root, OutputFormat::Html))
		.collect()
}

fn escape_text(text: &str) -> String {
	let mut out = String::with_capacity(text.len());
	for ch in text.chars() {
		match ch {
			'&' => out.push_str("&amp;"),
			'<' => out.push_str("&lt;"),
			'>' => out.push_str("&gt;"),
			_ => out.push(ch),
		}
	}
	out
}

/// Document-order interleaving of markdown headings and raw HTML nodes,
/// used to tell compiler-emitted heading tags apart from hand-written ones.
enum BodyToken {
	Heading(u8),
	Raw(String),
}

fn collect_body_tokens(node: &Node, out: &mut Vec<BodyToken>) {
	match node {
		Node::Heading(heading) => out.push(BodyToken::Heading(heading.depth)),
		Node::Html(html) => out.push(BodyToken::Raw(html.value.clone())),
		_ => {
			if let Some(children) = node.children() {
				for child in children {
					collect_body_tokens(child, out);
				}
			}
		}
	}
}

/// Assign ids to heading open tags, in document order. The entries come
/// from the same mdast pass the TOC uses, so TOC links always resolve.
///
/// Raw HTML passes through the compiler verbatim, so the scan cursor is
/// advanced past each raw node before the next heading tag is matched —
/// a hand-written `<hN>` never receives a markdown heading's id.
fn inject_heading_ids(html: &str, tokens: &[BodyToken], entries: &[TocEntry]) -> String {
	let mut out = String::with_capacity(html.len() + entries.len() * 24);
	let mut rest = html;
	let mut next_entry = entries.iter();
	for token in tokens {
		match token {
			BodyToken::Raw(value) => {
				let value = value.trim();
				if value.is_empty() {
					continue;
				}
				if let Some(pos) = rest.find(value) {
					let end = pos + value.len();
					out.push_str(&rest[..end]);
					rest = &rest[end..];
				}
			}
			BodyToken::Heading(level) => {
				let Some(entry) = next_entry.next() else {
					break;
				};
				let open = format!("<h{level}>");
				if let Some(pos) = rest.find(&open) {
					out.push_str(&rest[..pos]);
					out.push_str(&format!("<h{level} id=\"{}\">", entry.anchor));
					rest = &rest[pos + open.len()..];
				}
			}
		}
	}
	out.push_str(rest);
	out
}

fn wrap_page(title: &str, body: &str) -> String {
	format!(
		"<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<meta \
		 name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n<title>{}</title>\n\
		 <style>\nbody {{ max-width: 50rem; margin: 2rem auto; padding: 0 1rem; font-family: \
		 sans-serif; line-height: 1.5; }}\npre {{ background: #f4f4f4; padding: 0.75rem; overflow-x: \
		 auto; }}\ncode {{ font-family: monospace; }}\ntable {{ border-collapse: collapse; }}\nth, td \
		 {{ border: 1px solid #ccc; padding: 0.25rem 0.5rem; }}\n</style>\n</head>\n<body>\n{}\
		 </body>\n</html>\n",
		escape_text(title),
		body
	)
}

/// Convert one markdown document to a standalone HTML page. Pure
/// transformation — the source is never mutated.
///
/// GFM constructs (tables, strikethrough, task lists, autolinks) are
/// enabled, raw HTML passes through, and every heading receives an id in
/// the configured anchor style.
pub fn render_document(text: &str, title: &str, style: AnchorStyle) -> MdpressResult<String> {
	let options = Options {
		compile: CompileOptions {
			allow_dangerous_html: true,
			..CompileOptions::gfm()
		},
		..Options::gfm()
	};

	let body = to_html_with_options(text, &options)
		.map_err(|message| MdpressError::Markdown(message.to_string()))?;
	let entries = heading_anchors(text, style)?;

	let tree = to_mdast(text, &ParseOptions::gfm())
		.map_err(|message| MdpressError::Markdown(message.to_string()))?;
	let mut tokens = Vec::new();
	collect_body_tokens(&tree, &mut tokens);

	let body = inject_heading_ids(&body, &tokens, &entries);

	Ok(wrap_page(title, &body))
}

fn document_title(source: &Path) -> String {
	source
		.file_stem()
		.map(|stem| stem.to_string_lossy().into_owned())
		.unwrap_or_else(|| "untitled".to_string())
}

/// Render every located document to its mirrored destination.
///
/// Read and render failures are collected into the report and the batch
/// continues; failures writing to the filesystem are fatal and abort the
/// run.
pub fn render_all(
	root: &Path,
	documents: &[PathBuf],
	config: &HtmlConfig,
	style: AnchorStyle,
) -> MdpressResult<HtmlReport> {
	let out_root = root.join(&config.out_dir);
	std::fs::create_dir_all(&out_root)?;

	let targets = plan_targets(root, documents, &out_root);
	let mut report = HtmlReport::default();

	for target in targets {
		let text = match std::fs::read_to_string(&target.source) {
			Ok(text) => text,
			Err(e) => {
				tracing::warn!(file = %target.source.display(), error = %e, "failed to read document");
				report.failures.push(DocumentFailure {
					file: target.source,
					reason: e.to_string(),
				});
				continue;
			}
		};

		let title = document_title(&target.source);
		let page = match render_document(&text, &title, style) {
			Ok(page) => page,
			Err(e) => {
				tracing::warn!(file = %target.source.display(), error = %e, "failed to render document");
				report.failures.push(DocumentFailure {
					file: target.source,
					reason: e.to_string(),
				});
				continue;
			}
		};

		if let Some(parent) = target.dest.parent() {
			std::fs::create_dir_all(parent)?;
		}
		std::fs::write(&target.dest, page)?;
		tracing::debug!(dest = %target.dest.display(), "wrote HTML");
		report.written.push(target.dest);
	}

	Ok(report)
}
