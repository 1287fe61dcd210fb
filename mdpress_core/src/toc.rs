use std::collections::HashMap;
use std::path::Path;

use markdown::ParseOptions;
use markdown::mdast::Node;
use markdown::to_mdast;

use crate::MdpressError;
use crate::MdpressResult;
use crate::config::MissingHeaderPolicy;
use crate::config::TocConfig;

/// Sentinel markers delimiting the generated TOC block. Everything between
/// them (inclusive) is replaced on regeneration, which is what makes
/// synthesis idempotent.
pub const TOC_BEGIN: &str = "<!-- mdpress-toc:begin (generated, do not edit by hand) -->";
pub const TOC_END: &str = "<!-- mdpress-toc:end -->";

/// One entry of a generated table of contents, in document order.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct TocEntry {
	/// Heading depth, 1–6.
	pub level: u8,
	/// The heading's inline text with markup stripped.
	pub title: String,
	/// The in-document anchor the entry links to. Unique within a document.
	pub anchor: String,
}

/// Anchor-link slug convention.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub enum AnchorStyle {
	/// GitHub-style slugs: lowercase, spaces to hyphens, punctuation dropped.
	#[default]
	Github,
	/// Bitbucket-style slugs: `markdown-header-` prefix, punctuation runs
	/// collapsed to single hyphens.
	Bitbucket,
}

/// Options for a single TOC synthesis run.
#[derive(Debug, Clone)]
pub struct TocOptions {
	/// The header line the TOC is spliced in under, matched by trimmed
	/// string equality. Must be a single line.
	pub header: String,
	/// Anchor slug convention.
	pub style: AnchorStyle,
	/// Policy when the header line is absent from the document.
	pub missing_header: MissingHeaderPolicy,
	/// Display label for the document, used in error messages.
	pub file: String,
}

impl TocOptions {
	/// Build options from the `[toc]` config table.
	pub fn from_config(config: &TocConfig) -> Self {
		Self {
			header: config.header.clone(),
			style: if config.bitbucket {
				AnchorStyle::Bitbucket
			} else {
				AnchorStyle::Github
			},
			missing_header: config.missing_header,
			file: config.target.display().to_string(),
		}
	}
}

impl Default for TocOptions {
	fn default() -> Self {
		Self::from_config(&TocConfig::default())
	}
}

/// Collect the plain text of an inline subtree — text and inline code kept,
/// emphasis/links/strikethrough descended into, everything else dropped.
fn collect_inline_text(node: &Node, out: &mut String) {
	match node {
		Node::Text(text) => out.push_str(&text.value),
		Node::InlineCode(code) => out.push_str(&code.value),
		_ => {
			if let Some(children) = node.children() {
				for child in children {
					collect_inline_text(child, out);
				}
			}
		}
	}
}

fn collect_headings(node: &Node, out: &mut Vec<(u8, String)>) {
	if let Node::Heading(heading) = node {
		let mut title = String::new();
		for child in &heading.children {
			collect_inline_text(child, &mut title);
		}
		out.push((heading.depth, title));
	}

	if let Some(children) = node.children() {
		for child in children {
			collect_headings(child, out);
		}
	}
}

/// Compute a slug for a heading title. The GitHub convention keeps letters,
/// digits, hyphens, and underscores, maps spaces to hyphens, and drops the
/// rest. The Bitbucket convention collapses every non-alphanumeric run into
/// a single hyphen under a `markdown-header-` prefix.
pub fn slugify(title: &str, style: AnchorStyle) -> String {
	match style {
		AnchorStyle::Github => {
			let mut slug = String::with_capacity(title.len());
			for ch in title.chars() {
				if ch.is_alphanumeric() || ch == '_' || ch == '-' {
					slug.extend(ch.to_lowercase());
				} else if ch == ' ' {
					slug.push('-');
				}
			}
			slug
		}
		AnchorStyle::Bitbucket => {
			let mut slug = String::from("markdown-header-");
			let mut pending_hyphen = false;
			for ch in title.chars() {
				if ch.is_alphanumeric() {
					if pending_hyphen && !slug.ends_with('-') {
						slug.push('-');
					}
					pending_hyphen = false;
					slug.extend(ch.to_lowercase());
				} else {
					pending_hyphen = true;
				}
			}
			slug
		}
	}
}

/// Extract every heading of a document as a [`TocEntry`], anchors included.
///
/// Anchors are deduplicated deterministically: the first occurrence of a
/// slug keeps it, repeats get `-1`, `-2`, … appended, matching the hosting
/// platforms' behavior. The HTML renderer derives heading ids from this same
/// function, so TOC links and rendered anchors always agree.
pub fn heading_anchors(text: &str, style: AnchorStyle) -> MdpressResult<Vec<TocEntry>> {
	let tree = to_mdast(text, &ParseOptions::gfm())
		.map_err(|message| MdpressError::Markdown(message.to_string()))?;

	let mut raw = Vec::new();
	collect_headings(&tree, &mut raw);

	let mut seen: HashMap<String, usize> = HashMap::new();
	let mut entries = Vec::with_capacity(raw.len());
	for (level, title) in raw {
		let slug = slugify(&title, style);
		let count = seen.entry(slug.clone()).or_insert(0);
		let anchor = if *count == 0 {
			slug.clone()
		} else {
			format!("{slug}-{count}")
		};
		*count += 1;
		entries.push(TocEntry {
			level,
			title,
			anchor,
		});
	}

	Ok(entries)
}

/// The title portion of a header line: `## Table of Contents` becomes
/// `Table of Contents`.
fn header_title(header: &str) -> &str {
	header.trim().trim_start_matches('#').trim()
}

/// Render TOC entries as a nested markdown link list. Indentation is
/// relative to the shallowest heading present.
fn render_list(entries: &[TocEntry]) -> String {
	let min_level = entries.iter().map(|e| e.level).min().unwrap_or(1);
	let mut out = String::new();
	for entry in entries {
		let indent = usize::from(entry.level.saturating_sub(min_level)) * 2;
		for _ in 0..indent {
			out.push(' ');
		}
		out.push_str(&format!("- [{}](#{})\n", entry.title, entry.anchor));
	}
	out
}

/// Normalize CRLF line endings to LF.
pub fn normalize_line_endings(content: &str) -> String {
	if content.contains('\r') {
		content.replace("\r\n", "\n").replace('\r', "\n")
	} else {
		content.to_string()
	}
}

/// Remove a previously generated sentinel block, returning the remaining
/// lines. A begin marker without a matching end marker is reported rather
/// than silently mangling the document.
fn strip_toc_block(lines: &[&str], file: &str) -> MdpressResult<Vec<String>> {
	let begin = lines.iter().position(|line| line.trim() == TOC_BEGIN);
	let Some(begin) = begin else {
		return Ok(lines.iter().map(|line| (*line).to_string()).collect());
	};

	let end = lines[begin..]
		.iter()
		.position(|line| line.trim() == TOC_END)
		.map(|offset| begin + offset);
	let Some(end) = end else {
		return Err(MdpressError::Markdown(format!(
			"unterminated TOC sentinel block in {file}"
		)));
	};

	let mut kept: Vec<String> = Vec::with_capacity(lines.len());
	for (index, line) in lines.iter().enumerate() {
		if index < begin || index > end {
			kept.push((*line).to_string());
		}
	}
	Ok(kept)
}

/// Synthesize a table of contents into `text`, pure and idempotent:
/// applying this twice yields byte-identical output to applying it once.
///
/// Any prior sentinel block is stripped before headings are extracted, so
/// anchors never drift across regenerations. The header's own heading is
/// excluded from the generated list.
pub fn synthesize(text: &str, options: &TocOptions) -> MdpressResult<String> {
	// A multi-line header could never match the line-by-line scan below and
	// would be re-inserted on every run.
	if options.header.contains('\n') {
		return Err(MdpressError::ConfigParse(
			"`[toc] header` must be a single line".to_string(),
		));
	}

	let normalized = normalize_line_endings(text);
	let lines: Vec<&str> = normalized.lines().collect();
	let stripped = strip_toc_block(&lines, &options.file)?;

	let header = options.header.trim();

	// The header line must be part of the document before headings are
	// extracted: its own heading participates in anchor deduplication (it is
	// only excluded from the rendered list), so the anchors here match the
	// ids the HTML renderer assigns.
	let (doc_lines, header_index) =
		match stripped.iter().position(|line| line.trim() == header) {
			Some(index) => (stripped, index),
			None => match options.missing_header {
				MissingHeaderPolicy::Fail => {
					return Err(MdpressError::TocHeaderMissing {
						header: options.header.clone(),
						file: options.file.clone(),
					});
				}
				MissingHeaderPolicy::InsertAtTop => {
					let mut with_header = Vec::with_capacity(stripped.len() + 1);
					with_header.push(header.to_string());
					with_header.extend(stripped);
					(with_header, 0)
				}
			},
		};

	// Exclude only the header's own heading from the list. The matched line
	// is the first occurrence of the header text, so its entry is the first
	// one with the header's title and depth; later genuine duplicates stay.
	let excluded_title = header_title(header);
	let excluded_level = header.chars().take_while(|&c| c == '#').count();
	let mut excluded = false;
	let entries: Vec<TocEntry> = heading_anchors(&doc_lines.join("\n"), options.style)?
		.into_iter()
		.filter(|entry| {
			if !excluded
				&& entry.title == excluded_title
				&& usize::from(entry.level) == excluded_level
			{
				excluded = true;
				return false;
			}
			true
		})
		.collect();

	let mut block: Vec<String> = vec![TOC_BEGIN.to_string(), String::new()];
	for line in render_list(&entries).lines() {
		block.push(line.to_string());
	}
	block.push(String::new());
	block.push(TOC_END.to_string());

	let mut out: Vec<String> = Vec::with_capacity(doc_lines.len() + block.len() + 4);
	out.extend(doc_lines[..=header_index].iter().cloned());
	out.push(String::new());
	out.extend(block);
	out.push(String::new());
	let mut rest = &doc_lines[header_index + 1..];
	while let Some((first, tail)) = rest.split_first() {
		if first.trim().is_empty() {
			rest = tail;
		} else {
			break;
		}
	}
	out.extend(rest.iter().cloned());

	// Trim trailing blank lines, keep exactly one final newline.
	while out.last().is_some_and(|line| line.trim().is_empty()) {
		out.pop();
	}
	let mut result = out.join("\n");
	result.push('\n');
	Ok(result)
}

/// Read `path`, synthesize its TOC, and overwrite it in place when the
/// content changed. Returns whether the file was rewritten.
///
/// The write completes before this returns, so downstream renderers always
/// see the updated table of contents.
pub fn synthesize_file(path: &Path, options: &TocOptions) -> MdpressResult<bool> {
	let text = std::fs::read_to_string(path)?;
	let updated = synthesize(&text, options)?;

	if updated == text {
		tracing::debug!(file = %path.display(), "TOC already up to date");
		return Ok(false);
	}

	std::fs::write(path, &updated)?;
	tracing::info!(file = %path.display(), "TOC synthesized");
	Ok(true)
}
