use std::path::Path;
use std::path::PathBuf;

use rstest::rstest;
use similar_asserts::assert_eq;

use super::*;
use crate::config::MissingHeaderPolicy;
use crate::config::SourceConfig;

#[rstest]
#[case::simple("Introduction", "introduction")]
#[case::spaces("Getting Started", "getting-started")]
#[case::punctuation("What's New?", "whats-new")]
#[case::ampersand("Foo & Bar", "foo--bar")]
#[case::mixed_case("API Reference", "api-reference")]
#[case::underscores("snake_case_title", "snake_case_title")]
#[case::hyphens("pre-release notes", "pre-release-notes")]
fn github_slugs(#[case] title: &str, #[case] expected: &str) {
	assert_eq!(slugify(title, AnchorStyle::Github), expected);
}

#[rstest]
#[case::simple("Introduction", "markdown-header-introduction")]
#[case::punctuation("What's New?", "markdown-header-what-s-new")]
#[case::ampersand("Foo & Bar", "markdown-header-foo-bar")]
fn bitbucket_slugs(#[case] title: &str, #[case] expected: &str) {
	assert_eq!(slugify(title, AnchorStyle::Bitbucket), expected);
}

#[test]
fn heading_anchors_preserve_document_order() -> MdpressResult<()> {
	let input = "# One\n\ntext\n\n## Two\n\n### Three\n";
	let entries = heading_anchors(input, AnchorStyle::Github)?;
	let titles: Vec<&str> = entries.iter().map(|e| e.title.as_str()).collect();
	assert_eq!(titles, vec!["One", "Two", "Three"]);
	assert_eq!(entries[0].level, 1);
	assert_eq!(entries[2].level, 3);

	Ok(())
}

#[test]
fn heading_anchors_deduplicate_deterministically() -> MdpressResult<()> {
	let input = "## Setup\n\n## Setup\n\n## Setup\n";
	let entries = heading_anchors(input, AnchorStyle::Github)?;
	let anchors: Vec<&str> = entries.iter().map(|e| e.anchor.as_str()).collect();
	assert_eq!(anchors, vec!["setup", "setup-1", "setup-2"]);

	Ok(())
}

#[test]
fn heading_anchors_ignore_fenced_code() -> MdpressResult<()> {
	let input = "# Real\n\n```\n# not a heading\n```\n";
	let entries = heading_anchors(input, AnchorStyle::Github)?;
	assert_eq!(entries.len(), 1);
	assert_eq!(entries[0].title, "Real");

	Ok(())
}

#[test]
fn heading_anchors_strip_inline_markup() -> MdpressResult<()> {
	let input = "## The `config` *module*\n";
	let entries = heading_anchors(input, AnchorStyle::Github)?;
	assert_eq!(entries[0].title, "The config module");

	Ok(())
}

#[test]
fn synthesize_inserts_under_header() -> MdpressResult<()> {
	let input = "# Guide\n\n## Table of Contents\n\n## Intro\n\nSome text.\n\n### Details\n";
	let output = synthesize(input, &TocOptions::default())?;

	let expected = format!(
		"# Guide\n\n## Table of Contents\n\n{TOC_BEGIN}\n\n- [Guide](#guide)\n  - \
		 [Intro](#intro)\n    - [Details](#details)\n\n{TOC_END}\n\n## Intro\n\nSome \
		 text.\n\n### Details\n"
	);
	assert_eq!(output, expected);

	Ok(())
}

#[test]
fn synthesize_is_idempotent() -> MdpressResult<()> {
	let input = "# Guide\n\n## Table of Contents\n\n## Intro\n\nSome text.\n\n### Details\n";
	let once = synthesize(input, &TocOptions::default())?;
	let twice = synthesize(&once, &TocOptions::default())?;
	assert_eq!(once, twice);

	Ok(())
}

#[test]
fn synthesize_replaces_stale_block() -> MdpressResult<()> {
	let stale = format!(
		"## Table of Contents\n\n{TOC_BEGIN}\n\n- [Old entry](#old-entry)\n\n{TOC_END}\n\n## \
		 Fresh\n"
	);
	let output = synthesize(&stale, &TocOptions::default())?;
	assert!(!output.contains("Old entry"));
	assert!(output.contains("- [Fresh](#fresh)"));
	// Exactly one sentinel pair survives.
	assert_eq!(output.matches(TOC_BEGIN).count(), 1);
	assert_eq!(output.matches(TOC_END).count(), 1);

	Ok(())
}

#[test]
fn synthesize_missing_header_inserts_at_top() -> MdpressResult<()> {
	let input = "# A\n\ntext\n";
	let output = synthesize(input, &TocOptions::default())?;

	let expected = format!(
		"## Table of Contents\n\n{TOC_BEGIN}\n\n- [A](#a)\n\n{TOC_END}\n\n# A\n\ntext\n"
	);
	assert_eq!(output, expected);

	// Still idempotent through the insert-at-top path.
	let twice = synthesize(&output, &TocOptions::default())?;
	assert_eq!(output, twice);

	Ok(())
}

#[test]
fn synthesize_missing_header_can_fail() {
	let options = TocOptions {
		missing_header: MissingHeaderPolicy::Fail,
		..TocOptions::default()
	};
	let result = synthesize("# A\n\ntext\n", &options);
	assert!(matches!(
		result,
		Err(MdpressError::TocHeaderMissing { .. })
	));
}

#[test]
fn synthesize_excludes_its_own_header() -> MdpressResult<()> {
	let input = "## Table of Contents\n\n## One\n";
	let output = synthesize(input, &TocOptions::default())?;
	assert!(!output.contains("[Table of Contents]"));
	assert!(output.contains("- [One](#one)"));

	Ok(())
}

#[test]
fn synthesize_keeps_genuine_headings_matching_the_header_title() -> MdpressResult<()> {
	let input =
		"# Table of Contents\n\n## Table of Contents\n\n## Intro\n\n## Table of Contents\n";
	let output = synthesize(input, &TocOptions::default())?;

	// Only the matched header line's own heading is excluded; the h1 above
	// it and the later duplicate both stay listed.
	assert!(output.contains("- [Table of Contents](#table-of-contents)\n"));
	assert!(output.contains("  - [Intro](#intro)"));
	assert!(output.contains("  - [Table of Contents](#table-of-contents-2)"));

	Ok(())
}

#[test]
fn synthesize_rejects_multiline_headers() {
	let options = TocOptions {
		header: "## Table of Contents\n\ngenerated".to_string(),
		..TocOptions::default()
	};
	let result = synthesize("# A\n\ntext\n", &options);
	assert!(matches!(result, Err(MdpressError::ConfigParse(_))));
}

#[test]
fn synthesize_reports_unterminated_sentinel_block() {
	let input = format!("## Table of Contents\n\n{TOC_BEGIN}\n\n- [gone](#gone)\n");
	let result = synthesize(&input, &TocOptions::default());
	assert!(matches!(result, Err(MdpressError::Markdown(_))));
}

#[test]
fn synthesize_normalizes_crlf() -> MdpressResult<()> {
	let unix = "## Table of Contents\n\n## One\n";
	let windows = "## Table of Contents\r\n\r\n## One\r\n";
	let from_unix = synthesize(unix, &TocOptions::default())?;
	let from_windows = synthesize(windows, &TocOptions::default())?;
	assert_eq!(from_unix, from_windows);

	Ok(())
}

#[test]
fn synthesize_file_writes_once() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let target = tmp.path().join("doc.md");
	std::fs::write(&target, "## Table of Contents\n\n## One\n")?;

	let options = TocOptions::default();
	assert!(synthesize_file(&target, &options)?);
	// Second run sees its own output and leaves the file alone.
	assert!(!synthesize_file(&target, &options)?);

	let content = std::fs::read_to_string(&target)?;
	assert!(content.contains("- [One](#one)"));

	Ok(())
}

fn source_with_pattern(pattern: &str) -> SourceConfig {
	SourceConfig {
		pattern: PatternValue::One(pattern.to_string()),
		exclude: Vec::new(),
	}
}

#[test]
fn locator_output_is_sorted_without_directories() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(tmp.path().join("b.md"), "# b\n")?;
	std::fs::write(tmp.path().join("a.md"), "# a\n")?;
	std::fs::write(tmp.path().join("notes.txt"), "not markdown\n")?;
	std::fs::create_dir(tmp.path().join("sub.md"))?;
	std::fs::create_dir(tmp.path().join("sub"))?;
	std::fs::write(tmp.path().join("sub").join("c.md"), "# c\n")?;

	let documents = locate_documents(
		tmp.path(),
		&source_with_pattern("*.md"),
		Path::new("html"),
	)?;
	let names: Vec<String> = documents
		.iter()
		.map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
		.collect();
	// Root-level only: `*` stops at path separators, and the `sub.md`
	// directory never matches.
	assert_eq!(names, vec!["a.md", "b.md"]);

	Ok(())
}

#[test]
fn locator_recursive_pattern_reaches_subtrees() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::create_dir_all(tmp.path().join("docs").join("nested"))?;
	std::fs::write(tmp.path().join("docs").join("a.md"), "# a\n")?;
	std::fs::write(tmp.path().join("docs").join("nested").join("b.md"), "# b\n")?;

	let documents = locate_documents(
		tmp.path(),
		&source_with_pattern("docs/**/*.md"),
		Path::new("html"),
	)?;
	assert_eq!(documents.len(), 2);

	Ok(())
}

#[test]
fn locator_skips_the_output_root() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(tmp.path().join("a.md"), "# a\n")?;
	std::fs::create_dir(tmp.path().join("html"))?;
	std::fs::write(tmp.path().join("html").join("stale.md"), "# stale\n")?;

	let documents = locate_documents(
		tmp.path(),
		&source_with_pattern("**/*.md"),
		Path::new("html"),
	)?;
	assert_eq!(documents.len(), 1);

	Ok(())
}

#[test]
fn locator_surfaces_no_documents_found() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(tmp.path().join("readme.txt"), "nothing here\n")?;

	let result = locate_documents(
		tmp.path(),
		&source_with_pattern("*.md"),
		Path::new("html"),
	);
	assert!(matches!(
		result,
		Err(MdpressError::NoDocumentsFound { .. })
	));

	Ok(())
}

#[test]
fn locator_rejects_invalid_patterns() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let result = locate_documents(
		tmp.path(),
		&source_with_pattern("docs/[unclosed"),
		Path::new("html"),
	);
	assert!(matches!(result, Err(MdpressError::InvalidPattern { .. })));

	Ok(())
}

#[test]
fn render_target_mirrors_relative_position() {
	let target = RenderTarget::mirrored(
		Path::new("/project"),
		Path::new("/project/docs/guide.md"),
		Path::new("/project/html"),
		OutputFormat::Html,
	);
	assert_eq!(target.dest, PathBuf::from("/project/html/docs/guide.html"));
	assert_eq!(target.format, OutputFormat::Html);
}

#[test]
fn render_document_covers_standard_constructs() -> MdpressResult<()> {
	let input = "# Hello\n\nworld **bold** and [a link](https://example.com)\n\n- item\n\n```\
	             rust\nlet x = 1;\n```\n\n| a | b |\n| - | - |\n| 1 | 2 |\n";
	let page = render_document(input, "hello", AnchorStyle::Github)?;

	assert!(page.contains("<h1 id=\"hello\">Hello</h1>"));
	assert!(page.contains("<strong>bold</strong>"));
	assert!(page.contains("<a href=\"https://example.com\">a link</a>"));
	assert!(page.contains("<li>item</li>"));
	assert!(page.contains("<table>"));
	assert!(page.contains("<code class=\"language-rust\">"));
	assert!(page.starts_with("<!DOCTYPE html>"));
	assert!(page.contains("<title>hello</title>"));

	Ok(())
}

#[test]
fn render_document_anchors_match_toc_links() -> MdpressResult<()> {
	let input = "## Table of Contents\n\n## Setup\n\n## Setup\n";
	let with_toc = synthesize(input, &TocOptions::default())?;
	let page = render_document(&with_toc, "doc", AnchorStyle::Github)?;

	// Every TOC link resolves to a heading id in the rendered page.
	for entry in heading_anchors(&with_toc, AnchorStyle::Github)? {
		assert!(
			page.contains(&format!("id=\"{}\"", entry.anchor)),
			"missing anchor {}",
			entry.anchor
		);
	}
	assert!(page.contains("href=\"#setup\""));
	assert!(page.contains("href=\"#setup-1\""));

	Ok(())
}

#[test]
fn render_document_ignores_raw_html_headings() -> MdpressResult<()> {
	let input = "<h2>raw heading</h2>\n\n## Real\n";
	let page = render_document(input, "doc", AnchorStyle::Github)?;

	// The hand-written heading keeps no id; the markdown heading gets its
	// anchor even though a same-level tag precedes it.
	assert!(page.contains("<h2>raw heading</h2>"));
	assert!(page.contains("<h2 id=\"real\">Real</h2>"));
	assert!(!page.contains("<h2 id=\"real\">raw heading</h2>"));

	Ok(())
}

#[test]
fn render_all_mirrors_the_source_tree() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::create_dir(tmp.path().join("docs"))?;
	std::fs::write(tmp.path().join("docs").join("a.md"), "# a\n")?;
	std::fs::write(tmp.path().join("docs").join("b.md"), "# b\n")?;

	let config = HtmlConfig::default();
	let documents = locate_documents(
		tmp.path(),
		&source_with_pattern("docs/*.md"),
		&config.out_dir,
	)?;
	let report = render_all(tmp.path(), &documents, &config, AnchorStyle::Github)?;

	assert!(report.is_ok());
	assert_eq!(report.written.len(), 2);
	assert!(tmp.path().join("html").join("docs").join("a.html").is_file());
	assert!(tmp.path().join("html").join("docs").join("b.html").is_file());

	Ok(())
}

#[test]
fn render_all_continues_past_a_bad_document() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(tmp.path().join("good.md"), "# fine\n")?;
	// Invalid UTF-8 so the read fails for this document only.
	std::fs::write(tmp.path().join("broken.md"), [0xff, 0xfe, 0x00, 0x01])?;

	let config = HtmlConfig::default();
	let documents = locate_documents(
		tmp.path(),
		&source_with_pattern("*.md"),
		&config.out_dir,
	)?;
	let report = render_all(tmp.path(), &documents, &config, AnchorStyle::Github)?;

	assert!(!report.is_ok());
	assert_eq!(report.written.len(), 1);
	assert_eq!(report.failures.len(), 1);
	assert!(report.failures[0].file.ends_with("broken.md"));
	assert!(tmp.path().join("html").join("good.html").is_file());
	assert!(!tmp.path().join("html").join("broken.html").exists());

	Ok(())
}

#[test]
fn render_pdf_emits_a_pdf_artifact() -> MdpressResult<()> {
	let input = "# Title\n\nA paragraph long enough to wrap across multiple lines when laid \
	             out on an A4 page with default margins and the default body font size.\n\n- \
	             one\n- two\n\n```\ncode line\n```\n";
	let bytes = render_pdf(input, "title", &PdfConfig::default())?;
	assert!(bytes.starts_with(b"%PDF"));

	Ok(())
}

#[rstest]
#[case::trailing_slash("pdf/", "standards.md", "pdf/standards.pdf")]
#[case::verbatim_file("out/manual.pdf", "standards.md", "out/manual.pdf")]
fn pdf_dest_resolution(#[case] dest: &str, #[case] source: &str, #[case] expected: &str) {
	let resolved = resolve_dest(Path::new("/p"), Path::new(source), Path::new(dest));
	assert_eq!(resolved, Path::new("/p").join(expected));
}

#[test]
fn pdf_dest_resolution_existing_directory() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::create_dir(tmp.path().join("out"))?;

	let resolved = resolve_dest(tmp.path(), Path::new("guide.md"), Path::new("out"));
	assert_eq!(resolved, tmp.path().join("out").join("guide.pdf"));

	Ok(())
}

#[test]
fn render_pdf_file_writes_to_resolved_dest() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(tmp.path().join("standards.md"), "# Standards\n\nBody text.\n")?;

	let config = PdfConfig::default();
	let dest = render_pdf_file(tmp.path(), Path::new("standards.md"), &config)?;

	assert_eq!(dest, tmp.path().join("pdf").join("standards.pdf"));
	assert!(dest.is_file());

	Ok(())
}

#[rstest]
#[case::toc(Task::Toc, &[Stage::SynthesizeToc])]
#[case::html(Task::Html, &[Stage::SynthesizeToc, Stage::RenderHtml])]
#[case::pdf(Task::Pdf, &[Stage::SynthesizeToc, Stage::RenderPdf])]
fn task_stage_map(#[case] task: Task, #[case] expected: &[Stage]) {
	assert_eq!(task.stages(), expected);
}

#[test]
fn default_task_is_toc() {
	assert_eq!(Task::default(), Task::Toc);
}

#[test]
fn run_task_html_end_to_end() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(
		tmp.path().join("README.md"),
		"# Project\n\n## Table of Contents\n\n## Usage\n",
	)?;

	let config = BuildConfig::default();
	let report = run_task(tmp.path(), &config, Task::Html)?;

	assert!(report.is_success());
	assert!(report.toc_changed);
	assert!(tmp.path().join("html").join("README.html").is_file());

	let readme = std::fs::read_to_string(tmp.path().join("README.md"))?;
	assert!(readme.contains(TOC_BEGIN));

	// A second run starts fresh and finds nothing to change.
	let report = run_task(tmp.path(), &config, Task::Html)?;
	assert!(!report.toc_changed);

	Ok(())
}

#[test]
fn run_task_pdf_end_to_end() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(
		tmp.path().join("README.md"),
		"# Project\n\n## Table of Contents\n\n## Usage\n",
	)?;

	let config = BuildConfig::default();
	let report = run_task(tmp.path(), &config, Task::Pdf)?;

	assert!(report.is_success());
	assert_eq!(
		report.pdf_path.as_deref(),
		Some(tmp.path().join("pdf").join("README.pdf").as_path())
	);

	Ok(())
}

#[test]
fn run_task_surfaces_missing_documents() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(
		tmp.path().join("README.md"),
		"# Project\n\n## Table of Contents\n",
	)?;

	let config = BuildConfig {
		source: source_with_pattern("*.rst"),
		..BuildConfig::default()
	};
	let result = run_task(tmp.path(), &config, Task::Html);

	assert!(matches!(
		result,
		Err(MdpressError::NoDocumentsFound { .. })
	));
	assert!(!tmp.path().join("html").exists());

	Ok(())
}

#[test]
fn config_defaults_apply() {
	let config = BuildConfig::default();
	assert_eq!(config.source.pattern.patterns(), vec!["*.md"]);
	assert_eq!(config.html.out_dir, PathBuf::from("html"));
	assert_eq!(config.toc.header, "## Table of Contents");
	assert_eq!(config.toc.missing_header, MissingHeaderPolicy::InsertAtTop);
	assert!(!config.toc.bitbucket);
	assert_eq!(config.pdf_source(), Path::new("README.md"));
}

#[test]
fn config_parses_full_table() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(
		tmp.path().join("mdpress.toml"),
		r###"
[source]
pattern = ["docs/**/*.md", "readme.md"]
exclude = ["drafts/"]

[html]
out_dir = "site"

[pdf]
source = "standards.md"
dest = "artifacts/standards.pdf"

[toc]
target = "standards.md"
header = "## Contents"
bitbucket = true
missing_header = "fail"
"###,
	)?;

	let config = BuildConfig::load(tmp.path())?;
	assert_eq!(
		config.source.pattern.patterns(),
		vec!["docs/**/*.md", "readme.md"]
	);
	assert_eq!(config.html.out_dir, PathBuf::from("site"));
	assert_eq!(config.pdf_source(), Path::new("standards.md"));
	assert_eq!(config.toc.header, "## Contents");
	assert!(config.toc.bitbucket);
	assert_eq!(config.toc.missing_header, MissingHeaderPolicy::Fail);

	Ok(())
}

#[test]
fn config_load_without_file_returns_defaults() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let config = BuildConfig::load(tmp.path())?;
	assert_eq!(config.html.out_dir, PathBuf::from("html"));

	Ok(())
}

#[test]
fn config_rejects_multiline_toc_header() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(
		tmp.path().join("mdpress.toml"),
		"[toc]\nheader = \"\"\"## Contents\n\ngenerated\"\"\"\n",
	)?;

	let result = BuildConfig::load(tmp.path());
	assert!(matches!(result, Err(MdpressError::ConfigParse(_))));

	Ok(())
}

#[test]
fn config_rejects_invalid_toml() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(tmp.path().join("mdpress.toml"), "[source\npattern = 1\n")?;

	let result = BuildConfig::load(tmp.path());
	assert!(matches!(result, Err(MdpressError::ConfigParse(_))));

	Ok(())
}
