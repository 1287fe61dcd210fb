use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum MdpressError {
	#[error(transparent)]
	#[diagnostic(code(mdpress::io_error))]
	Io(#[from] std::io::Error),

	#[error("no documents matched pattern: `{pattern}`")]
	#[diagnostic(
		code(mdpress::no_documents),
		help("check the `pattern` value under `[source]` in mdpress.toml")
	)]
	NoDocumentsFound { pattern: String },

	#[error("TOC header `{header}` not found in {file}")]
	#[diagnostic(
		code(mdpress::toc_header_missing),
		help(
			"add the header line to the document, or set `missing_header = \
			 \"insert-at-top\"` under `[toc]` in mdpress.toml"
		)
	)]
	TocHeaderMissing { header: String, file: String },

	#[error("failed to render `{file}`: {reason}")]
	#[diagnostic(code(mdpress::document_render))]
	DocumentRender { file: String, reason: String },

	#[error("PDF rendering failed: {0}")]
	#[diagnostic(code(mdpress::pdf_render))]
	PdfRender(String),

	#[error("failed to parse config file: {0}")]
	#[diagnostic(
		code(mdpress::config_parse),
		help("check that mdpress.toml is valid TOML; run `mdpress init` for a sample")
	)]
	ConfigParse(String),

	#[error("failure to load markdown: {0}")]
	#[diagnostic(code(mdpress::markdown))]
	Markdown(String),

	#[error("invalid glob pattern `{pattern}`: {reason}")]
	#[diagnostic(code(mdpress::invalid_pattern))]
	InvalidPattern { pattern: String, reason: String },
}

pub type MdpressResult<T> = Result<T, MdpressError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;
