use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;

use crate::MdpressError;
use crate::MdpressResult;

/// Supported config file locations in discovery order (highest precedence
/// first).
pub const CONFIG_FILE_CANDIDATES: [&str; 3] =
	["mdpress.toml", ".mdpress.toml", ".config/mdpress.toml"];

/// Glob pattern(s) for a `[source]` entry.
///
/// A single pattern:
///
/// ```toml
/// [source]
/// pattern = "*.md"
/// ```
///
/// Or several:
///
/// ```toml
/// [source]
/// pattern = ["docs/**/*.md", "readme.md"]
/// ```
#[derive(Debug, Clone, Deserialize, Eq, PartialEq)]
#[serde(untagged)]
#[non_exhaustive]
pub enum PatternValue {
	One(String),
	Many(Vec<String>),
}

impl PatternValue {
	/// Returns the configured patterns as a slice-like vector, in order.
	pub fn patterns(&self) -> Vec<&str> {
		match self {
			Self::One(pattern) => vec![pattern.as_str()],
			Self::Many(patterns) => patterns.iter().map(String::as_str).collect(),
		}
	}

	/// A display form used in error messages.
	pub fn display(&self) -> String {
		self.patterns().join(", ")
	}
}

impl Default for PatternValue {
	fn default() -> Self {
		Self::One(DEFAULT_SOURCE_PATTERN.to_string())
	}
}

pub const DEFAULT_SOURCE_PATTERN: &str = "*.md";
pub const DEFAULT_HTML_OUT_DIR: &str = "html";
pub const DEFAULT_TOC_TARGET: &str = "README.md";
pub const DEFAULT_TOC_HEADER: &str = "## Table of Contents";
pub const DEFAULT_PDF_DEST: &str = "pdf/";

/// Configuration for document discovery.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourceConfig {
	/// Glob pattern(s) matched against paths relative to the project root.
	#[serde(default)]
	pub pattern: PatternValue,
	/// Additional gitignore-style patterns to exclude from discovery.
	#[serde(default)]
	pub exclude: Vec<String>,
}

/// Configuration for the HTML renderer.
#[derive(Debug, Clone, Deserialize)]
pub struct HtmlConfig {
	/// Output root directory, relative to the project root. Destination
	/// paths mirror each source's relative position under this root with the
	/// extension replaced by `.html`.
	#[serde(default = "default_html_out_dir")]
	pub out_dir: PathBuf,
}

impl Default for HtmlConfig {
	fn default() -> Self {
		Self {
			out_dir: default_html_out_dir(),
		}
	}
}

/// Configuration for the PDF renderer.
#[derive(Debug, Clone, Deserialize)]
pub struct PdfConfig {
	/// The single document converted by the `pdf` task. Defaults to the TOC
	/// target when absent.
	#[serde(default)]
	pub source: Option<PathBuf>,
	/// Destination path. A value naming a directory (existing directory or
	/// trailing `/`) receives `<source-stem>.pdf`; any other value is used
	/// verbatim.
	#[serde(default = "default_pdf_dest")]
	pub dest: PathBuf,
	/// Page width in millimetres.
	#[serde(default = "default_page_width")]
	pub page_width: f32,
	/// Page height in millimetres.
	#[serde(default = "default_page_height")]
	pub page_height: f32,
	/// Page margin in millimetres, applied on all four sides.
	#[serde(default = "default_margin")]
	pub margin: f32,
}

impl Default for PdfConfig {
	fn default() -> Self {
		Self {
			source: None,
			dest: default_pdf_dest(),
			page_width: default_page_width(),
			page_height: default_page_height(),
			margin: default_margin(),
		}
	}
}

/// Policy applied when the configured TOC header line is absent from the
/// target document.
#[derive(Debug, Clone, Copy, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub enum MissingHeaderPolicy {
	/// Prepend the header and the generated TOC at the top of the document.
	#[default]
	InsertAtTop,
	/// Fail the task with `TocHeaderMissing`.
	Fail,
}

/// Configuration for TOC synthesis.
#[derive(Debug, Clone, Deserialize)]
pub struct TocConfig {
	/// The document rewritten in place with the generated TOC.
	#[serde(default = "default_toc_target")]
	pub target: PathBuf,
	/// The header line the TOC is inserted under, matched by trimmed string
	/// equality against each line of the document. Must be a single line.
	#[serde(default = "default_toc_header")]
	pub header: String,
	/// Use Bitbucket's `markdown-header-` anchor convention instead of
	/// GitHub-style slugs.
	#[serde(default)]
	pub bitbucket: bool,
	/// What to do when the header line is not found.
	#[serde(default)]
	pub missing_header: MissingHeaderPolicy,
}

impl Default for TocConfig {
	fn default() -> Self {
		Self {
			target: default_toc_target(),
			header: default_toc_header(),
			bitbucket: false,
			missing_header: MissingHeaderPolicy::default(),
		}
	}
}

/// Configuration loaded once at startup from an `mdpress.toml` file and
/// passed explicitly into each pipeline component. Never mutated after load.
///
/// ```toml
/// [source]
/// pattern = "*.md"
///
/// [html]
/// out_dir = "html"
///
/// [pdf]
/// source = "standards.md"
/// dest = "pdf/"
///
/// [toc]
/// target = "standards.md"
/// header = "## Table of Contents"
/// bitbucket = false
/// missing_header = "insert-at-top"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BuildConfig {
	#[serde(default)]
	pub source: SourceConfig,
	#[serde(default)]
	pub html: HtmlConfig,
	#[serde(default)]
	pub pdf: PdfConfig,
	#[serde(default)]
	pub toc: TocConfig,
}

impl BuildConfig {
	/// Resolve the config path from known discovery candidates.
	#[must_use]
	pub fn resolve_path(root: &Path) -> Option<PathBuf> {
		CONFIG_FILE_CANDIDATES
			.iter()
			.map(|candidate| root.join(candidate))
			.find(|path| path.is_file())
	}

	/// Load the config from the first discovered config file at `root`.
	/// Returns the defaults when no config file exists.
	pub fn load(root: &Path) -> MdpressResult<BuildConfig> {
		let Some(config_path) = Self::resolve_path(root) else {
			return Ok(BuildConfig::default());
		};

		let content = std::fs::read_to_string(&config_path)?;
		let config: BuildConfig =
			toml::from_str(&content).map_err(|e| MdpressError::ConfigParse(e.to_string()))?;
		config.validate()?;

		Ok(config)
	}

	/// Cross-field constraints that TOML typing cannot express.
	fn validate(&self) -> MdpressResult<()> {
		// The TOC header is matched line by line against the target document,
		// so a multi-line value could never match.
		if self.toc.header.contains('\n') {
			return Err(MdpressError::ConfigParse(
				"`[toc] header` must be a single line".to_string(),
			));
		}
		Ok(())
	}

	/// The document the `pdf` task converts: the explicit `[pdf] source`, or
	/// the TOC target when none is configured.
	pub fn pdf_source(&self) -> &Path {
		self.pdf.source.as_deref().unwrap_or(&self.toc.target)
	}
}

fn default_html_out_dir() -> PathBuf {
	PathBuf::from(DEFAULT_HTML_OUT_DIR)
}

fn default_pdf_dest() -> PathBuf {
	PathBuf::from(DEFAULT_PDF_DEST)
}

fn default_toc_target() -> PathBuf {
	PathBuf::from(DEFAULT_TOC_TARGET)
}

fn default_toc_header() -> String {
	DEFAULT_TOC_HEADER.to_string()
}

fn default_page_width() -> f32 {
	210.0
}

fn default_page_height() -> f32 {
	297.0
}

fn default_margin() -> f32 {
	20.0
}
