use std::path::Path;
use std::path::PathBuf;

/// Output format of a single conversion unit.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum OutputFormat {
	Html,
	Pdf,
}

impl OutputFormat {
	/// The file extension written for this format.
	pub fn extension(self) -> &'static str {
		match self {
			Self::Html => "html",
			Self::Pdf => "pdf",
		}
	}
}

/// One conversion unit: a source document, its destination path, and the
/// format written there. Destination paths mirror the source's relative
/// position under the output root with the extension replaced.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct RenderTarget {
	pub source: PathBuf,
	pub dest: PathBuf,
	pub format: OutputFormat,
}

impl RenderTarget {
	/// Plan a target for `source` under `out_root`, mirroring its position
	/// relative to `root`.
	pub fn mirrored(root: &Path, source: &Path, out_root: &Path, format: OutputFormat) -> Self {
		let relative = source.strip_prefix(root).unwrap_or(source);
		let dest = out_root.join(relative).with_extension(format.extension());
		Self {
			source: source.to_path_buf(),
			dest,
			format,
		}
	}
}
