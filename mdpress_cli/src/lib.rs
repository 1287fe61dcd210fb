use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;

#[derive(Parser)]
#[command(
	author,
	version,
	about = "Build HTML, PDF, and tables of contents from your markdown documents.",
	long_about = "mdpress is a markdown document-build pipeline. It discovers the markdown \
	              sources of a project, keeps a generated table of contents synchronized inside \
	              a designated document, and renders standalone HTML pages and a paginated PDF \
	              from the same sources.\n\nQuick start:\n  mdpress init  Create a sample \
	              mdpress.toml\n  mdpress toc   Synthesize the table of contents\n  mdpress html  \
	              Render every document to HTML\n  mdpress pdf   Convert the designated document \
	              to PDF\n\nRunning `mdpress` with no subcommand is the same as `mdpress toc`."
)]
pub struct MdpressCli {
	#[command(subcommand)]
	pub command: Option<Commands>,

	/// Path to the project root directory.
	#[arg(long, short, global = true)]
	pub path: Option<PathBuf>,

	/// Enable verbose output.
	#[arg(long, short, global = true, default_value_t = false)]
	pub verbose: bool,

	/// Disable colored output.
	#[arg(long, global = true, default_value_t = false)]
	pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
	/// Initialize mdpress in a project by creating a sample config file.
	///
	/// Creates an `mdpress.toml` file in the project root with the default
	/// settings spelled out and commented. If the file already exists, this
	/// command is a no-op and exits successfully.
	Init,
	/// Synthesize the table of contents into the target document.
	///
	/// Extracts every heading from the configured target, generates a nested
	/// link list, and splices it under the configured header line between
	/// sentinel comments. Re-running against its own output is a no-op.
	///
	/// This is the default when no subcommand is given.
	Toc {
		/// Verify the TOC is up to date without writing. Exits with a
		/// non-zero status code when the document would change. Ideal for CI
		/// pipelines.
		#[arg(long, default_value_t = false)]
		check: bool,

		/// Show a unified diff between the current document and what
		/// synthesis produces.
		#[arg(long, default_value_t = false)]
		diff: bool,

		/// Preview the synthesized document without writing to disk.
		#[arg(long, default_value_t = false)]
		dry_run: bool,
	},
	/// Render every discovered markdown document to a standalone HTML page.
	///
	/// Synthesizes the table of contents first, then converts each document
	/// matched by the `[source]` pattern into the output directory, mirroring
	/// the source tree with the extension replaced by `.html`. A document
	/// that fails to render is reported and skipped; the rest of the batch
	/// still completes.
	Html,
	/// Convert the designated document to a paginated PDF.
	///
	/// Synthesizes the table of contents first, then lays out the `[pdf]`
	/// source (the TOC target by default) onto A4 pages with default styling
	/// and writes a single artifact to the configured destination.
	Pdf,
}
