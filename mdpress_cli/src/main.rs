use std::path::Path;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use mdpress_cli::Commands;
use mdpress_cli::MdpressCli;
use mdpress_core::BuildConfig;
use mdpress_core::Task;
use mdpress_core::TaskReport;
use mdpress_core::TocOptions;
use mdpress_core::run_task;
use mdpress_core::synthesize;
use mdpress_core::synthesize_file;
use owo_colors::OwoColorize;
use similar::ChangeTag;
use similar::TextDiff;
use tracing_subscriber::EnvFilter;

static USE_COLOR: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(true);

fn color_enabled() -> bool {
	USE_COLOR.load(std::sync::atomic::Ordering::Relaxed)
}

/// Apply ANSI color codes only when color is enabled.
macro_rules! colored {
	($text:expr,red) => {
		if color_enabled() {
			format!("{}", $text.red())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,green) => {
		if color_enabled() {
			format!("{}", $text.green())
		} else {
			format!("{}", $text)
		}
	};
}

fn main() {
	let args = MdpressCli::parse();

	// Respect NO_COLOR env var and --no-color flag.
	let use_color = !args.no_color && std::env::var_os("NO_COLOR").is_none();
	if !use_color {
		USE_COLOR.store(false, std::sync::atomic::Ordering::Relaxed);
	}

	// Install miette's fancy handler for rich error diagnostics.
	miette::set_hook(Box::new(move |_| {
		Box::new(
			miette::MietteHandlerOpts::new()
				.color(use_color)
				.unicode(use_color)
				.build(),
		)
	}))
	.ok();

	init_tracing(args.verbose, use_color);

	let result = match args.command {
		Some(Commands::Init) => run_init(&args),
		Some(Commands::Toc {
			check,
			diff,
			dry_run,
		}) => run_toc(&args, check, diff, dry_run),
		Some(Commands::Html) => run_html(&args),
		Some(Commands::Pdf) => run_pdf(&args),
		// Bare `mdpress` synthesizes the TOC.
		None => run_toc(&args, false, false, false),
	};

	if let Err(e) = result {
		// Try to render through miette for rich diagnostics with help text
		// and error codes.
		match e.downcast::<mdpress_core::MdpressError>() {
			Ok(core_err) => {
				let report: miette::Report = (*core_err).into();
				eprintln!("{report:?}");
			}
			Err(e) => {
				eprintln!("{} {e}", colored!("error:", red));
			}
		}
		process::exit(2);
	}
}

/// Route logs to stderr so generated output and summaries stay clean on
/// stdout. `MDPRESS_LOG` overrides the level; `--verbose` bumps it to debug.
fn init_tracing(verbose: bool, use_color: bool) {
	let default_level = if verbose { "debug" } else { "warn" };
	let filter = EnvFilter::try_from_env("MDPRESS_LOG")
		.unwrap_or_else(|_| EnvFilter::new(default_level));

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_ansi(use_color)
		.with_target(false)
		.init();
}

fn resolve_root(args: &MdpressCli) -> PathBuf {
	args.path
		.clone()
		.unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

/// Make a path relative to root for display purposes.
fn make_relative(path: &Path, root: &Path) -> String {
	path.strip_prefix(root)
		.unwrap_or(path)
		.display()
		.to_string()
}

fn run_init(args: &MdpressCli) -> Result<(), Box<dyn std::error::Error>> {
	let root = resolve_root(args);
	let config_path = root.join("mdpress.toml");

	if config_path.exists() {
		println!("Config file already exists: {}", config_path.display());
		return Ok(());
	}

	let sample_config = "# mdpress configuration\n\n[source]\n# Glob pattern(s) for the markdown \
	                     documents to build, relative to the project\n# root. A plain `*.md` \
	                     matches the root only; use `**` to reach into\n# subdirectories.\npattern \
	                     = \"*.md\"\n# Gitignore-style patterns to exclude from \
	                     discovery.\n# exclude = [\"drafts/\"]\n\n[html]\n# Output directory for \
	                     rendered HTML pages. The source tree is mirrored\n# underneath \
	                     it.\nout_dir = \"html\"\n\n[pdf]\n# The single document the `pdf` task \
	                     converts. Defaults to the TOC target.\n# source = \"README.md\"\n# \
	                     Destination path. A trailing `/` (or an existing directory) \
	                     receives\n# `<source-stem>.pdf`.\ndest = \"pdf/\"\n\n[toc]\n# The \
	                     document rewritten in place with the generated table of \
	                     contents.\ntarget = \"README.md\"\n# The header line the TOC is inserted \
	                     under.\nheader = \"## Table of Contents\"\n# Use Bitbucket-style anchors \
	                     instead of GitHub-style slugs.\nbitbucket = false\n# What to do when the \
	                     header line is missing: \"insert-at-top\" or \"fail\".\nmissing_header = \
	                     \"insert-at-top\"\n";

	std::fs::write(&config_path, sample_config)?;
	println!("Created mdpress.toml");
	println!();
	println!("Next steps:");
	println!("  1. Point `[toc] target` at the document that carries your TOC");
	println!("  2. Run `mdpress toc` to synthesize the table of contents");
	println!("  3. Run `mdpress html` or `mdpress pdf` to build outputs");

	Ok(())
}

fn run_toc(
	args: &MdpressCli,
	check: bool,
	show_diff: bool,
	dry_run: bool,
) -> Result<(), Box<dyn std::error::Error>> {
	let root = resolve_root(args);
	let config = BuildConfig::load(&root)?;
	let target = root.join(&config.toc.target);
	let options = TocOptions::from_config(&config.toc);

	if check || dry_run || show_diff {
		let current = std::fs::read_to_string(&target)?;
		let updated = synthesize(&current, &options)?;
		let rel = make_relative(&target, &root);

		if updated == current {
			println!("TOC is up to date: {rel}");
			return Ok(());
		}

		if show_diff {
			print_diff(&current, &updated);
		}

		if check {
			eprintln!(
				"{} TOC is out of date: {rel}. Run `mdpress toc` to fix.",
				colored!("check failed:", red)
			);
			process::exit(1);
		}

		println!("Dry run: would update {rel}");
		return Ok(());
	}

	let changed = synthesize_file(&target, &options)?;
	let rel = make_relative(&target, &root);
	if changed {
		println!("Synthesized TOC in {rel}");
	} else {
		println!("TOC is already up to date: {rel}");
	}

	Ok(())
}

fn run_html(args: &MdpressCli) -> Result<(), Box<dyn std::error::Error>> {
	let root = resolve_root(args);
	let config = BuildConfig::load(&root)?;
	let report = run_task(&root, &config, Task::Html)?;

	print_task_summary(args, &config, &report, &root);

	if !report.is_success() {
		process::exit(1);
	}

	Ok(())
}

fn run_pdf(args: &MdpressCli) -> Result<(), Box<dyn std::error::Error>> {
	let root = resolve_root(args);
	let config = BuildConfig::load(&root)?;
	let report = run_task(&root, &config, Task::Pdf)?;

	print_task_summary(args, &config, &report, &root);

	Ok(())
}

fn print_task_summary(args: &MdpressCli, config: &BuildConfig, report: &TaskReport, root: &Path) {
	if report.toc_changed {
		println!(
			"Synthesized TOC in {}",
			make_relative(&root.join(&config.toc.target), root)
		);
	}

	if let Some(html) = &report.html {
		println!(
			"Rendered {} document(s), {} failure(s).",
			html.written.len(),
			html.failures.len()
		);

		if args.verbose {
			for dest in &html.written {
				println!("  {}", make_relative(dest, root));
			}
		}

		for failure in &html.failures {
			let report: miette::Report = failure.to_error().into();
			eprintln!("{report:?}");
		}
	}

	if let Some(pdf_path) = &report.pdf_path {
		println!("Wrote {}", make_relative(pdf_path, root));
	}
}

/// Print a unified diff between two strings, colorized.
fn print_diff(current: &str, expected: &str) {
	let diff = TextDiff::from_lines(current, expected);
	for change in diff.iter_all_changes() {
		match change.tag() {
			ChangeTag::Delete => {
				eprint!("  {}", colored!(format!("-{change}"), red));
			}
			ChangeTag::Insert => {
				eprint!("  {}", colored!(format!("+{change}"), green));
			}
			ChangeTag::Equal => {
				eprint!("   {change}");
			}
		}
	}
}
