use std::collections::HashSet;
use std::path::Path;
use std::path::PathBuf;

use globset::GlobBuilder;
use globset::GlobSet;
use globset::GlobSetBuilder;
use ignore::gitignore::Gitignore;
use ignore::gitignore::GitignoreBuilder;

use crate::MdpressError;
use crate::MdpressResult;
use crate::config::SourceConfig;

/// Build a `GlobSet` from the configured pattern strings. `*` stops at path
/// separators, so the default `*.md` matches the project root only and
/// `docs/**/*.md` reaches into subtrees. Invalid patterns are reported
/// rather than silently skipped — a typo here would otherwise surface as a
/// confusing `NoDocumentsFound`.
fn build_glob_set(patterns: &[&str]) -> MdpressResult<GlobSet> {
	let mut builder = GlobSetBuilder::new();
	for pattern in patterns {
		let glob = GlobBuilder::new(pattern)
			.literal_separator(true)
			.build()
			.map_err(|e| MdpressError::InvalidPattern {
				pattern: (*pattern).to_string(),
				reason: e.to_string(),
			})?;
		builder.add(glob);
	}
	builder.build().map_err(|e| MdpressError::InvalidPattern {
		pattern: patterns.join(", "),
		reason: e.to_string(),
	})
}

/// Build a `Gitignore` matcher from the `[source] exclude` patterns. These
/// follow gitignore syntax and are relative to the project root.
fn build_exclude_matcher(root: &Path, patterns: &[String]) -> MdpressResult<Gitignore> {
	let mut builder = GitignoreBuilder::new(root);
	for pattern in patterns {
		builder.add_line(None, pattern).map_err(|e| {
			MdpressError::ConfigParse(format!("invalid exclude pattern `{pattern}`: {e}"))
		})?;
	}
	builder
		.build()
		.map_err(|e| MdpressError::ConfigParse(format!("failed to build exclude rules: {e}")))
}

fn is_ignored_directory_name(name: &str) -> bool {
	name.starts_with('.') || name == "node_modules" || name == "target"
}

/// Resolve the configured glob pattern(s) against `root` and return a
/// sorted, deduplicated list of matching files. Directories never match.
///
/// The HTML output root (`skip_dir`) is excluded from the walk so that a
/// previous run's artifacts are never picked up as sources.
///
/// Zero matches is surfaced as [`MdpressError::NoDocumentsFound`]; the
/// caller decides whether that is fatal.
pub fn locate_documents(
	root: &Path,
	source: &SourceConfig,
	skip_dir: &Path,
) -> MdpressResult<Vec<PathBuf>> {
	let patterns = source.pattern.patterns();
	let glob_set = build_glob_set(&patterns)?;
	let exclude = build_exclude_matcher(root, &source.exclude)?;
	let skip_abs = root.join(skip_dir);

	let mut files = Vec::new();
	let mut visited = HashSet::new();
	walk_dir(root, root, &glob_set, &exclude, &skip_abs, &mut files, &mut visited)?;

	// Sort for deterministic ordering.
	files.sort();
	files.dedup();

	if files.is_empty() {
		return Err(MdpressError::NoDocumentsFound {
			pattern: source.pattern.display(),
		});
	}

	tracing::debug!(count = files.len(), "located source documents");
	Ok(files)
}

fn walk_dir(
	root: &Path,
	dir: &Path,
	glob_set: &GlobSet,
	exclude: &Gitignore,
	skip_abs: &Path,
	files: &mut Vec<PathBuf>,
	visited: &mut HashSet<PathBuf>,
) -> MdpressResult<()> {
	if !dir.is_dir() {
		return Ok(());
	}

	// Track canonical paths so symlink cycles terminate.
	let canonical = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
	if !visited.insert(canonical) {
		return Ok(());
	}

	for entry in std::fs::read_dir(dir)? {
		let entry = entry?;
		let path = entry.path();
		let is_dir = path.is_dir();

		if is_dir {
			if path == skip_abs {
				continue;
			}
			if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
				if is_ignored_directory_name(name) {
					continue;
				}
			}
		}

		if exclude.matched(&path, is_dir).is_ignore() {
			continue;
		}

		if is_dir {
			walk_dir(root, &path, glob_set, exclude, skip_abs, files, visited)?;
			continue;
		}

		let relative = path.strip_prefix(root).unwrap_or(&path);
		if glob_set.is_match(relative) {
			files.push(path);
		}
	}

	Ok(())
}
