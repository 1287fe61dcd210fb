use std::fmt;
use std::path::Path;
use std::path::PathBuf;

use crate::MdpressResult;
use crate::config::BuildConfig;
use crate::html;
use crate::html::HtmlReport;
use crate::locator::locate_documents;
use crate::pdf;
use crate::toc::AnchorStyle;
use crate::toc::TocOptions;
use crate::toc::synthesize_file;

/// One stage of a pipeline run. Stages execute sequentially in the order
/// the task's stage list declares.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Stage {
	SynthesizeToc,
	RenderHtml,
	RenderPdf,
}

/// The named tasks the invocation surface exposes. Each maps to an ordered
/// stage list — an explicit table, no discovery mechanism.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub enum Task {
	/// TOC synthesis only. This is also the default task.
	#[default]
	Toc,
	/// TOC synthesis, then the HTML batch.
	Html,
	/// TOC synthesis, then the PDF conversion.
	Pdf,
}

impl Task {
	/// The ordered stages this task runs. TOC synthesis always comes first
	/// so downstream renderers see the updated table of contents.
	pub fn stages(self) -> &'static [Stage] {
		match self {
			Self::Toc => &[Stage::SynthesizeToc],
			Self::Html => &[Stage::SynthesizeToc, Stage::RenderHtml],
			Self::Pdf => &[Stage::SynthesizeToc, Stage::RenderPdf],
		}
	}
}

impl fmt::Display for Task {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Toc => write!(f, "toc"),
			Self::Html => write!(f, "html"),
			Self::Pdf => write!(f, "pdf"),
		}
	}
}

/// Pipeline progression for one invocation. Each run starts fresh from
/// `Idle`; `Done` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum PipelineState {
	Idle,
	Locating,
	SynthesizingToc,
	Rendering,
	Done,
	Failed,
}

/// Aggregate result of one task run.
#[derive(Debug)]
pub struct TaskReport {
	pub task: Task,
	/// Whether TOC synthesis rewrote the target document.
	pub toc_changed: bool,
	/// The HTML batch report, when the task included HTML rendering.
	pub html: Option<HtmlReport>,
	/// The PDF path written, when the task included PDF rendering.
	pub pdf_path: Option<PathBuf>,
}

impl TaskReport {
	/// True when every required step succeeded and no document failed.
	pub fn is_success(&self) -> bool {
		self.html.as_ref().is_none_or(HtmlReport::is_ok)
	}
}

fn transition(state: &mut PipelineState, next: PipelineState) {
	tracing::debug!(from = ?state, to = ?next, "pipeline transition");
	*state = next;
}

/// Run one named task against the project at `root`.
///
/// Fatal errors (config, I/O, TOC or PDF failure) return `Err`; per-document
/// HTML failures are carried in the report and reflected by
/// [`TaskReport::is_success`].
pub fn run_task(root: &Path, config: &BuildConfig, task: Task) -> MdpressResult<TaskReport> {
	let mut state = PipelineState::Idle;
	let mut report = TaskReport {
		task,
		toc_changed: false,
		html: None,
		pdf_path: None,
	};

	let style = if config.toc.bitbucket {
		AnchorStyle::Bitbucket
	} else {
		AnchorStyle::Github
	};

	for stage in task.stages() {
		let result = match stage {
			Stage::SynthesizeToc => {
				transition(&mut state, PipelineState::SynthesizingToc);
				let target = root.join(&config.toc.target);
				let options = TocOptions::from_config(&config.toc);
				synthesize_file(&target, &options).map(|changed| {
					report.toc_changed = changed;
				})
			}
			Stage::RenderHtml => {
				transition(&mut state, PipelineState::Locating);
				locate_documents(root, &config.source, &config.html.out_dir).and_then(
					|documents| {
						transition(&mut state, PipelineState::Rendering);
						html::render_all(root, &documents, &config.html, style).map(|html| {
							report.html = Some(html);
						})
					},
				)
			}
			Stage::RenderPdf => {
				transition(&mut state, PipelineState::Rendering);
				pdf::render_pdf_file(root, config.pdf_source(), &config.pdf).map(|dest| {
					report.pdf_path = Some(dest);
				})
			}
		};

		if let Err(e) = result {
			transition(&mut state, PipelineState::Failed);
			return Err(e);
		}
	}

	let done = if report.is_success() {
		PipelineState::Done
	} else {
		PipelineState::Failed
	};
	transition(&mut state, done);
	Ok(report)
}
