//! `mdpress_core` is the core library for the mdpress document-build
//! pipeline. It discovers markdown source documents, synthesizes a table of
//! contents into a designated document, and renders HTML and PDF outputs
//! from a single source of truth.
//!
//! ## Pipeline
//!
//! ```text
//! mdpress.toml
//!   → BuildConfig (loaded once, passed explicitly — never ambient)
//!   → Document Locator (glob → sorted file list)
//!   → TOC Synthesizer (idempotent in-place rewrite, sentinel-delimited)
//!   → HTML Renderer (per-document, mirrored output tree, partial-failure)
//!   → PDF Renderer (one document → one paginated artifact)
//! ```
//!
//! TOC synthesis always runs first so the renderers see the updated table
//! of contents; the two renderers are independent of each other.
//!
//! ## Modules
//!
//! - [`config`] — Configuration loading from `mdpress.toml`: source
//!   patterns, output roots, TOC header and anchor style.
//! - [`locator`] — Glob-driven document discovery with deterministic
//!   ordering.
//! - [`toc`] — Heading extraction, anchor slugs, and the pure
//!   `synthesize` transformation plus its thin file wrapper.
//! - [`html`] — Markdown → HTML batch rendering with per-document failure
//!   collection.
//! - [`pdf`] — Markdown → paginated PDF with default styling.
//! - [`pipeline`] — The task → stage dispatcher and its state machine.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use mdpress_core::BuildConfig;
//! use mdpress_core::Task;
//! use mdpress_core::run_task;
//!
//! let root = Path::new(".");
//! let config = BuildConfig::load(root).unwrap();
//! let report = run_task(root, &config, Task::Html).unwrap();
//! if !report.is_success() {
//! 	eprintln!("some documents failed to render");
//! }
//! ```

pub use config::*;
pub use error::*;
pub use html::*;
pub use locator::*;
pub use pdf::*;
pub use pipeline::*;
pub use target::*;
pub use toc::*;

pub mod config;
mod error;
pub mod html;
pub mod locator;
pub mod pdf;
pub mod pipeline;
mod target;
pub mod toc;

#[cfg(test)]
mod __tests;
