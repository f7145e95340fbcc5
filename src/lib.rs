//! # Folio
//!
//! A page-native statement renderer.
//!
//! A statement (company header, bill-to block, dates, a table of charges
//! and a footer) is laid out with a cursor inside a stack of nested
//! bounding boxes. Every placement decision is made against the page
//! boundary: text that reaches the bottom continues on a new page, and a
//! charge table carries its header row with it.
//!
//! ## Architecture
//!
//! ```text
//! Input (JSON/serde)
//!       ↓
//!   [model]     — StatementInput -> Statement, defaults resolved
//!       ↓
//!   [composer]  — header, charge details, footer
//!       ↓
//!   [layout]    — box stack, flowing text, tables, page breaks
//!       ↓
//!   [render]    — Renderer trait (absolute page coordinates)
//!       ↓
//!   [pdf]       — record pages, serialize to PDF bytes
//! ```

pub mod composer;
pub mod config;
pub mod error;
pub mod font;
pub mod image_loader;
pub mod layout;
pub mod model;
pub mod pdf;
pub mod render;
pub mod style;
pub mod text;

pub use config::{FetchConfig, LayoutConfig, PaginationConfig, RenderConfig};
pub use error::{FolioError, Result};
pub use model::{Statement, StatementInput};
pub use pdf::PdfRenderer;
pub use render::{Metadata, Renderer};

/// Render a statement to PDF bytes with the default configuration.
///
/// This is the primary entry point. Validation happens before anything
/// is drawn: a statement missing a required field fails without output.
pub fn render(input: &StatementInput) -> Result<Vec<u8>> {
    render_with_config(input, &RenderConfig::default())
}

/// Render a statement to PDF bytes.
pub fn render_with_config(input: &StatementInput, config: &RenderConfig) -> Result<Vec<u8>> {
    render_to(PdfRenderer::new(), input, config)
}

/// Render a statement through any [`Renderer`].
pub fn render_to<R: Renderer>(
    renderer: R,
    input: &StatementInput,
    config: &RenderConfig,
) -> Result<Vec<u8>> {
    let statement = Statement::new(input.clone())?;
    log::debug!(
        "rendering statement {}",
        statement.id.as_deref().unwrap_or("(no id)")
    );
    statement.render_with(renderer, config)
}

/// Render a statement described as JSON to PDF bytes.
pub fn render_json(json: &str) -> Result<Vec<u8>> {
    let statement = Statement::from_json(json)?;
    statement.render(&RenderConfig::default())
}
