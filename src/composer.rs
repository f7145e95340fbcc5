//! # Statement Composer
//!
//! Lays a [`Statement`] out on a [`Document`] in three phases: header,
//! charge details, footer. Each phase only moves forward; the shared
//! cursor of the content box carries the position from one to the next.
//!
//! Page geometry: a full-page box (612x792, no margin) holds a content box
//! inset 85pt from both side edges.

use crate::config::RenderConfig;
use crate::error::Result;
use crate::font::PRIMARY_FAMILY;
use crate::layout::{Document, Overflow, Table, TextOptions, PAGE_HEIGHT, PAGE_WIDTH};
use crate::model::{FontFamilyInput, Statement};
use crate::pdf::PdfRenderer;
use crate::render::{Point, Renderer};
use crate::style::ADDRESS_COLOR;

const CONTENT_X: f64 = 85.0;
const CONTENT_WIDTH: f64 = 442.0;

const LOGO_HEIGHT: f64 = 32.0;

const BILL_TO_WIDTH: f64 = 200.0;
const BILL_TO_HEIGHT: f64 = 75.0;
const DATES_X: f64 = 250.0;
const DATES_WIDTH: f64 = 200.0;

fn body_text() -> TextOptions {
    TextOptions::sized(12.0).leading(4.0)
}

impl Statement {
    /// Render to PDF bytes.
    pub fn render(&self, config: &RenderConfig) -> Result<Vec<u8>> {
        self.render_with(PdfRenderer::new(), config)
    }

    /// Render through any [`Renderer`].
    pub fn render_with<R: Renderer>(&self, renderer: R, config: &RenderConfig) -> Result<Vec<u8>> {
        let fonts = match &self.font {
            Some(family) => Some(load_font_family(family, config)?),
            None => None,
        };

        let mut doc = Document::new(renderer, config);
        if let Some((normal, bold)) = fonts {
            doc.register_font(PRIMARY_FAMILY, false, normal)?;
            if let Some(bold) = bold {
                doc.register_font(PRIMARY_FAMILY, true, bold)?;
            }
            doc.set_font_family(PRIMARY_FAMILY);
        }

        compose(&mut doc, self)?;
        doc.finish()
    }
}

fn load_font_family(
    family: &FontFamilyInput,
    config: &RenderConfig,
) -> Result<(Vec<u8>, Option<Vec<u8>>)> {
    let normal = family.normal.load(&config.fetch)?;
    let bold = match &family.bold {
        Some(source) => Some(source.load(&config.fetch)?),
        None => None,
    };
    Ok((normal, bold))
}

/// Lay the whole statement out on `doc`.
pub fn compose<R: Renderer>(doc: &mut Document<R>, statement: &Statement) -> Result<()> {
    doc.with_box(Point::default(), PAGE_WIDTH, Some(PAGE_HEIGHT), |doc| {
        doc.with_box(
            Point::new(CONTENT_X, 0.0),
            CONTENT_WIDTH,
            Some(PAGE_HEIGHT),
            |doc| {
                header(doc, statement)?;
                charge_details(doc, statement)?;
                footer(doc, statement)
            },
        )
    })
}

fn header<R: Renderer>(doc: &mut Document<R>, statement: &Statement) -> Result<()> {
    log::debug!("composing header");
    doc.move_down(60.0)?;

    match &statement.company.logo {
        Some(logo) => {
            doc.image(logo, LOGO_HEIGHT)?;
        }
        None => doc.move_down(LOGO_HEIGHT)?,
    }

    doc.move_down(8.0)?;
    doc.label(&statement.subheading)?;
    doc.move_down(10.0)?;

    // Both boxes start at the same height.
    let top = doc.cursor_y()?;

    doc.with_box(Point::new(0.0, top), BILL_TO_WIDTH, None, |doc| {
        doc.move_down(5.0)?;
        let y = doc.cursor_y()?;
        doc.text_box(
            &statement.bill_to,
            Point::new(0.0, y),
            BILL_TO_WIDTH,
            BILL_TO_HEIGHT,
            &TextOptions::sized(10.0)
                .leading(4.0)
                .overflow(Overflow::ShrinkToFit),
        )?;
        Ok(())
    })?;

    doc.with_box(Point::new(DATES_X, top), DATES_WIDTH, None, |doc| {
        doc.label(&statement.statement_date_text)?;
        doc.move_down(5.0)?;
        doc.text(&statement.issue_date, &body_text())?;

        doc.move_down(10.0)?;
        doc.label(&statement.statement_period_text)?;
        doc.move_down(5.0)?;
        doc.text(&statement.period, &body_text())?;
        Ok(())
    })
}

fn charge_details<R: Renderer>(doc: &mut Document<R>, statement: &Statement) -> Result<()> {
    log::debug!(
        "composing charge details ({} rows)",
        statement.line_items.len()
    );
    doc.move_down(30.0)?;
    let table = Table::new(statement.line_items.clone(), statement.table_style.clone());
    doc.table(&table)?;
    Ok(())
}

fn footer<R: Renderer>(doc: &mut Document<R>, statement: &Statement) -> Result<()> {
    log::debug!("composing footer");
    doc.move_down(30.0)?;
    doc.text(&statement.message, &body_text())?;

    doc.move_down(30.0)?;
    doc.text(&statement.company.name, &TextOptions::default())?;
    doc.text(
        &statement.company.address.clone().colored(ADDRESS_COLOR),
        &TextOptions::default(),
    )?;
    Ok(())
}
