//! Integration tests for the folio rendering pipeline.
//!
//! These tests exercise the full path from statement input to PDF output.
//! They verify:
//! - Every page is US Letter and output is byte-for-byte reproducible
//! - Defaults are resolved before layout
//! - The bill-to block shrinks instead of spilling
//! - Charge tables paginate and repeat their header
//! - Nested boxes translate coordinates
//! - Validation failures happen before anything is drawn

use pretty_assertions::assert_eq;

use folio::font::{FontContext, LineMetrics, DEFAULT_FAMILY};
use folio::image_loader::LoadedImage;
use folio::layout::{Document, TextOptions};
use folio::render::{Point, Rect, TextLine};
use folio::style::Color;
use folio::text::RichText;
use folio::{FolioError, Metadata, RenderConfig, Renderer, StatementInput};

// ─── Helpers ────────────────────────────────────────────────────

/// Records every draw call, page by page, and measures with the built-in
/// Helvetica metrics.
#[derive(Default)]
struct RecordingRenderer {
    fonts: FontContext,
    pages: Vec<Vec<TextLine>>,
    images: Vec<Rect>,
    strokes: usize,
    calls: usize,
}

impl RecordingRenderer {
    fn all_lines(&self) -> impl Iterator<Item = &TextLine> {
        self.pages.iter().flatten()
    }

    fn find(&self, text: &str) -> Option<&TextLine> {
        self.all_lines().find(|l| l.text() == text)
    }
}

impl Renderer for RecordingRenderer {
    fn char_width(&self, ch: char, family: &str, bold: bool, size: f64) -> f64 {
        self.fonts.char_width(ch, family, bold, size)
    }

    fn line_metrics(&self, family: &str, bold: bool, size: f64) -> LineMetrics {
        self.fonts.line_metrics(family, bold, size)
    }

    fn register_font(&mut self, family: &str, bold: bool, data: Vec<u8>) -> folio::Result<()> {
        self.fonts.register(family, bold, data)
    }

    fn begin_page(&mut self, width: f64, height: f64) {
        assert_eq!((width, height), (612.0, 792.0));
        self.calls += 1;
        self.pages.push(Vec::new());
    }

    fn draw_text(&mut self, line: TextLine) {
        self.calls += 1;
        if let Some(page) = self.pages.last_mut() {
            page.push(line);
        }
    }

    fn draw_image(&mut self, _image: LoadedImage, rect: Rect) {
        self.calls += 1;
        self.images.push(rect);
    }

    fn stroke_line(&mut self, _from: Point, _to: Point, _width: f64, _color: Color) {
        self.calls += 1;
        self.strokes += 1;
    }

    fn finish(&mut self, _metadata: &Metadata) -> folio::Result<Vec<u8>> {
        Ok(Vec::new())
    }
}

fn statement_json(rows: usize) -> serde_json::Value {
    let mut items = vec![serde_json::json!(["Item", "Amount"])];
    for i in 1..rows.saturating_sub(1) {
        items.push(serde_json::json!([format!("Charge {}", i), "$1.00"]));
    }
    items.push(serde_json::json!(["Total", format!("${}.00", rows.saturating_sub(2))]));
    serde_json::json!({
        "id": 7,
        "company": {
            "name": "Example, LLC",
            "address": "123 Fake Street\nNew York City, NY 10012",
            "email": "billing@example.com"
        },
        "line_items": items,
        "bill_to": ["Acme Inc", "123 Main St", "Springfield"],
        "issue_date": "2024-02-01",
        "start_date": "2024-01-01",
        "end_date": "2024-01-31"
    })
}

fn input_from(value: serde_json::Value) -> StatementInput {
    serde_json::from_value(value).unwrap()
}

fn record(input: &StatementInput) -> RecordingRenderer {
    let mut recorder = RecordingRenderer::default();
    folio::render_to(&mut recorder, input, &RenderConfig::default()).unwrap();
    recorder
}

fn count(haystack: &[u8], needle: &str) -> usize {
    haystack
        .windows(needle.len())
        .filter(|w| *w == needle.as_bytes())
        .count()
}

fn assert_valid_pdf(bytes: &[u8]) {
    assert!(bytes.len() > 50, "PDF too small to be valid");
    assert!(bytes.starts_with(b"%PDF-1.7"), "Missing PDF header");
    assert!(count(bytes, "%%EOF") == 1, "Missing %%EOF marker");
    assert!(count(bytes, "xref") >= 1, "Missing xref table");
    assert!(count(bytes, "trailer") == 1, "Missing trailer");
}

fn png_logo(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([20, 40, 200, 255]));
    let mut buf = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut buf);
    image::ImageEncoder::write_image(encoder, img.as_raw(), width, height, image::ColorType::Rgba8)
        .unwrap();
    buf
}

fn jpeg_logo(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([200, 40, 20]));
    let mut buf = Vec::new();
    let encoder = image::codecs::jpeg::JpegEncoder::new(&mut buf);
    image::ImageEncoder::write_image(encoder, img.as_raw(), width, height, image::ColorType::Rgb8)
        .unwrap();
    buf
}

fn data_uri(mime: &str, bytes: &[u8]) -> String {
    use base64::Engine;
    format!(
        "data:{};base64,{}",
        mime,
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}

// ─── Basic Pipeline Tests ───────────────────────────────────────

#[test]
fn test_renders_valid_pdf() {
    let bytes = folio::render(&input_from(statement_json(3))).unwrap();
    assert_valid_pdf(&bytes);
    assert_eq!(count(&bytes, "/Type /Page /Parent"), 1);
}

#[test]
fn test_every_page_is_letter() {
    let bytes = folio::render(&input_from(statement_json(80))).unwrap();
    let pages = count(&bytes, "/Type /Page /Parent");
    assert!(pages >= 2);
    assert_eq!(count(&bytes, "/MediaBox [0 0 612.00 792.00]"), pages);
}

#[test]
fn test_output_is_reproducible() {
    let input = input_from(statement_json(40));
    let first = folio::render(&input).unwrap();
    let second = folio::render(&input).unwrap();
    assert!(first == second, "Identical input must give identical bytes");
}

#[test]
fn test_render_json() {
    let json = serde_json::to_string(&statement_json(3)).unwrap();
    let bytes = folio::render_json(&json).unwrap();
    assert_valid_pdf(&bytes);
}

#[test]
fn test_render_json_reports_syntax_errors() {
    let err = folio::render_json("{\"id\": 7,}").unwrap_err();
    assert!(matches!(err, FolioError::ParseError { .. }));
    assert!(err.to_string().contains("Hint"));
}

// ─── Defaults ───────────────────────────────────────────────────

#[test]
fn test_default_texts_drawn() {
    let recorder = record(&input_from(statement_json(3)));
    assert!(recorder.find("STATEMENT #7").is_some());
    assert!(recorder.find("STATEMENT DATE").is_some());
    assert!(recorder.find("STATEMENT PERIOD").is_some());
    assert!(recorder.find("2024-01-01 - 2024-01-31").is_some());

    let message = recorder
        .all_lines()
        .find(|l| l.text().starts_with("For questions"))
        .unwrap();
    let link = message.runs.iter().find(|r| r.href.is_some()).unwrap();
    assert_eq!(link.text, "billing@example.com");
    assert_eq!(
        link.href.as_deref(),
        Some("mailto:billing@example.com?subject=Charge #7")
    );
}

#[test]
fn test_blank_dates_drop_labels() {
    let mut json = statement_json(3);
    json["issue_date"] = serde_json::Value::Null;
    json["end_date"] = serde_json::json!("  ");
    let recorder = record(&input_from(json));
    assert!(recorder.find("STATEMENT DATE").is_none());
    assert!(recorder.find("STATEMENT PERIOD").is_none());
}

#[test]
fn test_null_email_drops_message() {
    let mut json = statement_json(3);
    json["company"]["email"] = serde_json::Value::Null;
    let recorder = record(&input_from(json));
    assert!(recorder
        .all_lines()
        .all(|l| !l.text().starts_with("For questions")));
}

#[test]
fn test_supplied_markup_is_honored() {
    let mut json = statement_json(3);
    json["message"] = serde_json::json!("Thanks, <b>Acme</b> &amp; co.");
    json["subheading"] = serde_json::json!("INVOICE %{id}");
    let recorder = record(&input_from(json));
    let thanks = recorder.find("Thanks, Acme & co.").unwrap();
    assert!(thanks.runs.iter().any(|r| r.bold && r.text == "Acme"));
    assert!(recorder.find("INVOICE 7").is_some());
}

// ─── Validation ─────────────────────────────────────────────────

#[test]
fn test_missing_line_items_draws_nothing() {
    let mut json = statement_json(3);
    json.as_object_mut().unwrap().remove("line_items");
    let mut recorder = RecordingRenderer::default();
    let err = folio::render_to(&mut recorder, &input_from(json), &RenderConfig::default())
        .unwrap_err();
    assert!(matches!(err, FolioError::MissingField("line_items")));
    assert_eq!(recorder.calls, 0);
}

#[test]
fn test_missing_company_name() {
    let mut json = statement_json(3);
    json["company"]["name"] = serde_json::Value::Null;
    let err = folio::render(&input_from(json)).unwrap_err();
    assert!(matches!(err, FolioError::MissingField("company.name")));
}

#[test]
fn test_unsupported_markup_fails() {
    let mut json = statement_json(3);
    json["bill_to"] = serde_json::json!("<i>Acme</i>");
    let err = folio::render(&input_from(json)).unwrap_err();
    assert!(matches!(err, FolioError::Markup(_)));
}

// ─── Header ─────────────────────────────────────────────────────

#[test]
fn test_bill_to_joined_by_line_breaks() {
    let recorder = record(&input_from(statement_json(3)));
    let acme = recorder.find("Acme Inc").unwrap();
    let main = recorder.find("123 Main St").unwrap();
    let springfield = recorder.find("Springfield").unwrap();
    assert!(acme.top < main.top && main.top < springfield.top);
    assert_eq!(acme.runs[0].font_size, 10.0);
    // 10pt line + 4pt leading
    assert!((main.top - acme.top - 15.56).abs() < 0.001);
}

#[test]
fn test_tall_bill_to_shrinks() {
    let mut json = statement_json(3);
    // Eight lines only fit the 75pt region at 5pt.
    let lines: Vec<String> = (1..=8).map(|i| format!("Line {}", i)).collect();
    json["bill_to"] = serde_json::json!(lines);
    let recorder = record(&input_from(json));

    let first = recorder.find("Line 1").unwrap();
    assert_eq!(first.runs[0].font_size, 5.0);
    let last = recorder.find("Line 8").unwrap();
    // Still inside the 75pt region, which starts 5pt below the first line's top.
    assert!(last.top + last.height <= first.top + 75.0 + 0.001);
}

#[test]
fn test_png_logo_drawn_at_header() {
    let mut json = statement_json(3);
    json["company"]["logo"] = serde_json::json!(data_uri("image/png", &png_logo(4, 2)));
    let recorder = record(&input_from(json));
    assert_eq!(recorder.images.len(), 1);
    let rect = recorder.images[0];
    assert_eq!((rect.x, rect.y, rect.height), (85.0, 60.0, 32.0));
    assert!((rect.width - 64.0).abs() < 0.001);
}

#[test]
fn test_jpeg_logo_embedded() {
    let mut json = statement_json(3);
    json["company"]["logo"] = serde_json::json!(data_uri("image/jpeg", &jpeg_logo(8, 8)));
    let bytes = folio::render(&input_from(json)).unwrap();
    assert_valid_pdf(&bytes);
    assert_eq!(count(&bytes, "/Filter /DCTDecode"), 1);
}

#[test]
fn test_unreadable_logo_is_asset_error() {
    let mut json = statement_json(3);
    json["company"]["logo"] = serde_json::json!("/definitely/not/here/logo.png");
    let err = folio::render(&input_from(json)).unwrap_err();
    assert!(matches!(err, FolioError::Asset { .. }));
}

// ─── Charge Table ───────────────────────────────────────────────

#[test]
fn test_border_count() {
    // Rows 0..=n-3 are bordered.
    let recorder = record(&input_from(statement_json(6)));
    assert_eq!(recorder.strokes, 4);

    let recorder = record(&input_from(statement_json(2)));
    assert_eq!(recorder.strokes, 0);
}

#[test]
fn test_table_repeats_header_on_every_page() {
    let recorder = record(&input_from(statement_json(80)));
    assert!(recorder.pages.len() >= 2);
    let table_pages = recorder
        .pages
        .iter()
        .filter(|page| page.iter().any(|l| l.text().starts_with("Charge ")));
    for page in table_pages {
        let header = page.iter().filter(|l| l.text() == "Item").count();
        assert_eq!(header, 1);
    }
    // Every charge made it onto some page.
    for i in 1..79 {
        assert!(recorder.find(&format!("Charge {}", i)).is_some());
    }
}

#[test]
fn test_table_rows_stay_above_bottom_margin() {
    let recorder = record(&input_from(statement_json(80)));
    for line in recorder.all_lines() {
        assert!(line.top + line.height <= 792.0 - 36.0 + 0.001);
    }
}

#[test]
fn test_header_repeat_can_be_disabled() {
    let mut json = statement_json(80);
    json["repeat_header"] = serde_json::json!(false);
    let recorder = record(&input_from(json));
    assert!(recorder.pages[1].iter().all(|l| l.text() != "Item"));
}

// ─── Document API ───────────────────────────────────────────────

#[test]
fn test_nested_boxes_translate() {
    let mut recorder = RecordingRenderer::default();
    let mut doc = Document::new(&mut recorder, &RenderConfig::default());
    doc.with_box(Point::default(), 612.0, Some(792.0), |doc| {
        doc.with_box(Point::new(85.0, 0.0), 442.0, Some(792.0), |doc| {
            doc.move_down(40.0)?;
            doc.with_box(Point::new(250.0, 100.0), 200.0, None, |doc| {
                doc.text(&RichText::plain("Nested"), &TextOptions::default())
            })
        })
    })
    .unwrap();
    assert_eq!(doc.box_depth(), 0);
    drop(doc);

    let nested = recorder.find("Nested").unwrap();
    assert_eq!(nested.runs[0].x, 335.0);
    assert_eq!(nested.top, 100.0);
}

#[test]
fn test_strict_cursor_rejects_overrun() {
    let mut config = RenderConfig::default();
    config.layout.strict_cursor = true;
    let mut doc = Document::new(RecordingRenderer::default(), &config);
    let result = doc.with_box(Point::default(), 100.0, Some(20.0), |doc| doc.move_down(30.0));
    assert!(matches!(result, Err(FolioError::LayoutInvariant(_))));
    assert_eq!(doc.box_depth(), 0);
}

#[test]
fn test_draw_without_box_fails() {
    let mut doc = Document::new(RecordingRenderer::default(), &RenderConfig::default());
    let result = doc.text(&RichText::plain("orphan"), &TextOptions::default());
    assert!(matches!(result, Err(FolioError::LayoutInvariant(_))));
}

// ─── PDF Output ─────────────────────────────────────────────────

#[test]
fn test_metadata_written() {
    let mut config = RenderConfig::default();
    config.metadata.title = Some("Statement 7".to_string());
    config.metadata.author = Some("Example, LLC".to_string());
    let bytes = folio::render_with_config(&input_from(statement_json(3)), &config).unwrap();
    assert_eq!(count(&bytes, "/Title (Statement 7)"), 1);
    assert_eq!(count(&bytes, "/Author (Example, LLC)"), 1);
}

#[test]
fn test_mailto_link_annotation() {
    let bytes = folio::render(&input_from(statement_json(3))).unwrap();
    assert_eq!(count(&bytes, "/Subtype /Link"), 1);
    assert_eq!(
        count(&bytes, "/URI (mailto:billing@example.com?subject=Charge #7)"),
        1
    );
}

#[test]
fn test_standard_fonts_only_by_default() {
    let bytes = folio::render(&input_from(statement_json(3))).unwrap();
    assert!(count(&bytes, "/BaseFont /Helvetica-Bold") >= 1);
    assert_eq!(count(&bytes, "CIDFontType2"), 0);
    assert_eq!(FontContext::new().resolve_key("Primary", true).family, DEFAULT_FAMILY);
}

#[test]
fn test_unparseable_font_fails() {
    let mut json = statement_json(3);
    json["font"] = serde_json::json!({ "normal": [0, 1, 2, 3] });
    let err = folio::render(&input_from(json)).unwrap_err();
    assert!(matches!(err, FolioError::FontError(_)));
}

#[test]
fn test_missing_font_file_is_asset_error() {
    let mut json = statement_json(3);
    json["font"] = serde_json::json!({ "normal": "/definitely/not/here/font.ttf" });
    let err = folio::render(&input_from(json)).unwrap_err();
    assert!(matches!(err, FolioError::Asset { .. }));
}

/// Find a system TrueType font for the custom font tests. Returns None
/// when no usable font is installed.
fn find_test_font() -> Option<String> {
    let paths = [
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/usr/share/fonts/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
        "/System/Library/Fonts/Supplemental/Arial.ttf",
        "/Library/Fonts/Arial.ttf",
        "C:\\Windows\\Fonts\\arial.ttf",
    ];
    paths.iter().find_map(|path| {
        let data = std::fs::read(path).ok()?;
        ttf_parser::Face::parse(&data, 0).ok()?;
        Some(path.to_string())
    })
}

#[test]
fn test_custom_font_is_embedded() {
    let path = match find_test_font() {
        Some(path) => path,
        None => {
            eprintln!("Skipping custom font test: no system TTF found");
            return;
        }
    };
    let mut json = statement_json(3);
    json["font"] = serde_json::json!({ "normal": path });
    let input = input_from(json);

    let bytes = folio::render(&input).unwrap();
    assert_valid_pdf(&bytes);
    assert!(count(&bytes, "/Subtype /CIDFontType2") >= 1);
    assert!(count(&bytes, "/Encoding /Identity-H") >= 1);
    assert!(count(&bytes, "/ToUnicode") >= 1);
    assert!(count(&bytes, "/FontFile2") >= 1);

    let recorder = record(&input);
    let name = recorder.find("Example, LLC").unwrap();
    assert!(name.runs.iter().all(|run| run.font_family == "Primary"));
    assert!(recorder
        .all_lines()
        .flat_map(|line| &line.runs)
        .all(|run| run.font_family == "Primary"));
}
