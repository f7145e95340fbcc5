//! # Statement Model
//!
//! [`StatementInput`] is what callers hand in, usually deserialized from
//! JSON. Every field is tri-state: absent, explicitly `null`, or a value.
//! Required fields must be present (a missing key is a
//! [`FolioError::MissingField`]); some of them may still be `null`.
//!
//! [`Statement::new`] validates the input, fills in defaults for optional
//! fields the caller left out, and parses inline markup once. The result is
//! immutable.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::config::FetchConfig;
use crate::error::{FolioError, Result};
use crate::image_loader::{read_uri_bytes, ImageSource};
use crate::layout::{ColumnWidth, TableStyle};
use crate::style::LINK_COLOR;
use crate::text::{Inline, RichText};

/// A field that can be absent (`None`), `null` (`Some(None)`) or set.
pub type Field<T> = Option<Option<T>>;

fn tri_state<'de, D, T>(deserializer: D) -> std::result::Result<Field<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// A cell or identifier: JSON strings and numbers are both accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Text(String),
    Integer(i64),
    Float(f64),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Text(s) => f.write_str(s),
            Scalar::Integer(n) => write!(f, "{}", n),
            Scalar::Float(n) => write!(f, "{}", n),
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::Text(s.to_string())
    }
}

/// One address line or several.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Lines {
    One(String),
    Many(Vec<String>),
}

impl Lines {
    fn joined(&self) -> String {
        match self {
            Lines::One(line) => line.clone(),
            Lines::Many(lines) => lines.join("\n"),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompanyInput {
    #[serde(default, deserialize_with = "tri_state")]
    pub name: Field<String>,
    #[serde(default, deserialize_with = "tri_state")]
    pub address: Field<String>,
    #[serde(default, deserialize_with = "tri_state")]
    pub email: Field<String>,
    #[serde(default)]
    pub logo: Option<ImageSource>,
}

/// Where a TrueType font comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FontSource {
    /// File path, URL or data URI.
    Path(String),
    Bytes(Vec<u8>),
}

impl FontSource {
    /// Read the font bytes. Unreadable sources are `Asset` errors.
    pub fn load(&self, fetch: &FetchConfig) -> Result<Vec<u8>> {
        match self {
            FontSource::Path(path) => read_uri_bytes(path, fetch),
            FontSource::Bytes(bytes) => Ok(bytes.clone()),
        }
    }
}

/// A custom font family used for all statement text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontFamilyInput {
    pub normal: FontSource,
    #[serde(default)]
    pub bold: Option<FontSource>,
}

/// Raw construction parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatementInput {
    #[serde(default, deserialize_with = "tri_state")]
    pub id: Field<Scalar>,
    #[serde(default, deserialize_with = "tri_state")]
    pub company: Field<CompanyInput>,
    #[serde(default, deserialize_with = "tri_state")]
    pub line_items: Field<Vec<Vec<Scalar>>>,
    #[serde(default, deserialize_with = "tri_state")]
    pub bill_to: Field<Lines>,
    #[serde(default, deserialize_with = "tri_state")]
    pub issue_date: Field<Scalar>,
    #[serde(default, deserialize_with = "tri_state")]
    pub start_date: Field<Scalar>,
    #[serde(default, deserialize_with = "tri_state")]
    pub end_date: Field<Scalar>,

    #[serde(default)]
    pub font: Option<FontFamilyInput>,
    #[serde(default, deserialize_with = "tri_state")]
    pub message: Field<String>,
    #[serde(default, deserialize_with = "tri_state")]
    pub subheading: Field<String>,
    #[serde(default, deserialize_with = "tri_state")]
    pub statement_date_text: Field<String>,
    #[serde(default, deserialize_with = "tri_state")]
    pub statement_period_text: Field<String>,

    /// Repeat the line item header on continuation pages. Defaults to true.
    #[serde(default)]
    pub repeat_header: Option<bool>,
    /// Line item column widths. Empty splits evenly.
    #[serde(default)]
    pub column_widths: Vec<ColumnWidth>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Company {
    pub name: RichText,
    pub address: RichText,
    pub email: Option<String>,
    pub logo: Option<ImageSource>,
}

/// A validated statement with every default resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub id: Option<String>,
    pub company: Company,
    pub line_items: Vec<Vec<RichText>>,
    pub bill_to: RichText,
    pub issue_date: RichText,
    /// "start - end"
    pub period: RichText,
    pub message: RichText,
    pub subheading: RichText,
    pub statement_date_text: RichText,
    pub statement_period_text: RichText,
    pub font: Option<FontFamilyInput>,
    pub table_style: TableStyle,
}

/// Non-null and not just whitespace.
fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn required<T>(field: Field<T>, name: &'static str) -> Result<Option<T>> {
    field.ok_or(FolioError::MissingField(name))
}

fn required_value<T>(field: Field<T>, name: &'static str) -> Result<T> {
    field.flatten().ok_or(FolioError::MissingField(name))
}

/// Escape text so it survives markup parsing unchanged.
fn escape_markup(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Substitute `%<id>s` and `%{id}` in a subheading template.
pub fn format_subheading(template: &str, id: &str) -> String {
    let id = escape_markup(id);
    template.replace("%<id>s", &id).replace("%{id}", &id)
}

/// "For questions, contact us anytime at EMAIL." with EMAIL as a bold,
/// colored mailto link.
pub fn default_message(email: &str, id: &str) -> RichText {
    let href = format!("mailto:{}?subject=Charge #{}", email, id);
    RichText::new(vec![
        Inline::Plain("For questions, contact us anytime at ".to_string()),
        Inline::Colored {
            color: LINK_COLOR,
            children: vec![Inline::Link {
                href,
                children: vec![Inline::Bold(vec![Inline::Plain(email.to_string())])],
            }],
        },
        Inline::Plain(".".to_string()),
    ])
}

/// Parse an optional text field: absent/null become empty text.
fn markup(value: Option<String>) -> Result<RichText> {
    match value {
        Some(text) => RichText::parse(&text),
        None => Ok(RichText::default()),
    }
}

impl Statement {
    pub fn new(input: StatementInput) -> Result<Self> {
        let id = required(input.id, "id")?.map(|id| id.to_string());
        let company = required_value(input.company, "company")?;
        let line_items = required_value(input.line_items, "line_items")?;
        let bill_to = required(input.bill_to, "bill_to")?;
        let issue_date = required(input.issue_date, "issue_date")?.map(|d| d.to_string());
        let start_date = required(input.start_date, "start_date")?.map(|d| d.to_string());
        let end_date = required(input.end_date, "end_date")?.map(|d| d.to_string());

        let name = required_value(company.name, "company.name")?;
        let address = required_value(company.address, "company.address")?;
        let email = required(company.email, "company.email")?;

        let id_text = id.clone().unwrap_or_default();

        let message = match input.message {
            Some(supplied) => markup(supplied)?,
            None => match present(email.as_deref()) {
                Some(email) => default_message(email, &id_text),
                None => RichText::default(),
            },
        };

        let subheading = match input.subheading {
            Some(supplied) => supplied.unwrap_or_default(),
            None if present(id.as_deref()).is_some() => "STATEMENT #%<id>s".to_string(),
            None => String::new(),
        };
        let subheading = markup(Some(format_subheading(&subheading, &id_text)))?;

        let statement_date_text = match input.statement_date_text {
            Some(supplied) => supplied,
            None => present(issue_date.as_deref()).map(|_| "STATEMENT DATE".to_string()),
        };

        let statement_period_text = match input.statement_period_text {
            Some(supplied) => supplied,
            None => present(start_date.as_deref())
                .and(present(end_date.as_deref()))
                .map(|_| "STATEMENT PERIOD".to_string()),
        };

        let line_items = line_items
            .iter()
            .map(|row| row.iter().map(|cell| RichText::parse(&cell.to_string())).collect())
            .collect::<Result<Vec<Vec<RichText>>>>()?;

        let period = format!(
            "{} - {}",
            start_date.unwrap_or_default(),
            end_date.unwrap_or_default()
        );

        let table_style = TableStyle {
            repeat_header: input.repeat_header.unwrap_or(true),
            column_widths: input.column_widths,
            ..TableStyle::default()
        };

        Ok(Self {
            id,
            company: Company {
                name: RichText::parse(&name)?,
                address: RichText::parse(&address)?,
                email,
                logo: company.logo,
            },
            line_items,
            bill_to: markup(bill_to.map(|lines| lines.joined()))?,
            issue_date: markup(issue_date)?,
            period: RichText::parse(&period)?,
            message,
            subheading,
            statement_date_text: markup(statement_date_text)?,
            statement_period_text: markup(statement_period_text)?,
            font: input.font,
            table_style,
        })
    }

    /// Parse a JSON statement and resolve it.
    pub fn from_json(json: &str) -> Result<Self> {
        let input: StatementInput = serde_json::from_str(json)?;
        Self::new(input)
    }
}
