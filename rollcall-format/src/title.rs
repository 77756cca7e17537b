//! Destination title rendering.
//!
//! The rename label is a one-line tera template. Available variables:
//! `year` (four-digit year of the run) and `destination` (sheet identifier).

use chrono::{DateTime, Datelike, Utc};
use tera::{Context, Tera};

use crate::error::FormatError;

const TEMPLATE_NAME: &str = "title";

/// Parsed title template.
pub struct TitleTemplate {
    tera: Tera,
}

impl TitleTemplate {
    /// Parse `source`; syntax errors surface here rather than at rename time.
    pub fn new(source: &str) -> Result<Self, FormatError> {
        let mut tera = Tera::default();
        tera.add_raw_template(TEMPLATE_NAME, source)?;
        Ok(Self { tera })
    }

    /// Render the title for a run happening at `now`.
    pub fn render(&self, now: DateTime<Utc>, destination: &str) -> Result<String, FormatError> {
        let mut ctx = Context::new();
        ctx.insert("year", &now.year());
        ctx.insert("destination", destination);
        let rendered = self.tera.render(TEMPLATE_NAME, &ctx)?;
        Ok(rendered.trim().to_string())
    }
}
