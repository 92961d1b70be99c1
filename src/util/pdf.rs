use std::collections::HashMap;
use std::path::PathBuf;

use chrono::DateTime;
use tera::{Context, Tera, Value};
use tokio::process::Command;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

use crate::config::PdfConfig;
use crate::model::quote::{QuoteInformation, QuoteRevision};

const QUOTE_TEMPLATE: &str = include_str!("../../templates/quote.html");

#[derive(Debug, thiserror::Error)]
pub enum PdfError {
    #[error("Template error: {0}")]
    TemplateError(String),

    #[error("Browser error: {0}")]
    BrowserError(String),

    #[error("Render timed out after {0} seconds")]
    Timeout(u64),

    #[error("IO error: {0}")]
    IoError(String),
}

const MESES: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

/// MXN currency with thousands separators, e.g. 1234.5 -> "$1,234.50"
pub fn format_currency(value: f64) -> String {
    let negative = value < 0.0;
    let cents = (value.abs() * 100.0).round() as u64;
    let integer = cents / 100;
    let fraction = cents % 100;

    let digits = integer.to_string();
    let mut grouped = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if negative { "-" } else { "" };
    format!("{}${}.{:02}", sign, grouped, fraction)
}

/// RFC3339 timestamp (or bare date) -> "5 de agosto de 2026"
pub fn format_date(value: &str) -> String {
    let parsed = DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.date_naive())
        .or_else(|_| chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d"));
    match parsed {
        Ok(date) => {
            use chrono::Datelike;
            let month = MESES[(date.month0()) as usize];
            format!("{} de {} de {}", date.day(), month, date.year())
        }
        Err(_) => value.to_string(),
    }
}

fn moneda_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let number = value
        .as_f64()
        .ok_or_else(|| tera::Error::msg("moneda expects a number"))?;
    Ok(Value::String(format_currency(number)))
}

fn fecha_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let raw = value
        .as_str()
        .ok_or_else(|| tera::Error::msg("fecha expects a string"))?;
    Ok(Value::String(format_date(raw)))
}

/// Render the printable HTML for a finalized quote
pub fn render_quote_html(
    info: &QuoteInformation,
    revision: &QuoteRevision,
) -> Result<String, PdfError> {
    let mut tera = Tera::default();
    tera.register_filter("moneda", moneda_filter);
    tera.register_filter("fecha", fecha_filter);
    tera.add_raw_template("quote.html", QUOTE_TEMPLATE)
        .map_err(|e| PdfError::TemplateError(e.to_string()))?;

    let total: f64 = revision.entries.iter().map(|e| e.unitary_final_price).sum();

    let mut context = Context::new();
    context.insert("info", info);
    context.insert("revision", revision);
    context.insert("total", &total);

    tera.render("quote.html", &context)
        .map_err(|e| PdfError::TemplateError(e.to_string()))
}

/// Prints HTML to PDF through the configured headless browser
pub struct PdfRenderService {
    pub config: PdfConfig,
}

impl PdfRenderService {
    pub fn new(config: PdfConfig) -> Self {
        Self { config }
    }

    /// Write the HTML to a temp file, print it with the browser, read the
    /// bytes back. Invoked on demand for finalized quotes only.
    #[instrument(skip(self, html))]
    pub async fn render(&self, html: &str) -> Result<Vec<u8>, PdfError> {
        info!("Rendering quote PDF");

        let stamp = Uuid::new_v4();
        let html_path: PathBuf = std::env::temp_dir().join(format!("quote-{}.html", stamp));
        let pdf_path: PathBuf = std::env::temp_dir().join(format!("quote-{}.pdf", stamp));

        tokio::fs::write(&html_path, html)
            .await
            .map_err(|e| PdfError::IoError(format!("Failed to write HTML: {}", e)))?;

        let result = self.print_to_pdf(&html_path, &pdf_path).await;

        let _ = tokio::fs::remove_file(&html_path).await;
        let bytes = match result {
            Ok(()) => tokio::fs::read(&pdf_path)
                .await
                .map_err(|e| PdfError::IoError(format!("Failed to read PDF: {}", e))),
            Err(e) => Err(e),
        };
        let _ = tokio::fs::remove_file(&pdf_path).await;

        let bytes = bytes?;
        debug!("Rendered PDF ({} bytes)", bytes.len());
        Ok(bytes)
    }

    async fn print_to_pdf(&self, html_path: &PathBuf, pdf_path: &PathBuf) -> Result<(), PdfError> {
        let output = tokio::time::timeout(
            std::time::Duration::from_secs(self.config.render_timeout_secs),
            Command::new(&self.config.browser_path)
                .arg("--headless")
                .arg("--disable-gpu")
                .arg("--no-sandbox")
                .arg(format!("--print-to-pdf={}", pdf_path.display()))
                .arg(html_path.as_os_str())
                .output(),
        )
        .await
        .map_err(|_| PdfError::Timeout(self.config.render_timeout_secs))?
        .map_err(|e| {
            error!("Failed to launch browser: {}", e);
            PdfError::BrowserError(format!("Failed to launch browser: {}", e))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!("Browser exited with {}: {}", output.status, stderr);
            return Err(PdfError::BrowserError(format!(
                "Browser exited with {}",
                output.status
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_currency_groups_thousands() {
        assert_eq!(format_currency(0.0), "$0.00");
        assert_eq!(format_currency(1234.5), "$1,234.50");
        assert_eq!(format_currency(1000000.0), "$1,000,000.00");
        assert_eq!(format_currency(-42.25), "-$42.25");
    }

    #[test]
    fn test_format_date_spanish() {
        assert_eq!(format_date("2026-08-05"), "5 de agosto de 2026");
        assert_eq!(
            format_date("2026-01-31T10:30:00+00:00"),
            "31 de enero de 2026"
        );
        // Unparseable values pass through untouched
        assert_eq!(format_date("pronto"), "pronto");
    }
}
