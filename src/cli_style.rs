/*!
 * s3bridge CLI Style System
 *
 * Themed text, summary tables and human-readable sizes for command output.
 */

use crate::stats::BatchReport;
use comfy_table::{presets, Attribute, Cell, Color, ContentArrangement, Table};
use console::{style, StyledObject};

// ============================================================================
// THEME COLORS
// ============================================================================

/// Colors for consistent styling
pub struct Theme;

impl Theme {
    /// Primary accent color (cyan/blue)
    pub fn primary<D: std::fmt::Display>(text: D) -> StyledObject<D> {
        style(text).cyan()
    }

    /// Success color (green)
    pub fn success<D: std::fmt::Display>(text: D) -> StyledObject<D> {
        style(text).green()
    }

    /// Warning color (yellow)
    pub fn warning<D: std::fmt::Display>(text: D) -> StyledObject<D> {
        style(text).yellow()
    }

    /// Error color (red)
    pub fn error<D: std::fmt::Display>(text: D) -> StyledObject<D> {
        style(text).red().bold()
    }

    /// Muted/dim text
    pub fn muted<D: std::fmt::Display>(text: D) -> StyledObject<D> {
        style(text).dim()
    }
}

// ============================================================================
// ICONS
// ============================================================================

pub struct Icons;

impl Icons {
    pub const SUCCESS: &'static str = "✓";
    pub const ERROR: &'static str = "✗";
    pub const WARNING: &'static str = "⚠";
    pub const INFO: &'static str = "ℹ";
    pub const ARROW_RIGHT: &'static str = "→";
}

// ============================================================================
// TABLES
// ============================================================================

/// Create a styled data table
pub fn create_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Create a key-value table
pub fn key_value_table(items: &[(&str, String)]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_NO_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic);

    for (key, value) in items {
        table.add_row(vec![
            Cell::new(key).fg(Color::Cyan),
            Cell::new(value).add_attribute(Attribute::Bold),
        ]);
    }

    table
}

/// One row per transferred file plus a totals row
pub fn batch_summary_table(report: &BatchReport) -> Table {
    let mut table = create_table();
    table.set_header(vec![
        Cell::new("#").add_attribute(Attribute::Bold),
        Cell::new("Source").add_attribute(Attribute::Bold),
        Cell::new("Destination").add_attribute(Attribute::Bold),
        Cell::new("Size").add_attribute(Attribute::Bold),
        Cell::new("Elapsed").add_attribute(Attribute::Bold),
        Cell::new("Rate").add_attribute(Attribute::Bold),
    ]);

    for result in &report.results {
        table.add_row(vec![
            Cell::new(result.index),
            Cell::new(&result.source),
            Cell::new(result.location.as_deref().unwrap_or(&result.destination)),
            Cell::new(format_bytes(result.bytes)),
            Cell::new(format_duration(result.elapsed.as_secs_f64())),
            Cell::new(result.throughput().to_string()).fg(Color::Cyan),
        ]);
    }

    table.add_row(vec![
        Cell::new(""),
        Cell::new(format!("{} file(s)", report.transferred()))
            .fg(Color::Green)
            .add_attribute(Attribute::Bold),
        Cell::new(""),
        Cell::new(format_bytes(report.total_bytes())).add_attribute(Attribute::Bold),
        Cell::new(format_duration(report.total_elapsed().as_secs_f64())),
        Cell::new(report.throughput().to_string())
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
    ]);

    table
}

/// Counters that do not fit the per-file table
pub fn batch_counters(report: &BatchReport) -> Vec<(&'static str, String)> {
    let mut items = Vec::new();
    if let Some(scanned) = report.scanned {
        items.push(("Keys scanned", scanned.to_string()));
        items.push(("Listing pages", report.list_calls.to_string()));
    }
    items.push(("Selected", report.selected.len().to_string()));
    if report.removed > 0 {
        items.push(("Removed", report.removed.to_string()));
    }
    if !report.removal_failures.is_empty() {
        items.push(("Removal failures", report.removal_failures.len().to_string()));
    }
    items
}

/// Print the batch summary to stdout
pub fn print_batch_summary(report: &BatchReport) {
    if report.is_empty() {
        print_warning(&format!("no files selected for {}", report.direction));
        return;
    }
    println!("{}", batch_summary_table(report));
    println!("{}", key_value_table(&batch_counters(report)));
    for source in &report.removal_failures {
        print_warning(&format!("could not remove {}", source));
    }
}

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// Format bytes into human-readable string
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB", "PB"];

    if bytes == 0 {
        return "0 B".to_string();
    }

    let bytes_f = bytes as f64;
    let base = 1024.0_f64;
    let exp = (bytes_f.ln() / base.ln()).floor() as usize;
    let exp = exp.min(UNITS.len() - 1);

    let value = bytes_f / base.powi(exp as i32);

    if exp == 0 {
        format!("{} {}", bytes, UNITS[exp])
    } else {
        format!("{:.2} {}", value, UNITS[exp])
    }
}

/// Format duration into human-readable string
pub fn format_duration(secs: f64) -> String {
    if secs < 1.0 {
        format!("{:.0}ms", secs * 1000.0)
    } else if secs < 60.0 {
        format!("{:.1}s", secs)
    } else if secs < 3600.0 {
        let mins = (secs / 60.0).floor();
        let remaining = secs % 60.0;
        format!("{}m {:.0}s", mins, remaining)
    } else {
        let hours = (secs / 3600.0).floor();
        let mins = ((secs % 3600.0) / 60.0).floor();
        format!("{}h {}m", hours, mins)
    }
}

/// Print a styled error message with optional suggestion
pub fn print_error(message: &str, suggestion: Option<&str>) {
    eprintln!(
        "{} {}",
        Theme::error(format!("{} Error:", Icons::ERROR)),
        message
    );

    if let Some(hint) = suggestion {
        eprintln!(
            "  {} {}",
            Theme::muted(Icons::ARROW_RIGHT),
            Theme::muted(hint)
        );
    }
}

/// Print a styled warning message
pub fn print_warning(message: &str) {
    eprintln!(
        "{} {}",
        Theme::warning(Icons::WARNING.to_string()),
        Theme::warning(message)
    );
}

/// Print a styled success message
pub fn print_success(message: &str) {
    println!(
        "{} {}",
        Theme::success(Icons::SUCCESS.to_string()),
        Theme::success(message)
    );
}

/// Print a styled info message
pub fn print_info(message: &str) {
    println!("{} {}", Theme::primary(Icons::INFO.to_string()), message);
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::{TransferDirection, TransferResult};
    use std::time::Duration;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(500), "500 B");
        assert_eq!(format_bytes(1024), "1.00 KB");
        assert_eq!(format_bytes(1536), "1.50 KB");
        assert_eq!(format_bytes(1048576), "1.00 MB");
        assert_eq!(format_bytes(1073741824), "1.00 GB");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0.5), "500ms");
        assert_eq!(format_duration(1.0), "1.0s");
        assert_eq!(format_duration(65.0), "1m 5s");
        assert_eq!(format_duration(3665.0), "1h 1m");
    }

    #[test]
    fn test_batch_summary_lists_every_file() {
        let mut report = BatchReport::new(TransferDirection::Download);
        report.scanned = Some(2500);
        report.list_calls = 3;
        report.selected = vec!["in/a.csv".to_string()];
        report.results.push(TransferResult {
            index: 0,
            source: "in/a.csv".to_string(),
            destination: "/data/a.csv".to_string(),
            bytes: 2048,
            elapsed: Duration::from_millis(250),
            location: None,
        });

        let rendered = batch_summary_table(&report).to_string();
        assert!(rendered.contains("in/a.csv"));
        assert!(rendered.contains("/data/a.csv"));
        assert!(rendered.contains("1 file(s)"));

        let counters = batch_counters(&report);
        assert_eq!(counters[0], ("Keys scanned", "2500".to_string()));
        assert_eq!(counters[1], ("Listing pages", "3".to_string()));
    }
}
