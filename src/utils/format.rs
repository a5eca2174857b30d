//! Table formatting and output utilities
//!
//! This module provides functionality for formatting and displaying
//! tabular data and documents with color support.

use crate::error::Result;
use crossterm::{
    style::{Color as CrosstermColor, Stylize},
    terminal::size,
};
use serde::Serialize;
use tabled::{
    settings::{object::Rows, Alignment, Color, Modify, Padding, Style, Width},
    Table, Tabled,
};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Yaml,
}

/// Color theme for console output
#[derive(Debug, Clone)]
pub struct ColorTheme {
    pub header: CrosstermColor,
    pub success: CrosstermColor,
    pub warning: CrosstermColor,
    pub error: CrosstermColor,
    pub info: CrosstermColor,
    pub accent: CrosstermColor,
}

impl Default for ColorTheme {
    fn default() -> Self {
        Self {
            header: CrosstermColor::Blue,
            success: CrosstermColor::Green,
            warning: CrosstermColor::Yellow,
            error: CrosstermColor::Red,
            info: CrosstermColor::Cyan,
            accent: CrosstermColor::Magenta,
        }
    }
}

/// Formatter for rows (tables) and whole documents (JSON/YAML)
pub struct TableFormatter {
    format: OutputFormat,
    no_color: bool,
}

impl TableFormatter {
    /// Create a new table formatter
    pub fn new(format: OutputFormat, no_color: bool) -> Self {
        Self { format, no_color }
    }

    /// Format a document, using `rows` for the table rendition
    pub fn format_document<D, T>(&self, document: &D, rows: &[T]) -> Result<String>
    where
        D: Serialize,
        T: Tabled,
    {
        match self.format {
            OutputFormat::Table => Ok(self.format_as_table(rows)),
            OutputFormat::Json => Ok(serde_json::to_string_pretty(document)?),
            OutputFormat::Yaml => Ok(serde_yaml::to_string(document)?),
        }
    }

    fn format_as_table<T: Tabled>(&self, data: &[T]) -> String {
        if data.is_empty() {
            return "No data to display".to_string();
        }

        let mut table = Table::new(data);
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()))
            .with(Padding::new(1, 1, 0, 0));

        if !self.no_color {
            table.with(Modify::new(Rows::first()).with(Color::FG_BLUE));
        }

        // Auto-adjust width to terminal
        if let Ok((width, _)) = size() {
            table.with(Width::wrap(width as usize));
        }

        table.to_string()
    }
}

/// Display utilities for status lines
pub struct DisplayUtils {
    theme: ColorTheme,
    no_color: bool,
}

impl DisplayUtils {
    /// Create new display utilities
    pub fn new(no_color: bool) -> Self {
        Self {
            theme: ColorTheme::default(),
            no_color,
        }
    }

    /// Print a section header
    pub fn print_header(&self, title: &str) {
        if self.no_color {
            println!("=== {} ===", title);
        } else {
            println!("=== {} ===", title.with(self.theme.header).bold());
        }
    }

    /// Print a success message
    pub fn print_success(&self, message: &str) {
        if self.no_color {
            println!("✓ {}", message);
        } else {
            println!("✓ {}", message.with(self.theme.success));
        }
    }

    /// Print a warning message
    pub fn print_warning(&self, message: &str) {
        if self.no_color {
            println!("⚠ {}", message);
        } else {
            println!("⚠ {}", message.with(self.theme.warning));
        }
    }

    /// Print an error message
    pub fn print_error(&self, message: &str) {
        if self.no_color {
            eprintln!("✗ {}", message);
        } else {
            eprintln!("✗ {}", message.with(self.theme.error));
        }
    }

    /// Print an info message
    pub fn print_info(&self, message: &str) {
        if self.no_color {
            println!("ℹ {}", message);
        } else {
            println!("ℹ {}", message.with(self.theme.info));
        }
    }

    /// Format key-value pairs
    pub fn format_key_value_pairs(&self, pairs: &[(&str, &str)]) -> String {
        let max_key_length = pairs.iter().map(|(key, _)| key.len()).max().unwrap_or(0);

        pairs
            .iter()
            .map(|(key, value)| {
                let padded = format!("{:width$}", key, width = max_key_length);
                if self.no_color {
                    format!("{}: {}", padded, value)
                } else {
                    format!("{}: {}", padded.with(self.theme.accent).bold(), value)
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Convenience function for formatting a table with default settings
pub fn format_table(mut table: Table, no_color: bool) -> String {
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()))
        .with(Padding::new(1, 1, 0, 0));

    if !no_color {
        table.with(Modify::new(Rows::first()).with(Color::FG_BLUE));
    }

    table.to_string()
}
