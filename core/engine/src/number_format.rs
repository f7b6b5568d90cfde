//! FILENAME: core/engine/src/number_format.rs
//! PURPOSE: Number formatting utilities for displaying aggregated values.
//! CONTEXT: This module turns raw measure values into display strings. It is a
//! pure presentation step and never decides which rows or values exist.

use serde::{Deserialize, Serialize};

/// How a measure column is displayed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "style")]
pub enum NumberFormat {
    /// Thousands separators, at most two decimals, trailing zeros trimmed.
    Grouped,
    /// Plain number without separators.
    General,
    Number {
        decimal_places: u8,
        use_thousands_separator: bool,
    },
    Currency {
        decimal_places: u8,
        symbol: String,
    },
    Percentage {
        decimal_places: u8,
    },
    Scientific {
        decimal_places: u8,
    },
}

impl Default for NumberFormat {
    fn default() -> Self {
        NumberFormat::Grouped
    }
}

/// Format a number according to the specified format.
pub fn format_number(value: f64, format: &NumberFormat) -> String {
    match format {
        NumberFormat::Grouped => format_grouped(value),
        NumberFormat::General => format_general(value),
        NumberFormat::Number {
            decimal_places,
            use_thousands_separator,
        } => format_decimal(value, *decimal_places, *use_thousands_separator),
        NumberFormat::Currency {
            decimal_places,
            symbol,
        } => format_currency(value, *decimal_places, symbol),
        NumberFormat::Percentage { decimal_places } => format_percentage(value, *decimal_places),
        NumberFormat::Scientific { decimal_places } => format_scientific(value, *decimal_places),
    }
}

fn format_grouped(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        return add_thousands_separator(&format!("{:.0}", value));
    }
    let rounded = format!("{:.2}", value);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    add_thousands_separator(trimmed)
}

/// Format a number in general format (auto-detect best representation).
fn format_general(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }

    let abs_value = value.abs();

    // Use scientific notation for very large or very small numbers
    if abs_value >= 1e10 || (abs_value < 1e-4 && abs_value > 0.0) {
        return format!("{:.5e}", value);
    }

    if value.fract() == 0.0 && abs_value < 1e15 {
        return format!("{:.0}", value);
    }

    let formatted = format!("{:.10}", value);
    formatted
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

fn format_decimal(value: f64, decimal_places: u8, use_thousands_separator: bool) -> String {
    let rounded = format!("{:.prec$}", value, prec = decimal_places as usize);

    if use_thousands_separator {
        add_thousands_separator(&rounded)
    } else {
        rounded
    }
}

/// Add thousands separators to a numeric string.
fn add_thousands_separator(s: &str) -> String {
    let mut parts = s.splitn(2, '.');
    let integer_part = parts.next().unwrap_or("");
    let decimal_part = parts.next();

    let negative = integer_part.starts_with('-');
    let digits: String = integer_part.chars().filter(|c| c.is_ascii_digit()).collect();

    let mut result = String::new();
    let len = digits.len();

    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }

    if negative {
        result = format!("-{}", result);
    }

    if let Some(decimal) = decimal_part {
        result.push('.');
        result.push_str(decimal);
    }

    result
}

fn format_currency(value: f64, decimal_places: u8, symbol: &str) -> String {
    let formatted = add_thousands_separator(&format!(
        "{:.prec$}",
        value.abs(),
        prec = decimal_places as usize
    ));

    if value < 0.0 {
        format!("-{}{}", symbol, formatted)
    } else {
        format!("{}{}", symbol, formatted)
    }
}

fn format_percentage(value: f64, decimal_places: u8) -> String {
    let percentage = value * 100.0;
    format!("{:.prec$}%", percentage, prec = decimal_places as usize)
}

fn format_scientific(value: f64, decimal_places: u8) -> String {
    format!("{:.prec$e}", value, prec = decimal_places as usize).replace('e', "E")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grouped_integers() {
        assert_eq!(format_number(18760.0, &NumberFormat::Grouped), "18,760");
        assert_eq!(format_number(899.0, &NumberFormat::Grouped), "899");
        assert_eq!(format_number(-1352.0, &NumberFormat::Grouped), "-1,352");
    }

    #[test]
    fn grouped_decimals() {
        assert_eq!(format_number(1510621.6789, &NumberFormat::Grouped), "1,510,621.68");
        assert_eq!(format_number(2.5, &NumberFormat::Grouped), "2.5");
    }

    #[test]
    fn currency_and_percentage() {
        let usd = NumberFormat::Currency { decimal_places: 2, symbol: "$".to_string() };
        assert_eq!(format_number(1234.5, &usd), "$1,234.50");
        assert_eq!(format_number(-3.0, &usd), "-$3.00");
        assert_eq!(
            format_number(0.125, &NumberFormat::Percentage { decimal_places: 1 }),
            "12.5%"
        );
    }
}
