//! Presentation helpers shared by analyzers and stage fallbacks.

use chrono::{DateTime, NaiveDate};

use super::types::{ExtractedData, LabeledDate};

/// One-line description of a document from its parties and amount.
pub fn headline(data: &ExtractedData) -> String {
    let parties = &data.parties;

    if parties.len() >= 2 {
        if let Some(amount) = data.monetary_values.headline_amount() {
            return format!(
                "Agreement between {} and {} for ₹{}",
                parties[0].name,
                parties[1].name,
                format_amount_inr(amount)
            );
        }
    }

    if !parties.is_empty() {
        let names: Vec<&str> = parties.iter().map(|p| p.name.as_str()).collect();
        return format!("Legal document involving {}", names.join(", "));
    }

    "Legal document summary".to_string()
}

/// Execution and expiry dates, in that order, when present.
pub fn important_dates(data: &ExtractedData) -> Vec<LabeledDate> {
    let mut result = Vec::new();

    if let Some(date) = &data.dates.execution_date {
        result.push(LabeledDate {
            label: "Execution Date".to_string(),
            value: format_date(date),
        });
    }

    if let Some(date) = &data.dates.expiry_date {
        result.push(LabeledDate {
            label: "Expiry Date".to_string(),
            value: format_date(date),
        });
    }

    result
}

/// Formats an amount with Indian digit grouping (`15,00,000`).
pub fn format_amount_inr(amount: f64) -> String {
    let negative = amount < 0.0;
    let rounded = (amount.abs() * 100.0).round() / 100.0;
    let whole = rounded.trunc() as u64;
    let cents = ((rounded - rounded.trunc()) * 100.0).round() as u64;

    let digits = whole.to_string();
    let mut grouped = String::new();
    if digits.len() > 3 {
        let (head, tail) = digits.split_at(digits.len() - 3);
        let head_bytes = head.as_bytes();
        for (i, ch) in head_bytes.iter().enumerate() {
            if i > 0 && (head_bytes.len() - i) % 2 == 0 {
                grouped.push(',');
            }
            grouped.push(*ch as char);
        }
        grouped.push(',');
        grouped.push_str(tail);
    } else {
        grouped.push_str(&digits);
    }

    if cents > 0 {
        let fraction = format!("{:02}", cents);
        grouped.push('.');
        grouped.push_str(fraction.trim_end_matches('0'));
    }

    if negative {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

/// Renders `YYYY-MM-DD` (or RFC 3339) as `15 Jan 2024`; other input is returned unchanged.
pub fn format_date(value: &str) -> String {
    let trimmed = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return date.format("%-d %b %Y").to_string();
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return dt.format("%-d %b %Y").to_string();
    }
    trimmed.to_string()
}
