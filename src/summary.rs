//! Text summary of an analytics report

use crate::analytics::AnalyticsReport;
use crate::period::Period;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};

/// Labeled scalar lines of the summary, in display order
pub fn summary_lines(report: &AnalyticsReport) -> Vec<(&'static str, String)> {
    vec![
        (
            "Period",
            format!("{} to {}", report.start_date, report.end_date),
        ),
        ("Trading Days", report.trading_days.to_string()),
        ("Start Price", format!("{:.2}", report.start_price)),
        ("End Price", format!("{:.2}", report.end_price)),
        ("Total Return", format!("{:+.2}%", report.total_return_pct)),
        (
            "Volatility",
            report
                .volatility_pct
                .map(|v| format!("{:.2}%", v))
                .unwrap_or_else(|| "n/a".to_string()),
        ),
        ("Highest", format!("{:.2}", report.high_max)),
        ("Lowest", format!("{:.2}", report.low_min)),
    ]
}

/// Render the summary as a heading plus a two-column table
pub fn render_summary(symbol: &str, period: Period, report: &AnalyticsReport) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Metric", "Value"]);

    for (label, value) in summary_lines(report) {
        table.add_row(vec![
            Cell::new(label),
            Cell::new(value).set_alignment(CellAlignment::Right),
        ]);
    }

    format!(
        "{} COMPLETE ANALYSIS ({})\n{}",
        symbol, period, table
    )
}

/// Pretty-printed JSON of the full report
pub fn report_json(report: &AnalyticsReport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::AnalyticsEngine;
    use crate::normalizer::SeriesNormalizer;
    use crate::types::{ColumnHeader, RawRow, RawTable};
    use chrono::NaiveDate;

    fn report(closes: &[f64]) -> AnalyticsReport {
        let start = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let rows = closes
            .iter()
            .enumerate()
            .map(|(i, c)| {
                RawRow::new(
                    start + chrono::Days::new(i as u64),
                    vec![*c, c + 2.0, c - 2.0, *c, 500.0],
                )
            })
            .collect();
        let header = ColumnHeader::Flat(vec!["O".into(), "H".into(), "L".into(), "C".into(), "V".into()]);
        let series = SeriesNormalizer::new()
            .normalize(&RawTable::new(header, rows))
            .unwrap();
        AnalyticsEngine::new().analyze(&series).unwrap()
    }

    #[test]
    fn test_summary_lines_format() {
        let lines = summary_lines(&report(&[100.0, 90.0, 110.0]));
        let get = |label: &str| {
            lines
                .iter()
                .find(|(l, _)| *l == label)
                .map(|(_, v)| v.clone())
                .unwrap()
        };

        assert_eq!(get("Period"), "2024-05-01 to 2024-05-03");
        assert_eq!(get("Trading Days"), "3");
        assert_eq!(get("Start Price"), "100.00");
        assert_eq!(get("End Price"), "110.00");
        assert_eq!(get("Total Return"), "+10.00%");
        assert_eq!(get("Highest"), "112.00");
        assert_eq!(get("Lowest"), "88.00");
        assert!(get("Volatility").ends_with('%'));
    }

    #[test]
    fn test_negative_return_and_missing_volatility() {
        let lines = summary_lines(&report(&[100.0, 95.0]));
        assert!(lines.contains(&("Total Return", "-5.00%".to_string())));
        assert!(lines.contains(&("Volatility", "n/a".to_string())));
    }

    #[test]
    fn test_rendered_summary_has_heading_and_rows() {
        let text = render_summary("TCS.NS", Period::SixMonths, &report(&[100.0, 101.0, 102.0]));
        assert!(text.starts_with("TCS.NS COMPLETE ANALYSIS (6M)"));
        assert!(text.contains("Trading Days"));
        assert!(text.contains("+2.00%"));
    }

    #[test]
    fn test_report_json_omits_nothing() {
        let json = report_json(&report(&[100.0, 101.0, 102.0])).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["trading_days"], 3);
        assert!(value["ma20"].is_null());
        assert_eq!(value["daily_returns"].as_array().unwrap().len(), 2);
    }
}
