//! CSV export of cached reviews.

use crate::types::{ReviewFilter, ReviewRecord, SelectionMode};
use crate::{Result, TimesinkError};

/// Column headers, in order.
pub const CSV_HEADER: [&str; 5] = [
    "Sentiment Label",
    "Sentiment Compound",
    "Playtime (Hours)",
    "Theme Tags",
    "Review Text",
];

/// A rendered CSV download.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvExport {
    pub file_name: String,
    pub content: String,
    pub rows: usize,
    pub mode: SelectionMode,
}

/// `steam_reviews_{subject}_{count}_{filter}_{language}_{mode}.csv`
///
/// Caller-supplied parts keep only `[A-Za-z0-9_-]` so the name is safe to
/// quote in a `Content-Disposition` header.
pub fn export_file_name(
    subject_id: &str,
    count: u32,
    filter: ReviewFilter,
    language: &str,
    mode: SelectionMode,
) -> String {
    format!(
        "steam_reviews_{}_{count}_{filter}_{}_{}.csv",
        file_name_part(subject_id),
        file_name_part(language),
        mode.as_str()
    )
}

fn file_name_part(raw: &str) -> String {
    let part: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-'))
        .collect();
    if part.is_empty() {
        "unknown".to_string()
    } else {
        part
    }
}

/// Review text with line breaks collapsed to spaces and outer whitespace trimmed.
pub fn sanitize_text(text: &str) -> String {
    text.replace("\r\n", " ")
        .replace(['\r', '\n'], " ")
        .trim()
        .to_string()
}

/// Render `records` as CSV with a header row.
pub fn render_csv<'a, I>(records: I) -> Result<String>
where
    I: IntoIterator<Item = &'a ReviewRecord>,
{
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADER).map_err(export_error)?;
    for record in records {
        writer
            .write_record([
                record.sentiment_label.as_str().to_string(),
                format!("{:?}", record.sentiment_score),
                format!("{:?}", record.playtime_hours),
                record.joined_tags(),
                sanitize_text(&record.text),
            ])
            .map_err(export_error)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| TimesinkError::Export(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| TimesinkError::Export(e.to_string()))
}

fn export_error(e: csv::Error) -> TimesinkError {
    TimesinkError::Export(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SentimentLabel, Theme};

    fn record(text: &str, tags: &[Theme]) -> ReviewRecord {
        ReviewRecord {
            text: text.to_string(),
            playtime_hours: 12.5,
            sentiment_label: SentimentLabel::Negative,
            sentiment_score: -0.4404,
            theme_tags: tags.iter().copied().collect(),
        }
    }

    #[test]
    fn header_and_row_shape() {
        let csv = render_csv(&[record("too short,\nsadly\n", &[Theme::Value, Theme::Length])])
            .unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("Sentiment Label,Sentiment Compound,Playtime (Hours),Theme Tags,Review Text")
        );
        assert_eq!(
            lines.next(),
            Some("Negative,-0.4404,12.5,length|value,\"too short, sadly\"")
        );
    }

    #[test]
    fn file_name_carries_mode() {
        assert_eq!(
            export_file_name("570", 1000, ReviewFilter::Recent, "english", SelectionMode::Themed),
            "steam_reviews_570_1000_recent_english_themed.csv"
        );
    }

    #[test]
    fn file_name_drops_unsafe_characters() {
        assert_eq!(
            export_file_name(
                "570\"; x=\"../evil",
                20,
                ReviewFilter::All,
                "en\"glish\r\n",
                SelectionMode::All
            ),
            "steam_reviews_570xevil_20_all_english_all.csv"
        );
        assert_eq!(
            export_file_name("\"\"", 1, ReviewFilter::Recent, "", SelectionMode::Themed),
            "steam_reviews_unknown_1_recent_unknown_themed.csv"
        );
    }

    #[test]
    fn sanitize_collapses_line_breaks() {
        assert_eq!(sanitize_text("  a\r\nb\nc\r "), "a b c");
    }
}
