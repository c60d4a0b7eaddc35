//! Date helper functions

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate};
use chrono_tz::Tz;

use crate::config::SiteConfig;

/// Abbreviated month names of the pt-BR locale
const PT_BR_MONTHS: [&str; 12] = [
    "jan", "fev", "mar", "abr", "mai", "jun", "jul", "ago", "set", "out", "nov", "dez",
];

#[derive(Debug, thiserror::Error)]
#[error("unrecognized timestamp '{0}'")]
pub struct DateError(pub String);

/// A publication timestamp as sent by the CMS
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishedAt {
    /// Full timestamp with offset
    Instant(DateTime<FixedOffset>),
    /// Calendar date without a time of day
    Day(NaiveDate),
}

impl PublishedAt {
    /// Calendar date as seen in `tz`
    pub fn date_in(&self, tz: &Tz) -> NaiveDate {
        match self {
            PublishedAt::Instant(dt) => dt.with_timezone(tz).date_naive(),
            PublishedAt::Day(day) => *day,
        }
    }
}

/// Parse a CMS timestamp.
///
/// Accepts RFC 3339, the Prismic form (`2021-03-25T19:25:28+0000`) and plain
/// `YYYY-MM-DD` dates.
pub fn parse_timestamp(value: &str) -> Result<PublishedAt, DateError> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(PublishedAt::Instant(dt));
    }
    if let Ok(dt) = DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%z") {
        return Ok(PublishedAt::Instant(dt));
    }
    if let Ok(day) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(PublishedAt::Day(day));
    }

    Err(DateError(value.to_string()))
}

/// Format a date as "DD mon YYYY" with pt-BR month names
///
/// # Examples
/// ```ignore
/// format_date_pt_br(&date) // -> "10 jan 2022"
/// ```
pub fn format_date_pt_br(date: &NaiveDate) -> String {
    format!(
        "{:02} {} {}",
        date.day(),
        PT_BR_MONTHS[date.month0() as usize],
        date.year()
    )
}

/// Renders publication dates for display
#[derive(Debug, Clone)]
pub struct DateFormatter {
    tz: Tz,
    unavailable: String,
}

impl DateFormatter {
    pub fn new(tz: Tz, unavailable: impl Into<String>) -> Self {
        Self {
            tz,
            unavailable: unavailable.into(),
        }
    }

    /// Build from the site time zone and fallback label
    pub fn from_config(config: &SiteConfig) -> anyhow::Result<Self> {
        Ok(Self::new(config.tz()?, config.date_unavailable.clone()))
    }

    /// Display form of a publication timestamp.
    ///
    /// Missing and unparseable timestamps render as the fallback label.
    pub fn format(&self, value: Option<&str>) -> String {
        let Some(value) = value else {
            return self.unavailable.clone();
        };

        match parse_timestamp(value) {
            Ok(published) => format_date_pt_br(&published.date_in(&self.tz)),
            Err(e) => {
                tracing::warn!("{}, showing '{}' instead", e, self.unavailable);
                self.unavailable.clone()
            }
        }
    }

    /// Machine-readable date for a `<time datetime>` attribute
    pub fn date_xml(&self, value: Option<&str>) -> Option<String> {
        let published = parse_timestamp(value?).ok()?;
        Some(published.date_in(&self.tz).format("%Y-%m-%d").to_string())
    }

    /// Label used when no date can be shown
    pub fn unavailable(&self) -> &str {
        &self.unavailable
    }
}

impl Default for DateFormatter {
    fn default() -> Self {
        Self::new(chrono_tz::America::Sao_Paulo, "date unavailable")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_date_only() {
        let formatter = DateFormatter::default();
        assert_eq!(formatter.format(Some("2022-01-10")), "10 jan 2022");
    }

    #[test]
    fn test_format_prismic_timestamp() {
        let formatter = DateFormatter::default();
        assert_eq!(
            formatter.format(Some("2021-03-25T19:25:28+0000")),
            "25 mar 2021"
        );
    }

    #[test]
    fn test_format_converts_to_site_timezone() {
        let formatter = DateFormatter::default();
        assert_eq!(
            formatter.format(Some("2021-03-01T01:00:00+0000")),
            "28 fev 2021"
        );
        let utc = DateFormatter::new(chrono_tz::UTC, "n/a");
        assert_eq!(utc.format(Some("2021-03-01T01:00:00Z")), "01 mar 2021");
    }

    #[test]
    fn test_all_month_names() {
        let names: Vec<String> = (1..=12)
            .map(|m| format_date_pt_br(&NaiveDate::from_ymd_opt(2022, m, 5).unwrap()))
            .collect();
        assert_eq!(names[1], "05 fev 2022");
        assert_eq!(names[4], "05 mai 2022");
        assert_eq!(names[7], "05 ago 2022");
        assert_eq!(names[8], "05 set 2022");
        assert_eq!(names[9], "05 out 2022");
        assert_eq!(names[11], "05 dez 2022");
    }

    #[test]
    fn test_missing_and_invalid_dates_fall_back() {
        let formatter = DateFormatter::new(chrono_tz::UTC, "date unavailable");
        assert_eq!(formatter.format(None), "date unavailable");
        assert_eq!(formatter.format(Some("yesterday")), "date unavailable");
    }

    #[test]
    fn test_parse_timestamp() {
        assert!(matches!(
            parse_timestamp("2021-03-25T19:25:28+0000"),
            Ok(PublishedAt::Instant(_))
        ));
        assert!(matches!(
            parse_timestamp("2021-03-25T19:25:28.000Z"),
            Ok(PublishedAt::Instant(_))
        ));
        assert!(matches!(
            parse_timestamp("2021-03-25"),
            Ok(PublishedAt::Day(_))
        ));
        assert!(parse_timestamp("25/03/2021").is_err());
    }

    #[test]
    fn test_date_xml() {
        let formatter = DateFormatter::new(chrono_tz::UTC, "n/a");
        assert_eq!(
            formatter.date_xml(Some("2021-03-25T19:25:28+0000")),
            Some("2021-03-25".to_string())
        );
        assert_eq!(formatter.date_xml(None), None);
    }
}
