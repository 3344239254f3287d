//! Date helper functions

use chrono::{DateTime, Locale, Utc};
use chrono_tz::Tz;

use crate::config::SiteConfig;

/// Formats timestamps for display in the site's locale and timezone
#[derive(Debug, Clone)]
pub struct DateFormatter {
    locale: Locale,
    timezone: Tz,
    date_format: String,
    time_format: String,
}

impl DateFormatter {
    /// Create a formatter from a language tag (`pt-BR`), an IANA timezone
    /// and Moment.js-style date and time formats
    pub fn new(language: &str, timezone: &str, date_format: &str, time_format: &str) -> Self {
        let timezone = timezone.parse::<Tz>().unwrap_or_else(|_| {
            if !timezone.is_empty() {
                tracing::warn!("Unknown timezone {:?}, using UTC", timezone);
            }
            Tz::UTC
        });

        Self {
            locale: parse_locale(language),
            timezone,
            date_format: moment_to_chrono_format(date_format),
            time_format: moment_to_chrono_format(time_format),
        }
    }

    pub fn from_config(config: &SiteConfig) -> Self {
        Self::new(
            &config.language,
            &config.timezone,
            &config.date_format,
            &config.time_format,
        )
    }

    /// Date portion, e.g. `15 mar 2021`
    pub fn date(&self, dt: &DateTime<Utc>) -> String {
        dt.with_timezone(&self.timezone)
            .format_localized(&self.date_format, self.locale)
            .to_string()
    }

    /// Time portion, e.g. `19:25`
    pub fn time(&self, dt: &DateTime<Utc>) -> String {
        dt.with_timezone(&self.timezone)
            .format_localized(&self.time_format, self.locale)
            .to_string()
    }
}

impl Default for DateFormatter {
    fn default() -> Self {
        let config = SiteConfig::default();
        Self::from_config(&config)
    }
}

/// Map a language tag such as `pt-BR` to a chrono locale.
/// Unknown tags fall back to POSIX (English names).
fn parse_locale(language: &str) -> Locale {
    let tag = language.replace('-', "_");
    Locale::try_from(tag.as_str()).unwrap_or_else(|_| match tag.as_str() {
        "en" => Locale::en_US,
        "pt" => Locale::pt_BR,
        _ => Locale::POSIX,
    })
}

/// Format a date in ISO 8601 / XML format
pub fn date_xml(date: &DateTime<Utc>) -> String {
    date.format("%Y-%m-%dT%H:%M:%S%.3f%:z").to_string()
}

/// Convert Moment.js format to chrono format
fn moment_to_chrono_format(format: &str) -> String {
    let replacements = [
        // Year
        ("YYYY", "%Y"),
        ("YY", "%y"),
        // Month (uppercase M)
        ("MMMM", "%B"),
        ("MMM", "%b"),
        ("MM", "%m"),
        // Day of month
        ("DD", "%d"),
        // Hour 24h
        ("HH", "%H"),
        // Hour 12h
        ("hh", "%I"),
        // Minute (lowercase m after MM is gone)
        ("mm", "%M"),
        ("ss", "%S"),
        // Day of week
        ("dddd", "%A"),
        ("ddd", "%a"),
    ];

    let mut result = format.to_string();
    for (from, to) in replacements {
        result = result.replace(from, to);
    }
    result
}
