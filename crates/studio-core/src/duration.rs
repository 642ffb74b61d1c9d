//! Total duration estimate for a proposal timeline
//!
//! Timeline durations are free text written by the model in either
//! language ("2-3 weeks", "1 mês", "Ongoing"). Each entry is parsed into a
//! day range, the ranges are summed, and the total is rendered back in the
//! most readable unit.

use std::sync::OnceLock;

use regex::Regex;

use crate::i18n::Locale;
use crate::proposal::TimelineEntry;

const DAYS_PER_WEEK: f64 = 7.0;
const DAYS_PER_MONTH: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationUnit {
    Day,
    Week,
    Month,
}

impl DurationUnit {
    fn days(self) -> f64 {
        match self {
            DurationUnit::Day => 1.0,
            DurationUnit::Week => DAYS_PER_WEEK,
            DurationUnit::Month => DAYS_PER_MONTH,
        }
    }

    fn label(self, locale: Locale, plural: bool) -> &'static str {
        match (locale, self, plural) {
            (Locale::En, DurationUnit::Day, false) => "day",
            (Locale::En, DurationUnit::Day, true) => "days",
            (Locale::En, DurationUnit::Week, false) => "week",
            (Locale::En, DurationUnit::Week, true) => "weeks",
            (Locale::En, DurationUnit::Month, false) => "month",
            (Locale::En, DurationUnit::Month, true) => "months",
            (Locale::Pt, DurationUnit::Day, false) => "dia",
            (Locale::Pt, DurationUnit::Day, true) => "dias",
            (Locale::Pt, DurationUnit::Week, false) => "semana",
            (Locale::Pt, DurationUnit::Week, true) => "semanas",
            (Locale::Pt, DurationUnit::Month, false) => "mês",
            (Locale::Pt, DurationUnit::Month, true) => "meses",
        }
    }
}

/// A single parsed timeline duration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParsedDuration {
    Ongoing,
    Days { min: f64, max: f64 },
}

/// Sum of all timeline durations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DurationEstimate {
    Ongoing,
    Days { min: f64, max: f64 },
}

fn ongoing_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(ongoing|continuous|cont[ií]nu[oa])\b").expect("valid ongoing pattern")
    })
}

fn number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(\d+(?:[.,]\d+)?)(?:\s*(?:-|–|—|to|a|até)\s*(\d+(?:[.,]\d+)?))?")
            .expect("valid number pattern")
    })
}

fn unit_res() -> &'static [(DurationUnit, Regex); 3] {
    static RES: OnceLock<[(DurationUnit, Regex); 3]> = OnceLock::new();
    RES.get_or_init(|| {
        [
            (
                DurationUnit::Month,
                Regex::new(r"(?i)\b(months?|m[eê]s|meses)\b").expect("valid month pattern"),
            ),
            (
                DurationUnit::Week,
                Regex::new(r"(?i)\b(weeks?|semanas?)\b").expect("valid week pattern"),
            ),
            (
                DurationUnit::Day,
                Regex::new(r"(?i)\b(days?|dias?)\b").expect("valid day pattern"),
            ),
        ]
    })
}

fn parse_number(s: &str) -> f64 {
    s.replace(',', ".").parse().unwrap_or(0.0)
}

/// Unit named in the text, weeks when none is recognized.
pub fn detect_unit(text: &str) -> DurationUnit {
    unit_res()
        .iter()
        .find(|(_, re)| re.is_match(text))
        .map(|(unit, _)| *unit)
        .unwrap_or(DurationUnit::Week)
}

/// Parse one duration string. Text without a number counts as zero days.
pub fn parse_duration(text: &str) -> ParsedDuration {
    if ongoing_re().is_match(text) {
        return ParsedDuration::Ongoing;
    }

    let unit = detect_unit(text);
    let Some(caps) = number_re().captures(text) else {
        return ParsedDuration::Days { min: 0.0, max: 0.0 };
    };

    let low = caps.get(1).map(|m| parse_number(m.as_str())).unwrap_or(0.0);
    let high = caps.get(2).map(|m| parse_number(m.as_str())).unwrap_or(low);
    let (low, high) = if high < low { (high, low) } else { (low, high) };

    ParsedDuration::Days {
        min: low * unit.days(),
        max: high * unit.days(),
    }
}

/// Sum a list of duration strings. Any ongoing entry makes the whole
/// estimate ongoing.
pub fn aggregate<'a, I>(durations: I) -> DurationEstimate
where
    I: IntoIterator<Item = &'a str>,
{
    let mut min = 0.0;
    let mut max = 0.0;

    for text in durations {
        match parse_duration(text) {
            ParsedDuration::Ongoing => return DurationEstimate::Ongoing,
            ParsedDuration::Days { min: lo, max: hi } => {
                min += lo;
                max += hi;
            }
        }
    }

    DurationEstimate::Days { min, max }
}

pub fn estimate_timeline(timeline: &[TimelineEntry]) -> DurationEstimate {
    aggregate(timeline.iter().map(|entry| entry.duration.as_str()))
}

fn format_amount(value: f64) -> String {
    let rounded = value.round();
    format!("{}", rounded as i64)
}

impl DurationEstimate {
    /// Human-readable total: months from 120 days, weeks from 14 days,
    /// days below that.
    pub fn render(&self, locale: Locale) -> String {
        let (min, max) = match *self {
            DurationEstimate::Ongoing => {
                return match locale {
                    Locale::En => "Ongoing".to_string(),
                    Locale::Pt => "Contínuo".to_string(),
                };
            }
            DurationEstimate::Days { min, max } => (min, max),
        };

        let unit = if max >= 120.0 {
            DurationUnit::Month
        } else if max >= 14.0 {
            DurationUnit::Week
        } else {
            DurationUnit::Day
        };

        let lo = format_amount(min / unit.days());
        let hi = format_amount(max / unit.days());

        if lo == hi {
            let plural = lo != "1";
            format!("{} {}", hi, unit.label(locale, plural))
        } else {
            format!("{}-{} {}", lo, hi, unit.label(locale, true))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_range_weeks() {
        assert_eq!(
            parse_duration("2-3 weeks"),
            ParsedDuration::Days { min: 14.0, max: 21.0 }
        );
    }

    #[test]
    fn test_parse_portuguese_units() {
        assert_eq!(
            parse_duration("2 a 3 meses"),
            ParsedDuration::Days { min: 60.0, max: 90.0 }
        );
        assert_eq!(
            parse_duration("10 dias"),
            ParsedDuration::Days { min: 10.0, max: 10.0 }
        );
        assert_eq!(
            parse_duration("1 mês"),
            ParsedDuration::Days { min: 30.0, max: 30.0 }
        );
    }

    #[test]
    fn test_unknown_unit_defaults_to_weeks() {
        assert_eq!(parse_duration("3"), ParsedDuration::Days { min: 21.0, max: 21.0 });
    }

    #[test]
    fn test_unrecognized_text_is_zero() {
        assert_eq!(
            parse_duration("to be defined"),
            ParsedDuration::Days { min: 0.0, max: 0.0 }
        );
    }

    #[test]
    fn test_ongoing_short_circuits() {
        for order in [
            ["1 week", "2-3 weeks", "Ongoing"],
            ["Ongoing", "1 week", "2-3 weeks"],
            ["2-3 weeks", "Ongoing", "1 week"],
        ] {
            let total = aggregate(order);
            assert_eq!(total, DurationEstimate::Ongoing);
            assert_eq!(total.render(Locale::En), "Ongoing");
            assert_eq!(total.render(Locale::Pt), "Contínuo");
        }
    }

    #[test]
    fn test_days_sum() {
        let total = aggregate(["3 days", "4 days"]);
        assert_eq!(total, DurationEstimate::Days { min: 7.0, max: 7.0 });
        assert_eq!(total.render(Locale::En), "7 days");
        assert_eq!(total.render(Locale::Pt), "7 dias");
    }

    #[test]
    fn test_singular() {
        assert_eq!(aggregate(["1 day"]).render(Locale::En), "1 day");
        assert_eq!(aggregate(["20 days", "1 day"]).render(Locale::En), "3 weeks");
        assert_eq!(aggregate(["4 months"]).render(Locale::Pt), "4 meses");
    }

    #[test]
    fn test_weeks_range() {
        assert_eq!(aggregate(["1 week", "2-3 weeks"]).render(Locale::En), "3-4 weeks");
    }

    #[test]
    fn test_months_threshold() {
        assert_eq!(aggregate(["2 months", "2 months"]).render(Locale::En), "4 months");
        assert_eq!(aggregate(["3 months"]).render(Locale::En), "13 weeks");
    }

    #[test]
    fn test_empty_timeline() {
        assert_eq!(estimate_timeline(&[]).render(Locale::En), "0 days");
    }
}
