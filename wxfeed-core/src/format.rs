//! Percent-directive output templates.
//!
//! | directive | value                         |
//! |-----------|-------------------------------|
//! | `%c`      | city                          |
//! | `%C`      | country                       |
//! | `%d`      | observation time (date format)|
//! | `%t`      | temperature                   |
//! | `%T`      | temperature with unit         |
//! | `%w`      | wind speed                    |
//! | `%W`      | wind speed with unit          |
//! | `%e`      | description                   |
//! | `%%`      | literal `%`                   |

use std::fmt::Write as _;

use chrono::format::{Item, StrftimeItems};

use crate::{error::ConfigError, model::WeatherRecord};

pub const DEFAULT_FORMAT: &str = "%c (%C),%d,%e,%T,%W";
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    City,
    Country,
    Date,
    Temperature,
    TemperatureWithUnit,
    WindSpeed,
    WindSpeedWithUnit,
    Description,
}

impl Field {
    fn from_directive(letter: char) -> Option<Self> {
        let field = match letter {
            'c' => Field::City,
            'C' => Field::Country,
            'd' => Field::Date,
            't' => Field::Temperature,
            'T' => Field::TemperatureWithUnit,
            'w' => Field::WindSpeed,
            'W' => Field::WindSpeedWithUnit,
            'e' => Field::Description,
            _ => return None,
        };
        Some(field)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field(Field),
}

/// A compiled output template, reusable across records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatSpec {
    segments: Vec<Segment>,
}

impl FormatSpec {
    /// Compile a template, rejecting unknown directives up front.
    pub fn compile(template: &str) -> Result<Self, ConfigError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = template.chars();

        while let Some(ch) = chars.next() {
            if ch != '%' {
                literal.push(ch);
                continue;
            }

            let letter = chars.next().ok_or(ConfigError::DanglingMarker)?;
            if letter == '%' {
                literal.push('%');
                continue;
            }

            let field =
                Field::from_directive(letter).ok_or(ConfigError::UnknownDirective(letter))?;
            if !literal.is_empty() {
                segments.push(Segment::Literal(std::mem::take(&mut literal)));
            }
            segments.push(Segment::Field(field));
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self { segments })
    }

    /// Substitute every directive with the corresponding record value.
    pub fn render(
        &self,
        record: &WeatherRecord,
        date_format: &DateFormatSpec,
    ) -> Result<String, ConfigError> {
        let mut out = String::new();

        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field(Field::City) => out.push_str(&record.city),
                Segment::Field(Field::Country) => out.push_str(&record.country),
                Segment::Field(Field::Date) => {
                    let formatted = record.observed_at.format(date_format.pattern());
                    write!(out, "{formatted}").map_err(|_| ConfigError::DateRender)?;
                }
                Segment::Field(Field::Temperature) => out.push_str(&record.temperature),
                Segment::Field(Field::TemperatureWithUnit) => {
                    out.push_str(&record.temperature);
                    out.push('°');
                    out.push_str(&record.temperature_unit);
                }
                Segment::Field(Field::WindSpeed) => out.push_str(&record.wind_speed),
                Segment::Field(Field::WindSpeedWithUnit) => {
                    out.push_str(&record.wind_speed);
                    out.push(' ');
                    out.push_str(&record.wind_speed_unit);
                }
                Segment::Field(Field::Description) => out.push_str(&record.description),
            }
        }

        Ok(out)
    }
}

impl Default for FormatSpec {
    fn default() -> Self {
        Self {
            segments: vec![
                Segment::Field(Field::City),
                Segment::Literal(" (".into()),
                Segment::Field(Field::Country),
                Segment::Literal("),".into()),
                Segment::Field(Field::Date),
                Segment::Literal(",".into()),
                Segment::Field(Field::Description),
                Segment::Literal(",".into()),
                Segment::Field(Field::TemperatureWithUnit),
                Segment::Literal(",".into()),
                Segment::Field(Field::WindSpeedWithUnit),
            ],
        }
    }
}

/// strftime-style pattern used for the `%d` directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateFormatSpec {
    pattern: String,
}

impl DateFormatSpec {
    pub fn new(pattern: &str) -> Result<Self, ConfigError> {
        if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
            return Err(ConfigError::BadDateFormat(pattern.to_string()));
        }

        Ok(Self {
            pattern: pattern.to_string(),
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

impl Default for DateFormatSpec {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_DATE_FORMAT.to_string(),
        }
    }
}
