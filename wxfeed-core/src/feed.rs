use std::collections::HashMap;

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use roxmltree::{Document, Node};
use tracing::debug;

use crate::{error::ParseError, model::WeatherRecord};

/// Namespace of the weather extension elements in the reference feed.
pub const WEATHER_NAMESPACE: &str = "http://xml.weather.yahoo.com/ns/rss/1.0";

const PUB_DATE_LAYOUT: &str = "%a, %d %b %Y %I:%M %p";

/// Parse a feed document, resolving weather elements against [`WEATHER_NAMESPACE`].
pub fn parse(text: &str) -> Result<WeatherRecord, ParseError> {
    parse_with_namespace(text, WEATHER_NAMESPACE)
}

/// Parse a feed document whose weather extension elements live in `namespace`.
pub fn parse_with_namespace(text: &str, namespace: &str) -> Result<WeatherRecord, ParseError> {
    let doc = Document::parse(text)?;

    let channel = child(doc.root_element(), "channel")?;
    let item = child(channel, "item")?;

    let namespaces = declared_namespaces(&doc);
    debug!(?namespaces, "discovered feed namespaces");
    let ns = namespaces
        .values()
        .find(|uri| uri.as_str() == namespace)
        .ok_or_else(|| ParseError::MissingNamespace(namespace.to_string()))?;

    let units = ns_child(channel, ns, "units")?;
    let location = ns_child(channel, ns, "location")?;
    let wind = ns_child(channel, ns, "wind")?;
    let condition = ns_child(item, ns, "condition")?;
    let pub_date = child(item, "pubDate")?;

    let date_text = pub_date.text().unwrap_or_default();
    let observed_at = parse_pub_date(date_text)?;

    Ok(WeatherRecord {
        city: attr(location, "location", "city")?,
        country: attr(location, "location", "country")?,
        observed_at,
        temperature: attr(condition, "condition", "temp")?,
        temperature_unit: attr(units, "units", "temperature")?,
        wind_speed: attr(wind, "wind", "speed")?,
        wind_speed_unit: attr(units, "units", "speed")?,
        description: attr(condition, "condition", "text")?,
    })
}

/// Prefix to URI mapping of every prefixed namespace declared in the document.
fn declared_namespaces(doc: &Document<'_>) -> HashMap<String, String> {
    doc.descendants()
        .filter(|node| node.is_element())
        .flat_map(|node| node.namespaces())
        .filter_map(|ns| ns.name().map(|prefix| (prefix.to_string(), ns.uri().to_string())))
        .collect()
}

fn child<'a, 'input>(
    parent: Node<'a, 'input>,
    name: &'static str,
) -> Result<Node<'a, 'input>, ParseError> {
    parent
        .children()
        .find(|node| node.is_element() && node.has_tag_name(name))
        .ok_or(ParseError::MissingElement(name))
}

fn ns_child<'a, 'input>(
    parent: Node<'a, 'input>,
    namespace: &str,
    name: &'static str,
) -> Result<Node<'a, 'input>, ParseError> {
    parent
        .children()
        .find(|node| node.is_element() && node.has_tag_name((namespace, name)))
        .ok_or(ParseError::MissingElement(name))
}

fn attr(
    node: Node<'_, '_>,
    element: &'static str,
    attribute: &'static str,
) -> Result<String, ParseError> {
    node.attribute(attribute)
        .map(str::to_string)
        .ok_or(ParseError::MissingAttribute { element, attribute })
}

/// Parse `"Fri, 15 Nov 2013 12:59 pm CET"`, keeping the feed's wall-clock time.
pub fn parse_pub_date(text: &str) -> Result<DateTime<FixedOffset>, ParseError> {
    let bad = || ParseError::BadTimestamp(text.to_string());

    let (local, zone) = text.trim().rsplit_once(' ').ok_or_else(bad)?;
    let naive =
        NaiveDateTime::parse_from_str(local.trim_end(), PUB_DATE_LAYOUT).map_err(|_| bad())?;
    let offset = zone_offset(zone).ok_or_else(bad)?;

    naive.and_local_timezone(offset).single().ok_or_else(bad)
}

fn zone_offset(zone: &str) -> Option<FixedOffset> {
    if let Some(offset) = numeric_offset(zone) {
        return Some(offset);
    }

    let hours = match zone.to_ascii_uppercase().as_str() {
        "UTC" | "UT" | "GMT" | "Z" | "WET" => 0,
        "BST" | "CET" | "WEST" => 1,
        "CEST" | "EET" => 2,
        "EEST" | "MSK" => 3,
        "JST" | "KST" => 9,
        "AEST" => 10,
        "AEDT" => 11,
        "NZST" => 12,
        "NZDT" => 13,
        "AST" | "EDT" => -4,
        "EST" | "CDT" => -5,
        "CST" | "MDT" => -6,
        "MST" | "PDT" => -7,
        "PST" | "AKDT" => -8,
        "AKST" => -9,
        "HST" => -10,
        _ if zone.chars().all(|c| c.is_ascii_alphabetic()) => {
            debug!(zone, "unknown timezone abbreviation, assuming UTC");
            0
        }
        _ => return None,
    };

    FixedOffset::east_opt(hours * 3600)
}

fn numeric_offset(zone: &str) -> Option<FixedOffset> {
    let (sign, digits) = match zone.as_bytes().first()? {
        b'+' => (1, &zone[1..]),
        b'-' => (-1, &zone[1..]),
        _ => return None,
    };
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let hours: i32 = digits[..2].parse().ok()?;
    let minutes: i32 = digits[2..].parse().ok()?;
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes" ?>
<rss version="2.0" xmlns:yweather="http://xml.weather.yahoo.com/ns/rss/1.0" xmlns:geo="http://www.w3.org/2003/01/geo/wgs84_pos#">
  <channel>
    <title>Yahoo! Weather - Warsaw, PL</title>
    <yweather:location city="Warsaw" region="MZ" country="Poland"/>
    <yweather:units temperature="C" distance="km" pressure="mb" speed="km/h"/>
    <yweather:wind chill="3" direction="240" speed="11.27"/>
    <item>
      <title>Conditions for Warsaw, PL at 12:59 pm CET</title>
      <geo:lat>52.24</geo:lat>
      <pubDate>Fri, 15 Nov 2013 12:59 pm CET</pubDate>
      <yweather:condition text="Mostly Cloudy" code="28" temp="5" date="Fri, 15 Nov 2013 12:59 pm CET"/>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn parses_complete_feed() {
        let record = parse(FEED).unwrap();

        assert_eq!(record.city, "Warsaw");
        assert_eq!(record.country, "Poland");
        assert_eq!(record.temperature, "5");
        assert_eq!(record.temperature_unit, "C");
        assert_eq!(record.wind_speed, "11.27");
        assert_eq!(record.wind_speed_unit, "km/h");
        assert_eq!(record.description, "Mostly Cloudy");
        assert_eq!(record.observed_at, parse_pub_date("Fri, 15 Nov 2013 12:59 pm CET").unwrap());
    }

    #[test]
    fn namespace_prefix_is_discovered() {
        let feed = FEED.replace("yweather", "wx");
        let record = parse(&feed).unwrap();

        assert_eq!(record.city, "Warsaw");
    }

    #[test]
    fn namespace_declared_on_inner_element_is_found() {
        let feed = FEED
            .replace(r#" xmlns:yweather="http://xml.weather.yahoo.com/ns/rss/1.0""#, "")
            .replace(
                "<channel>",
                r#"<channel xmlns:yweather="http://xml.weather.yahoo.com/ns/rss/1.0">"#,
            );

        assert!(parse(&feed).is_ok());
    }

    #[test]
    fn custom_namespace_uri() {
        let feed = FEED.replace("http://xml.weather.yahoo.com/ns/rss/1.0", "urn:example:wx");

        assert!(matches!(parse(&feed), Err(ParseError::MissingNamespace(_))));
        assert!(parse_with_namespace(&feed, "urn:example:wx").is_ok());
    }

    #[test]
    fn missing_item_element() {
        let start = FEED.find("<item>").unwrap();
        let end = FEED.find("</item>").unwrap() + "</item>".len();
        let feed = format!("{}{}", &FEED[..start], &FEED[end..]);

        let err = parse(&feed).unwrap_err();
        assert!(matches!(err, ParseError::MissingElement("item")));
    }

    #[test]
    fn missing_channel_element() {
        let feed = r#"<rss xmlns:yweather="http://xml.weather.yahoo.com/ns/rss/1.0"><item/></rss>"#;

        let err = parse(feed).unwrap_err();
        assert!(matches!(err, ParseError::MissingElement("channel")));
    }

    #[test]
    fn structure_is_checked_before_namespaces() {
        let err = parse("<rss><channel><title>x</title></channel></rss>").unwrap_err();
        assert!(matches!(err, ParseError::MissingElement("item")));

        let err = parse("<rss/>").unwrap_err();
        assert!(matches!(err, ParseError::MissingElement("channel")));
    }

    #[test]
    fn missing_namespaced_element() {
        let feed = FEED.replace(r#"<yweather:wind chill="3" direction="240" speed="11.27"/>"#, "");

        let err = parse(&feed).unwrap_err();
        assert!(matches!(err, ParseError::MissingElement("wind")));
    }

    #[test]
    fn missing_attribute() {
        let feed = FEED.replace(r#" temp="5""#, "");

        let err = parse(&feed).unwrap_err();
        assert!(matches!(
            err,
            ParseError::MissingAttribute {
                element: "condition",
                attribute: "temp",
            }
        ));
    }

    #[test]
    fn malformed_xml() {
        let err = parse("<rss><channel></rss>").unwrap_err();
        assert!(matches!(err, ParseError::MalformedXml(_)));
    }

    #[test]
    fn no_namespace_declarations() {
        let err = parse("<rss><channel><item/></channel></rss>").unwrap_err();
        assert!(matches!(err, ParseError::MissingNamespace(_)));
    }

    #[test]
    fn bad_pub_date() {
        let feed = FEED.replace(
            "<pubDate>Fri, 15 Nov 2013 12:59 pm CET</pubDate>",
            "<pubDate>yesterday-ish</pubDate>",
        );

        let err = parse(&feed).unwrap_err();
        assert!(matches!(err, ParseError::BadTimestamp(text) if text == "yesterday-ish"));
    }

    #[test]
    fn empty_pub_date() {
        let feed = FEED.replace("Fri, 15 Nov 2013 12:59 pm CET</pubDate>", "</pubDate>");

        assert!(matches!(parse(&feed), Err(ParseError::BadTimestamp(_))));
    }

    #[test]
    fn pub_date_fields() {
        let ts = parse_pub_date("Fri, 15 Nov 2013 12:59 pm CET").unwrap();

        assert_eq!(ts.year(), 2013);
        assert_eq!(ts.month(), 11);
        assert_eq!(ts.day(), 15);
        assert_eq!(ts.hour(), 12);
        assert_eq!(ts.minute(), 59);
        assert_eq!(ts.offset().local_minus_utc(), 3600);
    }

    #[test]
    fn pub_date_am_pm() {
        let morning = parse_pub_date("Sat, 2 Nov 2013 12:05 am EST").unwrap();
        assert_eq!(morning.hour(), 0);
        assert_eq!(morning.day(), 2);
        assert_eq!(morning.offset().local_minus_utc(), -5 * 3600);

        let evening = parse_pub_date("Sat, 02 Nov 2013 7:30 PM GMT").unwrap();
        assert_eq!(evening.hour(), 19);
    }

    #[test]
    fn pub_date_numeric_offset() {
        let ts = parse_pub_date("Fri, 15 Nov 2013 12:59 pm +0530").unwrap();
        assert_eq!(ts.offset().local_minus_utc(), 5 * 3600 + 30 * 60);
    }

    #[test]
    fn pub_date_unknown_zone_falls_back_to_utc() {
        let ts = parse_pub_date("Fri, 15 Nov 2013 12:59 pm XYZT").unwrap();
        assert_eq!(ts.offset().local_minus_utc(), 0);
        assert_eq!(ts.hour(), 12);
    }

    #[test]
    fn pub_date_weekday_must_match() {
        assert!(parse_pub_date("Mon, 15 Nov 2013 12:59 pm CET").is_err());
    }

    #[test]
    fn pub_date_without_zone_is_rejected() {
        assert!(parse_pub_date("Fri, 15 Nov 2013 12:59 pm").is_err());
    }
}
