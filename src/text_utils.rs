use std::ops::Index;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use lazy_static::lazy_static;
use regex::Regex;

fn to_int<T: std::str::FromStr>(num_str: &str, date_str: &str) -> Result<T, String> {
    match num_str.parse::<T>() {
        Ok(x) => Ok(x),
        Err(_) => Err(format!("Error parsing {} from the date {}", num_str, date_str)),
    }
}

/// Parses `YYYY-MM-DD` with an optional `HH:MM[:SS[.mmm]]` time portion.
pub fn parse_date_time(buf: &str) -> Result<NaiveDateTime, String> {
    lazy_static! {
        static ref DATE_TIME: Regex = Regex::new(
            r"(\d{4})-(\d{1,2})-(\d{1,2})(?:[ T](\d{1,2}):(\d{1,2})(?::(\d{1,2}))?(?:\.\d{1,3})?)?"
        ).unwrap();
    }

    let Some(caps) = DATE_TIME.captures(buf) else {
        return Err(format!("Unable to parse date time {}", buf));
    };

    let to_i32 = |num_str: &str| to_int::<i32>(num_str, buf);
    let to_u32 = |num_str: &str| to_int::<u32>(num_str, buf);

    let y: i32 = to_i32(caps.index(1))?;
    let m: u32 = to_u32(caps.index(2))?;
    let d: u32 = to_u32(caps.index(3))?;
    let h: u32 = caps.get(4).map(|c| to_u32(c.as_str())).transpose()?.unwrap_or(0);
    let mn: u32 = caps.get(5).map(|c| to_u32(c.as_str())).transpose()?.unwrap_or(0);
    let s: u32 = caps.get(6).map(|c| to_u32(c.as_str())).transpose()?.unwrap_or(0);

    let date = NaiveDate::from_ymd_opt(y, m, d)
        .ok_or_else(|| format!("Invalid date in {}", buf))?;
    let time = NaiveTime::from_hms_opt(h, mn, s)
        .ok_or_else(|| format!("Invalid time in {}", buf))?;

    Ok(NaiveDateTime::new(date, time))
}

pub fn format_date_time(date_time: &NaiveDateTime) -> String {
    date_time.format("%Y-%m-%d %H:%M:%S").to_string()
}

pub fn format_date(date_time: &NaiveDateTime) -> String {
    date_time.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_time() {
        let date_time = parse_date_time("2017-09-10 10:42:32.123").unwrap();
        assert_eq!(format_date_time(&date_time), "2017-09-10 10:42:32");

        let date_time = parse_date_time("2017-09-10 10:42:32").unwrap();
        assert_eq!(format_date_time(&date_time), "2017-09-10 10:42:32");

        let date_time = parse_date_time("2017-09-10 10:42").unwrap();
        assert_eq!(format_date_time(&date_time), "2017-09-10 10:42:00");
    }

    #[test]
    fn test_parse_date_only() {
        let date_time = parse_date_time("2017-09-10").unwrap();
        assert_eq!(format_date_time(&date_time), "2017-09-10 00:00:00");
    }

    #[test]
    fn test_parse_invalid() {
        assert!(parse_date_time("not a date").is_err());
        assert!(parse_date_time("2017-19-40").is_err());
    }
}
