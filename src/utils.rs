use crate::error::ClimateError;
use chrono::{Datelike, NaiveDate};
use log::info;
use std::io;
use std::path::{Path, PathBuf};

const CACHE_DIR_NAME: &str = "climate_odds_cache";

pub fn get_cache_dir() -> io::Result<PathBuf> {
    dirs::cache_dir()
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                "Could not determine system cache directory",
            )
        })
        .map(|p| p.join(CACHE_DIR_NAME))
}

pub async fn ensure_cache_dir_exists(path: &Path) -> io::Result<()> {
    match tokio::fs::metadata(path).await {
        Ok(metadata) => {
            if !metadata.is_dir() {
                return Err(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    format!(
                        "Cache path exists but is not a directory: {}",
                        path.display()
                    ),
                ));
            }
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            info!("Creating cache directory: {}", path.display());
            tokio::fs::create_dir_all(path).await
        }
        Err(e) => Err(e),
    }
}

/// Parses a `YYYY-MM-DD` date, mapping failures to [`ClimateError::InvalidArgument`].
pub fn parse_date(value: &str) -> Result<NaiveDate, ClimateError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        ClimateError::InvalidArgument(format!(
            "Invalid date '{}', expected format YYYY-MM-DD",
            value
        ))
    })
}

/// Days are numbered on a leap-year calendar so that a given month and day has the same
/// number in every year.
const CALENDAR_YEAR: i32 = 2024;

/// Day-of-year of `date` on the leap-year calendar: March 1 is always 61 and December 31
/// always 366, so leap and common years pool the same calendar date.
pub fn day_of_year(date: NaiveDate) -> u32 {
    NaiveDate::from_ymd_opt(CALENDAR_YEAR, date.month(), date.day())
        .map(|d| d.ordinal())
        .unwrap_or_else(|| date.ordinal())
}

/// Calendar label for a day-of-year on the leap-year calendar (`"July 15"`).
pub fn day_of_year_label(day_of_year: u32) -> String {
    NaiveDate::from_yo_opt(CALENDAR_YEAR, day_of_year.clamp(1, 366))
        .map(|d| d.format("%B %d").to_string())
        .unwrap_or_default()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hemisphere {
    Northern,
    Southern,
}

impl Hemisphere {
    pub fn from_latitude(latitude: f64) -> Self {
        if latitude < 0.0 {
            Hemisphere::Southern
        } else {
            Hemisphere::Northern
        }
    }
}

/// Meteorological season of a day-of-year.
pub fn season_for_day(day_of_year: u32, hemisphere: Hemisphere) -> &'static str {
    let northern = match day_of_year {
        61..=152 => "spring",
        153..=244 => "summer",
        245..=335 => "autumn",
        _ => "winter",
    };
    match (hemisphere, northern) {
        (Hemisphere::Northern, season) => season,
        (Hemisphere::Southern, "spring") => "autumn",
        (Hemisphere::Southern, "summer") => "winter",
        (Hemisphere::Southern, "autumn") => "spring",
        (Hemisphere::Southern, _) => "summer",
    }
}

/// `0.125` becomes `"12.5%"`.
pub fn format_probability(probability: f64) -> String {
    format!("{:.1}%", probability * 100.0)
}

pub fn categorize_probability(probability: f64) -> &'static str {
    if probability < 0.10 {
        "very_low"
    } else if probability < 0.25 {
        "low"
    } else if probability < 0.50 {
        "moderate"
    } else if probability < 0.75 {
        "high"
    } else {
        "very_high"
    }
}

pub fn probability_description(probability: f64) -> &'static str {
    match categorize_probability(probability) {
        "very_low" => "Very unlikely",
        "low" => "Unlikely",
        "moderate" => "Possible",
        "high" => "Likely",
        _ => "Very likely",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_iso_dates_only() {
        assert_eq!(
            parse_date("2024-07-15").unwrap(),
            NaiveDate::from_ymd_opt(2024, 7, 15).unwrap()
        );
        assert!(matches!(
            parse_date("15/07/2024"),
            Err(ClimateError::InvalidArgument(_))
        ));
        assert!(parse_date("2023-02-30").is_err());
    }

    #[test]
    fn calendar_dates_share_a_day_number_across_years() {
        let leap = NaiveDate::from_ymd_opt(2020, 7, 15).unwrap();
        let common = NaiveDate::from_ymd_opt(2021, 7, 15).unwrap();
        assert_eq!(day_of_year(leap), 197);
        assert_eq!(day_of_year(common), 197);
        assert_eq!(day_of_year(NaiveDate::from_ymd_opt(2023, 3, 1).unwrap()), 61);
        assert_eq!(day_of_year(NaiveDate::from_ymd_opt(2023, 12, 31).unwrap()), 366);
        assert_eq!(day_of_year(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()), 60);
        assert_eq!(day_of_year_label(day_of_year(common)), "July 15");
    }

    #[test]
    fn labels_use_leap_year_calendar() {
        assert_eq!(day_of_year_label(1), "January 01");
        assert_eq!(day_of_year_label(60), "February 29");
        assert_eq!(day_of_year_label(366), "December 31");
    }

    #[test]
    fn seasons_flip_south_of_equator() {
        assert_eq!(season_for_day(196, Hemisphere::Northern), "summer");
        assert_eq!(season_for_day(196, Hemisphere::from_latitude(-33.9)), "winter");
        assert_eq!(season_for_day(10, Hemisphere::Southern), "summer");
        assert_eq!(season_for_day(100, Hemisphere::Southern), "autumn");
        assert_eq!(season_for_day(61, Hemisphere::Northern), "spring");
        assert_eq!(season_for_day(336, Hemisphere::Northern), "winter");
    }

    #[test]
    fn probability_wording() {
        assert_eq!(format_probability(0.125), "12.5%");
        assert_eq!(categorize_probability(0.05), "very_low");
        assert_eq!(categorize_probability(0.25), "moderate");
        assert_eq!(categorize_probability(0.9), "very_high");
        assert_eq!(probability_description(0.6), "Likely");
    }
}
