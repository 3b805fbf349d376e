//! Derived "feels like" indices. Inputs in °C, % and m/s; outputs in °C.

/// Heat index via the Rothfusz regression (NWS).
///
/// Only defined for hot and humid air: below 27 °C or 40 % relative humidity the
/// temperature is returned unchanged.
pub fn heat_index(temperature_c: f64, humidity_percent: f64) -> f64 {
    if temperature_c < 27.0 || humidity_percent < 40.0 {
        return temperature_c;
    }
    let t = temperature_c * 9.0 / 5.0 + 32.0;
    let rh = humidity_percent;
    let hi = -42.379 + 2.04901523 * t + 10.14333127 * rh
        - 0.22475541 * t * rh
        - 0.00683783 * t * t
        - 0.05481717 * rh * rh
        + 0.00122874 * t * t * rh
        + 0.00085282 * t * rh * rh
        - 0.00000199 * t * t * rh * rh;
    (hi - 32.0) * 5.0 / 9.0
}

/// Wind chill (NWS / Environment Canada formula, wind converted to km/h).
///
/// Only defined for cold, moving air: above 10 °C or below 1.3 m/s the temperature is
/// returned unchanged.
pub fn wind_chill(temperature_c: f64, wind_speed_ms: f64) -> f64 {
    if temperature_c > 10.0 || wind_speed_ms < 1.3 {
        return temperature_c;
    }
    let v = (wind_speed_ms * 3.6).powf(0.16);
    13.12 + 0.6215 * temperature_c - 11.37 * v + 0.3965 * temperature_c * v
}

/// Water vapour pressure (hPa) from temperature and relative humidity.
pub fn vapour_pressure(temperature_c: f64, humidity_percent: f64) -> f64 {
    humidity_percent / 100.0 * 6.105 * (17.27 * temperature_c / (237.7 + temperature_c)).exp()
}

/// Australian apparent temperature (Steadman, as used by the Bureau of Meteorology).
///
/// `net_radiation_wm2` adds the radiation term of the full formula when known.
pub fn apparent_temperature(
    temperature_c: f64,
    humidity_percent: f64,
    wind_speed_ms: f64,
    net_radiation_wm2: Option<f64>,
) -> f64 {
    let e = vapour_pressure(temperature_c, humidity_percent);
    match net_radiation_wm2 {
        Some(q) => {
            temperature_c + 0.348 * e - 0.70 * wind_speed_ms + 0.70 * q / (wind_speed_ms + 10.0)
                - 4.25
        }
        None => temperature_c + 0.33 * e - 0.70 * wind_speed_ms - 4.00,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heat_index_unchanged_outside_domain() {
        assert_eq!(heat_index(26.9, 90.0), 26.9);
        assert_eq!(heat_index(35.0, 39.9), 35.0);
    }

    #[test]
    fn heat_index_rises_with_humidity() {
        let humid = heat_index(32.0, 70.0);
        assert!(humid > 32.0, "got {humid}");
        assert!((humid - 40.4).abs() < 1.0, "got {humid}");
        assert!(heat_index(32.0, 90.0) > humid);
    }

    #[test]
    fn wind_chill_unchanged_outside_domain() {
        assert_eq!(wind_chill(10.5, 10.0), 10.5);
        assert_eq!(wind_chill(-5.0, 1.0), -5.0);
    }

    #[test]
    fn wind_chill_matches_reference_value() {
        // -10 °C at 20 km/h is about -17.9 °C.
        let wc = wind_chill(-10.0, 20.0 / 3.6);
        assert!((wc - (-17.9)).abs() < 0.1, "got {wc}");
    }

    #[test]
    fn apparent_temperature_reference() {
        // 25 °C, 50 %, 2 m/s: e ≈ 15.8 hPa, AT ≈ 24.8 °C.
        let at = apparent_temperature(25.0, 50.0, 2.0, None);
        assert!((at - 24.8).abs() < 0.2, "got {at}");
        let sunny = apparent_temperature(25.0, 50.0, 2.0, Some(400.0));
        assert!(sunny > at);
    }
}
