use serde::Serialize;

/// Represents a geographical coordinate using latitude and longitude.
///
/// Latitude is the first element (index 0), and longitude is the second (index 1).
///
/// # Examples
///
/// ```
/// use climate_odds::LatLon;
///
/// let sao_paulo = LatLon(-23.55, -46.63);
/// assert_eq!(sao_paulo.0, -23.55); // Latitude
/// assert_eq!(sao_paulo.1, -46.63); // Longitude
/// assert!(sao_paulo.is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLon(pub f64, pub f64);

impl LatLon {
    pub fn latitude(&self) -> f64 {
        self.0
    }

    pub fn longitude(&self) -> f64 {
        self.1
    }

    /// Latitude in `[-90, 90]` and longitude in `[-180, 180]`, both finite.
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.0) && (-180.0..=180.0).contains(&self.1)
    }
}

impl Serialize for LatLon {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("LatLon", 2)?;
        state.serialize_field("latitude", &self.0)?;
        state.serialize_field("longitude", &self.1)?;
        state.end()
    }
}

/// Inclusive range of historical years pooled for the statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct YearRange {
    pub start: i32,
    pub end: i32,
}

impl YearRange {
    pub const DEFAULT: YearRange = YearRange {
        start: 1990,
        end: 2023,
    };

    pub fn new(start: i32, end: i32) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        if self.end < self.start {
            0
        } else {
            (self.end - self.start + 1) as usize
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for YearRange {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl std::fmt::Display for YearRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}
