//! Deterministic seasonal climatology used by sources whose live feeds need credentials
//! or region-specific access.
//!
//! Values follow `base + amplitude * sin(2π (doy - phase) / 365)` plus gaussian noise
//! from a `StdRng` seeded with the source, location, variable and date, so the same
//! request always produces the same table.

use crate::sources::error::SourceError;
use crate::sources::frame::NativeTable;
use crate::sources::FetchRequest;
use crate::types::source::SourceId;
use chrono::{Datelike, NaiveDate};
use polars::prelude::DataFrame;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use std::f64::consts::PI;

/// Occasional additive bursts, e.g. convective days on top of the seasonal CAPE.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spikes {
    pub probability: f64,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeasonalModel {
    pub base: f64,
    pub amplitude: f64,
    /// Day of year where the sine crosses zero going up.
    pub phase_day: f64,
    /// Lower bound on the seasonal swing, applied before noise.
    pub seasonal_floor: Option<f64>,
    pub noise_std: f64,
    pub spikes: Option<Spikes>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl SeasonalModel {
    pub const fn new(base: f64, amplitude: f64, noise_std: f64) -> Self {
        Self {
            base,
            amplitude,
            phase_day: 0.0,
            seasonal_floor: None,
            noise_std,
            spikes: None,
            min: None,
            max: None,
        }
    }

    pub const fn phase(mut self, day: f64) -> Self {
        self.phase_day = day;
        self
    }

    pub const fn seasonal_floor(mut self, floor: f64) -> Self {
        self.seasonal_floor = Some(floor);
        self
    }

    pub const fn spikes(mut self, spikes: Spikes) -> Self {
        self.spikes = Some(spikes);
        self
    }

    pub const fn at_least(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    pub const fn at_most(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    pub fn value(&self, seed: &Seed, date: NaiveDate) -> f64 {
        let doy = date.ordinal() as f64;
        let mut seasonal = self.amplitude * (2.0 * PI * (doy - self.phase_day) / 365.0).sin();
        if let Some(floor) = self.seasonal_floor {
            seasonal = seasonal.max(floor);
        }
        let mut rng = seed.rng(date);
        let noise = self.noise_std * rng.sample::<f64, _>(StandardNormal);
        let spike = match self.spikes {
            Some(s) if rng.gen::<f64>() < s.probability => {
                s.min + (s.max - s.min) * rng.gen::<f64>()
            }
            _ => 0.0,
        };
        let mut v = self.base + seasonal + spike + noise;
        if let Some(min) = self.min {
            v = v.max(min);
        }
        if let Some(max) = self.max {
            v = v.min(max);
        }
        v
    }
}

/// Seed shared by every value of one (source, location, variable) triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Seed(u32);

impl Seed {
    pub fn new(source: SourceId, latitude: f64, longitude: f64, variable: &str) -> Self {
        // Rounded so neighbouring requests for the same grid cell agree.
        let key = format!(
            "{}|{}|{}|{}",
            source.name(),
            (latitude * 100.0).round() as i64,
            (longitude * 100.0).round() as i64,
            variable
        );
        Seed(crc32fast::hash(key.as_bytes()))
    }

    /// Generator for one date. Independent of the requested window, so overlapping
    /// requests agree on shared days.
    fn rng(&self, date: NaiveDate) -> StdRng {
        let day = date.num_days_from_ce() as u32;
        StdRng::seed_from_u64((u64::from(self.0) << 32) | u64::from(day))
    }
}

/// Daily table from `request.start` to `request.end` with one column per model.
pub fn synthesize(
    source: SourceId,
    request: &FetchRequest,
    models: &[(&'static str, SeasonalModel)],
) -> Result<DataFrame, SourceError> {
    let dates: Vec<NaiveDate> = request
        .start
        .iter_days()
        .take_while(|d| *d <= request.end)
        .collect();
    let mut table = NativeTable::new(source, dates.clone());
    for (name, model) in models {
        let seed = Seed::new(source, request.latitude, request.longitude, name);
        let values = dates.iter().map(|d| Some(model.value(&seed, *d))).collect();
        table.push_column(*name, values)?;
    }
    table.into_frame()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::parameter::Parameter;

    fn request() -> FetchRequest {
        FetchRequest::new(
            10.0,
            20.0,
            NaiveDate::from_ymd_opt(2001, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2001, 12, 31).unwrap(),
            vec![Parameter::Dust],
        )
    }

    #[test]
    fn same_request_same_values() {
        let model = SeasonalModel::new(10.0, 5.0, 2.0).at_least(1.0);
        let a = synthesize(SourceId::GesDisc, &request(), &[("DUSMASS", model)]).unwrap();
        let b = synthesize(SourceId::GesDisc, &request(), &[("DUSMASS", model)]).unwrap();
        assert_eq!(a.height(), 365);
        assert!(a.equals_missing(&b));
    }

    #[test]
    fn overlapping_windows_agree_on_shared_days() {
        let seed = Seed::new(SourceId::GesDisc, 10.0, 20.0, "DUSMASS");
        let model = SeasonalModel::new(10.0, 5.0, 2.0);
        let day = NaiveDate::from_ymd_opt(2001, 6, 1).unwrap();
        assert_eq!(model.value(&seed, day), model.value(&seed, day));
        assert_eq!(seed, Seed::new(SourceId::GesDisc, 10.001, 20.001, "DUSMASS"));
        assert_ne!(seed, Seed::new(SourceId::GesDisc, 10.0, 20.0, "BCSMASS"));

        let full = synthesize(SourceId::GesDisc, &request(), &[("DUSMASS", model)]).unwrap();
        let mut june = request();
        june.start = day;
        let part = synthesize(SourceId::GesDisc, &june, &[("DUSMASS", model)]).unwrap();
        let june_offset = (day - request().start).num_days() as i64;
        assert!(full.slice(june_offset, part.height()).equals_missing(&part));
    }

    #[test]
    fn bounds_and_noise_spread() {
        let seed = Seed::new(SourceId::GesDisc, 1.0, 2.0, "x");
        let model = SeasonalModel::new(0.0, 0.0, 1.0).at_least(-2.0).at_most(2.0);
        let values: Vec<f64> = NaiveDate::from_ymd_opt(2000, 1, 1)
            .unwrap()
            .iter_days()
            .take(2000)
            .map(|d| model.value(&seed, d))
            .collect();
        assert!(values.iter().all(|v| (-2.0..=2.0).contains(v)));
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        assert!(mean.abs() < 0.15, "mean {mean}");
        assert!(values.iter().any(|v| *v > 0.5) && values.iter().any(|v| *v < -0.5));
    }

    #[test]
    fn spikes_raise_the_mean() {
        let seed = Seed::new(SourceId::Cptec, -10.0, -50.0, "cape");
        let flat = SeasonalModel::new(100.0, 0.0, 0.0);
        let spiky = flat.spikes(Spikes {
            probability: 0.3,
            min: 500.0,
            max: 2000.0,
        });
        let day = |i: u64| {
            NaiveDate::from_ymd_opt(2000, 1, 1).unwrap() + chrono::Days::new(i)
        };
        let mean = |m: &SeasonalModel| (0..1000).map(|i| m.value(&seed, day(i))).sum::<f64>() / 1000.0;
        assert_eq!(mean(&flat), 100.0);
        let spiky_mean = mean(&spiky);
        assert!(spiky_mean > 380.0 && spiky_mean < 570.0, "got {spiky_mean}");
    }
}
