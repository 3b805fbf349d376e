use chrono::{Datelike, NaiveDate};
use climate_odds::analysis::analyzer::StatisticalAnalyzer;
use climate_odds::analysis::table::{ClimateRecord, ClimateTable};
use climate_odds::{ClimateConfig, ConsensusEngine, Parameter, SourceId};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::collections::BTreeMap;
use std::sync::Arc;

fn synthetic_table(years: i32) -> ClimateTable {
    let start = NaiveDate::from_ymd_opt(2023 - years + 1, 1, 1).unwrap();
    let end = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
    let records = start
        .iter_days()
        .take_while(|d| *d <= end)
        .map(|d| {
            let season = (d.ordinal() as f64 / 365.0 * std::f64::consts::TAU).sin();
            let jitter = ((d.year() * 31 + d.ordinal() as i32) % 7) as f64;
            ClimateRecord::new(d)
                .with(Parameter::Temperature, 12.0 + 10.0 * season + jitter)
                .with(Parameter::TemperatureMax, 17.0 + 10.0 * season + jitter)
                .with(Parameter::TemperatureMin, 7.0 + 10.0 * season + jitter)
                .with(Parameter::Precipitation, jitter * 2.0)
                .with(Parameter::WindSpeed, 2.0 + jitter)
                .with(Parameter::Humidity, 50.0 + jitter * 5.0)
                .with(Parameter::CloudCover, jitter * 12.0)
        })
        .collect();
    ClimateTable::from_records(records)
}

fn bench_analysis(c: &mut Criterion) {
    let analyzer = StatisticalAnalyzer::new(Arc::new(ClimateConfig::default()));
    let table = synthetic_table(34);
    c.bench_function("analyze_day", |b| {
        b.iter(|| analyzer.analyze_day(black_box(&table), black_box(197)))
    });

    let engine = ConsensusEngine::default();
    let means: BTreeMap<SourceId, f64> = [
        (SourceId::NasaPower, 20.0),
        (SourceId::OpenMeteo, 22.0),
        (SourceId::OpenMeteoEnhanced, 21.2),
    ]
    .into_iter()
    .collect();
    c.bench_function("consensus_from_means", |b| {
        b.iter(|| engine.consensus_from_means(Parameter::Temperature, black_box(&means)))
    });
}

criterion_group!(benches, bench_analysis);
criterion_main!(benches);
