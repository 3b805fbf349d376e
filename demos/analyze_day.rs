use climate_odds::{format_probability, ClimateError, ClimateOdds, LatLon, YearRange};

#[tokio::main]
async fn main() -> Result<(), ClimateError> {
    env_logger::init();
    let client = ClimateOdds::new().await?;

    let report = client
        .analyze()
        .location(LatLon(55.7558, 37.6173))
        .date("2024-06-15")
        .years(YearRange::new(1994, 2023))
        .call()
        .await?;

    println!(
        "{} at ({}, {}) from {} ({} years)",
        report.date_name,
        report.location.0,
        report.location.1,
        report.metadata.data_source,
        report.metadata.data_points
    );
    for (condition, probability) in &report.probabilities {
        println!("  {:<20} {}", condition, format_probability(*probability));
    }

    let range = client
        .analyze_range()
        .location(LatLon(55.7558, 37.6173))
        .start_date("2026-01-12")
        .end_date("2026-01-21")
        .call()
        .await?;
    println!("{:#?}", range.aggregated.best_days);

    Ok(())
}
