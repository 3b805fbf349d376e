use climate_odds::{ClimateError, ClimateOdds, LatLon};

#[tokio::main]
async fn main() -> Result<(), ClimateError> {
    env_logger::init();
    let client = ClimateOdds::new().await?;

    // Brasília is inside CPTEC coverage, so thunderstorm risk is included.
    let report = client
        .multi_source()
        .location(LatLon(-15.79, -47.88))
        .date("2024-01-15")
        .call()
        .await?;

    println!("Sources: {:?}", report.data_sources);
    for failure in &report.failures {
        println!("  unavailable: {} ({})", failure.source, failure.message);
    }
    for (parameter, result) in &report.parameters {
        println!(
            "{:<22} {:>10.2} {:<3} confidence={} agreement={:.2} sources={}",
            parameter.name(),
            result.consensus_value.unwrap_or(f64::NAN),
            parameter.unit(),
            result.confidence,
            result.agreement_level,
            result.source_count()
        );
    }

    println!("{}", serde_json::to_string_pretty(&report).unwrap_or_default());
    Ok(())
}
