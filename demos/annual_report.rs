use std::f64::consts::PI;
use std::sync::Arc;

use daylight_metrics::{
    doy_to_month_day, AnalysisConfig, AnnualIlluminance, PointGrid, ThresholdBand, TimeSeries,
    DEFAULT_YEAR,
};

/// Usage: `annual_report [ILL_FILE PTS_FILE]`. Without arguments a synthetic side-lit room
/// is analysed.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("daylight_metrics=info".parse()?),
        )
        .init();

    let config = AnalysisConfig::from_env();
    let args: Vec<String> = std::env::args().skip(1).collect();
    let annual = match args.as_slice() {
        [ill, pts] => AnnualIlluminance::load(ill, pts, &config)?,
        _ => synthetic_room(&config)?,
    };

    println!("{}", annual);
    println!();

    let summary = annual.metrics_summary(&config)?;
    println!("=== Annual Daylight Metrics ===");
    println!(
        "sDA {}/{:.0}%: {:.1}%",
        config.sda.threshold,
        config.sda.cutoff * 100.0,
        summary.sda * 100.0
    );
    println!(
        "ASE {}/{}h: {:.1}%",
        config.ase.threshold,
        config.ase.hours,
        summary.ase * 100.0
    );
    println!(
        "UDI {}-{}: below {:.1}%, useful {:.1}%, above {:.1}%",
        config.udi.low,
        config.udi.high,
        summary.udi_below * 100.0,
        summary.udi_useful * 100.0,
        summary.udi_above * 100.0
    );

    println!();
    println!("--- Noon on the summer solstice ---");
    let noon = annual
        .series()
        .records()
        .iter()
        .position(|r| r.month == 6 && r.day == 21 && r.hour == 12.0);
    if let Some(index) = noon {
        let array = &annual.arrays()[index];
        let stats = array.stats();
        let filtered = array.filter(ThresholdBand::AtLeast(config.sda.threshold), false);
        println!("Average: {:?} lux", stats.average);
        println!("Uniformity (avg/max): {:?}", stats.average_to_max);
        println!(
            "Points at or above {} lux: {} of {} ({:.1}%)",
            config.sda.threshold,
            filtered.count,
            filtered.total,
            filtered.percent * 100.0
        );
    }
    Ok(())
}

/// A 4 x 3 grid whose illuminance falls off with distance from a window along x = 0.
fn synthetic_room(config: &AnalysisConfig) -> daylight_metrics::Result<AnnualIlluminance> {
    let mut pts = Vec::new();
    for x in 0..4 {
        for y in 0..3 {
            pts.push(format!("{} {} 0.8", x as f64 + 0.5, y as f64 + 0.5));
        }
    }
    let grid = PointGrid::from_lines(&pts, &config.grid)?;

    let mut lines = Vec::with_capacity(8760);
    for doy in 1..=365 {
        let (month, day) = doy_to_month_day(DEFAULT_YEAR, doy);
        let season = 0.75 + 0.25 * (2.0 * PI * (doy as f64 - 80.0) / 365.0).sin();
        for hour in 1..=24 {
            let sun = (PI * (hour as f64 - 6.0) / 13.0).sin().max(0.0) * season;
            let values: Vec<String> = grid
                .points()
                .iter()
                .map(|p| format!("{:.1}", 4000.0 * sun / (1.0 + p.x * p.x)))
                .collect();
            lines.push(format!("{} {} {} {}", month, day, hour, values.join(" ")));
        }
    }
    let series = TimeSeries::from_lines(&lines, &config.parse)?;
    AnnualIlluminance::from_parts(series, Arc::new(grid))
}
