use std::{env, path::PathBuf, time::Instant};

use chart_trace::batch::BatchRunner;
use chart_trace::io::ExtractConfig;
use chart_trace::ChartExtractor;
use chart_trace::core::LogFormat;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging(LogFormat::from_env())?;

    let config_path = parse_config_path();
    let cfg = ExtractConfig::load_json(&config_path)?;
    let t_total = Instant::now();

    let extractor = ChartExtractor::new(cfg.params());
    let report = BatchRunner::new(cfg.threads).run_report(&extractor, &cfg.images)?;

    for entry in &report.entries {
        match (&entry.error, &entry.summary) {
            (Some(err), _) => println!("{}: failed: {err}", entry.image_path),
            (None, Some(s)) => println!(
                "{}: {} points, max {:.0} @x={}, min {:.0} @x={}, final {:.0}, valid={}",
                entry.image_path,
                s.points,
                s.max_value,
                s.max_x,
                s.min_value,
                s.min_x,
                s.final_value,
                entry.is_valid()
            ),
            (None, None) => println!("{}: no line traced", entry.image_path),
        }
    }

    let output_path = cfg.output_path();
    report.write_json(&output_path)?;
    println!(
        "{} images ({} valid, {} failed) in {} ms, wrote report JSON to {}",
        report.entries.len(),
        report.valid(),
        report.failed(),
        t_total.elapsed().as_millis(),
        output_path.display()
    );

    Ok(())
}

/// With `--features tracing` stage spans are reported, as JSON lines when
/// `CHART_TRACE_LOG_FORMAT=json`.
#[cfg(feature = "tracing")]
fn init_logging(format: LogFormat) -> Result<(), Box<dyn std::error::Error>> {
    chart_trace::core::init_tracing(format);
    Ok(())
}

#[cfg(not(feature = "tracing"))]
fn init_logging(format: LogFormat) -> Result<(), Box<dyn std::error::Error>> {
    if format == LogFormat::Json {
        eprintln!("JSON logs need the `tracing` feature; using text");
    }
    chart_trace::core::init_with_level(log::LevelFilter::Info)?;
    Ok(())
}

fn parse_config_path() -> PathBuf {
    env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("testdata/trace_chart_config.json"))
}
