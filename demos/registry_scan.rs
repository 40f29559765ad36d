//! End-to-end demo: scan a small synthetic registry for duplicates and
//! print the matches plus their export rows.
//!
//! Run with `cargo run --example registry_scan`. Set `RUST_LOG=debug` for
//! per-block telemetry.

use dublette::{export_rows, MatchRunner, MatcherConfig, Record};

fn record(
    id: usize,
    given: &str,
    surname: &str,
    street: Option<&str>,
    postal: Option<&str>,
    city: Option<&str>,
    birth_year: Option<i32>,
) -> Record {
    Record {
        id,
        given_name: Some(given.to_string()),
        surname: Some(surname.to_string()),
        street: street.map(String::from),
        postal_code: postal.map(String::from),
        city: city.map(String::from),
        birth_year,
        ..Record::default()
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let registry = vec![
        record(0, "Max", "Müller", Some("Hauptstr. 12"), Some("8000"), Some("Zürich"), Some(1980)),
        record(1, "Max", "Mueller", Some("Hauptstrasse 12"), Some("8000"), Some("Zuerich"), Some(1980)),
        record(2, "Anna", "Schmidt", Some("Bahnhofsweg 3"), Some("1000"), Some("Bern"), Some(1975)),
        record(3, "Schmidt", "Anna", Some("Bahnhofsweg 3"), Some("1000"), Some("Bern"), Some(1975)),
        record(4, "Hans", "Meyer", None, None, None, Some(1960)),
        record(5, "Hanz", "Maier", None, None, None, Some(1960)),
        record(6, "Max", "Mustermann", None, Some("4051"), None, Some(1990)),
        record(7, "Mux", "Mustermann", None, Some("4051"), None, Some(1990)),
        record(8, "Karl", "Weber", Some("Ringweg 9"), Some("5000"), None, Some(1970)),
        record(9, "Karl", "Weber", Some("Ringweg 9"), Some("5000"), None, Some(1971)),
    ];

    let runner = MatchRunner::new(MatcherConfig::default())?;
    let report = runner.run(&registry);

    println!(
        "{} records, {} blocks, {:.1}% comparison reduction",
        report.blocking.total_records,
        report.blocking.block_count,
        report.blocking.reduction_ratio() * 100.0
    );
    println!(
        "{} matches ({} failed blocks, complete: {})",
        report.matches.len(),
        report.failed_blocks,
        report.complete
    );

    let mut matches = report.matches;
    matches.sort_by_key(|m| (m.id_a, m.id_b));
    for m in &matches {
        println!(
            "  {:>3} <-> {:<3} {:<26} confidence {}",
            m.id_a,
            m.id_b,
            m.match_type.as_str(),
            m.confidence
        );
    }

    println!("\nexport rows:");
    for row in export_rows(&matches, &registry) {
        println!("  {}", serde_json::to_string(&row)?);
    }
    Ok(())
}
