use chrono::{NaiveDate, Weekday};

use liquidity_monitor::align::{NetLiquiditySpec, align_series, derive_net_liquidity};
use liquidity_monitor::app::pipeline::{run_from_dir, run_with_series};
use liquidity_monitor::calendar::weekly_calendar;
use liquidity_monitor::config::PipelineConfig;
use liquidity_monitor::domain::{AlignStrategy, ColumnRole, Provenance, SeriesSpec, TimeSeries};
use liquidity_monitor::error::PipelineError;
use liquidity_monitor::normalize::index_table;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn liquidity_spec(name: &str, role: ColumnRole) -> SeriesSpec {
    SeriesSpec::new(name, "Liquidity Data", role, AlignStrategy::AsOf, 0)
}

#[test]
fn net_liquidity_with_empty_repo_series() {
    let calendar = vec![d(2024, 1, 5), d(2024, 1, 12)];
    let series = vec![
        TimeSeries::from_pairs("Fed BS", vec![(d(2024, 1, 5), Some(100.0)), (d(2024, 1, 12), Some(90.0))]),
        TimeSeries::from_pairs("TGA", vec![(d(2024, 1, 5), Some(20.0))]),
        TimeSeries::from_pairs("RRP", Vec::new()),
    ];
    let specs = vec![
        liquidity_spec("Fed BS", ColumnRole::BalanceSheet),
        liquidity_spec("TGA", ColumnRole::TreasuryAccount),
        liquidity_spec("RRP", ColumnRole::RepoFacility),
    ];

    let aligned = align_series(&calendar, &series, &specs);
    let aligned = derive_net_liquidity(&aligned, &NetLiquiditySpec::default());
    let net = aligned.column("Net Liquidity").unwrap();
    assert_eq!(net.values, vec![Some(80.0), Some(70.0)]);
    assert_eq!(
        net.provenance,
        Provenance::Derived {
            imputed: vec![true, true]
        }
    );

    let indexed = index_table(&aligned, &["Net Liquidity".to_string()]);
    assert!(indexed.errors.is_empty());
    let values = &indexed.table.column("Net Liquidity").unwrap().values;
    assert!((values[0].unwrap() - 100.0).abs() < 1e-9);
    assert!((values[1].unwrap() - 87.5).abs() < 1e-9);
}

#[test]
fn saturday_bitcoin_resolves_to_friday_row() {
    let calendar = vec![d(2024, 1, 5)];
    let series = vec![TimeSeries::from_pairs("BTC Close", vec![(d(2024, 1, 6), Some(50_000.0))])];
    let specs = vec![SeriesSpec::new("BTC Close", "Bitcoin", ColumnRole::Close, AlignStrategy::Exact, 1)];

    let aligned = align_series(&calendar, &series, &specs);
    assert_eq!(aligned.column("BTC Close").unwrap().values, vec![Some(50_000.0)]);
}

#[test]
fn every_indexed_column_starts_at_100() {
    let config = PipelineConfig {
        start_date: d(2023, 1, 1),
        end_date: Some(d(2023, 12, 31)),
        ..PipelineConfig::default()
    };
    let calendar = weekly_calendar(config.start_date, d(2023, 12, 31), Weekday::Fri);

    // Sparse, differently-scaled series observed on assorted weekdays.
    let series: Vec<TimeSeries> = config
        .series
        .iter()
        .enumerate()
        .map(|(k, spec)| {
            let obs = calendar
                .iter()
                .enumerate()
                .filter(|(i, _)| (i + k) % 3 != 0)
                .map(|(i, date)| {
                    let date = *date + chrono::Duration::days(spec.day_offset);
                    (date, Some((k as f64 + 1.0) * 1_000.0 + i as f64 * 3.5))
                });
            TimeSeries::from_pairs(spec.name.clone(), obs)
        })
        .collect();

    let run = run_with_series(&config, &series, d(2030, 1, 1));
    assert_eq!(run.calendar.len(), calendar.len());
    assert!(!run.indexed.columns().is_empty());
    for col in run.indexed.columns() {
        let first = col.values.iter().flatten().next().copied().unwrap();
        assert!((first - 100.0).abs() < 1e-9, "{} starts at {first}", col.name);
    }
}

#[test]
fn zero_base_column_is_reported_and_others_survive() {
    let config = PipelineConfig {
        start_date: d(2024, 1, 1),
        end_date: Some(d(2024, 1, 31)),
        net_liquidity: None,
        index_columns: vec!["NASDAQ".to_string(), "SPX".to_string()],
        correlation_anchors: Vec::new(),
        divergences: Vec::new(),
        ..PipelineConfig::default()
    };
    let series = vec![
        TimeSeries::from_pairs("NASDAQ", vec![(d(2024, 1, 5), Some(0.0)), (d(2024, 1, 12), Some(1.0))]),
        TimeSeries::from_pairs("SPX", vec![(d(2024, 1, 5), Some(4700.0)), (d(2024, 1, 12), Some(4750.0))]),
    ];

    let run = run_with_series(&config, &series, d(2030, 1, 1));
    assert!(run.indexed.column("NASDAQ").is_none());
    assert!(run.indexed.column("SPX").is_some());
    assert!(run.diagnostics.contains(&PipelineError::ZeroBase {
        column: "NASDAQ".to_string(),
        date: d(2024, 1, 5),
    }));
}

#[test]
fn runs_from_a_workbook_directory() {
    let dir = std::env::temp_dir().join(format!("liq-it-workbook-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(
        dir.join("Liquidity Data.csv"),
        "Date,Fed BS,TGA,RRP,M2,Net Liquidity\n\
         2024-01-05,7700,700,500,20800,6500\n\
         2024-01-12,7690,,500,20810,\n",
    )
    .unwrap();
    std::fs::write(dir.join("Bitcoin.csv"), "Date,Close\n2024-01-06,43900\n2024-01-13,42800\n").unwrap();
    std::fs::write(dir.join("NASDAQ_SPX.csv"), "Date,NASDAQ,SPX\n2024-01-05,14524,4697.2\n").unwrap();

    let config = PipelineConfig {
        start_date: d(2024, 1, 1),
        end_date: Some(d(2024, 1, 14)),
        ..PipelineConfig::default()
    };
    let run = run_from_dir(&config, &dir, d(2030, 1, 1)).unwrap();

    assert_eq!(run.sections_found, vec!["Liquidity Data", "Bitcoin", "NASDAQ_SPX"]);
    assert_eq!(
        run.aligned.column("Net Liquidity").unwrap().values,
        vec![Some(6500.0), Some(6490.0)]
    );
    assert_eq!(run.aligned.column("SPX").unwrap().values, vec![Some(4697.2), None]);
    assert!(run.diagnostics.contains(&PipelineError::MissingSection {
        section: "Sideline Cash".to_string()
    }));
    let found = &run.strongest[0];
    assert_eq!(found.anchor, "Net Liquidity");
    assert!(run.correlation.names.contains(&found.column));

    std::fs::remove_dir_all(&dir).unwrap();
}
