//! File-level tests for load import and SOC-trace export.

mod common;

use std::fs;
use std::io::Write;

use bess_sizer::Error;
use bess_sizer::io::{export_soc_trace, read_load_csv};
use bess_sizer::profile::AlignedProfile;
use bess_sizer::sim::{DispatchWindows, simulate};

#[test]
fn measured_profile_reads_from_disk() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(file, "timestamp,load_kw").expect("write");
    for h in 0..48 {
        writeln!(file, "2024-03-{:02} {:02}:00,{}", 4 + h / 24, h % 24, 100 + h).expect("write");
    }
    file.flush().expect("flush");

    let load = read_load_csv(file.path()).expect("valid profile");
    assert_eq!(load.len(), 48);
    assert_eq!(load.first_timestamp(), Some(common::midnight(2024, 3, 4)));
    assert_eq!(load.values()[47], 147.0);
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let err = read_load_csv(&dir.path().join("absent.csv")).unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}

#[test]
fn soc_trace_export_has_one_row_per_hour() {
    let profile = AlignedProfile::load_only(&common::single_spike_day());
    let result = simulate(&profile, &common::default_storage(), &DispatchWindows::default());

    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("soc.csv");
    export_soc_trace(&result.steps, &path).expect("export should succeed");

    let mut rdr = csv::Reader::from_path(&path).expect("readable csv");
    let headers = rdr.headers().expect("header").clone();
    assert_eq!(&headers[4], "soc_kwh");

    let soc: Vec<f64> = rdr
        .records()
        .map(|r| r.expect("row")[4].parse::<f64>().expect("number"))
        .collect();
    assert_eq!(soc.len(), 24);
    for (exported, traced) in soc.iter().zip(&result.soc_trace) {
        assert!((exported - traced).abs() < 1e-3);
    }
}

#[test]
fn exported_trace_reimports_as_load_profile() {
    let profile = AlignedProfile::load_only(&common::flat_load(75.0, 2));
    let result = simulate(&profile, &common::default_storage(), &DispatchWindows::default());

    let dir = tempfile::tempdir().expect("temp dir");
    let trace = dir.path().join("trace.csv");
    export_soc_trace(&result.steps, &trace).expect("export should succeed");

    // Keep the first two columns and rename them to the import header.
    let text = fs::read_to_string(&trace).expect("read trace");
    let mut rows = vec!["timestamp,load_kw".to_string()];
    for line in text.lines().skip(1) {
        let cols: Vec<&str> = line.split(',').collect();
        rows.push(format!("{},{}", cols[1], cols[2]));
    }
    let load_path = dir.path().join("load.csv");
    fs::write(&load_path, rows.join("\n")).expect("write load");

    let load = read_load_csv(&load_path).expect("re-import");
    assert_eq!(load.len(), 48);
    assert!(load.values().iter().all(|v| *v == 75.0));
}
