//! Command-line argument parsing for the `bess-sizer` binary.

use std::env;
use std::path::PathBuf;

#[derive(Debug, Default, PartialEq)]
pub struct CliOptions {
    pub scenario: Option<PathBuf>,
    pub preset: Option<String>,
    /// Measured load profile; a synthetic year is generated when absent.
    pub load: Option<PathBuf>,
    pub pv_kwp: Option<f64>,
    pub seed: Option<u64>,
    pub soc_out: Option<PathBuf>,
    pub json: bool,
    pub help: bool,
}

pub fn parse_args() -> Result<CliOptions, String> {
    let args: Vec<String> = env::args().skip(1).collect();
    parse_args_from(args)
}

pub fn parse_args_from(args: Vec<String>) -> Result<CliOptions, String> {
    let mut opts = CliOptions::default();
    let mut i = 0usize;

    while i < args.len() {
        match args[i].as_str() {
            "--scenario" => {
                i += 1;
                let path = args.next_or_err(i, "missing value for --scenario (expected a TOML file path)")?;
                if opts.scenario.replace(PathBuf::from(path)).is_some() {
                    return Err("--scenario provided more than once".to_string());
                }
            }
            "--preset" => {
                i += 1;
                let name = args.next_or_err(i, "missing value for --preset (expected a preset name)")?;
                if opts.preset.replace(name.to_string()).is_some() {
                    return Err("--preset provided more than once".to_string());
                }
            }
            "--load" => {
                i += 1;
                let path = args.next_or_err(i, "missing value for --load (expected a CSV file path)")?;
                if opts.load.replace(PathBuf::from(path)).is_some() {
                    return Err("--load provided more than once".to_string());
                }
            }
            "--pv-kwp" => {
                i += 1;
                let raw = args.next_or_err(i, "missing value for --pv-kwp (expected a number)")?;
                let kwp = raw
                    .parse::<f64>()
                    .map_err(|_| format!("--pv-kwp value \"{raw}\" is not a number"))?;
                opts.pv_kwp = Some(kwp);
            }
            "--seed" => {
                i += 1;
                let raw = args.next_or_err(i, "missing value for --seed (expected a u64)")?;
                let seed = raw
                    .parse::<u64>()
                    .map_err(|_| format!("--seed value \"{raw}\" is not a valid u64"))?;
                opts.seed = Some(seed);
            }
            "--soc-out" => {
                i += 1;
                let path = args.next_or_err(i, "missing value for --soc-out (expected a file path)")?;
                if opts.soc_out.replace(PathBuf::from(path)).is_some() {
                    return Err("--soc-out provided more than once".to_string());
                }
            }
            "--json" => opts.json = true,
            "--help" | "-h" => opts.help = true,
            other => return Err(format!("unknown argument: {other}")),
        }
        i += 1;
    }

    if opts.scenario.is_some() && opts.preset.is_some() {
        return Err(
            "arguments `--scenario` and `--preset` are mutually exclusive; choose one source"
                .to_string(),
        );
    }

    Ok(opts)
}

trait SliceArgExt {
    fn next_or_err(&self, index: usize, err: &str) -> Result<&str, String>;
}

impl SliceArgExt for [String] {
    fn next_or_err(&self, index: usize, err: &str) -> Result<&str, String> {
        self.get(index)
            .map(String::as_str)
            .ok_or_else(|| err.to_string())
    }
}

pub fn print_usage() {
    eprintln!("bess-sizer: storage sizing for an hourly load profile");
    eprintln!();
    eprintln!("Usage: bess-sizer [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --scenario <path>   Load scenario from TOML config file");
    eprintln!("  --preset <name>     Use a built-in preset (baseline, high_solar, peaky_load)");
    eprintln!("  --load <path>       Read hourly load from CSV (timestamp,load_kw)");
    eprintln!("  --pv-kwp <f64>      Override installed PV capacity");
    eprintln!("  --seed <u64>        Override synthetic load seed");
    eprintln!("  --soc-out <path>    Export hourly SOC trace of the recommendation to CSV");
    eprintln!("  --json              Print the report as JSON");
    eprintln!("  --help              Show this help message");
    eprintln!();
    eprintln!("If no --scenario or --preset is given, the baseline preset is used.");
}
