//! bess-sizer entry point: CLI wiring, profile loading and report output.

use std::io;
use std::process;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use bess_sizer::cli::{CliOptions, parse_args, print_usage};
use bess_sizer::config::ScenarioConfig;
use bess_sizer::io::{export_soc_trace, read_load_csv};
use bess_sizer::profile::{LoadSeries, ProfileStats, SyntheticLoad};
use bess_sizer::reporting::SizingReport;
use bess_sizer::{Error, Result};

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("bess_sizer=info")),
        )
        .with_writer(io::stderr)
        .without_time()
        .compact()
        .init();
}

/// Scenario from `--scenario`, then `--preset`, then the baseline.
fn load_scenario(cli: &CliOptions) -> Result<ScenarioConfig> {
    let mut scenario = if let Some(ref path) = cli.scenario {
        ScenarioConfig::from_toml_file(path)?
    } else if let Some(ref name) = cli.preset {
        ScenarioConfig::from_preset(name)?
    } else {
        ScenarioConfig::baseline()
    };

    if let Some(seed) = cli.seed {
        scenario.load.seed = seed;
    }
    if let Some(kwp) = cli.pv_kwp {
        if !kwp.is_finite() || kwp < 0.0 {
            return Err(Error::InvalidInput(format!(
                "--pv-kwp must be a non-negative number, got {kwp}"
            )));
        }
        scenario.pv.capacity_kwp = kwp;
    }
    Ok(scenario)
}

fn load_profile(cli: &CliOptions, cfg: &ScenarioConfig) -> Result<LoadSeries> {
    if let Some(ref path) = cli.load {
        let series = read_load_csv(path)?;
        info!(path = %path.display(), hours = series.len(), "loaded measured profile");
        return Ok(series);
    }
    let l = &cfg.load;
    let mut generator = SyntheticLoad::new(
        l.base_kw,
        l.amp_kw,
        l.phase_rad,
        l.noise_std,
        l.weekend_factor,
        l.seed,
    );
    let series = generator.for_year(l.year);
    info!(year = l.year, seed = l.seed, "generated synthetic profile");
    Ok(series)
}

fn run(cli: &CliOptions) -> Result<()> {
    let mut scenario = load_scenario(cli)?;

    let errors = scenario.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }

    let load = load_profile(cli, &scenario)?;
    if load.is_empty() {
        warn!("load profile is empty");
    }

    if scenario.tariff.category.is_none() {
        let estimated = ProfileStats::from_series(&load).estimated_category;
        info!(category = %estimated, "using demand-charge category estimated from profile");
        scenario.tariff.category = Some(estimated);
    }

    let report = SizingReport::build(&scenario, &load);

    if cli.json {
        let json = serde_json::to_string_pretty(&report).map_err(io::Error::from)?;
        println!("{json}");
    } else {
        println!("{report}");
    }

    if let Some(ref path) = cli.soc_out {
        export_soc_trace(&report.dispatch.steps, path)?;
        eprintln!("SOC trace written to {}", path.display());
    }
    Ok(())
}

fn main() {
    let cli = match parse_args() {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("error: {e}");
            print_usage();
            process::exit(2);
        }
    };
    if cli.help {
        print_usage();
        return;
    }

    init_tracing();

    if let Err(e) = run(&cli) {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
