use std::{fs::File, io::BufWriter, path::PathBuf, process::ExitCode, time::Duration};

use clap::Parser;
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

use operatives_n_stations::{
    config::Config,
    error::Error,
    run::{run, RunOptions, DEFAULT_OBSERVERS},
    sink::LineSink,
    timing::Timing,
};

/// Operatives compete for typewriting stations, units report to the logbook, staff review it
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// file with: operatives, unit size, station work units, logbook work units
    input: PathBuf,
    /// where the event lines go
    output: PathBuf,
    /// number of logbook reviewers
    #[arg(long, default_value_t = DEFAULT_OBSERVERS)]
    observers: u32,
    /// length of one work unit
    #[arg(long, default_value_t = 1000)]
    time_unit_ms: u64,
    /// resolution of the timestamps in the output
    #[arg(long, default_value_t = 100)]
    tick_ms: u64,
}

impl Cli {
    fn options(&self) -> RunOptions {
        let work_unit = Duration::from_millis(self.time_unit_ms);
        RunOptions {
            observers: self.observers,
            timing: Timing {
                work_unit,
                observe_step: work_unit,
                tick: Duration::from_millis(self.tick_ms.max(1)),
                ..Timing::default()
            },
        }
    }
}

fn main() -> ExitCode {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with_writer(std::io::stderr)
        .try_init();

    let cli = Cli::parse();
    match execute(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "run aborted");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn execute(cli: &Cli) -> Result<(), Error> {
    let config = Config::load(&cli.input)?;
    let file = File::create(&cli.output).map_err(|source| Error::Output {
        path: cli.output.clone(),
        source,
    })?;
    let sink = LineSink::new(BufWriter::new(file));

    let report = run(&config, &cli.options(), &sink)?;
    for (kind, count) in report.summary() {
        info!(%kind, count, "events");
    }
    Ok(())
}
