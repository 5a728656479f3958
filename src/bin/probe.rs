use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use otestpoint::{
    LogLevel, ManagedProbe, OperatorFactory, ProbeIndex, ProbeLogger, ProbeReport,
    config::{ConfigOverrides, ProbeConfig, resolve_config},
    probes::TimeOfDay,
};
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, error, info, trace, warn};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Parser)]
#[command(about = "Host the time of day probe and print its measurements")]
struct Args {
    /// Config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Node id appended to published topics
    #[arg(long)]
    node_id: Option<String>,

    /// Probe index
    #[arg(long)]
    index: Option<ProbeIndex>,

    /// Seconds between polls
    #[arg(long)]
    rate: Option<u64>,

    /// Stop after this many polls
    #[arg(long)]
    count: Option<usize>,

    /// Configuration file passed to the probe
    #[arg(long)]
    probe_config: Option<PathBuf>,

    /// NOLOG, ABORT, ERROR, INFO or DEBUG
    #[arg(long, default_value = "INFO")]
    log_level: LogLevel,

    /// Print reports as JSON lines
    #[arg(long)]
    json: bool,
}

fn init(level: LogLevel) {
    let filter = filter::Targets::new().with_targets(vec![
        ("otestpoint", level.as_filter()),
        ("otestpoint_probe", level.as_filter()),
    ]);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false),
        )
        .with(filter)
        .init();
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            node_id: self.node_id.clone(),
            index: self.index,
            rate: self.rate,
            count: self.count,
            configuration: self.probe_config.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let args = Args::parse();
    init(args.log_level);
    trace!("started with args: {args:?}");

    let config = resolve_config(args.config.as_deref(), args.overrides())?;

    let logger = ProbeLogger::for_probe(&config.node_id, config.index);
    let mut probe = ManagedProbe::new(
        Box::new(TimeOfDay::new(logger)),
        config.node_id.clone(),
        config.index,
    );
    let factory = OperatorFactory::builtin();

    probe
        .initialize(config.configuration.as_deref())
        .context("unable to initialize probe")?;
    info!("available probes: {:?}", probe.qualified_names());

    if let Err(err) = probe.start() {
        if let Err(destroy_err) = probe.destroy() {
            warn!("unable to destroy probe after failed start: {destroy_err}");
        }
        return Err(err).context("unable to start probe");
    }

    let result = run(&mut probe, &factory, &config, args.json).await;

    probe.stop().context("unable to stop probe")?;
    probe.destroy().context("unable to destroy probe")?;

    result
}

async fn run(
    probe: &mut ManagedProbe,
    factory: &OperatorFactory,
    config: &ProbeConfig,
    json: bool,
) -> anyhow::Result<()> {
    let mut ticker = interval(Duration::from_secs(config.rate));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut polls = 0usize;

    loop {
        if config.count.is_some_and(|count| polls >= count) {
            debug!("completed {polls} polls");
            break;
        }

        tokio::select! {
            _ = ticker.tick() => {
                polls += 1;

                // a failed poll is logged and the next tick tried again
                match probe.report(Utc::now().timestamp()) {
                    Ok(reports) => {
                        for report in &reports {
                            print_report(factory, report, json)?;
                        }
                    }
                    Err(err) => error!("probe error: {err}"),
                }
            }

            _ = tokio::signal::ctrl_c() => {
                debug!("received interrupt, shutting down");
                break;
            }
        }
    }

    Ok(())
}

fn print_report(factory: &OperatorFactory, report: &ProbeReport, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string(report)?);
        return Ok(());
    }

    let Some(operator) = factory.operator(&report.module, &report.tag) else {
        println!(
            "{} [{} bytes of {}/{}]",
            report.topic,
            report.blob.len(),
            report.module,
            report.tag
        );
        return Ok(());
    };

    let measurement = operator
        .create(&report.blob)
        .with_context(|| format!("unable to decode {}", report.tag))?;
    let text = operator.render(measurement.as_ref());

    match operator.diff(measurement.as_ref()) {
        Some(delta) => println!("{} {text} (delta {delta})", report.topic),
        None => println!("{} {text}", report.topic),
    }

    Ok(())
}
