//! One collection cycle: open a session, emit items, close the session

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::client::{ConnectionFactory, ControlPlane, RawConnection};
use crate::config::ProbeConfig;
use crate::metrics::{CycleReport, ItemBuilder, ItemSink, LatencyProbe, StatsCollector};
use crate::utils::{ProbeError, Result};

/// Liveness item emitted once the session is established
pub const PING_KEY: &str = "blackbird.redis.ping";
/// Probe version item emitted once the session is established
pub const VERSION_KEY: &str = "blackbird.redis.version";

/// A cycle that stopped early. `report` covers what was emitted before `error`.
#[derive(Error, Debug)]
#[error("Cycle aborted after {} items", .report.enqueued)]
pub struct CycleFailure {
    pub report: CycleReport,
    #[source]
    pub error: ProbeError,
}

impl From<ProbeError> for CycleFailure {
    fn from(error: ProbeError) -> Self {
        Self {
            report: CycleReport::default(),
            error,
        }
    }
}

pub type CycleResult = std::result::Result<CycleReport, CycleFailure>;

/// Redis statistics probe
pub struct Probe {
    config: ProbeConfig,
    factory: ConnectionFactory,
    builder: ItemBuilder,
}

impl Probe {
    pub fn new(config: ProbeConfig) -> Self {
        let builder = ItemBuilder::new(config.hostname.clone());
        Self::with_builder(config, builder)
    }

    /// Use a caller-supplied item builder (fixed clock in tests)
    pub fn with_builder(config: ProbeConfig, builder: ItemBuilder) -> Self {
        let factory = config.connection_factory();
        Self {
            config,
            factory,
            builder,
        }
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// Open a session and run AUTH/SELECT as configured
    pub fn connect(&self) -> Result<RawConnection> {
        self.factory
            .create(&self.config.address.host, self.config.address.port)
    }

    /// Full cycle on a fresh session.
    /// Setup failures return before anything reaches the sink.
    pub fn run_cycle<S: ItemSink + ?Sized>(&self, sink: &mut S) -> CycleResult {
        info!("Collecting stats from {}", self.config.address);

        let mut conn = self.connect()?;
        let result = self.run_cycle_on(&mut conn, sink);
        close(conn);

        result
    }

    /// Full cycle on an established session: heartbeat, stats, then the
    /// latency probe when a canary key is configured.
    pub fn run_cycle_on<C, S>(&self, conn: &mut C, sink: &mut S) -> CycleResult
    where
        C: ControlPlane + ?Sized,
        S: ItemSink + ?Sized,
    {
        let mut collector = StatsCollector::new(&self.builder, sink);

        collector.emit(self.builder.metric(PING_KEY, 1i64));
        collector.emit(self.builder.metric(VERSION_KEY, env!("CARGO_PKG_VERSION")));

        let result = self.collect(conn, &mut collector);
        finish("Cycle", collector.finish(), result)
    }

    fn collect<C, S>(&self, conn: &mut C, collector: &mut StatsCollector<'_, S>) -> Result<()>
    where
        C: ControlPlane + ?Sized,
        S: ItemSink + ?Sized,
    {
        collector.collect_stats(conn)?;

        if let Some(key) = self.config.response_check_key.as_deref() {
            LatencyProbe::new(key).run(conn, collector)?;
        }

        Ok(())
    }

    /// Discovery-only cycle on a fresh session
    pub fn run_discovery<S: ItemSink + ?Sized>(&self, sink: &mut S) -> CycleResult {
        info!("Discovering databases on {}", self.config.address);

        let mut conn = self.connect()?;
        let result = self.run_discovery_on(&mut conn, sink);
        close(conn);

        result
    }

    pub fn run_discovery_on<C, S>(&self, conn: &mut C, sink: &mut S) -> CycleResult
    where
        C: ControlPlane + ?Sized,
        S: ItemSink + ?Sized,
    {
        let mut collector = StatsCollector::new(&self.builder, sink);
        let result = collector.collect_discovery(conn);
        finish("Discovery", collector.finish(), result)
    }
}

fn finish(label: &str, report: CycleReport, result: Result<()>) -> CycleResult {
    match result {
        Ok(()) => {
            info!(
                "{} finished: {} enqueued, {} dropped, {} isolated failures",
                label,
                report.enqueued,
                report.dropped,
                report.isolated_failures.len()
            );
            Ok(report)
        }
        Err(error) => {
            warn!(
                "{} aborted: {} enqueued, {} dropped, {} isolated failures",
                label,
                report.enqueued,
                report.dropped,
                report.isolated_failures.len()
            );
            Err(CycleFailure { report, error })
        }
    }
}

fn close(conn: RawConnection) {
    if let Err(e) = conn.close() {
        debug!("Error closing connection: {}", e);
    }
}
