//! Stats extraction pipeline
//!
//! Issues INFO and CONFIG GET through a `ControlPlane`, turns the replies
//! into items, and hands each item to the sink as soon as it is built. An
//! error part-way through a cycle therefore leaves everything emitted so far
//! in the sink.

use tracing::{debug, warn};

use super::info_fields::{classify_line, discover_databases, InfoLine};
use super::item::{Item, ItemBuilder};
use super::sink::ItemSink;
use crate::client::{ControlPlane, ControlPlaneExt};
use crate::utils::Result;

/// Server parameters read with CONFIG GET every cycle
pub const CONFIG_PARAMETERS: &[&str] = &["maxmemory", "maxclients"];

/// Outcome of one collection cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Items accepted by the sink
    pub enqueued: usize,
    /// Items the sink rejected
    pub dropped: usize,
    /// Per-parameter failures that did not stop the cycle
    pub isolated_failures: Vec<String>,
}

/// Emits items for one cycle into a sink
pub struct StatsCollector<'a, S: ItemSink + ?Sized> {
    builder: &'a ItemBuilder,
    sink: &'a mut S,
    report: CycleReport,
}

impl<'a, S: ItemSink + ?Sized> StatsCollector<'a, S> {
    pub fn new(builder: &'a ItemBuilder, sink: &'a mut S) -> Self {
        Self {
            builder,
            sink,
            report: CycleReport::default(),
        }
    }

    pub fn builder(&self) -> &'a ItemBuilder {
        self.builder
    }

    /// Hand one item to the sink. A rejected item is logged and counted, not retried.
    pub fn emit(&mut self, item: impl Into<Item>) {
        let item = item.into();
        let label = match &item {
            Item::Metric(m) => format!("{}:{}", m.key, m.value),
            Item::Discovery(d) => format!("{}:{:?}", d.key, d.entities),
        };

        match self.sink.enqueue(item) {
            Ok(()) => {
                self.report.enqueued += 1;
                debug!("Inserted to queue {}", label);
            }
            Err(e) => {
                self.report.dropped += 1;
                warn!("Dropped {}: {}", label, e);
            }
        }
    }

    /// INFO statistics, database discovery, then the CONFIG GET parameters
    pub fn collect_stats<C: ControlPlane + ?Sized>(&mut self, conn: &mut C) -> Result<()> {
        let info = conn.info("")?;
        self.collect_info(&info);
        self.collect_parameters(conn, CONFIG_PARAMETERS)
    }

    /// Emit one item per INFO statistic and per keyspace sub-field, followed
    /// by a discovery item when at least one database was seen.
    pub fn collect_info(&mut self, info: &str) {
        let builder = self.builder;
        let mut databases: Vec<&str> = Vec::new();

        for line in info.lines() {
            match classify_line(line) {
                Some(InfoLine::Stat { name, value }) => {
                    self.emit(builder.stat(name, value));
                }
                Some(InfoLine::Keyspace { db, fields }) => {
                    for (field, value) in fields {
                        self.emit(builder.db_stat(db, field, value));
                    }
                    if !databases.contains(&db) {
                        databases.push(db);
                    }
                }
                None => {}
            }
        }

        if !databases.is_empty() {
            let entities = databases.into_iter().map(str::to_string).collect();
            self.emit(builder.discovery(entities));
        }
    }

    /// Read each parameter with CONFIG GET.
    /// A bad reply for one parameter is recorded and the next one is still read.
    pub fn collect_parameters<C: ControlPlane + ?Sized>(
        &mut self,
        conn: &mut C,
        names: &[&str],
    ) -> Result<()> {
        let builder = self.builder;

        for name in names {
            match conn.config_get(name) {
                Ok(value) => self.emit(builder.stat(name, value)),
                Err(e) if e.is_reply_scoped() => {
                    warn!("CONFIG GET {} failed: {}", name, e);
                    self.report
                        .isolated_failures
                        .push(format!("{}: {}", name, e));
                }
                Err(e) => return Err(e),
            }
        }

        Ok(())
    }

    /// Discovery only: one INFO, at most one discovery item
    pub fn collect_discovery<C: ControlPlane + ?Sized>(&mut self, conn: &mut C) -> Result<()> {
        let info = conn.info("")?;
        let databases = discover_databases(&info);
        if !databases.is_empty() {
            let item = self.builder.discovery(databases);
            self.emit(item);
        }
        Ok(())
    }

    pub fn report(&self) -> &CycleReport {
        &self.report
    }

    pub fn finish(self) -> CycleReport {
        self.report
    }
}
