//! Metrics collection and reporting
//!
//! This module provides:
//! - INFO line classification (plain stats vs per-database keyspace stats)
//! - The stats extraction pipeline (INFO, discovery, CONFIG GET)
//! - The SET/GET response latency probe
//! - Item building, outbound sinks and output formatting

pub mod collector;
pub mod info_fields;
pub mod item;
pub mod latency;
pub mod reporter;
pub mod sink;

pub use collector::{CycleReport, StatsCollector, CONFIG_PARAMETERS};
pub use info_fields::{classify_line, discover_databases, is_db_identifier, InfoLine};
pub use item::{
    stat_key, DiscoveryItem, Item, ItemBuilder, ItemValue, MetricItem, DISCOVERY_KEY,
    DISCOVERY_MACRO, STAT_PREFIX,
};
pub use latency::{LatencyProbe, DEFAULT_CANARY_KEY};
pub use reporter::{ItemReporter, OutputFormat};
pub use sink::{ItemQueue, ItemSink};
