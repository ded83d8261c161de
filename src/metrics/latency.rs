//! Response latency probe
//!
//! Times a SET and a GET against a canary key. Only the elapsed time is
//! reported; the value read back is not checked.

use std::time::Instant;

use chrono::Local;

use super::collector::StatsCollector;
use super::sink::ItemSink;
use crate::client::{ControlPlane, ControlPlaneExt};
use crate::utils::Result;

/// Canary key used when none is configured explicitly
pub const DEFAULT_CANARY_KEY: &str = "__zabbix_check";

pub const SET_RESPONSE_STAT: &str = "set_response";
pub const GET_RESPONSE_STAT: &str = "get_response";

/// Write-then-read latency probe against one canary key
#[derive(Debug, Clone)]
pub struct LatencyProbe {
    key: String,
}

impl LatencyProbe {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Emit `redis.stat[set_response]` then `redis.stat[get_response]`, in seconds.
    /// A failed GET still leaves the SET sample in the sink.
    pub fn run<C, S>(&self, conn: &mut C, collector: &mut StatsCollector<'_, S>) -> Result<()>
    where
        C: ControlPlane + ?Sized,
        S: ItemSink + ?Sized,
    {
        let builder = collector.builder();

        let canary = Local::now().format("%Y%m%d%H%M%S").to_string();
        let start = Instant::now();
        conn.set(&self.key, &canary)?;
        let elapsed = start.elapsed().as_secs_f64();
        collector.emit(builder.stat(SET_RESPONSE_STAT, elapsed));

        let start = Instant::now();
        conn.get(&self.key)?;
        let elapsed = start.elapsed().as_secs_f64();
        collector.emit(builder.stat(GET_RESPONSE_STAT, elapsed));

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::control_plane::mock::{bulk, MockControlPlane};
    use crate::metrics::item::{fixed_clock, Item, ItemBuilder, ItemValue};
    use crate::utils::{ConnectionError, RespValue};

    #[test]
    fn test_latency_probe_emits_two_samples() {
        let mut conn = MockControlPlane::new(vec![
            RespValue::SimpleString("OK".to_string()),
            bulk("20240101000000"),
        ]);
        let builder = ItemBuilder::with_clock("cache-01", fixed_clock);
        let mut items: Vec<Item> = Vec::new();
        let mut collector = StatsCollector::new(&builder, &mut items);

        LatencyProbe::new(DEFAULT_CANARY_KEY)
            .run(&mut conn, &mut collector)
            .unwrap();
        drop(collector);

        let keys: Vec<&str> = items.iter().map(Item::key).collect();
        assert_eq!(
            keys,
            vec!["redis.stat[set_response]", "redis.stat[get_response]"]
        );
        for item in &items {
            match item.as_metric().map(|m| &m.value) {
                Some(ItemValue::Float(secs)) => assert!(*secs >= 0.0),
                other => panic!("unexpected value: {:?}", other),
            }
        }

        assert_eq!(conn.commands[0][0], "SET");
        assert_eq!(conn.commands[0][1], DEFAULT_CANARY_KEY);
        assert_eq!(conn.commands[0][2].len(), 14);
        assert_eq!(
            conn.commands[1],
            vec!["GET".to_string(), DEFAULT_CANARY_KEY.to_string()]
        );
    }

    #[test]
    fn test_latency_probe_missing_key_is_fine() {
        let mut conn = MockControlPlane::new(vec![
            RespValue::SimpleString("OK".to_string()),
            RespValue::Null,
        ]);
        let builder = ItemBuilder::with_clock("cache-01", fixed_clock);
        let mut items: Vec<Item> = Vec::new();
        let mut collector = StatsCollector::new(&builder, &mut items);

        LatencyProbe::new("canary").run(&mut conn, &mut collector).unwrap();
        assert_eq!(collector.report().enqueued, 2);
    }

    #[test]
    fn test_latency_probe_get_failure_keeps_set_sample() {
        let mut conn = MockControlPlane::with_results(vec![
            Ok(RespValue::SimpleString("OK".to_string())),
            Err(ConnectionError::Timeout.into()),
        ]);
        let builder = ItemBuilder::with_clock("cache-01", fixed_clock);
        let mut items: Vec<Item> = Vec::new();
        let mut collector = StatsCollector::new(&builder, &mut items);

        assert!(LatencyProbe::new("canary")
            .run(&mut conn, &mut collector)
            .is_err());
        drop(collector);

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].key(), "redis.stat[set_response]");
    }
}
