//! Monitoring items handed to the outbound sink
//!
//! Items are plain values. The builder stamps the host label and capture
//! time and namespaces the key once, at construction.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Namespace for every statistic key: `redis.stat[<fragment>]`
pub const STAT_PREFIX: &str = "redis.stat";

/// Key of the low-level discovery item
pub const DISCOVERY_KEY: &str = "redis.db.LLD";

/// Macro label used for each discovered database
pub const DISCOVERY_MACRO: &str = "{#DB}";

/// Item value: text exactly as captured, or a number produced locally
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ItemValue {
    Text(String),
    Integer(i64),
    Float(f64),
}

impl fmt::Display for ItemValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemValue::Text(s) => f.write_str(s),
            ItemValue::Integer(i) => write!(f, "{}", i),
            ItemValue::Float(v) => write!(f, "{}", v),
        }
    }
}

impl From<String> for ItemValue {
    fn from(s: String) -> Self {
        ItemValue::Text(s)
    }
}

impl From<&str> for ItemValue {
    fn from(s: &str) -> Self {
        ItemValue::Text(s.to_string())
    }
}

impl From<i64> for ItemValue {
    fn from(i: i64) -> Self {
        ItemValue::Integer(i)
    }
}

impl From<f64> for ItemValue {
    fn from(v: f64) -> Self {
        ItemValue::Float(v)
    }
}

/// A single named sample
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricItem {
    pub host: String,
    pub key: String,
    pub value: ItemValue,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub clock: DateTime<Utc>,
}

/// The discovered databases for one cycle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiscoveryItem {
    pub host: String,
    pub key: String,
    #[serde(rename = "value", serialize_with = "serialize_entities")]
    pub entities: Vec<String>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub clock: DateTime<Utc>,
}

/// One discovered entity, serialized as `{"{#DB}": "<name>"}`
struct DbMacro<'a>(&'a str);

impl Serialize for DbMacro<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(DISCOVERY_MACRO, self.0)?;
        map.end()
    }
}

fn serialize_entities<S: Serializer>(entities: &[String], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(entities.iter().map(|db| DbMacro(db.as_str())))
}

/// Anything the probe emits
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Item {
    Metric(MetricItem),
    Discovery(DiscoveryItem),
}

impl Item {
    pub fn key(&self) -> &str {
        match self {
            Item::Metric(m) => &m.key,
            Item::Discovery(d) => &d.key,
        }
    }

    pub fn as_metric(&self) -> Option<&MetricItem> {
        match self {
            Item::Metric(m) => Some(m),
            Item::Discovery(_) => None,
        }
    }

    pub fn as_discovery(&self) -> Option<&DiscoveryItem> {
        match self {
            Item::Discovery(d) => Some(d),
            Item::Metric(_) => None,
        }
    }
}

impl From<MetricItem> for Item {
    fn from(m: MetricItem) -> Self {
        Item::Metric(m)
    }
}

impl From<DiscoveryItem> for Item {
    fn from(d: DiscoveryItem) -> Self {
        Item::Discovery(d)
    }
}

/// Build a namespaced statistic key
pub fn stat_key(fragment: &str) -> String {
    format!("{}[{}]", STAT_PREFIX, fragment)
}

/// Stamps items with a host label and the capture time
#[derive(Debug, Clone)]
pub struct ItemBuilder {
    host: String,
    clock: fn() -> DateTime<Utc>,
}

impl ItemBuilder {
    pub fn new(host: impl Into<String>) -> Self {
        Self::with_clock(host, Utc::now)
    }

    /// Builder with an injected clock, for deterministic timestamps
    pub fn with_clock(host: impl Into<String>, clock: fn() -> DateTime<Utc>) -> Self {
        Self {
            host: host.into(),
            clock,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Statistic keyed `redis.stat[<fragment>]`
    pub fn stat(&self, fragment: &str, value: impl Into<ItemValue>) -> MetricItem {
        self.metric(stat_key(fragment), value)
    }

    /// Per-database statistic keyed `redis.stat[db,<db>,<field>]`
    pub fn db_stat(&self, db: &str, field: &str, value: impl Into<ItemValue>) -> MetricItem {
        self.stat(&format!("db,{},{}", db, field), value)
    }

    /// Metric with the key used verbatim
    pub fn metric(&self, key: impl Into<String>, value: impl Into<ItemValue>) -> MetricItem {
        MetricItem {
            host: self.host.clone(),
            key: key.into(),
            value: value.into(),
            clock: (self.clock)(),
        }
    }

    /// Discovery item listing `entities` in the given order
    pub fn discovery(&self, entities: Vec<String>) -> DiscoveryItem {
        DiscoveryItem {
            host: self.host.clone(),
            key: DISCOVERY_KEY.to_string(),
            entities,
            clock: (self.clock)(),
        }
    }
}

#[cfg(test)]
pub(crate) fn fixed_clock() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn builder() -> ItemBuilder {
        ItemBuilder::with_clock("cache-01", fixed_clock)
    }

    #[test]
    fn test_stat_key_namespacing() {
        let item = builder().stat("uptime_in_seconds", "3600");
        assert_eq!(item.key, "redis.stat[uptime_in_seconds]");
        assert_eq!(item.host, "cache-01");
        assert_eq!(item.value, ItemValue::Text("3600".to_string()));

        // Cloning an item keeps its key as built
        let copy = Item::from(item.clone());
        assert_eq!(copy.key(), "redis.stat[uptime_in_seconds]");
    }

    #[test]
    fn test_db_stat_key() {
        let item = builder().db_stat("db3", "expires", "12");
        assert_eq!(item.key, "redis.stat[db,db3,expires]");
    }

    #[test]
    fn test_metric_key_verbatim() {
        let item = builder().metric("blackbird.redis.ping", 1i64);
        assert_eq!(item.key, "blackbird.redis.ping");
        assert_eq!(item.value, ItemValue::Integer(1));
    }

    #[test]
    fn test_metric_serialization() {
        let item = Item::from(builder().stat("redis_version", "7.0.0"));
        assert_eq!(
            serde_json::to_value(&item).unwrap(),
            json!({
                "host": "cache-01",
                "key": "redis.stat[redis_version]",
                "value": "7.0.0",
                "clock": 1_700_000_000
            })
        );
    }

    #[test]
    fn test_float_value_serialization() {
        let item = builder().stat("get_response", 0.25);
        assert_eq!(serde_json::to_value(&item).unwrap()["value"], json!(0.25));
    }

    #[test]
    fn test_discovery_serialization() {
        let item = Item::from(builder().discovery(vec!["db0".to_string(), "db5".to_string()]));
        assert_eq!(
            serde_json::to_value(&item).unwrap(),
            json!({
                "host": "cache-01",
                "key": "redis.db.LLD",
                "value": [{"{#DB}": "db0"}, {"{#DB}": "db5"}],
                "clock": 1_700_000_000
            })
        );
    }

    #[test]
    fn test_discovery_entity_uses_macro_label() {
        let value = serde_json::to_value(builder().discovery(vec!["db3".to_string()])).unwrap();

        let entity = value["value"][0].as_object().unwrap();
        assert_eq!(entity.len(), 1);
        assert_eq!(entity[DISCOVERY_MACRO], "db3");
    }

    #[test]
    fn test_value_display() {
        assert_eq!(ItemValue::from("abc").to_string(), "abc");
        assert_eq!(ItemValue::from(42i64).to_string(), "42");
        assert_eq!(ItemValue::from(0.5).to_string(), "0.5");
    }
}
