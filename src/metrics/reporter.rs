//! Item reporter - output formatting
//!
//! Supports two output formats:
//! - JSON (one object per line, the shape a sender consumes)
//! - Text (human-readable)

use std::io::{self, Write};

use clap::ValueEnum;

use super::item::{Item, DISCOVERY_MACRO};

/// Output format for items
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Text,
}

/// Item reporter
pub struct ItemReporter {
    format: OutputFormat,
}

impl ItemReporter {
    /// Create new reporter with specified format
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Write every item, one per line
    pub fn write_items<W: Write>(&self, items: &[Item], out: &mut W) -> io::Result<()> {
        for item in items {
            match self.format {
                OutputFormat::Json => {
                    serde_json::to_writer(&mut *out, item)?;
                    writeln!(out)?;
                }
                OutputFormat::Text => writeln!(out, "{}", format_text(item))?,
            }
        }
        out.flush()
    }
}

fn format_text(item: &Item) -> String {
    match item {
        Item::Metric(m) => format!("{} {} {} {}", m.host, m.key, m.clock.timestamp(), m.value),
        Item::Discovery(d) => {
            let entities: Vec<String> = d
                .entities
                .iter()
                .map(|e| format!("{}={}", DISCOVERY_MACRO, e))
                .collect();
            format!(
                "{} {} {} {}",
                d.host,
                d.key,
                d.clock.timestamp(),
                entities.join(",")
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::item::{fixed_clock, ItemBuilder};

    fn items() -> Vec<Item> {
        let builder = ItemBuilder::with_clock("cache-01", fixed_clock);
        vec![
            builder.stat("uptime_in_seconds", "42").into(),
            builder
                .discovery(vec!["db0".to_string(), "db1".to_string()])
                .into(),
        ]
    }

    #[test]
    fn test_json_lines() {
        let mut out = Vec::new();
        ItemReporter::new(OutputFormat::Json)
            .write_items(&items(), &mut out)
            .unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["key"], "redis.stat[uptime_in_seconds]");
        assert_eq!(first["value"], "42");

        let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["value"][1]["{#DB}"], "db1");
    }

    #[test]
    fn test_text_lines() {
        let mut out = Vec::new();
        ItemReporter::new(OutputFormat::Text)
            .write_items(&items(), &mut out)
            .unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "cache-01 redis.stat[uptime_in_seconds] 1700000000 42\n\
             cache-01 redis.db.LLD 1700000000 {#DB}=db0,{#DB}=db1\n"
        );
    }
}
