//! INFO reply line classification
//!
//! Every line of an INFO reply falls into one of three buckets:
//! - ignored: blank lines and `# Section` headers
//! - keyspace: `dbN:keys=5,expires=1,avg_ttl=0`, split into sub-fields
//! - stat: any other `name:value` line, value kept verbatim

/// A classified INFO line borrowing from the reply text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InfoLine<'a> {
    /// Plain `name:value` statistic
    Stat { name: &'a str, value: &'a str },
    /// Per-database keyspace statistics
    Keyspace {
        db: &'a str,
        fields: Vec<(&'a str, &'a str)>,
    },
}

/// Classify one INFO line. Returns `None` for lines that produce nothing.
pub fn classify_line(line: &str) -> Option<InfoLine<'_>> {
    let line = line.trim_end_matches('\r');
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    // Only the first ':' separates name from value
    let (name, rest) = line.split_once(':')?;

    if is_db_identifier(name) {
        Some(InfoLine::Keyspace {
            db: name,
            fields: parse_keyspace_fields(rest),
        })
    } else {
        Some(InfoLine::Stat { name, value: rest })
    }
}

/// `db` followed by one or more ASCII digits, nothing else
pub fn is_db_identifier(name: &str) -> bool {
    match name.strip_prefix("db") {
        Some(digits) => !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()),
        None => false,
    }
}

/// Split `keys=5,expires=1,avg_ttl=0` into `(field, value)` pairs.
/// Fragments without '=' are skipped.
pub fn parse_keyspace_fields(rest: &str) -> Vec<(&str, &str)> {
    rest.split(',')
        .filter_map(|part| part.split_once('='))
        .collect()
}

/// Database identifiers present in an INFO reply, in first-seen order, each once
pub fn discover_databases(info: &str) -> Vec<String> {
    let mut databases: Vec<String> = Vec::new();
    for line in info.lines() {
        if let Some(InfoLine::Keyspace { db, .. }) = classify_line(line) {
            if !databases.iter().any(|d| d == db) {
                databases.push(db.to_string());
            }
        }
    }
    databases
}
