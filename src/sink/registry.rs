// Static registry resolving dialect names to sinks
use super::Sink;
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::OnceLock;

/// Name-to-sink lookup, built once from the fixed dialect list.
pub struct SinkRegistry {
    sinks: HashMap<&'static str, Sink>,
}

impl SinkRegistry {
    pub fn new() -> Self {
        let mut sinks = HashMap::new();

        for sink in Sink::ALL {
            sinks.insert(sink.name(), sink);
        }

        // Aliases
        sinks.insert("postgresql", Sink::Postgres);
        sinks.insert("pg", Sink::Postgres);
        sinks.insert("mariadb", Sink::MySql);
        sinks.insert("sqlite3", Sink::Sqlite);
        sinks.insert("generic", Sink::Ansi);

        Self { sinks }
    }

    /// Process-wide registry
    pub fn global() -> &'static SinkRegistry {
        static REGISTRY: OnceLock<SinkRegistry> = OnceLock::new();
        REGISTRY.get_or_init(SinkRegistry::new)
    }

    /// Look up a dialect by name or alias, case-insensitively
    pub fn get(&self, name: &str) -> Result<Sink> {
        self.sinks
            .get(name.trim().to_lowercase().as_str())
            .copied()
            .ok_or_else(|| Error::UnknownDialect(name.to_string()))
    }

    /// Distinct registered dialects
    pub fn supported(&self) -> Vec<Sink> {
        let mut sinks: Vec<Sink> = Sink::ALL
            .into_iter()
            .filter(|sink| self.sinks.values().any(|s| s == sink))
            .collect();
        sinks.sort_by_key(|s| s.name());
        sinks
    }
}

impl Default for SinkRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for Sink {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        SinkRegistry::global().get(s)
    }
}
