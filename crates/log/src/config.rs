//! Staged logging configuration.

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use crate::level::Level;

/// Immutable policy snapshot consulted on every enabled check.
#[derive(Debug, Clone)]
pub(crate) struct LevelPolicy {
    root: Level,
    loggers: BTreeMap<String, Level>,
    filter: Option<Vec<String>>,
    server_address: Option<String>,
}

impl Default for LevelPolicy {
    fn default() -> Self {
        LevelPolicy {
            root: Level::Info,
            loggers: BTreeMap::new(),
            filter: None,
            server_address: None,
        }
    }
}

impl LevelPolicy {
    pub(crate) fn enabled(&self, logger: &str, level: Level) -> bool {
        if level == Level::Off {
            return false;
        }
        if let Some(filter) = &self.filter {
            if !filter.iter().any(|fragment| logger.contains(fragment.as_str())) {
                return false;
            }
        }
        level >= self.effective_level(logger)
    }

    /// Level configured for the longest dotted prefix of the name, falling
    /// back to the root level. `a.b` governs `a.b` and `a.b.c`, not `a.bc`.
    pub(crate) fn effective_level(&self, logger: &str) -> Level {
        let mut best: Option<(&str, Level)> = None;
        for (prefix, level) in &self.loggers {
            let matches = logger == prefix
                || (logger.starts_with(prefix.as_str())
                    && logger[prefix.len()..].starts_with('.'));
            if matches && best.map(|(name, _)| prefix.len() > name.len()).unwrap_or(true) {
                best = Some((prefix, *level));
            }
        }
        best.map(|(_, level)| level).unwrap_or(self.root)
    }
}

fn policy_slot() -> &'static RwLock<Arc<LevelPolicy>> {
    static SLOT: OnceLock<RwLock<Arc<LevelPolicy>>> = OnceLock::new();
    SLOT.get_or_init(|| RwLock::new(Arc::new(LevelPolicy::default())))
}

pub(crate) fn current_policy() -> Arc<LevelPolicy> {
    policy_slot()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Staged view of the logging configuration.
///
/// Mutations accumulate on the staged copy and become visible all at once
/// when [`commit`] swaps the shared snapshot: a concurrent reader sees
/// either the old policy or the new one, never a mix.
///
/// [`commit`]: LogConfig::commit
#[derive(Debug, Clone)]
pub struct LogConfig {
    staged: LevelPolicy,
}

impl LogConfig {
    /// Fresh defaults: root level `Info`, no per-logger levels, no filter.
    pub fn new() -> Self {
        LogConfig {
            staged: LevelPolicy::default(),
        }
    }

    /// Staged copy of the active configuration.
    pub fn current() -> Self {
        LogConfig {
            staged: (*current_policy()).clone(),
        }
    }

    pub fn root_level(&self) -> Level {
        self.staged.root
    }

    pub fn set_root_level(&mut self, level: Level) -> &mut Self {
        self.staged.root = level;
        self
    }

    /// Sets the level for a logger name prefix. Prefixes nest along dots;
    /// the longest configured prefix wins.
    pub fn set_logger_level(&mut self, name: &str, level: Level) -> &mut Self {
        self.staged.loggers.insert(name.to_string(), level);
        self
    }

    pub fn clear_logger_level(&mut self, name: &str) -> &mut Self {
        self.staged.loggers.remove(name);
        self
    }

    /// Restricts logging to loggers whose name contains one of the
    /// comma-separated fragments.
    pub fn set_filter(&mut self, fragments: &str) -> &mut Self {
        let fragments: Vec<String> = fragments
            .split(',')
            .map(str::trim)
            .filter(|fragment| !fragment.is_empty())
            .map(str::to_string)
            .collect();
        self.staged.filter = if fragments.is_empty() {
            None
        } else {
            Some(fragments)
        };
        self
    }

    pub fn clear_filter(&mut self) -> &mut Self {
        self.staged.filter = None;
        self
    }

    /// Stores the address of a central log collector. The address is
    /// opaque to this crate; providers that ship events elsewhere read it.
    pub fn set_server_address(&mut self, address: &str) -> &mut Self {
        self.staged.server_address = if address.is_empty() {
            None
        } else {
            Some(address.to_string())
        };
        self
    }

    pub fn server_address(&self) -> Option<&str> {
        self.staged.server_address.as_deref()
    }

    /// Publishes the staged configuration atomically.
    pub fn commit(&self) {
        *policy_slot()
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Arc::new(self.staged.clone());
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::new()
    }
}
