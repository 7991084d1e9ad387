//! Per-thread transaction bookkeeping.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};

use gantry_config::{Config, ConfigError, Configurable};

use crate::error::TransactionError;
use crate::resource::TransactionalResource;

struct ThreadState<S> {
    session: Option<S>,
    schema: Option<String>,
    depth: u32,
    used: bool,
    concluded: bool,
}

/// Demarcates units of work on a [`TransactionalResource`].
///
/// The manager is shared and long-lived. Each thread gets at most one open
/// session at a time: a transaction started while the thread already has an
/// active one joins it, and only the outermost transaction commits, rolls
/// back or releases the session. Sessions never migrate between threads.
///
/// Two styles are supported. The guard style hands out a [`Transaction`]
/// that must be concluded and closed explicitly, while [`exec`] wraps a
/// closure with commit-on-success, rollback-on-failure semantics.
///
/// [`exec`]: TransactionManager::exec
pub struct TransactionManager<R: TransactionalResource> {
    resource: R,
    default_schema: Option<String>,
    states: Mutex<HashMap<ThreadId, ThreadState<R::Session>>>,
}

impl<R: TransactionalResource> TransactionManager<R> {
    pub fn new(resource: R) -> Self {
        TransactionManager {
            resource,
            default_schema: None,
            states: Mutex::new(HashMap::new()),
        }
    }

    /// Schema used when `transaction(None)` opens a fresh session.
    pub fn with_default_schema(mut self, schema: impl Into<String>) -> Self {
        self.default_schema = Some(schema.into());
        self
    }

    pub fn default_schema(&self) -> Option<&str> {
        self.default_schema.as_deref()
    }

    pub fn resource(&self) -> &R {
        &self.resource
    }

    /// Opens a read-write transaction, joining the current thread's active
    /// one if present.
    pub fn transaction(
        &self,
        schema: Option<&str>,
    ) -> Result<Transaction<'_, R>, TransactionError> {
        self.open(schema, false)
    }

    /// Opens a read-only transaction. Commit and rollback on the returned
    /// guard fail with [`TransactionError::ReadOnly`].
    pub fn read_only_transaction(
        &self,
        schema: Option<&str>,
    ) -> Result<Transaction<'_, R>, TransactionError> {
        self.open(schema, true)
    }

    fn open(
        &self,
        schema: Option<&str>,
        read_only: bool,
    ) -> Result<Transaction<'_, R>, TransactionError> {
        let thread = thread::current().id();
        let joined = {
            let mut states = self.lock_states();
            match states.get_mut(&thread) {
                Some(state) => {
                    if let Some(requested) = schema {
                        if state.schema.as_deref() != Some(requested) {
                            return Err(TransactionError::NestedSchema {
                                outer: state
                                    .schema
                                    .clone()
                                    .unwrap_or_else(|| "(default)".to_string()),
                                requested: requested.to_string(),
                            });
                        }
                    }
                    state.depth += 1;
                    true
                }
                None => false,
            }
        };
        if !joined {
            let effective = schema
                .map(str::to_string)
                .or_else(|| self.default_schema.clone());
            let mut session = self.resource.open_session(effective.as_deref())?;
            if let Err(err) = self.resource.begin(&mut session, read_only) {
                if let Err(release_err) = self.resource.release(session) {
                    log::warn!("Releasing a session after a failed begin failed: {release_err}");
                }
                return Err(err);
            }
            let mut states = self.lock_states();
            states.insert(
                thread,
                ThreadState {
                    session: Some(session),
                    schema: effective,
                    depth: 1,
                    used: false,
                    concluded: false,
                },
            );
        }
        Ok(Transaction {
            manager: self,
            outermost: !joined,
            read_only,
            concluded: false,
            closed: false,
        })
    }

    /// Runs a working unit in its own transaction: commit on success,
    /// rollback on failure, close always. The unit's error is preserved as
    /// the source of [`TransactionError::WorkingUnitError`].
    pub fn exec<T, F>(&self, schema: Option<&str>, working_unit: F) -> Result<T, TransactionError>
    where
        F: FnOnce(&mut R::Session) -> Result<T, Box<dyn std::error::Error + Send + Sync>>,
    {
        let mut transaction = self.transaction(schema)?;
        match transaction.session(working_unit) {
            Ok(Ok(value)) => match transaction.commit() {
                Ok(()) => {
                    transaction.close();
                    Ok(value)
                }
                Err(err) => {
                    transaction.close();
                    Err(err)
                }
            },
            Ok(Err(unit_error)) => {
                if let Err(err) = transaction.rollback() {
                    log::warn!("Rollback after a failed working unit failed: {err}");
                }
                transaction.close();
                Err(TransactionError::WorkingUnitError(unit_error))
            }
            Err(err) => {
                transaction.close();
                Err(err)
            }
        }
    }

    /// [`exec`](TransactionManager::exec) against the default schema.
    pub fn exec_default<T, F>(&self, working_unit: F) -> Result<T, TransactionError>
    where
        F: FnOnce(&mut R::Session) -> Result<T, Box<dyn std::error::Error + Send + Sync>>,
    {
        self.exec(None, working_unit)
    }

    /// Runs `f` against the current thread's active session and marks the
    /// transaction used.
    ///
    /// The session is temporarily taken out of the manager while `f` runs,
    /// so re-entrant `session` calls from inside `f` fail with
    /// [`TransactionError::NoTransaction`] instead of aliasing it.
    pub fn session<T, F>(&self, f: F) -> Result<T, TransactionError>
    where
        F: FnOnce(&mut R::Session) -> T,
    {
        let thread = thread::current().id();
        let mut session = {
            let mut states = self.lock_states();
            let state = states
                .get_mut(&thread)
                .ok_or(TransactionError::NoTransaction)?;
            state.used = true;
            state.session.take().ok_or(TransactionError::NoTransaction)?
        };
        let result = f(&mut session);
        let mut states = self.lock_states();
        match states.get_mut(&thread) {
            Some(state) => state.session = Some(session),
            None => {
                drop(states);
                if let Err(err) = self.resource.release(session) {
                    log::warn!("Releasing an orphaned session failed: {err}");
                }
            }
        }
        Ok(result)
    }

    /// Releases every still-open session, rolling back unconcluded work.
    pub fn destroy(&self) {
        let states = {
            let mut states = self.lock_states();
            std::mem::take(&mut *states)
        };
        for (_, mut state) in states {
            let Some(mut session) = state.session.take() else {
                continue;
            };
            if !state.concluded {
                if let Err(err) = self.resource.rollback(&mut session) {
                    log::warn!("Rolling back a session during destroy failed: {err}");
                }
            }
            if let Err(err) = self.resource.release(session) {
                log::warn!("Releasing a session during destroy failed: {err}");
            }
        }
    }

    fn conclude_current(&self, rollback: bool) -> Result<(), TransactionError> {
        let thread = thread::current().id();
        let mut session = {
            let mut states = self.lock_states();
            let state = states
                .get_mut(&thread)
                .ok_or(TransactionError::NoTransaction)?;
            state.session.take().ok_or(TransactionError::NoTransaction)?
        };
        let result = if rollback {
            self.resource.rollback(&mut session)
        } else {
            self.resource.commit(&mut session)
        };
        let mut states = self.lock_states();
        match states.get_mut(&thread) {
            Some(state) => {
                state.session = Some(session);
                if result.is_ok() {
                    state.concluded = true;
                }
            }
            None => {
                drop(states);
                if let Err(err) = self.resource.release(session) {
                    log::warn!("Releasing an orphaned session failed: {err}");
                }
            }
        }
        result
    }

    fn close_current(&self) -> bool {
        let thread = thread::current().id();
        let finished = {
            let mut states = self.lock_states();
            let Some(state) = states.get_mut(&thread) else {
                return false;
            };
            state.depth -= 1;
            if state.depth > 0 {
                return false;
            }
            states.remove(&thread)
        };
        let Some(mut state) = finished else {
            return false;
        };
        let Some(mut session) = state.session.take() else {
            return false;
        };
        if !state.concluded {
            if let Err(err) = self.resource.rollback(&mut session) {
                log::warn!("Rolling back an unconcluded transaction failed: {err}");
            }
        }
        if let Err(err) = self.resource.release(session) {
            log::warn!("Releasing a session failed: {err}");
        }
        true
    }

    fn unused_current(&self) -> bool {
        let thread = thread::current().id();
        let states = self.lock_states();
        states.get(&thread).map_or(true, |state| !state.used)
    }

    fn lock_states(&self) -> MutexGuard<'_, HashMap<ThreadId, ThreadState<R::Session>>> {
        self.states.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<R: TransactionalResource> Configurable for TransactionManager<R> {
    fn config(&mut self, config: &Config) -> Result<(), ConfigError> {
        if let Some(schema) = config.property("schema") {
            self.default_schema = Some(schema.to_string());
        }
        Ok(())
    }
}

impl<R: TransactionalResource> Drop for TransactionManager<R> {
    fn drop(&mut self) {
        self.destroy();
    }
}

/// An open transaction on the current thread.
///
/// The guard must be concluded with [`commit`] or [`rollback`] and then
/// [`close`]d. Dropping an unclosed guard closes it, rolling back if it was
/// never concluded. Nested guards are cheap views onto the outer
/// transaction whose conclusion calls touch nothing.
///
/// [`commit`]: Transaction::commit
/// [`rollback`]: Transaction::rollback
/// [`close`]: Transaction::close
pub struct Transaction<'a, R: TransactionalResource> {
    manager: &'a TransactionManager<R>,
    outermost: bool,
    read_only: bool,
    concluded: bool,
    closed: bool,
}

impl<R: TransactionalResource> Transaction<'_, R> {
    pub fn commit(&mut self) -> Result<(), TransactionError> {
        self.conclude(false)
    }

    pub fn rollback(&mut self) -> Result<(), TransactionError> {
        self.conclude(true)
    }

    fn conclude(&mut self, rollback: bool) -> Result<(), TransactionError> {
        if self.closed || self.concluded {
            return Err(TransactionError::Concluded);
        }
        if self.read_only {
            return Err(TransactionError::ReadOnly);
        }
        self.concluded = true;
        if self.outermost {
            self.manager.conclude_current(rollback)
        } else {
            Ok(())
        }
    }

    /// Closes the transaction. Returns `true` only when this call actually
    /// released the session, i.e. on the outermost guard.
    pub fn close(&mut self) -> bool {
        if self.closed {
            return false;
        }
        self.closed = true;
        self.manager.close_current()
    }

    /// `true` while nothing has touched the session through [`session`].
    ///
    /// [`session`]: Transaction::session
    pub fn unused(&self) -> bool {
        self.manager.unused_current()
    }

    pub fn session<T, F>(&mut self, f: F) -> Result<T, TransactionError>
    where
        F: FnOnce(&mut R::Session) -> T,
    {
        if self.closed {
            return Err(TransactionError::Concluded);
        }
        self.manager.session(f)
    }
}

impl<R: TransactionalResource> Drop for Transaction<'_, R> {
    fn drop(&mut self) {
        if !self.closed {
            self.closed = true;
            self.manager.close_current();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[derive(Default)]
    struct MemoryResource {
        journal: Arc<Mutex<Vec<String>>>,
        next_id: AtomicU32,
        fail_commit: bool,
    }

    struct MemorySession {
        id: u32,
        rows: Vec<String>,
    }

    impl MemoryResource {
        fn record(&self, entry: String) {
            self.journal.lock().unwrap().push(entry);
        }
    }

    impl TransactionalResource for MemoryResource {
        type Session = MemorySession;

        fn open_session(&self, schema: Option<&str>) -> Result<MemorySession, TransactionError> {
            let id = self.next_id.fetch_add(1, Ordering::SeqCst);
            self.record(format!("open {} [{}]", id, schema.unwrap_or("-")));
            Ok(MemorySession {
                id,
                rows: Vec::new(),
            })
        }

        fn begin(
            &self,
            session: &mut MemorySession,
            read_only: bool,
        ) -> Result<(), TransactionError> {
            self.record(format!("begin {} ro={}", session.id, read_only));
            Ok(())
        }

        fn commit(&self, session: &mut MemorySession) -> Result<(), TransactionError> {
            if self.fail_commit {
                return Err(TransactionError::ResourceError("Commit refused".to_string()));
            }
            self.record(format!("commit {} rows={}", session.id, session.rows.len()));
            Ok(())
        }

        fn rollback(&self, session: &mut MemorySession) -> Result<(), TransactionError> {
            session.rows.clear();
            self.record(format!("rollback {}", session.id));
            Ok(())
        }

        fn release(&self, session: MemorySession) -> Result<(), TransactionError> {
            self.record(format!("release {}", session.id));
            Ok(())
        }
    }

    fn manager() -> (TransactionManager<MemoryResource>, Arc<Mutex<Vec<String>>>) {
        let resource = MemoryResource::default();
        let journal = Arc::clone(&resource.journal);
        (TransactionManager::new(resource), journal)
    }

    fn entries(journal: &Arc<Mutex<Vec<String>>>) -> Vec<String> {
        journal.lock().unwrap().clone()
    }

    #[test]
    fn test_commit_releases_session() {
        let (manager, journal) = manager();
        let mut transaction = manager.transaction(None).unwrap();
        transaction
            .session(|session| session.rows.push("a".to_string()))
            .unwrap();
        transaction.commit().unwrap();
        assert!(transaction.close());
        assert_eq!(
            entries(&journal),
            ["open 0 [-]", "begin 0 ro=false", "commit 0 rows=1", "release 0"]
        );
    }

    #[test]
    fn test_close_without_conclusion_rolls_back() {
        let (manager, journal) = manager();
        let mut transaction = manager.transaction(None).unwrap();
        assert!(transaction.close());
        assert_eq!(
            entries(&journal),
            ["open 0 [-]", "begin 0 ro=false", "rollback 0", "release 0"]
        );
    }

    #[test]
    fn test_drop_closes_and_rolls_back() {
        let (manager, journal) = manager();
        drop(manager.transaction(None).unwrap());
        assert_eq!(
            entries(&journal),
            ["open 0 [-]", "begin 0 ro=false", "rollback 0", "release 0"]
        );
    }

    #[test]
    fn test_nested_transaction_joins_outer() {
        let (manager, journal) = manager();
        let mut outer = manager.transaction(Some("crm")).unwrap();
        {
            let mut inner = manager.transaction(Some("crm")).unwrap();
            inner
                .session(|session| session.rows.push("x".to_string()))
                .unwrap();
            inner.commit().unwrap();
            assert!(!inner.close());
        }
        outer.commit().unwrap();
        assert!(outer.close());
        assert_eq!(
            entries(&journal),
            ["open 0 [crm]", "begin 0 ro=false", "commit 0 rows=1", "release 0"]
        );
    }

    #[test]
    fn test_nested_without_schema_joins_any() {
        let (manager, journal) = manager();
        let mut outer = manager.transaction(Some("crm")).unwrap();
        let mut inner = manager.transaction(None).unwrap();
        assert!(!inner.close());
        outer.commit().unwrap();
        assert!(outer.close());
        assert_eq!(
            entries(&journal)
                .iter()
                .filter(|entry| entry.starts_with("open"))
                .count(),
            1
        );
    }

    #[test]
    fn test_nested_schema_mismatch() {
        let (manager, _journal) = manager();
        let _outer = manager.transaction(Some("crm")).unwrap();
        let result = manager.transaction(Some("billing"));
        assert!(matches!(
            result,
            Err(TransactionError::NestedSchema { outer, requested })
                if outer == "crm" && requested == "billing"
        ));
    }

    #[test]
    fn test_exec_commits_on_success() {
        let (manager, journal) = manager();
        let count = manager
            .exec_default(|session| {
                session.rows.push("a".to_string());
                session.rows.push("b".to_string());
                Ok(session.rows.len())
            })
            .unwrap();
        assert_eq!(count, 2);
        assert_eq!(
            entries(&journal),
            ["open 0 [-]", "begin 0 ro=false", "commit 0 rows=2", "release 0"]
        );
    }

    #[test]
    fn test_exec_rolls_back_on_working_unit_error() {
        let (manager, journal) = manager();
        let result: Result<(), _> = manager.exec(None, |_session| Err("import failed".into()));
        let Err(TransactionError::WorkingUnitError(source)) = result else {
            panic!("expected a working unit error");
        };
        assert_eq!(source.to_string(), "import failed");
        assert_eq!(
            entries(&journal),
            ["open 0 [-]", "begin 0 ro=false", "rollback 0", "release 0"]
        );
    }

    #[test]
    fn test_read_only_rejects_commit_and_rollback() {
        let (manager, journal) = manager();
        let mut transaction = manager.read_only_transaction(None).unwrap();
        assert!(matches!(
            transaction.commit(),
            Err(TransactionError::ReadOnly)
        ));
        assert!(matches!(
            transaction.rollback(),
            Err(TransactionError::ReadOnly)
        ));
        assert!(transaction.close());
        assert_eq!(
            entries(&journal),
            ["open 0 [-]", "begin 0 ro=true", "rollback 0", "release 0"]
        );
    }

    #[test]
    fn test_session_requires_active_transaction() {
        let (manager, _journal) = manager();
        let result = manager.session(|session| session.id);
        assert!(matches!(result, Err(TransactionError::NoTransaction)));
    }

    #[test]
    fn test_unused_flips_after_session_access() {
        let (manager, _journal) = manager();
        let mut transaction = manager.transaction(None).unwrap();
        assert!(transaction.unused());
        transaction.session(|_| {}).unwrap();
        assert!(!transaction.unused());
        transaction.rollback().unwrap();
        transaction.close();
    }

    #[test]
    fn test_concluded_transaction_rejects_further_work() {
        let (manager, _journal) = manager();
        let mut transaction = manager.transaction(None).unwrap();
        transaction.commit().unwrap();
        assert!(matches!(
            transaction.commit(),
            Err(TransactionError::Concluded)
        ));
        assert!(matches!(
            transaction.rollback(),
            Err(TransactionError::Concluded)
        ));
        transaction.close();
    }

    #[test]
    fn test_threads_get_independent_sessions() {
        let (manager, journal) = manager();
        let manager = Arc::new(manager);
        let worker = {
            let manager = Arc::clone(&manager);
            std::thread::spawn(move || {
                let mut transaction = manager.transaction(None).unwrap();
                transaction.commit().unwrap();
                transaction.close();
            })
        };
        let mut transaction = manager.transaction(None).unwrap();
        transaction.commit().unwrap();
        assert!(transaction.close());
        worker.join().unwrap();
        let entries = entries(&journal);
        assert_eq!(
            entries
                .iter()
                .filter(|entry| entry.starts_with("open"))
                .count(),
            2
        );
        assert_eq!(
            entries
                .iter()
                .filter(|entry| entry.starts_with("release"))
                .count(),
            2
        );
    }

    #[test]
    fn test_destroy_releases_open_sessions() {
        let (manager, journal) = manager();
        let mut transaction = manager.transaction(None).unwrap();
        manager.destroy();
        assert!(!transaction.close());
        assert_eq!(
            entries(&journal),
            ["open 0 [-]", "begin 0 ro=false", "rollback 0", "release 0"]
        );
    }

    #[test]
    fn test_failed_commit_still_rolls_back_on_close() {
        let resource = MemoryResource {
            fail_commit: true,
            ..MemoryResource::default()
        };
        let journal = Arc::clone(&resource.journal);
        let manager = TransactionManager::new(resource);
        let mut transaction = manager.transaction(None).unwrap();
        assert!(matches!(
            transaction.commit(),
            Err(TransactionError::ResourceError(_))
        ));
        assert!(transaction.close());
        assert_eq!(
            entries(&journal),
            ["open 0 [-]", "begin 0 ro=false", "rollback 0", "release 0"]
        );
    }

    #[test]
    fn test_config_sets_default_schema() {
        let config = Config::from_xml(
            "<transactions><property name=\"schema\" value=\"hr\"/></transactions>",
        )
        .unwrap();
        let (mut manager, journal) = manager();
        manager.config(&config).unwrap();
        let mut transaction = manager.transaction(None).unwrap();
        transaction.rollback().unwrap();
        transaction.close();
        assert!(entries(&journal)[0].ends_with("[hr]"));
    }
}
