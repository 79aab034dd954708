//! Utilities to help with testing upstream

use crate::backend::{self, BlockingConnector, Connector, Params, Session};
use crate::reporter::Reporter;
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::fmt::Display;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;

/// A test-only raw connection, which counts the operations made on it.
#[derive(Debug)]
pub struct TestConnection {
    pub id: usize,
    pub server: String,
    pub open: bool,
    pub cursors: usize,
    pub commits: usize,
    pub rollbacks: usize,
}

impl TestConnection {
    pub fn new(id: usize, server: impl ToString) -> Self {
        Self {
            id,
            server: server.to_string(),
            open: true,
            cursors: 0,
            commits: 0,
            rollbacks: 0,
        }
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    fn check_open(&self) -> Result<(), backend::Error> {
        if self.open {
            Ok(())
        } else {
            Err(std::io::Error::from(std::io::ErrorKind::NotConnected).into())
        }
    }
}

impl Session for TestConnection {
    type Cursor = usize;
    type Error = backend::Error;

    fn connected(&self) -> bool {
        self.open
    }

    fn cursor(&mut self) -> Result<usize, backend::Error> {
        self.check_open()?;
        self.cursors += 1;
        Ok(self.cursors)
    }

    fn commit(&mut self) -> Result<(), backend::Error> {
        self.check_open()?;
        self.commits += 1;
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), backend::Error> {
        self.check_open()?;
        self.rollbacks += 1;
        Ok(())
    }
}

/// A test-only connector which refuses servers on demand, and records
/// every server it was asked to connect to.
///
/// It serves both the blocking and the suspendable providers. When used
/// asynchronously, every connection attempt may be delayed to mimic a
/// slow network.
pub struct TestConnector {
    next_id: AtomicUsize,
    delay_ms: AtomicU64,
    down: Mutex<BTreeSet<String>>,
    attempts: Mutex<Vec<String>>,
}

impl Default for TestConnector {
    fn default() -> Self {
        Self {
            next_id: AtomicUsize::new(1),
            delay_ms: AtomicU64::new(0),
            down: Mutex::new(BTreeSet::new()),
            attempts: Mutex::new(vec![]),
        }
    }
}

impl TestConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every future connection to `server` fail.
    pub fn take_down(&self, server: &str) {
        self.down.lock().unwrap().insert(server.to_string());
    }

    pub fn bring_up(&self, server: &str) {
        self.down.lock().unwrap().remove(server);
    }

    /// Delays each asynchronous connection attempt.
    pub fn set_delay_ms(&self, delay_ms: u64) {
        self.delay_ms.store(delay_ms, Ordering::SeqCst);
    }

    /// Returns (and forgets) the names of the servers contacted so far.
    pub fn take_attempts(&self) -> Vec<String> {
        std::mem::take(&mut *self.attempts.lock().unwrap())
    }

    fn attempt(&self, params: &Params) -> Result<TestConnection, backend::Error> {
        let name = params.display_name();
        self.attempts.lock().unwrap().push(name.clone());
        if self.down.lock().unwrap().contains(&name) {
            return Err(std::io::Error::from(std::io::ErrorKind::ConnectionRefused).into());
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        Ok(TestConnection::new(id, name))
    }
}

impl BlockingConnector for TestConnector {
    type Connection = TestConnection;

    fn connect(&self, params: &Params) -> Result<Self::Connection, backend::Error> {
        self.attempt(params)
    }
}

#[async_trait]
impl Connector for TestConnector {
    type Connection = TestConnection;

    async fn connect(&self, params: &Params) -> Result<Self::Connection, backend::Error> {
        let delay_ms = self.delay_ms.load(Ordering::SeqCst);
        if delay_ms > 0 {
            tokio::time::sleep(tokio::time::Duration::from_millis(delay_ms)).await;
        }
        self.attempt(params)
    }
}

/// A test-only reporter which remembers every failure it was told about.
#[derive(Default)]
pub struct RecordingReporter {
    reports: Mutex<Vec<(String, String)>>,
}

impl RecordingReporter {
    /// Returns the `(server, cause)` pairs reported so far.
    pub fn reports(&self) -> Vec<(String, String)> {
        self.reports.lock().unwrap().clone()
    }
}

impl Reporter for RecordingReporter {
    fn report(&self, _pool: &str, server: &str, cause: &dyn Display) {
        self.reports
            .lock()
            .unwrap()
            .push((server.to_string(), cause.to_string()));
    }
}
