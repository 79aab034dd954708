//! Servers known to a pool, and the penalties imposed on them.

use crate::backend::Params;

use std::sync::{Arc, Mutex};
use tokio::time::{Duration, Instant};

/// One entry of a configured server list.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ServerSpec {
    pub host: Option<String>,
    pub port: Option<u16>,

    /// How many times this server appears in the pool's rotation.
    ///
    /// Missing or zero counts are treated as one.
    pub count: Option<usize>,
}

impl ServerSpec {
    pub fn new(host: impl ToString) -> Self {
        Self {
            host: Some(host.to_string()),
            ..Default::default()
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }

    /// The number of rotation entries this server occupies.
    pub fn weight(&self) -> usize {
        self.count.unwrap_or(1).max(1)
    }
}

/// How long a server is excluded from selection.
///
/// Variants are ordered from least to most restrictive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Penalty {
    /// The server has never been penalized.
    Clear,

    /// The server is skipped until this instant.
    Until(Instant),

    /// The penalty reaches past the furthest representable instant.
    Indefinite,
}

impl Penalty {
    /// The penalty of `duration` starting at `now`.
    pub fn starting_at(now: Instant, duration: Duration) -> Self {
        match now.checked_add(duration) {
            Some(until) => Penalty::Until(until),
            None => Penalty::Indefinite,
        }
    }

    /// Returns true if a server under this penalty may be tried at `now`.
    pub fn has_expired(&self, now: Instant) -> bool {
        match self {
            Penalty::Clear => true,
            Penalty::Until(until) => *until <= now,
            Penalty::Indefinite => false,
        }
    }
}

/// A single server within a pool.
///
/// The parameters never change after construction. The penalty deadline is
/// only moved forward, by invalidation.
#[derive(Debug)]
pub struct Server {
    name: Arc<str>,
    params: Params,
    penalty: Mutex<Penalty>,
}

impl Server {
    pub fn new(params: Params) -> Self {
        Self {
            name: params.display_name().into(),
            params,
            penalty: Mutex::new(Penalty::Clear),
        }
    }

    /// The display name of this server, e.g. `host:port`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// The current penalty, which may already have expired.
    pub fn penalty(&self) -> Penalty {
        *self.penalty.lock().unwrap()
    }

    /// Returns true if this server may be tried at `now`.
    pub fn is_eligible(&self, now: Instant) -> bool {
        self.penalty.lock().unwrap().has_expired(now)
    }

    // Applies `penalty`, unless an existing penalty already reaches further.
    pub(crate) fn penalize(&self, penalty: Penalty) {
        let mut current = self.penalty.lock().unwrap();
        *current = (*current).max(penalty);
    }
}

impl std::fmt::Display for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.name.fmt(f)
    }
}

/// Anything which identifies the [Server] it came from.
pub trait AsServer {
    fn as_server(&self) -> &Server;
}

impl AsServer for Server {
    fn as_server(&self) -> &Server {
        self
    }
}

impl AsServer for Arc<Server> {
    fn as_server(&self) -> &Server {
        self
    }
}
