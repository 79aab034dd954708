//! A pool of [crate::server]s, rotated through and penalized on failure.

use crate::backend::{self, Connection, Params};
use crate::handle::Handle;
use crate::policy::Policy;
#[cfg(feature = "probes")]
use crate::probes;
use crate::providers::blocking::BlockingProvider;
use crate::providers::suspendable::SuspendableProvider;
use crate::reporter::{SharedReporter, TracingReporter};
use crate::server::{Penalty, Server, ServerSpec};

use rand::seq::SliceRandom;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::time::{Duration, Instant};
use tracing::{event, instrument, Level};

#[derive(Error, Debug)]
pub enum Error {
    #[error("There are no online servers")]
    NoOnlineServers,

    #[error("Cannot invalidate a value of type {0}")]
    InvalidArgument(&'static str),
}

/// The name of the pool
#[derive(Clone, Debug)]
pub(crate) struct Name(Arc<str>);

impl Name {
    pub(crate) fn new<S: Into<Arc<str>>>(name: S) -> Self {
        Self(name.into())
    }

    pub(crate) fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Name {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// The state shared by both the blocking and suspendable providers.
///
/// Holds the rotation of servers, the cursor where the next selection
/// pass begins, and the bookkeeping for penalties.
#[derive(Debug)]
pub struct ServerPool {
    name: Name,
    servers: Vec<Arc<Server>>,
    current: AtomicUsize,
    penalty: Duration,
    reporter: debug_ignore::DebugIgnore<SharedReporter>,
}

impl ServerPool {
    /// Creates a new pool of servers.
    ///
    /// - name: The name of this pool, for instrumentation.
    /// - servers: The configured servers. Each entry appears
    ///   [ServerSpec::weight] times in the rotation, which is shuffled.
    /// - base: Parameters shared by all servers. Each entry's host and port
    ///   override these. If `servers` is empty, the pool holds a single
    ///   server built from `base` alone.
    /// - policy: Describes how long failed servers are skipped.
    ///
    /// Failures are reported through [TracingReporter] until
    /// [Self::with_reporter] says otherwise.
    ///
    /// ```
    /// use upstream::backend::Params;
    /// use upstream::policy::Policy;
    /// use upstream::pool::ServerPool;
    /// use upstream::server::ServerSpec;
    ///
    /// let pool = ServerPool::new(
    ///     "my-pool",
    ///     vec![ServerSpec::new("db1"), ServerSpec::new("db2").with_count(2)],
    ///     Params::new().with_user("app").with_port(3306),
    ///     Policy::default(),
    /// );
    /// assert_eq!(pool.len(), 3);
    /// ```
    #[instrument(skip_all, fields(pool = %name), name = "ServerPool::new")]
    pub fn new(
        name: &str,
        servers: impl IntoIterator<Item = ServerSpec>,
        base: Params,
        policy: Policy,
    ) -> Self {
        let mut rotation = vec![];
        for spec in servers {
            let server = Arc::new(Server::new(
                base.overridden(spec.host.as_deref(), spec.port),
            ));
            // Replicas share one server, so that a penalty applies to all
            // of its appearances in the rotation.
            rotation.extend(std::iter::repeat_n(server, spec.weight()));
        }

        if rotation.is_empty() {
            rotation.push(Arc::new(Server::new(base)));
        } else {
            rotation.shuffle(&mut rand::rng());
        }
        event!(Level::DEBUG, count = rotation.len(), "Built server rotation");

        Self {
            name: Name::new(name),
            servers: rotation,
            current: AtomicUsize::new(0),
            penalty: policy.penalty,
            reporter: debug_ignore::DebugIgnore(Arc::new(TracingReporter)),
        }
    }

    /// Replaces the destination of failure reports.
    pub fn with_reporter(mut self, reporter: SharedReporter) -> Self {
        self.reporter = debug_ignore::DebugIgnore(reporter);
        self
    }

    /// Wraps this pool in a provider which connects on the calling thread.
    pub fn into_blocking<Conn: Connection>(
        self,
        connector: backend::SharedBlockingConnector<Conn>,
    ) -> BlockingProvider<Conn> {
        BlockingProvider::new(self, connector)
    }

    /// Wraps this pool in a provider which suspends the calling task while
    /// connecting.
    pub fn into_suspendable<Conn: Connection>(
        self,
        connector: backend::SharedConnector<Conn>,
    ) -> SuspendableProvider<Conn> {
        SuspendableProvider::new(self, connector)
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// The number of entries in the rotation, counting replicas.
    pub fn len(&self) -> usize {
        self.servers.len()
    }

    /// Always false: a pool holds at least one server.
    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }

    /// The rotation, in the order selection passes walk it.
    pub fn servers(&self) -> &[Arc<Server>] {
        &self.servers
    }

    /// Where the next selection pass begins.
    pub fn current(&self) -> usize {
        self.current.load(Ordering::Relaxed)
    }

    pub fn penalty(&self) -> Duration {
        self.penalty
    }

    /// Begins a selection pass at the cursor, with a single time snapshot.
    pub(crate) fn pass(&self) -> Pass<'_> {
        Pass {
            pool: self,
            start: self.current(),
            offset: 0,
            now: Instant::now(),
        }
    }

    // Records a successful pick, so the next pass starts just after it.
    pub(crate) fn selected(&self, idx: usize) {
        self.current
            .store((idx + 1) % self.servers.len(), Ordering::Relaxed);
    }

    pub(crate) fn connect_started(&self, server: &Server) {
        event!(Level::TRACE, server = server.name(), "Connecting");
        #[cfg(feature = "probes")]
        probes::connect__start!(|| (self.name.as_str(), server.name()));
    }

    pub(crate) fn connect_done<Conn: Connection>(
        &self,
        idx: usize,
        server: &Arc<Server>,
        conn: Conn,
    ) -> Handle<Conn> {
        #[cfg(feature = "probes")]
        probes::connect__done!(|| (self.name.as_str(), server.name()));
        self.selected(idx);
        Handle::new(conn, server.clone())
    }

    pub(crate) fn connect_failed(&self, server: &Server, err: &backend::Error) {
        event!(Level::WARN, err = ?err, server = server.name(), "Failed to connect");
        #[cfg(feature = "probes")]
        {
            let reason = err.to_string();
            probes::connect__failed!(|| (self.name.as_str(), server.name(), reason.as_str()));
        }
        self.invalidate(server, Some(err));
    }

    /// Excludes `server` from selection for the penalty duration, and
    /// reports `cause` for it.
    ///
    /// Other servers are left untouched, and a longer existing penalty is
    /// never shortened.
    pub fn invalidate(&self, server: &Server, cause: Option<&dyn std::error::Error>) {
        server.penalize(Penalty::starting_at(Instant::now(), self.penalty));

        #[cfg(feature = "probes")]
        probes::server__invalidated!(|| (self.name.as_str(), server.name()));

        match cause {
            Some(cause) => self.reporter.report(self.name.as_str(), server.name(), &cause),
            None => self
                .reporter
                .report(self.name.as_str(), server.name(), &"unknown error"),
        }
    }

    pub(crate) fn no_online_servers(&self) -> Error {
        event!(Level::ERROR, pool = %self.name, "There are no online servers");
        #[cfg(feature = "probes")]
        probes::select__failed!(|| self.name.as_str());
        Error::NoOnlineServers
    }
}

/// One full scan over the rotation, yielding the servers eligible at the
/// moment the pass began.
///
/// Every index is visited at most once, starting at the cursor and wrapping
/// around the end of the rotation.
pub(crate) struct Pass<'a> {
    pool: &'a ServerPool,
    start: usize,
    offset: usize,
    now: Instant,
}

impl<'a> Iterator for Pass<'a> {
    type Item = (usize, &'a Arc<Server>);

    fn next(&mut self) -> Option<Self::Item> {
        let pool = self.pool;
        let count = pool.servers.len();
        while self.offset < count {
            let idx = (self.start + self.offset) % count;
            self.offset += 1;

            let server = &pool.servers[idx];
            if server.is_eligible(self.now) {
                return Some((idx, server));
            }
            event!(Level::TRACE, idx, server = server.name(), "Skipping penalized server");
            #[cfg(feature = "probes")]
            probes::server__skipped!(|| (pool.name.as_str(), server.name()));
        }
        None
    }
}

/// Looks up the server behind a value of any type.
///
/// Used by [crate::provider::Provider::try_invalidate].
pub(crate) fn server_of<T: std::any::Any, Conn: Connection>(
    target: &T,
) -> Result<&Server, Error> {
    use crate::server::AsServer;

    let any = target as &dyn std::any::Any;
    if let Some(handle) = any.downcast_ref::<Handle<Conn>>() {
        Ok(handle.as_server())
    } else if let Some(server) = any.downcast_ref::<Arc<Server>>() {
        Ok(server.as_server())
    } else if let Some(server) = any.downcast_ref::<Server>() {
        Ok(server)
    } else {
        Err(Error::InvalidArgument(std::any::type_name::<T>()))
    }
}
