//! Implementation of [BlockingConnector] for PostgreSQL, through diesel.

use crate::backend::{BlockingConnector, Error, Params};

use anyhow::anyhow;
use diesel::pg::PgConnection;
use diesel::Connection;

const DEFAULT_PG_PORT: u16 = 5432;

/// Connects to PostgreSQL servers.
///
/// The URL is assembled from the server's [Params]: `user`, `password`,
/// `host`, `port` (5432 unless given), `database`, and every entry of
/// `options` as a query argument.
#[derive(Clone, Copy, Debug, Default)]
pub struct DieselPgConnector {}

impl DieselPgConnector {
    pub fn new() -> Self {
        Self {}
    }

    fn to_url(params: &Params) -> Result<String, Error> {
        let host = params
            .host
            .as_deref()
            .ok_or_else(|| Error::InvalidParams("PostgreSQL requires a host".to_string()))?;
        let credentials = match (&params.user, &params.password) {
            (Some(user), Some(password)) => format!("{user}:{password}@"),
            (Some(user), None) => format!("{user}@"),
            (None, _) => String::new(),
        };
        let port = params.port.unwrap_or(DEFAULT_PG_PORT);
        let db = params.database.as_deref().unwrap_or_default();

        let mut args: Vec<String> = params
            .options
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        if let Some(timeout) = params.connect_timeout {
            args.push(format!("connect_timeout={}", timeout.as_secs().max(1)));
        }
        let args = if args.is_empty() {
            String::new()
        } else {
            format!("?{}", args.join("&"))
        };

        Ok(format!("postgresql://{credentials}{host}:{port}/{db}{args}"))
    }
}

impl BlockingConnector for DieselPgConnector {
    type Connection = PgConnection;

    fn connect(&self, params: &Params) -> Result<Self::Connection, Error> {
        let url = Self::to_url(params)?;
        PgConnection::establish(&url).map_err(|e| Error::Other(anyhow!(e)))
    }
}
