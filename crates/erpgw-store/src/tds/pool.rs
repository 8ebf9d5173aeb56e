//! Pooled TDS connections
//!
//! `deadpool` owns connection lifecycle. A connection is recycled only
//! when the statement it ran was read to completion; anything else
//! (row cap, driver error, cancelled future) detaches and closes it so
//! unread result data never leaks into the next lease.

use std::time::Duration;

use deadpool::managed::{self, Metrics, Object, RecycleError, RecycleResult};
use deadpool::Runtime;
use erpgw_core::{GwError, GwErrorKind};
use tiberius::{Client, Config, SqlBrowser};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};

use crate::errors::{unavailable, Result};
use crate::params::ConnectionParams;

pub type TdsClient = Client<Compat<TcpStream>>;
pub type TdsPool = managed::Pool<TdsManager>;

pub struct TdsManager {
    config: Config,
    named_instance: bool,
    max_lifetime: Duration,
}

impl TdsManager {
    pub fn new(config: Config, named_instance: bool, max_lifetime: Duration) -> Self {
        Self {
            config,
            named_instance,
            max_lifetime,
        }
    }

    async fn connect(&self) -> tiberius::Result<TdsClient> {
        let tcp = if self.named_instance {
            TcpStream::connect_named(&self.config).await?
        } else {
            TcpStream::connect(self.config.get_addr()).await?
        };
        tcp.set_nodelay(true)?;

        match Client::connect(self.config.clone(), tcp.compat_write()).await {
            Ok(client) => Ok(client),
            // Azure-style gateways answer with a redirect to the real node
            Err(tiberius::error::Error::Routing { host, port }) => {
                let mut config = self.config.clone();
                config.host(&host);
                config.port(port);
                let tcp = TcpStream::connect(config.get_addr()).await?;
                tcp.set_nodelay(true)?;
                Client::connect(config, tcp.compat_write()).await
            }
            Err(e) => Err(e),
        }
    }
}

impl managed::Manager for TdsManager {
    type Type = TdsClient;
    type Error = tiberius::error::Error;

    async fn create(&self) -> std::result::Result<TdsClient, Self::Error> {
        self.connect().await
    }

    async fn recycle(
        &self,
        client: &mut TdsClient,
        metrics: &Metrics,
    ) -> RecycleResult<Self::Error> {
        if metrics.age() >= self.max_lifetime {
            return Err(RecycleError::Message("connection reached max lifetime".into()));
        }
        client
            .simple_query("SELECT 1")
            .await
            .map_err(RecycleError::Backend)?
            .into_results()
            .await
            .map_err(RecycleError::Backend)?;
        Ok(())
    }
}

/// Build the pool for `params`. No connection is opened here.
///
/// # Errors
///
/// `Config` when the pool cannot be built.
pub fn build_pool(params: &ConnectionParams, config: Config) -> Result<TdsPool> {
    let named = params
        .instance
        .as_deref()
        .is_some_and(|i| !i.trim().is_empty());
    let manager = TdsManager::new(config, named, params.max_lifetime);
    managed::Pool::builder(manager)
        .max_size(params.max_open.max(1))
        .wait_timeout(Some(params.connect_timeout))
        .create_timeout(Some(params.connect_timeout))
        .runtime(Runtime::Tokio1)
        .build()
        .map_err(|e| {
            GwError::new(GwErrorKind::Config)
                .with_op("build_pool")
                .with_message("Invalid database pool settings")
                .with_detail(e.to_string())
        })
}

/// A checked-out connection
///
/// Dropped without [`Lease::release`] the connection is closed instead of
/// going back to the pool.
pub struct Lease {
    conn: Option<Object<TdsManager>>,
    clean: bool,
}

impl Lease {
    /// # Errors
    ///
    /// `ResourceUnavailable` when the pool is closed, exhausted past the
    /// wait timeout, or a new connection cannot be established.
    pub async fn acquire(pool: &TdsPool) -> Result<Self> {
        let conn = pool.get().await.map_err(|e| unavailable("acquire_connection", e))?;
        Ok(Self {
            conn: Some(conn),
            clean: false,
        })
    }

    /// # Errors
    ///
    /// `Internal` if the lease was already released.
    pub fn client(&mut self) -> Result<&mut TdsClient> {
        self.conn.as_deref_mut().ok_or_else(|| {
            GwError::new(GwErrorKind::Internal)
                .with_op("lease_client")
                .with_message("Connection lease already released")
        })
    }

    /// Mark the connection as fully drained and return it to the pool
    pub fn release(mut self) {
        self.clean = true;
    }
}

impl Drop for Lease {
    fn drop(&mut self) {
        if self.clean {
            return;
        }
        if let Some(conn) = self.conn.take() {
            tracing::debug!(
                component = module_path!(),
                "Closing connection left with unread results"
            );
            drop(Object::take(conn));
        }
    }
}
