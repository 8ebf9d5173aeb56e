//! Gateway configuration
//!
//! One file (YAML, TOML or JSON, by extension) layered under `ERPGW_*`
//! environment variables. Nested keys use `__`, so `ERPGW_DB__HOST`
//! overrides `db.host`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use erpgw_core::logging_facility::Profile;
use erpgw_core::{GwError, GwErrorKind};
use erpgw_core_types::Sensitive;
use erpgw_engine::{Backend, PricingSettings, QueryLimits};
use erpgw_store::ConnectionParams;
use serde::Deserialize;
use thiserror::Error;

pub const ENV_PREFIX: &str = "ERPGW";
pub const DEFAULT_LISTEN: &str = "127.0.0.1:8080";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config file not found at {0}")]
    NotFound(PathBuf),

    #[error("failed to load config: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid config: {0}")]
    Invalid(String),
}

impl From<ConfigError> for GwError {
    fn from(err: ConfigError) -> Self {
        GwError::new(GwErrorKind::Config)
            .with_op("load_config")
            .with_message(err.to_string())
    }
}

/// Environment keys arrive lowercased, hence the aliases on camelCase fields
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
    pub erp: Backend,
    #[serde(default = "default_listen", alias = "apilisten")]
    pub api_listen: String,
    #[serde(default, alias = "bearertoken")]
    pub bearer_token: Sensitive<String>,
    /// Turns on the per-request access log
    #[serde(default)]
    pub debug: bool,
    pub db: DbConfig,
    #[serde(default = "default_warehouses")]
    pub warehouses: Vec<String>,
    #[serde(default)]
    pub pricing: PricingConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbConfig {
    pub host: String,
    #[serde(default = "default_db_port")]
    pub port: u16,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub database: String,
    #[serde(default)]
    pub instance: Option<String>,
    #[serde(default = "default_true", alias = "trustcert")]
    pub trust_cert: bool,
    #[serde(default = "default_max_open", alias = "maxopenconns")]
    pub max_open_conns: usize,
    #[serde(default = "default_conn_max_lifetime", alias = "connmaxlifetimesecs")]
    pub conn_max_lifetime_secs: u64,
    #[serde(default = "default_connect_timeout", alias = "connecttimeoutsecs")]
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingConfig {
    #[serde(default = "default_last_price_list", alias = "lastpricepricelist")]
    pub last_price_price_list: i64,
    #[serde(default = "default_invoice_doc", alias = "invoicedocumentid")]
    pub invoice_document_id: i64,
    #[serde(default = "default_order_doc", alias = "orderdocumentid")]
    pub order_document_id: i64,
    #[serde(default = "default_excluded_prefix", alias = "excludedorderprefix")]
    pub excluded_order_prefix: String,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            last_price_price_list: default_last_price_list(),
            invoice_document_id: default_invoice_doc(),
            order_document_id: default_order_doc(),
            excluded_order_prefix: default_excluded_prefix(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LimitsConfig {
    #[serde(default = "default_sql_max_rows", alias = "sqlmaxrows")]
    pub sql_max_rows: usize,
    #[serde(default = "default_sql_timeout", alias = "sqltimeoutsecs")]
    pub sql_timeout_secs: u64,
    #[serde(default = "default_price_stock_timeout", alias = "pricestocktimeoutsecs")]
    pub price_stock_timeout_secs: u64,
    #[serde(default = "default_health_timeout", alias = "healthtimeoutsecs")]
    pub health_timeout_secs: u64,
    #[serde(default = "default_max_body", alias = "maxbodybytes")]
    pub max_body_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            sql_max_rows: default_sql_max_rows(),
            sql_timeout_secs: default_sql_timeout(),
            price_stock_timeout_secs: default_price_stock_timeout(),
            health_timeout_secs: default_health_timeout(),
            max_body_bytes: default_max_body(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_profile")]
    pub profile: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            profile: default_profile(),
        }
    }
}

fn default_listen() -> String {
    DEFAULT_LISTEN.to_string()
}
fn default_db_port() -> u16 {
    erpgw_store::params::DEFAULT_PORT
}
fn default_true() -> bool {
    true
}
fn default_max_open() -> usize {
    erpgw_store::params::DEFAULT_MAX_OPEN
}
fn default_conn_max_lifetime() -> u64 {
    erpgw_store::params::DEFAULT_MAX_LIFETIME.as_secs()
}
fn default_connect_timeout() -> u64 {
    erpgw_store::params::DEFAULT_CONNECT_TIMEOUT.as_secs()
}
fn default_warehouses() -> Vec<String> {
    PricingSettings::default().default_warehouses
}
fn default_last_price_list() -> i64 {
    PricingSettings::default().last_price_price_list
}
fn default_invoice_doc() -> i64 {
    PricingSettings::default().invoice_document_id
}
fn default_order_doc() -> i64 {
    PricingSettings::default().order_document_id
}
fn default_excluded_prefix() -> String {
    PricingSettings::default().excluded_order_prefix
}
fn default_sql_max_rows() -> usize {
    erpgw_engine::commands::adhoc_query::DEFAULT_MAX_ROWS
}
fn default_sql_timeout() -> u64 {
    erpgw_engine::commands::adhoc_query::DEFAULT_TIMEOUT.as_secs()
}
fn default_price_stock_timeout() -> u64 {
    erpgw_engine::commands::price_stock::DEFAULT_TIMEOUT.as_secs()
}
fn default_health_timeout() -> u64 {
    3
}
fn default_max_body() -> usize {
    1 << 20
}
fn default_profile() -> String {
    "production".to_string()
}

/// Load `.env`, the config file and the environment overlay, then validate.
///
/// # Errors
///
/// `NotFound` when `path` does not exist, `Load` for unreadable or
/// mistyped input and `Invalid` when validation fails.
pub fn load(path: &Path) -> Result<GatewayConfig, ConfigError> {
    // a missing .env is normal
    let _ = dotenvy::dotenv();

    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }

    let settings = config::Config::builder()
        .add_source(config::File::from(path))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let config: GatewayConfig = settings.try_deserialize()?;
    config.validate()?;
    Ok(config)
}

impl GatewayConfig {
    /// # Errors
    ///
    /// `ConfigError::Invalid` naming the first offending setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        parse_listen_addr(&self.api_listen)?;

        if self.bearer_token.is_blank() {
            return Err(ConfigError::Invalid("bearerToken is required".to_string()));
        }

        if self.db.host.trim().is_empty() {
            return Err(ConfigError::Invalid("db.host is required".to_string()));
        }
        if self.db.max_open_conns == 0 {
            return Err(ConfigError::Invalid(
                "db.maxOpenConns must be at least 1".to_string(),
            ));
        }

        let limits = [
            ("limits.sqlMaxRows", self.limits.sql_max_rows as u64),
            ("limits.sqlTimeoutSecs", self.limits.sql_timeout_secs),
            ("limits.priceStockTimeoutSecs", self.limits.price_stock_timeout_secs),
            ("limits.healthTimeoutSecs", self.limits.health_timeout_secs),
            ("limits.maxBodyBytes", self.limits.max_body_bytes as u64),
        ];
        if let Some((name, _)) = limits.iter().find(|(_, v)| *v == 0) {
            return Err(ConfigError::Invalid(format!("{} cannot be 0", name)));
        }

        self.logging_profile()?;
        Ok(())
    }

    /// # Errors
    ///
    /// `ConfigError::Invalid` for an unknown profile name.
    pub fn logging_profile(&self) -> Result<Profile, ConfigError> {
        self.logging.profile.parse::<Profile>().map_err(ConfigError::Invalid)
    }

    pub fn connection_params(&self) -> ConnectionParams {
        ConnectionParams {
            host: self.db.host.trim().to_string(),
            port: self.db.port,
            user: self.db.user.clone(),
            database: self.db.database.clone(),
            instance: self.db.instance.clone(),
            trust_cert: self.db.trust_cert,
            max_open: self.db.max_open_conns,
            max_lifetime: Duration::from_secs(self.db.conn_max_lifetime_secs),
            connect_timeout: Duration::from_secs(self.db.connect_timeout_secs),
            ..Default::default()
        }
    }

    pub fn pricing_settings(&self) -> PricingSettings {
        PricingSettings {
            default_warehouses: self.warehouses.clone(),
            last_price_price_list: self.pricing.last_price_price_list,
            invoice_document_id: self.pricing.invoice_document_id,
            order_document_id: self.pricing.order_document_id,
            excluded_order_prefix: self.pricing.excluded_order_prefix.clone(),
        }
    }

    pub fn query_limits(&self) -> QueryLimits {
        QueryLimits {
            max_rows: self.limits.sql_max_rows,
            timeout: Duration::from_secs(self.limits.sql_timeout_secs),
        }
    }

    pub fn price_stock_timeout(&self) -> Duration {
        Duration::from_secs(self.limits.price_stock_timeout_secs)
    }

    pub fn health_timeout(&self) -> Duration {
        Duration::from_secs(self.limits.health_timeout_secs)
    }

    /// Secret-store key of the database password for this ERP
    pub fn db_password_key(&self) -> String {
        format!("db_password_{}", self.erp)
    }
}

/// Split `host:port`, accepting a bracketed IPv6 host.
///
/// # Errors
///
/// `ConfigError::Invalid` when the host is empty or the port is not in
/// 1..=65535.
pub fn parse_listen_addr(addr: &str) -> Result<(String, u16), ConfigError> {
    let addr = addr.trim();
    if addr.is_empty() {
        return Err(ConfigError::Invalid("apiListen is required".to_string()));
    }
    let (host, port) = addr.rsplit_once(':').ok_or_else(|| {
        ConfigError::Invalid("apiListen must be in host:port format".to_string())
    })?;
    let host = host.trim_start_matches('[').trim_end_matches(']');
    if host.is_empty() {
        return Err(ConfigError::Invalid("apiListen host is required".to_string()));
    }
    match port.parse::<u16>() {
        Ok(port) if port > 0 => Ok((host.to_string(), port)),
        _ => Err(ConfigError::Invalid(
            "apiListen port must be between 1 and 65535".to_string(),
        )),
    }
}
