//! Connection parameters for the ERP's SQL Server

use std::time::Duration;

use erpgw_core_types::Sensitive;
use tiberius::{AuthMethod, Config, EncryptionLevel};

pub const DEFAULT_PORT: u16 = 1433;
pub const DEFAULT_MAX_OPEN: usize = 10;
pub const DEFAULT_MAX_LIFETIME: Duration = Duration::from_secs(30 * 60);
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct ConnectionParams {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub database: String,
    /// Named instance, resolved through the SQL Browser service
    pub instance: Option<String>,
    pub trust_cert: bool,
    pub max_open: usize,
    pub max_lifetime: Duration,
    pub connect_timeout: Duration,
    pub application_name: String,
}

impl Default for ConnectionParams {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: DEFAULT_PORT,
            user: String::new(),
            database: String::new(),
            instance: None,
            trust_cert: true,
            max_open: DEFAULT_MAX_OPEN,
            max_lifetime: DEFAULT_MAX_LIFETIME,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            application_name: "erpgw".to_string(),
        }
    }
}

impl ConnectionParams {
    /// Driver configuration with the password applied
    pub fn to_config(&self, password: &Sensitive<String>) -> Config {
        let mut config = Config::new();
        config.host(&self.host);
        config.port(self.port);
        if !self.database.is_empty() {
            config.database(&self.database);
        }
        if let Some(instance) = self.instance.as_deref().filter(|i| !i.trim().is_empty()) {
            config.instance_name(instance);
        }
        config.application_name(&self.application_name);
        config.authentication(AuthMethod::sql_server(&self.user, password.expose()));
        config.encryption(EncryptionLevel::Required);
        if self.trust_cert {
            config.trust_cert();
        }
        config
    }

    /// `host:port` (or `host\instance`) for log lines
    pub fn display_target(&self) -> String {
        match self.instance.as_deref().filter(|i| !i.trim().is_empty()) {
            Some(instance) => format!("{}\\{}", self.host, instance),
            None => format!("{}:{}", self.host, self.port),
        }
    }
}
