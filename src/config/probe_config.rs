//! Probe configuration derived from CLI arguments

use std::fmt;
use std::time::Duration;

use super::cli::{CliArgs, OutputFormat};
use crate::client::ConnectionFactory;

/// Resolved server address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerAddress {
    pub host: String,
    pub port: u16,
}

impl fmt::Display for ServerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Complete probe configuration
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    // Connection
    pub address: ServerAddress,
    pub auth: Option<String>,
    pub dbnum: u32,
    pub timeout: Duration,

    // Items
    pub hostname: String,
    pub response_check_key: Option<String>,
    pub discovery_only: bool,
    pub queue_size: usize,

    // Output
    pub output_format: OutputFormat,
    pub quiet: bool,
    pub verbose: bool,
}

impl ProbeConfig {
    /// Create configuration from CLI arguments
    pub fn from_cli(args: &CliArgs) -> Result<Self, String> {
        args.validate()?;

        // Empty credential behaves like no credential
        let auth = args.password.clone().filter(|p| !p.is_empty());

        let hostname = args
            .hostname
            .clone()
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| args.host.clone());

        Ok(Self {
            address: ServerAddress {
                host: args.host.clone(),
                port: args.port,
            },
            auth,
            dbnum: args.db,
            timeout: Duration::from_secs(args.timeout_secs),

            hostname,
            response_check_key: args.response_check_key.clone(),
            discovery_only: args.discovery,
            queue_size: args.queue_size,

            output_format: args.output_format,
            quiet: args.quiet,
            verbose: args.verbose,
        })
    }

    /// Connection factory using the configured timeout for connect, read and write
    pub fn connection_factory(&self) -> ConnectionFactory {
        ConnectionFactory {
            connect_timeout: self.timeout,
            read_timeout: self.timeout,
            write_timeout: self.timeout,
            auth_password: self.auth.clone(),
            dbnum: self.dbnum,
        }
    }
}
