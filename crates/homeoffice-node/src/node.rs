//! Home office node - the main application entry point.
//!
//! Architecture:
//! - Single daemon process with shared RocksDB storage
//! - HTTP API for clients (periods, nominations, votes, results)
//! - Unix admin socket for local operator commands (homeoffice-admin CLI)

use crate::admin_socket::AdminSocket;
use crate::api;
use crate::error::{Error, Result};
use crate::service::{Service, DEFAULT_GRANT_TTL_DAYS};
use crate::storage::Storage;
use homeoffice_tally::RolePolicy;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

/// Configuration for a home office node.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Data directory for storage
    pub data_dir: PathBuf,

    /// HTTP API listen address
    pub api_addr: SocketAddr,

    /// Admin socket path (for homeoffice-admin CLI)
    pub admin_socket: PathBuf,

    /// Roles allowed to nominate and vote
    pub voter_policy: RolePolicy,

    /// Days a tally grant stays redeemable
    pub grant_ttl_days: i64,
}

impl Default for NodeConfig {
    fn default() -> Self {
        let data_dir = PathBuf::from("./homeoffice-data");
        Self {
            admin_socket: data_dir.join("admin.sock"),
            data_dir,
            api_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            voter_policy: RolePolicy::default(),
            grant_ttl_days: DEFAULT_GRANT_TTL_DAYS,
        }
    }
}

impl NodeConfig {
    /// Create config from environment variables with sensible defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from any key lookup, falling back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let data_dir = lookup("HOMEOFFICE_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.data_dir);

        let api_addr = match lookup("HOMEOFFICE_API_ADDR") {
            Some(addr) => addr
                .parse()
                .map_err(|e| Error::Config(format!("Invalid HOMEOFFICE_API_ADDR {:?}: {}", addr, e)))?,
            None => defaults.api_addr,
        };

        let admin_socket = lookup("HOMEOFFICE_ADMIN_SOCKET")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("admin.sock"));

        let voter_policy = match lookup("HOMEOFFICE_VOTER_ROLES") {
            Some(roles) => RolePolicy::parse(&roles)
                .map_err(|e| Error::Config(format!("Invalid HOMEOFFICE_VOTER_ROLES: {}", e)))?,
            None => defaults.voter_policy,
        };

        let grant_ttl_days = match lookup("HOMEOFFICE_GRANT_TTL_DAYS") {
            Some(days) => days
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|d| *d > 0)
                .ok_or_else(|| {
                    Error::Config(format!("Invalid HOMEOFFICE_GRANT_TTL_DAYS {:?}", days))
                })?,
            None => defaults.grant_ttl_days,
        };

        Ok(Self {
            data_dir,
            api_addr,
            admin_socket,
            voter_policy,
            grant_ttl_days,
        })
    }
}

/// Shared state for the node - one service over one storage instance.
pub struct NodeState {
    pub service: Arc<Service>,
}

/// A home office node instance.
pub struct HomeOfficeNode {
    state: Arc<NodeState>,
    config: NodeConfig,
}

impl HomeOfficeNode {
    /// Create a new node, opening storage under the data directory.
    pub fn new(config: NodeConfig) -> Result<Self> {
        // Ensure data directory exists
        std::fs::create_dir_all(&config.data_dir)?;

        let storage = Arc::new(Storage::open(&config.data_dir)?);
        let service = Service::new(storage, config.voter_policy.clone())
            .with_grant_ttl(chrono::Duration::days(config.grant_ttl_days));

        let state = Arc::new(NodeState {
            service: Arc::new(service),
        });

        Ok(Self { state, config })
    }

    /// Get the shared state (for API handlers).
    pub fn state(&self) -> Arc<NodeState> {
        Arc::clone(&self.state)
    }

    /// Run the node (starts admin socket and HTTP server).
    pub async fn run(self) -> Result<()> {
        tracing::info!("Home office node starting");
        tracing::info!("  API: http://{}", self.config.api_addr);
        tracing::info!("  Admin: {:?}", self.config.admin_socket);
        tracing::info!("  Data: {:?}", self.config.data_dir);

        // Start admin socket server in background
        let admin_socket = AdminSocket::new(
            Arc::clone(&self.state.service),
            self.config.admin_socket.clone(),
        );
        tokio::spawn(async move {
            if let Err(e) = admin_socket.run().await {
                tracing::error!("Admin socket error: {}", e);
            }
        });

        // Build HTTP API
        let app = api::build_router(self.state());

        // Start HTTP server
        let listener = tokio::net::TcpListener::bind(self.config.api_addr).await?;
        tracing::info!("HTTP server listening on {}", self.config.api_addr);

        axum::serve(listener, app).await?;

        Ok(())
    }
}
