//! Unix socket server for admin commands.
//!
//! Provides a local IPC interface for maintaining the user directory and
//! driving the period lifecycle. One JSON command per line, one JSON response
//! per line.

use crate::error::{Error, Result};
use crate::models::{Period, User};
use crate::service::{CloseRequest, ClosureSummary, OpenPeriodRequest, Service};
use chrono::NaiveDate;
use homeoffice_tally::{ClosureReport, Role};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use uuid::Uuid;

/// Admin command sent over the socket.
#[derive(Debug, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum AdminCommand {
    /// Add or replace a directory user
    PutUser {
        #[serde(default)]
        id: Option<Uuid>,
        name: String,
        email: String,
        role: String,
        #[serde(default = "default_active")]
        active: bool,
    },
    /// List directory users
    ListUsers,
    /// Open a voting period
    OpenPeriod {
        week_label: String,
        start_date: NaiveDate,
        end_date: NaiveDate,
    },
    /// Close a period, optionally skipping validation
    ClosePeriod {
        period_id: Uuid,
        #[serde(default)]
        force: bool,
    },
    /// Ping (health check)
    Ping,
}

fn default_active() -> bool {
    true
}

/// Response from admin command.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AdminResponse {
    Ok { message: String },
    Error { error: String },
    Users { items: Vec<User> },
    Period { period: Period },
    Closed { summary: ClosureSummary },
    ValidationRequired { report: ClosureReport },
    Pong,
}

/// Admin socket server.
pub struct AdminSocket {
    service: Arc<Service>,
    socket_path: PathBuf,
}

impl AdminSocket {
    /// Create a new admin socket server.
    pub fn new(service: Arc<Service>, socket_path: PathBuf) -> Self {
        Self {
            service,
            socket_path,
        }
    }

    /// Run the admin socket server.
    pub async fn run(&self) -> Result<()> {
        // Remove existing socket file if present
        let _ = std::fs::remove_file(&self.socket_path);

        let listener = UnixListener::bind(&self.socket_path)?;
        tracing::info!("Admin socket listening on {:?}", self.socket_path);

        loop {
            match listener.accept().await {
                Ok((stream, _)) => {
                    let service = Arc::clone(&self.service);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, service).await {
                            tracing::error!("Admin connection error: {}", e);
                        }
                    });
                }
                Err(e) => {
                    tracing::error!("Failed to accept admin connection: {}", e);
                }
            }
        }
    }

    /// Get the socket path.
    pub fn socket_path(&self) -> &PathBuf {
        &self.socket_path
    }
}

async fn handle_connection(stream: UnixStream, service: Arc<Service>) -> Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    while reader.read_line(&mut line).await? > 0 {
        let response = match serde_json::from_str::<AdminCommand>(&line) {
            Ok(cmd) => execute_command(cmd, &service),
            Err(e) => AdminResponse::Error {
                error: format!("Invalid command: {}", e),
            },
        };

        let response_json = serde_json::to_string(&response)? + "\n";
        writer.write_all(response_json.as_bytes()).await?;
        line.clear();
    }

    Ok(())
}

fn execute_command(cmd: AdminCommand, service: &Service) -> AdminResponse {
    match cmd {
        AdminCommand::PutUser {
            id,
            name,
            email,
            role,
            active,
        } => {
            let result = role.parse::<Role>().map_err(Error::from).and_then(|role| {
                let mut user = User::new(name, email, role);
                if let Some(id) = id {
                    user.id = id;
                }
                user.active = active;
                service.put_user(&user).map(|()| user)
            });
            match result {
                Ok(user) => AdminResponse::Ok {
                    message: format!("Stored user {} ({}, {})", user.name, user.id, user.role),
                },
                Err(e) => AdminResponse::Error {
                    error: e.to_string(),
                },
            }
        }

        AdminCommand::ListUsers => match service.list_users() {
            Ok(items) => AdminResponse::Users { items },
            Err(e) => AdminResponse::Error {
                error: e.to_string(),
            },
        },

        AdminCommand::OpenPeriod {
            week_label,
            start_date,
            end_date,
        } => {
            let request = OpenPeriodRequest {
                week_label,
                start_date,
                end_date,
            };
            match service.open_period(request, None) {
                Ok(period) => AdminResponse::Period { period },
                Err(e) => AdminResponse::Error {
                    error: e.to_string(),
                },
            }
        }

        AdminCommand::ClosePeriod { period_id, force } => {
            let request = CloseRequest {
                force,
                actor_id: None,
            };
            match service.close_period(period_id, request) {
                Ok(summary) => AdminResponse::Closed { summary },
                Err(Error::ValidationRequired(report)) => AdminResponse::ValidationRequired { report },
                Err(e) => AdminResponse::Error {
                    error: e.to_string(),
                },
            }
        }

        AdminCommand::Ping => AdminResponse::Pong,
    }
}
