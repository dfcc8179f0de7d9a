//! homeoffice-admin CLI tool
//!
//! Maintains the user directory and drives periods on a running node.
//!
//! Usage:
//!   homeoffice-admin put-user <name> <email> <role> [--id <uuid>] [--inactive]
//!   homeoffice-admin list-users
//!   homeoffice-admin open-period <week_label> <start_date> <end_date>
//!   homeoffice-admin close-period <period_id> [--force]
//!   homeoffice-admin ping

use serde::{Deserialize, Serialize};
use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use std::path::PathBuf;

/// Admin command sent over the socket.
#[derive(Debug, Serialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
enum AdminCommand {
    PutUser {
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        name: String,
        email: String,
        role: String,
        active: bool,
    },
    ListUsers,
    OpenPeriod {
        week_label: String,
        start_date: String,
        end_date: String,
    },
    ClosePeriod {
        period_id: String,
        force: bool,
    },
    Ping,
}

/// Response from admin command.
#[derive(Debug, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum AdminResponse {
    Ok { message: String },
    Error { error: String },
    Users { items: Vec<UserLine> },
    Period { period: serde_json::Value },
    Closed { summary: serde_json::Value },
    ValidationRequired { report: ReportLines },
    Pong,
}

#[derive(Debug, Deserialize)]
struct UserLine {
    id: String,
    name: String,
    email: String,
    role: String,
    active: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReportLines {
    validation_errors: Vec<ProblemLine>,
    summary: String,
}

#[derive(Debug, Deserialize)]
struct ProblemLine {
    message: String,
    users: Vec<UserRef>,
}

#[derive(Debug, Deserialize)]
struct UserRef {
    name: String,
    role: String,
}

fn print_usage() {
    eprintln!("homeoffice-admin - Manage a home office voting node");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  homeoffice-admin put-user <name> <email> <role> [--id <uuid>] [--inactive]");
    eprintln!("                                          Add or replace a user");
    eprintln!("  homeoffice-admin list-users             List all users");
    eprintln!("  homeoffice-admin open-period <label> <start> <end>");
    eprintln!("                                          Open a period (dates as YYYY-MM-DD)");
    eprintln!("  homeoffice-admin close-period <id> [--force]");
    eprintln!("                                          Close a period");
    eprintln!("  homeoffice-admin ping                   Check if daemon is running");
    eprintln!();
    eprintln!("Roles: ADMIN, MANAGER, LEADER, LEADER_DEV, LEADER_PO, LEADER_INFRA, MEMBER");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  HOMEOFFICE_SOCKET        Path to admin socket");
    eprintln!("  HOMEOFFICE_ADMIN_SOCKET  Same path the node binds, used if HOMEOFFICE_SOCKET is unset");
    eprintln!("  HOMEOFFICE_DATA_DIR      Otherwise <dir>/admin.sock (default: ./homeoffice-data)");
}

/// Resolve the socket the same way the node picks where to bind it.
fn socket_path_from<F>(lookup: F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    lookup("HOMEOFFICE_SOCKET")
        .or_else(|| lookup("HOMEOFFICE_ADMIN_SOCKET"))
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            lookup("HOMEOFFICE_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./homeoffice-data"))
                .join("admin.sock")
        })
}

fn send_command(cmd: AdminCommand) -> Result<AdminResponse, String> {
    let socket_path = socket_path_from(|key| std::env::var(key).ok());

    let mut stream = UnixStream::connect(&socket_path).map_err(|e| {
        format!(
            "Failed to connect to homeoffice-node at {:?}: {}\n\
             Is the homeoffice-node running?",
            socket_path, e
        )
    })?;

    // Send command
    let cmd_json = serde_json::to_string(&cmd).map_err(|e| e.to_string())?;
    writeln!(stream, "{}", cmd_json).map_err(|e| e.to_string())?;

    // Read response
    let mut reader = BufReader::new(&stream);
    let mut response_line = String::new();
    reader
        .read_line(&mut response_line)
        .map_err(|e| e.to_string())?;

    serde_json::from_str(&response_line).map_err(|e| format!("Invalid response: {}", e))
}

fn fail(message: &str) -> ! {
    eprintln!("Error: {}", message);
    std::process::exit(1);
}

fn parse_put_user(args: &[String]) -> AdminCommand {
    if args.len() < 3 {
        fail("put-user requires <name> <email> <role>");
    }
    let mut id = None;
    let mut active = true;
    let mut rest = args[3..].iter();
    while let Some(flag) = rest.next() {
        match flag.as_str() {
            "--id" => match rest.next() {
                Some(value) => id = Some(value.clone()),
                None => fail("--id requires a value"),
            },
            "--inactive" => active = false,
            other => fail(&format!("unknown option {}", other)),
        }
    }
    AdminCommand::PutUser {
        id,
        name: args[0].clone(),
        email: args[1].clone(),
        role: args[2].clone(),
        active,
    }
}

fn print_pretty(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{}", text),
        Err(_) => println!("{}", value),
    }
}

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    let cmd = match args[1].as_str() {
        "put-user" => parse_put_user(&args[2..]),
        "list-users" => AdminCommand::ListUsers,
        "open-period" => {
            if args.len() < 5 {
                fail("open-period requires <label> <start> <end>");
            }
            AdminCommand::OpenPeriod {
                week_label: args[2].clone(),
                start_date: args[3].clone(),
                end_date: args[4].clone(),
            }
        }
        "close-period" => {
            if args.len() < 3 {
                fail("close-period requires a period id");
            }
            AdminCommand::ClosePeriod {
                period_id: args[2].clone(),
                force: args[3..].iter().any(|a| a == "--force"),
            }
        }
        "ping" => AdminCommand::Ping,
        "-h" | "--help" | "help" => {
            print_usage();
            std::process::exit(0);
        }
        other => {
            eprintln!("Unknown command: {}", other);
            print_usage();
            std::process::exit(1);
        }
    };

    match send_command(cmd) {
        Ok(response) => match response {
            AdminResponse::Ok { message } => {
                println!("{}", message);
            }
            AdminResponse::Error { error } => fail(&error),
            AdminResponse::Users { items } => {
                if items.is_empty() {
                    println!("(none)");
                }
                for user in items {
                    let status = if user.active { "" } else { " (inactive)" };
                    println!(
                        "{}  {:<12} {} <{}>{}",
                        user.id, user.role, user.name, user.email, status
                    );
                }
            }
            AdminResponse::Period { period } | AdminResponse::Closed { summary: period } => {
                print_pretty(&period);
            }
            AdminResponse::ValidationRequired { report } => {
                eprintln!("Period cannot be closed yet. {}", report.summary);
                for problem in report.validation_errors {
                    eprintln!("  - {}", problem.message);
                    for user in problem.users {
                        eprintln!("      {} ({})", user.name, user.role);
                    }
                }
                eprintln!("Re-run with --force to close anyway.");
                std::process::exit(2);
            }
            AdminResponse::Pong => {
                println!("pong - homeoffice-node is running");
            }
        },
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn path_with(vars: &[(&str, &str)]) -> PathBuf {
        let vars: HashMap<&str, &str> = vars.iter().copied().collect();
        socket_path_from(|key| vars.get(key).map(|v| v.to_string()))
    }

    #[test]
    fn socket_path_matches_node_binding() {
        assert_eq!(path_with(&[]), PathBuf::from("./homeoffice-data/admin.sock"));
        assert_eq!(
            path_with(&[("HOMEOFFICE_DATA_DIR", "/srv/homeoffice")]),
            PathBuf::from("/srv/homeoffice/admin.sock")
        );
        assert_eq!(
            path_with(&[
                ("HOMEOFFICE_DATA_DIR", "/srv/homeoffice"),
                ("HOMEOFFICE_ADMIN_SOCKET", "/run/homeoffice.sock"),
            ]),
            PathBuf::from("/run/homeoffice.sock")
        );
        assert_eq!(
            path_with(&[
                ("HOMEOFFICE_ADMIN_SOCKET", "/run/homeoffice.sock"),
                ("HOMEOFFICE_SOCKET", "/tmp/admin.sock"),
            ]),
            PathBuf::from("/tmp/admin.sock")
        );
    }
}
