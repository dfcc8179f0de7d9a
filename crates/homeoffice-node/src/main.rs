//! Home office node binary
//!
//! Serves the voting API and the local admin socket.

use homeoffice_node::{HomeOfficeNode, NodeConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "homeoffice_node=info,homeoffice_tally=info,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting home office node");

    let config = NodeConfig::from_env()?;

    // Create and run node
    let node = HomeOfficeNode::new(config)?;
    node.run().await?;

    Ok(())
}
