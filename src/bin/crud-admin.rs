// ABOUTME: Standalone admin panel server for an existing database
// ABOUTME: Reads configuration from the environment with command-line overrides
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # crud-admin Server Binary
//!
//! Serves the admin panel for the tables of one database until Ctrl-C.

use anyhow::Result;
use clap::Parser;
use crud_admin::{
    config::{environment::parse_model_list, ServerConfig},
    logging,
    server::run_server,
};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "crud-admin")]
#[command(about = "Admin panel with CRUD pages for the tables of a SQL database")]
pub struct Args {
    /// Override the database URL
    #[arg(long)]
    database_url: Option<String>,

    /// Override the listen host
    #[arg(long)]
    host: Option<String>,

    /// Override the HTTP port
    #[arg(long)]
    port: Option<u16>,

    /// Comma separated tables to expose; all tables when omitted
    #[arg(long)]
    models: Option<String>,

    /// Override the route the panel is mounted under
    #[arg(long)]
    route: Option<String>,

    /// Disable authentication
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    logging::init_from_env()?;

    let mut config = ServerConfig::from_env()?;
    if let Some(database_url) = args.database_url {
        config.database_url = database_url;
    }
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(models) = args.models {
        config.models = parse_model_list(&models);
    }
    if let Some(route) = args.route {
        config.admin.route = route;
    }
    if args.debug {
        config.admin.debug = true;
    }

    info!("Starting crud-admin");
    if let Err(e) = run_server(config).await {
        error!("Server failed: {e:#}");
        return Err(e);
    }
    Ok(())
}
