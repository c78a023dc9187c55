use crate::cli::ServeArgs;
use crate::config::Config;
use crate::server::{run_server, ServerConfig};
use anyhow::Result;

/// Handle serve command - run the HTTP gateway until interrupted
pub fn handle(cmd: &ServeArgs, config: &Config) -> Result<()> {
    let mut server_config = ServerConfig::from(config);
    if let Some(host) = &cmd.host {
        server_config.host = host.clone();
    }
    if let Some(port) = cmd.port {
        server_config.port = port;
    }

    run_server(&server_config, config)
}
