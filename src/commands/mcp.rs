use crate::commands::Out;
use crate::mcp::{self, Io};
use crate::{Config, Mode, Result};

/// Serves the ledger tools to an MCP client over stdin/stdout until the client goes away.
pub async fn mcp(config: Config, mode: Mode) -> Result<Out<()>> {
    mcp::run_server(config, mode, Io::Stdio).await?;
    Ok("The MCP client disconnected, shutting down".into())
}
