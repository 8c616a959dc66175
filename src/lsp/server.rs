use anyhow::Result;
use tokio::io::{stdin, stdout};
use tower_lsp::{LspService, Server};

use crate::lsp::backend::Backend;
use crate::lsp::session::Session;
use crate::scoring::FlogCommand;
use crate::Config;

/// Start the LSP server
pub async fn serve(config: Config) -> Result<()> {
    log::info!("flog-lsp version {} starting...", env!("CARGO_PKG_VERSION"));
    log::debug!("Scoring with flog under {}", config.ruby_program.display());

    let scorer = FlogCommand::new(config.ruby_program.clone());
    let (service, socket) =
        LspService::build(move |client| Backend::new(client, Session::with_flog(scorer))).finish();

    // One message at a time: edits must land before the diagnostics that follow them
    Server::new(stdin(), stdout(), socket)
        .concurrency_level(1)
        .serve(service)
        .await;

    Ok(())
}
