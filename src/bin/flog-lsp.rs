use anyhow::Result;
use flog_lsp::config::Config;
use flog_lsp::lsp::server::serve;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_args_and_env()?;

    // stdout carries the protocol, so logs go to stderr
    env_logger::Builder::new()
        .filter_level(config.log_level)
        .parse_default_env()
        .target(env_logger::Target::Stderr)
        .init();

    serve(config).await
}
