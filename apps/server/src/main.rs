use anyhow::Context;
use cape::domain::config::ApiConfig;
use cape::kernel::config::load_config;
use cape_logger::{FileOutput, LevelFilter, LogFormat, Logger};
use cape_server::Server;
use std::str::FromStr;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg: ApiConfig =
        load_config(Some("server")).context("Critical: Configuration is malformed")?;

    let logging = &cfg.logging;
    let level = LevelFilter::from_str(&logging.level).context("Invalid logging.level")?;
    let format = LogFormat::from_str(&logging.format).context("Invalid logging.format")?;

    let mut logger = Logger::builder().name(env!("CARGO_PKG_NAME")).level(level).console(format);
    if let Some(directives) = &logging.directives {
        logger = logger.directives(directives);
    }
    if let Some(directory) = &logging.directory {
        logger = logger.file(FileOutput::new(directory).json(logging.json_files));
    }
    let _log = logger.init()?;

    Server::builder().config(cfg).build().await?.run().await
}
