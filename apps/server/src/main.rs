use anyhow::Context;
use kuwaiba::domain::config::ApiConfig;
use kuwaiba::kernel::config::load_config;
use kw_logger::Logger;
use kw_server::Server;

#[cfg(feature = "profiling")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

#[kw_runtime::main(high_performance)]
async fn main() -> anyhow::Result<()> {
    #[cfg(feature = "profiling")]
    let _profiler = dhat::Profiler::new_heap();

    let cfg: ApiConfig = load_config(Some("server")).context("Critical: Configuration is malformed")?;

    let logging = &cfg.logging;
    let builder = Logger::builder().name(env!("CARGO_PKG_NAME")).level_name(&logging.level);
    let builder = match &logging.filter {
        Some(filter) => builder.env_filter(filter),
        None => builder,
    };
    let _log = match &logging.directory {
        Some(dir) => builder.path(dir).max_files(logging.max_files).json(logging.json).init()?,
        None => builder.init()?,
    };

    Server::builder().config(cfg).build().await?.run().await
}
