use anyhow::{Context, Result};
use noop_lifecycle::cli::parse_args;
use noop_lifecycle::config::{load_config, load_config_from_path};
use noop_lifecycle::engine;
use noop_lifecycle::observability::{init_logging, install_panic_hook};
use noop_lifecycle::provider;
use noop_lifecycle::serializer::{DryRunWriter, InPlaceWriter, Serializer};

fn main() -> Result<()> {
    let cli = parse_args();
    init_logging(cli.verbosity);
    install_panic_hook();

    let config = match &cli.config {
        Some(path) => load_config_from_path(path)?,
        None => load_config(&cli.root)?,
    };
    let provider = provider::from_config(&config.provider)?;

    let serializer: Box<dyn Serializer> = if cli.dry_run {
        Box::new(DryRunWriter)
    } else {
        Box::new(InPlaceWriter::new(&cli.root))
    };

    let summary = engine::run(&cli.root, &config, provider.as_ref(), serializer.as_ref())
        .with_context(|| format!("rewriting {}", cli.root.display()))?;
    log::debug!("{:?}", summary);
    Ok(())
}
