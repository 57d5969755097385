use oasbind::cli::run_cli;
use oasbind::logging::{init, LogConfig};

fn main() -> anyhow::Result<()> {
    // A subscriber may already be installed when embedded; logging is optional.
    if let Err(err) = init(&LogConfig::from_env()) {
        eprintln!("logging disabled: {err}");
    }
    run_cli()
}
