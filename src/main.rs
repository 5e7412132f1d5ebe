use anyhow::Result;
use bang_shell::Interpreter;
use bang_shell::config::{DEFAULT_LOG_FILTER, Options};
use bang_shell::io_adapters::Terminal;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

fn init_logging(options: &Options) {
    let filter = match &options.log {
        Some(directives) => EnvFilter::new(directives),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
    };
    // Diagnostics go to stderr so they never mix with command output.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() -> Result<()> {
    let options: Options = argh::from_env();
    init_logging(&options);

    let mut shell = Interpreter::new(&options);
    if !options.no_signals {
        shell.install_signals()?;
    }

    let mut input = Terminal::new()?;
    shell.repl(&mut input, &mut std::io::stdout())?;
    tracing::info!("shell exiting");
    Ok(())
}
