use clap::Parser;
use miette::Result;
use tracing_subscriber::EnvFilter;

use bmt::cli::{Cli, Commands};

/// Route library diagnostics to stderr when `--verbose` is given
fn init_tracing(verbose: bool) {
    if verbose {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

fn main() -> Result<()> {
    // Reset SIGPIPE to default behavior (terminate silently) for proper Unix piping.
    // Without this, piping to `head`, `grep -q`, etc. causes a panic on broken pipe.
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
    // Install miette's fancy error handler for beautiful diagnostics
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let global = cli.global;
    init_tracing(global.verbose);

    match cli.command {
        Commands::Chars(args) => bmt::cli::commands::chars::run(args, &global),
        Commands::Describe(args) => bmt::cli::commands::describe::run(args, &global),
        Commands::Compare(args) => bmt::cli::commands::compare::run(args, &global),
        Commands::Planes(args) => bmt::cli::commands::planes::run(args, &global),
        Commands::Laser(args) => bmt::cli::commands::laser::run(args, &global),
        Commands::Repeat(args) => bmt::cli::commands::repeat::run(args, &global),
        Commands::Export(args) => bmt::cli::commands::export::run(args, &global),
        Commands::Completions(args) => bmt::cli::commands::completions::run(args),
    }
}
