use clap::Parser;
use miette::Result;
use relia::cli::{Cli, Commands, GlobalOpts};
use tracing_subscriber::EnvFilter;

/// Log to stderr; RELIA_LOG overrides the level picked from the flags
fn init_tracing(global: &GlobalOpts) {
    let level = if global.verbose {
        "debug"
    } else if global.quiet {
        "error"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_env("RELIA_LOG").unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    // Reset SIGPIPE to default behavior (terminate silently) for proper Unix piping.
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
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
    init_tracing(&global);

    match cli.command {
        Commands::Init(args) => relia::cli::commands::init::run(args),
        Commands::List(args) => relia::cli::commands::list::run(args, &global),
        Commands::Eval(args) => relia::cli::commands::eval::run(args, &global),
        Commands::Mc(args) => relia::cli::commands::mc::run(args, &global),
        Commands::Sens(args) => relia::cli::commands::sens::run(args, &global),
        Commands::Analyze(args) => relia::cli::commands::analyze::run(args, &global),
        Commands::Template(args) => relia::cli::commands::template::run(args, &global),
        Commands::Config(cmd) => relia::cli::commands::config::run(cmd, &global),
        Commands::Completions(args) => relia::cli::commands::completions::run(args),
    }
}
