use anyhow::Result;
use clap::Parser;
use syncronet::cli::{AppContext, Cli, Commands};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing(ctx: &AppContext) {
    // RUST_LOG wins; otherwise warnings only, or debug with --verbose
    let fallback = if ctx.verbose { "syncronet=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(!ctx.no_color);

    // A second init (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::registry().with(filter).with(layer).try_init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Build a context once, pass everywhere
    let ctx = AppContext {
        quiet: cli.quiet,
        no_color: cli.no_color,
        dry_run: cli.dry_run,
        verbose: cli.verbose,
    };

    if ctx.no_color {
        owo_colors::set_override(false);
    }
    init_tracing(&ctx);

    match cli.command {
        Commands::Encode(args) => syncronet::encode_run(args, &ctx),
        Commands::Decode(args) => syncronet::decode_run(args, &ctx),
        Commands::Verify(args) => syncronet::verify_run(args, &ctx),
        Commands::Init(args) => syncronet::infra::config::init(args, &ctx),
        Commands::Completions(args) => syncronet::completion::run(args, &ctx),
    }
}
