use clap::Parser;

use viewfinder::capture::XcapScreenSource;
use viewfinder::cli::{Cli, Commands};
use viewfinder::config;
use viewfinder::errors::ViewfinderResult;
use viewfinder::geometry::Direction;
use viewfinder::input::{ClickKind, EnigoPointer};
use viewfinder::session::{render_failure, Report, Session};

#[tokio::main]
async fn main() {
    // Logs go to stderr; stdout carries exactly one JSON document.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    if let Some(display) = &cli.display {
        std::env::set_var("DISPLAY", display);
    }

    match run(cli).await {
        Ok(report) => {
            println!("{}", report.render());
        }
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            println!("{}", render_failure(&e));
            std::process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> ViewfinderResult<Report> {
    let config = config::load_or_default()?;
    let pointer = EnigoPointer::new(config.pointer.settle_ms);
    let session = Session::new(config, Box::new(XcapScreenSource), Box::new(pointer));

    match cli.command {
        Commands::Start(args) => session.start(&args.selector()?).await,
        Commands::Zoom(args) => session.zoom(Direction::parse(&args.direction)?).await,
        Commands::Save(args) => session.save(&args.name).await,
        Commands::Click(args) => {
            let kind = ClickKind::parse(&args.click_type)?;
            let confidence = args.confidence()?;
            session.click(&args.name, kind, args.no_click, confidence).await
        }
        Commands::ClickCenter(args) => {
            let kind = ClickKind::parse(&args.click_type)?;
            session.click_center(kind, args.no_click).await
        }
        Commands::List => session.list().await,
        Commands::Delete(args) => session.delete(&args.name).await,
        Commands::Reset => session.reset().await,
        Commands::ListWindows => session.list_windows().await,
    }
}
