use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use inkboard::{App, AppConfig, Config, Now, Publisher, ScreenOutcome};

#[derive(Parser, Debug)]
#[command(name = "inkboard", version)]
struct Cli {
    /// Log at debug level.
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render every app and swap the catalog in atomically.
    Publish(PublishArgs),
    /// Render a single screen to a PNG without touching the catalog.
    Screen(ScreenArgs),
    /// Print this week's quiz track and reveal stage.
    Quiz(QuizArgs),
}

#[derive(Parser, Debug)]
struct PublishArgs {
    /// Configuration JSON.
    #[arg(long)]
    config: PathBuf,

    /// Render as of this RFC 3339 time instead of now.
    #[arg(long)]
    at: Option<String>,
}

#[derive(Parser, Debug)]
struct ScreenArgs {
    /// Configuration JSON.
    #[arg(long)]
    config: PathBuf,

    /// App index in the configuration.
    #[arg(long)]
    app: usize,

    /// Screen index (0-based).
    #[arg(long, default_value_t = 0)]
    screen: usize,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Render as of this RFC 3339 time instead of now.
    #[arg(long)]
    at: Option<String>,
}

#[derive(Parser, Debug)]
struct QuizArgs {
    /// Configuration JSON.
    #[arg(long)]
    config: PathBuf,

    /// Evaluate as of this RFC 3339 time instead of now.
    #[arg(long)]
    at: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if cli.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .init();

    match cli.cmd {
        Command::Publish(args) => cmd_publish(args),
        Command::Screen(args) => cmd_screen(args),
        Command::Quiz(args) => cmd_quiz(args),
    }
}

fn parse_now(at: Option<&str>) -> anyhow::Result<Now> {
    match at {
        Some(s) => chrono::DateTime::parse_from_rfc3339(s)
            .with_context(|| format!("parse --at '{s}' as RFC 3339")),
        None => Ok(chrono::Local::now().fixed_offset()),
    }
}

fn cmd_publish(args: PublishArgs) -> anyhow::Result<()> {
    let now = parse_now(args.at.as_deref())?;
    let config = Config::from_path(&args.config)?;
    let apps = config.build_apps()?;
    let mut res = config.build_resources()?;
    tracing::info!(apps = apps.len(), now = %now, "starting publish");

    let result = Publisher::new(&config.catalog_dir).publish_all(&apps, &now, &mut res)?;

    eprintln!(
        "published {} ({} rendered, {} reused, {} retained, {} placeholders)",
        result.catalog.display(),
        result.count(ScreenOutcome::Rendered),
        result.count(ScreenOutcome::Reused),
        result.count(ScreenOutcome::Retained),
        result.count(ScreenOutcome::Placeholder),
    );
    Ok(())
}

fn cmd_screen(args: ScreenArgs) -> anyhow::Result<()> {
    let now = parse_now(args.at.as_deref())?;
    let config = Config::from_path(&args.config)?;
    let entry = config.apps.get(args.app).with_context(|| {
        format!("no app {} (config lists {})", args.app, config.apps.len())
    })?;
    let app = config.build_app(entry)?;
    let mut res = config.build_resources()?;
    let raster = app.render(args.screen, &now, &mut res)?;

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(&args.out, raster.to_png()?)
        .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_quiz(args: QuizArgs) -> anyhow::Result<()> {
    let now = parse_now(args.at.as_deref())?;
    let config = Config::from_path(&args.config)?;
    let entry = config
        .apps
        .iter()
        .find(|app| matches!(app, AppConfig::HikingQuiz(_)))
        .context("config has no hiking_quiz app")?;
    let App::HikingQuiz(quiz) = config.build_app(entry)? else {
        anyhow::bail!("hiking_quiz entry did not build a quiz app");
    };

    let plan = quiz.plan(&now)?;
    println!("{}", serde_json::to_string_pretty(&plan)?);
    Ok(())
}
