use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use itertools::Itertools;

use database::{DatabaseConfig, GameListing, MemoryStore, SqliteStore};
use explorer::{
    run_session, sign_in, ExplorerConfig, ExplorerError, GameFile, Outcome, PlayError,
    SessionReport,
};
use strategies::{InputStrategy, PerfectStrategy, RandomStrategy};
use types::{format_points, EntryPoint, Identity, JoinCode, Profile, Strategy};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "digital-explorer", about = "Play and author literacy scenario games")]
struct Params {
    /// YAML settings file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(long)]
    database_url: Option<String>,

    /// Who is playing
    #[arg(short, long)]
    user: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Join a game by its code
    Play {
        code: String,
        #[arg(long, conflicts_with = "review")]
        retry: bool,
        #[arg(long)]
        review: bool,
        #[arg(short, long, value_enum, default_value_t = StrategyKind::Input)]
        strategy: StrategyKind,
        /// Play a game definition file offline instead of the database
        #[arg(long)]
        game_file: Option<PathBuf>,
    },
    /// Publish a game from a YAML definition
    Create { file: PathBuf },
    /// Replace one of your games with a new YAML definition
    Edit { code: String, file: PathBuf },
    /// Delete one of your games
    Delete { code: String },
    /// List official and recent community games
    Games,
    Leaderboard,
    Profile {
        #[arg(long)]
        rename: Option<String>,
    },
    /// Show your score on a game
    Result { code: String },
    /// Flag a game for moderation
    Report { code: String, reason: String },
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand, Debug)]
enum AdminAction {
    /// Pending reports
    Reports,
    Dismiss { report_id: Uuid },
    /// Uphold a report by deleting the reported game
    Delete { report_id: Uuid },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum StrategyKind {
    Input,
    Random,
    Perfect,
}

impl StrategyKind {
    fn build(self) -> Box<dyn Strategy> {
        match self {
            StrategyKind::Input => Box::new(InputStrategy::new()),
            StrategyKind::Random => Box::new(RandomStrategy::default()),
            StrategyKind::Perfect => Box::new(PerfectStrategy::default()),
        }
    }
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let args = Params::parse();
    log::info!("args: {args:?}");
    if let Err(err) = run(args).await {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

async fn run(args: Params) -> Result<(), ExplorerError> {
    let config = match &args.config {
        Some(path) => ExplorerConfig::load(path)?,
        None => ExplorerConfig::default(),
    };

    if let Command::Play {
        code,
        retry,
        review,
        strategy,
        game_file: Some(path),
    } = &args.command
    {
        return play_offline(&args, &config, path, code, entry_point(*retry, *review), *strategy)
            .await;
    }

    let db_config =
        DatabaseConfig::from_cli_or_env_or_yaml(args.database_url.clone(), config.database_url.clone());
    let mut store = SqliteStore::connect(&db_config).await?;
    let profile = sign_in(&store, args.user.as_deref(), &config).await?;

    match args.command {
        Command::Play {
            code,
            retry,
            review,
            strategy,
            game_file: None,
        } => {
            let mut strategy = strategy.build();
            let identity = profile.as_ref().map(Profile::identity);
            let report = run_session(
                &mut store,
                identity,
                &code,
                entry_point(retry, review),
                strategy.as_mut(),
            )
            .await;
            print_report(report)?;
        }
        Command::Play { .. } => {}
        Command::Create { file } => {
            let profile = require(profile)?;
            let draft = GameFile::load(&file)?.draft;
            let game = store.create_game(profile.id, draft).await?;
            println!("Created {} with join code {}", game.title, game.game_code);
        }
        Command::Edit { code, file } => {
            let profile = require(profile)?;
            let game = lookup(&mut store, &code).await?;
            let draft = GameFile::load(&file)?.draft;
            let reset = store.update_game(profile.id, game.id, draft).await?;
            println!("Updated {} ({reset:?} progress reset)", game.title);
        }
        Command::Delete { code } => {
            let profile = require(profile)?;
            let game = lookup(&mut store, &code).await?;
            store.delete_game(&profile, game.id).await?;
            println!("Deleted {}", game.title);
        }
        Command::Games => {
            let catalog = store.list_games(profile.as_ref().map(|p| p.id)).await?;
            println!("Official games:\n{}", render_listings(&catalog.official));
            println!("Community games:\n{}", render_listings(&catalog.community));
        }
        Command::Leaderboard => {
            let board = store.leaderboard().await?;
            println!(
                "{}",
                board
                    .iter()
                    .map(|entry| format!(
                        "{:>2}. {:<20} {:>10} XP",
                        entry.rank,
                        entry.username,
                        format_points(entry.total_xp)
                    ))
                    .join("\n")
            );
        }
        Command::Profile { rename } => {
            let mut profile = require(profile)?;
            if let Some(name) = rename {
                profile = store.update_username(profile.id, &name).await?;
            }
            println!(
                "{} ({}) has {} XP",
                profile.username,
                profile.role,
                format_points(profile.total_xp)
            );
            let games = store.games_by_creator(profile.id).await?;
            if !games.is_empty() {
                println!(
                    "Created games:\n{}",
                    games
                        .iter()
                        .map(|g| format!(
                            "  {} {} (played {} times)",
                            g.game_code, g.title, g.play_count
                        ))
                        .join("\n")
                );
            }
        }
        Command::Result { code } => {
            let profile = require(profile)?;
            let code = parse_code(&code)?;
            match store.score_with_title(profile.id, &code).await? {
                Some(score) => println!(
                    "{}: {} XP across {} scenarios",
                    score.game_title,
                    format_points(score.score_achieved),
                    score.scenario_count
                ),
                None => println!("No score yet for {code}"),
            }
        }
        Command::Report { code, reason } => {
            let profile = require(profile)?;
            let game = lookup(&mut store, &code).await?;
            let report = store.submit_report(profile.id, game.id, &reason).await?;
            println!("Reported {} (report {})", game.title, report.id);
        }
        Command::Admin { action } => {
            let profile = require(profile)?;
            match action {
                AdminAction::Reports => {
                    let reports = store.pending_reports(profile.id).await?;
                    if reports.is_empty() {
                        println!("No pending reports");
                    }
                    for pending in reports {
                        println!(
                            "{} | {} {} | {}",
                            pending.report.id,
                            pending
                                .game_code
                                .map(|c| c.to_string())
                                .unwrap_or_else(|| "-".to_string()),
                            pending.game_title.unwrap_or_else(|| "(deleted)".to_string()),
                            pending.report.reason
                        );
                    }
                }
                AdminAction::Dismiss { report_id } => {
                    store.dismiss_report(profile.id, report_id).await?;
                    println!("Dismissed report {report_id}");
                }
                AdminAction::Delete { report_id } => {
                    let deleted = store
                        .resolve_report_by_deleting(profile.id, report_id)
                        .await?;
                    match deleted {
                        Some(game_id) => println!("Deleted game {game_id}"),
                        None => println!("Report {report_id} resolved; its game was already gone"),
                    }
                }
            }
        }
    }
    Ok(())
}

async fn play_offline(
    args: &Params,
    config: &ExplorerConfig,
    path: &std::path::Path,
    code: &str,
    entry: EntryPoint,
    strategy: StrategyKind,
) -> Result<(), ExplorerError> {
    let game = GameFile::load(path)?.into_game(code)?;
    log::info!("Loaded {game} from {}", path.display());
    let mut store = MemoryStore::new();
    store.insert_game(game);

    let identity = args
        .user
        .as_deref()
        .or(config.default_user.as_deref())
        .map(|name| Identity::new(Uuid::new_v4(), name));
    let mut strategy = strategy.build();
    let report = run_session(&mut store, identity, code, entry, strategy.as_mut()).await;
    print_report(report)
}

fn entry_point(retry: bool, review: bool) -> EntryPoint {
    match (retry, review) {
        (_, true) => EntryPoint::Review,
        (true, false) => EntryPoint::Retry,
        (false, false) => EntryPoint::Play,
    }
}

fn require(profile: Option<Profile>) -> Result<Profile, ExplorerError> {
    profile.ok_or(ExplorerError::Play(PlayError::Unauthenticated))
}

fn parse_code(code: &str) -> Result<JoinCode, ExplorerError> {
    JoinCode::parse(code).map_err(|_| PlayError::GameNotFound(code.trim().to_string()).into())
}

async fn lookup(store: &mut SqliteStore, code: &str) -> Result<types::Game, ExplorerError> {
    use database::GameStore;

    let join_code = parse_code(code)?;
    store
        .fetch_game_by_code(&join_code)
        .await?
        .ok_or_else(|| PlayError::GameNotFound(join_code.to_string()).into())
}

fn render_listings(listings: &[GameListing]) -> String {
    if listings.is_empty() {
        return "  (none)".to_string();
    }
    listings
        .iter()
        .map(|listing| {
            format!(
                "  {} {} {} [{}] by {}",
                if listing.completed { "[x]" } else { "[ ]" },
                listing.game.game_code,
                listing.game.title,
                listing.game.game_type,
                listing.game.creator_username.as_deref().unwrap_or("unknown")
            )
        })
        .join("\n")
}

fn print_report(report: Result<SessionReport, PlayError>) -> Result<(), ExplorerError> {
    let report = match report {
        Ok(report) => report,
        Err(PlayError::AlreadyCompleted(done)) => {
            println!("{done}. Play again with --retry for reduced XP, or --review.");
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };

    for notice in &report.notices {
        println!("Notice: {notice}");
    }
    match report.outcome {
        Outcome::Completed(finalized) => {
            println!(
                "Game complete! Score {} ({} XP earned this run, {} reward)",
                format_points(finalized.result.score),
                format_points(finalized.xp_granted),
                finalized.result.policy
            );
        }
        Outcome::Failed { score } => {
            println!("Out of HP with {} XP. Try again with --retry.", format_points(score));
        }
        Outcome::Abandoned { index } => {
            println!("Progress saved at scenario {}. Come back any time.", index + 1);
        }
    }
    Ok(())
}
