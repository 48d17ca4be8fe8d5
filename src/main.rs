//! Command line entry point for matchforge
//!
//! Each invocation loads both domains from the data directory, runs one
//! command and stops the workers again. `shell` keeps the process alive and
//! reads commands from stdin, so a proposed match can be followed by its result.

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand, ValueEnum};
use matchforge::config::{AppConfig, SkillModelKind};
use matchforge::lanes::{format_lane_rating, parse_lane_ratings};
use matchforge::rating::{PartnerStats, PlayerStats};
use matchforge::service::AppState;
use matchforge::types::{LaneMatch, LanePlayerData, Match, MatchOutcome, PlayerId, Team};
use std::collections::BTreeSet;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};

/// Matchforge - skill ratings and balanced teams for game nights
#[derive(Parser)]
#[command(
    name = "matchforge",
    version,
    about = "Skill ratings, undoable rating history and balanced team splits",
    long_about = "Matchforge keeps skill ratings for a group of players, proposes balanced \
                 two-team splits from those ratings, and proposes 5v5 splits from per-lane \
                 strengths. Every rating change can be undone."
)]
struct Args {
    /// Configuration file path
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Path to configuration file (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Log level override
    #[arg(
        short,
        long,
        value_name = "LEVEL",
        help = "Override log level (trace, debug, info, warn, error)"
    )]
    log_level: Option<String>,

    /// Data directory override
    #[arg(long, value_name = "DIR", help = "Override the data directory")]
    data_dir: Option<PathBuf>,

    /// Undo history override
    #[arg(long, value_name = "N", help = "Override how many operations can be undone")]
    max_history: Option<usize>,

    /// Skill model override
    #[arg(long, value_name = "MODEL", help = "Skill model: trueskill or weng_lin")]
    skill_model: Option<SkillModelKind>,

    /// Seed override
    #[arg(long, value_name = "SEED", help = "Fix the seed used for tie-breaks")]
    seed: Option<u64>,

    /// Enable debug mode
    #[arg(short, long, help = "Enable debug mode with verbose logging")]
    debug: bool,

    #[command(subcommand)]
    command: TopCommand,
}

#[derive(Subcommand)]
enum TopCommand {
    /// Read commands from stdin until EOF or `quit`
    Shell,
    #[command(flatten)]
    Run(Command),
}

/// One line typed into the shell
#[derive(Parser)]
#[command(no_binary_name = true)]
struct ShellLine {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Clone)]
enum Command {
    /// Register a player, optionally with a starting mean
    Register {
        player_id: PlayerId,
        #[arg(long)]
        mean: Option<f64>,
    },
    /// Record a played match
    Outcome {
        #[arg(long, value_delimiter = ',', required = true)]
        winners: Vec<PlayerId>,
        #[arg(long, value_delimiter = ',', required = true)]
        losers: Vec<PlayerId>,
    },
    /// Record the result of the last proposed match
    Won {
        #[arg(value_enum)]
        team: Winner,
    },
    /// Undo the last rating change
    Undo,
    /// Show the last rating change
    Last,
    /// Show the undoable rating changes, oldest first
    History,
    /// List every player, strongest first
    List,
    /// Show one player's rating and record
    Stats { player_id: PlayerId },
    /// Show one player's record with and against everyone else
    Partners { player_id: PlayerId },
    /// Propose a balanced split of the given players
    Balance {
        #[arg(required = true)]
        players: Vec<PlayerId>,
    },
    /// Lane strengths and 5v5 proposals
    #[command(subcommand)]
    Lanes(LaneCommand),
    /// Print the collected metrics
    Metrics,
}

#[derive(Subcommand, Clone)]
enum LaneCommand {
    /// Set a player's top, jungle, mid, bot and support ratings (`?` for unknown)
    Set {
        player_id: PlayerId,
        #[arg(required = true, allow_hyphen_values = true)]
        ratings: Vec<String>,
    },
    /// List every player's lane ratings
    List,
    /// Propose 5v5 splits of exactly ten players
    Balance {
        #[arg(required = true)]
        players: Vec<PlayerId>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Winner {
    Team1,
    Team2,
}

impl From<Winner> for Team {
    fn from(winner: Winner) -> Self {
        match winner {
            Winner::Team1 => Team::Team1,
            Winner::Team2 => Team::Team2,
        }
    }
}

/// Initialize structured logging with the configured level
fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Load and merge configuration from environment and CLI arguments
fn load_config(args: &Args) -> Result<AppConfig> {
    // Start with environment-based config
    let mut config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path)?
    } else {
        AppConfig::from_env()?
    };

    // Apply CLI overrides
    if let Some(log_level) = &args.log_level {
        config.service.log_level = log_level.clone();
    }

    if args.debug {
        config.service.log_level = "debug".to_string();
    }

    if let Some(data_dir) = &args.data_dir {
        config.storage.data_dir = data_dir.clone();
    }

    if let Some(max_history) = args.max_history {
        config.storage.max_operation_history = max_history;
    }

    if let Some(skill_model) = args.skill_model {
        config.matchmaking.skill_model = skill_model;
    }

    if let Some(seed) = args.seed {
        config.matchmaking.rng_seed = Some(seed);
    }

    Ok(config)
}

fn format_win_rate(rate: Option<f64>) -> String {
    match rate {
        Some(rate) => format!("{:.0}%", rate * 100.0),
        None => "-".to_string(),
    }
}

fn print_player(stats: &PlayerStats) {
    println!(
        "{:>20}  mean {:>6.2}  std {:>5.2}  conservative {:>6.2}  {}W/{}L ({})",
        stats.player_id,
        stats.rating.mean,
        stats.rating.stddev,
        stats.rating.conservative_rating(),
        stats.games_won,
        stats.games_lost,
        format_win_rate(stats.win_rate())
    );
}

fn print_partner(stats: &PartnerStats) {
    println!(
        "{:>20}  with {}W/{}L ({})  against {}W/{}L ({})",
        stats.other_player_id,
        stats.games_won_with,
        stats.games_lost_with,
        format_win_rate(stats.win_rate_with()),
        stats.games_won_against,
        stats.games_lost_against,
        format_win_rate(stats.win_rate_against())
    );
}

fn format_team(players: &BTreeSet<PlayerId>) -> String {
    let ids: Vec<String> = players.iter().map(|id| id.to_string()).collect();
    ids.join(", ")
}

fn print_match(proposed: &Match) {
    println!("Team 1: {}", format_team(&proposed.team1));
    println!("Team 2: {}", format_team(&proposed.team2));
    if let Some(quality) = proposed.quality {
        println!("Quality: {:.1}%", quality * 100.0);
    }
}

fn print_outcome(outcome: &MatchOutcome) {
    println!(
        "Recorded: [{}] beat [{}]",
        format_team(outcome.winning_players()),
        format_team(outcome.losing_players())
    );
}

fn format_lanes(player: &LanePlayerData) -> String {
    let ratings: Vec<String> = player
        .lane_strength
        .iter()
        .map(|strength| format_lane_rating(*strength))
        .collect();
    ratings.join(" ")
}

fn print_lane_match(index: usize, candidate: &LaneMatch) {
    println!(
        "Option {}: lane diff {:+.1}, average diff {:+.1}, lane variance {:+.2}",
        index + 1,
        f64::from(candidate.max_strength_diff) / 10.0,
        f64::from(candidate.average_strength_diff) / 10.0,
        candidate.expected_lane_variance
    );
    let lanes = matchforge::types::Lane::ALL;
    for ((lane, blue), red) in lanes.iter().zip(&candidate.team1).zip(&candidate.team2) {
        println!("  {:<8} {:>20} vs {:<20}", lane.name(), blue.player_id, red.player_id);
    }
}

async fn run_command(app: &AppState, command: Command) -> Result<()> {
    match command {
        Command::Register { player_id, mean } => {
            app.ranking()
                .call(move |ranking| match mean {
                    Some(mean) => ranking.create_player(player_id, mean),
                    None => ranking.create_player_with_default_rating(player_id),
                })
                .await?;
            println!("Registered player {}", player_id);
        }
        Command::Outcome { winners, losers } => {
            let outcome = MatchOutcome::team1_won(Match::new(winners, losers, None)?);
            let recorded = outcome.clone();
            app.ranking()
                .call(move |ranking| ranking.record_outcome(outcome))
                .await?;
            print_outcome(&recorded);
        }
        Command::Won { team } => {
            let outcome = app
                .ranking()
                .call(move |ranking| ranking.record_last_match_outcome(team.into()))
                .await?;
            print_outcome(&outcome);
        }
        Command::Undo => {
            let undone = app.ranking().call(|ranking| ranking.undo_last()).await?;
            println!("Undid: {}", undone);
        }
        Command::Last => {
            let last = app
                .ranking()
                .call(|ranking| ranking.last_operation().map(|op| op.to_string()))
                .await?;
            println!("Last operation: {}", last);
        }
        Command::History => {
            let history = app
                .ranking()
                .submit(|ranking| {
                    ranking
                        .operation_history()
                        .map(|entry| entry.operation.to_string())
                        .collect::<Vec<_>>()
                })
                .await?;
            if history.is_empty() {
                println!("Nothing to undo");
            }
            for (i, operation) in history.iter().enumerate() {
                println!("{:>3}. {}", i + 1, operation);
            }
        }
        Command::List => {
            let players = app.ranking().submit(|ranking| ranking.leaderboard()).await?;
            for stats in &players {
                print_player(stats);
            }
        }
        Command::Stats { player_id } => {
            let stats = app
                .ranking()
                .call(move |ranking| ranking.player_stats(player_id))
                .await?;
            print_player(&stats);
        }
        Command::Partners { player_id } => {
            let partners = app
                .ranking()
                .call(move |ranking| ranking.partner_stats(player_id))
                .await?;
            for stats in &partners {
                print_partner(stats);
            }
        }
        Command::Balance { players } => {
            let roster: BTreeSet<PlayerId> = players.into_iter().collect();
            let proposed = app
                .ranking()
                .call(move |ranking| ranking.find_balanced_match(&roster))
                .await?;
            print_match(&proposed);
        }
        Command::Lanes(LaneCommand::Set { player_id, ratings }) => {
            let strengths = parse_lane_ratings(&ratings)?;
            app.lanes()
                .call(move |lanes| lanes.update_player_data(player_id, strengths))
                .await?;
            println!("Updated lanes for player {}", player_id);
        }
        Command::Lanes(LaneCommand::List) => {
            let players = app
                .lanes()
                .submit(|lanes| {
                    lanes
                        .all_player_data()
                        .into_iter()
                        .cloned()
                        .collect::<Vec<_>>()
                })
                .await?;
            for player in &players {
                println!("{:>20}  {}", player.player_id, format_lanes(player));
            }
        }
        Command::Lanes(LaneCommand::Balance { players }) => {
            let roster: BTreeSet<PlayerId> = players.into_iter().collect();
            let candidates = app
                .lanes()
                .call(move |lanes| lanes.find_match_candidates(&roster))
                .await?;
            if candidates.is_empty() {
                println!("Not every player has lane ratings");
            }
            for (i, candidate) in candidates.iter().enumerate() {
                print_lane_match(i, candidate);
            }
        }
        Command::Metrics => {
            print!("{}", app.metrics().render()?);
        }
    }
    Ok(())
}

async fn run_shell(app: &AppState) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let words: Vec<&str> = line.split_whitespace().collect();
        match words.first() {
            None => continue,
            Some(&"quit") | Some(&"exit") => break,
            Some(_) => {}
        }

        match ShellLine::try_parse_from(words) {
            Ok(parsed) => {
                if let Err(e) = run_command(app, parsed.command).await {
                    println!("Error: {}", e);
                }
            }
            Err(e) => println!("{}", e),
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Load configuration (CLI args can override environment/config file)
    let config = load_config(&args).unwrap_or_else(|e| {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    });

    // Initialize logging early (before any other operations)
    if let Err(e) = init_logging(&config.service.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    let app = match AppState::new(config) {
        Ok(state) => state,
        Err(e) => {
            error!("Failed to initialize application: {}", e);
            std::process::exit(1);
        }
    };
    info!("{} ready", app.config().service.name);

    let result = match args.command {
        TopCommand::Shell => run_shell(&app).await,
        TopCommand::Run(command) => run_command(&app, command).await,
    };

    app.shutdown().await?;
    result
}
