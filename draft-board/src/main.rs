// Draft board entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file, stdout is for the board)
// 2. Load config
// 3. Build the Sleeper client and format selector
// 4. Build the draft service
// 5. Fetch and print the best-available board

use draft_board::config;
use draft_board::draft::service::{BestAvailableBoard, DraftService};
use draft_board::format::FormatSelector;
use draft_board::rankings::store::RankingsStore;
use draft_board::rankings::table::ParseOptions;
use draft_board::sleeper::SleeperClient;

use anyhow::Context;
use std::path::Path;
use std::time::Duration;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing (log to file, not the terminal)
    init_tracing()?;
    info!("draft board starting up");

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "config loaded: rankings dir {}, cache ttl {}s",
        config.rankings.directory, config.cache.ttl_secs
    );

    // 3. Format selector with any persisted manual override
    let selector = FormatSelector::load(Path::new(&config.draft.override_file));

    // 4. Build the draft service
    let store = RankingsStore::new(
        &config.rankings.directory,
        ParseOptions {
            include_defense: config.rankings.include_defense,
        },
    );
    let service = DraftService::new(
        SleeperClient::new(),
        store,
        selector,
        Duration::from_secs(config.cache.ttl_secs),
        config.draft.draft_id.clone(),
    );

    // 5. Fetch and print
    let board = service
        .best_available()
        .await
        .context("failed to build best-available board")?;
    print_board(&board);

    Ok(())
}

fn print_board(board: &BestAvailableBoard) {
    if let Some(name) = &board.league_name {
        println!("League: {name}");
    }
    if let (Some(scoring), Some(league_type)) = (board.scoring_format, board.league_type) {
        let source = if board.is_manual_format { "manual" } else { "auto" };
        println!("Format: {scoring} {league_type} ({source})");
    }
    if board.is_dynasty_keeper {
        println!(
            "Dynasty/keeper league: {} players hidden because already owned elsewhere",
            board.roster_filtered
        );
    }
    println!(
        "{} available, {} drafted",
        board.total_available, board.total_drafted
    );

    for (label, group) in [
        ("QB", &board.positions.qb),
        ("RB", &board.positions.rb),
        ("WR", &board.positions.wr),
        ("TE", &board.positions.te),
        ("K", &board.positions.k),
        ("FLEX", &board.positions.flex),
    ] {
        println!("\nTop {} {label}s", group.len());
        for slot in group {
            println!("{}) {} {} {}", slot.rank, slot.name, slot.position, slot.team);
        }
    }

    println!("\nTop {} Overall", board.positions.all.len());
    for slot in &board.positions.all {
        println!("{}) {} {} {}", slot.rank, slot.name, slot.position, slot.team);
    }
}

/// Initialize tracing to log to a file, keeping stdout clean for output.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("draftboard.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("draft_board=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
