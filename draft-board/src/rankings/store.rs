// Rankings store: locating and loading the ranking table for a format,
// plus the background-refresh bookkeeping.
//
// The store never scrapes anything itself; the scraper is an external
// collaborator. What lives here is file selection, parsing, staleness
// checks, and the in-progress guard that stops overlapping refreshes.

use crate::format::{LeagueType, ScoringFormat};
use crate::rankings::table::{load_rankings, ParseOptions, RankingTable, RankingsError};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant, SystemTime};
use tracing::{info, warn};

/// How long a refresh may run before the in-progress flag is considered
/// stuck and can be force-reset. The refresh depends on a browser
/// automation collaborator that sometimes hangs.
pub const REFRESH_STUCK_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// Default maximum age before rankings are considered stale.
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(6 * 60 * 60);

// ---------------------------------------------------------------------------
// Refresh guard
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct RefreshState {
    in_progress: bool,
    started: Option<Instant>,
}

// ---------------------------------------------------------------------------
// RankingsStore
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct RankingsStore {
    dir: PathBuf,
    parse_options: ParseOptions,
    refresh: Mutex<RefreshState>,
    refresh_timeout: Duration,
}

impl RankingsStore {
    pub fn new(dir: impl Into<PathBuf>, parse_options: ParseOptions) -> Self {
        Self::with_refresh_timeout(dir, parse_options, REFRESH_STUCK_TIMEOUT)
    }

    /// Like `new`, but with a custom stuck-flag timeout.
    pub fn with_refresh_timeout(
        dir: impl Into<PathBuf>,
        parse_options: ParseOptions,
        refresh_timeout: Duration,
    ) -> Self {
        RankingsStore {
            dir: dir.into(),
            parse_options,
            refresh: Mutex::new(RefreshState::default()),
            refresh_timeout,
        }
    }

    /// The canonical rankings filename for a format pair.
    pub fn filename(scoring: ScoringFormat, league_type: LeagueType) -> String {
        format!("FantasyPros_Rankings_{}_{}.csv", scoring.as_str(), league_type.as_str())
    }

    /// Full path to the rankings file for a format pair.
    pub fn path_for(&self, scoring: ScoringFormat, league_type: LeagueType) -> PathBuf {
        self.dir.join(Self::filename(scoring, league_type))
    }

    /// Load the ranking table for a format pair. The whole table is
    /// rebuilt from the file on each call; callers cache the board, not
    /// the table.
    pub fn load(
        &self,
        scoring: ScoringFormat,
        league_type: LeagueType,
    ) -> Result<RankingTable, RankingsError> {
        let path = self.path_for(scoring, league_type);
        if !path.exists() {
            return Err(RankingsError::FileNotFound {
                scoring: scoring.to_string(),
                league_type: league_type.to_string(),
                path: path.display().to_string(),
            });
        }
        let table = load_rankings(&path, self.parse_options)?;
        info!(
            "loaded {} ranking entries from {}",
            table.len(),
            path.display()
        );
        Ok(table)
    }

    /// Whether the rankings file for a format is older than `max_age`
    /// (or missing entirely).
    pub fn should_update(
        &self,
        scoring: ScoringFormat,
        league_type: LeagueType,
        max_age: Duration,
    ) -> bool {
        let path = self.path_for(scoring, league_type);
        match file_age(&path) {
            Some(age) => age > max_age,
            None => true,
        }
    }

    /// Try to claim the refresh flag. Returns false when a refresh is
    /// already running, unless that refresh has exceeded the stuck
    /// timeout, in which case the flag is reclaimed.
    pub fn begin_refresh(&self) -> bool {
        let mut state = self.refresh.lock().unwrap_or_else(|e| e.into_inner());
        if state.in_progress {
            let stuck = state
                .started
                .is_some_and(|s| s.elapsed() > self.refresh_timeout);
            if !stuck {
                return false;
            }
            warn!("rankings refresh flag stuck past timeout, reclaiming");
        }
        state.in_progress = true;
        state.started = Some(Instant::now());
        true
    }

    /// Release the refresh flag.
    pub fn finish_refresh(&self) {
        let mut state = self.refresh.lock().unwrap_or_else(|e| e.into_inner());
        state.in_progress = false;
        state.started = None;
    }

    pub fn refresh_in_progress(&self) -> bool {
        self.refresh
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .in_progress
    }
}

fn file_age(path: &Path) -> Option<Duration> {
    let modified = std::fs::metadata(path).ok()?.modified().ok()?;
    SystemTime::now().duration_since(modified).ok()
}
