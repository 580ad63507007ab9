// Ranking table loading and schema resolution.
//
// Ranking CSVs come from several sources with inconsistent headers, so all
// "any column name in, one shape out" ambiguity is isolated here: headers
// are resolved once against alias lists, and every row is converted into a
// strongly-typed RankingEntry or skipped with a warning.

use crate::rankings::identity::{canonical_team, PlayerIdentity, Position, FREE_AGENT};
use serde::Serialize;
use std::io::Read;
use std::path::Path;
use tracing::warn;

/// Sentinel rank/tier for "unranked / no tier assigned, least valuable."
pub const RANK_SENTINEL: f64 = 999.0;
pub const TIER_SENTINEL: u32 = 999;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// One row of a ranking source: a player identity plus its ranking data.
/// Immutable after parse; the whole table is rebuilt on refresh.
#[derive(Debug, Clone, Serialize)]
pub struct RankingEntry {
    pub player: PlayerIdentity,
    /// Absolute rank from the source, 1 = best. Lower is better.
    pub rank: f64,
    /// Coarse value grouping; `TIER_SENTINEL` when absent.
    pub tier: u32,
    /// Optional projection/auction value, when the source supplies one.
    pub value: Option<f64>,
}

/// An ordered ranking list, in source order. Sources are trusted to be
/// pre-sorted ascending by rank; the table never re-sorts.
#[derive(Debug, Clone, Default)]
pub struct RankingTable {
    entries: Vec<RankingEntry>,
}

impl RankingTable {
    pub fn new(entries: Vec<RankingEntry>) -> Self {
        RankingTable { entries }
    }

    pub fn entries(&self) -> &[RankingEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RankingEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Parsing options. `include_defense` keeps or drops team-defense rows;
/// the historical parser variant that excluded them is superseded, so the
/// default is to include.
#[derive(Debug, Clone, Copy)]
pub struct ParseOptions {
    pub include_defense: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            include_defense: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum RankingsError {
    #[error("failed to read rankings file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("missing required column `{0}` in rankings header")]
    MissingColumn(&'static str),

    #[error("rankings file not found for format {scoring} {league_type}: {path}")]
    FileNotFound {
        scoring: String,
        league_type: String,
        path: String,
    },
}

// ---------------------------------------------------------------------------
// Column resolution
// ---------------------------------------------------------------------------

// Header aliases, matched case-insensitively after trimming. First header
// that matches an alias wins.
const RANK_ALIASES: &[&str] = &["overall rank", "overall_rank", "rank", "rk", "ranking", "overall"];
const NAME_ALIASES: &[&str] = &["name", "player", "player name", "player_name", "full name", "full_name"];
const POSITION_ALIASES: &[&str] = &["position", "pos", "positions"];
const TEAM_ALIASES: &[&str] = &["team", "tm", "nfl team", "nfl_team"];
const TIER_ALIASES: &[&str] = &["tier", "tiers", "tier rank", "tier_rank"];
const VALUE_ALIASES: &[&str] = &[
    "value",
    "points",
    "fantasy points",
    "fantasy_points",
    "projected points",
    "projected_points",
    "auction value",
    "auction_value",
    "salary",
    "price",
];

/// Resolved column indexes for one ranking source's header row.
#[derive(Debug, Clone)]
struct ColumnMap {
    name: usize,
    position: usize,
    team: Option<usize>,
    rank: Option<usize>,
    tier: Option<usize>,
    value: Option<usize>,
}

fn find_column(headers: &csv::StringRecord, aliases: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|h| aliases.contains(&h.trim().to_lowercase().as_str()))
}

fn resolve_columns(headers: &csv::StringRecord) -> Result<ColumnMap, RankingsError> {
    let name = find_column(headers, NAME_ALIASES).ok_or(RankingsError::MissingColumn("name"))?;
    let position =
        find_column(headers, POSITION_ALIASES).ok_or(RankingsError::MissingColumn("position"))?;
    Ok(ColumnMap {
        name,
        position,
        team: find_column(headers, TEAM_ALIASES),
        rank: find_column(headers, RANK_ALIASES),
        tier: find_column(headers, TIER_ALIASES),
        value: find_column(headers, VALUE_ALIASES),
    })
}

// ---------------------------------------------------------------------------
// Field parsing helpers
// ---------------------------------------------------------------------------

fn field<'r>(record: &'r csv::StringRecord, idx: Option<usize>) -> Option<&'r str> {
    idx.and_then(|i| record.get(i)).map(str::trim)
}

fn parse_rank(raw: Option<&str>) -> f64 {
    match raw {
        Some(s) if !s.is_empty() && !s.eq_ignore_ascii_case("nan") => {
            s.parse::<f64>().unwrap_or(RANK_SENTINEL)
        }
        _ => RANK_SENTINEL,
    }
}

fn parse_tier(raw: Option<&str>, name: &str) -> u32 {
    match raw {
        Some(s) if !s.is_empty() && !s.eq_ignore_ascii_case("nan") => {
            // Tiers occasionally arrive as floats ("3.0") from spreadsheet
            // exports; accept those too.
            match s.parse::<u32>() {
                Ok(t) => t,
                Err(_) => match s.parse::<f64>() {
                    Ok(f) if f.is_finite() && f >= 0.0 => f.round() as u32,
                    _ => {
                        warn!("unparseable tier '{}' for '{}', using sentinel", s, name);
                        TIER_SENTINEL
                    }
                },
            }
        }
        _ => TIER_SENTINEL,
    }
}

fn parse_value(raw: Option<&str>, name: &str) -> Option<f64> {
    let s = raw?;
    if s.is_empty() || s.eq_ignore_ascii_case("nan") || s.eq_ignore_ascii_case("null") {
        return None;
    }
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() => Some(v),
        _ => {
            warn!("unparseable value '{}' for '{}', treating as absent", s, name);
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Reader-based loader (private, enables testing without temp files)
// ---------------------------------------------------------------------------

fn load_from_reader<R: Read>(rdr: R, opts: ParseOptions) -> Result<RankingTable, csv::Error> {
    let mut reader = csv::Reader::from_reader(rdr);
    let columns = match resolve_columns(reader.headers()?) {
        Ok(c) => c,
        Err(e) => {
            // A table-level schema failure produces an empty table here; the
            // path-based loader surfaces it as a proper error instead.
            warn!("rankings header resolution failed: {}", e);
            return Ok(RankingTable::default());
        }
    };

    let mut entries = Vec::new();
    for result in reader.records() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                warn!("skipping malformed rankings row: {}", e);
                continue;
            }
        };

        let name = match field(&record, Some(columns.name)) {
            Some(n) if !n.is_empty() => n.to_string(),
            _ => {
                warn!("skipping rankings row with no name");
                continue;
            }
        };

        let position = match field(&record, Some(columns.position)).and_then(Position::parse) {
            Some(p) => p,
            None => {
                warn!("skipping '{}': unrecognized position", name);
                continue;
            }
        };

        if position == Position::Dst && !opts.include_defense {
            continue;
        }

        let team = field(&record, columns.team)
            .map(canonical_team)
            .unwrap_or_else(|| FREE_AGENT.to_string());

        let rank = parse_rank(field(&record, columns.rank));
        let tier = parse_tier(field(&record, columns.tier), &name);
        let value = parse_value(field(&record, columns.value), &name);

        entries.push(RankingEntry {
            player: PlayerIdentity {
                name,
                team,
                position,
            },
            rank,
            tier,
            value,
        });
    }

    Ok(RankingTable::new(entries))
}

// ---------------------------------------------------------------------------
// Public loaders
// ---------------------------------------------------------------------------

/// Parse a ranking table from any reader. Rows are emitted in source order.
pub fn parse_rankings<R: Read>(rdr: R, opts: ParseOptions) -> Result<RankingTable, csv::Error> {
    load_from_reader(rdr, opts)
}

/// Load a ranking table from a CSV file. A bad header is a real error at
/// this level, unlike the reader-based parser which degrades to empty.
pub fn load_rankings(path: &Path, opts: ParseOptions) -> Result<RankingTable, RankingsError> {
    let bytes = std::fs::read(path).map_err(|e| RankingsError::Io {
        path: path.display().to_string(),
        source: e,
    })?;

    let mut header_reader = csv::Reader::from_reader(bytes.as_slice());
    let headers = header_reader.headers().map_err(|e| RankingsError::Csv {
        path: path.display().to_string(),
        source: e,
    })?;
    resolve_columns(headers)?;

    load_from_reader(bytes.as_slice(), opts).map_err(|e| RankingsError::Csv {
        path: path.display().to_string(),
        source: e,
    })
}
