// Format selection: which ranking table to load for a league.
//
// Scoring format and league type are auto-detected from the league
// settings feed, with a persisted manual override that always wins until
// explicitly cleared. Dynasty/keeper detection drives whether rostered
// players join the taken set.

use crate::sleeper::{DraftInfo, LeagueInfo, Roster};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Sleeper league type code for dynasty.
const LEAGUE_TYPE_DYNASTY: u32 = 2;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringFormat {
    Standard,
    HalfPpr,
    Ppr,
}

impl ScoringFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoringFormat::Standard => "standard",
            ScoringFormat::HalfPpr => "half_ppr",
            ScoringFormat::Ppr => "ppr",
        }
    }
}

impl fmt::Display for ScoringFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeagueType {
    Standard,
    Superflex,
}

impl LeagueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeagueType::Standard => "standard",
            LeagueType::Superflex => "superflex",
        }
    }
}

impl fmt::Display for LeagueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The resolved format plus its provenance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FormatSelection {
    pub scoring: ScoringFormat,
    pub league_type: LeagueType,
    pub is_manual: bool,
}

// ---------------------------------------------------------------------------
// Auto-detection
// ---------------------------------------------------------------------------

/// Reception value → scoring format. Any unrecognized value falls back to
/// half-PPR; that is a documented default, not an error.
pub fn detect_scoring_format(rec_points: f64) -> ScoringFormat {
    if rec_points == 0.0 {
        ScoringFormat::Standard
    } else if rec_points == 0.5 {
        ScoringFormat::HalfPpr
    } else if rec_points == 1.0 {
        ScoringFormat::Ppr
    } else {
        ScoringFormat::HalfPpr
    }
}

/// More than one QB slot, or any SUPER_FLEX slot, means superflex.
pub fn detect_league_type(roster_positions: &[String]) -> LeagueType {
    let qb_count = roster_positions.iter().filter(|p| p.as_str() == "QB").count();
    let has_superflex = roster_positions.iter().any(|p| p.as_str() == "SUPER_FLEX");
    if qb_count > 1 || has_superflex {
        LeagueType::Superflex
    } else {
        LeagueType::Standard
    }
}

/// Detect both format axes from league info. A missing league falls back
/// to (half-PPR, superflex).
pub fn detect_league_format(league: Option<&LeagueInfo>) -> (ScoringFormat, LeagueType) {
    let Some(league) = league else {
        return (ScoringFormat::HalfPpr, LeagueType::Superflex);
    };
    let scoring = detect_scoring_format(league.scoring_settings.rec);
    let league_type = detect_league_type(&league.roster_positions);
    info!(
        "detected league format: {} {} (rec={})",
        scoring, league_type, league.scoring_settings.rec
    );
    (scoring, league_type)
}

// ---------------------------------------------------------------------------
// Dynasty / keeper detection
// ---------------------------------------------------------------------------

/// Whether rosters persist across seasons for this league.
///
/// True on any of: explicit dynasty league type, a taxi squad, keepers
/// actually in use on some roster (the configured maximum alone proves
/// nothing), or draft metadata tagged as dynasty scoring. A
/// previous-league link by itself is NOT sufficient; it must coincide
/// with another signal, otherwise ordinary annual re-draft leagues that
/// reuse a league record would be misclassified.
pub fn is_dynasty_or_keeper(
    league: &LeagueInfo,
    rosters: &[Roster],
    draft_info: Option<&DraftInfo>,
) -> bool {
    let settings = &league.settings;

    if settings.league_type == LEAGUE_TYPE_DYNASTY {
        info!("dynasty league detected: league type {}", settings.league_type);
        return true;
    }

    if settings.taxi_slots > 0 {
        info!("dynasty league detected: taxi_slots={}", settings.taxi_slots);
        return true;
    }

    if league.previous_league_id.is_some() && settings.max_keepers > 1 {
        info!("keeper league detected: previous league with max_keepers={}", settings.max_keepers);
        return true;
    }

    if settings.max_keepers > 0 {
        let actual_keepers: usize = rosters
            .iter()
            .map(|r| r.keepers.as_ref().map_or(0, Vec::len))
            .sum();
        if actual_keepers > 0 {
            info!("keeper league detected: {} keepers in use", actual_keepers);
            return true;
        }
    }

    if let Some(scoring_type) = draft_info
        .and_then(|d| d.metadata.scoring_type.as_deref())
    {
        if scoring_type.starts_with("dynasty") {
            info!("dynasty league detected: draft scoring type '{}'", scoring_type);
            return true;
        }
    }

    false
}

// ---------------------------------------------------------------------------
// FormatSelector with persisted manual override
// ---------------------------------------------------------------------------

/// Persisted shape of the manual override file.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredOverride {
    scoring: ScoringFormat,
    league_type: LeagueType,
}

/// Chooses the effective (scoring, league type) pair. A manual override,
/// once set, persists to disk and wins over auto-detection until cleared.
#[derive(Debug)]
pub struct FormatSelector {
    override_path: PathBuf,
    manual: Option<(ScoringFormat, LeagueType)>,
}

impl FormatSelector {
    /// Create a selector, loading any previously persisted override.
    pub fn load(override_path: &Path) -> Self {
        let manual = match std::fs::read_to_string(override_path) {
            Ok(text) => match serde_json::from_str::<Option<StoredOverride>>(&text) {
                Ok(stored) => stored.map(|s| {
                    info!("loaded manual format override: {} {}", s.scoring, s.league_type);
                    (s.scoring, s.league_type)
                }),
                Err(e) => {
                    warn!("ignoring unreadable override file {}: {}", override_path.display(), e);
                    None
                }
            },
            Err(_) => None,
        };
        FormatSelector {
            override_path: override_path.to_path_buf(),
            manual,
        }
    }

    pub fn manual_override(&self) -> Option<(ScoringFormat, LeagueType)> {
        self.manual
    }

    /// Set the manual override and persist it.
    pub fn set_manual(&mut self, scoring: ScoringFormat, league_type: LeagueType) -> std::io::Result<()> {
        self.manual = Some((scoring, league_type));
        let stored = StoredOverride {
            scoring,
            league_type,
        };
        let text = serde_json::to_string(&Some(stored)).unwrap_or_else(|_| "null".to_string());
        std::fs::write(&self.override_path, text)?;
        info!("set manual format override: {} {}", scoring, league_type);
        Ok(())
    }

    /// Clear the manual override (back to auto-detection) and persist.
    pub fn clear_manual(&mut self) -> std::io::Result<()> {
        self.manual = None;
        std::fs::write(&self.override_path, "null")?;
        info!("cleared manual format override");
        Ok(())
    }

    /// Resolve the effective format: the manual override unconditionally
    /// when set, otherwise auto-detection from the league feed.
    pub fn resolve(&self, league: Option<&LeagueInfo>) -> FormatSelection {
        match self.manual {
            Some((scoring, league_type)) => FormatSelection {
                scoring,
                league_type,
                is_manual: true,
            },
            None => {
                let (scoring, league_type) = detect_league_format(league);
                FormatSelection {
                    scoring,
                    league_type,
                    is_manual: false,
                }
            }
        }
    }
}
