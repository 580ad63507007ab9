// Player identity: normalized names, canonical teams, and the matching
// relation used to decide whether two loosely-identified players are the
// same person.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Sentinel team code for a player with no known team.
pub const FREE_AGENT: &str = "FA";

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// Fantasy football positions. Team defenses arrive from ranking sources
/// as "DST", "D/ST", or "DEF" and are unified to `Dst`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Position {
    QB,
    RB,
    WR,
    TE,
    K,
    Dst,
}

impl Position {
    /// Parse a position string, stripping any trailing digits first.
    ///
    /// Ranking feeds sometimes suffix the position with a positional rank
    /// ("RB1", "WR12"); the digits must be removed before the position is
    /// stored or compared. Parsing is case-insensitive.
    pub fn parse(raw: &str) -> Option<Self> {
        let stripped: String = raw
            .trim()
            .trim_end_matches(|c: char| c.is_ascii_digit())
            .to_uppercase();
        match stripped.as_str() {
            "QB" => Some(Position::QB),
            "RB" => Some(Position::RB),
            "WR" => Some(Position::WR),
            "TE" => Some(Position::TE),
            "K" => Some(Position::K),
            "DST" | "D/ST" | "DEF" => Some(Position::Dst),
            _ => None,
        }
    }

    pub fn display_str(&self) -> &'static str {
        match self {
            Position::QB => "QB",
            Position::RB => "RB",
            Position::WR => "WR",
            Position::TE => "TE",
            Position::K => "K",
            Position::Dst => "DST",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_str())
    }
}

// ---------------------------------------------------------------------------
// Name normalization
// ---------------------------------------------------------------------------

/// Canonicalize a free-text player name into a compact comparison key.
///
/// The replacement order matters: suffix removal happens before
/// uppercasing, and nickname rewrites happen before punctuation removal.
/// Known limitations preserved on purpose: "IV" suffixes are not handled,
/// and the KENNETH/GABRIEL rewrites are plain substring replaces rather
/// than word-boundary aware (a surname containing "GABRIEL" would also be
/// rewritten).
pub fn normalize_name(name: &str) -> String {
    let mut s = name.replace("III", "").replace("II", "");
    s = s.to_uppercase();
    s = s.replace("KENNETH", "KEN").replace("GABRIEL", "GABE");
    s = s.replace('\'', "").replace('\u{2019}', "");
    s = s.replace("JR", "").replace("SR", "");
    s = s.replace('.', "");
    s = s.replace(' ', "");
    s = s.replace('/', "");
    s
}

// ---------------------------------------------------------------------------
// Team canonicalization
// ---------------------------------------------------------------------------

/// Canonicalize a team code: trims, uppercases, substitutes the free-agent
/// sentinel for blank or literal "nan" input, and unifies the historical
/// franchise abbreviation pairs (JAC/JAX, WSH/WAS).
pub fn canonical_team(raw: &str) -> String {
    let team = raw.trim().to_uppercase();
    if team.is_empty() || team == "NAN" {
        return FREE_AGENT.to_string();
    }
    match team.as_str() {
        "JAC" => "JAX".to_string(),
        "WSH" => "WAS".to_string(),
        _ => team,
    }
}

// ---------------------------------------------------------------------------
// PlayerIdentity
// ---------------------------------------------------------------------------

/// A player identified loosely by display name, team code, and position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerIdentity {
    /// Display name as supplied by the source (suffixes and punctuation
    /// intact). Comparison always goes through `normalize_name`.
    pub name: String,
    /// Canonical team code, or `FREE_AGENT` when unknown.
    pub team: String,
    pub position: Position,
}

impl PlayerIdentity {
    pub fn new(name: impl Into<String>, team: &str, position: Position) -> Self {
        PlayerIdentity {
            name: name.into(),
            team: canonical_team(team),
            position,
        }
    }

    /// The normalized comparison key for this player's name.
    pub fn name_key(&self) -> String {
        normalize_name(&self.name)
    }

    /// Whether two identities denote the same player.
    ///
    /// Requires equal normalized names and equal positions. Teams must be
    /// equal after canonicalization, except that a free-agent-tagged side
    /// matches any team: stale team data is common in ranking feeds, and
    /// missing a drafted player over it would be worse than the occasional
    /// false positive.
    pub fn matches(&self, other: &PlayerIdentity) -> bool {
        self.position == other.position
            && teams_compatible(&self.team, &other.team)
            && self.name_key() == other.name_key()
    }
}

/// Team compatibility: equal, or either side unknown.
pub fn teams_compatible(a: &str, b: &str) -> bool {
    a == b || a == FREE_AGENT || b == FREE_AGENT
}

impl fmt::Display for PlayerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.name, self.position, self.team)
    }
}
