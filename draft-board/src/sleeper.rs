// Sleeper draft-provider feed: typed payloads and the HTTP client.
//
// The core engine never touches the network; everything it consumes is
// already-fetched, typed data. This module is the boundary that produces
// that data, behind the `DraftProvider` trait so tests can supply canned
// feeds.

use crate::rankings::identity::{PlayerIdentity, Position};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::warn;

const SLEEPER_BASE_URL: &str = "https://api.sleeper.app/v1";

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// A collaborator failure is a distinct signal, never conflated with an
/// empty feed: "no data" and "nobody drafted yet" mean different things.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("request to draft provider failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("draft provider returned status {status} for {endpoint}")]
    Status {
        endpoint: String,
        status: reqwest::StatusCode,
    },
}

// ---------------------------------------------------------------------------
// Feed payload types
// ---------------------------------------------------------------------------

/// One pick from the live draft feed.
#[derive(Debug, Clone, Deserialize)]
pub struct DraftPick {
    #[serde(default)]
    pub metadata: PickMetadata,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PickMetadata {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
}

impl DraftPick {
    /// Convert a pick into a `PlayerIdentity`, or `None` when the feed
    /// omits the position (nothing to match against without it).
    pub fn identity(&self) -> Option<PlayerIdentity> {
        let position = Position::parse(self.metadata.position.as_deref()?)?;
        let name = format!("{} {}", self.metadata.first_name, self.metadata.last_name);
        let team = self.metadata.team.as_deref().unwrap_or("");
        Some(PlayerIdentity::new(name.trim().to_string(), team, position))
    }
}

/// League settings feed, used only by format selection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LeagueInfo {
    #[serde(default)]
    pub league_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub draft_id: Option<String>,
    #[serde(default)]
    pub previous_league_id: Option<String>,
    #[serde(default)]
    pub scoring_settings: ScoringSettings,
    #[serde(default)]
    pub roster_positions: Vec<String>,
    #[serde(default)]
    pub settings: LeagueSettings,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScoringSettings {
    /// Points per reception.
    #[serde(default)]
    pub rec: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LeagueSettings {
    /// Sleeper league type: 0 = redraft, 1 = keeper, 2 = dynasty.
    #[serde(default, rename = "type")]
    pub league_type: u32,
    #[serde(default)]
    pub taxi_slots: u32,
    #[serde(default)]
    pub max_keepers: u32,
}

/// One team's roster from the roster feed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Roster {
    /// Provider player ids currently owned by this team.
    #[serde(default)]
    pub players: Option<Vec<String>>,
    /// Player ids explicitly kept from a previous season.
    #[serde(default)]
    pub keepers: Option<Vec<String>>,
}

/// The draft object, carrying the league linkage and the metadata
/// consulted for the dynasty scoring-type tag. One fetch serves both.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DraftInfo {
    #[serde(default)]
    pub league_id: Option<String>,
    #[serde(default)]
    pub metadata: DraftMetadata,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DraftMetadata {
    #[serde(default)]
    pub scoring_type: Option<String>,
}

/// One entry in the provider's global players directory.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SleeperPlayer {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub team: Option<String>,
}

impl SleeperPlayer {
    pub fn identity(&self) -> Option<PlayerIdentity> {
        let name = self.full_name.as_deref()?.trim();
        if name.is_empty() {
            return None;
        }
        let position = Position::parse(self.position.as_deref()?)?;
        let team = self.team.as_deref().unwrap_or("");
        Some(PlayerIdentity::new(name.to_string(), team, position))
    }
}

/// Resolve rostered provider player ids into identities via the players
/// directory. Unknown ids are skipped with a warning; the directory lags
/// behind roster moves occasionally.
pub fn rostered_identities(
    rosters: &[Roster],
    players: &HashMap<String, SleeperPlayer>,
) -> Vec<PlayerIdentity> {
    let mut out = Vec::new();
    for roster in rosters {
        for player_id in roster.players.iter().flatten() {
            match players.get(player_id).and_then(SleeperPlayer::identity) {
                Some(identity) => out.push(identity),
                None => warn!("rostered player id {} not in players directory", player_id),
            }
        }
    }
    out
}

// ---------------------------------------------------------------------------
// DraftProvider trait + HTTP implementation
// ---------------------------------------------------------------------------

/// The draft-provider collaborator seam: everything the engine needs from
/// the remote draft room, as already-fetched data.
#[async_trait]
pub trait DraftProvider: Send + Sync {
    async fn draft_picks(&self, draft_id: &str) -> Result<Vec<DraftPick>, FeedError>;
    async fn league(&self, league_id: &str) -> Result<LeagueInfo, FeedError>;
    async fn rosters(&self, league_id: &str) -> Result<Vec<Roster>, FeedError>;
    async fn draft_info(&self, draft_id: &str) -> Result<DraftInfo, FeedError>;
    async fn players(&self) -> Result<HashMap<String, SleeperPlayer>, FeedError>;
}

/// Sleeper API client.
pub struct SleeperClient {
    http: reqwest::Client,
    base_url: String,
}

impl SleeperClient {
    pub fn new() -> Self {
        Self::with_base_url(SLEEPER_BASE_URL.to_string())
    }

    pub fn with_base_url(base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, endpoint: &str) -> Result<T, FeedError> {
        let url = format!("{}{}", self.base_url, endpoint);
        let response = self.http.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(FeedError::Status {
                endpoint: endpoint.to_string(),
                status: response.status(),
            });
        }
        Ok(response.json::<T>().await?)
    }
}

impl Default for SleeperClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DraftProvider for SleeperClient {
    async fn draft_picks(&self, draft_id: &str) -> Result<Vec<DraftPick>, FeedError> {
        self.get_json(&format!("/draft/{draft_id}/picks")).await
    }

    async fn league(&self, league_id: &str) -> Result<LeagueInfo, FeedError> {
        self.get_json(&format!("/league/{league_id}")).await
    }

    async fn rosters(&self, league_id: &str) -> Result<Vec<Roster>, FeedError> {
        self.get_json(&format!("/league/{league_id}/rosters")).await
    }

    async fn draft_info(&self, draft_id: &str) -> Result<DraftInfo, FeedError> {
        self.get_json(&format!("/draft/{draft_id}")).await
    }

    async fn players(&self) -> Result<HashMap<String, SleeperPlayer>, FeedError> {
        self.get_json("/players/nfl").await
    }
}
