// Draft service: orchestrates feeds, filtering, and grouping into a
// best-available board, with a short-lived cache per draft id.

use crate::draft::available::{filter_available_counted, top_by_position, RankedSlot, TakenSet};
use crate::draft::cache::BoardCache;
use crate::format::{is_dynasty_or_keeper, FormatSelection, FormatSelector, LeagueType, ScoringFormat};
use crate::rankings::identity::{normalize_name, Position};
use crate::rankings::store::RankingsStore;
use crate::rankings::table::{RankingTable, RankingsError, RANK_SENTINEL};
use crate::sleeper::{rostered_identities, DraftInfo, DraftProvider, FeedError, LeagueInfo};
use chrono::Utc;
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::info;

/// Tier reported for a player with no ranking entry.
pub const LOOKUP_MISS_TIER: u32 = 10;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("no draft id configured")]
    NoDraftId,

    #[error(transparent)]
    Feed(#[from] FeedError),

    #[error(transparent)]
    Rankings(#[from] RankingsError),
}

// ---------------------------------------------------------------------------
// Board types
// ---------------------------------------------------------------------------

/// One row of a position grouping, shaped for display/serialization.
#[derive(Debug, Clone, Serialize)]
pub struct SlotView {
    pub name: String,
    pub position: String,
    pub team: String,
    /// Absolute rank from the ranking source.
    pub rank: f64,
    /// 1-based rank among the remaining players of the requested positions.
    pub slot: usize,
    pub tier: u32,
}

impl From<RankedSlot> for SlotView {
    fn from(ranked: RankedSlot) -> Self {
        SlotView {
            name: ranked.entry.player.name.clone(),
            position: ranked.entry.player.position.to_string(),
            team: ranked.entry.player.team.clone(),
            rank: ranked.entry.rank,
            slot: ranked.slot,
            tier: ranked.entry.tier,
        }
    }
}

/// The standard position groupings served to the UI layer.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PositionGroups {
    #[serde(rename = "QB")]
    pub qb: Vec<SlotView>,
    #[serde(rename = "RB")]
    pub rb: Vec<SlotView>,
    #[serde(rename = "WR")]
    pub wr: Vec<SlotView>,
    #[serde(rename = "TE")]
    pub te: Vec<SlotView>,
    #[serde(rename = "K")]
    pub k: Vec<SlotView>,
    #[serde(rename = "FLEX")]
    pub flex: Vec<SlotView>,
    #[serde(rename = "ALL")]
    pub all: Vec<SlotView>,
}

/// The complete best-available view for one draft at one moment.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BestAvailableBoard {
    pub positions: PositionGroups,
    pub available: Vec<SlotView>,
    pub total_available: usize,
    pub total_drafted: usize,
    pub total_rostered: usize,
    /// Entries hidden because a league roster (not this draft) owns them.
    pub roster_filtered: usize,
    pub is_dynasty_keeper: bool,
    pub league_name: Option<String>,
    pub scoring_format: Option<ScoringFormat>,
    pub league_type: Option<LeagueType>,
    pub is_manual_format: bool,
    /// RFC 3339 timestamp of board assembly.
    pub last_updated: String,
    pub draft_id: String,
}

// ---------------------------------------------------------------------------
// Board assembly (pure)
// ---------------------------------------------------------------------------

/// Everything the assembler needs besides the table and taken sets.
#[derive(Debug, Clone, Default)]
pub struct BoardContext {
    pub draft_id: String,
    pub league_name: Option<String>,
    pub selection: Option<FormatSelection>,
    pub is_dynasty_keeper: bool,
    pub total_drafted: usize,
    pub total_rostered: usize,
}

fn group(table: &RankingTable, positions: &[Position], n: usize) -> Vec<SlotView> {
    top_by_position(table, positions, n)
        .into_iter()
        .map(SlotView::from)
        .collect()
}

/// Assemble a board from already-fetched data. Pure apart from the
/// timestamp; all network access happens in the caller.
pub fn assemble_board(
    table: &RankingTable,
    drafted: &TakenSet,
    rostered: &TakenSet,
    ctx: BoardContext,
) -> BestAvailableBoard {
    let (available, roster_filtered) = filter_available_counted(table, drafted, rostered);

    let positions = PositionGroups {
        qb: group(&available, &[Position::QB], 5),
        rb: group(&available, &[Position::RB], 5),
        wr: group(&available, &[Position::WR], 5),
        te: group(&available, &[Position::TE], 5),
        k: group(&available, &[Position::K], 5),
        flex: group(&available, &[Position::RB, Position::WR, Position::TE], 10),
        all: group(
            &available,
            &[Position::QB, Position::RB, Position::WR, Position::TE, Position::K],
            10,
        ),
    };

    let available_views: Vec<SlotView> = available
        .iter()
        .enumerate()
        .map(|(i, entry)| SlotView {
            name: entry.player.name.clone(),
            position: entry.player.position.to_string(),
            team: entry.player.team.clone(),
            rank: entry.rank,
            slot: i + 1,
            tier: entry.tier,
        })
        .collect();

    BestAvailableBoard {
        positions,
        total_available: available.len(),
        available: available_views,
        total_drafted: ctx.total_drafted,
        total_rostered: ctx.total_rostered,
        roster_filtered,
        is_dynasty_keeper: ctx.is_dynasty_keeper,
        league_name: ctx.league_name,
        scoring_format: ctx.selection.map(|s| s.scoring),
        league_type: ctx.selection.map(|s| s.league_type),
        is_manual_format: ctx.selection.map(|s| s.is_manual).unwrap_or(false),
        last_updated: Utc::now().to_rfc3339(),
        draft_id: ctx.draft_id,
    }
}

// ---------------------------------------------------------------------------
// Ranking lookup index
// ---------------------------------------------------------------------------

/// A player's ranking as seen by roster views. Misses get the sentinel
/// rank and a low-value tier, never an error.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RankLookup {
    pub rank: f64,
    pub tier: u32,
}

impl Default for RankLookup {
    fn default() -> Self {
        RankLookup {
            rank: RANK_SENTINEL,
            tier: LOOKUP_MISS_TIER,
        }
    }
}

/// Name-keyed index over a ranking table: exact lowercase match first,
/// then the normalized comparison key. First table entry wins on
/// duplicates.
#[derive(Debug, Default)]
pub struct RankingIndex {
    by_lower: HashMap<String, RankLookup>,
    by_key: HashMap<String, RankLookup>,
}

impl RankingIndex {
    pub fn build(table: &RankingTable) -> Self {
        let mut index = RankingIndex::default();
        for entry in table.iter() {
            let lookup = RankLookup {
                rank: entry.rank,
                tier: entry.tier,
            };
            index
                .by_lower
                .entry(entry.player.name.trim().to_lowercase())
                .or_insert(lookup);
            index
                .by_key
                .entry(normalize_name(&entry.player.name))
                .or_insert(lookup);
        }
        index
    }

    pub fn lookup(&self, name: &str) -> RankLookup {
        if let Some(found) = self.by_lower.get(&name.trim().to_lowercase()) {
            return *found;
        }
        if let Some(found) = self.by_key.get(&normalize_name(name)) {
            return *found;
        }
        RankLookup::default()
    }
}

// ---------------------------------------------------------------------------
// DraftService
// ---------------------------------------------------------------------------

pub struct DraftService<P: DraftProvider> {
    provider: P,
    store: RankingsStore,
    selector: FormatSelector,
    cache: BoardCache,
    draft_id: Option<String>,
}

impl<P: DraftProvider> DraftService<P> {
    pub fn new(
        provider: P,
        store: RankingsStore,
        selector: FormatSelector,
        cache_ttl: Duration,
        draft_id: Option<String>,
    ) -> Self {
        DraftService {
            provider,
            store,
            selector,
            cache: BoardCache::new(cache_ttl),
            draft_id,
        }
    }

    /// Switch drafts. Clears the cached board; the manual format override
    /// is a user preference, not draft-specific, so it survives.
    pub fn set_draft_id(&mut self, draft_id: impl Into<String>) {
        self.draft_id = Some(draft_id.into());
        self.cache.invalidate();
    }

    pub fn draft_id(&self) -> Option<&str> {
        self.draft_id.as_deref()
    }

    pub fn set_manual_format(
        &mut self,
        scoring: ScoringFormat,
        league_type: LeagueType,
    ) -> std::io::Result<()> {
        self.selector.set_manual(scoring, league_type)?;
        self.cache.invalidate();
        Ok(())
    }

    pub fn clear_manual_format(&mut self) -> std::io::Result<()> {
        self.selector.clear_manual()?;
        self.cache.invalidate();
        Ok(())
    }

    /// Rank and tier for one player name under the currently resolved
    /// format. A miss returns the sentinel lookup, never an error; only
    /// a missing rankings file or an unreachable feed fails.
    pub async fn player_ranking(&self, name: &str) -> Result<RankLookup, ServiceError> {
        let league = match &self.draft_id {
            Some(draft_id) => {
                let draft = self.provider.draft_info(draft_id).await?;
                self.league_of(&draft).await?
            }
            None => None,
        };
        let selection = self.selector.resolve(league.as_ref());
        let table = self.store.load(selection.scoring, selection.league_type)?;
        Ok(RankingIndex::build(&table).lookup(name))
    }

    async fn league_of(&self, draft: &DraftInfo) -> Result<Option<LeagueInfo>, ServiceError> {
        match &draft.league_id {
            Some(league_id) => Ok(Some(self.provider.league(league_id).await?)),
            None => Ok(None),
        }
    }

    /// Build (or serve from cache) the current best-available board.
    pub async fn best_available(&self) -> Result<BestAvailableBoard, ServiceError> {
        let draft_id = self.draft_id.clone().ok_or(ServiceError::NoDraftId)?;

        if let Some(board) = self.cache.get(&draft_id) {
            return Ok(board);
        }

        // One /draft/{id} fetch carries both the league linkage and the
        // dynasty metadata tag.
        let draft = self.provider.draft_info(&draft_id).await?;
        let league = self.league_of(&draft).await?;
        let selection = self.selector.resolve(league.as_ref());
        let table = self.store.load(selection.scoring, selection.league_type)?;

        let picks = self.provider.draft_picks(&draft_id).await?;
        let drafted_identities: Vec<_> = picks.iter().filter_map(|p| p.identity()).collect();
        let drafted = TakenSet::from_identities(&drafted_identities);

        let mut rostered = TakenSet::new();
        let mut total_rostered = 0;
        let mut is_dynasty_keeper = false;

        if let Some(league) = &league {
            let rosters = match &league.league_id {
                Some(league_id) => self.provider.rosters(league_id).await?,
                None => Vec::new(),
            };
            is_dynasty_keeper = is_dynasty_or_keeper(league, &rosters, Some(&draft));

            if is_dynasty_keeper {
                let directory = self.provider.players().await?;
                let identities = rostered_identities(&rosters, &directory);
                total_rostered = identities.len();
                rostered = TakenSet::from_identities(&identities);
                info!(
                    "dynasty/keeper league: {} rostered players excluded from rankings",
                    total_rostered
                );
            }
        }

        let board = assemble_board(
            &table,
            &drafted,
            &rostered,
            BoardContext {
                draft_id: draft_id.clone(),
                league_name: league.as_ref().and_then(|l| l.name.clone()),
                selection: Some(selection),
                is_dynasty_keeper,
                total_drafted: picks.len(),
                total_rostered,
            },
        );

        self.cache.set(&draft_id, board.clone());
        Ok(board)
    }
}
