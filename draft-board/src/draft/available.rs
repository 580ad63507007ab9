// Availability filtering and position grouping.
//
// The taken set is indexed by (normalized name, position) so filtering a
// table is a hash lookup per entry rather than a scan of every drafted
// and rostered player. Team compatibility is checked inside the bucket,
// which keeps the matching semantics identical to PlayerIdentity::matches.

use crate::rankings::identity::{teams_compatible, PlayerIdentity, Position};
use crate::rankings::table::{RankingEntry, RankingTable};
use serde::Serialize;
use std::collections::HashMap;

// ---------------------------------------------------------------------------
// TakenSet
// ---------------------------------------------------------------------------

/// Identities no longer available for selection. Membership is "does any
/// taken identity match," not object equality.
#[derive(Debug, Default)]
pub struct TakenSet {
    /// Canonical team codes seen for each (name key, position) pair.
    /// Duplicates in the source collapse here; one compatible team is
    /// enough to count as taken.
    index: HashMap<(String, Position), Vec<String>>,
    len: usize,
}

impl TakenSet {
    pub fn new() -> Self {
        TakenSet::default()
    }

    pub fn from_identities<'a, I>(identities: I) -> Self
    where
        I: IntoIterator<Item = &'a PlayerIdentity>,
    {
        let mut set = TakenSet::new();
        for identity in identities {
            set.insert(identity);
        }
        set
    }

    pub fn insert(&mut self, identity: &PlayerIdentity) {
        let key = (identity.name_key(), identity.position);
        let teams = self.index.entry(key).or_default();
        if !teams.contains(&identity.team) {
            teams.push(identity.team.clone());
            self.len += 1;
        }
    }

    /// Number of distinct (name, position, team) identities held.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether any taken identity matches the given player.
    pub fn contains_match(&self, player: &PlayerIdentity) -> bool {
        let key = (player.name_key(), player.position);
        match self.index.get(&key) {
            Some(teams) => teams.iter().any(|t| teams_compatible(t, &player.team)),
            None => false,
        }
    }
}

// ---------------------------------------------------------------------------
// AvailabilityFilter
// ---------------------------------------------------------------------------

/// Remove every entry matched by the taken set. Returns a new table in
/// the same order; the input is untouched. Exclusion is all-or-nothing
/// per entry.
pub fn filter_available(table: &RankingTable, taken: &TakenSet) -> RankingTable {
    RankingTable::new(
        table
            .iter()
            .filter(|entry| !taken.contains_match(&entry.player))
            .cloned()
            .collect(),
    )
}

/// Like `filter_available`, but with two exclusion sources: players
/// drafted in this draft and players rostered elsewhere (dynasty/keeper
/// leagues). Returns the filtered table plus the count of entries removed
/// specifically because of roster membership — drafted takes precedence,
/// so a player who is both counts as drafted.
pub fn filter_available_counted(
    table: &RankingTable,
    drafted: &TakenSet,
    rostered: &TakenSet,
) -> (RankingTable, usize) {
    let mut entries = Vec::with_capacity(table.len());
    let mut roster_filtered = 0;
    for entry in table.iter() {
        if drafted.contains_match(&entry.player) {
            continue;
        }
        if rostered.contains_match(&entry.player) {
            roster_filtered += 1;
            continue;
        }
        entries.push(entry.clone());
    }
    (RankingTable::new(entries), roster_filtered)
}

// ---------------------------------------------------------------------------
// PositionGrouper
// ---------------------------------------------------------------------------

/// One grouped result: a ranking entry plus its 1-based slot within the
/// requested position set. `entry.rank` remains the absolute rank.
#[derive(Debug, Clone, Serialize)]
pub struct RankedSlot {
    pub entry: RankingEntry,
    pub slot: usize,
}

/// Walk the table in order and collect the first `n` entries whose
/// position is in `positions`. Slot numbers restart at 1 on every call;
/// fewer than `n` results is valid.
pub fn top_by_position(
    table: &RankingTable,
    positions: &[Position],
    n: usize,
) -> Vec<RankedSlot> {
    let mut out = Vec::new();
    for entry in table.iter() {
        if out.len() >= n {
            break;
        }
        if positions.contains(&entry.player.position) {
            out.push(RankedSlot {
                entry: entry.clone(),
                slot: out.len() + 1,
            });
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rankings::table::parse_rankings;
    use crate::rankings::table::ParseOptions;

    fn table_of(csv_data: &str) -> RankingTable {
        parse_rankings(csv_data.as_bytes(), ParseOptions::default()).unwrap()
    }

    fn seven_player_table() -> RankingTable {
        table_of(
            "\
Rank,Name,Position,Team
1,Ja'Marr Chase,WR,CIN
2,Bijan Robinson,RB,ATL
3,Justin Jefferson,WR,MIN
4,Josh Allen,QB,BUF
5,Jahmyr Gibbs,RB,DET
6,Lamar Jackson,QB,BAL
7,Saquon Barkley,RB,PHI",
        )
    }

    // -- TakenSet --

    #[test]
    fn taken_set_matches_by_normalized_name() {
        let mut taken = TakenSet::new();
        taken.insert(&PlayerIdentity::new("Calvin Ridley Jr.", "TEN", Position::WR));

        let entry = PlayerIdentity::new("CALVIN RIDLEY", "TEN", Position::WR);
        assert!(taken.contains_match(&entry));
    }

    #[test]
    fn taken_set_respects_position() {
        let mut taken = TakenSet::new();
        taken.insert(&PlayerIdentity::new("Josh Allen", "BUF", Position::QB));

        let te = PlayerIdentity::new("Josh Allen", "BUF", Position::TE);
        assert!(!taken.contains_match(&te));
    }

    #[test]
    fn taken_set_free_agent_wildcards_team() {
        let mut taken = TakenSet::new();
        taken.insert(&PlayerIdentity::new("Josh Allen", "", Position::QB));

        let buf = PlayerIdentity::new("Josh Allen", "BUF", Position::QB);
        assert!(taken.contains_match(&buf));

        let mut taken = TakenSet::new();
        taken.insert(&PlayerIdentity::new("Josh Allen", "BUF", Position::QB));
        let fa = PlayerIdentity::new("Josh Allen", "", Position::QB);
        assert!(taken.contains_match(&fa));
    }

    #[test]
    fn taken_set_team_alias() {
        let mut taken = TakenSet::new();
        taken.insert(&PlayerIdentity::new("Brian Thomas", "JAC", Position::WR));

        let jax = PlayerIdentity::new("Brian Thomas", "JAX", Position::WR);
        assert!(taken.contains_match(&jax));
    }

    #[test]
    fn taken_set_different_team_no_match() {
        let mut taken = TakenSet::new();
        taken.insert(&PlayerIdentity::new("Josh Allen", "BUF", Position::QB));

        let other = PlayerIdentity::new("Josh Allen", "MIA", Position::QB);
        assert!(!taken.contains_match(&other));
    }

    #[test]
    fn taken_set_len_collapses_duplicates() {
        let mut taken = TakenSet::new();
        assert!(taken.is_empty());
        taken.insert(&PlayerIdentity::new("A Player", "KC", Position::RB));
        taken.insert(&PlayerIdentity::new("A Player", "KC", Position::RB));
        assert_eq!(taken.len(), 1);
        // A different team for the same name is a distinct identity.
        taken.insert(&PlayerIdentity::new("A Player", "SF", Position::RB));
        assert_eq!(taken.len(), 2);
    }

    // -- filter_available --

    #[test]
    fn filter_removes_matched_entries() {
        let table = seven_player_table();
        let taken = TakenSet::from_identities(&[
            PlayerIdentity::new("Josh Allen", "BUF", Position::QB),
            PlayerIdentity::new("Justin Jefferson", "MIN", Position::WR),
        ]);

        let filtered = filter_available(&table, &taken);
        assert_eq!(filtered.len(), 5);
        assert!(filtered.iter().all(|e| e.player.name != "Josh Allen"));
        assert!(filtered.iter().all(|e| e.player.name != "Justin Jefferson"));

        // Only one QB remains of the original two.
        let qbs = top_by_position(&filtered, &[Position::QB], 5);
        assert_eq!(qbs.len(), 1);
        assert_eq!(qbs[0].entry.player.name, "Lamar Jackson");
    }

    #[test]
    fn filter_preserves_order_and_input() {
        let table = seven_player_table();
        let taken = TakenSet::from_identities(&[PlayerIdentity::new(
            "Bijan Robinson",
            "ATL",
            Position::RB,
        )]);

        let filtered = filter_available(&table, &taken);
        let names: Vec<&str> = filtered.iter().map(|e| e.player.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Ja'Marr Chase",
                "Justin Jefferson",
                "Josh Allen",
                "Jahmyr Gibbs",
                "Lamar Jackson",
                "Saquon Barkley"
            ]
        );
        // Input untouched.
        assert_eq!(table.len(), 7);
    }

    #[test]
    fn filter_is_idempotent() {
        let table = seven_player_table();
        let taken = TakenSet::from_identities(&[
            PlayerIdentity::new("Ja'Marr Chase", "CIN", Position::WR),
            PlayerIdentity::new("Saquon Barkley", "PHI", Position::RB),
        ]);

        let once = filter_available(&table, &taken);
        let twice = filter_available(&once, &taken);
        assert_eq!(once.len(), twice.len());
        let names_once: Vec<&str> = once.iter().map(|e| e.player.name.as_str()).collect();
        let names_twice: Vec<&str> = twice.iter().map(|e| e.player.name.as_str()).collect();
        assert_eq!(names_once, names_twice);
    }

    #[test]
    fn no_survivor_matches_taken() {
        let table = seven_player_table();
        let identities = [
            PlayerIdentity::new("Josh Allen", "", Position::QB),
            PlayerIdentity::new("JAHMYR GIBBS", "DET", Position::RB),
        ];
        let taken = TakenSet::from_identities(&identities);

        let filtered = filter_available(&table, &taken);
        for entry in filtered.iter() {
            for taken_identity in &identities {
                assert!(!taken_identity.matches(&entry.player));
            }
        }
    }

    #[test]
    fn empty_taken_set_filters_nothing() {
        let table = seven_player_table();
        let filtered = filter_available(&table, &TakenSet::new());
        assert_eq!(filtered.len(), 7);
    }

    #[test]
    fn duplicate_table_rows_all_filtered() {
        let table = table_of(
            "\
Rank,Name,Position,Team
5,Josh Allen,QB,BUF
6,Josh Allen,QB,BUF",
        );
        let taken = TakenSet::from_identities(&[PlayerIdentity::new(
            "Josh Allen",
            "BUF",
            Position::QB,
        )]);
        let filtered = filter_available(&table, &taken);
        assert!(filtered.is_empty());
    }

    // -- filter_available_counted --

    #[test]
    fn roster_filtered_count_excludes_drafted() {
        let table = seven_player_table();
        let drafted = TakenSet::from_identities(&[PlayerIdentity::new(
            "Josh Allen",
            "BUF",
            Position::QB,
        )]);
        let rostered = TakenSet::from_identities(&[
            // Also drafted: counts as drafted, not rostered.
            PlayerIdentity::new("Josh Allen", "BUF", Position::QB),
            PlayerIdentity::new("Jahmyr Gibbs", "DET", Position::RB),
            PlayerIdentity::new("Ja'Marr Chase", "CIN", Position::WR),
        ]);

        let (filtered, roster_filtered) = filter_available_counted(&table, &drafted, &rostered);
        assert_eq!(filtered.len(), 4);
        assert_eq!(roster_filtered, 2);
    }

    #[test]
    fn counted_with_empty_roster_set_matches_plain_filter() {
        let table = seven_player_table();
        let drafted = TakenSet::from_identities(&[PlayerIdentity::new(
            "Lamar Jackson",
            "BAL",
            Position::QB,
        )]);

        let (filtered, roster_filtered) =
            filter_available_counted(&table, &drafted, &TakenSet::new());
        assert_eq!(filtered.len(), 6);
        assert_eq!(roster_filtered, 0);
    }

    // -- top_by_position --

    #[test]
    fn top_by_position_slots_restart_at_one() {
        let table = seven_player_table();
        let rbs = top_by_position(&table, &[Position::RB], 5);
        assert_eq!(rbs.len(), 3);
        let slots: Vec<usize> = rbs.iter().map(|s| s.slot).collect();
        assert_eq!(slots, vec![1, 2, 3]);
        // Absolute ranks preserved alongside.
        assert!((rbs[0].entry.rank - 2.0).abs() < f64::EPSILON);
        assert!((rbs[1].entry.rank - 5.0).abs() < f64::EPSILON);
        assert!((rbs[2].entry.rank - 7.0).abs() < f64::EPSILON);
    }

    #[test]
    fn top_by_position_respects_limit() {
        let table = seven_player_table();
        let rbs = top_by_position(&table, &[Position::RB], 2);
        assert_eq!(rbs.len(), 2);
        assert_eq!(rbs[0].entry.player.name, "Bijan Robinson");
        assert_eq!(rbs[1].entry.player.name, "Jahmyr Gibbs");
    }

    #[test]
    fn top_by_position_multi_position_flex() {
        let table = seven_player_table();
        let flex = top_by_position(&table, &[Position::RB, Position::WR, Position::TE], 10);
        // 2 WR + 3 RB, table order preserved.
        assert_eq!(flex.len(), 5);
        assert_eq!(flex[0].entry.player.name, "Ja'Marr Chase");
        assert_eq!(flex[1].entry.player.name, "Bijan Robinson");
        assert_eq!(flex[4].entry.player.name, "Saquon Barkley");
        let slots: Vec<usize> = flex.iter().map(|s| s.slot).collect();
        assert_eq!(slots, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn top_by_position_fewer_than_n_is_fine() {
        let table = seven_player_table();
        let kickers = top_by_position(&table, &[Position::K], 5);
        assert!(kickers.is_empty());
    }

    #[test]
    fn top_by_position_is_stateless_across_calls() {
        let table = seven_player_table();
        let first = top_by_position(&table, &[Position::QB], 5);
        let second = top_by_position(&table, &[Position::QB], 5);
        assert_eq!(first.len(), second.len());
        assert_eq!(first[0].slot, 1);
        assert_eq!(second[0].slot, 1);
    }
}
