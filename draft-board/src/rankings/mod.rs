// Ranking data: player identity, table parsing, and file-backed storage.

pub mod identity;
pub mod store;
pub mod table;
