// Draft-side logic: availability filtering, grouping, caching, and the
// orchestrating service.

pub mod available;
pub mod cache;
pub mod service;
