pub mod prelude;

pub mod events;
pub mod expansion_cache;
