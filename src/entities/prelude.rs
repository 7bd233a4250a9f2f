pub use super::events::Entity as Events;
pub use super::expansion_cache::Entity as ExpansionCache;
