pub mod expansion;
pub use expansion::{
    ExpandedTermSet, IdentityExpander, LlmQueryExpander, QueryExpander, build_expander,
};

pub mod suggestions;
pub use suggestions::{EventSource, SuggestionResponse, SuggestionService};
