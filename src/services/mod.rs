//! Business logic: pure analysis functions plus the orchestrating loop.

pub mod bill_ranker;
pub mod donor_aggregate;
pub mod investigation;
pub mod outlier;
pub mod query_cache;
pub mod session_window;
pub mod similarity;
pub mod themes;
pub mod toolkit;

pub use bill_ranker::{BillRanker, RankRequest};
pub use donor_aggregate::{aggregate_donors, mode_of, AggregateOptions};
pub use investigation::InvestigationLoop;
pub use outlier::{detect_outlier, party_tallies};
pub use query_cache::{cache_key, QueryCache};
pub use session_window::SessionWindowResolver;
pub use similarity::{LexicalMatcher, SimilarityIndex};
pub use themes::ThemeSynthesizer;
pub use toolkit::{tool_schemas, ToolCall, Toolkit};
