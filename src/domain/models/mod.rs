//! Domain models for the investigation engine.

pub mod bill;
pub mod budget;
pub mod config;
pub mod donation;
pub mod person;
pub mod session;
pub mod theme;
pub mod transcript;
pub mod vote;

pub use bill::{Bill, BillId, RankedBill, Sponsor};
pub use budget::Budget;
pub use config::{
    BudgetConfig, CacheConfig, Config, DatabaseConfig, LlmConfig, LoggingConfig, RankingConfig,
    WindowConfig,
};
pub use donation::{Disposition, DonationTransaction, DonorEntity, DonorTotal};
pub use person::{EntityId, LegislatorId, Person, PersonId};
pub use session::{LegislativeSession, SessionId, SessionWindow};
pub use theme::{DonorTheme, ThemeDonor, ThemeSet};
pub use transcript::{
    InvestigationReport, InvestigationStep, InvocationOutcome, Termination, ToolInvocation,
};
pub use vote::{OutlierVerdict, Vote, VoteValue};
