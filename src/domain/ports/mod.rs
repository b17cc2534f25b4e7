//! Ports (abstract seams) to external collaborators.

pub mod clock;
pub mod completion;
pub mod store;

pub use clock::{Clock, SystemClock};
pub use completion::{
    ChatMessage, CompletionError, CompletionProvider, CompletionResponse, ToolCallRequest,
    ToolResultMessage, ToolSchema,
};
pub use store::InvestigationStore;
