//! `bazaarops-ai`
//!
//! **Responsibility:** the AI boundary of the platform.
//!
//! - [`Summarizer`]: the opaque "prompt in, text out" capability
//! - [`Analysis`]: a store-scoped data snapshot that knows how to phrase itself
//!   as a prompt (daily summary, daily report, restock review, credit review)
//!
//! Nothing here performs IO besides calling the injected summarizer; data is
//! gathered by callers (infra agents and routines).

pub mod credit;
pub mod daily;
pub mod job;
mod money;
pub mod restock;
pub mod result;
pub mod summarizer;

pub use credit::{CreditAccount, CreditReview};
pub use daily::{CategoryTotals, DailyReport, DailySummaryInput};
pub use job::Analysis;
pub use restock::{InventoryInsight, InventoryReview, RestockAlert, SALES_WINDOW_DAYS};
pub use result::AiError;
pub use summarizer::{InMemorySummarizer, Summarizer, summarize};
