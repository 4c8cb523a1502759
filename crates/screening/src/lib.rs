//! ReviewForge Screening Support
//!
//! The human-in-the-loop layer around the merge engine:
//! - Parsing reviewer decision text ("approve: 1,3,5-8 reject: 2,4")
//! - Applying manual overrides to merged records, with audit fields
//! - Aggregating screening status per query and overall
//! - Computing PRISMA flow numbers for the documentation generator

pub mod decisions;
pub mod overrides;
pub mod prisma;
pub mod status;

pub use decisions::{parse_decision_text, ScreeningDecisions, Selection};
pub use overrides::{apply_decisions, OverrideTally};
pub use prisma::{PrismaFlow, PrismaReport};
pub use status::{query_summaries, screening_status, QuerySummary, ScreeningStatus};
