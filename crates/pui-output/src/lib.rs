//! Token-budgeted Markdown and structured rendering of RepoMap/Zoom/Impact
//! packs (spec §4.1 C1, §4.11 C11).

pub mod format;
pub mod packs;
pub mod token_budget;

pub use format::{Markdown, PackFormat, Structured};
pub use packs::impact::ImpactPack;
pub use packs::repomap::RepoMapPack;
pub use packs::zoom::ZoomPack;
