//! The visual page builder: block templates, composition and undo history.

pub mod blocks;
pub mod history;
pub mod session;

pub use blocks::{BlockInstance, BlockRegistry};
pub use session::BuilderSessions;
