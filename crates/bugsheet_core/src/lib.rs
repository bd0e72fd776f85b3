pub mod config;
pub mod error;
pub mod extract;
pub mod html;
pub mod pipeline;
pub mod sheets;
pub mod tracker;

pub use error::{BugsheetError, Result};
