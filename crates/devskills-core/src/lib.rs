pub mod error;
pub mod io;
pub mod manifest;
pub mod manifest_scan;
pub mod newlines;
pub mod paths;
pub mod scan;
pub mod solution;
pub mod sound;
pub mod structure;
pub mod xml;

pub use error::{Result, SkillError};
