pub mod manifest;
pub mod newlines;
pub mod solution;
pub mod sound;
pub mod structure;
