//! contains utils used in reading tables and parsing dirs

pub mod files;
pub mod parameters;

pub use files::*;
pub use parameters::*;
