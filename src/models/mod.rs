// src/models/mod.rs
pub mod claim;
pub mod donation;
pub mod inspection;
pub mod profile;
pub mod task;

pub use claim::*;
pub use donation::*;
pub use inspection::*;
pub use profile::*;
pub use task::*;
