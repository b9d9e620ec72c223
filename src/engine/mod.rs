//! Console front end of the convergence engine
//!
//! 1. Planning - a dry run of the recipe against the host
//! 2. Display - show what would change
//! 3. Converging - apply for real after confirmation

pub mod differ;
pub mod executor;

pub use executor::{RunOptions, apply, plan};
