//! Command implementations for the seo-booster CLI

mod misc;
mod scan;

pub use misc::*;
pub use scan::*;
