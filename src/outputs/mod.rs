//! Output generation for collected prices.
//!
//! # Submodules
//!
//! - [`json`]: Writes a [`CollectionResult`](crate::models::CollectionResult)
//!   to the JSON file read by downstream publishing
//!
//! # Output Structure
//!
//! ```text
//! gold_price.json    # overwritten on every run, never read back
//! ```

pub mod json;
