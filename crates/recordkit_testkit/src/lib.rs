//! # recordkit testkit
//!
//! Test utilities for recordkit.
//!
//! This crate provides:
//! - Fixtures: a `post`/`comment` registry and pre-populated models
//! - Property-based generators for values and attribute maps
//! - Test logging setup
//!
//! ## Usage
//!
//! ```
//! use recordkit_testkit::prelude::*;
//!
//! init_test_tracing();
//! let post = post_with_reference("p1");
//! assert_eq!(post.reference_id().as_deref(), Some("p1"));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use fixtures::*;
pub use generators::*;
