//! Utility functions shared by indexing, search and the binaries.
//!
//! ## Modules
//!
//! - [`app_data`] - Application configuration stored in the app data directory
//! - [`progress`] - Progress bars (no-op without the `progress` feature)
//! - [`tokenizer`] - Splits lines and phrases into alphanumeric / separator runs
//!
//! ```
//! use linedex::utils::tokenize;
//!
//! assert_eq!(tokenize("Hello, World"), vec!["hello", ", ", "world"]);
//! ```

pub mod app_data;
pub mod progress;
pub mod tokenizer;

pub use app_data::*;
pub use tokenizer::*;
