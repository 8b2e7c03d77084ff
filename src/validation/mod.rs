//! Input validation for values that leave the process (metadata locators).

pub mod url;

pub use url::{MetadataSource, UrlValidationError, require_https};
