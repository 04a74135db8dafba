//! Error handling foundation for campus-login.
//!
//! Each crate defines its own domain error enum and carries it in a
//! rootcause `Report`, adding context as errors move up the stack.

use rootcause::Report;

/// A Result type alias using rootcause's Report for error handling.
pub type Result<T, C = ()> = std::result::Result<T, Report<C>>;
