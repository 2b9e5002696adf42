//! CLI command implementations.

pub mod add;
pub mod inspect;
pub mod tail;
pub mod validate;
