/// The scanning core: domain value types and the pure transformation
/// services that implement matching, merging, and IoC detection.
pub mod domain;
pub mod services;
