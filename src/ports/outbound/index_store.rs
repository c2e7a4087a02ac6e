use crate::scan::domain::{Ecosystem, UnifiedIndex};
use crate::shared::Result;

/// Outbound port for unified index persistence.
///
/// `load` returns `Ok(None)` when the index for an ecosystem simply does
/// not exist; corrupt files are errors so the caller can decide to fall
/// back. `store` must be atomic: a reader never observes a partially
/// written index.
pub trait IndexStore {
    fn load(&self, ecosystem: &Ecosystem) -> Result<Option<UnifiedIndex>>;
    fn store(&self, index: &UnifiedIndex) -> Result<()>;
}
