/// Console adapters - terminal summary output
pub mod summary;
