/// Outbound ports (Driven ports) - Infrastructure interfaces
///
/// These ports define the interfaces that the application core uses
/// to interact with external systems (file system, console, etc.).
pub mod feed_source;
pub mod index_store;
pub mod output_presenter;

pub use feed_source::{FeedLoadResult, FeedSource};
pub use index_store::IndexStore;
pub use output_presenter::OutputPresenter;
