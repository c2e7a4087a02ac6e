/// Ports module defining interfaces for hexagonal architecture
///
/// Outbound (driven) ports are the narrow seams to the excluded
/// collaborators: the raw feed files, the persisted unified index, and the
/// report sink.
pub mod outbound;
