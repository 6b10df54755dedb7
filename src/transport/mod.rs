/// Filesystem discovery, candidate listing, and path helpers.
pub mod fs;
