/// Name of a text category (a domain directory or a language code).
/// Examples: `Books`, `Code`, `Web`, `de`, `sw`
pub type CategoryId = String;
/// File path strings as recorded in experiment metadata.
/// Example: `/data/processed/de/shard_0007.txt`
pub type PathString = String;
/// Mixture weight for one category, a multiple of `1 / resolution`.
/// Example: `0.2731`
pub type Weight = f64;
/// Byte count used for targets, achieved totals, and candidate sizes.
/// Example: `60`
pub type ByteCount = u64;
