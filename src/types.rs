/// Raw string form of a local path or cloud URI.
/// Examples: `/data/pool/shards`, `s3://bucket/pool/shards`
pub type LocationString = String;
/// A single `::`-joinable component of a shard descriptor.
/// Examples: `/data/shard_{0000..0099}.tar`, `pipe:aws s3 cp s3://bucket/a.tar -`
pub type ShardToken = String;
/// Shard file name with its archive extension and trailing digit run removed.
/// Example: `/data/pool/shard_`
pub type ShardPrefix = String;
/// Trailing decimal digit run of a shard name, kept as text to retain width.
/// Examples: `0000`, `00000042`
pub type DigitSuffix = String;
/// A sampling weight exactly as the caller wrote it.
/// Examples: `1`, `0.5`, `2.0`
pub type WeightValue = String;
/// Name of a cloud URI scheme.
/// Examples: `s3`, `gs`
pub type SchemeName = String;
