#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// Resolver configuration types.
pub mod config;
/// Centralized constants used by transport, resolution, and the launcher.
pub mod constants;
/// Command-line runners shared by the binaries.
pub mod apps;
/// Shard descriptor resolution.
pub mod resolve;
/// Training launcher glue around an external trainer.
pub mod training;
/// Local and cloud location access.
pub mod transport;
/// Shared type aliases.
pub mod types;

mod errors;

pub use config::ResolverConfig;
pub use errors::{ResolveError, TrainError};
pub use resolve::{ShardResolver, ShardSources, WeightSpec, resolve_shards};
pub use transport::{
    DynLocation, InMemoryObjectStore, Location, LocationResolver, ObjectStoreClient, Scheme,
};
pub use types::{LocationString, ShardToken, WeightValue};
