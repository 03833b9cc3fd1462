pub mod collection;
pub mod snapshot;

pub use collection::{
    CollectionProvider, EmptyCollectionProvider, InMemoryCollectionProvider, ProviderError,
    SharedRows,
};
pub use snapshot::SnapshotProvider;
