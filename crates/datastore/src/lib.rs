//! Dataset hand-off storage
//!
//! The contract the pipeline's caller persists through: `put_raw` for the
//! upload, `put_split` for each serialized split and `create_dataset_record`
//! for the metadata, over any [`Storage`] backend.

mod record;
mod storage;
mod store;

pub use record::DatasetRecord;
pub use storage::{DirStorage, InMemoryStorage, Storage, StorageError};
pub use store::{raw_key, record_key, split_key, DatasetStore, Result, StoreError, KEY_DATASET_INDEX};
