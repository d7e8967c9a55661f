use dataset::{SplitDataset, SplitName};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::record::DatasetRecord;
use crate::storage::Storage;

pub const KEY_DATASET_INDEX: &str = "datasets/index.json";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Ser(String),

    #[error("dataset {0} not found")]
    NotFound(Uuid),

    #[error("dataset {0} already exists")]
    AlreadyExists(Uuid),
}

pub type Result<T> = std::result::Result<T, StoreError>;

pub fn record_key(id: Uuid) -> String {
    format!("datasets/{id}/record.json")
}

pub fn split_key(id: Uuid, split: SplitName) -> String {
    format!("datasets/{id}/{split}.jsonl")
}

/// The upload exactly as received, before validation.
pub fn raw_key(id: Uuid) -> String {
    format!("datasets/{id}/raw.jsonl")
}

/// The hand-off target of the pipeline: the raw upload, split files and one
/// metadata record per dataset, and an index of dataset ids.
pub struct DatasetStore<S: Storage> {
    storage: S,
}

impl<S: Storage> DatasetStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    pub fn put_split(&mut self, id: Uuid, split: SplitName, serialized: &[u8]) -> Result<()> {
        self.storage
            .put(&split_key(id, split), serialized)
            .map_err(|e| StoreError::Storage(e.to_string()))
    }

    pub fn get_split(&self, id: Uuid, split: SplitName) -> Result<Option<Vec<u8>>> {
        self.storage
            .get(&split_key(id, split))
            .map_err(|e| StoreError::Storage(e.to_string()))
    }

    pub fn put_raw(&mut self, id: Uuid, raw: &[u8]) -> Result<()> {
        self.write(&raw_key(id), raw)
    }

    pub fn get_raw(&self, id: Uuid) -> Result<Option<Vec<u8>>> {
        self.read(&raw_key(id))
    }

    pub fn create_dataset_record(&mut self, rec: &DatasetRecord) -> Result<()> {
        if self.read(&record_key(rec.id))?.is_some() {
            return Err(StoreError::AlreadyExists(rec.id));
        }
        self.write_record(rec)?;
        self.add_to_index(rec.id)
    }

    pub fn get_dataset_record(&self, id: Uuid) -> Result<Option<DatasetRecord>> {
        match self.read(&record_key(id))? {
            Some(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| StoreError::Ser(e.to_string())),
            None => Ok(None),
        }
    }

    /// Replace a record's metadata and bump `updated_at`.
    pub fn update_metadata(&mut self, id: Uuid, metadata: Option<serde_json::Value>) -> Result<DatasetRecord> {
        let mut rec = self.get_dataset_record(id)?.ok_or(StoreError::NotFound(id))?;
        rec.metadata = metadata;
        rec.touch();
        self.write_record(&rec)?;
        Ok(rec)
    }

    /// A tenant's records in index order.
    pub fn list_datasets(&self, tenant_id: &str) -> Result<Vec<DatasetRecord>> {
        Ok(self
            .list_all_datasets()?
            .into_iter()
            .filter(|rec| rec.tenant_id == tenant_id)
            .collect())
    }

    /// Every record in index order. Ids whose record is missing or unreadable are skipped.
    pub fn list_all_datasets(&self) -> Result<Vec<DatasetRecord>> {
        let mut out = Vec::new();
        for id in self.load_index()? {
            let Some(bytes) = self.read(&record_key(id))? else { continue };
            let Ok(rec) = serde_json::from_slice::<DatasetRecord>(&bytes) else { continue };
            out.push(rec);
        }
        Ok(out)
    }

    pub fn delete_dataset(&mut self, id: Uuid) -> Result<()> {
        if self.read(&record_key(id))?.is_none() {
            return Err(StoreError::NotFound(id));
        }
        // record first, so a half-deleted dataset never looks complete
        self.remove(&record_key(id))?;
        for split in SplitName::ALL {
            self.remove(&split_key(id, split))?;
        }
        self.remove(&raw_key(id))?;
        let keys: Vec<Uuid> = self.load_index()?.into_iter().filter(|k| *k != id).collect();
        self.save_index(&keys)
    }

    /// Store the raw upload and all three splits, then the record. A record
    /// implies its raw upload and splits exist.
    pub fn persist(&mut self, rec: &DatasetRecord, raw: &[u8], split: &SplitDataset) -> Result<()> {
        let id = rec.id;
        if self.read(&record_key(id))?.is_some() {
            return Err(StoreError::AlreadyExists(id));
        }
        self.put_raw(id, raw)?;
        for (split_name, bytes) in split.serialized() {
            self.put_split(id, split_name, &bytes)?;
        }
        self.create_dataset_record(rec)?;

        info!(%id, tenant = %rec.tenant_id, dataset = %rec.name, total = rec.counts.total, "dataset stored");
        Ok(())
    }

    fn write_record(&mut self, rec: &DatasetRecord) -> Result<()> {
        let bytes = serde_json::to_vec(rec).map_err(|e| StoreError::Ser(e.to_string()))?;
        self.write(&record_key(rec.id), &bytes)
    }

    fn add_to_index(&mut self, id: Uuid) -> Result<()> {
        let mut keys = self.load_index()?;
        if !keys.contains(&id) {
            keys.push(id);
            self.save_index(&keys)?;
        }
        Ok(())
    }

    fn load_index(&self) -> Result<Vec<Uuid>> {
        Ok(match self.read(KEY_DATASET_INDEX)? {
            Some(bytes) => serde_json::from_slice(&bytes).map_err(|e| StoreError::Ser(e.to_string()))?,
            None => vec![],
        })
    }

    fn save_index(&mut self, keys: &[Uuid]) -> Result<()> {
        let bytes = serde_json::to_vec(keys).map_err(|e| StoreError::Ser(e.to_string()))?;
        self.write(KEY_DATASET_INDEX, &bytes)
    }

    fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.storage.get(key).map_err(|e| StoreError::Storage(e.to_string()))
    }

    fn write(&mut self, key: &str, value: &[u8]) -> Result<()> {
        self.storage.put(key, value).map_err(|e| StoreError::Storage(e.to_string()))
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.storage.delete(key).map_err(|e| StoreError::Storage(e.to_string()))
    }
}
