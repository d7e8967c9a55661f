use dataset::{pipeline, Sample, SplitDataset, SplitName, TaskType};
use datastore::{DatasetRecord, DatasetStore, DirStorage, InMemoryStorage, StoreError, KEY_DATASET_INDEX};
use serde_json::json;
use uuid::Uuid;

fn upload() -> Vec<u8> {
    (0..100)
        .map(|i| serde_json::to_string(&Sample::new(format!("Question {i}"), format!("Answer {i}"))).unwrap() + "\n")
        .collect::<String>()
        .into_bytes()
}

fn split_dataset(raw: &[u8], seed: u64) -> SplitDataset {
    pipeline::run(raw, TaskType::Qa, seed).unwrap()
}

/// Record, raw upload and splits for a fresh dataset owned by `tenant`.
fn stored(store: &mut DatasetStore<InMemoryStorage>, tenant: &str, name: &str, seed: u64) -> DatasetRecord {
    let raw = upload();
    let split = split_dataset(&raw, seed);
    let rec = DatasetRecord::from_split(Uuid::new_v4(), tenant, name, &split);
    store.persist(&rec, &raw, &split).unwrap();
    rec
}

fn read_split(bytes: &[u8]) -> Vec<Sample> {
    bytes
        .split(|b| *b == b'\n')
        .filter(|l| !l.is_empty())
        .map(|l| serde_json::from_slice(l).unwrap())
        .collect()
}

#[test]
fn test_persist_writes_raw_splits_and_record() {
    let mut store = DatasetStore::new(InMemoryStorage::new());
    let raw = upload();
    let split = split_dataset(&raw, 42);
    let id = Uuid::new_v4();
    let rec = DatasetRecord::from_split(id, "tenant-a", "faq", &split);

    store.persist(&rec, &raw, &split).unwrap();
    assert_eq!(rec.task_type, TaskType::Qa);
    assert_eq!(rec.schema_version, "v0_text");
    assert_eq!(rec.split_seed, 42);
    assert_eq!(rec.created_at, rec.updated_at);
    assert_eq!((rec.counts.total, rec.counts.train, rec.counts.validation, rec.counts.test), (100, 80, 10, 10));

    assert_eq!(store.get_raw(id).unwrap(), Some(raw));
    for name in SplitName::ALL {
        let bytes = store.get_split(id, name).unwrap().unwrap();
        assert_eq!(read_split(&bytes), split.split(name));
    }
    assert_eq!(store.get_dataset_record(id).unwrap(), Some(rec));
}

#[test]
fn test_raw_upload_kept_verbatim() {
    // duplicates and blank lines are dropped from the splits, never from the raw copy
    let mut raw = upload();
    let first_line = raw.split_inclusive(|b| *b == b'\n').next().unwrap().to_vec();
    raw.extend_from_slice(b"\n");
    raw.extend_from_slice(&first_line);
    let split = split_dataset(&raw, 1);
    let rec = DatasetRecord::from_split(Uuid::new_v4(), "t", "dupes", &split);

    let mut store = DatasetStore::new(InMemoryStorage::new());
    store.persist(&rec, &raw, &split).unwrap();
    assert_eq!(store.get_raw(rec.id).unwrap(), Some(raw));
    assert_eq!(rec.counts.total, 100);
}

#[test]
fn test_record_json_shape() {
    let mut store = DatasetStore::new(InMemoryStorage::new());
    let rec = stored(&mut store, "tenant-a", "faq", 1);

    let json = serde_json::to_value(&rec).unwrap();
    assert_eq!(json["task_type"], "qa");
    assert_eq!(json["tenant_id"], "tenant-a");
    assert_eq!(json["fingerprint_hex"].as_str().unwrap().len(), 64);
    assert_eq!(json["split_ratios"], json!({"train": 0.8, "validation": 0.1, "test": 0.1}));
    assert!(json.get("metadata").is_none());

    let back: DatasetRecord = serde_json::from_value(json).unwrap();
    assert_eq!(back, rec);
}

#[test]
fn test_metadata_round_trips_and_updates() {
    let raw = upload();
    let split = split_dataset(&raw, 2);
    let rec = DatasetRecord::from_split(Uuid::new_v4(), "t", "annotated", &split)
        .with_metadata(json!({"source": "crm-export", "labels_reviewed": true}));

    let mut store = DatasetStore::new(InMemoryStorage::new());
    store.persist(&rec, &raw, &split).unwrap();
    let loaded = store.get_dataset_record(rec.id).unwrap().unwrap();
    assert_eq!(loaded.metadata, Some(json!({"source": "crm-export", "labels_reviewed": true})));

    let updated = store.update_metadata(rec.id, Some(json!({"source": "manual"}))).unwrap();
    assert_eq!(updated.metadata, Some(json!({"source": "manual"})));
    assert!(updated.updated_at >= updated.created_at);
    assert_eq!(updated.created_at, rec.created_at);
    assert_eq!(store.get_dataset_record(rec.id).unwrap(), Some(updated));

    let cleared = store.update_metadata(rec.id, None).unwrap();
    assert_eq!(cleared.metadata, None);

    assert!(matches!(store.update_metadata(Uuid::new_v4(), None), Err(StoreError::NotFound(_))));
}

#[test]
fn test_record_is_not_overwritten() {
    let mut store = DatasetStore::new(InMemoryStorage::new());
    let first = stored(&mut store, "t", "first", 1);

    let raw = upload();
    let split = split_dataset(&raw, 2);
    let second = DatasetRecord::from_split(first.id, "t", "second", &split);
    let err = store.persist(&second, &raw, &split).unwrap_err();
    assert!(matches!(err, StoreError::AlreadyExists(e) if e == first.id));
    assert_eq!(store.get_dataset_record(first.id).unwrap().unwrap().name, "first");
}

#[test]
fn test_list_is_scoped_by_tenant() {
    let mut store = DatasetStore::new(InMemoryStorage::new());
    stored(&mut store, "tenant-a", "a1", 1);
    stored(&mut store, "tenant-b", "b1", 2);
    stored(&mut store, "tenant-a", "a2", 3);

    let names = |tenant: &str| -> Vec<String> {
        store.list_datasets(tenant).unwrap().into_iter().map(|r| r.name).collect()
    };
    assert_eq!(names("tenant-a"), vec!["a1", "a2"]);
    assert_eq!(names("tenant-b"), vec!["b1"]);
    assert!(names("tenant-c").is_empty());
    assert_eq!(store.list_all_datasets().unwrap().len(), 3);
}

#[test]
fn test_delete_removes_everything() {
    let mut store = DatasetStore::new(InMemoryStorage::new());
    let a = stored(&mut store, "t", "a", 1);
    stored(&mut store, "t", "b", 2);

    store.delete_dataset(a.id).unwrap();
    assert_eq!(store.get_dataset_record(a.id).unwrap(), None);
    assert_eq!(store.get_raw(a.id).unwrap(), None);
    assert_eq!(store.get_split(a.id, SplitName::Train).unwrap(), None);
    assert_eq!(store.list_datasets("t").unwrap().len(), 1);

    assert!(matches!(store.delete_dataset(a.id), Err(StoreError::NotFound(_))));
}

#[test]
fn test_list_skips_dangling_index_entries() {
    let mut storage = InMemoryStorage::new();
    let ghost = Uuid::new_v4();
    datastore::Storage::put(&mut storage, KEY_DATASET_INDEX, &serde_json::to_vec(&[ghost]).unwrap()).unwrap();

    let store = DatasetStore::new(storage);
    assert!(store.list_all_datasets().unwrap().is_empty());
}

#[test]
fn test_put_split_and_create_record_directly() {
    let mut store = DatasetStore::new(InMemoryStorage::new());
    let raw = upload();
    let split = split_dataset(&raw, 5);
    let id = Uuid::new_v4();

    store.put_raw(id, &raw).unwrap();
    for (name, bytes) in split.serialized() {
        store.put_split(id, name, &bytes).unwrap();
    }
    let rec = DatasetRecord::from_split(id, "t", "manual", &split);
    store.create_dataset_record(&rec).unwrap();
    assert!(matches!(store.create_dataset_record(&rec), Err(StoreError::AlreadyExists(_))));

    assert_eq!(store.list_datasets("t").unwrap(), vec![rec]);
    // raw + 3 splits + record + index
    assert_eq!(store.into_storage().len(), 6);
}

#[test]
fn test_dir_storage_layout() {
    let root = std::env::temp_dir().join(format!("datastore-test-{}", Uuid::new_v4()));
    let mut store = DatasetStore::new(DirStorage::new(&root).unwrap());
    let raw = upload();
    let split = split_dataset(&raw, 3);
    let rec = DatasetRecord::from_split(Uuid::new_v4(), "t", "on-disk", &split);
    store.persist(&rec, &raw, &split).unwrap();

    let dir = root.join("datasets").join(rec.id.to_string());
    for file in ["record.json", "raw.jsonl", "train.jsonl", "validation.jsonl", "test.jsonl"] {
        assert!(dir.join(file).is_file(), "{file}");
    }
    assert_eq!(std::fs::read(dir.join("raw.jsonl")).unwrap(), raw);
    let train = std::fs::read(dir.join("train.jsonl")).unwrap();
    assert_eq!(read_split(&train), split.train());
    assert!(root.join("datasets").join("index.json").is_file());

    // a fresh store over the same directory sees the dataset
    let reopened = DatasetStore::new(DirStorage::new(&root).unwrap());
    assert_eq!(reopened.list_datasets("t").unwrap().len(), 1);

    std::fs::remove_dir_all(&root).unwrap();
}
