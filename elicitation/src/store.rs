//! Seed record and research cache persistence.
//!
//! Layout (file store):
//! - `<data_dir>/seeds/<sessionId>.json`    written once, never overwritten
//! - `<data_dir>/research/<sessionId>.json` last-write-wins via temp file + rename

use std::collections::HashMap;
use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tracing::debug;

use crate::config::{EngineConfig, StoreKind};
use crate::errors::StoreError;
use crate::model::{SeedRecord, TopicResearch};

/// Storage for the only server-side session state: the immutable seed and
/// the advisory research cache.
pub trait SeedStore: Send + Sync {
    /// Persists a new seed. Fails with [`StoreError::Conflict`] if the id exists.
    fn insert_seed(&self, seed: &SeedRecord) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn load_seed(
        &self,
        session_id: &str,
    ) -> impl Future<Output = Result<Option<SeedRecord>, StoreError>> + Send;

    fn load_research(
        &self,
        session_id: &str,
    ) -> impl Future<Output = Result<Option<TopicResearch>, StoreError>> + Send;

    /// Overwrites any previous entry.
    fn store_research(
        &self,
        session_id: &str,
        research: &TopicResearch,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/* ------------------------------------------------------------------------- */
/* File store                                                                */
/* ------------------------------------------------------------------------- */

/// JSON documents on disk.
#[derive(Debug, Clone)]
pub struct FileSeedStore {
    root: PathBuf,
}

impl FileSeedStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn seed_path(&self, session_id: &str) -> Option<PathBuf> {
        file_stem(session_id).map(|s| self.root.join("seeds").join(format!("{s}.json")))
    }

    fn research_path(&self, session_id: &str) -> Option<PathBuf> {
        file_stem(session_id).map(|s| self.root.join("research").join(format!("{s}.json")))
    }
}

/// Only plain ids become file names; anything else can never exist on disk.
fn file_stem(session_id: &str) -> Option<&str> {
    let ok = !session_id.is_empty()
        && session_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-');
    ok.then_some(session_id)
}

fn unsafe_id(session_id: &str) -> StoreError {
    StoreError::Io(std::io::Error::new(
        ErrorKind::InvalidInput,
        format!("unsafe session id `{session_id}`"),
    ))
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    match fs::read(path).await {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

impl SeedStore for FileSeedStore {
    async fn insert_seed(&self, seed: &SeedRecord) -> Result<(), StoreError> {
        let path = self
            .seed_path(&seed.session_id)
            .ok_or_else(|| unsafe_id(&seed.session_id))?;
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).await?;
        }
        let json = serde_json::to_vec_pretty(seed)?;

        let mut file = match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(StoreError::Conflict(seed.session_id.clone()));
            }
            Err(e) => return Err(e.into()),
        };
        file.write_all(&json).await?;
        file.flush().await?;
        debug!(path = %path.display(), "seed written");
        Ok(())
    }

    async fn load_seed(&self, session_id: &str) -> Result<Option<SeedRecord>, StoreError> {
        match self.seed_path(session_id) {
            Some(path) => read_json(&path).await,
            None => Ok(None),
        }
    }

    async fn load_research(&self, session_id: &str) -> Result<Option<TopicResearch>, StoreError> {
        match self.research_path(session_id) {
            Some(path) => read_json(&path).await,
            None => Ok(None),
        }
    }

    async fn store_research(
        &self,
        session_id: &str,
        research: &TopicResearch,
    ) -> Result<(), StoreError> {
        let path = self
            .research_path(session_id)
            .ok_or_else(|| unsafe_id(session_id))?;
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).await?;
        }
        let tmp = path.with_extension(format!("json.{}.tmp", uuid::Uuid::new_v4().simple()));
        fs::write(&tmp, serde_json::to_vec_pretty(research)?).await?;
        if let Err(e) = fs::rename(&tmp, &path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        debug!(path = %path.display(), "research cached");
        Ok(())
    }
}

/* ------------------------------------------------------------------------- */
/* Memory store                                                              */
/* ------------------------------------------------------------------------- */

#[derive(Debug, Default)]
pub struct MemorySeedStore {
    seeds: RwLock<HashMap<String, SeedRecord>>,
    research: RwLock<HashMap<String, TopicResearch>>,
}

impl SeedStore for MemorySeedStore {
    async fn insert_seed(&self, seed: &SeedRecord) -> Result<(), StoreError> {
        let mut seeds = self.seeds.write().await;
        if seeds.contains_key(&seed.session_id) {
            return Err(StoreError::Conflict(seed.session_id.clone()));
        }
        seeds.insert(seed.session_id.clone(), seed.clone());
        Ok(())
    }

    async fn load_seed(&self, session_id: &str) -> Result<Option<SeedRecord>, StoreError> {
        Ok(self.seeds.read().await.get(session_id).cloned())
    }

    async fn load_research(&self, session_id: &str) -> Result<Option<TopicResearch>, StoreError> {
        Ok(self.research.read().await.get(session_id).cloned())
    }

    async fn store_research(
        &self,
        session_id: &str,
        research: &TopicResearch,
    ) -> Result<(), StoreError> {
        self.research
            .write()
            .await
            .insert(session_id.to_string(), research.clone());
        Ok(())
    }
}

/* ------------------------------------------------------------------------- */
/* Runtime selection                                                         */
/* ------------------------------------------------------------------------- */

/// Store picked from [`EngineConfig::store`] at startup.
#[derive(Debug)]
pub enum ConfiguredStore {
    File(FileSeedStore),
    Memory(MemorySeedStore),
}

impl ConfiguredStore {
    pub fn from_config(cfg: &EngineConfig) -> Self {
        match cfg.store {
            StoreKind::File => ConfiguredStore::File(FileSeedStore::new(&cfg.data_dir)),
            StoreKind::Memory => ConfiguredStore::Memory(MemorySeedStore::default()),
        }
    }
}

impl SeedStore for ConfiguredStore {
    async fn insert_seed(&self, seed: &SeedRecord) -> Result<(), StoreError> {
        match self {
            ConfiguredStore::File(s) => s.insert_seed(seed).await,
            ConfiguredStore::Memory(s) => s.insert_seed(seed).await,
        }
    }

    async fn load_seed(&self, session_id: &str) -> Result<Option<SeedRecord>, StoreError> {
        match self {
            ConfiguredStore::File(s) => s.load_seed(session_id).await,
            ConfiguredStore::Memory(s) => s.load_seed(session_id).await,
        }
    }

    async fn load_research(&self, session_id: &str) -> Result<Option<TopicResearch>, StoreError> {
        match self {
            ConfiguredStore::File(s) => s.load_research(session_id).await,
            ConfiguredStore::Memory(s) => s.load_research(session_id).await,
        }
    }

    async fn store_research(
        &self,
        session_id: &str,
        research: &TopicResearch,
    ) -> Result<(), StoreError> {
        match self {
            ConfiguredStore::File(s) => s.store_research(session_id, research).await,
            ConfiguredStore::Memory(s) => s.store_research(session_id, research).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Topic;
    use chrono::Utc;

    fn seed(id: &str) -> SeedRecord {
        SeedRecord {
            session_id: id.into(),
            topic: Topic::parse(vec!["ウォーターサーバー".into(), "比較".into()]).unwrap(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn file_store_round_trips_seed_and_rejects_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSeedStore::new(dir.path());
        let s = seed("0b6f3c1e-2a47-4f7c-9d43-7d1f2b8a9e10");

        store.insert_seed(&s).await.unwrap();
        assert!(dir.path().join("seeds").join(format!("{}.json", s.session_id)).exists());
        assert_eq!(store.load_seed(&s.session_id).await.unwrap(), Some(s.clone()));

        let err = store.insert_seed(&s).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn file_store_research_is_last_write_wins() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSeedStore::new(dir.path());
        let id = "a1";

        assert_eq!(store.load_research(id).await.unwrap(), None);
        let first = TopicResearch {
            related: vec!["x".into()],
            ..Default::default()
        };
        let second = TopicResearch {
            target: vec!["y".into()],
            ..Default::default()
        };
        store.store_research(id, &first).await.unwrap();
        store.store_research(id, &second).await.unwrap();
        assert_eq!(store.load_research(id).await.unwrap(), Some(second));

        let leftovers: Vec<_> = std::fs::read_dir(dir.path().join("research"))
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn path_like_ids_never_touch_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSeedStore::new(dir.path());
        assert_eq!(store.load_seed("../etc/passwd").await.unwrap(), None);
        assert!(store.insert_seed(&seed("../x")).await.is_err());
    }

    #[tokio::test]
    async fn memory_store_behaves_like_file_store() {
        let store = MemorySeedStore::default();
        let s = seed("m1");
        assert_eq!(store.load_seed("m1").await.unwrap(), None);
        store.insert_seed(&s).await.unwrap();
        assert!(matches!(
            store.insert_seed(&s).await,
            Err(StoreError::Conflict(_))
        ));
        assert_eq!(store.load_seed("m1").await.unwrap(), Some(s));

        store
            .store_research("m1", &TopicResearch::default())
            .await
            .unwrap();
        assert_eq!(
            store.load_research("m1").await.unwrap(),
            Some(TopicResearch::default())
        );
    }

    #[tokio::test]
    async fn configured_store_follows_config() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = EngineConfig {
            data_dir: dir.path().to_path_buf(),
            store: StoreKind::Memory,
            ..Default::default()
        };
        let store = ConfiguredStore::from_config(&cfg);
        assert!(matches!(store, ConfiguredStore::Memory(_)));
        store.insert_seed(&seed("c1")).await.unwrap();
        assert!(store.load_seed("c1").await.unwrap().is_some());
        assert!(!dir.path().join("seeds").exists());
    }
}
