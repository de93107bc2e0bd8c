use std::{
    collections::{HashMap, HashSet},
    marker::PhantomData,
};

use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::{OnceCell, RwLock};
use uuid::Uuid;

use crate::db::{JsonStore, StoreError, StoreResult};

/// A flat record persisted in one named collection.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const COLLECTION: &'static str;

    fn id(&self) -> Uuid;
    fn set_id(&mut self, id: Uuid);
}

/// Records in document order plus their positions by id.
struct Arena<R> {
    records: Vec<R>,
    index: HashMap<Uuid, usize>,
}

impl<R: Record> Arena<R> {
    fn new(records: Vec<R>) -> Self {
        let index = records
            .iter()
            .enumerate()
            .map(|(pos, r)| (r.id(), pos))
            .collect();
        Self { records, index }
    }

    fn get(&self, id: Uuid) -> Option<&R> {
        self.index.get(&id).map(|&pos| &self.records[pos])
    }
}

/// Typed accessors over one collection of the [`JsonStore`].
///
/// The document is loaded on first use and then served from memory. A
/// mutation holds the write lock, builds the next version of the collection,
/// flushes it and only then swaps it in, so a failed write leaves memory and
/// disk agreeing. Writers in other processes sharing the same data directory
/// are not coordinated.
pub struct Repository<R> {
    store: JsonStore,
    arena: OnceCell<RwLock<Arena<R>>>,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record> Repository<R> {
    pub fn new(store: JsonStore) -> Self {
        Self {
            store,
            arena: OnceCell::new(),
            _record: PhantomData,
        }
    }

    pub fn collection(&self) -> &'static str {
        R::COLLECTION
    }

    /// A malformed document is not cached, so every call reports it again.
    async fn arena(&self) -> StoreResult<&RwLock<Arena<R>>> {
        self.arena
            .get_or_try_init(|| async {
                let records: Vec<R> = self.store.load(R::COLLECTION).await?;
                tracing::debug!(
                    collection = R::COLLECTION,
                    records = records.len(),
                    "collection loaded"
                );
                Ok::<_, StoreError>(RwLock::new(Arena::new(records)))
            })
            .await
    }

    async fn flush(&self, arena: &mut Arena<R>, records: Vec<R>) -> StoreResult<()> {
        self.store.save(R::COLLECTION, &records).await?;
        *arena = Arena::new(records);
        Ok(())
    }

    pub async fn all(&self) -> StoreResult<Vec<R>> {
        Ok(self.arena().await?.read().await.records.clone())
    }

    pub async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<R>> {
        Ok(self.arena().await?.read().await.get(id).cloned())
    }

    pub async fn find_all_by<P>(&self, predicate: P) -> StoreResult<Vec<R>>
    where
        P: Fn(&R) -> bool,
    {
        let arena = self.arena().await?.read().await;
        Ok(arena.records.iter().filter(|r| predicate(r)).cloned().collect())
    }

    pub async fn find_one_by<P>(&self, predicate: P) -> StoreResult<Option<R>>
    where
        P: Fn(&R) -> bool,
    {
        let arena = self.arena().await?.read().await;
        Ok(arena.records.iter().find(|r| predicate(r)).cloned())
    }

    /// Insert `record`, giving it a fresh id when its id is nil or taken.
    pub async fn append(&self, record: R) -> StoreResult<R> {
        let mut inserted = self.append_many(vec![record]).await?;
        Ok(inserted.remove(0))
    }

    /// Insert `record` only if `check` accepts the current collection.
    /// The check and the write happen under the same lock, so uniqueness
    /// rules such as "one email per user" hold between concurrent requests.
    pub async fn append_checked<F, E>(&self, record: R, check: F) -> Result<R, E>
    where
        F: FnOnce(&[R]) -> Result<(), E>,
        E: From<StoreError>,
    {
        let mut arena = self.arena().await?.write().await;
        check(&arena.records)?;
        let mut inserted = self.insert_locked(&mut arena, vec![record], None).await?;
        Ok(inserted.remove(0))
    }

    /// Insert all `records` with a single write of the collection.
    pub async fn append_many(&self, records: Vec<R>) -> StoreResult<Vec<R>> {
        let mut arena = self.arena().await?.write().await;
        self.insert_locked(&mut arena, records, None).await
    }

    /// Insert `record`, then drop the oldest records so at most `keep`
    /// remain. For append-only logs that would otherwise grow without bound.
    pub async fn append_bounded(&self, record: R, keep: usize) -> StoreResult<R> {
        let mut arena = self.arena().await?.write().await;
        let mut inserted = self
            .insert_locked(&mut arena, vec![record], Some(keep.max(1)))
            .await?;
        Ok(inserted.remove(0))
    }

    async fn insert_locked(
        &self,
        arena: &mut Arena<R>,
        records: Vec<R>,
        keep: Option<usize>,
    ) -> StoreResult<Vec<R>> {
        let mut taken: HashSet<Uuid> = arena.index.keys().copied().collect();

        let mut inserted = Vec::with_capacity(records.len());
        for mut record in records {
            if record.id().is_nil() || taken.contains(&record.id()) {
                record.set_id(fresh_id(&taken));
            }
            taken.insert(record.id());
            inserted.push(record);
        }

        let mut next = arena.records.clone();
        next.extend(inserted.iter().cloned());
        if let Some(keep) = keep {
            let excess = next.len().saturating_sub(keep);
            next.drain(..excess);
        }
        self.flush(arena, next).await?;
        Ok(inserted)
    }

    /// Overwrite the stored record that has `record`'s id.
    pub async fn replace(&self, record: R) -> StoreResult<R> {
        let id = record.id();
        self.update(id, move |slot| {
            *slot = record;
            Ok::<(), StoreError>(())
        })
        .await
    }

    /// Mutate a record in place. When `apply` fails nothing is written.
    pub async fn update<F, E>(&self, id: Uuid, apply: F) -> Result<R, E>
    where
        F: FnOnce(&mut R) -> Result<(), E>,
        E: From<StoreError>,
    {
        let mut arena = self.arena().await?.write().await;
        let pos = match arena.index.get(&id) {
            Some(&pos) => pos,
            None => return Err(self.not_found(id).into()),
        };

        let mut updated = arena.records[pos].clone();
        apply(&mut updated)?;
        // the id is immutable whatever the closure did
        updated.set_id(id);

        let mut next = arena.records.clone();
        next[pos] = updated.clone();
        self.flush(&mut arena, next).await?;
        Ok(updated)
    }

    /// Drop the record with `id` and return it. Cleaning up anything the
    /// record pointed at is left to the caller.
    pub async fn remove(&self, id: Uuid) -> StoreResult<R> {
        let mut arena = self.arena().await?.write().await;
        let pos = match arena.index.get(&id) {
            Some(&pos) => pos,
            None => return Err(self.not_found(id)),
        };

        let mut next = arena.records.clone();
        let removed = next.remove(pos);
        self.flush(&mut arena, next).await?;
        Ok(removed)
    }

    fn not_found(&self, id: Uuid) -> StoreError {
        StoreError::NotFound {
            collection: R::COLLECTION.to_string(),
            id,
        }
    }
}

fn fresh_id(taken: &HashSet<Uuid>) -> Uuid {
    loop {
        let id = Uuid::new_v4();
        if !taken.contains(&id) {
            return id;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::sync::Arc;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Note {
        id: Uuid,
        owner: String,
        body: String,
    }

    impl Record for Note {
        const COLLECTION: &'static str = "notes";

        fn id(&self) -> Uuid {
            self.id
        }

        fn set_id(&mut self, id: Uuid) {
            self.id = id;
        }
    }

    fn note(id: Uuid, owner: &str, body: &str) -> Note {
        Note {
            id,
            owner: owner.into(),
            body: body.into(),
        }
    }

    fn repo(dir: &tempfile::TempDir) -> Repository<Note> {
        Repository::new(JsonStore::new(dir.path()))
    }

    #[tokio::test]
    async fn append_assigns_unique_ids() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let repo = repo(&dir);

        let a = repo.append(note(Uuid::nil(), "ann", "first")).await?;
        let b = repo.append(note(a.id, "bob", "copies a's id")).await?;
        let c = repo.append(note(Uuid::nil(), "cat", "third")).await?;

        assert!(!a.id.is_nil());
        assert_ne!(a.id, b.id);
        assert_ne!(b.id, c.id);
        let ids: HashSet<Uuid> = repo.all().await?.iter().map(|n| n.id).collect();
        assert_eq!(ids.len(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn append_keeps_a_caller_supplied_free_id() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let repo = repo(&dir);
        let id = Uuid::new_v4();

        let stored = repo.append(note(id, "ann", "hi")).await?;
        assert_eq!(stored.id, id);
        assert_eq!(repo.find_by_id(id).await?, Some(stored));
        Ok(())
    }

    #[tokio::test]
    async fn find_all_by_filters_on_foreign_key() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let repo = repo(&dir);
        repo.append_many(vec![
            note(Uuid::nil(), "ann", "1"),
            note(Uuid::nil(), "bob", "2"),
            note(Uuid::nil(), "ann", "3"),
        ])
        .await?;

        let anns = repo.find_all_by(|n| n.owner == "ann").await?;
        assert_eq!(anns.len(), 2);
        assert!(anns.iter().all(|n| n.owner == "ann"));
        Ok(())
    }

    #[tokio::test]
    async fn append_checked_rejects_without_writing() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let repo = repo(&dir);
        repo.append(note(Uuid::nil(), "ann", "first")).await?;

        let unique_owner = |owner: &'static str| {
            move |notes: &[Note]| {
                if notes.iter().any(|n| n.owner == owner) {
                    Err(StoreError::NotFound {
                        collection: "notes".into(),
                        id: Uuid::nil(),
                    })
                } else {
                    Ok(())
                }
            }
        };

        let dup = repo
            .append_checked(note(Uuid::nil(), "ann", "second"), unique_owner("ann"))
            .await;
        assert!(dup.is_err());
        let ok = repo
            .append_checked(note(Uuid::nil(), "bob", "third"), unique_owner("bob"))
            .await;
        assert!(ok.is_ok());
        assert_eq!(repo.all().await?.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn replace_missing_record_is_not_found() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let repo = repo(&dir);

        let result = repo.replace(note(Uuid::new_v4(), "ann", "ghost")).await;
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
        assert!(repo.all().await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn rejected_update_leaves_record_untouched() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let repo = repo(&dir);
        let stored = repo.append(note(Uuid::nil(), "ann", "keep")).await?;

        let result: Result<Note, StoreError> = repo
            .update(stored.id, |n| {
                n.body = "changed".into();
                Err(StoreError::NotFound {
                    collection: "notes".into(),
                    id: n.id,
                })
            })
            .await;

        assert!(result.is_err());
        assert_eq!(repo.find_by_id(stored.id).await?.map(|n| n.body), Some("keep".into()));
        Ok(())
    }

    #[tokio::test]
    async fn update_cannot_change_the_id() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let repo = repo(&dir);
        let stored = repo.append(note(Uuid::nil(), "ann", "x")).await?;

        let updated: Note = repo
            .update(stored.id, |n| {
                n.id = Uuid::new_v4();
                n.body = "y".into();
                Ok::<(), StoreError>(())
            })
            .await?;
        assert_eq!(updated.id, stored.id);
        assert_eq!(updated.body, "y");
        Ok(())
    }

    #[tokio::test]
    async fn remove_returns_the_dropped_record() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let repo = repo(&dir);
        let a = repo.append(note(Uuid::nil(), "ann", "a")).await?;
        let b = repo.append(note(Uuid::nil(), "bob", "b")).await?;

        let removed = repo.remove(a.id).await?;
        assert_eq!(removed, a);
        assert_eq!(repo.all().await?, vec![b]);
        assert!(matches!(repo.remove(a.id).await, Err(StoreError::NotFound { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn concurrent_appends_are_all_kept() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let repo = Arc::new(repo(&dir));

        let mut handles = Vec::new();
        for i in 0..16 {
            let repo = Arc::clone(&repo);
            handles.push(tokio::spawn(async move {
                repo.append(note(Uuid::nil(), "ann", &i.to_string())).await
            }));
        }
        for handle in handles {
            handle.await??;
        }

        assert_eq!(repo.all().await?.len(), 16);
        Ok(())
    }

    #[tokio::test]
    async fn append_bounded_keeps_the_newest() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let repo = repo(&dir);
        for i in 0..5 {
            repo.append_bounded(note(Uuid::nil(), "ann", &i.to_string()), 3).await?;
        }

        let bodies: Vec<String> = repo.all().await?.into_iter().map(|n| n.body).collect();
        assert_eq!(bodies, vec!["2", "3", "4"]);
        Ok(())
    }

    #[tokio::test]
    async fn writes_reach_disk_for_a_fresh_reader() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let first = repo(&dir);
        let kept = first.append(note(Uuid::nil(), "ann", "kept")).await?;
        let gone = first.append(note(Uuid::nil(), "bob", "gone")).await?;
        first.remove(gone.id).await?;

        let second = repo(&dir);
        assert_eq!(second.all().await?, vec![kept]);
        Ok(())
    }

    #[tokio::test]
    async fn malformed_document_is_reported_on_every_read() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        std::fs::write(dir.path().join("notes.json"), "[{")?;
        let repo = repo(&dir);

        assert!(matches!(repo.all().await, Err(StoreError::Malformed { .. })));
        assert!(matches!(
            repo.find_by_id(Uuid::new_v4()).await,
            Err(StoreError::Malformed { .. })
        ));
        Ok(())
    }
}
