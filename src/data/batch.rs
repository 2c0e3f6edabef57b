//! Data batch
//!
//! Puts and deletes collected by the caller and written as one atomic
//! store batch.

use crate::error::Result;
use crate::key::{self, check_name, IndexSet, Value};
use crate::options::WriteOptions;
use crate::store::{OrderedStore, WriteBatch};

use super::db::DataDb;
use super::maintainer::{self, PendingRefs, StoreRefs};
use super::read::DataRead;

#[derive(Debug)]
enum Intent {
    Put {
        object_key: Vec<u8>,
        body: Vec<u8>,
        indexes: IndexSet,
    },
    Delete {
        object_key: Vec<u8>,
    },
}

/// Deferred writes against a [`DataDb`]
///
/// Nothing touches the store until [`write`](DataBatch::write). Intents
/// are then resolved in order under the indexes lock, each one seeing the
/// reference records left by the previous ones, so the same key may appear
/// several times.
pub struct DataBatch<'db, S: OrderedStore> {
    db: &'db DataDb<S>,
    intents: Vec<Intent>,
}

impl<'db, S: OrderedStore> DataBatch<'db, S> {
    pub(crate) fn new(db: &'db DataDb<S>) -> Self {
        Self {
            db,
            intents: Vec::new(),
        }
    }

    /// Queue a put; returns the number of body bytes it will write
    pub fn put(
        &mut self,
        type_name: &str,
        primary_key: &Value,
        body: &[u8],
        indexes: &IndexSet,
    ) -> Result<usize> {
        self.put_and_get_key(type_name, primary_key, body, indexes)
            .map(|(_, len)| len)
    }

    /// Queue a put; returns the record's object key and body length
    pub fn put_and_get_key(
        &mut self,
        type_name: &str,
        primary_key: &Value,
        body: &[u8],
        indexes: &IndexSet,
    ) -> Result<(Vec<u8>, usize)> {
        check_name("type", type_name)?;
        let object_key = key::object_key(type_name, Some(primary_key), false);
        self.intents.push(Intent::Put {
            object_key: object_key.clone(),
            body: body.to_vec(),
            indexes: indexes.clone(),
        });
        Ok((object_key, body.len()))
    }

    /// Queue deletion of the record at `key`
    pub fn delete(&mut self, key: &[u8]) {
        self.intents.push(Intent::Delete {
            object_key: key.to_vec(),
        });
    }

    /// Number of queued intents
    pub fn len(&self) -> usize {
        self.intents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intents.is_empty()
    }

    /// Drop every queued intent
    pub fn clear(&mut self) {
        self.intents.clear();
    }

    /// Write every queued intent atomically, then empty the batch
    ///
    /// On error nothing is written and the intents stay queued.
    pub fn write(&mut self, options: &WriteOptions) -> Result<()> {
        if self.intents.is_empty() {
            return Ok(());
        }

        let store = self.db.store().as_ref();
        let guard = self.db.indexes_lock().acquire();
        let base = StoreRefs::latest(store);
        let mut refs = PendingRefs::new(&base);
        let mut batch = WriteBatch::new();

        for intent in &self.intents {
            let mut mutations = match intent {
                Intent::Put {
                    object_key,
                    body,
                    indexes,
                } => maintainer::compute_put_mutations(&guard, &refs, object_key, body, indexes)?,
                Intent::Delete { object_key } => {
                    maintainer::compute_delete_mutations(&guard, &refs, object_key)?
                }
            };
            refs.record(&mutations);
            batch.append(&mut mutations.batch);
        }

        store.write(&batch, options)?;
        drop(guard);

        tracing::debug!(intents = self.intents.len(), ops = batch.len(), "batch written");
        self.intents.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::ReadOptions;

    fn value(segments: &[&str]) -> Value {
        Value::of_ascii(segments).unwrap()
    }

    #[test]
    fn test_nothing_written_before_write() {
        let db = DataDb::in_memory();
        let mut batch = db.new_batch();
        let key = db.object_key("Test", &value(&["aaa"])).unwrap();

        batch
            .put("Test", &value(&["aaa"]), b"body", &IndexSet::new())
            .unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(db.get(&key, &ReadOptions::DEFAULT).unwrap(), None);

        batch.write(&WriteOptions::DEFAULT).unwrap();
        assert!(batch.is_empty());
        assert_eq!(
            db.get(&key, &ReadOptions::DEFAULT).unwrap(),
            Some(b"body".to_vec())
        );
    }

    #[test]
    fn test_clear_discards_intents() {
        let db = DataDb::in_memory();
        let mut batch = db.new_batch();
        batch.delete(b"o\0Test\0aaa\0");
        batch.clear();
        assert!(batch.is_empty());
        batch.write(&WriteOptions::DEFAULT).unwrap();
    }
}
