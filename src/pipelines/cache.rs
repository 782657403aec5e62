use crate::error::{PipelineError, Result};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

pub trait ModelOptions {
    fn cache_key(&self) -> String;
}

// Entries are weak: a checkpoint is freed once every pipeline using it drops.
type CacheStorage = HashMap<(TypeId, String), Box<dyn Any + Send + Sync>>;

pub struct ModelCache {
    cache: Mutex<CacheStorage>,
}

impl ModelCache {
    pub fn new() -> Self {
        Self {
            cache: Mutex::new(HashMap::new()),
        }
    }

    fn storage(&self) -> Result<MutexGuard<'_, CacheStorage>> {
        self.cache
            .lock()
            .map_err(|_| PipelineError::Unexpected("Model cache lock poisoned".into()))
    }

    pub fn get_or_create<M, F>(&self, key: &str, loader: F) -> Result<Arc<M>>
    where
        M: Send + Sync + 'static,
        F: FnOnce() -> Result<M>,
    {
        let cache_key = (TypeId::of::<M>(), key.to_string());

        {
            let mut cache = self.storage()?;
            if let Some(boxed) = cache.get(&cache_key) {
                if let Some(strong) = boxed.downcast_ref::<Weak<M>>().and_then(Weak::upgrade) {
                    tracing::debug!(key, "reusing cached model");
                    return Ok(strong);
                }
                cache.remove(&cache_key);
            }
        }

        let model = Arc::new(loader()?);

        self.storage()?
            .insert(cache_key, Box::new(Arc::downgrade(&model)));

        Ok(model)
    }

    #[cfg(test)]
    pub fn clear(&self) -> Result<()> {
        self.storage()?.clear();
        Ok(())
    }

    #[cfg(test)]
    pub fn len(&self) -> Result<usize> {
        Ok(self.storage()?.len())
    }
}

impl Default for ModelCache {
    fn default() -> Self {
        Self::new()
    }
}

static GLOBAL_MODEL_CACHE: once_cell::sync::Lazy<ModelCache> =
    once_cell::sync::Lazy::new(ModelCache::new);

pub fn global_cache() -> &'static ModelCache {
    &GLOBAL_MODEL_CACHE
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestModel {
        id: String,
    }

    #[test]
    fn test_cache_returns_same_instance() {
        let cache = ModelCache::new();
        let model1 = cache
            .get_or_create::<TestModel, _>("sst2", || {
                Ok(TestModel {
                    id: "original".into(),
                })
            })
            .unwrap();
        let model2 = cache
            .get_or_create::<TestModel, _>("sst2", || Ok(TestModel { id: "new".into() }))
            .unwrap();
        assert_eq!(model1.id, model2.id);
        assert!(Arc::ptr_eq(&model1, &model2));
    }

    #[test]
    fn test_dropped_model_is_reloaded() {
        let cache = ModelCache::new();
        let first = cache
            .get_or_create::<TestModel, _>("k", || Ok(TestModel { id: "a".into() }))
            .unwrap();
        drop(first);
        let second = cache
            .get_or_create::<TestModel, _>("k", || Ok(TestModel { id: "b".into() }))
            .unwrap();
        assert_eq!(second.id, "b");
    }

    #[test]
    fn test_failed_load_is_not_cached() {
        let cache = ModelCache::new();
        let err = cache.get_or_create::<TestModel, _>("broken", || {
            Err(PipelineError::Download("offline".into()))
        });
        assert!(err.is_err());
        assert_eq!(cache.len().unwrap(), 0);
    }

    #[test]
    fn test_different_keys_independent() {
        let cache = ModelCache::new();

        let model1 = cache
            .get_or_create::<TestModel, _>("sentiment", || Ok(TestModel { id: "first".into() }))
            .unwrap();

        let model2 = cache
            .get_or_create::<TestModel, _>("sarcasm", || {
                Ok(TestModel {
                    id: "second".into(),
                })
            })
            .unwrap();

        assert_eq!(model1.id, "first");
        assert_eq!(model2.id, "second");
        assert_eq!(cache.len().unwrap(), 2);

        cache.clear().unwrap();
        assert_eq!(cache.len().unwrap(), 0);
    }
}
