//! One cached [`Instance`] per compound.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::debug;

use crate::annotation::ComponentKind;
use crate::compound::{CompoundContainer, CompoundId};
use crate::error::CacheError;
use crate::instance::Instance;
use crate::storage::ProjectSpace;

/// Registry of instance caches over one project space.
///
/// Each compound gets its own [`Instance`] and thereby its own lock; the
/// registry lock only guards the map itself and is never held across a store
/// call.
pub struct InstanceManager {
    space: Arc<dyn ProjectSpace>,
    instances: RwLock<HashMap<CompoundId, Arc<Instance>>>,
}

impl InstanceManager {
    /// A manager without cached instances.
    #[must_use]
    pub fn new(space: Arc<dyn ProjectSpace>) -> Self {
        Self {
            space,
            instances: RwLock::new(HashMap::new()),
        }
    }

    /// The backing project space.
    #[must_use]
    pub fn space(&self) -> &Arc<dyn ProjectSpace> {
        &self.space
    }

    /// Returns the cache of `id`, creating it on first access.
    pub fn instance(&self, id: &CompoundId) -> Result<Arc<Instance>, CacheError> {
        {
            let instances = self
                .instances
                .read()
                .map_err(|_| CacheError::Poisoned { context: "manager.instance" })?;
            if let Some(instance) = instances.get(id) {
                return Ok(Arc::clone(instance));
            }
        }

        debug!(compound = %id, "creating instance cache");
        let container = self.space.compound(id, &[])?;
        let mut instances = self
            .instances
            .write()
            .map_err(|_| CacheError::Poisoned { context: "manager.instance" })?;
        let instance = instances
            .entry(id.clone())
            .or_insert_with(|| Arc::new(Instance::new(container, Arc::clone(&self.space))));
        Ok(Arc::clone(instance))
    }

    /// Caches of every compound in the project space, in directory-name order.
    pub fn instances(&self) -> Result<Vec<Arc<Instance>>, CacheError> {
        self.space
            .compound_ids()?
            .iter()
            .map(|id| self.instance(id))
            .collect()
    }

    /// Stores a new compound and returns its cache.
    pub fn create_compound(
        &self,
        container: &CompoundContainer,
        kinds: &[ComponentKind],
    ) -> Result<Arc<Instance>, CacheError> {
        self.space.update_compound(container, kinds)?;
        self.instance(container.id())
    }

    /// Drops the cache of `id` and deletes the compound from the store.
    pub fn delete_compound(&self, id: &CompoundId) -> Result<(), CacheError> {
        self.instances
            .write()
            .map_err(|_| CacheError::Poisoned { context: "manager.delete_compound" })?
            .remove(id);
        self.space.delete_compound(id)?;
        Ok(())
    }

    /// Number of instance caches created so far.
    pub fn cached_count(&self) -> Result<usize, CacheError> {
        Ok(self
            .instances
            .read()
            .map_err(|_| CacheError::Poisoned { context: "manager.cached_count" })?
            .len())
    }
}
