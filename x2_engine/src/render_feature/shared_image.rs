/// Image handed from a producer feature to consumer features.
///
/// The producer's data owns the slot and fills it during its resolve. The
/// renderer's resolve hook clones the slot into consumer data; consumers
/// read it during their own resolve, which runs after the producer's.

use std::sync::{Arc, Mutex};
use crate::error::Result;
use crate::resource::Image;
use crate::{engine_err, engine_err_invalid};

#[derive(Clone)]
pub struct SharedImage {
    name: Arc<str>,
    image: Arc<Mutex<Option<Arc<Image>>>>,
}

impl SharedImage {
    pub fn new(name: &str) -> Self {
        Self {
            name: Arc::from(name),
            image: Arc::new(Mutex::new(None)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Publish `image` to every clone of this slot
    pub fn set(&self, image: Arc<Image>) -> Result<()> {
        let mut slot = self.image.lock()
            .map_err(|_| engine_err!("x2::SharedImage", "Shared image '{}' lock poisoned", self.name))?;
        *slot = Some(image);
        Ok(())
    }

    /// The published image
    ///
    /// # Errors
    ///
    /// Returns an error if the producer has not resolved yet.
    pub fn get(&self) -> Result<Arc<Image>> {
        let slot = self.image.lock()
            .map_err(|_| engine_err!("x2::SharedImage", "Shared image '{}' lock poisoned", self.name))?;
        slot.clone().ok_or_else(|| engine_err_invalid!("x2::SharedImage",
            "Shared image '{}' has not been produced yet", self.name))
    }

    pub fn is_set(&self) -> bool {
        self.image.lock().map(|slot| slot.is_some()).unwrap_or(false)
    }

    /// Whether both handles refer to the same slot
    pub fn same_slot(&self, other: &SharedImage) -> bool {
        Arc::ptr_eq(&self.image, &other.image)
    }
}

impl std::fmt::Debug for SharedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedImage")
            .field("name", &self.name)
            .field("set", &self.is_set())
            .finish()
    }
}

#[cfg(test)]
#[path = "shared_image_tests.rs"]
mod tests;
