//! # Object Caches
//!
//! Wrapper over the host kernel's fixed-size object cache allocator.

use uvm_core::Result;

/// A host object cache (slab cache)
pub trait ObjectCache: Sized {
    /// Create a cache of `object_size`-byte objects
    fn create(name: &'static str, object_size: usize) -> Result<Self>;

    /// Destroy the cache; every object must already be freed
    fn destroy(self);
}

/// Destroy the cache in `slot`, if any, and leave `None` behind
///
/// Safe to call on an empty slot and to call repeatedly, so teardown paths
/// can run it unconditionally.
pub fn destroy_safe<C: ObjectCache>(slot: &mut Option<C>) {
    if let Some(cache) = slot.take() {
        cache.destroy();
    }
}
