//! # Character Devices
//!
//! Setup of the character devices the driver exposes to user space.

/// Module that owns a device; keeps the module loaded while it is open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuleOwner(pub &'static str);

/// A host character device
pub trait CharDevice {
    /// File operations table type
    type Ops: 'static;

    /// Bind the operations table
    fn init(&mut self, ops: &'static Self::Ops);

    /// Record the owning module
    fn set_owner(&mut self, owner: ModuleOwner);
}

/// Initialise `cdev` with `ops`, owned by `owner`
pub fn init_char_device<D: CharDevice>(cdev: &mut D, ops: &'static D::Ops, owner: ModuleOwner) {
    cdev.init(ops);
    cdev.set_owner(owner);
}
