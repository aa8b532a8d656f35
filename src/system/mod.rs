//! Subsystems that features delegate to when toggled.
//!
//! The reconciliation engine only talks to [`HostSystem`]. [`CommandHost`]
//! drives the real system through its command-line tools; tests substitute
//! their own implementation.

mod command;

pub use command::*;

use crate::error::SubsystemError;

/// Live view of the host and the mutating operations features rely on.
///
/// Every mutating operation must be idempotent: calling it when the
/// subsystem is already in the target state succeeds without side effects.
pub trait HostSystem {
    /// Whether the host is connected to its managing service. Transitions act
    /// on live state only when this is true.
    fn is_registered(&self) -> bool;

    // Content (package repositories)
    fn content_enabled(&self) -> Result<bool, SubsystemError>;
    fn set_content_enabled(&self, enabled: bool) -> Result<(), SubsystemError>;

    // Analytics client
    fn analytics_registered(&self) -> Result<bool, SubsystemError>;
    fn register_analytics(&self) -> Result<(), SubsystemError>;
    fn unregister_analytics(&self) -> Result<(), SubsystemError>;

    // Remote management service
    fn remote_management_active(&self) -> Result<bool, SubsystemError>;
    fn activate_remote_management(&self) -> Result<(), SubsystemError>;
    fn deactivate_remote_management(&self) -> Result<(), SubsystemError>;
}
