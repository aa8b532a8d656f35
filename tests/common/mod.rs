//! Shared fixtures for integration specs.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};

use rhc_features::error::SubsystemError;
use rhc_features::system::HostSystem;

/// In-memory host that records every mutating call.
#[derive(Default)]
pub struct MockHost {
    pub registered: bool,
    pub content: Cell<bool>,
    pub analytics: Cell<bool>,
    pub remote_management: Cell<bool>,
    /// Operations (by name) that fail when called.
    pub failing: Vec<&'static str>,
    pub calls: RefCell<Vec<&'static str>>,
}

impl MockHost {
    pub fn unregistered() -> Self {
        Self::default()
    }

    pub fn registered(content: bool, analytics: bool, remote_management: bool) -> Self {
        Self {
            registered: true,
            content: Cell::new(content),
            analytics: Cell::new(analytics),
            remote_management: Cell::new(remote_management),
            ..Default::default()
        }
    }

    pub fn failing(mut self, operation: &'static str) -> Self {
        self.failing.push(operation);
        self
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.borrow().clone()
    }

    fn check(&self, operation: &'static str) -> Result<(), SubsystemError> {
        if self.failing.contains(&operation) {
            Err(SubsystemError::CommandFailed {
                command: operation.to_string(),
                message: "simulated failure".to_string(),
            })
        } else {
            Ok(())
        }
    }

    fn mutate(&self, operation: &'static str, cell: &Cell<bool>, value: bool) -> Result<(), SubsystemError> {
        self.calls.borrow_mut().push(operation);
        self.check(operation)?;
        cell.set(value);
        Ok(())
    }
}

impl HostSystem for MockHost {
    fn is_registered(&self) -> bool {
        self.registered
    }

    fn content_enabled(&self) -> Result<bool, SubsystemError> {
        self.check("probe-content").map(|_| self.content.get())
    }

    fn set_content_enabled(&self, enabled: bool) -> Result<(), SubsystemError> {
        let operation = if enabled { "enable-content" } else { "disable-content" };
        self.mutate(operation, &self.content, enabled)
    }

    fn analytics_registered(&self) -> Result<bool, SubsystemError> {
        self.check("probe-analytics").map(|_| self.analytics.get())
    }

    fn register_analytics(&self) -> Result<(), SubsystemError> {
        self.mutate("register-analytics", &self.analytics, true)
    }

    fn unregister_analytics(&self) -> Result<(), SubsystemError> {
        self.mutate("unregister-analytics", &self.analytics, false)
    }

    fn remote_management_active(&self) -> Result<bool, SubsystemError> {
        self.check("probe-remote-management").map(|_| self.remote_management.get())
    }

    fn activate_remote_management(&self) -> Result<(), SubsystemError> {
        self.mutate("activate-remote-management", &self.remote_management, true)
    }

    fn deactivate_remote_management(&self) -> Result<(), SubsystemError> {
        self.mutate("deactivate-remote-management", &self.remote_management, false)
    }
}

pub fn ids(list: &[&str]) -> Vec<String> {
    list.iter().map(|id| id.to_string()).collect()
}

pub fn sorted(mut list: Vec<String>) -> Vec<String> {
    list.sort();
    list
}
