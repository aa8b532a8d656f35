use serde::{Deserialize, Serialize};

pub const CONTENT: &str = "content";
pub const ANALYTICS: &str = "analytics";
pub const REMOTE_MANAGEMENT: &str = "remote-management";

/// Keys understood in a preference record, in catalog order.
pub const PREFERENCE_KEYS: [&str; 3] = [CONTENT, ANALYTICS, REMOTE_MANAGEMENT];

/// Tri-state preference per known feature.
///
/// `None` means the operator expressed no preference. Unset values are left
/// out of the serialized form.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeaturePreferences {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analytics: Option<bool>,
    #[serde(
        rename = "remote-management",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub remote_management: Option<bool>,
}

impl FeaturePreferences {
    /// Preference stored for a feature ID. Unknown IDs have none.
    pub fn get(&self, id: &str) -> Option<bool> {
        match id {
            CONTENT => self.content,
            ANALYTICS => self.analytics,
            REMOTE_MANAGEMENT => self.remote_management,
            _ => None,
        }
    }

    /// Record a preference. Returns false if the ID has no preference slot.
    pub fn set(&mut self, id: &str, enabled: bool) -> bool {
        let slot = match id {
            CONTENT => &mut self.content,
            ANALYTICS => &mut self.analytics,
            REMOTE_MANAGEMENT => &mut self.remote_management,
            _ => return false,
        };
        *slot = Some(enabled);
        true
    }

    pub fn entries(&self) -> [(&'static str, Option<bool>); 3] {
        [
            (CONTENT, self.content),
            (ANALYTICS, self.analytics),
            (REMOTE_MANAGEMENT, self.remote_management),
        ]
    }

    /// Apply every value that is set in `other` on top of `self`.
    pub fn overlay(&mut self, other: &FeaturePreferences) {
        for (id, value) in other.entries() {
            if let Some(enabled) = value {
                self.set(id, enabled);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries().iter().all(|(_, value)| value.is_none())
    }
}
