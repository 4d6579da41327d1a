//! Location authorization states reported by the platform.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionState {
    #[default]
    NotDetermined,
    Restricted,
    Denied,
    AuthorizedAlways,
    AuthorizedWhenInUse,
    /// A state this build does not know about.
    #[serde(other)]
    Unknown,
}

impl PermissionState {
    pub fn is_authorized(self) -> bool {
        matches!(
            self,
            PermissionState::AuthorizedAlways | PermissionState::AuthorizedWhenInUse
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unrecognized_state_parses_as_unknown() {
        let state: PermissionState = serde_json::from_str("\"provisional\"").unwrap();
        assert_eq!(state, PermissionState::Unknown);
    }

    #[test]
    fn test_authorized_states() {
        assert!(PermissionState::AuthorizedWhenInUse.is_authorized());
        assert!(PermissionState::AuthorizedAlways.is_authorized());
        assert!(!PermissionState::Denied.is_authorized());
        assert!(!PermissionState::Unknown.is_authorized());
    }
}
