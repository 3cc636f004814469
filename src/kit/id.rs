//! Branded identifiers
//!
//! Each entity class gets its own id newtype so a file id can never be
//! handed to something expecting a layout-entry or task id. All serialize
//! as plain UUID strings.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! branded_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

branded_id!(
    /// Identifies one imported audio file
    FileId
);
branded_id!(
    /// Identifies one kit layout entry
    LayoutEntryId
);
branded_id!(
    /// Identifies one background task
    TaskId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(FileId::new(), FileId::new());
    }

    #[test]
    fn test_serde_as_uuid_string() {
        let id = FileId::new();
        let json = serde_json::to_string(&id).unwrap();
        let back: FileId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
        // Transparent: just a quoted UUID, no wrapper object.
        assert!(json.starts_with('"') && json.ends_with('"'));
    }
}
