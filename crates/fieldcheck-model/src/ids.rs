//! String identifiers used across the workspace
//!
//! Every id is a transparent string newtype so that serialized drafts stay
//! plain JSON objects keyed by the raw id.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create id from any string-like value
            #[inline]
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Borrow the raw id
            #[inline]
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// True if the id is the empty string
            #[inline]
            #[must_use]
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(
    /// Identifier of a checklist definition (and of its answers in a draft)
    ChecklistId
);

string_id!(
    /// Identifier of a section within a checklist
    SectionId
);

string_id!(
    /// Identifier of a single item (question/field)
    ItemId
);

string_id!(
    /// Identifier of the auditor owning a draft
    UserId
);

string_id!(
    /// Identifier assigned by the report store
    ReportId
);

/// Signature role name
///
/// Signatures are global to a draft: one per role, shared by every checklist.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(String);

impl Role {
    /// Role of the branch manager
    pub const MANAGER: &'static str = "manager";
    /// Role of the visiting coordinator
    pub const COORDINATOR: &'static str = "coordinator";

    /// Create role from name
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Branch manager role
    #[inline]
    #[must_use]
    pub fn manager() -> Self {
        Self::new(Self::MANAGER)
    }

    /// Coordinator role
    #[inline]
    #[must_use]
    pub fn coordinator() -> Self {
        Self::new(Self::COORDINATOR)
    }

    /// Borrow role name
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Role {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl Borrow<str> for Role {
    fn borrow(&self) -> &str {
        &self.0
    }
}
