//! Newtype wrappers for arena indices, anchors and resource URIs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Index of an element in an [`ElementTree`](crate::ElementTree).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(pub usize);

/// Index of a box in a [`BoxTree`](crate::BoxTree).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BoxId(pub usize);

impl ElementId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl BoxId {
    pub fn index(self) -> usize {
        self.0
    }
}

macro_rules! shared_str_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Arc<str>);

        impl $name {
            pub fn new(value: impl Into<Arc<str>>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s.into())
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.into())
            }
        }

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

shared_str_id!(
    /// The value of an element's `id` attribute, used as a link target.
    AnchorId
);

shared_str_id!(
    /// Location of an external resource (image, embedded PDF).
    ResourceUri
);

impl ResourceUri {
    /// The URI without its `#fragment`, used as a cache key for loaded documents.
    pub fn path(&self) -> &str {
        match self.0.find('#') {
            Some(idx) => &self.0[..idx],
            None => &self.0,
        }
    }

    pub fn fragment(&self) -> Option<&str> {
        self.0.find('#').map(|idx| &self.0[idx + 1..])
    }

    /// Page number selected with a `#page=N` fragment, 1 when absent or malformed.
    pub fn page_number(&self) -> u32 {
        self.fragment()
            .and_then(|frag| {
                frag.split('&')
                    .find_map(|part| part.strip_prefix("page="))
                    .and_then(|n| n.parse::<u32>().ok())
            })
            .filter(|n| *n > 0)
            .unwrap_or(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn anchor_ids_hash_by_value() {
        let mut set = HashSet::new();
        set.insert(AnchorId::from("intro"));
        set.insert(AnchorId::new(String::from("intro")));
        set.insert(AnchorId::from("outro"));
        assert_eq!(set.len(), 2);
        assert_eq!(AnchorId::from("intro").to_string(), "intro");
    }

    #[test]
    fn shared_ids_serialize_as_plain_strings() {
        let uri = ResourceUri::from("logo.png");
        assert_eq!(serde_json::to_string(&uri).unwrap(), "\"logo.png\"");
        let back: AnchorId = serde_json::from_str("\"intro\"").unwrap();
        assert_eq!(back.as_str(), "intro");
    }

    #[test]
    fn resource_uri_splits_fragment() {
        let uri = ResourceUri::from("docs/attachment.pdf#page=3");
        assert_eq!(uri.path(), "docs/attachment.pdf");
        assert_eq!(uri.fragment(), Some("page=3"));
        assert_eq!(uri.page_number(), 3);
    }

    #[test]
    fn resource_uri_page_defaults_to_first() {
        assert_eq!(ResourceUri::from("a.pdf").page_number(), 1);
        assert_eq!(ResourceUri::from("a.pdf#page=0").page_number(), 1);
        assert_eq!(ResourceUri::from("a.pdf#zoom=2").page_number(), 1);
    }
}
