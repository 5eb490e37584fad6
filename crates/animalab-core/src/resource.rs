//! References to host-managed resources.
//!
//! Documents refer to clips, avatar masks and other assets by a quoted
//! reference string: a plain relative or absolute path, a `{guid}` form, or a
//! `path#subAssetName` fragment form. The host resolves the reference and the
//! graph stores the canonical [`AssetRef`] it hands back.

use std::fmt;

/// The kind of resource a reference is expected to resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    AnimationClip,
    AvatarMask,
    /// Any object, used for object-reference fields of behaviour records.
    Object,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::AnimationClip => "animation clip",
            Self::AvatarMask => "avatar mask",
            Self::Object => "object",
        };
        f.write_str(name)
    }
}

/// A resolved reference to a host resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssetRef {
    reference: String,
    kind: ResourceKind,
}

impl AssetRef {
    pub fn new(reference: impl Into<String>, kind: ResourceKind) -> Self {
        Self {
            reference: reference.into(),
            kind,
        }
    }

    /// The reference text, printed verbatim when the graph is unparsed.
    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// The `{guid}` payload when the reference uses the guid form.
    pub fn guid(&self) -> Option<&str> {
        self.reference
            .strip_prefix('{')
            .and_then(|rest| rest.strip_suffix('}'))
    }

    /// Splits a `path#subAsset` reference into its path and fragment.
    pub fn fragment(&self) -> (&str, Option<&str>) {
        match self.reference.split_once('#') {
            Some((path, fragment)) => (path, Some(fragment)),
            None => (&self.reference, None),
        }
    }
}

impl fmt::Display for AssetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_forms() {
        let guid = AssetRef::new("{0a1b2c}", ResourceKind::AnimationClip);
        assert_eq!(guid.guid(), Some("0a1b2c"));
        assert_eq!(guid.fragment(), ("{0a1b2c}", None));

        let sub = AssetRef::new("Clips/walk.fbx#Walk", ResourceKind::AnimationClip);
        assert_eq!(sub.guid(), None);
        assert_eq!(sub.fragment(), ("Clips/walk.fbx", Some("Walk")));
        assert_eq!(sub.to_string(), "Clips/walk.fbx#Walk");
    }
}
