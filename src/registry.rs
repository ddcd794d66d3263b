use std::{
    collections::BTreeMap,
    fmt::{self, Display},
};

pub const BUILD_API_VERSION: &str = "build.pivotal.io/v1alpha1";
pub const CORE_API_VERSION: &str = "v1";

/// Every resource type this tool knows how to handle
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ResourceType {
    Secret,
    ServiceAccount,
    Image,
    Builder,
    ClusterBuilder,
    ClusterStack,
    ClusterStore,
}

impl ResourceType {
    pub const ALL: [ResourceType; 7] = [
        Self::Secret,
        Self::ServiceAccount,
        Self::Image,
        Self::Builder,
        Self::ClusterBuilder,
        Self::ClusterStack,
        Self::ClusterStore,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Secret => "Secret",
            Self::ServiceAccount => "ServiceAccount",
            Self::Image => "Image",
            Self::Builder => "Builder",
            Self::ClusterBuilder => "ClusterBuilder",
            Self::ClusterStack => "ClusterStack",
            Self::ClusterStore => "ClusterStore",
        }
    }
}

impl Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Represents object runtime type
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct ObjectKind {
    // build.pivotal.io/v1alpha1
    pub api_version: String,
    // ClusterBuilder
    pub kind: String,
}

impl ObjectKind {
    pub fn new(api_version: &str, kind: &str) -> Self {
        Self {
            api_version: api_version.to_owned(),
            kind: kind.to_owned(),
        }
    }

    /// Core group objects carry a bare version
    pub fn version(&self) -> &str {
        match self.api_version.split_once('/') {
            Some((_, version)) => version,
            None => &self.api_version,
        }
    }

    /// Objects decoded without type information carry no usable identity
    pub fn is_empty(&self) -> bool {
        self.version().is_empty() || self.kind.is_empty()
    }
}

impl Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.api_version, self.kind)
    }
}

/// Maps resource types to their API identity
///
/// Only consulted for objects whose embedded identity is empty.
#[derive(Clone, Debug, Default)]
pub struct TypeRegistry {
    kinds: BTreeMap<ResourceType, ObjectKind>,
}

impl TypeRegistry {
    pub fn builtin() -> Self {
        let mut registry = Self::default();
        for ty in ResourceType::ALL {
            let api_version = match ty {
                ResourceType::Secret | ResourceType::ServiceAccount => CORE_API_VERSION,
                _ => BUILD_API_VERSION,
            };
            registry.insert(ty, ObjectKind::new(api_version, ty.name()));
        }
        registry
    }

    pub fn insert(&mut self, ty: ResourceType, kind: ObjectKind) {
        self.kinds.insert(ty, kind);
    }

    pub fn lookup(&self, ty: ResourceType) -> Option<&ObjectKind> {
        self.kinds.get(&ty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_covers_all() {
        let registry = TypeRegistry::builtin();
        for ty in ResourceType::ALL {
            let kind = registry.lookup(ty).unwrap();
            assert_eq!(kind.kind, ty.name());
            assert!(!kind.is_empty());
        }
    }

    #[test]
    fn identity() {
        let registry = TypeRegistry::builtin();
        let secret = registry.lookup(ResourceType::Secret).unwrap();
        assert_eq!(secret.version(), "v1");

        let builder = registry.lookup(ResourceType::ClusterBuilder).unwrap();
        assert_eq!(builder.version(), "v1alpha1");
        assert_eq!(builder.to_string(), "build.pivotal.io/v1alpha1 ClusterBuilder");
    }

    #[test]
    fn empty_identity() {
        assert!(ObjectKind::default().is_empty());
        assert!(ObjectKind::new("build.pivotal.io/", "Image").is_empty());
        assert!(ObjectKind::new("v1", "").is_empty());
        assert!(!ObjectKind::new("v1", "Secret").is_empty());
    }

    #[test]
    fn missing_entry() {
        assert!(TypeRegistry::default()
            .lookup(ResourceType::Image)
            .is_none());
    }
}
