use std::collections::{BTreeMap, BTreeSet};

/// Static type-hierarchy facts for type tokens.
///
/// Implementations adapt whatever type introspection the host container has.
/// Unknown types have no ancestors and no interfaces.
pub trait TypeHierarchy: Send + Sync {
    /// Ancestor types, nearest first
    fn ancestors_of(&self, type_token: &str) -> Vec<String>;

    /// Interfaces implemented by the type, including the ones inherited from ancestors
    fn interfaces_of(&self, type_token: &str) -> Vec<String>;

    fn is_interface(&self, _type_token: &str) -> bool {
        false
    }
}

/// Hierarchy without any facts
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHierarchy;

impl TypeHierarchy for NoHierarchy {
    #[inline]
    fn ancestors_of(&self, _type_token: &str) -> Vec<String> {
        Vec::new()
    }

    #[inline]
    fn interfaces_of(&self, _type_token: &str) -> Vec<String> {
        Vec::new()
    }
}

/// Hierarchy declared up front as parent links and implemented interfaces
#[derive(Debug, Clone, Default)]
pub struct StaticHierarchy {
    parents: BTreeMap<String, String>,
    implements: BTreeMap<String, Vec<String>>,
    interfaces: BTreeSet<String>,
}

impl StaticHierarchy {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares `parent` as the direct ancestor of `child`.
    /// Interfaces extending other interfaces are declared the same way.
    #[inline]
    #[must_use]
    pub fn with_parent(mut self, child: impl Into<String>, parent: impl Into<String>) -> Self {
        self.parents.insert(child.into(), parent.into());
        self
    }

    #[must_use]
    pub fn with_interface(mut self, type_token: impl Into<String>, interface: impl Into<String>) -> Self {
        let interface = interface.into();
        let implemented = self.implements.entry(type_token.into()).or_default();
        if !implemented.contains(&interface) {
            implemented.push(interface.clone());
        }
        self.interfaces.insert(interface);
        self
    }

    #[inline]
    #[must_use]
    pub fn with_declared_interface(mut self, interface: impl Into<String>) -> Self {
        self.interfaces.insert(interface.into());
        self
    }

    fn parent_chain(&self, type_token: &str) -> Vec<String> {
        let mut chain: Vec<String> = Vec::new();
        let mut current = type_token;
        while let Some(parent) = self.parents.get(current) {
            if parent == type_token || chain.contains(parent) {
                break;
            }
            chain.push(parent.clone());
            current = parent;
        }
        chain
    }
}

impl TypeHierarchy for StaticHierarchy {
    fn ancestors_of(&self, type_token: &str) -> Vec<String> {
        self.parent_chain(type_token)
    }

    fn interfaces_of(&self, type_token: &str) -> Vec<String> {
        let mut interfaces: Vec<String> = Vec::new();
        let owners = core::iter::once(type_token.to_owned()).chain(self.parent_chain(type_token));
        for owner in owners {
            let Some(implemented) = self.implements.get(&owner) else {
                continue;
            };
            for interface in implemented {
                let extended = core::iter::once(interface.clone()).chain(self.parent_chain(interface));
                for interface in extended {
                    if !interfaces.contains(&interface) {
                        interfaces.push(interface);
                    }
                }
            }
        }
        interfaces
    }

    fn is_interface(&self, type_token: &str) -> bool {
        self.interfaces.contains(type_token)
    }
}

/// Ancestors and interfaces of one type, as memoized by the registry and the discovery engine
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct HierarchyFacts {
    pub(crate) ancestors: Vec<String>,
    pub(crate) interfaces: Vec<String>,
}

impl HierarchyFacts {
    #[must_use]
    pub(crate) fn collect(hierarchy: &dyn TypeHierarchy, type_token: &str) -> Self {
        Self {
            ancestors: hierarchy.ancestors_of(type_token),
            interfaces: hierarchy.interfaces_of(type_token),
        }
    }

    /// Strict subtype check: the type itself doesn't count
    #[must_use]
    pub(crate) fn is_subtype_of(&self, type_token: &str) -> bool {
        self.ancestors.iter().chain(&self.interfaces).any(|token| token == type_token)
    }
}

#[cfg(test)]
mod tests {
    use super::{HierarchyFacts, NoHierarchy, StaticHierarchy, TypeHierarchy as _};

    use tracing_test::traced_test;

    fn hierarchy() -> StaticHierarchy {
        StaticHierarchy::new()
            .with_parent("UserController", "BaseController")
            .with_parent("BaseController", "Controller")
            .with_interface("BaseController", "Responder")
            .with_interface("UserController", "Authorizable")
            .with_parent("Responder", "Renderable")
    }

    #[test]
    #[traced_test]
    fn test_ancestors_nearest_first() {
        assert_eq!(hierarchy().ancestors_of("UserController"), ["BaseController", "Controller"]);
        assert!(hierarchy().ancestors_of("Controller").is_empty());
        assert!(NoHierarchy.ancestors_of("UserController").is_empty());
    }

    #[test]
    #[traced_test]
    fn test_interfaces_include_inherited() {
        assert_eq!(
            hierarchy().interfaces_of("UserController"),
            ["Authorizable", "Responder", "Renderable"]
        );
        assert!(hierarchy().is_interface("Responder"));
        assert!(!hierarchy().is_interface("Controller"));
    }

    #[test]
    #[traced_test]
    fn test_parent_loop_terminates() {
        let hierarchy = StaticHierarchy::new().with_parent("A", "B").with_parent("B", "A");
        assert_eq!(hierarchy.ancestors_of("A"), ["B"]);
    }

    #[test]
    #[traced_test]
    fn test_facts_subtype() {
        let facts = HierarchyFacts::collect(&hierarchy(), "UserController");
        assert!(facts.is_subtype_of("Controller"));
        assert!(facts.is_subtype_of("Renderable"));
        assert!(!facts.is_subtype_of("UserController"));
    }
}
