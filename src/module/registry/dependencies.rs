//! Module dependency resolution
//!
//! Computes load orders (dependencies first) and detects cycles.

use std::collections::HashMap;
use tracing::debug;

use crate::module::registry::descriptor::ModuleId;
use crate::module::registry::store::ModuleRegistry;
use crate::module::traits::LoaderError;

/// Dependency resolution result for a whole registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyResolution {
    /// Modules in load order (dependencies first)
    pub load_order: Vec<String>,
    /// Direct dependencies per module
    pub dependencies: HashMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

/// Dependency resolver
pub struct ModuleDependencies;

impl ModuleDependencies {
    /// Load order for one module: every transitive dependency, then the module
    ///
    /// Depth-first over the declared dependency lists, siblings in declaration
    /// order, so the same graph always yields the same order.
    pub fn resolve(registry: &ModuleRegistry, id: ModuleId) -> Result<Vec<ModuleId>, LoaderError> {
        let mut marks = HashMap::new();
        let mut order = Vec::new();
        Self::visit(registry, id, &mut marks, &mut order)?;
        debug!(
            "Resolved load order for {}: {:?}",
            registry.get(id).id(),
            order.iter().map(|m| registry.get(*m).id()).collect::<Vec<_>>()
        );
        Ok(order)
    }

    /// `resolve` by identifier, returning identifiers
    pub fn resolve_names(registry: &ModuleRegistry, id: &str) -> Result<Vec<String>, LoaderError> {
        let module = registry.lookup(id)?;
        Ok(Self::resolve(registry, module)?
            .into_iter()
            .map(|m| registry.get(m).id().to_string())
            .collect())
    }

    /// One combined load order covering every declared module
    pub fn resolve_all(registry: &ModuleRegistry) -> Result<DependencyResolution, LoaderError> {
        let mut marks = HashMap::new();
        let mut order = Vec::new();
        for (id, _) in registry.iter() {
            Self::visit(registry, id, &mut marks, &mut order)?;
        }

        let dependencies = registry
            .iter()
            .map(|(_, m)| (m.id().to_string(), m.dependencies().to_vec()))
            .collect();

        Ok(DependencyResolution {
            load_order: order
                .into_iter()
                .map(|m| registry.get(m).id().to_string())
                .collect(),
            dependencies,
        })
    }

    /// Post-order walk from `root` over an explicit stack of
    /// `(module, next dependency index)` frames
    ///
    /// The frames on the stack are exactly the `Visiting` modules, so they
    /// double as the path reported for a cycle.
    fn visit(
        registry: &ModuleRegistry,
        root: ModuleId,
        marks: &mut HashMap<ModuleId, Mark>,
        order: &mut Vec<ModuleId>,
    ) -> Result<(), LoaderError> {
        if marks.contains_key(&root) {
            return Ok(());
        }
        marks.insert(root, Mark::Visiting);
        let mut stack: Vec<(ModuleId, usize)> = vec![(root, 0)];

        while let Some(frame) = stack.last_mut() {
            let (id, next) = *frame;
            let module = registry.get(id);
            let Some(dependency) = module.dependencies().get(next) else {
                stack.pop();
                marks.insert(id, Mark::Done);
                order.push(id);
                continue;
            };
            frame.1 += 1;

            let dep_id = registry
                .lookup(dependency)
                .map_err(|_| LoaderError::UnknownDependency {
                    module: module.id().to_string(),
                    dependency: dependency.clone(),
                })?;

            match marks.get(&dep_id) {
                Some(Mark::Done) => {}
                Some(Mark::Visiting) => {
                    let start = stack.iter().position(|(m, _)| *m == dep_id).unwrap_or(0);
                    let mut cycle: Vec<String> = stack[start..]
                        .iter()
                        .map(|(m, _)| registry.get(*m).id().to_string())
                        .collect();
                    cycle.push(registry.get(dep_id).id().to_string());
                    return Err(LoaderError::CyclicDependency { cycle });
                }
                None => {
                    marks.insert(dep_id, Mark::Visiting);
                    stack.push((dep_id, 0));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry(edges: &[(&str, &[&str])]) -> ModuleRegistry {
        let mut registry = ModuleRegistry::new();
        for (id, deps) in edges {
            registry
                .declare(id, deps.iter().map(|d| d.to_string()).collect(), vec![])
                .unwrap();
        }
        registry
    }

    #[test]
    fn test_dependencies_first() {
        let registry = registry(&[
            ("app", &["ui", "net"]),
            ("ui", &["core"]),
            ("net", &["core"]),
            ("core", &[]),
        ]);
        let order = ModuleDependencies::resolve_names(&registry, "app").unwrap();
        assert_eq!(order, vec!["core", "ui", "net", "app"]);
    }

    #[test]
    fn test_sibling_order_follows_declaration() {
        let registry = registry(&[("app", &["z", "a", "m"]), ("a", &[]), ("m", &[]), ("z", &[])]);
        let order = ModuleDependencies::resolve_names(&registry, "app").unwrap();
        assert_eq!(order, vec!["z", "a", "m", "app"]);
    }

    #[test]
    fn test_cycle_is_named() {
        let registry = registry(&[("a", &["b"]), ("b", &["c"]), ("c", &["b"])]);
        let err = ModuleDependencies::resolve_names(&registry, "a").unwrap_err();
        assert_eq!(
            err,
            LoaderError::CyclicDependency {
                cycle: vec!["b".into(), "c".into(), "b".into()]
            }
        );
    }

    #[test]
    fn test_self_cycle() {
        let registry = registry(&[("a", &["a"])]);
        assert!(matches!(
            ModuleDependencies::resolve_names(&registry, "a"),
            Err(LoaderError::CyclicDependency { .. })
        ));
    }

    #[test]
    fn test_unknown_dependency() {
        let registry = registry(&[("a", &["ghost"])]);
        assert_eq!(
            ModuleDependencies::resolve_names(&registry, "a").unwrap_err(),
            LoaderError::UnknownDependency {
                module: "a".into(),
                dependency: "ghost".into()
            }
        );
    }

    #[test]
    fn test_deep_chain_resolves() {
        let mut registry = ModuleRegistry::new();
        registry.declare("m0", vec![], vec![]).unwrap();
        for i in 1..20_000 {
            registry
                .declare(&format!("m{}", i), vec![format!("m{}", i - 1)], vec![])
                .unwrap();
        }

        let order = ModuleDependencies::resolve_names(&registry, "m19999").unwrap();
        assert_eq!(order.len(), 20_000);
        assert_eq!(order[0], "m0");
        assert_eq!(order[19_999], "m19999");
        assert_eq!(
            ModuleDependencies::resolve_all(&registry).unwrap().load_order,
            order
        );
    }

    #[test]
    fn test_resolve_all() {
        let registry = registry(&[("b", &["a"]), ("a", &[]), ("c", &[])]);
        let resolution = ModuleDependencies::resolve_all(&registry).unwrap();
        assert_eq!(resolution.load_order, vec!["a", "b", "c"]);
        assert_eq!(resolution.dependencies["b"], vec!["a".to_string()]);
    }
}
