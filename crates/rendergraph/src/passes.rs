use std::sync::OnceLock;

use ahash::AHashSet;

use crate::{builder::GraphBuilder, GraphError};

mod checks;
mod layout;
mod sync;
mod topology;
mod tracking;

///A single validation or analysis pass of the compile pipeline.
///
/// Passes communicate through the builder's tables: each pass declares which
/// other passes must have populated their tables before it can run. The
/// dependencies form a small static dag that is resolved to a fixed order
/// once per process, not per compile.
pub(crate) trait Pass: Send + Sync {
    fn name(&self) -> &'static str;

    ///Names of the passes that must have run before this one.
    fn depends_on(&self) -> &'static [&'static str] {
        &[]
    }

    fn run(&self, builder: &mut GraphBuilder) -> Result<(), GraphError>;
}

///All known passes in registration order.
fn registry() -> [&'static dyn Pass; 9] {
    [
        &checks::NonEmptyCheck,
        &checks::PortsConnectedCheck,
        &checks::ResourcesAssignedCheck,
        &topology::TopologyPass,
        &checks::DeviceFeaturePass,
        &tracking::ResourceTrackingPass,
        &checks::TypeCompatibilityCheck,
        &layout::LayoutInferencePass,
        &sync::SyncSynthesisPass,
    ]
}

///The resolved pipeline. Computed on first use, stable afterwards.
pub(crate) fn pipeline() -> &'static [&'static dyn Pass] {
    static ORDER: OnceLock<Vec<&'static dyn Pass>> = OnceLock::new();
    ORDER.get_or_init(|| resolve(&registry()))
}

///Topologically sorts the passes by their declared dependencies. Passes
/// whose dependencies are already emitted go out in registration order.
///
/// Panics on unknown or cyclic dependencies, both are bugs in the pass
/// declarations, not user errors.
fn resolve(passes: &[&'static dyn Pass]) -> Vec<&'static dyn Pass> {
    let known: AHashSet<&'static str> = passes.iter().map(|p| p.name()).collect();
    for pass in passes {
        for dep in pass.depends_on() {
            assert!(
                known.contains(dep),
                "pass \"{}\" depends on unknown pass \"{}\"",
                pass.name(),
                dep
            );
        }
    }

    let mut order: Vec<&'static dyn Pass> = Vec::with_capacity(passes.len());
    let mut emitted: AHashSet<&'static str> = AHashSet::default();

    while order.len() < passes.len() {
        let mut progressed = false;
        for pass in passes {
            if emitted.contains(pass.name()) {
                continue;
            }
            if pass.depends_on().iter().all(|dep| emitted.contains(dep)) {
                emitted.insert(pass.name());
                order.push(*pass);
                progressed = true;
            }
        }

        assert!(progressed, "pass dependencies contain a cycle");
    }

    order
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_respects_declared_dependencies() {
        let order = pipeline();
        assert_eq!(order.len(), 9);

        let pos = |name: &str| {
            order
                .iter()
                .position(|p| p.name() == name)
                .unwrap_or_else(|| panic!("pass {} missing", name))
        };

        for pass in order {
            for dep in pass.depends_on() {
                assert!(
                    pos(dep) < pos(pass.name()),
                    "pass \"{}\" runs before its dependency \"{}\"",
                    pass.name(),
                    dep
                );
            }
        }

        //the resolved order is the documented fixed order
        let names: Vec<_> = order.iter().map(|p| p.name()).collect();
        assert_eq!(
            names,
            [
                "non-empty",
                "ports-connected",
                "resources-assigned",
                "topology",
                "device-features",
                "resource-tracking",
                "type-check",
                "layout-inference",
                "sync-synthesis",
            ]
        );
    }
}
