use super::Pass;
use crate::{builder::GraphBuilder, GraphError};

///Fails compilation of graphs without any operation.
pub(super) struct NonEmptyCheck;

impl Pass for NonEmptyCheck {
    fn name(&self) -> &'static str {
        "non-empty"
    }

    fn run(&self, builder: &mut GraphBuilder) -> Result<(), GraphError> {
        if builder.is_empty() {
            return Err(GraphError::Empty);
        }
        Ok(())
    }
}

///Every port has to take part in at least one connection, and receiving
/// ports (consumer, modifier) additionally need their incoming edge: a
/// modifier wired only on its output side has nothing to track a resource
/// from, which would leave the whole downstream chain untracked. All
/// offenders are collected and reported together.
pub(super) struct PortsConnectedCheck;

impl Pass for PortsConnectedCheck {
    fn name(&self) -> &'static str {
        "ports-connected"
    }

    fn depends_on(&self) -> &'static [&'static str] {
        &["non-empty"]
    }

    fn run(&self, builder: &mut GraphBuilder) -> Result<(), GraphError> {
        let unconnected: Vec<String> = builder
            .port_graph
            .nodes()
            .filter(|port| {
                builder.port_graph.degree(*port) == 0
                    || (builder.ports[*port].variant().receives()
                        && builder.port_graph.in_degree(*port) == 0)
            })
            .map(|port| builder.port_display_name(port))
            .collect();

        if !unconnected.is_empty() {
            return Err(GraphError::PortsUnconnected { ports: unconnected });
        }
        Ok(())
    }
}

///Every producer port needs an explicitly assigned resource. All offenders
/// are collected and reported together.
pub(super) struct ResourcesAssignedCheck;

impl Pass for ResourcesAssignedCheck {
    fn name(&self) -> &'static str {
        "resources-assigned"
    }

    fn depends_on(&self) -> &'static [&'static str] {
        &["non-empty"]
    }

    fn run(&self, builder: &mut GraphBuilder) -> Result<(), GraphError> {
        let unassigned: Vec<String> = builder
            .port_graph
            .nodes()
            .filter(|port| {
                builder.ports[*port].variant().is_producer()
                    && !builder.assignments.contains_key(*port)
            })
            .map(|port| builder.port_display_name(port))
            .collect();

        if !unassigned.is_empty() {
            return Err(GraphError::PortsUnassigned { ports: unassigned });
        }
        Ok(())
    }
}

///ORs together the device features declared by all operations.
pub(super) struct DeviceFeaturePass;

impl Pass for DeviceFeaturePass {
    fn name(&self) -> &'static str {
        "device-features"
    }

    fn depends_on(&self) -> &'static [&'static str] {
        &["non-empty"]
    }

    fn run(&self, builder: &mut GraphBuilder) -> Result<(), GraphError> {
        let mut features = builder.required_features;
        for (_key, operation) in builder.operations.iter() {
            features |= operation.features();
        }
        builder.required_features = features;

        #[cfg(feature = "logging")]
        log::trace!("graph requires device features {:?}", features);

        Ok(())
    }
}

///Every tracked (port, resource) pair must satisfy the port's declared
/// resource constraint.
pub(super) struct TypeCompatibilityCheck;

impl Pass for TypeCompatibilityCheck {
    fn name(&self) -> &'static str {
        "type-check"
    }

    fn depends_on(&self) -> &'static [&'static str] {
        &["resource-tracking"]
    }

    fn run(&self, builder: &mut GraphBuilder) -> Result<(), GraphError> {
        for port in builder.port_order.iter() {
            let Some(resource) = builder.tracked.get(*port) else {
                continue;
            };

            let constraint = builder.ports[*port].constraint();
            let found = builder.resources[*resource].kind();
            if !constraint.allows(found) {
                return Err(GraphError::TypeIncompatible {
                    port: builder.port_display_name(*port),
                    resource: builder.resources[*resource].name().to_string(),
                    expected: constraint.kind,
                    found,
                });
            }
        }
        Ok(())
    }
}
