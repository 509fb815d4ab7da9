use super::Pass;
use crate::{builder::GraphBuilder, GraphError};

///Propagates resource identity forward along the port graph.
///
/// Producers are tracked to their explicitly assigned resource, consumers
/// and modifiers inherit the tracked resource of their unique predecessor.
/// Walking in topological order guarantees the predecessor entry exists when
/// a port is visited.
pub(super) struct ResourceTrackingPass;

impl Pass for ResourceTrackingPass {
    fn name(&self) -> &'static str {
        "resource-tracking"
    }

    fn depends_on(&self) -> &'static [&'static str] {
        &["topology", "resources-assigned"]
    }

    fn run(&self, builder: &mut GraphBuilder) -> Result<(), GraphError> {
        for port in builder.port_order.clone() {
            if builder.ports[port].variant().is_producer() {
                //checked by the resources-assigned pass
                let resource = builder.assignments[port];
                builder.tracked.insert(port, resource);
                continue;
            }

            //Consumers and modifiers have at most one incoming edge by the
            // degree invariant.
            let Some(&predecessor) = builder.port_graph.incoming(port).first() else {
                continue;
            };
            if let Some(&resource) = builder.tracked.get(predecessor) {
                builder.tracked.insert(port, resource);

                #[cfg(feature = "log_reasoning")]
                log::trace!(
                    "tracked {} to resource \"{}\" via {}",
                    builder.port_display_name(port),
                    builder.resources[resource].name(),
                    builder.port_display_name(predecessor)
                );
            }
        }

        Ok(())
    }
}
