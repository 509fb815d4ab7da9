use super::Pass;
use crate::{builder::GraphBuilder, GraphError};

///Computes and stores the topological order of both the port dag and the
/// derived operation dag. Always succeeds, the builder rejected every
/// cycle-closing edge at insertion time.
pub(super) struct TopologyPass;

impl Pass for TopologyPass {
    fn name(&self) -> &'static str {
        "topology"
    }

    fn depends_on(&self) -> &'static [&'static str] {
        &["ports-connected"]
    }

    fn run(&self, builder: &mut GraphBuilder) -> Result<(), GraphError> {
        builder.port_order = builder.port_graph.topological_order();
        builder.operation_order = builder.operation_graph.topological_order();

        #[cfg(feature = "log_reasoning")]
        log::trace!(
            "operation order: {:?}",
            builder
                .operation_order
                .iter()
                .map(|op| builder.operations[*op].name())
                .collect::<Vec<_>>()
        );

        Ok(())
    }
}
