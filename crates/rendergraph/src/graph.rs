use ahash::AHashMap;
use slotmap::{SecondaryMap, SlotMap};

use crate::{
    builder::GraphBuilder,
    operation::Operation,
    port::Port,
    resources::{OperationKey, PortKey, Resource, ResourceKey},
    state::{DeviceFeatures, ImageLayoutTransition},
    sync::{ExecutionPlan, SyncGraph},
};

///The compiled, immutable render dependency graph.
///
/// Produced by [GraphBuilder::compile](crate::builder::GraphBuilder::compile),
/// queried by the frame-execution engine. All query functions are total over
/// the operations/ports/resources that existed at compile time; handing in a
/// key from another graph is a programming error and panics.
///
/// The graph is fully immutable and freely shareable between threads.
pub struct Graph {
    operations: SlotMap<OperationKey, Operation>,
    ports: SlotMap<PortKey, Port>,
    resources: SlotMap<ResourceKey, Resource>,

    operation_names: AHashMap<String, OperationKey>,
    resource_names: AHashMap<String, ResourceKey>,

    operation_order: Vec<OperationKey>,
    required_features: DeviceFeatures,
    tracked: SecondaryMap<PortKey, ResourceKey>,
    transitions: SecondaryMap<PortKey, ImageLayoutTransition>,
    sync: SyncGraph,
    plan: ExecutionPlan,
}

//Summarized by hand, the full tables are too noisy for error output and the
// sync graph has no Debug of its own.
impl std::fmt::Debug for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Graph")
            .field("operations", &self.operations.len())
            .field("resources", &self.resources.len())
            .field("submissions", &self.plan.submissions().len())
            .field("sync_commands", &self.sync.len())
            .finish_non_exhaustive()
    }
}

impl Graph {
    ///Snapshots the builder tables after all passes ran. The builder is
    /// consumed, nothing can alias into the frozen graph afterwards.
    pub(crate) fn freeze(builder: GraphBuilder) -> Self {
        let GraphBuilder {
            operations,
            ports,
            resources,
            operation_names,
            resource_names,
            operation_order,
            required_features,
            tracked,
            transitions,
            sync,
            plan,
            ..
        } = builder;

        Graph {
            operations,
            ports,
            resources,
            operation_names,
            resource_names,
            operation_order,
            required_features,
            tracked,
            transitions,
            sync,
            plan,
        }
    }

    ///All operations in a linear extension of the operation dag's partial
    /// order: every operation precedes all of its successors.
    pub fn operation_execution_order(&self) -> &[OperationKey] {
        &self.operation_order
    }

    ///The resource whose identity was tracked to `port`.
    pub fn resource_at(&self, port: PortKey) -> &Resource {
        &self.resources[self.resource_key_at(port)]
    }

    ///Key variant of [resource_at](Graph::resource_at), useful for identity
    /// comparisons along a port chain.
    pub fn resource_key_at(&self, port: PortKey) -> ResourceKey {
        self.tracked[port]
    }

    ///The layout change that has to happen around this port's execution.
    pub fn image_transition_at(&self, port: PortKey) -> ImageLayoutTransition {
        self.transitions[port]
    }

    ///OR of the minimum hardware capabilities of all operations.
    pub fn required_device_features(&self) -> DeviceFeatures {
        self.required_features
    }

    ///The submissions to execute, in order.
    pub fn execution_plan(&self) -> &ExecutionPlan {
        &self.plan
    }

    ///The synthesized synchronization command graph.
    pub fn sync_graph(&self) -> &SyncGraph {
        &self.sync
    }

    pub fn operation(&self, key: OperationKey) -> &Operation {
        &self.operations[key]
    }

    pub fn operation_by_name(&self, name: &str) -> Option<OperationKey> {
        self.operation_names.get(name).copied()
    }

    pub fn resource(&self, key: ResourceKey) -> &Resource {
        &self.resources[key]
    }

    pub fn resource_by_name(&self, name: &str) -> Option<ResourceKey> {
        self.resource_names.get(name).copied()
    }

    pub fn port_info(&self, key: PortKey) -> &Port {
        &self.ports[key]
    }

    ///Looks up a port of `operation` by its name.
    pub fn port(&self, operation: OperationKey, name: &str) -> Option<PortKey> {
        self.operations[operation]
            .ports()
            .iter()
            .copied()
            .find(|port| self.ports[*port].name() == name)
    }

    ///"operation.port" display name used in diagnostics.
    pub(crate) fn port_display_name(&self, port: PortKey) -> String {
        let port_data = &self.ports[port];
        format!(
            "{}.{}",
            self.operations[port_data.operation()].name(),
            port_data.name()
        )
    }
}
