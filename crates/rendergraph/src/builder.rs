use ahash::AHashMap;
use slotmap::{SecondaryMap, SlotMap};

use crate::{
    dag::Dag,
    graph::Graph,
    operation::{Operation, OperationDescription},
    passes,
    port::Port,
    resources::{OperationKey, PortKey, Resource, ResourceKey, ResourceKind},
    state::{DeviceFeatures, ImageLayout, ImageLayoutTransition},
    sync::{ExecutionPlan, SyncGraph},
    GraphError,
};

///Mutable construction API for the render dependency graph.
///
/// Declare operations and resources, assign resources to producer ports and
/// wire ports together. Structural problems (duplicate names, over-connected
/// ports, cycles) fail eagerly at mutation time, completeness and analysis
/// problems fail inside [compile](GraphBuilder::compile).
///
/// The builder is single use: `compile` consumes it, on success all tables
/// are frozen into the returned [Graph], on failure the attempt is gone and a
/// fresh declaration is needed.
pub struct GraphBuilder {
    pub(crate) operations: SlotMap<OperationKey, Operation>,
    pub(crate) ports: SlotMap<PortKey, Port>,
    pub(crate) resources: SlotMap<ResourceKey, Resource>,

    pub(crate) operation_names: AHashMap<String, OperationKey>,
    pub(crate) resource_names: AHashMap<String, ResourceKey>,

    pub(crate) port_graph: Dag<PortKey>,
    pub(crate) operation_graph: Dag<OperationKey>,

    ///Producer port -> explicitly assigned resource.
    pub(crate) assignments: SecondaryMap<PortKey, ResourceKey>,
    ///Reverse direction of `assignments`.
    pub(crate) assigned_port: SecondaryMap<ResourceKey, PortKey>,

    //Tables below are written by the compile passes, in pass order.
    pub(crate) port_order: Vec<PortKey>,
    pub(crate) operation_order: Vec<OperationKey>,
    pub(crate) required_features: DeviceFeatures,
    ///Resource identity per port after forward propagation.
    pub(crate) tracked: SecondaryMap<PortKey, ResourceKey>,
    ///Layout transition per port, seeded to `Constant(Undefined)` at
    /// declaration time.
    pub(crate) transitions: SecondaryMap<PortKey, ImageLayoutTransition>,
    pub(crate) sync: SyncGraph,
    pub(crate) plan: ExecutionPlan,
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphBuilder {
    pub fn new() -> Self {
        GraphBuilder {
            operations: SlotMap::with_key(),
            ports: SlotMap::with_key(),
            resources: SlotMap::with_key(),
            operation_names: AHashMap::default(),
            resource_names: AHashMap::default(),
            port_graph: Dag::default(),
            operation_graph: Dag::default(),
            assignments: SecondaryMap::new(),
            assigned_port: SecondaryMap::new(),
            port_order: Vec::new(),
            operation_order: Vec::new(),
            required_features: DeviceFeatures::empty(),
            tracked: SecondaryMap::new(),
            transitions: SecondaryMap::new(),
            sync: SyncGraph::default(),
            plan: ExecutionPlan::default(),
        }
    }

    ///True if no operation has been declared yet.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    ///Instantiates `description` and registers it under `name` together with
    /// all of its ports. Every port's layout entry is seeded to
    /// `Constant(Undefined)`.
    pub fn declare_operation(
        &mut self,
        name: impl Into<String>,
        description: OperationDescription,
    ) -> Result<OperationKey, GraphError> {
        let name = name.into();
        if self.operation_names.contains_key(&name) {
            return Err(GraphError::NameDuplicate { name });
        }

        //local shape validation before anything is registered
        let mut seen_ports: AHashMap<&str, ()> = AHashMap::default();
        for port in &description.ports {
            if seen_ports.insert(&port.name, ()).is_some() {
                return Err(GraphError::NameDuplicate {
                    name: format!("{}.{}", name, port.name),
                });
            }
            port.validate().map_err(|reason| GraphError::InvalidPort {
                port: format!("{}.{}", name, port.name),
                reason,
            })?;
        }

        let operation = self.operations.insert(Operation::new(
            name.clone(),
            description.queue_class,
            description.features,
        ));
        self.operation_graph.add_node(operation);

        for port_desc in description.ports {
            let port = self.ports.insert(Port::new(operation, port_desc));
            self.operations[operation].push_port(port);
            self.port_graph.add_node(port);
            self.transitions
                .insert(port, ImageLayoutTransition::Constant(ImageLayout::Undefined));
        }

        #[cfg(feature = "logging")]
        log::trace!(
            "declared operation \"{}\" with {} ports",
            name,
            self.operations[operation].ports().len()
        );

        self.operation_names.insert(name, operation);
        Ok(operation)
    }

    ///Registers a resource placeholder under `name`.
    pub fn declare_resource(
        &mut self,
        name: impl Into<String>,
        kind: ResourceKind,
    ) -> Result<ResourceKey, GraphError> {
        let name = name.into();
        if self.resource_names.contains_key(&name) {
            return Err(GraphError::NameDuplicate { name });
        }

        let key = self.resources.insert(Resource::new(name.clone(), kind));
        self.resource_names.insert(name, key);
        Ok(key)
    }

    ///Looks up a port of `operation` by its name.
    pub fn port(&self, operation: OperationKey, name: &str) -> Option<PortKey> {
        self.operations
            .get(operation)?
            .ports()
            .iter()
            .copied()
            .find(|port| self.ports[*port].name() == name)
    }

    ///Binds `resource` to the producer `port`. The resource's identity then
    /// flows through every port reachable from this producer.
    ///
    /// Keys are only meaningful on the builder that issued them. A key from
    /// another builder usually fails with *operation-not-declared*, but one
    /// that happens to alias a live local slot cannot be told apart from it.
    pub fn assign_resource(
        &mut self,
        port: PortKey,
        resource: ResourceKey,
    ) -> Result<(), GraphError> {
        self.check_declared(port)?;

        if !self.ports[port].variant().is_producer() {
            return Err(GraphError::InvalidPort {
                port: self.port_display_name(port),
                reason: "only producer ports take resource assignments".to_string(),
            });
        }
        if self.assignments.contains_key(port) {
            return Err(GraphError::PortAlreadyAssigned {
                port: self.port_display_name(port),
            });
        }
        if let Some(assigned_to) = self.assigned_port.get(resource) {
            return Err(GraphError::ResourceAlreadyAssigned {
                resource: self.resources[resource].name().to_string(),
                assigned_to: self.port_display_name(*assigned_to),
            });
        }

        self.assignments.insert(port, resource);
        self.assigned_port.insert(resource, port);
        Ok(())
    }

    ///Connects the supplying `source` port to the receiving `target` port.
    ///
    /// Degree limits (producer/consumer: one edge, modifier: one in and one
    /// out) and acyclicity of both the port graph and the derived operation
    /// graph are enforced here, at insertion time. Port keys are only
    /// meaningful on the builder that issued them, see
    /// [assign_resource](GraphBuilder::assign_resource).
    pub fn connect(&mut self, source: PortKey, target: PortKey) -> Result<(), GraphError> {
        self.check_declared(source)?;
        self.check_declared(target)?;

        let src = &self.ports[source];
        let dst = &self.ports[target];

        if !src.variant().supplies() {
            return Err(GraphError::InvalidPort {
                port: self.port_display_name(source),
                reason: "port does not supply a resource, it cannot be a connection source"
                    .to_string(),
            });
        }
        if !dst.variant().receives() {
            return Err(GraphError::InvalidPort {
                port: self.port_display_name(target),
                reason: "port does not receive a resource, it cannot be a connection target"
                    .to_string(),
            });
        }

        if self.port_graph.out_degree(source) >= src.max_out() {
            return Err(GraphError::PortAlreadyConnected {
                port: self.port_display_name(source),
            });
        }
        if self.port_graph.in_degree(target) >= dst.max_in() {
            return Err(GraphError::PortAlreadyConnected {
                port: self.port_display_name(target),
            });
        }

        let src_op = src.operation();
        let dst_op = dst.operation();

        //Both graphs have to stay acyclic. A connection within one operation
        // would be a self loop on the operation graph, which counts as well.
        if self.port_graph.would_cycle(source, target)
            || self.operation_graph.would_cycle(src_op, dst_op)
        {
            return Err(GraphError::CyclicConnection {
                from: self.port_display_name(source),
                to: self.port_display_name(target),
            });
        }

        self.port_graph
            .try_connect(source, target)
            .expect("port cycle despite pre-check");
        self.operation_graph
            .try_connect(src_op, dst_op)
            .expect("operation cycle despite pre-check");

        #[cfg(feature = "logging")]
        log::trace!(
            "connected {} -> {}",
            self.port_display_name(source),
            self.port_display_name(target)
        );

        Ok(())
    }

    ///Runs the pass pipeline and freezes the builder into an immutable
    /// [Graph]. Consumes the builder, on failure the whole attempt is
    /// discarded and no partial graph exists.
    pub fn compile(mut self) -> Result<Graph, GraphError> {
        for pass in passes::pipeline() {
            #[cfg(feature = "logging")]
            log::trace!("running pass \"{}\"", pass.name());

            pass.run(&mut self)?;
        }

        Ok(Graph::freeze(self))
    }

    ///Checks that the port belongs to this builder and that its owning
    /// operation is exactly the instance registered under the operation's
    /// name.
    fn check_declared(&self, port: PortKey) -> Result<(), GraphError> {
        let port_data = match self.ports.get(port) {
            Some(p) => p,
            None => {
                return Err(GraphError::OperationNotDeclared {
                    operation: "<foreign port>".to_string(),
                })
            }
        };

        let operation = &self.operations[port_data.operation()];
        match self.operation_names.get(operation.name()) {
            Some(registered) if *registered == port_data.operation() => Ok(()),
            _ => Err(GraphError::OperationNotDeclared {
                operation: operation.name().to_string(),
            }),
        }
    }

    ///"operation.port" display name used in errors and diagnostics.
    pub(crate) fn port_display_name(&self, port: PortKey) -> String {
        let port_data = &self.ports[port];
        format!(
            "{}.{}",
            self.operations[port_data.operation()].name(),
            port_data.name()
        )
    }
}
