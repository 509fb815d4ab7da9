use smallvec::SmallVec;

use crate::{
    port::PortDescription,
    resources::PortKey,
    state::{DeviceFeatures, QueueClass},
};

///Description of an operation to be declared on a
/// [GraphBuilder](crate::builder::GraphBuilder).
///
/// Plays the role of a parameterized operation factory: render-pass authors
/// build the description (usually through a helper of their own) and the
/// builder instantiates and registers it under a unique name.
#[derive(Clone, Debug)]
pub struct OperationDescription {
    pub queue_class: QueueClass,
    ///Minimum hardware capabilities this operation needs. OR-ed over the
    /// whole graph by the device-feature pass.
    pub features: DeviceFeatures,
    pub ports: Vec<PortDescription>,
}

impl OperationDescription {
    pub fn new(queue_class: QueueClass) -> Self {
        OperationDescription {
            queue_class,
            features: DeviceFeatures::empty(),
            ports: Vec::new(),
        }
    }

    pub fn with_features(mut self, features: DeviceFeatures) -> Self {
        self.features |= features;
        self
    }

    pub fn with_port(mut self, port: PortDescription) -> Self {
        self.ports.push(port);
        self
    }
}

///A declared unit of GPU work. Created once at declaration time, immutable
/// afterwards.
#[derive(Clone, Debug)]
pub struct Operation {
    name: String,
    queue_class: QueueClass,
    features: DeviceFeatures,
    ports: SmallVec<[PortKey; 4]>,
}

impl Operation {
    pub(crate) fn new(name: String, queue_class: QueueClass, features: DeviceFeatures) -> Self {
        Operation {
            name,
            queue_class,
            features,
            ports: SmallVec::new(),
        }
    }

    //Port registration bookkeeping while the builder instantiates the
    // description. Not exposed.
    pub(crate) fn push_port(&mut self, port: PortKey) {
        self.ports.push(port);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn queue_class(&self) -> QueueClass {
        self.queue_class
    }

    pub fn features(&self) -> DeviceFeatures {
        self.features
    }

    ///Ports in declaration order.
    pub fn ports(&self) -> &[PortKey] {
        &self.ports
    }
}
