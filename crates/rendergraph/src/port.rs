use crate::{
    resources::{OperationKey, ResourceConstraint},
    state::{ImageLayout, Stages},
};

///The three roles a port can take within the graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PortVariant {
    ///Supplies a resource to the graph. If the resource is an image, the
    /// producer has to state the layout it leaves the image in.
    Producer { ensures: Option<ImageLayout> },
    ///Receives a resource, optionally demanding a layout on entry.
    Consumer { requires: Option<ImageLayout> },
    ///Receives a resource and re-supplies the same identity to its
    /// successors, optionally transitioning the layout on entry and exit.
    Modifier {
        requires: Option<ImageLayout>,
        ensures: Option<ImageLayout>,
    },
}

impl PortVariant {
    pub fn is_producer(&self) -> bool {
        matches!(self, PortVariant::Producer { .. })
    }

    ///True if the port feeds a resource into the graph for its successors,
    /// i.e. it may carry an outgoing connection.
    pub fn supplies(&self) -> bool {
        matches!(self, PortVariant::Producer { .. } | PortVariant::Modifier { .. })
    }

    ///True if the port receives a resource, i.e. it may carry an incoming
    /// connection.
    pub fn receives(&self) -> bool {
        matches!(self, PortVariant::Consumer { .. } | PortVariant::Modifier { .. })
    }
}

///Description of a single port, part of an [OperationDescription](crate::operation::OperationDescription).
#[derive(Clone, Debug)]
pub struct PortDescription {
    pub name: String,
    pub reads: Stages,
    pub writes: Stages,
    pub constraint: ResourceConstraint,
    pub variant: PortVariant,
}

impl PortDescription {
    pub fn producer(
        name: impl Into<String>,
        writes: Stages,
        constraint: impl Into<ResourceConstraint>,
        ensures: Option<ImageLayout>,
    ) -> Self {
        PortDescription {
            name: name.into(),
            reads: Stages::empty(),
            writes,
            constraint: constraint.into(),
            variant: PortVariant::Producer { ensures },
        }
    }

    pub fn consumer(
        name: impl Into<String>,
        reads: Stages,
        constraint: impl Into<ResourceConstraint>,
        requires: Option<ImageLayout>,
    ) -> Self {
        PortDescription {
            name: name.into(),
            reads,
            writes: Stages::empty(),
            constraint: constraint.into(),
            variant: PortVariant::Consumer { requires },
        }
    }

    ///A modifier consumes through `consumes` and re-supplies through
    /// `produces`. Both constraints have to name the same resource kind,
    /// since the identity flowing through the port does not change.
    pub fn modifier(
        name: impl Into<String>,
        reads: Stages,
        writes: Stages,
        consumes: impl Into<ResourceConstraint>,
        produces: impl Into<ResourceConstraint>,
        requires: Option<ImageLayout>,
        ensures: Option<ImageLayout>,
    ) -> Result<Self, String> {
        let consumes = consumes.into();
        let produces = produces.into();
        if consumes.kind != produces.kind {
            return Err(format!(
                "modifier consumes {} but produces {}, both sides must name the same resource kind",
                consumes.kind, produces.kind
            ));
        }

        Ok(PortDescription {
            name: name.into(),
            reads,
            writes,
            constraint: consumes,
            variant: PortVariant::Modifier { requires, ensures },
        })
    }

    ///Local shape validation, run once when the owning operation is declared.
    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.name.is_empty() {
            return Err("port name must not be empty".to_string());
        }

        if let PortVariant::Producer { ensures } = &self.variant {
            if self.constraint.kind.is_image() && ensures.is_none() {
                return Err(format!(
                    "producer port over image kind {} must declare the layout it ensures",
                    self.constraint.kind
                ));
            }
        }

        Ok(())
    }
}

///A registered port. Created by the builder from a [PortDescription] when the
/// owning operation is declared, immutable afterwards.
#[derive(Clone, Debug)]
pub struct Port {
    operation: OperationKey,
    name: String,
    reads: Stages,
    writes: Stages,
    constraint: ResourceConstraint,
    variant: PortVariant,
}

impl Port {
    pub(crate) fn new(operation: OperationKey, desc: PortDescription) -> Self {
        Port {
            operation,
            name: desc.name,
            reads: desc.reads,
            writes: desc.writes,
            constraint: desc.constraint,
            variant: desc.variant,
        }
    }

    pub fn operation(&self) -> OperationKey {
        self.operation
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn reads(&self) -> Stages {
        self.reads
    }

    pub fn writes(&self) -> Stages {
        self.writes
    }

    pub fn constraint(&self) -> ResourceConstraint {
        self.constraint
    }

    pub fn variant(&self) -> &PortVariant {
        &self.variant
    }

    ///Layout this port promises to leave an image in, if it promises one.
    pub fn ensures_layout(&self) -> Option<ImageLayout> {
        match &self.variant {
            PortVariant::Producer { ensures } => *ensures,
            PortVariant::Modifier { ensures, .. } => *ensures,
            PortVariant::Consumer { .. } => None,
        }
    }

    ///Layout this port demands an image to be in on entry, if it demands one.
    pub fn requires_layout(&self) -> Option<ImageLayout> {
        match &self.variant {
            PortVariant::Producer { .. } => None,
            PortVariant::Consumer { requires } => *requires,
            PortVariant::Modifier { requires, .. } => *requires,
        }
    }

    ///Maximum number of incoming connections for this port's variant.
    pub(crate) fn max_in(&self) -> usize {
        if self.variant.receives() {
            1
        } else {
            0
        }
    }

    ///Maximum number of outgoing connections for this port's variant.
    pub(crate) fn max_out(&self) -> usize {
        if self.variant.supplies() {
            1
        } else {
            0
        }
    }
}
