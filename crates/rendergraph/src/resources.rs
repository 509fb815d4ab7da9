use std::fmt::Display;

slotmap::new_key_type! {
    ///Key referencing a declared operation within its builder/graph.
    pub struct OperationKey;
}
slotmap::new_key_type! {
    ///Key referencing a single port of a declared operation.
    pub struct PortKey;
}
slotmap::new_key_type! {
    ///Key referencing a declared resource placeholder.
    pub struct ResourceKey;
}

///Closed set of resource kinds the compiler knows about.
///
/// This replaces an open class hierarchy with explicit structural
/// assignability: a render target *is* an image for every check the compiler
/// performs, everything else only matches itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Buffer,
    Image2D,
    Composite,
    RenderTarget,
}

impl ResourceKind {
    ///True if a resource of this kind can be bound to a port constrained to
    /// `constraint`.
    pub fn is_assignable_to(&self, constraint: ResourceKind) -> bool {
        match (self, constraint) {
            (a, b) if *a == b => true,
            (ResourceKind::RenderTarget, ResourceKind::Image2D) => true,
            _ => false,
        }
    }

    ///True for kinds that carry an image layout and therefore participate in
    /// layout inference.
    pub fn is_image(&self) -> bool {
        matches!(self, ResourceKind::Image2D | ResourceKind::RenderTarget)
    }
}

impl Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

///Constraint a port places on the resources that may flow through it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResourceConstraint {
    pub kind: ResourceKind,
}

impl ResourceConstraint {
    pub fn of(kind: ResourceKind) -> Self {
        ResourceConstraint { kind }
    }

    pub fn allows(&self, kind: ResourceKind) -> bool {
        kind.is_assignable_to(self.kind)
    }
}

impl From<ResourceKind> for ResourceConstraint {
    fn from(kind: ResourceKind) -> Self {
        ResourceConstraint::of(kind)
    }
}

///Placeholder for a GPU resident object.
///
/// The compiler never touches actual memory, it only tracks the placeholder's
/// identity through the port graph. Binding the placeholder to a concrete
/// buffer/image is left to the executing backend.
#[derive(Clone, Debug)]
pub struct Resource {
    name: String,
    kind: ResourceKind,
}

impl Resource {
    pub(crate) fn new(name: String, kind: ResourceKind) -> Self {
        Resource { name, kind }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }
}
