use std::fmt::Display;

use bitflags::bitflags;

bitflags! {
    ///Set of pipeline stages at which a port reads or writes its resource.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct Stages: u32 {
        const TOP_OF_PIPE = 0b1;
        const DRAW_INDIRECT = 0b10;
        const VERTEX_INPUT = 0b100;
        const VERTEX_SHADER = 0b1000;
        const FRAGMENT_SHADER = 0b1_0000;
        const EARLY_FRAGMENT_TESTS = 0b10_0000;
        const LATE_FRAGMENT_TESTS = 0b100_0000;
        const COLOR_ATTACHMENT_OUTPUT = 0b1000_0000;
        const COMPUTE_SHADER = 0b1_0000_0000;
        const TRANSFER_COPY = 0b10_0000_0000;
        const HOST_ACCESS = 0b100_0000_0000;
        const BOTTOM_OF_PIPE = 0b1000_0000_0000;
    }
}

bitflags! {
    ///Minimum hardware capabilities an operation needs from the device it is
    /// scheduled on. The compiler only aggregates those, mapping them to actual
    /// device/feature structures is up to the executing backend.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct DeviceFeatures: u32 {
        const GEOMETRY_SHADER = 0b1;
        const TESSELLATION_SHADER = 0b10;
        const SAMPLER_ANISOTROPY = 0b100;
        const TIMELINE_SEMAPHORES = 0b1000;
        const SPARSE_BINDING = 0b1_0000;
        const RAY_TRACING = 0b10_0000;
    }
}

///Class of hardware queue an operation executes on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum QueueClass {
    Graphics,
    Compute,
    Transfer,
}

impl Display for QueueClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueueClass::Graphics => write!(f, "Graphics"),
            QueueClass::Compute => write!(f, "Compute"),
            QueueClass::Transfer => write!(f, "Transfer"),
        }
    }
}

///GPU internal memory layout of an image. Moving an image between certain
/// layouts needs an explicit transition, which the compiler plans per port.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ImageLayout {
    Undefined,
    General,
    ColorAttachment,
    DepthStencilAttachment,
    ShaderReadOnly,
    TransferSrc,
    TransferDst,
    Present,
}

impl Display for ImageLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

///Layout change that has to happen around a port's execution.
///
/// Computed by the layout inference pass for every port that carries an
/// image-kind resource. Ports of buffer-kind resources keep their seeded
/// `Constant(Undefined)` entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageLayoutTransition {
    ///No transition, the image stays in this layout for the whole operation.
    Constant(ImageLayout),
    ///Transition before the operation reads/writes through this port.
    Pre { from: ImageLayout, to: ImageLayout },
    ///Transition after the operation finished its accesses through this port.
    Post { from: ImageLayout, to: ImageLayout },
    ///Transition both into the working layout and out of it afterwards.
    PreAndPost {
        from: ImageLayout,
        during: ImageLayout,
        to: ImageLayout,
    },
}

impl ImageLayoutTransition {
    ///The transition that must be executed before the port's accesses, if any.
    pub fn pre(&self) -> Option<(ImageLayout, ImageLayout)> {
        match self {
            ImageLayoutTransition::Pre { from, to } => Some((*from, *to)),
            ImageLayoutTransition::PreAndPost { from, during, .. } => Some((*from, *during)),
            _ => None,
        }
    }

    ///The transition that must be executed after the port's accesses, if any.
    pub fn post(&self) -> Option<(ImageLayout, ImageLayout)> {
        match self {
            ImageLayoutTransition::Post { from, to } => Some((*from, *to)),
            ImageLayoutTransition::PreAndPost { during, to, .. } => Some((*during, *to)),
            _ => None,
        }
    }

    ///Layout the image is in while the port's operation executes.
    pub fn layout_during(&self) -> ImageLayout {
        match self {
            ImageLayoutTransition::Constant(l) => *l,
            ImageLayoutTransition::Pre { to, .. } => *to,
            ImageLayoutTransition::Post { from, .. } => *from,
            ImageLayoutTransition::PreAndPost { during, .. } => *during,
        }
    }

    ///Layout the image is left in for the port's successors.
    pub fn layout_leaving(&self) -> ImageLayout {
        match self {
            ImageLayoutTransition::Constant(l) => *l,
            ImageLayoutTransition::Pre { to, .. } => *to,
            ImageLayoutTransition::Post { to, .. } => *to,
            ImageLayoutTransition::PreAndPost { to, .. } => *to,
        }
    }
}

impl Display for ImageLayoutTransition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImageLayoutTransition::Constant(l) => write!(f, "Constant({})", l),
            ImageLayoutTransition::Pre { from, to } => write!(f, "Pre({} -> {})", from, to),
            ImageLayoutTransition::Post { from, to } => write!(f, "Post({} -> {})", from, to),
            ImageLayoutTransition::PreAndPost { from, during, to } => {
                write!(f, "PreAndPost({} -> {} -> {})", from, during, to)
            }
        }
    }
}
