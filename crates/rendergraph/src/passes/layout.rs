use smallvec::SmallVec;

use super::Pass;
use crate::{
    builder::GraphBuilder,
    port::PortVariant,
    resources::PortKey,
    state::{ImageLayout, ImageLayoutTransition},
    GraphError,
};

///Infers the image-layout transition of every port carrying an image-kind
/// resource.
///
/// A depth-first walk starts at every image producer, carrying the layout the
/// producer ensures. Consumers compare the incoming layout against their
/// requirement, modifiers are classified by whether the entry and/or the
/// exit transition actually changes anything. Ports tracked to buffer-kind
/// resources keep their seeded `Constant(Undefined)` entry and are not
/// visited at all.
///
/// Every non-producer port has exactly one incoming edge, so the walk from
/// one producer is a tree and each port is classified exactly once.
pub(super) struct LayoutInferencePass;

impl Pass for LayoutInferencePass {
    fn name(&self) -> &'static str {
        "layout-inference"
    }

    fn depends_on(&self) -> &'static [&'static str] {
        &["resource-tracking"]
    }

    fn run(&self, builder: &mut GraphBuilder) -> Result<(), GraphError> {
        for port in builder.port_order.clone() {
            if !builder.ports[port].variant().is_producer() {
                continue;
            }
            let Some(&resource) = builder.tracked.get(port) else {
                continue;
            };
            if !builder.resources[resource].kind().is_image() {
                continue;
            }

            //Validated at declaration: an image producer always ensures a
            // layout.
            let ensured = builder.ports[port]
                .ensures_layout()
                .expect("image producer without ensured layout");

            builder
                .transitions
                .insert(port, ImageLayoutTransition::Constant(ensured));

            #[cfg(feature = "log_reasoning")]
            log::trace!(
                "layout walk from {} starts at {}",
                builder.port_display_name(port),
                ensured
            );

            walk_successors(builder, port, ensured);
        }

        Ok(())
    }
}

fn walk_successors(builder: &mut GraphBuilder, producer: PortKey, ensured: ImageLayout) {
    let mut stack: SmallVec<[(PortKey, ImageLayout); 8]> = builder
        .port_graph
        .outgoing(producer)
        .iter()
        .map(|succ| (*succ, ensured))
        .collect();

    while let Some((port, incoming)) = stack.pop() {
        let transition = match builder.ports[port].variant() {
            PortVariant::Consumer { requires } => match requires {
                Some(required) if *required != incoming => ImageLayoutTransition::Pre {
                    from: incoming,
                    to: *required,
                },
                _ => ImageLayoutTransition::Constant(incoming),
            },
            PortVariant::Modifier { requires, ensures } => {
                classify_modifier(incoming, *requires, *ensures)
            }
            //Producers have no incoming edges and therefore never show up as
            // successors.
            PortVariant::Producer { .. } => unreachable!("producer as connection target"),
        };

        #[cfg(feature = "log_reasoning")]
        log::trace!(
            "layout at {}: {}",
            builder.port_display_name(port),
            transition
        );

        builder.transitions.insert(port, transition);

        let leaving = transition.layout_leaving();
        for succ in builder.port_graph.outgoing(port) {
            stack.push((*succ, leaving));
        }
    }
}

///Four way classification of a modifier port: working layout is the required
/// one if present (otherwise whatever comes in), leaving layout is the
/// ensured one if present (otherwise the working layout).
fn classify_modifier(
    incoming: ImageLayout,
    requires: Option<ImageLayout>,
    ensures: Option<ImageLayout>,
) -> ImageLayoutTransition {
    let during = requires.unwrap_or(incoming);
    let leaving = ensures.unwrap_or(during);

    let pre_differs = during != incoming;
    let post_differs = leaving != during;

    match (pre_differs, post_differs) {
        (true, true) => ImageLayoutTransition::PreAndPost {
            from: incoming,
            during,
            to: leaving,
        },
        (true, false) => ImageLayoutTransition::Pre {
            from: incoming,
            to: during,
        },
        (false, true) => ImageLayoutTransition::Post {
            from: during,
            to: leaving,
        },
        (false, false) => ImageLayoutTransition::Constant(incoming),
    }
}
