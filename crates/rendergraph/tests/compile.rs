use rendergraph::*;

fn buffer_producer(writes: Stages) -> OperationDescription {
    OperationDescription::new(QueueClass::Transfer).with_port(PortDescription::producer(
        "out",
        writes,
        ResourceKind::Buffer,
        None,
    ))
}

fn buffer_consumer(queue: QueueClass, reads: Stages) -> OperationDescription {
    OperationDescription::new(queue).with_port(PortDescription::consumer(
        "in",
        reads,
        ResourceKind::Buffer,
        None,
    ))
}

fn buffer_modifier(queue: QueueClass, reads: Stages, writes: Stages) -> OperationDescription {
    OperationDescription::new(queue).with_port(
        PortDescription::modifier(
            "inout",
            reads,
            writes,
            ResourceKind::Buffer,
            ResourceKind::Buffer,
            None,
            None,
        )
        .unwrap(),
    )
}

#[test]
fn empty_graph_fails() {
    let err = GraphBuilder::new().compile().unwrap_err();
    assert_eq!(err.code(), "error-graph-empty");
}

#[test]
fn unconnected_ports_are_collected() {
    let mut builder = GraphBuilder::new();
    builder
        .declare_operation("a", buffer_producer(Stages::TRANSFER_COPY))
        .unwrap();
    builder
        .declare_operation("b", buffer_consumer(QueueClass::Graphics, Stages::VERTEX_INPUT))
        .unwrap();

    let err = builder.compile().unwrap_err();
    assert_eq!(err.code(), "error-graph-ports-unconnected");
    //both dangling ports are reported together
    let ports = err.attributes().get("ports").unwrap().clone();
    assert!(ports.contains("a.out"));
    assert!(ports.contains("b.in"));
}

#[test]
fn receiving_port_without_incoming_edge_fails() {
    //a modifier wired only on its output side has no resource to track, the
    // chain behind it must not compile into a resource-less graph
    let mut builder = GraphBuilder::new();
    let m = builder
        .declare_operation(
            "m",
            buffer_modifier(QueueClass::Compute, Stages::COMPUTE_SHADER, Stages::COMPUTE_SHADER),
        )
        .unwrap();
    let c = builder
        .declare_operation("c", buffer_consumer(QueueClass::Compute, Stages::COMPUTE_SHADER))
        .unwrap();
    builder
        .connect(
            builder.port(m, "inout").unwrap(),
            builder.port(c, "in").unwrap(),
        )
        .unwrap();

    let err = builder.compile().unwrap_err();
    assert_eq!(err.code(), "error-graph-ports-unconnected");
    let ports = err.attributes().get("ports").unwrap().clone();
    assert!(ports.contains("m.inout"));
    //the consumer is connected on its input side and not reported
    assert!(!ports.contains("c.in"));
}

#[test]
fn unassigned_producer_fails() {
    let mut builder = GraphBuilder::new();
    let a = builder
        .declare_operation("a", buffer_producer(Stages::TRANSFER_COPY))
        .unwrap();
    let b = builder
        .declare_operation("b", buffer_consumer(QueueClass::Graphics, Stages::VERTEX_INPUT))
        .unwrap();
    builder
        .connect(
            builder.port(a, "out").unwrap(),
            builder.port(b, "in").unwrap(),
        )
        .unwrap();

    let err = builder.compile().unwrap_err();
    assert_eq!(err.code(), "error-graph-port-unassigned-resource");
    assert!(err.attributes().get("ports").unwrap().contains("a.out"));
}

#[test]
fn incompatible_resource_kind_fails() {
    let mut builder = GraphBuilder::new();
    let a = builder
        .declare_operation("a", buffer_producer(Stages::TRANSFER_COPY))
        .unwrap();
    let b = builder
        .declare_operation("b", buffer_consumer(QueueClass::Graphics, Stages::VERTEX_INPUT))
        .unwrap();
    let image = builder.declare_resource("image", ResourceKind::Image2D).unwrap();

    builder
        .assign_resource(builder.port(a, "out").unwrap(), image)
        .unwrap();
    builder
        .connect(
            builder.port(a, "out").unwrap(),
            builder.port(b, "in").unwrap(),
        )
        .unwrap();

    let err = builder.compile().unwrap_err();
    assert_eq!(err.code(), "error-graph-port-type-incompatible");
    let attributes = err.attributes();
    assert_eq!(attributes.get("resource").unwrap(), "image");
    assert_eq!(attributes.get("expected").unwrap(), "Buffer");
    assert_eq!(attributes.get("found").unwrap(), "Image2D");
}

#[test]
fn execution_order_is_linear_extension() {
    //diamond on the operation graph: upload feeds two compute passes which
    // feed a final consumer through separate resources
    let mut builder = GraphBuilder::new();

    let upload = builder
        .declare_operation(
            "upload",
            OperationDescription::new(QueueClass::Transfer)
                .with_port(PortDescription::producer(
                    "left",
                    Stages::TRANSFER_COPY,
                    ResourceKind::Buffer,
                    None,
                ))
                .with_port(PortDescription::producer(
                    "right",
                    Stages::TRANSFER_COPY,
                    ResourceKind::Buffer,
                    None,
                )),
        )
        .unwrap();
    let blur = builder
        .declare_operation(
            "blur",
            buffer_modifier(QueueClass::Compute, Stages::COMPUTE_SHADER, Stages::COMPUTE_SHADER),
        )
        .unwrap();
    let sharpen = builder
        .declare_operation(
            "sharpen",
            buffer_modifier(QueueClass::Compute, Stages::COMPUTE_SHADER, Stages::COMPUTE_SHADER),
        )
        .unwrap();
    let compose = builder
        .declare_operation(
            "compose",
            OperationDescription::new(QueueClass::Graphics)
                .with_port(PortDescription::consumer(
                    "a",
                    Stages::FRAGMENT_SHADER,
                    ResourceKind::Buffer,
                    None,
                ))
                .with_port(PortDescription::consumer(
                    "b",
                    Stages::FRAGMENT_SHADER,
                    ResourceKind::Buffer,
                    None,
                )),
        )
        .unwrap();

    let left = builder.declare_resource("left", ResourceKind::Buffer).unwrap();
    let right = builder.declare_resource("right", ResourceKind::Buffer).unwrap();
    builder
        .assign_resource(builder.port(upload, "left").unwrap(), left)
        .unwrap();
    builder
        .assign_resource(builder.port(upload, "right").unwrap(), right)
        .unwrap();

    builder
        .connect(
            builder.port(upload, "left").unwrap(),
            builder.port(blur, "inout").unwrap(),
        )
        .unwrap();
    builder
        .connect(
            builder.port(upload, "right").unwrap(),
            builder.port(sharpen, "inout").unwrap(),
        )
        .unwrap();
    builder
        .connect(
            builder.port(blur, "inout").unwrap(),
            builder.port(compose, "a").unwrap(),
        )
        .unwrap();
    builder
        .connect(
            builder.port(sharpen, "inout").unwrap(),
            builder.port(compose, "b").unwrap(),
        )
        .unwrap();

    let graph = builder.compile().unwrap();
    let order = graph.operation_execution_order();
    assert_eq!(order.len(), 4);

    let pos = |key| order.iter().position(|o| *o == key).unwrap();
    assert!(pos(upload) < pos(blur));
    assert!(pos(upload) < pos(sharpen));
    assert!(pos(blur) < pos(compose));
    assert!(pos(sharpen) < pos(compose));
}

#[test]
fn resource_identity_propagates_along_chain() {
    let mut builder = GraphBuilder::new();
    let a = builder
        .declare_operation("a", buffer_producer(Stages::TRANSFER_COPY))
        .unwrap();
    let b = builder
        .declare_operation(
            "b",
            buffer_modifier(QueueClass::Compute, Stages::COMPUTE_SHADER, Stages::COMPUTE_SHADER),
        )
        .unwrap();
    let c = builder
        .declare_operation("c", buffer_consumer(QueueClass::Graphics, Stages::VERTEX_INPUT))
        .unwrap();

    let buffer = builder.declare_resource("buffer", ResourceKind::Buffer).unwrap();
    let a_out = builder.port(a, "out").unwrap();
    let b_io = builder.port(b, "inout").unwrap();
    let c_in = builder.port(c, "in").unwrap();

    builder.assign_resource(a_out, buffer).unwrap();
    builder.connect(a_out, b_io).unwrap();
    builder.connect(b_io, c_in).unwrap();

    let graph = builder.compile().unwrap();
    for port in [a_out, b_io, c_in] {
        assert_eq!(graph.resource_key_at(port), buffer);
        assert_eq!(graph.resource_at(port).name(), "buffer");
    }
}

#[test]
fn layout_inference_four_way_classification() {
    //Producer ensures Undefined; modifier requires ColorAttachment, ensures
    // nothing; consumer has no requirement.
    let mut builder = GraphBuilder::new();
    let producer = builder
        .declare_operation(
            "producer",
            OperationDescription::new(QueueClass::Graphics).with_port(PortDescription::producer(
                "out",
                Stages::TOP_OF_PIPE,
                ResourceKind::Image2D,
                Some(ImageLayout::Undefined),
            )),
        )
        .unwrap();
    let modifier = builder
        .declare_operation(
            "modifier",
            OperationDescription::new(QueueClass::Graphics).with_port(
                PortDescription::modifier(
                    "inout",
                    Stages::COLOR_ATTACHMENT_OUTPUT,
                    Stages::COLOR_ATTACHMENT_OUTPUT,
                    ResourceKind::Image2D,
                    ResourceKind::Image2D,
                    Some(ImageLayout::ColorAttachment),
                    None,
                )
                .unwrap(),
            ),
        )
        .unwrap();
    let consumer = builder
        .declare_operation(
            "consumer",
            OperationDescription::new(QueueClass::Graphics).with_port(PortDescription::consumer(
                "in",
                Stages::FRAGMENT_SHADER,
                ResourceKind::Image2D,
                None,
            )),
        )
        .unwrap();

    let image = builder.declare_resource("image", ResourceKind::Image2D).unwrap();
    let p_out = builder.port(producer, "out").unwrap();
    let m_io = builder.port(modifier, "inout").unwrap();
    let c_in = builder.port(consumer, "in").unwrap();

    builder.assign_resource(p_out, image).unwrap();
    builder.connect(p_out, m_io).unwrap();
    builder.connect(m_io, c_in).unwrap();

    let graph = builder.compile().unwrap();
    assert_eq!(
        graph.image_transition_at(p_out),
        ImageLayoutTransition::Constant(ImageLayout::Undefined)
    );
    assert_eq!(
        graph.image_transition_at(m_io),
        ImageLayoutTransition::Pre {
            from: ImageLayout::Undefined,
            to: ImageLayout::ColorAttachment
        }
    );
    assert_eq!(
        graph.image_transition_at(c_in),
        ImageLayoutTransition::Constant(ImageLayout::ColorAttachment)
    );
}

#[test]
fn buffer_chain_synthesizes_memory_barriers() {
    //Producer(writes TRANSFER_COPY) -> Modifier(reads/writes COLOR) ->
    // Consumer(reads COLOR), all buffer typed, single queue class.
    let mut builder = GraphBuilder::new();
    let producer = builder
        .declare_operation(
            "producer",
            OperationDescription::new(QueueClass::Graphics).with_port(PortDescription::producer(
                "out",
                Stages::TRANSFER_COPY,
                ResourceKind::Buffer,
                None,
            )),
        )
        .unwrap();
    let modifier = builder
        .declare_operation(
            "modifier",
            buffer_modifier(
                QueueClass::Graphics,
                Stages::COLOR_ATTACHMENT_OUTPUT,
                Stages::COLOR_ATTACHMENT_OUTPUT,
            ),
        )
        .unwrap();
    let consumer = builder
        .declare_operation(
            "consumer",
            buffer_consumer(QueueClass::Graphics, Stages::COLOR_ATTACHMENT_OUTPUT),
        )
        .unwrap();

    let buffer = builder.declare_resource("buffer", ResourceKind::Buffer).unwrap();
    let p_out = builder.port(producer, "out").unwrap();
    let m_io = builder.port(modifier, "inout").unwrap();
    let c_in = builder.port(consumer, "in").unwrap();

    builder.assign_resource(p_out, buffer).unwrap();
    builder.connect(p_out, m_io).unwrap();
    builder.connect(m_io, c_in).unwrap();

    let graph = builder.compile().unwrap();
    let sync = graph.sync_graph();

    let read_barriers: Vec<_> = sync
        .iter()
        .filter_map(|(_k, cmd)| match cmd {
            SyncCommand::MemoryReadBarrier {
                wait_stage,
                block_stages,
            } => Some((*wait_stage, *block_stages)),
            _ => None,
        })
        .collect();
    let write_barriers: Vec<_> = sync
        .iter()
        .filter_map(|(_k, cmd)| match cmd {
            SyncCommand::MemoryWriteBarrier {
                wait_stage,
                block_stages,
            } => Some((*wait_stage, *block_stages)),
            _ => None,
        })
        .collect();

    //one read/write pair bridging producer -> modifier
    assert!(read_barriers
        .contains(&(Stages::TRANSFER_COPY, Stages::COLOR_ATTACHMENT_OUTPUT)));
    assert_eq!(
        write_barriers,
        vec![(Stages::TRANSFER_COPY, Stages::COLOR_ATTACHMENT_OUTPUT)]
    );
    //one read barrier bridging modifier -> consumer
    assert!(read_barriers.contains(&(
        Stages::COLOR_ATTACHMENT_OUTPUT,
        Stages::COLOR_ATTACHMENT_OUTPUT
    )));
    assert_eq!(read_barriers.len(), 2);

    //no image barriers anywhere, the chain is buffer typed
    assert!(!sync.iter().any(|(_k, cmd)| matches!(
        cmd,
        SyncCommand::ImageReadBarrier { .. } | SyncCommand::ImageWriteBarrier { .. }
    )));
}

#[test]
fn post_transition_is_layered_on_the_write() {
    //Producer leaves the image in TransferDst, the modifier renders into it
    // as ColorAttachment and hands it over as ShaderReadOnly. The consumer
    // requires exactly that, so its own barrier is a plain memory barrier
    // that must depend on the modifier's post layout barrier.
    let mut builder = GraphBuilder::new();
    let producer = builder
        .declare_operation(
            "producer",
            OperationDescription::new(QueueClass::Transfer).with_port(PortDescription::producer(
                "out",
                Stages::TRANSFER_COPY,
                ResourceKind::Image2D,
                Some(ImageLayout::TransferDst),
            )),
        )
        .unwrap();
    let modifier = builder
        .declare_operation(
            "modifier",
            OperationDescription::new(QueueClass::Graphics).with_port(
                PortDescription::modifier(
                    "inout",
                    Stages::COLOR_ATTACHMENT_OUTPUT,
                    Stages::COLOR_ATTACHMENT_OUTPUT,
                    ResourceKind::Image2D,
                    ResourceKind::Image2D,
                    Some(ImageLayout::ColorAttachment),
                    Some(ImageLayout::ShaderReadOnly),
                )
                .unwrap(),
            ),
        )
        .unwrap();
    let consumer = builder
        .declare_operation(
            "consumer",
            OperationDescription::new(QueueClass::Graphics).with_port(PortDescription::consumer(
                "in",
                Stages::FRAGMENT_SHADER,
                ResourceKind::Image2D,
                Some(ImageLayout::ShaderReadOnly),
            )),
        )
        .unwrap();

    let image = builder.declare_resource("image", ResourceKind::Image2D).unwrap();
    let p_out = builder.port(producer, "out").unwrap();
    let m_io = builder.port(modifier, "inout").unwrap();
    let c_in = builder.port(consumer, "in").unwrap();

    builder.assign_resource(p_out, image).unwrap();
    builder.connect(p_out, m_io).unwrap();
    builder.connect(m_io, c_in).unwrap();

    let graph = builder.compile().unwrap();
    assert_eq!(
        graph.image_transition_at(m_io),
        ImageLayoutTransition::PreAndPost {
            from: ImageLayout::TransferDst,
            during: ImageLayout::ColorAttachment,
            to: ImageLayout::ShaderReadOnly,
        }
    );
    assert_eq!(
        graph.image_transition_at(c_in),
        ImageLayoutTransition::Constant(ImageLayout::ShaderReadOnly)
    );

    let sync = graph.sync_graph();

    //the modifier's pre transition shows up as image read + image write
    // barrier against the producer's write
    assert!(sync.iter().any(|(_k, cmd)| match cmd {
        SyncCommand::ImageReadBarrier {
            wait_stage,
            from,
            to,
            ..
        } =>
            *wait_stage == Stages::TRANSFER_COPY
                && *from == ImageLayout::TransferDst
                && *to == ImageLayout::ColorAttachment,
        _ => false,
    }));

    //the consumer sees the post transition through leaf resolution: its
    // memory read barrier depends on the post image write barrier, not on
    // the raw write
    let (consumer_barrier, _) = sync
        .iter()
        .find(|(_k, cmd)| match cmd {
            SyncCommand::MemoryReadBarrier {
                wait_stage,
                block_stages,
            } =>
                *wait_stage == Stages::COLOR_ATTACHMENT_OUTPUT
                    && *block_stages == Stages::FRAGMENT_SHADER,
            _ => false,
        })
        .expect("consumer read barrier missing");

    let prerequisite = sync.dependencies(consumer_barrier)[0];
    assert!(matches!(
        sync.command(prerequisite),
        SyncCommand::ImageWriteBarrier {
            from: ImageLayout::ColorAttachment,
            to: ImageLayout::ShaderReadOnly,
            ..
        }
    ));
}

#[test]
fn submissions_split_on_queue_class_change() {
    //four chained operations: transfer, transfer, compute, compute
    let mut builder = GraphBuilder::new();
    let a = builder
        .declare_operation("a", buffer_producer(Stages::TRANSFER_COPY))
        .unwrap();
    let b = builder
        .declare_operation(
            "b",
            buffer_modifier(QueueClass::Transfer, Stages::TRANSFER_COPY, Stages::TRANSFER_COPY),
        )
        .unwrap();
    let c = builder
        .declare_operation(
            "c",
            buffer_modifier(QueueClass::Compute, Stages::COMPUTE_SHADER, Stages::COMPUTE_SHADER),
        )
        .unwrap();
    let d = builder
        .declare_operation(
            "d",
            OperationDescription::new(QueueClass::Compute).with_port(PortDescription::consumer(
                "in",
                Stages::COMPUTE_SHADER,
                ResourceKind::Buffer,
                None,
            )),
        )
        .unwrap();

    let buffer = builder.declare_resource("buffer", ResourceKind::Buffer).unwrap();
    builder
        .assign_resource(builder.port(a, "out").unwrap(), buffer)
        .unwrap();
    builder
        .connect(
            builder.port(a, "out").unwrap(),
            builder.port(b, "inout").unwrap(),
        )
        .unwrap();
    builder
        .connect(
            builder.port(b, "inout").unwrap(),
            builder.port(c, "inout").unwrap(),
        )
        .unwrap();
    builder
        .connect(
            builder.port(c, "inout").unwrap(),
            builder.port(d, "in").unwrap(),
        )
        .unwrap();

    let graph = builder.compile().unwrap();
    let plan = graph.execution_plan();

    assert_eq!(plan.submissions().len(), 2);
    assert_eq!(plan.submissions()[0].queue_class(), QueueClass::Transfer);
    assert_eq!(plan.submissions()[0].ordinal(), 0);
    assert_eq!(plan.submissions()[0].operations(), &[a, b]);
    assert_eq!(plan.submissions()[1].queue_class(), QueueClass::Compute);
    assert_eq!(plan.submissions()[1].ordinal(), 1);
    assert_eq!(plan.submissions()[1].operations(), &[c, d]);
}

#[test]
fn required_features_are_aggregated() {
    let mut builder = GraphBuilder::new();
    let a = builder
        .declare_operation(
            "a",
            buffer_producer(Stages::TRANSFER_COPY).with_features(DeviceFeatures::TIMELINE_SEMAPHORES),
        )
        .unwrap();
    let b = builder
        .declare_operation(
            "b",
            buffer_consumer(QueueClass::Graphics, Stages::FRAGMENT_SHADER)
                .with_features(DeviceFeatures::SAMPLER_ANISOTROPY | DeviceFeatures::GEOMETRY_SHADER),
        )
        .unwrap();

    let buffer = builder.declare_resource("buffer", ResourceKind::Buffer).unwrap();
    builder
        .assign_resource(builder.port(a, "out").unwrap(), buffer)
        .unwrap();
    builder
        .connect(
            builder.port(a, "out").unwrap(),
            builder.port(b, "in").unwrap(),
        )
        .unwrap();

    let graph = builder.compile().unwrap();
    assert_eq!(
        graph.required_device_features(),
        DeviceFeatures::TIMELINE_SEMAPHORES
            | DeviceFeatures::SAMPLER_ANISOTROPY
            | DeviceFeatures::GEOMETRY_SHADER
    );
}

#[test]
fn render_target_satisfies_image_constraint() {
    let mut builder = GraphBuilder::new();
    let a = builder
        .declare_operation(
            "a",
            OperationDescription::new(QueueClass::Graphics).with_port(PortDescription::producer(
                "out",
                Stages::COLOR_ATTACHMENT_OUTPUT,
                ResourceKind::Image2D,
                Some(ImageLayout::ColorAttachment),
            )),
        )
        .unwrap();
    let b = builder
        .declare_operation(
            "b",
            OperationDescription::new(QueueClass::Graphics).with_port(PortDescription::consumer(
                "in",
                Stages::FRAGMENT_SHADER,
                ResourceKind::Image2D,
                None,
            )),
        )
        .unwrap();

    let target = builder
        .declare_resource("target", ResourceKind::RenderTarget)
        .unwrap();
    builder
        .assign_resource(builder.port(a, "out").unwrap(), target)
        .unwrap();
    builder
        .connect(
            builder.port(a, "out").unwrap(),
            builder.port(b, "in").unwrap(),
        )
        .unwrap();

    let graph = builder.compile().unwrap();
    assert_eq!(graph.resource_at(builder_port(&graph, "b", "in")).kind(), ResourceKind::RenderTarget);
}

fn builder_port(graph: &Graph, operation: &str, port: &str) -> PortKey {
    let op = graph.operation_by_name(operation).unwrap();
    graph.port(op, port).unwrap()
}
