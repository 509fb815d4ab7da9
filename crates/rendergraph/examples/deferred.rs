//! Small deferred-style frame graph: a transfer upload feeding a geometry
//! pass, a compute tonemapper and a final present consumer. Compiles the
//! graph and prints the resulting execution plan, layout transitions and
//! synchronization commands.

use rendergraph::*;

fn main() -> Result<(), GraphError> {
    simple_logger::SimpleLogger::new()
        .with_level(log::LevelFilter::Trace)
        .init()
        .unwrap();

    let mut builder = GraphBuilder::new();

    let upload = builder.declare_operation(
        "upload",
        OperationDescription::new(QueueClass::Transfer).with_port(PortDescription::producer(
            "vertices",
            Stages::TRANSFER_COPY,
            ResourceKind::Buffer,
            None,
        )),
    )?;

    let geometry = builder.declare_operation(
        "geometry",
        OperationDescription::new(QueueClass::Graphics)
            .with_port(PortDescription::consumer(
                "vertices",
                Stages::VERTEX_INPUT,
                ResourceKind::Buffer,
                None,
            ))
            .with_port(PortDescription::producer(
                "albedo",
                Stages::COLOR_ATTACHMENT_OUTPUT,
                ResourceKind::RenderTarget,
                Some(ImageLayout::ColorAttachment),
            )),
    )?;

    let tonemap = builder.declare_operation(
        "tonemap",
        OperationDescription::new(QueueClass::Compute).with_port(
            PortDescription::modifier(
                "color",
                Stages::COMPUTE_SHADER,
                Stages::COMPUTE_SHADER,
                ResourceKind::RenderTarget,
                ResourceKind::RenderTarget,
                Some(ImageLayout::General),
                Some(ImageLayout::Present),
            )
            .unwrap(),
        ),
    )?;

    let present = builder.declare_operation(
        "present",
        OperationDescription::new(QueueClass::Graphics).with_port(PortDescription::consumer(
            "frame",
            Stages::BOTTOM_OF_PIPE,
            ResourceKind::RenderTarget,
            Some(ImageLayout::Present),
        )),
    )?;

    let vertices = builder.declare_resource("vertices", ResourceKind::Buffer)?;
    let swapchain = builder.declare_resource("swapchain", ResourceKind::RenderTarget)?;

    builder.assign_resource(builder.port(upload, "vertices").unwrap(), vertices)?;
    builder.assign_resource(builder.port(geometry, "albedo").unwrap(), swapchain)?;

    builder.connect(
        builder.port(upload, "vertices").unwrap(),
        builder.port(geometry, "vertices").unwrap(),
    )?;
    builder.connect(
        builder.port(geometry, "albedo").unwrap(),
        builder.port(tonemap, "color").unwrap(),
    )?;
    builder.connect(
        builder.port(tonemap, "color").unwrap(),
        builder.port(present, "frame").unwrap(),
    )?;

    let graph = builder.compile()?;

    println!("{}", graph.execution_plan());
    println!("required features: {:?}", graph.required_device_features());

    println!("execution order:");
    for op in graph.operation_execution_order() {
        let operation = graph.operation(*op);
        println!("  {} [{}]", operation.name(), operation.queue_class());
        for port in operation.ports() {
            println!(
                "    {} tracks \"{}\", layout {}",
                graph.port_info(*port).name(),
                graph.resource_at(*port).name(),
                graph.image_transition_at(*port)
            );
        }
    }

    println!("sync commands: {}", graph.sync_graph().len());
    for (key, command) in graph.sync_graph().iter() {
        println!("  {}", command);
        for prerequisite in graph.sync_graph().dependencies(key) {
            println!("    after {}", graph.sync_graph().command(*prerequisite));
        }
    }

    #[cfg(feature = "dot")]
    println!("{}", graph.to_dot());

    Ok(())
}
