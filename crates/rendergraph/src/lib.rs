//! # Render-dependency-graph compiler
//!
//! Turns a declarative description of GPU operations, the resources they
//! touch and the ports connecting them into
//!
//! 1. a validated, cycle free execution order,
//! 2. a per-resource image-layout transition plan and
//! 3. an explicit set of synchronization commands (read/write barriers
//!    grouped into per-queue submissions).
//!
//! The compiler produces a *specification* of the work, it never records or
//! submits anything itself. Declare operations and resources on a
//! [GraphBuilder](builder::GraphBuilder), wire the ports, then call
//! [compile](builder::GraphBuilder::compile) to obtain the immutable
//! [Graph](graph::Graph). The graph is rebuilt when the declaration changes
//! (usually on configuration changes), not per frame.
//!
//! ```
//! use rendergraph::*;
//!
//! let mut builder = GraphBuilder::new();
//! let upload = builder.declare_operation(
//!     "upload",
//!     OperationDescription::new(QueueClass::Transfer).with_port(PortDescription::producer(
//!         "staged",
//!         Stages::TRANSFER_COPY,
//!         ResourceKind::Buffer,
//!         None,
//!     )),
//! )?;
//! let draw = builder.declare_operation(
//!     "draw",
//!     OperationDescription::new(QueueClass::Graphics).with_port(PortDescription::consumer(
//!         "vertices",
//!         Stages::VERTEX_INPUT,
//!         ResourceKind::Buffer,
//!         None,
//!     )),
//! )?;
//!
//! let vertices = builder.declare_resource("vertices", ResourceKind::Buffer)?;
//! builder.assign_resource(builder.port(upload, "staged").unwrap(), vertices)?;
//! builder.connect(
//!     builder.port(upload, "staged").unwrap(),
//!     builder.port(draw, "vertices").unwrap(),
//! )?;
//!
//! let graph = builder.compile()?;
//! assert_eq!(graph.execution_plan().submissions().len(), 2);
//! # Ok::<(), rendergraph::GraphError>(())
//! ```

use ahash::AHashMap;
use thiserror::Error;

pub(crate) mod dag;

mod builder;
pub use builder::GraphBuilder;

mod graph;
pub use graph::Graph;

mod operation;
pub use operation::{Operation, OperationDescription};

mod port;
pub use port::{Port, PortDescription, PortVariant};

mod resources;
pub use resources::{
    OperationKey, PortKey, Resource, ResourceConstraint, ResourceKey, ResourceKind,
};

mod state;
pub use state::{DeviceFeatures, ImageLayout, ImageLayoutTransition, QueueClass, Stages};

mod sync;
pub use sync::{ExecutionPlan, Submission, SyncCommand, SyncGraph, SyncKey};

pub(crate) mod passes;

#[cfg(feature = "dot")]
mod dot;

///Top level error structure.
///
/// Every variant is an author-time error in how the render graph was
/// declared. There is no recovery, the caller has to fix the declaration and
/// rebuild the graph from scratch. [code](GraphError::code) exposes the
/// stable string identifier other tooling keys on,
/// [attributes](GraphError::attributes) the offending node/port/resource
/// names.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("graph does not declare any operation")]
    Empty,

    #[error("name \"{name}\" is already in use")]
    NameDuplicate { name: String },

    #[error("operation \"{operation}\" is not declared on this builder")]
    OperationNotDeclared { operation: String },

    #[error("port \"{port}\" is already connected")]
    PortAlreadyConnected { port: String },

    #[error("connecting \"{from}\" to \"{to}\" would create a cycle")]
    CyclicConnection { from: String, to: String },

    #[error("resource \"{resource}\" of kind {found} cannot pass port \"{port}\" which is constrained to {expected}")]
    TypeIncompatible {
        port: String,
        resource: String,
        expected: crate::ResourceKind,
        found: crate::ResourceKind,
    },

    #[error("resource \"{resource}\" is already assigned to port \"{assigned_to}\"")]
    ResourceAlreadyAssigned { resource: String, assigned_to: String },

    #[error("port \"{port}\" already has a resource assigned")]
    PortAlreadyAssigned { port: String },

    #[error("unconnected ports: {}", ports.join(", "))]
    PortsUnconnected { ports: Vec<String> },

    #[error("producer ports without an assigned resource: {}", ports.join(", "))]
    PortsUnassigned { ports: Vec<String> },

    #[error("invalid port \"{port}\": {reason}")]
    InvalidPort { port: String, reason: String },
}

impl GraphError {
    ///Stable string identifier of this failure class. Part of the public
    /// contract, tooling and logs match on these strings.
    pub fn code(&self) -> &'static str {
        match self {
            GraphError::Empty => "error-graph-empty",
            GraphError::NameDuplicate { .. } => "error-graph-name-duplicate",
            GraphError::OperationNotDeclared { .. } => "error-graph-operation-not-declared",
            GraphError::PortAlreadyConnected { .. } => "error-graph-port-already-connected",
            GraphError::CyclicConnection { .. } => "error-graph-port-cyclic-connection",
            GraphError::TypeIncompatible { .. } => "error-graph-port-type-incompatible",
            GraphError::ResourceAlreadyAssigned { .. } => "error-graph-resource-already-assigned",
            GraphError::PortAlreadyAssigned { .. } => "error-graph-port-already-assigned",
            GraphError::PortsUnconnected { .. } => "error-graph-ports-unconnected",
            GraphError::PortsUnassigned { .. } => "error-graph-port-unassigned-resource",
            GraphError::InvalidPort { .. } => "error-graph-invalid-port",
        }
    }

    ///Named diagnostic attributes of this failure (offending operation, port
    /// and resource names).
    pub fn attributes(&self) -> AHashMap<&'static str, String> {
        let mut attributes = AHashMap::default();
        match self {
            GraphError::Empty => {}
            GraphError::NameDuplicate { name } => {
                attributes.insert("name", name.clone());
            }
            GraphError::OperationNotDeclared { operation } => {
                attributes.insert("operation", operation.clone());
            }
            GraphError::PortAlreadyConnected { port } => {
                attributes.insert("port", port.clone());
            }
            GraphError::CyclicConnection { from, to } => {
                attributes.insert("from", from.clone());
                attributes.insert("to", to.clone());
            }
            GraphError::TypeIncompatible {
                port,
                resource,
                expected,
                found,
            } => {
                attributes.insert("port", port.clone());
                attributes.insert("resource", resource.clone());
                attributes.insert("expected", expected.to_string());
                attributes.insert("found", found.to_string());
            }
            GraphError::ResourceAlreadyAssigned {
                resource,
                assigned_to,
            } => {
                attributes.insert("resource", resource.clone());
                attributes.insert("port", assigned_to.clone());
            }
            GraphError::PortAlreadyAssigned { port } => {
                attributes.insert("port", port.clone());
            }
            GraphError::PortsUnconnected { ports } => {
                attributes.insert("ports", ports.join(", "));
            }
            GraphError::PortsUnassigned { ports } => {
                attributes.insert("ports", ports.join(", "));
            }
            GraphError::InvalidPort { port, reason } => {
                attributes.insert("port", port.clone());
                attributes.insert("reason", reason.clone());
            }
        }

        attributes
    }
}
