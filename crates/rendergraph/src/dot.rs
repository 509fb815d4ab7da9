//! Graphviz export of the synchronization command graph, behind the `dot`
//! feature. Purely informational, the engine never looks at this.

use std::fmt::Write;

use ahash::AHashMap;

use crate::{graph::Graph, sync::SyncCommand};

impl Graph {
    ///Renders the synchronization dag in graphviz dot syntax. Every command
    /// becomes a labeled node, every happens-before edge an arrow from the
    /// dependent command to its prerequisite.
    pub fn to_dot(&self) -> String {
        let sync = self.sync_graph();

        let mut ids: AHashMap<_, usize> = AHashMap::default();
        for (index, (key, _)) in sync.iter().enumerate() {
            ids.insert(key, index);
        }

        let mut dot = String::new();
        writeln!(dot, "digraph sync {{").unwrap();
        writeln!(dot, "    rankdir=BT;").unwrap();

        for (key, command) in sync.iter() {
            let label = match command {
                SyncCommand::Execute { operation, .. } => {
                    format!("Execute({})", self.operation(*operation).name())
                }
                SyncCommand::Read { port, stage, .. } => {
                    format!("Read {} @{:?}", self.port_display_name(*port), stage)
                }
                SyncCommand::Write { port, stage, .. } => {
                    format!("Write {} @{:?}", self.port_display_name(*port), stage)
                }
                other => other.to_string(),
            };
            let shape = if command.is_barrier() { "box" } else { "ellipse" };
            writeln!(
                dot,
                "    n{} [label=\"{}\", shape={}];",
                ids[&key],
                label.replace('"', "'"),
                shape
            )
            .unwrap();
        }

        for (key, _) in sync.iter() {
            for prerequisite in sync.dependencies(key) {
                writeln!(dot, "    n{} -> n{};", ids[&key], ids[prerequisite]).unwrap();
            }
        }

        writeln!(dot, "}}").unwrap();
        dot
    }
}
