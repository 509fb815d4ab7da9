use std::fmt::Display;

use slotmap::{SecondaryMap, SlotMap};

use crate::{
    dag::Dag,
    resources::{OperationKey, PortKey, ResourceKey},
    state::{ImageLayout, QueueClass, Stages},
};

slotmap::new_key_type! {
    ///Key referencing a node of the synchronization command graph.
    pub struct SyncKey;
}

///Low level synchronization event derived from the compiled operation graph.
///
/// The commands form a second dag whose edges point from a dependent command
/// to the command it depends on. An executing backend walks this graph to
/// place pipeline barriers and batch submissions, the compiler itself never
/// executes anything.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SyncCommand {
    ///Batch of operations executed together on one queue.
    Submission {
        queue_class: QueueClass,
        ordinal: usize,
    },
    ///Execution of one operation. Owns the operation's [Read](SyncCommand::Read)
    /// and [Write](SyncCommand::Write) children and is tagged with the
    /// submission it is batched into.
    Execute {
        operation: OperationKey,
        submission: SyncKey,
    },
    ///Read access of one port at one pipeline stage.
    Read {
        operation: OperationKey,
        port: PortKey,
        resource: ResourceKey,
        stage: Stages,
    },
    ///Write access of one port at one pipeline stage.
    Write {
        operation: OperationKey,
        port: PortKey,
        resource: ResourceKey,
        stage: Stages,
    },
    ///Makes a read visible after a prior write, without a layout change.
    MemoryReadBarrier {
        wait_stage: Stages,
        block_stages: Stages,
    },
    ///Orders a write after a prior write, without a layout change.
    MemoryWriteBarrier {
        wait_stage: Stages,
        block_stages: Stages,
    },
    ///Makes a read visible after a prior write, transitioning the image
    /// layout on the way.
    ImageReadBarrier {
        wait_stage: Stages,
        block_stages: Stages,
        from: ImageLayout,
        to: ImageLayout,
    },
    ///Orders a write after a prior write, transitioning the image layout on
    /// the way.
    ImageWriteBarrier {
        wait_stage: Stages,
        block_stages: Stages,
        from: ImageLayout,
        to: ImageLayout,
    },
}

impl SyncCommand {
    pub fn is_barrier(&self) -> bool {
        matches!(
            self,
            SyncCommand::MemoryReadBarrier { .. }
                | SyncCommand::MemoryWriteBarrier { .. }
                | SyncCommand::ImageReadBarrier { .. }
                | SyncCommand::ImageWriteBarrier { .. }
        )
    }

    ///Stage a downstream barrier has to wait on when it depends on this
    /// command as a write-like node.
    pub(crate) fn write_stage(&self) -> Option<Stages> {
        match self {
            SyncCommand::Write { stage, .. } => Some(*stage),
            SyncCommand::ImageWriteBarrier { wait_stage, .. }
            | SyncCommand::MemoryWriteBarrier { wait_stage, .. } => Some(*wait_stage),
            _ => None,
        }
    }
}

impl Display for SyncCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncCommand::Submission {
                queue_class,
                ordinal,
            } => write!(f, "Submission#{}[{}]", ordinal, queue_class),
            SyncCommand::Execute { operation, .. } => write!(f, "Execute({:?})", operation),
            SyncCommand::Read { stage, .. } => write!(f, "Read@{:?}", stage),
            SyncCommand::Write { stage, .. } => write!(f, "Write@{:?}", stage),
            SyncCommand::MemoryReadBarrier {
                wait_stage,
                block_stages,
            } => write!(f, "MemoryReadBarrier[{:?} -> {:?}]", wait_stage, block_stages),
            SyncCommand::MemoryWriteBarrier {
                wait_stage,
                block_stages,
            } => write!(
                f,
                "MemoryWriteBarrier[{:?} -> {:?}]",
                wait_stage, block_stages
            ),
            SyncCommand::ImageReadBarrier {
                wait_stage,
                block_stages,
                from,
                to,
            } => write!(
                f,
                "ImageReadBarrier[{:?} -> {:?}, {} -> {}]",
                wait_stage, block_stages, from, to
            ),
            SyncCommand::ImageWriteBarrier {
                wait_stage,
                block_stages,
                from,
                to,
            } => write!(
                f,
                "ImageWriteBarrier[{:?} -> {:?}, {} -> {}]",
                wait_stage, block_stages, from, to
            ),
        }
    }
}

///Arena of [SyncCommand]s plus their happens-before edges.
pub struct SyncGraph {
    nodes: SlotMap<SyncKey, SyncCommand>,
    dag: Dag<SyncKey>,
    ///Write-like node currently layered on top of a write, e.g. a
    /// post-layout barrier on top of the raw write. Drives
    /// [leaf_of](SyncGraph::leaf_of).
    topped_by: SecondaryMap<SyncKey, SyncKey>,
}

impl Default for SyncGraph {
    fn default() -> Self {
        SyncGraph {
            nodes: SlotMap::with_key(),
            dag: Dag::default(),
            topped_by: SecondaryMap::new(),
        }
    }
}

impl SyncGraph {
    pub(crate) fn add(&mut self, command: SyncCommand) -> SyncKey {
        let key = self.nodes.insert(command);
        self.dag.add_node(key);
        key
    }

    ///Declares that `dependent` must not run before `prerequisite` finished.
    pub(crate) fn add_dependency(&mut self, dependent: SyncKey, prerequisite: SyncKey) {
        //The synthesis only ever adds edges against topological order of the
        // operation graph, a cycle here is a compiler bug.
        self.dag
            .try_connect(dependent, prerequisite)
            .expect("sync command synthesis produced a cycle");
    }

    pub(crate) fn set_topped_by(&mut self, write: SyncKey, barrier: SyncKey) {
        self.topped_by.insert(write, barrier);
    }

    ///Resolves the authoritative write-state of `write`: follows whatever
    /// write-like node now sits on top of it (within the same execute) until
    /// no further layer exists. Downstream barriers depend on the result, so
    /// they observe the effect of layout transitions performed by the
    /// producer instead of the raw write.
    pub fn leaf_of(&self, write: SyncKey) -> SyncKey {
        let mut current = write;
        while let Some(top) = self.topped_by.get(current) {
            current = *top;
        }
        current
    }

    pub fn command(&self, key: SyncKey) -> &SyncCommand {
        &self.nodes[key]
    }

    ///Commands `key` depends on.
    pub fn dependencies(&self, key: SyncKey) -> &[SyncKey] {
        self.dag.outgoing(key)
    }

    ///Commands depending on `key`.
    pub fn dependents(&self, key: SyncKey) -> &[SyncKey] {
        self.dag.incoming(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (SyncKey, &SyncCommand)> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

///Batch of operations submitted together to one queue.
#[derive(Clone, Debug)]
pub struct Submission {
    queue_class: QueueClass,
    ordinal: usize,
    operations: Vec<OperationKey>,
}

impl Submission {
    pub(crate) fn new(queue_class: QueueClass, ordinal: usize) -> Self {
        Submission {
            queue_class,
            ordinal,
            operations: Vec::new(),
        }
    }

    pub(crate) fn push_operation(&mut self, operation: OperationKey) {
        self.operations.push(operation);
    }

    pub fn queue_class(&self) -> QueueClass {
        self.queue_class
    }

    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    ///Operations of this submission in execution order.
    pub fn operations(&self) -> &[OperationKey] {
        &self.operations
    }
}

impl Display for Submission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "|#{} {}: {} ops|",
            self.ordinal,
            self.queue_class,
            self.operations.len()
        )
    }
}

///Ordered sequence of [Submission]s derived from the compiled graph. A new
/// submission starts whenever the queue class changes between topologically
/// consecutive operations.
#[derive(Clone, Debug, Default)]
pub struct ExecutionPlan {
    submissions: Vec<Submission>,
}

impl ExecutionPlan {
    pub(crate) fn push(&mut self, submission: Submission) {
        self.submissions.push(submission);
    }

    pub(crate) fn last_mut(&mut self) -> &mut Submission {
        self.submissions.last_mut().expect("no open submission")
    }

    pub fn submissions(&self) -> &[Submission] {
        &self.submissions
    }
}

impl Display for ExecutionPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ExecutionPlan:")?;
        for submission in &self.submissions {
            write!(f, "----{}----", submission)?;
        }
        Ok(())
    }
}
