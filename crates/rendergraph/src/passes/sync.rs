use ahash::AHashMap;
use slotmap::SecondaryMap;
use smallvec::SmallVec;

use super::Pass;
use crate::{
    builder::GraphBuilder,
    resources::{OperationKey, PortKey, ResourceKey},
    state::{QueueClass, Stages},
    sync::{Submission, SyncCommand, SyncKey},
    GraphError,
};

///Synthesizes the synchronization command graph and the execution plan.
///
/// Three stages over the operations in topological order:
///
/// 1. batch operations into submissions, one per contiguous run of
///    operations sharing a queue class,
/// 2. emit the `Execute`/`Read`/`Write` skeleton per operation,
/// 3. bridge every port connection with barriers: read barriers make prior
///    writes visible to this operation's reads, write barriers order
///    write-after-write, image variants additionally perform the pre layout
///    transition. Post transitions are layered on top of the producing
///    writes so downstream dependencies resolve onto them (`leaf_of`).
pub(super) struct SyncSynthesisPass;

impl Pass for SyncSynthesisPass {
    fn name(&self) -> &'static str {
        "sync-synthesis"
    }

    fn depends_on(&self) -> &'static [&'static str] {
        &["type-check", "layout-inference"]
    }

    fn run(&self, builder: &mut GraphBuilder) -> Result<(), GraphError> {
        let GraphBuilder {
            operations,
            ports,
            port_graph,
            operation_order,
            tracked,
            transitions,
            sync,
            plan,
            ..
        } = builder;

        //Submissions: split whenever the queue class changes between
        // consecutive operations.
        let mut submission_of: SecondaryMap<OperationKey, SyncKey> = SecondaryMap::new();
        let mut current: Option<(QueueClass, SyncKey)> = None;
        for op in operation_order.iter() {
            let class = operations[*op].queue_class();
            let open = match current {
                Some((open_class, node)) if open_class == class => node,
                _ => {
                    let ordinal = plan.submissions().len();
                    let node = sync.add(SyncCommand::Submission {
                        queue_class: class,
                        ordinal,
                    });
                    plan.push(Submission::new(class, ordinal));

                    #[cfg(feature = "log_reasoning")]
                    log::trace!(
                        "submission #{} on {} starts at \"{}\"",
                        ordinal,
                        class,
                        operations[*op].name()
                    );

                    current = Some((class, node));
                    node
                }
            };
            plan.last_mut().push_operation(*op);
            submission_of.insert(*op, open);
        }

        //Execute/Read/Write skeleton. The execute depends on its own reads,
        // its writes depend on the execute.
        let mut reads_of: SecondaryMap<PortKey, SmallVec<[SyncKey; 4]>> = SecondaryMap::new();
        let mut writes_of: SecondaryMap<PortKey, SmallVec<[SyncKey; 4]>> = SecondaryMap::new();
        //All write leaves an operation produced for one tracked resource.
        let mut resource_writes: AHashMap<(OperationKey, ResourceKey), SmallVec<[SyncKey; 2]>> =
            AHashMap::default();

        for op in operation_order.iter() {
            let exec = sync.add(SyncCommand::Execute {
                operation: *op,
                submission: submission_of[*op],
            });

            for port in operations[*op].ports().to_vec() {
                let Some(&resource) = tracked.get(port) else {
                    continue;
                };
                let (port_reads, port_writes) = {
                    let p = &ports[port];
                    (p.reads(), p.writes())
                };

                let mut reads = SmallVec::new();
                for stage in port_reads.iter() {
                    let read = sync.add(SyncCommand::Read {
                        operation: *op,
                        port,
                        resource,
                        stage,
                    });
                    sync.add_dependency(exec, read);
                    reads.push(read);
                }
                reads_of.insert(port, reads);

                let mut writes = SmallVec::new();
                for stage in port_writes.iter() {
                    let write = sync.add(SyncCommand::Write {
                        operation: *op,
                        port,
                        resource,
                        stage,
                    });
                    sync.add_dependency(write, exec);
                    writes.push(write);
                }
                resource_writes
                    .entry((*op, resource))
                    .or_default()
                    .extend(writes.iter().copied());
                writes_of.insert(port, writes);
            }
        }

        //Barrier insertion per port with an incoming connection.
        for op in operation_order.iter() {
            for port in operations[*op].ports().to_vec() {
                let Some(&src_port) = port_graph.incoming(port).first() else {
                    continue;
                };
                let Some(&resource) = tracked.get(port) else {
                    continue;
                };
                let src_op = ports[src_port].operation();
                let transition = transitions[port];
                let pre = transition.pre();

                //Authoritative write-state of the source operation for this
                // resource: each raw write resolved through whatever layout
                // barrier was layered on top of it.
                let their_leaves: SmallVec<[SyncKey; 2]> = resource_writes
                    .get(&(src_op, resource))
                    .map(|writes| writes.iter().map(|write| sync.leaf_of(*write)).collect())
                    .unwrap_or_default();

                //Read side: one barrier per source leaf write, waited on by
                // all reads of this port.
                let block_stages = ports[port].reads();
                if !block_stages.is_empty() {
                    for leaf in their_leaves.iter() {
                        let wait_stage = sync
                            .command(*leaf)
                            .write_stage()
                            .expect("source leaf is not write-like");

                        let barrier = if let Some((from, to)) = pre {
                            sync.add(SyncCommand::ImageReadBarrier {
                                wait_stage,
                                block_stages,
                                from,
                                to,
                            })
                        } else {
                            sync.add(SyncCommand::MemoryReadBarrier {
                                wait_stage,
                                block_stages,
                            })
                        };

                        #[cfg(feature = "log_reasoning")]
                        log::trace!(
                            "read barrier into \"{}\".{}: waits {:?}, blocks {:?}, layout: {}",
                            operations[*op].name(),
                            ports[port].name(),
                            wait_stage,
                            block_stages,
                            transition
                        );

                        sync.add_dependency(barrier, *leaf);
                        for read in reads_of[port].iter() {
                            sync.add_dependency(*read, barrier);
                        }
                    }
                }

                //Write side: order this port's writes against the source
                // leaves, as image barriers if a pre transition applies.
                let my_writes = writes_of.get(port).cloned().unwrap_or_default();
                if !my_writes.is_empty() {
                    for my_write in my_writes.iter() {
                        let block_stages = sync
                            .command(*my_write)
                            .write_stage()
                            .expect("own write is not write-like");

                        for leaf in their_leaves.iter() {
                            let wait_stage = sync
                                .command(*leaf)
                                .write_stage()
                                .expect("source leaf is not write-like");

                            let barrier = if let Some((from, to)) = pre {
                                sync.add(SyncCommand::ImageWriteBarrier {
                                    wait_stage,
                                    block_stages,
                                    from,
                                    to,
                                })
                            } else {
                                sync.add(SyncCommand::MemoryWriteBarrier {
                                    wait_stage,
                                    block_stages,
                                })
                            };

                            #[cfg(feature = "log_reasoning")]
                            log::trace!(
                                "write barrier into \"{}\".{}: waits {:?}, blocks {:?}",
                                operations[*op].name(),
                                ports[port].name(),
                                wait_stage,
                                block_stages,
                            );

                            sync.add_dependency(barrier, *leaf);
                            sync.add_dependency(*my_write, barrier);
                        }
                    }

                    //Post transition: one barrier layered on each own write.
                    // It has no dependent yet, downstream consumers pick it
                    // up through leaf resolution.
                    if let Some((from, to)) = transition.post() {
                        for my_write in my_writes.iter() {
                            let wait_stage = sync
                                .command(*my_write)
                                .write_stage()
                                .expect("own write is not write-like");

                            let barrier = sync.add(SyncCommand::ImageWriteBarrier {
                                wait_stage,
                                //no known successor at synthesis time
                                block_stages: Stages::empty(),
                                from,
                                to,
                            });
                            sync.add_dependency(barrier, *my_write);
                            sync.set_topped_by(*my_write, barrier);

                            #[cfg(feature = "log_reasoning")]
                            log::trace!(
                                "post layout barrier on \"{}\".{}: {} -> {}",
                                operations[*op].name(),
                                ports[port].name(),
                                from,
                                to
                            );
                        }
                    }
                }
            }
        }

        Ok(())
    }
}
