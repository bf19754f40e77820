//! The static tree of nodes, processes, processors, threads, queues,
//! streams, and counters (`spec.md` §3, §4.11).

use crate::entities::handle::{Handle, HandleId, HandleKind};
use crate::error::Result;
use crate::value_objects::property::Property;

/// Root of the topology tree; its children are [`Node`]s.
#[derive(Debug, Clone, Default)]
pub struct TopologyRoot {
    nodes: Vec<HandleId>,
}

impl TopologyRoot {
    #[must_use]
    pub fn new(nodes: Vec<HandleId>) -> Self {
        Self { nodes }
    }
}

impl Handle for TopologyRoot {
    fn kind(&self) -> HandleKind {
        HandleKind::TopologyNode
    }

    fn get_u64(&self, property: Property, _index: u64) -> Result<u64> {
        match property {
            Property::TopologyRootChildCount => Ok(self.nodes.len() as u64),
            _ => Err(self.reject(property)),
        }
    }

    fn get_object(&self, property: Property, index: u64) -> Result<Option<HandleId>> {
        match property {
            Property::TopologyRootChild => {
                Self::check_index(index, self.nodes.len() as u64)?;
                Ok(Some(self.nodes[index as usize]))
            }
            _ => Err(self.reject(property)),
        }
    }
}

/// A hardware/software node holding [`Process`] and [`Processor`] children.
#[derive(Debug, Clone)]
pub struct Node {
    id: HandleId,
    name: String,
    processes: Vec<HandleId>,
    processors: Vec<HandleId>,
}

impl Node {
    #[must_use]
    pub fn new(id: HandleId, name: String, processes: Vec<HandleId>, processors: Vec<HandleId>) -> Self {
        Self { id, name, processes, processors }
    }
}

impl Handle for Node {
    fn kind(&self) -> HandleKind {
        HandleKind::Node
    }

    fn get_u64(&self, property: Property, _index: u64) -> Result<u64> {
        match property {
            Property::NodeId => Ok(self.id.raw()),
            Property::NodeProcessCount => Ok(self.processes.len() as u64),
            Property::NodeProcessorCount => Ok(self.processors.len() as u64),
            _ => Err(self.reject(property)),
        }
    }

    fn get_string(&self, property: Property, _index: u64) -> Result<String> {
        match property {
            Property::NodeName => Ok(self.name.clone()),
            _ => Err(self.reject(property)),
        }
    }
}

/// An OS process, owning [`Thread`]s and [`Queue`]s and belonging to one [`Node`].
#[derive(Debug, Clone)]
pub struct Process {
    id: HandleId,
    name: String,
    parent_node: HandleId,
    threads: Vec<HandleId>,
    queues: Vec<HandleId>,
}

impl Process {
    #[must_use]
    pub fn new(id: HandleId, name: String, parent_node: HandleId, threads: Vec<HandleId>, queues: Vec<HandleId>) -> Self {
        Self { id, name, parent_node, threads, queues }
    }

    /// `GetParent(Node)` for this process (`spec.md` §4.11).
    #[must_use]
    pub fn parent_node(&self) -> HandleId {
        self.parent_node
    }
}

impl Handle for Process {
    fn kind(&self) -> HandleKind {
        HandleKind::Process
    }

    fn get_u64(&self, property: Property, _index: u64) -> Result<u64> {
        match property {
            Property::ProcessId => Ok(self.id.raw()),
            Property::ProcessThreadCount => Ok(self.threads.len() as u64),
            Property::ProcessQueueCount => Ok(self.queues.len() as u64),
            _ => Err(self.reject(property)),
        }
    }

    fn get_string(&self, property: Property, _index: u64) -> Result<String> {
        match property {
            Property::ProcessName => Ok(self.name.clone()),
            _ => Err(self.reject(property)),
        }
    }

    fn get_object(&self, property: Property, _index: u64) -> Result<Option<HandleId>> {
        match property {
            Property::ProcessParentNode => Ok(Some(self.parent_node)),
            _ => Err(self.reject(property)),
        }
    }
}

/// A compute processor (GPU/accelerator), owning [`Stream`]s and [`Counter`]s.
#[derive(Debug, Clone)]
pub struct Processor {
    id: HandleId,
    name: String,
    parent_node: HandleId,
    streams: Vec<HandleId>,
    counters: Vec<HandleId>,
}

impl Processor {
    #[must_use]
    pub fn new(id: HandleId, name: String, parent_node: HandleId, streams: Vec<HandleId>, counters: Vec<HandleId>) -> Self {
        Self { id, name, parent_node, streams, counters }
    }

    #[must_use]
    pub fn parent_node(&self) -> HandleId {
        self.parent_node
    }
}

impl Handle for Processor {
    fn kind(&self) -> HandleKind {
        HandleKind::Processor
    }

    fn get_u64(&self, property: Property, _index: u64) -> Result<u64> {
        match property {
            Property::ProcessorId => Ok(self.id.raw()),
            Property::ProcessorStreamCount => Ok(self.streams.len() as u64),
            Property::ProcessorCounterCount => Ok(self.counters.len() as u64),
            _ => Err(self.reject(property)),
        }
    }

    fn get_string(&self, property: Property, _index: u64) -> Result<String> {
        match property {
            Property::ProcessorName => Ok(self.name.clone()),
            _ => Err(self.reject(property)),
        }
    }

    fn get_object(&self, property: Property, _index: u64) -> Result<Option<HandleId>> {
        match property {
            Property::ProcessorParentNode => Ok(Some(self.parent_node)),
            _ => Err(self.reject(property)),
        }
    }
}

/// A thread within a [`Process`].
#[derive(Debug, Clone)]
pub struct Thread {
    id: HandleId,
    parent_process: HandleId,
}

impl Thread {
    #[must_use]
    pub fn new(id: HandleId, parent_process: HandleId) -> Self {
        Self { id, parent_process }
    }
}

impl Handle for Thread {
    fn kind(&self) -> HandleKind {
        HandleKind::Thread
    }

    fn get_u64(&self, property: Property, _index: u64) -> Result<u64> {
        match property {
            Property::ThreadId => Ok(self.id.raw()),
            _ => Err(self.reject(property)),
        }
    }

    fn get_object(&self, property: Property, _index: u64) -> Result<Option<HandleId>> {
        match property {
            Property::ThreadParentProcess => Ok(Some(self.parent_process)),
            _ => Err(self.reject(property)),
        }
    }
}

/// A dispatch queue within a [`Process`].
#[derive(Debug, Clone)]
pub struct Queue {
    id: HandleId,
    parent_process: HandleId,
}

impl Queue {
    #[must_use]
    pub fn new(id: HandleId, parent_process: HandleId) -> Self {
        Self { id, parent_process }
    }
}

impl Handle for Queue {
    fn kind(&self) -> HandleKind {
        HandleKind::Queue
    }

    fn get_u64(&self, property: Property, _index: u64) -> Result<u64> {
        match property {
            Property::QueueId => Ok(self.id.raw()),
            _ => Err(self.reject(property)),
        }
    }

    fn get_object(&self, property: Property, _index: u64) -> Result<Option<HandleId>> {
        match property {
            Property::QueueParentProcess => Ok(Some(self.parent_process)),
            _ => Err(self.reject(property)),
        }
    }
}

/// A compute stream within a [`Processor`].
#[derive(Debug, Clone)]
pub struct Stream {
    id: HandleId,
    parent_processor: HandleId,
}

impl Stream {
    #[must_use]
    pub fn new(id: HandleId, parent_processor: HandleId) -> Self {
        Self { id, parent_processor }
    }
}

impl Handle for Stream {
    fn kind(&self) -> HandleKind {
        HandleKind::Stream
    }

    fn get_u64(&self, property: Property, _index: u64) -> Result<u64> {
        match property {
            Property::StreamId => Ok(self.id.raw()),
            _ => Err(self.reject(property)),
        }
    }

    fn get_object(&self, property: Property, _index: u64) -> Result<Option<HandleId>> {
        match property {
            Property::StreamParentProcessor => Ok(Some(self.parent_processor)),
            _ => Err(self.reject(property)),
        }
    }
}

/// A performance counter within a [`Processor`].
#[derive(Debug, Clone)]
pub struct Counter {
    id: HandleId,
    name: String,
    parent_processor: HandleId,
}

impl Counter {
    #[must_use]
    pub fn new(id: HandleId, name: String, parent_processor: HandleId) -> Self {
        Self { id, name, parent_processor }
    }
}

impl Handle for Counter {
    fn kind(&self) -> HandleKind {
        HandleKind::Counter
    }

    fn get_u64(&self, property: Property, _index: u64) -> Result<u64> {
        match property {
            Property::CounterId => Ok(self.id.raw()),
            _ => Err(self.reject(property)),
        }
    }

    fn get_string(&self, property: Property, _index: u64) -> Result<String> {
        match property {
            Property::CounterName => Ok(self.name.clone()),
            _ => Err(self.reject(property)),
        }
    }

    fn get_object(&self, property: Property, _index: u64) -> Result<Option<HandleId>> {
        match property {
            Property::CounterParentProcessor => Ok(Some(self.parent_processor)),
            _ => Err(self.reject(property)),
        }
    }
}
