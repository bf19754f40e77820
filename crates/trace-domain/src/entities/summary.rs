//! The summary aggregation tree: per-node metrics merged up to a root
//! (`spec.md` §3, §4.10).

use crate::entities::handle::{Handle, HandleId, HandleKind};
use crate::error::Result;
use crate::value_objects::property::Property;

/// A single named kernel's exec-time contribution within a node's top-K
/// table, pre- or post-merge.
#[derive(Debug, Clone, PartialEq)]
pub struct TopKernel {
    pub name: String,
    pub exec_time_sum: f64,
    pub exec_time_pct: f64,
    pub invocations: u64,
}

/// One node's metrics in the trace→node→process→processor hierarchy
/// (`spec.md` §4.10). `gfx_util`/`mem_util` are `None` for CPU-only nodes.
#[derive(Debug, Clone, Default)]
pub struct SummaryMetrics {
    pub gfx_util: Option<f64>,
    pub mem_util: Option<f64>,
    pub kernel_exec_time_total: f64,
    pub top_kernels: Vec<TopKernel>,
}

impl Handle for SummaryMetrics {
    fn kind(&self) -> HandleKind {
        HandleKind::SummaryMetrics
    }

    fn get_f64(&self, property: Property, _index: u64) -> Result<f64> {
        match property {
            Property::SummaryMetricsGfxUtil => self.gfx_util.ok_or_else(|| self.reject(property)),
            Property::SummaryMetricsMemUtil => self.mem_util.ok_or_else(|| self.reject(property)),
            Property::SummaryMetricsKernelExecTimeTotal => Ok(self.kernel_exec_time_total),
            Property::SummaryMetricsTopKernelExecTimeSum => {
                self.top_kernels.first().map(|k| k.exec_time_sum).ok_or_else(|| self.reject(property))
            }
            Property::SummaryMetricsTopKernelExecTimePct => {
                self.top_kernels.first().map(|k| k.exec_time_pct).ok_or_else(|| self.reject(property))
            }
            _ => Err(self.reject(property)),
        }
    }

    fn get_u64(&self, property: Property, index: u64) -> Result<u64> {
        match property {
            Property::SummaryMetricsTopKernelCount => Ok(self.top_kernels.len() as u64),
            Property::SummaryMetricsTopKernelInvocations => {
                Self::check_index(index, self.top_kernels.len() as u64)?;
                Ok(self.top_kernels[index as usize].invocations)
            }
            _ => Err(self.reject(property)),
        }
    }

    fn get_string(&self, property: Property, index: u64) -> Result<String> {
        match property {
            Property::SummaryMetricsTopKernelName => {
                Self::check_index(index, self.top_kernels.len() as u64)?;
                Ok(self.top_kernels[index as usize].name.clone())
            }
            _ => Err(self.reject(property)),
        }
    }
}

/// A node in the summary tree: a root plus recursively merged children
/// (`spec.md` §4.10).
#[derive(Debug, Clone)]
pub struct Summary {
    id: HandleId,
    metrics: SummaryMetrics,
    children: Vec<HandleId>,
}

impl Summary {
    #[must_use]
    pub fn new(id: HandleId, metrics: SummaryMetrics, children: Vec<HandleId>) -> Self {
        Self { id, metrics, children }
    }

    #[must_use]
    pub fn metrics(&self) -> &SummaryMetrics {
        &self.metrics
    }

    #[must_use]
    pub fn children(&self) -> &[HandleId] {
        &self.children
    }
}

impl Handle for Summary {
    fn kind(&self) -> HandleKind {
        HandleKind::Summary
    }

    fn get_u64(&self, property: Property, _index: u64) -> Result<u64> {
        match property {
            Property::SummaryChildCount => Ok(self.children.len() as u64),
            _ => Err(self.reject(property)),
        }
    }

    fn get_object(&self, property: Property, index: u64) -> Result<Option<HandleId>> {
        match property {
            Property::SummaryRoot => Ok(Some(self.id)),
            Property::SummaryChild => {
                Self::check_index(index, self.children.len() as u64)?;
                Ok(Some(self.children[index as usize]))
            }
            _ => Err(self.reject(property)),
        }
    }
}
