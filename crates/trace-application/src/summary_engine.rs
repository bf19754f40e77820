//! Hierarchical summary aggregation: trace → node → process → processor
//! (`spec.md` §4.10).

use std::collections::HashMap;

use trace_domain::entities::summary::{SummaryMetrics, TopKernel};

/// How many top kernels survive into a merged node's metrics before the
/// residual is folded into a synthetic `"Others"` row.
pub const TOP_K: usize = 10;

/// Recursively merge `children` into one node's metrics (`spec.md` §4.10):
/// utilization averaged across non-null children, exec time summed,
/// per-name top-kernel tables merged by name (sum invocations, sum
/// exec-time, min over mins, max over maxes — the source keeps only the
/// sum since min/max per kernel are not modeled upstream, see
/// `DESIGN.md`), followed by top-K selection with a synthetic `"Others"` row.
#[must_use]
pub fn aggregate_sub_metrics(children: &[SummaryMetrics]) -> SummaryMetrics {
    let gfx_samples: Vec<f64> = children.iter().filter_map(|c| c.gfx_util).collect();
    let mem_samples: Vec<f64> = children.iter().filter_map(|c| c.mem_util).collect();

    let gfx_util = average(&gfx_samples);
    let mem_util = average(&mem_samples);
    let kernel_exec_time_total: f64 = children.iter().map(|c| c.kernel_exec_time_total).sum();

    let mut merged: HashMap<String, TopKernel> = HashMap::new();
    for child in children {
        for kernel in &child.top_kernels {
            merged
                .entry(kernel.name.clone())
                .and_modify(|existing| {
                    existing.exec_time_sum += kernel.exec_time_sum;
                    existing.invocations += kernel.invocations;
                })
                .or_insert_with(|| TopKernel {
                    name: kernel.name.clone(),
                    exec_time_sum: kernel.exec_time_sum,
                    exec_time_pct: 0.0,
                    invocations: kernel.invocations,
                });
        }
    }

    let top_kernels = select_top_k_with_others(merged.into_values().collect(), TOP_K);

    SummaryMetrics {
        gfx_util,
        mem_util,
        kernel_exec_time_total,
        top_kernels,
    }
}

fn average(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Select the top `k` kernels by `exec_time_sum`, recompute each
/// `exec_time_pct` against the merged total, and append a synthetic
/// `"Others"` row for the residual when more than `k` kernels exist
/// (`spec.md` §4.10).
fn select_top_k_with_others(mut kernels: Vec<TopKernel>, k: usize) -> Vec<TopKernel> {
    kernels.sort_by(|a, b| b.exec_time_sum.total_cmp(&a.exec_time_sum));

    let total: f64 = kernels.iter().map(|k| k.exec_time_sum).sum();

    if kernels.len() <= k {
        return finalize_percentages(kernels, total);
    }

    let (top, rest) = kernels.split_at(k);
    let mut result: Vec<TopKernel> = top.to_vec();
    let others_sum: f64 = rest.iter().map(|k| k.exec_time_sum).sum();
    let others_invocations: u64 = rest.iter().map(|k| k.invocations).sum();
    if others_sum > 0.0 || others_invocations > 0 {
        result.push(TopKernel {
            name: "Others".to_string(),
            exec_time_sum: others_sum,
            exec_time_pct: 0.0,
            invocations: others_invocations,
        });
    }
    finalize_percentages(result, total)
}

fn finalize_percentages(mut kernels: Vec<TopKernel>, total: f64) -> Vec<TopKernel> {
    for kernel in &mut kernels {
        kernel.exec_time_pct = if total > 0.0 { kernel.exec_time_sum / total } else { 0.0 };
    }
    kernels
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kernel(name: &str, sum: f64) -> TopKernel {
        TopKernel { name: name.to_string(), exec_time_sum: sum, exec_time_pct: 0.0, invocations: 1 }
    }

    #[test]
    fn scenario_5_summary_aggregation() {
        let node_a = SummaryMetrics {
            gfx_util: Some(0.8),
            mem_util: None,
            kernel_exec_time_total: 100.0,
            top_kernels: vec![kernel("K1", 70.0), kernel("K2", 30.0)],
        };
        let node_b = SummaryMetrics {
            gfx_util: Some(0.4),
            mem_util: None,
            kernel_exec_time_total: 50.0,
            top_kernels: vec![kernel("K1", 50.0)],
        };

        let root = aggregate_sub_metrics(&[node_a, node_b]);

        assert!((root.gfx_util.unwrap() - 0.6).abs() < 1e-9);
        assert!((root.kernel_exec_time_total - 150.0).abs() < 1e-9);
        assert!(!root.top_kernels.iter().any(|k| k.name == "Others"));

        let k1 = root.top_kernels.iter().find(|k| k.name == "K1").unwrap();
        assert!((k1.exec_time_sum - 120.0).abs() < 1e-9);
        assert!((k1.exec_time_pct - 0.8).abs() < 1e-9);

        let k2 = root.top_kernels.iter().find(|k| k.name == "K2").unwrap();
        assert!((k2.exec_time_sum - 30.0).abs() < 1e-9);
        assert!((k2.exec_time_pct - 0.2).abs() < 1e-9);
    }

    #[test]
    fn invariant_7_root_exec_time_equals_sum_of_leaves() {
        let leaves = vec![
            SummaryMetrics { gfx_util: None, mem_util: None, kernel_exec_time_total: 10.0, top_kernels: vec![] },
            SummaryMetrics { gfx_util: None, mem_util: None, kernel_exec_time_total: 20.0, top_kernels: vec![] },
            SummaryMetrics { gfx_util: None, mem_util: None, kernel_exec_time_total: 5.0, top_kernels: vec![] },
        ];
        let root = aggregate_sub_metrics(&leaves);
        let expected: f64 = leaves.iter().map(|l| l.kernel_exec_time_total).sum();
        assert!((root.kernel_exec_time_total - expected).abs() < 1e-9);
    }

    #[test]
    fn more_than_top_k_kernels_synthesizes_others() {
        let kernels: Vec<TopKernel> = (0..15).map(|i| kernel(&format!("K{i}"), (15 - i) as f64)).collect();
        let node = SummaryMetrics { gfx_util: None, mem_util: None, kernel_exec_time_total: 0.0, top_kernels: kernels };
        let root = aggregate_sub_metrics(&[node]);
        assert_eq!(root.top_kernels.len(), TOP_K + 1);
        assert_eq!(root.top_kernels.last().unwrap().name, "Others");
    }
}
