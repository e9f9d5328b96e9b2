//! Wire messages for the parallel worker pool (§5 "optional parallel
//! mode"). A dispatched Subproblem carries enough of its local state for a
//! worker to reconstruct and activate it without consulting the
//! coordinator's pools directly; a result carries back only what the
//! coordinator needs to update its own bookkeeping.

use bc_model::FsVarStat;
use serde::{Deserialize, Serialize};

/// One Subproblem, flattened for the wire. `con_indices`/`var_indices`
/// index into pool snapshots the worker already holds (§5: workers mirror
/// the coordinator's initial pools, only dynamically generated rows/columns
/// travel inline).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubProblemPayload {
    pub sub_id: u64,
    pub father_id: Option<u64>,
    pub level: u32,
    pub con_indices: Vec<usize>,
    pub var_indices: Vec<usize>,
    pub local_status: Vec<FsVarStat>,
    pub local_lb: Vec<f64>,
    pub local_ub: Vec<f64>,
}

/// A worker's report after running a Subproblem to a branch/fathom
/// decision (§5). `new_dual_bound` always reflects the node's own bound
/// whether or not it fathomed; `feasible_value` is set only when the node's
/// LP optimum tested feasible for the original problem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubProblemResult {
    pub sub_id: u64,
    pub new_dual_bound: f64,
    pub feasible_value: Option<f64>,
    pub fathomed: bool,
    pub children: Vec<SubProblemPayload>,
}

/// A coordinator's broadcast to every worker when the incumbent improves,
/// so idle workers can prune without waiting for their next dispatch (§5
/// "notification bus").
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PrimalBoundUpdate {
    pub value: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_round_trips_through_json() {
        let payload = SubProblemPayload {
            sub_id: 7,
            father_id: Some(3),
            level: 2,
            con_indices: vec![0, 1, 2],
            var_indices: vec![0, 1],
            local_status: vec![FsVarStat::Free, FsVarStat::FixedToUpper],
            local_lb: vec![0.0, 0.0],
            local_ub: vec![1.0, 1.0],
        };
        let json = serde_json::to_string(&payload).unwrap();
        let back: SubProblemPayload = serde_json::from_str(&json).unwrap();
        assert_eq!(back.sub_id, 7);
        assert_eq!(back.father_id, Some(3));
        assert_eq!(back.local_status.len(), 2);
    }
}
