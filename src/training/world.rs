use std::env;

/// Process placement reported by the launcher environment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorldInfo {
    /// Rank within the node.
    pub local_rank: usize,
    /// Global rank.
    pub rank: usize,
    /// Number of processes across all nodes.
    pub world_size: usize,
}

impl Default for WorldInfo {
    fn default() -> Self {
        Self {
            local_rank: 0,
            rank: 0,
            world_size: 1,
        }
    }
}

impl WorldInfo {
    /// Read torchrun/SLURM/MPI variables, defaulting to a single process.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as `from_env`, reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let first = |keys: &[&str]| {
            keys.iter()
                .find_map(|key| lookup(key).and_then(|value| value.trim().parse::<usize>().ok()))
        };
        let defaults = Self::default();
        Self {
            local_rank: first(&["LOCAL_RANK", "MPI_LOCALRANKID", "SLURM_LOCALID", "OMPI_COMM_WORLD_LOCAL_RANK"])
                .unwrap_or(defaults.local_rank),
            rank: first(&["RANK", "PMI_RANK", "SLURM_PROCID", "OMPI_COMM_WORLD_RANK"])
                .unwrap_or(defaults.rank),
            world_size: first(&["WORLD_SIZE", "PMI_SIZE", "SLURM_NTASKS", "OMPI_COMM_WORLD_SIZE"])
                .filter(|size| *size > 0)
                .unwrap_or(defaults.world_size),
        }
    }

    /// Whether this process verifies and records the run.
    pub fn is_primary(&self) -> bool {
        self.rank == 0
    }
}
