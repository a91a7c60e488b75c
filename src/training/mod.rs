//! Orchestration glue between shard resolution and an external trainer.
//!
//! The launcher resolves the data location, assembles the trainer argument
//! vector, runs the trainer, and on the primary rank verifies the final
//! checkpoint and records the run.

use chrono::Utc;
use tracing::{error, info};

use crate::constants::launcher::TRAINER_FAILURE_CODE;
use crate::errors::TrainError;
use crate::resolve::{ShardResolver, ShardSources};

/// Run record persistence and checkpoint checks.
pub mod artifacts;
/// Trainer argument assembly.
pub mod plan;
/// Competition scale presets.
pub mod scale;
/// External trainer invocation.
pub mod trainer;
/// Rank and world size discovery.
pub mod world;

pub use artifacts::{TrainingArtifacts, ensure_checkpoint_exists, final_checkpoint_path};
pub use plan::{TrainOptions, build_trainer_args};
pub use scale::{ScaleConfig, ScaleRegistry};
pub use trainer::{CommandTrainer, Trainer};
pub use world::WorldInfo;

/// Everything needed to launch one training run.
#[derive(Clone, Debug)]
pub struct TrainingRequest {
    /// Scale preset name.
    pub scale: String,
    /// Data location, `::`-separated for multiple sources.
    pub data_dir: String,
    /// `::`-separated weights, one per source.
    pub data_weights: Option<String>,
    /// Trainer invocation options.
    pub options: TrainOptions,
}

/// Outcome of a launch.
#[derive(Clone, Debug)]
pub struct TrainingOutcome {
    /// Resolved descriptor and weights.
    pub shards: ShardSources,
    /// Arguments passed to the trainer.
    pub trainer_args: Vec<String>,
    /// Trainer status code; `None` for dry runs.
    pub status: Option<i32>,
    /// Artifact record written by the primary rank.
    pub artifacts: Option<TrainingArtifacts>,
}

/// Resolves shards and drives a `Trainer`.
pub struct TrainingLauncher<'a> {
    resolver: &'a ShardResolver,
    scales: &'a ScaleRegistry,
    world: WorldInfo,
}

impl<'a> TrainingLauncher<'a> {
    /// Launcher for the process placed at `world`.
    pub fn new(resolver: &'a ShardResolver, scales: &'a ScaleRegistry, world: WorldInfo) -> Self {
        Self {
            resolver,
            scales,
            world,
        }
    }

    /// Resolve shards and build the trainer arguments without running anything.
    pub fn plan(&self, request: &TrainingRequest) -> Result<TrainingOutcome, TrainError> {
        let scale = self.scales.get(&request.scale)?;
        if self.world.is_primary() {
            info!(scale = %request.scale, world_size = self.world.world_size, "preparing training run");
        }
        let shards = self
            .resolver
            .resolve(&request.data_dir, request.data_weights.as_deref())?;
        let trainer_args = build_trainer_args(&request.options, scale, &self.world, &shards);
        Ok(TrainingOutcome {
            shards,
            trainer_args,
            status: None,
            artifacts: None,
        })
    }

    /// Plan, run `trainer`, then verify and record the run on the primary rank.
    pub fn launch(
        &self,
        request: &TrainingRequest,
        trainer: &dyn Trainer,
    ) -> Result<TrainingOutcome, TrainError> {
        let mut outcome = self.plan(request)?;
        let status = trainer.run(&outcome.trainer_args)?;
        outcome.status = Some(status);
        if !self.world.is_primary() {
            return Ok(outcome);
        }
        if status == TRAINER_FAILURE_CODE {
            error!(status, "error running training");
        }
        let checkpoint =
            final_checkpoint_path(&request.options.output_dir, &request.options.exp_name);
        ensure_checkpoint_exists(&checkpoint)?;
        let artifacts = TrainingArtifacts {
            scale: request.scale.clone(),
            checkpoint,
            scale_config: self.scales.get(&request.scale)?.clone(),
            data_dir: request.data_dir.clone(),
            created_at: Utc::now(),
        };
        artifacts.persist()?;
        info!("done training");
        outcome.artifacts = Some(artifacts);
        Ok(outcome)
    }
}
