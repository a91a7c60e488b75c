use std::path::PathBuf;

use crate::constants::launcher::DATASET_TYPE;
use crate::resolve::ShardSources;
use crate::training::scale::ScaleConfig;
use crate::training::world::WorldInfo;

/// Run options that shape the trainer invocation.
#[derive(Clone, Debug, PartialEq)]
pub struct TrainOptions {
    /// Run name; checkpoints land under `<output_dir>/<exp_name>`.
    pub exp_name: String,
    /// Root directory for trainer logs and checkpoints.
    pub output_dir: PathBuf,
    /// Data loader workers per process.
    pub workers: usize,
    /// Trainer precision value, e.g. `amp_bf16`.
    pub precision: String,
    /// Number of checkpoints (and epochs) the sample budget is split into.
    pub num_checkpoints: u64,
    /// Random seed.
    pub seed: u64,
    /// Sample shards with replacement.
    pub dataset_resampled: bool,
    /// wandb project name, when reporting to wandb.
    pub wandb_project: Option<String>,
    /// Gradient accumulation steps per update.
    pub accum_freq: usize,
    /// Logging interval in steps.
    pub log_every_n_steps: u64,
    /// Checkpoint to resume from (`latest` by default).
    pub resume: String,
    /// ImageNet validation set for zero-shot evaluation.
    pub imagenet_val: Option<String>,
    /// Field holding bounding boxes to blur.
    pub blur_field: Option<String>,
    /// Gradient clipping norm.
    pub grad_clip_norm: Option<f64>,
    /// Epochs between extra checkpoints; `0` disables them.
    pub save_frequency: u64,
}

/// Argument vector for the external trainer.
///
/// Shard sources enter as `--train-data` and, when weighted, as
/// `--train-data-upsampling-factors`.
pub fn build_trainer_args(
    options: &TrainOptions,
    scale: &ScaleConfig,
    world: &WorldInfo,
    shards: &ShardSources,
) -> Vec<String> {
    let per_gpu_batch_size =
        scale.batch_size / (world.world_size.max(1) * options.accum_freq.max(1));
    let samples_per_epoch = scale.train_num_samples / options.num_checkpoints.max(1);

    let mut args: Vec<String> = Vec::new();
    let mut push = |flag: &str, value: Option<String>| {
        args.push(flag.to_string());
        if let Some(value) = value {
            args.push(value);
        }
    };
    push("--save-frequency", Some(options.save_frequency.to_string()));
    push("--ddp-static-graph", None);
    push("--local-loss", None);
    push("--gather-with-grad", None);
    push("--grad-checkpointing", None);
    push("--train-data", Some(shards.descriptor.clone()));
    push("--train-num-samples", Some(samples_per_epoch.to_string()));
    push("--warmup", Some(scale.warmup.to_string()));
    push("--dataset-type", Some(DATASET_TYPE.to_string()));
    push("--precision", Some(options.precision.clone()));
    push("--workers", Some(options.workers.to_string()));
    push("--model", Some(scale.model.clone()));
    push("--batch-size", Some(per_gpu_batch_size.to_string()));
    push("--epochs", Some(options.num_checkpoints.to_string()));
    push("--lr", Some(scale.learning_rate.to_string()));
    push("--logs", Some(options.output_dir.to_string_lossy().into_owned()));
    push("--name", Some(options.exp_name.clone()));
    push("--seed", Some(options.seed.to_string()));
    push("--accum-freq", Some(options.accum_freq.to_string()));
    push("--log-every-n-steps", Some(options.log_every_n_steps.to_string()));
    push("--save-most-recent", None);
    push("--resume", Some(options.resume.clone()));

    if options.dataset_resampled {
        push("--dataset-resampled", None);
    }
    if let Some(project) = &options.wandb_project {
        push("--report-to", Some("wandb".to_string()));
        push("--wandb-project-name", Some(project.clone()));
    }
    if let Some(imagenet_val) = &options.imagenet_val {
        push("--imagenet-val", Some(imagenet_val.clone()));
    }
    if let Some(blur_field) = &options.blur_field {
        push("--blur-field", Some(blur_field.clone()));
    }
    if let Some(beta2) = scale.beta2 {
        push("--beta2", Some(beta2.to_string()));
    }
    if let Some(weights) = &shards.weights {
        push("--train-data-upsampling-factors", Some(weights.clone()));
    }
    if let Some(norm) = options.grad_clip_norm {
        push("--grad-clip-norm", Some(norm.to_string()));
    }
    args
}
