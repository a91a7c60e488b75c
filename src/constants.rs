/// Constants shared by descriptor rendering and multi-source splitting.
pub mod descriptor {
    /// Separator between sources, descriptor components, and weights.
    pub const SOURCE_SEPARATOR: &str = "::";
    /// Extension (without the dot) that marks a file as a shard archive.
    pub const DEFAULT_SHARD_EXTENSION: &str = "tar";
    /// Prefix of streaming-pipe descriptors understood by the data loader.
    pub const PIPE_PREFIX: &str = "pipe:";
    /// Trailing argument telling the copy tool to stream to stdout.
    pub const PIPE_STDOUT_TARGET: &str = "-";
}

/// Constants used by the resharder sidecar shortcut.
pub mod shortcut {
    /// Sidecar file written by the resharder next to its output shards.
    pub const DEFAULT_METADATA_FILE: &str = "meta.json";
    /// JSON key holding the number of output shards.
    pub const SHARD_COUNT_KEY: &str = "output_shard_count";
    /// JSON key holding the shard file name template.
    pub const SHARD_FORMAT_KEY: &str = "output_shard_format";
}

/// Constants used by cloud locations and their object store clients.
pub mod cloud {
    /// Scheme handled by the default object store client.
    pub const S3_SCHEME: &str = "s3";
    /// Scheme for Google Cloud Storage URIs.
    pub const GS_SCHEME: &str = "gs";
    /// Copy command used to stream `s3://` objects.
    pub const S3_COPY_COMMAND: &str = "aws s3 cp";
    /// Copy command used to stream `gs://` objects.
    pub const GS_COPY_COMMAND: &str = "gsutil cp";
    /// Program invoked by the AWS CLI client.
    pub const AWS_CLI_PROGRAM: &str = "aws";
    /// Environment variable selecting the AWS CLI client and its program path.
    pub const AWS_CLI_PROGRAM_ENV: &str = "SHARDSOURCE_AWS_CLI";
}

/// Constants used by the training launcher glue.
pub mod launcher {
    /// Directory under the experiment folder that holds checkpoints.
    pub const CHECKPOINTS_DIR: &str = "checkpoints";
    /// Name of the checkpoint the trainer keeps updated with the latest epoch.
    pub const LATEST_CHECKPOINT: &str = "epoch_latest.pt";
    /// Artifact record written two levels above the final checkpoint.
    pub const ARTIFACTS_FILE: &str = "info.json";
    /// Dataset type flag value passed to the trainer.
    pub const DATASET_TYPE: &str = "webdataset";
    /// Default wandb project name.
    pub const DEFAULT_WANDB_PROJECT: &str = "datanet";
    /// Trainer exit code reported as a failed run.
    pub const TRAINER_FAILURE_CODE: i32 = -1;
}
