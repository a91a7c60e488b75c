use std::borrow::Cow;
use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, ValueEnum, error::ErrorKind};
use tracing_subscriber::EnvFilter;

use crate::config::{ResolverConfig, parse_copy_command};
use crate::constants::launcher::DEFAULT_WANDB_PROJECT;
use crate::resolve::{ShardResolver, ShardSources};
use crate::training::{
    CommandTrainer, ScaleRegistry, TrainOptions, TrainingLauncher, TrainingRequest, WorldInfo,
};
use crate::types::SchemeName;

#[derive(Debug, Clone, Copy, ValueEnum)]
#[value(rename_all = "snake_case")]
enum PrecisionArg {
    Amp,
    AmpBf16,
    AmpBfloat16,
    Bf16,
    Fp16,
    Fp32,
}

impl PrecisionArg {
    fn as_trainer_value(self) -> &'static str {
        match self {
            PrecisionArg::Amp => "amp",
            PrecisionArg::AmpBf16 => "amp_bf16",
            PrecisionArg::AmpBfloat16 => "amp_bfloat16",
            PrecisionArg::Bf16 => "bf16",
            PrecisionArg::Fp16 => "fp16",
            PrecisionArg::Fp32 => "fp32",
        }
    }
}

#[derive(Debug, Clone, clap::Args)]
struct ResolverArgs {
    #[arg(
        long = "shard-extension",
        value_name = "EXT",
        default_value = "tar",
        help = "Extension identifying shard archives"
    )]
    shard_extension: String,
    #[arg(
        long = "metadata-file",
        value_name = "NAME",
        default_value = "meta.json",
        help = "Resharder sidecar checked in each subdirectory"
    )]
    metadata_file: String,
    #[arg(
        long = "copy-command",
        value_name = "SCHEME=COMMAND",
        value_parser = parse_copy_command,
        help = "Streaming copy command for a cloud scheme, repeat as needed"
    )]
    copy_commands: Vec<(SchemeName, String)>,
    #[arg(
        long = "log-level",
        default_value = "warn",
        help = "Log level used when RUST_LOG is unset"
    )]
    log_level: String,
}

impl ResolverArgs {
    fn resolver_config(&self) -> ResolverConfig {
        let mut config = ResolverConfig::default()
            .with_shard_extension(self.shard_extension.clone())
            .with_metadata_file(self.metadata_file.clone());
        for (scheme, command) in &self.copy_commands {
            config = config.with_copy_command(scheme.clone(), command.clone());
        }
        config
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "resolve_shards",
    disable_help_subcommand = true,
    about = "Resolve shard directories into a data loader descriptor",
    long_about = "Walk one or more local or cloud directories of shard archives and print a compact brace-range descriptor plus aligned sampling weights.",
    after_help = "Multiple sources are separated by '::', e.g. /data/a::s3://bucket/b. Weights use the same separator."
)]
struct ResolveShardsCli {
    #[arg(
        value_name = "DATA_DIR",
        required_unless_present = "data_dir_flag",
        help = "Data location, '::'-separated for multiple sources"
    )]
    data_dir: Option<String>,
    #[arg(
        long = "data-dir",
        value_name = "DATA_DIR",
        conflicts_with = "data_dir",
        help = "Data location (alternative to the positional argument)"
    )]
    data_dir_flag: Option<String>,
    #[arg(
        long = "data-weights",
        value_name = "W1::W2",
        help = "Sampling weight per source, '::'-separated"
    )]
    data_weights: Option<String>,
    #[arg(long, help = "Print a JSON object instead of plain lines")]
    json: bool,
    #[command(flatten)]
    resolver: ResolverArgs,
}

#[derive(Debug, Parser)]
#[command(
    name = "train",
    disable_help_subcommand = true,
    about = "Resolve training shards and launch an external trainer",
    long_about = "Resolve the data location into a shard descriptor, run the configured trainer with the competition scale settings, then verify the final checkpoint and record the run.",
    after_help = "Scale presets can be extended with --scale-config pointing at a JSON object of name -> settings."
)]
struct TrainCli {
    #[arg(long, help = "Competition scale")]
    scale: String,
    #[arg(
        long = "data-dir",
        value_name = "DATA_DIR",
        help = "Data location, '::'-separated for multiple sources"
    )]
    data_dir: String,
    #[arg(
        long = "data-weights",
        value_name = "W1::W2",
        help = "Sampling weight per source; by default sources are sampled uniformly"
    )]
    data_weights: Option<String>,
    #[arg(long = "output-dir", value_name = "DIR", help = "Directory for run outputs")]
    output_dir: PathBuf,
    #[arg(long = "exp-name", help = "Experiment name (defaults to <scale>_scale)")]
    exp_name: Option<String>,
    #[arg(long, default_value_t = 4, help = "Data loader workers")]
    workers: usize,
    #[arg(long, value_enum, default_value = "amp", help = "Floating point precision")]
    precision: PrecisionArg,
    #[arg(
        long = "num-checkpoints",
        default_value_t = 5,
        value_parser = clap::value_parser!(u64).range(1..),
        help = "Number of checkpoints saved during training"
    )]
    num_checkpoints: u64,
    #[arg(long, default_value_t = 0, help = "Random seed")]
    seed: u64,
    #[arg(long = "dataset-resampled", help = "Sample shards with replacement")]
    dataset_resampled: bool,
    #[arg(long = "report-to-wandb", help = "Report to wandb")]
    report_to_wandb: bool,
    #[arg(long = "wandb-project-name", default_value = DEFAULT_WANDB_PROJECT)]
    wandb_project_name: String,
    #[arg(
        long = "accum-freq",
        default_value_t = 1,
        value_parser = parse_positive_usize,
        help = "Update the model every N steps"
    )]
    accum_freq: usize,
    #[arg(long = "log-every-n-steps", default_value_t = 100)]
    log_every_n_steps: u64,
    #[arg(long, default_value = "latest", help = "Checkpoint to resume from")]
    resume: String,
    #[arg(long = "imagenet-val", help = "ImageNet validation set for zero-shot eval")]
    imagenet_val: Option<String>,
    #[arg(long = "blur-field", help = "Field with bounding boxes to blur")]
    blur_field: Option<String>,
    #[arg(long = "grad-clip-norm")]
    grad_clip_norm: Option<f64>,
    #[arg(long = "save-frequency", default_value_t = 0)]
    save_frequency: u64,
    #[arg(
        long = "scale-config",
        value_name = "JSON",
        help = "Extra or overriding scale presets"
    )]
    scale_config: Option<PathBuf>,
    #[arg(
        long,
        value_name = "COMMAND",
        default_value = "python -m training.main",
        help = "Trainer command line; trainer flags are appended"
    )]
    trainer: String,
    #[arg(long = "dry-run", help = "Print the trainer command instead of running it")]
    dry_run: bool,
    #[command(flatten)]
    resolver: ResolverArgs,
}

/// Run the `resolve_shards` command with `args_iter` (program name excluded).
pub fn run_resolve_shards<I>(args_iter: I) -> Result<(), Box<dyn Error>>
where
    I: Iterator<Item = String>,
{
    let Some(cli) = parse_cli::<ResolveShardsCli, _>(
        std::iter::once("resolve_shards".to_string()).chain(args_iter),
    )?
    else {
        return Ok(());
    };
    init_logging(&cli.resolver.log_level)?;

    let data_dir = cli
        .data_dir
        .or(cli.data_dir_flag)
        .ok_or("a data location is required")?;
    let resolver = ShardResolver::new(cli.resolver.resolver_config());
    let sources = resolver.resolve(&data_dir, cli.data_weights.as_deref())?;
    print_sources(&sources, cli.json)?;
    Ok(())
}

/// Run the `train` command with `args_iter` (program name excluded).
pub fn run_train<I>(args_iter: I) -> Result<(), Box<dyn Error>>
where
    I: Iterator<Item = String>,
{
    let Some(cli) =
        parse_cli::<TrainCli, _>(std::iter::once("train".to_string()).chain(args_iter))?
    else {
        return Ok(());
    };
    init_logging(&cli.resolver.log_level)?;

    let mut scales = ScaleRegistry::default();
    if let Some(path) = &cli.scale_config {
        scales = scales.with_overrides_from(path)?;
    }
    let resolver = ShardResolver::new(cli.resolver.resolver_config());
    let world = WorldInfo::from_env();
    let request = train_request(&cli);
    let launcher = TrainingLauncher::new(&resolver, &scales, world);
    let trainer = CommandTrainer::from_command_line(&cli.trainer)?;

    if cli.dry_run {
        let outcome = launcher.plan(&request)?;
        let quoted: Vec<Cow<'_, str>> =
            outcome.trainer_args.iter().map(|arg| shell_quote(arg)).collect();
        println!("{} {}", cli.trainer.trim(), quoted.join(" "));
        return Ok(());
    }

    let outcome = launcher.launch(&request, &trainer)?;
    if let Some(artifacts) = &outcome.artifacts {
        println!("{}", artifacts.record_path().display());
    }
    Ok(())
}

fn train_request(cli: &TrainCli) -> TrainingRequest {
    let exp_name = cli
        .exp_name
        .clone()
        .unwrap_or_else(|| format!("{}_scale", cli.scale));
    TrainingRequest {
        scale: cli.scale.clone(),
        data_dir: cli.data_dir.clone(),
        data_weights: cli.data_weights.clone(),
        options: TrainOptions {
            exp_name,
            output_dir: cli.output_dir.clone(),
            workers: cli.workers,
            precision: cli.precision.as_trainer_value().to_string(),
            num_checkpoints: cli.num_checkpoints,
            seed: cli.seed,
            dataset_resampled: cli.dataset_resampled,
            wandb_project: cli
                .report_to_wandb
                .then(|| cli.wandb_project_name.clone()),
            accum_freq: cli.accum_freq,
            log_every_n_steps: cli.log_every_n_steps,
            resume: cli.resume.clone(),
            imagenet_val: cli.imagenet_val.clone(),
            blur_field: cli.blur_field.clone(),
            grad_clip_norm: cli.grad_clip_norm,
            save_frequency: cli.save_frequency,
        },
    }
}

fn print_sources(sources: &ShardSources, json: bool) -> Result<(), Box<dyn Error>> {
    if json {
        println!("{}", serde_json::to_string_pretty(sources)?);
        return Ok(());
    }
    println!("{}", sources.descriptor);
    if let Some(weights) = &sources.weights {
        println!("{weights}");
    }
    Ok(())
}

/// Install a stderr `tracing` subscriber; `RUST_LOG` overrides `level`.
fn init_logging(level: &str) -> Result<(), Box<dyn Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|err| format!("failed to initialize logging: {err}"))?;
    Ok(())
}

fn parse_cli<T, I>(args: I) -> Result<Option<T>, Box<dyn Error>>
where
    T: Parser,
    I: IntoIterator,
    I::Item: Into<std::ffi::OsString> + Clone,
{
    match T::try_parse_from(args) {
        Ok(cli) => Ok(Some(cli)),
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                err.print()?;
                Ok(None)
            }
            _ => Err(err.into()),
        },
    }
}

/// Quote `arg` for a POSIX shell, leaving plain words untouched.
fn shell_quote(arg: &str) -> Cow<'_, str> {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || "_@%+=:,./-".contains(ch));
    if plain {
        Cow::Borrowed(arg)
    } else {
        Cow::Owned(format!("'{}'", arg.replace('\'', r"'\''")))
    }
}

fn parse_positive_usize(raw: &str) -> Result<usize, String> {
    let value = raw
        .parse::<usize>()
        .map_err(|_| format!("invalid value '{raw}': expected a positive integer"))?;
    if value == 0 {
        return Err("value must be greater than zero".to_string());
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_cli_accepts_positional_or_flag() {
        let cli = ResolveShardsCli::try_parse_from(["resolve_shards", "/data/a::/data/b"]).unwrap();
        assert_eq!(cli.data_dir.as_deref(), Some("/data/a::/data/b"));

        let cli = ResolveShardsCli::try_parse_from([
            "resolve_shards",
            "--data-dir",
            "/data/a",
            "--data-weights",
            "1",
            "--copy-command",
            "s3=s5cmd cat",
        ])
        .unwrap();
        assert_eq!(cli.data_dir_flag.as_deref(), Some("/data/a"));
        let config = cli.resolver.resolver_config();
        assert_eq!(
            config.copy_commands.get("s3").map(String::as_str),
            Some("s5cmd cat")
        );

        assert!(ResolveShardsCli::try_parse_from(["resolve_shards"]).is_err());
    }

    #[test]
    fn train_cli_defaults_match_launcher_conventions() {
        let cli = TrainCli::try_parse_from([
            "train",
            "--scale",
            "small",
            "--data-dir",
            "/data",
            "--output-dir",
            "/runs",
            "--precision",
            "amp_bf16",
            "--report-to-wandb",
        ])
        .unwrap();
        let request = train_request(&cli);
        assert_eq!(request.options.exp_name, "small_scale");
        assert_eq!(request.options.precision, "amp_bf16");
        assert_eq!(request.options.num_checkpoints, 5);
        assert_eq!(request.options.wandb_project.as_deref(), Some("datanet"));
        assert_eq!(cli.trainer, "python -m training.main");
    }

    #[test]
    fn train_cli_rejects_zero_accum_freq() {
        let result = TrainCli::try_parse_from([
            "train",
            "--scale",
            "small",
            "--data-dir",
            "/data",
            "--output-dir",
            "/runs",
            "--accum-freq",
            "0",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn help_is_not_an_error() {
        let parsed = parse_cli::<ResolveShardsCli, _>(["resolve_shards", "--help"]).unwrap();
        assert!(parsed.is_none());
    }

    #[test]
    fn precision_accepts_trainer_spellings() {
        for (raw, expected) in [
            ("amp_bfloat16", "amp_bfloat16"),
            ("fp32", "fp32"),
            ("bf16", "bf16"),
        ] {
            let cli = TrainCli::try_parse_from([
                "train",
                "--scale",
                "small",
                "--data-dir",
                "/data",
                "--output-dir",
                "/runs",
                "--precision",
                raw,
            ])
            .unwrap();
            assert_eq!(cli.precision.as_trainer_value(), expected);
        }
    }

    #[test]
    fn shell_quote_wraps_words_with_shell_syntax() {
        assert_eq!(shell_quote("--train-data"), "--train-data");
        assert_eq!(shell_quote("/runs/small_scale"), "/runs/small_scale");
        assert_eq!(
            shell_quote("pipe:aws s3 cp s3://b/x_{0..9}.tar -"),
            "'pipe:aws s3 cp s3://b/x_{0..9}.tar -'"
        );
        assert_eq!(shell_quote("/d/s_{00..07}.tar"), "'/d/s_{00..07}.tar'");
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
        assert_eq!(shell_quote(""), "''");
    }
}
