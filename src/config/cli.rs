use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::{CommandFactory, Parser};
use log::warn;

use super::{ConfigError, SignalConfig};
use crate::core::metadata::{
    MetadataValue, REFERENCE_AMPLITUDE, REFERENCE_FREQUENCY, REVOLVING_FREQUENCY, REVOLVING_MANNER,
    SAMPLE_RATE, SIGNAL_TIME_LENGTH,
};

/// Directory archives are written to unless `--output_dir` says otherwise
pub const DEFAULT_OUTPUT_DIR: &str = "resources";

#[derive(Parser, Debug, Clone)]
#[command(
    name = "siggen",
    about = "Synthesize a reference SIN/COS signal pair and archive it"
)]
pub struct Cli {
    /// Reference frequency in Hz
    #[arg(long = "reference_frequency", allow_negative_numbers = true)]
    pub reference_frequency: f64,

    /// Reference amplitude in Volts
    #[arg(long = "reference_amplitude", allow_negative_numbers = true)]
    pub reference_amplitude: f64,

    /// Sample rate in samples per second (S/s)
    #[arg(long = "sample_rate", allow_negative_numbers = true)]
    pub sample_rate: f64,

    /// Signal time length in seconds
    #[arg(long = "signal_time_length", allow_negative_numbers = true)]
    pub signal_time_length: f64,

    /// Revolving manner
    #[arg(long = "revolving_manner", value_parser = ["arbitrary", "non_arbitrary"])]
    pub revolving_manner: String,

    /// Revolving frequency in Hz (required if manner is non_arbitrary)
    #[arg(long = "revolving_frequency", allow_negative_numbers = true)]
    pub revolving_frequency: Option<f64>,

    /// Directory the archive is written to
    #[arg(long = "output_dir", default_value = DEFAULT_OUTPUT_DIR)]
    pub output_dir: PathBuf,

    /// Evaluate on N evenly spaced points over [0, signal_time_length]
    /// instead of one point per sample period
    #[arg(long)]
    pub points: Option<usize>,

    /// Extra metadata annotation (e.g. operator=alice), repeatable
    #[arg(long = "annotate", value_name = "KEY=VALUE", value_parser = parse_annotation)]
    pub annotations: Vec<(String, String)>,
}

impl Cli {
    /// Flat configuration mapping as seen by [`ConfigSchema`](super::ConfigSchema)
    pub fn config_values(&self) -> BTreeMap<String, MetadataValue> {
        let mut values = BTreeMap::new();
        values.insert(REFERENCE_FREQUENCY.to_string(), self.reference_frequency.into());
        values.insert(REFERENCE_AMPLITUDE.to_string(), self.reference_amplitude.into());
        values.insert(SAMPLE_RATE.to_string(), self.sample_rate.into());
        values.insert(SIGNAL_TIME_LENGTH.to_string(), self.signal_time_length.into());
        values.insert(REVOLVING_MANNER.to_string(), self.revolving_manner.clone().into());
        if let Some(frequency) = self.revolving_frequency {
            values.insert(REVOLVING_FREQUENCY.to_string(), frequency.into());
        }
        values
    }

    pub fn signal_config(&self) -> Result<SignalConfig, ConfigError> {
        SignalConfig::from_map(&self.config_values())
    }
}

fn parse_annotation(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid KEY=VALUE: no `=` found in `{}`", s))?;
    if key.is_empty() {
        return Err(format!("invalid KEY=VALUE: empty key in `{}`", s));
    }
    Ok((key.to_string(), value.to_string()))
}

/// Separate arguments the command line declares from everything else.
///
/// The program name stays first in `known`. An unknown `--flag` takes the
/// following token with it unless that token looks like another flag.
pub fn split_known_args<I>(args: I) -> (Vec<String>, Vec<String>)
where
    I: IntoIterator<Item = String>,
{
    let command = Cli::command();
    let mut args = args.into_iter().peekable();
    let mut known = Vec::new();
    let mut unknown = Vec::new();

    if let Some(program) = args.next() {
        known.push(program);
    }

    while let Some(arg) = args.next() {
        if arg == "-h" || arg == "--help" {
            known.push(arg);
            continue;
        }
        if !arg.starts_with("--") {
            unknown.push(arg);
            continue;
        }

        let inline = arg.contains('=');
        let name = arg[2..].split('=').next().unwrap_or_default().to_string();

        match command.get_arguments().find(|a| a.get_long() == Some(name.as_str())) {
            Some(spec) => {
                let takes_value = spec.get_action().takes_values();
                known.push(arg);
                if takes_value && !inline {
                    if let Some(value) = args.next() {
                        known.push(value);
                    }
                }
            }
            None => {
                unknown.push(arg);
                if !inline {
                    if let Some(value) = args.next_if(|next| !next.starts_with("--")) {
                        unknown.push(value);
                    }
                }
            }
        }
    }

    (known, unknown)
}

/// Parse the command line, tolerating and logging unrecognized arguments
pub fn parse_args<I>(args: I) -> Result<(Cli, Vec<String>), clap::Error>
where
    I: IntoIterator<Item = String>,
{
    let (known, unknown) = split_known_args(args);
    if !unknown.is_empty() {
        warn!("Unknown arguments detected: {}", unknown.join(" "));
    }
    let cli = Cli::try_parse_from(known)?;
    Ok((cli, unknown))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigSchema;

    fn argv(s: &str) -> Vec<String> {
        s.split_whitespace().map(String::from).collect()
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_every_schema_field_has_a_documented_flag() {
        let command = Cli::command();
        for spec in ConfigSchema::signal().fields() {
            let arg = command.get_arguments().find(|a| a.get_long() == Some(spec.key));
            assert!(
                arg.and_then(|a| a.get_help()).is_some(),
                "no documented --{} flag",
                spec.key
            );
        }
    }

    #[test]
    fn test_annotation_parsing() {
        assert_eq!(
            parse_annotation("operator=alice").unwrap(),
            ("operator".to_string(), "alice".to_string())
        );
        assert!(parse_annotation("operator").is_err());
        assert!(parse_annotation("=alice").is_err());
    }

    #[test]
    fn test_split_keeps_values_with_known_flags() {
        let (known, unknown) = split_known_args(argv(
            "siggen --sample_rate 1000 --bogus 3 --revolving_manner=arbitrary stray",
        ));
        assert_eq!(known, argv("siggen --sample_rate 1000 --revolving_manner=arbitrary"));
        assert_eq!(unknown, argv("--bogus 3 stray"));
    }

    #[test]
    fn test_split_unknown_flag_before_known_flag() {
        let (known, unknown) = split_known_args(argv("siggen --verbose --sample_rate 1000"));
        assert_eq!(known, argv("siggen --sample_rate 1000"));
        assert_eq!(unknown, argv("--verbose"));
    }
}
