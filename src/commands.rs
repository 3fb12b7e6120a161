//! CLI command handlers.
//!
//! Handlers parse their inputs up front and fail with context before any
//! connection is opened.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use tracing::info;

use replicator_applier::{CheckpointSeeker, RecoveryReport, SeekerConfig, seek_iter};
use replicator_model::{Checkpoint, Event, compare_checkpoints};

use crate::cli::Commands;

/// Execute a CLI command.
pub async fn execute_command(command: Commands) -> Result<()> {
    match command {
        Commands::Compare { left, right } => cmd_compare(&left, &right),
        Commands::Recover {
            config,
            set,
            default,
        } => cmd_recover(config.as_deref(), &set, default.as_deref()).await,
        Commands::Seek { from, events } => cmd_seek(&from, &events),
    }
}

fn cmd_compare(left: &str, right: &str) -> Result<()> {
    let left = parse_checkpoint(left).context("Invalid left checkpoint")?;
    let right = parse_checkpoint(right).context("Invalid right checkpoint")?;
    println!(
        "{}",
        ordering_label(compare_checkpoints(left.as_ref(), right.as_ref()))
    );
    Ok(())
}

async fn cmd_recover(
    config_path: Option<&Path>,
    overrides: &[String],
    default: Option<&str>,
) -> Result<()> {
    let settings = load_settings(config_path, overrides)?;
    let config = SeekerConfig::from_map(&settings).context("Invalid recovery configuration")?;
    let default = match default {
        Some(raw) => parse_checkpoint(raw).context("Invalid default checkpoint")?,
        None => None,
    };

    info!(topic = %config.topic, "Recovering checkpoint");
    let report = recover(config, default).await?;
    println!("{}", serde_json::to_string_pretty(&report.checkpoint)?);
    Ok(())
}

#[cfg(feature = "kafka")]
async fn recover(config: SeekerConfig, default: Option<Checkpoint>) -> Result<RecoveryReport> {
    replicator_applier::recover_checkpoint_async(replicator_applier::KafkaConnector, config, default)
        .await
        .context("Checkpoint recovery failed")
}

#[cfg(not(feature = "kafka"))]
#[allow(clippy::unused_async)]
async fn recover(_config: SeekerConfig, _default: Option<Checkpoint>) -> Result<RecoveryReport> {
    Err(replicator_applier::Error::FeatureDisabled {
        feature: "kafka".to_string(),
    })
    .context("Rebuild with `--features kafka` to recover from a cluster")
}

fn cmd_seek(from: &str, events_path: &Path) -> Result<()> {
    let resume = parse_checkpoint(from).context("Invalid resume checkpoint")?;
    let events = read_events(events_path)?;
    let total = events.len();

    let mut seeker = CheckpointSeeker::new(resume);
    for event in seek_iter(events, &mut seeker) {
        println!("{}", serde_json::to_string(&event)?);
    }

    info!(
        total,
        dropped = seeker.dropped(),
        state = ?seeker.state(),
        "Seek finished"
    );
    Ok(())
}

/// Parse a checkpoint document. `null` is the absent checkpoint.
fn parse_checkpoint(raw: &str) -> Result<Option<Checkpoint>> {
    serde_json::from_str(raw).with_context(|| format!("Not a checkpoint document: {raw}"))
}

const fn ordering_label(ordering: Ordering) -> &'static str {
    match ordering {
        Ordering::Less => "less",
        Ordering::Equal => "equal",
        Ordering::Greater => "greater",
    }
}

/// Build the flat settings map from an optional TOML file plus `KEY=VALUE`
/// overrides. Overrides win.
fn load_settings(path: Option<&Path>, overrides: &[String]) -> Result<HashMap<String, String>> {
    let mut settings = HashMap::new();

    if let Some(path) = path {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let table: toml::Table = toml::from_str(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        flatten_table("", &table, &mut settings)?;
    }

    for raw in overrides {
        let (key, value) = parse_override(raw)?;
        settings.insert(key, value);
    }

    Ok(settings)
}

fn flatten_table(
    prefix: &str,
    table: &toml::Table,
    settings: &mut HashMap<String, String>,
) -> Result<()> {
    for (key, value) in table {
        let key = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        let flat = match value {
            toml::Value::Table(nested) => {
                flatten_table(&key, nested, settings)?;
                continue;
            }
            toml::Value::String(s) => s.clone(),
            toml::Value::Integer(i) => i.to_string(),
            toml::Value::Float(f) => f.to_string(),
            toml::Value::Boolean(b) => b.to_string(),
            toml::Value::Datetime(d) => d.to_string(),
            toml::Value::Array(_) => bail!("Setting {key} must be a scalar"),
        };
        settings.insert(key, flat);
    }
    Ok(())
}

fn parse_override(raw: &str) -> Result<(String, String)> {
    let Some((key, value)) = raw.split_once('=') else {
        bail!("Override must look like KEY=VALUE: {raw}");
    };
    let key = key.trim();
    if key.is_empty() {
        bail!("Override has an empty key: {raw}");
    }
    Ok((key.to_string(), value.to_string()))
}

/// Read JSON-lines events, skipping blank lines.
fn read_events(path: &Path) -> Result<Vec<Event>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read events file {}", path.display()))?;

    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            serde_json::from_str(line).with_context(|| {
                format!("Invalid event on line {} of {}", index.saturating_add(1), path.display())
            })
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::io::Write;

    use replicator_model::{AugmentedEventHeader, EventData, EventHeader, EventType};

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    // ==========================================================================
    // CHECKPOINT PARSING
    // ==========================================================================

    #[test]
    fn test_parse_checkpoint_accepts_null() {
        assert_eq!(parse_checkpoint("null").unwrap(), None);
    }

    #[test]
    fn test_parse_checkpoint_wire_names() {
        let parsed =
            parse_checkpoint(r#"{"binlogFilename":"mysql-bin.000002","binlogPosition":100}"#)
                .unwrap();
        assert_eq!(parsed, Some(Checkpoint::at_binlog("mysql-bin.000002", 100)));
    }

    #[test]
    fn test_parse_checkpoint_rejects_garbage() {
        assert!(parse_checkpoint("mysql-bin.000002:100").is_err());
    }

    #[test]
    fn test_ordering_labels() {
        let older = Some(Checkpoint::at_binlog("mysql-bin.000001", 9999));
        let newer = Some(Checkpoint::at_binlog("mysql-bin.000002", 0));
        assert_eq!(
            ordering_label(compare_checkpoints(older.as_ref(), newer.as_ref())),
            "less"
        );
        assert_eq!(ordering_label(compare_checkpoints(None, None)), "equal");
        assert_eq!(
            ordering_label(compare_checkpoints(newer.as_ref(), None)),
            "greater"
        );
    }

    // ==========================================================================
    // SETTINGS
    // ==========================================================================

    #[test]
    fn test_load_settings_flattens_dotted_keys() {
        let file = write_temp(
            r#"
[kafka]
bootstrap.servers = "broker-1:9092,broker-2:9092"
poll.timeout.ms = 250
topic = "binlog"
group.id = "replicator"
"#,
        );

        let settings = load_settings(Some(file.path()), &[]).unwrap();
        assert_eq!(
            settings.get("kafka.bootstrap.servers").map(String::as_str),
            Some("broker-1:9092,broker-2:9092")
        );
        assert_eq!(settings.get("kafka.poll.timeout.ms").map(String::as_str), Some("250"));
        assert_eq!(settings.get("kafka.topic").map(String::as_str), Some("binlog"));
        assert_eq!(settings.get("kafka.group.id").map(String::as_str), Some("replicator"));

        let config = SeekerConfig::from_map(&settings).unwrap();
        assert_eq!(config.poll_timeout.as_millis(), 250);
    }

    #[test]
    fn test_overrides_win_over_file() {
        let file = write_temp("[kafka]\ntopic = \"from-file\"\n");
        let settings = load_settings(
            Some(file.path()),
            &["kafka.topic=from-flag".to_string(), "kafka.group.id=g=1".to_string()],
        )
        .unwrap();

        assert_eq!(settings.get("kafka.topic").map(String::as_str), Some("from-flag"));
        assert_eq!(settings.get("kafka.group.id").map(String::as_str), Some("g=1"));
    }

    #[test]
    fn test_top_level_dotted_keys() {
        let file = write_temp("kafka.topic = \"binlog\"\n");
        let settings = load_settings(Some(file.path()), &[]).unwrap();
        assert_eq!(settings.get("kafka.topic").map(String::as_str), Some("binlog"));
    }

    #[test]
    fn test_array_setting_rejected() {
        let file = write_temp("kafka.bootstrap.servers = [\"a\", \"b\"]\n");
        assert!(load_settings(Some(file.path()), &[]).is_err());
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        assert!(load_settings(Some(&path), &[]).is_err());
    }

    #[test]
    fn test_parse_override_requires_equals() {
        assert!(parse_override("kafka.topic").is_err());
        assert!(parse_override("=value").is_err());
        assert_eq!(
            parse_override(" kafka.topic =t").unwrap(),
            ("kafka.topic".to_string(), "t".to_string())
        );
    }

    // ==========================================================================
    // EVENTS FILE
    // ==========================================================================

    #[test]
    fn test_read_events_skips_blank_lines() {
        let event = Event::new(
            AugmentedEventHeader::new(
                EventHeader::new(EventType::Xid, 1),
                Checkpoint::at_binlog("mysql-bin.000001", 4),
            ),
            EventData::Xid { xid: 3 },
        );
        let line = serde_json::to_string(&event).unwrap();
        let file = write_temp(&format!("{line}\n\n{line}\n"));

        let events = read_events(file.path()).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events.first().and_then(Event::checkpoint), event.checkpoint());
    }

    #[test]
    fn test_read_events_reports_bad_line() {
        let file = write_temp("\nnot json\n");
        let err = read_events(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("line 2"));
    }

    #[tokio::test]
    async fn test_recover_rejects_incomplete_configuration() {
        let result = execute_command(Commands::Recover {
            config: None,
            set: vec!["kafka.topic=binlog".to_string()],
            default: None,
        })
        .await;

        let err = result.unwrap_err();
        assert!(format!("{err:#}").contains("configuration required"));
    }
}
