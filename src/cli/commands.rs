//! CLI command implementations

use anyhow::{Context, Result};
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use crate::cli::args::ConfigCommand;
use crate::config::Settings;
use crate::fetch::{build_store, AudioFetcher};
use crate::pipeline::{build_coordinator, open_repository, JobOutcome, VoiceMemoJob};
use crate::storage::TranscriptionRecord;

/// Run one job through the pipeline
pub async fn process_memo(settings: &Settings, storage_path: String, user_id: String) -> Result<()> {
    let coordinator = build_coordinator(settings)?;

    let outcome = coordinator
        .run(VoiceMemoJob::new(storage_path, user_id))
        .await;
    print_outcome(&outcome);

    if let Some(err) = outcome.error {
        anyhow::bail!("Job for {} failed: {}", outcome.job.storage_path, err);
    }

    Ok(())
}

/// Run every job from a JSON-lines file
pub async fn process_batch(
    settings: &Settings,
    file: &Path,
    concurrency: Option<usize>,
) -> Result<()> {
    let content = if file == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read jobs from stdin")?;
        buf
    } else {
        std::fs::read_to_string(file)
            .with_context(|| format!("Failed to read jobs file: {}", file.display()))?
    };

    let jobs = parse_jobs(&content)?;
    if jobs.is_empty() {
        println!("No jobs to process");
        return Ok(());
    }

    let coordinator = Arc::new(build_coordinator(settings)?);
    let limit = concurrency.unwrap_or(settings.pipeline.max_concurrent_jobs);
    let total = jobs.len();

    let outcomes = coordinator.run_all(jobs, limit).await;
    for outcome in &outcomes {
        print_outcome(outcome);
    }

    let failed = outcomes.iter().filter(|o| !o.is_completed()).count();
    println!("{} completed, {} failed", total - failed, failed);

    if failed > 0 {
        anyhow::bail!("{} of {} jobs failed", failed, total);
    }

    Ok(())
}

/// Download a memo and print its base64 transport form
pub async fn download_memo(settings: &Settings, storage_path: &str) -> Result<()> {
    let fetcher = AudioFetcher::new(build_store(settings)?);
    let payload = fetcher.fetch(storage_path).await?;

    println!("{}", serde_json::to_string_pretty(&payload.encode())?);
    Ok(())
}

/// Show the stored transcription for a memo
pub async fn show_transcription(settings: &Settings, storage_path: &str, json: bool) -> Result<()> {
    let repository = open_repository(settings)?;

    let Some(record) = repository.find(storage_path).await? else {
        println!("No transcription found for: {}", storage_path);
        return Ok(());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        print_record(&record);
    }

    Ok(())
}

/// List recently processed memos
pub async fn list_transcriptions(settings: &Settings, limit: usize) -> Result<()> {
    let repository = open_repository(settings)?;
    let records = repository.list_recent(limit).await?;

    if records.is_empty() {
        println!("No transcriptions found");
        return Ok(());
    }

    println!(
        "{:<10} {:<32} {:<17} {:<10}",
        "ID", "Storage path", "Processed", "Status"
    );
    println!("{}", "-".repeat(72));

    for record in records {
        let status = if record.error.is_some() { "failed" } else { "completed" };
        println!(
            "{:<10} {:<32} {:<17} {:<10}",
            short_id(&record.id),
            truncate(&record.storage_path, 30),
            record.processed_at.format("%Y-%m-%d %H:%M"),
            status
        );
    }

    Ok(())
}

/// Configuration commands
pub fn config_command(settings: &Settings, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show => {
            let toml = toml::to_string_pretty(settings)?;
            println!("{}", toml);
        }
        ConfigCommand::Path => {
            let path = Settings::config_path()?;
            println!("{}", path.display());
        }
        ConfigCommand::Init { force } => {
            let path = Settings::config_path()?;
            if path.exists() && !force {
                anyhow::bail!(
                    "Config file already exists at {}. Use --force to overwrite.",
                    path.display()
                );
            }
            Settings::write_default(&path)?;
            println!("Configuration initialized at: {}", path.display());
        }
    }

    Ok(())
}

/// Parse JSON-lines jobs, skipping blank lines
fn parse_jobs(content: &str) -> Result<Vec<VoiceMemoJob>> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str::<VoiceMemoJob>(line)
                .with_context(|| format!("Invalid job on line {}", i + 1))
        })
        .collect()
}

fn print_outcome(outcome: &JobOutcome) {
    match (&outcome.record, &outcome.error) {
        (Some(record), _) => println!(
            "completed {} (record {})",
            outcome.job.storage_path,
            short_id(&record.id)
        ),
        (None, Some(err)) => println!("failed {}: {}", outcome.job.storage_path, err),
        (None, None) => println!("{} {}", outcome.state, outcome.job.storage_path),
    }
}

fn print_record(record: &TranscriptionRecord) {
    println!("Storage path: {}", record.storage_path);
    println!("User: {}", record.user_id);
    println!("Processed: {}", record.processed_at.format("%Y-%m-%d %H:%M:%S"));
    if let Some(language) = record.language.as_deref() {
        println!("Language: {}", language);
    }
    if let Some(metadata) = &record.metadata {
        println!(
            "Duration: {} ({} segments)",
            format_timestamp(metadata.duration),
            metadata.segments_count
        );
    }
    if let Some(error) = record.error.as_deref() {
        println!("Error: {}", error);
    }
    println!();

    match record.transcription_text.as_deref() {
        Some(text) => println!("{}", text),
        None => println!("(No transcript available)"),
    }

    if let Some(metadata) = record.metadata.as_ref().filter(|m| !m.segments.is_empty()) {
        println!();
        for segment in &metadata.segments {
            println!("[{}] {}", format_timestamp(segment.start), segment.text);
        }
    }
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

fn format_timestamp(secs: f64) -> String {
    let total_secs = secs as u64;
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_job_lines_and_skips_blanks() {
        let content = r#"{"storage_path":"a.webm","user_id":"u1"}

{"storage_path":"b.webm","user_id":"u2"}
"#;
        let jobs = parse_jobs(content).unwrap();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[1], VoiceMemoJob::new("b.webm", "u2"));
    }

    #[test]
    fn invalid_job_line_reports_line_number() {
        let content = "{\"storage_path\":\"a.webm\",\"user_id\":\"u1\"}\n{\"storage_path\":1}\n";
        let err = parse_jobs(content).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn formats_timestamps_and_truncates() {
        assert_eq!(format_timestamp(3.2), "00:03");
        assert_eq!(format_timestamp(3725.0), "01:02:05");
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a-very-long-storage-path.webm", 10), "a-very-...");
        assert_eq!(short_id("abc"), "abc");
    }
}
