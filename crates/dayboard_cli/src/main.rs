//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `dayboard_core` linkage.
//! - Walk through a deterministic sample session and print counts only.
//!
//! Usage: `dayboard_cli [--config <config.toml>]`
//!
//! File logging starts only when the config sets `log_level`; logs go to
//! `<temp>/dayboard_logs`.

use clap::Parser;
use dayboard_core::{
    init_from_config, local_timestamp, Dashboard, EngineConfig, ManualClock, NewNote, NewTask,
    NotePatch, NoteQuery, Priority, TaskCategory, TaskQuery,
};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "dayboard_cli", version, about = "Dayboard core smoke run")]
struct Args {
    /// Engine config file (TOML). Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    println!("dayboard_core ping={}", dayboard_core::ping());
    println!("dayboard_core version={}", dayboard_core::core_version());

    let config = match args.config {
        Some(path) => match EngineConfig::load(&path) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("config error: {err}");
                return ExitCode::FAILURE;
            }
        },
        None => EngineConfig::default(),
    };

    if config.log_level.is_some() {
        let log_dir = std::env::temp_dir().join("dayboard_logs");
        if let Err(err) = init_from_config(&config, &log_dir) {
            eprintln!("logging disabled: {err}");
        }
    }

    match run_demo(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("demo failed: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run_demo(config: EngineConfig) -> Result<(), String> {
    let start = local_timestamp(2024, 1, 14, 9, 0, 0).ok_or("invalid demo start time")?;
    let clock = ManualClock::new(start);
    let mut dashboard = Dashboard::new(clock.shared(), config).map_err(|err| err.to_string())?;
    dashboard.load_sample_data();

    println!(
        "config reply_delay_ms={} autosave_delay_ms={}",
        dashboard.config().reply_delay_ms,
        dashboard.config().autosave_delay_ms
    );

    dashboard
        .tasks
        .create(NewTask::titled("Buy milk").priority(Priority::Low))
        .map_err(|err| err.to_string())?;
    let counts = dashboard.tasks.counts();
    for category in TaskCategory::ALL {
        println!(
            "tasks category={} count={}",
            category.label(),
            counts.get(category)
        );
    }
    let visible = dashboard.tasks.view(&TaskQuery::default());
    println!("tasks visible={}", visible.items.len());
    for card in &visible.items {
        println!("task priority={}", card.task.priority.label());
    }

    let note = dashboard
        .notes
        .create(NewNote::titled("Weekly review").tags(["work", "review"]));
    dashboard.notes.open_editor(note.id);
    dashboard.notes.edit(NotePatch {
        content: Some("Ship the dashboard core".to_string()),
        ..Default::default()
    });

    dashboard.chat.set_input("hi");
    dashboard.chat.send().map_err(|err| err.to_string())?;

    while let Some(due) = dashboard.next_due() {
        clock.set(due);
        let report = dashboard.tick();
        println!(
            "tick chat_timers={} autosaves={}",
            report.chat_timers, report.autosaves
        );
    }

    let notes = dashboard.notes.view(&NoteQuery::default());
    println!("notes total={} tags={}", notes.total, notes.all_tags.len());
    let active = dashboard
        .chat
        .active_thread()
        .map(|thread| thread.message_count())
        .unwrap_or(0);
    println!("chat active_messages={active}");
    for group in dashboard.chat.grouped_threads("") {
        println!(
            "chat bucket={} threads={}",
            group.bucket.label(),
            group.items.len()
        );
    }
    Ok(())
}
