//! Arch Overlay CLI.
//!
//! Lädt Landmarken und einen Mess-Payload, aktiviert eine Analyse und gibt
//! deren Zusammenfassung als JSON aus. Steht stellvertretend für das UI.

use anyhow::Context;
use arch_overlay::{AnalysisContext, EngineOptions, LandmarkStore, OverlayCommand};
use std::path::Path;

const USAGE: &str = "Aufruf: arch-overlay <landmarks.json> <payload.json> <task-id>
       arch-overlay --write-default-config";

fn main() -> anyhow::Result<()> {
    // Logger initialisieren
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    log::info!("Arch Overlay v{} startet...", env!("CARGO_PKG_VERSION"));

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.as_slice() {
        [flag] if flag == "--write-default-config" => {
            EngineOptions::default().save_to_file(&EngineOptions::config_path())
        }
        [landmarks, payload, task_id] => run(Path::new(landmarks), Path::new(payload), task_id),
        _ => {
            eprintln!("{USAGE}");
            anyhow::bail!("ungültige Argumente");
        }
    }
}

fn run(landmarks_path: &Path, payload_path: &Path, task_id: &str) -> anyhow::Result<()> {
    // Optionen aus TOML laden (oder Standardwerte)
    let options = EngineOptions::load_from_file(&EngineOptions::config_path());

    let landmarks_text = std::fs::read_to_string(landmarks_path)
        .with_context(|| format!("Landmarken nicht lesbar: {landmarks_path:?}"))?;
    let landmarks = LandmarkStore::from_json_str(&landmarks_text)?;

    let payload_text = std::fs::read_to_string(payload_path)
        .with_context(|| format!("Payload nicht lesbar: {payload_path:?}"))?;
    let payload: serde_json::Value =
        serde_json::from_str(&payload_text).context("Payload ist kein gültiges JSON")?;

    let mut context = AnalysisContext::bootstrap(options)?;
    context.set_landmarks(landmarks);
    context.handle_command(OverlayCommand::ActivateAnalysis {
        task_id: task_id.to_string(),
        payload,
    })?;

    let summary = context.summary(task_id)?;
    println!("{}", serde_json::to_string_pretty(&summary)?);

    let resources = context.scene().live_resources();
    log::info!(
        "Szene: {} Nodes, {} GPU-Ressourcen, {} verschiebbare Control-Points",
        context.scene().node_count(),
        resources.total(),
        context.draggable_targets().len()
    );
    Ok(())
}
