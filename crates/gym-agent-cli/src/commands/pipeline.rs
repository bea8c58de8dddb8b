//! `gym-agent pipeline`: Validate and inspect pipeline definitions.

use gym_agent_core::workflow::{AgentLoader, PipelineDefinition};

fn load(file: Option<&str>) -> Result<PipelineDefinition, String> {
    match file {
        Some(file) => PipelineDefinition::from_file(file),
        None => PipelineDefinition::builtin(),
    }
    .map_err(|e| e.to_string())
}

/// Validate a pipeline YAML file without executing it.
pub fn validate(file: &str) -> Result<(), String> {
    let pipeline = load(Some(file))?;
    pipeline.validate().map_err(|e| e.to_string())?;

    let agents = AgentLoader::with_builtins();
    let unknown: Vec<&str> = pipeline
        .steps
        .iter()
        .filter(|s| agents.get(&s.agent).is_none())
        .map(|s| s.agent.as_str())
        .collect();

    println!("✅ Pipeline '{}' is valid", pipeline.name);
    println!("   Version: {}", pipeline.version);
    println!("   Steps: {}", pipeline.steps.len());
    if !unknown.is_empty() {
        println!(
            "   ⚠️  Agents not built in (need --agents-dir): {}",
            unknown.join(", ")
        );
    }
    Ok(())
}

/// Print the stages of a pipeline (the built-in one by default).
pub fn show(file: Option<&str>) -> Result<(), String> {
    let pipeline = load(file)?;
    pipeline.validate().map_err(|e| e.to_string())?;

    println!("{} (v{})", pipeline.name, pipeline.version);
    if let Some(ref description) = pipeline.description {
        println!("  {}", description);
    }
    println!();

    for (i, stage) in pipeline.stages().iter().enumerate() {
        let parallel = if stage.len() > 1 { " [parallel]" } else { "" };
        println!("Stage {}{}", i + 1, parallel);
        for step in stage.iter() {
            let mut notes = Vec::new();
            if step.interactive {
                notes.push("interactive".to_string());
            }
            if !step.requires.is_empty() {
                notes.push(format!("requires {}", step.requires.join(", ")));
            }
            if !step.tools.is_empty() {
                notes.push(format!("tools {}", step.tools.join(", ")));
            }
            if step.hook.is_some() {
                notes.push("saves history".to_string());
            }
            println!(
                "  • {} → {}{}",
                step.name,
                step.output_key.as_deref().unwrap_or("-"),
                if notes.is_empty() {
                    String::new()
                } else {
                    format!(" ({})", notes.join("; "))
                }
            );
        }
    }
    Ok(())
}
