//! `gym-agent agents`: List available agent definitions.

use gym_agent_core::workflow::AgentLoader;

use super::truncate;

pub fn list(agents_dir: Option<&str>) -> Result<(), String> {
    let loader = match agents_dir {
        Some(dir) => {
            let loader = AgentLoader::from_dir(dir).map_err(|e| e.to_string())?;
            println!("Loaded agent overrides from '{}'", dir);
            loader
        }
        None => AgentLoader::with_builtins(),
    };

    println!();
    println!("┌──────────────────────┬──────────────────────┬────────────────────┬──────────┐");
    println!("│ ID                   │ Name                 │ Tools              │ Source   │");
    println!("├──────────────────────┼──────────────────────┼────────────────────┼──────────┤");
    for agent in loader.all() {
        println!(
            "│ {:<20} │ {:<20} │ {:<18} │ {:<8} │",
            truncate(&agent.id, 20),
            truncate(&agent.name, 20),
            truncate(&agent.tools.join(", "), 18),
            if loader.is_from_file(&agent.id) { "file" } else { "builtin" }
        );
    }
    println!("└──────────────────────┴──────────────────────┴────────────────────┴──────────┘");
    Ok(())
}
