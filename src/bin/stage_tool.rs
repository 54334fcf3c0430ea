use anyhow::{anyhow, bail, Context, Result};
use stage_outliner::cli::CliOverrides;
use stage_outliner::columns::{RowFlags, RowView};
use stage_outliner::config::PanelConfig;
use stage_outliner::director::StageDirector;
use stage_outliner::logging;
use stage_outliner::panel::StagePanel;
use stage_outliner::world::StageWorld;
use std::env;
use std::path::Path;
use std::process;

fn main() {
    logging::init();
    if let Err(err) = run() {
        eprintln!("error: {err:?}");
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let mut args = env::args().skip(1);
    let Some(command) = args.next() else {
        print_usage();
        return Ok(());
    };
    match command.as_str() {
        "tree" => {
            let world_path =
                args.next().ok_or_else(|| anyhow!("tree requires a path: stage_tool tree <world.json>"))?;
            cmd_tree(&world_path, CliOverrides::parse(args)?)
        }
        "rows" => {
            let world_path =
                args.next().ok_or_else(|| anyhow!("rows requires a path: stage_tool rows <world.json>"))?;
            cmd_rows(&world_path, CliOverrides::parse(args)?)
        }
        "validate" => {
            let world_path = args
                .next()
                .ok_or_else(|| anyhow!("validate requires a path: stage_tool validate <world.json>"))?;
            cmd_validate(&world_path)
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => Err(anyhow!("unknown command '{other}'")),
    }
}

fn print_usage() {
    eprintln!(
        "Stage Tool

Usage:
  stage_tool tree <world.json> [flags]      Print the full outliner tree with every row expanded
  stage_tool rows <world.json> [flags]      Print the rows a freshly opened panel shows
  stage_tool validate <world.json>          Report dangling overrides, stale actors and id clashes
  stage_tool help                           Show this message

Flags:
  --config <panel.json>     Panel configuration file
  --acts-label <text>       Label of the Acts folder
  --entities-label <text>   Label of the registered entities folder
  --drop-state <n>          State given to entities dropped onto an Act
  --expand-roots on|off     Expand Stage rows on first load
"
    );
}

fn cmd_tree(world_path: &str, overrides: CliOverrides) -> Result<()> {
    let world = load_world(world_path)?;
    let config = resolve_config(overrides);
    let mut panel = StagePanel::new(config, &world);
    let Some(outliner) = panel.outliner_mut() else {
        println!("{}", stage_outliner::panel::RESTRICTED_MESSAGE);
        return Ok(());
    };
    outliner.expand_all();
    for row in panel.rows(&world) {
        print_row(&row);
    }
    Ok(())
}

fn cmd_rows(world_path: &str, overrides: CliOverrides) -> Result<()> {
    let world = load_world(world_path)?;
    let panel = StagePanel::new(resolve_config(overrides), &world);
    if panel.outliner().is_none() {
        println!("{}", stage_outliner::panel::RESTRICTED_MESSAGE);
        return Ok(());
    }
    println!("{:<14} {:<40} {:<6} {}", "ID", "Name", "State", "Actions");
    println!("{}", "-".repeat(88));
    for row in panel.rows(&world) {
        let actions: Vec<&str> =
            row.actions.iter().map(|entry| if entry.enabled { entry.label } else { "(disabled)" }).collect();
        let name = format!("{}{}", "  ".repeat(row.depth), row.name);
        let state = row.entity_state.map(|state| state.to_string()).unwrap_or_default();
        println!("{:<14} {:<40} {:<6} {}", row.identifier, name, state, actions.join(", "));
    }
    Ok(())
}

fn cmd_validate(world_path: &str) -> Result<()> {
    let world = load_world(world_path)?;
    let issues = world.audit();
    if issues.is_empty() {
        let acts: usize = world.stages().iter().map(|stage| stage.acts.len()).sum();
        let entities: usize = world.stages().iter().map(|stage| stage.entity_registry.len()).sum();
        println!(
            "World '{}' is valid. Stages: {}  Acts: {}  Entities: {}",
            world_path,
            world.stages().len(),
            acts,
            entities
        );
        Ok(())
    } else {
        let lines: Vec<String> = issues.iter().map(ToString::to_string).collect();
        bail!("world '{}' has issues:\n  - {}", world_path, lines.join("\n  - "))
    }
}

fn print_row(row: &RowView) {
    let indent = "  ".repeat(row.depth);
    let mut line = if row.identifier.is_empty() {
        format!("{indent}{}", row.name)
    } else {
        format!("{indent}{} | {}", row.identifier, row.name)
    };
    if row.flags.contains(RowFlags::ACTIVE_STAGE) {
        line.push_str(" [active]");
    }
    if row.flags.contains(RowFlags::INVALID) {
        line.push_str(" [invalid]");
    }
    println!("{line}");
}

fn resolve_config(overrides: CliOverrides) -> PanelConfig {
    let mut config = match overrides.config_path() {
        Some(path) => PanelConfig::load_or_default(path),
        None => PanelConfig::default(),
    };
    let overrides = overrides.into_config_overrides();
    if !overrides.is_empty() {
        tracing::info!("[config] CLI overrides: {}", overrides.applied_fields().join(", "));
    }
    config.apply_overrides(&overrides);
    config
}

fn load_world(path: &str) -> Result<StageWorld> {
    let normalized = Path::new(path).canonicalize().unwrap_or_else(|_| Path::new(path).to_path_buf());
    StageWorld::load(&normalized).with_context(|| format!("loading world '{}'", normalized.display()))
}
