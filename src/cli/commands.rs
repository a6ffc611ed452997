//! Command dispatch: wires parsed arguments to services and prints results.

use std::io;
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use clap_complete::generate;
use itertools::Itertools;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::application::services::ScriptStep;
use crate::application::ApplicationError;
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{global_config_path, local_config_path, OutputFormat, Settings};
use crate::domain::{HierarchicalStore, Node, NodeId, Outcome, TreeRender};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let Some(command) = &cli.command else {
        return Ok(());
    };

    // completions need neither config nor data
    if let Commands::Completion { shell } = command {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        generate(*shell, &mut cmd, name, &mut io::stdout());
        return Ok(());
    }

    let cwd = std::env::current_dir().map_err(|e| InfraError::io("current directory", e))?;
    let settings = Settings::load(Some(cwd.as_path()))?;
    let format = if cli.json {
        OutputFormat::Json
    } else {
        settings.format
    };
    let container = ServiceContainer::new(settings);

    match command {
        Commands::Config { command } => _config(&container, command, &cwd),
        Commands::Show { id } => {
            let store = load_store(&container, cli.file.as_deref())?;
            _show(&store, id.as_deref())
        }
        Commands::Get { id } => {
            let store = load_store(&container, cli.file.as_deref())?;
            _get(&store, id, format)
        }
        Commands::Children { id, all } => {
            let store = load_store(&container, cli.file.as_deref())?;
            _children(&store, id, *all, format)
        }
        Commands::Ancestors { id } => {
            let store = load_store(&container, cli.file.as_deref())?;
            _ancestors(&store, id, format)
        }
        Commands::Run { script, output } => {
            let mut store = load_store(&container, cli.file.as_deref())?;
            _run(&container, &mut store, script, output.as_deref(), format)
        }
        Commands::Completion { .. } => Ok(()),
    }
}

fn load_store(container: &ServiceContainer, file: Option<&Path>) -> CliResult<HierarchicalStore> {
    let path: PathBuf = file
        .map(Path::to_path_buf)
        .or_else(|| container.settings.data_file.clone())
        .ok_or(ApplicationError::NoDataFile)?;
    Ok(container.session.load(&path)?)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| CliError::Usage(format!("cannot render JSON: {e}")))?;
    output::info(&text);
    Ok(())
}

fn print_nodes(nodes: &[&Node], format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(nodes),
        OutputFormat::Plain => {
            for node in nodes {
                output::info(node);
            }
            Ok(())
        }
    }
}

#[instrument(skip(store))]
fn _show(store: &HierarchicalStore, id: Option<&str>) -> CliResult<()> {
    match id {
        Some(id) => {
            let id = NodeId::parse_lenient(id);
            match store.render_subtree(&id) {
                Some(tree) => output::info(&tree),
                None => output::warning(&format!("node {id} not found")),
            }
        }
        None => {
            let forest = store.render_forest();
            if forest.is_empty() {
                output::warning("no nodes");
            }
            for tree in forest {
                output::info(&tree);
            }
        }
    }
    Ok(())
}

#[instrument(skip(store))]
fn _get(store: &HierarchicalStore, id: &str, format: OutputFormat) -> CliResult<()> {
    let id = NodeId::parse_lenient(id);
    match store.get_item(&id) {
        Some(node) => match format {
            OutputFormat::Json => print_json(node),
            OutputFormat::Plain => {
                output::header(node);
                if let Some(parent) = &node.parent {
                    output::detail(&format!("parent: {parent}"));
                }
                for (key, value) in &node.fields {
                    output::detail(&format!("{key}: {value}"));
                }
                Ok(())
            }
        },
        None => {
            output::warning(&format!("node {id} not found"));
            Ok(())
        }
    }
}

#[instrument(skip(store))]
fn _children(store: &HierarchicalStore, id: &str, all: bool, format: OutputFormat) -> CliResult<()> {
    let id = NodeId::parse_lenient(id);
    let nodes = if all {
        store.get_all_children(&id)
    } else {
        store.get_children(&id)
    };
    debug!("{} nodes under {}", nodes.len(), id);
    print_nodes(&nodes, format)
}

#[instrument(skip(store))]
fn _ancestors(store: &HierarchicalStore, id: &str, format: OutputFormat) -> CliResult<()> {
    let id = NodeId::parse_lenient(id);
    let parents = store.get_all_parents(&id);
    match format {
        OutputFormat::Json => print_json(&parents),
        OutputFormat::Plain => {
            if !parents.is_empty() {
                output::info(&parents.iter().map(|n| &n.label).join(" > "));
            }
            Ok(())
        }
    }
}

#[derive(Serialize)]
struct StepReport<'a> {
    op: String,
    outcome: &'a Outcome,
}

#[instrument(skip(container, store))]
fn _run(
    container: &ServiceContainer,
    store: &mut HierarchicalStore,
    script: &Path,
    out: Option<&Path>,
    format: OutputFormat,
) -> CliResult<()> {
    let steps = container.session.run_script(store, script)?;

    match format {
        OutputFormat::Json => {
            let report: Vec<StepReport> = steps
                .iter()
                .map(|step| StepReport {
                    op: step.operation.to_string(),
                    outcome: &step.outcome,
                })
                .collect();
            print_json(&report)?;
        }
        OutputFormat::Plain => {
            for step in &steps {
                print_step(step);
            }
            output::success(&format!(
                "{} operations applied, {} nodes, {} undoable",
                steps.len(),
                store.len(),
                store.history().len()
            ));
        }
    }

    if let Some(path) = out {
        container.session.save(store, path)?;
        if format == OutputFormat::Plain {
            output::action("Saved", &path.display());
        }
    }
    Ok(())
}

fn print_step(step: &ScriptStep) {
    match &step.outcome {
        Outcome::Done => output::action("applied", &step.operation),
        Outcome::Applied(true) => output::action("applied", &step.operation),
        Outcome::Applied(false) => output::warning(&format!("{}: nothing to do", step.operation)),
        Outcome::Node(Some(node)) => output::action(&step.operation.to_string(), node),
        Outcome::Node(None) => output::warning(&format!("{}: not found", step.operation)),
        Outcome::Nodes(nodes) => {
            output::header(&step.operation);
            for node in nodes {
                output::detail(node);
            }
        }
    }
}

#[instrument(skip(container))]
fn _config(container: &ServiceContainer, command: &ConfigCommands, cwd: &Path) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            output::info(&container.settings.to_toml()?);
        }
        ConfigCommands::Template => {
            output::info(&Settings::template());
        }
        ConfigCommands::Path => {
            match global_config_path() {
                Some(path) => output::action("global", &path.display()),
                None => output::warning("no global config directory on this platform"),
            }
            output::action("local", &local_config_path(cwd).display());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> HierarchicalStore {
        HierarchicalStore::new(vec![Node::root(1, "root"), Node::child(2, 1, "a")])
    }

    #[test]
    fn given_unknown_id_when_show_or_get_then_both_succeed() {
        let store = store();
        assert!(_show(&store, Some("99")).is_ok());
        assert!(_get(&store, "99", OutputFormat::Plain).is_ok());
        assert!(_get(&store, "99", OutputFormat::Json).is_ok());
    }

    #[test]
    fn given_known_id_when_show_then_renders_subtree() {
        assert!(_show(&store(), Some("1")).is_ok());
    }
}
