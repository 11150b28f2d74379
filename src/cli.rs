//! Minimal CLI: evaluate → classify → (go | inspect)
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use jsbind::{BoaSource, Binding};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// generate typed GopherJS bindings from a JavaScript library
#[derive(Parser, Debug)]
#[command(name = "jsbind", version)]
pub struct CommandLineInterface {
    /// log every classified property (overrides RUST_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// emit the Go binding
    Go(GoOut),
    /// print the discovered declarations as JSON
    Inspect(InspectOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// JavaScript file to evaluate
    #[arg(long, short)]
    input: PathBuf,

    /// extra scripts evaluated before the input (shims, dependencies)
    #[arg(long)]
    prelude: Vec<PathBuf>,

    /// global object which contains the JavaScript library
    #[arg(long, short = 'O')]
    object: String,

    /// name of the resulting binding's package
    #[arg(long, short)]
    name: String,
}

#[derive(clap::Parser, Debug)]
struct GoOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// output .go file (defaults to `<name>.go`)
    #[arg(short, long, conflicts_with = "stdout")]
    out: Option<PathBuf>,

    /// print the binding instead of writing a file
    #[arg(long)]
    stdout: bool,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

#[derive(clap::Parser, Debug)]
struct InspectOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn load_binding(&self) -> Result<Binding> {
        let mut source = BoaSource::new()?;
        for prelude in &self.prelude {
            source
                .run_file(prelude)
                .with_context(|| format!("failed to evaluate prelude {}", prelude.display()))?;
        }
        source
            .run_file(&self.input)
            .with_context(|| format!("failed to evaluate {}", self.input.display()))?;

        let binding = jsbind::bind_global(&mut source, &self.object, &self.name)
            .with_context(|| format!("failed to bind `{}`", self.object))?;
        Ok(binding)
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    /// Logs go to stderr so generated output on stdout stays clean.
    pub fn init_logging(&self) {
        let filter = if self.verbose {
            EnvFilter::new("jsbind=debug")
        } else {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
        };
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    }

    pub fn run(&self) -> Result<()> {
        match &self.cmd {
            Command::Go(target) => {
                // debug path
                if target.no_op {
                    eprintln!("{self:#?}");
                    return Ok(());
                }

                let settings = &target.input_settings;
                let binding = settings.load_binding()?;

                if target.stdout {
                    print!("{}", binding.render()?);
                    return Ok(());
                }

                let out = target
                    .out
                    .clone()
                    .unwrap_or_else(|| default_output(&settings.name));
                binding
                    .export(&out)
                    .with_context(|| format!("failed to write {}", out.display()))?;
                println!(
                    "  {} {} → {} ({} declarations)",
                    "✓".green(),
                    settings.input.display(),
                    out.display(),
                    binding.elements().len()
                );
                Ok(())
            }
            Command::Inspect(target) => {
                // debug path
                if target.no_op {
                    eprintln!("{self:#?}");
                    return Ok(());
                }

                let binding = target.input_settings.load_binding()?;
                let view = serde_json::to_string_pretty(&binding)?;
                match target.out.as_ref() {
                    Some(out) => {
                        write_creating_parent(out, &view)?;
                        println!("  {} {}", "✓".green(), out.display());
                    }
                    None => println!("{view}"),
                }
                Ok(())
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn default_output(package: &str) -> PathBuf {
    PathBuf::from(format!("{package}.go"))
}

fn write_creating_parent(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_three_inputs_are_required() {
        let missing_name = CommandLineInterface::try_parse_from([
            "jsbind", "go", "-i", "lib.js", "-O", "lib",
        ]);
        assert!(missing_name.is_err());

        let missing_object = CommandLineInterface::try_parse_from([
            "jsbind", "go", "-i", "lib.js", "-n", "lib",
        ]);
        assert!(missing_object.is_err());

        let missing_input = CommandLineInterface::try_parse_from([
            "jsbind", "inspect", "-O", "lib", "-n", "lib",
        ]);
        assert!(missing_input.is_err());
    }

    #[test]
    fn short_flags_match_the_long_ones() {
        let cli = CommandLineInterface::try_parse_from([
            "jsbind", "go", "-i", "three.js", "-O", "THREE", "-n", "three",
        ])
        .unwrap();
        match cli.cmd {
            Command::Go(go) => {
                assert_eq!(go.input_settings.input, PathBuf::from("three.js"));
                assert_eq!(go.input_settings.object, "THREE");
                assert_eq!(go.input_settings.name, "three");
                assert!(go.out.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert_eq!(default_output("three"), PathBuf::from("three.go"));
    }

    #[test]
    fn out_conflicts_with_stdout() {
        let parsed = CommandLineInterface::try_parse_from([
            "jsbind", "go", "-i", "a.js", "-O", "a", "-n", "a", "-o", "a.go", "--stdout",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn go_command_writes_the_binding() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("lib.js");
        std::fs::write(&input, "var lib = { size: 3, Item: function (id) {} };").unwrap();
        let out = dir.path().join("lib.go");

        let (input, out_arg) = (input.to_string_lossy(), out.to_string_lossy());
        let cli = CommandLineInterface::try_parse_from([
            "jsbind", "go", "-i", &*input, "-O", "lib", "-n", "lib", "-o", &*out_arg,
        ])
        .unwrap();
        cli.run().unwrap();

        let text = std::fs::read_to_string(&out).unwrap();
        assert!(text.starts_with("package lib\n"));
        assert!(text.contains("type Item struct {"));
        assert!(text.contains("func NewItem(id interface{}) *Item {"));
        assert!(text.contains("\tSize float64 `js:\"size\"`"));
    }

    #[test]
    fn inspect_writes_json() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("lib.js");
        std::fs::write(&input, "var lib = { on: true };").unwrap();
        let out = dir.path().join("nested").join("lib.json");

        let (input, out_arg) = (input.to_string_lossy(), out.to_string_lossy());
        let cli = CommandLineInterface::try_parse_from([
            "jsbind", "inspect", "-i", &*input, "-O", "lib", "-n", "lib", "-o", &*out_arg,
        ])
        .unwrap();
        cli.run().unwrap();

        let view: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(view["name"], "lib");
        assert_eq!(view["elems"][0]["kind"], "struct");
        assert_eq!(view["elems"][0]["fields"][0]["type"], "bool");
    }
}
