use clap::{Args, Parser, Subcommand};
use hbs_helpers::{expand_template, ComponentDefinition, ComponentOptions, Value};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "hbs")]
#[command(about = "Handlebars template printer and build-time component expander")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse a template and print it back in normalized form
    Print {
        /// Input .hbs file
        path: String,
    },

    /// Check a template for syntax errors without printing it
    Check {
        /// Input .hbs file
        path: String,
    },

    /// Replace every invocation of a component with the element it builds
    Expand {
        /// Input .hbs file
        path: String,

        #[command(flatten)]
        component: ComponentArgs,

        /// Write the result here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args)]
struct ComponentArgs {
    /// Name of the component to expand
    #[arg(short, long)]
    component: String,

    /// Tag of the built element ("" for a tagless component)
    #[arg(long)]
    tag_name: Option<String>,

    /// Static class name (repeatable)
    #[arg(long = "class-name", value_name = "CLASS")]
    class_names: Vec<String>,

    /// Class name binding, `prop[:truthy[:falsy]]` (repeatable)
    #[arg(long = "class-binding", value_name = "BINDING")]
    class_bindings: Vec<String>,

    /// Attribute binding, `prop[:attr[:truthy[:falsy]]]` (repeatable)
    #[arg(long = "attribute-binding", value_name = "BINDING")]
    attribute_bindings: Vec<String>,

    /// Property name for the next positional argument (repeatable)
    #[arg(long = "positional", value_name = "PROP")]
    positional_params: Vec<String>,

    /// Default property value, `key=value` (repeatable)
    #[arg(long = "property", value_name = "KEY=VALUE", value_parser = parse_property)]
    properties: Vec<(String, Value)>,

    /// Template inlined as the element's children
    #[arg(long)]
    layout: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Command::Print { path } => cmd_print(&path),
        Command::Check { path } => cmd_check(&path),
        Command::Expand {
            path,
            component,
            output,
        } => cmd_expand(&path, component, output.as_deref()),
    }
}

/// `true`, `false`, `null` and numbers are typed; anything else is a string.
fn parse_property(arg: &str) -> Result<(String, Value), String> {
    let (key, raw) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{arg}'"))?;
    if key.is_empty() {
        return Err(format!("missing property name in '{arg}'"));
    }
    let value = match raw {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        "null" => Value::Null,
        _ => match raw.parse::<f64>() {
            Ok(n) if n.is_finite() => Value::Number(n),
            _ => Value::String(raw.to_string()),
        },
    };
    Ok((key.to_string(), value))
}

fn read_source(path: &str) -> String {
    let p = Path::new(path);
    if !p.exists() {
        eprintln!("Error: file not found: {path}");
        std::process::exit(1);
    }
    match std::fs::read_to_string(p) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error reading {path}: {e}");
            std::process::exit(1);
        }
    }
}

fn parse(path: &str, source: &str) -> hbs_syntax::Template {
    match hbs_syntax::Parser::parse(source) {
        Ok(template) => template,
        Err(e) => {
            eprintln!("{path}: {e}");
            std::process::exit(1);
        }
    }
}

fn cmd_print(path: &str) {
    let source = read_source(path);
    let template = parse(path, &source);
    println!("{}", hbs_syntax::print(&template));
}

fn cmd_check(path: &str) {
    let source = read_source(path);
    parse(path, &source);
    eprintln!("OK: {path}");
}

fn cmd_expand(path: &str, args: ComponentArgs, output: Option<&Path>) {
    let source = read_source(path);
    let mut template = parse(path, &source);

    let mut definition = ComponentDefinition::new();
    if let Some(layout_path) = &args.layout {
        let layout = read_source(layout_path);
        definition = match definition.layout(&layout) {
            Ok(definition) => definition,
            Err(e) => {
                eprintln!("{layout_path}: {e}");
                std::process::exit(1);
            }
        };
    }

    let options = ComponentOptions {
        tag_name: args.tag_name,
        class_names: args.class_names,
        class_name_bindings: args.class_bindings,
        attribute_bindings: args.attribute_bindings,
        positional_params: args.positional_params,
        properties: args.properties.into_iter().collect(),
    };

    let count = match expand_template(&mut template, &args.component, &definition, &options) {
        Ok(count) => count,
        Err(e) => {
            eprintln!("Component error: {e}");
            std::process::exit(1);
        }
    };

    let printed = hbs_syntax::print(&template);
    match output {
        Some(out) => {
            if let Err(e) = std::fs::write(out, format!("{printed}\n")) {
                eprintln!("Error writing {}: {e}", out.display());
                std::process::exit(1);
            }
            eprintln!("Expanded {count} invocation(s) of {} into {}", args.component, out.display());
        }
        None => println!("{printed}"),
    }
}
