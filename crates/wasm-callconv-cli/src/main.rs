use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::{Value, json};
use std::fs;
use std::path::{Path, PathBuf};

use wasm_callconv::{
    ArgumentLocation, CallInformation, CallRole, ConventionKind, Conventions, FunctionSignature,
    StackBase, Target, ValueLocation,
};

#[derive(Parser)]
#[command(name = "wasm-callconv")]
#[command(about = "Inspect WebAssembly calling-convention layouts")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lay out a single signature such as "(i32, f64) -> (i64)".
    Layout {
        #[arg(help = "Function signature")]
        signature: String,

        #[command(flatten)]
        options: LayoutOptions,
    },
    /// Lay out every function of a module.
    Module {
        #[arg(help = "Input WASM or WAT file")]
        input: PathBuf,

        #[command(flatten)]
        options: LayoutOptions,
    },
    /// List the built-in targets and their conventions.
    Targets,
}

#[derive(clap::Args)]
struct LayoutOptions {
    #[arg(short, long, help = "Target name (defaults to the host)")]
    target: Option<String>,

    #[arg(short, long, default_value = "wasm", help = "Calling convention: wasm, js or c")]
    convention: ConventionKind,

    #[arg(short, long, value_enum, default_value_t = Role::Caller)]
    role: Role,

    #[arg(long, help = "Print the layout as JSON")]
    json: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Role {
    Caller,
    Callee,
}

impl From<Role> for CallRole {
    fn from(role: Role) -> Self {
        match role {
            Role::Caller => CallRole::Caller,
            Role::Callee => CallRole::Callee,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Layout { signature, options } => {
            let signature: FunctionSignature = signature.parse().context("Bad signature")?;
            let conventions = Conventions::new(resolve_target(options.target.as_deref())?);
            let table = conventions.get(options.convention)?;
            anyhow::ensure!(
                !signature.has_vector() || table.supports_vectors(),
                "v128 values cannot cross the {} calling convention on {}",
                options.convention,
                conventions.target().name
            );
            let info = table.call_information_for(&signature, options.role.into());
            let target = conventions.target();

            if options.json {
                let report = layout_json(target, &signature, &info);
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_layout(target, &signature, &info);
            }
        }
        Commands::Module { input, options } => {
            let wasm = read_wasm(&input)?;
            let module = wasm_callconv::module_signatures(&wasm)
                .with_context(|| format!("Failed to read signatures from {}", input.display()))?;
            let conventions = Conventions::new(resolve_target(options.target.as_deref())?);
            let table = conventions.get(options.convention)?;
            let target = conventions.target();

            let mut functions = Vec::new();
            for (index, &type_index) in module.function_types.iter().enumerate() {
                let Some(signature) = module.signature(type_index) else {
                    anyhow::bail!("function {index} uses non-function type {type_index}");
                };
                if signature.has_vector() && !table.supports_vectors() {
                    tracing::warn!(index, %signature, "skipping function with v128 values");
                    continue;
                }
                let info = table.call_information_for(signature, options.role.into());
                if options.json {
                    let mut entry = layout_json(target, signature, &info);
                    entry["function"] = json!(index);
                    entry["type"] = json!(type_index);
                    functions.push(entry);
                } else {
                    println!("func {index} (type {type_index})");
                    print_layout(target, signature, &info);
                    println!();
                }
            }
            if options.json {
                println!("{}", serde_json::to_string_pretty(&Value::Array(functions))?);
            }
        }
        Commands::Targets => {
            for target in Target::all() {
                let conventions: Vec<&str> = ConventionKind::ALL
                    .into_iter()
                    .filter(|&kind| target.supports(kind))
                    .map(ConventionKind::name)
                    .collect();
                println!(
                    "{:<8} {}-bit pointers, conventions: {}",
                    target.name,
                    target.pointer_size * 8,
                    conventions.join(", ")
                );
            }
        }
    }

    Ok(())
}

fn resolve_target(name: Option<&str>) -> Result<&'static Target> {
    match name {
        Some(name) => Ok(Target::lookup(name)?),
        None => Target::host().context("Host is not a built-in target; pass --target"),
    }
}

fn read_wasm(path: &Path) -> Result<Vec<u8>> {
    let contents = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;

    if path.extension().is_some_and(|e| e == "wat") {
        wat::parse_bytes(&contents)
            .map(std::borrow::Cow::into_owned)
            .map_err(|e| anyhow::anyhow!("WAT parse error: {e}"))
    } else {
        Ok(contents)
    }
}

fn print_layout(target: &Target, signature: &FunctionSignature, info: &CallInformation) {
    println!("signature: {signature}");
    println!("  this     {}", target.describe(&info.this_argument));
    for (i, (kind, loc)) in signature.params().iter().zip(&info.params).enumerate() {
        println!("  param {i:<2} {:<9} {}", kind.to_string(), target.describe(loc));
    }
    for (i, (kind, loc)) in signature.results().iter().zip(&info.results).enumerate() {
        println!("  result {i:<2} {:<8} {}", kind.to_string(), target.describe(loc));
    }
    println!(
        "  frame: {} bytes, {} stack values",
        info.header_and_argument_stack_size, info.number_of_stack_values
    );
}

fn location_json(target: &Target, loc: &ArgumentLocation) -> Value {
    let mut value = match loc.location {
        ValueLocation::Register(reg) => json!({
            "kind": "register",
            "register": target.reg_name(reg),
        }),
        ValueLocation::Stack(slot) => json!({
            "kind": "stack",
            "offset": slot.offset,
            "base": match slot.base {
                StackBase::CallerStackPointer => "sp",
                StackBase::CalleeFrame => "fp",
            },
        }),
    };
    value["width"] = json!(loc.width.bits());
    value["used_width"] = json!(loc.used_width.bits());
    value
}

fn layout_json(target: &Target, signature: &FunctionSignature, info: &CallInformation) -> Value {
    let values = |kinds: &[wasm_callconv::ValueKind], locs: &[ArgumentLocation]| -> Vec<Value> {
        kinds
            .iter()
            .zip(locs)
            .map(|(kind, loc)| {
                let mut value = location_json(target, loc);
                value["type"] = json!(kind.to_string());
                value
            })
            .collect()
    };

    json!({
        "target": target.name,
        "signature": signature.to_string(),
        "this": location_json(target, &info.this_argument),
        "params": values(signature.params(), &info.params),
        "results": values(signature.results(), &info.results),
        "header_and_argument_stack_size": info.header_and_argument_stack_size,
        "number_of_stack_values": info.number_of_stack_values,
    })
}
