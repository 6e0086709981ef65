use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::Context;
use log::info;

use cordl_templates::data::{NodeType, Parm, SymbolTable};
use cordl_templates::diagnostics::LoggingSink;
use cordl_templates::engine::locator::instantiation_key;
use cordl_templates::engine::{Locator, arg_preparer, template_expand};

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a fixture `Tree` (node 0 is the primary template) and print
    /// its node count, as a sanity check that a JSON round trip preserved
    /// structure.
    #[cfg(feature = "fixtures")]
    Inspect {
        #[clap(value_parser)]
        fixture: PathBuf,
    },
    /// Load a fixture `Tree`, locate the best match for `name<args>`, run
    /// the expander against it, and print the resulting node count and
    /// instance name.
    #[cfg(feature = "fixtures")]
    Instantiate {
        #[clap(value_parser)]
        fixture: PathBuf,
        /// The primary template's declared name, as stored on node 0.
        #[clap(long)]
        name: String,
        /// Concrete argument type strings, comma-separated.
        #[clap(long, value_delimiter = ',')]
        args: Vec<String>,
        /// The `%template(...)` instance name.
        #[clap(long)]
        symname: Option<String>,
    },
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    pretty_env_logger::formatted_builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let cli = Cli::parse();
    match cli.command {
        #[cfg(feature = "fixtures")]
        Commands::Inspect { fixture } => run_inspect(&fixture)?,
        #[cfg(feature = "fixtures")]
        Commands::Instantiate {
            fixture,
            name,
            args,
            symname,
        } => run_instantiate(&fixture, &name, &args, symname.as_deref())?,
    }
    Ok(())
}

#[cfg(feature = "fixtures")]
fn run_inspect(fixture: &std::path::Path) -> color_eyre::Result<()> {
    let tree = cordl_templates::fixtures::load_tree(fixture)
        .with_context(|| format!("failed to load fixture {}", fixture.display()))?;
    info!("loaded {} node(s) from {}", tree.len(), fixture.display());
    Ok(())
}

#[cfg(feature = "fixtures")]
fn run_instantiate(
    fixture: &std::path::Path,
    name: &str,
    args: &[String],
    symname: Option<&str>,
) -> color_eyre::Result<()> {
    let mut tree = cordl_templates::fixtures::load_tree(fixture)
        .with_context(|| format!("failed to load fixture {}", fixture.display()))?;

    const PRIMARY: usize = 0;
    if tree.get(PRIMARY).node_type != NodeType::Template {
        color_eyre::eyre::bail!("node 0 of {} is not a template node", fixture.display());
    }

    let mut symbols = SymbolTable::new();
    let global = symbols.global();
    let declared_name = tree
        .get(PRIMARY)
        .get_str("name")
        .unwrap_or(name)
        .to_string();
    symbols.declare(global, declared_name, PRIMARY);

    let instantiated: Vec<Parm> = args.iter().map(|a| Parm::anonymous(a.clone())).collect();
    let tparms = arg_preparer::expand_template_parms(&instantiated, tree.get(PRIMARY));

    let mut sink = LoggingSink;
    let key = instantiation_key(name, &tparms, &symbols, Some(global));
    let Some(chosen) = Locator::locate(name, &tparms, symname, Some(global), &mut tree, &symbols, &mut sink) else {
        color_eyre::eyre::bail!("could not locate a match for {name}");
    };

    // Clone before mutating: `chosen` is the primary or partial declaration
    // itself and must survive intact for a later instantiation.
    let instance = tree.clone_subtree(chosen);
    let rname = symname.unwrap_or(name);
    template_expand(&mut tree, instance, rname, tparms, Some(global), &symbols);

    let record = tree.alloc(NodeType::Other("instance".to_string()));
    tree.get_mut(record).set_node_ref("template", instance);
    tree.get_mut(record).set_bool("named_instantiation", symname.is_some());
    tree.get_mut(record).set_str("name", rname);
    symbols.declare(global, key, record);

    info!(
        "instantiated {} node(s); instance name = {:?}",
        tree.len(),
        tree.get(instance).get_str("sym:name")
    );
    Ok(())
}
