//! qexplorer command-line interface
//!
//! Builds and inspects qexplorer project documents: Kerr-oscillator modes,
//! their couplings, pulse sequences and the simulations that drive them.
//!
//! ```text
//! qexplorer new cat.yaml --modes 2
//! qexplorer set cat.yaml Modes/Mode anharmonicity "-chi/2" --define chi=0.2
//! qexplorer model cat.yaml Simulation
//! ```

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{add, define, model, new, remove, set, show, step, version};

/// qexplorer - build and inspect driven Kerr-oscillator projects
#[derive(Parser)]
#[command(name = "qexplorer")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new project document
    New {
        /// Project file (.yaml, .yml or .json)
        project: String,

        /// Number of modes to start with
        #[arg(short, long, default_value = "0")]
        modes: usize,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Print the project tree
    Show {
        /// Project file
        project: String,
    },

    /// Add an item to a collection
    Add {
        /// Project file
        project: String,

        /// Collection name (e.g. Modes, Pulses, Outputs)
        collection: String,

        /// Item kind for collections holding several (Pulse/Wait, Wigner/Expectation)
        #[arg(short, long)]
        kind: Option<String>,

        /// Name for the new item
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Append a step to a sequence, or remove one
    Step {
        /// Project file
        project: String,

        /// Sequence name
        sequence: String,

        /// Pulse the new step points at (first pulse if omitted)
        #[arg(short, long)]
        pulse: Option<String>,

        /// Remove the step at this position instead
        #[arg(long, conflicts_with = "pulse")]
        remove: Option<usize>,
    },

    /// Set a field of an item (key `name` renames it)
    Set {
        /// Project file
        project: String,

        /// Item, as `Name` or `Collection/Name`
        item: String,

        /// Field key (e.g. frequency, decay, mode_1)
        key: String,

        /// Raw value: a number, formula, choice or item name
        value: String,

        /// Values for variables the formula introduces (name=value)
        #[arg(short, long = "define")]
        defines: Vec<String>,

        /// Ask on the terminal for variables not given with --define
        #[arg(short, long)]
        interactive: bool,
    },

    /// Remove an item that nothing references
    Remove {
        /// Project file
        project: String,

        /// Item, as `Name` or `Collection/Name`
        item: String,
    },

    /// Define, change or remove a formula variable
    Define {
        /// Project file
        project: String,

        /// Variable name
        name: String,

        /// New value
        #[arg(allow_negative_numbers = true, required_unless_present = "remove")]
        value: Option<f64>,

        /// Remove the variable
        #[arg(long, conflicts_with = "value")]
        remove: bool,
    },

    /// Print the system model and compute plan of a simulation
    Model {
        /// Project file
        project: String,

        /// Simulation name
        simulation: String,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Show version information
    Version,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();

    let result = match cli.command {
        Commands::New {
            project,
            modes,
            force,
        } => new::execute(&project, modes, force),

        Commands::Show { project } => show::execute(&project),

        Commands::Add {
            project,
            collection,
            kind,
            name,
        } => add::execute(&project, &collection, kind.as_deref(), name.as_deref()),

        Commands::Step {
            project,
            sequence,
            pulse,
            remove,
        } => step::execute(&project, &sequence, pulse.as_deref(), remove),

        Commands::Set {
            project,
            item,
            key,
            value,
            defines,
            interactive,
        } => set::execute(&project, &item, &key, &value, &defines, interactive),

        Commands::Remove { project, item } => remove::execute(&project, &item),

        Commands::Define {
            project,
            name,
            value,
            remove,
        } => define::execute(&project, &name, value, remove),

        Commands::Model {
            project,
            simulation,
            json,
        } => model::execute(&project, &simulation, json),

        Commands::Version => {
            version::execute();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}
