use clap::builder::{styling::AnsiColor, Styles};
use clap::ColorChoice;
use clap::{ArgAction, CommandFactory, FromArgMatches, Parser, Subcommand};
use commands::{
    generate_mod, inspect_texture, reset_config, show_config, CollisionPolicyArg, GenerateArgs,
    InspectTextureArgs,
};
use miette::Result;
use tracing_subscriber::EnvFilter;

mod commands;
mod errors;
mod utils;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Increase log output (-v for info, -vv for debug). RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate material override layers for a directory of textures
    Generate {
        /// The directory containing the .dds textures
        #[arg(short, long)]
        directory: String,

        /// Base name of the generated .usda files
        #[arg(short, long)]
        output: Option<String>,

        /// Key materials by the hash of each texture's mip 0 instead of its file name
        #[arg(short, long)]
        generate_hashes: bool,

        /// Write one layer per texture role next to the base layer
        #[arg(short, long)]
        multiple_files: bool,

        /// Skip textures whose identity is not a 16 digit hex hash
        #[arg(short, long)]
        filter_hashes: bool,

        /// Add the per-role layers to the root layer's subLayers
        #[arg(short, long)]
        sublayers: bool,

        /// Hash identity textures from this directory instead (e.g. the originals of upscaled textures)
        #[arg(short, long)]
        reference_directory: Option<String>,

        /// Also pick up textures in subdirectories
        #[arg(long)]
        recursive: bool,

        /// What to do when two base names share an identity
        #[arg(long, value_enum)]
        collision_policy: Option<CollisionPolicyArg>,

        /// Print the run report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the header and identity of a .dds texture
    Inspect {
        /// The path to the texture file
        file_path: String,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show or reset remix-mod.toml
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the current configuration
    Show,
    /// Reset the configuration to defaults
    Reset,
}

fn parse_args() -> Args {
    // Configure colored/styled help output
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default())
        .placeholder(AnsiColor::Blue.on_default());

    let matches = Args::command()
        .styles(styles)
        .color(ColorChoice::Auto)
        .get_matches();

    Args::from_arg_matches(&matches).unwrap_or_else(|e| e.exit())
}

fn default_log_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "warn,remix_mod=info,rmx_texture=info,rmx_usda=info",
        _ => "info,remix_mod=debug,rmx_texture=debug,rmx_usda=debug",
    }
}

fn init_logging(verbose: u8) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| default_log_filter(verbose).into());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = parse_args();
    init_logging(args.verbose);

    let cfg = utils::config::load_config();

    match args.command {
        Commands::Generate {
            directory,
            output,
            generate_hashes,
            multiple_files,
            filter_hashes,
            sublayers,
            reference_directory,
            recursive,
            collision_policy,
            json,
        } => generate_mod(
            GenerateArgs {
                directory,
                output,
                generate_hashes,
                multiple_files,
                filter_hashes,
                sublayers,
                reference_directory,
                recursive,
                collision_policy,
                json,
            },
            &cfg,
        ),
        Commands::Inspect { file_path, json } => {
            inspect_texture(InspectTextureArgs { file_path, json })
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => show_config(),
            ConfigAction::Reset => reset_config(),
        },
    }
}
