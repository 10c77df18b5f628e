use crate::errors::CliError;
use crate::println_pad;
use crate::utils::config::AppConfig;
use crate::utils::validate_output_name;
use camino::{Utf8Path, Utf8PathBuf};
use clap::ValueEnum;
use colored::Colorize;
use miette::IntoDiagnostic;
use rmx_texture::CollisionPolicy;
use rmx_usda::{ModBuildResult, ModBuilder, DEFAULT_OUTPUT_NAME, DEFAULT_ROOT_DOCUMENT};

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum CollisionPolicyArg {
    /// Keep the first group with a given identity and drop the rest
    KeepFirst,
    /// Fail the run on the first identity collision
    Error,
}

impl From<CollisionPolicyArg> for CollisionPolicy {
    fn from(arg: CollisionPolicyArg) -> Self {
        match arg {
            CollisionPolicyArg::KeepFirst => CollisionPolicy::KeepFirst,
            CollisionPolicyArg::Error => CollisionPolicy::Error,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct GenerateArgs {
    pub directory: String,
    pub output: Option<String>,
    pub generate_hashes: bool,
    pub multiple_files: bool,
    pub filter_hashes: bool,
    pub sublayers: bool,
    pub reference_directory: Option<String>,
    pub recursive: bool,
    pub collision_policy: Option<CollisionPolicyArg>,
    pub json: bool,
}

/// Flags merged with the config file, ready to hand to the builder.
#[derive(Debug, Clone, PartialEq)]
struct ResolvedArgs {
    directory: Utf8PathBuf,
    output: String,
    root_document: String,
    reference_directory: Option<Utf8PathBuf>,
    recursive: bool,
    collision_policy: CollisionPolicy,
}

fn resolve_args(args: &GenerateArgs, cfg: &AppConfig) -> miette::Result<ResolvedArgs> {
    let directory = Utf8PathBuf::from(&args.directory);
    if !directory.is_dir() {
        return Err(CliError::invalid_directory(directory).into());
    }

    let reference_directory = args
        .reference_directory
        .as_ref()
        .map(Utf8PathBuf::from)
        .or_else(|| cfg.reference_directory.clone());
    if let Some(reference) = &reference_directory {
        if !reference.is_dir() {
            return Err(CliError::invalid_directory(reference.clone()).into());
        }
    }

    let output = args
        .output
        .clone()
        .or_else(|| cfg.output.clone())
        .unwrap_or_else(|| DEFAULT_OUTPUT_NAME.to_string());
    validate_output_name(&output)?;

    Ok(ResolvedArgs {
        directory,
        output,
        root_document: cfg
            .root_document
            .clone()
            .unwrap_or_else(|| DEFAULT_ROOT_DOCUMENT.to_string()),
        reference_directory,
        recursive: args.recursive || cfg.recursive.unwrap_or(false),
        collision_policy: args
            .collision_policy
            .map(CollisionPolicy::from)
            .or(cfg.collision_policy)
            .unwrap_or_default(),
    })
}

pub fn generate_mod(args: GenerateArgs, cfg: &AppConfig) -> miette::Result<()> {
    let resolved = resolve_args(&args, cfg)?;

    let result = ModBuilder::new(resolved.directory.clone())
        .with_output_name(resolved.output)
        .with_root_document(resolved.root_document)
        .with_hashing(args.generate_hashes)
        .with_hash_filter(args.filter_hashes)
        .with_sharded(args.multiple_files)
        .with_sublayers(args.sublayers)
        .with_recursive(resolved.recursive)
        .with_reference_dir(resolved.reference_directory)
        .with_collision_policy(resolved.collision_policy)
        .build()
        .map_err(CliError::from)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result).into_diagnostic()?);
    } else {
        print_summary(&result);
    }

    Ok(())
}

fn display_path<'a>(root: &Utf8Path, path: &'a Utf8Path) -> &'a str {
    path.strip_prefix(root).unwrap_or(path).as_str()
}

fn print_summary(result: &ModBuildResult) {
    println_pad!(
        "{} {}",
        "🎨 Materials:".bright_blue().bold(),
        format!("{} from {} textures", result.materials, result.textures).bright_cyan().bold()
    );

    if !result.created.is_empty() || !result.modified.is_empty() {
        println_pad!("\n{}", "📄 Documents:".bright_magenta().bold());
        for path in &result.created {
            println_pad!(
                "   {} {} {}",
                "•".bright_cyan(),
                display_path(&result.target_dir, path).bright_white().bold(),
                "(created)".bright_green()
            );
        }
        for path in &result.modified {
            println_pad!(
                "   {} {} {}",
                "•".bright_cyan(),
                display_path(&result.target_dir, path).bright_white().bold(),
                "(modified)".bright_yellow()
            );
        }
    }

    if let Some(stitch) = &result.stitch {
        if stitch.appended.is_empty() {
            println_pad!(
                "\n{} {}",
                "🧵 Sublayers:".bright_magenta().bold(),
                "already up to date".dimmed()
            );
        } else {
            println_pad!("\n{}", "🧵 Sublayers added:".bright_magenta().bold());
            for reference in &stitch.appended {
                println_pad!("   {} {}", "•".bright_cyan(), reference.bright_white());
            }
        }
    }

    if !result.collisions.is_empty() {
        println_pad!("\n{}", "⚠️  Identity collisions:".bright_yellow().bold());
        for collision in &result.collisions {
            println_pad!(
                "   {} {} {} {}",
                "•".bright_yellow(),
                collision.dropped.bright_white().bold(),
                format!("dropped, same identity as '{}'", collision.kept).dimmed(),
                format!("({})", collision.key).dimmed()
            );
        }
    }

    if !result.filtered.is_empty() {
        println_pad!("\n{}", "🚫 Filtered (not a hash):".bright_yellow().bold());
        for filtered in &result.filtered {
            println_pad!(
                "   {} {}",
                "•".bright_yellow(),
                filtered.base_name.bright_white()
            );
        }
    }

    println_pad!(
        "\n{}",
        format!("✓ Done in {:.2?}", result.build_time).bright_green().bold()
    );
}
