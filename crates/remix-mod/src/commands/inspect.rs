use std::fs::File;
use std::io::BufReader;

use crate::errors::CliError;
use crate::println_pad;
use camino::{Utf8Path, Utf8PathBuf};
use colored::Colorize;
use miette::IntoDiagnostic;
use rmx_texture::{hash_payload, DdsHeader, RoleTable};
use serde::Serialize;

pub struct InspectTextureArgs {
    pub file_path: String,
    pub json: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TextureInfo {
    path: Utf8PathBuf,
    width: u32,
    height: u32,
    format: String,
    pixel_format_flags: u32,
    rgb_bit_count: u32,
    mip0_start: u64,
    mip0_end: u64,
    identity_key: String,
    role: Option<String>,
    base_name: Option<String>,
}

/// Header fields and identity of one texture, read in a single pass.
fn texture_info(path: &Utf8Path) -> miette::Result<TextureInfo> {
    let file = File::open(path).into_diagnostic()?;
    let mut reader = BufReader::new(file);
    let header = DdsHeader::from_reader(&mut reader).into_diagnostic()?;
    let mip0 = header.mip0_range().into_diagnostic()?;
    let key = hash_payload(&header, &mut reader).into_diagnostic()?;

    let classification = path
        .file_name()
        .and_then(|name| RoleTable::remix().classify(name));

    Ok(TextureInfo {
        path: path.to_path_buf(),
        width: header.width,
        height: header.height,
        format: header.format_label(),
        pixel_format_flags: header.pixel_format_flags,
        rgb_bit_count: header.rgb_bit_count,
        mip0_start: mip0.start,
        mip0_end: mip0.end,
        identity_key: key.to_string(),
        role: classification.as_ref().map(|c| c.role.to_string()),
        base_name: classification.map(|c| c.stem),
    })
}

pub fn inspect_texture(args: InspectTextureArgs) -> miette::Result<()> {
    let path = Utf8PathBuf::from(&args.file_path);
    if !path.is_file() {
        return Err(CliError::file_not_found(path).into());
    }

    let info = texture_info(&path)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&info).into_diagnostic()?);
        return Ok(());
    }

    println_pad!(
        "{} {}",
        "🖼️  Texture:".bright_blue().bold(),
        info.path.as_str().bright_cyan().bold()
    );
    println_pad!(
        "{} {}",
        "📐 Size:".bright_green(),
        format!("{}x{}", info.width, info.height).bright_white().bold()
    );
    println_pad!(
        "{} {} {}",
        "🧩 Format:".bright_yellow(),
        info.format.bright_white(),
        format!("(flags: {:#x})", info.pixel_format_flags).dimmed()
    );
    println_pad!(
        "{} {}",
        "📏 Mip 0:".bright_yellow(),
        format!(
            "bytes {}..{} ({} bytes)",
            info.mip0_start,
            info.mip0_end,
            info.mip0_end - info.mip0_start
        )
        .bright_white()
    );
    println_pad!(
        "{} {}",
        "🔑 Identity:".bright_magenta().bold(),
        info.identity_key.bright_white().bold()
    );
    match (&info.role, &info.base_name) {
        (Some(role), Some(base_name)) => println_pad!(
            "{} {} {}",
            "🏷️ Role:".bright_green(),
            role.bright_cyan().bold(),
            format!("(base name: {})", base_name).dimmed()
        ),
        _ => println_pad!(
            "{} {}",
            "🏷️ Role:".bright_green(),
            "not a recognized texture name".dimmed()
        ),
    }

    Ok(())
}
