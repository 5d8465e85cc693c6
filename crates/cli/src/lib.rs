//! Command-line companion for the viewer.
//!
//! Besides launching the desktop app, it exposes the engine for scripted
//! use (metadata, page rasters) and carries the two pieces of repository
//! tooling: the icon generator and the environment check.

mod icon;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use paperdesk_engine::{default_engine, OpenSource, PdfEngine, RenderRequest};
use serde::Serialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

#[derive(Debug, Parser)]
#[command(name = "paperdesk-cli")]
#[command(about = "Paperdesk CLI")]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Open a PDF in the desktop app.
    Open {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Print machine-readable PDF metadata.
    Info {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Render one page to a PNG.
    RenderPage {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// 1-based page number.
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// Zoom percent; 100 renders one pixel per point.
        #[arg(long, default_value_t = 100)]
        zoom: u16,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Generate the application icon files.
    GenIcon {
        /// Directory the icon files are written to.
        #[arg(long, default_value = ".")]
        output: PathBuf,
    },
    /// Check the environment the viewer will run in.
    Doctor,
    /// Print CLI version.
    Version,
}

#[derive(Debug, Serialize)]
struct InfoOutput {
    path: String,
    page_count: u32,
    first_page_size_pt: Option<PageSizeOutput>,
}

#[derive(Debug, Serialize)]
struct PageSizeOutput {
    width: f32,
    height: f32,
}

pub fn run<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);

    match cli.command {
        Commands::Open { file } => run_open(&file),
        Commands::Info { file } => run_info(&file),
        Commands::RenderPage { file, page, zoom, output } => {
            run_render_page(&file, page, zoom, output.as_deref())
        }
        Commands::GenIcon { output } => run_gen_icon(&output),
        Commands::Doctor => run_doctor(),
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn run_open(file: &Path) -> Result<()> {
    ensure_pdf_exists(file)?;

    if std::env::var_os("PAPERDESK_TEST_NO_SPAWN").is_some() {
        println!("open:{}", file.display());
        return Ok(());
    }

    let desktop_bin =
        std::env::var_os("PAPERDESK_APP_BIN").unwrap_or_else(|| OsString::from("paperdesk"));

    let status =
        Command::new(desktop_bin).arg(file).status().context("failed to launch desktop app")?;

    if !status.success() {
        anyhow::bail!("desktop app exited with status {status}");
    }

    Ok(())
}

fn run_info(file: &Path) -> Result<()> {
    ensure_pdf_exists(file)?;

    let mut engine = default_engine();
    let handle = engine.open(OpenSource::from(file)).context("failed to open PDF")?;

    let page_count = engine.page_count(handle)?;
    let first_page_size_pt = if page_count > 0 {
        let size = engine.page_size(handle, 0)?;
        Some(PageSizeOutput { width: size.width_pt, height: size.height_pt })
    } else {
        None
    };

    let payload = InfoOutput { path: file.display().to_string(), page_count, first_page_size_pt };

    let json = serde_json::to_string_pretty(&payload)?;
    println!("{json}");

    engine.close(handle)?;

    Ok(())
}

fn run_render_page(file: &Path, page: u32, zoom: u16, output: Option<&Path>) -> Result<()> {
    ensure_pdf_exists(file)?;

    if page == 0 {
        anyhow::bail!("--page is 1-based and must be >= 1");
    }

    let mut engine = default_engine();
    let handle = engine.open(OpenSource::from(file)).context("failed to open PDF")?;

    let raster = engine
        .render_page(handle, RenderRequest { page_index: page - 1, zoom_percent: zoom })
        .context("failed to render page")?;

    let output = output.map(ToOwned::to_owned).unwrap_or_else(|| default_page_output(file, page));

    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)?;
    }

    raster
        .save(&output)
        .with_context(|| format!("failed to write image to {}", output.display()))?;

    println!("{}", output.display());

    engine.close(handle)?;

    Ok(())
}

fn run_gen_icon(output_dir: &Path) -> Result<()> {
    for path in icon::generate(output_dir)? {
        println!("{}", path.display());
    }

    Ok(())
}

fn run_doctor() -> Result<()> {
    println!("os: {} ({})", std::env::consts::OS, std::env::consts::ARCH);
    println!("geometry backend: available");

    #[cfg(feature = "pdfium")]
    match paperdesk_engine::pdfium::bind_library() {
        Ok(_) => println!("pdfium backend: library found"),
        Err(err) => println!("pdfium backend: unavailable ({err})"),
    }

    #[cfg(not(feature = "pdfium"))]
    println!("pdfium backend: not compiled in");

    Ok(())
}

fn ensure_pdf_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("file does not exist: {}", path.display());
    }

    if !path.is_file() {
        anyhow::bail!("path is not a file: {}", path.display());
    }

    Ok(())
}

fn default_page_output(file: &Path, page: u32) -> PathBuf {
    let stem = file.file_stem().and_then(|name| name.to_str()).unwrap_or("page");

    file.with_file_name(format!("{stem}-page-{page}.png"))
}
