mod cli;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};

use tonearm::{catalog::MemoryCatalog, config, scanner::Scanner, server};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging. Respect RUST_LOG if set, otherwise use defaults
    // based on the verbose flag.
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "tonearm=trace,tonearm_av=trace,tower_http=debug".to_string()
        } else {
            "tonearm=debug,tonearm_av=debug,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    let rt = tokio::runtime::Runtime::new()?;
    match cli.command {
        Commands::Serve { host, port } => {
            rt.block_on(serve(cli.config.as_deref(), host, port))
        }
        Commands::Scan => rt.block_on(scan(cli.config.as_deref())),
        Commands::Probe { files } => rt.block_on(probe_files(cli.config.as_deref(), files)),
        Commands::CheckTools => check_tools(cli.config.as_deref()),
    }
}

async fn serve(
    config_path: Option<&Path>,
    host: Option<String>,
    port: Option<u16>,
) -> Result<()> {
    let mut config = config::load_config_or_default(config_path)?;
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    tracing::info!("Starting Tonearm server");

    let config = Arc::new(config);
    let catalog = Arc::new(MemoryCatalog::new());

    let scanner = Scanner::new(config.clone(), catalog.clone());
    let summary = scanner.scan().await?;
    tracing::info!(
        "Library ready: {} tracks ({} files skipped)",
        summary.tracks_added,
        summary.files_skipped
    );

    server::start_server(config.as_ref().clone(), catalog).await
}

async fn scan(config_path: Option<&Path>) -> Result<()> {
    let config = Arc::new(config::load_config_or_default(config_path)?);
    let catalog = Arc::new(MemoryCatalog::new());

    let scanner = Scanner::new(config.clone(), catalog);
    let summary = scanner.scan().await?;

    println!("Files found:   {}", summary.files_found);
    println!("Tracks added:  {}", summary.tracks_added);
    println!("Files skipped: {}", summary.files_skipped);
    Ok(())
}

async fn probe_files(config_path: Option<&Path>, files: Vec<PathBuf>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;

    let metadata =
        tonearm_av::extract_all_metadata(&config.transcoding.probe_command, &files).await?;

    for path in &files {
        match metadata.get(path) {
            Some(md) => {
                println!("{}", path.display());
                println!("  Title:    {}", md.title());
                println!("  Artist:   {}", md.artist());
                println!("  Album:    {}", md.album());
                if !md.album_artist().is_empty() {
                    println!("  Album artist: {}", md.album_artist());
                }
                if !md.genre().is_empty() {
                    println!("  Genre:    {}", md.genre());
                }
                if md.year() > 0 {
                    println!("  Year:     {}", md.year());
                }
                let (track_num, track_total) = md.track_number();
                if track_num > 0 {
                    println!("  Track:    {}/{}", track_num, track_total);
                }
                let secs = md.duration();
                println!(
                    "  Duration: {:02}:{:02}:{:02}",
                    secs / 3600,
                    (secs / 60) % 60,
                    secs % 60
                );
                println!("  Bitrate:  {} kbps", md.bit_rate());
                println!("  Size:     {} bytes", md.size());
                if md.has_picture() {
                    println!("  Embedded cover art");
                }
            }
            None => println!("{}: not a recognized media file", path.display()),
        }
    }
    Ok(())
}

fn check_tools(config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;

    println!("Checking configured external tools...\n");

    let commands = [
        ("probe", &config.transcoding.probe_command),
        ("transcode", &config.transcoding.transcode_command),
    ];

    let mut all_ok = true;
    for (role, template) in commands {
        let Some(program) = template.split_whitespace().next() else {
            println!("✗ {} command template is empty", role);
            all_ok = false;
            continue;
        };

        let info = tonearm_av::check_tool(program);
        let status = if info.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {} ({})", status, program, role);
        if let Some(ref version) = info.version {
            print!(" - {}", version);
        }
        if let Some(ref path) = info.path {
            print!(" - {}", path.display());
        }
        println!();
    }

    println!();
    if all_ok {
        println!("All configured tools are available!");
    } else {
        println!("Some tools are missing. Install them or adjust the command templates.");
    }

    Ok(())
}
