use anyhow::{bail, Context};
use crabshutter::quality::{photo_presets, tiered_photo_presets, video_presets, QualityPreset};
use crabshutter::session::CaptureSession;
use crabshutter::store::{FsMediaStore, MediaStore};
use crabshutter::testing::MockDevice;
use crabshutter::upload::{SimulatedUploader, Uploader};
use crabshutter::{CaptureMode, CrabShutterConfig};
use std::env;
use std::path::{Path, PathBuf};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    crabshutter::init_logging();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: crabshutter-cli <command> [args]");
        eprintln!("Commands: presets, tier-sizes, size, delete, demo, config");
        std::process::exit(1);
    }

    let command = &args[1];
    match command.as_str() {
        "presets" => cmd_presets(&args),
        "tier-sizes" => cmd_tier_sizes(&args),
        "size" => cmd_size(&args).await,
        "delete" => cmd_delete(&args).await,
        "demo" => cmd_demo(&args).await,
        "config" => cmd_config(&args),
        _ => {
            eprintln!("Unknown command: {}", command);
            std::process::exit(1);
        }
    }
}

fn wants_json(args: &[String]) -> bool {
    args.contains(&"--json".to_string())
}

fn print_presets(presets: &[QualityPreset], json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string(presets)?);
    } else {
        for p in presets {
            println!("{} {:<10} {:<28} {}", p.icon, p.id, p.label, p.description);
        }
    }
    Ok(())
}

fn cmd_presets(args: &[String]) -> anyhow::Result<()> {
    // presets [photo|video] [--json]
    let mode = match args.get(2).filter(|a| !a.starts_with("--")) {
        Some(m) => m.parse::<CaptureMode>().map_err(anyhow::Error::msg)?,
        None => CaptureMode::Photo,
    };
    let presets = match mode {
        CaptureMode::Photo => photo_presets(),
        CaptureMode::Video => video_presets(),
    };
    print_presets(&presets, wants_json(args))
}

fn cmd_tier_sizes(args: &[String]) -> anyhow::Result<()> {
    let sizes: Vec<String> = args[2..]
        .iter()
        .filter(|a| !a.starts_with("--"))
        .cloned()
        .collect();
    if sizes.is_empty() {
        eprintln!("Usage: crabshutter-cli tier-sizes <WxH>... [--json]");
        std::process::exit(1);
    }
    let presets = tiered_photo_presets(&sizes).context("no usable picture sizes")?;
    print_presets(&presets, wants_json(args))
}

async fn cmd_size(args: &[String]) -> anyhow::Result<()> {
    if args.len() < 3 {
        eprintln!("Usage: crabshutter-cli size <path>");
        std::process::exit(1);
    }
    let path = Path::new(&args[2]);
    let store = FsMediaStore::new(path.parent().unwrap_or(Path::new(".")));
    let size = store
        .size_of(path)
        .await
        .with_context(|| format!("cannot size {}", path.display()))?;
    println!("{}", size);
    Ok(())
}

async fn cmd_delete(args: &[String]) -> anyhow::Result<()> {
    if args.len() < 3 {
        eprintln!("Usage: crabshutter-cli delete <path>");
        std::process::exit(1);
    }
    let path = Path::new(&args[2]);
    let store = FsMediaStore::new(path.parent().unwrap_or(Path::new(".")));
    store
        .delete(path)
        .await
        .with_context(|| format!("cannot delete {}", path.display()))?;
    println!("OK");
    Ok(())
}

async fn cmd_demo(args: &[String]) -> anyhow::Result<()> {
    // demo [photo|video] [--dir <dir>] [--upload] [--json]
    let mut config = CrabShutterConfig::load_or_default();
    let mut mode = CaptureMode::Photo;
    let mut upload = false;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--dir" => {
                i += 1;
                let dir = args.get(i).context("--dir needs a directory")?;
                config.storage.capture_directory = dir.clone();
            }
            "--upload" => upload = true,
            "--json" => {}
            other => mode = other.parse().map_err(anyhow::Error::msg)?,
        }
        i += 1;
    }
    config.session.default_mode = mode;

    let scratch: PathBuf = env::temp_dir().join(format!("crabshutter-demo-{}", std::process::id()));
    let session = CaptureSession::from_config(
        MockDevice::new(&scratch),
        FsMediaStore::from_config(&config.storage),
        &config,
    )
    .context("invalid configuration")?;

    session.shutter().await.context("shutter failed")?;
    if mode == CaptureMode::Video {
        tokio::time::sleep(session.options().dwell_time).await;
        session.shutter().await.context("stopping the recording failed")?;
    }
    let handoff = session.confirm().await.context("confirm failed")?;
    session.close().await.context("close failed")?;
    let _ = tokio::fs::remove_dir_all(&scratch).await;

    if wants_json(args) {
        println!("{}", serde_json::to_string(&handoff)?);
    } else {
        println!(
            "{} {} ({} bytes)",
            handoff.kind,
            handoff.uri.display(),
            handoff.size_bytes
        );
    }

    if upload {
        let receipt = SimulatedUploader::default()
            .upload(&handoff)
            .await
            .context("upload failed")?;
        println!("uploaded at {}", receipt.uploaded_at.to_rfc3339());
    }
    Ok(())
}

fn cmd_config(args: &[String]) -> anyhow::Result<()> {
    match args.get(2).map(String::as_str) {
        Some("init") => {
            let path = args
                .get(3)
                .map(PathBuf::from)
                .unwrap_or_else(CrabShutterConfig::default_path);
            if path.exists() {
                bail!("{} already exists", path.display());
            }
            CrabShutterConfig::default()
                .save_to_file(&path)
                .with_context(|| format!("cannot write {}", path.display()))?;
            println!("Wrote {}", path.display());
            Ok(())
        }
        _ => {
            eprintln!("Usage: crabshutter-cli config init [path]");
            std::process::exit(1);
        }
    }
}
