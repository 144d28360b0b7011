//! Headless world streaming driver.
//!
//! Usage: cargo run --release -- [OPTIONS]
//!
//! Options:
//!   --config <FILE>      Streaming config JSON (default: built-in defaults)
//!   --atlas-dir <DIR>    Build the block atlas from the PNG tiles in DIR
//!   --atlas-out <DIR>    Write the composed atlas image to DIR
//!   --steps <N>          Number of world updates to run (default: 32)
//!   --speed <UNITS>      Loader movement per update in world units (default: 6.0)

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

use glam::{Vec2, Vec3};

use voxstream::core::{Result, logging};
use voxstream::render::{HeadlessDevice, RenderResources, Shader, SubTexture, TextureAtlas};
use voxstream::scene::{EntityRegistry, Scene};
use voxstream::streaming::{StreamingConfig, WorldStreamer};

fn main() -> ExitCode {
    logging::init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let config_path = parse_path_arg(&args, "--config");
    let atlas_dir = parse_path_arg(&args, "--atlas-dir");
    let atlas_out = parse_path_arg(&args, "--atlas-out");
    let steps = parse_u32_arg(&args, "--steps").unwrap_or(32);
    let speed = parse_f32_arg(&args, "--speed").unwrap_or(6.0);

    let config = match &config_path {
        Some(path) => StreamingConfig::load(path)?,
        None => StreamingConfig::default(),
    };

    let atlas = match &atlas_dir {
        Some(dir) => {
            let (atlas, image) = TextureAtlas::from_directory(config.atlas.clone(), dir)?;
            if let Some(out) = &atlas_out {
                atlas.save_image(&image, out)?;
            }
            atlas
        }
        // One tile covering the whole atlas
        None => TextureAtlas::new(config.atlas.clone()).with_entry(
            config.block_textures.default.clone(),
            SubTexture::new(Vec2::ZERO, Vec2::ONE),
        ),
    };

    let mut resources = RenderResources::new();
    resources.register_shader(Shader::new(config.shader.clone(), "Shader/Default"));
    resources.register_atlas(atlas);

    let scene = Arc::new(Scene::new());
    let device = Arc::new(HeadlessDevice::new());
    let mut streamer =
        WorldStreamer::new(config, Arc::clone(&scene), Arc::new(resources), device.clone())?;

    let direction = Vec3::new(1.0, 0.0, 0.5).normalize();
    let start = Instant::now();
    let mut generated = 0usize;
    let mut unloaded = 0usize;
    let mut failed = 0usize;

    for step in 0..steps {
        let loader = direction * speed * step as f32;
        let report = streamer.tick(loader)?;
        generated += report.generated.len();
        unloaded += report.unloaded.len();
        failed += report.failed.len();
    }

    println!("=== World streaming summary ===");
    println!("Updates:   {}", steps);
    println!("Generated: {}", generated);
    println!("Unloaded:  {}", unloaded);
    println!("Failed:    {}", failed);
    println!("Resident:  {} chunks, {} entities", streamer.loaded_count(), scene.len());
    println!("Uploads:   {} ({} live meshes)", device.upload_count(), device.live_mesh_count());
    println!("Time:      {:.2}s", start.elapsed().as_secs_f64());

    streamer.shutdown();
    Ok(())
}

fn parse_f32_arg(args: &[String], flag: &str) -> Option<f32> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
}

fn parse_u32_arg(args: &[String], flag: &str) -> Option<u32> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
}

fn parse_path_arg(args: &[String], flag: &str) -> Option<PathBuf> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(PathBuf::from)
}
