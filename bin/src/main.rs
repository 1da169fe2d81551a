#[macro_use]
extern crate log;

mod camera;
mod demo_scene;
mod image_io;
mod render;

use accelerators::{SplitMethod, TriTree, TriTreeSettings};
use base::app::{options, Options};
use base::geometry::{Point3f, Vector3f};
use base::gpu::ImageStorage;
use base::parallel::set_thread_count;
use base::{print_stats, report_stats};
use camera::PinholeCamera;
use demo_scene::{demo_scene, EYE, LIGHT, TARGET};
use image_io::{write_mask, write_png};
use std::time::Instant;

#[cfg(all(feature = "dhat-rs", feature = "jemalloc"))]
compile_error!("feature 'dhat-rs' and feature 'jemalloc' cannot be enabled at the same time");

#[cfg(feature = "dhat-rs")]
use dhat::{Dhat, DhatAlloc};

#[cfg(feature = "dhat-rs")]
#[global_allocator]
static ALLOCATOR: DhatAlloc = DhatAlloc;

#[cfg(feature = "jemalloc")]
#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(feature = "jemalloc")]
#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static ALLOCATOR: Jemalloc = Jemalloc;

/// Maximum number of surface interactions per path.
const MAX_DEPTH: usize = 5;

fn main() {
    #[cfg(feature = "dhat-rs")]
    let _dhat = Dhat::start_heap_profiling();

    // Initialize `env_logger`.
    env_logger::init();

    let options = options();
    set_thread_count(options.threads());

    // In case of error report it.
    if let Err(e) = render(options) {
        error!("{e}");
    }

    report_stats!();
    if !options.quiet {
        print_stats!();
    }
}

fn render(options: &Options) -> Result<(), String> {
    let max_tris_per_leaf = u8::try_from(options.max_tris_per_leaf)
        .ok()
        .filter(|&n| n > 0)
        .ok_or(format!("--maxleaftris must be in 1..=255, got {}", options.max_tris_per_leaf))?;
    let settings = TriTreeSettings {
        split_method: options.split_method.parse::<SplitMethod>()?,
        max_tris_per_leaf,
        compute_prev_position: false,
    };

    let start = Instant::now();
    let tree = TriTree::new(settings);
    tree.set_contents_from_scene(&demo_scene(), ImageStorage::CopyToCpu);
    info!("Indexed {} triangles in {:.2?}", tree.size(), start.elapsed());

    let camera = PinholeCamera::look_at(
        Point3f::from(EYE),
        Point3f::from(TARGET),
        Vector3f::new(0.0, 1.0, 0.0),
        45.0,
        options.width,
        options.height,
    );
    let (width, height) = (camera.width(), camera.height());
    let prefix = &options.image_prefix;

    let start = Instant::now();
    let gbuffer = render::trace_gbuffer(&tree, &camera);
    for (field, pixels) in render::gbuffer_images(&gbuffer, &tree.bounds()) {
        write_png(&format!("{prefix}_{}.png", field.name()), &pixels, width, height)?;
    }
    let mask = render::shadow_mask(&tree, &gbuffer, &Point3f::from(LIGHT));
    write_mask(&format!("{prefix}_shadow.png"), &mask, width, height)?;
    info!("Wavefront passes took {:.2?}", start.elapsed());

    let start = Instant::now();
    let shaded = render::path_trace(&tree, &camera, options.samples_per_pixel, MAX_DEPTH);
    write_png(&format!("{prefix}_shaded.png"), &shaded, width, height)?;
    info!(
        "Path traced {} samples per pixel in {:.2?}",
        options.samples_per_pixel,
        start.elapsed()
    );

    Ok(())
}
