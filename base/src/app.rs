//! Application options

use clap::Parser;
use std::sync::OnceLock;

/// Returns the global application options parsed from the command line.
pub fn options() -> &'static Options {
    static DATA: OnceLock<Options> = OnceLock::new();
    DATA.get_or_init(Options::parse)
}

/// System wide options.
#[derive(Parser, Clone, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct Options {
    /// Number of threads to use for ray batches.
    #[clap(
        long = "nthreads",
        short = 't',
        value_name = "NUM",
        default_value_t = 0,
        help = "Use specified number of threads for ray batches (0 = all logical CPUs)."
    )]
    n_threads: usize,

    /// Image width in pixels.
    #[clap(long, short = 'W', value_name = "NUM", default_value_t = 320)]
    pub width: usize,

    /// Image height in pixels.
    #[clap(long, short = 'H', value_name = "NUM", default_value_t = 240)]
    pub height: usize,

    /// Number of paths traced per pixel for the shaded image.
    #[clap(long = "spp", short = 's', value_name = "NUM", default_value_t = 8)]
    pub samples_per_pixel: usize,

    /// Output path prefix.
    #[clap(
        long = "outfile",
        short = 'o',
        value_name = "PREFIX",
        default_value = "tritrace",
        help = "Write result images to <PREFIX>_<buffer>.png."
    )]
    pub image_prefix: String,

    /// BVH split method.
    #[clap(
        long = "splitmethod",
        value_name = "METHOD",
        default_value = "sah",
        value_parser = ["sah", "middle", "equal"],
        help = "BVH split method."
    )]
    pub split_method: String,

    /// Maximum triangles per BVH leaf.
    #[clap(long = "maxleaftris", value_name = "NUM", default_value_t = 4)]
    pub max_tris_per_leaf: usize,

    /// Suppress all text output other than error messages.
    #[clap(long, help = "Suppress all text output other than error messages.")]
    pub quiet: bool,
}

impl Options {
    /// Returns the number of threads to use.
    pub fn threads(&self) -> usize {
        let max_threads = num_cpus::get();
        match self.n_threads {
            0 => max_threads,
            n if n > max_threads => {
                warn!("Num threads > max logical CPUs {}", max_threads);
                max_threads
            }
            n => n,
        }
    }
}
