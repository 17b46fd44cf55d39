use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use clap::Parser;
use hashbrown::HashMap;
use log::info;
use tessel_mesh::{ChunkConfig, ChunkMesh};
use tessel_proto::PrototypeSet;
use tessel_runtime::{MeshSink, Runtime, TileChunk};

/// Demo driver: randomizes and rebuilds a few chunks against the built-in
/// (or a TOML-loaded) prototype set, logging what each rebuild produced.
#[derive(Parser, Debug)]
#[command(name = "tessel")]
struct Args {
    /// Grid rows per chunk
    #[arg(long, default_value_t = 8)]
    rows: usize,
    /// Grid columns per chunk
    #[arg(long, default_value_t = 8)]
    cols: usize,
    /// Number of independent chunks
    #[arg(long, default_value_t = 2)]
    chunks: u32,
    /// Rebuild cycles per chunk
    #[arg(long, default_value_t = 4)]
    cycles: u32,
    /// Base seed for grid randomization
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Worker threads (defaults to available parallelism, capped at 4)
    #[arg(long)]
    workers: Option<usize>,
    /// Prototype set TOML; the built-in starter set is used when omitted
    #[arg(long)]
    prototypes: Option<PathBuf>,
}

struct LogSink {
    published: usize,
}

impl MeshSink for LogSink {
    fn publish(&mut self, chunk_id: u32, mesh: ChunkMesh) {
        self.published += 1;
        info!(
            "chunk {}: published {} vertices / {} triangles, bbox {:?}..{:?}",
            chunk_id,
            mesh.vertex_count(),
            mesh.triangle_count(),
            mesh.bbox.min,
            mesh.bbox.max
        );
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let protos = Arc::new(match &args.prototypes {
        Some(path) => PrototypeSet::load_from_path(path)?,
        None => PrototypeSet::starter(),
    });
    info!("{} prototypes loaded", protos.len());

    let cfg = ChunkConfig {
        rows: args.rows,
        cols: args.cols,
        ..ChunkConfig::default()
    };
    let workers = args.workers.unwrap_or_else(|| {
        thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4)
            .min(4)
    });
    let rt = Runtime::new(workers);

    let mut chunks: HashMap<u32, TileChunk> = HashMap::new();
    for id in 0..args.chunks {
        chunks.insert(id, TileChunk::new(id, cfg, Arc::clone(&protos))?);
    }

    let mut sink = LogSink { published: 0 };
    let target = args.chunks as usize * args.cycles as usize;
    let mut next_seed = args.seed;

    while sink.published < target {
        for chunk in chunks.values_mut() {
            // refused while that chunk still has a rebuild in flight
            if chunk.request_rebuild(&rt, Some(next_seed)) {
                next_seed = next_seed.wrapping_add(1);
            }
        }
        for out in rt.drain_results() {
            if let Some(chunk) = chunks.get_mut(&out.chunk_id) {
                chunk.absorb(out, &mut sink);
            }
        }
        thread::sleep(Duration::from_millis(2));
    }

    let (queued, inflight) = rt.queue_debug_counts();
    info!(
        "done: {} meshes published ({} queued, {} inflight at exit)",
        sink.published, queued, inflight
    );
    Ok(())
}
