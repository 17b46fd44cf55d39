//! Rebuild scheduling: keeps chunk mesh assembly off the driver thread and
//! serializes rebuilds per chunk.
#![forbid(unsafe_code)]

use std::error::Error;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use crossbeam_channel::{Receiver, Sender, unbounded};
use log::warn;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tessel_mesh::{BuildError, ChunkConfig, ChunkMesh, ConfigError, GridError, TileGrid,
    build_chunk_mesh};
use tessel_proto::PrototypeSet;
use tessel_tile::{Tile, TileError};

/// Consumer of finished chunk meshes. Called at most once per completed
/// rebuild; the buffers are mutually consistent at the moment of the call.
pub trait MeshSink {
    fn publish(&mut self, chunk_id: u32, mesh: ChunkMesh);
}

#[derive(Clone)]
pub struct RebuildJob {
    pub chunk_id: u32,
    pub rev: u64,
    pub grid: TileGrid,
    /// When set, the grid snapshot is re-randomized on the worker before
    /// assembly, seeding a fresh `StdRng`.
    pub randomize_seed: Option<u64>,
    pub protos: Arc<PrototypeSet>,
    pub cfg: ChunkConfig,
}

pub struct RebuildOut {
    pub chunk_id: u32,
    pub rev: u64,
    pub grid: TileGrid,
    pub result: Result<ChunkMesh, RebuildError>,
    pub t_total_ms: u32,
}

/// Worker-side failure carried back in [`RebuildOut`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RebuildError {
    Tile(TileError),
    Build(BuildError),
}

impl fmt::Display for RebuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RebuildError::Tile(e) => write!(f, "randomize failed: {}", e),
            RebuildError::Build(e) => write!(f, "assembly failed: {}", e),
        }
    }
}

impl Error for RebuildError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            RebuildError::Tile(e) => Some(e),
            RebuildError::Build(e) => Some(e),
        }
    }
}

impl From<TileError> for RebuildError {
    fn from(e: TileError) -> Self {
        RebuildError::Tile(e)
    }
}

impl From<BuildError> for RebuildError {
    fn from(e: BuildError) -> Self {
        RebuildError::Build(e)
    }
}

fn process_rebuild_job(job: RebuildJob, tx: &Sender<RebuildOut>) {
    let RebuildJob {
        chunk_id,
        rev,
        mut grid,
        randomize_seed,
        protos,
        cfg,
    } = job;

    let t_start = Instant::now();
    let result: Result<ChunkMesh, RebuildError> = (|| {
        if let Some(seed) = randomize_seed {
            let mut rng = StdRng::seed_from_u64(seed);
            let count = (protos.len() as u32).min(cfg.id_capacity());
            grid.randomize(&mut rng, count, cfg.id_range)?;
        }
        Ok(build_chunk_mesh(&grid, &protos, &cfg)?)
    })();
    let t_total_ms = t_start.elapsed().as_millis().min(u128::from(u32::MAX)) as u32;

    let _ = tx.send(RebuildOut {
        chunk_id,
        rev,
        grid,
        result,
        t_total_ms,
    });
}

/// Worker pool shared by all chunks. Jobs go in over a channel, finished
/// meshes come back out; the driver thread drains results at its own pace.
pub struct Runtime {
    job_tx: Sender<RebuildJob>,
    res_rx: Receiver<RebuildOut>,
    _pool: Arc<ThreadPool>,
    queued: Arc<AtomicUsize>,
    inflight: Arc<AtomicUsize>,
    pub workers: usize,
}

impl Runtime {
    pub fn new(workers: usize) -> Self {
        let workers = workers.max(1);
        let (job_tx, job_rx) = unbounded::<RebuildJob>();
        let (res_tx, res_rx) = unbounded::<RebuildOut>();

        let queued_ctr = Arc::new(AtomicUsize::new(0));
        let inflight_ctr = Arc::new(AtomicUsize::new(0));

        let pool = Arc::new(
            ThreadPoolBuilder::new()
                .num_threads(workers)
                .thread_name(|i| format!("tessel-mesh-{i}"))
                .build()
                .expect("mesh worker pool"),
        );
        for _ in 0..workers {
            let rx = job_rx.clone();
            let tx = res_tx.clone();
            let queued = queued_ctr.clone();
            let inflight = inflight_ctr.clone();
            pool.spawn(move || {
                while let Ok(job) = rx.recv() {
                    queued.fetch_sub(1, Ordering::Relaxed);
                    inflight.fetch_add(1, Ordering::Relaxed);
                    process_rebuild_job(job, &tx);
                    inflight.fetch_sub(1, Ordering::Relaxed);
                }
            });
        }

        Self {
            job_tx,
            res_rx,
            _pool: pool,
            queued: queued_ctr,
            inflight: inflight_ctr,
            workers,
        }
    }

    pub fn submit_rebuild(&self, job: RebuildJob) {
        self.queued.fetch_add(1, Ordering::Relaxed);
        if self.job_tx.send(job).is_err() {
            self.queued.fetch_sub(1, Ordering::Relaxed);
        }
    }

    pub fn drain_results(&self) -> Vec<RebuildOut> {
        self.res_rx.try_iter().collect()
    }

    pub fn queue_debug_counts(&self) -> (usize, usize) {
        (
            self.queued.load(Ordering::Relaxed),
            self.inflight.load(Ordering::Relaxed),
        )
    }
}

/// Per-chunk scheduler: owns the authoritative grid and enforces at most one
/// rebuild in flight for this chunk.
pub struct TileChunk {
    id: u32,
    cfg: ChunkConfig,
    grid: TileGrid,
    protos: Arc<PrototypeSet>,
    busy: bool,
    rev: u64,
    built_rev: u64,
}

impl TileChunk {
    pub fn new(id: u32, cfg: ChunkConfig, protos: Arc<PrototypeSet>) -> Result<Self, ConfigError> {
        cfg.validate()?;
        Ok(Self {
            id,
            cfg,
            grid: TileGrid::new(cfg.rows, cfg.cols),
            protos,
            busy: false,
            rev: 1,
            built_rev: 0,
        })
    }

    #[inline]
    pub fn id(&self) -> u32 {
        self.id
    }

    #[inline]
    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    #[inline]
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// True when the grid has changed since the last published mesh.
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.rev > self.built_rev
    }

    /// Replaces one cell of the authoritative grid. Allowed while a rebuild
    /// is in flight; workers only ever read their own snapshot.
    pub fn set_tile(&mut self, row: usize, col: usize, tile: Tile) -> Result<(), GridError> {
        self.grid.set(row, col, tile)?;
        self.rev = self.rev.wrapping_add(1).max(1);
        Ok(())
    }

    /// Check-and-set trigger: returns false (a no-op) while a rebuild for
    /// this chunk is already in flight, true once a job was submitted.
    pub fn request_rebuild(&mut self, rt: &Runtime, randomize_seed: Option<u64>) -> bool {
        if self.busy {
            return false;
        }
        self.busy = true;
        if randomize_seed.is_some() {
            self.rev = self.rev.wrapping_add(1).max(1);
        }
        rt.submit_rebuild(RebuildJob {
            chunk_id: self.id,
            rev: self.rev,
            grid: self.grid.clone(),
            randomize_seed,
            protos: Arc::clone(&self.protos),
            cfg: self.cfg,
        });
        true
    }

    /// Hands a finished rebuild to the sink and releases the busy flag. On
    /// success the worker's grid is adopted unless an edit raced the job; on
    /// failure the grid and the previously published mesh stay untouched.
    pub fn absorb(&mut self, out: RebuildOut, sink: &mut dyn MeshSink) {
        debug_assert_eq!(out.chunk_id, self.id);
        match out.result {
            Ok(mesh) => {
                if out.rev == self.rev {
                    self.grid = out.grid;
                }
                self.built_rev = out.rev;
                sink.publish(self.id, mesh);
            }
            Err(e) => {
                warn!(
                    "chunk {}: rebuild failed after {} ms, keeping previous mesh: {}",
                    self.id, out.t_total_ms, e
                );
            }
        }
        // cleared only after the sink call, so a new trigger can never race
        // an in-flight publish
        self.busy = false;
    }
}
