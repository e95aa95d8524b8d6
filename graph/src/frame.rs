//! Phase execution over system batches.

use crate::config::PersistConfig;
use crate::system::{BehaviorBatch, Phase, SystemContext};
use crate::thread_pool::ThreadPool;
use crate::world::World;

/// Runs system callbacks phase by phase.
///
/// Each phase moves every system's behaviors out of the world, runs the
/// systems in parallel with shared access to the world, moves the behaviors
/// back and finally applies the commands queued during the phase.
#[derive(Debug, Default)]
pub struct FrameRunner {
    pool: ThreadPool,
    frame: u64,
}

impl FrameRunner {
    pub fn new(pool: ThreadPool) -> Self {
        Self { pool, frame: 0 }
    }

    pub fn from_config(config: &PersistConfig) -> Self {
        Self::new(ThreadPool::new(config.worker_threads()))
    }

    /// Frames completed by [`run_frame`](Self::run_frame).
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Run one phase. Returns the number of systems that had work.
    pub fn run_phase(&self, world: &mut World, phase: Phase) -> usize {
        let mut batches = world.take_batches();
        let ran = batches.len();

        {
            let world: &World = world;
            self.pool.for_each_mut(&mut batches, |batch: &mut BehaviorBatch| {
                let system = world.systems().system_at(batch.system);
                let ctx = SystemContext::new(world, phase, system.name());
                system.run(&ctx, batch);
            });
        }

        world.return_batches(batches);
        let applied = world.apply_commands();
        log::debug!("{phase:?}: {ran} systems, {applied} commands");
        ran
    }

    /// Run [`Phase::Start`].
    pub fn start(&self, world: &mut World) {
        self.run_phase(world, Phase::Start);
    }

    /// Run the phases of one frame in order.
    pub fn run_frame(&mut self, world: &mut World) {
        for phase in Phase::FRAME {
            self.run_phase(world, phase);
        }
        self.frame += 1;
    }
}
