//! Per-frame orchestration: keys → commands, pose → input → runner tick

use anyhow::Result;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::Config;
use crate::control::{command_for, ControlPipeline, KeyEvent, PipelineStep};
use crate::game::{Runner, RunnerEvent, Snapshot};
use crate::pose::PoseSnapshot;
use crate::store::HighScoreStore;

#[derive(Debug, Clone)]
pub struct FrameReport {
    pub events: Vec<RunnerEvent>,
    pub step: PipelineStep,
}

impl FrameReport {
    pub fn game_over(&self) -> Option<(u32, bool)> {
        self.events.iter().find_map(|e| match e {
            RunnerEvent::GameOver { score, new_high_score } => Some((*score, *new_high_score)),
            _ => None,
        })
    }
}

pub struct GameLoop<S: HighScoreStore> {
    runner: Runner,
    pipeline: ControlPipeline,
    store: S,
}

impl<S: HighScoreStore> GameLoop<S> {
    pub fn new(config: &Config, store: S) -> Self {
        let high_score = load_high_score(&store);
        Self::with_runner(config, Runner::new(&config.game, high_score), store)
    }

    pub fn with_runner(config: &Config, runner: Runner, store: S) -> Self {
        Self {
            runner,
            pipeline: ControlPipeline::new(config),
            store,
        }
    }

    pub fn runner(&self) -> &Runner {
        &self.runner
    }

    pub fn runner_mut(&mut self) -> &mut Runner {
        &mut self.runner
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        self.runner.snapshot()
    }

    pub fn trigger_lines(&self) -> Option<(f32, f32)> {
        self.pipeline.trigger_lines()
    }

    pub fn camera_restarted(&mut self) {
        self.pipeline.camera_restarted();
    }

    /// One frame. Commands are applied before the tick, so a Start key
    /// begins calibration on the same frame.
    pub fn frame(
        &mut self,
        keys: &[KeyEvent],
        raw: Option<&PoseSnapshot>,
        now: Duration,
    ) -> Result<FrameReport> {
        for key in keys {
            self.pipeline.push_key(*key);
        }

        let mut events = Vec::new();
        for key in self.pipeline.take_menu_keys() {
            let Some(command) = command_for(key, self.runner.state()) else {
                continue;
            };
            for event in self.runner.handle(command)? {
                if event == RunnerEvent::SessionStarted {
                    self.pipeline.begin_session();
                }
                events.push(event);
            }
        }

        let step = self.pipeline.step(raw, now);
        events.extend(self.runner.tick(&step.input));

        let report = FrameReport { events, step };
        if let Some((score, true)) = report.game_over() {
            match self.store.save(score) {
                Ok(()) => info!("new high score {} saved", score),
                Err(e) => warn!("failed to save high score: {:#}", e),
            }
        }
        Ok(report)
    }
}

fn load_high_score<S: HighScoreStore>(store: &S) -> u32 {
    match store.load() {
        Ok(score) => score,
        Err(e) => {
            warn!("high score unavailable, starting from 0: {:#}", e);
            0
        }
    }
}
