//! Reel speed profiles

use serde::{Deserialize, Serialize};

/// Lowest speed any track may run at (px/s)
pub const MINIMUM_SPEED: f32 = 60.0;

/// How landing time is derived once a track starts stopping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StopMode {
    /// Every non-near-win track lands in the time track 0 took
    FixedTime,
    /// Every track lands at stop speed, time varies with distance
    FixedSpeed,
}

impl Default for StopMode {
    fn default() -> Self {
        Self::FixedTime
    }
}

/// Requested spin pacing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpeedMode {
    Normal,
    Fast,
    Turbo,
}

impl SpeedMode {
    pub fn from_flags(fast: bool, turbo: bool) -> Self {
        if turbo {
            SpeedMode::Turbo
        } else if fast {
            SpeedMode::Fast
        } else {
            SpeedMode::Normal
        }
    }
}

/// Kinematic parameters shared by every track of one spin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeedConfig {
    /// Stagger between track starts (s)
    pub begin_interval: f32,
    /// Pull-back distance before spinning (px)
    pub charge_dist: f32,
    /// Pull-back duration (s)
    pub charge_time: f32,
    /// Cruise speed (px/s)
    pub move_speed: f32,
    /// Spin time before the plate triggers its own stop (s)
    pub stop_trigger_time: f32,
    /// Delay before the first track stops (s)
    pub ended_delay: f32,
    /// Stagger between track stops (s)
    pub ended_interval: f32,
    /// Speed while holding a near-win (px/s)
    pub near_win_speed: f32,
    /// Near-win hold duration (s)
    pub near_win_time: f32,
    /// Speed once stop is triggered (px/s)
    pub stop_speed: f32,
    pub stop_mode: StopMode,
    /// Overshoot past the rest position (px)
    pub rebound_dist: f32,
    pub rebound_time: f32,
    pub hard_stop_speed: f32,
    pub hard_rebound_dist: f32,
    pub hard_rebound_time: f32,
}

impl SpeedConfig {
    /// Generic engine default
    pub fn normal() -> Self {
        Self {
            begin_interval: 0.0,
            charge_dist: 24.0,
            charge_time: 0.06,
            move_speed: 1500.0,
            stop_trigger_time: 1.5,
            ended_delay: 0.0,
            ended_interval: 0.3,
            near_win_speed: 3000.0,
            near_win_time: 1.5,
            stop_speed: 1500.0,
            stop_mode: StopMode::FixedTime,
            rebound_dist: 24.0,
            rebound_time: 0.24,
            hard_stop_speed: 1500.0,
            hard_rebound_dist: 24.0,
            hard_rebound_time: 0.24,
        }
    }

    /// EgyptEternal regular pacing
    pub fn faster() -> Self {
        Self {
            begin_interval: 0.0,
            charge_dist: 20.0,
            charge_time: 0.05,
            move_speed: 2000.0,
            stop_trigger_time: 0.75,
            ended_delay: 0.0,
            ended_interval: 0.45,
            near_win_speed: 3000.0,
            near_win_time: 1.5,
            stop_speed: 2000.0,
            stop_mode: StopMode::FixedTime,
            rebound_dist: 35.0,
            rebound_time: 0.2,
            hard_stop_speed: 2000.0,
            hard_rebound_dist: 25.0,
            hard_rebound_time: 0.2,
        }
    }

    /// EgyptEternal turbo: all tracks stop together
    pub fn turbo() -> Self {
        Self {
            charge_dist: 10.0,
            ended_interval: 0.0,
            rebound_dist: 15.0,
            hard_rebound_dist: 15.0,
            ..Self::faster()
        }
    }

    /// Clamp speeds to `MINIMUM_SPEED` and negative times to zero
    pub fn sanitized(mut self) -> Self {
        for speed in [
            &mut self.move_speed,
            &mut self.near_win_speed,
            &mut self.stop_speed,
            &mut self.hard_stop_speed,
        ] {
            *speed = speed.max(MINIMUM_SPEED);
        }
        for time in [
            &mut self.begin_interval,
            &mut self.charge_time,
            &mut self.stop_trigger_time,
            &mut self.ended_delay,
            &mut self.ended_interval,
            &mut self.near_win_time,
            &mut self.rebound_time,
            &mut self.hard_rebound_time,
        ] {
            *time = time.max(0.0);
        }
        self.charge_dist = self.charge_dist.max(0.0);
        self.rebound_dist = self.rebound_dist.max(0.0);
        self.hard_rebound_dist = self.hard_rebound_dist.max(0.0);
        self
    }

    /// Speed used while landing
    pub fn landing_speed(&self, hard_stop: bool) -> f32 {
        if hard_stop {
            self.hard_stop_speed
        } else {
            self.stop_speed
        }
    }

    pub fn rebound(&self, hard_stop: bool) -> (f32, f32) {
        if hard_stop {
            (self.hard_rebound_dist, self.hard_rebound_time)
        } else {
            (self.rebound_dist, self.rebound_time)
        }
    }
}

impl Default for SpeedConfig {
    fn default() -> Self {
        Self::faster()
    }
}
