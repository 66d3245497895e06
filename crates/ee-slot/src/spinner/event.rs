//! Spinner notifications, queued per tick and drained by the owner

use super::track::Cell;

/// Whole-plate lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlateEvent {
    EnterIdle,
    StartSpinning,
    StartStopping,
    JustStopped,
}

/// Per-track lifecycle and symbol traffic
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrackEvent {
    EnterIdle,
    WaitToRun { delay: f32 },
    StartCharging { time: f32 },
    StartSpinning,
    WaitToStop { delay: f32 },
    WaitToNearWin { delay: f32 },
    StartNearWin { time: f32 },
    PreparingStop,
    StartStopping { landing_time: f32 },
    /// Final data is in place for the column
    ReachBottom,
    /// Rebound finished, the track is motionless
    JustStopped,
    SymbolLeaving { cell: Cell },
    SymbolEntering { cell: Cell },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpinnerEvent {
    Plate(PlateEvent),
    Track { column: usize, event: TrackEvent },
}

impl SpinnerEvent {
    pub fn track(column: usize, event: TrackEvent) -> Self {
        SpinnerEvent::Track { column, event }
    }

    /// Column for track events
    pub fn column(&self) -> Option<usize> {
        match self {
            SpinnerEvent::Plate(_) => None,
            SpinnerEvent::Track { column, .. } => Some(*column),
        }
    }

    /// Lifecycle events only, symbol traffic excluded
    pub fn is_lifecycle(&self) -> bool {
        !matches!(
            self,
            SpinnerEvent::Track {
                event: TrackEvent::SymbolLeaving { .. } | TrackEvent::SymbolEntering { .. },
                ..
            }
        )
    }
}
