//! Out-of-band control of a running pipeline.
//!
//! A [`SessionHandle`] can be cloned and moved to any thread. Commands are
//! queued on a bounded channel and applied by the pipeline between frames,
//! never in the middle of one.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use std::str::FromStr;
use std::time::Duration;

#[derive(Clone, Debug, PartialEq)]
pub enum ControlCommand {
    SetMotionThreshold(u8),
    SetStillTime(Duration),
    SetMinBlobArea(f64),
    SetMinSeparation(f32),
    SetFiducialDebounce(Duration),
    /// Take the next frame as the new background.
    ResetBackground,
    /// Forget strikes and background; keep the fiducial transform.
    Reset,
    Stop,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("control queue is full")]
    Full,
    #[error("pipeline is no longer listening")]
    Closed,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unrecognised command {0:?}")]
pub struct ParseCommandError(pub String);

impl FromStr for ControlCommand {
    type Err = ParseCommandError;

    /// Parses the text form used on the CLI's stdin, e.g. `threshold 30`,
    /// `still 0.5`, `reset`, `stop`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseCommandError(s.trim().to_string());
        let mut parts = s.split_whitespace();
        let verb = parts.next().ok_or_else(err)?.to_ascii_lowercase();
        let arg = parts.next();
        if parts.next().is_some() {
            return Err(err());
        }
        let secs = |a: Option<&str>| {
            a.and_then(|v| v.parse::<f64>().ok())
                .and_then(|v| Duration::try_from_secs_f64(v).ok())
        };

        let cmd = match (verb.as_str(), arg) {
            ("threshold", Some(v)) => Self::SetMotionThreshold(v.parse().map_err(|_| err())?),
            ("still", a @ Some(_)) => Self::SetStillTime(secs(a).ok_or_else(err)?),
            ("min-area", Some(v)) => Self::SetMinBlobArea(v.parse().map_err(|_| err())?),
            ("separation", Some(v)) => Self::SetMinSeparation(v.parse().map_err(|_| err())?),
            ("debounce", a @ Some(_)) => Self::SetFiducialDebounce(secs(a).ok_or_else(err)?),
            ("background", None) => Self::ResetBackground,
            ("reset", None) => Self::Reset,
            ("stop" | "quit", None) => Self::Stop,
            _ => return Err(err()),
        };
        Ok(cmd)
    }
}

/// Sender side of a pipeline's control queue.
#[derive(Clone, Debug)]
pub struct SessionHandle {
    tx: Sender<ControlCommand>,
}

impl SessionHandle {
    /// Queue a command without blocking.
    pub fn send(&self, cmd: ControlCommand) -> Result<(), SessionError> {
        self.tx.try_send(cmd).map_err(|e| match e {
            TrySendError::Full(_) => SessionError::Full,
            TrySendError::Disconnected(_) => SessionError::Closed,
        })
    }

    pub fn stop(&self) -> Result<(), SessionError> {
        self.send(ControlCommand::Stop)
    }

    pub fn reset(&self) -> Result<(), SessionError> {
        self.send(ControlCommand::Reset)
    }

    pub fn set_motion_threshold(&self, threshold: u8) -> Result<(), SessionError> {
        self.send(ControlCommand::SetMotionThreshold(threshold))
    }

    pub fn set_still_time(&self, still: Duration) -> Result<(), SessionError> {
        self.send(ControlCommand::SetStillTime(still))
    }
}

/// A bounded control queue: the handle for controllers and the receiver for
/// [`DetectionPipeline::attach_control`](crate::DetectionPipeline::attach_control).
pub fn control_channel(capacity: usize) -> (SessionHandle, Receiver<ControlCommand>) {
    let (tx, rx) = bounded(capacity.max(1));
    (SessionHandle { tx }, rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_cli_commands() {
        assert_eq!(
            "threshold 30".parse(),
            Ok(ControlCommand::SetMotionThreshold(30))
        );
        assert_eq!(
            " still 0.25 ".parse(),
            Ok(ControlCommand::SetStillTime(Duration::from_millis(250)))
        );
        assert_eq!("STOP".parse(), Ok(ControlCommand::Stop));
        assert_eq!("background".parse(), Ok(ControlCommand::ResetBackground));
        assert_eq!(
            "separation 12.5".parse(),
            Ok(ControlCommand::SetMinSeparation(12.5))
        );
    }

    #[test]
    fn rejects_malformed_commands() {
        for bad in ["", "threshold", "threshold 300", "still -1", "reset now", "jump"] {
            assert!(bad.parse::<ControlCommand>().is_err(), "{bad:?} parsed");
        }
    }

    #[test]
    fn full_and_closed_queues_are_reported() {
        let (handle, rx) = control_channel(1);
        assert_eq!(handle.stop(), Ok(()));
        assert_eq!(handle.reset(), Err(SessionError::Full));
        assert_eq!(rx.try_recv(), Ok(ControlCommand::Stop));
        drop(rx);
        assert_eq!(handle.reset(), Err(SessionError::Closed));
    }
}
