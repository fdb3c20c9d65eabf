use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::animation::ease::EaseId;
use crate::config::PresentationConfig;
use crate::display::sink::DisplaySurface;
use crate::foundation::core::Canvas;
use crate::foundation::error::{SlidecastError, SlidecastResult};
use crate::presentation::event::TransitionEvent;
use crate::presentation::presenter::Presenter;
use crate::presentation::state::Phase;
use crate::render::surface::FrameRGBA;
use crate::scene::model::Slide;

/// Presentation thread options.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PresentationThreadOpts {
    /// Target time between frames.
    pub frame_interval: Duration,
}

impl PresentationThreadOpts {
    /// Pace frames at the config's fps.
    pub fn from_config(config: &PresentationConfig) -> Self {
        Self {
            frame_interval: config.frame_interval(),
        }
    }
}

impl Default for PresentationThreadOpts {
    fn default() -> Self {
        Self::from_config(&PresentationConfig::default())
    }
}

/// Immutable requests crossing from callers into the presentation thread.
enum Command {
    Send {
        slide: Arc<Slide>,
        duration: Duration,
        easing: EaseId,
    },
    Clear {
        duration: Duration,
        easing: EaseId,
    },
    Event(TransitionEvent),
    Resize {
        width: u32,
        height: u32,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RunState {
    Running,
    PauseRequested,
    Paused,
    StopRequested,
    Stopped,
}

/// Rendezvous between callers and the thread.
struct WorkerControl {
    state: Mutex<RunState>,
    cv: Condvar,
}

impl WorkerControl {
    fn lock(&self) -> MutexGuard<'_, RunState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set(&self, state: RunState) {
        *self.lock() = state;
        self.cv.notify_all();
    }
}

/// What the thread publishes after every frame.
#[derive(Clone, Debug, Default)]
pub struct WorkerStatus {
    /// Last composed frame.
    pub frame: Option<Arc<FrameRGBA>>,
    /// Phase after the last frame.
    pub phase: Phase,
    /// Frames composed.
    pub frames_rendered: u64,
    /// Frames handed to the display (unchanged frames are skipped).
    pub frames_presented: u64,
}

/// Runs a [`Presenter`] on a dedicated thread, pacing frames and presenting them to a display.
///
/// Callers only ever send commands (non-blocking) and read copied frames; the presenter, its
/// caches and the display belong to the thread. Dropping the handle stops the thread.
pub struct PresentationThread {
    control: Arc<WorkerControl>,
    tx: Sender<Command>,
    status: Arc<Mutex<WorkerStatus>>,
    handle: Option<JoinHandle<SlidecastResult<Presenter>>>,
}

impl std::fmt::Debug for PresentationThread {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PresentationThread")
            .field("state", &*self.control.lock())
            .finish()
    }
}

impl PresentationThread {
    /// Start presenting on a new thread.
    pub fn spawn(
        presenter: Presenter,
        display: Box<dyn DisplaySurface>,
        opts: PresentationThreadOpts,
    ) -> SlidecastResult<Self> {
        let control = Arc::new(WorkerControl {
            state: Mutex::new(RunState::Running),
            cv: Condvar::new(),
        });
        let status = Arc::new(Mutex::new(WorkerStatus::default()));
        let (tx, rx) = mpsc::channel();

        let worker = Worker {
            presenter,
            display,
            rx,
            control: control.clone(),
            status: status.clone(),
            interval: opts.frame_interval,
        };
        let handle = std::thread::Builder::new()
            .name("slidecast-presentation".to_owned())
            .spawn(move || worker.run())
            .map_err(|e| {
                SlidecastError::presentation(format!("spawn presentation thread: {e}"))
            })?;

        Ok(Self {
            control,
            tx,
            status,
            handle: Some(handle),
        })
    }

    fn command(&self, cmd: Command) -> SlidecastResult<()> {
        self.tx
            .send(cmd)
            .map_err(|_| SlidecastError::presentation("presentation thread has exited"))
    }

    /// Queue a send. Returns immediately.
    pub fn send(
        &self,
        slide: Arc<Slide>,
        duration: Duration,
        easing: EaseId,
    ) -> SlidecastResult<()> {
        self.command(Command::Send {
            slide,
            duration,
            easing,
        })
    }

    /// Queue a clear. Returns immediately.
    pub fn clear(&self, duration: Duration, easing: EaseId) -> SlidecastResult<()> {
        self.command(Command::Clear { duration, easing })
    }

    /// Queue a prepared event. Returns immediately.
    pub fn send_event(&self, event: TransitionEvent) -> SlidecastResult<()> {
        self.command(Command::Event(event))
    }

    /// Queue a resize. Returns immediately.
    ///
    /// An invalid size is rejected here and never reaches the thread.
    pub fn resize(&self, width: u32, height: u32) -> SlidecastResult<()> {
        Canvas::new(width, height)?;
        self.command(Command::Resize { width, height })
    }

    /// Block until the thread is parked between frames.
    pub fn pause(&self) -> SlidecastResult<()> {
        let mut st = self.control.lock();
        match *st {
            RunState::Paused => return Ok(()),
            RunState::StopRequested | RunState::Stopped => {
                return Err(SlidecastError::presentation(
                    "cannot pause a stopped presentation thread",
                ));
            }
            RunState::Running | RunState::PauseRequested => {
                *st = RunState::PauseRequested;
                self.control.cv.notify_all();
            }
        }
        let st = self
            .control
            .cv
            .wait_while(st, |s| *s == RunState::PauseRequested)
            .unwrap_or_else(|e| e.into_inner());
        match *st {
            RunState::Paused => Ok(()),
            _ => Err(SlidecastError::presentation(
                "presentation thread did not pause",
            )),
        }
    }

    /// Let a paused thread continue.
    pub fn resume(&self) {
        let mut st = self.control.lock();
        if matches!(*st, RunState::Paused | RunState::PauseRequested) {
            *st = RunState::Running;
            self.control.cv.notify_all();
        }
    }

    /// `true` while parked by [`PresentationThread::pause`].
    pub fn is_paused(&self) -> bool {
        *self.control.lock() == RunState::Paused
    }

    /// Copy of the latest published status.
    pub fn status(&self) -> WorkerStatus {
        self.status
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Latest composed frame, fully detached from the thread.
    pub fn current_frame(&self) -> Option<Arc<FrameRGBA>> {
        self.status().frame
    }

    /// Stop the thread and wait for it to exit, returning the presenter or the error that ended
    /// the thread.
    pub fn stop(mut self) -> SlidecastResult<Presenter> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> SlidecastResult<Presenter> {
        {
            let mut st = self.control.lock();
            if *st != RunState::Stopped {
                *st = RunState::StopRequested;
            }
            self.control.cv.notify_all();
        }
        let handle = self
            .handle
            .take()
            .ok_or_else(|| SlidecastError::presentation("presentation thread already joined"))?;
        handle
            .join()
            .map_err(|_| SlidecastError::presentation("presentation thread panicked"))?
    }
}

impl Drop for PresentationThread {
    fn drop(&mut self) {
        if self.handle.is_some()
            && let Err(e) = self.shutdown()
        {
            tracing::warn!(error = %e, "presentation thread ended with an error");
        }
    }
}

struct Worker {
    presenter: Presenter,
    display: Box<dyn DisplaySurface>,
    rx: Receiver<Command>,
    control: Arc<WorkerControl>,
    status: Arc<Mutex<WorkerStatus>>,
    interval: Duration,
}

impl Worker {
    fn run(mut self) -> SlidecastResult<Presenter> {
        let res = self.run_loop();
        self.control.set(RunState::Stopped);
        match res {
            Ok(()) => Ok(self.presenter),
            Err(e) => {
                tracing::error!(error = %e, "presentation thread failed");
                Err(e)
            }
        }
    }

    #[tracing::instrument(name = "presentation_loop", level = "debug", skip_all)]
    fn run_loop(&mut self) -> SlidecastResult<()> {
        self.display.begin(self.presenter.canvas())?;
        tracing::debug!(
            interval_ms = self.interval.as_millis() as u64,
            format = ?self.display.preferred_format(),
            "presentation thread started"
        );
        let mut last_fingerprint = None;

        loop {
            if !self.safe_point() {
                break;
            }
            let frame_start = Instant::now();
            self.drain_commands(frame_start);

            let frame = Arc::new(self.presenter.render(frame_start)?.to_frame());
            let fingerprint = frame.fingerprint();
            let changed = last_fingerprint != Some(fingerprint);
            if changed {
                self.display.present(&frame)?;
                last_fingerprint = Some(fingerprint);
            }
            self.publish(frame, changed);

            let deadline = frame_start + self.interval;
            let st = self.control.lock();
            let timeout = deadline.saturating_duration_since(Instant::now());
            let _paced = self
                .control
                .cv
                .wait_timeout_while(st, timeout, |s| *s == RunState::Running)
                .unwrap_or_else(|e| e.into_inner());
        }

        self.display.end()?;
        tracing::debug!("presentation thread stopped");
        Ok(())
    }

    /// Park while paused; `false` once a stop was requested.
    fn safe_point(&self) -> bool {
        let mut st = self.control.lock();
        loop {
            match *st {
                RunState::Running => return true,
                RunState::StopRequested | RunState::Stopped => return false,
                RunState::PauseRequested => {
                    *st = RunState::Paused;
                    self.control.cv.notify_all();
                    tracing::debug!("presentation thread paused");
                }
                RunState::Paused => {
                    st = self.control.cv.wait(st).unwrap_or_else(|e| e.into_inner());
                }
            }
        }
    }

    fn drain_commands(&mut self, now: Instant) {
        loop {
            match self.rx.try_recv() {
                Ok(Command::Send {
                    slide,
                    duration,
                    easing,
                }) => {
                    self.presenter.send(slide, duration, easing, now);
                }
                Ok(Command::Clear { duration, easing }) => {
                    self.presenter.clear(duration, easing, now);
                }
                Ok(Command::Event(ev)) => {
                    self.presenter.send_event(ev, now);
                }
                Ok(Command::Resize { width, height }) => {
                    if let Err(e) = self.presenter.resize(width, height) {
                        tracing::warn!(
                            width,
                            height,
                            error = %e,
                            "resize failed; keeping the current canvas"
                        );
                    }
                }
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => return,
            }
        }
    }

    fn publish(&self, frame: Arc<FrameRGBA>, presented: bool) {
        let mut s = self.status.lock().unwrap_or_else(|e| e.into_inner());
        s.frame = Some(frame);
        s.phase = self.presenter.phase();
        s.frames_rendered += 1;
        if presented {
            s.frames_presented += 1;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/presentation/worker.rs"]
mod tests;
