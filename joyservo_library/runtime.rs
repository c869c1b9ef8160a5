//! Runtime: the shared core and its execution contexts
//!
//! `ServoCore` owns every piece of live state and is shared as
//! `Arc<ServoCore>` between:
//!
//! 1. the controller context (blocking event reads, one thread),
//! 2. the update context (sensor tick, console refresh, periodic persist),
//! 3. API request handlers.
//!
//! Lock order is servos → session → sampler wherever more than one is held.

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use chrono::Utc;
use parking_lot::Mutex;

use joyservo_core::config::JoyservoConfig;
use joyservo_core::error::{JoyservoError, JoyservoResult};
use joyservo_core::shutdown::{ShutdownSignal, StopSource};

use crate::control::axis::{ANGLE_MAX, ANGLE_MIN};
use crate::control::{ControllerSession, InputRouter, RouteOutcome, ServoBank, SharedServos};
use crate::drivers::{InputDriver, ProbedHardware};
use crate::messages::InputEvent;
use crate::sampler::SensorSampler;
use crate::status::{Console, HardwareBuses, ServoStatus, StatusReport};
use crate::store::{LogRecord, LogStore};

const STOP_POLL: Duration = Duration::from_millis(50);

pub struct ServoCore {
    config: JoyservoConfig,
    servos: SharedServos,
    session: Mutex<ControllerSession>,
    sampler: Mutex<SensorSampler>,
    buses: HardwareBuses,
    store: Option<LogStore>,
    console: Mutex<Console>,
    shutdown: Arc<ShutdownSignal>,
}

impl ServoCore {
    /// Build the core and drive every servo to center
    pub fn new(
        config: JoyservoConfig,
        hardware: ProbedHardware,
        store: Option<LogStore>,
        shutdown: Arc<ShutdownSignal>,
    ) -> Self {
        let ProbedHardware {
            mut servo,
            pca_bus,
            imu,
            mpu_bus,
        } = hardware;

        if let Err(e) = servo.set_frequency(config.servo.frequency_hz) {
            tracing::warn!("Failed to set PWM frequency: {}", e);
        }
        let mut bank = ServoBank::new(&config.servo, servo);
        bank.center_all();

        let exit_window = Duration::from_secs(config.runtime.exit_confirm_secs);
        Self {
            servos: bank.shared(),
            session: Mutex::new(ControllerSession::new(exit_window)),
            sampler: Mutex::new(SensorSampler::new(imu, config.sensor.clone())),
            buses: HardwareBuses {
                pca: pca_bus,
                mpu: mpu_bus,
            },
            store,
            console: Mutex::new(Console::new(config.runtime.console)),
            shutdown,
            config,
        }
    }

    /// All-simulation core without a log store or console
    pub fn simulated(mut config: JoyservoConfig) -> Self {
        config.runtime.console = false;
        Self::new(
            config,
            ProbedHardware::simulated(),
            None,
            Arc::new(ShutdownSignal::new()),
        )
    }

    pub fn config(&self) -> &JoyservoConfig {
        &self.config
    }

    pub fn servos(&self) -> &SharedServos {
        &self.servos
    }

    pub fn sampler(&self) -> &Mutex<SensorSampler> {
        &self.sampler
    }

    pub fn shutdown_signal(&self) -> &Arc<ShutdownSignal> {
        &self.shutdown
    }

    pub fn is_stopping(&self) -> bool {
        self.shutdown.is_stopping()
    }

    // ========================================================================
    // Exposed operations
    // ========================================================================

    pub fn get_status(&self) -> StatusReport {
        let servos = self.servos.lock();
        let session = self.session.lock().status();
        let sampler = self.sampler.lock();
        StatusReport::project(&servos, &sampler, session, self.buses)
    }

    fn check_angle(angle: i64) -> JoyservoResult<()> {
        if (ANGLE_MIN as i64..=ANGLE_MAX as i64).contains(&angle) {
            Ok(())
        } else {
            Err(JoyservoError::AngleOutOfRange(angle))
        }
    }

    /// Move one channel directly; lock and hold do not apply
    pub fn set_channel_angle(&self, channel: u8, angle: i64) -> JoyservoResult<ServoStatus> {
        Self::check_angle(angle)?;
        let mut servos = self.servos.lock();
        let update = servos.set_angle(channel, angle)?;
        let hold = servos
            .state()
            .channel(channel)
            .map(|c| c.hold)
            .unwrap_or_default();
        Ok(ServoStatus {
            channel,
            angle: update.angle,
            direction: update.direction,
            hold,
        })
    }

    /// Move every channel not on hold; a no-op while locked
    pub fn set_all_angle(&self, angle: i64) -> JoyservoResult<usize> {
        Self::check_angle(angle)?;
        let updates = self.servos.lock().move_all_to(angle)?;
        Ok(updates.len())
    }

    pub fn set_hold(&self, channel: u8, hold: bool) -> JoyservoResult<()> {
        self.servos.lock().set_hold(channel, hold)
    }

    pub fn toggle_hold(&self, channel: u8) -> JoyservoResult<bool> {
        self.servos.lock().toggle_hold(channel)
    }

    pub fn set_lock(&self, lock: bool) -> JoyservoResult<()> {
        self.servos.lock().set_lock(lock)
    }

    pub fn toggle_lock(&self) -> JoyservoResult<bool> {
        self.servos.lock().toggle_lock()
    }

    /// Stop the loops and park the outputs
    ///
    /// Idempotent. A stop from the API keeps the process alive unless
    /// `web.stop_exits_process` is set; other sources also request exit.
    /// Returns true for the first stop request.
    pub fn request_stop(&self, source: StopSource) -> bool {
        let first = self.shutdown.request_stop(source);
        self.rest();
        if source != StopSource::Api || self.config.web.stop_exits_process {
            self.shutdown.request_exit(source);
        }
        first
    }

    /// Zero every PWM output, once per process
    pub fn rest(&self) {
        self.shutdown.run_resting_once(|| {
            self.servos.lock().park();
            tracing::info!("Servo outputs zeroed");
        });
    }

    pub fn recent_logs(&self, limit: Option<usize>) -> JoyservoResult<Vec<LogRecord>> {
        let limit = limit.unwrap_or(self.config.store.recent_default_limit);
        match &self.store {
            Some(store) => store.recent(limit),
            None => Err(JoyservoError::NotFound("log store disabled".to_string())),
        }
    }

    // ========================================================================
    // Update context
    // ========================================================================

    fn refresh_console(&self) {
        let mut console = self.console.lock();
        if console.is_enabled() {
            let report = self.get_status();
            console.show(&report);
        }
    }

    /// One sampling tick followed by a console refresh
    pub fn update_tick(&self) {
        self.sampler.lock().tick();
        self.refresh_console();
    }

    /// Write the current status to the log store; failures are logged only
    pub fn persist_snapshot(&self) {
        let Some(store) = &self.store else {
            return;
        };
        let report = self.get_status();
        if let Err(e) = store.append(Utc::now(), &report) {
            tracing::warn!("Failed to persist snapshot: {}", e);
        }
    }

    /// Periodic loop; returns once a stop is requested
    pub fn run_update_loop(&self) {
        let tick = Duration::from_millis(self.config.runtime.tick_ms);
        let persist_every = Duration::from_secs(self.config.runtime.persist_interval_secs);
        let mut last_persist = Instant::now();

        while !self.is_stopping() {
            self.update_tick();
            if !persist_every.is_zero() && last_persist.elapsed() >= persist_every {
                self.persist_snapshot();
                last_persist = Instant::now();
            }
            std::thread::sleep(tick);
        }
        self.console.lock().finish();
        tracing::debug!("Update loop stopped");
    }

    pub fn spawn_update_loop(self: &Arc<Self>) -> JoyservoResult<JoinHandle<()>> {
        let core = Arc::clone(self);
        let handle = std::thread::Builder::new()
            .name("joyservo-update".to_string())
            .spawn(move || core.run_update_loop())?;
        Ok(handle)
    }

    // ========================================================================
    // Controller context
    // ========================================================================

    /// Route one event under the servo lock, then refresh observers
    pub fn handle_event(
        &self,
        router: &InputRouter,
        event: &InputEvent,
        now: Instant,
    ) -> RouteOutcome {
        let (outcome, exit) = {
            let mut servos = self.servos.lock();
            let mut session = self.session.lock();
            let outcome = router.dispatch(event, &mut servos, &mut session, now);
            (outcome, session.exit_requested())
        };

        if exit {
            self.request_stop(StopSource::Controller);
        } else if outcome.changed_state() {
            self.refresh_console();
        }
        outcome
    }

    /// Read one device until it ends, fails, or a stop is requested
    pub fn run_controller_session(&self, mut driver: InputDriver) {
        let kind = driver.controller_kind();
        self.session
            .lock()
            .connect(kind, driver.name(), driver.path());
        let router = InputRouter::for_kind(kind, &self.config.controller);
        tracing::info!("Controller connected: {} ({})", driver.name(), kind);
        tracing::debug!(
            target: crate::control::EVENT_LOG_TARGET,
            "Controller connected: {} ({})",
            driver.name(),
            kind
        );

        while !self.is_stopping() {
            match driver.next_event() {
                Ok(Some(event)) => {
                    self.handle_event(&router, &event, Instant::now());
                }
                Ok(None) => {
                    tracing::info!("Controller event stream ended");
                    break;
                }
                Err(e) => {
                    tracing::warn!("Controller disconnected: {}", e);
                    break;
                }
            }
        }

        self.session.lock().disconnect();
        if let Err(e) = driver.shutdown() {
            tracing::debug!("Input driver shutdown: {}", e);
        }
    }

    fn sleep_unless_stopping(&self, total: Duration) {
        let deadline = Instant::now() + total;
        while !self.is_stopping() && Instant::now() < deadline {
            std::thread::sleep(STOP_POLL.min(total));
        }
    }

    /// Re-scan interval after a disconnect, if any
    pub fn reconnect_interval(&self, explicit_device: bool) -> Option<Duration> {
        match self.config.runtime.reconnect_secs {
            0 => None,
            _ if explicit_device => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    /// Connect, run a session, and repeat every `reconnect` until stopped
    pub fn run_controller_loop<F>(&self, mut connect: F, reconnect: Option<Duration>)
    where
        F: FnMut() -> JoyservoResult<Option<InputDriver>>,
    {
        loop {
            if self.is_stopping() {
                break;
            }
            match connect() {
                Ok(Some(driver)) => self.run_controller_session(driver),
                Ok(None) => tracing::debug!("No game controller found"),
                Err(e) => tracing::warn!("Failed to open controller: {}", e),
            }

            match reconnect {
                Some(interval) => self.sleep_unless_stopping(interval),
                None => break,
            }
        }
        tracing::debug!("Controller loop stopped");
    }

    /// Controller loop against real devices on its own thread
    pub fn spawn_controller_loop(
        self: &Arc<Self>,
        explicit_device: Option<String>,
    ) -> JoyservoResult<JoinHandle<()>> {
        let core = Arc::clone(self);
        let reconnect = self.reconnect_interval(explicit_device.is_some());
        let handle = std::thread::Builder::new()
            .name("joyservo-controller".to_string())
            .spawn(move || {
                let connect = || InputDriver::find_controller(explicit_device.as_deref());
                core.run_controller_loop(connect, reconnect)
            })?;
        Ok(handle)
    }

    /// Final teardown: park outputs and release devices
    pub fn close(&self) {
        self.rest();
        self.sampler.lock().shutdown();
        if let Err(e) = self.servos.lock().driver_mut().shutdown() {
            tracing::warn!("Servo driver shutdown failed: {}", e);
        }
        self.console.lock().finish();
    }
}
