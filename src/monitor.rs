//! The orchestrating state machine.
//!
//! One dedicated task owns the browser session and runs every interaction as
//! a blocking step: acquire → login once → {extract → match → (select +
//! notify | sleep)} until the first successful selection, a fatal error, or
//! an external stop. The session is released on every exit path.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::artifacts;
use crate::browser::BrowserSession;
use crate::core::config::MonitorConfig;
use crate::core::error::MonitorError;
use crate::core::status::{MonitorState, StatusStore};
use crate::matcher::{self, TargetProgramSet};
use crate::notify::{self, Notifier};
use crate::portal::auth::Authenticator;
use crate::portal::listing::{ListingExtractor, ListingSnapshot};
use crate::portal::selection;

enum CycleOutcome {
    /// A target was selected and confirmed; the run is over.
    Selected(String),
    NoMatch,
}

pub struct Monitor {
    cfg: Arc<MonitorConfig>,
    status: StatusStore,
    notifier: Notifier,
    stop: Arc<AtomicBool>,
    targets: TargetProgramSet,
    /// Programs already alerted this run; grows monotonically, never persisted.
    found: HashSet<String>,
    /// Previous cycle's snapshot, kept only for "new since last cycle" logging.
    previous: ListingSnapshot,
}

impl Monitor {
    pub fn new(
        cfg: Arc<MonitorConfig>,
        status: StatusStore,
        notifier: Notifier,
        stop: Arc<AtomicBool>,
    ) -> Self {
        let targets = TargetProgramSet::new(cfg.targets.iter().cloned());
        Self {
            cfg,
            status,
            notifier,
            stop,
            targets,
            found: HashSet::new(),
            previous: ListingSnapshot::new(),
        }
    }

    /// Run to completion. Never panics outward; every exit path releases the
    /// browser and leaves a terminal state in the status store.
    pub async fn run(mut self) {
        info!(
            "starting monitor: {} target(s), every {}s",
            self.targets.len(),
            self.cfg.check_interval.as_secs()
        );
        self.status.set_state(MonitorState::Initializing);

        let session = match BrowserSession::acquire().await {
            Ok(session) => session,
            Err(e) => {
                error!("{e}");
                self.notifier
                    .send_alert(&notify::fatal_message(&e.to_string()))
                    .await;
                self.status.set_state(MonitorState::Error);
                return;
            }
        };
        self.status.set_state(MonitorState::BrowserReady);

        self.drive(&session).await;

        // Unconditional teardown, success and failure alike.
        session.release().await;
    }

    async fn drive(&mut self, session: &BrowserSession) {
        if let Err(failure) = Authenticator::new(&self.cfg).login(&session.page).await {
            error!("aborting run: {failure}");
            self.notifier
                .send_alert(&notify::fatal_message(&format!("login failed: {failure}")))
                .await;
            if let Some(shot) = &failure.screenshot {
                self.notifier.send_photo(shot, "login failure").await;
            }
            if let Some(dump) = &failure.page_dump {
                self.notifier.send_document(dump, "login page dump").await;
            }
            self.status.set_state(MonitorState::Error);
            return;
        }
        self.status.set_state(MonitorState::LoggedIn);
        self.notifier
            .send_alert(&notify::run_started_message(
                &self.cfg.targets,
                self.cfg.check_interval.as_secs(),
            ))
            .await;

        let extractor = ListingExtractor::new(self.cfg.request_url.clone());

        loop {
            // The stop signal is honored only at cycle boundaries; an
            // in-flight browser wait is never interrupted.
            if self.stop.load(Ordering::Relaxed) {
                info!("stop requested; ending run");
                self.status.set_state(MonitorState::Stopped);
                self.notifier.send_alert(&notify::stopped_message()).await;
                return;
            }

            self.status.set_state(MonitorState::Checking);

            if !session.is_alive().await {
                let e = MonitorError::BrowserGone("liveness probe failed".into());
                error!("{e}");
                self.notifier
                    .send_alert(&notify::fatal_message(&e.to_string()))
                    .await;
                self.status.set_state(MonitorState::Error);
                return;
            }

            match self.run_cycle(session, &extractor).await {
                CycleOutcome::Selected(program) => {
                    info!("run complete: {program} selected; stopping");
                    self.status.set_state(MonitorState::FoundAndSelected);
                    return;
                }
                CycleOutcome::NoMatch => {
                    info!(
                        "no new target; sleeping {}s",
                        self.cfg.check_interval.as_secs()
                    );
                    tokio::time::sleep(self.cfg.check_interval).await;
                }
            }
        }
    }

    async fn run_cycle(
        &mut self,
        session: &BrowserSession,
        extractor: &ListingExtractor,
    ) -> CycleOutcome {
        let snapshot = extractor.extract(&session.page).await;
        info!("observed {} program listing(s)", snapshot.len());

        let appeared = matcher::new_since(&self.previous, &snapshot);
        if !appeared.is_empty() {
            info!("new since last cycle: {appeared:?}");
        }
        self.previous = snapshot.clone();
        self.status.record_check();

        for program in matcher::fresh_matches(&snapshot, &self.targets, &self.found) {
            // Recorded before the action sequence: even if selection fails,
            // this exact string is never alerted again.
            self.found.insert(program.clone());
            info!("🎯 target listing appeared: {program}");

            if selection::select_program(&session.page, &program).await
                && selection::click_continue(&session.page).await
            {
                self.notifier
                    .send_alert(&notify::success_message(&program, &self.cfg.request_url))
                    .await;
                if let Some(shot) = artifacts::capture_screenshot(&session.page, "success").await {
                    self.notifier.send_photo(&shot, &program).await;
                }
                return CycleOutcome::Selected(program);
            }

            // No intra-cycle retry: a second blind click on a half-rendered
            // widget is more likely to trip the portal than to land.
            warn!("selection sequence failed for {program:?}; attempt abandoned");
        }

        CycleOutcome::NoMatch
    }
}
