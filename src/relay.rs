//! Relay service
//!
//! The explicitly constructed service object that every connection task
//! holds a handle to. It ties the connection registry, the master
//! arbitration state machine and the broadcast router together: controller
//! commands are interpreted and fanned out to players, master start/stop
//! drives arbitration, and live audio frames are forwarded to all players
//! while an announcement is active. There is no ambient global instance;
//! tests construct isolated relays directly.

use std::sync::Arc;

use bytes::Bytes;
use serde::Serialize;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::protocol::{
    parse_status_report, BlockReason, ControllerCommand, MasterCommand, Outbound, ServerEvent,
};
use crate::registry::{Connection, Registry, Role};
use crate::router::{Delivery, Router};
use crate::session::Arbitration;

/// Point-in-time view of the relay, served by the status endpoint
#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    pub players_connected: usize,
    pub controllers_connected: usize,
    pub masters_connected: usize,
    pub master_active: bool,
    pub master_username: Option<String>,
}

/// Session/broadcast relay for one PA network
#[derive(Debug)]
pub struct Relay {
    registry: Arc<Registry>,
    router: Router,
    arbitration: Arbitration,
}

impl Default for Relay {
    fn default() -> Self {
        Self::new()
    }
}

impl Relay {
    pub fn new() -> Self {
        let registry = Arc::new(Registry::new());
        Self {
            router: Router::new(registry.clone()),
            registry,
            arbitration: Arbitration::new(),
        }
    }

    /// Admit a connection under `role`.
    ///
    /// A connection arriving while a live announcement is in progress is
    /// immediately told about it, so late joiners render the same state as
    /// everyone else.
    pub fn admit(&self, role: Role) -> (Connection, UnboundedReceiver<Outbound>) {
        let (conn, rx) = self.registry.admit(role);
        tracing::debug!("Connection {} admitted as {:?}", conn.id, role);

        if let Some(holder) = self.arbitration.holder() {
            self.router
                .send_to_connection(&conn, &ServerEvent::MasterStart { username: holder });
        }
        (conn, rx)
    }

    /// Remove a connection from the registry. Idempotent.
    pub fn remove(&self, conn: &Connection) -> bool {
        let removed = self.registry.remove(conn);
        if removed {
            tracing::debug!("Connection {} removed ({:?})", conn.id, conn.role);
        }
        removed
    }

    /// Interpret one controller text frame.
    ///
    /// While a live announcement is active the issuing controller gets a
    /// single `blocked` notice and nothing reaches the players. Malformed
    /// frames are dropped; recognized commands fan out to the player
    /// audience only.
    pub fn handle_controller_text(&self, conn: &Connection, text: &str) {
        let command = match ControllerCommand::parse(text) {
            Ok(command) => command,
            Err(e) => {
                tracing::debug!("Dropping malformed controller message: {}", e);
                return;
            }
        };

        if self.arbitration.is_active() {
            self.router.send_to_connection(
                conn,
                &ServerEvent::Blocked {
                    reason: BlockReason::MasterActive,
                },
            );
            return;
        }

        match command.into_player_event() {
            Some(event) => {
                let report = self.router.send_to(&[Role::Player], &event);
                self.log_failures("controller command", &report);
            }
            None => tracing::debug!("Ignoring unrecognized controller action"),
        }
    }

    /// Interpret one master text frame.
    ///
    /// `declared` mirrors the username the connection most recently started
    /// an announcement under; the connection task passes it back in on
    /// disconnect so the right holder is released.
    pub fn handle_master_text(&self, text: &str, declared: &mut Option<String>) {
        match MasterCommand::parse(text) {
            Ok(MasterCommand::StartAnnouncement { username }) => {
                *declared = Some(username.clone());
                self.start_live(&username);
            }
            Ok(MasterCommand::StopAnnouncement) => {
                *declared = None;
                self.stop_live();
            }
            Ok(MasterCommand::Unknown) => {
                tracing::debug!("Ignoring unrecognized master action");
            }
            Err(e) => tracing::debug!("Dropping malformed master message: {}", e),
        }
    }

    /// Re-broadcast a player status report to all audiences, unmodified
    pub fn handle_player_text(&self, text: &str) {
        match parse_status_report(text) {
            Ok(data) => {
                let report = self
                    .router
                    .send_to_all(&ServerEvent::PlayerStatus { data });
                self.log_failures("player status", &report);
            }
            Err(e) => tracing::debug!("Dropping malformed player status: {}", e),
        }
    }

    /// Begin a live announcement held by `username`, pre-empting playback.
    ///
    /// Players and controllers are notified; other masters are not. A start
    /// while already active replaces the holder and re-broadcasts.
    pub fn start_live(&self, username: &str) {
        match self.arbitration.start(username) {
            Some(previous) => tracing::info!(
                "Live announcement holder replaced: {} -> {}",
                previous,
                username
            ),
            None => tracing::info!("Live announcement started by {}", username),
        }

        let report = self.router.send_to(
            &[Role::Player, Role::Controller],
            &ServerEvent::MasterStart {
                username: username.to_string(),
            },
        );
        self.log_failures("master_start", &report);

        let report = self.router.send_to(&[Role::Player], &ServerEvent::Stop);
        self.log_failures("pre-empt stop", &report);
    }

    /// End the live announcement.
    ///
    /// Idempotent but not silent: the `master_stop` notification goes to
    /// all three audiences even when no announcement was active.
    pub fn stop_live(&self) {
        self.arbitration.stop();
        tracing::info!("Live announcement stopped");

        let report = self.router.send_to_all(&ServerEvent::MasterStop);
        self.log_failures("master_stop", &report);
    }

    /// React to the drop of a master connection that had declared `name`.
    ///
    /// Ends the announcement only if `name` still holds the channel; a
    /// superseded master dropping changes nothing.
    pub fn master_disconnected(&self, name: &str) {
        if self.arbitration.disconnect(name) {
            tracing::info!("Live announcement holder {} disconnected", name);
            let report = self.router.send_to_all(&ServerEvent::MasterStop);
            self.log_failures("master_stop", &report);
        }
    }

    /// Forward one live audio frame to every player.
    ///
    /// Dropped without buffering when no announcement is active. Frame
    /// boundaries are preserved: one inbound frame, one outbound frame per
    /// player.
    pub fn relay_frame(&self, frame: Bytes) {
        if !self.arbitration.is_active() {
            return;
        }
        let report = self.router.send_frame(Role::Player, frame);
        self.log_failures("audio frame", &report);
    }

    /// Status snapshot for the pull-based query interface
    pub fn status(&self) -> StatusSnapshot {
        StatusSnapshot {
            players_connected: self.registry.count(Role::Player),
            controllers_connected: self.registry.count(Role::Controller),
            masters_connected: self.registry.count(Role::Master),
            master_active: self.arbitration.is_active(),
            master_username: self.arbitration.holder(),
        }
    }

    fn log_failures(&self, what: &str, report: &[Delivery]) {
        let failed = report.iter().filter(|d| !d.delivered).count();
        if failed > 0 {
            tracing::debug!(
                "{} undeliverable to {} of {} recipients",
                what,
                failed,
                report.len()
            );
        }
    }
}
