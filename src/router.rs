//! Best-effort broadcast router
//!
//! Fans structured events and raw audio frames out to role-selected
//! audiences. Delivery is independent per recipient: a dead outbound queue
//! is reported in the result list and never aborts the rest of the fan-out
//! or surfaces to the caller. No retries, no buffering beyond each
//! recipient's own queue; a message sent to a connection mid-teardown is
//! lost.

use std::sync::Arc;

use bytes::Bytes;

use crate::protocol::{Outbound, ServerEvent};
use crate::registry::{Connection, ConnectionId, Registry, Role};

/// Outcome of one recipient within a fan-out call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    pub connection: ConnectionId,
    pub role: Role,
    pub delivered: bool,
}

/// Role-audience fan-out over the registry
#[derive(Debug, Clone)]
pub struct Router {
    registry: Arc<Registry>,
}

impl Router {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    /// Send `event` to every connection in the given audience roles.
    ///
    /// Returns one [`Delivery`] per recipient; callers may log or ignore
    /// the failures.
    pub fn send_to(&self, audience: &[Role], event: &ServerEvent) -> Vec<Delivery> {
        let mut report = Vec::new();
        for role in audience {
            for (connection, tx) in self.registry.snapshot(*role) {
                let delivered = tx.send(Outbound::Event(event.clone())).is_ok();
                report.push(Delivery {
                    connection,
                    role: *role,
                    delivered,
                });
            }
        }
        report
    }

    /// Send `event` to all three audiences
    pub fn send_to_all(&self, event: &ServerEvent) -> Vec<Delivery> {
        self.send_to(&Role::ALL, event)
    }

    /// Send `event` to a single connection.
    ///
    /// Used for replies that must reach only the originator, such as the
    /// `blocked` notice. A connection that is already gone reports an
    /// undelivered outcome, same as in a fan-out.
    pub fn send_to_connection(&self, conn: &Connection, event: &ServerEvent) -> Delivery {
        let delivered = self
            .registry
            .snapshot(conn.role)
            .into_iter()
            .find(|(id, _)| *id == conn.id)
            .map(|(_, tx)| tx.send(Outbound::Event(event.clone())).is_ok())
            .unwrap_or(false);
        Delivery {
            connection: conn.id,
            role: conn.role,
            delivered,
        }
    }

    /// Forward an opaque audio frame to every connection under `role`.
    ///
    /// The frame is cheaply reference-counted; each recipient sees the same
    /// bytes, one outbound frame per inbound frame.
    pub fn send_frame(&self, role: Role, frame: Bytes) -> Vec<Delivery> {
        let mut report = Vec::new();
        for (connection, tx) in self.registry.snapshot(role) {
            let delivered = tx.send(Outbound::Frame(frame.clone())).is_ok();
            report.push(Delivery {
                connection,
                role,
                delivered,
            });
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ServerEvent;

    #[test]
    fn test_audience_selection() {
        let registry = Arc::new(Registry::new());
        let router = Router::new(registry.clone());

        let (_p, mut rx_p) = registry.admit(Role::Player);
        let (_c, mut rx_c) = registry.admit(Role::Controller);
        let (_m, mut rx_m) = registry.admit(Role::Master);

        let report = router.send_to(&[Role::Player, Role::Controller], &ServerEvent::Stop);
        assert_eq!(report.len(), 2);
        assert!(report.iter().all(|d| d.delivered));

        assert!(rx_p.try_recv().is_ok());
        assert!(rx_c.try_recv().is_ok());
        assert!(rx_m.try_recv().is_err());
    }

    #[test]
    fn test_dead_recipient_does_not_abort_fanout() {
        let registry = Arc::new(Registry::new());
        let router = Router::new(registry.clone());

        let (_a, rx_a) = registry.admit(Role::Player);
        let (_b, mut rx_b) = registry.admit(Role::Player);
        drop(rx_a);

        let report = router.send_to(&[Role::Player], &ServerEvent::Pause);
        assert_eq!(report.len(), 2);
        assert_eq!(report.iter().filter(|d| d.delivered).count(), 1);
        assert!(rx_b.try_recv().is_ok());
    }

    #[test]
    fn test_send_to_single_connection() {
        let registry = Arc::new(Registry::new());
        let router = Router::new(registry.clone());

        let (a, mut rx_a) = registry.admit(Role::Controller);
        let (_b, mut rx_b) = registry.admit(Role::Controller);

        let delivery = router.send_to_connection(&a, &ServerEvent::MasterStop);
        assert!(delivery.delivered);
        assert!(rx_a.try_recv().is_ok());
        assert!(rx_b.try_recv().is_err());

        registry.remove(&a);
        let delivery = router.send_to_connection(&a, &ServerEvent::MasterStop);
        assert!(!delivery.delivered);
    }

    #[test]
    fn test_frame_goes_to_one_role_only() {
        let registry = Arc::new(Registry::new());
        let router = Router::new(registry.clone());

        let (_p, mut rx_p) = registry.admit(Role::Player);
        let (_c, mut rx_c) = registry.admit(Role::Controller);

        let frame = Bytes::from_static(b"\x01\x02\x03");
        let report = router.send_frame(Role::Player, frame.clone());
        assert_eq!(report.len(), 1);

        match rx_p.try_recv().unwrap() {
            Outbound::Frame(received) => assert_eq!(received, frame),
            other => panic!("expected frame, got {other:?}"),
        }
        assert!(rx_c.try_recv().is_err());
    }
}
