//! In-process event channel.
//!
//! Services publish what happened; a spawned consumer logs it. The stale
//! view hints on transition outcomes tell presentation-layer callers which
//! queries to refetch; the events here are the server-side trail of the
//! same changes.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::lifecycle::status::OrderStatus;

/// Logical views a caller should consider stale after a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaleView {
    OrderList,
    OrderDetail,
    ScheduleBoard,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    OrderCreated(Uuid),
    OrderUpdated(Uuid),
    OrderDeleted(Uuid),
    OrderStatusChanged {
        order_id: Uuid,
        old_status: OrderStatus,
        new_status: OrderStatus,
    },
    OrderCancelled(Uuid),
    MaterialsHeld {
        order_id: Uuid,
        shortage_lines: usize,
    },
    MaterialsDispatched(Uuid),
    ScheduleSynced(Uuid),
    OutsourceStatusChanged {
        outsource_id: Uuid,
        new_status: String,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Best-effort publish. A full or closed channel is logged and dropped;
    /// events are informational and never gate the originating write.
    pub async fn send(&self, event: Event) {
        if let Err(e) = self.sender.send(event).await {
            warn!(error = %e, "dropping event, channel unavailable");
        }
    }
}

/// Build a connected sender/receiver pair.
pub fn channel(buffer: usize) -> (EventSender, mpsc::Receiver<Event>) {
    let (tx, rx) = mpsc::channel(buffer);
    (EventSender::new(tx), rx)
}

/// Drain the event channel, logging each event. Spawned once at startup.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("starting event processing loop");
    while let Some(event) = rx.recv().await {
        match &event {
            Event::OrderStatusChanged {
                order_id,
                old_status,
                new_status,
            } => {
                info!(%order_id, %old_status, %new_status, "order status changed");
            }
            Event::MaterialsHeld {
                order_id,
                shortage_lines,
            } => {
                if *shortage_lines > 0 {
                    warn!(%order_id, shortage_lines, "materials held with shortages");
                } else {
                    info!(%order_id, "materials held");
                }
            }
            other => info!(event = ?other, "event"),
        }
    }
    info!("event channel closed, stopping event loop");
}
