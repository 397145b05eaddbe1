//! WebSocket handler for realtime booking events
//!
//! Clients connect with `?token=<JWT>` (browsers cannot set headers on the
//! upgrade request). Non-admin callers only receive events that involve
//! them as guest or host.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::select;
use tracing::{debug, error, info, warn};

use crate::application::events::{EventMessage, SharedEventBus};
use crate::domain::UserRole;
use crate::infrastructure::crypto::{verify_token, JwtConfig};
use crate::interfaces::http::common::ApiResponse;

/// Query parameters for the event stream
#[derive(Debug, Default, Deserialize)]
pub struct EventFilter {
    pub token: Option<String>,
    pub listing_id: Option<String>,
    pub user_id: Option<String>,
    /// Comma-separated event types, e.g. `reservation_created,reservation_deleted`
    pub event_types: Option<String>,
}

impl EventFilter {
    pub fn matches(&self, message: &EventMessage) -> bool {
        let event = &message.event;

        if let Some(ref listing_id) = self.listing_id {
            if event.listing_id() != Some(listing_id.as_str()) {
                return false;
            }
        }

        if let Some(ref user_id) = self.user_id {
            if !event.involves_user(user_id) {
                return false;
            }
        }

        if let Some(ref types) = self.event_types {
            if !types.split(',').map(str::trim).any(|t| t == event.event_type()) {
                return false;
            }
        }

        true
    }
}

#[derive(Clone)]
pub struct NotificationState {
    pub event_bus: SharedEventBus,
    pub jwt_config: JwtConfig,
}

pub async fn ws_notifications_handler(
    ws: WebSocketUpgrade,
    State(state): State<NotificationState>,
    Query(mut filter): Query<EventFilter>,
) -> Response {
    let claims = match filter
        .token
        .as_deref()
        .map(|t| verify_token(t, &state.jwt_config))
    {
        Some(Ok(claims)) => claims,
        Some(Err(_)) | None => {
            return (
                StatusCode::UNAUTHORIZED,
                Json(ApiResponse::<()>::error("A valid token query parameter is required")),
            )
                .into_response();
        }
    };

    if claims.role() != UserRole::Admin {
        filter.user_id = Some(claims.sub.clone());
    }
    filter.token = None;

    info!(
        user_id = %claims.sub,
        listing_id = ?filter.listing_id,
        event_types = ?filter.event_types,
        "New notification WebSocket connection"
    );

    ws.on_upgrade(move |socket| handle_notification_socket(socket, state, filter))
}

async fn handle_notification_socket(
    socket: WebSocket,
    state: NotificationState,
    filter: EventFilter,
) {
    let (mut sender, mut receiver) = socket.split();
    let mut subscriber = state.event_bus.subscribe();

    let welcome = serde_json::json!({
        "type": "connected",
        "message": "Connected to booking event stream",
        "filter": {
            "listing_id": filter.listing_id,
            "user_id": filter.user_id,
            "event_types": filter.event_types
        }
    });

    if let Err(e) = sender
        .send(Message::Text(welcome.to_string().into()))
        .await
    {
        error!("Failed to send welcome message: {}", e);
        return;
    }

    loop {
        select! {
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Ping(data))) => {
                        if let Err(e) = sender.send(Message::Pong(data)).await {
                            error!("Failed to send pong: {}", e);
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        warn!("WebSocket error: {}", e);
                        break;
                    }
                    Some(Ok(_)) => {}
                }
            }

            event = subscriber.recv() => {
                let Some(event_msg) = event else {
                    warn!("Event bus closed");
                    break;
                };
                if !filter.matches(&event_msg) {
                    continue;
                }
                match serde_json::to_string(&event_msg) {
                    Ok(json) => {
                        if let Err(e) = sender.send(Message::Text(json.into())).await {
                            error!("Failed to send event: {}", e);
                            break;
                        }
                        debug!(event_type = event_msg.event.event_type(), "Event sent to client");
                    }
                    Err(e) => error!("Failed to serialize event: {}", e),
                }
            }
        }
    }

    info!("Notification WebSocket client disconnected");
}

pub fn create_notification_state(event_bus: SharedEventBus, jwt_config: JwtConfig) -> NotificationState {
    NotificationState {
        event_bus,
        jwt_config,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::events::{Event, ReservationDeletedEvent};
    use chrono::Utc;

    fn deleted(listing_id: &str, guest: &str, host: &str) -> EventMessage {
        EventMessage::new(Event::ReservationDeleted(ReservationDeletedEvent {
            reservation_id: "R1".into(),
            listing_id: listing_id.into(),
            user_id: guest.into(),
            host_id: host.into(),
            reason: "cancelled".into(),
            timestamp: Utc::now(),
        }))
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(EventFilter::default().matches(&deleted("L1", "G1", "H1")));
    }

    #[test]
    fn listing_and_user_filters_apply() {
        let filter = EventFilter {
            listing_id: Some("L1".into()),
            user_id: Some("H1".into()),
            ..Default::default()
        };
        assert!(filter.matches(&deleted("L1", "G1", "H1")));
        assert!(!filter.matches(&deleted("L2", "G1", "H1")));
        assert!(!filter.matches(&deleted("L1", "G1", "H9")));
    }

    #[test]
    fn event_type_list_is_comma_separated() {
        let filter = EventFilter {
            event_types: Some("reservation_created, reservation_deleted".into()),
            ..Default::default()
        };
        assert!(filter.matches(&deleted("L1", "G1", "H1")));

        let filter = EventFilter {
            event_types: Some("payment_status_changed".into()),
            ..Default::default()
        };
        assert!(!filter.matches(&deleted("L1", "G1", "H1")));
    }
}
