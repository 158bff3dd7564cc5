//! Multi-stop navigation link building.
//!
//! Takes the motorcycle en-route snapshot in delivery order and emits one
//! Google Maps directions URL per block of stops, chaining blocks so each
//! leg departs from where the previous one ended. The URL format is fixed
//! by the navigation provider and must not change shape:
//! `https://www.google.com/maps/dir/?api=1&travelmode=driving&origin=..&destination=..&waypoints=a|b`
//! with percent-encoded addresses and a raw `|` separating waypoints.

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use models::service::{self, Provider, ServiceStatus};

use crate::errors::ServiceError;

const MAPS_DIR_ENDPOINT: &str = "https://www.google.com/maps/dir/?api=1&travelmode=driving";

/// How the requesting client wants its navigation links shaped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientProfile {
    /// Maximum stops per link.
    pub waypoint_limit: usize,
    /// Leave the first leg's origin to the device's live location.
    pub device_origin: bool,
    /// Append `dir_action=navigate` so the client starts turn-by-turn
    /// guidance immediately.
    pub immediate_navigation: bool,
}

impl ClientProfile {
    pub fn desktop(waypoint_limit: usize) -> Self {
        Self { waypoint_limit: waypoint_limit.max(1), device_origin: false, immediate_navigation: false }
    }

    pub fn mobile(waypoint_limit: usize) -> Self {
        Self { waypoint_limit: waypoint_limit.max(1), device_origin: true, immediate_navigation: true }
    }

    /// Pick a profile from the client capability hint.
    pub fn from_user_agent(user_agent: &str, desktop_limit: usize, mobile_limit: usize) -> Self {
        let ua = user_agent.to_ascii_lowercase();
        let mobile = ["mobile", "android", "iphone", "ipad"].iter().any(|m| ua.contains(m));
        if mobile {
            Self::mobile(mobile_limit)
        } else {
            Self::desktop(desktop_limit)
        }
    }
}

/// One routable delivery stop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stop {
    pub id: Uuid,
    pub address: String,
}

/// The built links plus the services that had to be left out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutePlan {
    pub urls: Vec<String>,
    pub skipped: Vec<Uuid>,
}

/// Split services into routable stops and skipped ids.
///
/// A service without a complete address is reported, not an error; the
/// run continues with whatever can be routed.
pub fn collect_stops(services: &[service::Model]) -> (Vec<Stop>, Vec<Uuid>) {
    let mut stops = Vec::new();
    let mut skipped = Vec::new();
    for svc in services {
        match svc.full_address() {
            Some(address) => stops.push(Stop { id: svc.id, address }),
            None => skipped.push(svc.id),
        }
    }
    (stops, skipped)
}

fn encode(text: &str) -> String {
    utf8_percent_encode(text, NON_ALPHANUMERIC).to_string()
}

/// Build the chained directions URLs for an ordered stop list.
pub fn build_links(
    stops: &[Stop],
    origin: Option<&str>,
    profile: &ClientProfile,
) -> Result<Vec<String>, ServiceError> {
    if stops.is_empty() {
        return Err(ServiceError::NoValidAddresses);
    }
    let mut leg_origin: Option<String> = if profile.device_origin {
        None
    } else {
        Some(origin.ok_or(ServiceError::MissingOrigin)?.to_string())
    };

    let mut urls = Vec::new();
    for block in stops.chunks(profile.waypoint_limit) {
        let destination = &block[block.len() - 1];
        let waypoints = &block[..block.len() - 1];

        let mut url = String::from(MAPS_DIR_ENDPOINT);
        if let Some(from) = &leg_origin {
            url.push_str("&origin=");
            url.push_str(&encode(from));
        }
        url.push_str("&destination=");
        url.push_str(&encode(&destination.address));
        if !waypoints.is_empty() {
            url.push_str("&waypoints=");
            let joined: Vec<String> = waypoints.iter().map(|s| encode(&s.address)).collect();
            url.push_str(&joined.join("|"));
        }
        if profile.immediate_navigation {
            url.push_str("&dir_action=navigate");
        }
        urls.push(url);

        // The next leg departs from where this one ends.
        leg_origin = Some(destination.address.clone());
    }
    Ok(urls)
}

/// Filter, order and link the current delivery run.
pub fn plan_route(
    services: &[service::Model],
    origin: Option<&str>,
    profile: &ClientProfile,
) -> Result<RoutePlan, ServiceError> {
    let (stops, skipped) = collect_stops(services);
    let urls = build_links(&stops, origin, profile)?;
    Ok(RoutePlan { urls, skipped })
}

/// The motorcycle en-route snapshot in delivery order (route slot, then id).
pub async fn en_route_motorcycle(
    db: &DatabaseConnection,
) -> Result<Vec<service::Model>, ServiceError> {
    service::Entity::find()
        .filter(service::Column::Status.eq(ServiceStatus::EnRoute))
        .filter(service::Column::Provider.eq(Provider::Motorcycle))
        .order_by_asc(service::Column::RouteOrder)
        .order_by_asc(service::Column::Id)
        .all(db)
        .await
        .map_err(ServiceError::db)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stop(n: usize) -> Stop {
        Stop { id: Uuid::new_v4(), address: format!("Rua {}, {}, Campinas - SP", n, n) }
    }

    #[test]
    fn single_block_has_origin_destination_and_waypoints() {
        let stops = vec![stop(1), stop(2), stop(3)];
        let profile = ClientProfile::desktop(9);
        let urls = build_links(&stops, Some("Base, 1, Campinas - SP"), &profile).unwrap();
        assert_eq!(urls.len(), 1);
        let url = &urls[0];
        assert!(url.starts_with("https://www.google.com/maps/dir/?api=1&travelmode=driving&origin="));
        assert!(url.contains("&destination="));
        assert!(url.contains("&waypoints="));
        // Two waypoints, pipe-separated and individually encoded.
        let waypoints = url.split("&waypoints=").nth(1).unwrap();
        assert_eq!(waypoints.split('|').count(), 2);
        assert!(!url.ends_with("&dir_action=navigate"));
    }

    #[test]
    fn eleven_stops_at_limit_nine_yield_two_chained_urls() {
        let stops: Vec<Stop> = (1..=11).map(stop).collect();
        let profile = ClientProfile::desktop(9);
        let urls = build_links(&stops, Some("Base, 1, Campinas - SP"), &profile).unwrap();
        assert_eq!(urls.len(), 2);

        let first_destination = urls[0].split("&destination=").nth(1).unwrap();
        let first_destination = first_destination.split('&').next().unwrap();
        let second_origin = urls[1].split("&origin=").nth(1).unwrap();
        let second_origin = second_origin.split('&').next().unwrap();
        assert_eq!(first_destination, second_origin);
    }

    #[test]
    fn mobile_first_leg_omits_origin_and_navigates() {
        let stops: Vec<Stop> = (1..=5).map(stop).collect();
        let profile = ClientProfile::mobile(3);
        let urls = build_links(&stops, None, &profile).unwrap();
        assert_eq!(urls.len(), 2);
        assert!(!urls[0].contains("&origin="));
        assert!(urls[0].ends_with("&dir_action=navigate"));
        // Later legs still chain from the previous destination.
        assert!(urls[1].contains("&origin="));
    }

    #[test]
    fn desktop_without_origin_fails() {
        let stops = vec![stop(1)];
        let err = build_links(&stops, None, &ClientProfile::desktop(9)).unwrap_err();
        assert!(matches!(err, ServiceError::MissingOrigin));
    }

    #[test]
    fn empty_stop_list_is_reported() {
        let err = build_links(&[], Some("Base"), &ClientProfile::desktop(9)).unwrap_err();
        assert!(matches!(err, ServiceError::NoValidAddresses));
    }

    #[test]
    fn addresses_are_percent_encoded_with_raw_pipe_separator() {
        let stops = vec![
            Stop { id: Uuid::new_v4(), address: "Rua A, 1 - SP".into() },
            Stop { id: Uuid::new_v4(), address: "Rua B, 2 - SP".into() },
            Stop { id: Uuid::new_v4(), address: "Rua C, 3 - SP".into() },
        ];
        let urls = build_links(&stops, Some("Base X"), &ClientProfile::desktop(9)).unwrap();
        let url = &urls[0];
        assert!(url.contains("origin=Base%20X"));
        assert!(url.contains("waypoints=Rua%20A%2C%201%20%2D%20SP|Rua%20B%2C%202%20%2D%20SP"));
    }

    #[test]
    fn user_agent_hint_selects_the_profile() {
        let desktop = ClientProfile::from_user_agent("Mozilla/5.0 (X11; Linux x86_64)", 9, 3);
        assert_eq!(desktop, ClientProfile::desktop(9));
        let mobile = ClientProfile::from_user_agent(
            "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) Mobile/15E148",
            9,
            3,
        );
        assert_eq!(mobile, ClientProfile::mobile(3));
    }

    #[test]
    fn incomplete_addresses_are_skipped_not_fatal() {
        use chrono::Utc;
        use models::service::{Provider, ServiceKind};

        let complete = service::Model {
            id: Uuid::new_v4(),
            neighborhood: "Centro".into(),
            kind: ServiceKind::Sale,
            document: "NF-1".into(),
            provider: Provider::Motorcycle,
            fee_applied: false,
            card_machine: false,
            value: 0.0,
            note: String::new(),
            created_at: Utc::now().into(),
            status: ServiceStatus::EnRoute,
            en_route_at: Some(Utc::now().into()),
            finished_at: None,
            cancelled_at: None,
            route_order: Some(1),
            postal_code: None,
            street: Some("Rua A".into()),
            house_number: Some(10),
            district: None,
            city: Some("Campinas".into()),
            state: Some("SP".into()),
            complement: None,
            user_id: Uuid::new_v4(),
        };
        let mut incomplete = complete.clone();
        incomplete.id = Uuid::new_v4();
        incomplete.street = None;

        let plan = plan_route(
            &[complete.clone(), incomplete.clone()],
            Some("Base"),
            &ClientProfile::desktop(9),
        )
        .unwrap();
        assert_eq!(plan.urls.len(), 1);
        assert_eq!(plan.skipped, vec![incomplete.id]);
    }
}
