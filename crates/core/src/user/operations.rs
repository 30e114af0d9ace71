use crate::storage::normalize_email_key;

use super::error::UserError;
use super::types::{Event, UserInfo};

/// Highest rating a coach can receive.
pub const MAX_RATING: u8 = 5;

/// Mean Earth radius used for great-circle distances.
const EARTH_RADIUS_METERS: f64 = 6_371_008.8;

/// Great-circle distance in meters between two points, using the haversine formula.
pub fn distance_meters(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_METERS * a.sqrt().asin()
}

/// Sorts users by distance from the given point, nearest first.
///
/// The sort is stable, so users at the same distance keep their input order.
pub fn sort_users_by_distance(users: Vec<UserInfo>, latitude: f64, longitude: f64) -> Vec<UserInfo> {
    let mut with_distance: Vec<(f64, UserInfo)> = users
        .into_iter()
        .map(|user| {
            let d = distance_meters(
                latitude,
                longitude,
                user.address.latitude,
                user.address.longitude,
            );
            (d, user)
        })
        .collect();

    with_distance.sort_by(|(a, _), (b, _)| a.total_cmp(b));
    with_distance.into_iter().map(|(_, user)| user).collect()
}

/// Returns a copy of `user` with `events` appended to its agenda.
pub fn append_events(user: &UserInfo, events: &[Event]) -> UserInfo {
    let mut updated = user.clone();
    updated.events.extend_from_slice(events);
    updated
}

/// Returns a copy of `coach` with `rating` recorded for `rater_email`.
///
/// A later rating from the same rater replaces the earlier one.
pub fn add_rating(coach: &UserInfo, rater_email: &str, rating: u8) -> Result<UserInfo, UserError> {
    if !coach.coach {
        return Err(UserError::NotACoach(coach.email.clone()));
    }
    if rating > MAX_RATING {
        return Err(UserError::RatingOutOfRange {
            rating,
            max: MAX_RATING,
        });
    }

    let mut updated = coach.clone();
    updated
        .ratings
        .insert(normalize_email_key(rater_email), rating);
    Ok(updated)
}

/// Average rating of a coach, rounded to the nearest integer. Zero when unrated.
pub fn average_rating(coach: &UserInfo) -> Result<u8, UserError> {
    if !coach.coach {
        return Err(UserError::NotACoach(coach.email.clone()));
    }
    if coach.ratings.is_empty() {
        return Ok(0);
    }

    let sum: u32 = coach.ratings.values().map(|r| u32::from(*r)).sum();
    let mean = f64::from(sum) / coach.ratings.len() as f64;
    Ok(mean.round() as u8)
}

/// Returns a copy of `user` with `contact` prepended to its chat contacts,
/// or `None` when the contact is already present.
pub fn prepend_chat_contact(user: &UserInfo, contact: &str) -> Option<UserInfo> {
    if user.chat_contacts.iter().any(|c| c == contact) {
        return None;
    }
    let mut updated = user.clone();
    updated.chat_contacts.insert(0, contact.to_string());
    Some(updated)
}
