//! The map aggregate: a titled, ordered list of pins.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Coordinates, MapId, NormalizedAddress};

/// A pin as submitted by a user, before geocoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPin {
    /// Display name of the place.
    pub name: String,
    /// Address text exactly as typed.
    pub address: String,
    /// Free-form note; absent and empty are equivalent.
    #[serde(default)]
    pub note: Option<String>,
}

/// A pin whose address has been normalized and geocoded.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPin {
    /// Display name of the place.
    pub name: String,
    /// Normalized address that was geocoded.
    pub address: NormalizedAddress,
    /// Resolved location.
    pub coordinates: Coordinates,
    /// Free-form note, empty when none was given.
    pub note: String,
}

impl ResolvedPin {
    /// Attach coordinates to a raw pin.
    #[must_use]
    pub fn from_raw(raw: RawPin, address: NormalizedAddress, coordinates: Coordinates) -> Self {
        Self {
            name: raw.name,
            address,
            coordinates,
            note: raw.note.unwrap_or_default(),
        }
    }
}

/// Map metadata written once at creation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMap {
    /// Share identifier (primary key).
    pub id: MapId,
    /// Non-empty title.
    pub title: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// A pin as stored and served back to viewers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pin {
    /// Display name of the place.
    pub name: String,
    /// Normalized address.
    pub address: String,
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
    /// Free-form note, empty string when unset.
    pub note: String,
}

impl From<ResolvedPin> for Pin {
    fn from(pin: ResolvedPin) -> Self {
        Self {
            name: pin.name,
            address: pin.address.into_inner(),
            lat: pin.coordinates.lat,
            lng: pin.coordinates.lng,
            note: pin.note,
        }
    }
}

/// A stored map together with its pins, in submission order.
#[derive(Debug, Clone, PartialEq)]
pub struct SharedMap {
    /// Share identifier.
    pub id: MapId,
    /// Title.
    pub title: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Expiry; never set by the current service.
    pub expires_at: Option<DateTime<Utc>>,
    /// Owner; never set by the current service.
    pub owner: Option<String>,
    /// Number of successful fetches, including the one that returned this value.
    pub view_count: i64,
    /// Pins in the order they were submitted.
    pub pins: Vec<Pin>,
}

/// Result of creating a map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedMap {
    /// Share identifier of the new map.
    pub map_id: MapId,
    /// Absolute URL viewers open to see the map.
    pub share_url: String,
}
