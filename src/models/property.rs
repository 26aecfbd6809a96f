//! Represents a venue profile, one per owner, and its ordered photo list.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// Maximum number of photos a venue can display.
pub const MAX_IMAGES: usize = 5;

/// A reference from a profile into the blob store.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ImageRef {
    /// Public URL the photo is served from.
    pub url: String,

    /// Blob store key; unique within one profile.
    pub filename: String,
}

/// Ordered, size-bounded photo list. Insertion order is display order.
#[derive(Serialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct ImageList(Vec<ImageRef>);

impl ImageList {
    #[cfg(test)]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a list from `images`, keeping the first [`MAX_IMAGES`] entries.
    ///
    /// Entries past the cap are returned as overflow, in order. Later entries
    /// repeating a filename already in the list are discarded and not reported
    /// as overflow, since their blob is still referenced.
    pub fn capped(images: Vec<ImageRef>) -> (Self, Vec<ImageRef>) {
        let mut seen = HashSet::new();
        let mut kept = Vec::with_capacity(MAX_IMAGES);
        let mut overflow = Vec::new();
        for image in images {
            if !seen.insert(image.filename.clone()) {
                continue;
            }
            if kept.len() < MAX_IMAGES {
                kept.push(image);
            } else {
                overflow.push(image);
            }
        }
        (Self(kept), overflow)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ImageRef> {
        self.0.iter()
    }

    pub fn contains(&self, filename: &str) -> bool {
        self.0.iter().any(|image| image.filename == filename)
    }

    #[cfg(test)]
    pub fn filenames(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|image| image.filename.as_str())
    }
}

/// Kind of function a venue hosts. Serialized as the label shown on forms.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FunctionType {
    #[serde(rename = "B'day")]
    Birthday,
    Engagement,
    Wedding,
    #[serde(rename = "Thread Ceremony")]
    ThreadCeremony,
    #[serde(rename = "Puja Function")]
    PujaFunction,
    #[serde(rename = "Get-together")]
    GetTogether,
    Party,
}

impl FunctionType {
    pub const ALL: [FunctionType; 7] = [
        FunctionType::Birthday,
        FunctionType::Engagement,
        FunctionType::Wedding,
        FunctionType::ThreadCeremony,
        FunctionType::PujaFunction,
        FunctionType::GetTogether,
        FunctionType::Party,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FunctionType::Birthday => "B'day",
            FunctionType::Engagement => "Engagement",
            FunctionType::Wedding => "Wedding",
            FunctionType::ThreadCeremony => "Thread Ceremony",
            FunctionType::PujaFunction => "Puja Function",
            FunctionType::GetTogether => "Get-together",
            FunctionType::Party => "Party",
        }
    }
}

/// Amenities a venue offers.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VenueService {
    #[serde(rename = "Cooking utensils")]
    CookingUtensils,
    #[serde(rename = "Internal Catering")]
    InternalCatering,
    #[serde(rename = "External Catering")]
    ExternalCatering,
    Parking,
    Decoration,
}

impl VenueService {
    pub const ALL: [VenueService; 5] = [
        VenueService::CookingUtensils,
        VenueService::InternalCatering,
        VenueService::ExternalCatering,
        VenueService::Parking,
        VenueService::Decoration,
    ];

    pub fn label(self) -> &'static str {
        match self {
            VenueService::CookingUtensils => "Cooking utensils",
            VenueService::InternalCatering => "Internal Catering",
            VenueService::ExternalCatering => "External Catering",
            VenueService::Parking => "Parking",
            VenueService::Decoration => "Decoration",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Location {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub address: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
}

/// Everything an owner edits on the profile form apart from photos.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct PropertyAttributes {
    pub name: String,
    pub location: Location,
    pub contact: String,
    pub mail_id: Option<String>,
    pub office_hours: Option<String>,
    pub capacity: i64,
    /// Flat price per booking.
    pub price: i64,
    pub size: i64,
    pub function_types: Vec<FunctionType>,
    pub services: Vec<VenueService>,
    pub cctv: bool,
    pub dressing_room: bool,
    pub allow_booking: bool,
    pub description: String,
}

/// The persisted venue document.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct PropertyProfile {
    pub id: Uuid,

    /// Owning account; never changes after creation.
    pub owner_id: Uuid,

    #[serde(flatten)]
    pub attributes: PropertyAttributes,

    pub images: ImageList,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
