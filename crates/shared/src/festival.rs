//! Display helpers for festival records.
//!
//! Festival data comes from the national open-data export, where every
//! field but the name is optional and blank strings are common.
use crate::models::Festival;

/// Shown when a festival has no usable period.
pub const UNKNOWN_PERIOD: &str = "Période non spécifiée";

/// Dominant artistic discipline, as used to pick a marker icon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Discipline {
    Cinema,
    Music,
    Books,
    Performing,
    Other,
}

impl Discipline {
    /// Classify a free-text discipline. The first matching keyword wins, in
    /// the order cinema, music, books, performing arts.
    pub fn classify(text: &str) -> Discipline {
        if text.contains("Cinéma") {
            Discipline::Cinema
        } else if text.contains("Musique") {
            Discipline::Music
        } else if text.contains("Livre") {
            Discipline::Books
        } else if text.contains("Spectacle") {
            Discipline::Performing
        } else {
            Discipline::Other
        }
    }
}

impl std::fmt::Display for Discipline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Discipline::Cinema => write!(f, "cinema"),
            Discipline::Music => write!(f, "music"),
            Discipline::Books => write!(f, "books"),
            Discipline::Performing => write!(f, "performing arts"),
            Discipline::Other => write!(f, "other"),
        }
    }
}

fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl Festival {
    /// Postal address built from the parts that are present, in street
    /// number, street type, street name, complement, postcode, town order.
    pub fn full_address(&self) -> String {
        [
            &self.street_number,
            &self.street_type,
            &self.street_name,
            &self.address_complement,
            &self.postcode,
            &self.town,
        ]
        .into_iter()
        .filter_map(present)
        .collect::<Vec<_>>()
        .join(" ")
    }

    pub fn period_label(&self) -> &str {
        present(&self.period).unwrap_or(UNKNOWN_PERIOD)
    }

    pub fn discipline_kind(&self) -> Option<Discipline> {
        present(&self.discipline).map(Discipline::classify)
    }

    /// `mailto:` link for the contact address, if any.
    pub fn contact_link(&self) -> Option<String> {
        present(&self.email).map(|email| format!("mailto:{email}"))
    }
}
