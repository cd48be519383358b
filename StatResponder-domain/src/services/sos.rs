//! SOS alert, preparedness summaries and the built-in directory of local
//! emergency services

use std::fmt::Write as _;

use serde::Serialize;

use crate::entities::{EmergencyContact, LocationStatus, MedicalInfo};

/// What the SOS button reports when triggered
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SosReport {
    /// Multi-line alert text
    pub message: String,
    /// Number the user is prompted to call
    pub emergency_number: String,
    /// `tel:` link for dialling the emergency number
    pub tel_uri: String,
    /// Name of the contact that would be notified first
    pub primary_contact: Option<String>,
    /// Whether any medical info would be shared
    pub medical_info_available: bool,
}

impl SosReport {
    /// Summarize the user's situation for an SOS alert
    pub fn build(
        contacts: &[EmergencyContact],
        medical_info: Option<&MedicalInfo>,
        location: &LocationStatus,
        emergency_number: &str,
    ) -> Self {
        let mut message = String::from("Emergency SOS initiated!\n");

        match location {
            LocationStatus::Known(loc) => {
                let _ = writeln!(message, "Current Location: {}", loc);
            }
            LocationStatus::Unavailable(reason) => {
                let _ = writeln!(message, "Location: Could not be determined ({})", reason);
            }
            LocationStatus::Pending => message.push_str("Location: Fetching...\n"),
        }

        let primary_contact = contacts.first().map(|c| c.name.clone());
        match &primary_contact {
            Some(name) => {
                let _ = writeln!(message, "Primary emergency contact ({}) will be notified.", name);
            }
            None => message.push_str("No emergency contacts configured to notify.\n"),
        }

        let medical_info_available = medical_info.map_or(false, MedicalInfo::has_content);
        if medical_info_available {
            message.push_str("Medical information is available and will be shared with responders.\n");
        } else {
            message.push_str("No critical medical information available to share.\n");
        }

        let _ = writeln!(message, "Prompting call to emergency number: {}.", emergency_number);

        Self {
            message,
            emergency_number: emergency_number.to_string(),
            tel_uri: format!("tel:{}", emergency_number),
            primary_contact,
            medical_info_available,
        }
    }
}

/// Which list a directory entry belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryCategory {
    Hospital,
    Ambulance,
}

/// A local emergency service the user can call directly
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub name: &'static str,
    pub number: &'static str,
    pub category: DirectoryCategory,
}

impl DirectoryEntry {
    const fn hospital(name: &'static str, number: &'static str) -> Self {
        Self { name, number, category: DirectoryCategory::Hospital }
    }

    const fn ambulance(name: &'static str, number: &'static str) -> Self {
        Self { name, number, category: DirectoryCategory::Ambulance }
    }

    /// `tel:` link for dialling this service
    pub fn tel_uri(&self) -> String {
        format!("tel:{}", self.number)
    }
}

const EMERGENCY_DIRECTORY: &[DirectoryEntry] = &[
    DirectoryEntry::hospital("City General Hospital", "555-0101"),
    DirectoryEntry::hospital("County Medical Center", "555-0102"),
    DirectoryEntry::hospital("St. Luke's Emergency", "555-0103"),
    DirectoryEntry::hospital("Community Health Clinic (24h)", "555-0104"),
    DirectoryEntry::ambulance("Citywide Ambulance", "555-0201"),
    DirectoryEntry::ambulance("Rapid Response EMS", "555-0202"),
    DirectoryEntry::ambulance("County Paramedics", "555-0203"),
];

/// Entries of one category, in display order
pub fn emergency_directory(category: DirectoryCategory) -> impl Iterator<Item = &'static DirectoryEntry> {
    EMERGENCY_DIRECTORY.iter().filter(move |entry| entry.category == category)
}

/// Plain-text summary of everything responders should know, for copying
pub fn format_emergency_info(
    contacts: &[EmergencyContact],
    medical_info: Option<&MedicalInfo>,
    location: &LocationStatus,
) -> String {
    let mut text = String::from("EMERGENCY INFO:\n");

    match location {
        LocationStatus::Known(loc) => {
            let _ = writeln!(text, "Location: {}", loc);
        }
        LocationStatus::Unavailable(reason) => {
            let _ = writeln!(text, "Location: Not available ({})", reason);
        }
        LocationStatus::Pending => text.push_str("Location: Attempting to fetch...\n"),
    }

    text.push_str("\nMEDICAL INFO:\n");
    match medical_info {
        Some(info) => {
            for (label, value) in [
                ("Allergies", &info.allergies),
                ("Medications", &info.medications),
                ("Conditions", &info.conditions),
            ] {
                let value = if value.is_empty() { "None specified" } else { value.as_str() };
                let _ = writeln!(text, "{}: {}", label, value);
            }
        }
        None => text.push_str("No medical information provided.\n"),
    }

    text.push_str("\nEMERGENCY CONTACTS:\n");
    if contacts.is_empty() {
        text.push_str("No emergency contacts provided.\n");
    }
    for contact in contacts {
        let _ = writeln!(text, "{} ({}): {}", contact.name, contact.relationship, contact.phone_number);
    }

    text
}
