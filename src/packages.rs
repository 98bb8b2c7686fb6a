//! Package catalog
//!
//! Inquiries carry a [`PackageRef`] snapshot rather than a catalog id, so a
//! price or duration change after submission never alters an inquiry that
//! was already sent.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageKind {
    Umrah,
    Hajj,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Package {
    pub id: u32,
    pub name: &'static str,
    pub kind: PackageKind,
    pub price: &'static str,
    pub days: &'static str,
}

/// Denormalised copy of a package at inquiry time
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackageRef {
    pub name: String,
    pub price: String,
    pub duration_label: String,
}

impl Package {
    #[must_use]
    pub fn snapshot(&self) -> PackageRef {
        PackageRef {
            name: self.name.to_string(),
            price: self.price.to_string(),
            duration_label: self.days.to_string(),
        }
    }
}

pub static CATALOG: [Package; 6] = [
    Package {
        id: 1,
        name: "Umrah Regular",
        kind: PackageKind::Umrah,
        price: "Rp 28.500.000",
        days: "9 Days",
    },
    Package {
        id: 2,
        name: "Umrah Plus",
        kind: PackageKind::Umrah,
        price: "Rp 35.500.000",
        days: "12 Days",
    },
    Package {
        id: 3,
        name: "Umrah VIP",
        kind: PackageKind::Umrah,
        price: "Rp 55.000.000",
        days: "14 Days",
    },
    Package {
        id: 4,
        name: "Hajj Regular",
        kind: PackageKind::Hajj,
        price: "Rp 180.000.000",
        days: "40 Days",
    },
    Package {
        id: 5,
        name: "Hajj Plus",
        kind: PackageKind::Hajj,
        price: "Rp 250.000.000",
        days: "45 Days",
    },
    Package {
        id: 6,
        name: "Hajj VIP",
        kind: PackageKind::Hajj,
        price: "Rp 350.000.000",
        days: "50 Days",
    },
];

#[must_use]
pub fn find(id: u32) -> Option<&'static Package> {
    CATALOG.iter().find(|p| p.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_copies_display_fields() {
        let package = find(3).unwrap();
        let snapshot = package.snapshot();
        assert_eq!(snapshot.name, "Umrah VIP");
        assert_eq!(snapshot.price, "Rp 55.000.000");
        assert_eq!(snapshot.duration_label, "14 Days");
    }

    #[test]
    fn test_catalog_ids_are_unique() {
        for package in &CATALOG {
            assert_eq!(find(package.id), Some(package));
        }
        assert!(find(99).is_none());
    }
}
