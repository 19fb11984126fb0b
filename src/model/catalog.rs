use serde::Serialize;
use utoipa::ToSchema;

const DEFAULT_MANAGERS: &[&str] = &[
    "Ayub Sait",
    "Rakesh Babu",
    "John Joseph",
    "Naveen Kumar M",
    "Sangeetha RM",
    "Joy Matabar",
    "Sonu Kumar",
    "Samsudeen",
    "Tauseef",
    "Bablu C",
    "Umesh M",
    "Selva Kumar",
    "Srividya",
];

// The last three are roster placeholders rather than physical sites.
const DEFAULT_KITCHENS: &[&str] = &[
    "ANR01.BLR22", "BSK01.BLR19", "WFD01.BLR06", "MAR01.BLR05", "BTM01.BLR03", "IND01.BLR01",
    "HSR01.BLR02", "VDP01.CHN02", "MGP01.CHN01", "CMP01.CHN10", "KLN01.BLR09", "TKR01.BLR29",
    "CRN01.BLR17", "SKN01.BLR07", "HNR01.BLR16", "RTN01.BLR23", "YLK01.BLR15", "NBR01.BLR21",
    "PGD01.CHN06", "PRR01.CHN04", "FZT01.BLR20", "ECT01.BLR24", "SJP01.BLR08", "KPR01.BLR41",
    "BSN01.BLR40", "VNR01.BLR18", "SDP01.BLR34", "TCP01.BLR27", "BOM01.BLR04", "CK-Corp",
    "KOR01.BLR12", "SKM01.CHN03", "WFD02.BLR13", "KDG01.BLR14", "BMS01.BLR26", "BLD01.BLR25",
    "Week Off", "Comp-Off", "Leave",
];

/// Enumerated selections offered to field managers.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Catalog {
    pub managers: Vec<String>,
    pub kitchens: Vec<String>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            managers: DEFAULT_MANAGERS.iter().map(|m| m.to_string()).collect(),
            kitchens: DEFAULT_KITCHENS.iter().map(|k| k.to_string()).collect(),
        }
    }
}

impl Catalog {
    /// Case-sensitive membership; empty names are never valid.
    pub fn has_manager(&self, name: &str) -> bool {
        !name.is_empty() && self.managers.iter().any(|m| m == name)
    }

    pub fn has_kitchen(&self, name: &str) -> bool {
        !name.is_empty() && self.kitchens.iter().any(|k| k == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn membership_is_exact() {
        let catalog = Catalog::default();
        assert!(catalog.has_manager("Ayub Sait"));
        assert!(!catalog.has_manager("ayub sait"));
        assert!(!catalog.has_manager(""));
        assert!(catalog.has_kitchen("Week Off"));
        assert!(!catalog.has_kitchen("ANR01"));
    }
}
