//! Seeded partner registry.
//!
//! The deployment ships a fixed partner table covering codes `AA`..`BE`; the
//! `location_partner_code` counter starts above this range so freshly minted
//! codes continue from where the seed ends. Stored partner rows override a
//! seeded entry with the same code.

/// One seeded partner/machine mapping.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SeededPartner {
    pub partner_code: &'static str,
    pub partner_name: &'static str,
    pub machine_specification: &'static str,
}

/// Seeded partners in dropdown order. `AW` was never assigned.
pub const SEEDED_PARTNERS: &[SeededPartner] = &[
    SeededPartner { partner_code: "AA", partner_name: "Unknown", machine_specification: "" },
    SeededPartner { partner_code: "AB", partner_name: "Notpla - Machine Unknown", machine_specification: "" },
    SeededPartner { partner_code: "AC", partner_name: "Broadway", machine_specification: "" },
    SeededPartner { partner_code: "AD", partner_name: "Polytechs", machine_specification: "" },
    SeededPartner { partner_code: "AE", partner_name: "PES", machine_specification: "" },
    SeededPartner { partner_code: "AF", partner_name: "Poloplast", machine_specification: "" },
    SeededPartner { partner_code: "AG", partner_name: "Aimplas", machine_specification: "" },
    SeededPartner { partner_code: "AH", partner_name: "Plastribution", machine_specification: "" },
    SeededPartner { partner_code: "AI", partner_name: "Vegeplast", machine_specification: "" },
    SeededPartner { partner_code: "AJ", partner_name: "Viscofan - Cast", machine_specification: "" },
    SeededPartner { partner_code: "AK", partner_name: "Viscofan - Extruded", machine_specification: "" },
    SeededPartner { partner_code: "AL", partner_name: "Notpla - Threetec", machine_specification: "" },
    SeededPartner { partner_code: "AM", partner_name: "Notpla - Leistritz 27mm", machine_specification: "" },
    SeededPartner { partner_code: "AN", partner_name: "ARCHIVED POST BARREL REPLACEMENT Notpla - Boy 22A", machine_specification: "" },
    SeededPartner { partner_code: "AO", partner_name: "Notpla - Collin", machine_specification: "" },
    SeededPartner { partner_code: "AP", partner_name: "Polytechs - Boy 22A", machine_specification: "" },
    SeededPartner { partner_code: "AQ", partner_name: "Polytechs - Maris 51", machine_specification: "" },
    SeededPartner { partner_code: "AR", partner_name: "DeSter", machine_specification: "" },
    SeededPartner { partner_code: "AS", partner_name: "PES - Sapphire, Spoons", machine_specification: "" },
    SeededPartner { partner_code: "AT", partner_name: "Notpla - Boy 22 A", machine_specification: "" },
    SeededPartner { partner_code: "AU", partner_name: "Warwick e-victory 60 ISO 527 Mould", machine_specification: "" },
    SeededPartner { partner_code: "AV", partner_name: "Mclaren - 150 Spoon", machine_specification: "" },
    SeededPartner { partner_code: "AX", partner_name: "Notpla - Engel Victory 210/50 Spex", machine_specification: "" },
    SeededPartner { partner_code: "AY", partner_name: "QUB - Arburg - Family Tool", machine_specification: "" },
    SeededPartner { partner_code: "AZ", partner_name: "QUB - Boy - Clip Tool", machine_specification: "" },
    SeededPartner { partner_code: "BA", partner_name: "Pontacol - 29 L/D Extruder", machine_specification: "" },
    SeededPartner { partner_code: "BB", partner_name: "DAME - Engel 50T", machine_specification: "" },
    SeededPartner { partner_code: "BC", partner_name: "Ecozema - Ice Cream Spoon", machine_specification: "" },
    SeededPartner { partner_code: "BD", partner_name: "Pontacol - Pilot Scale Extruder", machine_specification: "" },
    SeededPartner { partner_code: "BE", partner_name: "Notpla Masterbatch", machine_specification: "" },
];

/// Look up a seeded partner by its code.
pub fn seeded_partner(code: &str) -> Option<&'static SeededPartner> {
    SEEDED_PARTNERS
        .iter()
        .find(|partner| partner.partner_code == code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use formulary_core::PartnerCode;

    #[test]
    fn seed_codes_are_valid_and_unique() {
        let mut seen = std::collections::BTreeSet::new();
        for partner in SEEDED_PARTNERS {
            PartnerCode::parse(partner.partner_code).expect("valid code");
            assert!(seen.insert(partner.partner_code), "{}", partner.partner_code);
        }
    }

    #[test]
    fn lookup_by_code() {
        assert_eq!(seeded_partner("AC").unwrap().partner_name, "Broadway");
        assert!(seeded_partner("BF").is_none());
    }
}
