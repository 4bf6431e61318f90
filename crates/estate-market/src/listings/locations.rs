//! Districts of Suriname and their sub-districts (ressorten), keyed by lowercase district name.

const DISTRICTS: &[(&str, &[&str])] = &[
    (
        "paramaribo",
        &[
            "Beekhuizen",
            "Blauwgrond",
            "Centrum",
            "Flora",
            "Latour",
            "Livorno",
            "Munder",
            "Pontbuiten",
            "Rainville",
            "Tammenga",
            "Weg naar Zee",
            "Welgelegen",
        ],
    ),
    (
        "wanica",
        &[
            "De Nieuwe Grond",
            "Houttuin",
            "Koewarasan",
            "Lelydorp",
            "Saramacca Polder",
            "Tout Lui Faut",
            "Domburg",
        ],
    ),
    (
        "nickerie",
        &[
            "Nieuw Nickerie",
            "Groot Henar",
            "Wageningen",
            "Oostelijke Polders",
            "Westelijke Polders",
            "Corantijnpolder",
        ],
    ),
    (
        "commewijne",
        &[
            "Meerzorg",
            "Tamanredjo",
            "Alkmaar",
            "Bakkie",
            "Mariënburg",
            "Kroonenburg",
        ],
    ),
    (
        "para",
        &["Onverwacht", "Bigi Poika", "Carolina", "Zanderij", "Noord", "Zuid"],
    ),
    (
        "saramacca",
        &["Groningen", "Calcutta", "Tijgerkreek", "Wayamboweg"],
    ),
    (
        "brokopondo",
        &[
            "Brownsweg",
            "Centrum",
            "Klaaskreek",
            "Marshallkreek",
            "Sarakreek",
            "Kwatta",
        ],
    ),
    (
        "marowijne",
        &["Albina", "Moengo", "Galibi", "Patamacca", "Oost"],
    ),
    ("coronie", &["Totness", "Johanna Maria", "Welgelegen"]),
    (
        "sipaliwini",
        &[
            "Boven Coppename",
            "Boven Suriname",
            "Coeroeni",
            "Kabalebo",
            "Tapanahony",
            "Centrale Savanne",
        ],
    ),
];

/// Sub-districts of `district` (case-insensitive); unknown districts yield an empty slice.
pub fn sub_districts(district: &str) -> &'static [&'static str] {
    let key = district.trim().to_lowercase();
    DISTRICTS
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, subs)| *subs)
        .unwrap_or(&[])
}

pub fn districts() -> impl Iterator<Item = &'static str> {
    DISTRICTS.iter().map(|(name, _)| *name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_ignores_case() {
        assert!(sub_districts("Wanica").contains(&"Lelydorp"));
        assert_eq!(sub_districts("CORONIE").len(), 3);
    }

    #[test]
    fn unknown_district_is_empty() {
        assert!(sub_districts("atlantis").is_empty());
    }

    #[test]
    fn lists_all_ten_districts() {
        assert_eq!(districts().count(), 10);
    }
}
