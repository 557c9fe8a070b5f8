//! Fixed catalog of interests users pick during onboarding; event activity
//! ids come from the same catalog.

use crate::domain::models::Interest;

const CATALOG: &[(&str, &str)] = &[
    ("poker", "Poker"),
    ("sports", "Sports"),
    ("boba_runs", "Boba Runs"),
    ("food", "Food"),
];

pub fn catalog() -> Vec<Interest> {
    CATALOG
        .iter()
        .map(|(id, name)| Interest {
            id: (*id).to_string(),
            name: (*name).to_string(),
        })
        .collect()
}

pub fn is_known(id: &str) -> bool {
    CATALOG.iter().any(|(known, _)| *known == id)
}

pub fn by_id(id: &str) -> Option<Interest> {
    CATALOG
        .iter()
        .find(|(known, _)| *known == id)
        .map(|(id, name)| Interest {
            id: (*id).to_string(),
            name: (*name).to_string(),
        })
}
