// src/cleaning/lookup_tables.rs - Static corrections applied to reference geography names

/// Reference-table country names that differ from the spelling enrichment providers use.
pub const COUNTRY_OVERRIDES: [(&str, &str); 32] = [
    ("The Bahamas", "Bahamas"),
    ("Virgin Islands (British)", "British Virgin Islands"),
    ("Cape Verde", "Cabo Verde"),
    ("Democratic Republic of the Congo", "Congo, Democratic Republic of the"),
    ("Czech Republic", "Czechia"),
    ("Fiji Islands", "Fiji"),
    ("Aland Islands", "Åland Islands"),
    ("Gambia The", "Gambia"),
    ("Palestinian Territory Occupied", "Palestine"),
    ("Vatican City State (Holy See)", "Holy See (Vatican City State)"),
    ("Hong Kong S.A.R.", "Hong Kong"),
    ("Cote D'Ivoire (Ivory Coast)", "Côte d'Ivoire"),
    ("North Korea", "Korea, Democratic People's Republic of"),
    ("South Korea", "Korea, Republic of"),
    ("Macau S.A.R.", "Macao"),
    ("Curaçao", "Curaçao"),
    ("Sint Maarten (Dutch part)", "Sint Maarten"),
    ("Bonaire, Sint Eustatius and Saba", "Bonaire, Sint Eustatius, and Saba"),
    ("Micronesia", "Micronesia, Federated States of"),
    ("Pitcairn Island", "Pitcairn Islands"),
    ("East Timor", "Timor-Leste"),
    ("Russia", "Russian Federation"),
    ("Saint-Barthelemy", "Saint Barthelemy"),
    ("Saint Helena", "Saint Helena, Ascension and Tristan da Cunha"),
    ("Saint-Martin (French part)", "Saint Martin"),
    ("Svalbard And Jan Mayen Islands", "Svalbard and Jan Mayen"),
    ("Swaziland", "Eswatini"),
    ("Guernsey and Alderney", "Guernsey"),
    ("Man (Isle of)", "Isle of Man"),
    ("United States", "United States of America"),
    ("Virgin Islands (US)", "U. S. Virgin Islands"),
    ("Wallis And Futuna Islands", "Wallis and Futuna"),
];

/// Reference-table state names mapped to the local-language spelling used downstream.
pub const STATE_OVERRIDES: [(&str, &str); 11] = [
    ("Central Singapore", "Singapore"),
    ("Metro Manila", "Manila"),
    ("Auckland Region", "Auckland"),
    ("North Rhine-Westphalia", "Nordrhein-Westfalen"),
    ("Hong Kong SAR", "Hong Kong"),
    ("Lower Saxony", "Niedersachsen"),
    ("Ile de France", "Ile-de-France"),
    ("North Holland", "Noord-Holland"),
    ("South Holland", "Zuid-Holland"),
    ("Hesse", "Hessen"),
    ("Bavaria", "Bayern"),
];

fn lookup(table: &[(&'static str, &'static str)], name: &str) -> Option<&'static str> {
    table
        .iter()
        .find(|(from, _)| *from == name)
        .map(|(_, to)| *to)
}

/// Canonical country name for a reference-table name (exact match, unchanged otherwise).
pub fn fix_country(name: &str) -> String {
    lookup(&COUNTRY_OVERRIDES, name).unwrap_or(name).to_string()
}

/// Canonical state name for a reference-table name (exact match, unchanged otherwise).
pub fn fix_state(name: &str) -> String {
    lookup(&STATE_OVERRIDES, name).unwrap_or(name).to_string()
}
