//! Well-known field names of the VIP catalog.

/// Identifier field, used for the exact-match shortcut
pub const PUBMED_ID: &str = "PubMed_ID";
pub const TITLE: &str = "Title";
pub const VIP_NAME: &str = "VIP_name";
pub const VIP_FAMILY_NAME: &str = "VIP_family_name";
pub const DATABASE: &str = "Database";
pub const DOI: &str = "DOI";
pub const HOMEPAGE: &str = "Homepage";
pub const SOURCE_CODE: &str = "Source_code";
pub const YEAR: &str = "Year";
pub const WEBSITE_ACCESSIBLE: &str = "Website_accessible";
pub const PRIMARILY_FOR_VIP: &str = "Primarily_for_VIP";
pub const GENE_SPECIFIC: &str = "Gene-specific";

/// Fields scored by the fuzzy index
pub const SEARCHABLE_FIELDS: &[&str] = &[
    PUBMED_ID,
    TITLE,
    VIP_NAME,
    VIP_FAMILY_NAME,
    DATABASE,
    DOI,
    HOMEPAGE,
    SOURCE_CODE,
    WEBSITE_ACCESSIBLE,
    PRIMARILY_FOR_VIP,
    GENE_SPECIFIC,
];

/// Categorical fields accepted by exact-value filters
pub const FILTERABLE_FIELDS: &[&str] = &[DATABASE, WEBSITE_ACCESSIBLE, PRIMARILY_FOR_VIP, GENE_SPECIFIC];

/// Fields shown first, in this order, in the detail view
pub const DETAIL_PRIORITY_FIELDS: &[&str] = &[
    PUBMED_ID,
    TITLE,
    VIP_NAME,
    VIP_FAMILY_NAME,
    DATABASE,
    DOI,
    HOMEPAGE,
    SOURCE_CODE,
    YEAR,
];

/// Look up the canonical name of a filterable field (case-insensitive)
pub fn filterable_field(name: &str) -> Option<&'static str> {
    let name = name.trim();
    FILTERABLE_FIELDS
        .iter()
        .copied()
        .find(|f| f.eq_ignore_ascii_case(name))
}
