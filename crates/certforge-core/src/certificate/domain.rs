/// Domain name, name-set and region comparisons used for validation and
/// change detection
use crate::error::CertforgeError;
use crate::models::Tag;
use crate::utils::arn::arn_region;
use std::collections::HashSet;

/// Appends the trailing dot of a fully qualified name when missing
pub fn normalize_domain(domain_name: &str) -> String {
    if domain_name.ends_with('.') {
        domain_name.to_string()
    } else {
        format!("{}.", domain_name)
    }
}

/// Whether `domain_name` lies within `zone_name` (label aligned, case
/// insensitive, trailing dots optional)
///
/// # Examples
/// ```
/// use certforge_core::certificate::domain::is_subdomain;
///
/// assert!(is_subdomain("www.example.com", "example.com."));
/// assert!(is_subdomain("example.com.", "example.com"));
/// assert!(!is_subdomain("badexample.com", "example.com"));
/// ```
pub fn is_subdomain(domain_name: &str, zone_name: &str) -> bool {
    let domain = normalize_domain(domain_name).to_ascii_lowercase();
    let zone = normalize_domain(zone_name).to_ascii_lowercase();
    domain == zone || domain.ends_with(&format!(".{}", zone))
}

pub fn check_subdomain(domain_name: &str, zone_name: &str) -> Result<(), CertforgeError> {
    if is_subdomain(domain_name, zone_name) {
        Ok(())
    } else {
        Err(CertforgeError::Validation(format!(
            "{} not subdomain of {}",
            domain_name, zone_name
        )))
    }
}

/// Order-independent equality of two name lists
///
/// Empty lists are equal; otherwise both must have the same length and the
/// same members.
pub fn same_name_set(names_a: &[String], names_b: &[String]) -> bool {
    if names_a.len() != names_b.len() {
        return false;
    }
    let set_a: HashSet<&str> = names_a.iter().map(String::as_str).collect();
    let set_b: HashSet<&str> = names_b.iter().map(String::as_str).collect();
    set_a == set_b
}

pub fn same_tag_set(tags_a: &[Tag], tags_b: &[Tag]) -> bool {
    let set_a: HashSet<&Tag> = tags_a.iter().collect();
    let set_b: HashSet<&Tag> = tags_b.iter().collect();
    set_a == set_b
}

/// Whether two declared regions designate the same region
///
/// An absent region means the region of the stack, so `None` and the stack
/// region are the same region. Two different explicit regions never are.
pub fn is_same_region(stack_id: &str, region_a: Option<&str>, region_b: Option<&str>) -> bool {
    let region_a = region_a.filter(|r| !r.is_empty());
    let region_b = region_b.filter(|r| !r.is_empty());

    match (region_a, region_b) {
        (a, b) if a == b => true,
        (Some(_), Some(_)) => false,
        (Some(explicit), None) | (None, Some(explicit)) => {
            arn_region(stack_id).is_some_and(|stack_region| stack_region == explicit)
        }
        (None, None) => true,
    }
}
