/// Resolution of declared properties into a validated certificate request
use super::domain::check_subdomain;
use crate::error::CertforgeError;
use crate::models::{CertificateProperties, CertificateRequest, HostedZone, HostedZoneRef};
use crate::services::DnsProvider;
use serde_json::Value;
use tracing::debug;

/// Looks the hosted zone up by whichever half was declared
pub async fn resolve_hosted_zone(
    dns: &dyn DnsProvider,
    zone: &HostedZoneRef,
) -> Result<HostedZone, CertforgeError> {
    let hosted_zone = match zone {
        HostedZoneRef::Name(name) => dns.zone_by_name(name).await?,
        HostedZoneRef::Id(id) => dns.zone_by_id(id).await?,
    };
    debug!(zone_id = %hosted_zone.id, zone_name = %hosted_zone.name, "Resolved hosted zone");
    Ok(hosted_zone)
}

/// Decodes `DnsCertificate` properties and checks every domain against the
/// hosted zone
pub async fn resolve_certificate_request(
    dns: &dyn DnsProvider,
    properties: &Value,
) -> Result<CertificateRequest, CertforgeError> {
    let properties = CertificateProperties::decode(properties)?;
    let hosted_zone = resolve_hosted_zone(dns, &properties.hosted_zone_ref()?).await?;

    check_subdomain(&properties.domain_name, &hosted_zone.name)?;
    for san in &properties.subject_alternative_names {
        check_subdomain(san, &hosted_zone.name)?;
    }

    let with_caa_records = properties.with_caa_records();
    Ok(CertificateRequest {
        domain_name: properties.domain_name,
        region: properties.region,
        subject_alternative_names: properties.subject_alternative_names,
        tags: properties.tags,
        hosted_zone,
        with_caa_records,
    })
}
