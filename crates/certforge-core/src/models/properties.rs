/// Declared resource properties, decoded once at the event boundary
///
/// CloudFormation delivers every scalar as a string, so booleans may arrive
/// as `"true"`/`"false"`. Unknown properties are rejected; `ServiceToken` is
/// injected by CloudFormation and therefore accepted.
use crate::error::CertforgeError;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct Tag {
    #[serde(rename = "Key")]
    pub key: String,
    #[serde(rename = "Value")]
    pub value: String,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Properties of a `DnsCertificate` resource
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CertificateProperties {
    #[serde(rename = "ServiceToken", default)]
    pub service_token: Option<String>,
    #[serde(rename = "DomainName")]
    pub domain_name: String,
    #[serde(rename = "Region", default)]
    pub region: Option<String>,
    #[serde(rename = "SubjectAlternativeNames", default)]
    pub subject_alternative_names: Vec<String>,
    #[serde(rename = "Tags", default)]
    pub tags: Vec<Tag>,
    #[serde(rename = "HostedZoneName", default)]
    pub hosted_zone_name: Option<String>,
    #[serde(rename = "HostedZoneId", default)]
    pub hosted_zone_id: Option<String>,
    /// Absent means true
    #[serde(
        rename = "WithCaaRecords",
        default,
        deserialize_with = "deserialize_encoded_bool"
    )]
    pub with_caa_records: Option<bool>,
}

impl CertificateProperties {
    /// Decodes and checks the shape of the properties; hosted zone
    /// resolution happens later against the DNS provider
    pub fn decode(value: &Value) -> Result<Self, CertforgeError> {
        let properties: Self = serde_json::from_value(value.clone()).map_err(|e| {
            CertforgeError::Validation(format!("invalid DnsCertificate properties: {}", e))
        })?;
        properties.check()?;
        Ok(properties)
    }

    fn check(&self) -> Result<(), CertforgeError> {
        require_non_empty("DomainName", &self.domain_name)?;
        if let Some(region) = &self.region {
            require_non_empty("Region", region)?;
        }
        for san in &self.subject_alternative_names {
            require_non_empty("SubjectAlternativeNames", san)?;
        }
        for tag in &self.tags {
            require_non_empty("Tags.Key", &tag.key)?;
            require_non_empty("Tags.Value", &tag.value)?;
        }
        HostedZoneRef::from_parts(
            self.hosted_zone_name.as_deref(),
            self.hosted_zone_id.as_deref(),
        )?;
        Ok(())
    }

    pub fn hosted_zone_ref(&self) -> Result<HostedZoneRef, CertforgeError> {
        HostedZoneRef::from_parts(
            self.hosted_zone_name.as_deref(),
            self.hosted_zone_id.as_deref(),
        )
    }

    pub fn with_caa_records(&self) -> bool {
        self.with_caa_records.unwrap_or(true)
    }
}

/// Properties of a `DnsCertificateRecordSetGroup` resource
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecordSetGroupProperties {
    #[serde(rename = "ServiceToken", default)]
    pub service_token: Option<String>,
    #[serde(rename = "CertificateArn")]
    pub certificate_arn: String,
    #[serde(rename = "HostedZoneName", default)]
    pub hosted_zone_name: Option<String>,
    #[serde(rename = "HostedZoneId", default)]
    pub hosted_zone_id: Option<String>,
    #[serde(
        rename = "WithCaaRecords",
        default,
        deserialize_with = "deserialize_encoded_bool"
    )]
    pub with_caa_records: Option<bool>,
}

impl RecordSetGroupProperties {
    pub fn decode(value: &Value) -> Result<Self, CertforgeError> {
        let properties: Self = serde_json::from_value(value.clone()).map_err(|e| {
            CertforgeError::Validation(format!(
                "invalid DnsCertificateRecordSetGroup properties: {}",
                e
            ))
        })?;
        if !crate::utils::arn::is_certificate_arn(&properties.certificate_arn) {
            return Err(CertforgeError::Validation(format!(
                "CertificateArn must be the ARN of a certificate: {}",
                properties.certificate_arn
            )));
        }
        properties.hosted_zone_ref()?;
        Ok(properties)
    }

    pub fn hosted_zone_ref(&self) -> Result<HostedZoneRef, CertforgeError> {
        HostedZoneRef::from_parts(
            self.hosted_zone_name.as_deref(),
            self.hosted_zone_id.as_deref(),
        )
    }

    pub fn with_caa_records(&self) -> bool {
        self.with_caa_records.unwrap_or(true)
    }
}

/// The single hosted zone identifier a resource declares
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostedZoneRef {
    Name(String),
    Id(String),
}

impl HostedZoneRef {
    pub fn from_parts(name: Option<&str>, id: Option<&str>) -> Result<Self, CertforgeError> {
        let name = name.filter(|n| !n.is_empty());
        let id = id.filter(|i| !i.is_empty());
        match (name, id) {
            (Some(name), None) => Ok(Self::Name(name.to_string())),
            (None, Some(id)) => Ok(Self::Id(id.to_string())),
            (None, None) => Err(CertforgeError::Validation(
                "one of HostedZoneName or HostedZoneId must be defined".to_string(),
            )),
            (Some(_), Some(_)) => Err(CertforgeError::Validation(
                "only one of HostedZoneName or HostedZoneId may be defined".to_string(),
            )),
        }
    }
}

fn require_non_empty(field: &str, value: &str) -> Result<(), CertforgeError> {
    if value.trim().is_empty() {
        Err(CertforgeError::Validation(format!(
            "{} must not be empty",
            field
        )))
    } else {
        Ok(())
    }
}

/// Accepts a JSON boolean or its string encoding; an empty string counts as
/// absent
fn deserialize_encoded_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Encoded {
        Bool(bool),
        Text(String),
    }

    match Option::<Encoded>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Encoded::Bool(b)) => Ok(Some(b)),
        Some(Encoded::Text(text)) => match text.trim().to_ascii_lowercase().as_str() {
            "" => Ok(None),
            "true" => Ok(Some(true)),
            "false" => Ok(Some(false)),
            other => Err(de::Error::custom(format!(
                "invalid boolean value '{}'",
                other
            ))),
        },
    }
}
