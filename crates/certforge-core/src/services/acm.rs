/// Certificate authority seam and its ACM implementation
use crate::error::CertforgeError;
use crate::models::{
    CertificateDescription, CertificateRequest, CertificateStatus, DomainValidationOption, Tag,
    ValidationRecord,
};
use crate::utils::arn::certificate_region;
use async_trait::async_trait;
use aws_sdk_acm::types::{
    CertificateOptions, CertificateTransparencyLoggingPreference, ValidationMethod,
};
use tracing::{debug, info};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CertificateAuthority: Send + Sync {
    /// Requests a DNS validated certificate with transparency logging and
    /// returns its ARN
    async fn request_certificate(
        &self,
        request: &CertificateRequest,
    ) -> Result<String, CertforgeError>;

    async fn describe_certificate(
        &self,
        certificate_arn: &str,
    ) -> Result<CertificateDescription, CertforgeError>;

    /// Fails with `NotFound` when the certificate does not exist
    async fn delete_certificate(&self, certificate_arn: &str) -> Result<(), CertforgeError>;

    async fn list_tags(&self, certificate_arn: &str) -> Result<Vec<Tag>, CertforgeError>;

    async fn add_tags(&self, certificate_arn: &str, tags: &[Tag]) -> Result<(), CertforgeError>;

    async fn remove_tags(&self, certificate_arn: &str, tags: &[Tag]) -> Result<(), CertforgeError>;
}

/// ACM backed certificate authority
///
/// A certificate may live in another region than the Lambda (CloudFront
/// needs `us-east-1`), so clients are built per region: from the request on
/// creation, from the certificate ARN afterwards.
pub struct AcmCertificateAuthority {
    config: aws_config::SdkConfig,
}

impl AcmCertificateAuthority {
    pub fn new(config: aws_config::SdkConfig) -> Self {
        Self { config }
    }

    fn client(&self, region: Option<&str>) -> aws_sdk_acm::Client {
        let mut builder = aws_sdk_acm::config::Builder::from(&self.config);
        if let Some(region) = region.filter(|r| !r.is_empty()) {
            builder = builder.region(aws_sdk_acm::config::Region::new(region.to_string()));
        }
        aws_sdk_acm::Client::from_conf(builder.build())
    }

    fn client_for(&self, certificate_arn: &str) -> Result<aws_sdk_acm::Client, CertforgeError> {
        let region = certificate_region(certificate_arn)?;
        Ok(self.client(Some(region)))
    }
}

fn to_acm_tags(tags: &[Tag]) -> Result<Vec<aws_sdk_acm::types::Tag>, CertforgeError> {
    tags.iter()
        .map(|tag| {
            aws_sdk_acm::types::Tag::builder()
                .key(&tag.key)
                .value(&tag.value)
                .build()
                .map_err(|e| CertforgeError::Validation(format!("invalid tag {}: {}", tag.key, e)))
        })
        .collect()
}

fn to_domain_validation_option(
    option: &aws_sdk_acm::types::DomainValidation,
) -> DomainValidationOption {
    let resource_record = option.resource_record().map(|record| ValidationRecord {
        name: record.name().to_string(),
        value: record.value().to_string(),
        record_type: record.r#type().as_str().to_string(),
    });

    DomainValidationOption {
        domain_name: option.domain_name().to_string(),
        resource_record,
    }
}

#[async_trait]
impl CertificateAuthority for AcmCertificateAuthority {
    async fn request_certificate(
        &self,
        request: &CertificateRequest,
    ) -> Result<String, CertforgeError> {
        let options = CertificateOptions::builder()
            .certificate_transparency_logging_preference(
                CertificateTransparencyLoggingPreference::Enabled,
            )
            .build();
        let sans = if request.subject_alternative_names.is_empty() {
            None
        } else {
            Some(request.subject_alternative_names.clone())
        };

        let output = self
            .client(request.region.as_deref())
            .request_certificate()
            .domain_name(&request.domain_name)
            .validation_method(ValidationMethod::Dns)
            .options(options)
            .set_subject_alternative_names(sans)
            .send()
            .await
            .map_err(|e| {
                CertforgeError::provider(
                    format!("could not request the certificate for {}", request.domain_name),
                    e,
                )
            })?;

        let certificate_arn = output
            .certificate_arn()
            .ok_or_else(|| CertforgeError::Provider("ACM returned no certificate ARN".to_string()))?
            .to_string();

        info!(
            certificate_arn = %certificate_arn,
            domain_name = %request.domain_name,
            "Requested certificate"
        );
        Ok(certificate_arn)
    }

    async fn describe_certificate(
        &self,
        certificate_arn: &str,
    ) -> Result<CertificateDescription, CertforgeError> {
        let output = self
            .client_for(certificate_arn)?
            .describe_certificate()
            .certificate_arn(certificate_arn)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error()
                    .is_some_and(|se| se.is_resource_not_found_exception())
                {
                    CertforgeError::NotFound(format!("certificate {}", certificate_arn))
                } else {
                    CertforgeError::provider(
                        format!("could not describe the certificate {}", certificate_arn),
                        e,
                    )
                }
            })?;

        let detail = output.certificate().ok_or_else(|| {
            CertforgeError::Provider(format!(
                "ACM returned no detail for certificate {}",
                certificate_arn
            ))
        })?;

        let status = detail
            .status()
            .map(|s| CertificateStatus::from(s.as_str()))
            .unwrap_or_else(|| CertificateStatus::Other("UNKNOWN".to_string()));

        let domain_validation_options: Vec<DomainValidationOption> = detail
            .domain_validation_options()
            .iter()
            .map(to_domain_validation_option)
            .collect();

        debug!(
            certificate_arn = certificate_arn,
            status = status.as_str(),
            options = domain_validation_options.len(),
            "Described certificate"
        );

        Ok(CertificateDescription {
            certificate_arn: certificate_arn.to_string(),
            status,
            domain_validation_options,
        })
    }

    async fn delete_certificate(&self, certificate_arn: &str) -> Result<(), CertforgeError> {
        self.client_for(certificate_arn)?
            .delete_certificate()
            .certificate_arn(certificate_arn)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error()
                    .is_some_and(|se| se.is_resource_not_found_exception())
                {
                    CertforgeError::NotFound(format!("certificate {}", certificate_arn))
                } else {
                    CertforgeError::provider(
                        format!("could not delete the certificate {}", certificate_arn),
                        e,
                    )
                }
            })?;

        info!(certificate_arn = certificate_arn, "Deleted certificate");
        Ok(())
    }

    async fn list_tags(&self, certificate_arn: &str) -> Result<Vec<Tag>, CertforgeError> {
        let output = self
            .client_for(certificate_arn)?
            .list_tags_for_certificate()
            .certificate_arn(certificate_arn)
            .send()
            .await
            .map_err(|e| {
                CertforgeError::provider(
                    format!("could not list tags for certificate {}", certificate_arn),
                    e,
                )
            })?;

        Ok(output
            .tags()
            .iter()
            .map(|tag| Tag::new(tag.key(), tag.value().unwrap_or_default()))
            .collect())
    }

    async fn add_tags(&self, certificate_arn: &str, tags: &[Tag]) -> Result<(), CertforgeError> {
        self.client_for(certificate_arn)?
            .add_tags_to_certificate()
            .certificate_arn(certificate_arn)
            .set_tags(Some(to_acm_tags(tags)?))
            .send()
            .await
            .map_err(|e| {
                CertforgeError::provider(
                    format!("could not add tags to certificate {}", certificate_arn),
                    e,
                )
            })?;
        Ok(())
    }

    async fn remove_tags(&self, certificate_arn: &str, tags: &[Tag]) -> Result<(), CertforgeError> {
        self.client_for(certificate_arn)?
            .remove_tags_from_certificate()
            .certificate_arn(certificate_arn)
            .set_tags(Some(to_acm_tags(tags)?))
            .send()
            .await
            .map_err(|e| {
                CertforgeError::provider(
                    format!("could not remove tags from certificate {}", certificate_arn),
                    e,
                )
            })?;
        Ok(())
    }
}
