/// Mock AWS services for integration testing
use async_trait::async_trait;
use certforge_core::CertforgeError;
use certforge_core::certificate::domain::normalize_domain;
use certforge_core::models::{
    CertificateDescription, CertificateRequest, CertificateStatus, ChangeAction, ChangeReceipt,
    ChangeStatus, CheckState, CompletionResponse, DnsChange, DomainValidationOption, HostedZone,
    RecordType, Tag, ValidationRecord, normalize_zone_id,
};
use certforge_core::services::{
    CertificateAuthority, CompletionSignal, CompletionWaiter, DnsProvider, StackIntrospection,
};
use std::collections::HashMap;
use std::sync::Mutex;

/// A certificate held by the mock certificate authority
#[derive(Debug, Clone)]
pub struct MockCertificate {
    pub domains: Vec<String>,
    pub status: CertificateStatus,
    pub tags: Vec<Tag>,
}

/// Mock ACM: every requested certificate gets its validation records
/// published immediately
pub struct MockAcm {
    pub certificates: Mutex<HashMap<String, MockCertificate>>,
    pub requests: Mutex<Vec<CertificateRequest>>,
}

impl MockAcm {
    pub fn new() -> Self {
        Self {
            certificates: Mutex::new(HashMap::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Registers a certificate requested outside of the handlers
    pub fn insert(&self, certificate_arn: &str, domains: &[&str]) {
        self.certificates.lock().unwrap().insert(
            certificate_arn.to_string(),
            MockCertificate {
                domains: domains.iter().map(|d| d.to_string()).collect(),
                status: CertificateStatus::PendingValidation,
                tags: vec![],
            },
        );
    }

    pub fn set_status(&self, certificate_arn: &str, status: CertificateStatus) {
        if let Some(certificate) = self.certificates.lock().unwrap().get_mut(certificate_arn) {
            certificate.status = status;
        }
    }

    pub fn get(&self, certificate_arn: &str) -> Option<MockCertificate> {
        self.certificates
            .lock()
            .unwrap()
            .get(certificate_arn)
            .cloned()
    }

    pub fn count(&self) -> usize {
        self.certificates.lock().unwrap().len()
    }

    /// The validation record ACM publishes for a domain
    pub fn validation_record(domain: &str) -> ValidationRecord {
        let base = domain.trim_start_matches("*.");
        ValidationRecord {
            name: format!("_token.{}.", base),
            value: format!("_{}.acm-validations.aws.", base.replace('.', "-")),
            record_type: "CNAME".to_string(),
        }
    }

    fn not_found(certificate_arn: &str) -> CertforgeError {
        CertforgeError::NotFound(format!("certificate {} not found", certificate_arn))
    }
}

impl Default for MockAcm {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CertificateAuthority for MockAcm {
    async fn request_certificate(
        &self,
        request: &CertificateRequest,
    ) -> Result<String, CertforgeError> {
        let mut requests = self.requests.lock().unwrap();
        requests.push(request.clone());
        let region = request.region.as_deref().unwrap_or("eu-west-1");
        let certificate_arn = format!(
            "arn:aws:acm:{}:123456789012:certificate/cert-{}",
            region,
            requests.len()
        );
        self.certificates.lock().unwrap().insert(
            certificate_arn.clone(),
            MockCertificate {
                domains: request.domains().iter().map(|d| d.to_string()).collect(),
                status: CertificateStatus::PendingValidation,
                tags: vec![],
            },
        );
        Ok(certificate_arn)
    }

    async fn describe_certificate(
        &self,
        certificate_arn: &str,
    ) -> Result<CertificateDescription, CertforgeError> {
        let certificate = self
            .get(certificate_arn)
            .ok_or_else(|| Self::not_found(certificate_arn))?;
        Ok(CertificateDescription {
            certificate_arn: certificate_arn.to_string(),
            status: certificate.status,
            domain_validation_options: certificate
                .domains
                .iter()
                .map(|domain| DomainValidationOption {
                    domain_name: domain.clone(),
                    resource_record: Some(Self::validation_record(domain)),
                })
                .collect(),
        })
    }

    async fn delete_certificate(&self, certificate_arn: &str) -> Result<(), CertforgeError> {
        self.certificates
            .lock()
            .unwrap()
            .remove(certificate_arn)
            .map(|_| ())
            .ok_or_else(|| Self::not_found(certificate_arn))
    }

    async fn list_tags(&self, certificate_arn: &str) -> Result<Vec<Tag>, CertforgeError> {
        self.get(certificate_arn)
            .map(|certificate| certificate.tags)
            .ok_or_else(|| Self::not_found(certificate_arn))
    }

    async fn add_tags(&self, certificate_arn: &str, tags: &[Tag]) -> Result<(), CertforgeError> {
        let mut certificates = self.certificates.lock().unwrap();
        let certificate = certificates
            .get_mut(certificate_arn)
            .ok_or_else(|| Self::not_found(certificate_arn))?;
        certificate.tags.extend_from_slice(tags);
        Ok(())
    }

    async fn remove_tags(&self, certificate_arn: &str, tags: &[Tag]) -> Result<(), CertforgeError> {
        let mut certificates = self.certificates.lock().unwrap();
        let certificate = certificates
            .get_mut(certificate_arn)
            .ok_or_else(|| Self::not_found(certificate_arn))?;
        certificate.tags.retain(|tag| !tags.contains(tag));
        Ok(())
    }
}

type RecordKey = (String, String, RecordType);

/// Mock Route 53 with atomic change batches
pub struct MockRoute53 {
    pub zones: Vec<HostedZone>,
    pub records: Mutex<HashMap<RecordKey, String>>,
    pub batches: Mutex<Vec<Vec<DnsChange>>>,
}

impl MockRoute53 {
    pub fn with_zones(zones: &[(&str, &str)]) -> Self {
        Self {
            zones: zones
                .iter()
                .map(|(id, name)| HostedZone::new(id, name))
                .collect(),
            records: Mutex::new(HashMap::new()),
            batches: Mutex::new(Vec::new()),
        }
    }

    pub fn record(&self, zone_id: &str, name: &str, record_type: RecordType) -> Option<String> {
        self.records
            .lock()
            .unwrap()
            .get(&(zone_id.to_string(), name.to_string(), record_type))
            .cloned()
    }

    pub fn record_count(&self, zone_id: &str) -> usize {
        self.records
            .lock()
            .unwrap()
            .keys()
            .filter(|(zone, _, _)| zone == zone_id)
            .count()
    }

    pub fn batch_count(&self) -> usize {
        self.batches.lock().unwrap().len()
    }
}

#[async_trait]
impl DnsProvider for MockRoute53 {
    async fn change_record_sets(
        &self,
        zone_id: &str,
        changes: &[DnsChange],
    ) -> Result<ChangeReceipt, CertforgeError> {
        let mut records = self.records.lock().unwrap();
        let key = |change: &DnsChange| {
            (
                zone_id.to_string(),
                change.name.clone(),
                change.record_type.clone(),
            )
        };

        if let Some(absent) = changes
            .iter()
            .find(|c| c.action == ChangeAction::Delete && !records.contains_key(&key(c)))
        {
            return Err(CertforgeError::RecordAbsent(format!(
                "Tried to delete resource record set {} but it was not found",
                absent.name
            )));
        }

        for change in changes {
            match change.action {
                ChangeAction::Upsert => {
                    records.insert(key(change), change.value.clone());
                }
                ChangeAction::Delete => {
                    records.remove(&key(change));
                }
            }
        }

        let mut batches = self.batches.lock().unwrap();
        batches.push(changes.to_vec());
        Ok(ChangeReceipt {
            id: format!("C{}", batches.len()),
            status: ChangeStatus::Pending,
        })
    }

    async fn change_status(&self, _change_id: &str) -> Result<ChangeStatus, CertforgeError> {
        Ok(ChangeStatus::InSync)
    }

    async fn zone_by_name(&self, zone_name: &str) -> Result<HostedZone, CertforgeError> {
        let wanted = normalize_domain(zone_name);
        self.zones
            .iter()
            .find(|zone| normalize_domain(&zone.name) == wanted)
            .cloned()
            .ok_or_else(|| {
                CertforgeError::Validation(format!("hosted zone {} not found", zone_name))
            })
    }

    async fn zone_by_id(&self, zone_id: &str) -> Result<HostedZone, CertforgeError> {
        let wanted = normalize_zone_id(zone_id);
        self.zones
            .iter()
            .find(|zone| zone.id == wanted)
            .cloned()
            .ok_or_else(|| CertforgeError::Validation(format!("hosted zone {} not found", zone_id)))
    }
}

/// Mock CloudFormation stack resources
pub struct MockStacks {
    pub resources: Mutex<HashMap<(String, String), String>>,
}

impl MockStacks {
    pub fn new() -> Self {
        Self {
            resources: Mutex::new(HashMap::new()),
        }
    }

    pub fn set(&self, stack_id: &str, logical_resource_id: &str, physical_resource_id: &str) {
        self.resources.lock().unwrap().insert(
            (stack_id.to_string(), logical_resource_id.to_string()),
            physical_resource_id.to_string(),
        );
    }
}

impl Default for MockStacks {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StackIntrospection for MockStacks {
    async fn physical_resource_id(
        &self,
        stack_id: &str,
        logical_resource_id: &str,
    ) -> Result<Option<String>, CertforgeError> {
        self.resources
            .lock()
            .unwrap()
            .get(&(stack_id.to_string(), logical_resource_id.to_string()))
            .cloned()
            .map(Some)
            .ok_or_else(|| CertforgeError::NotFound(format!("stack {} does not exist", stack_id)))
    }
}

/// Mock wait state machine recording every execution started
pub struct MockWaiter {
    pub executions: Mutex<Vec<(String, CheckState)>>,
}

impl MockWaiter {
    pub fn new() -> Self {
        Self {
            executions: Mutex::new(Vec::new()),
        }
    }

    pub fn started(&self) -> Vec<(String, CheckState)> {
        self.executions.lock().unwrap().clone()
    }
}

impl Default for MockWaiter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CompletionWaiter for MockWaiter {
    async fn start_wait(
        &self,
        execution_name: &str,
        state: &CheckState,
    ) -> Result<(), CertforgeError> {
        let mut executions = self.executions.lock().unwrap();
        if !executions.iter().any(|(name, _)| name == execution_name) {
            executions.push((execution_name.to_string(), state.clone()));
        }
        Ok(())
    }
}

/// Mock CloudFormation response endpoint
pub struct MockSignal {
    pub responses: Mutex<Vec<(String, CompletionResponse)>>,
}

impl MockSignal {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(Vec::new()),
        }
    }

    pub fn sent(&self) -> Vec<CompletionResponse> {
        self.responses
            .lock()
            .unwrap()
            .iter()
            .map(|(_, response)| response.clone())
            .collect()
    }
}

impl Default for MockSignal {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CompletionSignal for MockSignal {
    async fn send(
        &self,
        response_url: &str,
        response: &CompletionResponse,
    ) -> Result<(), CertforgeError> {
        self.responses
            .lock()
            .unwrap()
            .push((response_url.to_string(), response.clone()));
        Ok(())
    }
}
