/// DNS record mutations and change tracking
use crate::constants::RECORD_TTL_SECONDS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeAction {
    Upsert,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RecordType {
    Cname,
    Caa,
    Other(String),
}

impl RecordType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Cname => "CNAME",
            Self::Caa => "CAA",
            Self::Other(kind) => kind,
        }
    }
}

impl From<&str> for RecordType {
    fn from(kind: &str) -> Self {
        match kind.to_ascii_uppercase().as_str() {
            "CNAME" => Self::Cname,
            "CAA" => Self::Caa,
            other => Self::Other(other.to_string()),
        }
    }
}

/// One record set mutation; generated and consumed immediately, never stored
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DnsChange {
    pub action: ChangeAction,
    pub name: String,
    pub record_type: RecordType,
    pub value: String,
    pub ttl: i64,
}

impl DnsChange {
    pub fn new(
        action: ChangeAction,
        name: impl Into<String>,
        record_type: RecordType,
        value: impl Into<String>,
    ) -> Self {
        Self {
            action,
            name: name.into(),
            record_type,
            value: value.into(),
            ttl: RECORD_TTL_SECONDS,
        }
    }
}

impl std::fmt::Display for DnsChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:?} {} {} {}",
            self.action,
            self.name,
            self.record_type.as_str(),
            self.value
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeStatus {
    Pending,
    InSync,
}

/// Identifier and status of a submitted change batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeReceipt {
    pub id: String,
    pub status: ChangeStatus,
}
