//! In-memory tenant directory.

use dashmap::DashMap;

use super::{AllocationRecord, TenantDirectory};

/// Directory implementation backed by a concurrent map.
///
/// Writes come from the supervisor surface (startup seeding, admin API);
/// the proxy core only calls the read methods.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    records: DashMap<String, AllocationRecord>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the directory from configuration at startup.
    pub fn seed(records: impl IntoIterator<Item = AllocationRecord>) -> Self {
        let directory = Self::new();
        for record in records {
            directory.upsert(record);
        }
        directory
    }

    /// Insert or replace a tenant's allocation.
    pub fn upsert(&self, record: AllocationRecord) {
        self.records.insert(record.tenant_id.clone(), record);
    }

    /// Remove a tenant's allocation. Returns the dropped record, if any.
    pub fn remove(&self, tenant_id: &str) -> Option<AllocationRecord> {
        self.records.remove(tenant_id).map(|(_, record)| record)
    }
}

impl TenantDirectory for InMemoryDirectory {
    fn lookup(&self, tenant_id: &str) -> Option<AllocationRecord> {
        self.records.get(tenant_id).map(|entry| entry.value().clone())
    }

    fn list(&self) -> Vec<AllocationRecord> {
        let mut records: Vec<AllocationRecord> =
            self.records.iter().map(|entry| entry.value().clone()).collect();
        records.sort_by(|a, b| a.tenant_id.cmp(&b.tenant_id));
        records
    }
}
