use std::sync::Arc;

use crate::auth::{generate_jwt, Claims};
use crate::device::store::{InMemoryReadStore, InMemorySystemOfRecord};
use crate::device::{CombinedRepository, DeviceService};

/// DeviceService over in-memory stores. The stores are returned for failure injection
/// and inspection.
pub fn memory_service() -> (DeviceService, Arc<InMemorySystemOfRecord>, Arc<InMemoryReadStore>) {
    let system_of_record = Arc::new(InMemorySystemOfRecord::new());
    let read_store = Arc::new(InMemoryReadStore::new());
    let repository =
        Arc::new(CombinedRepository::new(system_of_record.clone(), read_store.clone()));

    (
        DeviceService::new(repository.clone(), repository),
        system_of_record,
        read_store,
    )
}

/// Signed HS256 token for `user_id`, valid for an hour
pub fn bearer_token(secret: &str, user_id: &str) -> String {
    let claims = Claims::new(user_id, 1).expect("claims");
    generate_jwt(&claims, secret).expect("token generation")
}
