use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tracing::warn;

use super::client::{with_token, BackendClient, BackendError};
use crate::application::ports::{RecordStore, RepositoryError};
use crate::domain::entities::ReferencedRecord;
use crate::domain::reference_table::ReferenceDescriptor;
use crate::domain::value_objects::BlobId;

impl From<BackendError> for RepositoryError {
    fn from(error: BackendError) -> Self {
        if error.is_unauthorized() {
            return RepositoryError::Unauthorized(error.to_string());
        }
        match error {
            BackendError::Http(e) => RepositoryError::Transport(e.to_string()),
            BackendError::Deserialize(e) => RepositoryError::Malformed(e.to_string()),
            other => RepositoryError::Backend(other.to_string()),
        }
    }
}

/// Record store backed by the per-kind list and update functions named in
/// the reference table
pub struct HttpRecordStore {
    client: BackendClient,
}

impl HttpRecordStore {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }
}

/// Project one listed document to its id and reference slots.
///
/// `None` when the reference field is absent, null or empty.
fn parse_record(
    descriptor: &ReferenceDescriptor,
    document: &Map<String, Value>,
) -> Result<Option<ReferencedRecord>, RepositoryError> {
    let entity_id = document
        .get("_id")
        .and_then(Value::as_str)
        .ok_or_else(|| RepositoryError::Malformed(format!("{} record without _id", descriptor.kind)))?;

    let raw_slots: Vec<&str> = match document.get(descriptor.field) {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::String(id)) => vec![id.as_str()],
        Some(Value::Array(ids)) => ids
            .iter()
            .map(|v| {
                v.as_str().ok_or_else(|| {
                    RepositoryError::Malformed(format!(
                        "{} {} has a non-string entry in {}",
                        descriptor.kind, entity_id, descriptor.field
                    ))
                })
            })
            .collect::<Result<_, _>>()?,
        Some(other) => {
            return Err(RepositoryError::Malformed(format!(
                "{} {} has unexpected {} value {}",
                descriptor.kind, entity_id, descriptor.field, other
            )))
        }
    };

    if raw_slots.is_empty() {
        return Ok(None);
    }

    let slots = raw_slots
        .into_iter()
        .map(BlobId::new)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Some(ReferencedRecord::new(descriptor.kind, entity_id, slots)?))
}

#[async_trait]
impl RecordStore for HttpRecordStore {
    async fn list_with_image_refs(
        &self,
        descriptor: &ReferenceDescriptor,
    ) -> Result<Vec<ReferencedRecord>, RepositoryError> {
        let documents: Vec<Map<String, Value>> =
            self.client.query(descriptor.list_function, json!({})).await?;

        let mut records = Vec::with_capacity(documents.len());
        for document in &documents {
            if let Some(record) = parse_record(descriptor, document)? {
                records.push(record);
            }
        }
        if records.len() < documents.len() {
            warn!(
                kind = %descriptor.kind,
                skipped = documents.len() - records.len(),
                "Listing returned records without references"
            );
        }
        Ok(records)
    }

    async fn update_image_ref(
        &self,
        descriptor: &ReferenceDescriptor,
        entity_id: &str,
        blob_id: &BlobId,
        token: Option<String>,
    ) -> Result<(), RepositoryError> {
        let args = with_token(
            json!({ "id": entity_id, descriptor.field: blob_id }),
            token.as_deref(),
        );
        self.client
            .mutation::<Value>(descriptor.update_function, args)
            .await?;
        Ok(())
    }

    async fn update_image_refs(
        &self,
        descriptor: &ReferenceDescriptor,
        entity_id: &str,
        blob_ids: &[BlobId],
        token: Option<String>,
    ) -> Result<(), RepositoryError> {
        let args = with_token(
            json!({ "id": entity_id, descriptor.field: blob_ids }),
            token.as_deref(),
        );
        self.client
            .mutation::<Value>(descriptor.update_function, args)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::EntityKind;

    fn document(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_single_slot_document() {
        let descriptor = EntityKind::Cafe.descriptor();
        let record = parse_record(
            descriptor,
            &document(json!({"_id": "cafe1", "name": "Bean", "imageStorageId": "a"})),
        )
        .unwrap()
        .unwrap();
        assert_eq!(record.entity_id(), "cafe1");
        assert_eq!(record.slots()[0].as_str(), "a");
    }

    #[test]
    fn test_multi_slot_document_keeps_order() {
        let descriptor = EntityKind::Review.descriptor();
        let record = parse_record(
            descriptor,
            &document(json!({"_id": "r1", "imageStorageIds": ["b", "a"]})),
        )
        .unwrap()
        .unwrap();
        let slots: Vec<_> = record.slots().iter().map(BlobId::as_str).collect();
        assert_eq!(slots, vec!["b", "a"]);
    }

    #[test]
    fn test_document_without_reference_is_skipped() {
        let descriptor = EntityKind::User.descriptor();
        assert!(parse_record(descriptor, &document(json!({"_id": "u1"})))
            .unwrap()
            .is_none());
        assert!(parse_record(descriptor, &document(json!({"_id": "u1", "avatarStorageId": null})))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_too_many_review_images_is_invalid() {
        let descriptor = EntityKind::Review.descriptor();
        let err = parse_record(
            descriptor,
            &document(json!({"_id": "r1", "imageStorageIds": ["a", "b", "c"]})),
        )
        .unwrap_err();
        assert!(matches!(err, RepositoryError::InvalidRecord(_)));
    }

    #[test]
    fn test_missing_id_is_malformed() {
        let descriptor = EntityKind::Product.descriptor();
        let err = parse_record(descriptor, &document(json!({"imageStorageId": "a"}))).unwrap_err();
        assert!(matches!(err, RepositoryError::Malformed(_)));
    }
}
