//! Scoped status document writes

use async_trait::async_trait;
use serde_json::{json, Value};
use waypoint_errors::Error;
use waypoint_status::DocumentStore;
use waypoint_types::EntityGuid;

use crate::client::GraphQlClient;

const WRITE_DOCUMENT_MUTATION: &str = "mutation($collection: String!, $documentId: String!, \
     $document: NerdStorageDocument!, $scope: NerdStorageScopeInput!) { \
     nerdStorageWriteDocument(collection: $collection, documentId: $documentId, \
     document: $document, scope: $scope) }";

impl GraphQlClient {
    async fn write_document(
        &self,
        scope: Value,
        collection: &str,
        document_id: &str,
        document: &Value,
    ) -> Result<(), Error> {
        let variables = json!({
            "collection": collection,
            "documentId": document_id,
            "document": document,
            "scope": scope,
        });
        let _: Value = self.execute(WRITE_DOCUMENT_MUTATION, &variables).await?;
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for GraphQlClient {
    async fn write_user_document(
        &self,
        collection: &str,
        document_id: &str,
        document: &Value,
    ) -> Result<(), Error> {
        tracing::debug!(collection, document_id, "writing user-scoped status document");
        self.write_document(
            json!({ "name": "USER", "id": self.account_id().to_string() }),
            collection,
            document_id,
            document,
        )
        .await
    }

    async fn write_entity_document(
        &self,
        guid: &EntityGuid,
        collection: &str,
        document_id: &str,
        document: &Value,
    ) -> Result<(), Error> {
        tracing::debug!(collection, document_id, %guid, "writing entity-scoped status document");
        self.write_document(
            json!({ "name": "ENTITY", "id": guid.as_str() }),
            collection,
            document_id,
            document,
        )
        .await
    }
}
