use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use tracing::debug;

use super::{escape_like, Column, PlantRow, PlantWrite, RecordStore, PLANTS_TABLE};
use crate::error::StoreError;
use crate::model::{PlantFields, PlantRecord};

/// Remote record store speaking the PostgREST dialect (as hosted by Supabase).
pub struct PostgrestStore {
    client: Client,
    table_url: String,
    api_key: String,
}

impl PostgrestStore {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        PostgrestStore {
            client: Client::new(),
            table_url: format!("{}/rest/v1/{}", base_url.trim_end_matches('/'), PLANTS_TABLE),
            api_key: api_key.to_string(),
        }
    }

    fn authed(&self, req: RequestBuilder) -> RequestBuilder {
        req.header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    fn returning(req: RequestBuilder) -> RequestBuilder {
        req.header("Prefer", "return=representation")
    }

    async fn rows(req: RequestBuilder) -> Result<Vec<PlantRow>, StoreError> {
        let body = checked(req.send().await?).await?.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

async fn checked(resp: Response) -> Result<Response, StoreError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(StoreError::Status {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl RecordStore for PostgrestStore {
    async fn list(&self, order_by: Option<Column>) -> Result<Vec<PlantRecord>, StoreError> {
        let mut query = vec![("select", "*".to_string())];
        if let Some(col) = order_by {
            query.push(("order", format!("{}.asc,id.asc", col.as_str())));
        }
        let req = self.authed(self.client.get(&self.table_url)).query(&query);
        let rows = Self::rows(req).await?;
        debug!("Listed {} plants", rows.len());
        Ok(rows.into_iter().map(PlantRecord::from).collect())
    }

    async fn filter_one(
        &self,
        column: Column,
        pattern: &str,
    ) -> Result<Option<PlantRecord>, StoreError> {
        let query = [
            ("select", "*".to_string()),
            (column.as_str(), format!("ilike.{}", escape_like(pattern))),
            ("order", "id.asc".to_string()),
            ("limit", "1".to_string()),
        ];
        let req = self.authed(self.client.get(&self.table_url)).query(&query);
        let rows = Self::rows(req).await?;
        Ok(rows.into_iter().next().map(PlantRecord::from))
    }

    async fn insert(&self, plant: &PlantFields) -> Result<PlantRecord, StoreError> {
        let body = serde_json::to_string(&[PlantWrite::from(plant)])?;
        let req = Self::returning(self.authed(self.client.post(&self.table_url)))
            .header("Content-Type", "application/json")
            .body(body);
        Self::rows(req)
            .await?
            .into_iter()
            .next()
            .map(PlantRecord::from)
            .ok_or(StoreError::EmptyResponse)
    }

    async fn update(&self, id: i64, plant: &PlantFields) -> Result<PlantRecord, StoreError> {
        let body = serde_json::to_string(&PlantWrite::from(plant))?;
        let req = Self::returning(self.authed(self.client.patch(&self.table_url)))
            .query(&[("id", format!("eq.{}", id))])
            .header("Content-Type", "application/json")
            .body(body);
        Self::rows(req)
            .await?
            .into_iter()
            .next()
            .map(PlantRecord::from)
            .ok_or(StoreError::MissingRow(id))
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        let req = self
            .authed(self.client.delete(&self.table_url))
            .query(&[("id", format!("eq.{}", id))]);
        checked(req.send().await?).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::testing::fields;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn row(id: i64, name: &str) -> serde_json::Value {
        json!({
            "id": id,
            "name": name,
            "scientific_name": "Ocimum tenuiflorum",
            "description": "Sacred basil.",
            "kingdom": "Plantae",
            "clade": ["Angiosperms", "Eudicots"],
            "order": "Lamiales",
            "family": "Lamiaceae",
            "subfamily": null,
            "genus": "Ocimum",
            "species": "O. tenuiflorum",
            "image": "https://res.cloudinary.com/demo/tulsi.jpg"
        })
    }

    #[tokio::test]
    async fn list_orders_by_requested_column() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/plants"))
            .and(query_param("order", "name.asc,id.asc"))
            .and(header("apikey", "anon-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([row(1, "Tulsi")])))
            .expect(1)
            .mount(&server)
            .await;

        let store = PostgrestStore::new(&server.uri(), "anon-key");
        let plants = store.list(Some(Column::Name)).await.unwrap();
        assert_eq!(plants.len(), 1);
        assert_eq!(plants[0].scientific_name, "Ocimum tenuiflorum");
    }

    #[tokio::test]
    async fn filter_one_uses_ilike_and_limit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/plants"))
            .and(query_param("name", "ilike.holy basil"))
            .and(query_param("limit", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([row(4, "Holy Basil")])))
            .mount(&server)
            .await;

        let store = PostgrestStore::new(&server.uri(), "anon-key");
        let hit = store.filter_one(Column::Name, "holy basil").await.unwrap();
        assert_eq!(hit.map(|p| p.id), Some(4));
    }

    #[tokio::test]
    async fn insert_sends_snake_case_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/plants"))
            .and(header("Prefer", "return=representation"))
            .and(body_partial_json(json!([{ "scientific_name": "Tulsi scientifica" }])))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!([row(9, "Tulsi")])))
            .expect(1)
            .mount(&server)
            .await;

        let store = PostgrestStore::new(&server.uri(), "anon-key");
        let created = store.insert(&fields("Tulsi")).await.unwrap();
        assert_eq!(created.id, 9);
    }

    #[tokio::test]
    async fn update_with_no_matching_row_is_missing() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/rest/v1/plants"))
            .and(query_param("id", "eq.12"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let store = PostgrestStore::new(&server.uri(), "anon-key");
        let err = store.update(12, &fields("Tulsi")).await.unwrap_err();
        assert!(matches!(err, StoreError::MissingRow(12)));
    }

    #[tokio::test]
    async fn error_status_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/rest/v1/plants"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .mount(&server)
            .await;

        let store = PostgrestStore::new(&server.uri(), "anon-key");
        let err = store.delete(3).await.unwrap_err();
        match err {
            StoreError::Status { status, body } => {
                assert_eq!(status, 401);
                assert_eq!(body, "bad key");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
