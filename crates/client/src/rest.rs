//! REST implementation of the store gateway, speaking the PostgREST-style
//! protocol: `/rest/v1/{collection}` for data, `/auth/v1` for password
//! sessions, `/functions/v1` for the contract email function.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::{watch, RwLock};
use tracing::{debug, warn};
use uuid::Uuid;

use fleetdesk_core::config::StoreConfig;
use fleetdesk_core::domain::{
    Customer, CustomerDraft, NewRental, NewRentalRequest, NewVehicle, Rental, RentalId,
    RentalRequest, RequestId, RequestStatus, Vehicle,
};
use fleetdesk_core::gateway::{Collection, RentalPatch, SessionInfo, StoreError, StoreGateway};

use crate::auth::{Session, SessionStore};
use crate::records::{
    CustomerRecord, NewCustomerRecord, NewRentalRecord, NewRequestRecord, NewVehicleRecord,
    RentalPatchRecord, RentalRecord, RequestRecord, VehicleRecord,
};

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    user: TokenUser,
}

#[derive(Debug, Deserialize)]
struct TokenUser {
    id: String,
    email: String,
}

pub struct RestGateway {
    http: Client,
    base_url: String,
    api_key: SecretString,
    session_store: SessionStore,
    session: RwLock<Option<Session>>,
    events: watch::Sender<Option<SessionInfo>>,
}

impl RestGateway {
    /// Builds the gateway and restores any session persisted by a previous
    /// invocation.
    pub fn new(store: &StoreConfig, session_file: PathBuf) -> Result<Self, StoreError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(store.timeout_secs))
            .build()
            .map_err(|error| StoreError::Network(format!("could not build http client: {error}")))?;

        let session_store = SessionStore::new(session_file);
        let session = session_store.load();
        let (events, _) = watch::channel(session.as_ref().map(Session::info));

        Ok(Self {
            http,
            base_url: store.base_url.trim_end_matches('/').to_string(),
            api_key: store.api_key.clone(),
            session_store,
            session: RwLock::new(session),
            events,
        })
    }

    fn collection_url(&self, collection: Collection) -> String {
        format!("{}/rest/v1/{}", self.base_url, collection.as_str())
    }

    /// The anon key identifies the app on every call; the bearer token is
    /// the operator's access token when signed in, the anon key otherwise.
    async fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        let token = {
            let session = self.session.read().await;
            session.as_ref().map(|session| session.access_token.clone())
        };
        let bearer = token.unwrap_or_else(|| self.api_key.expose_secret().to_string());
        builder.header("apikey", self.api_key.expose_secret()).bearer_auth(bearer)
    }

    async fn execute(
        &self,
        operation: &'static str,
        target: &'static str,
        request: RequestBuilder,
    ) -> Result<reqwest::Response, StoreError> {
        let correlation_id = Uuid::new_v4();
        debug!(
            event_name = "store.request",
            operation,
            target,
            correlation_id = %correlation_id,
            "calling store"
        );

        let result = async {
            let response = request
                .send()
                .await
                .map_err(|error| StoreError::Network(format!("{operation} {target}: {error}")))?;

            let status = response.status();
            if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                return Err(StoreError::Auth(format!(
                    "{operation} {target} rejected with {status}"
                )));
            }
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(StoreError::Network(reject_message(operation, target, status, &body)));
            }

            Ok(response)
        }
        .await;

        if let Err(error) = &result {
            warn!(
                event_name = "store.request_failed",
                operation,
                target,
                correlation_id = %correlation_id,
                error = %error,
                "store call failed"
            );
        }

        result
    }

    async fn list_rows<T: DeserializeOwned>(
        &self,
        collection: Collection,
    ) -> Result<Vec<T>, StoreError> {
        let request = self.authed(self.http.get(self.collection_url(collection))).await;
        let response = self.execute("list", collection.as_str(), request).await?;
        decode("list", collection.as_str(), response).await
    }

    async fn insert_row<T, P>(&self, collection: Collection, payload: &P) -> Result<T, StoreError>
    where
        T: DeserializeOwned,
        P: serde::Serialize,
    {
        let request = self
            .authed(self.http.post(self.collection_url(collection)))
            .await
            .header("Prefer", "return=representation")
            .json(payload);
        let response = self.execute("insert", collection.as_str(), request).await?;

        let rows: Vec<T> = decode("insert", collection.as_str(), response).await?;
        rows.into_iter().next().ok_or_else(|| {
            StoreError::Schema(format!(
                "insert into {} returned no representation",
                collection.as_str()
            ))
        })
    }

    async fn patch_row<T, P>(
        &self,
        collection: Collection,
        id: i64,
        payload: &P,
    ) -> Result<T, StoreError>
    where
        T: DeserializeOwned,
        P: serde::Serialize,
    {
        let request = self
            .authed(self.http.patch(self.collection_url(collection)))
            .await
            .query(&[("id", format!("eq.{id}"))])
            .header("Prefer", "return=representation")
            .json(payload);
        let response = self.execute("update", collection.as_str(), request).await?;

        let rows: Vec<T> = decode("update", collection.as_str(), response).await?;
        rows.into_iter().next().ok_or_else(|| {
            StoreError::Schema(format!("update of {} {id} matched no row", collection.as_str()))
        })
    }
}

#[async_trait]
impl StoreGateway for RestGateway {
    async fn sign_in(&self, email: &str, password: &str) -> Result<SessionInfo, StoreError> {
        let correlation_id = Uuid::new_v4();
        let url = format!("{}/auth/v1/token?grant_type=password", self.base_url);
        debug!(
            event_name = "store.sign_in",
            correlation_id = %correlation_id,
            email,
            "requesting password session"
        );

        let response = self
            .http
            .post(&url)
            .header("apikey", self.api_key.expose_secret())
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|error| StoreError::Network(format!("sign-in: {error}")))?;

        let status = response.status();
        if status.is_client_error() {
            warn!(
                event_name = "store.sign_in_rejected",
                correlation_id = %correlation_id,
                status = %status,
                "sign-in rejected"
            );
            return Err(StoreError::Auth(format!("sign-in rejected with {status}")));
        }
        if !status.is_success() {
            return Err(StoreError::Network(format!("sign-in returned {status}")));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|error| StoreError::Schema(format!("sign-in response: {error}")))?;
        let session = Session {
            access_token: token.access_token,
            user_id: token.user.id,
            email: token.user.email,
        };

        if let Err(error) = self.session_store.save(&session) {
            warn!(
                event_name = "session.save_failed",
                path = %self.session_store.path().display(),
                error = %error,
                "session not persisted; sign-in lasts for this invocation only"
            );
        }

        let info = session.info();
        *self.session.write().await = Some(session);
        self.events.send_replace(Some(info.clone()));
        Ok(info)
    }

    /// Signing out always succeeds locally: the token revocation is
    /// best-effort, the session file and cache state are cleared regardless.
    async fn sign_out(&self) -> Result<(), StoreError> {
        let token = {
            let session = self.session.read().await;
            session.as_ref().map(|session| session.access_token.clone())
        };

        if let Some(token) = token {
            let url = format!("{}/auth/v1/logout", self.base_url);
            let result = self
                .http
                .post(&url)
                .header("apikey", self.api_key.expose_secret())
                .bearer_auth(token)
                .send()
                .await;
            match result {
                Ok(response) if !response.status().is_success() => warn!(
                    event_name = "store.sign_out_rejected",
                    status = %response.status(),
                    "logout rejected; clearing local session anyway"
                ),
                Err(error) => warn!(
                    event_name = "store.sign_out_failed",
                    error = %error,
                    "logout call failed; clearing local session anyway"
                ),
                _ => {}
            }
        }

        if let Err(error) = self.session_store.clear() {
            warn!(
                event_name = "session.clear_failed",
                path = %self.session_store.path().display(),
                error = %error,
                "could not remove session file"
            );
        }

        *self.session.write().await = None;
        self.events.send_replace(None);
        Ok(())
    }

    async fn current_session(&self) -> Option<SessionInfo> {
        self.session.read().await.as_ref().map(Session::info)
    }

    fn session_events(&self) -> watch::Receiver<Option<SessionInfo>> {
        self.events.subscribe()
    }

    async fn list_vehicles(&self) -> Result<Vec<Vehicle>, StoreError> {
        let rows: Vec<VehicleRecord> = self.list_rows(Collection::Vehicles).await?;
        Ok(rows.into_iter().map(VehicleRecord::into_domain).collect())
    }

    async fn insert_vehicle(&self, new: &NewVehicle) -> Result<Vehicle, StoreError> {
        let row: VehicleRecord =
            self.insert_row(Collection::Vehicles, &NewVehicleRecord::from(new)).await?;
        Ok(row.into_domain())
    }

    async fn list_customers(&self) -> Result<Vec<Customer>, StoreError> {
        let rows: Vec<CustomerRecord> = self.list_rows(Collection::Customers).await?;
        Ok(rows.into_iter().map(CustomerRecord::into_domain).collect())
    }

    async fn insert_customer(&self, draft: &CustomerDraft) -> Result<Customer, StoreError> {
        let row: CustomerRecord =
            self.insert_row(Collection::Customers, &NewCustomerRecord::from(draft)).await?;
        Ok(row.into_domain())
    }

    async fn list_rentals(&self) -> Result<Vec<Rental>, StoreError> {
        let rows: Vec<RentalRecord> = self.list_rows(Collection::Rentals).await?;
        rows.into_iter().map(RentalRecord::into_domain).collect()
    }

    async fn insert_rental(&self, new: &NewRental) -> Result<Rental, StoreError> {
        let row: RentalRecord =
            self.insert_row(Collection::Rentals, &NewRentalRecord::from(new)).await?;
        row.into_domain()
    }

    async fn update_rental(
        &self,
        id: RentalId,
        patch: &RentalPatch,
    ) -> Result<Rental, StoreError> {
        let row: RentalRecord =
            self.patch_row(Collection::Rentals, id.0, &RentalPatchRecord::from(patch)).await?;
        row.into_domain()
    }

    async fn list_requests(&self) -> Result<Vec<RentalRequest>, StoreError> {
        let rows: Vec<RequestRecord> = self.list_rows(Collection::RentalRequests).await?;
        rows.into_iter().map(RequestRecord::into_domain).collect()
    }

    async fn insert_request(&self, new: &NewRentalRequest) -> Result<RentalRequest, StoreError> {
        let row: RequestRecord =
            self.insert_row(Collection::RentalRequests, &NewRequestRecord::from(new)).await?;
        row.into_domain()
    }

    async fn update_request_status(
        &self,
        id: RequestId,
        status: RequestStatus,
    ) -> Result<RentalRequest, StoreError> {
        let row: RequestRecord = self
            .patch_row(Collection::RentalRequests, id.0, &json!({ "status": status.as_str() }))
            .await?;
        row.into_domain()
    }

    async fn send_contract(&self, rental_id: RentalId) -> Result<(), StoreError> {
        let url = format!("{}/functions/v1/send-contract", self.base_url);
        let request = self.authed(self.http.post(&url)).await.json(&json!({
            "rentalId": rental_id.0
        }));
        self.execute("invoke", "send-contract", request).await.map(|_| ())
    }
}

async fn decode<T: DeserializeOwned>(
    operation: &'static str,
    target: &'static str,
    response: reqwest::Response,
) -> Result<T, StoreError> {
    response
        .json::<T>()
        .await
        .map_err(|error| StoreError::Schema(format!("{operation} {target}: {error}")))
}

fn reject_message(
    operation: &str,
    target: &str,
    status: StatusCode,
    body: &str,
) -> String {
    let detail = body.trim();
    if detail.is_empty() {
        return format!("{operation} {target} returned {status}");
    }

    let mut detail = detail.replace('\n', " ");
    if detail.chars().count() > 200 {
        detail = detail.chars().take(200).collect();
        detail.push_str("...");
    }
    format!("{operation} {target} returned {status}: {detail}")
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;

    use super::reject_message;

    #[test]
    fn reject_message_includes_trimmed_store_detail() {
        let message = reject_message(
            "insert",
            "rentals",
            StatusCode::CONFLICT,
            "{\"message\":\"duplicate key\"}\n",
        );
        assert!(message.contains("insert rentals"));
        assert!(message.contains("409"));
        assert!(message.contains("duplicate key"));
    }

    #[test]
    fn reject_message_truncates_long_bodies() {
        let body = "x".repeat(500);
        let message = reject_message("list", "vehicles", StatusCode::BAD_GATEWAY, &body);
        assert!(message.len() < 300);
        assert!(message.ends_with("..."));
    }

    #[test]
    fn reject_message_without_body_reports_status_only() {
        let message = reject_message("update", "rentals", StatusCode::INTERNAL_SERVER_ERROR, "  ");
        assert_eq!(message, "update rentals returned 500 Internal Server Error");
    }
}
