use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use shared::{
    domain::{Car, CarId, CarListItem, CarPatch, NewCar},
    error::ApiError,
    protocol::{CarListQuery, CARS_PATH, CAR_TAGS_PATH, CAR_TYPES_PATH, RESET_PATH},
};
use tracing::debug;
use url::Url;

use crate::error::ApiFailure;

#[async_trait]
pub trait CarApi: Send + Sync {
    async fn list_cars(&self, query: &CarListQuery) -> Result<Vec<CarListItem>, ApiFailure>;
    async fn get_car(&self, id: CarId) -> Result<Car, ApiFailure>;
    async fn car_types(&self) -> Result<Vec<String>, ApiFailure>;
    async fn car_tags(&self) -> Result<Vec<String>, ApiFailure>;
    async fn create_car(&self, car: &NewCar) -> Result<Car, ApiFailure>;
    async fn update_car(&self, id: CarId, patch: &CarPatch) -> Result<Car, ApiFailure>;
    async fn delete_car(&self, id: CarId) -> Result<(), ApiFailure>;
    async fn reset_catalog(&self) -> Result<(), ApiFailure>;
}

pub struct HttpCarApi {
    http: Client,
    base_url: Url,
}

impl HttpCarApi {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: &str) -> anyhow::Result<Self> {
        Ok(Self {
            http,
            base_url: parse_base_url(base_url)?,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiFailure> {
        self.base_url
            .join(path)
            .map_err(|err| ApiFailure::client(format!("invalid endpoint path '{path}': {err}")))
    }

    fn car_endpoint(&self, id: CarId) -> Result<Url, ApiFailure> {
        self.endpoint(&format!("{CARS_PATH}/{id}"))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ApiFailure> {
        let response = request.send().await.map_err(ApiFailure::from_transport)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = match response.bytes().await {
            Ok(bytes) => serde_json::from_slice::<ApiError>(&bytes).unwrap_or_default(),
            Err(_) => ApiError::default(),
        };
        debug!(status = status.as_u16(), ?body, "car api: request rejected");
        Err(ApiFailure::rejection(status.as_u16(), &body))
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiFailure> {
        self.send(request)
            .await?
            .json::<T>()
            .await
            .map_err(ApiFailure::from_transport)
    }
}

#[async_trait]
impl CarApi for HttpCarApi {
    async fn list_cars(&self, query: &CarListQuery) -> Result<Vec<CarListItem>, ApiFailure> {
        let url = self.endpoint(CARS_PATH)?;
        self.send_json(self.http.get(url).query(query)).await
    }

    async fn get_car(&self, id: CarId) -> Result<Car, ApiFailure> {
        let url = self.car_endpoint(id)?;
        self.send_json(self.http.get(url)).await
    }

    async fn car_types(&self) -> Result<Vec<String>, ApiFailure> {
        let url = self.endpoint(CAR_TYPES_PATH)?;
        self.send_json(self.http.get(url)).await
    }

    async fn car_tags(&self) -> Result<Vec<String>, ApiFailure> {
        let url = self.endpoint(CAR_TAGS_PATH)?;
        self.send_json(self.http.get(url)).await
    }

    async fn create_car(&self, car: &NewCar) -> Result<Car, ApiFailure> {
        let url = self.endpoint(CARS_PATH)?;
        self.send_json(self.http.post(url).json(car)).await
    }

    async fn update_car(&self, id: CarId, patch: &CarPatch) -> Result<Car, ApiFailure> {
        let url = self.car_endpoint(id)?;
        self.send_json(self.http.patch(url).json(patch)).await
    }

    async fn delete_car(&self, id: CarId) -> Result<(), ApiFailure> {
        let url = self.car_endpoint(id)?;
        self.send(self.http.delete(url)).await?;
        Ok(())
    }

    async fn reset_catalog(&self) -> Result<(), ApiFailure> {
        let url = self.endpoint(RESET_PATH)?;
        self.send(self.http.post(url)).await?;
        Ok(())
    }
}

pub fn parse_base_url(raw: &str) -> anyhow::Result<Url> {
    let trimmed = raw.trim();
    let mut url = Url::parse(trimmed)
        .map_err(|err| anyhow::anyhow!("invalid api base url '{trimmed}': {err}"))?;
    if !matches!(url.scheme(), "http" | "https") {
        anyhow::bail!("api base url must start with http:// or https://");
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

#[cfg(test)]
#[path = "tests/api_tests.rs"]
mod tests;
