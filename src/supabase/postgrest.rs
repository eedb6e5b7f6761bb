use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{from_api_error, ApiErrorBody, AppResult};
use crate::supabase::SupabaseClient;

/// Sort direction for `order` clauses.
#[derive(Clone, Copy, Debug)]
pub enum Order {
    Asc,
    Desc,
}

/// Builder for one filtered request against a named table, mirroring the
/// backend's query grammar (`column=eq.value`, `or=(...)`, `order=...`).
pub struct TableQuery {
    client: SupabaseClient,
    table: String,
    select: String,
    filters: Vec<(String, String)>,
    order: Option<String>,
    limit: Option<u32>,
}

impl SupabaseClient {
    /// Start a query against a table, like `from("rides")`.
    pub fn from(&self, table: &str) -> TableQuery {
        TableQuery {
            client: self.clone(),
            table: table.to_string(),
            select: "*".to_string(),
            filters: Vec::new(),
            order: None,
            limit: None,
        }
    }

    /// Call a server-side function, e.g. the geo-proximity lookup.
    pub async fn rpc<A: Serialize, T: DeserializeOwned>(
        &self,
        function: &str,
        args: &A,
    ) -> AppResult<T> {
        let url = format!("{}/rest/v1/rpc/{}", self.config.supabase_url, function);
        let response = self
            .http
            .post(url)
            .header("apikey", &self.config.supabase_anon_key)
            .bearer_auth(self.bearer().await)
            .json(args)
            .send()
            .await?;
        read_response(response).await
    }
}

impl TableQuery {
    /// Columns (and embedded relations) to return.
    pub fn select(mut self, columns: &str) -> Self {
        self.select = columns.to_string();
        self
    }

    pub fn eq(mut self, column: &str, value: impl ToString) -> Self {
        self.filters
            .push((column.to_string(), format!("eq.{}", value.to_string())));
        self
    }

    pub fn neq(mut self, column: &str, value: impl ToString) -> Self {
        self.filters
            .push((column.to_string(), format!("neq.{}", value.to_string())));
        self
    }

    pub fn gte(mut self, column: &str, value: impl ToString) -> Self {
        self.filters
            .push((column.to_string(), format!("gte.{}", value.to_string())));
        self
    }

    /// Disjunction over grouped conditions, e.g. both directions of a private
    /// conversation.
    pub fn or(mut self, conditions: &str) -> Self {
        self.filters
            .push(("or".to_string(), format!("({})", conditions)));
        self
    }

    pub fn order(mut self, column: &str, direction: Order) -> Self {
        let dir = match direction {
            Order::Asc => "asc",
            Order::Desc => "desc",
        };
        self.order = Some(format!("{}.{}", column, dir));
        self
    }

    pub fn limit(mut self, n: u32) -> Self {
        self.limit = Some(n);
        self
    }

    /// Full query-string parameters this request will carry.
    pub fn params(&self) -> Vec<(String, String)> {
        let mut params = vec![("select".to_string(), self.select.clone())];
        params.extend(self.filters.iter().cloned());
        if let Some(order) = &self.order {
            params.push(("order".to_string(), order.clone()));
        }
        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        params
    }

    fn url(&self) -> String {
        format!(
            "{}/rest/v1/{}",
            self.client.config.supabase_url, self.table
        )
    }

    async fn request(&self, method: reqwest::Method) -> AppResult<reqwest::RequestBuilder> {
        Ok(self
            .client
            .http
            .request(method, self.url())
            .header("apikey", &self.client.config.supabase_anon_key)
            .bearer_auth(self.client.bearer().await)
            .query(&self.params()))
    }

    /// Fetch all matching rows.
    pub async fn fetch<T: DeserializeOwned>(self) -> AppResult<Vec<T>> {
        let response = self.request(reqwest::Method::GET).await?.send().await?;
        read_response(response).await
    }

    /// Fetch exactly one row (`.single()` in the original client).
    pub async fn single<T: DeserializeOwned>(self) -> AppResult<T> {
        let response = self
            .request(reqwest::Method::GET)
            .await?
            .header("Accept", "application/vnd.pgrst.object+json")
            .send()
            .await?;
        read_response(response).await
    }

    /// Insert a row and return the stored representation.
    pub async fn insert<P: Serialize, T: DeserializeOwned>(self, payload: &P) -> AppResult<T> {
        let response = self
            .request(reqwest::Method::POST)
            .await?
            .header("Prefer", "return=representation")
            .header("Accept", "application/vnd.pgrst.object+json")
            .json(payload)
            .send()
            .await?;
        read_response(response).await
    }

    /// Update the rows selected by the current filters.
    pub async fn update<P: Serialize>(self, payload: &P) -> AppResult<()> {
        let response = self
            .request(reqwest::Method::PATCH)
            .await?
            .json(payload)
            .send()
            .await?;
        read_empty(response).await
    }

    /// Delete the rows selected by the current filters.
    pub async fn delete(self) -> AppResult<()> {
        let response = self.request(reqwest::Method::DELETE).await?.send().await?;
        read_empty(response).await
    }
}

async fn read_response<T: DeserializeOwned>(response: reqwest::Response) -> AppResult<T> {
    let status = response.status();
    if status.is_success() {
        Ok(response.json().await?)
    } else {
        let body: ApiErrorBody = response.json().await.unwrap_or_default();
        Err(from_api_error(status, body))
    }
}

async fn read_empty(response: reqwest::Response) -> AppResult<()> {
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        let body: ApiErrorBody = response.json().await.unwrap_or_default();
        Err(from_api_error(status, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn client() -> SupabaseClient {
        SupabaseClient::new(Config {
            supabase_url: "https://abc.supabase.co".to_string(),
            supabase_anon_key: "anon".to_string(),
            geocoding_url: String::new(),
            routing_url: String::new(),
            password_reset_redirect: String::new(),
        })
    }

    #[test]
    fn ride_search_builds_expected_filters() {
        let query = client()
            .from("rides")
            .select("*, driver:profiles!rides_driver_id_fkey(full_name)")
            .eq("status", "pendente")
            .gte("departure_time", "2026-08-30T12:00:00Z")
            .order("departure_time", Order::Asc);

        let params = query.params();
        assert!(params.contains(&("status".to_string(), "eq.pendente".to_string())));
        assert!(params.contains(&(
            "departure_time".to_string(),
            "gte.2026-08-30T12:00:00Z".to_string()
        )));
        assert!(params.contains(&("order".to_string(), "departure_time.asc".to_string())));
    }

    #[test]
    fn or_filter_wraps_conditions_in_parentheses() {
        let query = client()
            .from("private_messages")
            .or("and(sender_id.eq.a,receiver_id.eq.b),and(sender_id.eq.b,receiver_id.eq.a)");

        let params = query.params();
        assert!(params.contains(&(
            "or".to_string(),
            "(and(sender_id.eq.a,receiver_id.eq.b),and(sender_id.eq.b,receiver_id.eq.a))"
                .to_string()
        )));
    }

    #[test]
    fn limit_and_neq_are_carried() {
        let params = client()
            .from("user_points")
            .neq("user_id", "x")
            .limit(10)
            .params();
        assert!(params.contains(&("user_id".to_string(), "neq.x".to_string())));
        assert!(params.contains(&("limit".to_string(), "10".to_string())));
    }

    #[test]
    fn select_defaults_to_star() {
        let params = client().from("badges").params();
        assert_eq!(params[0], ("select".to_string(), "*".to_string()));
    }
}
