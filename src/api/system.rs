use crate::api::{AssistantsResponse, HealthResponse};

async fn get_json<T: serde::de::DeserializeOwned>(
    client: &reqwest::Client,
    url: &str,
) -> Result<T, Box<dyn std::error::Error>> {
    let response = client
        .get(url)
        .header("Accept", "application/json")
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status();
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(format!("Request to {url} failed with status {status}: {error_text}").into());
    }

    Ok(response.json::<T>().await?)
}

pub async fn fetch_health(
    client: &reqwest::Client,
    health_url: &str,
) -> Result<HealthResponse, Box<dyn std::error::Error>> {
    get_json(client, health_url).await
}

pub async fn fetch_assistants(
    client: &reqwest::Client,
    assistants_url: &str,
) -> Result<AssistantsResponse, Box<dyn std::error::Error>> {
    get_json(client, assistants_url).await
}

/// Assistant names in a stable order for display.
pub fn sorted_assistant_names(response: &AssistantsResponse) -> Vec<&str> {
    let mut names: Vec<&str> = response.assistants.keys().map(String::as_str).collect();
    names.sort_unstable();
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_utils::spawn_http_responder;
    use crate::utils::url::construct_api_url;

    #[tokio::test]
    async fn health_parses_service_summary() {
        let (base_url, server) = spawn_http_responder(
            200,
            r#"{"status":"healthy","app":"crystal","version":"1.0.0","assistants":["ruby","sage"]}"#,
        )
        .await;
        let url = construct_api_url(&base_url, "health");

        let health = fetch_health(&reqwest::Client::new(), &url).await.unwrap();
        assert_eq!(health.status, "healthy");
        assert_eq!(health.version.as_deref(), Some("1.0.0"));
        assert_eq!(health.assistants, vec!["ruby", "sage"]);

        let request = server.await.unwrap().unwrap();
        assert_eq!(request.request_line, "GET /health HTTP/1.1");
    }

    #[tokio::test]
    async fn assistants_are_listed_by_name() {
        let (base_url, server) = spawn_http_responder(
            200,
            r#"{"assistants":{"sage":{"name":"Sage"},"ruby":{"name":"Ruby"}},"count":2}"#,
        )
        .await;
        let url = construct_api_url(&base_url, "api/v1/assistants");

        let response = fetch_assistants(&reqwest::Client::new(), &url)
            .await
            .unwrap();
        assert_eq!(response.count, 2);
        assert_eq!(sorted_assistant_names(&response), vec!["ruby", "sage"]);

        let request = server.await.unwrap().unwrap();
        assert_eq!(request.request_line, "GET /api/v1/assistants HTTP/1.1");
    }

    #[tokio::test]
    async fn error_status_is_reported_with_body() {
        let (base_url, server) = spawn_http_responder(503, "maintenance").await;
        let url = construct_api_url(&base_url, "health");

        let err = fetch_health(&reqwest::Client::new(), &url)
            .await
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("503"), "unexpected error: {message}");
        assert!(message.contains("maintenance"), "unexpected error: {message}");
        server.await.unwrap().unwrap();
    }
}
