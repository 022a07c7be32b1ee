//! Top-level TM client
//!
//! Owns the server address, the shared bearer authenticator, and the HTTP
//! client, and exposes the REST reads. Field-set handles produced by
//! [`Client::fieldsets`] share the same authenticator, so the realtime
//! channel reuses cached tokens instead of re-authenticating.

use std::sync::Arc;
use tracing::debug;
use url::Url;

use crate::auth::{BearerAuthenticator, Credentials};
use crate::error::{ClientError, Result};
use crate::fieldset::Fieldset;
use crate::rest::{
    Division, DivisionsResponse, EventInfo, FieldsetsResponse, Match, MatchesResponse, Ranking,
    RankingsResponse, SkillsRanking, Team,
};

/// Async client for one Tournament Manager server.
pub struct Client {
    address: Url,
    http: reqwest::Client,
    auth: Arc<BearerAuthenticator>,
}

impl Client {
    /// Create a client for the TM server at `address` (for example
    /// `http://localhost`). No network traffic happens until a request
    /// is made.
    pub fn new(address: &str, credentials: Credentials) -> Result<Self> {
        Ok(Self {
            address: Url::parse(address)?,
            http: reqwest::Client::new(),
            auth: Arc::new(BearerAuthenticator::new(credentials)),
        })
    }

    /// The shared bearer-token source.
    pub fn authenticator(&self) -> Arc<BearerAuthenticator> {
        self.auth.clone()
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.address.join(path)?;
        let token = self.auth.ensure().await?;

        debug!("GET {}", url);

        let response = self.http.get(url).bearer_auth(token).send().await?;
        if !response.status().is_success() {
            return Err(ClientError::WebServer(response.status().as_u16()));
        }

        Ok(response.json::<T>().await?)
    }

    /// Basic event information.
    pub async fn event_info(&self) -> Result<EventInfo> {
        self.get("/api/event").await
    }

    /// All divisions at the event.
    pub async fn divisions(&self) -> Result<Vec<Division>> {
        Ok(self.get::<DivisionsResponse>("/api/divisions").await?.divisions)
    }

    /// All registered teams.
    pub async fn teams(&self) -> Result<Vec<Team>> {
        self.get("/api/teams").await
    }

    /// Teams registered in one division. The web server only exposes the
    /// full roster, so this filters on each team's division id.
    pub async fn teams_in_division(&self, division_id: i32) -> Result<Vec<Team>> {
        let mut teams = self.teams().await?;
        teams.retain(|team| team.div_id == division_id);
        Ok(teams)
    }

    /// The match list for one division.
    pub async fn matches(&self, division_id: i32) -> Result<Vec<Match>> {
        Ok(self
            .get::<MatchesResponse>(&format!("/api/matches/{division_id}"))
            .await?
            .matches)
    }

    /// Qualification rankings for one division.
    pub async fn rankings(&self, division_id: i32) -> Result<Vec<Ranking>> {
        Ok(self
            .get::<RankingsResponse>(&format!("/api/rankings/{division_id}"))
            .await?
            .rankings)
    }

    /// Skills standings for the event.
    pub async fn skills(&self) -> Result<Vec<SkillsRanking>> {
        self.get("/api/skills").await
    }

    /// Field sets at the event, as connectable handles. Each handle shares
    /// this client's authenticator; none has a live channel until
    /// `connect()` is called on it.
    pub async fn fieldsets(&self) -> Result<Vec<Fieldset>> {
        let listed = self
            .get::<FieldsetsResponse>("/api/fieldsets")
            .await?
            .field_sets;

        Ok(listed
            .into_iter()
            .map(|info| {
                Fieldset::new(
                    info.id,
                    info.name,
                    self.address.clone(),
                    self.auth.clone(),
                    self.http.clone(),
                )
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> Client {
        Client::new(
            "http://localhost",
            Credentials {
                client_id: "id".into(),
                client_secret: "secret".into(),
                expiration_date: u64::MAX,
            },
        )
        .unwrap()
    }

    #[test]
    fn rejects_malformed_address() {
        let result = Client::new(
            "not a url",
            Credentials {
                client_id: "id".into(),
                client_secret: "secret".into(),
                expiration_date: u64::MAX,
            },
        );
        assert!(matches!(result, Err(ClientError::InvalidUrl(_))));
    }

    #[test]
    fn authenticator_is_shared() {
        let client = client();
        let a = client.authenticator();
        let b = client.authenticator();
        assert!(Arc::ptr_eq(&a, &b));
    }

    // Serve one canned JSON response on a loopback socket.
    async fn serve_once(body: &'static str) -> u16 {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 1024];
            let _ = socket.read(&mut request).await;
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            let _ = socket.write_all(response.as_bytes()).await;
        });
        port
    }

    #[tokio::test]
    async fn teams_in_division_filters_the_roster() {
        let body = r#"[
            { "number": "1234A", "name": "Alpha", "city": "Austin", "state": "TX",
              "country": "United States", "ageGroup": "HIGH_SCHOOL",
              "divId": 1, "checkedIn": true },
            { "number": "5678B", "name": "Beta", "city": "Dallas", "state": "TX",
              "country": "United States", "ageGroup": "MIDDLE_SCHOOL",
              "divId": 2, "checkedIn": false }
        ]"#;
        let port = serve_once(body).await;

        let client = Client::new(
            &format!("http://127.0.0.1:{port}"),
            Credentials {
                client_id: "id".into(),
                client_secret: "secret".into(),
                expiration_date: u64::MAX,
            },
        )
        .unwrap();
        client.authenticator().seed_token("token").await;

        let teams = client.teams_in_division(2).await.unwrap();
        assert_eq!(teams.len(), 1);
        assert_eq!(teams[0].number, "5678B");
    }
}
