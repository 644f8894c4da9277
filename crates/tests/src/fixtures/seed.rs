use serde_json::Value;

use super::test_app::TestApp;

/// Result of seeding a test team with an owner, a joined member, and the
/// default channels.
pub struct SeededTeam {
    pub team_id: String,
    pub invite_code: String,
    pub owner: SeededUser,
    pub member: SeededUser,
    pub channels: Vec<SeededChannel>,
}

pub struct SeededUser {
    pub id: String,
    pub email: String,
    pub username: String,
    pub access_token: String,
    pub refresh_token: String,
}

pub struct SeededChannel {
    pub id: String,
    pub name: String,
}

impl TestApp {
    /// Register a user and return their auth info.
    pub async fn register_user(
        &self,
        email: &str,
        username: &str,
        first_name: &str,
        last_name: &str,
        password: &str,
    ) -> SeededUser {
        let resp = self
            .client
            .post(self.url("/api/auth/register"))
            .json(&serde_json::json!({
                "email": email,
                "username": username,
                "first_name": first_name,
                "last_name": last_name,
                "password": password,
            }))
            .send()
            .await
            .expect("Register request failed");

        let status = resp.status().as_u16();
        let json: Value = resp.json().await.expect("Failed to parse register response");
        assert_eq!(status, 201, "Register failed: {json}");

        SeededUser {
            id: json["user"]["id"].as_str().unwrap().to_string(),
            email: email.to_string(),
            username: username.to_string(),
            access_token: json["access_token"].as_str().unwrap().to_string(),
            refresh_token: json["refresh_token"].as_str().unwrap().to_string(),
        }
    }

    /// Login a user and return their auth info.
    pub async fn login_user(&self, email: &str, password: &str) -> SeededUser {
        let resp = self
            .client
            .post(self.url("/api/auth/login"))
            .json(&serde_json::json!({
                "email": email,
                "password": password,
            }))
            .send()
            .await
            .expect("Login request failed");

        assert!(
            resp.status().is_success(),
            "Login failed: {}",
            resp.text().await.unwrap_or_default()
        );

        let json: Value = resp.json().await.expect("Failed to parse login response");

        SeededUser {
            id: json["user"]["id"].as_str().unwrap().to_string(),
            email: email.to_string(),
            username: json["user"]["username"].as_str().unwrap().to_string(),
            access_token: json["access_token"].as_str().unwrap().to_string(),
            refresh_token: json["refresh_token"].as_str().unwrap().to_string(),
        }
    }

    /// Create an authenticated request with the given token.
    pub fn auth_get(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.client
            .get(self.url(path))
            .header("Authorization", format!("Bearer {}", token))
    }

    pub fn auth_post(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.client
            .post(self.url(path))
            .header("Authorization", format!("Bearer {}", token))
    }

    pub fn auth_put(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.client
            .put(self.url(path))
            .header("Authorization", format!("Bearer {}", token))
    }

    pub fn auth_delete(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.client
            .delete(self.url(path))
            .header("Authorization", format!("Bearer {}", token))
    }

    /// Seed a team: register an owner who creates it, register a second user
    /// who joins via the invite code.
    pub async fn seed_team(&self, tag: &str) -> SeededTeam {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        let suffix = &suffix[..8];

        let owner = self
            .register_user(
                &format!("owner-{tag}-{suffix}@test.dev"),
                &format!("{tag}_owner_{suffix}"),
                "Olive",
                "Owner",
                "Owner123!",
            )
            .await;

        let resp = self
            .auth_post("/api/team", &owner.access_token)
            .json(&serde_json::json!({
                "name": format!("{tag} team"),
                "description": "seeded by tests",
            }))
            .send()
            .await
            .expect("Create team failed");

        let status = resp.status().as_u16();
        let json: Value = resp.json().await.expect("Failed to parse team response");
        assert_eq!(status, 201, "Create team failed: {json}");

        let team_id = json["team"]["id"].as_str().unwrap().to_string();
        let invite_code = json["team"]["invite_code"].as_str().unwrap().to_string();
        let channels = json["channels"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| SeededChannel {
                id: c["id"].as_str().unwrap().to_string(),
                name: c["name"].as_str().unwrap().to_string(),
            })
            .collect();

        let member = self
            .register_user(
                &format!("member-{tag}-{suffix}@test.dev"),
                &format!("{tag}_member_{suffix}"),
                "Milo",
                "Member",
                "Member123!",
            )
            .await;

        let resp = self
            .auth_post("/api/team/join", &member.access_token)
            .json(&serde_json::json!({ "invite_code": invite_code }))
            .send()
            .await
            .expect("Join team failed");
        assert!(
            resp.status().is_success(),
            "Join team failed: {}",
            resp.text().await.unwrap_or_default()
        );

        SeededTeam {
            team_id,
            invite_code,
            owner,
            member,
            channels,
        }
    }
}
