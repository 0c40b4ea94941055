use nutritrack::app::build_app;
use nutritrack::auth::password::hash_password;
use nutritrack::state::AppState;
use nutritrack::user::repo::{NewUser, User};

/// A running application bound to an ephemeral port, backed by the
/// in-memory state so tests can inspect stored rows directly.
pub struct TestApp {
    pub base: String,
    pub state: AppState,
    pub client: reqwest::Client,
}

pub async fn spawn_app() -> TestApp {
    let state = AppState::fake();
    let app = build_app(state.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("test server");
    });
    TestApp {
        base: format!("http://{addr}"),
        state,
        client: reqwest::Client::new(),
    }
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub async fn create_user(&self, email: &str, password: &str, is_staff: bool) -> User {
        let user = self
            .state
            .users
            .insert(NewUser {
                email: email.to_string(),
                password_hash: hash_password(password).expect("hash password"),
                name: "testuser".to_string(),
                fullname: "Anonim".to_string(),
                is_staff,
            })
            .await
            .expect("insert user");
        self.state
            .profiles
            .create_for_user(user.id)
            .await
            .expect("create profile");
        user
    }

    pub async fn token_for(&self, user: &User) -> String {
        self.state
            .tokens
            .get_or_create(user.id)
            .await
            .expect("issue token")
            .key
    }
}
