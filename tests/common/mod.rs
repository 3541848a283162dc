#![allow(dead_code)]

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tollgate::application_impl::*;
use tollgate::domain_model::*;
use tollgate::domain_port::*;
use tollgate::infra::*;
use tollgate::settings::*;

pub const ADMIN: &str = "admin@example.com";
pub const EDITOR: &str = "editor@example.com";

#[derive(Default)]
pub struct RecordingNavigator {
    visits: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn visits(&self) -> Vec<String> {
        self.visits.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, destination: &str) {
        self.visits.lock().unwrap().push(destination.to_string());
    }
}

pub struct Harness {
    pub api: Arc<FakeAuthApi>,
    pub store: Arc<MemorySessionStore>,
    pub channel: AuthChannel,
    pub navigator: Arc<RecordingNavigator>,
    pub client: Arc<ApiClient>,
    pub tokens: TokenPair,
}

impl Harness {
    pub fn interactive() -> Self {
        Self::build(ApiClientConfig::default(), true)
    }

    pub fn server_render() -> Self {
        Self::build(ApiClientConfig::default(), false)
    }

    pub fn build(config: ApiClientConfig, interactive: bool) -> Self {
        let api = Arc::new(FakeAuthApi::with_demo_accounts());
        let tokens = api.issue(ADMIN).unwrap();
        let store = Arc::new(MemorySessionStore::with_tokens(tokens.clone()));
        let channel = AuthChannel::new();
        let navigator = Arc::new(RecordingNavigator::default());
        let context = if interactive {
            ExecutionContext::interactive(navigator.clone())
        } else {
            ExecutionContext::ServerRender
        };
        let client = Arc::new(ApiClient::new(
            config,
            api.clone(),
            store.clone(),
            Arc::new(channel.open()),
            context,
        ));
        Self {
            api,
            store,
            channel,
            navigator,
            client,
            tokens,
        }
    }
}

/// Polls `condition` until it holds, failing the test after five seconds.
pub async fn wait_until(condition: impl Fn() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .expect("condition never held");
}

pub async fn within<F: Future>(future: F) -> F::Output {
    tokio::time::timeout(Duration::from_secs(5), future)
        .await
        .expect("future never completed")
}

pub fn settings() -> Settings {
    Settings {
        api: Api {
            backend: "fake".to_string(),
            base_url: "http://localhost:3333".to_string(),
            refresh_path: "/refresh".to_string(),
            refresh_timeout_secs: Some(5),
            request_timeout_secs: 5,
        },
        guard: Guard {
            unauthenticated_destination: "/".to_string(),
            authenticated_destination: "/dashboard".to_string(),
        },
        session: Session {
            backend: "memory".to_string(),
            redis_dsn: None,
            key_prefix: "test".to_string(),
        },
        http: Http {
            address: "127.0.0.1:0".to_string(),
            cert_path: None,
            key_path: None,
        },
        log: Log {
            filter: "debug".to_string(),
        },
    }
}
