use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use crate::infra::*;
use crate::infra_redis::*;
use crate::logger::*;
use crate::server::SignOutListener;
use crate::settings::Settings;
use dashmap::DashMap;
use nanoid::nanoid;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub struct Server {
    pub guard: Arc<AccessGuard>,
    pub transport: Arc<dyn HttpTransport>,
    /// One `auth` channel per device; contexts on other devices never hear it.
    auth_channels: DashMap<String, AuthChannel>,
    client_config: ApiClientConfig,
    authenticated_home: String,
    redis: Option<redis::aio::ConnectionManager>,
    key_prefix: String,
    listener_handles: Mutex<Vec<JoinHandle<()>>>,
    cancel: CancellationToken,
}

impl Server {
    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        let transport: Arc<dyn HttpTransport> = match settings.api.backend.as_str() {
            "fake" => Arc::new(FakeAuthApi::with_demo_accounts()),
            "real" => Arc::new(ReqwestTransport::try_new(
                settings.api.base_url.clone(),
                settings.api.request_timeout(),
            )?),
            other => return Err(anyhow::anyhow!("Unknown api backend: {}", other)),
        };

        let redis = match settings.session.backend.as_str() {
            "memory" => None,
            "redis" => {
                let dsn = settings
                    .session
                    .redis_dsn
                    .as_deref()
                    .ok_or_else(|| anyhow::anyhow!("session.redis_dsn is required for redis"))?;
                let client = redis::Client::open(dsn)?;
                Some(client.get_connection_manager().await?)
            }
            other => return Err(anyhow::anyhow!("Unknown session backend: {}", other)),
        };

        let destinations = GuardDestinations {
            unauthenticated: settings.guard.unauthenticated_destination.clone(),
            authenticated_home: settings.guard.authenticated_destination.clone(),
        };
        let decoder: Arc<dyn ClaimDecoder> = Arc::new(JwtClaimDecoder::new());
        let guard = Arc::new(AccessGuard::new(decoder, destinations));

        let client_config = ApiClientConfig {
            refresh: RefreshConfig {
                refresh_path: settings.api.refresh_path.clone(),
                timeout: settings.api.refresh_timeout(),
            },
            unauthenticated_destination: settings.guard.unauthenticated_destination.clone(),
        };

        info!(api = %settings.api.backend, session = %settings.session.backend, "server started");

        Ok(Self {
            guard,
            transport,
            auth_channels: DashMap::new(),
            client_config,
            authenticated_home: settings.guard.authenticated_destination.clone(),
            redis,
            key_prefix: settings.session.key_prefix.clone(),
            listener_handles: Mutex::new(Vec::new()),
            cancel: CancellationToken::new(),
        })
    }

    /// Client for rendering one request, reading and writing that request's
    /// cookies.
    pub fn render_client(
        &self,
        cookie_header: Option<&str>,
    ) -> (ApiClient, Arc<CookieSessionStore>) {
        let store = Arc::new(CookieSessionStore::from_header(cookie_header));
        let client = ApiClient::new(
            self.client_config.clone(),
            self.transport.clone(),
            store.clone(),
            // a rendering client never signs out, so nobody needs to hear it
            Arc::new(AuthChannel::new().open()),
            ExecutionContext::ServerRender,
        );
        (client, store)
    }

    /// Store for an interactive context on `device`.
    pub fn device_store(&self, device: &str) -> Arc<dyn SessionStore> {
        match &self.redis {
            Some(conn) => Arc::new(RedisSessionStore::new(
                conn.clone(),
                format!("{}:{}", self.key_prefix, device),
            )),
            None => Arc::new(MemorySessionStore::new()),
        }
    }

    /// The `auth` channel shared by the contexts of `device`.
    pub fn auth_channel(&self, device: &str) -> AuthChannel {
        self.auth_channels
            .entry(device.to_string())
            .or_default()
            .value()
            .clone()
    }

    /// Opens an interactive context on `device` that follows sign-outs made
    /// by the device's other contexts.
    pub fn open_interactive(
        &self,
        device: &str,
        store: Arc<dyn SessionStore>,
        navigator: Arc<dyn Navigator>,
    ) -> AuthClient {
        let handle = self.auth_channel(device).open();
        let subscription = handle.subscribe();
        let api = Arc::new(ApiClient::new(
            self.client_config.clone(),
            self.transport.clone(),
            store,
            Arc::new(handle),
            ExecutionContext::interactive(navigator),
        ));

        let listener = SignOutListener::new(subscription, api.clone(), self.cancel.child_token());
        let handle = tokio::spawn(listener.run());
        if let Ok(mut lock) = self.listener_handles.lock() {
            lock.push(handle);
        }

        AuthClient::new(api, self.authenticated_home.clone())
    }

    pub fn guard_home(&self) -> String {
        self.authenticated_home.clone()
    }

    pub fn guard_landing(&self) -> String {
        self.client_config.unauthenticated_destination.clone()
    }

    /// A fresh device id for `device_store`.
    pub fn new_device_id() -> String {
        nanoid!(10)
    }

    pub async fn shutdown(&self) {
        info!("server shutting down...");

        self.cancel.cancel();

        let handles = match self.listener_handles.lock() {
            Ok(mut lock) => std::mem::take(&mut *lock),
            Err(_) => Vec::new(),
        };
        for handle in handles {
            let r = handle.await;
            debug!("listener handle dropped: {:?}", r);
        }
    }
}
