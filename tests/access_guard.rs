mod common;

use common::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tollgate::application_impl::*;
use tollgate::application_port::*;
use tollgate::domain_model::*;
use tollgate::domain_port::*;
use tollgate::infra::*;

fn guard() -> AccessGuard {
    AccessGuard::new(Arc::new(JwtClaimDecoder::new()), GuardDestinations::default())
}

fn signed_in(api: &FakeAuthApi, email: &str) -> MemorySessionStore {
    MemorySessionStore::with_tokens(api.issue(email).unwrap())
}

fn metrics() -> GuardOptions {
    GuardOptions::new()
        .permissions(["metrics.list"])
        .roles(["administrator"])
}

#[tokio::test]
async fn allows_a_user_holding_every_requirement() {
    let api = FakeAuthApi::with_demo_accounts();
    let store = signed_in(&api, ADMIN);

    let decision = guard()
        .run(&store, Some(&metrics()), || async {
            Ok::<_, anyhow::Error>("metrics")
        })
        .await;

    assert!(matches!(decision, GuardDecision::Allow("metrics")));
}

#[tokio::test]
async fn no_session_redirects_to_landing_without_rendering() {
    let store = MemorySessionStore::new();
    let rendered = &AtomicBool::new(false);

    let decision = guard()
        .run(&store, None, || async move {
            rendered.store(true, Ordering::SeqCst);
            Ok::<_, anyhow::Error>(())
        })
        .await;

    assert_eq!(decision.redirect(), Some(&Redirect::temporary("/")));
    assert!(!rendered.load(Ordering::SeqCst));
}

#[tokio::test]
async fn missing_permission_redirects_home() {
    let api = FakeAuthApi::with_demo_accounts();
    let store = signed_in(&api, EDITOR);
    let rendered = &AtomicBool::new(false);

    let decision = guard()
        .run(&store, Some(&metrics()), || async move {
            rendered.store(true, Ordering::SeqCst);
            Ok::<_, anyhow::Error>(())
        })
        .await;

    assert_eq!(decision.redirect(), Some(&Redirect::temporary("/dashboard")));
    assert!(!rendered.load(Ordering::SeqCst));
    // the session itself is fine and stays
    assert!(store.snapshot().await.is_some());
}

#[tokio::test]
async fn administrator_role_covers_other_roles_but_not_permissions() {
    let api = FakeAuthApi::with_demo_accounts();
    api.add_account("root@example.com", "123456", &[], &["administrator"]);
    let store = signed_in(&api, "root@example.com");

    let by_role = guard()
        .run(&store, Some(&GuardOptions::new().roles(["editor"])), || async {
            Ok::<_, anyhow::Error>(())
        })
        .await;
    assert!(by_role.is_allow());

    let by_permission = guard()
        .run(&store, Some(&metrics()), || async {
            Ok::<_, anyhow::Error>(())
        })
        .await;
    assert_eq!(
        by_permission.redirect(),
        Some(&Redirect::temporary("/dashboard"))
    );
}

#[tokio::test]
async fn empty_options_only_require_a_session() {
    let store = MemorySessionStore::with_tokens(TokenPair::new("opaque", "r"));

    let decision = guard()
        .run(&store, Some(&GuardOptions::new()), || async {
            Ok::<_, anyhow::Error>(7)
        })
        .await;

    assert!(matches!(decision, GuardDecision::Allow(7)));
}

#[tokio::test]
async fn undecodable_token_ends_the_session() {
    let store = MemorySessionStore::with_tokens(TokenPair::new("opaque", "r"));

    let decision = guard()
        .run(&store, Some(&metrics()), || async {
            Ok::<_, anyhow::Error>(())
        })
        .await;

    assert_eq!(decision.redirect(), Some(&Redirect::temporary("/")));
    assert_eq!(store.snapshot().await, None);
}

#[tokio::test]
async fn invalid_token_from_the_view_clears_and_redirects() {
    let api = FakeAuthApi::with_demo_accounts();
    let store = signed_in(&api, ADMIN);

    let decision = guard()
        .run(&store, None, || async {
            Err::<(), _>(anyhow::Error::new(ApiError::AuthTokenInvalid))
        })
        .await;

    assert_eq!(decision.redirect(), Some(&Redirect::temporary("/")));
    assert_eq!(store.snapshot().await, None);
}

#[tokio::test]
async fn other_view_errors_are_rethrown() {
    let api = FakeAuthApi::with_demo_accounts();
    let store = signed_in(&api, ADMIN);

    let decision = guard()
        .run(&store, None, || async {
            Err::<(), _>(anyhow::anyhow!("database unavailable"))
        })
        .await;

    match decision {
        GuardDecision::Rethrow(e) => assert_eq!(e.to_string(), "database unavailable"),
        other => panic!("unexpected decision: {other:?}"),
    }
    assert!(store.snapshot().await.is_some());
}

fn render_client(api: Arc<FakeAuthApi>, store: Arc<CookieSessionStore>) -> ApiClient {
    ApiClient::new(
        ApiClientConfig::default(),
        api,
        store,
        Arc::new(AuthChannel::new().open()),
        ExecutionContext::ServerRender,
    )
}

fn cookie_header(tokens: &TokenPair) -> String {
    format!(
        "{}={}; {}={}",
        ACCESS_TOKEN_KEY,
        tokens.access_token.as_str(),
        REFRESH_TOKEN_KEY,
        tokens.refresh_token.as_str()
    )
}

#[tokio::test]
async fn rendering_with_an_expired_token_refreshes_into_the_response_cookies() {
    let api = Arc::new(FakeAuthApi::with_demo_accounts());
    let tokens = api.issue(ADMIN).unwrap();
    api.expire_access_tokens();
    let store = Arc::new(CookieSessionStore::from_header(Some(&cookie_header(
        &tokens,
    ))));
    let client = &render_client(api.clone(), store.clone());

    let decision = guard()
        .run(store.as_ref(), Some(&metrics()), || async move {
            let user: User = client.get_json("/me").await?;
            Ok::<_, anyhow::Error>(user.email)
        })
        .await;

    assert!(matches!(decision, GuardDecision::Allow(ref email) if email == ADMIN));
    assert_eq!(api.refresh_calls(), 1);
    let cookies = store.take_set_cookies();
    assert_eq!(cookies.len(), 2);
    assert!(cookies[0].starts_with("session.token="));
    assert!(!cookies[0].contains(tokens.access_token.as_str()));
    assert!(cookies[1].starts_with("session.refreshToken="));
}

#[tokio::test]
async fn rendering_with_a_dead_session_clears_the_cookies() {
    let api = Arc::new(FakeAuthApi::with_demo_accounts());
    let tokens = api.issue(ADMIN).unwrap();
    api.expire_access_tokens();
    api.set_fail_refresh(true);
    let store = Arc::new(CookieSessionStore::from_header(Some(&cookie_header(
        &tokens,
    ))));
    let client = &render_client(api.clone(), store.clone());

    let decision = guard()
        .run(store.as_ref(), None, || async move {
            client.get("/me").await?;
            Ok::<_, anyhow::Error>(())
        })
        .await;

    assert_eq!(decision.redirect(), Some(&Redirect::temporary("/")));
    let cookies = store.take_set_cookies();
    assert_eq!(cookies.len(), 2);
    assert!(cookies.iter().all(|c| c.contains("Max-Age=0")));
}
