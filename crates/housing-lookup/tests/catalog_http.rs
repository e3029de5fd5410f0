use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use housing_lookup::catalog::{catalog_router, CatalogKind, CatalogStore, HttpCatalogClient};
use housing_lookup::lookup::presenter::RETRY_MESSAGE;
use housing_lookup::lookup::{
    LookupController, LookupOptions, LookupStatus, ScopeFilter, SessionRules, SourceError,
    ViewState,
};
use tokio::net::TcpListener;

async fn spawn_catalog() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("listener address");
    let router = catalog_router(Arc::new(CatalogStore::builtin()));
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("catalog server");
    });
    addr
}

fn client(addr: SocketAddr) -> HttpCatalogClient {
    HttpCatalogClient::new(format!("http://{addr}/"), Duration::from_secs(5))
        .expect("client builds")
}

fn fast_options() -> LookupOptions {
    LookupOptions {
        debounce: Duration::from_millis(20),
        rules: SessionRules::default(),
    }
}

#[tokio::test]
async fn client_searches_cities_over_http() {
    let addr = spawn_catalog().await;
    let client = client(addr);
    assert_eq!(client.base_url(), format!("http://{addr}"));

    let cities = client.search_cities("bogota").await.expect("search succeeds");
    assert_eq!(cities[0].name, "Bogotá");
    assert_eq!(cities[0].id, 11001);

    let institutions = client
        .search_institutions("universidad del", "8001")
        .await
        .expect("scoped search succeeds");
    assert_eq!(institutions.len(), 1);
    assert_eq!(institutions[0].name, "Universidad del Norte");
}

#[tokio::test]
async fn blank_search_surfaces_as_status_error() {
    let addr = spawn_catalog().await;
    let err = client(addr)
        .search_cities("   ")
        .await
        .expect_err("blank search is rejected");

    match err {
        SourceError::Status { status, body } => {
            assert_eq!(status, 400);
            assert!(body.contains("blank"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn controller_over_http_reaches_populated_then_selected() {
    let addr = spawn_catalog().await;
    let client = client(addr);
    let mut city =
        LookupController::new(Arc::new(client.source(CatalogKind::City)), fast_options());

    city.on_input("cartag");
    let snapshot = city.settled().await;
    assert_eq!(snapshot.status, LookupStatus::Settled);
    assert_eq!(snapshot.results[0].name, "Cartagena de Indias");

    let picked = city
        .select(&snapshot.results[0].id)
        .expect("visible result can be selected");
    assert_eq!(city.view(), ViewState::Selected { candidate: picked });

    let mut institution = LookupController::new(
        Arc::new(client.source(CatalogKind::Institution)),
        fast_options(),
    );
    institution.set_scope(Some(ScopeFilter::from(&snapshot.results[0].id)));
    institution.on_input("cartagena");
    let snapshot = institution.settled().await;
    assert_eq!(snapshot.results.len(), 1);
    assert_eq!(snapshot.results[0].parent.as_deref(), Some("Cartagena de Indias"));
}

#[tokio::test]
async fn unreachable_catalog_renders_retry_state() {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("listener address");
    drop(listener);

    let mut city = LookupController::new(
        Arc::new(client(addr).source(CatalogKind::City)),
        fast_options(),
    );
    city.on_input("bogota");
    let snapshot = city.settled().await;

    assert_eq!(snapshot.status, LookupStatus::Errored);
    assert!(snapshot.results.is_empty());
    assert_eq!(
        city.view(),
        ViewState::Failed {
            message: RETRY_MESSAGE.to_string()
        }
    );
}
