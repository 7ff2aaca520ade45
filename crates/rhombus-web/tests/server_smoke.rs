//! Real listener on an ephemeral port

use rhombus_test_utils::TestApp;
use rhombus_web::server;
use tokio::sync::oneshot;

#[tokio::test]
async fn serves_health_and_shuts_down() {
    let app = TestApp::new();
    let (tx, rx) = oneshot::channel::<()>();

    let (addr, server) = server::start(app.state.clone(), async {
        let _ = rx.await;
    })
    .unwrap();
    let handle = tokio::spawn(server);

    let body = reqwest::get(format!("http://{addr}/health"))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(body, "ok");

    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/pattern"))
        .form(&[("lines", "3")])
        .header("cookie", app.login())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    tx.send(()).unwrap();
    handle.await.unwrap();
}
