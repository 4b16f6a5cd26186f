use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::{Method, StatusCode};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use zon_api::endpoints::orders::ListOrders;
use zon_api::{Client, RateLimitPolicy, ResponseVerdict, ZonApiError};

fn quick_policy(max_retries: u32) -> RateLimitPolicy {
    // Tiny delays so the retry loop runs in milliseconds; the backoff cap
    // applies before the exponential formula can reach whole seconds.
    RateLimitPolicy {
        min_delay: Duration::ZERO,
        max_delay: Duration::from_millis(50),
        max_retries,
    }
}

fn flaky_responder(failures: usize, fail_status: u16) -> impl wiremock::Respond + 'static {
    let seen = AtomicUsize::new(0);
    move |_req: &wiremock::Request| -> ResponseTemplate {
        if seen.fetch_add(1, Ordering::SeqCst) < failures {
            ResponseTemplate::new(fail_status)
        } else {
            ResponseTemplate::new(200).set_body_string("success")
        }
    }
}

#[tokio::test]
async fn recovers_after_one_503() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(flaky_responder(1, 503))
        .expect(2)
        .mount(&server)
        .await;

    let client = Client::new(RateLimitPolicy {
        min_delay: Duration::ZERO,
        max_delay: Duration::from_secs(60),
        max_retries: 3,
    })
    .unwrap();

    let response = client
        .execute(client.request(Method::GET, server.uri()))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text(), "success");
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn recovers_after_repeated_429s() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(flaky_responder(2, 429))
        .expect(3)
        .mount(&server)
        .await;

    let client = Client::new(quick_policy(3)).unwrap();
    let response = client
        .execute(client.request(Method::GET, server.uri()))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn exhausted_retries_return_the_final_429() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429))
        .expect(4)
        .mount(&server)
        .await;

    let client = Client::new(quick_policy(3)).unwrap();
    let response = client
        .execute(client.request(Method::GET, server.uri()))
        .await
        .expect("throttled response is not an error");

    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.is_throttled());
    // max_retries = 3 means exactly 4 attempts.
    assert_eq!(server.received_requests().await.unwrap().len(), 4);
}

#[tokio::test]
async fn zero_retries_means_a_single_attempt() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let client = Client::new(quick_policy(0)).unwrap();
    let response = client
        .execute(client.request(Method::GET, server.uri()))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn other_statuses_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let client = Client::new(quick_policy(3)).unwrap();
    let response = client
        .execute(client.request(Method::GET, server.uri()))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn captcha_page_becomes_a_typed_error_despite_200() {
    let server = MockServer::start().await;
    let body = "<html>Sorry, we just need to make sure you're not a robot</html>";
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/html"))
        .mount(&server)
        .await;

    let client = Client::new(quick_policy(0)).unwrap();
    let result = client
        .execute(client.request(Method::GET, server.uri()))
        .await;

    match result {
        Err(ZonApiError::Blocked { verdict, diagnostic }) => {
            assert_eq!(verdict, ResponseVerdict::CaptchaChallenge);
            assert_eq!(diagnostic.status, StatusCode::OK);
            assert!(diagnostic.snippet.contains("not a robot"));
        }
        other => panic!("expected Blocked, got {other:?}"),
    }
}

#[tokio::test]
async fn login_wall_is_detected() {
    let server = MockServer::start().await;
    let body = r#"<form name="ap_signin">Authentication required</form>"#;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/html"))
        .mount(&server)
        .await;

    let client = Client::new(quick_policy(0)).unwrap();
    let err = client
        .execute(client.request(Method::GET, server.uri()))
        .await
        .unwrap_err();

    assert_eq!(err.verdict(), Some(ResponseVerdict::LoginWall));
}

#[tokio::test]
async fn network_failures_are_not_retried() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener); // free the port so connections are refused

    let client = Client::new(quick_policy(3)).unwrap();
    let result = client
        .execute(client.request(Method::GET, format!("http://{addr}")))
        .await;

    assert!(matches!(result, Err(ZonApiError::Network(_))));
}

#[tokio::test]
async fn identity_header_changes_between_attempts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(flaky_responder(1, 429))
        .mount(&server)
        .await;

    let client = Client::new(quick_policy(1)).unwrap();
    client
        .execute(client.request(Method::GET, server.uri()))
        .await
        .expect("response");

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    let ua: Vec<_> = requests
        .iter()
        .map(|r| r.headers.get("user-agent").unwrap().to_str().unwrap())
        .collect();
    assert_ne!(ua[0], ua[1]);
}

#[tokio::test]
async fn concurrent_callers_share_the_spacing_gate() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = Arc::new(
        Client::new(RateLimitPolicy {
            min_delay: Duration::from_millis(300),
            max_delay: Duration::from_secs(1),
            max_retries: 0,
        })
        .unwrap(),
    );

    let start = Instant::now();
    let a = {
        let client = Arc::clone(&client);
        let url = server.uri();
        tokio::spawn(async move { client.execute(client.request(Method::GET, url)).await })
    };
    let b = {
        let client = Arc::clone(&client);
        let url = server.uri();
        tokio::spawn(async move { client.execute(client.request(Method::GET, url)).await })
    };

    a.await.unwrap().unwrap();
    b.await.unwrap().unwrap();

    // Both callers wait their own spacing and the second queues behind the
    // first, so two requests need at least two spacing intervals.
    assert!(start.elapsed() >= Duration::from_millis(600));
}

#[tokio::test]
async fn typed_send_parses_clean_json() {
    let server = MockServer::start().await;
    let body = serde_json::json!({
        "orders": [{
            "order_id": "112-0000001",
            "placed_on": "2025-06-01",
            "status": "delivered",
            "total": 2499,
            "items": [{
                "product_id": "B0EXAMPLE1",
                "title": "USB-C cable",
                "quantity": 1,
                "price": 2499
            }]
        }],
        "next_page": null
    });
    Mock::given(method("GET"))
        .and(path("/orders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let client = Client::with_base_url(quick_policy(0), server.uri()).unwrap();
    let response = client
        .send(ListOrders::new(), Some("token-123"))
        .await
        .expect("orders");

    assert_eq!(response.orders.len(), 1);
    assert_eq!(response.orders[0].order_id, "112-0000001");
    assert_eq!(response.orders[0].total.inner(), 2499);

    let requests = server.received_requests().await.unwrap();
    let auth = requests[0].headers.get("authorization").unwrap();
    assert_eq!(auth, "Bearer token-123");
}

#[tokio::test]
async fn typed_send_maps_exhausted_throttling() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = Client::with_base_url(quick_policy(1), server.uri()).unwrap();
    let err = client.send(ListOrders::new(), None).await.unwrap_err();

    assert!(matches!(
        err,
        ZonApiError::RateLimited(StatusCode::SERVICE_UNAVAILABLE)
    ));
}
