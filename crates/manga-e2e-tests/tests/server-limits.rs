use manga_e2e_tests::{spawn_server, test_config};
use serde_json::Value;
use tracing_test::traced_test;

#[tokio::test]
#[traced_test]
async fn test_rate_limit() {
    let (env, mut config_guard) = test_config(
        "test_rate_limit",
        &["--limiter-rps", "0.01", "--limiter-burst", "3"],
    )
    .unwrap();
    spawn_server(&env, &mut config_guard).await.unwrap();

    let client = reqwest::Client::new();
    let url = env.url("v1/manga");

    // the startup probe may already have used some of the burst
    let mut statuses = Vec::new();
    for _ in 0..5 {
        let response = client.get(url.clone()).send().await.unwrap();
        statuses.push(response.status().as_u16());
        if response.status().as_u16() == 429 {
            let body: Value = response.json().await.unwrap();
            assert_eq!("rate limit exceeded", body["error"]);
        }
    }
    assert_eq!(Some(&429), statuses.last());
    assert!(statuses.iter().take_while(|&&s| s == 200).count() <= 3);
}
