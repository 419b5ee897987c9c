use anyhow::{Result, anyhow};
use reqwest::StatusCode;
use serde_json::{Value, json};
use tracing::info;

use crate::TestEnv;

pub fn manga_payload(title: &str, year: i32, runtime: i32, genres: &[&str]) -> Value {
    json!({
        "title": title,
        "year": year,
        "runtime": format!("{runtime} mins"),
        "genres": genres,
    })
}

/// Creates a manga and returns the record from the response envelope.
pub async fn create_manga(client: &reqwest::Client, env: &TestEnv, payload: &Value) -> Result<Value> {
    let response = client.post(env.url("v1/manga")).json(payload).send().await?;
    if response.status() != StatusCode::CREATED {
        let status = response.status();
        let body = response.text().await?;
        return Err(anyhow!("Create failed with {status}: {body}"));
    }
    let body: Value = response.json().await?;
    info!("Created manga: {body}");
    Ok(body["manga"].clone())
}

pub async fn seed_catalog(client: &reqwest::Client, env: &TestEnv) -> Result<()> {
    for payload in [
        manga_payload("Akira", 1982, 124, &["action", "sci-fi"]),
        manga_payload("Monster", 1994, 90, &["thriller", "mystery"]),
        manga_payload("Berserk", 1989, 200, &["action", "fantasy", "horror"]),
        manga_payload("Ghost in the Shell", 1989, 83, &["sci-fi", "action"]),
        manga_payload("Uzumaki", 1998, 70, &["horror"]),
    ] {
        create_manga(client, env, &payload).await?;
    }
    Ok(())
}
