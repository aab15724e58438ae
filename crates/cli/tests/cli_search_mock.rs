use assert_cmd::prelude::*;
use mockito::{Matcher, Mock, Server, ServerGuard};
use predicates::prelude::*;
use std::process::Command;

const CELESTE: &str = r#"{"count":1,"pageCurrent":1,"pageTotal":1,"data":[{"game_id":42818,"game_name":"Celeste","game_alias":"","comp_main":28800,"comp_plus":47520,"comp_100":null,"profile_platform":"PC, Nintendo Switch"}]}"#;

async fn mock_site(server: &mut ServerGuard, search_body: &str) -> Vec<Mock> {
    let root = server
        .mock("GET", "/")
        .with_status(200)
        .with_body(r#"<html><script src="/_next/static/chunks/pages/_app-77aa.js"></script></html>"#)
        .create_async()
        .await;
    let script = server
        .mock("GET", "/_next/static/chunks/pages/_app-77aa.js")
        .with_status(200)
        .with_body(r#"const s={users:{id:"c11token"}};"#)
        .create_async()
        .await;
    let search = server
        .mock("POST", "/api/s/c11token")
        .match_body(Matcher::PartialJson(serde_json::json!({ "searchType": "games" })))
        .with_status(200)
        .with_body(search_body)
        .create_async()
        .await;
    vec![root, script, search]
}

fn hltb(server: &ServerGuard) -> Command {
    let mut cmd = Command::cargo_bin("hltb").expect("binary built");
    cmd.args(["--base-url", &server.url()]);
    cmd.env("HLTB_CONFIG_DIR", "/nonexistent/hltb-test-config");
    cmd.env_remove("HLTB_METRICS_PORT");
    cmd.env("NO_COLOR", "1");
    cmd
}

#[tokio::test]
async fn search_json_reports_hours() {
    let mut server = Server::new_async().await;
    let _mocks = mock_site(&mut server, CELESTE).await;

    let mut cmd = hltb(&server);
    cmd.args(["--format", "json", "search", "Celeste"]);
    let assert = cmd.assert().success();
    let out = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8");
    assert!(out.contains("\"name\": \"Celeste\""));
    assert!(out.contains("\"main_story_hours\": 8.0"));
    assert!(out.contains("\"completionist_hours\": null"));
}

#[tokio::test]
async fn search_table_plain_lines() {
    let mut server = Server::new_async().await;
    let _mocks = mock_site(&mut server, CELESTE).await;

    let mut cmd = hltb(&server);
    cmd.env("NO_TABLE", "1");
    cmd.args(["search", "Celeste"]);
    cmd.assert().success().stdout(predicate::str::contains(
        "- Celeste [42818] main 8.0h | extras 13.2h | completionist N/A | PC, Nintendo Switch",
    ));
}

#[tokio::test]
async fn search_without_results_prints_message() {
    let mut server = Server::new_async().await;
    let _mocks = mock_site(&mut server, r#"{"count":0,"pageCurrent":1,"pageTotal":0,"data":[]}"#).await;

    let mut cmd = hltb(&server);
    cmd.args(["search", "zzzz", "unknown"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("No results."));
}

#[tokio::test]
async fn empty_term_fails_without_network() {
    let mut server = Server::new_async().await;
    let any = server
        .mock("GET", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let mut cmd = hltb(&server);
    cmd.args(["search", "   "]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("search term is empty"));
    any.assert_async().await;
}

#[tokio::test]
async fn title_prints_resolved_name() {
    let mut server = Server::new_async().await;
    let _m = server
        .mock("GET", "/game")
        .match_query(Matcher::UrlEncoded("id".into(), "12345".into()))
        .with_status(200)
        .with_body("<html><head><title>How long is Celeste | HowLongToBeat</title></head></html>")
        .create_async()
        .await;

    let mut cmd = hltb(&server);
    cmd.args(["title", "12345"]);
    cmd.assert().success().stdout("Celeste\n");
}

#[tokio::test]
async fn unreachable_site_fails() {
    let mut cmd = Command::cargo_bin("hltb").expect("binary built");
    cmd.args(["--base-url", "http://127.0.0.1:1", "--timeout", "2", "search", "celeste"]);
    cmd.env("HLTB_CONFIG_DIR", "/nonexistent/hltb-test-config");
    cmd.assert().failure();
}
