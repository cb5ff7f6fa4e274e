use httpmock::prelude::*;
use tokio_util::sync::CancellationToken;
use user_dispatcher::{
    ApiClient, Config, Dispatcher, Environment, ProcessingTally, RetryPolicy, RetryingSender,
};

fn upstream_users() -> serde_json::Value {
    serde_json::json!([
        {
            "id": 1, "name": "Leanne Graham", "username": "Bret",
            "email": "Sincere@april.biz",
            "address": {"street": "Kulas Light", "suite": "Apt. 556", "city": "Gwenborough",
                        "zipcode": "92998-3874", "geo": {"lat": "-37.3159", "lng": "81.1496"}},
            "phone": "1-770-736-8031", "website": "hildegard.org",
            "company": {"name": "Romaguera-Crona", "catchPhrase": "neural-net", "bs": "e-markets"}
        },
        {
            "id": 2, "name": "Ervin Howell", "username": "Antonette",
            "email": "Shanna@melissa.tv",
            "address": {"street": "Victor Plains", "suite": "Suite 879", "city": "Wisokyburgh",
                        "zipcode": "90566-7771", "geo": {"lat": "-43.9509", "lng": "-34.4618"}},
            "phone": "010-692-6593", "website": "anastasia.net",
            "company": {"name": "Deckow-Crist", "catchPhrase": "contingency", "bs": "supply-chains"}
        },
        {
            "id": 3, "name": "Clementine Bauch", "username": "Samantha",
            "email": "Nathan@yesenia.net",
            "address": {"street": "Douglas Extension", "suite": "Suite 847", "city": "McKenziehaven",
                        "zipcode": "59590-4157", "geo": {"lat": "-68.6102", "lng": "-47.0653"}},
            "phone": "1-463-123-4447", "website": "ramiro.info",
            "company": {"name": "Romaguera-Jacobson", "catchPhrase": "aggregate", "bs": "e-services"}
        },
        {
            "id": 4, "name": "Patricia Lebsack", "username": "Karianne",
            "email": "Julianne.OConner@kory.org",
            "address": {"street": "Hoeger Mall", "suite": "Apt. 692", "city": "South Elvis",
                        "zipcode": "53919-4257", "geo": {"lat": "29.4572", "lng": "-164.2990"}},
            "phone": "493-170-9623", "website": "kale.biz",
            "company": {"name": "Robel-Corkery", "catchPhrase": "intranet", "bs": "e-enable"}
        },
        {
            "id": 5, "name": "Chelsey Dietrich", "username": "Kamren",
            "email": "Lucio_Hettinger@annie.biz",
            "address": {"street": "Skiles Walks", "suite": "Suite 351", "city": "Roscoeview",
                        "zipcode": "33263", "geo": {"lat": "-31.8129", "lng": "62.5342"}},
            "phone": "(254)954-1289", "website": "demarco.info",
            "company": {"name": "Keebler LLC", "catchPhrase": "throughput", "bs": "initiatives"}
        }
    ])
}

fn test_config(server: &MockServer, max_retries: u32) -> Config {
    Config {
        env: Environment::Dev,
        fetch_url: server.url("/users"),
        send_url: server.url("/sink"),
        max_retries,
        retry_delay_ms: 1,
        timeout_secs: 5,
    }
}

fn dispatcher_for(config: &Config) -> Dispatcher<ApiClient, ApiClient> {
    let client = ApiClient::new(config).unwrap();
    let sender = RetryingSender::new(
        client.clone(),
        RetryPolicy {
            max_attempts: config.max_retries,
            base_delay: config.retry_base_delay(),
        },
    );
    Dispatcher::new(client, sender)
}

#[tokio::test]
async fn end_to_end_pass_forwards_only_biz_users() {
    let server = MockServer::start();

    let fetch_mock = server.mock(|when, then| {
        when.method(GET).path("/users");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(upstream_users());
    });

    let send_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/sink")
            .header("Content-Type", "application/json");
        then.status(201);
    });

    let config = test_config(&server, 3);
    let dispatcher = dispatcher_for(&config);

    let tally = dispatcher
        .process_all(&CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(tally, ProcessingTally { matched: 2, skipped: 3 });
    fetch_mock.assert();
    send_mock.assert_hits(2);
}

#[tokio::test]
async fn downstream_body_is_the_minimal_projection() {
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(GET).path("/users");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(serde_json::json!([upstream_users()[0]]));
    });

    // Matches only the exact two-field projection of the first user.
    let send_mock = server.mock(|when, then| {
        when.method(POST).path("/sink").json_body(serde_json::json!({
            "name": "Leanne Graham",
            "email": "Sincere@april.biz"
        }));
        then.status(200);
    });

    let config = test_config(&server, 3);
    let dispatcher = dispatcher_for(&config);

    let tally = dispatcher
        .process_all(&CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(tally.matched, 1);
    send_mock.assert();
}

#[tokio::test]
async fn downstream_failures_exhaust_retries_but_pass_succeeds() {
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(GET).path("/users");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(upstream_users());
    });

    let send_mock = server.mock(|when, then| {
        when.method(POST).path("/sink");
        then.status(500);
    });

    let config = test_config(&server, 3);
    let dispatcher = dispatcher_for(&config);

    let tally = dispatcher
        .process_all(&CancellationToken::new())
        .await
        .unwrap();

    // Both matched users abandoned after 3 attempts each; pass still clean.
    assert_eq!(tally, ProcessingTally { matched: 2, skipped: 3 });
    send_mock.assert_hits(6);
}

#[tokio::test]
async fn fetch_failure_is_fatal_and_nothing_is_sent() {
    let server = MockServer::start();

    let fetch_mock = server.mock(|when, then| {
        when.method(GET).path("/users");
        then.status(500);
    });

    let send_mock = server.mock(|when, then| {
        when.method(POST).path("/sink");
        then.status(200);
    });

    let config = test_config(&server, 3);
    let dispatcher = dispatcher_for(&config);

    let result = dispatcher.process_all(&CancellationToken::new()).await;

    assert!(result.is_err());
    fetch_mock.assert();
    send_mock.assert_hits(0);
}

#[tokio::test]
async fn malformed_fetch_payload_is_fatal() {
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(GET).path("/users");
        then.status(200)
            .header("Content-Type", "application/json")
            .body("{\"not\": \"an array\"}");
    });

    let config = test_config(&server, 3);
    let dispatcher = dispatcher_for(&config);

    let result = dispatcher.process_all(&CancellationToken::new()).await;

    assert!(matches!(
        result,
        Err(user_dispatcher::DispatchError::Decode(_))
    ));
}
