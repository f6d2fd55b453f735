// src/absence_client_tests.rs

#[cfg(test)]
mod tests {
    use crate::absence_client::*;
    use crate::config::{TimespanType, WorkEntryTemplate};
    use crate::hawk::HawkCredentials;
    use chrono::NaiveDate;
    use reqwest::StatusCode;
    use serde_json::json;
    use url::Url;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const USER_ID: &str = "5f1ab2c3d4e5f6a7b8c9d0e1";

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 6).unwrap()
    }

    fn entry() -> WorkEntryTemplate {
        WorkEntryTemplate {
            start_hour: "08:00".to_string(),
            end_hour: "16:00".to_string(),
            timespan_type: TimespanType::Work,
            timezone_name: "CET".to_string(),
            timezone: "+0000".to_string(),
        }
    }

    fn create_test_client(server: &MockServer) -> AbsenceClient {
        AbsenceClient::new(
            HawkCredentials {
                id: USER_ID.to_string(),
                key: "test-key".to_string(),
            },
            Url::parse(&server.uri()).unwrap(),
        )
        .expect("Failed to create test client")
    }

    #[test]
    fn test_absence_query_body() {
        let query = AbsenceQuery::covering(USER_ID, day());
        assert_eq!(
            serde_json::to_value(&query).unwrap(),
            json!({
                "skip": 0,
                "limit": 50,
                "filter": {
                    "assignedToId": USER_ID,
                    "start": {"$lte": "2024-05-06T00:00:00.000Z"},
                    "end": {"$gte": "2024-05-06T00:00:00.000Z"}
                }
            })
        );
    }

    #[test]
    fn test_new_timespan_body() {
        let timespan = NewTimespan::for_day(USER_ID, day(), &entry());
        assert_eq!(
            serde_json::to_value(&timespan).unwrap(),
            json!({
                "userId": USER_ID,
                "start": "2024-05-06T08:00:00.000Z",
                "end": "2024-05-06T16:00:00.000Z",
                "timezoneName": "CET",
                "timezone": "+0000",
                "type": "work"
            })
        );
    }

    #[tokio::test]
    async fn test_verify_user_sends_hawk_header() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("/api/v2/users/{}", USER_ID)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "_id": USER_ID,
                "firstName": "Ada",
                "lastName": "Lovelace",
                "email": "ada@example.com"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = create_test_client(&server);
        let user = client.verify_user().await.expect("verify should succeed");
        assert_eq!(user.id, USER_ID);
        assert_eq!(user.first_name.as_deref(), Some("Ada"));

        let requests = server.received_requests().await.unwrap();
        let auth = requests[0]
            .headers
            .get("authorization")
            .expect("authorization header")
            .to_str()
            .unwrap()
            .to_string();
        assert!(auth.starts_with(&format!("Hawk id=\"{}\", ts=\"", USER_ID)));
        assert!(auth.contains("nonce=\""));
        assert!(auth.contains("hash=\""));
        assert!(auth.contains("mac=\""));
        assert!(!auth.contains("test-key"));
    }

    #[tokio::test]
    async fn test_verify_user_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = create_test_client(&server);
        match client.verify_user().await {
            Err(AbsenceError::Unauthorized { id, status, .. }) => {
                assert_eq!(id, USER_ID);
                assert_eq!(status, StatusCode::UNAUTHORIZED);
            }
            other => panic!("expected Unauthorized, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_find_absences_posts_filter() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v2/absences"))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({
                "skip": 0,
                "limit": 50,
                "filter": {
                    "assignedToId": USER_ID,
                    "start": {"$lte": "2024-05-06T00:00:00.000Z"},
                    "end": {"$gte": "2024-05-06T00:00:00.000Z"}
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "skip": 0,
                "limit": 50,
                "count": 1,
                "data": [{
                    "_id": "abs1",
                    "start": "2024-05-06T00:00:00.000Z",
                    "end": "2024-05-08T00:00:00.000Z",
                    "reasonId": "vacation"
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = create_test_client(&server);
        let absences = client.find_absences(day()).await.unwrap();
        assert_eq!(absences.count, 1);
        assert_eq!(absences.data[0].id.as_deref(), Some("abs1"));
        assert_eq!(absences.data[0].reason_id.as_deref(), Some("vacation"));
    }

    #[tokio::test]
    async fn test_find_absences_tolerates_missing_data() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v2/absences"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"count": 0})))
            .mount(&server)
            .await;

        let client = create_test_client(&server);
        let absences = client.find_absences(day()).await.unwrap();
        assert_eq!(absences.count, 0);
        assert!(absences.data.is_empty());
    }

    #[tokio::test]
    async fn test_create_timespan() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v2/timespans/create"))
            .and(body_json(json!({
                "userId": USER_ID,
                "start": "2024-05-06T08:00:00.000Z",
                "end": "2024-05-06T16:00:00.000Z",
                "timezoneName": "CET",
                "timezone": "+0000",
                "type": "work"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "_id": "ts1",
                "start": "2024-05-06T08:00:00.000Z",
                "end": "2024-05-06T16:00:00.000Z"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = create_test_client(&server);
        let created = client.create_timespan(day(), &entry()).await.unwrap();
        assert_eq!(created.id.as_deref(), Some("ts1"));
    }

    #[tokio::test]
    async fn test_api_error_message_extracted() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v2/timespans/create"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({"message": "overlapping timespan"})),
            )
            .mount(&server)
            .await;

        let client = create_test_client(&server);
        match client.create_timespan(day(), &entry()).await {
            Err(AbsenceError::ApiError { status, message }) => {
                assert_eq!(status, StatusCode::BAD_REQUEST);
                assert_eq!(message, "overlapping timespan");
            }
            other => panic!("expected ApiError, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_rate_limit_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v2/absences"))
            .respond_with(ResponseTemplate::new(429))
            .expect(1)
            .mount(&server)
            .await;

        let client = create_test_client(&server);
        assert!(matches!(
            client.find_absences(day()).await,
            Err(AbsenceError::RateLimitExceeded)
        ));
    }
}
