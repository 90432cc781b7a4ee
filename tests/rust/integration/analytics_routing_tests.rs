//! End-to-end tests for the analytics master redirection protocol.

#[cfg(test)]
mod analytics_routing_tests {
    use std::time::Duration;

    use serde_json::json;

    use cassgraph::config::GraphClientConfig;
    use cassgraph::graph::statement::SimpleGraphStatement;
    use cassgraph::session::GraphError;

    use crate::common::{fixture, fixture_with_config, graph_row, StubRuntime};

    fn analytics_statement() -> SimpleGraphStatement {
        let mut statement = SimpleGraphStatement::new("g.V().count()");
        statement.options.set_source_analytics();
        statement
    }

    #[tokio::test]
    async fn test_discovered_master_is_targeted_first() {
        // Discovery succeeds: the master's address is stripped of its port
        // and moved to the front of the plan; the child order is preserved
        // for the remainder, without duplicating the master.
        let fx = fixture(
            StubRuntime::new()
                .with_master_location("10.0.0.5:9042")
                .with_graph_rows(vec![graph_row(json!(6))]),
        );

        let rs = fx
            .session
            .execute_graph_statement(&analytics_statement(), None)
            .await
            .unwrap();
        assert_eq!(rs.first().and_then(|r| r.as_i64()), Some(6));

        assert_eq!(fx.runtime.discovery_call_count(), 1);
        assert_eq!(
            fx.runtime.sent_plans(),
            vec![vec![
                "10.0.0.5".to_string(),
                "10.0.0.1".to_string(),
                "10.0.0.2".to_string(),
                "10.0.0.3".to_string(),
            ]]
        );
    }

    #[tokio::test]
    async fn test_discovery_failure_falls_back_to_default_routing() {
        // Discovery errors are absorbed: the request is sent with the child
        // policy's unmodified order and no error reaches the caller.
        let fx = fixture(
            StubRuntime::new()
                .with_discovery_error("spark master unavailable")
                .with_graph_rows(vec![graph_row(json!(6))]),
        );

        let rs = fx
            .session
            .execute_graph_statement(&analytics_statement(), None)
            .await
            .unwrap();
        assert_eq!(rs.first().and_then(|r| r.as_i64()), Some(6));

        assert_eq!(
            fx.runtime.sent_plans(),
            vec![vec![
                "10.0.0.1".to_string(),
                "10.0.0.2".to_string(),
                "10.0.0.5".to_string(),
                "10.0.0.3".to_string(),
            ]]
        );
    }

    #[tokio::test]
    async fn test_unknown_master_address_is_no_preference() {
        // The master resolves to an address outside the topology: targeting
        // silently degrades to the child plan.
        let fx = fixture(StubRuntime::new().with_master_location("192.168.1.99:9042"));

        fx.session
            .execute_graph_statement(&analytics_statement(), None)
            .await
            .unwrap();

        assert_eq!(
            fx.runtime.sent_plans(),
            vec![vec![
                "10.0.0.1".to_string(),
                "10.0.0.2".to_string(),
                "10.0.0.5".to_string(),
                "10.0.0.3".to_string(),
            ]]
        );
    }

    #[tokio::test]
    async fn test_portless_master_location_is_used_verbatim() {
        let fx = fixture(StubRuntime::new().with_master_location("10.0.0.5"));

        fx.session
            .execute_graph_statement(&analytics_statement(), None)
            .await
            .unwrap();

        let plans = fx.runtime.sent_plans();
        assert_eq!(plans[0][0], "10.0.0.5");
    }

    #[tokio::test(start_paused = true)]
    async fn test_discovery_round_trip_consumes_the_primary_budget() {
        // The primary's timer starts before discovery, so a discovery that
        // outlives the deadline costs the caller its whole budget: the
        // request fails with a timeout, not a discovery error.
        let config = GraphClientConfig {
            graph_timeout_ms: 50,
            ..Default::default()
        };
        let fx = fixture_with_config(
            StubRuntime::new()
                .with_master_location("10.0.0.5:9042")
                .with_discovery_delay(Duration::from_millis(200)),
            config,
        );

        let outcome = fx
            .session
            .execute_graph_statement(&analytics_statement(), None)
            .await;
        assert!(matches!(outcome, Err(GraphError::Timeout(_))));
        assert_eq!(fx.runtime.discovery_call_count(), 1);

        // The fallback dispatch and the timeout expire together; whether or
        // not the fallback won that race, the plan was never rewritten with
        // a master that failed to resolve in time.
        tokio::time::sleep(Duration::from_millis(500)).await;
        for plan in fx.runtime.sent_plans() {
            assert_eq!(plan, ["10.0.0.1", "10.0.0.2", "10.0.0.5", "10.0.0.3"]);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_primary_timeout_makes_late_completion_a_noop() {
        // Discovery resolves in time, but the send outlives the deadline:
        // the caller times out independently and the late outcome is
        // dropped without erroring.
        let config = GraphClientConfig {
            graph_timeout_ms: 50,
            ..Default::default()
        };
        let fx = fixture_with_config(
            StubRuntime::new()
                .with_master_location("10.0.0.5:9042")
                .with_discovery_delay(Duration::from_millis(10))
                .with_send_delay(Duration::from_millis(100)),
            config,
        );

        let outcome = fx
            .session
            .execute_graph_statement(&analytics_statement(), None)
            .await;
        assert!(matches!(outcome, Err(GraphError::Timeout(_))));

        // The send was dispatched with the retargeted plan before the
        // deadline hit; its completion after the fact goes nowhere.
        tokio::time::sleep(Duration::from_millis(500)).await;
        let plans = fx.runtime.sent_plans();
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0][0], "10.0.0.5");
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_discovery_within_budget_still_redirects() {
        let config = GraphClientConfig {
            graph_timeout_ms: 500,
            ..Default::default()
        };
        let fx = fixture_with_config(
            StubRuntime::new()
                .with_master_location("10.0.0.5:9042")
                .with_discovery_delay(Duration::from_millis(100)),
            config,
        );

        fx.session
            .execute_graph_statement(&analytics_statement(), None)
            .await
            .unwrap();

        let plans = fx.runtime.sent_plans();
        assert_eq!(plans[0][0], "10.0.0.5");
    }

    #[tokio::test]
    async fn test_non_analytics_requests_skip_discovery() {
        let fx = fixture(StubRuntime::new());

        fx.session.execute_graph("g.V()").await.unwrap();

        assert_eq!(fx.runtime.discovery_call_count(), 0);
        assert_eq!(fx.runtime.sent_plans().len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_analytics_requests_discover_independently() {
        let fx = fixture(StubRuntime::new().with_master_location("10.0.0.5:9042"));

        let first = analytics_statement();
        let second = analytics_statement();
        let (a, b) = tokio::join!(
            fx.session.execute_graph_statement(&first, None),
            fx.session.execute_graph_statement(&second, None),
        );
        a.unwrap();
        b.unwrap();

        // One discovery round trip per primary request, no coalescing.
        assert_eq!(fx.runtime.discovery_call_count(), 2);
        assert_eq!(fx.runtime.sent_plans().len(), 2);
    }
}
