//! Unit tests for the load-balancing policies, in particular the
//! host-targeting wrapper's plan construction.

#[cfg(test)]
mod policy_tests {
    use std::sync::{Arc, Mutex, PoisonError};

    use cassgraph::cluster::{ClusterMetadata, Node, NodeDistance};
    use cassgraph::graph::statement::{SimpleGraphStatement, Statement, TargetedStatement};
    use cassgraph::routing::{
        HostTargetingPolicy, LoadBalancingPolicy, QueryPlan, RoundRobinPolicy,
    };

    /// Deterministic base policy: always yields the populated nodes in
    /// order. Also records the keyspace it last planned with.
    #[derive(Default)]
    struct FixedOrderPolicy {
        nodes: Mutex<Vec<Arc<Node>>>,
        last_keyspace: Mutex<Option<String>>,
    }

    impl LoadBalancingPolicy for FixedOrderPolicy {
        fn distance(&self, _node: &Node) -> NodeDistance {
            NodeDistance::Local
        }

        fn populate(&self, _metadata: &Arc<ClusterMetadata>, nodes: &[Arc<Node>]) {
            *self.nodes.lock().unwrap_or_else(PoisonError::into_inner) = nodes.to_vec();
        }

        fn on_up(&self, _node: &Arc<Node>) {}
        fn on_down(&self, _node: &Arc<Node>) {}
        fn on_add(&self, _node: &Arc<Node>) {}
        fn on_remove(&self, _node: &Arc<Node>) {}

        fn make_query_plan(
            &self,
            working_keyspace: Option<&str>,
            _statement: Option<&dyn Statement>,
        ) -> QueryPlan {
            *self
                .last_keyspace
                .lock()
                .unwrap_or_else(PoisonError::into_inner) = working_keyspace.map(str::to_owned);
            let nodes = self
                .nodes
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone();
            Box::new(nodes.into_iter().filter(|n| n.is_up()))
        }
    }

    fn nodes(addresses: &[&str]) -> Vec<Arc<Node>> {
        addresses.iter().map(|a| Node::new(*a)).collect()
    }

    fn plan_addresses(policy: &dyn LoadBalancingPolicy, statement: Option<&dyn Statement>) -> Vec<String> {
        policy
            .make_query_plan(None, statement)
            .map(|n| n.address().to_string())
            .collect()
    }

    fn targeted(address: &str) -> TargetedStatement<SimpleGraphStatement> {
        TargetedStatement::attach(SimpleGraphStatement::new("g.V()"), address)
    }

    #[test]
    fn test_no_target_plan_equals_child_plan() {
        let hosts = nodes(&["10.0.0.0", "10.0.0.1", "10.0.0.2", "10.0.0.3"]);
        let policy = HostTargetingPolicy::new(Arc::new(FixedOrderPolicy::default()));
        policy.populate(&ClusterMetadata::with_nodes(hosts.clone()), &hosts);

        let statement = SimpleGraphStatement::new("g.V()");
        for _ in 0..4 {
            assert_eq!(
                plan_addresses(&policy, Some(&statement as &dyn Statement)),
                ["10.0.0.0", "10.0.0.1", "10.0.0.2", "10.0.0.3"]
            );
        }
    }

    #[test]
    fn test_status_updates_flow_through_to_child() {
        let hosts = nodes(&["10.0.0.0", "10.0.0.1", "10.0.0.2", "10.0.0.3"]);
        let policy = HostTargetingPolicy::new(Arc::new(RoundRobinPolicy::new()));
        policy.populate(&ClusterMetadata::with_nodes(hosts.clone()), &hosts);

        policy.on_down(&hosts[0]);
        policy.on_remove(&hosts[1]);
        let joining = Node::new("10.0.0.4");
        policy.on_up(&joining);
        let added = Node::new("10.0.0.5");
        policy.on_add(&added);

        let mut plan = plan_addresses(&policy, None);
        plan.sort();
        assert_eq!(plan, ["10.0.0.2", "10.0.0.3", "10.0.0.4", "10.0.0.5"]);
    }

    #[test]
    fn test_no_live_nodes_yields_empty_plan() {
        let hosts = nodes(&["10.0.0.0", "10.0.0.1", "10.0.0.2", "10.0.0.3"]);
        let policy = HostTargetingPolicy::new(Arc::new(RoundRobinPolicy::new()));
        policy.populate(&ClusterMetadata::with_nodes(hosts.clone()), &hosts);

        for host in &hosts {
            host.set_up(false);
            policy.on_down(host);
        }

        assert!(plan_addresses(&policy, None).is_empty());
    }

    #[test]
    fn test_unknown_target_address_is_no_preference() {
        let hosts = nodes(&["10.0.0.0", "10.0.0.1", "10.0.0.2", "10.0.0.3"]);
        let policy = HostTargetingPolicy::new(Arc::new(FixedOrderPolicy::default()));
        policy.populate(&ClusterMetadata::with_nodes(hosts.clone()), &hosts);

        let statement = targeted("127.0.0.1");
        assert_eq!(
            plan_addresses(&policy, Some(&statement as &dyn Statement)),
            ["10.0.0.0", "10.0.0.1", "10.0.0.2", "10.0.0.3"]
        );
    }

    #[test]
    fn test_down_target_falls_back_to_child_plan() {
        let hosts = nodes(&["10.0.0.0", "10.0.0.1", "10.0.0.2", "10.0.0.3"]);
        let policy = HostTargetingPolicy::new(Arc::new(FixedOrderPolicy::default()));
        policy.populate(&ClusterMetadata::with_nodes(hosts.clone()), &hosts);

        let statement = targeted("10.0.0.1");
        hosts[1].set_up(false);
        policy.on_down(&hosts[1]);

        let plan = plan_addresses(&policy, Some(&statement as &dyn Statement));
        assert!(!plan.contains(&"10.0.0.1".to_string()));
        assert_eq!(plan, ["10.0.0.0", "10.0.0.2", "10.0.0.3"]);
    }

    #[test]
    fn test_live_target_is_first_and_appears_once() {
        let hosts = nodes(&["10.0.0.0", "10.0.0.1", "10.0.0.2", "10.0.0.3"]);
        let policy = HostTargetingPolicy::new(Arc::new(FixedOrderPolicy::default()));
        policy.populate(&ClusterMetadata::with_nodes(hosts.clone()), &hosts);

        let statement = targeted("10.0.0.1");
        // The same plan must come back on every call, not just the first.
        for _ in 0..10 {
            let plan = plan_addresses(&policy, Some(&statement as &dyn Statement));
            assert_eq!(plan, ["10.0.0.1", "10.0.0.0", "10.0.0.2", "10.0.0.3"]);
        }
    }

    #[test]
    fn test_statement_keyspace_wins_over_working_keyspace() {
        let hosts = nodes(&["10.0.0.0"]);
        let child = Arc::new(FixedOrderPolicy::default());
        let policy = HostTargetingPolicy::new(child.clone());
        policy.populate(&ClusterMetadata::with_nodes(hosts.clone()), &hosts);

        let statement = SimpleGraphStatement::new("g.V()").with_keyspace("stmt_ks");
        policy
            .make_query_plan(Some("working_ks"), Some(&statement as &dyn Statement))
            .for_each(drop);
        assert_eq!(
            child
                .last_keyspace
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .as_deref(),
            Some("stmt_ks")
        );

        let bare = SimpleGraphStatement::new("g.V()");
        policy
            .make_query_plan(Some("working_ks"), Some(&bare as &dyn Statement))
            .for_each(drop);
        assert_eq!(
            child
                .last_keyspace
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .as_deref(),
            Some("working_ks")
        );
    }

    #[test]
    fn test_only_targeting_policy_supports_targeting() {
        let round_robin = Arc::new(RoundRobinPolicy::new());
        assert!(!round_robin.supports_targeting());
        let policy = HostTargetingPolicy::new(round_robin);
        assert!(policy.supports_targeting());
    }
}
