//! The default traffic shaping strategy: a fixed threshold taken straight from the rule,
//! rejecting any traffic above it.

use super::{Calculator, Checker, Controller, Rule};
use crate::base::{BlockType, ConcurrencyStat, MetricEvent, StatNode, TokenResult};
use crate::flow::Grade;
use std::sync::{Arc, Mutex, Weak};

/// Provides a determined threshold taken directly from the rule.
#[derive(Debug)]
pub struct DirectCalculator {
    owner: Weak<Controller>,
    threshold: f64,
}

impl DirectCalculator {
    pub fn new(owner: Weak<Controller>, rule: Arc<Rule>) -> Self {
        DirectCalculator {
            owner,
            threshold: rule.threshold,
        }
    }
}

impl Calculator for DirectCalculator {
    fn get_owner(&self) -> &Weak<Controller> {
        &self.owner
    }

    fn set_owner(&mut self, owner: Weak<Controller>) {
        self.owner = owner;
    }

    fn calculate_allowed_threshold(&self, _batch_count: u32, _flag: i32) -> f64 {
        self.threshold
    }
}

/// Directly rejects traffic exceeding the allowed threshold.
#[derive(Debug)]
pub struct RejectChecker {
    owner: Weak<Controller>,
    rule: Arc<Rule>,
}

impl RejectChecker {
    pub fn new(owner: Weak<Controller>, rule: Arc<Rule>) -> Self {
        RejectChecker { owner, rule }
    }
}

impl Checker for RejectChecker {
    fn get_owner(&self) -> &Weak<Controller> {
        &self.owner
    }

    fn set_owner(&mut self, owner: Weak<Controller>) {
        self.owner = owner;
    }

    fn do_check(
        &self,
        stat_node: Option<Arc<dyn StatNode>>,
        batch_count: u32,
        threshold: f64,
    ) -> TokenResult {
        let cur_usage = match self.rule.grade {
            Grade::Concurrency => match &stat_node {
                Some(node) => node.current_concurrency() as f64,
                None => 0.0,
            },
            Grade::QPS => {
                let owner = self.owner.upgrade().unwrap();
                let read_only_metric = owner.stat().read_only_metric();
                read_only_metric.sum(MetricEvent::Pass) as f64
            }
        };
        if cur_usage + batch_count as f64 > threshold {
            TokenResult::new_blocked_with_cause(
                BlockType::Flow,
                "flow reject check blocked".into(),
                self.rule.clone(),
                Arc::new(cur_usage),
            )
        } else {
            TokenResult::new_pass()
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::base::MockStatNode;

    #[test]
    fn direct_calculator() {
        let rule = Arc::new(Rule {
            threshold: 10.0,
            ..Default::default()
        });
        let calc = DirectCalculator::new(Weak::new(), rule);
        assert!((calc.calculate_allowed_threshold(0, 0) - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn concurrency_grade_blocks_on_thread_count() {
        let rule = Arc::new(Rule {
            grade: Grade::Concurrency,
            threshold: 5.0,
            ..Default::default()
        });
        let checker = RejectChecker::new(Weak::new(), rule);

        let mut node = MockStatNode::new();
        node.expect_current_concurrency().return_const(5u32);
        let result = checker.do_check(Some(Arc::new(node)), 1, 5.0);
        assert!(result.is_blocked());

        let mut node = MockStatNode::new();
        node.expect_current_concurrency().return_const(3u32);
        let result = checker.do_check(Some(Arc::new(node)), 1, 5.0);
        assert!(result.is_pass());
    }
}
