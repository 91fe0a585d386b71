use super::*;
use crate::logging;
use std::sync::{
    atomic::{AtomicU32, AtomicU64, Ordering},
    Arc, Mutex,
};

/// number of consecutive over-threshold observations the breaker admits (probation)
/// before it trips on the next one
const PROBATION_LIMIT: u32 = 5;

#[derive(Debug)]
pub struct AvgRtBreaker {
    breaker: BreakerBase,
    max_allowed_avg_rt_ms: f64,
    min_request_amount: u64,
    probation_count: AtomicU32,
    stat: Arc<CounterLeapArray>,
}

impl AvgRtBreaker {
    pub fn new(rule: Arc<Rule>) -> Self {
        let interval = rule.stat_interval_ms;
        let bucket_count = rule.get_rule_stat_sliding_window_bucket_count();
        let stat = CounterLeapArray::new(bucket_count, interval).unwrap();
        Self::new_with_stat(rule, Arc::new(stat))
    }

    pub fn new_with_stat(rule: Arc<Rule>, stat: Arc<CounterLeapArray>) -> Self {
        let retry_timeout_ms = rule.retry_timeout_ms;
        let max_allowed_avg_rt_ms = rule.threshold;
        let min_request_amount = rule.min_request_amount;
        Self {
            breaker: BreakerBase {
                rule,
                retry_timeout_ms,
                next_retry_timestamp_ms: AtomicU64::new(0),
                state: Arc::new(Mutex::new(State::default())),
            },
            max_allowed_avg_rt_ms,
            min_request_amount,
            probation_count: AtomicU32::new(0),
            stat,
        }
    }

    fn avg_rt(&self) -> (f64, u64) {
        let mut rt_sum = 0u64;
        let mut total_count = 0u64;
        for c in self.stat.all_counter() {
            rt_sum += c.value().target.load(Ordering::SeqCst);
            total_count += c.value().total.load(Ordering::SeqCst);
        }
        if total_count == 0 {
            (0.0, 0)
        } else {
            (rt_sum as f64 / total_count as f64, total_count)
        }
    }
}

impl CircuitBreakerTrait for AvgRtBreaker {
    fn breaker(&self) -> &BreakerBase {
        &self.breaker
    }

    fn stat(&self) -> &Arc<CounterLeapArray> {
        &self.stat
    }

    fn on_request_complete(&self, rt: u64, _err: &Option<Error>) {
        let counter = self.stat.current_counter();
        if counter.is_err() {
            logging::error!(
                "Fail to get current counter in AvgRtBreaker#on_request_complete(). rule: {:?}",
                self.breaker.rule
            );
            return;
        }
        let counter = counter.unwrap();
        counter.value().target.fetch_add(rt, Ordering::SeqCst);
        counter.value().total.fetch_add(1, Ordering::SeqCst);

        let (avg_rt, total_count) = self.avg_rt();
        let over_threshold = avg_rt > self.max_allowed_avg_rt_ms;

        match self.current_state() {
            State::HalfOpen => {
                if over_threshold {
                    self.breaker.from_half_open_to_open(Arc::new(avg_rt));
                } else {
                    self.probation_count.store(0, Ordering::SeqCst);
                    self.breaker.from_half_open_to_closed();
                    self.reset_metric();
                }
            }
            State::Closed => {
                if total_count < self.min_request_amount {
                    return;
                }
                if over_threshold {
                    let admitted_so_far = self.probation_count.fetch_add(1, Ordering::SeqCst);
                    if admitted_so_far >= PROBATION_LIMIT {
                        self.breaker.from_closed_to_open(Arc::new(avg_rt));
                    }
                } else {
                    self.probation_count.store(0, Ordering::SeqCst);
                }
            }
            State::Open => {}
        }
    }

    fn reset_metric(&self) {
        for c in self.stat.all_counter() {
            c.value().reset()
        }
        self.probation_count.store(0, Ordering::SeqCst);
    }
}
