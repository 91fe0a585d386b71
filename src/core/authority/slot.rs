use super::*;
use crate::base::{BaseSlot, BlockType, ContextPtr, EntryContext, RuleCheckSlot, TokenResult};
use crate::cfg_if_async;
use lazy_static::lazy_static;
use std::sync::Arc;

const RULE_CHECK_SLOT_ORDER: u32 = 1000;

/// Checks resource entries against the loaded origin allow/deny rules.
pub struct Slot {}

lazy_static! {
    pub static ref DEFAULT_SLOT: Arc<Slot> = Arc::new(Slot {});
}

pub fn default_slot() -> Arc<Slot> {
    DEFAULT_SLOT.clone()
}

impl BaseSlot for Slot {
    fn order(&self) -> u32 {
        RULE_CHECK_SLOT_ORDER
    }
}

impl RuleCheckSlot for Slot {
    fn check(&self, ctx_ptr: &ContextPtr) -> TokenResult {
        cfg_if_async! {
            let mut ctx = ctx_ptr.write().unwrap(),
            let mut ctx = ctx_ptr.borrow_mut()
        };
        let res_name = ctx.resource().name().clone();
        if res_name.is_empty() {
            return ctx.result().clone();
        }
        if let Some(rule) = blocking_rule(&ctx, &res_name) {
            ctx.set_result(TokenResult::new_blocked_with_cause(
                BlockType::AuthorityFlow,
                "origin not allowed".into(),
                rule,
                Arc::new(()),
            ));
        }
        return ctx.result().clone();
    }
}

/// Returns the first rule that blocks `ctx.origin()` for `res`, or `None` if the entry passes.
/// An empty origin or an empty rule list always passes.
fn blocking_rule(ctx: &EntryContext, res: &String) -> Option<Arc<Rule>> {
    let origin = ctx.origin();
    if origin.is_empty() {
        return None;
    }
    for rule in get_rules_of_resource(res) {
        if rule.rule_list.is_empty() {
            continue;
        }
        let matched = rule.origin_matches(origin);
        let blocked = match rule.strategy {
            AuthorityStrategy::Black => matched,
            AuthorityStrategy::White => !matched,
        };
        if blocked {
            return Some(rule);
        }
    }
    None
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::base::{ResourceType, ResourceWrapper, TrafficType};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn ctx_with(res: &str, origin: &str) -> EntryContext {
        let mut ctx = EntryContext::new();
        ctx.set_resource(ResourceWrapper::new(
            res.into(),
            ResourceType::Common,
            TrafficType::Inbound,
        ));
        ctx.set_origin(origin.into());
        ctx
    }

    #[test]
    fn empty_origin_passes() {
        load_rules(vec![Arc::new(Rule {
            resource: "empty_origin_passes".into(),
            strategy: AuthorityStrategy::White,
            rule_list: "a".into(),
            ..Default::default()
        })]);
        let ctx = ctx_with("empty_origin_passes", "");
        assert!(blocking_rule(&ctx, &"empty_origin_passes".into()).is_none());
        clear_rules();
    }

    #[test]
    fn black_strategy_blocks_match() {
        load_rules(vec![Arc::new(Rule {
            resource: "black_strategy_blocks_match".into(),
            strategy: AuthorityStrategy::Black,
            rule_list: "bad-caller".into(),
            ..Default::default()
        })]);
        let ctx = ctx_with("black_strategy_blocks_match", "bad-caller");
        assert!(blocking_rule(&ctx, &"black_strategy_blocks_match".into()).is_some());
        let ctx = ctx_with("black_strategy_blocks_match", "good-caller");
        assert!(blocking_rule(&ctx, &"black_strategy_blocks_match".into()).is_none());
        clear_rules();
    }

    #[test]
    fn white_strategy_blocks_non_match() {
        load_rules(vec![Arc::new(Rule {
            resource: "white_strategy_blocks_non_match".into(),
            strategy: AuthorityStrategy::White,
            rule_list: "good-caller".into(),
            ..Default::default()
        })]);
        let ctx = ctx_with("white_strategy_blocks_non_match", "good-caller");
        assert!(blocking_rule(&ctx, &"white_strategy_blocks_non_match".into()).is_none());
        let ctx = ctx_with("white_strategy_blocks_non_match", "stranger");
        assert!(blocking_rule(&ctx, &"white_strategy_blocks_non_match".into()).is_some());
        clear_rules();
    }

    #[test]
    fn check_blocks_via_context_ptr() {
        load_rules(vec![Arc::new(Rule {
            resource: "check_blocks_via_context_ptr".into(),
            strategy: AuthorityStrategy::Black,
            rule_list: "bad-caller".into(),
            ..Default::default()
        })]);
        let ctx = ctx_with("check_blocks_via_context_ptr", "bad-caller");
        let ctx_ptr = Rc::new(RefCell::new(ctx));
        let slot = Slot {};
        let result = slot.check(&ctx_ptr);
        assert!(result.is_blocked());
        clear_rules();
    }
}
