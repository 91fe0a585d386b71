use super::*;
use crate::{base::SentinelRule, logging, utils};
use crate::{Error, Result};
use lazy_static::lazy_static;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, RwLock};

pub type RuleMap = HashMap<String, HashSet<Arc<Rule>>>;

lazy_static! {
    static ref RULE_MAP: RwLock<RuleMap> = RwLock::new(RuleMap::new());
    static ref CURRENT_RULES: Mutex<RuleMap> = Mutex::new(RuleMap::new());
}

/// Returns all the rules in the global rule map.
pub fn get_rules() -> Vec<Arc<Rule>> {
    let rule_map = RULE_MAP.read().unwrap();
    let mut rules = Vec::with_capacity(rule_map.len());
    for r in rule_map.values() {
        rules.append(&mut r.clone().into_iter().collect());
    }
    rules
}

/// Returns the given resource's rules.
pub fn get_rules_of_resource(res: &String) -> Vec<Arc<Rule>> {
    let placeholder = HashSet::new();
    let rule_map = RULE_MAP.read().unwrap();
    let res_rules = rule_map.get(res).unwrap_or(&placeholder);

    res_rules.clone().into_iter().collect()
}

pub fn append_rule(rule: Arc<Rule>) -> bool {
    if RULE_MAP
        .read()
        .unwrap()
        .get(&rule.resource)
        .unwrap_or(&HashSet::new())
        .contains(&rule)
    {
        return false;
    }

    match rule.is_valid() {
        Ok(_) => {
            RULE_MAP
                .write()
                .unwrap()
                .entry(rule.resource.clone())
                .or_default()
                .insert(Arc::clone(&rule));
            CURRENT_RULES
                .lock()
                .unwrap()
                .entry(rule.resource.clone())
                .or_default()
                .insert(rule);
        }
        Err(err) => logging::warn!(
            "[Authority append_rule] Ignoring invalid rule {:?}, reason: {:?}",
            rule,
            err
        ),
    };
    true
}

/// Loads the given authority rules, replacing all previously loaded rules.
pub fn load_rules(rules: Vec<Arc<Rule>>) {
    let mut res_rules_map = RuleMap::new();
    for rule in rules {
        let val = res_rules_map.entry(rule.resource.clone()).or_default();
        val.insert(rule);
    }
    let mut current_rules = CURRENT_RULES.lock().unwrap();
    if *current_rules == res_rules_map {
        logging::info!(
            "[Authority] Load rules is the same with current rules, so ignore load operation."
        );
        return;
    }

    let mut valid_res_rule_map = RuleMap::with_capacity(res_rules_map.len());
    for (res, rules) in &res_rules_map {
        let mut valid_res_rules = HashSet::with_capacity(rules.len());
        for rule in rules {
            match rule.is_valid() {
                Ok(_) => {
                    valid_res_rules.insert(Arc::clone(rule));
                }
                Err(err) => logging::warn!(
                    "[Authority load_rules] Ignoring invalid authority rule {:?}, reason: {:?}",
                    rule,
                    err
                ),
            }
        }
        if !valid_res_rules.is_empty() {
            valid_res_rule_map.insert(res.clone(), valid_res_rules);
        }
    }

    let start = utils::curr_time_nanos();
    let mut rule_map = RULE_MAP.write().unwrap();
    *rule_map = valid_res_rule_map;
    *current_rules = res_rules_map;

    logging::debug!(
        "[Authority load_rules] Time statistic(ns) for updating authority rule, timeCost {:?}",
        utils::curr_time_nanos() - start
    );
    logging::info!("[AuthorityRuleManager] Authority rules loaded, rules {:?}", rule_map);
}

/// Loads the given resource's authority rules, replacing that resource's previously loaded rules.
pub fn load_rules_of_resource(res: &String, rules: Vec<Arc<Rule>>) -> Result<bool> {
    if res.is_empty() {
        return Err(Error::msg("empty resource"));
    }
    let rules: HashSet<_> = rules.into_iter().collect();

    if rules.is_empty() {
        clear_rules_of_resource(res);
        logging::info!("[Authority] clear resource level rules, resource {}", res);
        return Ok(true);
    }

    if CURRENT_RULES
        .lock()
        .unwrap()
        .get(res)
        .unwrap_or(&HashSet::new())
        == &rules
    {
        logging::info!(
            "[Authority] Load resource level rules is the same with current resource level rules, so ignore load operation."
        );
        return Ok(false);
    }

    let mut valid_res_rules = HashSet::with_capacity(rules.len());
    for rule in &rules {
        match rule.is_valid() {
            Ok(_) => {
                valid_res_rules.insert(Arc::clone(rule));
            }
            Err(err) => logging::warn!(
                "[Authority load_rules_of_resource] Ignoring invalid authority rule {:?}, reason: {:?}",
                rule,
                err
            ),
        }
    }

    let valid_res_rules_string = format!("{:?}", &valid_res_rules);
    let start = utils::curr_time_nanos();
    if valid_res_rules.is_empty() {
        RULE_MAP.write().unwrap().remove(res);
    } else {
        RULE_MAP
            .write()
            .unwrap()
            .insert(res.clone(), valid_res_rules);
    }
    CURRENT_RULES.lock().unwrap().insert(res.clone(), rules);

    logging::debug!(
        "[Authority load_rules] Time statistic(ns) for updating authority rule, timeCost {:?}",
        utils::curr_time_nanos() - start
    );
    logging::info!(
        "[AuthorityRuleManager] Authority rules loaded, rules {}",
        valid_res_rules_string
    );
    Ok(true)
}

/// Clears all the rules in the authority module.
pub fn clear_rules() {
    CURRENT_RULES.lock().unwrap().clear();
    RULE_MAP.write().unwrap().clear();
}

/// Clears resource level rules in the authority module.
pub fn clear_rules_of_resource(res: &String) {
    CURRENT_RULES.lock().unwrap().remove(res);
    RULE_MAP.write().unwrap().remove(res);
}

#[cfg(test)]
mod test {
    //! Some tests cannot run in parallel, since we cannot promise that
    //! the global data structs are not modified before assertion.
    use super::*;

    #[test]
    fn empty_rules() {
        let rules = get_rules();
        assert_eq!(0, rules.len());
    }

    #[test]
    #[ignore]
    fn several_rules_of_resource() {
        let r1 = Arc::new(Rule {
            resource: "abc1".into(),
            strategy: AuthorityStrategy::White,
            rule_list: "a,b".into(),
            ..Default::default()
        });
        let r2 = Arc::new(Rule {
            resource: "abc1".into(),
            strategy: AuthorityStrategy::Black,
            rule_list: "c,d".into(),
            ..Default::default()
        });
        load_rules_of_resource(&"abc1".into(), vec![Arc::clone(&r1), Arc::clone(&r2)]).unwrap();
        let rule_map = RULE_MAP.read().unwrap();
        assert_eq!(1, rule_map.len());
        assert_eq!(2, rule_map["abc1"].len());
        drop(rule_map);
        clear_rules();
        assert_eq!(0, RULE_MAP.read().unwrap().len());
    }

    #[test]
    #[ignore]
    #[should_panic(expected = "empty resource")]
    fn empty_resource() {
        let r1 = Arc::new(Rule {
            rule_list: "a".into(),
            ..Default::default()
        });
        let result = load_rules_of_resource(&"".into(), vec![r1]);
        assert_eq!(0, RULE_MAP.read().unwrap().len());
        result.unwrap();
    }
}
