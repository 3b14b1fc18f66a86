use crate::Action;
use crate::bounds::lower::PolicyLowerBound;
use crate::bounds::lower::ScenarioLowerBound;
use crate::bounds::lower::TrivialLowerBound;
use crate::bounds::policy::BlindPolicy;
use crate::bounds::policy::RandomPolicy;
use crate::bounds::upper::ScenarioUpperBound;
use crate::bounds::upper::TrivialUpperBound;
use crate::config::Config;
use crate::errors::Error;
use crate::errors::Result;
use crate::model::Pomdp;
use crate::random::seeds::Seeds;
use std::collections::BTreeMap;

pub type LowerFactory<P> =
    Box<dyn Fn(&P, &Config) -> Result<Box<dyn ScenarioLowerBound<P>>> + Send>;
pub type UpperFactory<P> =
    Box<dyn Fn(&P, &Config) -> Result<Box<dyn ScenarioUpperBound<P>>> + Send>;

/// String-keyed bound strategies. The standard names are built in;
/// problem models add their own through `Pomdp::register_bounds`. The
/// registry is consulted exactly once, at planner initialization, and
/// an unknown name is a configuration error there.
pub struct Registry<P: Pomdp> {
    lowers: BTreeMap<String, LowerFactory<P>>,
    uppers: BTreeMap<String, UpperFactory<P>>,
}

impl<P: Pomdp> Registry<P> {
    pub fn standard() -> Self {
        let mut registry = Self {
            lowers: BTreeMap::new(),
            uppers: BTreeMap::new(),
        };
        registry.register_lower("TRIVIAL", Box::new(trivial_lower));
        registry.register_lower("RANDOM", Box::new(random_lower));
        registry.register_lower("DEFAULT", Box::new(default_lower));
        registry.register_upper("TRIVIAL", Box::new(trivial_upper));
        registry.register_upper("DEFAULT", Box::new(trivial_upper));
        registry
    }

    pub fn register_lower(&mut self, name: &str, factory: LowerFactory<P>) {
        self.lowers.insert(String::from(name), factory);
    }

    pub fn register_upper(&mut self, name: &str, factory: UpperFactory<P>) {
        self.uppers.insert(String::from(name), factory);
    }

    pub fn lower(
        &self,
        name: &str,
        model: &P,
        config: &Config,
    ) -> Result<Box<dyn ScenarioLowerBound<P>>> {
        let factory = self
            .lowers
            .get(name)
            .ok_or_else(|| Error::Config(format!("unknown lower bound strategy {:?}", name)))?;
        factory(model, config)
    }

    pub fn upper(
        &self,
        name: &str,
        model: &P,
        config: &Config,
    ) -> Result<Box<dyn ScenarioUpperBound<P>>> {
        let factory = self
            .uppers
            .get(name)
            .ok_or_else(|| Error::Config(format!("unknown upper bound strategy {:?}", name)))?;
        factory(model, config)
    }
}

/// Resolve the configured fallback action name against the model.
pub fn fallback_action<P: Pomdp>(model: &P, config: &Config) -> Result<Action> {
    match config.default_action.as_deref() {
        None => Ok(model.min_reward_action().action),
        Some(name) => {
            let action = name
                .parse::<Action>()
                .map_err(|_| Error::Config(format!("unparsable default action {:?}", name)))?;
            if action >= model.num_actions() {
                return Err(Error::Config(format!(
                    "default action {} out of range, model has {} actions",
                    action,
                    model.num_actions()
                )));
            }
            Ok(action)
        }
    }
}

fn trivial_lower<P: Pomdp>(_model: &P, config: &Config) -> Result<Box<dyn ScenarioLowerBound<P>>> {
    Ok(Box::new(TrivialLowerBound::new(
        config.discount,
        config.search_depth,
    )))
}

fn random_lower<P: Pomdp>(_model: &P, config: &Config) -> Result<Box<dyn ScenarioLowerBound<P>>> {
    let policy = Box::new(RandomPolicy::new(&Seeds::new(config.root_seed)));
    Ok(Box::new(PolicyLowerBound::new(
        policy,
        config.discount,
        config.max_policy_sim_len,
        config.search_depth,
    )))
}

/// "DEFAULT" is a blind rollout when a fallback action is configured,
/// a random rollout otherwise.
fn default_lower<P: Pomdp>(model: &P, config: &Config) -> Result<Box<dyn ScenarioLowerBound<P>>> {
    match config.default_action {
        None => random_lower(model, config),
        Some(_) => {
            let action = fallback_action(model, config)?;
            let policy = Box::new(BlindPolicy::new(action));
            Ok(Box::new(PolicyLowerBound::new(
                policy,
                config.discount,
                config.max_policy_sim_len,
                config.search_depth,
            )))
        }
    }
}

fn trivial_upper<P: Pomdp>(_model: &P, config: &Config) -> Result<Box<dyn ScenarioUpperBound<P>>> {
    Ok(Box::new(TrivialUpperBound::new(
        config.discount,
        config.search_depth,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::toys::Bandit;

    #[test]
    fn default_names_resolve() {
        let model = Bandit::new(2);
        let config = Config::default();
        let registry = Registry::standard();
        assert!(registry.lower("DEFAULT", &model, &config).is_ok());
        assert!(registry.upper("DEFAULT", &model, &config).is_ok());
    }

    #[test]
    fn unknown_name_is_a_config_error() {
        let model = Bandit::new(2);
        let config = Config::default();
        let registry = Registry::<Bandit>::standard();
        let missing = registry.lower("LEARNED", &model, &config);
        assert!(matches!(missing, Err(Error::Config(_))));
    }

    #[test]
    fn model_registered_names_resolve() {
        let model = Bandit::new(2);
        let config = Config::default();
        let mut registry = Registry::standard();
        registry.register_upper("MODE", Box::new(trivial_upper));
        assert!(registry.upper("MODE", &model, &config).is_ok());
    }

    #[test]
    fn fallback_action_bounds_checked() {
        let model = Bandit::new(2);
        let valid = Config {
            default_action: Some(String::from("1")),
            ..Config::default()
        };
        let invalid = Config {
            default_action: Some(String::from("7")),
            ..Config::default()
        };
        assert_eq!(fallback_action(&model, &valid).unwrap(), 1);
        assert!(fallback_action(&model, &invalid).is_err());
    }
}
