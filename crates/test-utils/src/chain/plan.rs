use std::collections::BTreeMap;

use ethers::{
    abi::Token,
    types::{Address, H256, U256},
};
use thiserror::Error;

use super::deploy::DeployConfig;

pub const TOKEN_PREFIX: &str = "token";
pub const CFMM_FACTORY: &str = "cfmm_factory";
pub const POOL_FACTORY: &str = "pool_factory";
pub const LONG_STRATEGY: &str = "long_strategy";
pub const SHORT_STRATEGY: &str = "short_strategy";
pub const LIQUIDATION_STRATEGY: &str = "liquidation_strategy";
pub const POOL_IMPLEMENTATION: &str = "pool_implementation";
pub const POSITION_MANAGER: &str = "position_manager";

pub fn token_label(index: usize) -> String {
    format!("{}_{}", TOKEN_PREFIX, index)
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("a step labelled {0:?} already exists")]
    DuplicateStep(String),
    #[error("step {step:?} references {output:?}, which isn't an earlier step")]
    UnresolvedOutput { step: String, output: String },
}

/// A constructor argument. `Output` refers to the address deployed by an
/// earlier step of the same plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepArg {
    Address(Address),
    Output(String),
    Uint(U256),
    FixedBytes(H256),
    String(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub label: String,
    pub contract: String,
    pub args: Vec<StepArg>,
}

/// An ordered list of contract deployments. References are checked as steps
/// are pushed, so a plan that exists can always be resolved in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeploymentPlan {
    steps: Vec<Step>,
}

impl DeploymentPlan {
    pub fn push(
        &mut self,
        label: &str,
        contract: &str,
        args: Vec<StepArg>,
    ) -> Result<&mut Self, PlanError> {
        if self.steps.iter().any(|step| step.label == label) {
            return Err(PlanError::DuplicateStep(label.to_string()));
        }
        for arg in &args {
            if let StepArg::Output(output) = arg {
                if !self.steps.iter().any(|step| &step.label == output) {
                    return Err(PlanError::UnresolvedOutput {
                        step: label.to_string(),
                        output: output.clone(),
                    });
                }
            }
        }
        self.steps.push(Step {
            label: label.to_string(),
            contract: contract.to_string(),
            args,
        });
        Ok(self)
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Builds the constructor tokens of `step` from the outputs of the steps
    /// that ran before it.
    pub fn resolve(
        step: &Step,
        outputs: &BTreeMap<String, Address>,
    ) -> Result<Vec<Token>, PlanError> {
        step.args
            .iter()
            .map(|arg| {
                Ok(match arg {
                    StepArg::Address(address) => Token::Address(*address),
                    StepArg::Output(output) => Token::Address(*outputs.get(output).ok_or_else(
                        || PlanError::UnresolvedOutput {
                            step: step.label.clone(),
                            output: output.clone(),
                        },
                    )?),
                    StepArg::Uint(value) => Token::Uint(*value),
                    StepArg::FixedBytes(hash) => Token::FixedBytes(hash.as_bytes().to_vec()),
                    StepArg::String(value) => Token::String(value.clone()),
                })
            })
            .collect()
    }

    /// The test tokens and the constant product factory.
    pub fn amm(config: &DeployConfig, owner: Address) -> Result<Self, PlanError> {
        let mut plan = Self::default();
        for (i, (name, symbol)) in config
            .token_names
            .iter()
            .zip(&config.token_symbols)
            .enumerate()
        {
            plan.push(
                &token_label(i),
                "TestERC20",
                vec![StepArg::String(name.clone()), StepArg::String(symbol.clone())],
            )?;
        }
        plan.push(CFMM_FACTORY, "UniswapV2Factory", vec![StepArg::Address(owner)])?;
        Ok(plan)
    }

    /// The pool factory, the strategies and the pool implementation that
    /// ties them to the constant product factory.
    pub fn protocol(
        config: &DeployConfig,
        owner: Address,
        cfmm_factory: Address,
        cfmm_init_code_hash: H256,
    ) -> Result<Self, PlanError> {
        let mut plan = Self::default();
        plan.push(POOL_FACTORY, "GammaPoolFactory", vec![StepArg::Address(owner)])?
            .push(
                LONG_STRATEGY,
                "CPMMLongStrategy",
                vec![
                    StepArg::Uint(config.origination_fee.into()),
                    StepArg::Uint(config.trading_fee1.into()),
                    StepArg::Uint(config.trading_fee2.into()),
                    StepArg::Uint(config.base_rate),
                    StepArg::Uint(config.factor),
                    StepArg::Uint(config.max_apy),
                ],
            )?
            .push(
                SHORT_STRATEGY,
                "CPMMShortStrategy",
                vec![
                    StepArg::Uint(config.base_rate),
                    StepArg::Uint(config.factor),
                    StepArg::Uint(config.max_apy),
                ],
            )?
            .push(
                LIQUIDATION_STRATEGY,
                "CPMMLiquidationStrategy",
                vec![
                    StepArg::Uint(config.liquidation_fee.into()),
                    StepArg::Uint(config.trading_fee1.into()),
                    StepArg::Uint(config.trading_fee2.into()),
                    StepArg::Uint(config.base_rate),
                    StepArg::Uint(config.factor),
                    StepArg::Uint(config.max_apy),
                ],
            )?
            .push(
                POOL_IMPLEMENTATION,
                "CPMMGammaPool",
                vec![
                    StepArg::Uint(config.protocol_id.into()),
                    StepArg::Output(POOL_FACTORY.to_string()),
                    StepArg::Output(LONG_STRATEGY.to_string()),
                    StepArg::Output(SHORT_STRATEGY.to_string()),
                    StepArg::Output(LIQUIDATION_STRATEGY.to_string()),
                    StepArg::Address(cfmm_factory),
                    StepArg::FixedBytes(cfmm_init_code_hash),
                ],
            )?;
        Ok(plan)
    }

    /// The periphery contract users deposit and withdraw through.
    pub fn position_manager(config: &DeployConfig, pool_factory: Address) -> Result<Self, PlanError> {
        let mut plan = Self::default();
        plan.push(
            POSITION_MANAGER,
            "PositionManager",
            vec![StepArg::Address(pool_factory), StepArg::Address(config.weth)],
        )?;
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_rejects_duplicates_and_unknown_outputs() {
        let mut plan = DeploymentPlan::default();
        assert!(plan.push("a", "A", vec![]).is_ok());
        assert_eq!(
            plan.push("a", "A", vec![]).unwrap_err(),
            PlanError::DuplicateStep("a".to_string())
        );
        assert_eq!(
            plan.push("b", "B", vec![StepArg::Output("c".to_string())])
                .unwrap_err(),
            PlanError::UnresolvedOutput {
                step: "b".to_string(),
                output: "c".to_string()
            }
        );
        // Self references are forward references too.
        assert!(plan
            .push("d", "D", vec![StepArg::Output("d".to_string())])
            .is_err());
        assert_eq!(plan.steps().len(), 1);
    }

    #[test]
    fn test_resolve_substitutes_outputs() {
        let mut plan = DeploymentPlan::default();
        plan.push("factory", "Factory", vec![]).unwrap();
        plan.push(
            "pool",
            "Pool",
            vec![
                StepArg::Uint(1u64.into()),
                StepArg::Output("factory".to_string()),
                StepArg::FixedBytes(H256::repeat_byte(0xab)),
            ],
        )
        .unwrap();

        let factory = Address::from_low_u64_be(0xfac7);
        let outputs = BTreeMap::from([("factory".to_string(), factory)]);
        assert_eq!(
            DeploymentPlan::resolve(&plan.steps()[1], &outputs).unwrap(),
            vec![
                Token::Uint(1u64.into()),
                Token::Address(factory),
                Token::FixedBytes(vec![0xab; 32]),
            ]
        );
        assert!(DeploymentPlan::resolve(&plan.steps()[1], &BTreeMap::new()).is_err());
    }

    #[test]
    fn test_protocol_plan_order() {
        let config = DeployConfig::default();
        let plan = DeploymentPlan::protocol(
            &config,
            Address::from_low_u64_be(1),
            Address::from_low_u64_be(2),
            H256::repeat_byte(3),
        )
        .unwrap();
        let labels = plan
            .steps()
            .iter()
            .map(|step| step.label.as_str())
            .collect::<Vec<_>>();
        assert_eq!(
            labels,
            vec![
                POOL_FACTORY,
                LONG_STRATEGY,
                SHORT_STRATEGY,
                LIQUIDATION_STRATEGY,
                POOL_IMPLEMENTATION
            ]
        );
        let implementation = &plan.steps()[4];
        assert_eq!(implementation.args[0], StepArg::Uint(config.protocol_id.into()));
        assert_eq!(
            implementation.args[6],
            StepArg::FixedBytes(H256::repeat_byte(3))
        );
    }

    #[test]
    fn test_amm_plan_deploys_every_token() {
        let config = DeployConfig::default();
        let plan = DeploymentPlan::amm(&config, Address::from_low_u64_be(1)).unwrap();
        assert_eq!(plan.steps().len(), config.token_symbols.len() + 1);
        assert_eq!(plan.steps()[0].label, token_label(0));
        assert_eq!(plan.steps().last().unwrap().contract, "UniswapV2Factory");
    }
}
