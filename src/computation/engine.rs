//! A synchronous, single-threaded calculation pipeline.
use super::context::{CalculationError, EvaluationContext};
use super::evaluator::Evaluator;
use crate::config::CalculatorConfig;
use crate::error::EngineError;
use crate::graph::{DependencyGraph, NodeId};
use crate::store::{CalculationRequest, CalculationResponse, CalculationResult, Parameter, Target, Unit};
use crate::type_system::{validate_inputs, UnitChecker};
use rayon::prelude::*;
use std::collections::HashMap;
use tracing::{debug, trace, warn};

/// Evaluates targets over a borrowed, immutable parameter set.
///
/// The calculator holds no per-run state: each call builds its own
/// `EvaluationContext`, so one calculator may serve concurrent runs.
pub struct Calculator<'a> {
    parameters: &'a [Parameter],
    config: CalculatorConfig,
    evaluator: Evaluator,
}

impl<'a> Calculator<'a> {
    pub fn new(parameters: &'a [Parameter]) -> Self {
        Self::with_config(parameters, CalculatorConfig::default())
    }

    pub fn with_config(parameters: &'a [Parameter], config: CalculatorConfig) -> Self {
        Self {
            parameters,
            evaluator: Evaluator::from_config(&config),
            config,
        }
    }

    /// Evaluates `target`, returning a result shaped like the request.
    pub fn evaluate(&self, inputs: &HashMap<String, f64>, target: &Target) -> Result<CalculationResult, CalculationError> {
        let values = self.evaluate_many(inputs, target.names())?;
        Ok(match target {
            Target::Single(_) => CalculationResult::Single(values[0]),
            Target::Many(_) => CalculationResult::Many(values),
        })
    }

    pub fn evaluate_one(&self, inputs: &HashMap<String, f64>, target: &str) -> Result<f64, CalculationError> {
        let values = self.evaluate_many(inputs, &[target])?;
        Ok(values[0])
    }

    /// Evaluates several targets in one pass; values follow the order of `targets`.
    pub fn evaluate_many<S: AsRef<str>>(
        &self,
        inputs: &HashMap<String, f64>,
        targets: &[S],
    ) -> Result<Vec<f64>, CalculationError> {
        let order = self.plan(targets, Some(inputs))?;
        self.execute(&order, inputs, targets)
    }

    /// Evaluates one independent input set per scenario, in parallel.
    ///
    /// Graph and formula unit errors are reported once for the whole batch.
    /// Input and evaluation errors are reported per scenario.
    pub fn evaluate_batch(
        &self,
        scenarios: &[HashMap<String, f64>],
        target: &Target,
    ) -> Result<Vec<Result<CalculationResult, CalculationError>>, CalculationError> {
        let names = target.names();
        let order = self.plan(names, None)?;
        debug!(scenarios = scenarios.len(), "running scenario batch");

        Ok(scenarios
            .par_iter()
            .map(|inputs| {
                if self.config.check_units {
                    let errors = validate_inputs(self.parameters, inputs);
                    if !errors.is_empty() {
                        warn!(errors = errors.len(), "scenario inputs failed validation");
                        return Err(CalculationError::Units(errors));
                    }
                }
                let values = self.execute(&order, inputs, names)?;
                Ok(match target {
                    Target::Single(_) => CalculationResult::Single(values[0]),
                    Target::Many(_) => CalculationResult::Many(values),
                })
            })
            .collect())
    }

    /// Runs only the unit pass and returns the unit of every parameter.
    pub fn units(&self) -> Result<HashMap<String, Unit>, CalculationError> {
        let graph = DependencyGraph::build(self.parameters)?;
        UnitChecker::new(self.parameters, &graph)
            .check_and_infer()
            .map_err(CalculationError::Units)
    }

    /// Builds and validates the graph, returning the evaluation order.
    /// When units are checked, `inputs` are checked against their declared units too.
    fn plan<S: AsRef<str>>(
        &self,
        targets: &[S],
        inputs: Option<&HashMap<String, f64>>,
    ) -> Result<Vec<NodeId>, CalculationError> {
        let graph = DependencyGraph::build(self.parameters)?;
        let mut order = graph.topological_order()?;
        debug!(parameters = graph.node_count(), "dependency graph built");

        if self.config.check_units {
            let mut checker = UnitChecker::new(self.parameters, &graph);
            if let Some(inputs) = inputs {
                checker = checker.with_inputs(inputs);
            }
            checker.check_and_infer().map_err(CalculationError::Units)?;
        }

        if self.config.prune_to_targets {
            let starts: Vec<NodeId> = targets.iter().filter_map(|t| graph.node_id(t.as_ref())).collect();
            let needed = graph.upstream_from(&starts);
            order.retain(|id| needed.contains(id));
            debug!(kept = order.len(), "pruned evaluation order to targets");
        }

        Ok(order)
    }

    /// Walks `order` in a fresh context seeded with `inputs`, then reads out `targets`.
    fn execute<S: AsRef<str>>(
        &self,
        order: &[NodeId],
        inputs: &HashMap<String, f64>,
        targets: &[S],
    ) -> Result<Vec<f64>, CalculationError> {
        let mut context = EvaluationContext::from_inputs(inputs.iter().map(|(k, v)| (k.clone(), *v)));

        for &id in order {
            let param = &self.parameters[id.index()];
            // Inputs override any definition of the same name.
            if context.contains(param.name()) {
                continue;
            }
            let value = param
                .resolve_with(&mut context, &self.evaluator)
                .map_err(|source| CalculationError::Evaluation { parameter: param.name().to_string(), source })?;
            trace!(parameter = param.name(), value, "resolved");
        }

        let values = targets
            .iter()
            .map(|t| {
                let name = t.as_ref();
                context
                    .get(name)
                    .ok_or_else(|| CalculationError::UnresolvedTarget { name: name.to_string() })
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!(targets = values.len(), resolved = context.len(), "targets extracted");
        Ok(values)
    }
}

/// Handles one request end to end: validate definitions, then evaluate.
pub fn run(request: &CalculationRequest, config: &CalculatorConfig) -> Result<CalculationResponse, EngineError> {
    let parameters = Parameter::from_defs(request.parameters.iter().cloned())?;
    let calculator = Calculator::with_config(&parameters, config.clone());
    let result = calculator.evaluate(&request.inputs, &request.target)?;
    Ok(CalculationResponse { result })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::computation::EvalError;
    use crate::graph::GraphError;
    use crate::type_system::ValidationErrorType;

    fn inputs(pairs: &[(&str, f64)]) -> HashMap<String, f64> {
        pairs.iter().map(|&(k, v)| (k.to_string(), v)).collect()
    }

    fn pricing() -> Vec<Parameter> {
        vec![
            Parameter::global("tax_rate", 0.2).unwrap(),
            Parameter::company("discount", 50.0).unwrap(),
            Parameter::user("price").unwrap(),
            Parameter::user("quantity").unwrap(),
            Parameter::calculation("subtotal", "price * quantity").unwrap(),
            Parameter::calculation("tax", "subtotal * tax_rate").unwrap(),
            Parameter::calculation("final", "subtotal + tax - discount").unwrap(),
        ]
    }

    #[test]
    fn test_single_and_many_targets() {
        let params = pricing();
        let calc = Calculator::new(&params);
        let inputs = inputs(&[("price", 100.0), ("quantity", 5.0)]);

        assert_eq!(calc.evaluate_one(&inputs, "final").unwrap(), 550.0);
        assert_eq!(
            calc.evaluate(&inputs, &Target::from(vec!["subtotal", "tax"])).unwrap(),
            CalculationResult::Many(vec![500.0, 100.0])
        );
    }

    #[test]
    fn test_inputs_override_definitions() {
        let params = pricing();
        let calc = Calculator::new(&params);
        let inputs = inputs(&[("price", 100.0), ("quantity", 5.0), ("tax_rate", 0.0), ("subtotal", 10.0)]);
        assert_eq!(calc.evaluate_one(&inputs, "final").unwrap(), -40.0);
    }

    #[test]
    fn test_missing_input_aborts_run() {
        let params = pricing();
        let err = Calculator::new(&params)
            .evaluate_one(&inputs(&[("price", 100.0)]), "final")
            .unwrap_err();
        assert_eq!(
            err,
            CalculationError::Evaluation {
                parameter: "quantity".into(),
                source: EvalError::MissingInput { name: "quantity".into() },
            }
        );
    }

    #[test]
    fn test_prune_skips_unrelated_parameters() {
        let params = pricing();
        let config = CalculatorConfig { prune_to_targets: true, ..Default::default() };
        let calc = Calculator::with_config(&params, config);

        // `quantity` is missing, but `tax_rate` alone does not need it.
        assert_eq!(calc.evaluate_one(&HashMap::new(), "tax_rate").unwrap(), 0.2);
        assert!(Calculator::new(&params).evaluate_one(&HashMap::new(), "tax_rate").is_err());
    }

    #[test]
    fn test_target_supplied_only_as_input() {
        let params = vec![Parameter::user("x").unwrap()];
        let calc = Calculator::new(&params);
        assert_eq!(calc.evaluate_one(&inputs(&[("x", 1.0), ("extra", 7.0)]), "extra").unwrap(), 7.0);
        assert_eq!(
            calc.evaluate_one(&inputs(&[("x", 1.0)]), "nowhere").unwrap_err(),
            CalculationError::UnresolvedTarget { name: "nowhere".into() }
        );
    }

    #[test]
    fn test_graph_errors_precede_evaluation() {
        // `boom` would fail at evaluation time, but the cycle is reported first.
        let params = vec![
            Parameter::calculation("boom", "log(0)").unwrap(),
            Parameter::calculation("a", "b + 1").unwrap(),
            Parameter::calculation("b", "a + 1").unwrap(),
        ];
        assert_eq!(
            Calculator::new(&params).evaluate_one(&HashMap::new(), "boom").unwrap_err(),
            CalculationError::Graph(GraphError::Cycle)
        );
    }

    #[test]
    fn test_unit_check_gate() {
        let params = vec![
            Parameter::user("usd").unwrap().with_unit("USD"),
            Parameter::user("mw").unwrap().with_unit("MW"),
            Parameter::calculation("nonsense", "usd + mw").unwrap(),
        ];
        let inputs = inputs(&[("usd", 1.0), ("mw", 2.0)]);

        assert_eq!(Calculator::new(&params).evaluate_one(&inputs, "nonsense").unwrap(), 3.0);

        let strict = Calculator::with_config(&params, CalculatorConfig { check_units: true, ..Default::default() });
        match strict.evaluate_one(&inputs, "nonsense").unwrap_err() {
            CalculationError::Units(errors) => assert_eq!(errors[0].parameter, "nonsense"),
            other => panic!("Wrong error type: {:?}", other),
        }
        assert!(strict.units().is_err());
    }

    fn plant() -> Vec<Parameter> {
        vec![
            Parameter::user("capacity").unwrap().with_unit("MW"),
            Parameter::user("hours").unwrap().with_unit("hours"),
            Parameter::calculation("energy", "capacity * hours").unwrap().with_unit("MWh"),
        ]
    }

    #[test]
    fn test_implausible_inputs_rejected_only_when_checking_units() {
        let params = plant();
        let kw_as_mw = inputs(&[("capacity", 5000.0), ("hours", 10.0)]);

        assert_eq!(Calculator::new(&params).evaluate_one(&kw_as_mw, "energy").unwrap(), 50_000.0);

        let strict = Calculator::with_config(&params, CalculatorConfig { check_units: true, ..Default::default() });
        match strict.evaluate_one(&kw_as_mw, "energy").unwrap_err() {
            CalculationError::Units(errors) => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].parameter, "capacity");
                assert_eq!(errors[0].error_type, ValidationErrorType::PossibleScaleError);
            }
            other => panic!("Wrong error type: {:?}", other),
        }
        assert_eq!(strict.evaluate_one(&inputs(&[("capacity", 5.0), ("hours", 10.0)]), "energy").unwrap(), 50.0);
    }

    #[test]
    fn test_batch_validates_each_scenario() {
        let params = plant();
        let strict = Calculator::with_config(&params, CalculatorConfig { check_units: true, ..Default::default() });
        let scenarios = vec![
            inputs(&[("capacity", 5.0), ("hours", 10.0)]),
            inputs(&[("capacity", 5.0), ("hours", -1.0)]),
        ];

        let results = strict.evaluate_batch(&scenarios, &Target::from("energy")).unwrap();
        assert_eq!(results[0], Ok(CalculationResult::Single(50.0)));
        match &results[1] {
            Err(CalculationError::Units(errors)) => {
                assert_eq!(errors[0].error_type, ValidationErrorType::ValueOutOfRange)
            }
            other => panic!("Wrong result: {:?}", other),
        }
    }

    #[test]
    fn test_batch_runs_scenarios_independently() {
        let params = pricing();
        let calc = Calculator::new(&params);
        let scenarios = vec![
            inputs(&[("price", 100.0), ("quantity", 5.0)]),
            inputs(&[("price", 10.0)]),
            inputs(&[("price", 1.0), ("quantity", 100.0)]),
        ];

        let results = calc.evaluate_batch(&scenarios, &Target::from("final")).unwrap();
        assert_eq!(results[0], Ok(CalculationResult::Single(550.0)));
        assert!(matches!(results[1], Err(CalculationError::Evaluation { .. })));
        assert_eq!(results[2], Ok(CalculationResult::Single(70.0)));
    }

    #[test]
    fn test_run_request() {
        let request: CalculationRequest = serde_json::from_str(
            r#"{
                "parameters": [
                    {"name": "x", "kind": "USER"},
                    {"name": "y", "kind": "USER"},
                    {"name": "ratio", "kind": "CALCULATION", "formula": "x / y"}
                ],
                "inputs": {"x": 12, "y": 4},
                "target": ["ratio"]
            }"#,
        )
        .unwrap();
        let response = run(&request, &CalculatorConfig::default()).unwrap();
        assert_eq!(response.result, CalculationResult::Many(vec![3.0]));

        let mut bad = request.clone();
        bad.parameters[2].formula = Some("x /".into());
        assert!(matches!(run(&bad, &CalculatorConfig::default()), Err(EngineError::Definition(_))));
    }
}
