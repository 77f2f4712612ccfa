//! Calculator registry

use crate::{CalculatorMeta, CalculatorPlugin, EvalContext};
use finpilot_core::{FinpilotError, Value};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

/// Central calculator registry, keyed by lowercase name
pub struct CalculatorRegistry {
    calculators: HashMap<String, Arc<dyn CalculatorPlugin>>,
}

impl CalculatorRegistry {
    pub fn new() -> Self {
        Self { calculators: HashMap::new() }
    }

    pub fn with_calculator<C: CalculatorPlugin + 'static>(mut self, c: C) -> Self {
        let name = c.meta().name.to_lowercase();
        self.calculators.insert(name, Arc::new(c));
        self
    }

    pub fn get(&self, name: &str) -> Option<&dyn CalculatorPlugin> {
        self.calculators.get(&name.to_lowercase()).map(|c| c.as_ref())
    }

    pub fn len(&self) -> usize {
        self.calculators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calculators.is_empty()
    }

    /// Call with positional arguments, in `ArgMeta` order
    pub fn call(&self, name: &str, args: &[Value], ctx: &EvalContext) -> Value {
        let Some(calc) = self.get(name) else {
            return Value::Error(self.unknown_calculator(name));
        };
        let meta = calc.meta();
        if args.len() > meta.args.len() {
            return Value::Error(FinpilotError::arg_count(meta.name, meta.args.len(), args.len()));
        }
        calc.call(args, ctx)
    }

    /// Call with named inputs (form field name -> value). Names are mapped
    /// onto the calculator's argument order; absent inputs become Null so
    /// optional defaults apply.
    pub fn call_named(&self, name: &str, inputs: &HashMap<String, Value>, ctx: &EvalContext) -> Value {
        let Some(calc) = self.get(name) else {
            return Value::Error(self.unknown_calculator(name));
        };
        let meta = calc.meta();

        let known: HashSet<&str> = meta.args.iter().map(|a| a.name).collect();
        let mut unknown: Vec<&str> = inputs
            .keys()
            .map(String::as_str)
            .filter(|k| !known.contains(k))
            .collect();
        if !unknown.is_empty() {
            unknown.sort_unstable();
            let expected: Vec<&str> = meta.args.iter().map(|a| a.name).collect();
            return Value::Error(
                FinpilotError::invalid_input(meta.name, unknown[0], "is not an input of this calculator")
                    .with_suggestion(format!("Inputs: {}", expected.join(", "))),
            );
        }

        let mut args: Vec<Value> = meta
            .args
            .iter()
            .map(|a| inputs.get(a.name).cloned().unwrap_or(Value::Null))
            .collect();
        while matches!(args.last(), Some(Value::Null)) {
            args.pop();
        }

        calc.call(&args, ctx)
    }

    fn unknown_calculator(&self, name: &str) -> FinpilotError {
        let similar = self.find_similar(name);
        let mut err = FinpilotError::undefined_calculator(name);
        if !similar.is_empty() {
            let suggestions: Vec<&str> = similar.iter().take(3).map(String::as_str).collect();
            err = err.with_suggestion(format!(
                "Did you mean: {}? Use list_calculators() for the full list.",
                suggestions.join(", ")
            ));
        }
        err
    }

    /// Calculator names similar to `name`, best match first
    fn find_similar(&self, name: &str) -> Vec<String> {
        let query = name.to_lowercase();
        let mut matches: Vec<(String, usize)> = self
            .calculators
            .keys()
            .filter_map(|candidate| {
                let score = Self::similarity_score(&query, candidate);
                (score > 0).then(|| (candidate.clone(), score))
            })
            .collect();

        matches.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        matches.into_iter().map(|(name, _)| name).collect()
    }

    fn similarity_score(query: &str, candidate: &str) -> usize {
        let mut score = 0;

        if candidate.starts_with(query) {
            score += 100;
        } else if candidate.contains(query) {
            score += 50;
        } else if query.contains(candidate) {
            score += 30;
        }

        let query_chars: HashSet<char> = query.chars().collect();
        let candidate_chars: HashSet<char> = candidate.chars().collect();
        let common = query_chars.intersection(&candidate_chars).count();
        // Require a real overlap, not one shared letter
        if common * 2 >= candidate_chars.len() {
            score += common * 2;
        }

        score
    }

    pub fn help(&self, name: Option<&str>) -> Value {
        match name {
            Some(n) => self.help_for(n),
            None => self.general_help(),
        }
    }

    fn help_for(&self, name: &str) -> Value {
        match self.get(name) {
            Some(c) => Self::meta_to_help(c.meta()),
            None => Value::Error(self.unknown_calculator(name)),
        }
    }

    fn general_help(&self) -> Value {
        let mut by_category: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (name, c) in &self.calculators {
            by_category
                .entry(c.meta().category.to_string())
                .or_default()
                .push(name.clone());
        }

        let categories = by_category.into_iter().map(|(cat, mut names)| {
            names.sort();
            (cat, Value::List(names.into_iter().map(Value::Text).collect()))
        });

        Value::object([
            ("calculators", Value::object(categories)),
            ("usage", Value::from("Call help('calculator_name') for inputs and examples.")),
        ])
    }

    fn meta_to_help(meta: CalculatorMeta) -> Value {
        let args = meta
            .args
            .iter()
            .map(|a| {
                let mut fields = vec![
                    ("name", Value::from(a.name)),
                    ("type", Value::from(a.typ)),
                    ("description", Value::from(a.description)),
                    ("optional", Value::Bool(a.optional)),
                ];
                if let Some(d) = a.default {
                    fields.push(("default", Value::from(d)));
                }
                Value::object(fields)
            })
            .collect::<Vec<_>>();

        Value::object([
            ("name", Value::from(meta.name)),
            ("description", Value::from(meta.description)),
            ("usage", Value::from(meta.usage)),
            ("category", Value::from(meta.category)),
            ("args", Value::List(args)),
            ("returns", Value::from(meta.returns.to_vec())),
            ("examples", Value::from(meta.examples.to_vec())),
            ("related", Value::from(meta.related.to_vec())),
        ])
    }

    /// Calculators as {name, description, usage, category}, sorted by name
    pub fn list_calculators(&self, category: Option<&str>) -> Value {
        let mut metas: Vec<CalculatorMeta> = self
            .calculators
            .values()
            .map(|c| c.meta())
            .filter(|m| category.map_or(true, |cat| m.category == cat))
            .collect();
        metas.sort_by_key(|m| m.name);

        Value::List(
            metas
                .into_iter()
                .map(|m| {
                    Value::object([
                        ("name", Value::from(m.name)),
                        ("description", Value::from(m.description)),
                        ("usage", Value::from(m.usage)),
                        ("category", Value::from(m.category)),
                    ])
                })
                .collect(),
        )
    }

    pub fn metas(&self) -> Vec<CalculatorMeta> {
        let mut metas: Vec<CalculatorMeta> = self.calculators.values().map(|c| c.meta()).collect();
        metas.sort_by_key(|m| m.name);
        metas
    }
}

impl Default for CalculatorRegistry {
    fn default() -> Self {
        Self::new()
    }
}
