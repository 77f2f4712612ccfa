//! JSON-RPC request handling: lifecycle, tools and prompts

use finpilot::{Calculation, FinPilot, Number, Value};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use std::collections::HashMap;

pub const PROTOCOL_VERSION: &str = "2025-11-25";
pub const SERVER_NAME: &str = "finpilot";
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

const PARSE_ERROR: i32 = -32700;
const METHOD_NOT_FOUND: i32 = -32601;
const INVALID_PARAMS: i32 = -32602;

#[derive(Debug, Deserialize)]
pub struct McpRequest {
    #[allow(dead_code)]
    pub jsonrpc: String,
    pub id: Option<JsonValue>,
    pub method: String,
    pub params: Option<JsonValue>,
}

#[derive(Debug, Serialize)]
pub struct McpResponse {
    pub jsonrpc: String,
    pub id: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<McpError>,
}

#[derive(Debug, Serialize)]
pub struct McpError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<JsonValue>,
}

impl McpError {
    fn invalid_params(message: impl Into<String>) -> Self {
        Self { code: INVALID_PARAMS, message: message.into(), data: None }
    }
}

impl McpResponse {
    fn new(id: Option<JsonValue>, result: Result<JsonValue, McpError>) -> Self {
        match result {
            Ok(r) => Self { jsonrpc: "2.0".to_string(), id, result: Some(r), error: None },
            Err(e) => Self { jsonrpc: "2.0".to_string(), id, result: None, error: Some(e) },
        }
    }
}

/// Prompt templates: name, description, (argument, description) pairs
const PROMPTS: [(&str, &str, &[(&str, &str)]); 4] = [
    (
        "home_loan",
        "Monthly EMI and first-year amortization for a loan",
        &[("principal", "Loan amount"), ("annual_rate", "Annual interest rate, percent"), ("years", "Tenure in years")],
    ),
    (
        "sip_plan",
        "Maturity value of a monthly SIP",
        &[
            ("monthly_investment", "Amount invested each month"),
            ("annual_rate", "Expected annual return, percent"),
            ("years", "Investment period in years"),
        ],
    ),
    (
        "tax_regimes",
        "Income tax under the old and new regimes side by side",
        &[("income", "Gross annual income"), ("deductions", "Eligible deductions")],
    ),
    (
        "retirement_check",
        "Retirement corpus and the SIP needed to reach it",
        &[
            ("current_age", "Age today"),
            ("retirement_age", "Planned retirement age"),
            ("monthly_expenses", "Current monthly expenses"),
        ],
    ),
];

pub struct Server {
    engine: FinPilot,
}

impl Server {
    pub fn new(engine: FinPilot) -> Self {
        Self { engine }
    }

    /// Handle one protocol line. Notifications produce no response.
    pub fn handle_line(&self, line: &str) -> Option<McpResponse> {
        let request: McpRequest = match serde_json::from_str(line) {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = %e, "unparseable request");
                return Some(McpResponse::new(
                    None,
                    Err(McpError { code: PARSE_ERROR, message: format!("Parse error: {}", e), data: None }),
                ));
            }
        };

        tracing::debug!(method = %request.method, "processing");
        let response = self.handle_request(&request);

        if request.id.is_none() {
            tracing::debug!(method = %request.method, "notification processed");
            return None;
        }
        Some(response)
    }

    pub fn handle_request(&self, request: &McpRequest) -> McpResponse {
        let result = match request.method.as_str() {
            "initialize" => self.handle_initialize(&request.params),
            "initialized" | "notifications/initialized" => Ok(json!({})),
            "ping" => Ok(json!({})),

            "tools/list" => Ok(tools_list()),
            "tools/call" => self.handle_tool_call(&request.params),

            "prompts/list" => Ok(prompts_list()),
            "prompts/get" => prompts_get(&request.params),

            _ => Err(McpError {
                code: METHOD_NOT_FOUND,
                message: format!("Method not found: {}", request.method),
                data: None,
            }),
        };

        McpResponse::new(request.id.clone(), result)
    }

    fn handle_initialize(&self, params: &Option<JsonValue>) -> Result<JsonValue, McpError> {
        let client = params
            .as_ref()
            .and_then(|p| p.get("clientInfo"))
            .and_then(|c| c.get("name"))
            .and_then(|n| n.as_str())
            .unwrap_or("unknown");

        let client_protocol = params
            .as_ref()
            .and_then(|p| p.get("protocolVersion"))
            .and_then(|v| v.as_str())
            .unwrap_or(PROTOCOL_VERSION);

        tracing::info!(client, protocol = client_protocol, "client connected");

        Ok(json!({
            "protocolVersion": client_protocol,
            "serverInfo": {
                "name": SERVER_NAME,
                "version": SERVER_VERSION,
                "description": "Personal finance calculators: loans, savings, returns, tax and planning"
            },
            "capabilities": {
                "tools": { "listChanged": false },
                "prompts": { "listChanged": false }
            },
            "instructions": format!(
                "FinPilot runs {} financial calculators with exact decimal arithmetic. Use 'list_calculators' to see them and 'finpilot' for the inputs of one. Show the computed table to the user before explaining it.",
                self.engine.registry().len()
            )
        }))
    }

    fn handle_tool_call(&self, params: &Option<JsonValue>) -> Result<JsonValue, McpError> {
        let params = params.as_ref().ok_or_else(|| McpError::invalid_params("Missing params"))?;
        let name = params
            .get("name")
            .and_then(|v| v.as_str())
            .ok_or_else(|| McpError::invalid_params("Missing tool name"))?;
        let args = params.get("arguments").cloned().unwrap_or_else(|| json!({}));

        match name {
            "calculate" => self.tool_calculate(&args),
            "calculate_batch" => self.tool_calculate_batch(&args),
            "finpilot" => Ok(self.tool_help(&args)),
            "list_calculators" => Ok(self.tool_list_calculators(&args)),
            _ => Err(McpError::invalid_params(format!("Unknown tool: {}", name))),
        }
    }

    fn tool_calculate(&self, args: &JsonValue) -> Result<JsonValue, McpError> {
        let calculator = calculator_arg(args)?;
        let calc = self.run(calculator, args);

        let mut result = json!({
            "content": [{ "type": "text", "text": calc.markdown }],
            "values": value_to_json(&calc.value),
            "isError": calc.is_error()
        });
        if let Some(e) = calc.error() {
            result["error"] = json!({ "code": e.code, "message": e.message, "suggestion": e.suggestion });
        }
        Ok(result)
    }

    /// Run inputs keyed by name, or positional args, or nothing
    fn run(&self, calculator: &str, inputs: &JsonValue) -> Calculation {
        if let Some(obj) = inputs.get("inputs").and_then(|v| v.as_object()) {
            let named: HashMap<String, Value> = obj.iter().map(|(k, v)| (k.clone(), json_to_value(v))).collect();
            return self.engine.calculate_named(calculator, &named);
        }
        let positional: Vec<Value> = inputs
            .get("args")
            .and_then(|v| v.as_array())
            .map(|arr| arr.iter().map(json_to_value).collect())
            .unwrap_or_default();
        self.engine.calculate(calculator, &positional)
    }

    fn tool_calculate_batch(&self, args: &JsonValue) -> Result<JsonValue, McpError> {
        let calculator = calculator_arg(args)?;
        let input_sets = args
            .get("input_sets")
            .and_then(|v| v.as_array())
            .ok_or_else(|| McpError::invalid_params("Missing input_sets"))?;
        let compare_field = args.get("compare_field").and_then(|v| v.as_str());

        let mut results = Vec::new();
        let mut comparison = Vec::new();
        let mut summary = format!("## {} × {}\n\n", calculator, input_sets.len());
        if let Some(field) = compare_field {
            summary.push_str(&format!("| run | {} |\n|-----|------|\n", field));
        }

        for (i, set) in input_sets.iter().enumerate() {
            // a set is either {field: value} or a positional array
            let wrapped = if set.is_array() { json!({ "args": set }) } else { json!({ "inputs": set }) };
            let calc = self.run(calculator, &wrapped);

            if let Some(field) = compare_field {
                let value = calc.get(field);
                summary.push_str(&format!("| {} | {} |\n", i + 1, display(&value)));
                comparison.push(json!({ "index": i, "inputs": set, "value": value_to_json(&value) }));
            }

            results.push(json!({
                "index": i,
                "inputs": set,
                "values": value_to_json(&calc.value),
                "has_errors": calc.is_error()
            }));
        }

        let failed = results.iter().filter(|r| r["has_errors"] == json!(true)).count();
        if compare_field.is_none() {
            summary.push_str(&format!("Evaluated {} sets, {} failed\n", results.len(), failed));
        }

        Ok(json!({
            "content": [{ "type": "text", "text": summary }],
            "results": results,
            "comparison": compare_field.map(|_| comparison)
        }))
    }

    fn tool_help(&self, args: &JsonValue) -> JsonValue {
        let name = args.get("name").and_then(|v| v.as_str());
        let help = self.engine.help(name);
        json!({
            "content": [{ "type": "text", "text": format_help(&help) }],
            "data": value_to_json(&help)
        })
    }

    fn tool_list_calculators(&self, args: &JsonValue) -> JsonValue {
        let category = args.get("category").and_then(|v| v.as_str());
        let calculators = self.engine.list_calculators(category);

        let mut text = String::from("| calculator | category | description |\n|------|------|------|\n");
        for c in calculators.as_list().unwrap_or_default() {
            text.push_str(&format!(
                "| {} | {} | {} |\n",
                display(&c.get("name")),
                display(&c.get("category")),
                display(&c.get("description"))
            ));
        }

        json!({
            "content": [{ "type": "text", "text": text }],
            "data": value_to_json(&calculators)
        })
    }
}

fn calculator_arg(args: &JsonValue) -> Result<&str, McpError> {
    args.get("calculator")
        .and_then(|v| v.as_str())
        .ok_or_else(|| McpError::invalid_params("Missing calculator argument"))
}

fn tools_list() -> JsonValue {
    json!({
        "tools": [
            {
                "name": "calculate",
                "description": "Run one calculator. Pass inputs by name, or args in the calculator's input order.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "calculator": {
                            "type": "string",
                            "description": "Calculator name, e.g. emi, sip, tax"
                        },
                        "inputs": {
                            "type": "object",
                            "description": "Inputs keyed by name; numbers may be given as strings"
                        },
                        "args": {
                            "type": "array",
                            "description": "Positional inputs"
                        }
                    },
                    "required": ["calculator"]
                }
            },
            {
                "name": "calculate_batch",
                "description": "Run one calculator over several input sets, e.g. to compare tenures or regimes.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "calculator": { "type": "string", "description": "Calculator name" },
                        "input_sets": {
                            "type": "array",
                            "items": { "type": ["object", "array"] },
                            "description": "Input sets, each named (object) or positional (array)"
                        },
                        "compare_field": {
                            "type": "string",
                            "description": "Result field to compare across runs"
                        }
                    },
                    "required": ["calculator", "input_sets"]
                }
            },
            {
                "name": "finpilot",
                "description": "Inputs, result fields and examples of a calculator, or an overview of all of them.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "name": {
                            "type": "string",
                            "description": "Calculator name. Omit for the overview."
                        }
                    }
                }
            },
            {
                "name": "list_calculators",
                "description": "List calculators, optionally by category.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "category": {
                            "type": "string",
                            "enum": ["loans", "savings", "returns", "tax", "planning", "portfolio"]
                        }
                    }
                }
            }
        ]
    })
}

fn prompts_list() -> JsonValue {
    let prompts: Vec<JsonValue> = PROMPTS
        .iter()
        .map(|(name, description, arguments)| {
            let arguments: Vec<JsonValue> = arguments
                .iter()
                .map(|(arg, desc)| json!({ "name": arg, "description": desc, "required": true }))
                .collect();
            json!({ "name": name, "description": description, "arguments": arguments })
        })
        .collect();
    json!({ "prompts": prompts })
}

fn prompts_get(params: &Option<JsonValue>) -> Result<JsonValue, McpError> {
    let params = params.as_ref().ok_or_else(|| McpError::invalid_params("Missing params"))?;
    let name = params
        .get("name")
        .and_then(|n| n.as_str())
        .ok_or_else(|| McpError::invalid_params("Missing name parameter"))?;

    let Some((_, description, expected)) = PROMPTS.iter().find(|(p, _, _)| *p == name) else {
        let available: Vec<&str> = PROMPTS.iter().map(|(p, _, _)| *p).collect();
        return Err(McpError {
            code: INVALID_PARAMS,
            message: format!("Unknown prompt: {}", name),
            data: Some(json!({ "available_prompts": available })),
        });
    };

    let given = params.get("arguments").and_then(|a| a.as_object());
    let mut inputs = serde_json::Map::new();
    for (arg, _) in expected.iter() {
        match given.and_then(|g| g.get(*arg)) {
            Some(v) if !v.is_null() => {
                inputs.insert(arg.to_string(), v.clone());
            }
            _ => return Err(McpError::invalid_params(format!("Missing prompt argument: {}", arg))),
        }
    }
    let inputs = JsonValue::Object(inputs);

    let text = match name {
        "home_loan" => format!(
            "Call the `calculate` tool with calculator `emi` and inputs {inputs}, then `amortization` with the same inputs. Show both tables and explain how much of the first year's payments goes to interest."
        ),
        "sip_plan" => format!(
            "Call the `calculate` tool with calculator `sip` and inputs {inputs}. Show the table and explain the gap between the amount invested and the maturity value."
        ),
        "tax_regimes" => {
            let mut old = inputs.clone();
            let mut new = inputs.clone();
            old["regime"] = json!("old");
            new["regime"] = json!("new");
            format!(
                "Call the `calculate_batch` tool with calculator `tax`, input_sets [{old}, {new}] and compare_field `total_tax`. Show the comparison and say which regime costs less."
            )
        }
        _ => format!(
            "Call the `calculate` tool with calculator `retirement` and inputs {inputs}. Show the table and explain the monthly SIP needed to reach the corpus."
        ),
    };

    Ok(json!({
        "description": description,
        "messages": [{
            "role": "user",
            "content": { "type": "text", "text": text }
        }]
    }))
}

fn format_help(help: &Value) -> String {
    match help {
        Value::Object(map) if map.contains_key("calculators") => {
            let mut out = String::from("# FinPilot calculators\n\n");
            if let Some(Value::Object(categories)) = map.get("calculators") {
                let mut names: Vec<&String> = categories.keys().collect();
                names.sort();
                for category in names {
                    out.push_str(&format!("- **{}**: {}\n", category, display(&categories[category])));
                }
            }
            if let Some(Value::Text(u)) = map.get("usage") {
                out.push_str(&format!("\n{}\n", u));
            }
            out
        }
        Value::Object(map) => {
            let mut out = String::new();
            if let Some(Value::Text(n)) = map.get("name") {
                out.push_str(&format!("# {}\n\n", n));
            }
            if let Some(Value::Text(d)) = map.get("description") {
                out.push_str(&format!("{}\n\n", d));
            }
            if let Some(Value::Text(u)) = map.get("usage") {
                out.push_str(&format!("**Usage:** `{}`\n\n", u));
            }
            if let Some(Value::List(args)) = map.get("args") {
                out.push_str("| input | type | description |\n|------|------|------|\n");
                for a in args {
                    let mut desc = display(&a.get("description"));
                    if let Some(d) = a.get("default").as_text() {
                        desc.push_str(&format!(" (default {})", d));
                    }
                    out.push_str(&format!("| {} | {} | {} |\n", display(&a.get("name")), display(&a.get("type")), desc));
                }
                out.push('\n');
            }
            if let Some(examples @ Value::List(_)) = map.get("examples") {
                out.push_str(&format!("**Examples:** {}\n", display(examples)));
            }
            out
        }
        Value::Error(e) => match &e.suggestion {
            Some(s) => format!("Error: {}\n\n{}", e.message, s),
            None => format!("Error: {}", e.message),
        },
        other => display(other),
    }
}

/// Plain text of a value for summary tables
fn display(value: &Value) -> String {
    match value {
        Value::Number(n) if n.is_integer() => n.as_decimal(0),
        Value::Number(n) => n.as_decimal(2),
        Value::Text(s) => s.clone(),
        Value::List(items) => items.iter().map(display).collect::<Vec<_>>().join(", "),
        Value::Error(e) => format!("#ERROR: {}", e.code),
        other => other.to_string(),
    }
}

/// JSON numbers go through their decimal text so no binary float is involved
pub fn json_to_value(json: &JsonValue) -> Value {
    match json {
        JsonValue::Null => Value::Null,
        JsonValue::Bool(b) => Value::Bool(*b),
        JsonValue::Number(n) => {
            let text = n.to_string();
            match Number::from_str(&text) {
                Ok(num) => Value::Number(num),
                Err(_) => Value::Text(text),
            }
        }
        JsonValue::String(s) => Value::Text(s.clone()),
        JsonValue::Array(arr) => Value::List(arr.iter().map(json_to_value).collect()),
        JsonValue::Object(obj) => Value::Object(obj.iter().map(|(k, v)| (k.clone(), json_to_value(v))).collect()),
    }
}

/// Numbers leave as decimal strings, rounded to 10 places, so JSON floats
/// never alter them
pub fn value_to_json(value: &Value) -> JsonValue {
    match value {
        Value::Null => JsonValue::Null,
        Value::Bool(b) => JsonValue::Bool(*b),
        Value::Number(n) => JsonValue::String(n.to_string()),
        Value::Text(s) => JsonValue::String(s.clone()),
        Value::List(l) => JsonValue::Array(l.iter().map(value_to_json).collect()),
        Value::Object(o) => JsonValue::Object(o.iter().map(|(k, v)| (k.clone(), value_to_json(v))).collect()),
        Value::Error(e) => json!({ "_error": { "code": e.code, "message": e.message, "suggestion": e.suggestion } }),
    }
}
